//! Tag-name predicates shared by cleaning, classification and ranking.

/// Elements whose text joins the surrounding text run.
pub fn is_inline_tag(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "abbr"
            | "b"
            | "bdi"
            | "bdo"
            | "cite"
            | "code"
            | "data"
            | "dfn"
            | "em"
            | "font"
            | "i"
            | "kbd"
            | "label"
            | "mark"
            | "q"
            | "s"
            | "samp"
            | "small"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "time"
            | "u"
            | "var"
            | "wbr"
            | "br"
            | "img"
    )
}

/// Heading level for `h1`..`h6`.
pub fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Media-bearing elements whose nearest texted ancestor becomes a media section.
pub fn is_media_tag(tag: &str) -> bool {
    matches!(
        tag,
        "img" | "audio" | "video" | "embed" | "object" | "source" | "svg" | "picture"
    )
}

/// List containers.
pub fn is_list_tag(tag: &str) -> bool {
    matches!(tag, "ul" | "ol")
}

/// Elements that are meaningful without any content.
pub fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "br" | "hr" | "img" | "embed" | "source" | "input" | "area" | "col" | "track" | "wbr"
    )
}

/// Elements removed outright by cleaning.
pub fn is_boilerplate_tag(tag: &str) -> bool {
    matches!(
        tag,
        "style" | "nav" | "meta" | "footer" | "select" | "link" | "noscript" | "template" | "iframe"
    )
}

/// Elements whose whitespace is significant.
pub fn is_preformatted_tag(tag: &str) -> bool {
    matches!(tag, "pre" | "textarea")
}
