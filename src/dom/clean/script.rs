//! Pass 2: Script conversion

use std::sync::LazyLock;

use regex::Regex;

use super::super::{MarkupDom, MarkupNodeId, SectionKind, parse_html};

/// Quoted HTML string literals inside a script body: `"<tag ...>"`.
static QUOTED_MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(<[a-z][\s\S]*?>)""#).expect("valid regex"));

/// Replace `<script>` elements, keeping any markup they render.
///
/// Client-side pages often carry their content as HTML strings inside
/// scripts. Every quoted markup literal of a script is collected, parsed
/// inside a `<div>`, and grafted where the script was; the graft is marked
/// as a [`SectionKind::Script`] section. Scripts without markup are simply
/// removed. Returns the number of grafted sections.
pub fn convert_scripts(dom: &mut MarkupDom) -> usize {
    let scripts = dom.descendants_by_tag(dom.document(), "script");
    let mut converted = 0;
    for script in scripts {
        if graft_script_markup(dom, script).is_some() {
            converted += 1;
        }
        dom.detach(script);
    }
    converted
}

fn graft_script_markup(dom: &mut MarkupDom, script: MarkupNodeId) -> Option<MarkupNodeId> {
    let parent = dom.parent(script)?;
    let body: String = dom
        .children(script)
        .filter_map(|c| dom.text_content(c))
        .collect();
    let fragments: Vec<&str> = QUOTED_MARKUP
        .captures_iter(&body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();
    if fragments.is_empty() {
        return None;
    }

    let parsed = parse_html(&format!("<div>{}</div>", fragments.concat()));
    let container = parsed.find_by_tag("div")?;
    let graft = dom.import_subtree(&parsed, container, parent)?;
    dom.detach(graft);
    dom.insert_before(script, graft);
    dom.set_section(graft, SectionKind::Script);
    Some(graft)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grafts_markup_from_script() {
        let mut dom = parse_html(
            r#"<body><p>Before</p><script>render("<h2>Loaded</h2><p>Dynamic text</p>");</script></body>"#,
        );

        assert_eq!(convert_scripts(&mut dom), 1);

        assert!(dom.find_by_tag("script").is_none());
        let h2 = dom.find_by_tag("h2").expect("grafted heading");
        let graft = dom.parent(h2).unwrap();
        assert!(dom.is_tag(graft, "div"));
        assert_eq!(dom.section(graft), Some(SectionKind::Script));
        assert_eq!(dom.visible_text(graft), "Loaded Dynamic text");

        let body = dom.find_by_tag("body").unwrap();
        let order: Vec<_> = dom.element_children(body).collect();
        assert!(dom.is_tag(order[0], "p"));
        assert_eq!(order[1], graft);
    }

    #[test]
    fn test_plain_script_is_removed() {
        let mut dom = parse_html("<p>Text</p><script>var x = 1 < 2;</script>");
        assert_eq!(convert_scripts(&mut dom), 0);
        assert!(dom.find_by_tag("script").is_none());
        assert!(dom.find_by_tag("div").is_none());
    }
}
