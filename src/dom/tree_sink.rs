//! Tree construction: html5ever drives [`MarkupSink`] to fill a [`MarkupDom`].

use std::borrow::Cow;
use std::cell::{Ref, RefCell};

use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as ParsedAttribute, QualName};

use super::arena::{Attribute, MarkupData, MarkupDom, MarkupNodeId};

/// Name reported for handles that are not elements.
static NO_NAME: QualName = QualName {
    prefix: None,
    ns: html5ever::ns!(),
    local: html5ever::local_name!(""),
};

impl From<ParsedAttribute> for Attribute {
    fn from(attr: ParsedAttribute) -> Self {
        Attribute {
            name: attr.name,
            value: attr.value.to_string(),
        }
    }
}

/// Collects parser output into a [`MarkupDom`].
///
/// `TreeSink` hands out `&self` only, so the arena sits in a `RefCell`.
pub(crate) struct MarkupSink {
    dom: RefCell<MarkupDom>,
}

impl MarkupSink {
    pub(crate) fn new() -> Self {
        Self {
            dom: RefCell::new(MarkupDom::new()),
        }
    }

    pub(crate) fn into_dom(self) -> MarkupDom {
        self.dom.into_inner()
    }

    /// Insert text or a node, either appended to `parent` or placed before `sibling`.
    fn insert(&self, target: Insertion, child: NodeOrText<MarkupNodeId>) {
        let mut dom = self.dom.borrow_mut();
        let node = match child {
            NodeOrText::AppendNode(node) => {
                dom.detach(node);
                node
            }
            NodeOrText::AppendText(text) => match target {
                Insertion::Append(parent) => {
                    dom.append_text(parent, &text);
                    return;
                }
                Insertion::Before(_) => dom.create_text(text.to_string()),
            },
        };
        match target {
            Insertion::Append(parent) => dom.append(parent, node),
            Insertion::Before(sibling) => dom.insert_before(sibling, node),
        }
    }
}

#[derive(Clone, Copy)]
enum Insertion {
    Append(MarkupNodeId),
    Before(MarkupNodeId),
}

impl TreeSink for MarkupSink {
    type Handle = MarkupNodeId;
    type Output = Self;
    type ElemName<'a> = Ref<'a, QualName>;

    fn finish(self) -> Self {
        self
    }

    // Scraped pages are rarely valid; recover the way a browser does
    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> MarkupNodeId {
        self.dom.borrow().document()
    }

    fn elem_name<'a>(&'a self, target: &'a MarkupNodeId) -> Ref<'a, QualName> {
        Ref::map(self.dom.borrow(), |dom| match dom.get(*target).map(|n| &n.data) {
            Some(MarkupData::Element { name, .. }) => name,
            _ => &NO_NAME,
        })
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<ParsedAttribute>,
        _flags: ElementFlags,
    ) -> MarkupNodeId {
        let attrs = attrs.into_iter().map(Attribute::from).collect();
        self.dom.borrow_mut().create_element(name, attrs)
    }

    fn create_comment(&self, text: StrTendril) -> MarkupNodeId {
        self.dom.borrow_mut().create_comment(text.to_string())
    }

    // Only the XML tokenizer emits processing instructions
    fn create_pi(&self, _target: StrTendril, data: StrTendril) -> MarkupNodeId {
        self.create_comment(data)
    }

    fn append(&self, parent: &MarkupNodeId, child: NodeOrText<MarkupNodeId>) {
        self.insert(Insertion::Append(*parent), child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &MarkupNodeId,
        prev_element: &MarkupNodeId,
        child: NodeOrText<MarkupNodeId>,
    ) {
        let parent = self.dom.borrow().parent(*element);
        let target = match parent {
            Some(_) => Insertion::Before(*element),
            None => Insertion::Append(*prev_element),
        };
        self.insert(target, child);
    }

    fn append_doctype_to_document(&self, _: StrTendril, _: StrTendril, _: StrTendril) {
        let mut dom = self.dom.borrow_mut();
        let document = dom.document();
        let doctype = dom.create_doctype();
        dom.append(document, doctype);
    }

    // Templates are stripped as boilerplate, so their content stays inline
    fn get_template_contents(&self, target: &MarkupNodeId) -> MarkupNodeId {
        *target
    }

    fn same_node(&self, x: &MarkupNodeId, y: &MarkupNodeId) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &MarkupNodeId, new_node: NodeOrText<MarkupNodeId>) {
        self.insert(Insertion::Before(*sibling), new_node);
    }

    fn add_attrs_if_missing(&self, target: &MarkupNodeId, attrs: Vec<ParsedAttribute>) {
        let mut dom = self.dom.borrow_mut();
        let Some(MarkupData::Element {
            attrs: existing, ..
        }) = dom.get_mut(*target).map(|n| &mut n.data)
        else {
            return;
        };
        for attr in attrs {
            if existing.iter().all(|a| a.name != attr.name) {
                existing.push(attr.into());
            }
        }
    }

    fn remove_from_parent(&self, target: &MarkupNodeId) {
        self.dom.borrow_mut().detach(*target);
    }

    fn reparent_children(&self, node: &MarkupNodeId, new_parent: &MarkupNodeId) {
        self.dom.borrow_mut().reparent_children(*node, *new_parent);
    }
}
