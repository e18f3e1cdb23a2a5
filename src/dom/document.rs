//! Arena-based XML document
//!
//! Built once from reader events, then mutated in place by the scrubber
//! and finally serialized. Nodes and attributes live in flat arenas
//! indexed by id; names and values are interned in a [`StringPool`].
//!
//! Mutation model: [`Document::detach`] unlinks a node (and with it its
//! whole subtree) from the sibling chain; [`Document::remove_attr`]
//! tombstones an attribute slot. Neither compacts the arenas — detached
//! data is simply unreachable and dies with the document.

use super::namespace::NamespaceResolver;
use super::node::{Attr, AttrId, Node, NodeId, NodeKind, DOCUMENT_NODE};
use super::strings::StringPool;
use crate::core::attributes::Attribute;
use crate::core::tokenizer::ParseError;
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::Reader;

/// Recorded `<?xml ...?>` declaration, re-emitted on serialization
#[derive(Debug, Clone)]
pub struct XmlDecl {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

/// A parsed document owning its node tree
pub struct Document {
    nodes: Vec<Node>,
    attrs: Vec<Attr>,
    strings: StringPool,
    root_element: Option<NodeId>,
    xml_decl: Option<XmlDecl>,
}

impl Document {
    /// Parse a complete document. The input must be UTF-8 and
    /// well-formed XML; anything else is a [`ParseError`].
    pub fn parse(input: &[u8]) -> Result<Self, ParseError> {
        if let Err(e) = std::str::from_utf8(input) {
            return Err(ParseError::new("input is not valid UTF-8", e.valid_up_to()));
        }

        let mut doc = Document {
            nodes: Vec::with_capacity(64),
            attrs: Vec::with_capacity(32),
            strings: StringPool::new(),
            root_element: None,
            xml_decl: None,
        };
        doc.nodes.push(Node::document());
        doc.build(input)?;
        Ok(doc)
    }

    fn build(&mut self, input: &[u8]) -> Result<(), ParseError> {
        let mut reader = Reader::new(input);
        let mut resolver = NamespaceResolver::new(&mut self.strings);
        let mut stack: Vec<NodeId> = vec![DOCUMENT_NODE];
        let mut tag_stack: Vec<Vec<u8>> = Vec::new();

        while let Some(event) = reader.next_event()? {
            let at_top = stack.len() == 1;
            match event {
                XmlEvent::StartElement(elem) => {
                    self.check_root(at_top, reader.position())?;
                    tag_stack.push(elem.name.to_vec());
                    let node_id = self.append_element(&elem, &mut resolver, &stack, false);
                    stack.push(node_id);
                }

                XmlEvent::EmptyElement(elem) => {
                    self.check_root(at_top, reader.position())?;
                    self.append_element(&elem, &mut resolver, &stack, true);
                }

                XmlEvent::EndElement(end) => {
                    match tag_stack.pop() {
                        Some(open) if open == end.name => {}
                        Some(open) => {
                            return Err(ParseError::new(
                                format!(
                                    "tag mismatch: <{}> closed with </{}>",
                                    String::from_utf8_lossy(&open),
                                    String::from_utf8_lossy(end.name)
                                ),
                                reader.position(),
                            ));
                        }
                        None => {
                            return Err(ParseError::new(
                                format!(
                                    "unexpected end tag </{}>",
                                    String::from_utf8_lossy(end.name)
                                ),
                                reader.position(),
                            ));
                        }
                    }
                    stack.pop();
                    resolver.pop_scope();
                }

                XmlEvent::Text(content) => {
                    if at_top {
                        if !is_xml_whitespace(&content) {
                            return Err(ParseError::new(
                                "text content not allowed at document level",
                                reader.position(),
                            ));
                        }
                        continue;
                    }
                    let parent = stack.last().copied().unwrap_or(DOCUMENT_NODE);
                    let content_id = self.strings.intern(&content);
                    self.append_node(Node::text(content_id, parent));
                }

                XmlEvent::CData(content) => {
                    if at_top {
                        return Err(ParseError::new(
                            "CDATA section not allowed at document level",
                            reader.position(),
                        ));
                    }
                    let parent = stack.last().copied().unwrap_or(DOCUMENT_NODE);
                    let content_id = self.strings.intern(&content);
                    self.append_node(Node::cdata(content_id, parent));
                }

                XmlEvent::Comment(content) => {
                    let parent = stack.last().copied().unwrap_or(DOCUMENT_NODE);
                    let content_id = self.strings.intern(&content);
                    self.append_node(Node::comment(content_id, parent));
                }

                XmlEvent::ProcessingInstruction { target, data } => {
                    let parent = stack.last().copied().unwrap_or(DOCUMENT_NODE);
                    let target_id = self.strings.intern(target);
                    let mut node = Node::processing_instruction(target_id, parent);
                    node.prefix_id = self.strings.intern(&data);
                    self.append_node(node);
                }

                XmlEvent::XmlDeclaration {
                    version,
                    encoding,
                    standalone,
                } => {
                    self.xml_decl = Some(XmlDecl {
                        version: String::from_utf8_lossy(&version).into_owned(),
                        encoding: encoding
                            .map(|e| String::from_utf8_lossy(&e).into_owned()),
                        standalone,
                    });
                }

                XmlEvent::DocType(_) => {
                    // DTD processing (external fetches, entity expansion)
                    // is the attack surface this crate exists to avoid
                    log::debug!("dropping DOCTYPE declaration");
                }

                XmlEvent::EndDocument => break,
            }
        }

        if let Some(open) = tag_stack.first() {
            return Err(ParseError::new(
                format!("unclosed tag <{}>", String::from_utf8_lossy(open)),
                reader.position(),
            ));
        }
        if self.root_element.is_none() {
            return Err(ParseError::new("document has no root element", reader.position()));
        }
        Ok(())
    }

    fn check_root(&self, at_top: bool, position: usize) -> Result<(), ParseError> {
        if at_top && self.root_element.is_some() {
            return Err(ParseError::new("document has multiple root elements", position));
        }
        Ok(())
    }

    /// Create an element node from a start/empty-element event,
    /// separating namespace declarations from ordinary attributes.
    fn append_element(
        &mut self,
        elem: &StartElement<'_>,
        resolver: &mut NamespaceResolver,
        stack: &[NodeId],
        is_empty: bool,
    ) -> NodeId {
        let parent = stack.last().copied().unwrap_or(DOCUMENT_NODE);
        let name_id = self.strings.intern(elem.name);
        let mut node = Node::element(name_id, parent);
        if let Some(prefix) = elem.prefix {
            node.prefix_id = self.strings.intern(prefix);
        }

        resolver.push_scope();

        let attr_start = self.attrs.len() as u32;
        let mut attr_count = 0u16;
        for attr in &elem.attributes {
            if let Some(decl) = namespace_declaration(attr) {
                let prefix_id = self.strings.intern(decl);
                let uri_id = self.strings.intern(&attr.value);
                if decl.is_empty() {
                    resolver.declare_default(uri_id);
                } else {
                    resolver.declare(prefix_id, uri_id);
                }
                node.ns_decls.push((prefix_id, uri_id));
                continue;
            }

            let name_id = self.strings.intern(attr.name);
            let local_id = self.strings.intern(attr.local_name);
            let prefix_id = attr.prefix.map_or(0, |p| self.strings.intern(p));
            let value_id = self.strings.intern(&attr.value);
            self.attrs.push(Attr::new(name_id, local_id, prefix_id, value_id));
            attr_count = attr_count.saturating_add(1);
        }
        node.attr_start = attr_start;
        node.attr_count = attr_count;

        // Unbound prefixes resolve to no namespace rather than failing
        // the parse; the scrubber matches on the prefix text itself
        node.namespace_id = if node.prefix_id != 0 {
            resolver.resolve(node.prefix_id).unwrap_or(0)
        } else {
            resolver.resolve_default().unwrap_or(0)
        };

        let node_id = self.append_node(node);
        if self.root_element.is_none() && parent == DOCUMENT_NODE {
            self.root_element = Some(node_id);
        }

        if is_empty {
            resolver.pop_scope();
        }
        node_id
    }

    fn append_node(&mut self, node: Node) -> NodeId {
        let parent_id = node.parent.unwrap_or(DOCUMENT_NODE);
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        self.link_child(parent_id, node_id);
        node_id
    }

    /// Append `child` to `parent`'s child chain
    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let last = self.nodes[parent_id as usize].last_child;
        if let Some(last_id) = last {
            self.nodes[child_id as usize].prev_sibling = Some(last_id);
            self.nodes[last_id as usize].next_sibling = Some(child_id);
        } else {
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    pub fn xml_decl(&self) -> Option<&XmlDecl> {
        self.xml_decl.as_ref()
    }

    pub fn strings(&self) -> &StringPool {
        &self.strings
    }

    /// Full node name, including any prefix
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        self.strings.get_str(node.name_id)
    }

    /// Local node name (after the colon)
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        let name = self.node_name(id)?;
        Some(match name.find(':') {
            Some(pos) => &name[pos + 1..],
            None => name,
        })
    }

    /// Content of a text or CDATA node
    pub fn text_content(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Text | NodeKind::CData | NodeKind::Comment => {
                self.strings.get_str(node.name_id)
            }
            _ => None,
        }
    }

    /// Data of a processing instruction node
    pub fn pi_data(&self, id: NodeId) -> Option<&str> {
        let node = self.get_node(id)?;
        if node.kind == NodeKind::ProcessingInstruction {
            self.strings.get_str(node.prefix_id)
        } else {
            None
        }
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { doc: self, next: first }
    }

    /// Snapshot of a node's current children. Use this when the walk
    /// mutates the tree: detaching while iterating the live chain would
    /// skip or revisit entries.
    pub fn children_vec(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    /// Snapshot of the live (non-tombstoned) attribute ids of a node
    pub fn attr_ids(&self, id: NodeId) -> Vec<AttrId> {
        let Some(node) = self.get_node(id) else {
            return Vec::new();
        };
        let start = node.attr_start;
        (start..start + node.attr_count as u32)
            .filter(|&i| !self.attrs[i as usize].removed)
            .collect()
    }

    pub fn attr(&self, id: AttrId) -> &Attr {
        &self.attrs[id as usize]
    }

    /// Full attribute name as written, e.g. `xlink:href`
    pub fn attr_name(&self, id: AttrId) -> &str {
        self.strings.get_str(self.attr(id).name_id).unwrap_or_default()
    }

    /// Attribute local name (after the colon)
    pub fn attr_local_name(&self, id: AttrId) -> &str {
        self.strings.get_str(self.attr(id).local_id).unwrap_or_default()
    }

    pub fn attr_value(&self, id: AttrId) -> &str {
        self.strings.get_str(self.attr(id).value_id).unwrap_or_default()
    }

    /// Attribute value looked up by full name on an element
    pub fn get_attribute(&self, node_id: NodeId, name: &str) -> Option<&str> {
        self.attr_ids(node_id)
            .into_iter()
            .find(|&id| self.attr_name(id) == name)
            .map(|id| self.attr_value(id))
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Unlink a node from the tree. The node, its attributes and its
    /// entire subtree become unreachable from the document.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[id as usize];
            (node.parent, node.prev_sibling, node.next_sibling)
        };

        match prev {
            Some(prev_id) => self.nodes[prev_id as usize].next_sibling = next,
            None => {
                if let Some(parent_id) = parent {
                    self.nodes[parent_id as usize].first_child = next;
                }
            }
        }
        match next {
            Some(next_id) => self.nodes[next_id as usize].prev_sibling = prev,
            None => {
                if let Some(parent_id) = parent {
                    self.nodes[parent_id as usize].last_child = prev;
                }
            }
        }

        let node = &mut self.nodes[id as usize];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;

        if self.root_element == Some(id) {
            self.root_element = None;
        }
    }

    /// Tombstone an attribute slot
    pub fn remove_attr(&mut self, id: AttrId) {
        self.attrs[id as usize].removed = true;
    }
}

/// If `attr` is a namespace declaration, the declared prefix
/// (empty slice for the default namespace); otherwise None
fn namespace_declaration<'a>(attr: &Attribute<'a>) -> Option<&'a [u8]> {
    if attr.name == b"xmlns" {
        Some(b"")
    } else if attr.prefix == Some(b"xmlns") {
        Some(attr.local_name)
    } else {
        None
    }
}

fn is_xml_whitespace(content: &[u8]) -> bool {
    content
        .iter()
        .all(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

/// Iterator over the live child chain
pub struct ChildIter<'d> {
    doc: &'d Document,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements() {
        let doc = Document::parse(b"<svg><g><rect/></g></svg>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.node_name(root), Some("svg"));

        let children = doc.children_vec(root);
        assert_eq!(children.len(), 1);
        assert_eq!(doc.node_name(children[0]), Some("g"));
    }

    #[test]
    fn text_content_preserved() {
        let doc = Document::parse(b"<title>diagram</title>").unwrap();
        let root = doc.root_element_id().unwrap();
        let children = doc.children_vec(root);
        assert_eq!(doc.text_content(children[0]), Some("diagram"));
    }

    #[test]
    fn attributes_accessible_by_name() {
        let doc = Document::parse(b"<circle cx=\"1\" r=\"5\"/>").unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.get_attribute(root, "r"), Some("5"));
        assert_eq!(doc.get_attribute(root, "cx"), Some("1"));
        assert_eq!(doc.get_attribute(root, "cy"), None);
    }

    #[test]
    fn prefixed_names_split() {
        let doc =
            Document::parse(b"<svg xmlns:xlink=\"http://www.w3.org/1999/xlink\"><use xlink:href=\"#a\"/></svg>")
                .unwrap();
        let root = doc.root_element_id().unwrap();
        let use_id = doc.children_vec(root)[0];
        let attrs = doc.attr_ids(use_id);
        assert_eq!(attrs.len(), 1);
        assert_eq!(doc.attr_name(attrs[0]), "xlink:href");
        assert_eq!(doc.attr_local_name(attrs[0]), "href");
    }

    #[test]
    fn xmlns_is_a_declaration_not_an_attribute() {
        let doc = Document::parse(b"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\"/>")
            .unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.attr_ids(root).len(), 1);
        assert_eq!(doc.attr_name(doc.attr_ids(root)[0]), "width");

        let node = doc.get_node(root).unwrap();
        assert_eq!(node.ns_decls.len(), 1);
        let (prefix_id, uri_id) = node.ns_decls[0];
        assert_eq!(prefix_id, 0);
        assert_eq!(
            doc.strings().get_str(uri_id),
            Some("http://www.w3.org/2000/svg")
        );
    }

    #[test]
    fn element_namespace_resolved() {
        let doc = Document::parse(
            b"<x:svg xmlns:x=\"http://www.w3.org/2000/svg\"><x:rect/></x:svg>",
        )
        .unwrap();
        let root = doc.root_element_id().unwrap();
        assert_eq!(doc.local_name(root), Some("svg"));
        let node = doc.get_node(root).unwrap();
        assert_eq!(
            doc.strings().get_str(node.namespace_id),
            Some("http://www.w3.org/2000/svg")
        );
    }

    #[test]
    fn detach_middle_child_repairs_chain() {
        let mut doc = Document::parse(b"<g><a/><b/><c/></g>").unwrap();
        let root = doc.root_element_id().unwrap();
        let children = doc.children_vec(root);
        doc.detach(children[1]);

        let names: Vec<_> = doc
            .children_vec(root)
            .into_iter()
            .filter_map(|id| doc.node_name(id).map(str::to_owned))
            .collect();
        assert_eq!(names, vec!["a", "c"]);

        let first = doc.get_node(children[0]).unwrap();
        assert_eq!(first.next_sibling, Some(children[2]));
        let third = doc.get_node(children[2]).unwrap();
        assert_eq!(third.prev_sibling, Some(children[0]));
    }

    #[test]
    fn detach_only_child_empties_parent() {
        let mut doc = Document::parse(b"<g><a/></g>").unwrap();
        let root = doc.root_element_id().unwrap();
        let child = doc.children_vec(root)[0];
        doc.detach(child);

        assert!(doc.children_vec(root).is_empty());
        let parent = doc.get_node(root).unwrap();
        assert!(parent.first_child.is_none());
        assert!(parent.last_child.is_none());
    }

    #[test]
    fn removed_attr_disappears_from_snapshot() {
        let mut doc = Document::parse(b"<rect x=\"1\" y=\"2\"/>").unwrap();
        let root = doc.root_element_id().unwrap();
        let attrs = doc.attr_ids(root);
        doc.remove_attr(attrs[0]);

        let remaining = doc.attr_ids(root);
        assert_eq!(remaining.len(), 1);
        assert_eq!(doc.attr_name(remaining[0]), "y");
    }

    #[test]
    fn mismatched_tags_rejected() {
        assert!(Document::parse(b"<a><b></a></b>").is_err());
        assert!(Document::parse(b"<a>").is_err());
        assert!(Document::parse(b"</a>").is_err());
    }

    #[test]
    fn multiple_roots_rejected() {
        assert!(Document::parse(b"<a/><b/>").is_err());
    }

    #[test]
    fn top_level_text_rejected() {
        assert!(Document::parse(b"<a/>junk").is_err());
        assert!(Document::parse(b"  <a/>  ").is_ok());
    }

    #[test]
    fn empty_input_rejected() {
        assert!(Document::parse(b"").is_err());
        assert!(Document::parse(b"   ").is_err());
    }

    #[test]
    fn xml_declaration_recorded() {
        let doc =
            Document::parse(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><svg/>").unwrap();
        let decl = doc.xml_decl().unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn invalid_utf8_rejected() {
        assert!(Document::parse(b"<a>\xFF</a>").is_err());
    }
}
