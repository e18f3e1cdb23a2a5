//! DOM node representation
//!
//! Nodes live in an arena owned by the document and reference each other
//! through compact `NodeId` indices, so detaching a subtree is pointer
//! surgery on the sibling chain rather than ownership juggling.

/// Compact node identifier (index into the document arena)
pub type NodeId = u32;

/// Index into the document's attribute arena
pub type AttrId = u32;

/// The document root node always occupies slot 0
pub const DOCUMENT_NODE: NodeId = 0;

/// Kind of DOM node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Parent node; `None` for the document root and detached nodes
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// String pool id of the full name (elements, PI targets) or of the
    /// text content (text/CDATA/comment nodes)
    pub name_id: u32,
    /// String pool id of the namespace prefix, 0 if none.
    /// Processing instructions reuse this slot for their data string.
    pub prefix_id: u32,
    /// String pool id of the resolved namespace URI, 0 if none
    pub namespace_id: u32,
    /// Start of this element's attributes in the attribute arena
    pub attr_start: u32,
    /// Number of attribute slots (including tombstoned ones)
    pub attr_count: u16,
    /// Namespace declarations carried on this element, in document
    /// order: (prefix pool id, URI pool id); prefix 0 is the default
    /// namespace
    pub ns_decls: Vec<(u32, u32)>,
}

impl Node {
    fn blank(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Node {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id: 0,
            prefix_id: 0,
            namespace_id: 0,
            attr_start: 0,
            attr_count: 0,
            ns_decls: Vec::new(),
        }
    }

    pub fn document() -> Self {
        Self::blank(NodeKind::Document, None)
    }

    pub fn element(name_id: u32, parent: NodeId) -> Self {
        let mut node = Self::blank(NodeKind::Element, Some(parent));
        node.name_id = name_id;
        node
    }

    pub fn text(content_id: u32, parent: NodeId) -> Self {
        let mut node = Self::blank(NodeKind::Text, Some(parent));
        node.name_id = content_id;
        node
    }

    pub fn cdata(content_id: u32, parent: NodeId) -> Self {
        let mut node = Self::blank(NodeKind::CData, Some(parent));
        node.name_id = content_id;
        node
    }

    pub fn comment(content_id: u32, parent: NodeId) -> Self {
        let mut node = Self::blank(NodeKind::Comment, Some(parent));
        node.name_id = content_id;
        node
    }

    pub fn processing_instruction(target_id: u32, parent: NodeId) -> Self {
        let mut node = Self::blank(NodeKind::ProcessingInstruction, Some(parent));
        node.name_id = target_id;
        node
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }
}

/// A stored attribute
#[derive(Debug, Clone)]
pub struct Attr {
    /// Full name, possibly `prefix:local`
    pub name_id: u32,
    /// Local name (after the colon)
    pub local_id: u32,
    /// Namespace prefix, 0 if none
    pub prefix_id: u32,
    pub value_id: u32,
    /// Tombstone: set by the scrubber, honored by every accessor and the
    /// serializer (the arena itself is append-only)
    pub removed: bool,
}

impl Attr {
    pub fn new(name_id: u32, local_id: u32, prefix_id: u32, value_id: u32) -> Self {
        Attr {
            name_id,
            local_id,
            prefix_id,
            value_id,
            removed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_node_has_no_parent() {
        let doc = Node::document();
        assert_eq!(doc.kind, NodeKind::Document);
        assert!(doc.parent.is_none());
    }

    #[test]
    fn element_links_start_empty() {
        let elem = Node::element(1, DOCUMENT_NODE);
        assert!(elem.is_element());
        assert_eq!(elem.parent, Some(DOCUMENT_NODE));
        assert!(elem.first_child.is_none());
        assert!(elem.next_sibling.is_none());
    }

    #[test]
    fn new_attr_is_live() {
        let attr = Attr::new(1, 1, 0, 2);
        assert!(!attr.removed);
    }
}
