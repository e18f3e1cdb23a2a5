//! DOM-to-text serialization
//!
//! Writes a document back out as XML: the recorded declaration if the
//! input carried one, namespace declarations, escaped attribute values
//! and text. Detached nodes are unreachable and tombstoned attributes
//! are skipped, so serializing a scrubbed document yields exactly the
//! surviving markup.

use super::document::Document;
use super::node::{NodeId, NodeKind, DOCUMENT_NODE};
use crate::core::entities::encode_text;

/// Serialize the whole document
pub fn to_xml(doc: &Document) -> String {
    let mut buf = String::with_capacity(256);

    if let Some(decl) = doc.xml_decl() {
        buf.push_str("<?xml version=\"");
        buf.push_str(&decl.version);
        buf.push('"');
        if let Some(encoding) = &decl.encoding {
            buf.push_str(" encoding=\"");
            buf.push_str(encoding);
            buf.push('"');
        }
        if let Some(standalone) = decl.standalone {
            buf.push_str(" standalone=\"");
            buf.push_str(if standalone { "yes" } else { "no" });
            buf.push('"');
        }
        buf.push_str("?>");
    }

    for child in doc.children(DOCUMENT_NODE) {
        write_node(doc, child, &mut buf);
    }
    buf
}

/// Serialize a single node and its subtree
pub fn node_to_xml(doc: &Document, id: NodeId) -> String {
    let mut buf = String::with_capacity(64);
    write_node(doc, id, &mut buf);
    buf
}

fn write_node(doc: &Document, id: NodeId, buf: &mut String) {
    let Some(node) = doc.get_node(id) else {
        return;
    };

    match node.kind {
        NodeKind::Element => write_element(doc, id, buf),
        NodeKind::Text => {
            let content = doc.text_content(id).unwrap_or_default();
            buf.push_str(&encode_text(content));
        }
        NodeKind::CData => {
            buf.push_str("<![CDATA[");
            buf.push_str(doc.text_content(id).unwrap_or_default());
            buf.push_str("]]>");
        }
        NodeKind::Comment => {
            buf.push_str("<!--");
            buf.push_str(doc.text_content(id).unwrap_or_default());
            buf.push_str("-->");
        }
        NodeKind::ProcessingInstruction => {
            buf.push_str("<?");
            buf.push_str(doc.node_name(id).unwrap_or_default());
            let data = doc.pi_data(id).unwrap_or_default();
            if !data.is_empty() {
                buf.push(' ');
                buf.push_str(data);
            }
            buf.push_str("?>");
        }
        NodeKind::Document => {
            for child in doc.children(id) {
                write_node(doc, child, buf);
            }
        }
    }
}

fn write_element(doc: &Document, id: NodeId, buf: &mut String) {
    let name = doc.node_name(id).unwrap_or_default();
    buf.push('<');
    buf.push_str(name);

    if let Some(node) = doc.get_node(id) {
        for &(prefix_id, uri_id) in &node.ns_decls {
            buf.push(' ');
            match doc.strings().get_str(prefix_id) {
                Some("") | None => buf.push_str("xmlns"),
                Some(prefix) => {
                    buf.push_str("xmlns:");
                    buf.push_str(prefix);
                }
            }
            buf.push_str("=\"");
            buf.push_str(&encode_text(doc.strings().get_str(uri_id).unwrap_or_default()));
            buf.push('"');
        }
    }

    for attr_id in doc.attr_ids(id) {
        buf.push(' ');
        buf.push_str(doc.attr_name(attr_id));
        buf.push_str("=\"");
        buf.push_str(&encode_text(doc.attr_value(attr_id)));
        buf.push('"');
    }

    let children: Vec<NodeId> = doc.children(id).collect();
    if children.is_empty() {
        buf.push_str("/>");
        return;
    }

    buf.push('>');
    for child in children {
        write_node(doc, child, buf);
    }
    buf.push_str("</");
    buf.push_str(name);
    buf.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &str) -> String {
        let doc = Document::parse(input.as_bytes()).unwrap();
        to_xml(&doc)
    }

    #[test]
    fn elements_and_text() {
        assert_eq!(roundtrip("<svg><title>hi</title></svg>"), "<svg><title>hi</title></svg>");
    }

    #[test]
    fn empty_elements_self_close() {
        assert_eq!(roundtrip("<g><rect/></g>"), "<g><rect/></g>");
        assert_eq!(roundtrip("<g></g>"), "<g/>");
    }

    #[test]
    fn attributes_in_order() {
        assert_eq!(
            roundtrip("<circle cx=\"1\" cy=\"2\" r=\"5\"/>"),
            "<circle cx=\"1\" cy=\"2\" r=\"5\"/>"
        );
    }

    #[test]
    fn namespace_declarations_survive() {
        assert_eq!(
            roundtrip("<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\"/>"),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\"/>"
        );
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(
            roundtrip("<desc>a &lt; b &amp; c</desc>"),
            "<desc>a &lt; b &amp; c</desc>"
        );
    }

    #[test]
    fn attribute_values_escaped() {
        assert_eq!(
            roundtrip("<text label=\"a&quot;b\"/>"),
            "<text label=\"a&quot;b\"/>"
        );
    }

    #[test]
    fn cdata_verbatim() {
        assert_eq!(
            roundtrip("<style><![CDATA[a < b]]></style>"),
            "<style><![CDATA[a < b]]></style>"
        );
    }

    #[test]
    fn xml_declaration_reemitted() {
        assert_eq!(
            roundtrip("<?xml version=\"1.0\" encoding=\"UTF-8\"?><svg/>"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><svg/>"
        );
    }

    #[test]
    fn comment_preserved_without_scrubbing() {
        assert_eq!(roundtrip("<g><!-- note --></g>"), "<g><!-- note --></g>");
    }

    #[test]
    fn subtree_serialization() {
        let doc = Document::parse(b"<svg><g><rect/></g></svg>").unwrap();
        let root = doc.root_element_id().unwrap();
        let g = doc.children_vec(root)[0];
        assert_eq!(node_to_xml(&doc, g), "<g><rect/></g>");
    }
}
