//! The tree-walking scrubber
//!
//! One pre-order, depth-first pass over the document. An element whose
//! local name is not allowlisted is detached whole — subtree included,
//! attributes unexamined — and never descended into. Allowed elements
//! have each attribute checked by its namespace-qualified key, with the
//! element-scoped `data-*` escape hatch. Comments and processing
//! instructions never survive.
//!
//! The walk iterates over snapshots of each node's children and
//! attributes, never the live chains, so detaching mid-iteration cannot
//! skip or revisit entries.

use super::policy::Policy;
use crate::dom::{Document, NodeId, NodeKind, DOCUMENT_NODE};

/// Allowlist filter over a parsed document
pub struct Scrubber<'p> {
    policy: &'p Policy,
}

impl<'p> Scrubber<'p> {
    pub fn new(policy: &'p Policy) -> Self {
        Scrubber { policy }
    }

    /// Scrub the document in place. Total: given a well-formed tree it
    /// cannot fail, and a second pass finds nothing left to remove.
    pub fn scrub(&self, doc: &mut Document) {
        for child in doc.children_vec(DOCUMENT_NODE) {
            self.scrub_node(doc, child);
        }
    }

    fn scrub_node(&self, doc: &mut Document, id: NodeId) {
        let Some(kind) = doc.get_node(id).map(|node| node.kind) else {
            return;
        };

        match kind {
            NodeKind::Element => {
                let allowed = doc
                    .local_name(id)
                    .is_some_and(|name| self.policy.allows_element(name));
                if !allowed {
                    log::debug!(
                        "dropping element <{}>",
                        doc.node_name(id).unwrap_or_default()
                    );
                    doc.detach(id);
                    return;
                }

                self.scrub_attributes(doc, id);
                for child in doc.children_vec(id) {
                    self.scrub_node(doc, child);
                }
            }

            NodeKind::Comment | NodeKind::ProcessingInstruction => {
                doc.detach(id);
            }

            NodeKind::Text | NodeKind::CData | NodeKind::Document => {}
        }
    }

    fn scrub_attributes(&self, doc: &mut Document, id: NodeId) {
        let element = doc.local_name(id).unwrap_or_default().to_owned();
        let allowed = self.policy.allowed_attributes(&element);

        for attr_id in doc.attr_ids(id) {
            // Policy key is the name as written: `prefix:local` when
            // prefixed, bare local name otherwise. A prefixed attribute
            // is never matched by its local name alone.
            let key = doc.attr_name(attr_id).to_owned();
            if allowed.is_some_and(|set| set.contains(&key)) {
                continue;
            }

            if self.policy.allows_data_attributes(&element) {
                let local = doc.attr_local_name(attr_id);
                if local.starts_with("data-") && self.policy.valid_data_attribute_name(local) {
                    continue;
                }
            }

            log::debug!("dropping attribute {key} on <{element}>");
            doc.remove_attr(attr_id);
        }
    }
}
