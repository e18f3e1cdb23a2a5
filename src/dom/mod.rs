//! Arena-based XML DOM
//!
//! - Arena allocation for nodes, `NodeId` (u32) indices
//! - String interning for names and values
//! - Namespace resolution during the build
//! - In-place mutation (`detach`, `remove_attr`) for the scrubber
//! - Serialization back to text

pub mod document;
pub mod namespace;
pub mod node;
pub mod serialize;
pub mod strings;

pub use document::{Document, XmlDecl};
pub use node::{Attr, AttrId, Node, NodeId, NodeKind, DOCUMENT_NODE};
pub use strings::StringPool;
