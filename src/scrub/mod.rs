//! Allowlist scrubbing: the policy table and the tree-walking filter

pub mod policy;
pub mod scrubber;

pub use policy::Policy;
pub use scrubber::Scrubber;
