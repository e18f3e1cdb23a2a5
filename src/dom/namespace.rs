//! Namespace resolution
//!
//! Stack-based prefix-to-URI resolver used while building the DOM.
//! Bindings are scoped to the element that declared them and unwound
//! when the builder leaves that element.

use super::strings::StringPool;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &[u8] = b"http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &[u8] = b"http://www.w3.org/2000/xmlns/";
}

#[derive(Debug, Clone)]
struct Binding {
    prefix_id: u32,
    uri_id: u32,
    depth: u16,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver {
    bindings: Vec<Binding>,
    depth: u16,
    xml_prefix_id: u32,
    xmlns_prefix_id: u32,
}

impl NamespaceResolver {
    /// New resolver with the `xml` and `xmlns` prefixes pre-bound, as
    /// the namespaces recommendation requires
    pub fn new(strings: &mut StringPool) -> Self {
        let xml_prefix_id = strings.intern(b"xml");
        let xmlns_prefix_id = strings.intern(b"xmlns");
        let xml_uri_id = strings.intern(ns::XML);
        let xmlns_uri_id = strings.intern(ns::XMLNS);

        let mut resolver = NamespaceResolver {
            bindings: Vec::with_capacity(8),
            depth: 0,
            xml_prefix_id,
            xmlns_prefix_id,
        };
        resolver.bindings.push(Binding {
            prefix_id: xml_prefix_id,
            uri_id: xml_uri_id,
            depth: 0,
        });
        resolver.bindings.push(Binding {
            prefix_id: xmlns_prefix_id,
            uri_id: xmlns_uri_id,
            depth: 0,
        });
        resolver
    }

    /// Enter an element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, dropping bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Bind a prefix in the current scope. `xml` and `xmlns` cannot be
    /// redeclared.
    pub fn declare(&mut self, prefix_id: u32, uri_id: u32) {
        if prefix_id == self.xml_prefix_id || prefix_id == self.xmlns_prefix_id {
            return;
        }
        self.bindings.push(Binding {
            prefix_id,
            uri_id,
            depth: self.depth,
        });
    }

    /// Bind the default namespace in the current scope
    pub fn declare_default(&mut self, uri_id: u32) {
        self.declare(0, uri_id);
    }

    /// Resolve a prefix to a URI id, innermost binding first
    pub fn resolve(&self, prefix_id: u32) -> Option<u32> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix_id == prefix_id)
            .map(|b| b.uri_id)
    }

    /// Resolve the in-scope default namespace
    pub fn resolve_default(&self) -> Option<u32> {
        self.resolve(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_prefix_is_prebound() {
        let mut strings = StringPool::new();
        let resolver = NamespaceResolver::new(&mut strings);
        let xml_id = strings.intern(b"xml");
        assert!(resolver.resolve(xml_id).is_some());
    }

    #[test]
    fn declare_and_resolve() {
        let mut strings = StringPool::new();
        let mut resolver = NamespaceResolver::new(&mut strings);
        let prefix = strings.intern(b"xlink");
        let uri = strings.intern(b"http://www.w3.org/1999/xlink");

        resolver.push_scope();
        resolver.declare(prefix, uri);
        assert_eq!(resolver.resolve(prefix), Some(uri));
    }

    #[test]
    fn bindings_unwind_with_scope() {
        let mut strings = StringPool::new();
        let mut resolver = NamespaceResolver::new(&mut strings);
        let prefix = strings.intern(b"a");
        let uri = strings.intern(b"http://example.com/a");

        resolver.push_scope();
        resolver.declare(prefix, uri);
        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), None);
    }

    #[test]
    fn inner_binding_shadows_outer() {
        let mut strings = StringPool::new();
        let mut resolver = NamespaceResolver::new(&mut strings);
        let prefix = strings.intern(b"ns");
        let uri1 = strings.intern(b"http://example.com/1");
        let uri2 = strings.intern(b"http://example.com/2");

        resolver.push_scope();
        resolver.declare(prefix, uri1);
        resolver.push_scope();
        resolver.declare(prefix, uri2);
        assert_eq!(resolver.resolve(prefix), Some(uri2));

        resolver.pop_scope();
        assert_eq!(resolver.resolve(prefix), Some(uri1));
    }
}
