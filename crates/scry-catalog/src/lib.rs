// scry-catalog -- the namespace trie the resolver searches.
//
// Built from the registry's module list off the interactive path, published
// as an immutable Arc, and rebuilt from scratch when settings change. A
// build is cooperatively cancellable at per-type granularity; a cancelled
// build yields nothing and must be retried.

mod worker;

pub use worker::{spawn_build, BuildPoll, CancelToken, CatalogBuild};

use rustc_hash::FxHashMap;

use scry_common::settings::Settings;
use scry_common::value::TypeId;
use scry_registry::Registry;

/// One trie node: child segments keyed by name, and the type that ends
/// here, if any. A node can be both (a type with nested types under it).
#[derive(Debug, Default)]
struct Node {
    children: FxHashMap<String, Node>,
    ty: Option<TypeId>,
}

/// What a child segment under a prefix is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Namespace,
    Type(TypeId),
}

/// The built catalog: namespace trie plus a flat declaring-namespace map
/// used for membership diagnostics.
#[derive(Debug, Default)]
pub struct Catalog {
    root: Node,
    namespaces: FxHashMap<String, Vec<TypeId>>,
    type_count: usize,
}

impl Catalog {
    /// Number of indexed types.
    pub fn type_count(&self) -> usize {
        self.type_count
    }

    fn node(&self, dotted: &str) -> Option<&Node> {
        if dotted.is_empty() {
            return Some(&self.root);
        }
        let mut node = &self.root;
        for segment in dotted.split('.') {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    /// Exact full-name lookup.
    pub fn lookup(&self, dotted: &str) -> Option<TypeId> {
        self.node(dotted)?.ty
    }

    /// Resolve a dotted prefix: the bare prefix first, then each
    /// using-namespace in declared order. First hit wins; there is no
    /// ambiguity detection.
    pub fn resolve(&self, dotted: &str, usings: &[String]) -> Option<TypeId> {
        if let Some(id) = self.lookup(dotted) {
            return Some(id);
        }
        for using in usings {
            if let Some(id) = self.lookup(&format!("{using}.{dotted}")) {
                return Some(id);
            }
        }
        None
    }

    /// Child segments directly under a dotted prefix (namespace or type
    /// node). Empty prefix lists the root namespace.
    pub fn children(&self, dotted: &str) -> Vec<(String, EntryKind)> {
        let Some(node) = self.node(dotted) else {
            return Vec::new();
        };
        node.children
            .iter()
            .map(|(name, child)| {
                let kind = match child.ty {
                    Some(id) => EntryKind::Type(id),
                    None => EntryKind::Namespace,
                };
                (name.clone(), kind)
            })
            .collect()
    }

    /// Whether a dotted prefix names a known namespace (or type) node.
    pub fn prefix_exists(&self, dotted: &str) -> bool {
        self.node(dotted).is_some()
    }

    /// Types declared directly in a namespace, for diagnostics.
    pub fn declared_in(&self, namespace: &str) -> &[TypeId] {
        self.namespaces.get(namespace).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Build a catalog from the registry's modules in registration order.
///
/// Safe mode skips non-public types. On a full-name collision the first
/// registration wins, which preserves the module-scan-order lookup
/// contract. Returns `None` if `cancel` fires mid-scan.
pub fn build(registry: &Registry, settings: &Settings, cancel: &CancelToken) -> Option<Catalog> {
    let mut catalog = Catalog::default();
    for module in registry.modules() {
        for &id in &module.types {
            if cancel.is_cancelled() {
                return None;
            }
            let desc = registry.get(id);
            if settings.safe_mode && !desc.is_public {
                continue;
            }
            insert(&mut catalog, desc.namespace.as_str(), desc.name.as_str(), id);
        }
    }
    Some(catalog)
}

fn insert(catalog: &mut Catalog, namespace: &str, name: &str, id: TypeId) {
    let mut node = &mut catalog.root;
    if !namespace.is_empty() {
        for segment in namespace.split('.') {
            node = node.children.entry(segment.to_string()).or_default();
        }
    }
    let leaf = node.children.entry(name.to_string()).or_default();
    if leaf.ty.is_none() {
        leaf.ty = Some(id);
        catalog.type_count += 1;
        catalog.namespaces.entry(namespace.to_string()).or_default().push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scry_registry::RegistryBuilder;

    fn built(registry: &Registry, settings: &Settings) -> Catalog {
        build(registry, settings, &CancelToken::new()).expect("uncancelled build")
    }

    #[test]
    fn resolve_bare_then_usings_in_order() {
        let mut b = RegistryBuilder::new();
        b.module("m1");
        let a = b.ty("Alpha", "Widget").finish();
        b.module("m2");
        let g = b.ty("Gamma", "Widget").finish();
        let reg = b.finish();
        let catalog = built(&reg, &Settings::default());

        assert_eq!(catalog.resolve("Alpha.Widget", &[]), Some(a));
        assert_eq!(catalog.resolve("Widget", &[]), None);
        let usings = vec!["Gamma".to_string(), "Alpha".to_string()];
        // Declared using order decides, not registration order.
        assert_eq!(catalog.resolve("Widget", &usings), Some(g));
    }

    #[test]
    fn first_registration_wins_on_collision() {
        let mut b = RegistryBuilder::new();
        b.module("m1");
        let first = b.ty("N", "Dup").finish();
        b.module("m2");
        let _second = b.ty("N", "Dup").finish();
        let reg = b.finish();
        let catalog = built(&reg, &Settings::default());
        assert_eq!(catalog.resolve("N.Dup", &[]), Some(first));
    }

    #[test]
    fn safe_mode_hides_non_public_types() {
        let mut b = RegistryBuilder::new();
        b.module("m");
        let hidden = b.ty("N", "Hidden").non_public().finish();
        let reg = b.finish();

        let safe = built(&reg, &Settings::default());
        assert_eq!(safe.resolve("N.Hidden", &[]), None);

        let unsafe_settings = Settings { safe_mode: false, ..Settings::default() };
        let full = built(&reg, &unsafe_settings);
        assert_eq!(full.resolve("N.Hidden", &[]), Some(hidden));
    }

    #[test]
    fn children_distinguish_namespaces_and_types() {
        let mut b = RegistryBuilder::new();
        b.module("m");
        let outer = b.ty("Game", "Outer").finish();
        b.ty("Game.Inner", "Deep").finish();
        let reg = b.finish();
        let catalog = built(&reg, &Settings::default());

        let mut children = catalog.children("Game");
        children.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            children,
            vec![
                ("Inner".to_string(), EntryKind::Namespace),
                ("Outer".to_string(), EntryKind::Type(outer)),
            ]
        );
        assert!(catalog.prefix_exists("Game.Inner"));
        assert_eq!(catalog.declared_in("Game"), &[outer]);
    }

    #[test]
    fn cancelled_build_yields_none() {
        let reg = Registry::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(build(&reg, &Settings::default(), &cancel).is_none());
    }
}
