//! Scene graph store: the element arena, the id allocator, and
//! parent-chain coordinate resolution.
//!
//! The store never interprets z-order or structure on its own; the
//! ordering engine and the structural editor drive it through `Document`.

use crate::id::ElementId;
use crate::model::{Element, ElementType};
use kurbo::Point;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::HashMap;

/// The element collection, keyed by id. This is also the unit that the
/// history log snapshots.
pub type ElementMap = HashMap<ElementId, Element>;

#[derive(Debug, Clone, Default)]
pub struct SceneStore {
    elements: ElementMap,
    /// Monotonic counter behind generated ids. Never rewound, so ids stay
    /// unique across undo/redo.
    next_id: u64,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn elements(&self) -> &ElementMap {
        &self.elements
    }

    pub(crate) fn insert(&mut self, element: Element) -> Option<Element> {
        self.elements.insert(element.id, element)
    }

    pub(crate) fn remove(&mut self, id: ElementId) -> Option<Element> {
        self.elements.remove(&id)
    }

    /// Replace the whole collection (history restore). The id counter is
    /// kept as is.
    pub fn restore(&mut self, elements: ElementMap) {
        self.elements = elements;
    }

    /// Generate a fresh id for an element of type `ty`.
    pub fn allocate_id(&mut self, ty: ElementType) -> ElementId {
        self.allocate_with_prefix(ty.id_prefix())
    }

    /// Generate a fresh `{prefix}_{n}` id not present in the store.
    pub fn allocate_with_prefix(&mut self, prefix: &str) -> ElementId {
        loop {
            self.next_id += 1;
            let id = ElementId::intern(&format!("{prefix}_{}", self.next_id));
            if !self.contains(id) {
                return id;
            }
        }
    }

    /// Parent of `id`, if it has one and the parent still exists.
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.get(id)
            .and_then(|el| el.parent_id)
            .filter(|pid| self.contains(*pid))
    }

    /// Direct children of `parent` (`None` = root level), unordered.
    pub fn children_of(&self, parent: Option<ElementId>) -> Vec<ElementId> {
        self.elements
            .values()
            .filter(|el| el.parent_id == parent)
            .map(|el| el.id)
            .collect()
    }

    /// Absolute canvas position of `element`: its own offset plus every
    /// ancestor's offset, stopping at a root or a dangling parent.
    pub fn absolute_position(&self, element: &Element) -> Point {
        let mut pos = element.origin();
        let mut parent = element.parent_id;
        let mut hops = 0;
        while let Some(pid) = parent {
            let Some(p) = self.get(pid) else { break };
            pos += p.origin().to_vec2();
            parent = p.parent_id;
            hops += 1;
            if hops > self.elements.len() {
                log::warn!("parent chain of {} does not terminate", element.id);
                break;
            }
        }
        pos
    }

    /// Absolute position of the element with `id`.
    pub fn resolve_absolute(&self, id: ElementId) -> Option<Point> {
        self.get(id).map(|el| self.absolute_position(el))
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: ElementId, descendant: ElementId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let graph = self.ownership_graph();
        graph.reaches(ancestor, descendant)
    }

    /// Build the parent → child graph for traversal queries.
    pub fn ownership_graph(&self) -> OwnershipGraph {
        OwnershipGraph::build(self)
    }

    /// `id` followed by its transitive descendants, breadth-first.
    /// Empty when `id` is unknown.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        self.ownership_graph().closure(id)
    }
}

/// Parent → child containment edges, built on demand from the
/// `parent_id` back-references.
#[derive(Debug)]
pub struct OwnershipGraph {
    graph: DiGraph<ElementId, ()>,
    index: HashMap<ElementId, NodeIndex>,
}

impl OwnershipGraph {
    fn build(store: &SceneStore) -> Self {
        let mut graph = DiGraph::with_capacity(store.len(), store.len());
        let mut index = HashMap::with_capacity(store.len());
        for id in store.elements.keys() {
            index.insert(*id, graph.add_node(*id));
        }
        for el in store.iter() {
            if let Some(pid) = el.parent_id
                && let (Some(&p), Some(&c)) = (index.get(&pid), index.get(&el.id))
            {
                graph.add_edge(p, c, ());
            }
        }
        Self { graph, index }
    }

    /// Breadth-first closure from `root`, including `root` itself.
    pub fn closure(&self, root: ElementId) -> Vec<ElementId> {
        let Some(&start) = self.index.get(&root) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(nx) = bfs.next(&self.graph) {
            out.push(self.graph[nx]);
        }
        out
    }

    /// Whether `to` is reachable from `from` through containment.
    pub fn reaches(&self, from: ElementId, to: ElementId) -> bool {
        match (self.index.get(&from), self.index.get(&to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementKind;
    use pretty_assertions::assert_eq;

    fn place(store: &mut SceneStore, id: &str, kind: ElementKind, at: (f64, f64), parent: Option<&str>) {
        let mut el = Element::new(ElementId::intern(id), kind);
        el.x = at.0;
        el.y = at.1;
        el.parent_id = parent.map(ElementId::intern);
        store.insert(el);
    }

    #[test]
    fn allocated_ids_skip_taken_ones() {
        let mut store = SceneStore::new();
        place(&mut store, "group_1", ElementKind::Group, (0.0, 0.0), None);
        let id = store.allocate_id(ElementType::Group);
        assert_ne!(id.as_str(), "group_1");
        assert!(id.as_str().starts_with("group_"));
        let next = store.allocate_id(ElementType::Group);
        assert_ne!(id, next);
    }

    #[test]
    fn absolute_position_sums_parent_chain() {
        let mut store = SceneStore::new();
        place(&mut store, "abs_frame", ElementKind::Group, (100.0, 50.0), None);
        place(&mut store, "abs_group", ElementKind::Group, (10.0, 5.0), Some("abs_frame"));
        place(&mut store, "abs_leaf", ElementKind::Group, (1.0, 2.0), Some("abs_group"));

        let p = store.resolve_absolute(ElementId::intern("abs_leaf")).unwrap();
        assert_eq!((p.x, p.y), (111.0, 57.0));
        let root = store.resolve_absolute(ElementId::intern("abs_frame")).unwrap();
        assert_eq!((root.x, root.y), (100.0, 50.0));
        assert!(store.resolve_absolute(ElementId::intern("abs_missing")).is_none());
    }

    #[test]
    fn dangling_parent_terminates_resolution() {
        let mut store = SceneStore::new();
        place(&mut store, "orphan", ElementKind::Group, (3.0, 4.0), Some("never_created"));
        let p = store.resolve_absolute(ElementId::intern("orphan")).unwrap();
        assert_eq!((p.x, p.y), (3.0, 4.0));
        assert_eq!(store.parent_of(ElementId::intern("orphan")), None);
    }

    #[test]
    fn descendants_walk_breadth_first() {
        let mut store = SceneStore::new();
        place(&mut store, "d_root", ElementKind::Group, (0.0, 0.0), None);
        place(&mut store, "d_mid", ElementKind::Group, (0.0, 0.0), Some("d_root"));
        place(&mut store, "d_leaf", ElementKind::Group, (0.0, 0.0), Some("d_mid"));
        place(&mut store, "d_other", ElementKind::Group, (0.0, 0.0), None);

        let ids = store.descendants(ElementId::intern("d_root"));
        assert_eq!(
            ids,
            vec![
                ElementId::intern("d_root"),
                ElementId::intern("d_mid"),
                ElementId::intern("d_leaf"),
            ]
        );
        assert!(store.descendants(ElementId::intern("d_nope")).is_empty());
    }

    #[test]
    fn ancestry_checks() {
        let mut store = SceneStore::new();
        place(&mut store, "an_grp", ElementKind::Group, (0.0, 0.0), None);
        place(&mut store, "an_inner", ElementKind::Group, (0.0, 0.0), Some("an_grp"));
        place(&mut store, "an_leaf", ElementKind::Group, (0.0, 0.0), Some("an_inner"));

        let (grp, inner, leaf) = (
            ElementId::intern("an_grp"),
            ElementId::intern("an_inner"),
            ElementId::intern("an_leaf"),
        );
        assert!(store.is_ancestor_of(grp, leaf));
        assert!(store.is_ancestor_of(inner, leaf));
        assert!(!store.is_ancestor_of(leaf, grp));
        assert!(!store.is_ancestor_of(grp, grp));
    }
}
