//! Z-order engine.
//!
//! Two scopes exist: the root set (elements without a parent) and sibling
//! sets (elements sharing a parent). Every operation that touches a scope
//! rewrites the whole scope to a contiguous run of ranks, so no gaps or
//! duplicates survive. Root ranks start at 0; sibling ranks start just
//! above their container's rank at the time the scope is renumbered.
//!
//! The layer panel drag works on the flat list of all elements instead,
//! so it can leave a scope with gaps until the next operation on it.

use crate::document::Document;
use crate::id::ElementId;
use crate::model::Element;
use serde::{Deserialize, Serialize};

/// An ordering scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Root,
    Children(ElementId),
}

impl Scope {
    pub fn of(element: &Element) -> Self {
        match element.parent_id {
            Some(parent) => Scope::Children(parent),
            None => Scope::Root,
        }
    }

    fn parent(self) -> Option<ElementId> {
        match self {
            Scope::Root => None,
            Scope::Children(p) => Some(p),
        }
    }
}

/// Layer command from a toolbar or context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZCommand {
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,
}

/// Where a dragged row lands relative to the row it was dropped on.
///
/// In the layer panel `Above` means in front of the target (higher rank);
/// in the slide list it means before the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    Above,
    Below,
}

impl Document {
    /// Members of `scope`, back to front.
    pub fn scope_members(&self, scope: Scope) -> Vec<ElementId> {
        let mut ids = self.store.children_of(scope.parent());
        self.sort_by_z(&mut ids);
        ids
    }

    /// First rank of a scope.
    pub fn scope_base(&self, scope: Scope) -> u32 {
        match scope {
            Scope::Root => 0,
            Scope::Children(p) => self.store.get(p).map_or(0, |parent| parent.z_index + 1),
        }
    }

    /// Whether the ranks in `scope` form a gap-free run without repeats.
    pub fn is_scope_dense(&self, scope: Scope) -> bool {
        let ranks: Vec<u32> = self
            .scope_members(scope)
            .iter()
            .filter_map(|id| self.store.get(*id))
            .map(|el| el.z_index)
            .collect();
        ranks.windows(2).all(|w| w[1] == w[0] + 1)
    }

    pub(crate) fn sort_by_z(&self, ids: &mut [ElementId]) {
        let z = |id: &ElementId| self.store.get(*id).map_or(0, |el| el.z_index);
        ids.sort_by(|a, b| z(a).cmp(&z(b)).then_with(|| a.as_str().cmp(b.as_str())));
    }

    fn renumber(&mut self, base: u32, order: &[ElementId]) -> Vec<Element> {
        let mut touched = Vec::with_capacity(order.len());
        for (rank, id) in order.iter().enumerate() {
            if let Some(el) = self.store.get_mut(*id) {
                el.z_index = base + rank as u32;
                touched.push(el.clone());
            }
        }
        touched
    }

    /// Apply a layer command within the target's scope. Returns the whole
    /// renumbered scope; unknown ids are a no-op.
    pub fn reorder(&mut self, id: ElementId, command: ZCommand) -> Vec<Element> {
        let Some(scope) = self.store.get(id).map(Scope::of) else {
            log::warn!("reorder: unknown element {id}");
            return Vec::new();
        };
        let mut order = self.scope_members(scope);
        let Some(current) = order.iter().position(|x| *x == id) else {
            return Vec::new();
        };
        order.remove(current);
        let slot = match command {
            ZCommand::BringForward => (current + 1).min(order.len()),
            ZCommand::SendBackward => current.saturating_sub(1),
            ZCommand::BringToFront => order.len(),
            ZCommand::SendToBack => 0,
        };
        order.insert(slot, id);
        log::debug!("reorder {id} {command:?}: {current} -> {slot}");

        let base = self.scope_base(scope);
        self.renumber(base, &order)
    }

    /// Drag-and-drop in the layer panel. Works on the flat list of every
    /// element regardless of parentage and renumbers it `0..n`.
    pub fn reorder_layer(
        &mut self,
        dragged: ElementId,
        target: ElementId,
        position: DropPosition,
    ) -> Vec<Element> {
        if dragged == target || !self.store.contains(dragged) || !self.store.contains(target) {
            log::warn!("reorder_layer: cannot drop {dragged} onto {target}");
            return Vec::new();
        }
        let mut order: Vec<ElementId> = self.store.iter().map(|el| el.id).collect();
        self.sort_by_z(&mut order);
        order.retain(|x| *x != dragged);
        let Some(t) = order.iter().position(|x| *x == target) else {
            return Vec::new();
        };
        let slot = match position {
            DropPosition::Above => t + 1,
            DropPosition::Below => t,
        };
        order.insert(slot, dragged);
        self.renumber(0, &order)
    }

    /// Move `id` to the top of its current scope, closing any gaps left by
    /// earlier removals.
    pub(crate) fn raise_to_top(&mut self, id: ElementId) {
        let Some(scope) = self.store.get(id).map(Scope::of) else {
            return;
        };
        let mut order = self.scope_members(scope);
        order.retain(|x| *x != id);
        order.push(id);
        let base = self.scope_base(scope);
        self.renumber(base, &order);
    }

    /// Renumber `scope` in its current order.
    pub(crate) fn normalize_scope(&mut self, scope: Scope) {
        let order = self.scope_members(scope);
        let base = self.scope_base(scope);
        self.renumber(base, &order);
    }

    /// Renumber `scope` in the given order (members not listed keep their
    /// relative order after the listed ones).
    pub(crate) fn arrange_scope(&mut self, scope: Scope, front_order: &[ElementId]) {
        let mut order: Vec<ElementId> = self
            .scope_members(scope)
            .into_iter()
            .filter(|id| !front_order.contains(id))
            .collect();
        order.extend(front_order.iter().copied());
        let base = self.scope_base(scope);
        self.renumber(base, &order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rect(doc: &mut Document, id: &str, parent: Option<&str>) -> ElementId {
        doc.create_element(&json!({
            "id": id,
            "element_type": "shape",
            "shape_type": "rect",
            "x": 0, "y": 0,
            "parentId": parent,
        }))
        .unwrap()
        .id
    }

    fn frame(doc: &mut Document, id: &str) -> ElementId {
        doc.create_element(&json!({ "id": id, "element_type": "frame", "x": 0, "y": 0 }))
            .unwrap()
            .id
    }

    fn ranks(doc: &Document, scope: Scope) -> Vec<(String, u32)> {
        doc.scope_members(scope)
            .into_iter()
            .map(|id| (id.to_string(), doc.element(id).unwrap().z_index))
            .collect()
    }

    #[test]
    fn creation_stacks_root_elements() {
        let mut doc = Document::new();
        rect(&mut doc, "zc_a", None);
        rect(&mut doc, "zc_b", None);
        rect(&mut doc, "zc_c", None);
        assert_eq!(
            ranks(&doc, Scope::Root),
            vec![("zc_a".into(), 0), ("zc_b".into(), 1), ("zc_c".into(), 2)]
        );
    }

    #[test]
    fn commands_move_within_root_scope() {
        let mut doc = Document::new();
        let a = rect(&mut doc, "zr_a", None);
        rect(&mut doc, "zr_b", None);
        let c = rect(&mut doc, "zr_c", None);

        let touched = doc.reorder(a, ZCommand::BringForward);
        assert_eq!(touched.len(), 3);
        assert_eq!(doc.element(a).unwrap().z_index, 1);

        doc.reorder(a, ZCommand::BringToFront);
        assert_eq!(doc.element(a).unwrap().z_index, 2);

        doc.reorder(a, ZCommand::BringForward);
        assert_eq!(doc.element(a).unwrap().z_index, 2, "clamped at the front");

        doc.reorder(c, ZCommand::SendToBack);
        assert_eq!(
            ranks(&doc, Scope::Root),
            vec![("zr_c".into(), 0), ("zr_b".into(), 1), ("zr_a".into(), 2)]
        );

        doc.reorder(c, ZCommand::SendBackward);
        assert_eq!(doc.element(c).unwrap().z_index, 0, "clamped at the back");
    }

    #[test]
    fn sibling_scope_starts_above_parent() {
        let mut doc = Document::new();
        rect(&mut doc, "zs_bg", None);
        let f = frame(&mut doc, "zs_frame");
        let a = rect(&mut doc, "zs_a", Some("zs_frame"));
        let b = rect(&mut doc, "zs_b", Some("zs_frame"));
        let parent_z = doc.element(f).unwrap().z_index;

        let touched = doc.reorder(b, ZCommand::SendToBack);
        assert_eq!(touched.len(), 2, "only the sibling set is renumbered");
        assert_eq!(doc.element(b).unwrap().z_index, parent_z + 1);
        assert_eq!(doc.element(a).unwrap().z_index, parent_z + 2);
        assert!(doc.is_scope_dense(Scope::Children(f)));
        assert!(doc.is_scope_dense(Scope::Root));
    }

    #[test]
    fn any_command_sequence_keeps_scope_dense() {
        let mut doc = Document::new();
        let ids: Vec<ElementId> = (0..6).map(|i| rect(&mut doc, &format!("zp_{i}"), None)).collect();
        let commands = [
            ZCommand::BringForward,
            ZCommand::SendToBack,
            ZCommand::BringToFront,
            ZCommand::SendBackward,
        ];
        for step in 0..40 {
            let id = ids[(step * 7) % ids.len()];
            doc.reorder(id, commands[step % commands.len()]);
            let mut zs: Vec<u32> = doc.store().iter().map(|el| el.z_index).collect();
            zs.sort_unstable();
            assert_eq!(zs, (0..ids.len() as u32).collect::<Vec<_>>());
        }
    }

    #[test]
    fn layer_drop_reorders_global_list() {
        let mut doc = Document::new();
        let a = rect(&mut doc, "zl_a", None);
        let b = rect(&mut doc, "zl_b", None);
        let c = rect(&mut doc, "zl_c", None);

        let all = doc.reorder_layer(a, c, DropPosition::Above);
        assert_eq!(all.len(), 3);
        assert_eq!(
            ranks(&doc, Scope::Root),
            vec![("zl_b".into(), 0), ("zl_c".into(), 1), ("zl_a".into(), 2)]
        );

        doc.reorder_layer(c, b, DropPosition::Below);
        assert_eq!(
            ranks(&doc, Scope::Root),
            vec![("zl_c".into(), 0), ("zl_b".into(), 1), ("zl_a".into(), 2)]
        );
    }

    #[test]
    fn layer_drop_spans_parentage() {
        let mut doc = Document::new();
        frame(&mut doc, "zx_frame");
        let child = rect(&mut doc, "zx_child", Some("zx_frame"));
        let top = rect(&mut doc, "zx_top", None);

        let all = doc.reorder_layer(child, top, DropPosition::Above);
        let mut zs: Vec<u32> = all.iter().map(|el| el.z_index).collect();
        zs.sort_unstable();
        assert_eq!(zs, vec![0, 1, 2]);
        assert_eq!(doc.element(child).unwrap().z_index, 2);
    }

    #[test]
    fn unknown_ids_are_noops() {
        let mut doc = Document::new();
        let a = rect(&mut doc, "zu_a", None);
        let ghost = ElementId::intern("zu_ghost");
        assert!(doc.reorder(ghost, ZCommand::BringToFront).is_empty());
        assert!(doc.reorder_layer(ghost, a, DropPosition::Above).is_empty());
        assert!(doc.reorder_layer(a, a, DropPosition::Below).is_empty());
    }

    #[test]
    fn commands_parse_from_wire_names() {
        let cmd: ZCommand = serde_json::from_value(json!("BRING_TO_FRONT")).unwrap();
        assert_eq!(cmd, ZCommand::BringToFront);
        let pos: DropPosition = serde_json::from_value(json!("below")).unwrap();
        assert_eq!(pos, DropPosition::Below);
    }
}
