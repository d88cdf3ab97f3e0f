//! Structural editor: create, patch-update, cascading delete, group,
//! ungroup, reparent.
//!
//! Every coordinate rewrite keeps the element's absolute canvas position,
//! and every operation that moves elements between scopes leaves both the
//! source and the destination scope densely ranked.

use crate::document::Document;
use crate::error::{EngineError, Result};
use crate::id::ElementId;
use crate::model::{Element, ElementKind, ElementType};
use crate::order::Scope;
use crate::payload::{decode_element, merge_patch, payload_type, requested_id, requested_parent};
use kurbo::{Point, Rect};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A new group and the children moved into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped {
    pub group: Element,
    pub children: Vec<Element>,
}

/// Children released from a container, and the container's id.
#[derive(Debug, Clone, PartialEq)]
pub struct Ungrouped {
    pub children: Vec<Element>,
    pub removed: ElementId,
}

/// Where a multi-element selection sits: the shared parent when every
/// member has the same one, otherwise the canvas (absolute coordinates).
#[derive(Debug, Clone)]
pub(crate) struct Placement {
    pub parent: Option<ElementId>,
    pub bounds: Rect,
    pub origins: Vec<(ElementId, Point)>,
}

impl Document {
    // ─── Create ──────────────────────────────────────────────────────────

    /// Create one element from a variant payload. The element is stacked
    /// on top of its scope.
    pub fn create_element(&mut self, payload: &Value) -> Result<Element> {
        let ty = payload_type(payload)?;
        let id = match requested_id(payload) {
            Some(id) if !self.store.contains(id) => id,
            Some(id) => {
                log::debug!("create: id {id} already in use, generating a new one");
                self.store.allocate_id(ty)
            }
            None => self.store.allocate_id(ty),
        };
        let element = decode_element(payload, id)?;
        self.insert_new(element)
    }

    /// Create several elements (paste). Invalid payloads are skipped. A
    /// payload whose `parentId` names another payload in the batch follows
    /// that element, wherever it sits in the batch and even when it had to
    /// be given a fresh id. Results come back in payload order.
    pub fn create_elements(&mut self, payloads: &[Value]) -> Result<Vec<Element>> {
        // Settle every id up front so parent references can be rewritten
        // before anything is inserted.
        let mut ids: Vec<Option<ElementId>> = Vec::with_capacity(payloads.len());
        let mut renamed: HashMap<ElementId, ElementId> = HashMap::new();
        for payload in payloads {
            let ty = match payload_type(payload) {
                Ok(ty) => ty,
                Err(err) => {
                    log::warn!("batch create: skipping payload: {err}");
                    ids.push(None);
                    continue;
                }
            };
            let claimed = |id: &ElementId| ids.contains(&Some(*id));
            let asked = requested_id(payload);
            let id = match asked {
                Some(id) if !self.store.contains(id) && !claimed(&id) => id,
                _ => loop {
                    let fresh = self.store.allocate_id(ty);
                    if !claimed(&fresh) {
                        break fresh;
                    }
                },
            };
            if let Some(asked) = asked {
                renamed.entry(asked).or_insert(id);
            }
            ids.push(Some(id));
        }

        let mut prepared: Vec<Value> = Vec::with_capacity(payloads.len());
        let mut in_batch_parent: Vec<Option<usize>> = Vec::with_capacity(payloads.len());
        for (payload, id) in payloads.iter().zip(&ids) {
            let mut payload = payload.clone();
            let parent = requested_parent(&payload).map(|p| renamed.get(&p).copied().unwrap_or(p));
            let mut parent_slot = None;
            if let Some(id) = id
                && let Some(obj) = payload.as_object_mut()
            {
                obj.insert("id".into(), Value::String(id.as_str().to_owned()));
                if let Some(parent) = parent {
                    obj.insert("parentId".into(), Value::String(parent.as_str().to_owned()));
                    parent_slot = ids.iter().position(|slot| *slot == Some(parent));
                }
            }
            prepared.push(payload);
            in_batch_parent.push(parent_slot);
        }

        let mut created: Vec<Option<Element>> = vec![None; payloads.len()];
        for index in parents_first(&in_batch_parent) {
            if ids[index].is_none() {
                continue;
            }
            match self.create_element(&prepared[index]) {
                Ok(el) => created[index] = Some(el),
                Err(err) => log::warn!("batch create: skipping payload: {err}"),
            }
        }

        let created: Vec<Element> = created.into_iter().flatten().collect();
        if created.is_empty() {
            return Err(EngineError::EmptySelection("no payload in the batch was valid"));
        }
        Ok(created)
    }

    /// Check references, insert, and stack on top of the element's scope.
    pub(crate) fn insert_new(&mut self, element: Element) -> Result<Element> {
        if let Some(parent) = element.parent_id {
            self.check_parent(element.id, parent)?;
        }
        self.check_definition(&element)?;
        let id = element.id;
        log::debug!("create {} {id}", element.element_type());
        self.store.insert(element);
        self.raise_to_top(id);
        self.fetch(id)
    }

    pub(crate) fn fetch(&self, id: ElementId) -> Result<Element> {
        self.store.get(id).cloned().ok_or(EngineError::NotFound(id))
    }

    fn check_definition(&self, element: &Element) -> Result<()> {
        if let ElementKind::ComponentInstance(inst) = &element.kind
            && !self.components.contains(inst.definition_id)
        {
            return Err(EngineError::Validation(format!(
                "unknown component definition {}",
                inst.definition_id
            )));
        }
        Ok(())
    }

    /// `parent` must exist, be a container, and not sit inside `child`.
    pub(crate) fn check_parent(&self, child: ElementId, parent: ElementId) -> Result<()> {
        let reject = |reason| EngineError::InvalidParent { child, parent, reason };
        let Some(p) = self.store.get(parent) else {
            return Err(reject("parent does not exist"));
        };
        if !p.is_container() {
            return Err(reject("parent is not a frame or group"));
        }
        if parent == child || self.store.is_ancestor_of(child, parent) {
            return Err(reject("would make the element its own ancestor"));
        }
        Ok(())
    }

    // ─── Update ──────────────────────────────────────────────────────────

    /// Copy-on-write patch of one element. A failed validation leaves the
    /// stored element untouched.
    pub fn update_element(&mut self, id: ElementId, patch: &Map<String, Value>) -> Result<Element> {
        let current = self.store.get(id).ok_or(EngineError::NotFound(id))?;
        let next = merge_patch(current, patch)?;
        self.check_definition(&next)?;
        self.store.insert(next.clone());
        Ok(next)
    }

    // ─── Delete ──────────────────────────────────────────────────────────

    /// Remove `id` and all of its descendants. Returns the ids actually
    /// removed (empty when `id` is unknown).
    pub fn delete_element(&mut self, id: ElementId) -> Vec<ElementId> {
        let Some(scope) = self.store.get(id).map(Scope::of) else {
            log::debug!("delete: {id} already gone");
            return Vec::new();
        };
        let closure = self.store.descendants(id);
        let removed: Vec<ElementId> = closure
            .into_iter()
            .filter(|d| self.store.remove(*d).is_some())
            .collect();
        self.normalize_scope(scope);
        log::debug!("delete {id}: removed {} element(s)", removed.len());
        removed
    }

    // ─── Group / Ungroup ─────────────────────────────────────────────────

    /// Known, distinct ids whose ancestors are not also selected (those
    /// travel with the ancestor anyway).
    pub(crate) fn resolve_selection(&self, ids: &[ElementId]) -> Vec<ElementId> {
        let mut picked: Vec<ElementId> = Vec::with_capacity(ids.len());
        for id in ids {
            if self.store.contains(*id) && !picked.contains(id) {
                picked.push(*id);
            } else if !self.store.contains(*id) {
                log::debug!("selection: dropping stale id {id}");
            }
        }
        let graph = self.store.ownership_graph();
        picked
            .iter()
            .copied()
            .filter(|id| !picked.iter().any(|other| other != id && graph.reaches(*other, *id)))
            .collect()
    }

    /// Union box of a resolved selection and each member's origin in the
    /// chosen coordinate frame. `None` for an empty selection.
    pub(crate) fn place_selection(&self, ids: &[ElementId]) -> Option<Placement> {
        let first_parent = self.store.get(*ids.first()?)?.parent_id;
        let shared = ids
            .iter()
            .all(|id| self.store.get(*id).is_some_and(|el| el.parent_id == first_parent));

        let mut bounds: Option<Rect> = None;
        let mut origins = Vec::with_capacity(ids.len());
        for id in ids {
            let el = self.store.get(*id)?;
            let origin = if shared {
                el.origin()
            } else {
                self.store.absolute_position(el)
            };
            let rect = Rect::from_origin_size(origin, (el.width, el.height));
            bounds = Some(bounds.map_or(rect, |b| b.union(rect)));
            origins.push((*id, origin));
        }

        Some(Placement {
            parent: if shared { first_parent } else { None },
            bounds: bounds?,
            origins,
        })
    }

    /// Wrap the listed elements in a new group sized to their union box.
    pub fn group_elements(&mut self, ids: &[ElementId]) -> Result<Grouped> {
        let mut selection = self.resolve_selection(ids);
        let placement = self
            .place_selection(&selection)
            .ok_or(EngineError::EmptySelection("none of the ids to group exist"))?;
        self.sort_by_z(&mut selection);

        let mut vacated: Vec<Scope> = Vec::new();
        for id in &selection {
            if let Some(scope) = self.store.get(*id).map(Scope::of)
                && !vacated.contains(&scope)
            {
                vacated.push(scope);
            }
        }

        let group_id = self.store.allocate_id(ElementType::Group);
        let mut group = Element::new(group_id, ElementKind::Group);
        group.set_origin(placement.bounds.origin());
        group.width = placement.bounds.width();
        group.height = placement.bounds.height();
        group.parent_id = placement.parent;
        self.store.insert(group);

        let offset = placement.bounds.origin().to_vec2();
        for (id, origin) in &placement.origins {
            if let Some(el) = self.store.get_mut(*id) {
                el.set_origin(*origin - offset);
                el.parent_id = Some(group_id);
            }
        }

        for scope in vacated {
            self.normalize_scope(scope);
        }
        self.raise_to_top(group_id);
        self.arrange_scope(Scope::Children(group_id), &selection);

        log::debug!("group {group_id}: {} child(ren)", selection.len());
        Ok(Grouped {
            group: self.fetch(group_id)?,
            children: selection
                .iter()
                .filter_map(|id| self.store.get(*id).cloned())
                .collect(),
        })
    }

    /// Dissolve a group or frame, promoting its direct children to the
    /// container's own parent.
    pub fn ungroup_element(&mut self, container_id: ElementId) -> Result<Ungrouped> {
        let container = self
            .store
            .get(container_id)
            .ok_or(EngineError::NotFound(container_id))?;
        if !container.is_container() {
            return Err(EngineError::Validation(format!(
                "{container_id} is a {}, not a frame or group",
                container.element_type()
            )));
        }
        let destination = container.parent_id;
        let offset = container.origin().to_vec2();
        let children = self.scope_members(Scope::Children(container_id));

        self.store.remove(container_id);
        for id in &children {
            if let Some(el) = self.store.get_mut(*id) {
                el.set_origin(el.origin() + offset);
                el.parent_id = destination;
            }
        }
        let scope = match destination {
            Some(p) => Scope::Children(p),
            None => Scope::Root,
        };
        self.arrange_scope(scope, &children);

        log::debug!("ungroup {container_id}: released {} child(ren)", children.len());
        Ok(Ungrouped {
            children: children
                .iter()
                .filter_map(|id| self.store.get(*id).cloned())
                .collect(),
            removed: container_id,
        })
    }

    // ─── Reparent ────────────────────────────────────────────────────────

    /// Move `child` under `new_parent` (or to the root), keeping its
    /// absolute position and stacking it on top of the destination scope.
    ///
    /// Offsets are recomputed through absolute coordinates, so a round trip
    /// through another container is exact up to `f64` rounding. Reparenting
    /// to the current parent leaves the offset untouched.
    pub fn reparent_element(&mut self, child: ElementId, new_parent: Option<ElementId>) -> Result<Element> {
        let el = self.store.get(child).ok_or(EngineError::NotFound(child))?;
        let old_scope = Scope::of(el);
        let absolute = self.store.absolute_position(el);
        let parent_origin = match new_parent {
            Some(parent) => {
                self.check_parent(child, parent)?;
                self.store.resolve_absolute(parent).unwrap_or(Point::ZERO)
            }
            None => Point::ZERO,
        };
        let new_scope = match new_parent {
            Some(p) => Scope::Children(p),
            None => Scope::Root,
        };

        if new_scope != old_scope
            && let Some(el) = self.store.get_mut(child)
        {
            el.set_origin((absolute - parent_origin).to_point());
            el.parent_id = new_parent;
        }
        if new_scope != old_scope {
            self.normalize_scope(old_scope);
        }
        self.raise_to_top(child);
        self.fetch(child)
    }
}

/// Visit order in which every batch entry comes after its in-batch parent.
/// Siblings keep their batch order; a parent cycle is broken where it is
/// first entered.
fn parents_first(parents: &[Option<usize>]) -> Vec<usize> {
    let mut order = Vec::with_capacity(parents.len());
    let mut placed = vec![false; parents.len()];
    for start in 0..parents.len() {
        let mut chain = Vec::new();
        let mut cursor = Some(start);
        while let Some(i) = cursor {
            if placed[i] || chain.contains(&i) {
                break;
            }
            chain.push(i);
            cursor = parents[i];
        }
        for i in chain.into_iter().rev() {
            placed[i] = true;
            order.push(i);
        }
    }
    order
}
