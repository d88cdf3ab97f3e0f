//! Component templating.
//!
//! A definition is an immutable blueprint captured from live elements:
//! the source roots are translated so the union box starts at the
//! template origin, and their descendants are copied verbatim. Instances
//! reference a definition by id and only carry placement plus property
//! overrides.

use crate::document::Document;
use crate::error::{EngineError, Result};
use crate::id::ElementId;
use crate::model::{Element, ElementKind, ElementType, InstanceProps};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Value kind of an exposed component property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropType {
    Text,
    Color,
    Number,
    Boolean,
    Image,
}

/// One entry of a definition's schema: which field of which template
/// element a named property drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentProperty {
    #[serde(alias = "prop_name")]
    pub prop_name: String,
    #[serde(alias = "target_element_id")]
    pub target_element_id: ElementId,
    #[serde(alias = "target_property")]
    pub target_property: String,
    #[serde(alias = "prop_type")]
    pub prop_type: PropType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub id: ElementId,
    pub name: String,
    /// Template roots first in paint order, each followed by its subtree.
    pub template_elements: Vec<Element>,
    pub schema: Vec<ComponentProperty>,
}

impl ComponentDefinition {
    pub fn template_element(&self, id: ElementId) -> Option<&Element> {
        self.template_elements.iter().find(|el| el.id == id)
    }

    /// Union box of the template roots, in template coordinates.
    pub fn template_bounds(&self) -> Rect {
        self.template_elements
            .iter()
            .filter(|el| el.parent_id.is_none())
            .map(Element::local_bounds)
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    /// Property values as they appear in the template itself.
    pub fn default_properties(&self) -> BTreeMap<String, Value> {
        seed_properties(&self.schema, |id| self.template_element(id))
    }
}

/// Read each schema property's current value off its target element.
fn seed_properties<'a>(
    schema: &[ComponentProperty],
    lookup: impl Fn(ElementId) -> Option<&'a Element>,
) -> BTreeMap<String, Value> {
    let mut properties = BTreeMap::new();
    for prop in schema {
        let value = lookup(prop.target_element_id)
            .and_then(|el| serde_json::to_value(el).ok())
            .and_then(|mut v| v.get_mut(&prop.target_property).map(Value::take));
        match value {
            Some(v) => {
                properties.insert(prop.prop_name.clone(), v);
            }
            None => log::warn!(
                "component property `{}`: {} has no `{}`",
                prop.prop_name,
                prop.target_element_id,
                prop.target_property
            ),
        }
    }
    properties
}

// ─── Catalogue ───────────────────────────────────────────────────────────

/// Registered definitions. Kept outside the element snapshots, so undo
/// never unregisters a definition that instances may still reference.
#[derive(Debug, Clone, Default)]
pub struct ComponentCatalogue {
    definitions: HashMap<ElementId, ComponentDefinition>,
}

impl ComponentCatalogue {
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn get(&self, id: ElementId) -> Option<&ComponentDefinition> {
        self.definitions.get(&id)
    }

    /// All definitions, ordered by id.
    pub fn list(&self) -> Vec<&ComponentDefinition> {
        let mut defs: Vec<&ComponentDefinition> = self.definitions.values().collect();
        defs.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        defs
    }

    pub(crate) fn register(&mut self, definition: ComponentDefinition) {
        self.definitions.insert(definition.id, definition);
    }

    pub(crate) fn remove(&mut self, id: ElementId) -> Option<ComponentDefinition> {
        self.definitions.remove(&id)
    }
}

/// Outcome of turning a selection into a component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentCreated {
    pub definition: ComponentDefinition,
    pub instance: Element,
    pub deleted: Vec<ElementId>,
}

impl Document {
    /// Capture `source_ids` as a new definition, replace them with one
    /// instance occupying their union box, and delete the sources.
    ///
    /// The instance is checked before the definition is registered, so a
    /// rejected placement leaves the catalogue and the sources untouched.
    pub fn create_component_from_elements(
        &mut self,
        name: &str,
        source_ids: &[ElementId],
        schema: Vec<ComponentProperty>,
    ) -> Result<ComponentCreated> {
        let mut sources = self.resolve_selection(source_ids);
        let placement = self
            .place_selection(&sources)
            .ok_or(EngineError::EmptySelection("no source element for the component exists"))?;
        self.sort_by_z(&mut sources);
        let offset = placement.bounds.origin().to_vec2();

        let mut template = Vec::new();
        for root in &sources {
            let at = placement
                .origins
                .iter()
                .find(|(id, _)| id == root)
                .map_or(Point::ZERO, |(_, p)| *p);
            for id in self.store.descendants(*root) {
                let Some(el) = self.store.get(id) else { continue };
                let mut copy = el.clone();
                if id == *root {
                    copy.set_origin(at - offset);
                    copy.parent_id = None;
                }
                template.push(copy);
            }
        }
        for (rank, el) in template.iter_mut().enumerate() {
            el.z_index = rank as u32;
        }

        let (schema, dropped): (Vec<_>, Vec<_>) = schema
            .into_iter()
            .partition(|prop| template.iter().any(|el| el.id == prop.target_element_id));
        for prop in dropped {
            log::warn!(
                "component `{name}`: property `{}` targets {}, which is not part of the selection",
                prop.prop_name,
                prop.target_element_id
            );
        }
        let properties = seed_properties(&schema, |id| self.store.get(id));

        let definition_id = self.store.allocate_with_prefix("comp");
        let mut instance = Element::new(
            self.store.allocate_id(ElementType::ComponentInstance),
            ElementKind::ComponentInstance(InstanceProps {
                definition_id,
                properties,
            }),
        );
        instance.set_origin(placement.bounds.origin());
        instance.width = placement.bounds.width();
        instance.height = placement.bounds.height();
        instance.parent_id = placement.parent;
        instance.name = name.to_owned();
        if let Some(parent) = instance.parent_id {
            self.check_parent(instance.id, parent)?;
        }

        let definition = ComponentDefinition {
            id: definition_id,
            name: name.to_owned(),
            template_elements: template,
            schema,
        };
        self.components.register(definition.clone());
        let instance = self.insert_new(instance)?;

        let mut deleted = Vec::new();
        for id in &sources {
            deleted.extend(self.delete_element(*id));
        }
        log::info!(
            "component `{name}` ({definition_id}) created from {} element(s)",
            deleted.len()
        );

        Ok(ComponentCreated {
            definition,
            instance: self.fetch(instance.id)?,
            deleted,
        })
    }

    /// Place another instance of a registered definition at `(x, y)`.
    pub fn instantiate_component(
        &mut self,
        definition_id: ElementId,
        x: f64,
        y: f64,
        parent: Option<ElementId>,
    ) -> Result<Element> {
        let definition = self.components.get(definition_id).ok_or_else(|| {
            EngineError::Validation(format!("unknown component definition {definition_id}"))
        })?;
        let bounds = definition.template_bounds();
        let mut instance = Element::new(
            self.store.allocate_id(ElementType::ComponentInstance),
            ElementKind::ComponentInstance(InstanceProps {
                definition_id,
                properties: definition.default_properties(),
            }),
        );
        instance.name = definition.name.clone();
        instance.x = x;
        instance.y = y;
        instance.width = bounds.width();
        instance.height = bounds.height();
        instance.parent_id = parent;
        self.insert_new(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Scope;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn card_sources(doc: &mut Document) -> (ElementId, ElementId) {
        let s1 = doc
            .create_element(&json!({
                "id": "cc_bg", "element_type": "shape", "shape_type": "rect",
                "x": 40, "y": 60, "width": 200, "height": 120, "fill": "#3366FF",
            }))
            .unwrap()
            .id;
        let t1 = doc
            .create_element(&json!({
                "id": "cc_label", "element_type": "text",
                "x": 50, "y": 70, "content": "Hello card",
            }))
            .unwrap()
            .id;
        (t1, s1)
    }

    fn label_prop(target: ElementId) -> ComponentProperty {
        serde_json::from_value(json!({
            "propName": "label",
            "targetElementId": target.as_str(),
            "targetProperty": "content",
            "propType": "text",
        }))
        .unwrap()
    }

    #[test]
    fn card_component_replaces_its_sources() {
        let mut doc = Document::new();
        let keep = doc
            .create_element(&json!({ "id": "cc_keep", "element_type": "frame", "x": 900, "y": 0 }))
            .unwrap()
            .id;
        let (t1, s1) = card_sources(&mut doc);

        let created = doc
            .create_component_from_elements("Card", &[t1, s1], vec![label_prop(t1)])
            .unwrap();

        let mut deleted = created.deleted.clone();
        deleted.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(deleted, vec![s1, t1]);
        assert!(doc.element(t1).is_none() && doc.element(s1).is_none());
        assert_eq!(doc.components().len(), 1);

        let inst = &created.instance;
        assert_eq!((inst.x, inst.y, inst.width, inst.height), (40.0, 60.0, 200.0, 120.0));
        match &inst.kind {
            ElementKind::ComponentInstance(props) => {
                assert_eq!(props.definition_id, created.definition.id);
                assert_eq!(props.properties.get("label"), Some(&json!("Hello card")));
            }
            other => panic!("expected an instance, got {other:?}"),
        }
        assert_eq!(doc.store().len(), 2);
        assert!(doc.element(keep).is_some());
        assert!(doc.is_scope_dense(Scope::Root));
    }

    #[test]
    fn template_is_translated_to_its_origin() {
        let mut doc = Document::new();
        let (t1, s1) = card_sources(&mut doc);
        let created = doc
            .create_component_from_elements("Card", &[t1, s1], Vec::new())
            .unwrap();
        let def = &created.definition;

        let bg = def.template_element(s1).unwrap();
        let label = def.template_element(t1).unwrap();
        assert_eq!((bg.x, bg.y), (0.0, 0.0));
        assert_eq!((label.x, label.y), (10.0, 10.0));
        assert_eq!(def.template_elements[0].id, s1, "paint order is kept");
        assert_eq!(def.template_bounds().size(), (200.0, 120.0).into());
        assert!(def.id.as_str().starts_with("comp_"));
    }

    #[test]
    fn template_carries_descendants_verbatim() {
        let mut doc = Document::new();
        let group = doc
            .create_element(&json!({ "id": "cd_grp", "element_type": "group", "x": 10, "y": 10 }))
            .unwrap()
            .id;
        let child = doc
            .create_element(&json!({
                "id": "cd_child", "element_type": "text", "x": 5, "y": 5, "parentId": "cd_grp",
            }))
            .unwrap()
            .id;

        let created = doc
            .create_component_from_elements("Nested", &[group, child], Vec::new())
            .unwrap();
        let def = &created.definition;
        assert_eq!(def.template_elements.len(), 2);
        let copy = def.template_element(child).unwrap();
        assert_eq!((copy.x, copy.y, copy.parent_id), (5.0, 5.0, Some(group)));
        assert_eq!(doc.store().len(), 1, "only the instance remains");
    }

    #[test]
    fn empty_selection_creates_nothing() {
        let mut doc = Document::new();
        let err = doc
            .create_component_from_elements("Ghost", &[ElementId::intern("cc_missing")], Vec::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptySelection(_)));
        assert!(doc.components().is_empty());
        assert!(doc.store().is_empty());
    }

    #[test]
    fn rejected_instance_registers_nothing() {
        let mut doc = Document::new();
        let host = doc
            .create_element(&json!({ "id": "cr_host", "element_type": "frame", "x": 0, "y": 0 }))
            .unwrap()
            .id;
        let inner = doc
            .create_element(&json!({
                "id": "cr_inner", "element_type": "text", "x": 5, "y": 5, "parentId": "cr_host",
            }))
            .unwrap()
            .id;
        // A host that stops being a container can no longer take the instance.
        let leaf = crate::payload::decode_element(&json!({ "element_type": "text", "x": 0, "y": 0 }), host).unwrap();
        doc.store.get_mut(host).unwrap().kind = leaf.kind;
        let before = doc.snapshot();

        let err = doc
            .create_component_from_elements("Orphan", &[inner], Vec::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidParent { .. }));
        assert!(doc.components().is_empty());
        assert_eq!(doc.snapshot(), before, "sources are kept");
    }

    #[test]
    fn schema_entries_outside_the_selection_are_dropped() {
        let mut doc = Document::new();
        let (t1, s1) = card_sources(&mut doc);
        let outsider = doc
            .create_element(&json!({ "id": "cc_out", "element_type": "text", "x": 0, "y": 0 }))
            .unwrap()
            .id;
        let created = doc
            .create_component_from_elements("Card", &[s1], vec![label_prop(t1), label_prop(outsider)])
            .unwrap();
        assert!(created.definition.schema.is_empty());
        assert!(doc.element(t1).is_some(), "only selected sources are deleted");
    }

    #[test]
    fn instances_can_be_placed_again() {
        let mut doc = Document::new();
        let (t1, s1) = card_sources(&mut doc);
        let created = doc
            .create_component_from_elements("Card", &[t1, s1], vec![label_prop(t1)])
            .unwrap();

        let again = doc
            .instantiate_component(created.definition.id, 300.0, 20.0, None)
            .unwrap();
        assert_eq!((again.x, again.y, again.width, again.height), (300.0, 20.0, 200.0, 120.0));
        assert_eq!(again.name, "Card");
        match &again.kind {
            ElementKind::ComponentInstance(props) => {
                assert_eq!(props.properties.get("label"), Some(&json!("Hello card")));
            }
            other => panic!("expected an instance, got {other:?}"),
        }
        assert_ne!(again.id, created.instance.id);
        assert!(again.z_index > doc.element(created.instance.id).unwrap().z_index);

        let err = doc
            .instantiate_component(ElementId::intern("comp_nope"), 0.0, 0.0, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn instance_payload_needs_a_registered_definition() {
        let mut doc = Document::new();
        let err = doc
            .create_element(&json!({
                "element_type": "component_instance", "x": 0, "y": 0, "definition_id": "comp_unknown",
            }))
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(m) if m.contains("comp_unknown")));
        assert!(doc.store().is_empty());
    }

    #[test]
    fn schema_accepts_snake_case_keys() {
        let prop: ComponentProperty = serde_json::from_value(json!({
            "prop_name": "tint",
            "target_element_id": "cc_bg",
            "target_property": "fill",
            "prop_type": "color",
        }))
        .unwrap();
        assert_eq!(prop.prop_type, PropType::Color);
        assert_eq!(serde_json::to_value(&prop).unwrap()["propName"], json!("tint"));
    }
}
