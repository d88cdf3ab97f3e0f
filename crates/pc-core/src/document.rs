//! The canvas document: element store plus component catalogue.
//!
//! `Document` is the single mutable root the engine operates on. The
//! operations themselves live next to the concern they implement
//! (`order`, `edit`, `component`, `presentation`) as `impl Document`
//! blocks; this module only holds the state and the read model.

use crate::component::{ComponentCatalogue, ComponentDefinition};
use crate::id::ElementId;
use crate::model::Element;
use crate::store::{ElementMap, SceneStore};

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub(crate) store: SceneStore,
    pub(crate) components: ComponentCatalogue,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.store.get(id)
    }

    /// Full read model, back to front (ties broken by id) so clients get a
    /// stable order.
    pub fn elements(&self) -> Vec<Element> {
        let mut all: Vec<Element> = self.store.iter().cloned().collect();
        all.sort_by(|a, b| {
            a.z_index
                .cmp(&b.z_index)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        all
    }

    pub fn components(&self) -> &ComponentCatalogue {
        &self.components
    }

    pub fn component_definitions(&self) -> Vec<ComponentDefinition> {
        self.components.list().into_iter().cloned().collect()
    }

    /// Deep copy of the element collection.
    pub fn snapshot(&self) -> ElementMap {
        self.store.elements().clone()
    }

    /// Replace the element collection wholesale. Component definitions are
    /// not part of the snapshot and stay registered.
    pub fn restore(&mut self, elements: ElementMap) {
        self.store.restore(elements);
    }
}
