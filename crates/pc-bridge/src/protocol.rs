//! Wire messages.
//!
//! Both directions are `{ "type": ..., "payload": ... }` objects. Client
//! messages use snake_case names; server events use SCREAMING_SNAKE_CASE
//! names and are broadcast to every connected client as is.

use pc_core::{ComponentDefinition, ComponentProperty, DropPosition, Element, ElementId, ZCommand};
use pc_editor::{Asset, NewAsset};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ─── Client → engine ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A variant payload (`element_type` plus fields).
    CreateElement(Value),
    CreateElements {
        elements: Vec<Value>,
    },
    /// `id` plus the fields to change; `commit: false` skips history.
    UpdateElement(Map<String, Value>),
    UpdateElements {
        updates: Vec<Value>,
    },
    DeleteElement {
        id: ElementId,
    },
    GroupElements {
        ids: Vec<ElementId>,
    },
    UngroupElement {
        id: ElementId,
    },
    ReparentElement {
        #[serde(rename = "childId")]
        child_id: ElementId,
        #[serde(rename = "newParentId", default, deserialize_with = "optional_parent")]
        new_parent_id: Option<ElementId>,
    },
    ReorderElement {
        id: ElementId,
        command: ZCommand,
    },
    ReorderLayer {
        #[serde(rename = "draggedId")]
        dragged_id: ElementId,
        #[serde(rename = "targetId")]
        target_id: ElementId,
        position: DropPosition,
    },
    UpdatePresentationOrder(PresentationUpdate),
    ReorderSlide {
        dragged_id: ElementId,
        target_id: ElementId,
        position: DropPosition,
    },
    CreateComponent {
        name: String,
        #[serde(rename = "elementIds", alias = "element_ids")]
        element_ids: Vec<ElementId>,
        #[serde(default)]
        schema: Vec<ComponentProperty>,
    },
    InstantiateComponent {
        #[serde(rename = "definitionId", alias = "definition_id")]
        definition_id: ElementId,
        x: f64,
        y: f64,
        #[serde(rename = "parentId", default, deserialize_with = "optional_parent")]
        parent_id: Option<ElementId>,
    },
    Undo,
    Redo,
    CreateAsset(NewAsset),
    DeleteAsset {
        id: String,
    },
}

/// `null`, a missing field and `""` all mean the canvas root.
fn optional_parent<'de, D: Deserializer<'de>>(de: D) -> Result<Option<ElementId>, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.filter(|s| !s.is_empty()).map(|s| ElementId::intern(&s)))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PresentationUpdate {
    Set { ordered_frame_ids: Vec<ElementId> },
    Add { frame_id: ElementId },
}

// ─── Engine → clients ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    /// Full read model, sent when a client connects.
    SetWorkspaceState {
        elements: Vec<Element>,
        #[serde(rename = "componentDefinitions")]
        component_definitions: Vec<ComponentDefinition>,
        assets: Vec<Asset>,
    },
    ElementCreated(Element),
    ElementsCreated(Vec<Element>),
    ElementUpdated(Element),
    ElementsUpdated(Vec<Element>),
    ElementDeleted {
        id: ElementId,
    },
    ComponentCreated {
        definition: ComponentDefinition,
        instance: Element,
        #[serde(rename = "deletedIds")]
        deleted_ids: Vec<ElementId>,
    },
    /// Whole element collection after undo/redo.
    WorkspaceReset {
        elements: Vec<Element>,
    },
    AssetCreated(Asset),
    AssetDeleted {
        id: String,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::SetWorkspaceState { .. } => "SET_WORKSPACE_STATE",
            ServerEvent::ElementCreated(_) => "ELEMENT_CREATED",
            ServerEvent::ElementsCreated(_) => "ELEMENTS_CREATED",
            ServerEvent::ElementUpdated(_) => "ELEMENT_UPDATED",
            ServerEvent::ElementsUpdated(_) => "ELEMENTS_UPDATED",
            ServerEvent::ElementDeleted { .. } => "ELEMENT_DELETED",
            ServerEvent::ComponentCreated { .. } => "COMPONENT_CREATED",
            ServerEvent::WorkspaceReset { .. } => "WORKSPACE_RESET",
            ServerEvent::AssetCreated(_) => "ASSET_CREATED",
            ServerEvent::AssetDeleted { .. } => "ASSET_DELETED",
            ServerEvent::Error { .. } => "ERROR",
        }
    }
}
