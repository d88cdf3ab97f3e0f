//! Message dispatch: one workspace shared by every client of a session.
//!
//! A transport feeds each incoming text frame to `Session::handle_text`
//! and broadcasts whatever events come back, in order. Failures become a
//! single `ERROR` event instead of closing the connection.

use crate::error::BridgeError;
use crate::protocol::{ClientMessage, PresentationUpdate, ServerEvent};
use pc_core::{Element, ElementId};
use pc_editor::{EngineConfig, Workspace};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Session {
    workspace: Workspace,
    config: EngineConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn updated(elements: Vec<Element>) -> Vec<ServerEvent> {
    if elements.is_empty() {
        Vec::new()
    } else {
        vec![ServerEvent::ElementsUpdated(elements)]
    }
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            workspace: Workspace::with_config(&config),
            config,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full read model.
    pub fn state_event(&self) -> ServerEvent {
        ServerEvent::SetWorkspaceState {
            elements: self.workspace.elements(),
            component_definitions: self.workspace.component_definitions(),
            assets: self.workspace.assets().into_iter().cloned().collect(),
        }
    }

    /// What a newly connected client is sent first, if anything.
    pub fn initial_state(&self) -> Option<ServerEvent> {
        self.config.emit_initial_state.then(|| self.state_event())
    }

    /// Decode and apply one text frame. Never fails: errors are reported
    /// as an `ERROR` event.
    pub fn handle_text(&mut self, text: &str) -> Vec<ServerEvent> {
        let result = serde_json::from_str::<ClientMessage>(text)
            .map_err(BridgeError::from)
            .and_then(|msg| self.handle(msg));
        match result {
            Ok(events) => events,
            Err(err) => {
                log::warn!("message rejected: {err}");
                vec![ServerEvent::Error {
                    message: err.to_string(),
                }]
            }
        }
    }

    /// Apply one decoded message and return the events to broadcast.
    /// An empty list means nothing changed.
    pub fn handle(&mut self, message: ClientMessage) -> Result<Vec<ServerEvent>, BridgeError> {
        let ws = &mut self.workspace;
        let events = match message {
            ClientMessage::CreateElement(payload) => {
                vec![ServerEvent::ElementCreated(ws.create_element(&payload)?)]
            }
            ClientMessage::CreateElements { elements } => {
                vec![ServerEvent::ElementsCreated(ws.create_elements(&elements)?)]
            }
            ClientMessage::UpdateElement(mut patch) => {
                let id = match patch.remove("id") {
                    Some(Value::String(id)) if !id.is_empty() => ElementId::intern(&id),
                    _ => return Err(BridgeError::Request("update_element needs an `id`".into())),
                };
                let commit = match patch.remove("commit") {
                    None => true,
                    Some(Value::Bool(commit)) => commit,
                    Some(other) => {
                        return Err(BridgeError::Request(format!("`commit` must be a boolean, got {other}")));
                    }
                };
                vec![ServerEvent::ElementUpdated(ws.update_element(id, &patch, commit)?)]
            }
            ClientMessage::UpdateElements { updates } => {
                let outcome = ws.update_elements(&updates);
                let mut events = updated(outcome.updated);
                if !outcome.failed.is_empty() {
                    events.push(ServerEvent::Error {
                        message: format!("could not update: {}", outcome.failed.join(", ")),
                    });
                }
                events
            }
            ClientMessage::DeleteElement { id } => ws
                .delete_element(id)
                .into_iter()
                .map(|id| ServerEvent::ElementDeleted { id })
                .collect(),
            ClientMessage::GroupElements { ids } => {
                let grouped = ws.group_elements(&ids)?;
                let mut elements = vec![grouped.group];
                elements.extend(grouped.children);
                vec![ServerEvent::ElementsUpdated(elements)]
            }
            ClientMessage::UngroupElement { id } => {
                let released = ws.ungroup_element(id)?;
                let mut events = updated(released.children);
                events.push(ServerEvent::ElementDeleted { id: released.removed });
                events
            }
            ClientMessage::ReparentElement {
                child_id,
                new_parent_id,
            } => {
                vec![ServerEvent::ElementsUpdated(vec![
                    ws.reparent_element(child_id, new_parent_id)?,
                ])]
            }
            ClientMessage::ReorderElement { id, command } => updated(ws.reorder(id, command)),
            ClientMessage::ReorderLayer {
                dragged_id,
                target_id,
                position,
            } => updated(ws.reorder_layer(dragged_id, target_id, position)),
            ClientMessage::UpdatePresentationOrder(PresentationUpdate::Set { ordered_frame_ids }) => {
                updated(ws.set_presentation_order(&ordered_frame_ids))
            }
            ClientMessage::UpdatePresentationOrder(PresentationUpdate::Add { frame_id }) => {
                updated(ws.add_to_presentation(frame_id))
            }
            ClientMessage::ReorderSlide {
                dragged_id,
                target_id,
                position,
            } => updated(ws.reorder_slide(dragged_id, target_id, position)),
            ClientMessage::CreateComponent {
                name,
                element_ids,
                schema,
            } => {
                let created = ws.create_component_from_elements(&name, &element_ids, schema)?;
                vec![ServerEvent::ComponentCreated {
                    definition: created.definition,
                    instance: created.instance,
                    deleted_ids: created.deleted,
                }]
            }
            ClientMessage::InstantiateComponent {
                definition_id,
                x,
                y,
                parent_id,
            } => {
                vec![ServerEvent::ElementCreated(
                    ws.instantiate_component(definition_id, x, y, parent_id)?,
                )]
            }
            ClientMessage::Undo => ws
                .undo()
                .map(|elements| ServerEvent::WorkspaceReset { elements })
                .into_iter()
                .collect(),
            ClientMessage::Redo => ws
                .redo()
                .map(|elements| ServerEvent::WorkspaceReset { elements })
                .into_iter()
                .collect(),
            ClientMessage::CreateAsset(new) => vec![ServerEvent::AssetCreated(ws.create_asset(new))],
            ClientMessage::DeleteAsset { id } => ws
                .delete_asset(&id)
                .map(|asset| ServerEvent::AssetDeleted { id: asset.id })
                .into_iter()
                .collect(),
        };
        log::debug!(
            "dispatched: {}",
            events.iter().map(ServerEvent::name).collect::<Vec<_>>().join(", ")
        );
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn send(session: &mut Session, message: Value) -> Vec<ServerEvent> {
        session.handle_text(&message.to_string())
    }

    fn names(events: &[ServerEvent]) -> Vec<&'static str> {
        events.iter().map(ServerEvent::name).collect()
    }

    #[test]
    fn initial_state_follows_config() {
        let session = Session::default();
        assert!(matches!(session.initial_state(), Some(ServerEvent::SetWorkspaceState { .. })));

        let quiet = Session::new(EngineConfig {
            emit_initial_state: false,
            ..EngineConfig::default()
        });
        assert_eq!(quiet.initial_state(), None);
    }

    #[test]
    fn malformed_text_becomes_an_error_event() {
        let mut session = Session::default();
        let events = session.handle_text("{ not json");
        assert_eq!(names(&events), vec!["ERROR"]);
        let events = send(&mut session, json!({ "type": "update_element", "payload": { "x": 1 } }));
        assert_eq!(names(&events), vec!["ERROR"]);
    }

    #[test]
    fn update_without_commit_skips_history() {
        let mut session = Session::default();
        send(
            &mut session,
            json!({ "type": "create_element", "payload": { "id": "d_box", "element_type": "frame", "x": 0, "y": 0 } }),
        );
        let events = send(
            &mut session,
            json!({ "type": "update_element", "payload": { "id": "d_box", "x": 40, "commit": false } }),
        );
        assert_eq!(names(&events), vec!["ELEMENT_UPDATED"]);
        assert_eq!(session.workspace().history().len(), 2);
    }

    #[test]
    fn delete_broadcasts_each_removed_id() {
        let mut session = Session::default();
        send(
            &mut session,
            json!({ "type": "create_element", "payload": { "id": "d_frame", "element_type": "frame", "x": 0, "y": 0 } }),
        );
        send(
            &mut session,
            json!({ "type": "create_element", "payload": { "id": "d_child", "element_type": "text", "x": 0, "y": 0, "parentId": "d_frame" } }),
        );
        let events = send(&mut session, json!({ "type": "delete_element", "payload": { "id": "d_frame" } }));
        assert_eq!(names(&events), vec!["ELEMENT_DELETED", "ELEMENT_DELETED"]);

        let again = send(&mut session, json!({ "type": "delete_element", "payload": { "id": "d_frame" } }));
        assert!(again.is_empty());
    }

    #[test]
    fn undo_at_the_floor_sends_nothing() {
        let mut session = Session::default();
        assert!(send(&mut session, json!({ "type": "undo" })).is_empty());
    }
}
