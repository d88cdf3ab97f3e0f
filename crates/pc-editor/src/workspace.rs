//! The workspace facade: one document, its history, and its assets.
//!
//! Every successful mutating operation commits one history entry; an
//! operation that changed nothing (stale ids, empty selection, failure)
//! commits nothing. `update_element` with `commit = false` is the one way
//! to change the document without recording it, used for live drags that
//! are committed once when the gesture ends.

use crate::assets::{Asset, AssetCatalogue, NewAsset};
use crate::config::EngineConfig;
use crate::history::History;
use pc_core::{
    ComponentCreated, ComponentDefinition, ComponentProperty, Document, DropPosition, Element,
    ElementId, EngineError, Grouped, Result, TextAlign, TextVAlign, Ungrouped, ZCommand,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Text attributes an agent reads before rewriting copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProperties {
    pub id: ElementId,
    pub content: String,
    pub font_family: String,
    pub font_weight: u16,
    pub font_size: f64,
    pub letter_spacing: f64,
    pub line_height: f64,
    pub align: TextAlign,
    pub vertical_align: TextVAlign,
}

/// Outcome of a multi-element update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchUpdate {
    pub updated: Vec<Element>,
    /// Ids whose patch was rejected or did not resolve. Entries that carry
    /// no usable id are listed as [`MISSING_ID`].
    pub failed: Vec<String>,
}

/// Placeholder in [`BatchUpdate::failed`] for an entry without an id.
pub const MISSING_ID: &str = "<missing id>";

#[derive(Debug, Clone)]
pub struct Workspace {
    document: Document,
    history: History,
    assets: AssetCatalogue,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        let document = Document::new();
        let history = History::new(document.snapshot(), config.history_limit);
        Self {
            document,
            history,
            assets: AssetCatalogue::new(),
        }
    }

    // ─── Read model ──────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.document.element(id)
    }

    pub fn elements(&self) -> Vec<Element> {
        self.document.elements()
    }

    pub fn component_definitions(&self) -> Vec<ComponentDefinition> {
        self.document.component_definitions()
    }

    fn commit(&mut self, description: &str) {
        self.history.commit(self.document.snapshot(), description);
    }

    /// Commit when `changed` is non-empty, and pass it through.
    fn commit_if_any<T>(&mut self, changed: Vec<T>, description: &str) -> Vec<T> {
        if !changed.is_empty() {
            self.commit(description);
        }
        changed
    }

    // ─── Structural edits ────────────────────────────────────────────────

    pub fn create_element(&mut self, payload: &Value) -> Result<Element> {
        let el = self.document.create_element(payload)?;
        self.commit("create element");
        Ok(el)
    }

    pub fn create_elements(&mut self, payloads: &[Value]) -> Result<Vec<Element>> {
        let created = self.document.create_elements(payloads)?;
        self.commit("create elements");
        Ok(created)
    }

    pub fn update_element(&mut self, id: ElementId, patch: &Map<String, Value>, commit: bool) -> Result<Element> {
        let el = self.document.update_element(id, patch)?;
        if commit {
            self.commit("update element");
        }
        Ok(el)
    }

    /// Apply several patches, each an object carrying the target `id`.
    /// One history entry covers all the patches that applied.
    pub fn update_elements(&mut self, updates: &[Value]) -> BatchUpdate {
        let mut outcome = BatchUpdate::default();
        for update in updates {
            let Some(obj) = update.as_object() else {
                log::warn!("update_elements: entry is not an object");
                outcome.failed.push(MISSING_ID.to_owned());
                continue;
            };
            let Some(raw) = obj.get("id").and_then(Value::as_str).filter(|s| !s.is_empty()) else {
                log::warn!("update_elements: entry without id");
                outcome.failed.push(MISSING_ID.to_owned());
                continue;
            };
            let mut patch = obj.clone();
            patch.remove("id");
            match self.document.update_element(ElementId::intern(raw), &patch) {
                Ok(el) => outcome.updated.push(el),
                Err(err) => {
                    log::warn!("update_elements: {raw}: {err}");
                    outcome.failed.push(raw.to_owned());
                }
            }
        }
        if !outcome.updated.is_empty() {
            self.commit("update elements");
        }
        outcome
    }

    pub fn delete_element(&mut self, id: ElementId) -> Vec<ElementId> {
        let removed = self.document.delete_element(id);
        self.commit_if_any(removed, "delete element")
    }

    pub fn group_elements(&mut self, ids: &[ElementId]) -> Result<Grouped> {
        let grouped = self.document.group_elements(ids)?;
        self.commit("group elements");
        Ok(grouped)
    }

    pub fn ungroup_element(&mut self, id: ElementId) -> Result<Ungrouped> {
        let released = self.document.ungroup_element(id)?;
        self.commit("ungroup element");
        Ok(released)
    }

    pub fn reparent_element(&mut self, child: ElementId, parent: Option<ElementId>) -> Result<Element> {
        let el = self.document.reparent_element(child, parent)?;
        self.commit("reparent element");
        Ok(el)
    }

    // ─── Ordering ────────────────────────────────────────────────────────

    pub fn reorder(&mut self, id: ElementId, command: ZCommand) -> Vec<Element> {
        let touched = self.document.reorder(id, command);
        self.commit_if_any(touched, "reorder element")
    }

    pub fn reorder_layer(&mut self, dragged: ElementId, target: ElementId, position: DropPosition) -> Vec<Element> {
        let touched = self.document.reorder_layer(dragged, target, position);
        self.commit_if_any(touched, "reorder layer")
    }

    // ─── Presentation ────────────────────────────────────────────────────

    pub fn set_presentation_order(&mut self, ids: &[ElementId]) -> Vec<Element> {
        let touched = self.document.set_presentation_order(ids);
        self.commit_if_any(touched, "set presentation order")
    }

    pub fn add_to_presentation(&mut self, id: ElementId) -> Vec<Element> {
        let touched = self.document.add_to_presentation(id);
        self.commit_if_any(touched, "add slide")
    }

    pub fn reorder_slide(&mut self, dragged: ElementId, target: ElementId, position: DropPosition) -> Vec<Element> {
        let touched = self.document.reorder_slide(dragged, target, position);
        self.commit_if_any(touched, "reorder slide")
    }

    pub fn slides(&self) -> Vec<Element> {
        self.document.slides()
    }

    // ─── Components ──────────────────────────────────────────────────────

    pub fn create_component_from_elements(
        &mut self,
        name: &str,
        source_ids: &[ElementId],
        schema: Vec<ComponentProperty>,
    ) -> Result<ComponentCreated> {
        let created = self
            .document
            .create_component_from_elements(name, source_ids, schema)?;
        self.commit("create component");
        Ok(created)
    }

    pub fn instantiate_component(
        &mut self,
        definition_id: ElementId,
        x: f64,
        y: f64,
        parent: Option<ElementId>,
    ) -> Result<Element> {
        let el = self.document.instantiate_component(definition_id, x, y, parent)?;
        self.commit("instantiate component");
        Ok(el)
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Restore the previous entry. Returns the restored read model, or
    /// `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Vec<Element>> {
        let restore = self.history.undo()?;
        log::debug!("undo `{}`", restore.description);
        self.document.restore(restore.elements);
        Some(self.document.elements())
    }

    pub fn redo(&mut self) -> Option<Vec<Element>> {
        let restore = self.history.redo()?;
        log::debug!("redo `{}`", restore.description);
        self.document.restore(restore.elements);
        Some(self.document.elements())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Text helpers ────────────────────────────────────────────────────

    pub fn text_properties(&self, id: ElementId) -> Option<TextProperties> {
        let Some(text) = self.document.element(id).and_then(Element::as_text) else {
            log::warn!("text_properties: {id} is not a text element");
            return None;
        };
        Some(TextProperties {
            id,
            content: text.content.clone(),
            font_family: text.font_family.clone(),
            font_weight: text.font_weight,
            font_size: text.font_size,
            letter_spacing: text.letter_spacing,
            line_height: text.line_height,
            align: text.align,
            vertical_align: text.vertical_align,
        })
    }

    pub fn text_content(&self, id: ElementId) -> Option<String> {
        self.document
            .element(id)
            .and_then(Element::as_text)
            .map(|text| text.content.clone())
    }

    /// Rewrite a text element's content without recording history; the
    /// caller commits once its whole rewrite is done.
    pub fn set_text_content(&mut self, id: ElementId, content: &str) -> Result<Element> {
        if self.document.element(id).and_then(Element::as_text).is_none() {
            return Err(EngineError::Validation(format!("{id} is not a text element")));
        }
        let mut patch = Map::new();
        patch.insert("content".into(), Value::String(content.to_owned()));
        self.update_element(id, &patch, false)
    }

    /// Record the current state, for callers that mutated through
    /// non-committing updates.
    pub fn commit_pending(&mut self, description: &str) {
        if self.history.current() != self.document.store().elements() {
            self.commit(description);
        }
    }

    // ─── Assets ──────────────────────────────────────────────────────────

    pub fn create_asset(&mut self, new: NewAsset) -> Asset {
        self.assets.create_asset(new)
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.asset(id)
    }

    pub fn assets(&self) -> Vec<&Asset> {
        self.assets.assets()
    }

    pub fn delete_asset(&mut self, id: &str) -> Option<Asset> {
        self.assets.delete_asset(id)
    }
}
