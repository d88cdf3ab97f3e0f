//! Payload decoding, patch merging, and variant validation.
//!
//! Creation and update both go through a JSON object and back into a typed
//! `Element`, so every stored value has passed the same validation. Updates
//! are copy-on-write: the current element is serialized, the patch is
//! merged on top, and a new element is reconstructed from the result.

use crate::error::{EngineError, Result};
use crate::id::ElementId;
use crate::model::{Element, ElementKind, ElementType, Fill, TEXT_DEFAULT_SIZE};
use serde_json::{Map, Value};

/// Fields owned by structural operations (reparent, reorder, sequencer).
/// Patches and creation payloads cannot set them directly.
const STRUCTURAL_FIELDS: &[&str] = &["id", "element_type", "zIndex", "parentId", "presentationOrder"];

fn as_object(payload: &Value) -> Result<&Map<String, Value>> {
    payload
        .as_object()
        .ok_or_else(|| EngineError::validation("payload must be a JSON object"))
}

/// The variant a creation payload asks for.
pub fn payload_type(payload: &Value) -> Result<ElementType> {
    let tag = as_object(payload)?
        .get("element_type")
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::validation("missing element_type"))?;
    ElementType::parse(tag)
        .ok_or_else(|| EngineError::validation(format!("unknown element_type `{tag}`")))
}

/// Caller-supplied id, if the payload carries a usable one.
pub fn requested_id(payload: &Value) -> Option<ElementId> {
    payload
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ElementId::intern)
}

/// Caller-supplied parent, if any.
pub fn requested_parent(payload: &Value) -> Option<ElementId> {
    payload
        .get("parentId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ElementId::intern)
}

/// Decode a creation payload into an element carrying `id`. The parent is
/// taken from the payload as is; the caller checks it.
pub fn decode_element(payload: &Value, id: ElementId) -> Result<Element> {
    let ty = payload_type(payload)?;
    let mut obj = as_object(payload)?.clone();
    for field in STRUCTURAL_FIELDS {
        if *field != "element_type" && *field != "parentId" {
            obj.remove(*field);
        }
    }
    obj.insert("id".into(), Value::String(id.as_str().to_owned()));
    if obj.get("parentId").and_then(Value::as_str) == Some("") {
        obj.insert("parentId".into(), Value::Null);
    }
    if ty == ElementType::Text {
        obj.entry("width").or_insert(TEXT_DEFAULT_SIZE.0.into());
        obj.entry("height").or_insert(TEXT_DEFAULT_SIZE.1.into());
    }

    let mut element: Element = serde_json::from_value(Value::Object(obj))?;
    normalize(&mut element);
    validate(&element)?;
    Ok(element)
}

/// Merge `patch` over `current` and re-validate into a new element.
/// Structural fields in the patch are ignored.
pub fn merge_patch(current: &Element, patch: &Map<String, Value>) -> Result<Element> {
    let mut value = serde_json::to_value(current)?;
    let obj = value
        .as_object_mut()
        .ok_or_else(|| EngineError::validation("element did not serialize to an object"))?;
    for (key, v) in patch {
        if STRUCTURAL_FIELDS.contains(&key.as_str()) {
            if obj.get(key) != Some(v) {
                log::debug!("update {}: ignoring structural field `{key}`", current.id);
            }
            continue;
        }
        obj.insert(key.clone(), v.clone());
    }

    let mut next: Element = serde_json::from_value(value)?;
    normalize(&mut next);
    validate(&next)?;
    Ok(next)
}

/// Recompute derived geometry.
fn normalize(element: &mut Element) {
    if let ElementKind::Path(path) = &element.kind {
        let (w, h) = path.extent();
        element.width = w;
        element.height = h;
    }
}

fn ensure(cond: bool, msg: impl FnOnce() -> String) -> Result<()> {
    if cond { Ok(()) } else { Err(EngineError::Validation(msg())) }
}

fn validate_fill(fill: Option<&Fill>, field: &str) -> Result<()> {
    if let Some(Fill::LinearGradient { angle, stops }) = fill {
        ensure(angle.is_finite(), || format!("{field}: gradient angle must be finite"))?;
        ensure(stops.len() >= 2, || {
            format!("{field}: linear gradient needs at least 2 stops, got {}", stops.len())
        })?;
        for stop in stops {
            ensure((0.0..=1.0).contains(&stop.offset), || {
                format!("{field}: gradient stop offset {} outside 0..1", stop.offset)
            })?;
        }
    }
    Ok(())
}

fn non_negative(v: f64, field: &str) -> Result<()> {
    ensure(v.is_finite() && v >= 0.0, || format!("{field} must be a non-negative number, got {v}"))
}

/// Variant-specific field requirements.
pub fn validate(element: &Element) -> Result<()> {
    for (v, field) in [(element.x, "x"), (element.y, "y"), (element.rotation, "rotation")] {
        ensure(v.is_finite(), || format!("{field} must be finite"))?;
    }
    non_negative(element.width, "width")?;
    non_negative(element.height, "height")?;

    match &element.kind {
        ElementKind::Shape(shape) => {
            validate_fill(shape.fill.as_ref(), "fill")?;
            validate_fill(shape.stroke.as_ref(), "stroke")?;
            non_negative(shape.stroke_width, "strokeWidth")?;
            non_negative(shape.corner_radius, "cornerRadius")?;
        }
        ElementKind::Text(text) => {
            ensure(text.font_size.is_finite() && text.font_size > 0.0, || {
                format!("fontSize must be positive, got {}", text.font_size)
            })?;
            ensure((1..=1000).contains(&text.font_weight), || {
                format!("fontWeight {} outside 1..=1000", text.font_weight)
            })?;
            ensure(text.letter_spacing.is_finite(), || "letterSpacing must be finite".into())?;
            non_negative(text.line_height, "lineHeight")?;
        }
        ElementKind::Frame(frame) => {
            validate_fill(frame.fill.as_ref(), "fill")?;
            validate_fill(frame.stroke.as_ref(), "stroke")?;
            non_negative(frame.stroke_width, "strokeWidth")?;
            non_negative(frame.corner_radius, "cornerRadius")?;
        }
        ElementKind::Group => {}
        ElementKind::Path(path) => {
            ensure(!path.points.is_empty(), || "path needs at least one point".into())?;
            ensure(
                path.points.iter().all(|p| p.x.is_finite() && p.y.is_finite()),
                || "path points must be finite".into(),
            )?;
            validate_fill(path.fill.as_ref(), "fill")?;
            validate_fill(path.stroke.as_ref(), "stroke")?;
            non_negative(path.stroke_width, "strokeWidth")?;
        }
        ElementKind::Image(image) => {
            ensure(!image.src.trim().is_empty(), || "image src must not be empty".into())?;
        }
        // Definition existence is checked against the catalogue by `Document`.
        ElementKind::ComponentInstance(_) => {}
    }
    Ok(())
}
