//! Core data model for canvas documents.
//!
//! The document is an arena of `Element` values keyed by `ElementId`.
//! Ownership is expressed only through `parent_id` back-references: a
//! child names its container, containers never hold child pointers.
//! Stored `x`/`y` are always relative to the parent's origin; absolute
//! canvas coordinates are derived by walking the parent chain.
//!
//! The JSON shape mirrors what canvas clients exchange: camelCase common
//! fields, an `element_type` discriminator, variant fields flattened in.

use crate::id::ElementId;
use kurbo::{Point, Rect};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

// ─── Colors & Paint ──────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0], exchanged as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Parse any color spelling accepted on the wire.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Some(Self::TRANSPARENT);
        }
        Self::from_hex(s)
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let ch = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (ch(self.r), ch(self.g), ch(self.b), ch(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

/// A gradient stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub color: Color,
    pub offset: f64, // 0.0 .. 1.0
}

/// Fill or stroke paint.
///
/// Accepts a bare color string as shorthand for a solid fill, which is
/// what agent tools tend to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Fill {
    Solid {
        color: Color,
    },
    LinearGradient {
        angle: f64, // degrees
        stops: SmallVec<[GradientStop; 2]>,
    },
}

impl Fill {
    pub const fn solid(color: Color) -> Self {
        Fill::Solid { color }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum TaggedFill {
    Solid {
        #[serde(default = "white")]
        color: Color,
    },
    LinearGradient {
        #[serde(default = "default_gradient_angle")]
        angle: f64,
        stops: SmallVec<[GradientStop; 2]>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FillRepr {
    Shorthand(Color),
    Tagged(TaggedFill),
}

impl<'de> Deserialize<'de> for Fill {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match FillRepr::deserialize(deserializer)? {
            FillRepr::Shorthand(color) => Fill::Solid { color },
            FillRepr::Tagged(TaggedFill::Solid { color }) => Fill::Solid { color },
            FillRepr::Tagged(TaggedFill::LinearGradient { angle, stops }) => {
                Fill::LinearGradient { angle, stops }
            }
        })
    }
}

fn white() -> Color {
    Color::WHITE
}

fn default_gradient_angle() -> f64 {
    90.0
}

fn white_fill() -> Option<Fill> {
    Some(Fill::solid(Color::WHITE))
}

fn frame_stroke() -> Option<Fill> {
    Some(Fill::solid(Color::rgba(
        136.0 / 255.0,
        136.0 / 255.0,
        136.0 / 255.0,
        1.0,
    )))
}

fn path_stroke() -> Option<Fill> {
    Some(Fill::solid(Color::rgba(
        51.0 / 255.0,
        51.0 / 255.0,
        51.0 / 255.0,
        1.0,
    )))
}

fn one() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_extent() -> f64 {
    100.0
}

// ─── Text ────────────────────────────────────────────────────────────────

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextVAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

fn default_content() -> String {
    "Type something...".into()
}

fn default_font_family() -> String {
    "Inter".into()
}

fn default_font_size() -> f64 {
    16.0
}

fn default_font_weight() -> u16 {
    400
}

fn default_line_height() -> f64 {
    1.2
}

fn black() -> Color {
    Color::BLACK
}

/// Default box of a freshly created text element.
pub const TEXT_DEFAULT_SIZE: (f64, f64) = (150.0, 22.0);

// ─── Path data ───────────────────────────────────────────────────────────

/// A Bezier handle, relative to the element origin like the point itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub x: f64,
    pub y: f64,
}

/// How the two handles of a path point move together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleType {
    #[default]
    Symmetrical,
    Asymmetrical,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub handle_in: Option<ControlPoint>,
    #[serde(default)]
    pub handle_out: Option<ControlPoint>,
    #[serde(default)]
    pub handle_type: HandleType,
}

// ─── Element variants ────────────────────────────────────────────────────

/// Geometric kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rect,
    Circle,
    Ellipse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeProps {
    #[serde(rename = "shape_type")]
    pub shape_type: ShapeType,
    #[serde(default = "white_fill")]
    pub fill: Option<Fill>,
    #[serde(default)]
    pub stroke: Option<Fill>,
    #[serde(default = "one")]
    pub stroke_width: f64,
    #[serde(default)]
    pub corner_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    #[serde(default = "default_content")]
    pub content: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_weight")]
    pub font_weight: u16,
    #[serde(default = "black")]
    pub font_color: Color,
    #[serde(default)]
    pub letter_spacing: f64,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub vertical_align: TextVAlign,
}

/// Frame: visible container with clipping, and the unit of a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameProps {
    #[serde(default = "white_fill")]
    pub fill: Option<Fill>,
    #[serde(default = "frame_stroke")]
    pub stroke: Option<Fill>,
    #[serde(default = "one")]
    pub stroke_width: f64,
    #[serde(default = "default_true")]
    pub clips_content: bool,
    #[serde(default)]
    pub corner_radius: f64,
    /// Position in the slide sequence; `None` when not presented.
    #[serde(default)]
    pub presentation_order: Option<u32>,
    #[serde(default)]
    pub speaker_notes: String,
}

/// Freeform path. Points are relative to the element origin; the
/// element's `width`/`height` are derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathProps {
    pub points: Vec<PathPoint>,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default = "white_fill")]
    pub fill: Option<Fill>,
    #[serde(default = "path_stroke")]
    pub stroke: Option<Fill>,
    #[serde(default = "one")]
    pub stroke_width: f64,
}

impl PathProps {
    /// Bounding extent of the points, `(width, height)`.
    pub fn extent(&self) -> (f64, f64) {
        let mut pts = self.points.iter();
        let Some(first) = pts.next() else {
            return (0.0, 0.0);
        };
        let mut bounds = Rect::from_points((first.x, first.y), (first.x, first.y));
        for p in pts {
            bounds = bounds.union_pt(Point::new(p.x, p.y));
        }
        (bounds.width(), bounds.height())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProps {
    pub src: String,
    #[serde(default)]
    pub prompt: Option<String>,
}

/// A placed instance of a component definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceProps {
    pub definition_id: ElementId,
    /// Property overrides keyed by schema `propName`.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

/// The element variants. Closed: every site that branches on the variant
/// matches exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element_type", rename_all = "snake_case")]
pub enum ElementKind {
    Shape(ShapeProps),
    Text(TextProps),
    Frame(FrameProps),
    /// Pure container with no styling of its own.
    Group,
    Path(PathProps),
    Image(ImageProps),
    ComponentInstance(InstanceProps),
}

/// Variant discriminator, as spelled in payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Shape,
    Text,
    Frame,
    Group,
    Path,
    Image,
    ComponentInstance,
}

impl ElementType {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Shape => "shape",
            ElementType::Text => "text",
            ElementType::Frame => "frame",
            ElementType::Group => "group",
            ElementType::Path => "path",
            ElementType::Image => "image",
            ElementType::ComponentInstance => "component_instance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "shape" => ElementType::Shape,
            "text" => ElementType::Text,
            "frame" => ElementType::Frame,
            "group" => ElementType::Group,
            "path" => ElementType::Path,
            "image" => ElementType::Image,
            "component_instance" => ElementType::ComponentInstance,
            _ => return None,
        })
    }

    /// Prefix for generated ids (`shape_3`, `instance_12`).
    pub fn id_prefix(self) -> &'static str {
        match self {
            ElementType::ComponentInstance => "instance",
            other => other.as_str(),
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, ElementType::Frame | ElementType::Group)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Element ─────────────────────────────────────────────────────────────

/// A single visual object on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,

    /// Position relative to the parent's origin (or the canvas at root).
    pub x: f64,
    pub y: f64,

    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_extent")]
    pub width: f64,
    #[serde(default = "default_extent")]
    pub height: f64,

    /// Paint-order rank, dense within the element's ordering scope.
    #[serde(default)]
    pub z_index: u32,

    #[serde(default = "default_true")]
    pub is_visible: bool,

    /// Weak back-reference to the owning Frame or Group.
    #[serde(default)]
    pub parent_id: Option<ElementId>,

    /// Display name shown in layer panels.
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    pub fn new(id: ElementId, kind: ElementKind) -> Self {
        Self {
            id,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            width: default_extent(),
            height: default_extent(),
            z_index: 0,
            is_visible: true,
            parent_id: None,
            name: String::new(),
            kind,
        }
    }

    pub fn element_type(&self) -> ElementType {
        match &self.kind {
            ElementKind::Shape(_) => ElementType::Shape,
            ElementKind::Text(_) => ElementType::Text,
            ElementKind::Frame(_) => ElementType::Frame,
            ElementKind::Group => ElementType::Group,
            ElementKind::Path(_) => ElementType::Path,
            ElementKind::Image(_) => ElementType::Image,
            ElementKind::ComponentInstance(_) => ElementType::ComponentInstance,
        }
    }

    /// Frames and groups may own children.
    pub fn is_container(&self) -> bool {
        self.element_type().is_container()
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_origin(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }

    /// Bounding box in the parent's coordinate frame.
    pub fn local_bounds(&self) -> Rect {
        Rect::from_origin_size(self.origin(), (self.width, self.height))
    }

    pub fn as_text(&self) -> Option<&TextProps> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&FrameProps> {
        match &self.kind {
            ElementKind::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_frame_mut(&mut self) -> Option<&mut FrameProps> {
        match &mut self.kind {
            ElementKind::Frame(f) => Some(f),
            _ => None,
        }
    }

    /// Slide position, for frames that are part of the presentation.
    pub fn presentation_order(&self) -> Option<u32> {
        self.as_frame().and_then(|f| f.presentation_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");

        let c2 = Color::from_hex("#FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex().len(), 9);

        assert_eq!(Color::from_hex("#fff").unwrap().to_hex(), "#FFFFFF");
        assert_eq!(Color::parse("transparent"), Some(Color::TRANSPARENT));
        assert!(Color::parse("chartreuse-ish").is_none());
    }

    #[test]
    fn shape_payload_fills_defaults() {
        let el: Element = serde_json::from_value(json!({
            "id": "shape_1",
            "element_type": "shape",
            "shape_type": "rect",
            "x": 10,
            "y": 20,
        }))
        .unwrap();

        assert_eq!(el.width, 100.0);
        assert_eq!(el.height, 100.0);
        assert!(el.is_visible);
        assert_eq!(el.parent_id, None);
        match &el.kind {
            ElementKind::Shape(s) => {
                assert_eq!(s.shape_type, ShapeType::Rect);
                assert_eq!(s.fill, Some(Fill::solid(Color::WHITE)));
                assert_eq!(s.stroke, None);
                assert_eq!(s.stroke_width, 1.0);
            }
            other => panic!("expected shape, got {other:?}"),
        }
    }

    #[test]
    fn fill_accepts_color_shorthand() {
        let fill: Fill = serde_json::from_value(json!("#ff0000")).unwrap();
        assert_eq!(fill, Fill::solid(Color::rgba(1.0, 0.0, 0.0, 1.0)));

        let gradient: Fill = serde_json::from_value(json!({
            "type": "linear-gradient",
            "stops": [
                { "color": "#000000", "offset": 0.0 },
                { "color": "#FFFFFF", "offset": 1.0 },
            ],
        }))
        .unwrap();
        match gradient {
            Fill::LinearGradient { angle, stops } => {
                assert_eq!(angle, 90.0);
                assert_eq!(stops.len(), 2);
            }
            other => panic!("expected gradient, got {other:?}"),
        }
    }

    #[test]
    fn element_serializes_with_wire_names() {
        let frame = Element::new(
            ElementId::intern("frame_wire"),
            ElementKind::Frame(serde_json::from_value(json!({})).unwrap()),
        );
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["element_type"], json!("frame"));
        assert_eq!(value["zIndex"], json!(0));
        assert_eq!(value["isVisible"], json!(true));
        assert_eq!(value["parentId"], json!(null));
        assert_eq!(value["clipsContent"], json!(true));
        assert_eq!(value["presentationOrder"], json!(null));
        assert_eq!(value["stroke"], json!({ "type": "solid", "color": "#888888" }));

        let back: Element = serde_json::from_value(value).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn group_roundtrips_without_payload_fields() {
        let group = Element::new(ElementId::intern("group_rt"), ElementKind::Group);
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["element_type"], json!("group"));
        let back: Element = serde_json::from_value(value).unwrap();
        assert_eq!(back, group);
    }

    #[test]
    fn path_extent_spans_points() {
        let path: PathProps = serde_json::from_value(json!({
            "points": [
                { "x": 0, "y": 5 },
                { "x": 40, "y": -5, "handleType": "disconnected" },
                { "x": 10, "y": 25 },
            ],
        }))
        .unwrap();
        assert_eq!(path.extent(), (40.0, 30.0));
        assert_eq!(path.points[1].handle_type, HandleType::Disconnected);
    }

    #[test]
    fn element_type_spellings() {
        for ty in [
            ElementType::Shape,
            ElementType::Text,
            ElementType::Frame,
            ElementType::Group,
            ElementType::Path,
            ElementType::Image,
            ElementType::ComponentInstance,
        ] {
            assert_eq!(ElementType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(ElementType::parse("video"), None);
        assert_eq!(ElementType::ComponentInstance.id_prefix(), "instance");
    }
}
