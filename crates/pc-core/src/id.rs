use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for element ids: fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for canvas elements and component
/// definitions. Internally a `Spur` index, 4 bytes, Copy, Eq, Hash in O(1).
///
/// Ids cross the wire as plain strings (`"shape_3"`, `"frame_a1"`), so the
/// serde impls go through the interner in both directions.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    /// Intern a string as an ElementId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        ElementId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        ElementId::intern(s)
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(serde::de::Error::custom("element id must not be empty"));
        }
        Ok(ElementId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ElementId::intern("frame_intro");
        let b = ElementId::intern("frame_intro");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "frame_intro");
        assert_eq!(a.to_string(), "frame_intro");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ElementId::intern("shape_7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"shape_7\"");
        let back: ElementId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn empty_id_is_rejected() {
        assert!(serde_json::from_str::<ElementId>("\"\"").is_err());
    }
}
