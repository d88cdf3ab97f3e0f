pub mod component;
pub mod document;
pub mod edit;
pub mod error;
pub mod id;
pub mod model;
pub mod order;
pub mod payload;
pub mod presentation;
pub mod store;

pub use component::{ComponentCatalogue, ComponentCreated, ComponentDefinition, ComponentProperty, PropType};
pub use document::Document;
pub use edit::{Grouped, Ungrouped};
pub use error::{EngineError, Result};
pub use id::ElementId;
pub use model::*;
pub use order::{DropPosition, Scope, ZCommand};
pub use store::{ElementMap, SceneStore};

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect};
