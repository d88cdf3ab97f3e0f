//! Uploaded asset metadata.
//!
//! Assets are not canvas elements: they are not part of history and are
//! never ordered or parented. The catalogue only records what the storage
//! layer uploaded and how it was classified.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coarse kind of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Pdf,
    Csv,
    Markdown,
    Text,
    Spreadsheet,
    Presentation,
    Other,
}

impl AssetType {
    /// Classify by MIME type first, then by file extension when the MIME
    /// type is missing or too generic to tell.
    pub fn classify(mime: Option<&str>, file_name: &str) -> Self {
        if let Some(mime) = mime.map(str::to_ascii_lowercase) {
            if mime.starts_with("image/") {
                return AssetType::Image;
            }
            if mime == "application/pdf" {
                return AssetType::Pdf;
            }
            if mime.starts_with("text/csv") {
                return AssetType::Csv;
            }
            if mime.starts_with("text/markdown") {
                return AssetType::Markdown;
            }
            if mime.starts_with("text/") {
                return AssetType::Text;
            }
            if mime.contains("spreadsheet") || mime.contains("excel") {
                return AssetType::Spreadsheet;
            }
            if mime.contains("presentation") || mime.contains("powerpoint") {
                return AssetType::Presentation;
            }
        }

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" => AssetType::Image,
            "pdf" => AssetType::Pdf,
            "csv" => AssetType::Csv,
            "md" => AssetType::Markdown,
            "txt" => AssetType::Text,
            "xls" | "xlsx" => AssetType::Spreadsheet,
            "ppt" | "pptx" => AssetType::Presentation,
            _ => AssetType::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    /// Original file name.
    pub name: String,
    pub asset_type: AssetType,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub url: String,
}

/// What an upload reports about a stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAsset {
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    pub url: String,
    /// Overrides the classification derived from `mime_type` and `name`.
    #[serde(default)]
    pub asset_type: Option<AssetType>,
}

#[derive(Debug, Clone, Default)]
pub struct AssetCatalogue {
    assets: BTreeMap<String, Asset>,
    next_id: u64,
}

impl AssetCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_asset(&mut self, new: NewAsset) -> Asset {
        self.next_id += 1;
        let asset = Asset {
            id: format!("asset_{}", self.next_id),
            asset_type: new
                .asset_type
                .unwrap_or_else(|| AssetType::classify(new.mime_type.as_deref(), &new.name)),
            name: new.name,
            mime_type: new.mime_type,
            url: new.url,
        };
        log::info!("asset `{}` registered as {} ({:?})", asset.name, asset.id, asset.asset_type);
        self.assets.insert(asset.id.clone(), asset.clone());
        asset
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.get(id)
    }

    /// All assets, ordered by id.
    pub fn assets(&self) -> Vec<&Asset> {
        self.assets.values().collect()
    }

    pub fn delete_asset(&mut self, id: &str) -> Option<Asset> {
        let removed = self.assets.remove(id);
        if removed.is_none() {
            log::warn!("delete_asset: no asset {id}");
        }
        removed
    }
}
