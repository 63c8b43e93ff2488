//! Asset catalog: read-only descriptors for everything that can be placed.
//!
//! A distinguished list of decoration keys forms the cyclable placement
//! palette; a distinguished floor key names the base placeable surface.
//! Lookups fail explicitly with [`AssetError::NotFound`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Metadata for one placeable or structural asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    pub id: String,
    pub display_name: String,
    /// Full width, height and depth in meters.
    pub bounding_size: [f32; 3],
    /// `#rrggbb`.
    pub color: String,
    /// Structural assets (floor, walls) are never offered in the palette.
    #[serde(default)]
    pub is_structural: bool,
}

impl AssetDescriptor {
    pub fn height(&self) -> f32 {
        self.bounding_size[1]
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCatalog {
    assets: BTreeMap<String, AssetDescriptor>,
    decoration_keys: Vec<String>,
    floor_key: String,
}

impl AssetCatalog {
    /// Build and validate a catalog.
    pub fn new(
        assets: impl IntoIterator<Item = AssetDescriptor>,
        decoration_keys: Vec<String>,
        floor_key: impl Into<String>,
    ) -> Result<Self, AssetError> {
        let catalog = Self {
            assets: assets.into_iter().map(|a| (a.id.clone(), a)).collect(),
            decoration_keys,
            floor_key: floor_key.into(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog shipped with the game.
    pub fn builtin() -> Self {
        let entry = |id: &str, name: &str, size: [f32; 3], color: &str, structural: bool| {
            AssetDescriptor {
                id: id.into(),
                display_name: name.into(),
                bounding_size: size,
                color: color.into(),
                is_structural: structural,
            }
        };
        let assets = [
            entry("floor", "Floor", [200.0, 1.0, 200.0], "#556b2f", true),
            entry("block", "Block", [5.0, 5.0, 5.0], "#c0504d", false),
            entry("slab", "Slab", [5.0, 1.0, 5.0], "#9bbb59", false),
            entry("pillar", "Pillar", [1.0, 10.0, 1.0], "#4f81bd", false),
            entry("wall", "Wall", [5.0, 5.0, 1.0], "#8064a2", false),
            entry("crate", "Crate", [2.0, 2.0, 2.0], "#f79646", false),
        ];
        Self {
            assets: assets.into_iter().map(|a| (a.id.clone(), a)).collect(),
            decoration_keys: ["block", "slab", "pillar", "wall", "crate"]
                .map(String::from)
                .to_vec(),
            floor_key: "floor".into(),
        }
    }

    /// Check that the floor and every decoration key resolve and that sizes are positive.
    pub fn validate(&self) -> Result<(), AssetError> {
        let floor = self.floor()?;
        if !floor.is_structural {
            return Err(AssetError::InvalidCatalog(format!(
                "floor asset {} must be structural",
                floor.id
            )));
        }
        if self.decoration_keys.is_empty() {
            return Err(AssetError::InvalidCatalog("no decoration keys".into()));
        }
        for key in &self.decoration_keys {
            let asset = self.get(key)?;
            if asset.is_structural {
                return Err(AssetError::InvalidCatalog(format!(
                    "decoration {key} is structural"
                )));
            }
        }
        for (key, asset) in &self.assets {
            if key != &asset.id {
                return Err(AssetError::InvalidCatalog(format!(
                    "key {key} holds asset {}",
                    asset.id
                )));
            }
            if asset.bounding_size.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(AssetError::InvalidCatalog(format!(
                    "asset {key} has non-positive size"
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&AssetDescriptor, AssetError> {
        self.assets
            .get(id)
            .ok_or_else(|| AssetError::NotFound(id.to_owned()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.assets.contains_key(id)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.assets.values()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn decoration_keys(&self) -> &[String] {
        &self.decoration_keys
    }

    /// Palette key at `index`, if in range. The key may still be missing from
    /// the asset table when the catalog was built without validation.
    pub fn decoration_key(&self, index: usize) -> Option<&str> {
        self.decoration_keys.get(index).map(String::as_str)
    }

    pub fn decoration(&self, index: usize) -> Result<&AssetDescriptor, AssetError> {
        let key = self
            .decoration_key(index)
            .ok_or_else(|| AssetError::NotFound(format!("decoration #{index}")))?;
        self.get(key)
    }

    pub fn decoration_count(&self) -> usize {
        self.decoration_keys.len()
    }

    pub fn floor(&self) -> Result<&AssetDescriptor, AssetError> {
        self.get(&self.floor_key)
    }

    /// Hex SHA-256 of the canonical JSON form. Identical catalogs share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, AssetError> {
        let bytes = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&bytes);
        Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn from_json_str(s: &str) -> Result<Self, AssetError> {
        let catalog: Self = serde_json::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, AssetError> {
        let catalog: Self = serde_yaml::from_str(s)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load from `.yaml`/`.yml` or JSON (anything else).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text)?,
            _ => Self::from_json_str(&text)?,
        };
        tracing::debug!(path = %path.display(), assets = catalog.len(), "loaded asset catalog");
        Ok(catalog)
    }

    /// Save as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn crate_info() -> &'static str {
    concat!("propyard-assets v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = AssetCatalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.floor().unwrap().id, "floor");
        assert_eq!(catalog.decoration_count(), 5);
        assert!(catalog.assets().all(|a| a.id == "floor" || !a.is_structural));
    }

    #[test]
    fn missing_lookup_is_explicit() {
        let catalog = AssetCatalog::builtin();
        assert!(matches!(catalog.get("sofa"), Err(AssetError::NotFound(id)) if id == "sofa"));
        assert!(matches!(catalog.decoration(99), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn decoration_keys_must_resolve() {
        let floor = AssetCatalog::builtin().floor().unwrap().clone();
        let err = AssetCatalog::new([floor], vec!["ghost".into()], "floor").unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn structural_decoration_is_rejected() {
        let floor = AssetCatalog::builtin().floor().unwrap().clone();
        let err = AssetCatalog::new([floor], vec!["floor".into()], "floor").unwrap_err();
        assert!(matches!(err, AssetError::InvalidCatalog(_)));
    }

    #[test]
    fn yaml_catalog_parses() {
        let yaml = r##"
assets:
  ground:
    id: ground
    displayName: Ground
    boundingSize: [50.0, 1.0, 50.0]
    color: "#333333"
    isStructural: true
  cube:
    id: cube
    displayName: Cube
    boundingSize: [1.0, 2.0, 1.0]
    color: "#ff0000"
decorationKeys: [cube]
floorKey: ground
"##;
        let catalog = AssetCatalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.decoration(0).unwrap().height(), 2.0);
        assert!(!catalog.get("cube").unwrap().is_structural);
    }

    #[test]
    fn save_and_load_json() {
        let tmp = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let catalog = AssetCatalog::builtin();
        catalog.save(tmp.path()).unwrap();
        let loaded = AssetCatalog::load(tmp.path()).unwrap();
        assert_eq!(loaded, catalog);
        assert_eq!(loaded.fingerprint().unwrap(), catalog.fingerprint().unwrap());
    }
}
