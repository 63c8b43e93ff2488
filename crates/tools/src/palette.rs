use propyard_assets::AssetCatalog;
use serde::Serialize;

/// One clickable palette entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Swatch {
    pub index: usize,
    pub asset_id: String,
    pub label: String,
    pub color_hex: String,
    pub highlighted: bool,
}

/// The decoration palette as the UI shows it.
///
/// Rebuild it whenever the selection or the catalog changes; clicking a
/// swatch should feed its `index` back as a select-asset action.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Palette {
    pub swatches: Vec<Swatch>,
}

impl Palette {
    /// One swatch per decoration key. Keys missing from the asset table are
    /// skipped, but indices still match palette positions.
    pub fn build(catalog: &AssetCatalog, selected: usize) -> Self {
        let swatches = catalog
            .decoration_keys()
            .iter()
            .enumerate()
            .filter_map(|(index, key)| match catalog.get(key) {
                Ok(asset) => Some(Swatch {
                    index,
                    asset_id: asset.id.clone(),
                    label: asset.display_name.clone(),
                    color_hex: asset.color.clone(),
                    highlighted: index == selected,
                }),
                Err(e) => {
                    tracing::warn!(index, key = %key, error = %e, "palette entry without asset");
                    None
                }
            })
            .collect();
        Self { swatches }
    }

    pub fn highlighted(&self) -> Option<&Swatch> {
        self.swatches.iter().find(|s| s.highlighted)
    }

    pub fn len(&self) -> usize {
        self.swatches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swatches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_swatch_per_decoration_with_single_highlight() {
        let catalog = AssetCatalog::builtin();
        let palette = Palette::build(&catalog, 2);
        assert_eq!(palette.len(), catalog.decoration_count());
        assert_eq!(palette.swatches.iter().filter(|s| s.highlighted).count(), 1);
        let selected = palette.highlighted().unwrap();
        assert_eq!(selected.index, 2);
        assert_eq!(selected.asset_id, catalog.decoration_keys()[2]);
    }

    #[test]
    fn floor_is_not_a_swatch() {
        let catalog = AssetCatalog::builtin();
        let palette = Palette::build(&catalog, 0);
        assert!(palette.swatches.iter().all(|s| s.asset_id != "floor"));
    }

    #[test]
    fn out_of_range_selection_highlights_nothing() {
        let palette = Palette::build(&AssetCatalog::builtin(), 99);
        assert!(palette.highlighted().is_none());
    }

    #[test]
    fn missing_asset_keeps_indices() {
        let catalog: AssetCatalog = serde_json::from_value(serde_json::json!({
            "assets": {
                "floor": {"id": "floor", "displayName": "Floor", "boundingSize": [10, 1, 10], "color": "#333333"},
                "block": {"id": "block", "displayName": "Block", "boundingSize": [5, 5, 5], "color": "#ff0000"}
            },
            "decorationKeys": ["ghost-key", "block"],
            "floorKey": "floor"
        }))
        .unwrap();
        let palette = Palette::build(&catalog, 1);
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.swatches[0].index, 1);
        assert!(palette.swatches[0].highlighted);
    }

    #[test]
    fn serializes_for_the_ui() {
        let palette = Palette::build(&AssetCatalog::builtin(), 0);
        let json = serde_json::to_value(&palette).unwrap();
        assert_eq!(json["swatches"][0]["highlighted"], true);
        assert!(json["swatches"][0]["colorHex"].as_str().unwrap().starts_with('#'));
    }
}
