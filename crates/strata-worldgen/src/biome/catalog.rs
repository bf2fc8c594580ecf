//! Biome catalog: maps [`BiomeId`] to [`BiomeDef`] with name-based lookup.

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::BiomeDef;
use crate::error::GenerationError;
use crate::placement::ScatterRule;

/// Unique identifier for a biome type within a catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BiomeId(pub u16);

impl fmt::Display for BiomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stores all biome definitions of a run with O(1) lookup by ID.
#[derive(Clone, Debug, Default)]
pub struct BiomeCatalog {
    biomes: Vec<BiomeDef>,
    name_to_id: HashMap<String, BiomeId>,
}

impl BiomeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from definitions, assigning IDs in order.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::DuplicateBiome`] if two definitions share a name.
    pub fn from_defs(defs: impl IntoIterator<Item = BiomeDef>) -> Result<Self, GenerationError> {
        let mut catalog = Self::new();
        for def in defs {
            catalog.register(def)?;
        }
        Ok(catalog)
    }

    /// Registers a new biome definition, returning its assigned [`BiomeId`].
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::DuplicateBiome`] if a biome with the same name exists.
    pub fn register(&mut self, def: BiomeDef) -> Result<BiomeId, GenerationError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(GenerationError::DuplicateBiome(def.name));
        }
        let id = BiomeId(self.biomes.len() as u16);
        self.name_to_id.insert(def.name.clone(), id);
        self.biomes.push(def);
        Ok(id)
    }

    /// Returns the definition for the given biome ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not registered.
    pub fn get(&self, id: BiomeId) -> &BiomeDef {
        &self.biomes[id.0 as usize]
    }

    /// Returns the definition for `id`, or `None` if it is not registered.
    pub fn try_get(&self, id: BiomeId) -> Option<&BiomeDef> {
        self.biomes.get(id.0 as usize)
    }

    /// Looks up a biome ID by name.
    pub fn lookup_by_name(&self, name: &str) -> Option<BiomeId> {
        self.name_to_id.get(name).copied()
    }

    /// Iterates `(id, definition)` pairs in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (BiomeId, &BiomeDef)> {
        self.biomes
            .iter()
            .enumerate()
            .map(|(i, def)| (BiomeId(i as u16), def))
    }

    /// Returns the number of registered biomes.
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Returns `true` if no biomes are registered.
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }

    /// Sum of all non-negative selection weights.
    pub fn total_weight(&self) -> f64 {
        self.biomes.iter().map(|b| b.weight.max(0.0)).sum()
    }

    /// Verify every layer index a biome references exists on the terrain.
    pub fn validate_layers(
        &self,
        splat_layers: usize,
        detail_layers: usize,
    ) -> Result<(), GenerationError> {
        for def in &self.biomes {
            if def.texture_layer >= splat_layers {
                return Err(layer_error(def, "texture", def.texture_layer, splat_layers));
            }
            for veg in &def.vegetation {
                if veg.detail_layer >= detail_layers {
                    return Err(layer_error(def, "detail", veg.detail_layer, detail_layers));
                }
            }
            for rule in &def.scatter {
                check_rule_layers(def, rule, splat_layers)?;
            }
        }
        Ok(())
    }
}

fn check_rule_layers(
    def: &BiomeDef,
    rule: &ScatterRule,
    splat_layers: usize,
) -> Result<(), GenerationError> {
    if let Some(layers) = &rule.allowed_layers
        && let Some(&bad) = layers.iter().find(|&&l| l >= splat_layers)
    {
        return Err(layer_error(def, "texture", bad, splat_layers));
    }
    for child in &rule.children {
        check_rule_layers(def, &child.rule, splat_layers)?;
    }
    Ok(())
}

fn layer_error(def: &BiomeDef, kind: &'static str, layer: usize, count: usize) -> GenerationError {
    GenerationError::LayerOutOfRange {
        biome: def.name.clone(),
        kind,
        layer,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::VegetationLayer;

    fn named(name: &str) -> BiomeDef {
        BiomeDef {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_catalog_assigns_ids_in_order() {
        let catalog = BiomeCatalog::from_defs([named("desert"), named("forest")]).unwrap();
        assert_eq!(catalog.lookup_by_name("desert"), Some(BiomeId(0)));
        assert_eq!(catalog.lookup_by_name("forest"), Some(BiomeId(1)));
        assert_eq!(catalog.get(BiomeId(1)).name, "forest");
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_catalog_duplicate_rejected() {
        let result = BiomeCatalog::from_defs([named("desert"), named("desert")]);
        assert!(matches!(result, Err(GenerationError::DuplicateBiome(name)) if name == "desert"));
    }

    #[test]
    fn test_try_get_unknown_is_none() {
        let catalog = BiomeCatalog::from_defs([named("a")]).unwrap();
        assert!(catalog.try_get(BiomeId(3)).is_none());
    }

    #[test]
    fn test_total_weight_ignores_negative() {
        let mut a = named("a");
        a.weight = 2.0;
        let mut b = named("b");
        b.weight = -5.0;
        let catalog = BiomeCatalog::from_defs([a, b]).unwrap();
        assert!((catalog.total_weight() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_layers_rejects_missing_detail_layer() {
        let mut def = named("meadow");
        def.vegetation.push(VegetationLayer {
            detail_layer: 2,
            ..Default::default()
        });
        let catalog = BiomeCatalog::from_defs([def]).unwrap();
        assert!(catalog.validate_layers(4, 3).is_ok());
        assert!(matches!(
            catalog.validate_layers(4, 2),
            Err(GenerationError::LayerOutOfRange { kind: "detail", layer: 2, .. })
        ));
    }

    #[test]
    fn test_validate_layers_rejects_missing_texture_layer() {
        let mut def = named("snow");
        def.texture_layer = 4;
        let catalog = BiomeCatalog::from_defs([def]).unwrap();
        assert!(catalog.validate_layers(4, 0).is_err());
    }
}
