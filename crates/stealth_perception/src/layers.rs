//! Query layers used to classify targets and obstructions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A query layer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryLayer(pub u32);

impl QueryLayer {
    /// Default layer
    pub const DEFAULT: Self = Self(0);
    /// Things a sensor looks for (the player)
    pub const TARGET: Self = Self(1);
    /// Enemy agents
    pub const ENEMIES: Self = Self(2);
    /// Walls and props that block line of sight
    pub const OBSTRUCTION: Self = Self(3);
    /// Doors (block sight while closed)
    pub const DOORS: Self = Self(4);
    /// Trigger volumes
    pub const TRIGGERS: Self = Self(5);

    /// Create a custom layer
    pub const fn custom(id: u32) -> Self {
        Self(id)
    }

    /// Get the layer as a bitmask
    pub const fn as_mask(&self) -> u32 {
        1 << self.0
    }
}

impl Default for QueryLayer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Set of layers a query is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches every layer
    pub const ALL: Self = Self(u32::MAX);
    /// Matches nothing
    pub const NONE: Self = Self(0);

    /// Mask for a single layer
    pub const fn single(layer: QueryLayer) -> Self {
        Self(layer.as_mask())
    }

    /// Mask for several layers
    pub fn from_layers(layers: &[QueryLayer]) -> Self {
        Self(layers.iter().fold(0u32, |acc, l| acc | l.as_mask()))
    }

    /// Add a layer
    pub fn with(mut self, layer: QueryLayer) -> Self {
        self.0 |= layer.as_mask();
        self
    }

    /// Remove a layer
    pub fn without(mut self, layer: QueryLayer) -> Self {
        self.0 &= !layer.as_mask();
        self
    }

    /// Whether a layer is in this mask
    pub fn contains(&self, layer: QueryLayer) -> bool {
        self.0 & layer.as_mask() != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<QueryLayer> for LayerMask {
    fn from(layer: QueryLayer) -> Self {
        Self::single(layer)
    }
}

/// Name table for layers referenced from level data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerRegistry {
    layer_names: HashMap<String, QueryLayer>,
}

impl Default for LayerRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register_layer("default", QueryLayer::DEFAULT);
        registry.register_layer("target", QueryLayer::TARGET);
        registry.register_layer("player", QueryLayer::TARGET);
        registry.register_layer("enemies", QueryLayer::ENEMIES);
        registry.register_layer("obstruction", QueryLayer::OBSTRUCTION);
        registry.register_layer("walls", QueryLayer::OBSTRUCTION);
        registry.register_layer("doors", QueryLayer::DOORS);
        registry.register_layer("triggers", QueryLayer::TRIGGERS);
        registry
    }
}

impl LayerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            layer_names: HashMap::new(),
        }
    }

    /// Register a named layer
    pub fn register_layer(&mut self, name: &str, layer: QueryLayer) {
        self.layer_names.insert(name.to_lowercase(), layer);
    }

    /// Get a layer by name (case-insensitive)
    pub fn get_layer(&self, name: &str) -> Option<QueryLayer> {
        self.layer_names.get(&name.to_lowercase()).copied()
    }

    /// Build a mask from layer names, failing on the first unknown name
    pub fn mask_from_names<S: AsRef<str>>(&self, names: &[S]) -> Result<LayerMask, String> {
        names.iter().try_fold(LayerMask::NONE, |mask, name| {
            self.get_layer(name.as_ref())
                .map(|layer| mask.with(layer))
                .ok_or_else(|| name.as_ref().to_string())
        })
    }
}
