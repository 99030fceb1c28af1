// Layered sources: first source holding a key wins

use crate::source::PropertySource;
use std::sync::Arc;

/// Ordered stack of property sources.
///
/// Lookups walk the layers front to back and return the first raw value
/// found. A malformed value in a higher layer still shadows lower layers, so
/// it resolves to the caller's default rather than to a lower layer's value.
#[derive(Clone, Default)]
pub struct LayeredPropertySource {
    layers: Vec<Arc<dyn PropertySource>>,
}

impl LayeredPropertySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer below the existing ones
    pub fn with_layer(mut self, layer: Arc<dyn PropertySource>) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl PropertySource for LayeredPropertySource {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get_raw(key))
    }
}
