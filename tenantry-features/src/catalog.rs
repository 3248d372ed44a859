//! Feature catalog collaborator.

use std::collections::HashMap;
use tenantry_core::FeatureDefinition;

/// Read-only set of known features.
pub trait FeatureCatalog: Send + Sync {
    /// Every feature, in catalog order.
    fn all(&self) -> &[FeatureDefinition];

    /// Look a feature up by name.
    fn get(&self, name: &str) -> Option<&FeatureDefinition>;

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Catalog fixed at construction time.
#[derive(Debug, Clone, Default)]
pub struct StaticFeatureCatalog {
    features: Vec<FeatureDefinition>,
    index: HashMap<String, usize>,
}

impl StaticFeatureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a feature. A later definition with the same name replaces the
    /// earlier one in place, keeping its position.
    pub fn with_feature(mut self, definition: FeatureDefinition) -> Self {
        match self.index.get(&definition.name) {
            Some(&position) => self.features[position] = definition,
            None => {
                self.index
                    .insert(definition.name.clone(), self.features.len());
                self.features.push(definition);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromIterator<FeatureDefinition> for StaticFeatureCatalog {
    fn from_iter<I: IntoIterator<Item = FeatureDefinition>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |catalog, definition| catalog.with_feature(definition))
    }
}

impl FeatureCatalog for StaticFeatureCatalog {
    fn all(&self) -> &[FeatureDefinition] {
        &self.features
    }

    fn get(&self, name: &str) -> Option<&FeatureDefinition> {
        self.index.get(name).map(|&position| &self.features[position])
    }
}
