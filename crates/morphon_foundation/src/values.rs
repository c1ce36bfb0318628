//! Recursive feature values for head and foot features.
//!
//! Morphosyntactic agreement needs structural unification, so these features
//! use a sorted persistent map from feature to either a closed set of values
//! or a nested [`FeatureValues`]. Cloning is O(1) thanks to `im`.

use std::fmt;

use im::{OrdMap, OrdSet};

use crate::error::Result;
use crate::feature::{FeatureId, FeatureSystem, ValueId};

/// The value a feature takes in a [`FeatureValues`] map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueInstance {
    /// One of a closed set of atomic values.
    Closed(OrdSet<ValueId>),
    /// Nested values for a complex feature.
    Complex(FeatureValues),
}

impl ValueInstance {
    /// Creates a closed instance from values.
    pub fn closed<I>(values: I) -> Self
    where
        I: IntoIterator<Item = ValueId>,
    {
        Self::Closed(values.into_iter().collect())
    }

    fn unify(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Closed(a), Self::Closed(b)) => {
                let shared: OrdSet<ValueId> = a.iter().filter(|v| b.contains(v)).copied().collect();
                if shared.is_empty() {
                    None
                } else {
                    Some(Self::Closed(shared))
                }
            }
            (Self::Complex(a), Self::Complex(b)) => a.unify(b).map(Self::Complex),
            _ => None,
        }
    }

    fn matches(&self, required: &Self) -> bool {
        match (self, required) {
            (Self::Closed(a), Self::Closed(b)) => !a.is_empty() && a.iter().all(|v| b.contains(v)),
            (Self::Complex(a), Self::Complex(b)) => a.matches(b),
            _ => false,
        }
    }

    fn is_compatible(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Closed(a), Self::Closed(b)) => a.iter().any(|v| b.contains(v)),
            (Self::Complex(a), Self::Complex(b)) => a.is_compatible(b),
            _ => false,
        }
    }

    fn remainder(&self, other: &Self) -> Option<Option<Self>> {
        match (self, other) {
            (Self::Closed(a), Self::Closed(b)) => {
                if !b.iter().all(|v| a.contains(v)) {
                    return None;
                }
                let rest: OrdSet<ValueId> = a.iter().filter(|v| !b.contains(v)).copied().collect();
                Some((!rest.is_empty()).then_some(Self::Closed(rest)))
            }
            (Self::Complex(a), Self::Complex(b)) => {
                let rest = a.superset_remainder(b)?;
                Some((!rest.is_empty()).then_some(Self::Complex(rest)))
            }
            _ => None,
        }
    }

    fn value_count(&self) -> usize {
        match self {
            Self::Closed(values) => values.len(),
            Self::Complex(nested) => nested.value_count(),
        }
    }
}

/// A sorted mapping from feature to value instance.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct FeatureValues {
    values: OrdMap<FeatureId, ValueInstance>,
}

impl FeatureValues {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds values from `(feature, [value, ...])` name pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a feature or value name is not registered.
    pub fn from_names(system: &FeatureSystem, pairs: &[(&str, &[&str])]) -> Result<Self> {
        let mut result = Self::new();
        for (feature, values) in pairs {
            let feature = system.require_feature(feature)?;
            let ids = values
                .iter()
                .map(|v| system.require_value(v))
                .collect::<Result<Vec<_>>>()?;
            result.insert(feature, ValueInstance::closed(ids));
        }
        Ok(result)
    }

    /// Returns true if no feature is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of features set at this level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns the total number of atomic values, counting nested levels.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.values().map(ValueInstance::value_count).sum()
    }

    /// Gets the instance for a feature.
    #[must_use]
    pub fn get(&self, feature: FeatureId) -> Option<&ValueInstance> {
        self.values.get(&feature)
    }

    /// Returns true if the feature is set.
    #[must_use]
    pub fn contains(&self, feature: FeatureId) -> bool {
        self.values.contains_key(&feature)
    }

    /// Sets the instance for a feature.
    pub fn insert(&mut self, feature: FeatureId, instance: ValueInstance) {
        self.values.insert(feature, instance);
    }

    /// Returns a copy with closed values set for a feature.
    #[must_use]
    pub fn with_values<I>(mut self, feature: FeatureId, values: I) -> Self
    where
        I: IntoIterator<Item = ValueId>,
    {
        self.insert(feature, ValueInstance::closed(values));
        self
    }

    /// Returns a copy with nested values set for a complex feature.
    #[must_use]
    pub fn with_complex(mut self, feature: FeatureId, nested: FeatureValues) -> Self {
        self.insert(feature, ValueInstance::Complex(nested));
        self
    }

    /// Iterates features and instances in feature order.
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureId, &ValueInstance)> {
        self.values.iter()
    }

    /// Unifies two maps. Features present on one side only are kept; shared
    /// features must have intersecting values.
    #[must_use]
    pub fn unify(&self, other: &Self) -> Option<Self> {
        let mut result = self.clone();
        for (feature, instance) in &other.values {
            let unified = match self.values.get(feature) {
                Some(existing) => existing.unify(instance)?,
                None => instance.clone(),
            };
            result.values.insert(*feature, unified);
        }
        Some(result)
    }

    /// Returns a copy with every feature of `other` overriding this map's.
    #[must_use]
    pub fn overlay(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for (feature, instance) in &other.values {
            result.values.insert(*feature, instance.clone());
        }
        result
    }

    /// Unifies, then instantiates the default of every absent feature.
    #[must_use]
    pub fn unify_defaults(&self, other: &Self, system: &FeatureSystem) -> Option<Self> {
        let mut result = self.unify(other)?;
        let top: Vec<FeatureId> = system
            .features()
            .filter(|f| f.parent().is_none())
            .map(|f| f.id())
            .collect();
        result.fill_defaults(system, &top);
        Some(result)
    }

    fn fill_defaults(&mut self, system: &FeatureSystem, features: &[FeatureId]) {
        for &id in features {
            let Some(feature) = system.feature(id) else {
                continue;
            };
            match self.values.get(&id).cloned() {
                None => {
                    if let Some(default) = feature.default_value() {
                        self.values.insert(id, ValueInstance::closed([default]));
                    }
                }
                Some(ValueInstance::Complex(mut nested)) => {
                    nested.fill_defaults(system, feature.subfeatures());
                    self.values.insert(id, ValueInstance::Complex(nested));
                }
                Some(ValueInstance::Closed(_)) => {}
            }
        }
    }

    /// Returns true if every feature in `required` is present here with
    /// values inside the required set.
    #[must_use]
    pub fn matches(&self, required: &Self) -> bool {
        required.values.iter().all(|(feature, req)| {
            self.values
                .get(feature)
                .is_some_and(|actual| actual.matches(req))
        })
    }

    /// Returns true if every feature present on both sides has overlapping values.
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        other.values.iter().all(|(feature, theirs)| {
            self.values
                .get(feature)
                .is_none_or(|ours| ours.is_compatible(theirs))
        })
    }

    /// If `self` contains everything in `other`, returns what is left of
    /// `self` once `other` is removed.
    #[must_use]
    pub fn superset_remainder(&self, other: &Self) -> Option<Self> {
        let mut rest = self.clone();
        for (feature, theirs) in &other.values {
            let ours = self.values.get(feature)?;
            match ours.remainder(theirs)? {
                Some(remaining) => {
                    rest.values.insert(*feature, remaining);
                }
                None => {
                    rest.values.remove(feature);
                }
            }
        }
        Some(rest)
    }

    /// Formats the values using names from `system`.
    #[must_use]
    pub fn describe(&self, system: &FeatureSystem) -> String {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(feature, instance)| {
                let name = system.feature(*feature).map_or("?", |f| f.name());
                match instance {
                    ValueInstance::Closed(values) => {
                        let names: Vec<&str> = values
                            .iter()
                            .map(|v| system.value(*v).map_or("?", |fv| fv.name()))
                            .collect();
                        format!("{name}:{}", names.join("|"))
                    }
                    ValueInstance::Complex(nested) => format!("{name}:{}", nested.describe(system)),
                }
            })
            .collect();
        format!("[{}]", parts.join(" "))
    }
}

impl fmt::Debug for FeatureValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}
