//! Feature systems.
//!
//! A [`FeatureSystem`] registers categorical features and their values.
//! Registration is append-only: a value's [`ValueId`] never changes for the
//! lifetime of the system. Bounded (phonetic) systems hold at most
//! [`FeatureSystem::PHONETIC_CAPACITY`] values so every value fits a
//! [`FeatureBundle`] bit.

use std::collections::HashMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bundle::FeatureBundle;
use crate::error::{CapacityLimit, Error, Result};

/// Identifier of a registered feature.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeatureId(pub(crate) u32);

impl FeatureId {
    /// Returns the raw index of this feature.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeatureId({})", self.0)
    }
}

/// Identifier of a registered feature value; doubles as its bundle bit index.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValueId(pub(crate) u32);

impl ValueId {
    /// Returns the raw index (bit position) of this value.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueId({})", self.0)
    }
}

/// A named categorical dimension.
#[derive(Clone, Debug)]
pub struct Feature {
    id: FeatureId,
    name: String,
    values: Vec<ValueId>,
    default: Option<ValueId>,
    parent: Option<FeatureId>,
    subfeatures: Vec<FeatureId>,
}

impl Feature {
    /// Returns this feature's identifier.
    #[must_use]
    pub fn id(&self) -> FeatureId {
        self.id
    }

    /// Returns this feature's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the possible values, in registration order.
    #[must_use]
    pub fn values(&self) -> &[ValueId] {
        &self.values
    }

    /// Returns the default value, if any.
    #[must_use]
    pub fn default_value(&self) -> Option<ValueId> {
        self.default
    }

    /// Returns the parent feature of a sub-feature.
    #[must_use]
    pub fn parent(&self) -> Option<FeatureId> {
        self.parent
    }

    /// Returns the sub-features of a complex feature.
    #[must_use]
    pub fn subfeatures(&self) -> &[FeatureId] {
        &self.subfeatures
    }

    /// Returns true if this feature takes nested feature values.
    #[must_use]
    pub fn is_complex(&self) -> bool {
        !self.subfeatures.is_empty()
    }
}

/// An atomic value belonging to exactly one feature.
#[derive(Clone, Debug)]
pub struct FeatureValue {
    id: ValueId,
    name: String,
    feature: FeatureId,
}

impl FeatureValue {
    /// Returns this value's identifier.
    #[must_use]
    pub fn id(&self) -> ValueId {
        self.id
    }

    /// Returns this value's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the feature this value belongs to.
    #[must_use]
    pub fn feature(&self) -> FeatureId {
        self.feature
    }
}

/// Registry of features and values.
#[derive(Clone, Debug, Default)]
pub struct FeatureSystem {
    features: Vec<Feature>,
    values: Vec<FeatureValue>,
    feature_names: HashMap<String, FeatureId>,
    value_names: HashMap<String, ValueId>,
    capacity: Option<usize>,
}

impl FeatureSystem {
    /// Maximum number of values in a bounded (phonetic) system.
    pub const PHONETIC_CAPACITY: usize = crate::bundle::BUNDLE_CAPACITY;

    /// Creates a bounded system whose values fit in a [`FeatureBundle`].
    #[must_use]
    pub fn phonetic() -> Self {
        Self {
            capacity: Some(Self::PHONETIC_CAPACITY),
            ..Self::default()
        }
    }

    /// Creates an unbounded system for head and foot features.
    #[must_use]
    pub fn morphosyntactic() -> Self {
        Self::default()
    }

    /// Returns true if this system enforces the bundle capacity.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.capacity.is_some()
    }

    /// Registers a feature, returning the existing id if already present.
    pub fn add_feature(&mut self, name: &str) -> FeatureId {
        if let Some(&id) = self.feature_names.get(name) {
            return id;
        }
        let id = FeatureId(u32::try_from(self.features.len()).unwrap_or(u32::MAX));
        self.features.push(Feature {
            id,
            name: name.to_string(),
            values: Vec::new(),
            default: None,
            parent: None,
            subfeatures: Vec::new(),
        });
        self.feature_names.insert(name.to_string(), id);
        id
    }

    /// Registers a sub-feature of a complex feature.
    pub fn add_subfeature(&mut self, parent: FeatureId, name: &str) -> FeatureId {
        let id = self.add_feature(name);
        if let Some(feature) = self.features.get_mut(id.0 as usize) {
            feature.parent = Some(parent);
        }
        if let Some(parent) = self.features.get_mut(parent.0 as usize) {
            if !parent.subfeatures.contains(&id) {
                parent.subfeatures.push(id);
            }
        }
        id
    }

    /// Registers a value of `feature`.
    ///
    /// Registering an existing value of the same feature returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is unknown, if the name already belongs
    /// to another feature, or if a bounded system is full.
    pub fn add_value(&mut self, feature: FeatureId, name: &str) -> Result<ValueId> {
        if self.features.get(feature.0 as usize).is_none() {
            return Err(Error::unknown_feature(format!("{feature:?}")));
        }
        if let Some(&existing) = self.value_names.get(name) {
            if self.values[existing.0 as usize].feature == feature {
                return Ok(existing);
            }
            return Err(Error::unsupported(format!(
                "value {name} already belongs to feature {}",
                self.features[self.values[existing.0 as usize].feature.0 as usize].name
            )));
        }
        if let Some(limit) = self.capacity {
            if self.values.len() >= limit {
                return Err(Error::capacity_exceeded(CapacityLimit::FeatureValues {
                    limit,
                    value: Some(name.to_string()),
                }));
            }
        }
        let id = ValueId(
            u32::try_from(self.values.len())
                .map_err(|_| Error::new(crate::ErrorKind::Internal("too many values".into())))?,
        );
        self.values.push(FeatureValue {
            id,
            name: name.to_string(),
            feature,
        });
        self.value_names.insert(name.to_string(), id);
        self.features[feature.0 as usize].values.push(id);
        Ok(id)
    }

    /// Registers a feature together with its values.
    ///
    /// # Errors
    ///
    /// Returns an error if any value cannot be registered.
    pub fn add_feature_with_values(&mut self, name: &str, values: &[&str]) -> Result<FeatureId> {
        let id = self.add_feature(name);
        for value in values {
            self.add_value(id, value)?;
        }
        Ok(id)
    }

    /// Sets the default value of a feature.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not belong to the feature.
    pub fn set_default(&mut self, feature: FeatureId, value: ValueId) -> Result<()> {
        if self.feature_of(value) != Some(feature) {
            return Err(Error::unknown_value(format!("{value:?} for {feature:?}")));
        }
        self.features[feature.0 as usize].default = Some(value);
        Ok(())
    }

    /// Gets a feature by id.
    #[must_use]
    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(id.0 as usize)
    }

    /// Gets a value by id.
    #[must_use]
    pub fn value(&self, id: ValueId) -> Option<&FeatureValue> {
        self.values.get(id.0 as usize)
    }

    /// Looks up a feature id by name.
    #[must_use]
    pub fn feature_id(&self, name: &str) -> Option<FeatureId> {
        self.feature_names.get(name).copied()
    }

    /// Looks up a value id by name.
    #[must_use]
    pub fn value_id(&self, name: &str) -> Option<ValueId> {
        self.value_names.get(name).copied()
    }

    /// Looks up a feature id by name, failing if unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is not registered.
    pub fn require_feature(&self, name: &str) -> Result<FeatureId> {
        self.feature_id(name).ok_or_else(|| Error::unknown_feature(name))
    }

    /// Looks up a value id by name, failing if unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not registered.
    pub fn require_value(&self, name: &str) -> Result<ValueId> {
        self.value_id(name).ok_or_else(|| Error::unknown_value(name))
    }

    /// Returns the feature a value belongs to.
    #[must_use]
    pub fn feature_of(&self, value: ValueId) -> Option<FeatureId> {
        self.value(value).map(FeatureValue::feature)
    }

    /// Iterates all features in registration order.
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Returns the number of registered values.
    #[must_use]
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Returns the number of registered features.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Returns the bundle of every value of `feature`.
    #[must_use]
    pub fn feature_mask(&self, feature: FeatureId) -> FeatureBundle {
        self.feature(feature)
            .map(|f| FeatureBundle::from_values(f.values.iter().copied()))
            .unwrap_or_default()
    }

    /// Builds a bundle from value names.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is not registered.
    pub fn bundle(&self, names: &[&str]) -> Result<FeatureBundle> {
        let mut bundle = FeatureBundle::new();
        for name in names {
            bundle.set(self.require_value(name)?);
        }
        Ok(bundle)
    }

    /// Returns the anti-bundle: for every feature with a value set in
    /// `bundle`, the values of that feature that are not set.
    #[must_use]
    pub fn anti_bundle(&self, bundle: &FeatureBundle) -> FeatureBundle {
        let mut anti = FeatureBundle::new();
        for feature in &self.features {
            let mask = self.feature_mask(feature.id);
            if !bundle.disjoint(&mask) {
                anti.apply(&mask.difference(bundle), true);
            }
        }
        anti
    }

    /// Returns the features that have at least one value set in `bundle`.
    #[must_use]
    pub fn specified_features(&self, bundle: &FeatureBundle) -> Vec<FeatureId> {
        self.features
            .iter()
            .filter(|f| !f.values.is_empty() && !bundle.disjoint(&self.feature_mask(f.id)))
            .map(|f| f.id)
            .collect()
    }

    /// Returns `bundle` with every value of each unspecified feature set.
    ///
    /// An uninstantiated segment unifies with any fully specified segment that
    /// agrees on the features `bundle` does specify.
    #[must_use]
    pub fn uninstantiated(&self, bundle: &FeatureBundle) -> FeatureBundle {
        let mut result = *bundle;
        for feature in &self.features {
            let mask = self.feature_mask(feature.id);
            if bundle.disjoint(&mask) {
                result.apply(&mask, true);
            }
        }
        result
    }

    /// Formats a bundle as `[value value ...]` using value names.
    #[must_use]
    pub fn describe(&self, bundle: &FeatureBundle) -> String {
        let names: Vec<&str> = bundle
            .values()
            .map(|v| self.value(v).map_or("?", FeatureValue::name))
            .collect();
        format!("[{}]", names.join(" "))
    }
}
