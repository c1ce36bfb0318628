//! Alpha-variable binding.
//!
//! An alpha variable forces two pattern positions to agree (or disagree) on
//! a feature. Bindings live in a [`VariableValues`] for the duration of one
//! match attempt and are cloned whenever the matcher branches.

use std::collections::BTreeMap;

use crate::bundle::FeatureBundle;
use crate::error::{Error, Result};
use crate::feature::{FeatureId, FeatureSystem, ValueId};

/// A named placeholder ranging over the values of one feature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AlphaVariable {
    name: String,
    feature: FeatureId,
    mask: FeatureBundle,
}

impl AlphaVariable {
    /// Creates a variable over the named feature.
    ///
    /// # Errors
    ///
    /// Returns an error if the feature is not registered.
    pub fn new(system: &FeatureSystem, name: &str, feature: &str) -> Result<Self> {
        let feature = system.require_feature(feature)?;
        Ok(Self {
            name: name.to_string(),
            feature,
            mask: system.feature_mask(feature),
        })
    }

    /// Returns the variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the feature the variable ranges over.
    #[must_use]
    pub fn feature(&self) -> FeatureId {
        self.feature
    }

    /// Returns the bundle of every value of the feature.
    #[must_use]
    pub fn mask(&self) -> FeatureBundle {
        self.mask
    }
}

/// A variable occurrence in a natural class: `[αF]` agrees, `[-αF]` differs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableConstraint {
    /// The variable.
    pub variable: AlphaVariable,
    /// True for agreement, false for disagreement.
    pub agree: bool,
}

impl VariableConstraint {
    /// Creates an agreement constraint.
    #[must_use]
    pub fn agree(variable: AlphaVariable) -> Self {
        Self {
            variable,
            agree: true,
        }
    }

    /// Creates a disagreement constraint.
    #[must_use]
    pub fn disagree(variable: AlphaVariable) -> Self {
        Self {
            variable,
            agree: false,
        }
    }
}

/// How unbound variables are resolved against a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingStrategy {
    /// Bind to the first candidate value (synthesis target position).
    First,
    /// Branch once per candidate value (environments and analysis).
    Enumerate,
}

/// Values bound to alpha variables during one match attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VariableValues {
    values: BTreeMap<String, Vec<ValueId>>,
}

impl VariableValues {
    /// Creates empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Gets the values bound to a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[ValueId]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Binds a variable, replacing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, values: Vec<ValueId>) {
        self.values.insert(name.into(), values);
    }

    /// Removes a binding.
    pub fn unbind(&mut self, name: &str) {
        self.values.remove(name);
    }

    /// Overwrites every binding present in `other`.
    pub fn replace_all(&mut self, other: &VariableValues) {
        for (name, values) in &other.values {
            self.values.insert(name.clone(), values.clone());
        }
    }

    /// Drops every variable bound to more than one value.
    pub fn remove_ambiguous(&mut self) {
        self.values.retain(|_, values| values.len() <= 1);
    }

    /// Iterates bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ValueId])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Resolves `constraints` against a segment's bundle.
    ///
    /// Returns one binding set per consistent way of satisfying every
    /// constraint; an empty result means the segment does not satisfy them.
    /// A feature the bundle leaves unspecified ranges over all its values.
    #[must_use]
    pub fn resolve(
        &self,
        bundle: &FeatureBundle,
        constraints: &[VariableConstraint],
        strategy: BindingStrategy,
    ) -> Vec<VariableValues> {
        let mut results = vec![self.clone()];
        for constraint in constraints {
            let variable = &constraint.variable;
            let present = bundle.intersection(&variable.mask);
            let candidates: Vec<ValueId> = if present.is_empty() {
                variable.mask.values().collect()
            } else {
                present.values().collect()
            };

            let mut next = Vec::new();
            for vars in results {
                match vars.get(&variable.name) {
                    Some(bound) if constraint.agree => {
                        let consistent: Vec<ValueId> = candidates
                            .iter()
                            .filter(|v| bound.contains(v))
                            .copied()
                            .collect();
                        if !consistent.is_empty() {
                            let mut narrowed = vars.clone();
                            narrowed.bind(variable.name.clone(), consistent);
                            next.push(narrowed);
                        }
                    }
                    Some(bound) => {
                        let differs = candidates.iter().any(|c| bound.iter().any(|b| b != c));
                        if differs {
                            next.push(vars.clone());
                        }
                    }
                    None => {
                        let choices = match strategy {
                            BindingStrategy::First => &candidates[..candidates.len().min(1)],
                            BindingStrategy::Enumerate => &candidates[..],
                        };
                        for &value in choices {
                            let bound = if constraint.agree {
                                vec![value]
                            } else {
                                variable.mask.values().filter(|v| *v != value).collect()
                            };
                            let mut branch = vars.clone();
                            branch.bind(variable.name.clone(), bound);
                            next.push(branch);
                        }
                    }
                }
            }
            results = next;
            if results.is_empty() {
                break;
            }
        }
        results
    }

    /// Writes the bound values of `constraints` into `bundle`.
    ///
    /// # Errors
    ///
    /// Returns an uninstantiated feature error if a variable is unbound.
    pub fn apply_to(&self, bundle: &mut FeatureBundle, constraints: &[VariableConstraint]) -> Result<()> {
        for constraint in constraints {
            let variable = &constraint.variable;
            let bound = self
                .get(&variable.name)
                .ok_or_else(|| Error::uninstantiated_feature(variable.name.clone()))?;
            let mut set = FeatureBundle::from_values(bound.iter().copied());
            if !constraint.agree {
                set = variable.mask.difference(&set);
            }
            bundle.apply(&variable.mask, false);
            bundle.apply(&set, true);
        }
        Ok(())
    }
}
