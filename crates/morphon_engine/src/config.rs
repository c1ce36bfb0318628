//! Search configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Limits and options for [`Morpher`](crate::Morpher) searches.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MorpherConfig {
    /// Extra times a deletion rule is unapplied at the same gap.
    pub deletion_reapplications: usize,
    /// How often one morphological rule may be unapplied in an unordered
    /// stratum.
    pub max_rule_unapplications: usize,
    /// Upper bound on the analyses a single stratum may produce from one input.
    pub max_analyses_per_stratum: usize,
}

impl Default for MorpherConfig {
    fn default() -> Self {
        Self {
            deletion_reapplications: 0,
            max_rule_unapplications: 2,
            max_analyses_per_stratum: 4096,
        }
    }
}

impl MorpherConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deletion reapplication count.
    #[must_use]
    pub fn with_deletion_reapplications(mut self, count: usize) -> Self {
        self.deletion_reapplications = count;
        self
    }

    /// Sets the per-rule unapplication limit for unordered strata.
    #[must_use]
    pub fn with_max_rule_unapplications(mut self, count: usize) -> Self {
        self.max_rule_unapplications = count;
        self
    }

    /// Sets the per-stratum analysis limit.
    #[must_use]
    pub fn with_max_analyses_per_stratum(mut self, count: usize) -> Self {
        self.max_analyses_per_stratum = count;
        self
    }
}

/// How a stratum orders its morphological rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MorphologicalOrder {
    /// Rules apply in list order, each at most once.
    #[default]
    Linear,
    /// Rules apply in any order, each up to the configured limit.
    Unordered,
}

/// How a stratum orders its phonological rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PhonologicalOrder {
    /// Rules apply one after another in list order.
    #[default]
    Linear,
    /// All rules see the same input. Not supported.
    Simultaneous,
}
