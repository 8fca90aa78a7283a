//! Generator configuration.
//!
//! Everything here has a default matching the stock dataset, so an empty
//! JSON object (or `GeneratorConfig::default()`) reproduces it.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::timestamps::{Interval, Precision};

/// What to do when an explicit override breaks a default-only invariant
/// (duplicate pair, third parent, second romantic partner, second
/// education or employment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverridePolicy {
    /// Proceed and record a diagnostic.
    #[default]
    Warn,
    /// Fail with `ConstraintViolation`.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeConfig {
    pub start: String,
    pub end: String,
}

impl RangeConfig {
    fn new(start: &str, end: &str) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub fn interval(&self, precision: Precision) -> Result<Interval> {
        Interval::parse(&self.start, &self.end, precision)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangesConfig {
    pub birth: RangeConfig,
    pub social_relation: RangeConfig,
    pub education: RangeConfig,
    pub employment: RangeConfig,
    /// Posts, comments, memberships, reactions and responses.
    pub content: RangeConfig,
}

impl Default for RangesConfig {
    fn default() -> Self {
        Self {
            birth: RangeConfig::new("1980-01-01", "1985-01-01"),
            social_relation: RangeConfig::new("2003-01-01", "2025-01-01"),
            education: RangeConfig::new("2003-01-01", "2008-01-01"),
            employment: RangeConfig::new("2008-01-01", "2025-01-01"),
            content: RangeConfig::new("2020-01-01T00:00:00.000", "2025-01-01T00:00:00.000"),
        }
    }
}

/// Parsed form of [`RangesConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranges {
    pub birth: Interval,
    pub social_relation: Interval,
    pub education: Interval,
    pub employment: Interval,
    pub content: Interval,
}

impl RangesConfig {
    pub fn parse(&self) -> Result<Ranges> {
        Ok(Ranges {
            birth: self.birth.interval(Precision::Date)?,
            social_relation: self.social_relation.interval(Precision::Date)?,
            education: self.education.interval(Precision::Date)?,
            employment: self.employment.interval(Precision::Date)?,
            content: self.content.interval(Precision::Millisecond)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Width of the numeric username suffix.
    pub username_suffix_digits: u32,
    /// Draws per username before giving up with `CapacityExhausted`.
    pub username_max_attempts: u32,
    pub override_policy: OverridePolicy,
    pub ranges: RangesConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            username_suffix_digits: 3,
            username_max_attempts: 10_000,
            override_policy: OverridePolicy::Warn,
            ranges: RangesConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_policy(mut self, policy: OverridePolicy) -> Self {
        self.override_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: GeneratorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert!(config.ranges.parse().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"seed": 42, "override_policy": "strict"}"#).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.override_policy, OverridePolicy::Strict);
        assert_eq!(config.username_suffix_digits, 3);
    }
}
