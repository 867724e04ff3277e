//! Engine configuration.
//!
//! ```
//! use focss::{DestroyPolicy, EngineConfig};
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     numeric_unit = "rem"
//!     destroy_policy = "revert"
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.numeric_unit, "rem");
//! assert_eq!(config.destroy_policy, DestroyPolicy::Revert);
//! assert!(config.is_unitless("opacity"));
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What `destroy` does with styles the engine applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestroyPolicy {
    /// Leave applied inline styles in place.
    #[default]
    Retain,
    /// Clear every property the engine applied.
    Revert,
}

/// Properties that take bare numbers.
const DEFAULT_UNITLESS: &[&str] = &[
    "animation-iteration-count",
    "column-count",
    "fill-opacity",
    "flex",
    "flex-grow",
    "flex-shrink",
    "font-weight",
    "line-height",
    "opacity",
    "order",
    "orphans",
    "stroke-opacity",
    "widows",
    "z-index",
    "zoom",
];

/// Rule engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unit appended to numeric state values (default `"px"`).
    pub numeric_unit: String,
    /// Dash-case properties whose numeric values stay bare.
    pub unitless_properties: BTreeSet<String>,
    /// Behavior of `destroy`.
    pub destroy_policy: DestroyPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            numeric_unit: "px".to_string(),
            unitless_properties: DEFAULT_UNITLESS.iter().map(|p| p.to_string()).collect(),
            destroy_policy: DestroyPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| Error::config(err.to_string()))
    }

    /// Set the numeric unit.
    pub fn with_numeric_unit(mut self, unit: impl Into<String>) -> Self {
        self.numeric_unit = unit.into();
        self
    }

    /// Mark a property as unitless.
    pub fn with_unitless_property(mut self, property: impl Into<String>) -> Self {
        self.unitless_properties.insert(property.into());
        self
    }

    /// Set the destroy policy.
    pub fn with_destroy_policy(mut self, policy: DestroyPolicy) -> Self {
        self.destroy_policy = policy;
        self
    }

    /// Check whether numeric values of `property` stay bare.
    pub fn is_unitless(&self, property: &str) -> bool {
        self.unitless_properties.contains(property)
    }
}
