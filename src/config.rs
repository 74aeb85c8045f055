//! Resolution configuration.
//!
//! Controls the deterministic order in which pending factories are scanned
//! and how chatty the engine is about individual steps. Values can be set in
//! code or read from the environment.

use std::env;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Environment variable selecting the scan order (`registration` or `key`).
pub const SCAN_ORDER_ENV: &str = "FERROUS_SCOPE_SCAN_ORDER";

/// Environment variable enabling per-step trace events (`true`/`false`, `1`/`0`).
pub const TRACE_STEPS_ENV: &str = "FERROUS_SCOPE_TRACE_STEPS";

/// Order in which pending factories are scanned for the next solvable one.
///
/// Only the relative acquisition order of independent factories depends on
/// this; every order yields a valid topological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScanOrder {
    /// Registration order, with merged-in keys after the left operand's.
    #[default]
    Registration,
    /// Ascending [`Key`](crate::Key) order.
    KeyOrder,
}

impl ScanOrder {
    /// Parses `registration` or `key` (case-insensitive).
    pub fn parse(value: &str) -> DiResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "registration" => Ok(ScanOrder::Registration),
            "key" | "key_order" => Ok(ScanOrder::KeyOrder),
            other => Err(DiError::Configuration(format!(
                "unknown scan order `{}` (expected `registration` or `key`)",
                other
            ))),
        }
    }
}

/// Configuration attached to a provider.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Provider, ResolveConfig, ScanOrder};
///
/// let config = ResolveConfig::default().scan_order(ScanOrder::KeyOrder);
/// let provider = Provider::new().with_config(config.clone());
/// assert_eq!(provider.config(), &config);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolveConfig {
    /// Scan order for the next solvable factory
    pub scan_order: ScanOrder,
    /// Emit a trace event for every scan decision
    pub trace_steps: bool,
}

impl ResolveConfig {
    /// Sets the scan order.
    pub fn scan_order(mut self, order: ScanOrder) -> Self {
        self.scan_order = order;
        self
    }

    /// Enables or disables per-step trace events.
    pub fn trace_steps(mut self, enabled: bool) -> Self {
        self.trace_steps = enabled;
        self
    }

    /// Reads the configuration from the environment, falling back to the
    /// defaults for unset variables.
    pub fn from_env() -> DiResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup<L>(lookup: L) -> DiResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(order) = lookup(SCAN_ORDER_ENV) {
            config.scan_order = ScanOrder::parse(&order)?;
        }
        if let Some(flag) = lookup(TRACE_STEPS_ENV) {
            config.trace_steps = parse_bool(&flag)?;
        }
        Ok(config)
    }
}

fn parse_bool(value: &str) -> DiResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(DiError::Configuration(format!(
            "`{}` is not a boolean for {}",
            other, TRACE_STEPS_ENV
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ResolveConfig::from_lookup(lookup_in(&[])).unwrap();
        assert_eq!(config, ResolveConfig::default());
        assert_eq!(config.scan_order, ScanOrder::Registration);
        assert!(!config.trace_steps);
    }

    #[test]
    fn reads_both_variables() {
        let config = ResolveConfig::from_lookup(lookup_in(&[
            (SCAN_ORDER_ENV, "Key"),
            (TRACE_STEPS_ENV, "1"),
        ]))
        .unwrap();
        assert_eq!(config.scan_order, ScanOrder::KeyOrder);
        assert!(config.trace_steps);
    }

    #[test]
    fn rejects_unknown_values() {
        let err = ResolveConfig::from_lookup(lookup_in(&[(SCAN_ORDER_ENV, "random")])).unwrap_err();
        assert!(matches!(err, DiError::Configuration(m) if m.contains("random")));
        assert!(ResolveConfig::from_lookup(lookup_in(&[(TRACE_STEPS_ENV, "maybe")])).is_err());
    }
}
