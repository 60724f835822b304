// ABOUTME: Engine configuration: how missing identifiers are filled in.
// ABOUTME: EngineConfig is serde-friendly so it can be loaded from a JSON file, plus a fluent builder.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// How the normalizer fills in an id when no identifier field is present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MissingIdPolicy {
    /// A fresh UUIDv4 per call. Two normalizations of the same record differ.
    #[default]
    Random,
    /// UUIDv5 of the record's canonical JSON under `namespace`; repeatable.
    Derived { namespace: Uuid },
}

/// Runtime configuration for the engine.
///
/// ```json
/// { "missing_id": { "policy": "derived", "namespace": "6ba7b812-9dad-11d1-80b4-00c04fd430c8" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub missing_id: MissingIdPolicy,
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Loads a config from JSON text and validates it.
    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a derived-id policy with the nil namespace, which would make
    /// ids collide with any other system doing the same.
    pub fn validate(&self) -> Result<(), EngineError> {
        if let MissingIdPolicy::Derived { namespace } = self.missing_id {
            if namespace.is_nil() {
                return Err(EngineError::invalid_config(
                    "missing_id.namespace must not be the nil UUID",
                ));
            }
        }
        Ok(())
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use random ids for records without one.
    pub fn random_ids(mut self) -> Self {
        self.config.missing_id = MissingIdPolicy::Random;
        self
    }

    /// Derive ids for records without one from their content.
    pub fn derived_ids(mut self, namespace: Uuid) -> Self {
        self.config.missing_id = MissingIdPolicy::Derived { namespace };
        self
    }

    pub fn build(self) -> Result<EngineConfig, EngineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_random_ids() {
        let config = EngineConfig::default();
        assert_eq!(config.missing_id, MissingIdPolicy::Random);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_derived_policy_from_json() {
        let config = EngineConfig::from_json(
            r#"{"missing_id": {"policy": "derived", "namespace": "6ba7b812-9dad-11d1-80b4-00c04fd430c8"}}"#,
        )
        .unwrap();
        assert_eq!(
            config.missing_id,
            MissingIdPolicy::Derived {
                namespace: Uuid::NAMESPACE_OID
            }
        );
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn rejects_nil_namespace() {
        let err = EngineConfig::builder().derived_ids(Uuid::nil()).build().unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}
