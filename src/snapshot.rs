//! Container state export and import
//!
//! A [`ContainerState`] captures the registered bindings and aliases in a
//! serializable form. Factory closures and raw values cannot cross a
//! serialization boundary; factory bindings are exported as named slots that
//! the importer re-attaches from a name-to-closure map, and raw values plus
//! cached instances are skipped entirely. An imported container always
//! starts with an empty instance cache.

use crate::binding::{BindTarget, FactoryFn};
use crate::{Container, ContainerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Serializable target of one exported binding
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConcreteState {
    /// Names another service
    Name(String),
    /// A factory slot; the closure must be re-supplied on import
    Factory,
}

/// One exported binding
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BindingState {
    pub concrete: ConcreteState,
    pub shared: bool,
}

/// Serializable snapshot of a container's registrations.
///
/// `BTreeMap` keeps the serialized form stable across exports of the same
/// container.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerState {
    pub bindings: BTreeMap<String, BindingState>,
    pub aliases: BTreeMap<String, String>,
}

impl Container {
    /// Export the registered bindings and aliases.
    ///
    /// Raw-value slots are skipped; values do not survive serialization.
    pub fn export_state(&self) -> ContainerState {
        let mut bindings = BTreeMap::new();
        for (name, target, shared) in self.registry().bindings_with_targets() {
            let concrete = match target {
                BindTarget::Name(concrete) => ConcreteState::Name(concrete),
                BindTarget::Factory(_) => ConcreteState::Factory,
                BindTarget::Value(_) => continue,
            };
            bindings.insert(name, BindingState { concrete, shared });
        }

        let aliases = self.registry().aliases_snapshot().into_iter().collect();
        ContainerState { bindings, aliases }
    }

    /// Rebuild a container from an exported state.
    ///
    /// `factories` re-attaches closures to factory slots by binding name.
    /// Fails with `MissingFactory` when the state has a factory slot the map
    /// does not cover.
    pub fn from_state(
        state: &ContainerState,
        factories: HashMap<String, FactoryFn>,
    ) -> Result<Container> {
        let container = Container::new();

        for (alias, target) in &state.aliases {
            container.alias(alias, target);
        }
        for (name, binding) in &state.bindings {
            let target = match &binding.concrete {
                ConcreteState::Name(concrete) => BindTarget::Name(concrete.clone()),
                ConcreteState::Factory => {
                    let factory = factories
                        .get(name)
                        .ok_or_else(|| ContainerError::MissingFactory(name.clone()))?;
                    BindTarget::Factory(factory.clone())
                }
            };
            if binding.shared {
                container.singleton(name.as_str(), target)?;
            } else {
                container.bind(name.as_str(), target)?;
            }
        }

        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::svc;
    use std::sync::Arc;

    fn sample_container() -> Container {
        let container = Container::new();
        container.bind("Logger", "FileLogger").unwrap();
        container
            .singleton("clock", BindTarget::factory(|_, _| Ok(svc(0u64))))
            .unwrap();
        container.bind_value("retries", 3u32).unwrap();
        container.alias("log", "Logger");
        container
    }

    #[test]
    fn test_export_skips_values_and_tags_factories() {
        let state = sample_container().export_state();

        assert!(!state.bindings.contains_key("retries"));
        assert_eq!(
            state.bindings["Logger"],
            BindingState {
                concrete: ConcreteState::Name("FileLogger".into()),
                shared: false,
            }
        );
        assert_eq!(
            state.bindings["clock"],
            BindingState {
                concrete: ConcreteState::Factory,
                shared: true,
            }
        );
        assert_eq!(state.aliases["log"], "Logger");
    }

    #[test]
    fn test_json_round_trip() {
        let state = sample_container().export_state();
        let json = serde_json::to_string(&state).unwrap();
        let back: ContainerState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_import_reattaches_factories() {
        let state = sample_container().export_state();

        let mut factories: HashMap<String, FactoryFn> = HashMap::new();
        factories.insert(
            "clock".into(),
            Arc::new(|_: &Container, _: &crate::Params| Ok(svc(99u64))),
        );

        let imported = Container::from_state(&state, factories).unwrap();
        assert!(imported.bound("Logger"));
        assert!(imported.is_singleton("clock"));
        assert_eq!(*imported.make_as::<u64>("clock").unwrap(), 99);
        // Aliases survive the round trip
        assert!(imported.bound("log"));
    }

    #[test]
    fn test_import_missing_factory_fails() {
        let state = sample_container().export_state();
        let err = Container::from_state(&state, HashMap::new()).unwrap_err();
        assert!(matches!(err, ContainerError::MissingFactory(n) if n == "clock"));
    }

    #[test]
    fn test_import_starts_with_empty_cache() {
        let source = sample_container();
        let _ = source.make("clock");
        let state = source.export_state();

        let mut factories: HashMap<String, FactoryFn> = HashMap::new();
        factories.insert(
            "clock".into(),
            Arc::new(|_: &Container, _: &crate::Params| Ok(svc(1u64))),
        );
        let imported = Container::from_state(&state, factories).unwrap();
        assert!(!imported.is_resolved("clock"));
    }
}
