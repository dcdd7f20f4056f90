//! Binding registry storage
//!
//! Owns the registry maps: binding/raw-value entries (with the per-key
//! resolved state), name aliases, and the set of known names. Uses `DashMap`
//! with `ahash` for lock-free concurrent access.
//!
//! Every accessor clones data out before returning so that no shard guard is
//! ever held while the resolution engine recurses back into the registry.

use crate::binding::{BindTarget, Svc};
use crate::{ContainerError, Result};
use ahash::RandomState;
use dashmap::{DashMap, DashSet};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Strip leading name separators so `::app::Logger` and `app::Logger` key
/// the same entry.
#[inline]
pub(crate) fn normalize(name: &str) -> String {
    name.trim().trim_start_matches("::").to_string()
}

/// What a registry key holds
pub(crate) enum Slot {
    /// A registered binding; `instance` caches the built object for shared
    /// bindings, set once on first successful resolve
    Binding {
        target: BindTarget,
        shared: bool,
        instance: OnceCell<Svc>,
    },
    /// A raw value returned without construction
    Value(Svc),
}

/// Registry entry: the slot plus its one-way resolution state.
///
/// `resolved` transitions Unresolved -> Resolved exactly once; a Resolved
/// entry rejects any further slot replacement.
struct Entry {
    slot: Option<Slot>,
    resolved: AtomicBool,
}

impl Entry {
    fn new(slot: Slot) -> Self {
        Self {
            slot: Some(slot),
            resolved: AtomicBool::new(false),
        }
    }
}

/// Snapshot of one registry entry for introspection and export
#[derive(Clone, Debug)]
pub struct BindingInfo {
    pub name: String,
    pub kind: &'static str,
    pub shared: bool,
    pub resolved: bool,
}

pub(crate) struct Registry {
    entries: DashMap<String, Entry, RandomState>,
    aliases: DashMap<String, String, RandomState>,
    known: DashSet<String, RandomState>,
}

impl Registry {
    /// Create an empty registry.
    ///
    /// 8 shards balances creation speed against concurrency for the typical
    /// container with a few dozen bindings.
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
            aliases: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                8,
            ),
            known: DashSet::with_hasher(RandomState::new()),
        }
    }

    /// Store a binding, dropping any stale alias for the name.
    ///
    /// The previous slot (and any cached singleton in it) is replaced
    /// wholesale. Fails once the key is Resolved.
    pub(crate) fn insert_binding(
        &self,
        name: &str,
        target: BindTarget,
        shared: bool,
    ) -> Result<()> {
        self.insert_slot(
            name,
            Slot::Binding {
                target,
                shared,
                instance: OnceCell::new(),
            },
        )?;
        self.aliases.remove(name);
        self.known.insert(name.to_string());
        Ok(())
    }

    /// Store a raw value. Short-circuit path: no binding object, and any
    /// existing alias for the name is left untouched.
    pub(crate) fn insert_value(&self, name: &str, value: Svc) -> Result<()> {
        self.insert_slot(name, Slot::Value(value))?;
        self.known.insert(name.to_string());
        Ok(())
    }

    fn insert_slot(&self, name: &str, slot: Slot) -> Result<()> {
        use dashmap::mapref::entry::Entry as MapEntry;

        match self.entries.entry(name.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().resolved.load(Ordering::Acquire) {
                    return Err(ContainerError::AlreadyResolved(name.to_string()));
                }
                occupied.get_mut().slot = Some(slot);
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry::new(slot));
            }
        }
        Ok(())
    }

    /// Record `alias -> target`; both names become known.
    pub(crate) fn insert_alias(&self, alias: &str, target: &str) {
        self.known.insert(alias.to_string());
        self.known.insert(target.to_string());
        self.aliases.insert(alias.to_string(), target.to_string());
    }

    /// Chase the alias chain to its terminal name.
    ///
    /// Each map entry is a single hop; chains are followed transitively. A
    /// chain that revisits a name can never terminate and is rejected.
    pub(crate) fn resolve_alias(&self, name: &str) -> Result<String> {
        let mut current = name.to_string();
        let mut seen: Vec<String> = Vec::new();

        while let Some(next) = self.aliases.get(&current).map(|r| r.value().clone()) {
            if next == current || seen.contains(&next) {
                return Err(ContainerError::AliasLoop(name.to_string()));
            }
            seen.push(std::mem::replace(&mut current, next));
        }
        Ok(current)
    }

    /// True if the name has a binding, a raw value, a cached instance, or
    /// is an alias.
    pub(crate) fn bound(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
            || self
                .entries
                .get(name)
                .is_some_and(|e| e.slot.is_some())
    }

    /// Shared binding registered, or an instance already cached
    pub(crate) fn is_singleton(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|e| match &e.slot {
            Some(Slot::Binding {
                shared, instance, ..
            }) => *shared || instance.get().is_some(),
            _ => false,
        })
    }

    pub(crate) fn is_known(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// Cached singleton instance or raw value, if any
    pub(crate) fn cached(&self, name: &str) -> Option<Svc> {
        self.entries.get(name).and_then(|e| match &e.slot {
            Some(Slot::Binding { instance, .. }) => instance.get().cloned(),
            Some(Slot::Value(v)) => Some(v.clone()),
            None => None,
        })
    }

    /// The registered target of a binding, if the key holds one
    pub(crate) fn binding_target(&self, name: &str) -> Option<BindTarget> {
        self.entries.get(name).and_then(|e| match &e.slot {
            Some(Slot::Binding { target, .. }) => Some(target.clone()),
            _ => None,
        })
    }

    /// The registered target of a binding together with its shared flag
    pub(crate) fn binding(&self, name: &str) -> Option<(BindTarget, bool)> {
        self.entries.get(name).and_then(|e| match &e.slot {
            Some(Slot::Binding { target, shared, .. }) => {
                Some((target.clone(), *shared))
            }
            _ => None,
        })
    }

    /// Raw registered target for introspection: binding target, or the raw
    /// value re-wrapped as a `Value` target
    pub(crate) fn raw(&self, name: &str) -> Option<BindTarget> {
        self.entries.get(name).and_then(|e| match &e.slot {
            Some(Slot::Binding { target, .. }) => Some(target.clone()),
            Some(Slot::Value(v)) => Some(BindTarget::Value(v.clone())),
            None => None,
        })
    }

    /// Cache a built instance under a shared binding. First write wins;
    /// later calls are no-ops.
    pub(crate) fn cache_if_shared(&self, name: &str, value: &Svc) {
        if let Some(e) = self.entries.get(name) {
            if let Some(Slot::Binding {
                shared: true,
                instance,
                ..
            }) = &e.slot
            {
                let _ = instance.set(value.clone());
            }
        }
    }

    /// One-way transition to Resolved. Upserts a slot-less entry when the
    /// name was resolved without a local binding so the state stays on the
    /// key itself.
    pub(crate) fn mark_resolved(&self, name: &str) {
        use dashmap::mapref::entry::Entry as MapEntry;

        match self.entries.entry(name.to_string()) {
            MapEntry::Occupied(occupied) => {
                occupied.get().resolved.store(true, Ordering::Release);
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry {
                    slot: None,
                    resolved: AtomicBool::new(true),
                });
            }
        }
    }

    pub(crate) fn is_resolved(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|e| e.resolved.load(Ordering::Acquire))
    }

    /// Snapshot of all binding entries, sorted by name for determinism
    pub(crate) fn bindings_snapshot(&self) -> Vec<BindingInfo> {
        let mut out: Vec<BindingInfo> = self
            .entries
            .iter()
            .filter_map(|e| {
                let kind = match &e.slot {
                    Some(Slot::Binding { target, .. }) => target.kind(),
                    Some(Slot::Value(_)) => "value",
                    None => return None,
                };
                let shared = matches!(&e.slot, Some(Slot::Binding { shared: true, .. }));
                Some(BindingInfo {
                    name: e.key().clone(),
                    kind,
                    shared,
                    resolved: e.resolved.load(Ordering::Acquire),
                })
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Snapshot of the alias map, sorted by alias
    pub(crate) fn aliases_snapshot(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .aliases
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        out.sort();
        out
    }

    /// Binding targets with shared flags, for export
    pub(crate) fn bindings_with_targets(&self) -> Vec<(String, BindTarget, bool)> {
        let mut out: Vec<(String, BindTarget, bool)> = self
            .entries
            .iter()
            .filter_map(|e| match &e.slot {
                Some(Slot::Binding { target, shared, .. }) => {
                    Some((e.key().clone(), target.clone(), *shared))
                }
                _ => None,
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Number of keys holding a binding or raw value
    pub(crate) fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.slot.is_some())
            .count()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.len())
            .field("aliases", &self.aliases.len())
            .finish()
    }
}
