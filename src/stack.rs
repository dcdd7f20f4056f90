//! Build stack: the concretes currently under construction
//!
//! The top of the stack is the "current consumer", used to scope contextual
//! bindings while resolving that consumer's parameters. Stacks are
//! thread-local and keyed by container identity (the registry allocation
//! address), so concurrent resolutions on different threads or different
//! containers never see each other's frames.
//!
//! Frames are RAII guards: the pop happens on drop, so the stack stays
//! balanced on every exit path, including failed resolutions.

use crate::{ContainerError, Result};
use ahash::RandomState;
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static BUILD_STACKS: RefCell<HashMap<usize, Vec<String>, RandomState>> =
        RefCell::new(HashMap::default());
}

/// One pushed stack entry; pops itself on drop
#[derive(Debug)]
pub(crate) struct BuildFrame {
    key: usize,
}

impl BuildFrame {
    /// Push a class concrete. Fails with `CircularDependency` if the name is
    /// already on this container's stack.
    pub(crate) fn for_class(key: usize, name: &str) -> Result<Self> {
        BUILD_STACKS.with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            let stack = stacks.entry(key).or_default();
            if stack.iter().any(|entry| entry == name) {
                let mut path = stack.clone();
                path.push(name.to_string());
                return Err(ContainerError::CircularDependency { path });
            }
            stack.push(name.to_string());
            Ok(())
        })?;
        Ok(Self { key })
    }

    /// Push a function/method name. Diagnostics only, no cycle check.
    pub(crate) fn for_callable(key: usize, name: &str) -> Self {
        BUILD_STACKS.with(|stacks| {
            stacks
                .borrow_mut()
                .entry(key)
                .or_default()
                .push(name.to_string());
        });
        Self { key }
    }
}

impl Drop for BuildFrame {
    fn drop(&mut self) {
        BUILD_STACKS.with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            if let Some(stack) = stacks.get_mut(&self.key) {
                stack.pop();
                if stack.is_empty() {
                    stacks.remove(&self.key);
                }
            }
        });
    }
}

/// Top of the stack: the concrete currently asking for a dependency
pub(crate) fn consumer(key: usize) -> Option<String> {
    BUILD_STACKS.with(|stacks| {
        stacks
            .borrow()
            .get(&key)
            .and_then(|stack| stack.last().cloned())
    })
}

/// Copy of the stack for error diagnostics
pub(crate) fn snapshot(key: usize) -> Vec<String> {
    BUILD_STACKS.with(|stacks| {
        stacks.borrow().get(&key).cloned().unwrap_or_default()
    })
}
