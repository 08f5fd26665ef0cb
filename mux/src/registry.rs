//! The command registry.
//!
//! A sorted map from canonical name to command object, filled once while
//! the binary wires itself up and never mutated during evaluation. Lookup
//! is exact; prefix resolution happens in the dispatcher's argv
//! normalization, which consults [`Registry::names`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::command::Command;

#[derive(Default)]
pub struct Registry {
    by_name: BTreeMap<String, Arc<dyn Command>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one command under its canonical name. A later registration
    /// with the same name replaces the earlier one.
    pub fn register(&mut self, cmd: Arc<dyn Command>) {
        self.by_name.insert(cmd.name().to_string(), cmd);
    }

    /// Add a batch of commands.
    pub fn register_all(&mut self, cmds: impl IntoIterator<Item = Arc<dyn Command>>) {
        for cmd in cmds {
            self.register(cmd);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Canonical names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Command>)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
