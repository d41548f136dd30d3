//! Explicit plugin discovery list.

use crate::error::{KernelError, KernelResult};
use crate::extension::contribution::Contribution;
use crate::extension::plugin::Plugin;
use std::collections::{BTreeMap, BTreeSet};

/// Registered plugins in discovery order.
///
/// No runtime loading: hosts list their plugins explicitly, which keeps the
/// enumeration order fixed for a given build.
#[derive(Default)]
pub struct PluginCatalog {
    entries: Vec<Box<dyn Plugin>>,
    contribution_index: BTreeMap<Contribution, BTreeSet<String>>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one plugin after manifest validation.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> KernelResult<()> {
        let manifest = plugin.manifest();
        manifest.validate()?;
        let id = manifest.id.trim().to_string();
        if self.get(&id).is_some() {
            return Err(KernelError::DuplicatePlugin(id));
        }

        for contribution in manifest.declared_contributions() {
            self.contribution_index
                .entry(contribution)
                .or_default()
                .insert(id.clone());
        }
        self.entries.push(plugin);
        Ok(())
    }

    /// Builder-style `register`.
    pub fn with(mut self, plugin: Box<dyn Plugin>) -> KernelResult<Self> {
        self.register(plugin)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, plugin_id: &str) -> Option<&dyn Plugin> {
        let wanted = plugin_id.trim();
        self.entries
            .iter()
            .find(|plugin| plugin.manifest().id.trim() == wanted)
            .map(|plugin| plugin.as_ref())
    }

    /// Plugin ids in discovery order.
    pub fn ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|plugin| plugin.manifest().id.trim().to_string())
            .collect()
    }

    /// Plugins in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.entries.iter().map(|plugin| plugin.as_ref())
    }

    /// Plugins declaring `contribution`, sorted by id.
    pub fn list_by_contribution(&self, contribution: Contribution) -> Vec<&dyn Plugin> {
        let Some(ids) = self.contribution_index.get(&contribution) else {
            return vec![];
        };
        ids.iter().filter_map(|id| self.get(id)).collect()
    }
}
