//! Plugin lifecycle records kept by the core for diagnostics.

use crate::error::KernelError;
use crate::ui::ExtensionPoint;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    Uninitialized,
    Initialized,
    Failed,
}

impl PluginState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Failed => "failed",
        }
    }
}

/// Identity, lifecycle state and registered extension points of one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    pub id: String,
    pub version: String,
    pub state: PluginState,
    /// Points that survived `init`; empty for failed plugins after rollback.
    pub extension_points: Vec<ExtensionPoint>,
    pub failure: Option<String>,
}

impl PluginDescriptor {
    pub(crate) fn uninitialized(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            state: PluginState::Uninitialized,
            extension_points: Vec::new(),
            failure: None,
        }
    }
}

/// Outcome of one discovery pass.
#[derive(Debug, Default)]
pub struct InitSummary {
    /// Plugin ids that reached `initialized`, in discovery order.
    pub initialized: Vec<String>,
    /// One `KernelError::PluginInit` per failed plugin.
    pub failed: Vec<KernelError>,
    /// Disabled or already initialized plugin ids.
    pub skipped: Vec<String>,
}

impl InitSummary {
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed
            .iter()
            .filter_map(|err| match err {
                KernelError::PluginInit { plugin_id, .. } => Some(plugin_id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Host choices applied during discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryOptions {
    disabled: BTreeSet<String>,
}

impl DiscoveryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaves `plugin_id` in the `uninitialized` state.
    pub fn disable(mut self, plugin_id: impl Into<String>) -> Self {
        self.disabled.insert(plugin_id.into().trim().to_string());
        self
    }

    pub fn is_disabled(&self, plugin_id: &str) -> bool {
        self.disabled.contains(plugin_id.trim())
    }
}

impl<S: Into<String>> FromIterator<S> for DiscoveryOptions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |options, id| options.disable(id))
    }
}

#[cfg(test)]
mod tests {
    use super::{DiscoveryOptions, InitSummary, PluginDescriptor, PluginState};
    use crate::error::KernelError;

    #[test]
    fn descriptor_serializes_state_in_snake_case() {
        let descriptor = PluginDescriptor::uninitialized("builtin.test", "0.1.0");
        let value = serde_json::to_value(&descriptor).expect("serialize descriptor");
        assert_eq!(value["state"], "uninitialized");
        assert_eq!(value["failure"], serde_json::Value::Null);
        assert_eq!(PluginState::Failed.as_str(), "failed");
    }

    #[test]
    fn discovery_options_trim_ids() {
        let options: DiscoveryOptions = [" builtin.a ", "builtin.b"].into_iter().collect();
        assert!(options.is_disabled("builtin.a"));
        assert!(options.is_disabled("builtin.b "));
        assert!(!options.is_disabled("builtin.c"));
    }

    #[test]
    fn failed_ids_lists_plugin_init_errors() {
        let summary = InitSummary {
            initialized: vec!["b".to_string()],
            failed: vec![KernelError::PluginInit {
                plugin_id: "a".to_string(),
                reason: "init returned false".to_string(),
            }],
            skipped: vec![],
        };
        assert_eq!(summary.failed_ids(), vec!["a"]);
    }
}
