//! Plugin contract.

use crate::error::KernelResult;
use crate::extension::manifest::PluginManifest;
use crate::kernel::Core;

/// Independently loadable feature unit.
///
/// `init` runs once per discovery, after the core is bootstrapped. It obtains
/// the facade with `core.ui_controller()`, registers extension points and binds
/// actions with `core.bind_action(..)`.
///
/// Returning `Ok(false)`, returning an error, or panicking marks the plugin as
/// failed; discovery continues with the next plugin either way.
pub trait Plugin: Send + Sync {
    fn manifest(&self) -> &PluginManifest;
    fn init(&self, core: &Core) -> KernelResult<bool>;
}
