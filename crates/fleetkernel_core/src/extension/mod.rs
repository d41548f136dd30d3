//! Plugin contracts.
//!
//! This module defines plugin manifests, the declared contribution kinds, the
//! `Plugin` trait and the explicit discovery catalog. Wiring plugins into the
//! running host is done by `kernel::Core`.

pub mod catalog;
pub mod contribution;
pub mod manifest;
pub mod plugin;
