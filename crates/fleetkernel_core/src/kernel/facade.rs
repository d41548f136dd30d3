//! Plugin-facing view of the bound `UiController`.
//!
//! Every call takes the UI lock for its own duration only, so concurrent
//! callers are serialized per operation. While a plugin is inside `init`, calls
//! from the discovery thread are checked against its manifest and recorded for
//! rollback.

use crate::error::KernelResult;
use crate::extension::contribution::Contribution;
use crate::kernel::{lock, Core};
use crate::model::validation::{require_text, ValidationError};
use crate::ui::{
    Content, ExtensionPoint, MenuItemHandle, Notification, TabHandle, UiController, UiSnapshot,
};
use std::sync::Mutex;

/// Handle returned by `Core::ui_controller`.
pub struct UiFacade<'core> {
    core: &'core Core,
    ui: &'core Mutex<Box<dyn UiController>>,
}

impl<'core> UiFacade<'core> {
    pub(crate) fn new(core: &'core Core, ui: &'core Mutex<Box<dyn UiController>>) -> Self {
        Self { core, ui }
    }

    /// Builds a menu entry; it stays hidden until `add_menu_item`.
    pub fn create_menu_item(&self, label: &str, group: &str) -> KernelResult<MenuItemHandle> {
        self.core.check_contribution(Contribution::MenuItem)?;
        require_text("label", label)?;
        require_text("group", group)?;
        let handle = lock(self.ui).create_menu_item(label, group);
        self.core.record_point(ExtensionPoint::MenuItem(handle));
        Ok(handle)
    }

    /// Attaches `handle` to `group` after the items already there.
    pub fn add_menu_item(&self, group: &str, handle: MenuItemHandle) -> KernelResult<()> {
        self.core.check_contribution(Contribution::MenuItem)?;
        require_text("group", group)?;
        lock(self.ui).add_menu_item(group, handle)?;
        self.core.record_attach(handle);
        Ok(())
    }

    /// `create_menu_item` followed by `add_menu_item` on the same group.
    pub fn add_menu_entry(&self, group: &str, label: &str) -> KernelResult<MenuItemHandle> {
        let handle = self.create_menu_item(label, group)?;
        self.add_menu_item(group, handle)?;
        Ok(handle)
    }

    /// Opens an independent tab.
    pub fn create_tab(&self, title: &str, content: Content) -> KernelResult<TabHandle> {
        self.core.check_contribution(Contribution::Tab)?;
        require_text("title", title)?;
        let handle = lock(self.ui).create_tab(title, content);
        self.core.record_point(ExtensionPoint::Tab(handle));
        Ok(handle)
    }

    pub fn update_tab(&self, handle: TabHandle, content: Content) -> KernelResult<()> {
        self.core.check_contribution(Contribution::Tab)?;
        lock(self.ui).update_tab(handle, content)?;
        Ok(())
    }

    /// Closes a tab and cancels jobs still bound to it.
    pub fn close_tab(&self, handle: TabHandle) -> KernelResult<()> {
        self.core.close_tab(handle)
    }

    /// Replaces the primary content panel. Last writer wins.
    pub fn set_content(&self, content: Content) -> KernelResult<()> {
        self.core.check_contribution(Contribution::Content)?;
        if self.core.in_init_scope() {
            let previous = lock(self.ui).snapshot().content;
            self.core.record_content(previous);
        }
        lock(self.ui).set_content(content);
        Ok(())
    }

    pub fn notify(&self, notification: Notification) -> KernelResult<()> {
        if notification.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title").into());
        }
        lock(self.ui).notify(notification);
        Ok(())
    }

    pub fn snapshot(&self) -> UiSnapshot {
        lock(self.ui).snapshot()
    }
}
