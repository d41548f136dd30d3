//! Toolkit-independent UI extension facade.
//!
//! # Responsibility
//! - Define how plugins contribute menu items, tabs and the primary content
//!   panel without depending on a rendering toolkit.
//! - Describe contributed content as plain data (`Content`) that renderers
//!   interpret.
//!
//! # Invariants
//! - `add_menu_item` is additive: items attached to one group keep insertion
//!   order and never replace each other.
//! - `create_tab` always creates an independent tab.
//! - `set_content` is last-writer-wins.
//! - Implementations are driven from one thread at a time; the kernel
//!   serializes access.

pub mod headless;

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use headless::HeadlessUi;

/// Opaque reference to a created menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MenuItemHandle(u64);

/// Opaque reference to a created tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TabHandle(u64);

impl MenuItemHandle {
    /// For `UiController` implementations only.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl TabHandle {
    /// For `UiController` implementations only.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl Display for MenuItemHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "menu_item#{}", self.0)
    }
}

impl Display for TabHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// Extension point registered by a plugin, tracked for diagnostics/rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "handle", rename_all = "snake_case")]
pub enum ExtensionPoint {
    MenuItem(MenuItemHandle),
    Tab(TabHandle),
    Content,
}

/// One slice of a pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub color: String,
}

/// Pie chart description; rendering is up to the toolkit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<PieSlice>,
}

/// Plain table description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Opaque content descriptor shown in tabs or the primary panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Content {
    Text { body: String },
    Placeholder { message: String },
    PieChart(PieChart),
    Table(Table),
    Stack { items: Vec<Content> },
}

impl Content {
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text { body: body.into() }
    }

    pub fn placeholder(message: impl Into<String>) -> Self {
        Self::Placeholder {
            message: message.into(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// User-visible message raised by the kernel or an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Handle lookups rejected by a facade implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiError {
    UnknownMenuItem(MenuItemHandle),
    UnknownTab(TabHandle),
    AlreadyAttached(MenuItemHandle),
}

impl Display for UiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMenuItem(handle) => write!(f, "unknown menu item: {handle}"),
            Self::UnknownTab(handle) => write!(f, "unknown tab: {handle}"),
            Self::AlreadyAttached(handle) => write!(f, "menu item already attached: {handle}"),
        }
    }
}

impl Error for UiError {}

/// Toolkit binding the kernel drives on behalf of plugins.
pub trait UiController: Send {
    /// Builds a menu entry that stays hidden until attached.
    fn create_menu_item(&mut self, label: &str, group: &str) -> MenuItemHandle;
    /// Attaches a created entry to `group`, after the group's existing items.
    fn add_menu_item(&mut self, group: &str, handle: MenuItemHandle) -> Result<(), UiError>;
    /// Detaches and forgets an entry.
    fn remove_menu_item(&mut self, handle: MenuItemHandle) -> Result<(), UiError>;
    /// Hides an attached entry again; it can be re-attached later.
    fn detach_menu_item(&mut self, handle: MenuItemHandle) -> Result<(), UiError>;
    /// Opens a new tab.
    fn create_tab(&mut self, title: &str, content: Content) -> TabHandle;
    /// Replaces the content of an open tab.
    fn update_tab(&mut self, handle: TabHandle, content: Content) -> Result<(), UiError>;
    fn close_tab(&mut self, handle: TabHandle) -> Result<(), UiError>;
    /// Replaces the primary display area's content.
    fn set_content(&mut self, content: Content);
    fn clear_content(&mut self);
    fn notify(&mut self, notification: Notification);
    /// Read-only view of everything currently contributed.
    fn snapshot(&self) -> UiSnapshot;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItemSnapshot {
    pub handle: MenuItemHandle,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuGroupSnapshot {
    pub name: String,
    pub items: Vec<MenuItemSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabSnapshot {
    pub handle: TabHandle,
    pub title: String,
    pub content: Content,
}

/// Point-in-time copy of the facade state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UiSnapshot {
    pub menus: Vec<MenuGroupSnapshot>,
    pub tabs: Vec<TabSnapshot>,
    pub content: Option<Content>,
    pub notifications: Vec<Notification>,
}

impl UiSnapshot {
    pub fn menu_group(&self, name: &str) -> Option<&MenuGroupSnapshot> {
        self.menus.iter().find(|group| group.name == name)
    }

    /// Handles attached to `group`, in attachment order.
    pub fn menu_handles(&self, group: &str) -> Vec<MenuItemHandle> {
        self.menu_group(group)
            .map(|group| group.items.iter().map(|item| item.handle).collect())
            .unwrap_or_default()
    }

    pub fn find_menu_item(&self, group: &str, label: &str) -> Option<MenuItemHandle> {
        self.menu_group(group)?
            .items
            .iter()
            .find(|item| item.label == label)
            .map(|item| item.handle)
    }

    pub fn tab(&self, handle: TabHandle) -> Option<&TabSnapshot> {
        self.tabs.iter().find(|tab| tab.handle == handle)
    }
}
