//! In-memory `UiController` used by the CLI host and tests.

use super::{
    Content, MenuGroupSnapshot, MenuItemHandle, MenuItemSnapshot, Notification, TabHandle,
    TabSnapshot, UiController, UiError, UiSnapshot,
};
use std::collections::BTreeMap;

#[derive(Debug)]
struct MenuEntry {
    label: String,
    attached_to: Option<String>,
}

#[derive(Debug)]
struct MenuGroup {
    name: String,
    items: Vec<MenuItemHandle>,
}

#[derive(Debug)]
struct TabEntry {
    handle: TabHandle,
    title: String,
    content: Content,
}

/// Facade implementation that keeps all contributions as plain data.
#[derive(Debug, Default)]
pub struct HeadlessUi {
    next_handle: u64,
    entries: BTreeMap<MenuItemHandle, MenuEntry>,
    groups: Vec<MenuGroup>,
    tabs: Vec<TabEntry>,
    content: Option<Content>,
    notifications: Vec<Notification>,
}

impl HeadlessUi {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_raw_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn drop_from_group(&mut self, group_name: &str, handle: MenuItemHandle) {
        for group in self.groups.iter_mut().filter(|g| g.name == group_name) {
            group.items.retain(|item| *item != handle);
        }
        self.groups.retain(|group| !group.items.is_empty());
    }

    fn tab_mut(&mut self, handle: TabHandle) -> Result<&mut TabEntry, UiError> {
        self.tabs
            .iter_mut()
            .find(|tab| tab.handle == handle)
            .ok_or(UiError::UnknownTab(handle))
    }
}

impl UiController for HeadlessUi {
    fn create_menu_item(&mut self, label: &str, _group: &str) -> MenuItemHandle {
        let handle = MenuItemHandle::from_raw(self.next_raw_handle());
        self.entries.insert(
            handle,
            MenuEntry {
                label: label.to_string(),
                attached_to: None,
            },
        );
        handle
    }

    fn add_menu_item(&mut self, group: &str, handle: MenuItemHandle) -> Result<(), UiError> {
        let entry = self
            .entries
            .get_mut(&handle)
            .ok_or(UiError::UnknownMenuItem(handle))?;
        if entry.attached_to.is_some() {
            return Err(UiError::AlreadyAttached(handle));
        }
        entry.attached_to = Some(group.to_string());

        match self.groups.iter_mut().find(|existing| existing.name == group) {
            Some(existing) => existing.items.push(handle),
            None => self.groups.push(MenuGroup {
                name: group.to_string(),
                items: vec![handle],
            }),
        }
        Ok(())
    }

    fn remove_menu_item(&mut self, handle: MenuItemHandle) -> Result<(), UiError> {
        let entry = self
            .entries
            .remove(&handle)
            .ok_or(UiError::UnknownMenuItem(handle))?;
        if let Some(group_name) = entry.attached_to {
            self.drop_from_group(&group_name, handle);
        }
        Ok(())
    }

    fn detach_menu_item(&mut self, handle: MenuItemHandle) -> Result<(), UiError> {
        let entry = self
            .entries
            .get_mut(&handle)
            .ok_or(UiError::UnknownMenuItem(handle))?;
        if let Some(group_name) = entry.attached_to.take() {
            self.drop_from_group(&group_name, handle);
        }
        Ok(())
    }

    fn create_tab(&mut self, title: &str, content: Content) -> TabHandle {
        let handle = TabHandle::from_raw(self.next_raw_handle());
        self.tabs.push(TabEntry {
            handle,
            title: title.to_string(),
            content,
        });
        handle
    }

    fn update_tab(&mut self, handle: TabHandle, content: Content) -> Result<(), UiError> {
        self.tab_mut(handle)?.content = content;
        Ok(())
    }

    fn close_tab(&mut self, handle: TabHandle) -> Result<(), UiError> {
        let before = self.tabs.len();
        self.tabs.retain(|tab| tab.handle != handle);
        if self.tabs.len() == before {
            return Err(UiError::UnknownTab(handle));
        }
        Ok(())
    }

    fn set_content(&mut self, content: Content) {
        self.content = Some(content);
    }

    fn clear_content(&mut self) {
        self.content = None;
    }

    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    fn snapshot(&self) -> UiSnapshot {
        let menus = self
            .groups
            .iter()
            .map(|group| MenuGroupSnapshot {
                name: group.name.clone(),
                items: group
                    .items
                    .iter()
                    .filter_map(|handle| {
                        self.entries.get(handle).map(|entry| MenuItemSnapshot {
                            handle: *handle,
                            label: entry.label.clone(),
                        })
                    })
                    .collect(),
            })
            .collect();

        UiSnapshot {
            menus,
            tabs: self
                .tabs
                .iter()
                .map(|tab| TabSnapshot {
                    handle: tab.handle,
                    title: tab.title.clone(),
                    content: tab.content.clone(),
                })
                .collect(),
            content: self.content.clone(),
            notifications: self.notifications.clone(),
        }
    }
}
