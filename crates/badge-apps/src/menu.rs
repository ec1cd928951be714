//! Main menu.
//!
//! Lists the name tag and the auth code, every other active installed app by
//! title, and the settings. Selecting an entry loads its app.

use badge_kernel::{
    App, AppInfo, AppRegistry, Context, Directive, Event, FnModule, Launch, Listeners, MenuEntry,
    Reply, Screen,
    error::BusError,
};

use crate::{AUTH_APP, MENU_APP, NAME_APP, SETTINGS_APP};

/// Hidden entry unlocked by the `hnzlmnn` sequence.
const GALLERY: (&str, &str) = ("Gallery", "gallery");

/// App launcher screen.
#[derive(Debug, Clone)]
pub struct MenuScreen {
    entries: Vec<MenuEntry>,
}

impl MenuScreen {
    /// Launcher over `entries`.
    pub fn new(entries: Vec<MenuEntry>) -> Self {
        Self { entries }
    }
}

impl Screen for MenuScreen {
    fn menu_entries(&self) -> Vec<MenuEntry> {
        self.entries.clone()
    }

    fn register(&mut self, listeners: &mut Listeners<'_>) -> Result<(), BusError> {
        listeners.forward("input.hnzlmnn")
    }

    fn on_menu_selection(&mut self, entry: &MenuEntry, _cx: &mut Context) -> Option<Reply> {
        Some(Directive::LoadApp(Launch::app(entry.action.clone())).into())
    }

    fn on_event(&mut self, _event: &Event, cx: &mut Context) -> Option<Reply> {
        let menu = cx.menu.as_mut()?;
        let (text, action) = GALLERY;
        menu.push(MenuEntry::new(text, action));
        Some(Directive::Reload.into())
    }
}

/// Menu entries for the apps installed in `registry`.
pub fn entries(registry: &AppRegistry) -> Vec<MenuEntry> {
    const FIXED: [&str; 4] = [MENU_APP, NAME_APP, AUTH_APP, SETTINGS_APP];
    let mut entries = vec![MenuEntry::new("Name", NAME_APP), MenuEntry::new("Auth", AUTH_APP)];
    entries.extend(
        registry
            .infos()
            .into_iter()
            .filter(|(name, info)| info.active && !FIXED.contains(&name.as_str()))
            .map(|(name, info)| MenuEntry::new(info.title, name)),
    );
    entries.push(MenuEntry::new("Settings", SETTINGS_APP));
    entries
}

/// Install the main menu, listing what `registry` holds so far.
pub fn install(registry: &mut AppRegistry) {
    let entries = entries(registry);
    let module = FnModule::new(MENU_APP, move |screen, args| {
        App::new(MENU_APP, 1, vec![Box::new(MenuScreen::new(entries.clone()))], screen, args)
    })
    .with_info(AppInfo { title: "Menu".into(), version: 1, active: false });
    registry.install(module);
}
