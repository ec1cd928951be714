//! Installed app modules.
//!
//! An [`AppModule`] is the loadable unit behind an app name. Loading happens
//! in two phases, mirroring how the badge swaps apps: [`AppModule::load`]
//! brings the module in (a failure here keeps the previous app running) and
//! [`AppModule::build`] constructs a fresh [`App`] (a failure here leaves no
//! app active).

use std::collections::BTreeMap;

use crate::{
    app::App,
    directive::LaunchArgs,
    error::AppError,
};

/// Menu metadata for an installed app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    /// Title shown in menus
    pub title: String,
    /// Declared version
    pub version: u32,
    /// Whether the app should be offered to the user
    pub active: bool,
}

/// Loadable app module.
pub trait AppModule {
    /// Registry name.
    fn name(&self) -> &str;

    /// Menu metadata. Defaults to the capitalized name, version 1, active.
    fn info(&self) -> AppInfo {
        AppInfo { title: capitalize(self.name()), version: 1, active: true }
    }

    /// Bring the module in before construction.
    fn load(&self) -> Result<(), AppError> {
        Ok(())
    }

    /// Construct a fresh app starting at `screen`.
    fn build(&self, screen: usize, args: &LaunchArgs) -> Result<App, AppError>;
}

type BuildFn = dyn Fn(usize, &LaunchArgs) -> Result<App, AppError>;

/// [`AppModule`] backed by a closure.
pub struct FnModule {
    name: String,
    info: Option<AppInfo>,
    build: Box<BuildFn>,
}

impl FnModule {
    /// Module named `name` built by `build`.
    pub fn new<F>(name: impl Into<String>, build: F) -> Self
    where
        F: Fn(usize, &LaunchArgs) -> Result<App, AppError> + 'static,
    {
        Self { name: name.into(), info: None, build: Box::new(build) }
    }

    /// Override the menu metadata.
    #[must_use]
    pub fn with_info(mut self, info: AppInfo) -> Self {
        self.info = Some(info);
        self
    }
}

impl AppModule for FnModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn info(&self) -> AppInfo {
        self.info.clone().unwrap_or_else(|| AppInfo {
            title: capitalize(&self.name),
            version: 1,
            active: true,
        })
    }

    fn build(&self, screen: usize, args: &LaunchArgs) -> Result<App, AppError> {
        (self.build)(screen, args)
    }
}

/// Name-ordered set of installed modules.
#[derive(Default)]
pub struct AppRegistry {
    modules: BTreeMap<String, Box<dyn AppModule>>,
}

impl AppRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a module, replacing any module of the same name.
    pub fn install(&mut self, module: impl AppModule + 'static) {
        self.modules.insert(module.name().to_owned(), Box::new(module));
    }

    /// Module by name.
    ///
    /// # Errors
    ///
    /// - `AppError::NotFound` if nothing is installed under `name`
    pub fn get(&self, name: &str) -> Result<&dyn AppModule, AppError> {
        self.modules
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| AppError::NotFound { app: name.to_owned() })
    }

    /// Whether `name` is installed.
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Installed names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Menu metadata of every installed module, by name.
    pub fn infos(&self) -> Vec<(String, AppInfo)> {
        self.modules.iter().map(|(name, module)| (name.clone(), module.info())).collect()
    }
}

/// `"settings"` → `"Settings"`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing(name: &'static str) -> FnModule {
        FnModule::new(name, move |_, _| {
            Err(AppError::Construction { app: name.into(), reason: "boom".into() })
        })
    }

    #[test]
    fn lookup_and_ordering() {
        let mut registry = AppRegistry::new();
        registry.install(failing("settings"));
        registry.install(failing("main"));

        assert_eq!(registry.names().collect::<Vec<_>>(), ["main", "settings"]);
        assert!(registry.get("main").is_ok());
        assert_eq!(
            registry.get("missing").err(),
            Some(AppError::NotFound { app: "missing".into() })
        );
    }

    #[test]
    fn default_info_capitalizes() {
        let module = failing("settings");
        assert_eq!(module.info(), AppInfo { title: "Settings".into(), version: 1, active: true });
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn info_override() {
        let info = AppInfo { title: "Badge".into(), version: 3, active: false };
        let module = failing("name").with_info(info.clone());
        assert_eq!(module.info(), info);
    }
}
