//! Apps: ordered screens plus the screen-switching loop.
//!
//! [`App::run`] activates screens one after another, interpreting the
//! directive each session ends with. `LoadScreen` stays inside the app; every
//! other directive is handed to the kernel. Malformed replies never escape as
//! errors, they fall back to loading the default app.

use crate::{
    context::{Bus, Context, Stage},
    directive::{Directive, LaunchArgs, Reply},
    error::{AppError, KernelError},
    screen::{self, Screen},
};

/// Why an app is being exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The kernel is switching apps.
    System,
    /// The app requested its own exit.
    App,
    /// The user backed out.
    User,
}

struct Slot {
    screen: Box<dyn Screen>,
    selected: Option<usize>,
}

/// A running app.
pub struct App {
    name: String,
    version: u32,
    slots: Vec<Slot>,
    initial: usize,
    current: Option<usize>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("screens", &self.slots.len())
            .field("initial", &self.initial)
            .field("current", &self.current)
            .finish()
    }
}

impl App {
    /// Construct an app.
    ///
    /// An out-of-range `initial_screen` falls back to screen 0. The initial
    /// screen's [`Screen::init`] receives `args`, and `args.selected_index`
    /// pre-selects its menu entry.
    ///
    /// # Errors
    ///
    /// - `AppError::InvalidVersion` if `version` is 0
    pub fn new(
        name: impl Into<String>,
        version: u32,
        screens: Vec<Box<dyn Screen>>,
        initial_screen: usize,
        args: &LaunchArgs,
    ) -> Result<Self, AppError> {
        let name = name.into();
        if version < 1 {
            return Err(AppError::InvalidVersion { app: name, version });
        }

        let mut slots: Vec<Slot> =
            screens.into_iter().map(|screen| Slot { screen, selected: None }).collect();

        let initial = if initial_screen < slots.len() {
            initial_screen
        } else {
            if initial_screen != 0 {
                tracing::warn!(app = %name, screen = initial_screen, "initial screen out of range");
            }
            0
        };
        if let Some(slot) = slots.get_mut(initial) {
            slot.selected = args.selected_index;
            slot.screen.init(args);
        }

        Ok(Self { name, version, slots, initial, current: None })
    }

    /// App name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared version (at least 1).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of screens.
    pub fn screen_count(&self) -> usize {
        self.slots.len()
    }

    /// Index of the active screen.
    pub fn current_screen(&self) -> Option<usize> {
        self.current
    }

    /// Active screen.
    pub fn screen_mut(&mut self) -> Option<&mut (dyn Screen + 'static)> {
        let index = self.current?;
        self.slots.get_mut(index).map(|slot| slot.screen.as_mut())
    }

    /// Consume the active screen's pending menu pre-selection.
    pub(crate) fn take_selection(&mut self) -> Option<usize> {
        let index = self.current?;
        self.slots.get_mut(index)?.selected.take()
    }

    /// Exit hook.
    ///
    /// Returns the directive the kernel should follow, if any: exits caused
    /// by the system or the app itself need nothing further, anything else
    /// goes back to the default app.
    pub fn exit(&mut self, reason: ExitReason, cx: &mut Context) -> Option<Directive> {
        if let Some(screen) = self.screen_mut() {
            screen.exit(cx);
        }
        match reason {
            ExitReason::System | ExitReason::App => None,
            ExitReason::User => Some(Directive::home()),
        }
    }

    /// Run the app on `stage` until it asks for something only the kernel
    /// can do.
    ///
    /// Returns `Exit`, `LoadApp` or `Reboot`; `LoadScreen` and `Reload` are
    /// handled here.
    ///
    /// # Errors
    ///
    /// - `AppError::NoScreensDefined` if the app has no screens
    /// - `AppError::InvalidScreenIndex` on `LoadScreen` out of range
    /// - `KernelError::Interrupted` if the host interrupts a wait
    pub fn run(bus: &mut Bus, stage: &mut Stage) -> Result<Directive, KernelError> {
        let Some(app) = stage.app.as_ref() else {
            return Ok(Directive::Exit);
        };
        if app.slots.is_empty() {
            return Err(AppError::NoScreensDefined { app: app.name.clone() }.into());
        }

        let mut index = app.initial;
        loop {
            Self::load(bus, stage, index)?;
            tracing::debug!(screen = index, "activating screen");

            let mut reply = screen::activate(bus, stage)?;
            if reply.is_none() {
                reply = stage.wait(bus)?;
            }

            let mut directive = settle(reply);
            while directive == Directive::Reload {
                let again = match screen::render(stage) {
                    Some(reply) => Some(reply),
                    None => {
                        bus.reset_result();
                        stage.wait(bus)?
                    },
                };
                directive = settle(again);
            }

            match directive {
                Directive::LoadScreen(next) => index = next,
                other => return Ok(other),
            }
        }
    }

    fn load(bus: &mut Bus, stage: &mut Stage, index: usize) -> Result<(), KernelError> {
        let Stage { cx, app } = stage;
        let Some(app) = app.as_mut() else {
            return Ok(());
        };

        let count = app.slots.len();
        if index >= count {
            return Err(AppError::InvalidScreenIndex { index, count }.into());
        }

        cx.display.reset();
        bus.clear();
        cx.lights.off_all();
        cx.menu = None;
        app.current = Some(index);
        Ok(())
    }
}

/// Turn a session result into a directive. No result and malformed results
/// both mean "go to the default app".
fn settle(reply: Option<Reply>) -> Directive {
    match reply.map(Reply::into_directive) {
        None => Directive::home(),
        Some(Ok(directive)) => directive,
        Some(Err(error)) => {
            tracing::warn!(%error, "malformed directive, loading default app");
            Directive::home()
        },
    }
}
