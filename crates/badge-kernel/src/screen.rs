//! Screens and the screen activation runner.
//!
//! A [`Screen`] is one view of an app. Screens never block and never touch
//! the bus directly: they implement hooks that the runner wires to bus
//! listeners, and they return [`Reply`]s to request control flow.
//!
//! # Activation
//!
//! 1. Register the infrastructure listeners: the `input.char` relay into the
//!    decoder's text buffer and the back keys (console B and START). Then mark
//!    the bus baseline.
//! 2. Let the screen register its own listeners ([`Screen::register`]).
//! 3. Continuous screens loop `update(delta)` then `render()` each frame
//!    until either produces a result, without suspending.
//! 4. Discrete screens get key-up/key-down/text listeners, build their menu
//!    (activating a pre-selected entry immediately), render once and return
//!    so the app can block on the bus.

use crate::{
    context::{Bus, Context, Stage},
    directive::{Directive, LaunchArgs, Reply},
    error::{BusError, KernelError},
    event::Event,
    input::{KeyCode, Mode},
    menu::{Menu, MenuEntry},
};

/// How a screen is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Render once, then react to events.
    #[default]
    Discrete,
    /// Update and render every frame.
    Continuous,
}

/// Static screen options, read on every activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenOptions {
    /// Render mode
    pub mode: RenderMode,
    /// Whether the back keys call [`Screen::back`]
    pub back_enabled: bool,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self { mode: RenderMode::Discrete, back_enabled: true }
    }
}

impl ScreenOptions {
    /// Continuous rendering, back enabled.
    pub fn continuous() -> Self {
        Self { mode: RenderMode::Continuous, ..Self::default() }
    }

    /// Ignore the back keys.
    #[must_use]
    pub fn without_back(mut self) -> Self {
        self.back_enabled = false;
        self
    }
}

/// One view of an app.
///
/// Every hook has a default, so a screen only implements what it needs.
/// Hooks returning `Some(reply)` end the current screen session.
pub trait Screen {
    /// Render mode and back-key behavior.
    fn options(&self) -> ScreenOptions {
        ScreenOptions::default()
    }

    /// Menu entries. A non-empty list gives the screen a menu driven by the
    /// console UP/DOWN/A/SELECT keys.
    fn menu_entries(&self) -> Vec<MenuEntry> {
        Vec::new()
    }

    /// Called once at app construction when this is the initial screen.
    fn init(&mut self, _args: &LaunchArgs) {}

    /// Register extra listeners for this activation.
    fn register(&mut self, _listeners: &mut Listeners<'_>) -> Result<(), BusError> {
        Ok(())
    }

    /// Discrete: called once per render after the menu is drawn.
    /// Continuous: called every frame with the milliseconds since the last.
    fn update(&mut self, _cx: &mut Context, _delta_ms: u64) -> Option<Reply> {
        None
    }

    /// Continuous only: draw the frame.
    fn render(&mut self, _cx: &mut Context) {}

    /// Back key released.
    fn back(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        Some(Directive::home().into())
    }

    /// Menu entry chosen.
    fn on_menu_selection(&mut self, _entry: &MenuEntry, _cx: &mut Context) -> Option<Reply> {
        None
    }

    /// Any key released (discrete only).
    fn on_key_up(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        None
    }

    /// Any key pressed (discrete only).
    fn on_key_down(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        None
    }

    /// Text capture confirmed with a value.
    fn on_text(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        None
    }

    /// Event registered through [`Listeners::forward`].
    fn on_event(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        None
    }

    /// App is exiting while this screen is active.
    fn exit(&mut self, _cx: &mut Context) {}
}

/// Listener registrar handed to [`Screen::register`].
pub struct Listeners<'a> {
    bus: &'a mut Bus,
}

impl<'a> Listeners<'a> {
    pub(crate) fn new(bus: &'a mut Bus) -> Self {
        Self { bus }
    }

    /// Deliver events at `path` to [`Screen::on_event`].
    pub fn forward(&mut self, path: &str) -> Result<(), BusError> {
        self.bus.on(path, forward_to_screen)
    }

    /// Deliver the next event at `path` to [`Screen::on_event`].
    pub fn forward_once(&mut self, path: &str) -> Result<(), BusError> {
        self.bus.once(path, forward_to_screen)
    }

    /// Register an arbitrary listener.
    pub fn on<F>(&mut self, path: &str, callback: F) -> Result<(), BusError>
    where
        F: FnMut(&mut Stage, &Event) -> Option<Reply> + 'static,
    {
        self.bus.on(path, callback)
    }
}

/// `input.up.<name>` for a key.
pub fn key_up_path(code: KeyCode) -> String {
    format!("input.up.{code}")
}

/// Run one screen activation. See the module docs for the sequence.
pub(crate) fn activate(bus: &mut Bus, stage: &mut Stage) -> Result<Option<Reply>, KernelError> {
    bus.on("input.char", relay_char)?;
    bus.on(&key_up_path(KeyCode::BTN_B), on_back)?;
    bus.on(&key_up_path(KeyCode::BTN_START), on_back)?;
    bus.mark_baseline();

    let Some(options) = stage.with_screen(|screen, _| screen.options()) else {
        return Ok(None);
    };
    stage.with_screen(|screen, _| screen.register(&mut Listeners::new(&mut *bus))).transpose()?;

    match options.mode {
        RenderMode::Continuous => run_continuous(bus, stage),
        RenderMode::Discrete => run_discrete(bus, stage),
    }
}

/// Redraw the active screen. Returns the update hook's reply.
pub(crate) fn render(stage: &mut Stage) -> Option<Reply> {
    stage
        .with_screen(|screen, cx| match screen.options().mode {
            RenderMode::Continuous => {
                screen.render(cx);
                None
            },
            RenderMode::Discrete => {
                if let Some(menu) = &cx.menu {
                    menu.draw(cx.display.as_mut());
                }
                screen.update(cx, 0)
            },
        })
        .flatten()
}

fn run_continuous(bus: &mut Bus, stage: &mut Stage) -> Result<Option<Reply>, KernelError> {
    let mut last: Option<u64> = None;
    loop {
        stage.cx.platform.poll_interrupt()?;
        let now = stage.cx.platform.ticks_ms();
        let delta = last.map_or(0, |last| now.saturating_sub(last));

        let Some(reply) = stage.with_screen(|screen, cx| screen.update(cx, delta)) else {
            return Ok(None);
        };
        if reply.is_some() {
            return Ok(reply);
        }

        render(stage);
        stage.pump(bus);
        if let Some(reply) = bus.result() {
            return Ok(Some(reply.clone()));
        }
        last = Some(now);
    }
}

fn run_discrete(bus: &mut Bus, stage: &mut Stage) -> Result<Option<Reply>, KernelError> {
    bus.on("input.up", on_key_up)?;
    bus.on("input.down", on_key_down)?;
    bus.on("input.text", on_text)?;

    let entries = stage.with_screen(|screen, _| screen.menu_entries()).unwrap_or_default();
    let selected = stage.app.as_mut().and_then(|app| app.take_selection());

    if !entries.is_empty() {
        let rows = stage.cx.display.rows();
        let menu = Menu::new(entries, selected, rows);
        let preselected = selected.and(menu.current().cloned());
        stage.cx.menu = Some(menu);

        for code in [KeyCode::BTN_UP, KeyCode::BTN_DOWN, KeyCode::BTN_A, KeyCode::BTN_SELECT] {
            bus.on(&key_up_path(code), on_menu_key)?;
        }

        if let Some(entry) = preselected {
            tracing::debug!(entry = %entry.text, "activating pre-selected menu entry");
            return Ok(stage.with_screen(|screen, cx| screen.on_menu_selection(&entry, cx)).flatten());
        }
    }

    Ok(render(stage))
}

fn relay_char(stage: &mut Stage, event: &Event) -> Option<Reply> {
    if stage.cx.input.edit_text(event) {
        stage.cx.draw_text_capture();
    }
    None
}

fn on_back(stage: &mut Stage, event: &Event) -> Option<Reply> {
    if stage.cx.input.mode() == Mode::TextCapture {
        return None;
    }
    stage
        .with_screen(|screen, cx| {
            if screen.options().back_enabled { screen.back(event, cx) } else { None }
        })
        .flatten()
}

fn on_key_up(stage: &mut Stage, event: &Event) -> Option<Reply> {
    stage.with_screen(|screen, cx| screen.on_key_up(event, cx)).flatten()
}

fn on_key_down(stage: &mut Stage, event: &Event) -> Option<Reply> {
    stage.with_screen(|screen, cx| screen.on_key_down(event, cx)).flatten()
}

fn on_text(stage: &mut Stage, event: &Event) -> Option<Reply> {
    stage.cx.input.set_mode(Mode::Default);
    stage.cx.show_modifiers(stage.cx.input.modifiers());

    let confirmed = event.get("value").is_some_and(|value| !value.is_null());
    if confirmed
        && let Some(reply) = stage.with_screen(|screen, cx| screen.on_text(event, cx)).flatten()
    {
        return Some(reply);
    }
    render(stage)
}

fn on_menu_key(stage: &mut Stage, event: &Event) -> Option<Reply> {
    let code = KeyCode(event.code()?);
    let cx = &mut stage.cx;
    let menu = cx.menu.as_mut()?;

    match code {
        KeyCode::BTN_UP => {
            menu.up();
            menu.draw(cx.display.as_mut());
            None
        },
        KeyCode::BTN_DOWN => {
            menu.down();
            menu.draw(cx.display.as_mut());
            None
        },
        KeyCode::BTN_A | KeyCode::BTN_SELECT if cx.input.mode() != Mode::TextCapture => {
            let entry = menu.current()?.clone();
            stage.with_screen(|screen, cx| screen.on_menu_selection(&entry, cx)).flatten()
        },
        _ => None,
    }
}

fn forward_to_screen(stage: &mut Stage, event: &Event) -> Option<Reply> {
    stage.with_screen(|screen, cx| screen.on_event(event, cx)).flatten()
}
