//! Runtime services and the dispatch target.
//!
//! [`Context`] owns the peripherals and the input decoder; screens receive it
//! in every hook. [`Stage`] pairs the context with the active [`App`] and is
//! what bus listeners are dispatched against, so a listener can reach both
//! the active screen and the services without the bus owning either.

use serde_json::Value;

use crate::{
    app::App,
    bus::EventBus,
    config::KernelConfig,
    directive::{Directive, Reply},
    hal::{Color, Display, Interrupted, Lights, Method, Network, Platform, Rgb, TextStyle},
    input::{InputDecoder, InputEffect, KeyEdge, KeyMatrix, Modifiers},
    kernel::StartReason,
    menu::Menu,
    screen::Screen,
    storage::{Storage, keys},
};

/// Event bus as used by the runtime.
pub type Bus = EventBus<Stage>;

/// Glyph drawn after the text-capture buffer.
pub const CURSOR: char = '_';

const LIGHT_SHIELD: usize = 0;
const LIGHT_FN: usize = 1;
const LIGHT_SHIFT: usize = 5;

/// Peripherals handed to the kernel at startup.
pub struct Peripherals {
    /// E-paper panel
    pub display: Box<dyn Display>,
    /// Indicator lights
    pub lights: Box<dyn Lights>,
    /// Persisted settings
    pub storage: Box<dyn Storage>,
    /// WiFi and backend transport
    pub network: Box<dyn Network>,
    /// Clock, suspension and reset
    pub platform: Box<dyn Platform>,
    /// Key-matrix controllers, in light order
    pub controllers: Vec<Box<dyn KeyMatrix>>,
}

/// Services available to screens and listeners.
pub struct Context {
    /// E-paper panel
    pub display: Box<dyn Display>,
    /// Indicator lights
    pub lights: Box<dyn Lights>,
    /// Persisted settings
    pub storage: Box<dyn Storage>,
    /// WiFi and backend transport
    pub network: Box<dyn Network>,
    /// Clock, suspension and reset
    pub platform: Box<dyn Platform>,
    /// Key decoding and text capture
    pub input: InputDecoder,
    /// Menu of the active screen, rebuilt on every activation
    pub menu: Option<Menu>,
    /// Runtime configuration
    pub config: KernelConfig,
    /// Why the badge started
    pub reason: StartReason,
}

impl Context {
    /// Build the context and attach the key-matrix controllers.
    ///
    /// Controllers that fail to initialize are flagged with a red light at
    /// their index.
    pub fn new(peripherals: Peripherals, config: KernelConfig) -> Self {
        let Peripherals { display, mut lights, storage, network, platform, controllers } =
            peripherals;

        let mut input = InputDecoder::new(config.edge_queue_capacity);
        for fault in input.attach(controllers) {
            lights.set(fault.index, Rgb::RED);
        }

        Self {
            display,
            lights,
            storage,
            network,
            platform,
            input,
            menu: None,
            config,
            reason: StartReason::Normal,
        }
    }

    /// Enter text capture and draw the capture view.
    ///
    /// The result arrives later as an `input.text` event carrying `context`
    /// and the final value (null if cancelled).
    pub fn get_user_input(
        &mut self,
        context: Option<&str>,
        initial: &str,
        title: Option<&str>,
        max_len: Option<usize>,
    ) {
        self.input.begin_text_capture(
            context.map(str::to_owned),
            initial,
            title.map(str::to_owned),
            max_len,
        );
        self.show_modifiers(self.input.modifiers());
        self.draw_text_capture();
    }

    /// Draw the text-capture view: title, rule, buffer and cursor.
    pub fn draw_text_capture(&mut self) {
        let capture = self.input.capture();
        let display = self.display.as_mut();
        let width = display.width();

        display.reset();
        display.fill(Color::Background);
        let mut y = 0;
        if let Some(title) = &capture.title {
            y = display.text(title, 0, 0, TextStyle::plain()).height as i32;
        }
        display.hline(0, y, width);
        display.text(&format!("{}{CURSOR}", capture.text), 0, y + 2, TextStyle::wrapped());
        display.update();
    }

    /// Mirror held modifiers on the indicator lights.
    pub fn show_modifiers(&mut self, modifiers: Modifiers) {
        self.lights.off(&[LIGHT_SHIELD, LIGHT_FN, LIGHT_SHIFT]);
        if modifiers.function {
            self.lights.set(LIGHT_FN, Rgb::BLUE);
        }
        if modifiers.shift {
            self.lights.set(LIGHT_SHIFT, Rgb::BLUE);
        }
        if modifiers.shield {
            self.lights.set(LIGHT_SHIELD, Rgb::BLUE);
        }
    }
}

impl Context {
    /// Draw `text` on display line `line` and push it to the panel.
    pub fn banner(&mut self, text: &str, line: u32) {
        let display = self.display.as_mut();
        let y = line_y(display, line);
        display.text(text, 0, y, TextStyle::plain());
        display.update();
    }

    /// Wait the safe-reset delay, then request a hard reboot.
    ///
    /// Returns `false` if the host interrupted the delay; the reboot is then
    /// skipped. Callers return [`Directive::Reboot`] on `true` so the kernel
    /// stops dispatching.
    pub fn safe_reset(&mut self) -> bool {
        if self.platform.sleep_ms(self.config.safe_reset_delay_ms).is_err() {
            tracing::warn!("reboot aborted");
            return false;
        }
        tracing::info!("rebooting");
        self.platform.reset();
        true
    }

    /// [`Context::safe_reset`] as a screen reply: `Reboot` once the reset
    /// was requested, nothing if it was aborted.
    pub fn reboot(&mut self) -> Option<Reply> {
        self.safe_reset().then(|| Directive::Reboot.into())
    }

    /// Wipe persisted settings and reboot.
    pub fn factory(&mut self) -> bool {
        tracing::warn!("factory reset");
        self.storage.wipe();
        self.safe_reset()
    }

    /// Connect to the stored WiFi network.
    ///
    /// Idles until connected or until `timeout_ms` elapses (`None` waits
    /// forever). Returns whether a connection is up; on failure the radio is
    /// switched off again.
    ///
    /// # Errors
    ///
    /// - `Interrupted` if the host interrupts the wait
    pub fn wifi(&mut self, timeout_ms: Option<u64>) -> Result<bool, Interrupted> {
        if self.network.is_connected() {
            return Ok(true);
        }

        let credentials = self
            .storage
            .get_str(keys::SSID)
            .zip(self.storage.get_str(keys::PSK))
            .map(|(ssid, psk)| (ssid.to_owned(), psk.to_owned()));
        let Some((ssid, psk)) = credentials else {
            self.wifi_off();
            tracing::error!("No WiFi configuration available!");
            return Ok(false);
        };

        self.banner("Connecting to WiFi...", 0);
        self.network.connect(&ssid, &psk);
        let start = self.platform.ticks_ms();
        while !self.network.is_connected()
            && timeout_ms
                .is_none_or(|timeout| self.platform.ticks_ms().saturating_sub(start) < timeout)
        {
            self.platform.idle()?;
        }

        if self.network.is_connected() {
            tracing::info!(%ssid, "wifi connected");
            return Ok(true);
        }
        self.wifi_off();
        tracing::error!("WiFi connection could not be established!");
        Ok(false)
    }

    /// Switch the radio off.
    pub fn wifi_off(&mut self) {
        self.network.disconnect();
    }

    /// Fetch a one-time auth token from the backend.
    ///
    /// # Errors
    ///
    /// - `Interrupted` if the host interrupts the WiFi wait
    pub fn auth_code(&mut self) -> Result<Option<String>, Interrupted> {
        let Some(body) = self.backend(Method::Get, "/auth")? else {
            return Ok(None);
        };
        Ok(body.pointer("/response/token").and_then(Value::as_str).map(str::to_owned))
    }

    /// Pull name, image, schedule and app settings from the backend.
    ///
    /// Returns whether storage was updated.
    ///
    /// # Errors
    ///
    /// - `Interrupted` if the host interrupts the WiFi wait
    pub fn sync_settings(&mut self) -> Result<bool, Interrupted> {
        let Some(body) = self.backend(Method::Post, "/settings/update")? else {
            return Ok(false);
        };
        Ok(self.storage.merge_remote(&body))
    }

    /// Request to the backend over a short-lived WiFi connection. Only a
    /// 200 response yields a body.
    fn backend(&mut self, method: Method, path: &str) -> Result<Option<Value>, Interrupted> {
        if !self.wifi(Some(self.config.wifi_timeout_ms))? {
            return Ok(None);
        }
        let response = self.network.request(method, path, None);
        self.wifi_off();

        match response {
            Some(response) if response.status == 200 => Ok(Some(response.body)),
            Some(response) => {
                tracing::warn!(path, status = response.status, "backend request refused");
                Ok(None)
            },
            None => {
                tracing::warn!(path, "backend unreachable");
                Ok(None)
            },
        }
    }
}

/// Top edge of display line `line`.
pub fn line_y(display: &dyn Display, line: u32) -> i32 {
    i32::try_from(line.saturating_mul(display.line_height())).unwrap_or(i32::MAX)
}

/// Dispatch target of the runtime bus: services plus the active app.
pub struct Stage {
    /// Services
    pub cx: Context,
    /// Active app, if any
    pub app: Option<App>,
}

impl Stage {
    /// Stage with no active app.
    pub fn new(cx: Context) -> Self {
        Self { cx, app: None }
    }

    /// Run `f` against the active screen.
    ///
    /// `None` if no app or screen is active.
    pub fn with_screen<R>(&mut self, f: impl FnOnce(&mut dyn Screen, &mut Context) -> R) -> Option<R> {
        let Self { cx, app } = self;
        let screen = app.as_mut()?.screen_mut()?;
        Some(f(screen, cx))
    }

    /// Decode one edge and execute its effects.
    pub fn deliver(&mut self, bus: &mut Bus, edge: KeyEdge) {
        for effect in self.cx.input.handle(edge) {
            match effect {
                InputEffect::Emit(event) => {
                    tracing::trace!(event = %event.path(), "dispatch");
                    bus.dispatch(&event, self);
                },
                InputEffect::Lights(modifiers) => self.cx.show_modifiers(modifiers),
            }
        }
    }

    /// Deliver queued edges until the queue is empty or the bus has a
    /// result. Edges left queued go to the next screen.
    pub fn pump(&mut self, bus: &mut Bus) {
        while bus.result().is_none() {
            let Some(edge) = self.cx.input.next_edge() else { break };
            self.deliver(bus, edge);
        }
    }

    /// One blocking-wait step: deliver pending edges, otherwise idle.
    pub fn poll(&mut self, bus: &mut Bus) -> Result<(), Interrupted> {
        self.pump(bus);
        if bus.result().is_some() {
            return Ok(());
        }
        self.cx.platform.idle()
    }

    /// Block until the bus has a result or goes idle.
    pub fn wait(&mut self, bus: &mut Bus) -> Result<Option<Reply>, Interrupted> {
        bus.await_result(|bus| self.poll(bus))
    }
}
