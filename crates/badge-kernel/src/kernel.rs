//! Top-level state machine.
//!
//! The [`Kernel`] owns the event bus, the runtime services and the app
//! registry. [`Kernel::start`] selects the first app from a [`StartReason`],
//! then runs apps until one exits, swapping them whenever an app asks for
//! another. Anything that escapes that loop (an error or a panic) is caught
//! once by the crash supervisor, which leaves the panel showing a crash
//! screen and reboots only when storage allows it.

use std::panic::{self, AssertUnwindSafe};

use crate::{
    app::{App, ExitReason},
    config::KernelConfig,
    context::{Bus, Context, Peripherals, Stage, line_y},
    directive::{Directive, Launch},
    error::KernelError,
    hal::{Color, Interrupted, TextStyle},
    input::KeyCode,
    registry::AppRegistry,
    storage::keys,
};

/// Why the badge (re)started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StartReason {
    /// Regular boot.
    #[default]
    Normal,
    /// WiFi provisioning.
    WifiSetup,
    /// Backend provisioning.
    BackendSetup,
    /// Name provisioning.
    NameSetup,
    /// Device registration.
    Registration,
    /// Hardware self-test.
    Special,
    /// Wake from deep sleep.
    Sleep,
}

impl StartReason {
    /// Reason for a persisted start code. Unknown codes are `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Normal,
            1 => Self::WifiSetup,
            2 => Self::BackendSetup,
            3 => Self::NameSetup,
            4 => Self::Registration,
            5 => Self::Special,
            6 => Self::Sleep,
            _ => return None,
        })
    }

    /// Persisted start code.
    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::WifiSetup => 1,
            Self::BackendSetup => 2,
            Self::NameSetup => 3,
            Self::Registration => 4,
            Self::Special => 5,
            Self::Sleep => 6,
        }
    }

    /// Provisioning flows reboot instead of swapping apps live.
    fn reboots_on_switch(self) -> bool {
        !matches!(self, Self::Normal | Self::Sleep)
    }
}

/// How [`Kernel::start`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// An app exited, or no app is left to run.
    Exited,
    /// The host interrupted the runtime.
    Interrupted,
    /// A hard reboot was requested.
    Rebooted,
    /// The crash screen is showing and reboot-on-crash is off.
    Crashed,
    /// Crash handling failed too.
    Fatal,
}

/// Result of [`Kernel::load_app`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The new app is active.
    Loaded,
    /// The requested app was already active; nothing changed.
    AlreadyActive,
    /// The module could not be loaded; the previous app keeps running.
    Rejected,
    /// The module loaded but the app failed to start; no app is active.
    Failed,
}

/// Badge runtime kernel.
pub struct Kernel {
    registry: AppRegistry,
    bus: Bus,
    stage: Stage,
    active: Option<String>,
}

impl Kernel {
    /// Build the runtime around `peripherals`.
    ///
    /// Key-matrix controllers are initialized here. A controller that fails
    /// is logged and flagged on the lights, and the kernel keeps running.
    pub fn new(peripherals: Peripherals, registry: AppRegistry, config: KernelConfig) -> Self {
        let cx = Context::new(peripherals, config);
        Self { registry, bus: Bus::new(), stage: Stage::new(cx), active: None }
    }

    /// Runtime services.
    pub fn context(&self) -> &Context {
        &self.stage.cx
    }

    /// Runtime services, mutably.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.stage.cx
    }

    /// Event bus of the active screen session.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Installed apps.
    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    /// Configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.stage.cx.config
    }

    /// Reason of the last [`Kernel::start`].
    pub fn reason(&self) -> StartReason {
        self.stage.cx.reason
    }

    /// Name of the active app. Stays set after a failed start so the same
    /// app is not retried.
    pub fn active_app(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Running app instance.
    pub fn app(&self) -> Option<&App> {
        self.stage.app.as_ref()
    }

    /// Boot and run apps until the runtime stops.
    pub fn start(&mut self, reason: StartReason) -> Shutdown {
        self.stage.cx.reason = reason;
        tracing::info!(?reason, "starting");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(reason)));
        match outcome {
            Ok(Ok(shutdown)) => shutdown,
            Ok(Err(KernelError::Interrupted)) => {
                tracing::info!("interrupted");
                self.exit();
                Shutdown::Interrupted
            },
            Ok(Err(error)) => {
                tracing::error!(%error, class = ?error.class(), "kernel loop failed");
                self.crash()
            },
            Err(payload) => {
                tracing::error!(panic = panic_message(payload.as_ref()), "kernel loop panicked");
                self.crash()
            },
        }
    }

    fn run(&mut self, reason: StartReason) -> Result<Shutdown, KernelError> {
        if reason == StartReason::Sleep {
            self.load_app(Launch::app(self.config().menu_app.clone()));
        } else {
            let cx = &mut self.stage.cx;
            cx.lights.off_all();
            cx.banner("Starting...", 2);
            cx.display.clear();
            cx.wifi_off();
            let launch = self.launch_for(reason);
            self.load_app(launch);
        }

        while self.stage.app.is_some() {
            match App::run(&mut self.bus, &mut self.stage)? {
                Directive::Exit => {
                    let Stage { cx, app } = &mut self.stage;
                    if let Some(app) = app.as_mut() {
                        app.exit(ExitReason::App, cx);
                    }
                    break;
                },
                Directive::LoadApp(launch) => {
                    if reason.reboots_on_switch() && self.safe_reset() {
                        return Ok(Shutdown::Rebooted);
                    }
                    self.load_app(launch);
                },
                Directive::Reboot => {
                    let Stage { cx, app } = &mut self.stage;
                    if let Some(app) = app.as_mut() {
                        app.exit(ExitReason::System, cx);
                    }
                    self.bus.clear();
                    return Ok(Shutdown::Rebooted);
                },
                other => return Err(KernelError::InvalidAction(other.kind())),
            }
        }
        Ok(Shutdown::Exited)
    }

    fn launch_for(&self, reason: StartReason) -> Launch {
        let config = self.config();
        match reason {
            StartReason::Normal => Launch::default_app(),
            StartReason::WifiSetup => Launch::app(config.settings_app.clone()).at_screen(1),
            StartReason::BackendSetup => Launch::app(config.settings_app.clone()).selecting(2),
            StartReason::NameSetup => Launch::app(config.settings_app.clone()).selecting(3),
            StartReason::Registration if self.registry.contains(&config.registration_app) => {
                Launch::app(config.registration_app.clone())
            },
            StartReason::Registration => {
                tracing::warn!(app = %config.registration_app, "registration app not installed");
                Launch::default_app()
            },
            StartReason::Special => Launch::app(config.special_app.clone()),
            StartReason::Sleep => Launch::app(config.menu_app.clone()),
        }
    }

    /// Swap to the app named by `launch` (the default app if unnamed).
    ///
    /// The previous app keeps running if the module cannot be loaded. Once
    /// the module is in, the previous app is exited and dropped and the bus
    /// is cleared before the new app is built.
    pub fn load_app(&mut self, launch: Launch) -> LoadOutcome {
        let Launch { app, screen, args } = launch;
        let name = app.unwrap_or_else(|| self.config().default_app.clone());
        if self.active.as_deref() == Some(name.as_str()) {
            return LoadOutcome::AlreadyActive;
        }

        if let Err(error) = self.registry.get(&name).and_then(|module| module.load()) {
            tracing::error!(%error, "Can't import app '{name}'. Not switching!");
            return LoadOutcome::Rejected;
        }

        if let Some(mut previous) = self.stage.app.take() {
            tracing::debug!(app = previous.name(), "closing app");
            previous.exit(ExitReason::System, &mut self.stage.cx);
            self.bus.clear();
        }
        self.stage.cx.menu = None;

        tracing::debug!(app = %name, screen, "starting app");
        self.active = Some(name.clone());
        match self.registry.get(&name).and_then(|module| module.build(screen, &args)) {
            Ok(app) => {
                self.stage.app = Some(app);
                LoadOutcome::Loaded
            },
            Err(error) => {
                tracing::error!(app = %name, %error, "app failed to start");
                let display = self.stage.cx.display.as_mut();
                display.reset();
                display.fill(Color::Background);
                display.text("Failed to load app. Please reset.", 0, 0, TextStyle::wrapped());
                display.update();
                LoadOutcome::Failed
            },
        }
    }

    /// See [`Context::safe_reset`].
    pub fn safe_reset(&mut self) -> bool {
        self.stage.cx.safe_reset()
    }

    /// See [`Context::factory`].
    pub fn factory(&mut self) -> bool {
        self.stage.cx.factory()
    }

    /// See [`Context::wifi`].
    pub fn wifi(&mut self, timeout_ms: Option<u64>) -> Result<bool, Interrupted> {
        self.stage.cx.wifi(timeout_ms)
    }

    /// See [`Context::wifi_off`].
    pub fn wifi_off(&mut self) {
        self.stage.cx.wifi_off();
    }

    /// See [`Context::auth_code`].
    pub fn auth_code(&mut self) -> Result<Option<String>, Interrupted> {
        self.stage.cx.auth_code()
    }

    /// See [`Context::sync_settings`].
    pub fn sync_settings(&mut self) -> Result<bool, Interrupted> {
        self.stage.cx.sync_settings()
    }

    /// START held at boot skips the startup checks.
    pub fn skip_checks(&self) -> bool {
        self.stage.cx.input.is_pressed(KeyCode::BTN_START)
    }

    /// B held at boot starts the self-test.
    pub fn boot_special(&self) -> bool {
        self.stage.cx.input.is_pressed(KeyCode::BTN_B)
    }

    /// Release the radio and the key-matrix controllers.
    pub fn exit(&mut self) {
        self.stage.cx.wifi_off();
        self.stage.cx.input.close();
    }

    fn crash(&mut self) -> Shutdown {
        let drawn = panic::catch_unwind(AssertUnwindSafe(|| {
            let display = self.stage.cx.display.as_mut();
            display.reset();
            display.fill(Color::Background);
            display.text("Crashed!", 0, 0, TextStyle::plain());
            display.update();
            let y = line_y(display, 1);
            display.text("Reset please!", 0, y, TextStyle::plain());
            display.update();
        }));
        if let Err(payload) = drawn {
            tracing::error!(panic = panic_message(payload.as_ref()), "Fatal error!");
            return Shutdown::Fatal;
        }

        if self.stage.cx.storage.flag(keys::RESTART) {
            tracing::warn!("rebooting after crash");
            self.stage.cx.platform.reset();
            return Shutdown::Rebooted;
        }
        Shutdown::Crashed
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::VecDeque, rc::Rc};

    use serde_json::{Value, json};

    use super::*;
    use crate::{
        directive::{LaunchArgs, Reply},
        error::AppError,
        hal::{Display, Lights, Method, Network, Platform, Response, Rgb, TextExtent},
        registry::FnModule,
        screen::{Screen, ScreenOptions},
        storage::MemoryStorage,
    };

    #[derive(Default)]
    struct Panel {
        texts: Rc<RefCell<Vec<String>>>,
    }

    impl Display for Panel {
        fn width(&self) -> u32 {
            128
        }

        fn height(&self) -> u32 {
            296
        }

        fn line_height(&self) -> u32 {
            10
        }

        fn clear(&mut self) {}

        fn reset(&mut self) {}

        fn fill(&mut self, _color: Color) {}

        fn fill_rect(&mut self, _x: i32, _y: i32, _width: u32, _height: u32, _color: Color) {}

        fn hline(&mut self, _x: i32, _y: i32, _width: u32) {}

        fn text(&mut self, text: &str, _x: i32, _y: i32, _style: TextStyle) -> TextExtent {
            self.texts.borrow_mut().push(text.to_owned());
            TextExtent { width: 8, height: 10 }
        }

        fn update(&mut self) {}
    }

    struct NoLights;

    impl Lights for NoLights {
        fn count(&self) -> usize {
            8
        }

        fn set(&mut self, _index: usize, _color: Rgb) {}
    }

    /// Interrupts once the scripted sleeps run out, so every loop ends.
    #[derive(Default)]
    struct Clock {
        now: u64,
        sleeps: VecDeque<bool>,
        resets: Rc<RefCell<u32>>,
    }

    impl Platform for Clock {
        fn idle(&mut self) -> Result<(), Interrupted> {
            Err(Interrupted)
        }

        fn ticks_ms(&self) -> u64 {
            self.now
        }

        fn sleep_ms(&mut self, ms: u64) -> Result<(), Interrupted> {
            self.now += ms;
            if self.sleeps.pop_front().unwrap_or(true) { Ok(()) } else { Err(Interrupted) }
        }

        fn reset(&mut self) {
            *self.resets.borrow_mut() += 1;
        }
    }

    #[derive(Default)]
    struct Wire {
        connected: bool,
        response: Option<Response>,
        requests: Rc<RefCell<Vec<String>>>,
    }

    impl Network for Wire {
        fn connect(&mut self, _ssid: &str, _psk: &str) {
            self.connected = true;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn disconnect(&mut self) {
            self.connected = false;
        }

        fn request(&mut self, _method: Method, path: &str, _body: Option<&Value>) -> Option<Response> {
            self.requests.borrow_mut().push(path.to_owned());
            self.response.clone()
        }
    }

    /// Replies once with a fixed value on render.
    struct Answer(Option<Reply>);

    impl Screen for Answer {
        fn update(&mut self, _cx: &mut Context, _delta_ms: u64) -> Option<Reply> {
            self.0.take()
        }
    }

    struct Boom;

    impl Screen for Boom {
        fn options(&self) -> ScreenOptions {
            ScreenOptions::continuous()
        }

        #[allow(clippy::panic)]
        fn update(&mut self, _cx: &mut Context, _delta_ms: u64) -> Option<Reply> {
            panic!("frame exploded")
        }
    }

    fn answering(name: &'static str, reply: impl Fn() -> Option<Reply> + 'static) -> FnModule {
        FnModule::new(name, move |screen, args| {
            App::new(name, 1, vec![Box::new(Answer(reply()))], screen, args)
        })
    }

    struct Fixture {
        texts: Rc<RefCell<Vec<String>>>,
        resets: Rc<RefCell<u32>>,
        requests: Rc<RefCell<Vec<String>>>,
    }

    fn kernel(registry: AppRegistry, storage: MemoryStorage, platform: Clock, wire: Wire) -> (Kernel, Fixture) {
        let display = Panel::default();
        let fixture = Fixture {
            texts: Rc::clone(&display.texts),
            resets: Rc::clone(&platform.resets),
            requests: Rc::clone(&wire.requests),
        };
        let peripherals = Peripherals {
            display: Box::new(display),
            lights: Box::new(NoLights),
            storage: Box::new(storage),
            network: Box::new(wire),
            platform: Box::new(platform),
            controllers: Vec::new(),
        };
        (Kernel::new(peripherals, registry, KernelConfig::default()), fixture)
    }

    fn simple(registry: AppRegistry) -> (Kernel, Fixture) {
        kernel(registry, MemoryStorage::new(), Clock::default(), Wire::default())
    }

    #[test]
    fn start_reason_codes() {
        for code in 0..7 {
            let reason = StartReason::from_code(code).unwrap();
            assert_eq!(reason.code(), code);
        }
        assert_eq!(StartReason::from_code(7), None);
        assert!(!StartReason::Normal.reboots_on_switch());
        assert!(!StartReason::Sleep.reboots_on_switch());
        assert!(StartReason::WifiSetup.reboots_on_switch());
    }

    #[test]
    fn exit_directive_stops_the_loop() {
        let mut registry = AppRegistry::new();
        registry.install(answering("name", || Some(Directive::Exit.into())));
        let (mut kernel, fixture) = simple(registry);

        assert_eq!(kernel.start(StartReason::Normal), Shutdown::Exited);
        assert_eq!(kernel.active_app(), Some("name"));
        assert!(fixture.texts.borrow().contains(&"Starting...".to_owned()));
    }

    #[test]
    fn load_app_switches_live_on_normal_boot() {
        let mut registry = AppRegistry::new();
        registry.install(answering("name", || Some(Directive::LoadApp(Launch::app("main")).into())));
        registry.install(answering("main", || Some(Directive::Exit.into())));
        let (mut kernel, fixture) = simple(registry);

        assert_eq!(kernel.start(StartReason::Normal), Shutdown::Exited);
        assert_eq!(kernel.active_app(), Some("main"));
        assert_eq!(*fixture.resets.borrow(), 0);
    }

    #[test]
    fn provisioning_reboots_instead_of_switching() {
        let mut registry = AppRegistry::new();
        registry.install(answering("special", || Some(Directive::home().into())));
        let (mut kernel, fixture) = simple(registry);

        assert_eq!(kernel.start(StartReason::Special), Shutdown::Rebooted);
        assert_eq!(*fixture.resets.borrow(), 1);
    }

    #[test]
    fn reboot_directive_ends_the_run() {
        let mut registry = AppRegistry::new();
        registry.install(answering("name", || Some(Directive::Reboot.into())));
        let (mut kernel, _) = simple(registry);

        assert_eq!(kernel.start(StartReason::Normal), Shutdown::Rebooted);
        assert_eq!(kernel.bus().listener_count(), 0);
    }

    #[test]
    fn interrupted_reboot_falls_back_to_live_switch() {
        let mut registry = AppRegistry::new();
        registry.install(answering("special", || Some(Directive::home().into())));
        registry.install(answering("name", || Some(Directive::Exit.into())));
        let platform = Clock { sleeps: VecDeque::from([false]), ..Clock::default() };
        let (mut kernel, fixture) = kernel(registry, MemoryStorage::new(), platform, Wire::default());

        assert_eq!(kernel.start(StartReason::Special), Shutdown::Exited);
        assert_eq!(kernel.active_app(), Some("name"));
        assert_eq!(*fixture.resets.borrow(), 0);
    }

    #[test]
    fn load_screen_stays_inside_the_app() {
        let mut registry = AppRegistry::new();
        registry.install(answering("name", || Some(Directive::LoadScreen(0).into())));
        let (mut kernel, _) = simple(registry);

        // Screen 0 reloads itself once, then its answer is spent and the
        // idle wait is interrupted.
        assert_eq!(kernel.start(StartReason::Normal), Shutdown::Interrupted);
        assert_eq!(kernel.active_app(), Some("name"));
    }

    #[test]
    fn unknown_app_keeps_previous() {
        let mut registry = AppRegistry::new();
        registry.install(answering("name", || None));
        let (mut kernel, _) = simple(registry);

        assert_eq!(kernel.load_app(Launch::default_app()), LoadOutcome::Loaded);
        assert_eq!(kernel.load_app(Launch::app("ghost")), LoadOutcome::Rejected);
        assert_eq!(kernel.active_app(), Some("name"));
        assert!(kernel.app().is_some());
        assert_eq!(kernel.load_app(Launch::default_app()), LoadOutcome::AlreadyActive);
    }

    #[test]
    fn construction_failure_shows_error_screen() {
        let mut registry = AppRegistry::new();
        registry.install(answering("name", || None));
        registry.install(FnModule::new("broken", |_, _| {
            Err(AppError::Construction { app: "broken".into(), reason: "no sensor".into() })
        }));
        let (mut kernel, fixture) = simple(registry);

        kernel.load_app(Launch::default_app());
        assert_eq!(kernel.load_app(Launch::app("broken")), LoadOutcome::Failed);
        assert!(kernel.app().is_none());
        assert_eq!(kernel.active_app(), Some("broken"));
        assert!(fixture.texts.borrow().contains(&"Failed to load app. Please reset.".to_owned()));
    }

    #[test]
    fn registration_falls_back_to_default_app() {
        let mut registry = AppRegistry::new();
        registry.install(answering("name", || Some(Directive::Exit.into())));
        let (mut kernel, _) = simple(registry);

        assert_eq!(kernel.start(StartReason::Registration), Shutdown::Exited);
        assert_eq!(kernel.active_app(), Some("name"));
    }

    #[test]
    fn settings_reasons_pick_screen_and_selection() {
        let (kernel, _) = simple(AppRegistry::new());
        let wifi = kernel.launch_for(StartReason::WifiSetup);
        assert_eq!((wifi.app.as_deref(), wifi.screen), (Some("settings"), 1));
        let name = kernel.launch_for(StartReason::NameSetup);
        assert_eq!(name.args, LaunchArgs { selected_index: Some(3) });
        let backend = kernel.launch_for(StartReason::BackendSetup);
        assert_eq!((backend.screen, backend.args.selected_index), (0, Some(2)));
    }

    #[test]
    fn panic_shows_crash_screen() {
        let mut registry = AppRegistry::new();
        registry.install(FnModule::new("name", |screen, args| {
            App::new("name", 1, vec![Box::new(Boom)], screen, args)
        }));
        let (mut kernel, fixture) = simple(registry);

        assert_eq!(kernel.start(StartReason::Normal), Shutdown::Crashed);
        let texts = fixture.texts.borrow();
        assert!(texts.contains(&"Crashed!".to_owned()));
        assert!(texts.contains(&"Reset please!".to_owned()));
        assert_eq!(*fixture.resets.borrow(), 0);
    }

    #[test]
    fn crash_reboots_when_allowed() {
        let mut registry = AppRegistry::new();
        registry.install(FnModule::new("name", |screen, args| {
            App::new("name", 1, Vec::new(), screen, args)
        }));
        let storage = MemoryStorage::with(json!({ "RESTART": true }));
        let (mut kernel, fixture) = kernel(registry, storage, Clock::default(), Wire::default());

        assert_eq!(kernel.start(StartReason::Normal), Shutdown::Rebooted);
        assert_eq!(*fixture.resets.borrow(), 1);
    }

    #[test]
    fn wifi_needs_credentials() {
        let (mut kernel, _) = simple(AppRegistry::new());
        assert_eq!(kernel.wifi(Some(100)), Ok(false));

        kernel.context_mut().storage.set(keys::PSK, json!("hunter22"));
        assert_eq!(kernel.wifi(Some(100)), Ok(true));
        assert!(kernel.context().network.is_connected());
    }

    #[test]
    fn auth_code_reads_token_and_drops_wifi() {
        let wire = Wire {
            response: Some(Response { status: 200, body: json!({ "response": { "token": "4711" } }) }),
            ..Wire::default()
        };
        let storage = MemoryStorage::with(json!({ "PSK": "hunter22" }));
        let (mut kernel, fixture) = kernel(AppRegistry::new(), storage, Clock::default(), wire);

        assert_eq!(kernel.auth_code(), Ok(Some("4711".to_owned())));
        assert_eq!(*fixture.requests.borrow(), ["/auth"]);
        assert!(!kernel.context().network.is_connected());
    }

    #[test]
    fn sync_settings_merges_response() {
        let wire = Wire {
            response: Some(Response { status: 200, body: json!({ "response": { "name": "Ada" } }) }),
            ..Wire::default()
        };
        let storage = MemoryStorage::with(json!({ "PSK": "hunter22" }));
        let (mut kernel, _) = kernel(AppRegistry::new(), storage, Clock::default(), wire);

        assert_eq!(kernel.sync_settings(), Ok(true));
        assert_eq!(kernel.context().storage.get_str(keys::NAME), Some("Ada"));
    }

    #[test]
    fn refused_request_yields_nothing() {
        let wire = Wire { response: Some(Response { status: 403, body: Value::Null }), ..Wire::default() };
        let storage = MemoryStorage::with(json!({ "PSK": "hunter22" }));
        let (mut kernel, _) = kernel(AppRegistry::new(), storage, Clock::default(), wire);

        assert_eq!(kernel.auth_code(), Ok(None));
    }

    #[test]
    fn factory_wipes_and_reboots() {
        let storage = MemoryStorage::with(json!({ "NAME": "Ada" }));
        let (mut kernel, fixture) = kernel(AppRegistry::new(), storage, Clock::default(), Wire::default());

        assert!(kernel.factory());
        assert_eq!(kernel.context().storage.get(keys::NAME), Some(&Value::Null));
        assert_eq!(*fixture.resets.borrow(), 1);
    }
}
