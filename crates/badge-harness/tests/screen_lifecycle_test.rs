//! Screen activation: first render, back keys and listener lifetime.

use std::{cell::Cell, rc::Rc};

use badge_harness::Rig;
use badge_kernel::{
    App, AppRegistry, BusError, Context, Directive, Event, FnModule, KernelConfig, KeyCode,
    Listeners, Reply, Screen, ScreenOptions, Shutdown, StartReason, hal::TextStyle,
};

/// Draws its label and counts every render.
struct Counter {
    label: &'static str,
    renders: Rc<Cell<usize>>,
    back: bool,
}

impl Screen for Counter {
    fn options(&self) -> ScreenOptions {
        if self.back { ScreenOptions::default() } else { ScreenOptions::default().without_back() }
    }

    fn update(&mut self, cx: &mut Context, _delta_ms: u64) -> Option<Reply> {
        self.renders.set(self.renders.get() + 1);
        cx.display.text(self.label, 0, 0, TextStyle::plain());
        cx.display.update();
        None
    }
}

/// Counts key releases through its own listener and moves to screen 1 on
/// the first one.
struct Hopping {
    heard: Rc<Cell<usize>>,
}

impl Screen for Hopping {
    fn register(&mut self, listeners: &mut Listeners<'_>) -> Result<(), BusError> {
        let heard = Rc::clone(&self.heard);
        listeners.on("input.up", move |_, _| {
            heard.set(heard.get() + 1);
            None
        })
    }

    fn on_key_up(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        Some(Directive::LoadScreen(1).into())
    }
}

/// Screen 1 of the hopping app.
struct Still;

impl Screen for Still {}

fn registry_with(module: FnModule) -> AppRegistry {
    let mut registry = badge_apps::builtin_registry();
    registry.install(module);
    registry
}

fn starting(app: &str) -> KernelConfig {
    KernelConfig { default_app: app.into(), ..KernelConfig::default() }
}

fn counter_app(renders: &Rc<Cell<usize>>, back: bool) -> FnModule {
    let renders = Rc::clone(renders);
    FnModule::new("count", move |screen, args| {
        let counter = Counter { label: "count", renders: Rc::clone(&renders), back };
        App::new("count", 1, vec![Box::new(counter)], screen, args)
    })
}

#[test]
fn first_screen_renders_once_before_waiting() {
    let renders = Rc::new(Cell::new(0));
    let (mut kernel, watch) = Rig::with_registry(registry_with(counter_app(&renders, true)))
        .config(starting("count"))
        .build();

    assert_eq!(kernel.start(StartReason::Normal), Shutdown::Interrupted);
    assert_eq!(renders.get(), 1);
    assert_eq!(watch.display.log().texts.iter().filter(|text| *text == "count").count(), 1);
}

#[test]
fn back_disabled_screen_ignores_back_keys() {
    let renders = Rc::new(Cell::new(0));
    let (mut kernel, watch) = Rig::with_registry(registry_with(counter_app(&renders, false)))
        .config(starting("count"))
        .press_all(&[KeyCode::BTN_B, KeyCode::BTN_START])
        .build();

    assert_eq!(kernel.start(StartReason::Normal), Shutdown::Interrupted);
    assert_eq!(kernel.active_app(), Some("count"));
    assert_eq!(watch.script.delivered(), 2);
    // No directive came back, so the screen was never re-activated.
    assert_eq!(renders.get(), 1);
}

#[test]
fn listeners_of_previous_screen_stay_silent() {
    let heard = Rc::new(Cell::new(0));
    let module = {
        let heard = Rc::clone(&heard);
        FnModule::new("hop", move |screen, args| {
            let first = Hopping { heard: Rc::clone(&heard) };
            App::new("hop", 1, vec![Box::new(first), Box::new(Still)], screen, args)
        })
    };
    let (mut kernel, watch) = Rig::with_registry(registry_with(module))
        .config(starting("hop"))
        .press_all(&[KeyCode::BTN_UP, KeyCode::BTN_DOWN, KeyCode::BTN_UP])
        .build();

    assert_eq!(kernel.start(StartReason::Normal), Shutdown::Interrupted);
    assert_eq!(watch.script.delivered(), 3);
    assert_eq!(kernel.app().and_then(|app| app.current_screen()), Some(1));
    // Only the release that left screen 0 reached its listener.
    assert_eq!(heard.get(), 1);
}
