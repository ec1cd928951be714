//! Name tag, the default app.
//!
//! Screen 0 shows the stored name centered on the panel. Its back keys lead
//! to the main menu, except while they are part of a secret sequence being
//! entered. The konami code opens screen 1, a rainbow on the lights.

use badge_kernel::{
    App, Context, Directive, Event, FnModule, Launch, LaunchArgs, Listeners, Reply, Screen,
    ScreenOptions,
    error::{AppError, BusError},
    hal::{Color, Rgb, TextStyle},
    input::{KeyCode, sequence},
    screen::key_up_path,
    storage::keys,
};

use crate::{MENU_APP, NAME_APP};

const ANONYMOUS: &str = "Anonymous\n Trooper";
const MARGIN: i32 = 32;
const RAINBOW_STEP: u8 = 8;

/// Name tag screen.
#[derive(Debug, Default)]
pub struct NameScreen;

impl NameScreen {
    /// B and START belong to a sequence if a detector just consumed them.
    fn in_sequence(event: &Event, cx: &Context) -> bool {
        let input = &cx.input;
        match event.code().map(KeyCode) {
            Some(KeyCode::BTN_B) => {
                input.sequence_consumed(sequence::KONAMI) || input.sequence_consumed(sequence::CYBAER)
            },
            Some(KeyCode::BTN_START) => input.sequence_consumed(sequence::CYBAER),
            _ => false,
        }
    }

    fn draw_name(cx: &mut Context) {
        let name = cx.storage.get_str(keys::NAME).unwrap_or(ANONYMOUS).to_owned();
        let display = cx.display.as_mut();
        let (width, height) = (display.width() as i32, display.height() as i32);

        // Measure, wipe, then draw centered.
        let size = display.text(&name, MARGIN, 0, TextStyle::wrapped());
        display.fill(Color::Background);
        let x = (width - size.width as i32) / 2;
        let y = (height - size.height as i32) / 2;
        display.text(&name, x.max(0), y.max(0), TextStyle::wrapped());
    }
}

impl Screen for NameScreen {
    fn options(&self) -> ScreenOptions {
        ScreenOptions::default().without_back()
    }

    fn register(&mut self, listeners: &mut Listeners<'_>) -> Result<(), BusError> {
        listeners.forward("input.konami")?;
        listeners.forward("input.cybaer")?;
        listeners.forward(&key_up_path(KeyCode::BTN_B))?;
        listeners.forward(&key_up_path(KeyCode::BTN_START))
    }

    fn update(&mut self, cx: &mut Context, _delta_ms: u64) -> Option<Reply> {
        Self::draw_name(cx);
        cx.display.update();
        None
    }

    fn back(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        Some(Directive::LoadApp(Launch::app(MENU_APP)).into())
    }

    fn on_event(&mut self, event: &Event, cx: &mut Context) -> Option<Reply> {
        match event.name().as_str() {
            "input.konami" => Some(Directive::LoadScreen(1).into()),
            "input.cybaer" => {
                let display = cx.display.as_mut();
                display.fill(Color::Background);
                display.text("<3 cybaer", 0, 0, TextStyle::plain());
                display.update();
                None
            },
            _ if Self::in_sequence(event, cx) => None,
            _ => self.back(event, cx),
        }
    }
}

/// Rainbow cycling over every light, one step per frame.
#[derive(Debug, Default)]
pub struct RainbowScreen {
    position: u8,
}

impl Screen for RainbowScreen {
    fn options(&self) -> ScreenOptions {
        ScreenOptions::continuous()
    }

    fn render(&mut self, cx: &mut Context) {
        let count = cx.lights.count();
        let spread = (256 / count.max(1)) as u8;
        for index in 0..count {
            let offset = spread.wrapping_mul(index as u8);
            cx.lights.set(index, Rgb::wheel(self.position.wrapping_add(offset)));
        }
        self.position = self.position.wrapping_add(RAINBOW_STEP);
    }

    fn back(&mut self, _event: &Event, _cx: &mut Context) -> Option<Reply> {
        Some(Directive::LoadScreen(0).into())
    }
}

/// Build the name tag app.
pub fn build(screen: usize, args: &LaunchArgs) -> Result<App, AppError> {
    App::new(
        NAME_APP,
        1,
        vec![Box::new(NameScreen), Box::new(RainbowScreen::default())],
        screen,
        args,
    )
}

/// Registry module for the name tag.
pub fn module() -> FnModule {
    FnModule::new(NAME_APP, build)
}
