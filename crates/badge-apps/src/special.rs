//! Hardware self-test, run once at the factory.
//!
//! Walks through a fixed list of steps: press a few keys spread over every
//! controller, then confirm each light color with A. Completed steps are
//! listed with `ok` on the right.

use badge_kernel::{
    App, Context, Directive, Event, FnModule, LaunchArgs, Reply, Screen, ScreenOptions,
    error::AppError,
    hal::{Color, Rgb, TextStyle},
    input::KeyCode,
    registry::AppInfo,
};

use crate::SPECIAL_APP;

/// Room reserved for `ok` at the right edge.
const OK_WIDTH: i32 = 24;

/// One self-test step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Wait for a key release.
    Press(KeyCode),
    /// Light a group and wait for A.
    Light {
        /// First light of the group of three
        first: usize,
        /// Color shown
        color: Rgb,
    },
}

impl Step {
    fn label(self) -> String {
        match self {
            Self::Press(code) => format!("Press {code}"),
            Self::Light { first, color } => {
                format!("Lights {}-{} {}? (A)", first, first + 2, color_name(color))
            },
        }
    }

    fn accepts(self, code: KeyCode) -> bool {
        match self {
            Self::Press(expected) => code == expected,
            Self::Light { .. } => code == KeyCode::BTN_A,
        }
    }
}

fn color_name(color: Rgb) -> &'static str {
    match color {
        Rgb::RED => "red",
        Rgb::GREEN => "green",
        Rgb::BLUE => "blue",
        _ => "?",
    }
}

/// The full step list.
pub fn steps() -> Vec<Step> {
    let mut steps = vec![
        Step::Press(KeyCode::BTN_START),
        Step::Press(KeyCode::BTN_UP),
        Step::Press(KeyCode::KEY_P),
        Step::Press(KeyCode::KEY_Q),
    ];
    for first in [0, 3] {
        for color in [Rgb::RED, Rgb::GREEN, Rgb::BLUE] {
            steps.push(Step::Light { first, color });
        }
    }
    steps
}

/// Self-test screen.
#[derive(Debug)]
pub struct TestScreen {
    steps: Vec<Step>,
    done: usize,
}

impl Default for TestScreen {
    fn default() -> Self {
        Self { steps: steps(), done: 0 }
    }
}

impl TestScreen {
    /// Number of completed steps.
    pub fn completed(&self) -> usize {
        self.done
    }

    /// Whether every step passed.
    pub fn finished(&self) -> bool {
        self.done >= self.steps.len()
    }

    fn current(&self) -> Option<Step> {
        self.steps.get(self.done).copied()
    }
}

impl Screen for TestScreen {
    fn options(&self) -> ScreenOptions {
        ScreenOptions::default().without_back()
    }

    fn update(&mut self, cx: &mut Context, _delta_ms: u64) -> Option<Reply> {
        cx.lights.off_all();
        if let Some(Step::Light { first, color }) = self.current() {
            for index in first..first + 3 {
                cx.lights.set(index, color);
            }
        }

        let display = cx.display.as_mut();
        let width = display.width() as i32;
        let line = display.line_height() as i32;
        let rows = display.rows();
        display.fill(Color::Background);

        let mut lines: Vec<(String, bool)> =
            self.steps[..self.done].iter().map(|step| (step.label(), true)).collect();
        match self.current() {
            Some(step) => lines.push((step.label(), false)),
            None => lines.push(("Done!".to_owned(), false)),
        }

        // Keep the newest lines when the list outgrows the panel.
        let skip = lines.len().saturating_sub(rows.max(1));
        for (row, (label, ok)) in lines.iter().skip(skip).enumerate() {
            let y = row as i32 * line;
            display.text(label, 0, y, TextStyle::plain());
            if *ok {
                display.text("ok", width - OK_WIDTH, y, TextStyle::plain());
            }
        }
        display.update();
        None
    }

    fn on_key_up(&mut self, event: &Event, _cx: &mut Context) -> Option<Reply> {
        let code = KeyCode(event.code()?);
        let step = self.current()?;
        if !step.accepts(code) {
            return None;
        }
        self.done += 1;
        tracing::info!(step = self.done, total = self.steps.len(), "self-test step passed");
        Some(Directive::Reload.into())
    }
}

/// Build the self-test app.
pub fn build(screen: usize, args: &LaunchArgs) -> Result<App, AppError> {
    App::new(SPECIAL_APP, 1, vec![Box::new(TestScreen::default())], screen, args)
}

/// Registry module for the self-test. Hidden from the main menu.
pub fn module() -> FnModule {
    FnModule::new(SPECIAL_APP, build).with_info(AppInfo {
        title: "Self-test".into(),
        version: 1,
        active: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_cover_keys_then_lights() {
        let steps = steps();
        assert_eq!(steps.len(), 10);
        assert_eq!(steps[0], Step::Press(KeyCode::BTN_START));
        assert!(steps[4..].iter().all(|step| matches!(step, Step::Light { .. })));
    }

    #[test]
    fn light_steps_confirm_with_a() {
        let step = Step::Light { first: 3, color: Rgb::GREEN };
        assert!(step.accepts(KeyCode::BTN_A));
        assert!(!step.accepts(KeyCode::BTN_B));
        assert_eq!(step.label(), "Lights 3-5 green? (A)");
    }

    #[test]
    fn press_steps_want_their_key() {
        let step = Step::Press(KeyCode::KEY_P);
        assert!(step.accepts(KeyCode::KEY_P));
        assert!(!step.accepts(KeyCode::KEY_Q));
        assert_eq!(step.label(), "Press char.p");
    }
}
