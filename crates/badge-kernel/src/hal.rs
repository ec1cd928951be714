//! Peripheral interfaces.
//!
//! The kernel never touches hardware directly. Displays, indicator lights,
//! the network interface and the platform clock are injected as trait objects
//! so the same runtime drives the badge, the simulator and the test harness.

use serde_json::Value;
use thiserror::Error;

/// Host requested that the runtime stop.
///
/// Returned from suspension points ([`Platform::idle`] and friends) and
/// surfaced by the kernel as a clean shutdown.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("interrupted by host")]
pub struct Interrupted;

/// Two-tone e-paper color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Color {
    /// Paper white.
    #[default]
    Background,
    /// Ink black.
    Foreground,
}

impl Color {
    /// The other color.
    pub fn inverse(self) -> Self {
        match self {
            Self::Background => Self::Foreground,
            Self::Foreground => Self::Background,
        }
    }
}

/// Text placement options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStyle {
    /// Glyph color
    pub color: Color,
    /// Wrap at the display edge instead of clipping
    pub wrap: bool,
}

impl TextStyle {
    /// Ink on paper, wrapped.
    pub fn wrapped() -> Self {
        Self { color: Color::Foreground, wrap: true }
    }

    /// Ink on paper, clipped at the display edge.
    pub fn plain() -> Self {
        Self { color: Color::Foreground, wrap: false }
    }

    /// Paper on ink, for highlighted rows.
    pub fn inverted() -> Self {
        Self { color: Color::Background, wrap: false }
    }
}

/// Area covered by drawn text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextExtent {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Framebuffer-backed display.
///
/// Drawing calls only touch the framebuffer. Nothing reaches the panel until
/// [`Display::update`] is called.
pub trait Display {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Height of one text row in pixels.
    fn line_height(&self) -> u32;

    /// Number of full text rows.
    fn rows(&self) -> usize {
        (self.height() / self.line_height().max(1)) as usize
    }

    /// Blank the panel itself (slow full refresh).
    fn clear(&mut self);

    /// Reset rotation and any per-screen transform.
    fn reset(&mut self);

    /// Fill the framebuffer.
    fn fill(&mut self, color: Color);

    /// Fill a rectangle.
    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color);

    /// Draw a horizontal line in the foreground color.
    fn hline(&mut self, x: i32, y: i32, width: u32);

    /// Draw text and report the area it covered.
    fn text(&mut self, text: &str, x: i32, y: i32, style: TextStyle) -> TextExtent;

    /// Push the framebuffer to the panel.
    fn update(&mut self);
}

/// RGB triple for an indicator light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Light off.
    pub const OFF: Self = Self(0, 0, 0);
    /// Hardware fault marker.
    pub const RED: Self = Self(255, 0, 0);
    /// Success marker.
    pub const GREEN: Self = Self(0, 255, 0);
    /// Held-modifier marker.
    pub const BLUE: Self = Self(0, 0, 255);

    /// Color on the hue wheel, `position` in `0..=255`.
    pub fn wheel(position: u8) -> Self {
        let position = 255 - position;
        match position {
            0..=84 => Self(255 - position * 3, 0, position * 3),
            85..=169 => {
                let position = position - 85;
                Self(0, position * 3, 255 - position * 3)
            },
            _ => {
                let position = position - 170;
                Self(position * 3, 255 - position * 3, 0)
            },
        }
    }
}

/// Row of indicator lights.
pub trait Lights {
    /// Number of lights.
    fn count(&self) -> usize;

    /// Set one light. Out-of-range indices are ignored.
    fn set(&mut self, index: usize, color: Rgb);

    /// Turn off the given lights.
    fn off(&mut self, indices: &[usize]) {
        for &index in indices {
            self.set(index, Rgb::OFF);
        }
    }

    /// Turn off every light.
    fn off_all(&mut self) {
        for index in 0..self.count() {
            self.set(index, Rgb::OFF);
        }
    }
}

/// Clock, suspension and reset.
pub trait Platform {
    /// Suspend until something may have happened (an interrupt, a timer).
    ///
    /// Returns `Err(Interrupted)` when the host wants the runtime to stop.
    fn idle(&mut self) -> Result<(), Interrupted>;

    /// Interruption check, called once per continuous frame. Frame pacing
    /// belongs here too.
    fn poll_interrupt(&mut self) -> Result<(), Interrupted> {
        Ok(())
    }

    /// Factory-burned device id.
    fn unique_id(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Monotonic milliseconds.
    fn ticks_ms(&self) -> u64;

    /// Sleep for `ms` milliseconds. Interruptible.
    fn sleep_ms(&mut self, ms: u64) -> Result<(), Interrupted>;

    /// Hard reset the device.
    fn reset(&mut self);
}

/// HTTP method for backend requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
}

/// Backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body
    pub body: Value,
}

/// Wireless station interface and backend transport.
pub trait Network {
    /// Start connecting to an access point. Returns immediately.
    fn connect(&mut self, ssid: &str, psk: &str);

    /// True once an address has been obtained.
    fn is_connected(&self) -> bool;

    /// Disconnect and power the interface down.
    fn disconnect(&mut self);

    /// Issue a backend request. `None` on transport failure.
    fn request(&mut self, method: Method, path: &str, body: Option<&Value>) -> Option<Response>;
}
