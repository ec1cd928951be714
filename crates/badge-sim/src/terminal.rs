//! Terminal stand-ins for the panel and the lights.
//!
//! [`TextDisplay`] keeps a framebuffer of text runs and prints it as a boxed
//! block of rows on every [`Display::update`]. Inverted runs (the menu cursor)
//! are marked with `>` in the gutter.

use std::io::Write;

use badge_kernel::hal::{Color, Display, Lights, Rgb, TextExtent, TextStyle};

/// Pixel width of one glyph.
pub const GLYPH_WIDTH: u32 = 8;

/// Pixel height of one text line.
pub const LINE_HEIGHT: u32 = 10;

#[derive(Debug, Clone)]
struct Run {
    x: i32,
    y: i32,
    text: String,
    inverted: bool,
}

/// Text-mode display writing frames to `W`.
#[derive(Debug)]
pub struct TextDisplay<W: Write> {
    out: W,
    width: u32,
    height: u32,
    runs: Vec<Run>,
    frames: u64,
}

impl<W: Write> TextDisplay<W> {
    /// Panel of `width` × `height` pixels printing to `out`.
    pub fn new(out: W, width: u32, height: u32) -> Self {
        Self { out, width, height, runs: Vec::new(), frames: 0 }
    }

    /// Frames printed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Consume the display, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn columns(&self) -> usize {
        (self.width / GLYPH_WIDTH).max(1) as usize
    }

    /// Current framebuffer as text rows.
    pub fn rows(&self) -> Vec<String> {
        let mut runs = self.runs.clone();
        runs.sort_by_key(|run| (run.y, run.x));

        let mut rows: Vec<(i32, bool, String)> = Vec::new();
        for run in runs {
            let row = run.y.div_euclid(LINE_HEIGHT as i32);
            let column = usize::try_from(run.x.max(0)).unwrap_or(0) / GLYPH_WIDTH as usize;
            if rows.last().is_none_or(|(last, ..)| *last != row) {
                rows.push((row, false, String::new()));
            }
            if let Some((_, inverted, line)) = rows.last_mut() {
                *inverted |= run.inverted;
                let used = line.chars().count();
                if used < column {
                    line.extend(std::iter::repeat_n(' ', column - used));
                } else if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(&run.text);
            }
        }
        rows.into_iter()
            .map(|(_, inverted, line)| format!("{} {}", if inverted { '>' } else { ' ' }, line))
            .collect()
    }
}

impl<W: Write> Display for TextDisplay<W> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn line_height(&self) -> u32 {
        LINE_HEIGHT
    }

    fn clear(&mut self) {
        self.runs.clear();
    }

    fn reset(&mut self) {}

    fn fill(&mut self, _color: Color) {
        self.runs.clear();
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, _color: Color) {
        let (right, bottom) = (x + width as i32, y + height as i32);
        self.runs.retain(|run| !(run.x >= x && run.x < right && run.y >= y && run.y < bottom));
    }

    fn hline(&mut self, _x: i32, _y: i32, _width: u32) {}

    fn text(&mut self, text: &str, x: i32, y: i32, style: TextStyle) -> TextExtent {
        let columns = self.columns();
        let inverted = style.color == Color::Background;
        let mut lines: Vec<String> = Vec::new();
        for line in text.lines() {
            if style.wrap {
                let chars: Vec<char> = line.chars().collect();
                lines.extend(chars.chunks(columns).map(|chunk| chunk.iter().collect()));
            } else {
                lines.push(line.chars().take(columns).collect());
            }
        }
        if lines.is_empty() {
            lines.push(String::new());
        }

        let widest = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0) as u32;
        let extent = TextExtent {
            width: (widest * GLYPH_WIDTH).min(self.width),
            height: lines.len() as u32 * LINE_HEIGHT,
        };
        for (index, line) in lines.into_iter().enumerate() {
            let y = y + (index as u32 * LINE_HEIGHT) as i32;
            self.runs.push(Run { x, y, text: line, inverted });
        }
        extent
    }

    fn update(&mut self) {
        self.frames += 1;
        let border = "-".repeat(self.columns() + 2);
        let mut frame = format!("+{border} frame {}\n", self.frames);
        for row in self.rows() {
            frame.push('|');
            frame.push_str(&row);
            frame.push('\n');
        }
        frame.push('+');
        frame.push_str(&border);
        frame.push('\n');

        if let Err(error) = self.out.write_all(frame.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::warn!(%error, "cannot print frame");
        }
    }
}

/// Indicator lights that log color changes.
#[derive(Debug)]
pub struct LogLights {
    colors: Vec<Rgb>,
}

impl LogLights {
    /// `count` lights, all off.
    pub fn new(count: usize) -> Self {
        Self { colors: vec![Rgb::OFF; count] }
    }

    /// Current colors.
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }
}

impl Lights for LogLights {
    fn count(&self) -> usize {
        self.colors.len()
    }

    fn set(&mut self, index: usize, color: Rgb) {
        let Some(slot) = self.colors.get_mut(index) else {
            tracing::warn!(index, "no such light");
            return;
        };
        if *slot != color {
            *slot = color;
            tracing::debug!(index, r = color.0, g = color.1, b = color.2, "light");
        }
    }
}
