//! Scrolling list menu.

use crate::hal::{Color, Display, TextStyle};

/// One menu row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    /// Row label
    pub text: String,
    /// Opaque tag handed back on selection (often an app name)
    pub action: String,
}

impl MenuEntry {
    /// Entry whose action tag is `action`.
    pub fn new(text: impl Into<String>, action: impl Into<String>) -> Self {
        Self { text: text.into(), action: action.into() }
    }
}

/// Cursor and scroll window over a list of entries.
///
/// `index` is the cursor, `top` the first visible row. Moving past either end
/// wraps around; the window scrolls just enough to keep the cursor visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    entries: Vec<MenuEntry>,
    index: usize,
    top: usize,
    rows: usize,
}

impl Menu {
    /// Menu showing `rows` rows with the cursor on `selected` (or the first
    /// entry).
    pub fn new(entries: Vec<MenuEntry>, selected: Option<usize>, rows: usize) -> Self {
        let rows = rows.max(1);
        let index = selected.unwrap_or(0).min(entries.len().saturating_sub(1));
        let top = (index + 1).saturating_sub(rows);
        Self { entries, index, top, rows }
    }

    /// All entries.
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Append an entry at the end. The cursor stays where it is.
    pub fn push(&mut self, entry: MenuEntry) {
        self.entries.push(entry);
    }

    /// Cursor position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// First visible row.
    pub fn top(&self) -> usize {
        self.top
    }

    /// Height of the scroll window in rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Entry under the cursor.
    pub fn current(&self) -> Option<&MenuEntry> {
        self.entries.get(self.index)
    }

    /// Move the cursor up one row.
    pub fn up(&mut self) {
        let Some(last) = self.entries.len().checked_sub(1) else { return };
        if self.index == 0 {
            self.index = last;
            self.top = self.entries.len().saturating_sub(self.rows);
        } else if self.index == self.top {
            self.index -= 1;
            self.top -= 1;
        } else {
            self.index -= 1;
        }
    }

    /// Move the cursor down one row.
    pub fn down(&mut self) {
        let Some(last) = self.entries.len().checked_sub(1) else { return };
        if self.index == last {
            self.index = 0;
            self.top = 0;
        } else if self.index == self.top + self.rows - 1 {
            self.index += 1;
            self.top += 1;
        } else {
            self.index += 1;
        }
    }

    /// Draw the visible window, cursor row inverted.
    pub fn draw(&self, display: &mut dyn Display) {
        let line_height = display.line_height();
        let width = display.width();
        display.reset();
        display.fill(Color::Background);

        let visible = self.entries.iter().enumerate().skip(self.top).take(self.rows);
        for (row, (index, entry)) in visible.enumerate() {
            let y = (row as u32 * line_height) as i32;
            if index == self.index {
                display.fill_rect(0, y, width, line_height, Color::Foreground);
                display.text(&entry.text, 0, y, TextStyle::inverted());
            } else {
                display.text(&entry.text, 0, y, TextStyle::plain());
            }
        }
        display.update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(len: usize, selected: Option<usize>, rows: usize) -> Menu {
        let entries = (0..len).map(|i| MenuEntry::new(format!("entry {i}"), i.to_string())).collect();
        Menu::new(entries, selected, rows)
    }

    #[test]
    fn preselection_scrolls_into_view() {
        let menu = menu(10, Some(7), 4);
        assert_eq!((menu.index(), menu.top()), (7, 4));
        assert_eq!(menu.current().map(|entry| entry.action.as_str()), Some("7"));
    }

    #[test]
    fn down_scrolls_then_wraps() {
        let mut menu = menu(5, None, 3);
        for _ in 0..3 {
            menu.down();
        }
        assert_eq!((menu.index(), menu.top()), (3, 1));
        menu.down();
        menu.down();
        assert_eq!((menu.index(), menu.top()), (0, 0));
    }

    #[test]
    fn up_wraps_to_last_page() {
        let mut menu = menu(5, None, 3);
        menu.up();
        assert_eq!((menu.index(), menu.top()), (4, 2));
        menu.up();
        menu.up();
        menu.up();
        assert_eq!((menu.index(), menu.top()), (1, 1));
    }

    #[test]
    fn empty_menu_is_inert() {
        let mut menu = menu(0, Some(3), 3);
        menu.up();
        menu.down();
        assert_eq!(menu.current(), None);
    }

    #[test]
    fn preselection_is_clamped() {
        let menu = menu(3, Some(9), 5);
        assert_eq!(menu.index(), 2);
    }
}
