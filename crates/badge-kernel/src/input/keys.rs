//! Key codes, semantic names and the symbol table.
//!
//! Codes are grouped by range: console buttons below `0x10`, letters and
//! space below `0x30`, modifiers below `0x40`, control keys above. The group
//! name prefixes the semantic name (`console.start`, `char.a`, `mod.shift`,
//! `ctrl.back`).

use std::fmt;

/// Modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Function layer (highest precedence)
    Fn,
    /// Capitals
    Shift,
    /// Digits and punctuation
    Shield,
}

/// Held state of the three modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Fn held
    pub function: bool,
    /// Shift held
    pub shift: bool,
    /// Shield held
    pub shield: bool,
}

impl Modifiers {
    /// Update one modifier.
    pub fn set(&mut self, modifier: Modifier, held: bool) {
        match modifier {
            Modifier::Fn => self.function = held,
            Modifier::Shift => self.shift = held,
            Modifier::Shield => self.shield = held,
        }
    }

    /// Whether one modifier is held.
    pub fn is_held(self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Fn => self.function,
            Modifier::Shift => self.shift,
            Modifier::Shield => self.shield,
        }
    }
}

/// Edge direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Key pressed
    Down,
    /// Key released
    Up,
}

impl Direction {
    /// Keypath segment for this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Down => "down",
            Self::Up => "up",
        }
    }
}

/// Raw key code reported by a key-matrix controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u8);

#[allow(missing_docs)]
impl KeyCode {
    pub const BTN_START: Self = Self(0x01);
    pub const BTN_SELECT: Self = Self(0x02);
    pub const BTN_UP: Self = Self(0x03);
    pub const BTN_DOWN: Self = Self(0x04);
    pub const BTN_LEFT: Self = Self(0x05);
    pub const BTN_RIGHT: Self = Self(0x06);
    pub const BTN_A: Self = Self(0x07);
    pub const BTN_B: Self = Self(0x08);

    pub const KEY_A: Self = Self(0x10);
    pub const KEY_B: Self = Self(0x11);
    pub const KEY_C: Self = Self(0x12);
    pub const KEY_D: Self = Self(0x13);
    pub const KEY_E: Self = Self(0x14);
    pub const KEY_F: Self = Self(0x15);
    pub const KEY_G: Self = Self(0x16);
    pub const KEY_H: Self = Self(0x17);
    pub const KEY_I: Self = Self(0x18);
    pub const KEY_J: Self = Self(0x19);
    pub const KEY_K: Self = Self(0x1A);
    pub const KEY_L: Self = Self(0x1B);
    pub const KEY_M: Self = Self(0x1C);
    pub const KEY_N: Self = Self(0x1D);
    pub const KEY_O: Self = Self(0x1E);
    pub const KEY_P: Self = Self(0x1F);
    pub const KEY_Q: Self = Self(0x20);
    pub const KEY_R: Self = Self(0x21);
    pub const KEY_S: Self = Self(0x22);
    pub const KEY_T: Self = Self(0x23);
    pub const KEY_U: Self = Self(0x24);
    pub const KEY_V: Self = Self(0x25);
    pub const KEY_W: Self = Self(0x26);
    pub const KEY_X: Self = Self(0x27);
    pub const KEY_Y: Self = Self(0x28);
    pub const KEY_Z: Self = Self(0x29);
    pub const KEY_SPACE: Self = Self(0x2A);

    pub const KEY_FN: Self = Self(0x30);
    pub const KEY_SHIFT: Self = Self(0x31);
    pub const KEY_SHIELD: Self = Self(0x32);

    pub const KEY_BACKSPACE: Self = Self(0x40);
    pub const KEY_RETURN: Self = Self(0x41);
}

const CONSOLE_NAMES: [&str; 8] = ["start", "select", "up", "down", "left", "right", "a", "b"];
const LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";

// (plain, shift, shield, fn) per character key, A..Z then space.
const SYMBOLS: [[Option<char>; 4]; 27] = [
    [Some('a'), Some('A'), None, None],
    [Some('b'), Some('B'), Some(','), Some('<')],
    [Some('c'), Some('C'), Some('-'), Some('_')],
    [Some('d'), Some('D'), None, None],
    [Some('e'), Some('E'), Some('3'), Some('#')],
    [Some('f'), Some('F'), None, None],
    [Some('g'), Some('G'), Some(';'), Some(':')],
    [Some('h'), Some('H'), Some('\''), Some('"')],
    [Some('i'), Some('I'), Some('8'), Some('*')],
    [Some('j'), Some('J'), Some('['), Some('{')],
    [Some('k'), Some('K'), Some(']'), Some('}')],
    [Some('l'), Some('L'), Some('\\'), Some('|')],
    [Some('m'), Some('M'), Some('/'), Some('?')],
    [Some('n'), Some('N'), Some('.'), Some('>')],
    [Some('o'), Some('O'), Some('9'), Some('(')],
    [Some('p'), Some('P'), Some('0'), Some(')')],
    [Some('q'), Some('Q'), Some('1'), Some('!')],
    [Some('r'), Some('R'), Some('4'), Some('$')],
    [Some('s'), Some('S'), None, None],
    [Some('t'), Some('T'), Some('5'), Some('%')],
    [Some('u'), Some('U'), Some('7'), Some('&')],
    [Some('v'), Some('V'), Some('='), Some('+')],
    [Some('w'), Some('W'), Some('2'), Some('@')],
    [Some('x'), Some('X'), None, None],
    [Some('y'), Some('Y'), Some('6'), Some('^')],
    [Some('z'), Some('Z'), None, None],
    [Some(' '), None, None, None],
];

impl KeyCode {
    /// Name group: `console`, `char`, `mod` or `ctrl`.
    pub fn group(self) -> &'static str {
        match self.0 {
            0x00..=0x0F => "console",
            0x10..=0x2F => "char",
            0x30..=0x3F => "mod",
            _ => "ctrl",
        }
    }

    /// Short name within the group, if the code is known.
    pub fn short_name(self) -> Option<&'static str> {
        match self {
            Self::KEY_SPACE => Some("space"),
            Self::KEY_FN => Some("fn"),
            Self::KEY_SHIFT => Some("shift"),
            Self::KEY_SHIELD => Some("shield"),
            Self::KEY_BACKSPACE => Some("back"),
            Self::KEY_RETURN => Some("return"),
            Self(code @ 0x01..=0x08) => Some(CONSOLE_NAMES[usize::from(code - 1)]),
            Self(code @ 0x10..=0x29) => {
                let offset = usize::from(code - 0x10);
                LETTERS.get(offset..=offset)
            },
            _ => None,
        }
    }

    /// Fully qualified name (`console.b`), if the code is known.
    pub fn semantic_name(self) -> Option<String> {
        self.short_name().map(|name| format!("{}.{name}", self.group()))
    }

    /// Reverse lookup by qualified (`char.a`) or short (`a`) name.
    ///
    /// Short names are ambiguous for `a` and `b`; those resolve to the letter.
    pub fn from_name(name: &str) -> Option<Self> {
        let known = (0x01..=0x08).chain(0x10..=0x2A).chain(0x30..=0x32).chain(0x40..=0x41);
        let mut short_match = None;
        for code in known.map(Self) {
            if code.semantic_name().as_deref() == Some(name) {
                return Some(code);
            }
            if short_match.is_none() && code.group() != "console" && code.short_name() == Some(name)
            {
                short_match = Some(code);
            }
        }
        short_match.or_else(|| {
            CONSOLE_NAMES
                .iter()
                .position(|candidate| *candidate == name)
                .map(|index| Self(index as u8 + 1))
        })
    }

    /// Modifier represented by this key.
    pub fn modifier(self) -> Option<Modifier> {
        match self {
            Self::KEY_FN => Some(Modifier::Fn),
            Self::KEY_SHIFT => Some(Modifier::Shift),
            Self::KEY_SHIELD => Some(Modifier::Shield),
            _ => None,
        }
    }

    /// True for keys that append a character during text capture.
    pub fn is_printable(self) -> bool {
        (Self::KEY_A..=Self::KEY_SPACE).contains(&self) || self == Self::KEY_RETURN
    }

    /// Symbol for this key under the held modifiers.
    ///
    /// Precedence is Fn, then Shield, then Shift. A modifier without a
    /// dedicated symbol falls back to the plain symbol.
    pub fn symbol(self, modifiers: Modifiers) -> Option<char> {
        if self == Self::KEY_RETURN {
            return Some('\n');
        }
        let row = SYMBOLS.get(usize::from(self.0.checked_sub(Self::KEY_A.0)?))?;
        let [plain, shift, shield, function] = *row;
        let variant = if modifiers.function {
            function
        } else if modifiers.shield {
            shield
        } else if modifiers.shift {
            shift
        } else {
            plain
        };
        variant.or(plain)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.semantic_name() {
            Some(name) => f.write_str(&name),
            None => write!(f, "0x{:02x}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_names_by_group() {
        assert_eq!(KeyCode::BTN_START.semantic_name().as_deref(), Some("console.start"));
        assert_eq!(KeyCode::BTN_B.semantic_name().as_deref(), Some("console.b"));
        assert_eq!(KeyCode::KEY_B.semantic_name().as_deref(), Some("char.b"));
        assert_eq!(KeyCode::KEY_SPACE.semantic_name().as_deref(), Some("char.space"));
        assert_eq!(KeyCode::KEY_SHIELD.semantic_name().as_deref(), Some("mod.shield"));
        assert_eq!(KeyCode::KEY_BACKSPACE.semantic_name().as_deref(), Some("ctrl.back"));
        assert_eq!(KeyCode(0x00).semantic_name(), None);
        assert_eq!(KeyCode(0x2B).semantic_name(), None);
    }

    #[test]
    fn reverse_lookup() {
        assert_eq!(KeyCode::from_name("console.a"), Some(KeyCode::BTN_A));
        assert_eq!(KeyCode::from_name("a"), Some(KeyCode::KEY_A));
        assert_eq!(KeyCode::from_name("start"), Some(KeyCode::BTN_START));
        assert_eq!(KeyCode::from_name("return"), Some(KeyCode::KEY_RETURN));
        assert_eq!(KeyCode::from_name("nope"), None);
    }

    #[test]
    fn modifier_precedence() {
        let shift = Modifiers { shift: true, ..Modifiers::default() };
        let shield = Modifiers { shield: true, shift: true, ..Modifiers::default() };
        let function = Modifiers { function: true, shield: true, shift: true };

        assert_eq!(KeyCode::KEY_E.symbol(Modifiers::default()), Some('e'));
        assert_eq!(KeyCode::KEY_E.symbol(shift), Some('E'));
        assert_eq!(KeyCode::KEY_E.symbol(shield), Some('3'));
        assert_eq!(KeyCode::KEY_E.symbol(function), Some('#'));
    }

    #[test]
    fn missing_variant_falls_back_to_plain() {
        let shield = Modifiers { shield: true, ..Modifiers::default() };
        assert_eq!(KeyCode::KEY_A.symbol(shield), Some('a'));
        assert_eq!(KeyCode::KEY_SPACE.symbol(shield), Some(' '));
        assert_eq!(KeyCode::KEY_RETURN.symbol(shield), Some('\n'));
        assert_eq!(KeyCode::BTN_A.symbol(shield), None);
    }

    #[test]
    fn printable_keys() {
        assert!(KeyCode::KEY_Z.is_printable());
        assert!(KeyCode::KEY_SPACE.is_printable());
        assert!(KeyCode::KEY_RETURN.is_printable());
        assert!(!KeyCode::KEY_SHIFT.is_printable());
        assert!(!KeyCode::KEY_BACKSPACE.is_printable());
    }
}
