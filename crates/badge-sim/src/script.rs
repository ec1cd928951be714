//! Key scripts.
//!
//! A script is a text file with one command per line. Blank lines and lines
//! starting with `#` are skipped.
//!
//! | Command          | Effect                                        |
//! |------------------|-----------------------------------------------|
//! | `press <key>...` | press and release each key, one beat per key  |
//! | `down <key>`     | press a key                                   |
//! | `up <key>`       | release a key                                 |
//! | `type <text>`    | type the rest of the line, Shift for capitals |
//! | `wait [n]`       | let `n` beats (default 1) pass without input  |
//!
//! Keys are named as in events (`console.b`, `char.q`, `ctrl.back`) or by
//! their short name (`start`, `q`, `back`). Short `a` and `b` are letters.

use std::{collections::VecDeque, fs, io, path::Path};

use badge_kernel::input::{KeyCode, KeyEdge};
use thiserror::Error;

/// Longest single `wait`.
pub const MAX_WAIT: usize = 10_000;

/// Script loading errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Script file could not be read.
    #[error("cannot read script: {0}")]
    Io(#[from] io::Error),

    /// Command word not recognized.
    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand {
        /// 1-based line number
        line: usize,
        /// Offending command
        command: String,
    },

    /// Key name not recognized.
    #[error("line {line}: unknown key '{name}'")]
    UnknownKey {
        /// 1-based line number
        line: usize,
        /// Offending key name
        name: String,
    },

    /// Command is missing its argument or has a malformed one.
    #[error("line {line}: {message}")]
    BadArgument {
        /// 1-based line number
        line: usize,
        /// What is wrong
        message: String,
    },
}

/// One step of playback, delivered per idle or frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Beat {
    /// Deliver these edges.
    Keys(Vec<KeyEdge>),
    /// Nothing happens.
    Quiet,
}

/// Parsed key script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    beats: VecDeque<Beat>,
}

impl Script {
    /// Parse script text.
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut beats = VecDeque::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (command, rest) = trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""));
            let rest = rest.trim();

            match command {
                "press" => {
                    if rest.is_empty() {
                        return Err(missing(line, "press needs at least one key"));
                    }
                    for name in rest.split_whitespace() {
                        let code = key(line, name)?;
                        beats.push_back(Beat::Keys(vec![KeyEdge::down(code), KeyEdge::up(code)]));
                    }
                },
                "down" => beats.push_back(Beat::Keys(vec![KeyEdge::down(key(line, rest)?)])),
                "up" => beats.push_back(Beat::Keys(vec![KeyEdge::up(key(line, rest)?)])),
                "type" => {
                    // Keep inner spaces; only the separator after `type` is dropped.
                    let text = raw.trim_start().get(command.len() + 1..).unwrap_or_default();
                    for ch in text.chars() {
                        beats.push_back(Beat::Keys(typed(line, ch)?));
                    }
                },
                "wait" => {
                    let count = if rest.is_empty() {
                        1
                    } else {
                        rest.parse().map_err(|_| missing(line, &format!("bad count '{rest}'")))?
                    };
                    if count > MAX_WAIT {
                        return Err(missing(line, &format!("wait longer than {MAX_WAIT}")));
                    }
                    beats.extend(std::iter::repeat_n(Beat::Quiet, count));
                },
                other => {
                    return Err(ScriptError::UnknownCommand { line, command: other.to_owned() });
                },
            }
        }
        Ok(Self { beats })
    }

    /// Read and parse a script file.
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Next beat, `None` once the script is over.
    pub fn next_beat(&mut self) -> Option<Beat> {
        self.beats.pop_front()
    }

    /// Beats left.
    pub fn len(&self) -> usize {
        self.beats.len()
    }

    /// True once every beat has been played.
    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }
}

fn missing(line: usize, message: &str) -> ScriptError {
    ScriptError::BadArgument { line, message: message.to_owned() }
}

fn key(line: usize, name: &str) -> Result<KeyCode, ScriptError> {
    if name.is_empty() {
        return Err(missing(line, "missing key name"));
    }
    KeyCode::from_name(name).ok_or_else(|| ScriptError::UnknownKey { line, name: name.to_owned() })
}

fn typed(line: usize, ch: char) -> Result<Vec<KeyEdge>, ScriptError> {
    let code = match ch {
        ' ' => KeyCode::KEY_SPACE,
        _ if ch.is_ascii_alphabetic() => key(line, &ch.to_ascii_lowercase().to_string())?,
        _ => return Err(missing(line, &format!("cannot type '{ch}'"))),
    };
    let tap = [KeyEdge::down(code), KeyEdge::up(code)];
    if ch.is_ascii_uppercase() {
        Ok([KeyEdge::down(KeyCode::KEY_SHIFT)]
            .into_iter()
            .chain(tap)
            .chain([KeyEdge::up(KeyCode::KEY_SHIFT)])
            .collect())
    } else {
        Ok(tap.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn commands_expand_to_beats() {
        let mut script = Script::parse(
            "# open the menu\n\
             press console.b down\n\
             wait 2\n\
             up start\n",
        )
        .unwrap();

        assert_eq!(script.len(), 5);
        assert_eq!(
            script.next_beat(),
            Some(Beat::Keys(vec![KeyEdge::down(KeyCode::BTN_B), KeyEdge::up(KeyCode::BTN_B)]))
        );
        assert!(matches!(script.next_beat(), Some(Beat::Keys(_))));
        assert_eq!(script.next_beat(), Some(Beat::Quiet));
        assert_eq!(script.next_beat(), Some(Beat::Quiet));
        assert_eq!(script.next_beat(), Some(Beat::Keys(vec![KeyEdge::up(KeyCode::BTN_START)])));
        assert!(script.is_empty());
    }

    #[test]
    fn type_keeps_spaces_and_shifts_capitals() {
        let mut script = Script::parse("type A b").unwrap();
        assert_eq!(script.len(), 3);
        assert_eq!(
            script.next_beat(),
            Some(Beat::Keys(vec![
                KeyEdge::down(KeyCode::KEY_SHIFT),
                KeyEdge::down(KeyCode::KEY_A),
                KeyEdge::up(KeyCode::KEY_A),
                KeyEdge::up(KeyCode::KEY_SHIFT),
            ]))
        );
        assert_eq!(
            script.next_beat(),
            Some(Beat::Keys(vec![KeyEdge::down(KeyCode::KEY_SPACE), KeyEdge::up(KeyCode::KEY_SPACE)]))
        );
    }

    #[test]
    fn errors_name_the_line() {
        let err = Script::parse("press start\njump a").unwrap_err();
        assert!(matches!(err, ScriptError::UnknownCommand { line: 2, .. }));

        let err = Script::parse("press nope").unwrap_err();
        assert!(matches!(err, ScriptError::UnknownKey { line: 1, .. }));

        let err = Script::parse("wait soon").unwrap_err();
        assert_eq!(err.to_string(), "line 1: bad count 'soon'");

        assert!(matches!(Script::parse("down").unwrap_err(), ScriptError::BadArgument { .. }));
        assert!(matches!(Script::parse("type 42").unwrap_err(), ScriptError::BadArgument { .. }));
    }

    proptest! {
        #[test]
        fn arbitrary_text_never_panics(text in "\\PC{0,200}") {
            let _ = Script::parse(&text);
        }

        #[test]
        fn typed_words_tap_every_letter(word in "[a-z ]{1,32}") {
            let script = Script::parse(&format!("type {word}")).unwrap();
            prop_assert_eq!(script.len(), word.chars().count());
        }
    }
}
