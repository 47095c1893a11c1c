//! Command and argument types produced by the line tokenizer

use std::fmt;

/// Argument letters understood by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
    E,
    F,
    S,
    I,
    J,
    K,
    R,
    P,
}

impl Axis {
    /// Case-insensitive lookup of an argument letter.
    pub fn from_letter(letter: char) -> Option<Axis> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            'E' => Some(Axis::E),
            'F' => Some(Axis::F),
            'S' => Some(Axis::S),
            'I' => Some(Axis::I),
            'J' => Some(Axis::J),
            'K' => Some(Axis::K),
            'R' => Some(Axis::R),
            'P' => Some(Axis::P),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
            Axis::E => 'E',
            Axis::F => 'F',
            Axis::S => 'S',
            Axis::I => 'I',
            Axis::J => 'J',
            Axis::K => 'K',
            Axis::R => 'R',
            Axis::P => 'P',
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Argument values of one command, keyed by [`Axis`].
///
/// Setting the same letter twice keeps the last value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Arguments {
    values: [Option<f64>; 11],
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        self.values[axis.index()] = Some(value);
    }

    pub fn get(&self, axis: Axis) -> Option<f64> {
        self.values[axis.index()]
    }

    pub fn contains(&self, axis: Axis) -> bool {
        self.get(axis).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// A `G`, `M` or `T` word as it appeared at the head of a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandCode {
    pub letter: char,
    pub number: f64,
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.number.fract() == 0.0 {
            write!(f, "{}{}", self.letter, self.number as i64)
        } else {
            write!(f, "{}{}", self.letter, self.number)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandKind {
    RapidMove,
    LinearMove,
    ArcCW,
    ArcCCW,
    Dwell,
    SetAbsolute,
    SetRelative,
    SetArcOffsetAbsolute,
    SetArcOffsetRelative,
    SetUnitsInch,
    SetUnitsMM,
    ToolSelect(u32),
    Other(CommandCode),
}

impl CommandKind {
    /// Maps a generic head word to its kind. Mode commands are only
    /// recognized as exact whole-line literals, so `G90`..`G21` found here
    /// fall through to `Other`.
    pub fn from_code(code: CommandCode) -> Self {
        match code.letter {
            'G' if code.number == 0.0 => CommandKind::RapidMove,
            'G' if code.number == 1.0 => CommandKind::LinearMove,
            'G' if code.number == 2.0 => CommandKind::ArcCW,
            'G' if code.number == 3.0 => CommandKind::ArcCCW,
            'G' if code.number == 4.0 => CommandKind::Dwell,
            'T' if code.number.fract() == 0.0 && code.number <= u32::MAX as f64 => {
                CommandKind::ToolSelect(code.number as u32)
            }
            _ => CommandKind::Other(code),
        }
    }

    /// `G0`..`G3`, the codes that stay modal for bare axis lines.
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            CommandKind::RapidMove | CommandKind::LinearMove | CommandKind::ArcCW | CommandKind::ArcCCW
        )
    }
}

/// One tokenized line. Consumed immediately by the estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub args: Arguments,
}

impl Command {
    pub fn new(kind: CommandKind) -> Self {
        Self { kind, args: Arguments::new() }
    }

    pub fn with_args(kind: CommandKind, args: Arguments) -> Self {
        Self { kind, args }
    }
}

/// A token whose letter was recognized but whose number was not.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedToken {
    pub letter: char,
    pub text: String,
}

/// Result of tokenizing one line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLine {
    pub command: Option<Command>,
    /// Argument words of a line that starts with one, e.g. `X20 Y10`.
    pub bare_args: Option<Arguments>,
    pub malformed: Vec<MalformedToken>,
}

impl ParsedLine {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        self.command.is_none() && self.bare_args.is_none() && self.malformed.is_empty()
    }
}
