//! Line normalizer and tokenizer.
//!
//! Each line goes through two stages: [`normalize_line`] strips comments and
//! whitespace, then [`parse_line`] first checks the whole line against the
//! exact mode literals and only then falls back to a generic word scan.

use std::borrow::Cow;

use super::types::{Arguments, Axis, Command, CommandCode, CommandKind, MalformedToken, ParsedLine};

/// Whole-line mode literals, checked before the generic scan.
const MODE_LITERALS: [(&str, CommandKind); 6] = [
    ("G90", CommandKind::SetAbsolute),
    ("G91", CommandKind::SetRelative),
    ("G90.1", CommandKind::SetArcOffsetAbsolute),
    ("G91.1", CommandKind::SetArcOffsetRelative),
    ("G20", CommandKind::SetUnitsInch),
    ("G21", CommandKind::SetUnitsMM),
];

/// Removes `( ... )` comments and anything after `;`, then trims.
///
/// A `(` without a closing `)` is kept as text. Lines without comment
/// characters are returned borrowed.
pub fn normalize_line(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim();
    if !trimmed.contains(['(', ';']) {
        return Cow::Borrowed(trimmed);
    }

    let bytes = trimmed.as_bytes();
    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut pos = 0;
    let mut kept_from = 0;
    while pos < len {
        match bytes[pos] {
            b';' => {
                out.push_str(&trimmed[kept_from..pos]);
                kept_from = len;
                break;
            }
            b'(' => match trimmed[pos + 1..].find(')') {
                Some(close) => {
                    out.push_str(&trimmed[kept_from..pos]);
                    pos += close + 2;
                    kept_from = pos;
                }
                None => pos += 1,
            },
            _ => pos += 1,
        }
    }
    if kept_from < len {
        out.push_str(&trimmed[kept_from..]);
    }
    Cow::Owned(out.trim().to_string())
}

/// Raw token found by the scanner, borrowing its number text from the line.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Code { letter: char, number: &'a str },
    Word { axis: Axis, number: &'a str },
}

/// Returns the end of a run of `[0-9.]` starting at `start`.
fn number_run_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    end
}

/// Left-to-right word scan. Characters that do not start a token are skipped.
fn scan_tokens(text: &str) -> Vec<Token<'_>> {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < len {
        let c = bytes[pos].to_ascii_uppercase();
        if matches!(c, b'G' | b'M' | b'T') {
            let end = number_run_end(bytes, pos + 1);
            if end > pos + 1 {
                tokens.push(Token::Code { letter: c as char, number: &text[pos + 1..end] });
                pos = end;
                continue;
            }
        }
        if let Some(axis) = Axis::from_letter(c as char) {
            let mut digits_from = pos + 1;
            if digits_from < len && matches!(bytes[digits_from], b'+' | b'-') {
                digits_from += 1;
            }
            let end = number_run_end(bytes, digits_from);
            if end > digits_from {
                tokens.push(Token::Word { axis, number: &text[pos + 1..end] });
                pos = end;
                continue;
            }
        }
        pos += 1;
    }
    tokens
}

fn parse_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Matches a normalized line against the exact mode literals.
pub fn match_mode_literal(line: &str) -> Option<CommandKind> {
    MODE_LITERALS
        .iter()
        .find(|(literal, _)| line.eq_ignore_ascii_case(literal))
        .map(|(_, kind)| *kind)
}

/// Collects the argument words of `tokens`; head words are skipped.
fn collect_args(tokens: &[Token<'_>], malformed: &mut Vec<MalformedToken>) -> Arguments {
    let mut args = Arguments::new();
    for token in tokens {
        if let Token::Word { axis, number } = token {
            match parse_number(number) {
                Some(value) => args.set(*axis, value),
                None => malformed.push(MalformedToken {
                    letter: axis.letter(),
                    text: number.to_string(),
                }),
            }
        }
    }
    args
}

/// Tokenizes an already normalized line.
///
/// The first token must be a `G`/`M`/`T` word for the line to produce a
/// command; later head words are ignored. A line that opens with an argument
/// word yields no command, only [`ParsedLine::bare_args`]. Argument tokens
/// whose number does not parse are reported in [`ParsedLine::malformed`] and
/// dropped.
pub fn tokenize(line: &str) -> ParsedLine {
    if line.is_empty() {
        return ParsedLine::empty();
    }
    if let Some(kind) = match_mode_literal(line) {
        return ParsedLine { command: Some(Command::new(kind)), ..ParsedLine::empty() };
    }

    let tokens = scan_tokens(line);
    let mut parsed = ParsedLine::empty();
    let (letter, number) = match tokens.first() {
        Some(Token::Code { letter, number }) => (*letter, *number),
        Some(Token::Word { .. }) => {
            parsed.bare_args = Some(collect_args(&tokens, &mut parsed.malformed));
            return parsed;
        }
        None => return parsed,
    };

    let code = match parse_number(number) {
        Some(value) => CommandCode { letter, number: value },
        None => {
            parsed.malformed.push(MalformedToken { letter, text: number.to_string() });
            return parsed;
        }
    };

    let args = collect_args(&tokens[1..], &mut parsed.malformed);
    parsed.command = Some(Command::with_args(CommandKind::from_code(code), args));
    parsed
}

/// Normalizes and tokenizes one raw input line.
pub fn parse_line(raw: &str) -> ParsedLine {
    tokenize(&normalize_line(raw))
}
