// src/gcode/mod.rs - Line normalizer and tokenizer
pub mod parser;
pub mod types;


pub use parser::{normalize_line, parse_line, tokenize};
pub use types::{Arguments, Axis, Command, CommandCode, CommandKind, MalformedToken, ParsedLine};
