//! Program file loader for `.ls8` sources.
//!
//! The format is line-oriented text:
//! - Each non-blank line carries one 8-character binary literal
//!   (e.g. `10000010`) for a single byte
//! - `#` starts a comment, inline or whole-line
//! - Blank and comment-only lines are skipped
//!
//! Bytes load into successive memory addresses starting at 0.

use crate::cpu::memory::Word;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// A loaded `.ls8` program.
#[derive(Debug, Clone)]
pub struct ProgramFile {
    /// The program bytes, in load order.
    pub bytes: Vec<Word>,
    /// Original source lines (for diagnostics).
    pub source_lines: Vec<String>,
}

impl ProgramFile {
    /// Create a new empty program.
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            source_lines: Vec::new(),
        }
    }

    /// Add a byte with its source line.
    pub fn push(&mut self, byte: Word, source: &str) {
        self.bytes.push(byte);
        self.source_lines.push(source.to_string());
    }

    /// Get the number of program bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Default for ProgramFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a `.ls8` program file from disk.
///
/// A missing file is reported as `FileNotFound` (the CLI maps it to
/// exit code 2); other I/O failures are `Io`.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<ProgramFile, LoaderError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoaderError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            LoaderError::Io(e.to_string())
        }
    })?;
    let reader = BufReader::new(file);

    let mut program = ProgramFile::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| LoaderError::Io(e.to_string()))?;

        if let Some(byte) = parse_line(&line, line_num + 1)? {
            program.push(byte, line.trim());
        }
    }

    Ok(program)
}

/// Parse `.ls8` source text into program bytes.
pub fn parse_program(source: &str) -> Result<Vec<Word>, LoaderError> {
    let mut bytes = Vec::new();

    for (line_num, line) in source.lines().enumerate() {
        if let Some(byte) = parse_line(line, line_num + 1)? {
            bytes.push(byte);
        }
    }

    Ok(bytes)
}

/// Parse one source line into a byte, or `None` for blank/comment lines.
fn parse_line(line: &str, line_num: usize) -> Result<Option<Word>, LoaderError> {
    // Strip an optional trailing comment.
    let code = line.split('#').next().unwrap_or("").trim();

    if code.is_empty() {
        return Ok(None);
    }

    if code.len() != 8 {
        return Err(LoaderError::Parse {
            line: line_num,
            message: format!("expected 8 binary digits, found {} characters", code.len()),
        });
    }

    let byte = Word::from_str_radix(code, 2).map_err(|_| LoaderError::Parse {
        line: line_num,
        message: format!("invalid binary literal `{}`", code),
    })?;

    Ok(Some(byte))
}

/// Errors that can occur while loading a program file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    #[error("{path} not found")]
    FileNotFound { path: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_program() {
        let source = "\
# Print the number 8
10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000

00000001 # HLT
";
        let bytes = parse_program(source).unwrap();
        assert_eq!(bytes, vec![0b10000010, 0, 8, 0b01000111, 0, 0b00000001]);
    }

    #[test]
    fn test_comment_only_and_blank_lines_skipped() {
        let bytes = parse_program("# nothing\n\n   \n# more nothing\n").unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_program("10000010\n1002\n").unwrap_err();
        assert_eq!(
            err,
            LoaderError::Parse {
                line: 2,
                message: "expected 8 binary digits, found 4 characters".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_digits() {
        let err = parse_program("10000012\n").unwrap_err();
        assert!(matches!(err, LoaderError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_program("no/such/program.ls8").unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound { .. }));
    }
}
