//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics are kept lightweight on purpose – each one carries a message
//! plus the offending source line with a caret pointing at the byte where the
//! problem was observed. The first error always wins: handlers return it up
//! through `?` and the driver prints one line and exits.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CompileError {
  #[snafu(display("usage: {program} <input.dust>"))]
  Usage { program: String },

  #[snafu(display("cannot read '{path}': {source}"))]
  Input {
    path: String,
    source: std::io::Error,
  },

  #[snafu(display("lex error: {message}\n{context_line}\n{marker}"))]
  Lex {
    message: String,
    context_line: String,
    marker: String,
  },

  #[snafu(display("syntax error: {message}\n{context_line}\n{marker}"))]
  Syntax {
    message: String,
    context_line: String,
    marker: String,
  },

  #[snafu(display("semantic error: {message}\n{context_line}\n{marker}"))]
  Semantic {
    message: String,
    context_line: String,
    marker: String,
  },

  #[snafu(display("toolchain error: {message}"))]
  Toolchain { message: String },
}

impl CompileError {
  /// Construct a lex error anchored at a byte offset in the source.
  pub fn lex_at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let (context_line, marker) = anchor(source, loc);
    Self::Lex {
      message: message.into(),
      context_line,
      marker,
    }
  }

  /// Construct a syntax error anchored at a byte offset in the source.
  pub fn syntax_at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let (context_line, marker) = anchor(source, loc);
    Self::Syntax {
      message: message.into(),
      context_line,
      marker,
    }
  }

  /// Construct a semantic error anchored at a byte offset in the source.
  pub fn semantic_at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let (context_line, marker) = anchor(source, loc);
    Self::Semantic {
      message: message.into(),
      context_line,
      marker,
    }
  }

  pub fn toolchain(message: impl Into<String>) -> Self {
    Self::Toolchain {
      message: message.into(),
    }
  }
}

/// Extract the line containing `loc` and a caret marker pointing at it.
fn anchor(source: &str, loc: usize) -> (String, String) {
  let safe_loc = loc.min(source.len());
  let line_start = source[..safe_loc].rfind('\n').map_or(0, |i| i + 1);
  let line_end = source[safe_loc..]
    .find('\n')
    .map_or(source.len(), |i| safe_loc + i);
  let line = &source[line_start..line_end];
  let context_line = format!("'{line}'");
  let char_offset = source[line_start..safe_loc].chars().count() + 1; // account for opening quote
  let marker = format!("{}^", " ".repeat(char_offset));
  (context_line, marker)
}
