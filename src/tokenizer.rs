//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer is intentionally tiny – it knows nothing about semantics
//! beyond recognising keywords, literals and punctuation. Multi-character
//! operators are matched before single-character ones to avoid ambiguity.
//! A quoted string produces three tokens (`Quote`, `StringLiteral`, `Quote`)
//! so the parser can anchor diagnostics on either delimiter.

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Exit,
  Writeln,
  Mut,
  Const,
  Extern,
  True,
  False,
  Identifier,
  IntLiteral,
  FloatLiteral,
  StringLiteral,
  Quote,
  LParen,
  RParen,
  Semicolon,
  Assign,
  Equal,
  NotEqual,
  Less,
  Greater,
  Check,
  Plus,
  Minus,
  Star,
  Slash,
  Eof,
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  /// Convenience constructor to keep the `tokenize` loop readable.
  pub fn new(kind: TokenKind, loc: usize, len: usize) -> Self {
    Self { kind, loc, len }
  }
}

/// Map a keyword spelling to its token kind, if any.
fn keyword_kind(word: &str) -> Option<TokenKind> {
  match word {
    "exit" => Some(TokenKind::Exit),
    "writeln" => Some(TokenKind::Writeln),
    "mut" => Some(TokenKind::Mut),
    "const" => Some(TokenKind::Const),
    "extern" => Some(TokenKind::Extern),
    "true" => Some(TokenKind::True),
    "false" => Some(TokenKind::False),
    _ => None,
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_alphabetic() {
      let start = i;
      i += 1;
      while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
      }
      let word = &input[start..i];
      let kind = keyword_kind(word).unwrap_or(TokenKind::Identifier);
      tokens.push(Token::new(kind, start, i - start));
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let mut kind = TokenKind::IntLiteral;
      if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        kind = TokenKind::FloatLiteral;
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
          i += 1;
        }
      }
      tokens.push(Token::new(kind, start, i - start));
      continue;
    }

    if c == b'"' {
      tokens.push(Token::new(TokenKind::Quote, i, 1));
      i += 1;
      let start = i;
      while i < bytes.len() && bytes[i] != b'"' {
        i += 1;
      }
      if i >= bytes.len() {
        return Err(CompileError::lex_at(input, start, "closing quote not found"));
      }
      tokens.push(Token::new(TokenKind::StringLiteral, start, i - start));
      tokens.push(Token::new(TokenKind::Quote, i, 1));
      i += 1;
      continue;
    }

    if let Some((op, kind)) = [("==", TokenKind::Equal), ("!=", TokenKind::NotEqual)]
      .into_iter()
      .find(|(op, _)| input[i..].starts_with(op))
    {
      tokens.push(Token::new(kind, i, op.len()));
      i += op.len();
      continue;
    }

    let kind = match c {
      b'(' => Some(TokenKind::LParen),
      b')' => Some(TokenKind::RParen),
      b';' => Some(TokenKind::Semicolon),
      b'=' => Some(TokenKind::Assign),
      b'<' => Some(TokenKind::Less),
      b'>' => Some(TokenKind::Greater),
      b'?' => Some(TokenKind::Check),
      b'+' => Some(TokenKind::Plus),
      b'-' => Some(TokenKind::Minus),
      b'*' => Some(TokenKind::Star),
      b'/' => Some(TokenKind::Slash),
      _ => None,
    };
    if let Some(kind) = kind {
      tokens.push(Token::new(kind, i, 1));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::lex_at(
      input,
      i,
      format!("unexpected symbol: '{invalid_char}'"),
    ));
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0));
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}
