//! Single-pass parser / code generator.
//!
//! There is no syntax tree: each statement handler recognises its grammar and
//! emits IR as it goes, mirroring the classic cursor-driven design. The
//! compiler owns the token cursor for the whole compilation, keeps the symbol
//! environment up to date, and folds all arithmetic and every `?` comparison
//! at compile time – in this language every operand is a constant, so no
//! runtime compute instruction is ever needed.
//!
//! Every handler leaves the cursor one past its terminating `;` before
//! returning to the driver loop. There is no backtracking and no recovery:
//! the first error aborts the compilation.

use crate::error::{CompileError, CompileResult};
use crate::ir::{CallArg, IrModule, StrId};
use crate::symbols::{BoolValue, NumValue, Symbol, SymbolTable};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Consume the token stream and produce a complete IR module.
pub fn generate(tokens: Vec<Token>, source: &str, module_name: &str) -> CompileResult<IrModule> {
  let mut compiler = Compiler::new(tokens, source, module_name);
  compiler.run()?;
  Ok(compiler.module)
}

struct Compiler<'a> {
  stream: TokenStream<'a>,
  module: IrModule,
  symbols: SymbolTable,
  std_externed: bool,
}

impl<'a> Compiler<'a> {
  fn new(tokens: Vec<Token>, source: &'a str, module_name: &str) -> Self {
    Self {
      stream: TokenStream::new(tokens, source),
      module: IrModule::new(module_name),
      symbols: SymbolTable::new(),
      std_externed: false,
    }
  }

  fn run(&mut self) -> CompileResult<()> {
    while !self.stream.is_eof() {
      self.statement()?;
    }
    Ok(())
  }

  /// Dispatch on the statement's leading token. An unrecognised token here is
  /// a syntax error: stray tokens between statements are rejected, not
  /// skipped.
  fn statement(&mut self) -> CompileResult<()> {
    match self.stream.current_kind() {
      TokenKind::Extern => self.process_extern_std(),
      TokenKind::Exit => self.process_exit(),
      TokenKind::Writeln => self.process_writeln(),
      TokenKind::Mut => self.process_mut(),
      TokenKind::Const => self.process_const(),
      TokenKind::Identifier => self.process_assign(),
      _ => {
        let got = self.stream.describe_current();
        Err(self.stream.syntax_here(format!(
          "expected a statement, but got \"{got}\""
        )))
      }
    }
  }

  /// `extern std;` – declares the external variadic printf and unlocks
  /// writeln.
  fn process_extern_std(&mut self) -> CompileResult<()> {
    self.stream.advance();
    let name = self
      .stream
      .expect(TokenKind::Identifier, "expected 'std' after 'extern'")?;
    if name != "std" {
      return Err(self.stream.syntax_here(format!(
        "unknown extern '{name}'; only 'std' is available"
      )));
    }
    self
      .stream
      .expect(TokenKind::Semicolon, "expected ';' after 'extern std'")?;

    self.module.declare_printf();
    self.std_externed = true;
    Ok(())
  }

  /// `exit(expr);` – truncates the folded value toward zero and records it as
  /// the entry point's return value.
  fn process_exit(&mut self) -> CompileResult<()> {
    self.stream.advance();
    self
      .stream
      .expect(TokenKind::LParen, "expected '(' after 'exit'")?;

    if self.stream.current_kind() == TokenKind::Identifier
      && self.symbols.is_string(self.stream.current_text())
    {
      return Err(
        self
          .stream
          .semantic_here("exit argument cannot be a string"),
      );
    }

    let value = self.parse_expr()?;
    self
      .stream
      .expect(TokenKind::RParen, "expected ')' after exit value")?;
    self
      .stream
      .expect(TokenKind::Semicolon, "expected ';' after 'exit(..)'")?;

    self.module.set_ret(value.value as i64);
    Ok(())
  }

  /// `mut name = value;`
  fn process_mut(&mut self) -> CompileResult<()> {
    self.stream.advance();
    let name = self
      .stream
      .expect(TokenKind::Identifier, "expected identifier after 'mut'")?;

    if self.symbols.is_constant(&name) {
      return Err(self.stream.semantic_here(format!(
        "variable '{name}' is constant and cannot be reassigned"
      )));
    }

    self
      .stream
      .expect(TokenKind::Assign, "expected '=' after identifier")?;
    self.bind_value(&name)?;
    self
      .stream
      .expect(TokenKind::Semicolon, "expected ';' after declaration")?;
    Ok(())
  }

  /// `const name = value;` – like `mut`, but the name joins the constant set
  /// once the value is stored.
  fn process_const(&mut self) -> CompileResult<()> {
    self.stream.advance();
    let name = self
      .stream
      .expect(TokenKind::Identifier, "expected identifier after 'const'")?;

    if self.symbols.is_constant(&name) || self.symbols.is_numeric(&name) {
      return Err(
        self
          .stream
          .semantic_here(format!("redefinition of '{name}'")),
      );
    }

    self
      .stream
      .expect(TokenKind::Assign, "expected '=' after identifier")?;
    self.bind_value(&name)?;
    self.symbols.mark_constant(&name);
    self
      .stream
      .expect(TokenKind::Semicolon, "expected ';' after declaration")?;
    Ok(())
  }

  /// Right-hand side of a declaration: branch on the current token's category
  /// and install the matching kind entry under `name`.
  fn bind_value(&mut self, name: &str) -> CompileResult<()> {
    match self.stream.current_kind() {
      TokenKind::Check => self.process_check(name),
      TokenKind::Quote => {
        let text = self.read_string_literal()?;
        let id = self.module.add_global_string(&text);
        self.symbols.bind(name, Symbol::Str(id));
        Ok(())
      }
      TokenKind::True | TokenKind::False => {
        let id = self.read_bool_literal();
        self.symbols.bind(name, Symbol::Boolean(BoolValue(id)));
        Ok(())
      }
      TokenKind::Identifier if self.symbols.is_string(self.stream.current_text()) => {
        // alias: the new name references the same text constant
        let Some(Symbol::Str(id)) = self.symbols.lookup(self.stream.current_text()).copied()
        else {
          unreachable!("guard checked string kind");
        };
        self.symbols.bind(name, Symbol::Str(id));
        self.stream.advance();
        Ok(())
      }
      TokenKind::Identifier if self.symbols.is_boolean(self.stream.current_text()) => {
        let Some(Symbol::Boolean(value)) = self.symbols.lookup(self.stream.current_text()).copied()
        else {
          unreachable!("guard checked boolean kind");
        };
        self.symbols.bind(name, Symbol::Boolean(value));
        self.stream.advance();
        Ok(())
      }
      _ => {
        let value = self.parse_expr()?;
        self.symbols.bind(name, Symbol::Numeric(value));
        Ok(())
      }
    }
  }

  /// `name = value;` – plain re-assignment with full reclassification. The
  /// single deliberate exception: a string literal assigned to a name already
  /// of String kind rewrites every emitted use of the old constant to the new
  /// one, so the variable keeps its identity while its content changes.
  /// Numeric and Boolean entries are always rebound, never mutated in place.
  fn process_assign(&mut self) -> CompileResult<()> {
    let name = self.stream.current_text().to_string();

    if self.symbols.is_constant(&name) {
      return Err(self.stream.semantic_here(format!(
        "variable '{name}' is constant and cannot be reassigned"
      )));
    }
    if !self.symbols.is_bound(&name) {
      return Err(
        self
          .stream
          .semantic_here(format!("undefined identifier '{name}'")),
      );
    }

    self.stream.advance();
    self
      .stream
      .expect(TokenKind::Assign, "expected '=' after identifier")?;

    match self.stream.current_kind() {
      TokenKind::Check => self.process_check(&name)?,
      TokenKind::Quote => {
        let text = self.read_string_literal()?;
        let new_id = self.module.add_global_string(&text);
        if let Some(Symbol::Str(old_id)) = self.symbols.lookup(&name).copied() {
          self.module.replace_all_uses(old_id, new_id);
        }
        self.symbols.bind(&name, Symbol::Str(new_id));
      }
      TokenKind::True | TokenKind::False => {
        let id = self.read_bool_literal();
        self.symbols.bind(&name, Symbol::Boolean(BoolValue(id)));
      }
      TokenKind::Identifier if self.symbols.is_string(self.stream.current_text()) => {
        let Some(Symbol::Str(id)) = self.symbols.lookup(self.stream.current_text()).copied()
        else {
          unreachable!("guard checked string kind");
        };
        self.symbols.bind(&name, Symbol::Str(id));
        self.stream.advance();
      }
      TokenKind::Identifier if self.symbols.is_boolean(self.stream.current_text()) => {
        let Some(Symbol::Boolean(value)) = self.symbols.lookup(self.stream.current_text()).copied()
        else {
          unreachable!("guard checked boolean kind");
        };
        self.symbols.bind(&name, Symbol::Boolean(value));
        self.stream.advance();
      }
      _ => {
        let value = self.parse_expr()?;
        self.symbols.bind(&name, Symbol::Numeric(value));
      }
    }

    self
      .stream
      .expect(TokenKind::Semicolon, "expected ';' after assignment")?;
    Ok(())
  }

  /// `writeln(arg);` – exactly one argument; the format string is chosen by
  /// the argument's category. Requires the extern declaration.
  fn process_writeln(&mut self) -> CompileResult<()> {
    if !self.std_externed {
      return Err(
        self
          .stream
          .semantic_here("no std extern found; add 'extern std;' before 'writeln'"),
      );
    }

    self.stream.advance();
    self
      .stream
      .expect(TokenKind::LParen, "expected '(' after 'writeln'")?;

    match self.stream.current_kind() {
      TokenKind::Quote => {
        let text = self.read_string_literal()?;
        let format = self.module.add_global_string("%s\n");
        let literal = self.module.add_global_string(&text);
        self.module.emit_printf(format, CallArg::Str(literal));
      }
      kind @ (TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::LParen) => {
        // precision is picked off the leading literal's lexical flavor
        let format_text = if kind == TokenKind::IntLiteral {
          "%.0f\n"
        } else {
          "%.6f\n"
        };
        let format = self.module.add_global_string(format_text);
        let value = self.parse_expr()?;
        self.module.emit_printf(format, CallArg::Double(value.value));
      }
      TokenKind::True | TokenKind::False => {
        let literal = self.read_bool_literal();
        let format = self.module.add_global_string("%s\n");
        self.module.emit_printf(format, CallArg::Str(literal));
      }
      TokenKind::Identifier => {
        let name = self.stream.current_text();
        match self.symbols.lookup(name).copied() {
          Some(Symbol::Numeric(value)) => {
            let format_text = if value.is_floating() { "%lf\n" } else { "%.0f\n" };
            let format = self.module.add_global_string(format_text);
            self.module.emit_printf(format, CallArg::Double(value.value));
          }
          Some(Symbol::Str(id)) => {
            let format = self.module.add_global_string("%s\n");
            self.module.emit_printf(format, CallArg::Str(id));
          }
          Some(Symbol::Boolean(value)) => {
            let format = self.module.add_global_string("%s\n");
            self.module.emit_printf(format, CallArg::Str(value.constant()));
          }
          None => {
            return Err(
              self
                .stream
                .semantic_here(format!("undefined identifier '{name}'")),
            );
          }
        }
        self.stream.advance();
      }
      _ => {
        let got = self.stream.describe_current();
        return Err(self.stream.syntax_here(format!(
          "expected an argument to 'writeln', but got \"{got}\""
        )));
      }
    }

    self
      .stream
      .expect(TokenKind::RParen, "expected ')' after writeln argument")?;
    self
      .stream
      .expect(TokenKind::Semicolon, "expected ';' after 'writeln(..)'")?;
    Ok(())
  }

  /// The `?` comparison construct: both operands must be statically known, the
  /// comparison is folded now, and the boolean result is installed under
  /// `target`. No runtime compare is ever emitted. The target is evicted from
  /// its previous kind up front, whatever that kind was.
  fn process_check(&mut self, target: &str) -> CompileResult<()> {
    self.stream.advance();
    self.symbols.unbind(target);

    let result = match self.stream.current_kind() {
      TokenKind::IntLiteral | TokenKind::FloatLiteral | TokenKind::LParen => {
        self.check_numeric()?
      }
      TokenKind::Quote => {
        let left = self.read_string_literal()?;
        self.check_text(left, "string")?
      }
      TokenKind::True | TokenKind::False => {
        let left = self.stream.current_text().to_string();
        self.stream.advance();
        self.check_text(left, "boolean")?
      }
      TokenKind::Identifier => {
        let name = self.stream.current_text();
        match self.symbols.lookup(name).copied() {
          Some(Symbol::Numeric(_)) => self.check_numeric()?,
          Some(Symbol::Str(id)) => {
            let left = self.module.global_content(id).to_string();
            self.stream.advance();
            self.check_text(left, "string")?
          }
          Some(Symbol::Boolean(value)) => {
            let left = self.module.global_content(value.constant()).to_string();
            self.stream.advance();
            self.check_text(left, "boolean")?
          }
          None => {
            return Err(
              self
                .stream
                .semantic_here(format!("undefined identifier '{name}'")),
            );
          }
        }
      }
      _ => {
        let got = self.stream.describe_current();
        return Err(self.stream.syntax_here(format!(
          "unexpected token after '?': \"{got}\""
        )));
      }
    };

    let id = self
      .module
      .add_global_string(if result { "true" } else { "false" });
    self.symbols.bind(target, Symbol::Boolean(BoolValue(id)));
    Ok(())
  }

  /// Numeric comparison arm: `== != < >` over two folded f64 values. Equality
  /// is bitwise; ordering is the standard float comparison.
  fn check_numeric(&mut self) -> CompileResult<bool> {
    let left = self.parse_expr()?;

    let op = self.stream.current_kind();
    if !matches!(
      op,
      TokenKind::Equal | TokenKind::NotEqual | TokenKind::Less | TokenKind::Greater
    ) {
      let got = self.stream.describe_current();
      return Err(self.stream.syntax_here(format!(
        "expected comparison operator, but got \"{got}\""
      )));
    }
    self.stream.advance();

    let right = self.parse_expr()?;

    Ok(match op {
      TokenKind::Equal => left.value.to_bits() == right.value.to_bits(),
      TokenKind::NotEqual => left.value.to_bits() != right.value.to_bits(),
      TokenKind::Less => left.value < right.value,
      TokenKind::Greater => left.value > right.value,
      _ => unreachable!("operator checked above"),
    })
  }

  /// String/boolean comparison arm: `==`/`!=` over the byte content of the
  /// two referenced constants. `category` only flavors the diagnostics.
  fn check_text(&mut self, left: String, category: &str) -> CompileResult<bool> {
    let op = self.stream.current_kind();
    if !matches!(op, TokenKind::Equal | TokenKind::NotEqual) {
      let got = self.stream.describe_current();
      return Err(self.stream.syntax_here(format!(
        "{category} operands can only be compared with '==' or '!=', but got \"{got}\""
      )));
    }
    self.stream.advance();

    let right = match self.stream.current_kind() {
      TokenKind::Quote if category == "string" => self.read_string_literal()?,
      TokenKind::True | TokenKind::False if category == "boolean" => {
        let text = self.stream.current_text().to_string();
        self.stream.advance();
        text
      }
      TokenKind::Identifier if category == "string" => {
        let name = self.stream.current_text();
        let Some(Symbol::Str(id)) = self.symbols.lookup(name).copied() else {
          return Err(self.stream.semantic_here(format!(
            "'{name}' is not a string variable"
          )));
        };
        self.stream.advance();
        self.module.global_content(id).to_string()
      }
      TokenKind::Identifier if category == "boolean" => {
        let name = self.stream.current_text();
        let Some(Symbol::Boolean(value)) = self.symbols.lookup(name).copied() else {
          return Err(self.stream.semantic_here(format!(
            "'{name}' is not a boolean variable"
          )));
        };
        self.stream.advance();
        self.module.global_content(value.constant()).to_string()
      }
      _ => {
        let got = self.stream.describe_current();
        return Err(self.stream.syntax_here(format!(
          "expected a {category} operand, but got \"{got}\""
        )));
      }
    };

    let equal = left == right;
    Ok(if op == TokenKind::NotEqual { !equal } else { equal })
  }

  // expr := term (('+' | '-') term)*
  fn parse_expr(&mut self) -> CompileResult<NumValue> {
    let mut value = self.parse_term()?;

    loop {
      match self.stream.current_kind() {
        TokenKind::Plus => {
          self.stream.advance();
          let rhs = self.parse_term()?;
          value = NumValue::new(value.value + rhs.value, value.is_float || rhs.is_float);
        }
        TokenKind::Minus => {
          self.stream.advance();
          let rhs = self.parse_term()?;
          value = NumValue::new(value.value - rhs.value, value.is_float || rhs.is_float);
        }
        _ => break,
      }
    }

    Ok(value)
  }

  // term := factor (('*' | '/') factor)*
  fn parse_term(&mut self) -> CompileResult<NumValue> {
    let mut value = self.parse_factor()?;

    loop {
      match self.stream.current_kind() {
        TokenKind::Star => {
          self.stream.advance();
          let rhs = self.parse_factor()?;
          value = NumValue::new(value.value * rhs.value, value.is_float || rhs.is_float);
        }
        TokenKind::Slash => {
          self.stream.advance();
          let rhs = self.parse_factor()?;
          value = NumValue::new(value.value / rhs.value, value.is_float || rhs.is_float);
        }
        _ => break,
      }
    }

    Ok(value)
  }

  // factor := '(' expr ')' | IntLiteral | FloatLiteral | numeric identifier
  fn parse_factor(&mut self) -> CompileResult<NumValue> {
    match self.stream.current_kind() {
      TokenKind::LParen => {
        self.stream.advance();
        let value = self.parse_expr()?;
        self
          .stream
          .expect(TokenKind::RParen, "expected ')' after expression")?;
        Ok(value)
      }
      kind @ (TokenKind::IntLiteral | TokenKind::FloatLiteral) => {
        let text = self.stream.current_text();
        let value = text.parse::<f64>().map_err(|err| {
          self
            .stream
            .syntax_here(format!("invalid number '{text}': {err}"))
        })?;
        self.stream.advance();
        Ok(NumValue::new(value, kind == TokenKind::FloatLiteral))
      }
      TokenKind::Identifier => {
        let name = self.stream.current_text();
        match self.symbols.lookup(name).copied() {
          Some(Symbol::Numeric(value)) => {
            self.stream.advance();
            Ok(value)
          }
          Some(_) => Err(self.stream.semantic_here(format!(
            "identifier '{name}' is not numeric"
          ))),
          None => Err(
            self
              .stream
              .semantic_here(format!("undefined identifier '{name}'")),
          ),
        }
      }
      _ => {
        let got = self.stream.describe_current();
        Err(self.stream.syntax_here(format!(
          "expected a number, identifier or '(', but got \"{got}\""
        )))
      }
    }
  }

  /// Quote, StringLiteral, Quote → the literal's raw text.
  fn read_string_literal(&mut self) -> CompileResult<String> {
    self
      .stream
      .expect(TokenKind::Quote, "expected '\"' before string literal")?;
    if self.stream.current_kind() != TokenKind::StringLiteral {
      let got = self.stream.describe_current();
      return Err(self.stream.syntax_here(format!(
        "expected string literal after '\"', but got \"{got}\""
      )));
    }
    let text = self.stream.current_text().to_string();
    self.stream.advance();
    self
      .stream
      .expect(TokenKind::Quote, "expected '\"' after string literal")?;
    Ok(text)
  }

  /// Consume a `true`/`false` token and emit its spelling as a text constant.
  fn read_bool_literal(&mut self) -> StrId {
    let spelling = self.stream.current_text().to_string();
    self.stream.advance();
    self.module.add_global_string(&spelling)
  }
}

/// Lightweight cursor over the token vector. The sole shared mutable resource
/// of the pipeline; advancing is the only mutation.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn current(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn current_kind(&self) -> TokenKind {
    self.current().map_or(TokenKind::Eof, |token| token.kind)
  }

  fn current_text(&self) -> &'a str {
    self
      .current()
      .map_or("", |token| token_text(token, self.source))
  }

  fn current_loc(&self) -> usize {
    self.current().map_or(self.source.len(), |token| token.loc)
  }

  fn advance(&mut self) {
    if self.pos < self.tokens.len() {
      self.pos += 1;
    }
  }

  fn is_eof(&self) -> bool {
    matches!(self.current_kind(), TokenKind::Eof)
  }

  /// Require the current token to be of `kind`: return its text and advance,
  /// or fail with a syntax error anchored at the token.
  fn expect(&mut self, kind: TokenKind, message: &str) -> CompileResult<String> {
    if self.current_kind() == kind {
      let text = self.current_text().to_string();
      self.advance();
      Ok(text)
    } else {
      let got = self.describe_current();
      Err(self.syntax_here(format!("{message}, but got \"{got}\"")))
    }
  }

  fn describe_current(&self) -> String {
    describe_token(self.current(), self.source)
  }

  fn syntax_here(&self, message: impl Into<String>) -> CompileError {
    CompileError::syntax_at(self.source, self.current_loc(), message)
  }

  fn semantic_here(&self, message: impl Into<String>) -> CompileError {
    CompileError::semantic_at(self.source, self.current_loc(), message)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::tokenize;

  fn compile(source: &str) -> CompileResult<IrModule> {
    generate(tokenize(source)?, source, "test")
  }

  fn compiler_for(source: &str) -> Compiler<'_> {
    Compiler::new(tokenize(source).unwrap(), source, "test")
  }

  #[test]
  fn exit_truncates_toward_zero() {
    let module = compile("mut x = 7.9; exit(x);").unwrap();
    assert_eq!(module.ret(), Some(7));

    let module = compile("exit(0-3.7);").unwrap();
    assert_eq!(module.ret(), Some(-3));

    let module = compile("mut x = 5; exit(x);").unwrap();
    assert_eq!(module.ret(), Some(5));
  }

  #[test]
  fn arithmetic_uses_one_precedence_table() {
    let module = compile("exit(2+3*4);").unwrap();
    assert_eq!(module.ret(), Some(14));

    let module = compile("exit((2+3)*4);").unwrap();
    assert_eq!(module.ret(), Some(20));

    let module = compile("mut x = 10; exit(x/4*2);").unwrap();
    assert_eq!(module.ret(), Some(5));
  }

  #[test]
  fn constant_reassignment_fails_and_keeps_the_value() {
    let mut compiler = compiler_for("const x = 5; x = 6;");
    compiler.statement().unwrap();

    let err = compiler.statement().unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }));
    assert!(err.to_string().contains("constant and cannot be reassigned"));
    assert_eq!(
      compiler.symbols.lookup("x"),
      Some(&Symbol::Numeric(NumValue::new(5.0, false)))
    );
  }

  #[test]
  fn const_rejects_numeric_redefinition() {
    let err = compile("mut x = 1; const x = 2;").unwrap_err();
    assert!(err.to_string().contains("redefinition of 'x'"));

    let err = compile("const k = 1; const k = 2;").unwrap_err();
    assert!(err.to_string().contains("redefinition of 'k'"));
  }

  #[test]
  fn mut_cannot_shadow_a_constant() {
    let err = compile("const k = 1; mut k = 2;").unwrap_err();
    assert!(err.to_string().contains("constant and cannot be reassigned"));
  }

  #[test]
  fn string_reassignment_replaces_uses_in_place() {
    let source = "extern std; mut s = \"hi\"; writeln(s); s = \"bye\";";
    let module = compile(source).unwrap();
    let ir = module.render();

    // globals: .str "hi", .str.1 "%s\n", .str.2 "bye"
    assert!(ir.contains("@.str.2 = private unnamed_addr constant [4 x i8] c\"bye\\00\""));
    // the call emitted before the reassignment now references the new constant
    assert!(ir.contains("@printf(ptr @.str.1, ptr @.str.2)"));
    assert!(module.verify().is_empty());
  }

  #[test]
  fn numeric_reassignment_rebinds_without_rewriting() {
    let mut compiler = compiler_for("mut x = 1; x = 2;");
    compiler.statement().unwrap();
    compiler.statement().unwrap();
    assert_eq!(
      compiler.symbols.lookup("x"),
      Some(&Symbol::Numeric(NumValue::new(2.0, false)))
    );
  }

  #[test]
  fn reassignment_reclassifies_kinds() {
    let mut compiler = compiler_for("mut x = 5; x = \"s\"; x = true; x = 1+1;");
    compiler.statement().unwrap();
    compiler.statement().unwrap();
    assert!(compiler.symbols.is_string("x"));
    compiler.statement().unwrap();
    assert!(compiler.symbols.is_boolean("x"));
    compiler.statement().unwrap();
    assert!(compiler.symbols.is_numeric("x"));
  }

  #[test]
  fn assignment_to_undefined_identifier_fails() {
    let err = compile("x = 5;").unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }));
    assert!(err.to_string().contains("undefined identifier 'x'"));
  }

  #[test]
  fn check_folds_numeric_equality_to_true() {
    let source = "extern std; mut a = ? 1 == 1; writeln(a);";
    let module = compile(source).unwrap();
    let ir = module.render();

    assert!(ir.contains("c\"true\\00\""));
    // the writeln argument is the folded "true" constant
    assert!(ir.contains("@printf(ptr @.str.1, ptr @.str)"));
    assert!(module.verify().is_empty());
  }

  #[test]
  fn check_numeric_operators_fold_correctly() {
    let cases = [
      ("mut a = ? 5+2 == 10.5;", false),
      ("mut a = ? 5+2 != 10.5;", true),
      ("mut a = ? 1 < 2;", true),
      ("mut a = ? 1 > 2;", false),
      ("mut a = ? 2*3 == 6;", true),
    ];
    for (source, expected) in cases {
      let mut compiler = compiler_for(source);
      compiler.statement().unwrap();
      let Some(&Symbol::Boolean(value)) = compiler.symbols.lookup("a") else {
        panic!("'a' should be boolean for {source}");
      };
      let content = compiler.module.global_content(value.constant());
      assert_eq!(content, if expected { "true" } else { "false" }, "{source}");
    }
  }

  #[test]
  fn check_compares_strings_by_content() {
    let mut compiler =
      compiler_for("mut s = \"hi\"; mut a = ? s == \"hi\"; mut b = ? \"x\" != \"y\";");
    compiler.statement().unwrap();
    compiler.statement().unwrap();
    compiler.statement().unwrap();

    for (name, expected) in [("a", "true"), ("b", "true")] {
      let Some(&Symbol::Boolean(value)) = compiler.symbols.lookup(name) else {
        panic!("'{name}' should be boolean");
      };
      assert_eq!(compiler.module.global_content(value.constant()), expected);
    }
  }

  #[test]
  fn check_compares_booleans_by_content() {
    let mut compiler = compiler_for("mut t = true; mut a = ? t == true; mut b = ? t != false;");
    compiler.statement().unwrap();
    compiler.statement().unwrap();
    compiler.statement().unwrap();

    for name in ["a", "b"] {
      let Some(&Symbol::Boolean(value)) = compiler.symbols.lookup(name) else {
        panic!("'{name}' should be boolean");
      };
      assert_eq!(compiler.module.global_content(value.constant()), "true");
    }
  }

  #[test]
  fn check_rejects_ordering_on_strings() {
    let err = compile("mut a = ? \"x\" < \"y\";").unwrap_err();
    assert!(matches!(err, CompileError::Syntax { .. }));
    assert!(err.to_string().contains("'==' or '!='"));
  }

  #[test]
  fn check_rejects_undefined_operands() {
    let err = compile("mut a = ? ghost == 1;").unwrap_err();
    assert!(err.to_string().contains("undefined identifier 'ghost'"));
  }

  #[test]
  fn check_overwrites_any_previous_kind() {
    let mut compiler = compiler_for("mut a = \"text\"; a = ? 1 == 2;");
    compiler.statement().unwrap();
    compiler.statement().unwrap();
    let Some(&Symbol::Boolean(value)) = compiler.symbols.lookup("a") else {
      panic!("'a' should be boolean after check");
    };
    assert_eq!(compiler.module.global_content(value.constant()), "false");
  }

  #[test]
  fn writeln_before_extern_emits_nothing() {
    let mut compiler = compiler_for("writeln(\"x\");");
    let err = compiler.statement().unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }));
    assert!(err.to_string().contains("no std extern"));
    assert!(compiler.module.calls().is_empty());
  }

  #[test]
  fn writeln_formats_follow_argument_category() {
    let source = "extern std;\n\
                  writeln(\"hi\");\n\
                  writeln(4);\n\
                  writeln(4.0);\n\
                  writeln(true);\n";
    let module = compile(source).unwrap();
    let ir = module.render();
    assert!(ir.contains("c\"%s\\0A\\00\""));
    assert!(ir.contains("c\"%.0f\\0A\\00\""));
    assert!(ir.contains("c\"%.6f\\0A\\00\""));
    assert_eq!(module.calls().len(), 4);
    assert!(module.verify().is_empty());
  }

  #[test]
  fn writeln_identifier_format_tracks_stored_kind() {
    let source = "extern std; mut x = 2.5; writeln(x); mut y = 3; writeln(y);";
    let module = compile(source).unwrap();
    let ir = module.render();
    assert!(ir.contains("c\"%lf\\0A\\00\""));
    assert!(ir.contains("c\"%.0f\\0A\\00\""));
  }

  #[test]
  fn writeln_undefined_identifier_fails() {
    let err = compile("extern std; writeln(ghost);").unwrap_err();
    assert!(err.to_string().contains("undefined identifier 'ghost'"));
  }

  #[test]
  fn exit_rejects_string_argument() {
    let err = compile("mut s = \"hi\"; exit(s);").unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }));
    assert!(err.to_string().contains("cannot be a string"));
  }

  #[test]
  fn declarations_alias_string_and_boolean_variables() {
    let mut compiler = compiler_for("mut s = \"hi\"; mut t = s; mut b = true; const c = b;");
    for _ in 0..4 {
      compiler.statement().unwrap();
    }
    let (Some(&Symbol::Str(s)), Some(&Symbol::Str(t))) =
      (compiler.symbols.lookup("s"), compiler.symbols.lookup("t"))
    else {
      panic!("both should be strings");
    };
    assert_eq!(s, t);
    assert!(compiler.symbols.is_boolean("c"));
    assert!(compiler.symbols.is_constant("c"));
  }

  #[test]
  fn stray_statement_token_is_rejected() {
    let err = compile("exit(0); ;").unwrap_err();
    assert!(matches!(err, CompileError::Syntax { .. }));
    assert!(err.to_string().contains("expected a statement"));
  }

  #[test]
  fn extern_requires_the_std_name() {
    let err = compile("extern foo;").unwrap_err();
    assert!(err.to_string().contains("unknown extern 'foo'"));
  }

  #[test]
  fn missing_semicolon_is_a_syntax_error() {
    let err = compile("mut x = 1").unwrap_err();
    assert!(matches!(err, CompileError::Syntax { .. }));
    assert!(err.to_string().contains("expected ';'"));
  }

  #[test]
  fn first_exit_wins() {
    let module = compile("exit(3); exit(9);").unwrap();
    assert_eq!(module.ret(), Some(3));
  }

  #[test]
  fn module_without_exit_returns_zero() {
    let module = compile("mut x = 1;").unwrap();
    assert_eq!(module.ret(), None);
    assert!(module.render().contains("ret i64 0"));
  }
}
