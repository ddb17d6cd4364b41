//! Textual LLVM IR module model.
//!
//! The code generator never builds instructions the language cannot express:
//! arithmetic and comparisons fold to constants during parsing, so the
//! emitted module is a pool of global string constants, a sequence of
//! `printf` calls inside `main`, and one `ret`. Keeping the calls structured
//! (instead of appending raw text) is what makes `replace_all_uses` possible,
//! which backs the string replace-in-place assignment contract.

use std::fmt::Write as _;

/// Handle to a global string constant owned by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrId(usize);

/// Argument passed to `printf` after the format string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallArg {
  Str(StrId),
  Double(f64),
}

/// One `printf(format, arg)` call in emission order.
#[derive(Debug, Clone, Copy)]
pub struct PrintfCall {
  pub format: StrId,
  pub arg: CallArg,
}

/// A complete module: globals, optional printf declaration, `main` body.
#[derive(Debug, Clone)]
pub struct IrModule {
  name: String,
  globals: Vec<String>,
  printf_declared: bool,
  calls: Vec<PrintfCall>,
  ret: Option<i64>,
}

impl IrModule {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      globals: Vec::new(),
      printf_declared: false,
      calls: Vec::new(),
      ret: None,
    }
  }

  /// Emit a new immutable text constant and return its handle. Constants are
  /// never interned; each call mints a fresh global, matching LLVM's
  /// `CreateGlobalStringPtr`.
  pub fn add_global_string(&mut self, content: &str) -> StrId {
    self.globals.push(content.to_string());
    StrId(self.globals.len() - 1)
  }

  pub fn global_content(&self, id: StrId) -> &str {
    &self.globals[id.0]
  }

  /// Declare the external variadic `printf`. Idempotent.
  pub fn declare_printf(&mut self) {
    self.printf_declared = true;
  }

  pub fn printf_declared(&self) -> bool {
    self.printf_declared
  }

  pub fn emit_printf(&mut self, format: StrId, arg: CallArg) {
    self.calls.push(PrintfCall { format, arg });
  }

  pub fn calls(&self) -> &[PrintfCall] {
    &self.calls
  }

  /// Record the entry point's return value. The first recorded value wins;
  /// at runtime the generated program never executes past its first exit.
  pub fn set_ret(&mut self, value: i64) {
    if self.ret.is_none() {
      self.ret = Some(value);
    }
  }

  pub fn ret(&self) -> Option<i64> {
    self.ret
  }

  /// Rewrite every emitted use of `old` to reference `new`. The old global
  /// stays in the module, exactly as LLVM's replaceAllUsesWith leaves the
  /// replaced constant behind.
  pub fn replace_all_uses(&mut self, old: StrId, new: StrId) {
    for call in &mut self.calls {
      if call.format == old {
        call.format = new;
      }
      if call.arg == CallArg::Str(old) {
        call.arg = CallArg::Str(new);
      }
    }
  }

  /// Render the module as LLVM IR text (opaque-pointer syntax).
  pub fn render(&self) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "; ModuleID = '{}'", self.name);
    let _ = writeln!(out, "source_filename = \"{}\"", self.name);
    out.push('\n');

    for (index, content) in self.globals.iter().enumerate() {
      let _ = writeln!(
        out,
        "@{} = private unnamed_addr constant [{} x i8] c\"{}\\00\", align 1",
        global_name(index),
        content.len() + 1,
        escape_bytes(content),
      );
    }
    if !self.globals.is_empty() {
      out.push('\n');
    }

    if self.printf_declared {
      out.push_str("declare i32 @printf(ptr, ...)\n\n");
    }

    out.push_str("define i64 @main() {\n");
    out.push_str("entry:\n");
    for (index, call) in self.calls.iter().enumerate() {
      let arg = match call.arg {
        CallArg::Str(id) => format!("ptr @{}", global_name(id.0)),
        CallArg::Double(value) => format!("double {}", format_double(value)),
      };
      let _ = writeln!(
        out,
        "  %{index} = call i32 (ptr, ...) @printf(ptr @{}, {arg})",
        global_name(call.format.0),
      );
    }
    let _ = writeln!(out, "  ret i64 {}", self.ret.unwrap_or(0));
    out.push_str("}\n");

    out
  }

  /// Structural verification: a clean compile must report zero findings.
  pub fn verify(&self) -> Vec<String> {
    let mut findings = Vec::new();

    if !self.calls.is_empty() && !self.printf_declared {
      findings.push("printf called but never declared".to_string());
    }

    for (index, call) in self.calls.iter().enumerate() {
      if call.format.0 >= self.globals.len() {
        findings.push(format!("call {index}: format references undefined global"));
      }
      if let CallArg::Str(id) = call.arg
        && id.0 >= self.globals.len()
      {
        findings.push(format!("call {index}: argument references undefined global"));
      }
    }

    findings
  }
}

fn global_name(index: usize) -> String {
  if index == 0 {
    ".str".to_string()
  } else {
    format!(".str.{index}")
  }
}

/// LLVM constant-double spelling. The hexadecimal bit-pattern form is always
/// exact, which matters for the bitwise equality contract.
fn format_double(value: f64) -> String {
  format!("0x{:016X}", value.to_bits())
}

/// Escape string bytes for a `c"…"` constant initializer.
fn escape_bytes(content: &str) -> String {
  let mut out = String::new();
  for byte in content.bytes() {
    match byte {
      b'"' | b'\\' => {
        let _ = write!(out, "\\{byte:02X}");
      }
      0x20..=0x7E => out.push(byte as char),
      _ => {
        let _ = write!(out, "\\{byte:02X}");
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_globals_with_nul_terminator_and_length() {
    let mut module = IrModule::new("prog");
    module.add_global_string("hi");
    let ir = module.render();
    assert!(ir.contains("@.str = private unnamed_addr constant [3 x i8] c\"hi\\00\", align 1"));
  }

  #[test]
  fn escapes_non_printable_bytes() {
    assert_eq!(escape_bytes("%s\n"), "%s\\0A");
    assert_eq!(escape_bytes("say \"hi\""), "say \\22hi\\22");
    assert_eq!(escape_bytes("back\\slash"), "back\\5Cslash");
  }

  #[test]
  fn doubles_render_as_exact_bit_patterns() {
    assert_eq!(format_double(5.0), "0x4014000000000000");
    assert_eq!(format_double(10.5), "0x4025000000000000");
  }

  #[test]
  fn printf_call_and_ret_appear_in_main() {
    let mut module = IrModule::new("prog");
    module.declare_printf();
    let fmt = module.add_global_string("%s\n");
    let text = module.add_global_string("hello");
    module.emit_printf(fmt, CallArg::Str(text));
    module.set_ret(7);

    assert!(module.printf_declared());
    let ir = module.render();
    assert!(ir.contains("declare i32 @printf(ptr, ...)"));
    assert!(ir.contains("%0 = call i32 (ptr, ...) @printf(ptr @.str, ptr @.str.1)"));
    assert!(ir.contains("ret i64 7"));
  }

  #[test]
  fn first_recorded_ret_wins() {
    let mut module = IrModule::new("prog");
    module.set_ret(3);
    module.set_ret(9);
    assert_eq!(module.ret(), Some(3));
  }

  #[test]
  fn replace_all_uses_rewrites_emitted_calls() {
    let mut module = IrModule::new("prog");
    module.declare_printf();
    let fmt = module.add_global_string("%s\n");
    let old = module.add_global_string("hi");
    module.emit_printf(fmt, CallArg::Str(old));

    let new = module.add_global_string("bye");
    module.replace_all_uses(old, new);

    assert_eq!(module.calls()[0].arg, CallArg::Str(new));
    let ir = module.render();
    assert!(ir.contains("@printf(ptr @.str, ptr @.str.2)"));
    // the replaced constant is still present in the module
    assert!(ir.contains("c\"hi\\00\""));
  }

  #[test]
  fn verify_flags_call_without_declaration() {
    let mut module = IrModule::new("prog");
    let fmt = module.add_global_string("%s\n");
    let text = module.add_global_string("x");
    module.emit_printf(fmt, CallArg::Str(text));
    let findings = module.verify();
    assert_eq!(findings.len(), 1);
    assert!(findings[0].contains("never declared"));
  }

  #[test]
  fn verify_is_clean_for_well_formed_module() {
    let mut module = IrModule::new("prog");
    module.declare_printf();
    let fmt = module.add_global_string("%.0f\n");
    module.emit_printf(fmt, CallArg::Double(4.0));
    module.set_ret(0);
    assert!(module.verify().is_empty());
  }
}
