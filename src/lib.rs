//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `compiler` owns all syntactic and semantic knowledge: it parses and
//!   emits IR in a single pass, with no intermediate syntax tree.
//! - `ir` models the textual LLVM IR module the compiler emits.
//! - `builder` serializes the IR and drives the external assembler/linker.
//! - `error` centralises the diagnostics shared by the other modules.

pub mod builder;
pub mod compiler;
pub mod error;
pub mod ir;
pub mod symbols;
pub mod tokenizer;

pub use error::{CompileError, CompileResult};
pub use ir::IrModule;

/// Compile Dust source text into an IR module.
pub fn compile(source: &str, module_name: &str) -> CompileResult<IrModule> {
  let tokens = tokenizer::tokenize(source)?;
  compiler::generate(tokens, source, module_name)
}
