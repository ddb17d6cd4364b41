//! Executable builder: serialize the IR text and drive the external
//! toolchain.
//!
//! The pipeline is strictly sequential and synchronous: write `<stem>`, run
//! the assembler to get `<stem>.o`, run the linker to get `<stem>`. A spawn
//! failure or nonzero status from either subprocess aborts with a toolchain
//! error. The tool names are injectable so the failure paths can be tested
//! without an LLVM install.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{CompileError, CompileResult};

pub struct ExecutableBuilder {
  ir: String,
  output_file: PathBuf,
  assembler: String,
  linker: String,
}

impl ExecutableBuilder {
  pub fn new(ir: String, output_file: impl Into<PathBuf>) -> Self {
    Self {
      ir,
      output_file: output_file.into(),
      assembler: "llc".to_string(),
      linker: "clang".to_string(),
    }
  }

  pub fn with_toolchain(
    mut self,
    assembler: impl Into<String>,
    linker: impl Into<String>,
  ) -> Self {
    self.assembler = assembler.into();
    self.linker = linker.into();
    self
  }

  /// Run all three steps in order.
  pub fn build_executable(&self) -> CompileResult<()> {
    self.write_ir_to_file()?;
    self.convert_ir_to_object()?;
    self.link_objects()?;
    Ok(())
  }

  fn write_ir_to_file(&self) -> CompileResult<()> {
    fs::write(&self.output_file, &self.ir).map_err(|err| {
      CompileError::toolchain(format!(
        "failed to write IR to '{}': {err}",
        self.output_file.display()
      ))
    })
  }

  fn convert_ir_to_object(&self) -> CompileResult<()> {
    let object = self.object_file();
    let status = Command::new(&self.assembler)
      .arg("-filetype=obj")
      .arg(&self.output_file)
      .arg("-o")
      .arg(&object)
      .status()
      .map_err(|err| {
        CompileError::toolchain(format!("failed to run '{}': {err}", self.assembler))
      })?;

    if !status.success() {
      return Err(CompileError::toolchain(format!(
        "'{}' failed to convert IR to an object file ({status})",
        self.assembler
      )));
    }
    Ok(())
  }

  fn link_objects(&self) -> CompileResult<()> {
    let status = Command::new(&self.linker)
      .arg(self.object_file())
      .arg("-o")
      .arg(&self.output_file)
      .status()
      .map_err(|err| CompileError::toolchain(format!("failed to run '{}': {err}", self.linker)))?;

    if !status.success() {
      return Err(CompileError::toolchain(format!(
        "'{}' failed to link the executable ({status})",
        self.linker
      )));
    }
    Ok(())
  }

  fn object_file(&self) -> PathBuf {
    let mut name = self.output_file.as_os_str().to_os_string();
    name.push(".o");
    PathBuf::from(name)
  }
}

/// Derive the output stem from the source path: `/tmp/prog.dust` builds
/// `prog` in the working directory.
pub fn output_stem(input: &Path) -> PathBuf {
  input
    .file_stem()
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("a.out"))
}
