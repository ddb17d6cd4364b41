use std::env;
use std::fs;
use std::path::Path;
use std::process;

use snafu::ResultExt;

use dustc::builder::{ExecutableBuilder, output_stem};
use dustc::error::{CompileError, CompileResult, InputSnafu};

fn main() {
  let args: Vec<String> = env::args().collect();

  if let Err(err) = run(&args) {
    eprintln!("{err}");
    process::exit(1);
  }
}

fn run(args: &[String]) -> CompileResult<()> {
  if args.len() != 2 {
    let program = args.first().map(String::as_str).unwrap_or("dustc");
    return Err(CompileError::Usage {
      program: program.to_string(),
    });
  }

  let input = Path::new(&args[1]);
  let source = fs::read_to_string(input).context(InputSnafu {
    path: input.display().to_string(),
  })?;

  let stem = output_stem(input);
  let module_name = stem.display().to_string();

  let module = dustc::compile(&source, &module_name)?;
  println!("[+] Compiled.");

  let findings = module.verify();
  if !findings.is_empty() {
    for finding in &findings {
      eprintln!("[-] IR verification: {finding}");
    }
    return Err(CompileError::toolchain("IR verification failed"));
  }
  println!("[+] Verified.");

  ExecutableBuilder::new(module.render(), &stem).build_executable()?;
  println!("[+] Generated executable '{}'.", stem.display());

  Ok(())
}
