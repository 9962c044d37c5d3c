//! `tlc`: a whole-program compiler for a small C-like language, emitting
//! gas-syntax x86-64 or ARM64 assembly.
//!
//! The pipeline mirrors the reference compiler's four stages, each its own
//! module: [`parser`] builds a typed AST and resolves every identifier
//! inline (§4.1-4.3), [`regalloc`] runs the two-pass Sethi-Ullman allocator
//! over it, [`codegen`] walks the allocated AST against a [`target::Backend`]
//! to produce assembly text. [`diagnostics`] carries both the accumulating
//! parse/semantic error list and the fatal, non-accumulating errors that can
//! only be detected once allocation or code generation actually runs.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod regalloc;
pub mod symtab;
pub mod target;

use std::fmt;
use std::path::{Path, PathBuf};

use config::CompilerConfig;
use diagnostics::Diagnostic;

/// Everything that can go wrong compiling a source file, in the order the
/// pipeline stages run.
#[derive(Debug)]
pub enum CompileError {
    /// Accumulated parse/semantic diagnostics; the pipeline never reaches
    /// register allocation when this variant is returned.
    Diagnostics(Vec<Diagnostic>),
    /// A fatal error raised by the register allocator.
    Fatal(diagnostics::FatalError),
    /// A fatal error raised by code generation.
    CodeGen(codegen::CodeGenError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Diagnostics(diags) => {
                for d in diags {
                    writeln!(f, "{d}")?;
                }
                write!(f, "{} error(s)", diags.len())
            }
            CompileError::Fatal(e) => write!(f, "{e}"),
            CompileError::CodeGen(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<diagnostics::FatalError> for CompileError {
    fn from(e: diagnostics::FatalError) -> Self {
        CompileError::Fatal(e)
    }
}

impl From<codegen::CodeGenError> for CompileError {
    fn from(e: codegen::CodeGenError) -> Self {
        CompileError::CodeGen(e)
    }
}

/// Compiles `src` down to assembly text for `config.target`, running the
/// full pipeline: parse, allocate registers, generate code.
pub fn compile(src: &str, config: &CompilerConfig) -> Result<String, CompileError> {
    let mut program = parser::parse_program(src).map_err(CompileError::Diagnostics)?;
    tracing::debug!(functions = program.functions.len(), "parsed program");

    regalloc::allocate(&mut program)?;

    let backend = config.target.backend();
    let asm = codegen::generate_program(backend.as_ref(), &program)?;
    if config.verbose {
        tracing::info!(target = %config.target, bytes = asm.len(), "generated assembly");
    }
    Ok(asm)
}

/// Swaps a `.c` basename for a `.s` one in the current directory, matching
/// the reference CLI's `basename()` + suffix-swap: the directory component
/// of `input` is discarded, so `tlc sub/foo.c` writes `./foo.s`, not
/// `sub/foo.s`. Returns `None` if the input's file name does not end in
/// `.c`.
pub fn output_path(input: &Path) -> Option<PathBuf> {
    let file_name = input.file_name()?.to_str()?;
    if !file_name.ends_with(".c") {
        return None;
    }
    let stem = &file_name[..file_name.len() - 1];
    Some(PathBuf::from(format!("{stem}s")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use target::Platform;

    #[test]
    fn compiles_a_minimal_program() {
        let cfg = CompilerConfig::new(Platform::Linux);
        let asm = compile("int main(){ return 0; }", &cfg).unwrap();
        assert!(asm.contains("main:"));
    }

    #[test]
    fn reports_diagnostics_without_panicking() {
        let cfg = CompilerConfig::new(Platform::Linux);
        let err = compile("int main(){ return x; }", &cfg).unwrap_err();
        assert!(matches!(err, CompileError::Diagnostics(_)));
    }

    #[test]
    fn reports_register_exhaustion_as_fatal() {
        let cfg = CompilerConfig::new(Platform::Linux);
        let err = compile(
            "int main(){ return ((1+2)+(3+4))+((5+6)+(7+8)); }",
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Fatal(_)));
    }

    #[test]
    fn reports_division_as_codegen_error() {
        let cfg = CompilerConfig::new(Platform::Linux);
        let err = compile("int main(){ return 1/2; }", &cfg).unwrap_err();
        assert!(matches!(err, CompileError::CodeGen(_)));
    }

    #[test]
    fn swaps_c_suffix_for_s_in_the_current_directory() {
        assert_eq!(
            output_path(Path::new("sub/foo.c")),
            Some(PathBuf::from("foo.s"))
        );
    }

    #[test]
    fn rejects_a_non_c_suffix() {
        assert_eq!(output_path(Path::new("foo.txt")), None);
    }
}
