//! Assembly code generation.
//!
//! Mirrors `cg.c`'s two-phase structure (register allocation, then
//! emission) but only covers phase two: [`regalloc`](crate::regalloc) runs
//! first and stamps every `Expr`'s `rank`/`reg`, and a [`Backend`] stamps
//! every `Symbol`'s stack `offset`, before any of this module runs.

pub mod control_flow;
pub mod error;
pub mod expr;

pub use error::CodeGenError;

use crate::ast::Program;
use crate::target::{frame_size, Backend, CgResult};

/// Generates labels unique across the whole program. The reference
/// compiler resets a single file-static counter once per `gen_code` run,
/// not once per function, so labels climb monotonically across every
/// function's body; this allocator is threaded the same way.
pub struct LabelAllocator {
    next: u32,
}

impl LabelAllocator {
    pub fn new() -> Self {
        LabelAllocator { next: 0 }
    }

    pub fn next(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn name(&self, label: u32) -> String {
        format!(".L{label}")
    }

    pub fn emit(&self, out: &mut String, label: u32) -> CgResult<()> {
        use std::fmt::Write as _;
        writeln!(out, "{}:", self.name(label))?;
        Ok(())
    }
}

impl Default for LabelAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates the whole program's assembly text: the section header, every
/// function in source order, then the `put_int` runtime helper. Mirrors
/// `gen_code`.
pub fn generate_program(backend: &dyn Backend, program: &Program) -> CgResult<String> {
    let mut out = String::new();
    out.push_str(backend.section_text());
    let mut labels = LabelAllocator::new();
    for func in &program.functions {
        generate_function(&mut out, backend, &mut labels, func)?;
    }
    out.push_str(backend.put_int_code());
    Ok(out)
}

fn generate_function(
    out: &mut String,
    backend: &dyn Backend,
    labels: &mut LabelAllocator,
    func: &crate::ast::Function,
) -> CgResult<()> {
    backend.assign_frame(&func.params, &func.autovars);
    let size = frame_size(&func.params, &func.autovars);
    let footer_arg = backend.func_header(out, &func.name, size, &func.params)?;
    let end_label = format!("_END_{}", func.name);
    for stmt in &func.body {
        control_flow::gen_stmt(out, backend, labels, &end_label, stmt)?;
    }
    backend.func_footer(out, &end_label, footer_arg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;
    use crate::regalloc;
    use crate::target::Platform;

    #[test]
    fn generates_a_minimal_program() {
        let mut prog = parse_program("int main(){ return 1+2*3; }").unwrap();
        regalloc::allocate(&mut prog).unwrap();
        let backend = Platform::Linux.backend();
        let asm = generate_program(backend.as_ref(), &prog).unwrap();
        assert!(asm.contains(".globl\tmain"));
        assert!(asm.contains("main:"));
        assert!(asm.contains("_END_main:"));
        assert!(asm.contains("put_int:"));
    }

    #[test]
    fn each_function_gets_its_own_end_label() {
        let mut prog =
            parse_program("int f(){ return 1; } int main(){ return f(); }").unwrap();
        regalloc::allocate(&mut prog).unwrap();
        let backend = Platform::Linux.backend();
        let asm = generate_program(backend.as_ref(), &prog).unwrap();
        assert!(asm.contains("_END_f:"));
        assert!(asm.contains("_END_main:"));
        assert!(asm.contains("call\tf"));
    }

    #[test]
    fn labels_climb_monotonically_across_functions() {
        let mut prog = parse_program(
            "int f(){ int x; x=0; if(x<1){ x=2; } return x; } \
             int main(){ int y; y=0; if(y<1){ y=2; } return y; }",
        )
        .unwrap();
        regalloc::allocate(&mut prog).unwrap();
        let backend = Platform::Linux.backend();
        let asm = generate_program(backend.as_ref(), &prog).unwrap();
        assert!(asm.contains(".L0:"));
        assert!(asm.contains(".L1:"));
    }
}
