//! Target back ends.
//!
//! `Backend` is the seam the reference compiler draws with a pair of
//! architecture-specific translation units (`arch_x64.c`, `arch_arm64.c`)
//! behind a handful of `#ifdef`-selected constants and a shared header of
//! function prototypes. This rewrite makes that seam a trait and resolves
//! the concrete implementation from a runtime `--target` flag instead of a
//! build-time `#ifdef`, since a single shipped `tlc` binary has to support
//! every target without being recompiled per platform.

mod arm64;
mod x86_64;

use std::rc::Rc;

use crate::ast::{RelOp, Symbol};
use crate::codegen::error::CodeGenError;

pub type CgResult<T> = Result<T, CodeGenError>;

/// The five platforms the reference compiler's Makefile selects between.
/// Each maps onto one of the two backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Cygwin,
    Mac,
    Raspi,
    Amac,
}

impl Platform {
    pub fn parse(s: &str) -> Option<Platform> {
        match s {
            "linux" => Some(Platform::Linux),
            "cygwin" => Some(Platform::Cygwin),
            "mac" => Some(Platform::Mac),
            "raspi" => Some(Platform::Raspi),
            "amac" => Some(Platform::Amac),
            _ => None,
        }
    }

    pub fn backend(self) -> Box<dyn Backend> {
        match self {
            Platform::Linux => Box::new(x86_64::X86_64::new(x86_64::Variant::Linux)),
            Platform::Cygwin => Box::new(x86_64::X86_64::new(x86_64::Variant::Cygwin)),
            Platform::Mac => Box::new(x86_64::X86_64::new(x86_64::Variant::Mac)),
            Platform::Raspi => Box::new(arm64::Arm64::new(arm64::Variant::Raspi)),
            Platform::Amac => Box::new(arm64::Arm64::new(arm64::Variant::Amac)),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Platform::Linux => "linux",
            Platform::Cygwin => "cygwin",
            Platform::Mac => "mac",
            Platform::Raspi => "raspi",
            Platform::Amac => "amac",
        };
        write!(f, "{s}")
    }
}

/// Computes a function's frame size (the maximum byte offset magnitude
/// among its parameters and auto variables) after a backend's
/// `assign_frame` has stamped every symbol's `offset`. Shared between both
/// backend families; `get_frame_size` in the reference compiler lives in
/// the architecture-independent `symtab.c` for the same reason.
pub fn frame_size(params: &[Rc<Symbol>], autovars: &[Rc<Symbol>]) -> i32 {
    params
        .iter()
        .chain(autovars.iter())
        .map(|s| -s.offset.get())
        .filter(|&v| v > 0)
        .max()
        .unwrap_or(0)
}

/// Everything the code generator needs from a target architecture. Method
/// names follow the reference compiler's `gen_*`/`arch_*` functions; each
/// implementation is grounded line-for-line on `arch_x64.c` or
/// `arch_arm64.c`.
pub trait Backend {
    fn main_label(&self) -> &'static str;
    fn section_text(&self) -> &'static str;
    fn put_int_code(&self) -> &'static str;
    fn reg_name(&self, reg: u8) -> &'static str;

    /// Stamps every parameter's and auto variable's stack `offset` in
    /// place, per this target's layout.
    fn assign_frame(&self, params: &[Rc<Symbol>], autovars: &[Rc<Symbol>]);

    /// Emits the function prologue. Returns whatever value this target's
    /// `func_footer` needs to undo the prologue (the reference compiler
    /// stashes this in a file-static; here it is threaded explicitly).
    fn func_header(
        &self,
        out: &mut String,
        name: &str,
        frame_size: i32,
        params: &[Rc<Symbol>],
    ) -> CgResult<i32>;
    fn func_footer(&self, out: &mut String, end_label: &str, footer_arg: i32) -> CgResult<()>;

    fn load_const(&self, out: &mut String, reg: u8, val: i32) -> CgResult<()>;
    fn load_ident(&self, out: &mut String, reg: u8, offset: i32) -> CgResult<()>;
    fn store_lvar(&self, out: &mut String, reg: u8, offset: i32) -> CgResult<()>;

    fn neg(&self, out: &mut String, reg: u8) -> CgResult<()>;
    fn add(&self, out: &mut String, dst: u8, src2: u8) -> CgResult<()>;
    fn sub(&self, out: &mut String, dst: u8, src2: u8) -> CgResult<()>;
    fn mul(&self, out: &mut String, dst: u8, src2: u8) -> CgResult<()>;

    fn ret_assign(&self, out: &mut String, src: u8) -> CgResult<()>;
    fn jmp(&self, out: &mut String, label: &str) -> CgResult<()>;
    fn cmp(&self, out: &mut String, lhs: u8, rhs: u8) -> CgResult<()>;

    /// Emits the inverted conditional jump for `op` (taken when `op`
    /// itself is *false*), to `label`. Assumes `cmp` already ran.
    fn branch_if_rel_false(&self, out: &mut String, op: RelOp, label: &str) -> CgResult<()>;
    /// Non-relational condition fallback: jump to `label` when `reg` is 0.
    fn branch_if_zero(&self, out: &mut String, reg: u8, label: &str) -> CgResult<()>;
    /// Materializes `op`'s truth value (0 or 1) into `dst`. Assumes `cmp`
    /// already ran.
    fn cond_set(&self, out: &mut String, dst: u8, op: RelOp) -> CgResult<()>;

    /// Adjusts the stack and spills live scratch registers ahead of a
    /// call. `call_reg` is the register the call's own result will land
    /// in (already live registers other than this one get spilled).
    /// Returns `(pad_or_arg_size, frame_size, stack_passed_arg_count)`.
    fn call_prologue(&self, out: &mut String, call_reg: u8, nargs: u32) -> CgResult<(i32, i32, u32)>;
    fn call_set_param(
        &self,
        out: &mut String,
        reg: u8,
        ordinal: u32,
        stack_passed_args: u32,
    ) -> CgResult<()>;
    /// `used` is true when the call's result is actually consumed by its
    /// caller (as opposed to a bare expression-statement call). The
    /// reference ARM64 back end infers this from whether the call node's
    /// parent is itself an expression, which misses a call used directly
    /// as a return value; this rewrite threads `used` explicitly from the
    /// code generator instead (see DESIGN.md).
    fn call_epilogue(
        &self,
        out: &mut String,
        call_reg: u8,
        used: bool,
        psize: i32,
        fsize: i32,
        callee: &str,
    ) -> CgResult<()>;
}
