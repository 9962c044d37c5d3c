//! ARM64 back end (gas/AArch64 syntax), covering the Raspi and AMac
//! variants. Grounded on `arch_arm64.c`.

use std::fmt::Write as _;
use std::rc::Rc;

use crate::ast::{RelOp, Symbol, SymbolKind};
use crate::target::{Backend, CgResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Raspi,
    Amac,
}

pub struct Arm64 {
    variant: Variant,
}

const REG_NAME: [&str; 3] = ["w8", "w9", "w10"];
const PARAM_REG: [&str; 9] = ["NULL", "w0", "w1", "w2", "w3", "w4", "w5", "w6", "w7"];

impl Arm64 {
    pub fn new(variant: Variant) -> Self {
        Arm64 { variant }
    }

    fn rel_mnemonic(op: RelOp) -> &'static str {
        match op {
            RelOp::Lt => "b.ge",
            RelOp::Gt => "b.le",
            RelOp::Le => "b.gt",
            RelOp::Ge => "b.lt",
            RelOp::Eq => "b.ne",
            RelOp::Ne => "b.eq",
        }
    }

    fn set_mnemonic(op: RelOp) -> &'static str {
        match op {
            RelOp::Lt => "lt",
            RelOp::Gt => "gt",
            RelOp::Le => "le",
            RelOp::Ge => "ge",
            RelOp::Eq => "eq",
            RelOp::Ne => "ne",
        }
    }
}

impl Backend for Arm64 {
    fn main_label(&self) -> &'static str {
        match self.variant {
            Variant::Amac => "_main",
            Variant::Raspi => "main",
        }
    }

    fn section_text(&self) -> &'static str {
        match self.variant {
            Variant::Raspi => "\t.text\n",
            Variant::Amac => "\t.text\n\t.p2align 2\n",
        }
    }

    fn put_int_code(&self) -> &'static str {
        match self.variant {
            Variant::Raspi => {
                "\t.section\t.rodata\n\
                 .LC0:\n\
                 \t.string \"%d\\n\"\n\
                 \t.text\n\
                 put_int:\n\
                 \tstp\tx29, x30, [sp, -32]!\n\
                 \tmov\tx29, sp\n\
                 \tstr\tw0, [sp, 28]\n\
                 \tldr\tw1, [sp, 28]\n\
                 \tadrp\tx0, .LC0\n\
                 \tadd\tx0, x0, :lo12:.LC0\n\
                 \tbl\tprintf\n\
                 \tnop\n\
                 \tldp\tx29, x30, [sp], 32\n\
                 \tret\n"
            }
            Variant::Amac => {
                "\t.text\n\
                 \t.p2align 2\n\
                 .LC0:\n\
                 \t.string \"%d\\n\"\n\
                 \t.text\n\
                 \t.p2align 2\n\
                 put_int:\n\
                 \tsub\tsp, sp, #32\n\
                 \tstp\tx29, x30, [sp, #16]\n\
                 \tadd\tx29, sp, #16\n\
                 \tstur\tw0, [x29, #-4]\n\
                 \tldur\tw9, [x29, #-4]\n\
                 \tmov\tx8, x9\n\
                 \tadrp\tx0, .LC0@PAGE\n\
                 \tadd\tx0, x0, .LC0@PAGEOFF\n\
                 \tmov\tx9, sp\n\
                 \tstr\tx8, [x9]\n\
                 \tbl\t_printf\n\
                 \tldp\tx29, x30, [sp, #16]\n\
                 \tadd\tsp, sp, #32\n\
                 \tret\n"
            }
        }
    }

    fn reg_name(&self, reg: u8) -> &'static str {
        REG_NAME[reg as usize]
    }

    fn assign_frame(&self, params: &[Rc<Symbol>], autovars: &[Rc<Symbol>]) {
        for (i, sym) in autovars.iter().enumerate() {
            debug_assert_eq!(sym.kind, SymbolKind::AutoVar);
            sym.offset.set(i as i32 + 1); // temporary ordinal, overwritten below
        }
        let id_var = autovars.len() as i32;
        let id_arg = params.len() as i32;
        let poffset = if id_arg > 8 { (id_arg - 8) * -8 } else { 0 };
        let voffset = if id_var > 0 { id_var * -4 } else { 0 };
        for (i, sym) in params.iter().enumerate() {
            let argid = i as i32 + 1;
            let offset = if argid < 9 {
                poffset + voffset + argid * -4
            } else {
                (id_arg - argid + 1) * -8
            };
            sym.offset.set(offset);
        }
        for (i, sym) in autovars.iter().enumerate() {
            let vid = i as i32 + 1;
            sym.offset.set(poffset + (id_var - vid + 1) * -4);
        }
    }

    fn func_header(
        &self,
        out: &mut String,
        name: &str,
        frame_size: i32,
        params: &[Rc<Symbol>],
    ) -> CgResult<i32> {
        let mut pad = 16 - frame_size % 16;
        if pad == 16 {
            pad = 0;
        }
        let current_frame_size = frame_size + pad + 16;
        let label = if name == "main" { self.main_label() } else { name };
        writeln!(out, "\t.global\t{label}")?;
        writeln!(out, "{label}:")?;
        writeln!(out, "\tstp\tx29, x30, [sp, -{current_frame_size}]!")?;
        writeln!(out, "\tadd\tx29, sp, {current_frame_size}")?;
        for (i, param) in params.iter().enumerate() {
            let nump = i + 1;
            if nump < 9 {
                writeln!(out, "\tstr\t{}, [x29, {}]", PARAM_REG[nump], param.offset.get())?;
            }
        }
        Ok(current_frame_size)
    }

    fn func_footer(&self, out: &mut String, end_label: &str, footer_arg: i32) -> CgResult<()> {
        writeln!(out, "{end_label}:")?;
        writeln!(out, "\tldp\tx29, x30, [sp], {footer_arg}")?;
        writeln!(out, "\tret")?;
        writeln!(out)?;
        Ok(())
    }

    fn load_const(&self, out: &mut String, reg: u8, val: i32) -> CgResult<()> {
        if val > i16::MAX as i32 || val < i16::MIN as i32 {
            writeln!(out, "\tmov\t{}, {:#x}", self.reg_name(reg), val as u32 & 0xffff)?;
            writeln!(
                out,
                "\tmovk\t{}, {:#x}, lsl 16",
                self.reg_name(reg),
                (val as u32 & 0xffff0000) >> 16
            )?;
        } else {
            writeln!(out, "\tmov\t{}, {val}", self.reg_name(reg))?;
        }
        Ok(())
    }

    fn load_ident(&self, out: &mut String, reg: u8, offset: i32) -> CgResult<()> {
        writeln!(out, "\tldr\t{}, [x29, {offset}]", self.reg_name(reg))?;
        Ok(())
    }

    fn store_lvar(&self, out: &mut String, reg: u8, offset: i32) -> CgResult<()> {
        writeln!(out, "\tstr\t{}, [x29, {offset}]", self.reg_name(reg))?;
        Ok(())
    }

    fn neg(&self, out: &mut String, reg: u8) -> CgResult<()> {
        writeln!(out, "\tneg\t{}, {}", self.reg_name(reg), self.reg_name(reg))?;
        Ok(())
    }

    fn add(&self, out: &mut String, dst: u8, src2: u8) -> CgResult<()> {
        writeln!(
            out,
            "\tadd\t{}, {}, {}",
            self.reg_name(dst),
            self.reg_name(dst),
            self.reg_name(src2)
        )?;
        Ok(())
    }

    fn sub(&self, out: &mut String, dst: u8, src2: u8) -> CgResult<()> {
        writeln!(
            out,
            "\tsub\t{}, {}, {}",
            self.reg_name(dst),
            self.reg_name(dst),
            self.reg_name(src2)
        )?;
        Ok(())
    }

    fn mul(&self, out: &mut String, dst: u8, src2: u8) -> CgResult<()> {
        writeln!(
            out,
            "\tmul\t{}, {}, {}",
            self.reg_name(dst),
            self.reg_name(dst),
            self.reg_name(src2)
        )?;
        Ok(())
    }

    fn ret_assign(&self, out: &mut String, src: u8) -> CgResult<()> {
        writeln!(out, "\tmov\tw0, {}", self.reg_name(src))?;
        Ok(())
    }

    fn jmp(&self, out: &mut String, label: &str) -> CgResult<()> {
        writeln!(out, "\tb\t{label}")?;
        Ok(())
    }

    fn cmp(&self, out: &mut String, lhs: u8, rhs: u8) -> CgResult<()> {
        writeln!(out, "\tcmp\t{}, {}", self.reg_name(lhs), self.reg_name(rhs))?;
        Ok(())
    }

    fn branch_if_rel_false(&self, out: &mut String, op: RelOp, label: &str) -> CgResult<()> {
        writeln!(out, "\t{}\t{label}", Self::rel_mnemonic(op))?;
        Ok(())
    }

    fn branch_if_zero(&self, out: &mut String, reg: u8, label: &str) -> CgResult<()> {
        writeln!(out, "\tcmp\t{}, 0", self.reg_name(reg))?;
        writeln!(out, "\tb.eq\t{label}")?;
        Ok(())
    }

    fn cond_set(&self, out: &mut String, dst: u8, op: RelOp) -> CgResult<()> {
        writeln!(out, "\tcset\t{}, {}", self.reg_name(dst), Self::set_mnemonic(op))?;
        Ok(())
    }

    fn call_prologue(&self, out: &mut String, call_reg: u8, nargs: u32) -> CgResult<(i32, i32, u32)> {
        let sparams = nargs.saturating_sub(8);
        let pad = 4;
        let psize = sparams as i32 * 8;
        let fsize = pad + 3 * 4;
        writeln!(out, "\tsub\tsp, sp, #{fsize}")?;
        for i in 0..3u8 {
            if call_reg != i {
                writeln!(out, "\tstr\t{}, [sp, {}]", self.reg_name(i), 8 - 4 * i as i32)?;
            }
        }
        Ok((psize, fsize, sparams))
    }

    fn call_set_param(
        &self,
        out: &mut String,
        reg: u8,
        ordinal: u32,
        stack_passed_args: u32,
    ) -> CgResult<()> {
        if ordinal < 9 {
            let dst = PARAM_REG[ordinal as usize];
            if dst != self.reg_name(reg) {
                writeln!(out, "\tmov\t{dst}, {}", self.reg_name(reg))?;
            }
        } else {
            writeln!(
                out,
                "\tstr\t{}, [sp, {}]",
                self.reg_name(reg),
                (stack_passed_args as i32 + 8 - ordinal as i32 + 1) * -8
            )?;
        }
        Ok(())
    }

    fn call_epilogue(
        &self,
        out: &mut String,
        call_reg: u8,
        used: bool,
        _psize: i32,
        fsize: i32,
        callee: &str,
    ) -> CgResult<()> {
        writeln!(out, "\tbl\t{callee}")?;
        if used {
            writeln!(out, "\tmov\t{}, w0", self.reg_name(call_reg))?;
        }
        for i in 0..3u8 {
            if call_reg != i {
                writeln!(out, "\tldr\t{}, [sp, {}]", self.reg_name(i), 8 - 4 * i as i32)?;
            }
        }
        writeln!(out, "\tadd\tsp, sp, {fsize}")?;
        Ok(())
    }
}
