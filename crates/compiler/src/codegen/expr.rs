//! Expression code generation. Grounded on `gen_exp`, `gen_exp_asgn`,
//! `gen_exp_n2`, and `gen_exp_call`/`gen_exp_call_param` in `cg.c`.

use crate::ast::{ArithOp, Expr, ExprKind, UnaryOp};
use crate::target::{Backend, CgResult};

use super::control_flow::CondContext;
use super::error::CodeGenError;

/// Emits code for `e`, leaving its value in `e.reg`. `used` tells a `Call`
/// node whether its result actually needs to land in that register (see
/// `Backend::call_epilogue`); every other expression kind ignores it.
pub fn gen_expr(out: &mut String, backend: &dyn Backend, e: &Expr, used: bool) -> CgResult<()> {
    match &e.kind {
        ExprKind::IntLit(v) => backend.load_const(out, e.reg.expect("rank pass ran"), *v),
        ExprKind::Ident { binding, .. } => {
            let sym = binding.as_ref().expect("bound by parser");
            backend.load_ident(out, e.reg.expect("rank pass ran"), sym.offset.get())
        }
        ExprKind::Assign { binding, value, .. } => {
            gen_expr(out, backend, value, true)?;
            let sym = binding.as_ref().expect("bound by parser");
            backend.store_lvar(out, value.reg.expect("assigned"), sym.offset.get())
        }
        ExprKind::Unary { op, operand } => {
            gen_expr(out, backend, operand, true)?;
            match op {
                UnaryOp::Plus => Ok(()),
                UnaryOp::Minus => backend.neg(out, e.reg.expect("assigned")),
            }
        }
        ExprKind::Arith { op, lhs, rhs } => {
            gen_binary_operands(out, backend, lhs, rhs)?;
            let dst = e.reg.expect("assigned");
            let src2 = rhs.reg.expect("assigned");
            match op {
                ArithOp::Add => backend.add(out, dst, src2),
                ArithOp::Sub => backend.sub(out, dst, src2),
                ArithOp::Mul => backend.mul(out, dst, src2),
                ArithOp::Div => Err(CodeGenError::Logic(format!(
                    "line {}: the `/` operator is not supported by this back end",
                    e.line
                ))),
            }
        }
        ExprKind::Rel { op, lhs, rhs } => {
            gen_binary_operands(out, backend, lhs, rhs)?;
            backend.cmp(
                out,
                lhs.reg.expect("assigned"),
                rhs.reg.expect("assigned"),
            )?;
            // Materialize a 0/1 value; the branch-context form of a
            // relational condition never reaches this function (see
            // `control_flow::gen_condition`).
            backend.cond_set(out, e.reg.expect("assigned"), *op)
        }
        ExprKind::Call { callee, args } => gen_call(out, backend, e, callee, args, used),
    }
}

/// Evaluates `lhs`/`rhs` in the same order the register allocator visited
/// them (higher rank first), so the live set never exceeds the pool.
fn gen_binary_operands(out: &mut String, backend: &dyn Backend, lhs: &Expr, rhs: &Expr) -> CgResult<()> {
    if lhs.rank >= rhs.rank {
        gen_expr(out, backend, lhs, true)?;
        gen_expr(out, backend, rhs, true)?;
    } else {
        gen_expr(out, backend, rhs, true)?;
        gen_expr(out, backend, lhs, true)?;
    }
    Ok(())
}

fn gen_call(
    out: &mut String,
    backend: &dyn Backend,
    e: &Expr,
    callee: &str,
    args: &[Expr],
    used: bool,
) -> CgResult<()> {
    let call_reg = e.reg.expect("assigned");
    let (psize, fsize, sparams) = backend.call_prologue(out, call_reg, args.len() as u32)?;
    for (i, arg) in args.iter().enumerate() {
        let ordinal = i as u32 + 1;
        gen_expr(out, backend, arg, true)?;
        backend.call_set_param(out, arg.reg.expect("assigned"), ordinal, sparams)?;
    }
    backend.call_epilogue(out, call_reg, used, psize, fsize, callee)
}

/// Dispatches a relational expression used in the condition position of an
/// `if`/`while`/`for`/`do-while` statement: compares its operands and
/// branches directly on the (inverted) relation, skipping materialization
/// entirely. A non-relational condition falls back to evaluating the
/// expression normally and branching on whether it is zero.
pub fn gen_condition(
    out: &mut String,
    backend: &dyn Backend,
    cond: &Expr,
    ctx: CondContext,
) -> CgResult<()> {
    let CondContext::Branch(label) = ctx;
    match &cond.kind {
        ExprKind::Rel { op, lhs, rhs } => {
            gen_binary_operands(out, backend, lhs, rhs)?;
            backend.cmp(out, lhs.reg.expect("assigned"), rhs.reg.expect("assigned"))?;
            backend.branch_if_rel_false(out, *op, label)
        }
        _ => {
            gen_expr(out, backend, cond, true)?;
            backend.branch_if_zero(out, cond.reg.expect("assigned"), label)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;
    use crate::regalloc;
    use crate::target::Platform;

    fn codegen_expr_text(src: &str) -> String {
        let mut prog = parse_program(src).unwrap();
        regalloc::allocate(&mut prog).unwrap();
        let backend = Platform::Linux.backend();
        let func = &prog.functions[0];
        backend.assign_frame(&func.params, &func.autovars);
        let mut out = String::new();
        let crate::ast::Stmt::Return { value: Some(e), .. } = &func.body[0] else {
            panic!()
        };
        gen_expr(&mut out, backend.as_ref(), e, true).unwrap();
        out
    }

    #[test]
    fn constant_addition_emits_two_movs_and_an_add() {
        let text = codegen_expr_text("int main(){ return 1+2; }");
        assert!(text.contains("movl\t$1, %eax"));
        assert!(text.contains("movl\t$2, %r10d"));
        assert!(text.contains("addl\t%r10d, %eax"));
    }

    #[test]
    fn division_is_rejected() {
        let mut prog = parse_program("int main(){ return 1/2; }").unwrap();
        regalloc::allocate(&mut prog).unwrap();
        let backend = Platform::Linux.backend();
        let crate::ast::Stmt::Return { value: Some(e), .. } = &prog.functions[0].body[0] else {
            panic!()
        };
        let mut out = String::new();
        let err = gen_expr(&mut out, backend.as_ref(), e, true).unwrap_err();
        assert!(matches!(err, CodeGenError::Logic(_)));
    }
}
