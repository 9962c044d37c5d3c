//! Two-pass Sethi-Ullman register allocator over a fixed pool of three
//! scratch registers, indexed 0-2 (the back end maps these to concrete
//! register names).
//!
//! Both passes run over the whole program before code generation begins,
//! mirroring `assign_regs`'s two full traversals in the reference
//! compiler. Each syntactically top-level expression (an expression
//! statement, a loop/if condition, a `for` header slot, a return value)
//! gets its own independent three-register pool, because the target back
//! end always spills the live scratch registers to the stack around a
//! call and restores them afterward — nothing needs to survive in a
//! register across a statement boundary.

use crate::ast::{Expr, ExprKind, Function, Program, Stmt};
use crate::diagnostics::FatalError;

const NUM_REGS: usize = 3;

pub fn allocate(program: &mut Program) -> Result<(), FatalError> {
    for f in &mut program.functions {
        rank_function(f);
    }
    for f in &mut program.functions {
        assign_function(f)?;
    }
    Ok(())
}

fn rank_function(f: &mut Function) {
    for s in &mut f.body {
        rank_stmt(s);
    }
}

fn rank_stmt(s: &mut Stmt) {
    match s {
        Stmt::Block(stmts) => stmts.iter_mut().for_each(rank_stmt),
        Stmt::Decl => {}
        Stmt::Expr(e) => rank_expr(e),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            rank_expr(cond);
            rank_stmt(then_branch);
            if let Some(e) = else_branch {
                rank_stmt(e);
            }
        }
        Stmt::While { cond, body } => {
            rank_expr(cond);
            rank_stmt(body);
        }
        Stmt::For {
            init,
            cond,
            step,
            body,
        } => {
            if let Some(e) = init {
                rank_expr(e);
            }
            if let Some(e) = cond {
                rank_expr(e);
            }
            if let Some(e) = step {
                rank_expr(e);
            }
            rank_stmt(body);
        }
        Stmt::DoWhile { body, cond } => {
            rank_stmt(body);
            rank_expr(cond);
        }
        Stmt::Return { value, .. } => {
            if let Some(e) = value {
                rank_expr(e);
            }
        }
    }
}

/// Pass 1: `rank(leaf) = 1`, `rank(interior) = max(children) + 1`. A call's
/// arguments are each ranked independently (they get their own register
/// pool in pass 2, since the call boundary resets it); the call node
/// itself is rank 1, opaque to its surroundings.
fn rank_expr(e: &mut Expr) {
    match &mut e.kind {
        ExprKind::IntLit(_) | ExprKind::Ident { .. } => {
            e.rank = 1;
        }
        ExprKind::Call { args, .. } => {
            for a in args.iter_mut() {
                rank_expr(a);
            }
            e.rank = 1;
        }
        ExprKind::Unary { operand, .. } => {
            rank_expr(operand);
            e.rank = operand.rank + 1;
        }
        ExprKind::Assign { value, .. } => {
            rank_expr(value);
            e.rank = value.rank;
        }
        ExprKind::Arith { lhs, rhs, .. } | ExprKind::Rel { lhs, rhs, .. } => {
            rank_expr(lhs);
            rank_expr(rhs);
            e.rank = lhs.rank.max(rhs.rank) + 1;
        }
    }
}

fn assign_function(f: &mut Function) -> Result<(), FatalError> {
    for s in &mut f.body {
        assign_stmt(s)?;
    }
    Ok(())
}

fn assign_stmt(s: &mut Stmt) -> Result<(), FatalError> {
    match s {
        Stmt::Block(stmts) => {
            for s in stmts {
                assign_stmt(s)?;
            }
            Ok(())
        }
        Stmt::Decl => Ok(()),
        Stmt::Expr(e) => assign_top(e),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            assign_top(cond)?;
            assign_stmt(then_branch)?;
            if let Some(e) = else_branch {
                assign_stmt(e)?;
            }
            Ok(())
        }
        Stmt::While { cond, body } => {
            assign_top(cond)?;
            assign_stmt(body)
        }
        Stmt::For {
            init,
            cond,
            step,
            body,
        } => {
            if let Some(e) = init {
                assign_top(e)?;
            }
            if let Some(e) = cond {
                assign_top(e)?;
            }
            if let Some(e) = step {
                assign_top(e)?;
            }
            assign_stmt(body)
        }
        Stmt::DoWhile { body, cond } => {
            assign_stmt(body)?;
            assign_top(cond)
        }
        Stmt::Return { value, .. } => {
            if let Some(e) = value {
                assign_top(e)?;
            }
            Ok(())
        }
    }
}

/// Entry point for one syntactically top-level expression: fresh register
/// pool, and a fail-fast rank check standing in for the reference
/// compiler's register-exhaustion abort (which only fires once the pool
/// is actually observed empty at a leaf).
fn assign_top(e: &mut Expr) -> Result<(), FatalError> {
    if e.rank > NUM_REGS as u32 {
        return Err(FatalError::RegisterExhaustion { line: e.line });
    }
    let mut regs = [false; NUM_REGS];
    assign_expr(e, &mut regs)
}

fn alloc_leaf(regs: &mut [bool; NUM_REGS], line: u32) -> Result<u8, FatalError> {
    for (i, used) in regs.iter_mut().enumerate() {
        if !*used {
            *used = true;
            return Ok(i as u8);
        }
    }
    Err(FatalError::RegisterExhaustion { line })
}

fn release(regs: &mut [bool; NUM_REGS], reg: u8) {
    regs[reg as usize] = false;
}

/// Pass 2. Traversal order (which child is visited first) is governed by
/// rank so the three-register pool stays sufficient for rank-3 trees, but
/// a binary node's own register is always its **left** child's, and it is
/// always the **right** child's register that gets released — regardless
/// of which side had the higher rank. See DESIGN.md for why this
/// unconditional left-inherit/right-release rule (rather than the
/// higher-rank side) is what the reference implementation actually does.
fn assign_expr(e: &mut Expr, regs: &mut [bool; NUM_REGS]) -> Result<(), FatalError> {
    match &mut e.kind {
        ExprKind::IntLit(_) | ExprKind::Ident { .. } => {
            e.reg = Some(alloc_leaf(regs, e.line)?);
        }
        ExprKind::Call { args, .. } => {
            for a in args.iter_mut() {
                let mut fresh = [false; NUM_REGS];
                assign_expr(a, &mut fresh)?;
            }
            e.reg = Some(alloc_leaf(regs, e.line)?);
        }
        ExprKind::Unary { operand, .. } => {
            assign_expr(operand, regs)?;
            e.reg = operand.reg;
        }
        ExprKind::Assign { value, .. } => {
            assign_expr(value, regs)?;
            e.reg = value.reg;
        }
        ExprKind::Arith { lhs, rhs, .. } | ExprKind::Rel { lhs, rhs, .. } => {
            if lhs.rank >= rhs.rank {
                assign_expr(lhs, regs)?;
                assign_expr(rhs, regs)?;
            } else {
                assign_expr(rhs, regs)?;
                assign_expr(lhs, regs)?;
            }
            e.reg = lhs.reg;
            release(regs, rhs.reg.expect("rhs assigned above"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn alloc(src: &str) -> Program {
        let mut prog = parse_program(src).unwrap();
        allocate(&mut prog).unwrap();
        prog
    }

    #[test]
    fn leaf_rank_is_one() {
        let prog = alloc("int main(){ return 1; }");
        let Stmt::Return { value: Some(e), .. } = &prog.functions[0].body[0] else {
            panic!()
        };
        assert_eq!(e.rank, 1);
        assert_eq!(e.reg, Some(0));
    }

    #[test]
    fn binary_op_inherits_left_register_and_releases_right() {
        // 1+2*3: add.reg must equal the literal `1`'s register.
        let prog = alloc("int main(){ return 1+2*3; }");
        let Stmt::Return { value: Some(e), .. } = &prog.functions[0].body[0] else {
            panic!()
        };
        let ExprKind::Arith { lhs, rhs, .. } = &e.kind else {
            panic!()
        };
        assert_eq!(e.reg, lhs.reg);
        assert_eq!(e.rank, 3);
        assert_ne!(lhs.reg, rhs.reg);
    }

    #[test]
    fn rank_four_is_rejected() {
        let mut prog = parse_program("int main(){ return ((1+2)+(3+4))+((5+6)+(7+8)); }").unwrap();
        let err = allocate(&mut prog).unwrap_err();
        assert!(matches!(err, FatalError::RegisterExhaustion { .. }));
    }

    #[test]
    fn rank_three_succeeds() {
        let mut prog = parse_program("int main(){ return (1+2)+(3+4); }").unwrap();
        assert!(allocate(&mut prog).is_ok());
    }

    #[test]
    fn call_arguments_get_independent_fresh_pools() {
        let prog = alloc("int f(int a,int b){return a;} int main(){ return f(1+2*3,4+5*6); }");
        let Stmt::Return { value: Some(e), .. } = &prog.functions[1].body[0] else {
            panic!()
        };
        let ExprKind::Call { args, .. } = &e.kind else {
            panic!()
        };
        // Each rank-3 argument must have allocated successfully on its own.
        assert_eq!(args[0].rank, 3);
        assert_eq!(args[1].rank, 3);
    }
}
