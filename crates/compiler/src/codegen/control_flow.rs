//! Control-flow statement code generation. Grounded on `gen_stm_if`,
//! `gen_stm_while`, `gen_stm_for`, and `gen_stm_dowhile` in `cg.c`.
//!
//! The reference compiler decides whether a relational expression should
//! branch or materialize a 0/1 value by walking up to `e->parent` and
//! checking whether it is one of these four statement kinds. This rewrite
//! has no parent pointers, so the same decision is made by which function
//! the caller reaches for: these four statement generators call
//! [`gen_condition`](super::expr::gen_condition) directly on their
//! condition expression; every other use of an expression goes through
//! [`gen_expr`](super::expr::gen_expr), which always materializes a
//! relational result. `CondContext` names the branch-taken label for that
//! one call.
pub enum CondContext<'a> {
    Branch(&'a str),
}

use crate::ast::Stmt;
use crate::target::{Backend, CgResult};

use super::expr::{gen_condition, gen_expr};
use super::LabelAllocator;

pub fn gen_stmt(
    out: &mut String,
    backend: &dyn Backend,
    labels: &mut LabelAllocator,
    func_end_label: &str,
    s: &Stmt,
) -> CgResult<()> {
    match s {
        Stmt::Block(stmts) => {
            for s in stmts {
                gen_stmt(out, backend, labels, func_end_label, s)?;
            }
            Ok(())
        }
        Stmt::Decl => Ok(()),
        Stmt::Expr(e) => gen_expr(out, backend, e, false).map(|_| ()),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => gen_if(out, backend, labels, func_end_label, cond, then_branch, else_branch.as_deref()),
        Stmt::While { cond, body } => gen_while(out, backend, labels, func_end_label, cond, body),
        Stmt::For {
            init,
            cond,
            step,
            body,
        } => gen_for(out, backend, labels, func_end_label, init, cond, step, body),
        Stmt::DoWhile { body, cond } => gen_do_while(out, backend, labels, func_end_label, body, cond),
        Stmt::Return { value, .. } => {
            if let Some(e) = value {
                gen_expr(out, backend, e, true)?;
                backend.ret_assign(out, e.reg.expect("assigned"))?;
            }
            backend.jmp(out, func_end_label)
        }
    }
}

fn gen_if(
    out: &mut String,
    backend: &dyn Backend,
    labels: &mut LabelAllocator,
    func_end_label: &str,
    cond: &crate::ast::Expr,
    then_branch: &Stmt,
    else_branch: Option<&Stmt>,
) -> CgResult<()> {
    let l_end = labels.next();
    let l_cmp = if else_branch.is_some() { labels.next() } else { l_end };

    gen_condition(out, backend, cond, CondContext::Branch(&labels.name(l_cmp)))?;
    gen_stmt(out, backend, labels, func_end_label, then_branch)?;
    if let Some(else_branch) = else_branch {
        backend.jmp(out, &labels.name(l_end))?;
        labels.emit(out, l_cmp)?;
        gen_stmt(out, backend, labels, func_end_label, else_branch)?;
    }
    labels.emit(out, l_end)?;
    Ok(())
}

fn gen_while(
    out: &mut String,
    backend: &dyn Backend,
    labels: &mut LabelAllocator,
    func_end_label: &str,
    cond: &crate::ast::Expr,
    body: &Stmt,
) -> CgResult<()> {
    let l_begin = labels.next();
    let l_exit = labels.next();
    labels.emit(out, l_begin)?;
    gen_condition(out, backend, cond, CondContext::Branch(&labels.name(l_exit)))?;
    gen_stmt(out, backend, labels, func_end_label, body)?;
    backend.jmp(out, &labels.name(l_begin))?;
    labels.emit(out, l_exit)?;
    Ok(())
}

fn gen_for(
    out: &mut String,
    backend: &dyn Backend,
    labels: &mut LabelAllocator,
    func_end_label: &str,
    init: &Option<crate::ast::Expr>,
    cond: &Option<crate::ast::Expr>,
    step: &Option<crate::ast::Expr>,
    body: &Stmt,
) -> CgResult<()> {
    let l_begin = labels.next();
    let l_exit = labels.next();
    if let Some(init) = init {
        gen_expr(out, backend, init, false)?;
    }
    labels.emit(out, l_begin)?;
    if let Some(cond) = cond {
        gen_condition(out, backend, cond, CondContext::Branch(&labels.name(l_exit)))?;
    }
    gen_stmt(out, backend, labels, func_end_label, body)?;
    if let Some(step) = step {
        gen_expr(out, backend, step, false)?;
    }
    backend.jmp(out, &labels.name(l_begin))?;
    labels.emit(out, l_exit)?;
    Ok(())
}

fn gen_do_while(
    out: &mut String,
    backend: &dyn Backend,
    labels: &mut LabelAllocator,
    func_end_label: &str,
    body: &Stmt,
    cond: &crate::ast::Expr,
) -> CgResult<()> {
    let l_begin = labels.next();
    let l_exit = labels.next();
    labels.emit(out, l_begin)?;
    gen_stmt(out, backend, labels, func_end_label, body)?;
    gen_condition(out, backend, cond, CondContext::Branch(&labels.name(l_exit)))?;
    backend.jmp(out, &labels.name(l_begin))?;
    labels.emit(out, l_exit)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;
    use crate::regalloc;
    use crate::target::Platform;

    fn codegen_func_body(src: &str) -> String {
        let mut prog = parse_program(src).unwrap();
        regalloc::allocate(&mut prog).unwrap();
        let backend = Platform::Linux.backend();
        let func = &prog.functions[0];
        backend.assign_frame(&func.params, &func.autovars);
        let mut out = String::new();
        let mut labels = LabelAllocator::new();
        for s in &func.body {
            gen_stmt(&mut out, backend.as_ref(), &mut labels, "_END_main", s).unwrap();
        }
        out
    }

    #[test]
    fn while_loop_branches_on_inverted_relation_without_materializing() {
        let text = codegen_func_body("int main(){ int i; i=0; while(i<10){ i=i+1; } return i; }");
        assert!(text.contains("jge\t.L1"));
        assert!(!text.contains("setl"));
    }

    #[test]
    fn if_else_emits_both_branch_labels() {
        let text = codegen_func_body("int main(){ int x; x=1; if(x<1){ x=2; } else { x=3; } return x; }");
        assert!(text.contains(".L0:"));
        assert!(text.contains(".L1:"));
    }
}
