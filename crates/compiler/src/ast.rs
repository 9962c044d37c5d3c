//! Typed AST nodes.
//!
//! The reference implementation represents every node as a single struct
//! carrying a `kind`/`sub_kind` integer pair, a doubly-linked circular child
//! list, and both `parent` and `parent_list` back-pointers. Here that
//! becomes a handful of tagged enums over owned `Vec`s; upward navigation
//! (used by the reference compiler to decide whether a relational operator
//! should branch or materialize a value) is replaced by an explicit context
//! parameter threaded through code generation instead — see
//! `codegen::CondContext`.

use std::cell::Cell;
use std::rc::Rc;

/// The role a symbol-table entry plays, mirroring `SYM_*` in the reference
/// compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Param,
    AutoVar,
}

/// A symbol-table entry. Shared (`Rc`) between the declaring scope and every
/// identifier expression bound to it, so that the frame-layout pass can
/// stamp `offset` in place after parsing completes and every use-site sees
/// the update without a second name-lookup pass.
#[derive(Debug)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// 1-based ordinal among parameters; 0 for non-parameters.
    pub param_ordinal: u32,
    /// Stack offset in bytes, assigned by the frame-layout pass. Functions
    /// never have this set.
    pub offset: Cell<i32>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, param_ordinal: u32) -> Rc<Symbol> {
        Rc::new(Symbol {
            name: name.into(),
            kind,
            param_ordinal,
            offset: Cell::new(0),
        })
    }
}

/// Binary arithmetic operators (excludes relational/equality, modeled
/// separately so the code generator can dispatch branch-vs-materialize
/// without re-testing the operator kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    /// Parsed, never reaches the back end: `codegen` raises
    /// `CodeGenError::Logic` the moment it is encountered.
    Div,
}

/// Relational/equality operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl RelOp {
    /// The mnemonic suffix to use when the branch should be taken for the
    /// *inverse* of this relation (§4.7's jump-if-false table).
    pub fn inverted(self) -> RelOp {
        match self {
            RelOp::Lt => RelOp::Ge,
            RelOp::Gt => RelOp::Le,
            RelOp::Le => RelOp::Gt,
            RelOp::Ge => RelOp::Lt,
            RelOp::Eq => RelOp::Ne,
            RelOp::Ne => RelOp::Eq,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// An expression node. `rank` and `reg` are produced-once, consumed-once
/// decorations stamped in place by `regalloc`, mirroring the reference
/// compiler's in-place mutation of the same fields (there they live
/// directly on the shared node struct; here each is still a plain field
/// since the register-allocation passes hold `&mut Expr`).
#[derive(Debug)]
pub struct Expr {
    pub line: u32,
    pub kind: ExprKind,
    pub rank: u32,
    pub reg: Option<u8>,
}

impl Expr {
    pub fn new(line: u32, kind: ExprKind) -> Expr {
        Expr {
            line,
            kind,
            rank: 0,
            reg: None,
        }
    }
}

#[derive(Debug)]
pub enum ExprKind {
    IntLit(i32),
    /// An identifier reference. `binding` is `None` only transiently while
    /// the parser is still accumulating diagnostics for an unresolved name;
    /// by the time codegen runs every surviving program has every `Ident`
    /// bound (an unbound identifier aborts before codegen, per §4.2).
    Ident {
        name: String,
        binding: Option<Rc<Symbol>>,
    },
    Assign {
        target: String,
        binding: Option<Rc<Symbol>>,
        value: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Rel {
        op: RelOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
}

/// A statement node. Declarations carry no codegen-visible payload (the
/// names were already registered in the symbol table while parsing the
/// declaration), matching the reference compiler's `AST_STM_DEC` no-op.
#[derive(Debug)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Decl,
    /// An expression used as a statement. The reference compiler calls this
    /// `AST_STM_ASIGN`, but it wraps *any* expression, assignment or not
    /// (including a bare call whose result is discarded).
    Expr(Expr),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Expr>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    Return {
        value: Option<Expr>,
        line: u32,
    },
}

/// A function definition: name, committed parameter symbols (in
/// declaration order), and body.
#[derive(Debug)]
pub struct Function {
    pub id: u32,
    pub name: String,
    pub params: Vec<Rc<Symbol>>,
    pub autovars: Vec<Rc<Symbol>>,
    pub body: Vec<Stmt>,
}

/// A whole compiled program: every function definition in source order.
#[derive(Debug, Default)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_rel_ops_match_reference_table() {
        assert_eq!(RelOp::Lt.inverted(), RelOp::Ge);
        assert_eq!(RelOp::Gt.inverted(), RelOp::Le);
        assert_eq!(RelOp::Le.inverted(), RelOp::Gt);
        assert_eq!(RelOp::Ge.inverted(), RelOp::Lt);
        assert_eq!(RelOp::Eq.inverted(), RelOp::Ne);
        assert_eq!(RelOp::Ne.inverted(), RelOp::Eq);
    }

    #[test]
    fn symbol_offset_mutates_through_shared_handle() {
        let sym = Symbol::new("x", SymbolKind::AutoVar, 0);
        let other = Rc::clone(&sym);
        sym.offset.set(-4);
        assert_eq!(other.offset.get(), -4);
    }
}
