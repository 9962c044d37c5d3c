//! Recursive-descent parser. Builds the AST directly from the grammar in
//! §6 of the spec and performs declaration/use checking inline, exactly as
//! the reference compiler's parser actions do (§4.1-4.3): there is no
//! separate "resolver" pass, because lookups only ever need the scope
//! under construction, which the parser already holds.

use std::rc::Rc;

use crate::ast::*;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::symtab::SymbolTable;

pub fn parse_program(src: &str) -> Result<Program, Vec<Diagnostic>> {
    let tokens = match Lexer::new(src).tokenize() {
        Ok(t) => t,
        Err((line, message)) => {
            let mut diags = Diagnostics::new();
            diags.report(line, message);
            return Err(diags.into_vec());
        }
    };
    let mut parser = Parser {
        tokens,
        pos: 0,
        diags: Diagnostics::new(),
        symtab: SymbolTable::new(),
        next_id: 1,
    };
    let program = parser.parse_program_body();
    if parser.diags.is_empty() {
        Ok(program)
    } else {
        Err(parser.diags.into_vec())
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diags: Diagnostics,
    symtab: SymbolTable,
    next_id: u32,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_line(&self) -> u32 {
        self.tokens[self.pos].line
    }

    fn peek2(&self) -> &TokenKind {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].kind
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) {
        if !self.eat(&kind) {
            let line = self.peek_line();
            self.diags.report(
                line,
                format!("expected {kind}, found {}", self.peek()),
            );
        }
    }

    /// Skips tokens until one that plausibly starts a new statement or
    /// closes the current block, so a single malformed statement doesn't
    /// cascade into spurious follow-on errors.
    fn synchronize(&mut self) {
        loop {
            match self.peek() {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::Eof
                | TokenKind::RBrace
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Do
                | TokenKind::Return
                | TokenKind::Int
                | TokenKind::LBrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn expect_ident(&mut self) -> String {
        if let TokenKind::Ident(name) = self.peek().clone() {
            self.advance();
            name
        } else {
            let line = self.peek_line();
            self.diags
                .report(line, format!("expected identifier, found {}", self.peek()));
            String::new()
        }
    }

    fn parse_program_body(&mut self) -> Program {
        let mut functions = Vec::new();
        while !self.at_eof() {
            if let Some(f) = self.parse_function_def() {
                functions.push(f);
            } else {
                self.synchronize();
            }
        }
        Program { functions }
    }

    fn parse_function_def(&mut self) -> Option<Function> {
        let line = self.peek_line();
        self.expect(TokenKind::Int);
        let name = self.expect_ident();
        if !self.symtab.append_function(&name) {
            self.diags
                .report(line, format!("Duplicate function declaration: {name}"));
        }
        self.expect(TokenKind::LParen);

        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let pline = self.peek_line();
                self.expect(TokenKind::Int);
                let pname = self.expect_ident();
                let ordinal = params.len() as u32 + 1;
                match self.symtab.append_var(&pname, SymbolKind::Param, ordinal) {
                    Some(sym) => params.push(sym),
                    None => self
                        .diags
                        .report(pline, format!("Duplicate argument declaration: {pname}")),
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen);

        let mut autovars = Vec::new();
        let body = self.parse_compound(&mut autovars);
        self.symtab.commit();

        let id = self.next_id;
        self.next_id += 1;
        Some(Function {
            id,
            name,
            params,
            autovars,
            body,
        })
    }

    fn parse_compound(&mut self, autovars: &mut Vec<Rc<Symbol>>) -> Vec<Stmt> {
        self.expect(TokenKind::LBrace);
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            stmts.push(self.parse_stmt(autovars));
        }
        self.expect(TokenKind::RBrace);
        stmts
    }

    fn parse_stmt(&mut self, autovars: &mut Vec<Rc<Symbol>>) -> Stmt {
        match self.peek() {
            TokenKind::LBrace => Stmt::Block(self.parse_compound(autovars)),
            TokenKind::Int => self.parse_decl(autovars),
            TokenKind::If => self.parse_if(autovars),
            TokenKind::While => self.parse_while(autovars),
            TokenKind::For => self.parse_for(autovars),
            TokenKind::Do => self.parse_do_while(autovars),
            TokenKind::Return => self.parse_return(),
            TokenKind::Semi => {
                self.advance();
                Stmt::Block(Vec::new())
            }
            _ => {
                let e = self.parse_expr();
                self.expect(TokenKind::Semi);
                Stmt::Expr(e)
            }
        }
    }

    fn parse_decl(&mut self, autovars: &mut Vec<Rc<Symbol>>) -> Stmt {
        self.expect(TokenKind::Int);
        loop {
            let line = self.peek_line();
            let name = self.expect_ident();
            match self.symtab.append_var(&name, SymbolKind::AutoVar, 0) {
                Some(sym) => autovars.push(sym),
                None => self
                    .diags
                    .report(line, format!("Duplicate variable declaration: {name}")),
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semi);
        Stmt::Decl
    }

    fn parse_if(&mut self, autovars: &mut Vec<Rc<Symbol>>) -> Stmt {
        self.expect(TokenKind::If);
        self.expect(TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen);
        let then_branch = Box::new(self.parse_stmt(autovars));
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_stmt(autovars)))
        } else {
            None
        };
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        }
    }

    fn parse_while(&mut self, autovars: &mut Vec<Rc<Symbol>>) -> Stmt {
        self.expect(TokenKind::While);
        self.expect(TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen);
        let body = Box::new(self.parse_stmt(autovars));
        Stmt::While { cond, body }
    }

    fn parse_for(&mut self, autovars: &mut Vec<Rc<Symbol>>) -> Stmt {
        self.expect(TokenKind::For);
        self.expect(TokenKind::LParen);
        let init = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(TokenKind::Semi);
        let cond = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(TokenKind::Semi);
        let step = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(TokenKind::RParen);
        let body = Box::new(self.parse_stmt(autovars));
        Stmt::For {
            init,
            cond,
            step,
            body,
        }
    }

    fn parse_do_while(&mut self, autovars: &mut Vec<Rc<Symbol>>) -> Stmt {
        self.expect(TokenKind::Do);
        let body = Box::new(self.parse_stmt(autovars));
        self.expect(TokenKind::While);
        self.expect(TokenKind::LParen);
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen);
        self.expect(TokenKind::Semi);
        Stmt::DoWhile { body, cond }
    }

    fn parse_return(&mut self) -> Stmt {
        let line = self.peek_line();
        self.expect(TokenKind::Return);
        let value = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(TokenKind::Semi);
        Stmt::Return { value, line }
    }

    // --- expressions, lowest to highest precedence ---

    fn parse_expr(&mut self) -> Expr {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Expr {
        if let TokenKind::Ident(name) = self.peek().clone() {
            if self.peek2() == &TokenKind::Assign {
                let line = self.peek_line();
                self.advance(); // identifier
                self.advance(); // '='
                let binding = self.symtab.lookup_current(&name);
                if binding.is_none() {
                    self.diags
                        .report(line, format!("Undeclared variable: {name}"));
                }
                let value = Box::new(self.parse_assignment());
                return Expr::new(
                    line,
                    ExprKind::Assign {
                        target: name,
                        binding,
                        value,
                    },
                );
            }
        }
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Expr {
        let mut lhs = self.parse_relational();
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => RelOp::Eq,
                TokenKind::NotEq => RelOp::Ne,
                _ => break,
            };
            let line = self.peek_line();
            self.advance();
            let rhs = self.parse_relational();
            lhs = Expr::new(
                line,
                ExprKind::Rel {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            );
        }
        lhs
    }

    fn parse_relational(&mut self) -> Expr {
        let mut lhs = self.parse_additive();
        loop {
            let op = match self.peek() {
                TokenKind::Lt => RelOp::Lt,
                TokenKind::Le => RelOp::Le,
                TokenKind::Gt => RelOp::Gt,
                TokenKind::Ge => RelOp::Ge,
                _ => break,
            };
            let line = self.peek_line();
            self.advance();
            let rhs = self.parse_additive();
            lhs = Expr::new(
                line,
                ExprKind::Rel {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            );
        }
        lhs
    }

    fn parse_additive(&mut self) -> Expr {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.peek() {
                TokenKind::Plus => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                _ => break,
            };
            let line = self.peek_line();
            self.advance();
            let rhs = self.parse_multiplicative();
            lhs = Expr::new(
                line,
                ExprKind::Arith {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            );
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.peek() {
                TokenKind::Star => ArithOp::Mul,
                TokenKind::Slash => ArithOp::Div,
                _ => break,
            };
            let line = self.peek_line();
            self.advance();
            let rhs = self.parse_unary();
            lhs = Expr::new(
                line,
                ExprKind::Arith {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            );
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        let line = self.peek_line();
        let op = match self.peek() {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = Box::new(self.parse_unary());
            Expr::new(line, ExprKind::Unary { op, operand })
        } else {
            self.parse_postfix()
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Expr {
        let line = self.peek_line();
        match self.peek().clone() {
            TokenKind::IntLit(v) => {
                self.advance();
                Expr::new(line, ExprKind::IntLit(v))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_assignment());
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen);
                    // The callee identifier is not bound against the symbol
                    // table; see DESIGN.md for why this gap is preserved.
                    Expr::new(line, ExprKind::Call { callee: name, args })
                } else {
                    let binding = self.symtab.lookup_current(&name);
                    if binding.is_none() {
                        self.diags
                            .report(line, format!("Undeclared variable: {name}"));
                    }
                    Expr::new(line, ExprKind::Ident { name, binding })
                }
            }
            TokenKind::LParen => {
                self.advance();
                let e = self.parse_expr();
                self.expect(TokenKind::RParen);
                e
            }
            other => {
                self.diags
                    .report(line, format!("expected expression, found {other}"));
                self.advance();
                Expr::new(line, ExprKind::IntLit(0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_program() {
        let prog = parse_program("int main(){ return 1+2*3; }").unwrap();
        assert_eq!(prog.functions.len(), 1);
        assert_eq!(prog.functions[0].name, "main");
    }

    #[test]
    fn reports_undeclared_variable() {
        let err = parse_program("int main(){ return x; }").unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err[0].message.contains("Undeclared variable: x"));
    }

    #[test]
    fn reports_duplicate_declaration() {
        let err = parse_program("int main(){ int a; int a; return 0; }").unwrap_err();
        assert!(err.iter().any(|d| d.message.contains("Duplicate variable declaration: a")));
    }

    #[test]
    fn reports_duplicate_function() {
        let err = parse_program("int f(){return 0;} int f(){return 1;}").unwrap_err();
        assert!(err.iter().any(|d| d.message.contains("Duplicate function declaration: f")));
    }

    #[test]
    fn parses_params_and_calls() {
        let prog = parse_program(
            "int f(int a,int b){return a-b;} int main(){ f(10,3); return 0; }",
        )
        .unwrap();
        assert_eq!(prog.functions[0].params.len(), 2);
        match &prog.functions[1].body[0] {
            Stmt::Expr(Expr {
                kind: ExprKind::Call { callee, args },
                ..
            }) => {
                assert_eq!(callee, "f");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call statement, got {other:?}"),
        }
    }

    #[test]
    fn assignment_is_right_associative() {
        let prog = parse_program("int main(){ int a,b; a=b=1; return 0; }").unwrap();
        match &prog.functions[0].body[1] {
            Stmt::Expr(Expr {
                kind: ExprKind::Assign { value, .. },
                ..
            }) => {
                assert!(matches!(value.kind, ExprKind::Assign { .. }));
            }
            other => panic!("unexpected stmt {other:?}"),
        }
    }
}
