//! Hand-written recursive-descent parser (§1.1): one function per grammar
//! production in §4.4, building the `gpt_core::ast` tree directly. Thin by
//! design — it is the adapter between token stream and AST, not where the
//! toolchain's engineering effort concentrates.

use std::fmt;

use gpt_core::{
    BinOp, Expr, FuncCall, FuncDecl, LValue, Literal, Param, Program, Stmt, SymbolType, UnaryOp,
    VarDecl,
};
use gpt_core::PrimitiveType;

use crate::lexer::{Lexer, Tok, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source)
            .tokenize()
            .map_err(|e| ParseError { message: e.message, line: e.line })?;
        Ok(Parser { tokens, pos: 0 })
    }

    pub fn parse(&mut self) -> Result<Program, ParseError> {
        self.parse_program()
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn line(&self) -> u32 {
        self.cur().line
    }

    fn check(&self, tok: &Tok) -> bool {
        &self.cur().tok == tok
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, tok: Tok) -> Result<Token, ParseError> {
        if self.check(&tok) {
            Ok(self.advance())
        } else {
            Err(ParseError {
                message: format!("esperado {tok}, encontrado {}", self.cur().tok),
                line: self.line(),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.cur().tok.clone() {
            Tok::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParseError {
                message: format!("esperado identificador, encontrado {other}"),
                line: self.line(),
            }),
        }
    }

    // ---- top level ----

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        self.expect(Tok::Algoritmo)?;
        let name = self.expect_ident()?;

        let globals = if self.check(&Tok::Variaveis) {
            self.parse_var_block()?
        } else {
            Vec::new()
        };

        self.expect(Tok::Inicio)?;
        let mut main_body = Vec::new();
        while !self.check(&Tok::Fim) {
            main_body.push(self.parse_stmt()?);
        }
        self.expect(Tok::Fim)?;

        let mut functions = Vec::new();
        while self.check(&Tok::Funcao) {
            functions.push(self.parse_func_decl()?);
        }
        self.expect(Tok::Eof)?;

        Ok(Program { name, globals, main_body, functions })
    }

    fn parse_var_block(&mut self) -> Result<Vec<VarDecl>, ParseError> {
        self.expect(Tok::Variaveis)?;
        let mut decls = Vec::new();
        while self.starts_type() {
            decls.push(self.parse_var_decl()?);
        }
        self.expect(Tok::FimVariaveis)?;
        Ok(decls)
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.cur().tok,
            Tok::Inteiro | Tok::RealKw | Tok::Caractere | Tok::LiteralKw | Tok::Logico | Tok::Matriz
        )
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, ParseError> {
        let line = self.line();
        let ty = self.parse_type()?;
        let mut names = vec![self.expect_ident()?];
        while self.check(&Tok::Comma) {
            self.advance();
            names.push(self.expect_ident()?);
        }
        Ok(VarDecl { ty, names, line })
    }

    fn parse_type(&mut self) -> Result<SymbolType, ParseError> {
        if self.check(&Tok::Matriz) {
            let line = self.line();
            self.advance();
            let mut dims = Vec::new();
            self.expect(Tok::LBracket)?;
            dims.push(self.parse_dim()?);
            self.expect(Tok::RBracket)?;
            while self.check(&Tok::LBracket) {
                self.advance();
                dims.push(self.parse_dim()?);
                self.expect(Tok::RBracket)?;
            }
            self.expect(Tok::De)?;
            let element = self.parse_primitive()?;
            SymbolType::matrix(element, dims).map_err(|e| ParseError {
                message: e.to_string(),
                line,
            })
        } else {
            Ok(SymbolType::Primitive(self.parse_primitive()?))
        }
    }

    fn parse_dim(&mut self) -> Result<u32, ParseError> {
        match self.cur().tok.clone() {
            Tok::IntLit(n) if n > 0 => {
                self.advance();
                Ok(n as u32)
            }
            other => Err(ParseError {
                message: format!("dimensão de matriz deve ser um inteiro positivo, encontrado {other}"),
                line: self.line(),
            }),
        }
    }

    fn parse_primitive(&mut self) -> Result<PrimitiveType, ParseError> {
        let line = self.line();
        let ty = match self.cur().tok {
            Tok::Inteiro => PrimitiveType::Inteiro,
            Tok::RealKw => PrimitiveType::Real,
            Tok::Caractere => PrimitiveType::Caractere,
            Tok::LiteralKw => PrimitiveType::Literal,
            Tok::Logico => PrimitiveType::Logico,
            ref other => {
                return Err(ParseError {
                    message: format!("esperado um tipo primitivo, encontrado {other}"),
                    line,
                });
            }
        };
        self.advance();
        Ok(ty)
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl, ParseError> {
        let line = self.line();
        self.expect(Tok::Funcao)?;
        let name = self.expect_ident()?;
        self.expect(Tok::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Tok::RParen) {
            loop {
                let ty = self.parse_type()?;
                let pname = self.expect_ident()?;
                params.push(Param { name: pname, ty });
                if self.check(&Tok::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(Tok::RParen)?;

        let return_type = if self.check(&Tok::Colon) {
            self.advance();
            Some(self.parse_primitive()?)
        } else {
            None
        };

        let locals = if self.check(&Tok::Variaveis) {
            self.parse_var_block()?
        } else {
            Vec::new()
        };

        self.expect(Tok::Inicio)?;
        let mut body = Vec::new();
        while !self.check(&Tok::Fim) {
            body.push(self.parse_stmt()?);
        }
        self.expect(Tok::Fim)?;

        Ok(FuncDecl { name, return_type, params, locals, body, line })
    }

    // ---- statements ----

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.cur().tok {
            Tok::Se => self.parse_if(),
            Tok::Enquanto => self.parse_while(),
            Tok::Repita => self.parse_repeat_until(),
            Tok::Para => self.parse_for(),
            Tok::Retorne => self.parse_return(),
            Tok::Ident(_) => self.parse_assign_or_call(),
            ref other => Err(ParseError {
                message: format!("comando inesperado {other}"),
                line: self.line(),
            }),
        }
    }

    fn parse_block_until(&mut self, terminators: &[Tok]) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        while !terminators.iter().any(|t| self.check(t)) {
            if self.check(&Tok::Eof) {
                return Err(ParseError {
                    message: "fim de arquivo inesperado dentro de um bloco".to_string(),
                    line: self.line(),
                });
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect(Tok::Se)?;
        let cond = self.parse_expr()?;
        self.expect(Tok::Entao)?;
        let then_branch = self.parse_block_until(&[Tok::Senao, Tok::FimSe])?;
        let else_branch = if self.check(&Tok::Senao) {
            self.advance();
            self.parse_block_until(&[Tok::FimSe])?
        } else {
            Vec::new()
        };
        self.expect(Tok::FimSe)?;
        Ok(Stmt::If { cond, then_branch, else_branch, line })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect(Tok::Enquanto)?;
        let cond = self.parse_expr()?;
        let body = self.parse_block_until(&[Tok::FimEnquanto])?;
        self.expect(Tok::FimEnquanto)?;
        Ok(Stmt::While { cond, body, line })
    }

    fn parse_repeat_until(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect(Tok::Repita)?;
        let body = self.parse_block_until(&[Tok::Ate])?;
        self.expect(Tok::Ate)?;
        let cond = self.parse_expr()?;
        Ok(Stmt::RepeatUntil { body, cond, line })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect(Tok::Para)?;
        let var = self.parse_lvalue()?;
        self.expect(Tok::De)?;
        let from = self.parse_expr()?;
        self.expect(Tok::Ate)?;
        let to = self.parse_expr()?;
        let step = if self.check(&Tok::Passo) {
            self.advance();
            let negative = if self.check(&Tok::Minus) {
                self.advance();
                true
            } else {
                false
            };
            let step_line = self.line();
            let magnitude = match self.cur().tok.clone() {
                Tok::IntLit(n) => {
                    self.advance();
                    n
                }
                other => {
                    return Err(ParseError {
                        message: format!("passo de 'para' deve ser um literal inteiro, encontrado {other}"),
                        line: step_line,
                    });
                }
            };
            Some(if negative { -(magnitude as i32) } else { magnitude as i32 })
        } else {
            None
        };
        let body = self.parse_block_until(&[Tok::FimPara])?;
        self.expect(Tok::FimPara)?;
        Ok(Stmt::For { var, from, to, step, body, line })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        self.expect(Tok::Retorne)?;
        let value = if self.starts_expr() { Some(self.parse_expr()?) } else { None };
        Ok(Stmt::Return { value, line })
    }

    fn starts_expr(&self) -> bool {
        matches!(
            self.cur().tok,
            Tok::LParen
                | Tok::Ident(_)
                | Tok::IntLit(_)
                | Tok::RealLit(_)
                | Tok::CharLit(_)
                | Tok::StrLit(_)
                | Tok::Verdadeiro
                | Tok::Falso
                | Tok::Minus
                | Tok::Plus
                | Tok::Nao
                | Tok::Tilde
        )
    }

    fn parse_assign_or_call(&mut self) -> Result<Stmt, ParseError> {
        let line = self.line();
        let name = self.expect_ident()?;
        if self.check(&Tok::LParen) {
            let args = self.parse_call_args()?;
            return Ok(Stmt::Call(FuncCall { name, args, line }));
        }
        let mut indices = Vec::new();
        while self.check(&Tok::LBracket) {
            self.advance();
            indices.push(self.parse_expr()?);
            self.expect(Tok::RBracket)?;
        }
        self.expect(Tok::Assign)?;
        let value = self.parse_expr()?;
        Ok(Stmt::Assign { target: LValue { name, indices, line }, value, line })
    }

    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(Tok::LParen)?;
        let mut args = Vec::new();
        if !self.check(&Tok::RParen) {
            args.push(self.parse_expr()?);
            while self.check(&Tok::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(Tok::RParen)?;
        Ok(args)
    }

    fn parse_lvalue(&mut self) -> Result<LValue, ParseError> {
        let line = self.line();
        let name = self.expect_ident()?;
        let mut indices = Vec::new();
        while self.check(&Tok::LBracket) {
            self.advance();
            indices.push(self.parse_expr()?);
            self.expect(Tok::RBracket)?;
        }
        Ok(LValue { name, indices, line })
    }

    // ---- expressions (§4.4 ladder) ----

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_binop_level(0)
    }

    fn parse_binop_level(&mut self, level: usize) -> Result<Expr, ParseError> {
        const LEVELS: &[&[(Tok, BinOp)]] = &[
            &[(Tok::Ou, BinOp::Or)],
            &[(Tok::E, BinOp::And)],
            &[(Tok::Pipe, BinOp::BitOr)],
            &[(Tok::Caret, BinOp::BitXor)],
            &[(Tok::Amp, BinOp::BitAnd)],
            &[(Tok::EqEq, BinOp::Eq), (Tok::NotEq, BinOp::Ne)],
            &[
                (Tok::Lt, BinOp::Lt),
                (Tok::Gt, BinOp::Gt),
                (Tok::Le, BinOp::Le),
                (Tok::Ge, BinOp::Ge),
            ],
            &[(Tok::Plus, BinOp::Add), (Tok::Minus, BinOp::Sub)],
            &[(Tok::Star, BinOp::Mul), (Tok::Slash, BinOp::Div), (Tok::Percent, BinOp::Mod)],
        ];

        if level == LEVELS.len() {
            return self.parse_unary();
        }

        let mut lhs = self.parse_binop_level(level + 1)?;
        loop {
            let op = LEVELS[level].iter().find(|(t, _)| self.check(t)).map(|(_, op)| *op);
            let Some(op) = op else { break };
            let line = self.line();
            self.advance();
            let rhs = self.parse_binop_level(level + 1)?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs), line };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        let op = match self.cur().tok {
            Tok::Minus => Some(UnaryOp::Neg),
            Tok::Plus => Some(UnaryOp::Pos),
            Tok::Nao => Some(UnaryOp::Not),
            Tok::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op, operand: Box::new(operand), line });
        }
        self.parse_element()
    }

    fn parse_element(&mut self) -> Result<Expr, ParseError> {
        let line = self.line();
        match self.cur().tok.clone() {
            Tok::LParen => {
                self.advance();
                let e = self.parse_expr()?;
                self.expect(Tok::RParen)?;
                Ok(e)
            }
            Tok::IntLit(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Int(n), line))
            }
            Tok::RealLit(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Real(n), line))
            }
            Tok::CharLit(c) => {
                self.advance();
                Ok(Expr::Literal(Literal::Char(c), line))
            }
            Tok::StrLit(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::Str(s), line))
            }
            Tok::Verdadeiro => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true), line))
            }
            Tok::Falso => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false), line))
            }
            Tok::Ident(name) => {
                self.advance();
                if self.check(&Tok::LParen) {
                    let args = self.parse_call_args()?;
                    return Ok(Expr::Call(FuncCall { name, args, line }));
                }
                let mut indices = Vec::new();
                while self.check(&Tok::LBracket) {
                    self.advance();
                    indices.push(self.parse_expr()?);
                    self.expect(Tok::RBracket)?;
                }
                Ok(Expr::LValue(LValue { name, indices, line }))
            }
            other => Err(ParseError {
                message: format!("expressão inválida, encontrado {other}"),
                line,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Program {
        Parser::new(src).unwrap().parse().unwrap()
    }

    #[test]
    fn parses_scenario_s1_soma() {
        let program = parse(
            r#"
            algoritmo Soma
            variaveis
              inteiro a, b, s
            fim-variaveis
            inicio
              a := 3
              b := 4
              s := a + b
              imprima(s)
            fim
            "#,
        );
        assert_eq!(program.name, "Soma");
        assert_eq!(program.globals.len(), 1);
        assert_eq!(program.globals[0].names, vec!["a", "b", "s"]);
        assert_eq!(program.main_body.len(), 4);
    }

    #[test]
    fn parses_if_else() {
        let program = parse(
            r#"
            algoritmo T
            inicio
              se 3 > 2 entao
                imprima("s")
              senao
                imprima("n")
              fim-se
            fim
            "#,
        );
        assert!(matches!(program.main_body[0], Stmt::If { .. }));
    }

    #[test]
    fn parses_for_with_negative_step() {
        let program = parse(
            r#"
            algoritmo T
            inicio
              para i de 10 ate 1 passo -2
                imprima(i)
              fim-para
            fim
            "#,
        );
        match &program.main_body[0] {
            Stmt::For { step, .. } => assert_eq!(*step, Some(-2)),
            other => panic!("expected For, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_with_return_type_and_recursion() {
        let program = parse(
            r#"
            algoritmo Fatorial
            inicio
              imprima(fat(6))
            fim
            funcao fat(inteiro n): inteiro
            inicio
              se n <= 1 entao
                retorne 1
              fim-se
              retorne n * fat(n - 1)
            fim
            "#,
        );
        assert_eq!(program.functions.len(), 1);
        let f = &program.functions[0];
        assert_eq!(f.name, "fat");
        assert_eq!(f.params.len(), 1);
        assert!(f.return_type.is_some());
    }

    #[test]
    fn parses_matrix_declaration() {
        let program = parse(
            r#"
            algoritmo M
            variaveis
              matriz[3][4] de inteiro m
            fim-variaveis
            inicio
            fim
            "#,
        );
        match &program.globals[0].ty {
            SymbolType::Matrix { dims, .. } => assert_eq!(dims, &vec![3, 4]),
            other => panic!("expected Matrix, got {other:?}"),
        }
    }

    #[test]
    fn respects_operator_precedence() {
        // 2 + 3 * 4 should parse as 2 + (3 * 4)
        let program = parse(
            r#"
            algoritmo T
            inicio
              x := 2 + 3 * 4
            fim
            "#,
        );
        match &program.main_body[0] {
            Stmt::Assign { value: Expr::Binary { op: BinOp::Add, rhs, .. }, .. } => {
                assert!(matches!(**rhs, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected statement {other:?}"),
        }
    }
}
