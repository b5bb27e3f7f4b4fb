//! The AST (§3.5): a tree of typed nodes the parser builds once and every
//! later pass treats as read-only. Every node carries its source line.

use crate::types::{PrimitiveType, SymbolType};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub name: String,
    pub globals: Vec<VarDecl>,
    pub main_body: Vec<Stmt>,
    pub functions: Vec<FuncDecl>,
}

/// One `inteiro a, b` / `matriz[3][4] de inteiro m` style declaration: one
/// type shared by one or more names (§3.5, confirmed against the original
/// `SemanticAnalyzer::primitivo`/`matriz` walkers, which register a single
/// type token against a list of identifiers).
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub ty: SymbolType,
    pub names: Vec<String>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: SymbolType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: String,
    /// `None` means the function is a NULO-returning procedure.
    pub return_type: Option<PrimitiveType>,
    pub params: Vec<Param>,
    pub locals: Vec<VarDecl>,
    pub body: Vec<Stmt>,
    pub line: u32,
}

/// An lvalue: a name, optionally indexed for matrix element access.
#[derive(Debug, Clone, PartialEq)]
pub struct LValue {
    pub name: String,
    pub indices: Vec<Expr>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        target: LValue,
        value: Expr,
        line: u32,
    },
    Call(FuncCall),
    Return {
        value: Option<Expr>,
        line: u32,
    },
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
        line: u32,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        line: u32,
    },
    RepeatUntil {
        body: Vec<Stmt>,
        cond: Expr,
        line: u32,
    },
    /// `para lv de A ate B [passo [-]S]`. `step` is the signed step literal;
    /// the original grammar only ever permits a literal integer there (an
    /// optional leading `-` and an integer token), never a general
    /// expression — confirmed against `Interpreter::stm_para`.
    For {
        var: LValue,
        from: Expr,
        to: Expr,
        step: Option<i32>,
        body: Vec<Stmt>,
        line: u32,
    },
}

impl Stmt {
    pub fn line(&self) -> u32 {
        match self {
            Stmt::Assign { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::If { line, .. }
            | Stmt::While { line, .. }
            | Stmt::RepeatUntil { line, .. }
            | Stmt::For { line, .. } => *line,
            Stmt::Call(call) => call.line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    BitNot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Real(f64),
    Char(char),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal, u32),
    LValue(LValue),
    Call(FuncCall),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        line: u32,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        line: u32,
    },
}

impl Expr {
    pub fn line(&self) -> u32 {
        match self {
            Expr::Literal(_, line) => *line,
            Expr::LValue(lv) => lv.line,
            Expr::Call(call) => call.line,
            Expr::Unary { line, .. } | Expr::Binary { line, .. } => *line,
        }
    }
}
