//! C source translator (§4.6): walks the same AST the interpreter walks
//! and emits a single freestanding C source file. Grounded on
//! `Portugol2CTranslator.cpp`'s `visitStmChamadaFunc`: `imprima` emits one
//! `printf` call per argument (no variadic folding into a single format
//! string) and `leia` emits a `scanf` whose conversion specifier is picked
//! from the target's declared type — both deliberately simplified per the
//! "one argument, naive" note carried from the original.
//!
//! Matrices and LITERAL buffers are represented as flat C arrays (row-major,
//! same offset arithmetic as `interpreter::Array`) so that both this
//! back-end and the x86 generator address matrix elements identically.
//! Matrix/LITERAL arguments decay to pointers at the C call boundary, so
//! pass-by-copy (§9) is restored by copying into a same-named local array
//! in the callee's prologue before the body runs.

use std::fmt::{self, Write as _};

use gpt_core::{
    BinOp, Expr, FuncCall, FuncDecl, LValue, Literal, PrimitiveType, Program, Stmt, SymbolType,
    UnaryOp, VarDecl,
};

use crate::builtins;
use crate::symtab::{SymbolTable, GLOBAL_SCOPE};

#[derive(Debug)]
pub enum CGenError {
    Logic(String),
    Format(fmt::Error),
}

impl fmt::Display for CGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CGenError::Logic(s) => write!(f, "{s}"),
            CGenError::Format(e) => write!(f, "erro ao gerar C: {e}"),
        }
    }
}

impl std::error::Error for CGenError {}

impl From<fmt::Error> for CGenError {
    fn from(e: fmt::Error) -> Self {
        CGenError::Format(e)
    }
}

const LITERAL_BUF_LEN: usize = 256;

fn c_scalar_type(p: PrimitiveType) -> &'static str {
    match p {
        PrimitiveType::Inteiro | PrimitiveType::Logico => "int",
        PrimitiveType::Real => "double",
        PrimitiveType::Caractere => "char",
        PrimitiveType::Literal => "char",
        PrimitiveType::Nulo => "void",
    }
}

fn escape_c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn escape_c_char(c: char) -> String {
    match c {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\t' => "'\\t'".to_string(),
        other => format!("'{other}'"),
    }
}

struct CGen<'a> {
    table: &'a SymbolTable,
    scope: String,
}

pub fn generate(program: &Program, table: &SymbolTable) -> Result<String, CGenError> {
    let mut gen = CGen { table, scope: GLOBAL_SCOPE.to_string() };
    let mut out = String::new();

    writeln!(out, "#include <stdio.h>")?;
    writeln!(out, "#include <stdlib.h>")?;
    writeln!(out, "#include <string.h>")?;
    writeln!(out, "#include <math.h>")?;
    writeln!(out)?;

    for f in &program.functions {
        writeln!(out, "{};", gen.func_signature(f))?;
    }
    if !program.functions.is_empty() {
        writeln!(out)?;
    }

    for decl in &program.globals {
        gen.emit_global_decl(&mut out, decl)?;
    }
    writeln!(out)?;

    for f in &program.functions {
        gen.emit_function(&mut out, f)?;
        writeln!(out)?;
    }

    writeln!(out, "int main(void) {{")?;
    gen.scope = GLOBAL_SCOPE.to_string();
    for stmt in &program.main_body {
        gen.emit_stmt(&mut out, stmt, 1)?;
    }
    writeln!(out, "    return 0;")?;
    writeln!(out, "}}")?;

    Ok(out)
}

impl<'a> CGen<'a> {
    fn func_signature(&self, f: &FuncDecl) -> String {
        let ret = match f.return_type {
            Some(p) => c_scalar_type(p),
            None => "void",
        };
        let params: Vec<String> = f
            .params
            .iter()
            .map(|p| match &p.ty {
                SymbolType::Primitive(PrimitiveType::Literal) => format!("char *{}_arg", p.name),
                SymbolType::Primitive(pt) => format!("{} {}", c_scalar_type(*pt), p.name),
                SymbolType::Matrix { element, .. } => format!("{} *{}_arg", c_scalar_type(*element), p.name),
            })
            .collect();
        let params_text = if params.is_empty() { "void".to_string() } else { params.join(", ") };
        format!("{ret} {}({params_text})", f.name)
    }

    fn emit_global_decl(&self, out: &mut String, decl: &VarDecl) -> Result<(), CGenError> {
        for name in &decl.names {
            match &decl.ty {
                SymbolType::Primitive(PrimitiveType::Literal) => {
                    writeln!(out, "char {name}[{LITERAL_BUF_LEN}];")?;
                }
                SymbolType::Primitive(p) => writeln!(out, "{} {name};", c_scalar_type(*p))?,
                SymbolType::Matrix { element, dims } => {
                    let count: u32 = dims.iter().product();
                    writeln!(out, "{} {name}[{count}];", c_scalar_type(*element))?;
                }
            }
        }
        Ok(())
    }

    fn emit_local_decl(&self, out: &mut String, decl: &VarDecl, indent: usize) -> Result<(), CGenError> {
        let pad = "    ".repeat(indent);
        for name in &decl.names {
            match &decl.ty {
                SymbolType::Primitive(PrimitiveType::Literal) => {
                    writeln!(out, "{pad}char {name}[{LITERAL_BUF_LEN}] = {{0}};")?;
                }
                SymbolType::Primitive(PrimitiveType::Real) => writeln!(out, "{pad}double {name} = 0.0;")?,
                SymbolType::Primitive(PrimitiveType::Caractere) => writeln!(out, "{pad}char {name} = 0;")?,
                SymbolType::Primitive(_) => writeln!(out, "{pad}int {name} = 0;")?,
                SymbolType::Matrix { element, dims } => {
                    let count: u32 = dims.iter().product();
                    writeln!(out, "{pad}{} {name}[{count}] = {{0}};", c_scalar_type(*element))?;
                }
            }
        }
        Ok(())
    }

    fn emit_function(&mut self, out: &mut String, f: &FuncDecl) -> Result<(), CGenError> {
        self.scope = f.name.clone();
        writeln!(out, "{} {{", self.func_signature(f))?;

        // Restore pass-by-copy across the C pointer-decay boundary (§9).
        for p in &f.params {
            match &p.ty {
                SymbolType::Primitive(PrimitiveType::Literal) => {
                    writeln!(out, "    char {}[{LITERAL_BUF_LEN}];", p.name)?;
                    writeln!(
                        out,
                        "    strncpy({0}, {0}_arg, {1}); {0}[{1}] = '\\0';",
                        p.name,
                        LITERAL_BUF_LEN - 1
                    )?;
                }
                SymbolType::Matrix { element, dims } => {
                    let count: u32 = dims.iter().product();
                    writeln!(out, "    {} {}[{count}];", c_scalar_type(*element), p.name)?;
                    writeln!(out, "    memcpy({0}, {0}_arg, sizeof({0}));", p.name)?;
                }
                SymbolType::Primitive(_) => {}
            }
        }

        for decl in &f.locals {
            self.emit_local_decl(out, decl, 1)?;
        }
        for stmt in &f.body {
            self.emit_stmt(out, stmt, 1)?;
        }

        // Falling off the end returns the declared type's zero value,
        // mirroring the interpreter (§9) instead of leaving C's UB in place.
        match f.return_type {
            Some(PrimitiveType::Real) => writeln!(out, "    return 0.0;")?,
            Some(PrimitiveType::Caractere) => writeln!(out, "    return 0;")?,
            Some(_) => writeln!(out, "    return 0;")?,
            None => {}
        }
        writeln!(out, "}}")?;
        Ok(())
    }

    fn emit_stmt(&mut self, out: &mut String, stmt: &Stmt, indent: usize) -> Result<(), CGenError> {
        let pad = "    ".repeat(indent);
        match stmt {
            Stmt::Assign { target, value, .. } => self.emit_assign(out, target, value, &pad)?,
            Stmt::Call(call) => self.emit_call_stmt(out, call, &pad)?,
            Stmt::Return { value, .. } => match value {
                Some(e) => writeln!(out, "{pad}return {};", self.expr_to_c(e))?,
                None => writeln!(out, "{pad}return;")?,
            },
            Stmt::If { cond, then_branch, else_branch, .. } => {
                writeln!(out, "{pad}if ({}) {{", self.expr_to_c(cond))?;
                for s in then_branch {
                    self.emit_stmt(out, s, indent + 1)?;
                }
                if else_branch.is_empty() {
                    writeln!(out, "{pad}}}")?;
                } else {
                    writeln!(out, "{pad}}} else {{")?;
                    for s in else_branch {
                        self.emit_stmt(out, s, indent + 1)?;
                    }
                    writeln!(out, "{pad}}}")?;
                }
            }
            Stmt::While { cond, body, .. } => {
                writeln!(out, "{pad}while ({}) {{", self.expr_to_c(cond))?;
                for s in body {
                    self.emit_stmt(out, s, indent + 1)?;
                }
                writeln!(out, "{pad}}}")?;
            }
            Stmt::RepeatUntil { body, cond, .. } => {
                writeln!(out, "{pad}do {{")?;
                for s in body {
                    self.emit_stmt(out, s, indent + 1)?;
                }
                writeln!(out, "{pad}}} while (!({}));", self.expr_to_c(cond))?;
            }
            Stmt::For { var, from, to, step, body, .. } => {
                self.emit_for(out, var, from, to, *step, body, indent)?;
            }
        }
        Ok(())
    }

    fn emit_assign(&mut self, out: &mut String, target: &LValue, value: &Expr, pad: &str) -> Result<(), CGenError> {
        if let Expr::Call(call) = value {
            if call.name == builtins::LEIA {
                self.emit_leia(out, target, pad)?;
                return Ok(());
            }
        }

        if target.indices.is_empty() {
            let ty = self.static_type(&Expr::LValue(target.clone()));
            if matches!(ty, SymbolType::Primitive(PrimitiveType::Literal)) {
                writeln!(
                    out,
                    "{pad}strncpy({0}, {1}, {2}); {0}[{2}] = '\\0';",
                    target.name,
                    self.expr_to_c(value),
                    LITERAL_BUF_LEN - 1
                )?;
            } else {
                writeln!(out, "{pad}{} = {};", target.name, self.expr_to_c(value))?;
            }
        } else {
            let offset = self.flat_index_expr(&target.name, &target.indices);
            writeln!(out, "{pad}{}[{offset}] = {};", target.name, self.expr_to_c(value))?;
        }
        Ok(())
    }

    fn emit_leia(&mut self, out: &mut String, target: &LValue, pad: &str) -> Result<(), CGenError> {
        let ty = self.static_type(&Expr::LValue(target.clone()));
        let addr = if target.indices.is_empty() {
            format!("&{}", target.name)
        } else {
            let offset = self.flat_index_expr(&target.name, &target.indices);
            format!("&{}[{offset}]", target.name)
        };
        match ty {
            SymbolType::Primitive(PrimitiveType::Real) => writeln!(out, "{pad}scanf(\"%lf\", {addr});")?,
            SymbolType::Primitive(PrimitiveType::Caractere) => writeln!(out, "{pad}scanf(\" %c\", {addr});")?,
            SymbolType::Primitive(PrimitiveType::Literal) => {
                writeln!(out, "{pad}scanf(\"%{}s\", {});", LITERAL_BUF_LEN - 1, target.name)?;
            }
            _ => writeln!(out, "{pad}scanf(\"%d\", {addr});")?,
        }
        Ok(())
    }

    fn emit_for(
        &mut self,
        out: &mut String,
        var: &LValue,
        from: &Expr,
        to: &Expr,
        step: Option<i32>,
        body: &[Stmt],
        indent: usize,
    ) -> Result<(), CGenError> {
        let pad = "    ".repeat(indent);
        let step_value = step.unwrap_or(1);
        let negative = step_value < 0;
        let increment = step_value.unsigned_abs();
        let to_text = self.expr_to_c(to);

        writeln!(out, "{pad}{} = {};", var.name, self.expr_to_c(from))?;
        let cmp = if negative { ">=" } else { "<=" };
        writeln!(out, "{pad}while ({} {cmp} {to_text}) {{", var.name)?;
        for s in body {
            self.emit_stmt(out, s, indent + 1)?;
        }
        let op = if negative { "-" } else { "+" };
        writeln!(out, "{pad}    {0} = {0} {op} {1};", var.name, increment)?;
        writeln!(out, "{pad}}}")?;
        writeln!(out, "{pad}{} = {};", var.name, to_text)?;
        Ok(())
    }

    fn emit_call_stmt(&mut self, out: &mut String, call: &FuncCall, pad: &str) -> Result<(), CGenError> {
        if call.name == builtins::IMPRIMA {
            for arg in &call.args {
                let ty = self.static_type(arg);
                let text = self.expr_to_c(arg);
                match ty {
                    SymbolType::Primitive(PrimitiveType::Literal) => writeln!(out, "{pad}printf(\"%s\", {text});")?,
                    SymbolType::Primitive(PrimitiveType::Caractere) => writeln!(out, "{pad}printf(\"%c\", {text});")?,
                    SymbolType::Primitive(PrimitiveType::Real) => writeln!(out, "{pad}printf(\"%f\", {text});")?,
                    SymbolType::Primitive(PrimitiveType::Logico) => {
                        writeln!(out, "{pad}printf(\"%s\", ({text}) ? \"verdadeiro\" : \"falso\");")?
                    }
                    _ => writeln!(out, "{pad}printf(\"%d\", {text});")?,
                }
            }
            writeln!(out, "{pad}printf(\"\\n\");")?;
            return Ok(());
        }
        if call.name == builtins::LEIA {
            // A bare `leia()` statement with its result unused has nowhere
            // to write the read value; nothing to emit.
            return Ok(());
        }
        writeln!(out, "{pad}{};", self.call_expr_to_c(call))?;
        Ok(())
    }

    fn call_expr_to_c(&mut self, call: &FuncCall) -> String {
        let args: Vec<String> = call.args.iter().map(|a| self.expr_to_c(a)).collect();
        format!("{}({})", call.name, args.join(", "))
    }

    fn flat_index_expr(&mut self, name: &str, indices: &[Expr]) -> String {
        let dims = match self.table.lookup(&self.scope, name, true) {
            Ok(sym) => match &sym.ty {
                SymbolType::Matrix { dims, .. } => dims.clone(),
                _ => vec![1; indices.len()],
            },
            Err(_) => vec![1; indices.len()],
        };
        let mut offset = String::from("0");
        for (dim, idx) in dims.iter().zip(indices) {
            offset = format!("(({offset}) * {dim} + ({}))", self.expr_to_c(idx));
        }
        offset
    }

    fn expr_to_c(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(lit, _) => match lit {
                Literal::Int(n) => n.to_string(),
                Literal::Real(r) => format!("{r}"),
                Literal::Char(c) => escape_c_char(*c),
                Literal::Str(s) => escape_c_string(s),
                Literal::Bool(b) => if *b { "1".to_string() } else { "0".to_string() },
            },
            Expr::LValue(lv) => {
                if lv.indices.is_empty() {
                    lv.name.clone()
                } else {
                    let offset = self.flat_index_expr(&lv.name, &lv.indices);
                    format!("{}[{offset}]", lv.name)
                }
            }
            Expr::Call(call) => self.call_expr_to_c(call),
            Expr::Unary { op, operand, .. } => {
                let v = self.expr_to_c(operand);
                match op {
                    UnaryOp::Neg => format!("(-({v}))"),
                    UnaryOp::Pos => format!("(+({v}))"),
                    UnaryOp::Not => format!("(!({v}))"),
                    UnaryOp::BitNot => format!("(~({v}))"),
                }
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                let l = self.expr_to_c(lhs);
                let r = self.expr_to_c(rhs);
                let c_op = match op {
                    BinOp::Or => "||",
                    BinOp::And => "&&",
                    BinOp::BitOr => "|",
                    BinOp::BitXor => "^",
                    BinOp::BitAnd => "&",
                    BinOp::Eq => "==",
                    BinOp::Ne => "!=",
                    BinOp::Lt => "<",
                    BinOp::Gt => ">",
                    BinOp::Le => "<=",
                    BinOp::Ge => ">=",
                    BinOp::Add => "+",
                    BinOp::Sub => "-",
                    BinOp::Mul => "*",
                    BinOp::Div => "/",
                    BinOp::Mod => "%",
                };
                format!("({l} {c_op} {r})")
            }
        }
    }

    /// Best-effort static type, mirroring `interpreter::Interpreter::infer_type`,
    /// used only to pick a format/conversion specifier.
    fn static_type(&self, expr: &Expr) -> SymbolType {
        match expr {
            Expr::Literal(lit, _) => SymbolType::Primitive(match lit {
                Literal::Int(_) => PrimitiveType::Inteiro,
                Literal::Real(_) => PrimitiveType::Real,
                Literal::Char(_) => PrimitiveType::Caractere,
                Literal::Str(_) => PrimitiveType::Literal,
                Literal::Bool(_) => PrimitiveType::Logico,
            }),
            Expr::LValue(lv) => match self.table.lookup(&self.scope, &lv.name, true) {
                Ok(sym) if lv.indices.is_empty() => sym.ty.clone(),
                Ok(sym) => SymbolType::Primitive(sym.ty.element_type()),
                Err(_) => SymbolType::Primitive(PrimitiveType::Nulo),
            },
            Expr::Call(call) => {
                if call.name == builtins::LEIA {
                    SymbolType::Primitive(PrimitiveType::Literal)
                } else if call.name == builtins::IMPRIMA {
                    SymbolType::Primitive(PrimitiveType::Nulo)
                } else {
                    self.table
                        .lookup_function(&call.name)
                        .map(|s| s.ty.clone())
                        .unwrap_or(SymbolType::Primitive(PrimitiveType::Nulo))
                }
            }
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => SymbolType::Primitive(PrimitiveType::Logico),
                UnaryOp::BitNot => SymbolType::Primitive(PrimitiveType::Inteiro),
                UnaryOp::Neg | UnaryOp::Pos => self.static_type(operand),
            },
            Expr::Binary { op, lhs, rhs, .. } => match op {
                BinOp::Or | BinOp::And | BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                    SymbolType::Primitive(PrimitiveType::Logico)
                }
                BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd | BinOp::Mod => {
                    SymbolType::Primitive(PrimitiveType::Inteiro)
                }
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                    let lt = self.static_type(lhs);
                    let rt = self.static_type(rhs);
                    if matches!(lt, SymbolType::Primitive(PrimitiveType::Real))
                        || matches!(rt, SymbolType::Primitive(PrimitiveType::Real))
                    {
                        SymbolType::Primitive(PrimitiveType::Real)
                    } else {
                        SymbolType::Primitive(PrimitiveType::Inteiro)
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::parser::Parser;
    use gpt_core::Diagnostics;

    fn emit(src: &str) -> String {
        let program = Parser::new(src).unwrap().parse().unwrap();
        let mut diagnostics = Diagnostics::new("prog.pol");
        let table = analyze(&program, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.records());
        generate(&program, &table).unwrap()
    }

    #[test]
    fn scenario_s1_emits_int_math_and_one_printf_per_argument() {
        let c = emit(
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
        assert!(c.contains("int a;"));
        assert!(c.contains("s = (a + b);"));
        assert!(c.contains("printf(\"%d\", s);"));
        assert!(c.contains("int main(void)"));
    }

    #[test]
    fn for_loop_reassigns_bound_unconditionally() {
        let c = emit(
            r#"
            algoritmo F
            variaveis
              inteiro i
            fim-variaveis
            inicio
              para i de 10 ate 1 passo -2
              fim-para
            fim
            "#,
        );
        assert!(c.contains("i = 10;"));
        assert!(c.contains("while (i >= 1) {"));
        assert!(c.contains("i = i - 2;"));
        assert!(c.contains("i = 1;"));
    }

    #[test]
    fn matrix_parameter_gets_a_defensive_copy_in_the_callee() {
        let c = emit(
            r#"
            algoritmo M
            variaveis
              matriz[3] de inteiro v
            fim-variaveis
            inicio
              zera(v)
            fim
            funcao zera(matriz[3] de inteiro m)
            inicio
              m[0] := 0
            fim
            "#,
        );
        assert!(c.contains("void zera(int *m_arg)"));
        assert!(c.contains("memcpy(m, m_arg, sizeof(m));"));
    }

    #[test]
    fn recursive_function_emits_forward_declaration() {
        let c = emit(
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
        assert!(c.contains("int fat(int n);"));
        assert!(c.contains("return (n * fat((n - 1)));"));
    }

    #[test]
    fn logical_value_prints_as_portuguese_words() {
        let c = emit(
            r#"
            algoritmo L
            inicio
              imprima(3 > 2)
            fim
            "#,
        );
        assert!(c.contains("verdadeiro"));
        assert!(c.contains("falso"));
    }
}
