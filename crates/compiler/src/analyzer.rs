//! The two-pass semantic analyzer (§4.3): Pass 1 registers every function's
//! signature in the global scope; Pass 2 declares globals/locals/params,
//! resolves every name through the symbol table, and type-checks every
//! expression subtree against §4.3.1's compatibility lattice. Diagnostics
//! are collected rather than raised, so analysis never aborts early
//! (§7: "does not abort on the first error").

use gpt_core::{
    BinOp, Diagnostics, Expr, FuncCall, FuncDecl, LValue, Literal, PrimitiveType, Program, Stmt,
    SymbolType, UnaryOp, VarDecl,
};

use crate::builtins;
use crate::symtab::{Symbol, SymbolTable, GLOBAL_SCOPE};

/// Runs both passes and returns the resulting table. Errors are recorded
/// into `diagnostics`; the caller checks `diagnostics.has_errors()` before
/// invoking any back-end (§4.8).
pub fn analyze(program: &Program, diagnostics: &mut Diagnostics) -> SymbolTable {
    let mut table = SymbolTable::new();

    // Pass 1: signatures.
    for f in &program.functions {
        register_signature(&mut table, f, diagnostics);
    }

    // Pass 2: globals, then main block, then each function body.
    table.enter_global_scope();
    for decl in &program.globals {
        declare_vars(&mut table, decl, GLOBAL_SCOPE, diagnostics);
    }

    {
        let mut walker = ExprWalker { table: &table, diagnostics, current_return: None };
        for stmt in &program.main_body {
            walker.walk_stmt(stmt);
        }
    }

    for f in &program.functions {
        table.set_current_scope(f.name.clone());
        for p in &f.params {
            if let Err(e) = table.insert(Symbol::variable(&p.name, p.ty.clone(), f.name.clone(), f.line)) {
                diagnostics.error(e.to_string(), f.line);
            }
        }
        for decl in &f.locals {
            declare_vars(&mut table, decl, &f.name, diagnostics);
        }
        let mut walker = ExprWalker { table: &table, diagnostics, current_return: f.return_type };
        for stmt in &f.body {
            walker.walk_stmt(stmt);
        }
    }

    table
}

fn register_signature(table: &mut SymbolTable, f: &FuncDecl, diagnostics: &mut Diagnostics) {
    let return_ty = SymbolType::Primitive(f.return_type.unwrap_or(PrimitiveType::Nulo));
    let params: Vec<SymbolType> = f.params.iter().map(|p| p.ty.clone()).collect();
    if let Err(e) = table.insert(Symbol::function(&f.name, return_ty, params, f.line)) {
        diagnostics.error(e.to_string(), f.line);
    }
}

fn declare_vars(table: &mut SymbolTable, decl: &VarDecl, scope: &str, diagnostics: &mut Diagnostics) {
    for name in &decl.names {
        if let Err(e) = table.insert(Symbol::variable(name, decl.ty.clone(), scope, decl.line)) {
            diagnostics.error(e.to_string(), decl.line);
        }
    }
}

/// Unknown/error sentinel: used as an expression's type after a diagnostic
/// has already been raised for it, so further checks don't cascade
/// spurious mismatches on top of an already-reported one.
fn unknown() -> SymbolType {
    SymbolType::Primitive(PrimitiveType::Nulo)
}

struct ExprWalker<'a> {
    table: &'a SymbolTable,
    diagnostics: &'a mut Diagnostics,
    current_return: Option<PrimitiveType>,
}

impl<'a> ExprWalker<'a> {
    fn walk_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign { target, value, line } => {
                let target_ty = self.resolve_lvalue(target);
                let value_ty = self.walk_expr(value);
                // `leia()` always types as LITERAL, but §6.2 coerces its result
                // to the target's type at the assignment site — any scalar
                // target is a valid `leia()` destination, numeric or not.
                let is_leia_read = matches!(value, Expr::Call(call) if call.name == builtins::LEIA);
                if !is_leia_read {
                    if let Some(t_ty) = target_ty {
                        if !value_ty.is_compatible_with(&t_ty) {
                            self.diagnostics.error(
                                format!("não é possível atribuir {value_ty} a {target} do tipo {t_ty}", target = target.name),
                                *line,
                            );
                        }
                    }
                }
            }
            Stmt::Call(call) => {
                self.check_call(call);
            }
            Stmt::Return { value, line } => self.walk_return(value.as_ref(), *line),
            Stmt::If { cond, then_branch, else_branch, line } => {
                self.check_boolean_context(cond, *line);
                for s in then_branch {
                    self.walk_stmt(s);
                }
                for s in else_branch {
                    self.walk_stmt(s);
                }
            }
            Stmt::While { cond, body, line } => {
                self.check_boolean_context(cond, *line);
                for s in body {
                    self.walk_stmt(s);
                }
            }
            Stmt::RepeatUntil { body, cond, line } => {
                for s in body {
                    self.walk_stmt(s);
                }
                self.check_boolean_context(cond, *line);
            }
            Stmt::For { var, from, to, body, line, .. } => {
                self.check_for_var(var, *line);
                self.check_numeric(from, *line);
                self.check_numeric(to, *line);
                for s in body {
                    self.walk_stmt(s);
                }
            }
        }
    }

    fn walk_return(&mut self, value: Option<&Expr>, line: u32) {
        match (self.current_return, value) {
            (None, None) => {}
            (None, Some(expr)) => {
                self.walk_expr(expr);
                self.diagnostics.error("procedimento não pode retornar um valor", line);
            }
            (Some(ret), Some(expr)) => {
                let vt = self.walk_expr(expr);
                if !vt.is_compatible_with(&SymbolType::Primitive(ret)) {
                    self.diagnostics.error(
                        format!("tipo de retorno incompatível: esperado {ret}, encontrado {vt}"),
                        line,
                    );
                }
            }
            (Some(ret), None) => {
                self.diagnostics
                    .error(format!("função deve retornar um valor do tipo {ret}"), line);
            }
        }
    }

    fn check_boolean_context(&mut self, expr: &Expr, line: u32) {
        let ty = self.walk_expr(expr);
        if let SymbolType::Primitive(p) = &ty {
            if p.is_boolean_context() || *p == PrimitiveType::Nulo {
                return;
            }
        }
        self.diagnostics
            .error(format!("condição deve ser lógica ou inteira, encontrado {ty}"), line);
    }

    fn check_numeric(&mut self, expr: &Expr, line: u32) {
        let ty = self.walk_expr(expr);
        if let SymbolType::Primitive(p) = &ty {
            if p.is_numeric() || *p == PrimitiveType::Nulo {
                return;
            }
        }
        self.diagnostics
            .error(format!("esperado valor numérico, encontrado {ty}"), line);
    }

    fn check_for_var(&mut self, var: &LValue, line: u32) {
        match self.resolve_lvalue(var) {
            Some(SymbolType::Primitive(p)) if p.is_numeric() => {}
            Some(ty) => {
                self.diagnostics
                    .error(format!("variável de controle do 'para' deve ser numérica, encontrado {ty}"), line);
            }
            None => {}
        }
    }

    fn resolve_lvalue(&mut self, lv: &LValue) -> Option<SymbolType> {
        let sym = match self.table.lookup_current(&lv.name) {
            Ok(sym) => sym,
            Err(e) => {
                self.diagnostics.error(e.to_string(), lv.line);
                return None;
            }
        };
        if sym.is_function {
            self.diagnostics
                .error(format!("{} é uma função, não uma variável", lv.name), lv.line);
            return None;
        }
        if lv.indices.is_empty() {
            return Some(sym.ty.clone());
        }
        match &sym.ty {
            SymbolType::Matrix { element, dims } => {
                if lv.indices.len() != dims.len() {
                    self.diagnostics.error(
                        format!("número de índices incompatível para a matriz {}", lv.name),
                        lv.line,
                    );
                }
                let element = *element;
                for idx in &lv.indices {
                    self.check_numeric(idx, lv.line);
                }
                Some(SymbolType::Primitive(element))
            }
            SymbolType::Primitive(_) => {
                self.diagnostics
                    .error(format!("{} não é uma matriz", lv.name), lv.line);
                None
            }
        }
    }

    fn walk_expr(&mut self, expr: &Expr) -> SymbolType {
        match expr {
            Expr::Literal(lit, _) => SymbolType::Primitive(match lit {
                Literal::Int(_) => PrimitiveType::Inteiro,
                Literal::Real(_) => PrimitiveType::Real,
                Literal::Char(_) => PrimitiveType::Caractere,
                Literal::Str(_) => PrimitiveType::Literal,
                Literal::Bool(_) => PrimitiveType::Logico,
            }),
            Expr::LValue(lv) => self.resolve_lvalue(lv).unwrap_or_else(unknown),
            Expr::Call(call) => self.check_call(call),
            Expr::Unary { op, operand, line } => self.walk_unary(*op, operand, *line),
            Expr::Binary { op, lhs, rhs, line } => self.walk_binary(*op, lhs, rhs, *line),
        }
    }

    fn walk_unary(&mut self, op: UnaryOp, operand: &Expr, line: u32) -> SymbolType {
        let ty = self.walk_expr(operand);
        match op {
            UnaryOp::Neg | UnaryOp::Pos => {
                if matches!(&ty, SymbolType::Primitive(p) if p.is_numeric() || *p == PrimitiveType::Nulo) {
                    ty
                } else {
                    self.diagnostics.error(format!("operador unário requer valor numérico, encontrado {ty}"), line);
                    unknown()
                }
            }
            UnaryOp::Not => {
                if !matches!(&ty, SymbolType::Primitive(p) if p.is_boolean_context() || *p == PrimitiveType::Nulo) {
                    self.diagnostics.error(format!("'não' requer valor lógico ou inteiro, encontrado {ty}"), line);
                }
                SymbolType::Primitive(PrimitiveType::Logico)
            }
            UnaryOp::BitNot => {
                if !matches!(&ty, SymbolType::Primitive(PrimitiveType::Inteiro) | SymbolType::Primitive(PrimitiveType::Nulo)) {
                    self.diagnostics.error(format!("'~' requer inteiro, encontrado {ty}"), line);
                }
                SymbolType::Primitive(PrimitiveType::Inteiro)
            }
        }
    }

    fn walk_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, line: u32) -> SymbolType {
        let lt = self.walk_expr(lhs);
        let rt = self.walk_expr(rhs);
        let nulo = PrimitiveType::Nulo;

        let is_numeric = |t: &SymbolType| matches!(t, SymbolType::Primitive(p) if p.is_numeric() || *p == nulo);
        let is_bool_ctx = |t: &SymbolType| matches!(t, SymbolType::Primitive(p) if p.is_boolean_context() || *p == nulo);
        let is_int = |t: &SymbolType| matches!(t, SymbolType::Primitive(PrimitiveType::Inteiro) | SymbolType::Primitive(PrimitiveType::Nulo));

        match op {
            BinOp::Or | BinOp::And => {
                if !is_bool_ctx(&lt) || !is_bool_ctx(&rt) {
                    self.diagnostics.error("operandos de 'e'/'ou' devem ser lógicos ou inteiros".to_string(), line);
                }
                SymbolType::Primitive(PrimitiveType::Logico)
            }
            BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd => {
                if !is_int(&lt) || !is_int(&rt) {
                    self.diagnostics.error("operadores bit a bit requerem inteiro".to_string(), line);
                }
                SymbolType::Primitive(PrimitiveType::Inteiro)
            }
            BinOp::Eq | BinOp::Ne => {
                if !lt.is_compatible_with(&rt) {
                    self.diagnostics
                        .error(format!("comparação entre tipos incompatíveis {lt} e {rt}"), line);
                }
                SymbolType::Primitive(PrimitiveType::Logico)
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                if !is_numeric(&lt) || !is_numeric(&rt) {
                    self.diagnostics
                        .error(format!("comparação relacional requer operandos numéricos, encontrado {lt} e {rt}"), line);
                }
                SymbolType::Primitive(PrimitiveType::Logico)
            }
            BinOp::Mod => {
                if !is_int(&lt) || !is_int(&rt) {
                    self.diagnostics.error("'%' requer inteiro em ambos os operandos".to_string(), line);
                }
                SymbolType::Primitive(PrimitiveType::Inteiro)
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                if !is_numeric(&lt) || !is_numeric(&rt) {
                    self.diagnostics
                        .error(format!("operador aritmético requer operandos numéricos, encontrado {lt} e {rt}"), line);
                    return unknown();
                }
                if matches!(lt, SymbolType::Primitive(PrimitiveType::Real)) || matches!(rt, SymbolType::Primitive(PrimitiveType::Real)) {
                    SymbolType::Primitive(PrimitiveType::Real)
                } else {
                    SymbolType::Primitive(PrimitiveType::Inteiro)
                }
            }
        }
    }

    fn check_call(&mut self, call: &FuncCall) -> SymbolType {
        if builtins::is_builtin(&call.name) {
            return self.check_builtin_call(call);
        }
        let (return_ty, params) = match self.table.lookup_function(&call.name) {
            Ok(sym) => (sym.ty.clone(), sym.parameters.clone()),
            Err(e) => {
                self.diagnostics.error(e.to_string(), call.line);
                for a in &call.args {
                    self.walk_expr(a);
                }
                return unknown();
            }
        };
        if params.len() != call.args.len() {
            self.diagnostics.error(
                format!("número de argumentos incompatível na chamada de {}: esperado {}, encontrado {}", call.name, params.len(), call.args.len()),
                call.line,
            );
        }
        for (i, arg) in call.args.iter().enumerate() {
            let at = self.walk_expr(arg);
            if let Some(pt) = params.get(i) {
                if !at.is_compatible_with(pt) {
                    self.diagnostics.error(
                        format!("tipo do argumento {} incompatível na chamada de {}: esperado {}, encontrado {}", i + 1, call.name, pt, at),
                        call.line,
                    );
                }
            }
        }
        return_ty
    }

    fn check_builtin_call(&mut self, call: &FuncCall) -> SymbolType {
        match call.name.as_str() {
            builtins::IMPRIMA => {
                for a in &call.args {
                    self.walk_expr(a);
                }
                SymbolType::Primitive(PrimitiveType::Nulo)
            }
            builtins::LEIA => {
                if !call.args.is_empty() {
                    self.diagnostics.error("'leia' não aceita argumentos".to_string(), call.line);
                }
                SymbolType::Primitive(PrimitiveType::Literal)
            }
            _ => unreachable!("is_builtin guards this match"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn analyze_src(src: &str) -> Diagnostics {
        let program = Parser::new(src).unwrap().parse().unwrap();
        let mut diagnostics = Diagnostics::new("prog.pol");
        analyze(&program, &mut diagnostics);
        diagnostics
    }

    #[test]
    fn scenario_s1_has_no_errors() {
        let diag = analyze_src(
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
        assert!(!diag.has_errors(), "{:?}", diag.records());
    }

    #[test]
    fn scenario_s4_duplicate_declaration() {
        let diag = analyze_src(
            r#"
            algoritmo D
            variaveis
              inteiro x, x
            fim-variaveis
            inicio
            fim
            "#,
        );
        assert!(diag.has_errors());
        assert_eq!(diag.errors().count(), 1);
    }

    #[test]
    fn undefined_variable_is_reported() {
        let diag = analyze_src(
            r#"
            algoritmo U
            inicio
              x := 3
            fim
            "#,
        );
        assert!(diag.has_errors());
    }

    #[test]
    fn assigning_literal_to_inteiro_is_a_type_error() {
        let diag = analyze_src(
            r#"
            algoritmo T
            variaveis
              inteiro a
            fim-variaveis
            inicio
              a := "oi"
            fim
            "#,
        );
        assert!(diag.has_errors());
    }

    #[test]
    fn assigning_real_to_inteiro_is_allowed_numeric_widening() {
        let diag = analyze_src(
            r#"
            algoritmo T
            variaveis
              inteiro a
            fim-variaveis
            inicio
              a := 3.5
            fim
            "#,
        );
        assert!(!diag.has_errors());
    }

    #[test]
    fn recursive_function_call_type_checks() {
        let diag = analyze_src(
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
        assert!(!diag.has_errors(), "{:?}", diag.records());
    }

    #[test]
    fn wrong_argument_count_is_reported() {
        let diag = analyze_src(
            r#"
            algoritmo T
            inicio
              imprima(soma(1))
            fim
            funcao soma(inteiro a, inteiro b): inteiro
            inicio
              retorne a + b
            fim
            "#,
        );
        assert!(diag.has_errors());
    }

    #[test]
    fn procedure_returning_value_is_an_error() {
        let diag = analyze_src(
            r#"
            algoritmo T
            inicio
            fim
            funcao p(inteiro n)
            inicio
              retorne n
            fim
            "#,
        );
        assert!(diag.has_errors());
    }
}
