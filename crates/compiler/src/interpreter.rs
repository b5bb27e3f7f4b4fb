//! Tree-walking interpreter (§4.5): evaluates the AST directly over a
//! runtime `Value` model, with a frame stack for scopes, row-major matrix
//! storage, and the same control-flow semantics the other two back-ends
//! must mirror (same for-loop end-state, same repeat-until sense).

use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Write};

use gpt_core::{
    BinOp, Expr, FuncCall, FuncDecl, LValue, Literal, PrimitiveType, Program, Stmt, SymbolType,
    UnaryOp, VarDecl,
};

use crate::builtins;
use crate::symtab::{SymbolTable, GLOBAL_SCOPE};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Real(f64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{}", if *b { "verdadeiro" } else { "falso" }),
        }
    }
}

/// A matrix value: a flat, row-major buffer plus the dimension list it was
/// declared with (§3.6).
#[derive(Debug, Clone)]
pub struct Array {
    pub dims: Vec<u32>,
    pub data: Vec<Value>,
}

impl Array {
    fn new(dims: Vec<u32>, zero: Value) -> Self {
        let len = dims.iter().product::<u32>() as usize;
        Array { dims, data: vec![zero; len] }
    }

    fn offset(&self, indices: &[i32]) -> Result<usize, RuntimeError> {
        if indices.len() != self.dims.len() {
            return Err(RuntimeError::new(format!(
                "número de índices incompatível: esperado {}, encontrado {}",
                self.dims.len(),
                indices.len()
            )));
        }
        let mut offset = 0usize;
        for (dim, &idx) in self.dims.iter().zip(indices) {
            if idx < 0 || idx as u32 >= *dim {
                return Err(RuntimeError::new(format!(
                    "índice {idx} fora dos limites (dimensão {dim})"
                )));
            }
            offset = offset * (*dim as usize) + idx as usize;
        }
        Ok(offset)
    }

    fn get(&self, indices: &[i32]) -> Result<Value, RuntimeError> {
        Ok(self.data[self.offset(indices)?].clone())
    }

    fn set(&mut self, indices: &[i32], value: Value) -> Result<(), RuntimeError> {
        let offset = self.offset(indices)?;
        self.data[offset] = value;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    fn new(message: impl Into<String>) -> Self {
        RuntimeError { message: message.into() }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

struct Frame {
    scope: String,
    scalars: HashMap<String, Value>,
    arrays: HashMap<String, Array>,
}

impl Frame {
    fn new(scope: impl Into<String>) -> Self {
        Frame { scope: scope.into(), scalars: HashMap::new(), arrays: HashMap::new() }
    }
}

enum Flow {
    Normal,
    Return(Value),
}

pub fn zero_value(p: PrimitiveType) -> Value {
    match p {
        PrimitiveType::Inteiro | PrimitiveType::Caractere => Value::Int(0),
        PrimitiveType::Real => Value::Real(0.0),
        PrimitiveType::Literal => Value::Str(String::new()),
        PrimitiveType::Logico => Value::Bool(false),
        PrimitiveType::Nulo => Value::Bool(false),
    }
}

fn as_int(v: &Value) -> i32 {
    match v {
        Value::Int(n) => *n,
        Value::Real(r) => *r as i32,
        Value::Bool(b) => i32::from(*b),
        Value::Str(s) => s.trim().parse().unwrap_or(0),
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(n) => *n as f64,
        Value::Real(r) => *r,
        Value::Bool(b) => if *b { 1.0 } else { 0.0 },
        Value::Str(s) => s.trim().parse().unwrap_or(0.0),
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        _ => false,
    }
}

/// If `existing` holds an Int and `new` is a Real (or vice versa), coerce
/// `new` to match — the store-site narrowing of §4.5. A `Str` (what `leia()`
/// evaluates to) stored into a numeric slot is parsed the same way, per
/// §6.2's "coercion to the assignment target's type (if numeric) is
/// performed at the assignment site".
fn coerce_like(existing: &Value, new: Value) -> Value {
    match (existing, &new) {
        (Value::Int(_), Value::Real(_) | Value::Str(_)) => Value::Int(as_int(&new)),
        (Value::Real(_), Value::Int(_) | Value::Str(_)) => Value::Real(as_f64(&new)),
        _ => new,
    }
}

fn coerce_to_primitive(v: Value, target: PrimitiveType) -> Value {
    match (target, v) {
        (PrimitiveType::Inteiro, Value::Real(r)) => Value::Int(r as i32),
        (PrimitiveType::Real, Value::Int(n)) => Value::Real(n as f64),
        (_, v) => v,
    }
}

pub struct Interpreter<'a, R: BufRead, W: Write> {
    program: &'a Program,
    table: &'a SymbolTable,
    functions: HashMap<&'a str, &'a FuncDecl>,
    frames: Vec<Frame>,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Interpreter<'a, R, W> {
    pub fn new(program: &'a Program, table: &'a SymbolTable, input: R, out: W) -> Self {
        let functions = program.functions.iter().map(|f| (f.name.as_str(), f)).collect();
        let mut global = Frame::new(GLOBAL_SCOPE);
        for decl in &program.globals {
            declare_in_frame(&mut global, decl);
        }
        Interpreter { program, table, functions, frames: vec![global], input, out }
    }

    /// Runs the main block. Returns the process exit code: 0 unless a
    /// top-level `retorne <expr>` is reached, in which case it is the
    /// integer coercion of that expression (§6.1).
    pub fn run(&mut self) -> Result<i32, RuntimeError> {
        match self.exec_block(&self.program.main_body.clone())? {
            Flow::Return(v) => Ok(as_int(&v)),
            Flow::Normal => Ok(0),
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => continue,
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Assign { target, value, .. } => {
                let v = self.eval(value)?;
                self.store(target, v)?;
                Ok(Flow::Normal)
            }
            Stmt::Call(call) => {
                self.call(call)?;
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let v = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Bool(false),
                };
                Ok(Flow::Return(v))
            }
            Stmt::If { cond, then_branch, else_branch, .. } => {
                if truthy(&self.eval(cond)?) {
                    self.exec_block(then_branch)
                } else {
                    self.exec_block(else_branch)
                }
            }
            Stmt::While { cond, body, .. } => {
                while truthy(&self.eval(cond)?) {
                    match self.exec_block(body)? {
                        Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::RepeatUntil { body, cond, .. } => loop {
                match self.exec_block(body)? {
                    Flow::Normal => {}
                    flow => return Ok(flow),
                }
                if truthy(&self.eval(cond)?) {
                    return Ok(Flow::Normal);
                }
            },
            Stmt::For { var, from, to, step, body, .. } => self.exec_for(var, from, to, *step, body),
        }
    }

    fn exec_for(
        &mut self,
        var: &LValue,
        from: &Expr,
        to: &Expr,
        step: Option<i32>,
        body: &[Stmt],
    ) -> Result<Flow, RuntimeError> {
        let start = as_int(&self.eval(from)?);
        self.store(var, Value::Int(start))?;

        let step_value = step.unwrap_or(1);
        let negative = step_value < 0;
        let increment = step_value.unsigned_abs() as i32;

        loop {
            let bound = as_int(&self.eval(to)?);
            let current = as_int(&self.load(var)?);
            let keep_going = if negative { current >= bound } else { current <= bound };
            if !keep_going {
                break;
            }
            match self.exec_block(body)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
            let current = as_int(&self.load(var)?);
            let stepped = if negative { current - increment } else { current + increment };
            self.store(var, Value::Int(stepped))?;
        }

        // Unconditional final assignment of the end bound (§4.5, §8 S2/S3).
        let bound = as_int(&self.eval(to)?);
        self.store(var, Value::Int(bound))?;
        Ok(Flow::Normal)
    }

    fn load(&mut self, lv: &LValue) -> Result<Value, RuntimeError> {
        if lv.indices.is_empty() {
            return self.load_scalar(&lv.name);
        }
        let indices = self.eval_indices(&lv.indices)?;
        let frame = self.frame_with_array(&lv.name)?;
        frame.arrays.get(&lv.name).expect("checked by frame_with_array").get(&indices)
    }

    fn store(&mut self, target: &LValue, value: Value) -> Result<(), RuntimeError> {
        if target.indices.is_empty() {
            let existing = self.load_scalar(&target.name)?;
            let coerced = coerce_like(&existing, value);
            return self.set_scalar(&target.name, coerced);
        }
        let indices = self.eval_indices(&target.indices)?;
        let idx = self.frame_index_with_array(&target.name)?;
        let array = self.frames[idx].arrays.get_mut(&target.name).expect("checked above");
        array.set(&indices, value)
    }

    fn eval_indices(&mut self, exprs: &[Expr]) -> Result<Vec<i32>, RuntimeError> {
        let mut out = Vec::with_capacity(exprs.len());
        for e in exprs {
            out.push(as_int(&self.eval(e)?));
        }
        Ok(out)
    }

    fn frame_with_array(&mut self, name: &str) -> Result<&mut Frame, RuntimeError> {
        let idx = self.frame_index_with_array(name)?;
        Ok(&mut self.frames[idx])
    }

    fn frame_index_with_array(&self, name: &str) -> Result<usize, RuntimeError> {
        let top = self.frames.len() - 1;
        if self.frames[top].arrays.contains_key(name) {
            return Ok(top);
        }
        if self.frames[0].arrays.contains_key(name) {
            return Ok(0);
        }
        Err(RuntimeError::new(format!("array {name} não declarado")))
    }

    fn load_scalar(&self, name: &str) -> Result<Value, RuntimeError> {
        let top = self.frames.last().expect("global frame always present");
        if let Some(v) = top.scalars.get(name) {
            return Ok(v.clone());
        }
        if let Some(v) = self.frames[0].scalars.get(name) {
            return Ok(v.clone());
        }
        Err(RuntimeError::new(format!("variável {name} não declarada")))
    }

    fn set_scalar(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let top = self.frames.len() - 1;
        if self.frames[top].scalars.contains_key(name) {
            self.frames[top].scalars.insert(name.to_string(), value);
            return Ok(());
        }
        if self.frames[0].scalars.contains_key(name) {
            self.frames[0].scalars.insert(name.to_string(), value);
            return Ok(());
        }
        Err(RuntimeError::new(format!("variável {name} não declarada")))
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(lit, _) => Ok(match lit {
                Literal::Int(n) => Value::Int(*n as i32),
                Literal::Real(r) => Value::Real(*r),
                Literal::Char(c) => Value::Int(*c as i32),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
            }),
            Expr::LValue(lv) => self.load(lv),
            Expr::Call(call) => self.call(call),
            Expr::Unary { op, operand, .. } => {
                let v = self.eval(operand)?;
                Ok(self.apply_unary(*op, v))
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                Ok(self.apply_binary(*op, l, r))
            }
        }
    }

    fn apply_unary(&self, op: UnaryOp, v: Value) -> Value {
        match op {
            UnaryOp::Neg => match v {
                Value::Int(n) => Value::Int(-n),
                Value::Real(r) => Value::Real(-r),
                other => other,
            },
            UnaryOp::Pos => v,
            UnaryOp::Not => Value::Bool(!truthy(&v)),
            UnaryOp::BitNot => Value::Int(!as_int(&v)),
        }
    }

    fn apply_binary(&self, op: BinOp, l: Value, r: Value) -> Value {
        match op {
            BinOp::Or => Value::Bool(truthy(&l) || truthy(&r)),
            BinOp::And => Value::Bool(truthy(&l) && truthy(&r)),
            BinOp::BitOr => Value::Int(as_int(&l) | as_int(&r)),
            BinOp::BitXor => Value::Int(as_int(&l) ^ as_int(&r)),
            BinOp::BitAnd => Value::Int(as_int(&l) & as_int(&r)),
            BinOp::Eq => Value::Bool(self.values_equal(&l, &r)),
            BinOp::Ne => Value::Bool(!self.values_equal(&l, &r)),
            BinOp::Lt => Value::Bool(as_f64(&l) < as_f64(&r)),
            BinOp::Gt => Value::Bool(as_f64(&l) > as_f64(&r)),
            BinOp::Le => Value::Bool(as_f64(&l) <= as_f64(&r)),
            BinOp::Ge => Value::Bool(as_f64(&l) >= as_f64(&r)),
            BinOp::Mod => Value::Int(as_int(&l) % as_int(&r)),
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => self.arith(op, l, r),
        }
    }

    /// Real-operand equality is decimal-string equality, preserving the
    /// historical weak comparison (§4.4, §9) rather than ULP-based
    /// floating-point equality.
    fn values_equal(&self, l: &Value, r: &Value) -> bool {
        match (l, r) {
            (Value::Real(_), _) | (_, Value::Real(_)) => format!("{}", as_f64(l)) == format!("{}", as_f64(r)),
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }

    fn arith(&self, op: BinOp, l: Value, r: Value) -> Value {
        let real_mode = matches!(l, Value::Real(_)) || matches!(r, Value::Real(_));
        if real_mode {
            let a = as_f64(&l);
            let b = as_f64(&r);
            Value::Real(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                _ => unreachable!(),
            })
        } else {
            let a = as_int(&l);
            let b = as_int(&r);
            Value::Int(match op {
                BinOp::Add => a.wrapping_add(b),
                BinOp::Sub => a.wrapping_sub(b),
                BinOp::Mul => a.wrapping_mul(b),
                BinOp::Div => a / b,
                _ => unreachable!(),
            })
        }
    }

    fn call(&mut self, call: &FuncCall) -> Result<Value, RuntimeError> {
        if builtins::is_builtin(&call.name) {
            return self.call_builtin(call);
        }
        let func = *self
            .functions
            .get(call.name.as_str())
            .ok_or_else(|| RuntimeError::new(format!("função {} não declarada", call.name)))?;

        let mut new_frame = Frame::new(func.name.clone());
        for (param, arg_expr) in func.params.iter().zip(&call.args) {
            match &param.ty {
                SymbolType::Primitive(p) => {
                    let v = self.eval(arg_expr)?;
                    new_frame.scalars.insert(param.name.clone(), coerce_to_primitive(v, *p));
                }
                SymbolType::Matrix { .. } => {
                    let name = match arg_expr {
                        Expr::LValue(lv) if lv.indices.is_empty() => lv.name.clone(),
                        _ => {
                            return Err(RuntimeError::new(
                                "argumento de matriz deve ser um nome de array".to_string(),
                            ));
                        }
                    };
                    // Matrix pass-by-copy (§4.5, §9): the callee gets its own copy.
                    let arr = self.load_array(&name)?.clone();
                    new_frame.arrays.insert(param.name.clone(), arr);
                }
            }
        }
        for decl in &func.locals {
            declare_in_frame(&mut new_frame, decl);
        }

        self.frames.push(new_frame);
        let flow = self.exec_block(&func.body.clone());
        self.frames.pop();

        let result_ty = func.return_type;
        match flow? {
            Flow::Return(v) => Ok(match result_ty {
                Some(p) => coerce_to_primitive(v, p),
                None => v,
            }),
            Flow::Normal => Ok(result_ty.map(zero_value).unwrap_or(Value::Bool(false))),
        }
    }

    fn load_array(&self, name: &str) -> Result<&Array, RuntimeError> {
        let top = self.frames.last().expect("global frame always present");
        if let Some(a) = top.arrays.get(name) {
            return Ok(a);
        }
        if let Some(a) = self.frames[0].arrays.get(name) {
            return Ok(a);
        }
        Err(RuntimeError::new(format!("array {name} não declarado")))
    }

    fn call_builtin(&mut self, call: &FuncCall) -> Result<Value, RuntimeError> {
        match call.name.as_str() {
            builtins::IMPRIMA => {
                for arg in &call.args {
                    let v = self.eval(arg)?;
                    let ty = self.infer_type(arg);
                    self.print_value(&v, &ty)?;
                }
                writeln!(self.out).map_err(|e| RuntimeError::new(e.to_string()))?;
                Ok(Value::Bool(false))
            }
            builtins::LEIA => {
                let mut line = String::new();
                self.input
                    .read_line(&mut line)
                    .map_err(|e| RuntimeError::new(e.to_string()))?;
                let trimmed = line.trim_end_matches(['\n', '\r']).to_string();
                Ok(Value::Str(trimmed))
            }
            other => unreachable!("unregistered builtin {other}"),
        }
    }

    fn print_value(&mut self, v: &Value, ty: &SymbolType) -> Result<(), RuntimeError> {
        let text = match (ty, v) {
            (SymbolType::Primitive(PrimitiveType::Caractere), Value::Int(code)) => {
                char::from_u32(*code as u32).unwrap_or('\u{fffd}').to_string()
            }
            (SymbolType::Primitive(PrimitiveType::Logico), Value::Bool(b)) => {
                if *b { "verdadeiro".to_string() } else { "falso".to_string() }
            }
            _ => v.to_string(),
        };
        write!(self.out, "{text}").map_err(|e| RuntimeError::new(e.to_string()))
    }

    /// Best-effort static type of an expression, consulting the symbol
    /// table the same way the analyzer does. Used only to decide how
    /// `imprima` should render a value (e.g. a CARACTERE codepoint as a
    /// character rather than a number) — analysis has already validated
    /// the program, so this never needs to raise diagnostics.
    fn infer_type(&self, expr: &Expr) -> SymbolType {
        match expr {
            Expr::Literal(lit, _) => SymbolType::Primitive(match lit {
                Literal::Int(_) => PrimitiveType::Inteiro,
                Literal::Real(_) => PrimitiveType::Real,
                Literal::Char(_) => PrimitiveType::Caractere,
                Literal::Str(_) => PrimitiveType::Literal,
                Literal::Bool(_) => PrimitiveType::Logico,
            }),
            Expr::LValue(lv) => {
                let scope = self.frames.last().map(|f| f.scope.as_str()).unwrap_or(GLOBAL_SCOPE);
                match self.table.lookup(scope, &lv.name, true) {
                    Ok(sym) if lv.indices.is_empty() => sym.ty.clone(),
                    Ok(sym) => SymbolType::Primitive(sym.ty.element_type()),
                    Err(_) => SymbolType::Primitive(PrimitiveType::Nulo),
                }
            }
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
                UnaryOp::Neg | UnaryOp::Pos => self.infer_type(operand),
            },
            Expr::Binary { op, lhs, rhs, .. } => match op {
                BinOp::Or | BinOp::And | BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                    SymbolType::Primitive(PrimitiveType::Logico)
                }
                BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd | BinOp::Mod => {
                    SymbolType::Primitive(PrimitiveType::Inteiro)
                }
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                    let lt = self.infer_type(lhs);
                    let rt = self.infer_type(rhs);
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

fn declare_in_frame(frame: &mut Frame, decl: &VarDecl) {
    for name in &decl.names {
        match &decl.ty {
            SymbolType::Primitive(p) => {
                frame.scalars.insert(name.clone(), zero_value(*p));
            }
            SymbolType::Matrix { element, dims } => {
                frame.arrays.insert(name.clone(), Array::new(dims.clone(), zero_value(*element)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::parser::Parser;
    use gpt_core::Diagnostics;
    use std::io::Cursor;

    fn run_program(src: &str, stdin: &str) -> (String, i32) {
        let program = Parser::new(src).unwrap().parse().unwrap();
        let mut diagnostics = Diagnostics::new("prog.pol");
        let table = analyze(&program, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.records());

        let mut out = Vec::new();
        let input = Cursor::new(stdin.as_bytes().to_vec());
        let mut interp = Interpreter::new(&program, &table, input, &mut out);
        let code = interp.run().unwrap();
        (String::from_utf8(out).unwrap(), code)
    }

    #[test]
    fn scenario_s1_soma_prints_seven() {
        let (out, code) = run_program(
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
            "",
        );
        assert_eq!(out, "7\n");
        assert_eq!(code, 0);
    }

    #[test]
    fn scenario_s2_for_loop_accumulates_and_ends_at_bound() {
        let (out, _) = run_program(
            r#"
            algoritmo F
            variaveis
              inteiro i, s
            fim-variaveis
            inicio
              s := 0
              para i de 1 ate 5
                s := s + i
              fim-para
              imprima(s)
              imprima(i)
            fim
            "#,
            "",
        );
        assert_eq!(out, "15\n5\n");
    }

    #[test]
    fn scenario_s3_negative_step_runs_down_to_one() {
        let (out, _) = run_program(
            r#"
            algoritmo F
            variaveis
              inteiro i
            fim-variaveis
            inicio
              para i de 10 ate 1 passo -2
              fim-para
              imprima(i)
            fim
            "#,
            "",
        );
        assert_eq!(out, "1\n");
    }

    #[test]
    fn scenario_s5_if_else() {
        let (out, _) = run_program(
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
            "",
        );
        assert_eq!(out, "s\n");
    }

    #[test]
    fn scenario_s6_recursive_factorial() {
        let (out, _) = run_program(
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
            "",
        );
        assert_eq!(out, "720\n");
    }

    #[test]
    fn p4_repeat_until_executes_body_at_least_once() {
        let (out, _) = run_program(
            r#"
            algoritmo R
            variaveis
              inteiro n
            fim-variaveis
            inicio
              n := 0
              repita
                n := n + 1
                imprima(n)
              ate n >= 3
            fim
            "#,
            "",
        );
        assert_eq!(out, "1\n2\n3\n");
    }

    #[test]
    fn p6_assigning_real_to_inteiro_truncates_toward_zero() {
        let (out, _) = run_program(
            r#"
            algoritmo P6
            variaveis
              inteiro a
            fim-variaveis
            inicio
              a := 7.9
              imprima(a)
            fim
            "#,
            "",
        );
        assert_eq!(out, "7\n");
    }

    #[test]
    fn top_level_retorne_sets_exit_code() {
        let (_, code) = run_program(
            r#"
            algoritmo E
            inicio
              retorne 42
            fim
            "#,
            "",
        );
        assert_eq!(code, 42);
    }

    #[test]
    fn matrix_is_passed_by_copy_into_functions() {
        let (out, _) = run_program(
            r#"
            algoritmo M
            variaveis
              matriz[3] de inteiro v
            fim-variaveis
            inicio
              v[0] := 1
              v[1] := 2
              v[2] := 3
              zera(v)
              imprima(v[0])
            fim
            funcao zera(matriz[3] de inteiro m)
            inicio
              m[0] := 99
            fim
            "#,
            "",
        );
        assert_eq!(out, "1\n");
    }

    #[test]
    fn leia_reads_a_line_from_stdin() {
        let (out, _) = run_program(
            r#"
            algoritmo L
            variaveis
              literal nome
            fim-variaveis
            inicio
              nome := leia()
              imprima(nome)
            fim
            "#,
            "mundo\n",
        );
        assert_eq!(out, "mundo\n");
    }
}
