//! x86 (NASM, Linux, 32-bit) code generator (§4.7): a stack-machine
//! emitter — every expression evaluates by pushing its result dword onto
//! the hardware stack. Grounded on `X86Generator.cpp`'s `addarg`/`clargs`
//! convention for both user calls and the `imprima` built-in; the emitter
//! struct itself (`state::X86Gen`) keeps state separate from the emission
//! logic in this module.
//!
//! Simplifications specific to this back-end (documented in DESIGN.md):
//! REAL values are carried as a single truncated 32-bit cell (no x87/SSE
//! support — the interpreter and C translator are the two back-ends with
//! full REAL fidelity), and LOGICO prints as `0`/`1` rather than the
//! Portuguese words the other two back-ends print.

mod error;
mod state;

pub use error::CodeGenError;

use gpt_core::{
    BinOp, Expr, FuncCall, FuncDecl, LValue, Literal, PrimitiveType, Program, Stmt, SymbolType,
    UnaryOp, VarDecl,
};

use crate::builtins;
use crate::symtab::{SymbolTable, GLOBAL_SCOPE};
use state::{Frame, Slot, X86Gen};

pub fn generate(program: &Program, table: &SymbolTable) -> Result<String, CodeGenError> {
    let mut gen = X86Gen::new(table, program);
    gen.register_globals()?;

    gen.emit("section .text")?;
    gen.emit_main()?;
    for f in &program.functions {
        gen.emit_function(f)?;
    }
    if gen.needs_atoi_helper {
        gen.emit_atoi_helper()?;
    }

    gen.emit_literal_pool()?;
    gen.emit_global_reservations()?;

    let mut full = gen.out;
    full.push_str(&gen.data);
    Ok(full)
}

impl<'a> X86Gen<'a> {
    fn emit(&mut self, line: impl AsRef<str>) -> Result<(), CodeGenError> {
        use std::fmt::Write as _;
        writeln!(self.out, "{}", line.as_ref())?;
        Ok(())
    }

    fn emit_data(&mut self, line: impl AsRef<str>) -> Result<(), CodeGenError> {
        use std::fmt::Write as _;
        writeln!(self.data, "{}", line.as_ref())?;
        Ok(())
    }

    fn register_globals(&mut self) -> Result<(), CodeGenError> {
        for decl in &self.program.globals {
            for name in &decl.names {
                let label = format!("g_{name}");
                match &decl.ty {
                    SymbolType::Primitive(_) => {
                        self.globals.insert(name.clone(), Slot::Global { label });
                    }
                    SymbolType::Matrix { dims, .. } => {
                        self.globals.insert(
                            name.clone(),
                            Slot::GlobalMatrix { label, dims: dims.clone() },
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn emit_global_reservations(&mut self) -> Result<(), CodeGenError> {
        self.emit_data("section .bss")?;
        for decl in &self.program.globals {
            for name in &decl.names {
                let count = X86Gen::element_count(&decl.ty);
                self.emit_data(format!("g_{name}: resd {count}"))?;
            }
        }
        Ok(())
    }

    fn emit_literal_pool(&mut self) -> Result<(), CodeGenError> {
        if self.literal_order.is_empty() {
            return Ok(());
        }
        self.emit_data("section .data")?;
        for (label, value) in self.literal_order.clone() {
            let bytes: Vec<String> = value.bytes().map(|b| b.to_string()).collect();
            let db = if bytes.is_empty() {
                "0".to_string()
            } else {
                format!("{}, 0", bytes.join(", "))
            };
            self.emit_data(format!("{label}: db {db}"))?;
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<Slot, CodeGenError> {
        if let Some(slot) = self.frame.slots.get(name) {
            return Ok(slot.clone());
        }
        if let Some(slot) = self.globals.get(name) {
            return Ok(slot.clone());
        }
        Err(CodeGenError::Logic(format!("identificador {name} não resolvido")))
    }

    fn scalar_operand(&self, slot: &Slot) -> String {
        match slot {
            Slot::Scalar { offset } => format_ebp_offset(*offset),
            Slot::Global { label } => label.clone(),
            Slot::Matrix { offset, .. } => format_ebp_offset(*offset),
            Slot::GlobalMatrix { label, .. } => label.clone(),
        }
    }

    fn base_operand(&self, slot: &Slot) -> String {
        self.scalar_operand(slot)
    }

    fn matrix_dims<'b>(&self, slot: &'b Slot) -> Result<&'b [u32], CodeGenError> {
        match slot {
            Slot::Matrix { dims, .. } | Slot::GlobalMatrix { dims, .. } => Ok(dims),
            _ => Err(CodeGenError::Logic("não é uma matriz".to_string())),
        }
    }

    // ---- frame construction -------------------------------------------------

    fn build_frame(&mut self, f: &FuncDecl) {
        let mut frame = Frame::default();
        let n = f.params.len();
        for (i, p) in f.params.iter().enumerate() {
            let offset = 8 + 4 * ((n - 1 - i) as i32);
            match &p.ty {
                SymbolType::Primitive(_) => {
                    frame.slots.insert(p.name.clone(), Slot::Scalar { offset });
                }
                SymbolType::Matrix { .. } => {
                    frame.incoming_matrix_ptrs.push((p.name.clone(), offset));
                }
            }
        }

        let mut cursor: i32 = 0;
        for decl in &f.locals {
            alloc_local(&mut frame, &mut cursor, decl);
        }
        // Matrix parameters also get a local copy buffer, same name,
        // shadowing the raw incoming pointer recorded above (§9 pass-by-copy).
        for (name, _) in frame.incoming_matrix_ptrs.clone() {
            if let Some(p) = f.params.iter().find(|p| p.name == name) {
                if let SymbolType::Matrix { dims, .. } = &p.ty {
                    let count = dims.iter().product::<u32>() as i32;
                    cursor -= 4 * count;
                    frame.slots.insert(name, Slot::Matrix { offset: cursor, dims: dims.clone() });
                }
            }
        }
        frame.frame_size = -cursor;
        self.frame = frame;
    }

    fn emit_prologue(&mut self, frame_size: i32) -> Result<(), CodeGenError> {
        self.emit("    push ebp")?;
        self.emit("    mov ebp, esp")?;
        if frame_size > 0 {
            self.emit(format!("    sub esp, {frame_size}"))?;
        }
        Ok(())
    }

    fn emit_copy_in_matrix_params(&mut self) -> Result<(), CodeGenError> {
        for (name, incoming_offset) in self.frame.incoming_matrix_ptrs.clone() {
            let Slot::Matrix { offset, dims } = self.frame.slots.get(&name).cloned().unwrap() else {
                continue;
            };
            let count: u32 = dims.iter().product();
            self.emit(format!("    mov esi, [{}]", format_ebp_offset(incoming_offset)))?;
            self.emit(format!("    lea edi, [{}]", format_ebp_offset(offset)))?;
            self.emit(format!("    mov ecx, {count}"))?;
            self.emit("    rep movsd")?;
        }
        Ok(())
    }

    fn emit_zero_init_locals(&mut self, f: &FuncDecl) -> Result<(), CodeGenError> {
        for decl in &f.locals {
            for name in &decl.names {
                let slot = self.frame.slots.get(name).cloned();
                match slot {
                    Some(Slot::Scalar { offset }) => {
                        self.emit(format!("    mov dword [{}], 0", format_ebp_offset(offset)))?;
                    }
                    Some(Slot::Matrix { offset, dims }) => {
                        let count: u32 = dims.iter().product();
                        self.emit(format!("    lea edi, [{}]", format_ebp_offset(offset)))?;
                        self.emit(format!("    mov ecx, {count}"))?;
                        self.emit("    xor eax, eax")?;
                        self.emit("    rep stosd")?;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    // ---- top-level emission --------------------------------------------------

    fn emit_main(&mut self) -> Result<(), CodeGenError> {
        self.scope = GLOBAL_SCOPE.to_string();
        self.frame = Frame::default();
        self.emit("main:")?;
        self.emit_prologue(0)?;
        let body = self.program.main_body.clone();
        for stmt in &body {
            self.emit_stmt(stmt)?;
        }
        self.emit("    mov eax, 0")?;
        self.emit("    return")?;
        Ok(())
    }

    fn emit_function(&mut self, f: &FuncDecl) -> Result<(), CodeGenError> {
        self.scope = f.name.clone();
        self.build_frame(f);
        self.emit(format!("func_{}:", f.name))?;
        self.emit_prologue(self.frame.frame_size)?;
        self.emit_copy_in_matrix_params()?;
        self.emit_zero_init_locals(f)?;
        let body = f.body.clone();
        for stmt in &body {
            self.emit_stmt(stmt)?;
        }
        // Falling off the end leaves whatever is in eax (§9) — deliberately
        // different from the interpreter/C translator, which return the
        // declared type's zero value.
        self.emit("    return")?;
        Ok(())
    }

    fn emit_atoi_helper(&mut self) -> Result<(), CodeGenError> {
        self.emit("gpt_atoi:")?;
        self.emit("    push ebp")?;
        self.emit("    mov ebp, esp")?;
        self.emit("    push esi")?;
        self.emit("    mov esi, [ebp+8]")?;
        self.emit("    xor eax, eax")?;
        self.emit("    xor ecx, ecx")?; // sign flag
        self.emit("    cmp byte [esi], '-'")?;
        self.emit("    jne .loop")?;
        self.emit("    mov ecx, 1")?;
        self.emit("    inc esi")?;
        self.emit(".loop:")?;
        self.emit("    movzx edx, byte [esi]")?;
        self.emit("    cmp edx, '0'")?;
        self.emit("    jl .done")?;
        self.emit("    cmp edx, '9'")?;
        self.emit("    jg .done")?;
        self.emit("    sub edx, '0'")?;
        self.emit("    imul eax, eax, 10")?;
        self.emit("    add eax, edx")?;
        self.emit("    inc esi")?;
        self.emit("    jmp .loop")?;
        self.emit(".done:")?;
        self.emit("    test ecx, ecx")?;
        self.emit("    jz .positive")?;
        self.emit("    neg eax")?;
        self.emit(".positive:")?;
        self.emit("    pop esi")?;
        self.emit("    mov esp, ebp")?;
        self.emit("    pop ebp")?;
        self.emit("    ret")?;
        Ok(())
    }

    // ---- statements -----------------------------------------------------------

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), CodeGenError> {
        match stmt {
            Stmt::Assign { target, value, .. } => self.emit_assign(target, value),
            Stmt::Call(call) => self.emit_call_stmt(call),
            Stmt::Return { value, .. } => {
                if let Some(e) = value {
                    self.emit_expr(e)?;
                    self.emit("    pop eax")?;
                }
                self.emit("    return")
            }
            Stmt::If { cond, then_branch, else_branch, .. } => self.emit_if(cond, then_branch, else_branch),
            Stmt::While { cond, body, .. } => self.emit_while(cond, body),
            Stmt::RepeatUntil { body, cond, .. } => self.emit_repeat_until(body, cond),
            Stmt::For { var, from, to, step, body, .. } => self.emit_for(var, from, to, *step, body),
        }
    }

    fn emit_assign(&mut self, target: &LValue, value: &Expr) -> Result<(), CodeGenError> {
        if let Expr::Call(call) = value {
            if call.name == builtins::LEIA {
                return self.emit_leia_assign(target, call);
            }
        }

        if target.indices.is_empty() {
            self.emit_expr(value)?;
            self.emit("    pop eax")?;
            let slot = self.resolve(&target.name)?;
            let operand = self.scalar_operand(&slot);
            self.emit(format!("    mov [{operand}], eax"))?;
        } else {
            let slot = self.resolve(&target.name)?;
            let dims = self.matrix_dims(&slot)?.to_vec();
            let base = self.base_operand(&slot);
            self.emit_index_offset(&dims, &target.indices)?;
            self.emit(format!("    lea eax, [{base}]"))?;
            self.emit("    lea eax, [eax + ecx*4]")?;
            self.emit("    push eax")?;
            self.emit_expr(value)?;
            self.emit("    pop ebx")?;
            self.emit("    pop eax")?;
            self.emit("    mov [eax], ebx")?;
        }
        Ok(())
    }

    fn emit_leia_assign(&mut self, target: &LValue, _call: &FuncCall) -> Result<(), CodeGenError> {
        self.emit("    call leia")?;
        let ty = self.static_type(&Expr::LValue(target.clone()));
        match ty {
            SymbolType::Primitive(PrimitiveType::Literal) => {
                self.emit("    push eax")?;
                self.emit("    call clone_literal")?;
                self.emit("    add esp, 4")?;
            }
            _ => {
                self.needs_atoi_helper = true;
                self.emit("    push eax")?;
                self.emit("    call gpt_atoi")?;
                self.emit("    add esp, 4")?;
            }
        }
        if target.indices.is_empty() {
            let slot = self.resolve(&target.name)?;
            let operand = self.scalar_operand(&slot);
            self.emit(format!("    mov [{operand}], eax"))?;
        } else {
            self.emit("    push eax")?;
            let slot = self.resolve(&target.name)?;
            let dims = self.matrix_dims(&slot)?.to_vec();
            let base = self.base_operand(&slot);
            self.emit_index_offset(&dims, &target.indices)?;
            self.emit(format!("    lea eax, [{base}]"))?;
            self.emit("    lea eax, [eax + ecx*4]")?;
            self.emit("    pop ebx")?; // value read above
            self.emit("    mov [eax], ebx")?;
        }
        Ok(())
    }

    fn emit_if(&mut self, cond: &Expr, then_branch: &[Stmt], else_branch: &[Stmt]) -> Result<(), CodeGenError> {
        let n = self.next_label("if");
        self.emit_expr(cond)?;
        self.emit("    pop eax")?;
        self.emit("    test eax, eax")?;
        if else_branch.is_empty() {
            self.emit(format!("    jz .if_{n}_end"))?;
            for s in then_branch {
                self.emit_stmt(s)?;
            }
            self.emit(format!(".if_{n}_end:"))?;
        } else {
            self.emit(format!("    jz .if_{n}_else"))?;
            for s in then_branch {
                self.emit_stmt(s)?;
            }
            self.emit(format!("    jmp .if_{n}_end"))?;
            self.emit(format!(".if_{n}_else:"))?;
            for s in else_branch {
                self.emit_stmt(s)?;
            }
            self.emit(format!(".if_{n}_end:"))?;
        }
        Ok(())
    }

    fn emit_while(&mut self, cond: &Expr, body: &[Stmt]) -> Result<(), CodeGenError> {
        let n = self.next_label("while");
        self.emit(format!(".while_{n}_start:"))?;
        self.emit_expr(cond)?;
        self.emit("    pop eax")?;
        self.emit("    test eax, eax")?;
        self.emit(format!("    jz .while_{n}_end"))?;
        for s in body {
            self.emit_stmt(s)?;
        }
        self.emit(format!("    jmp .while_{n}_start"))?;
        self.emit(format!(".while_{n}_end:"))?;
        Ok(())
    }

    fn emit_repeat_until(&mut self, body: &[Stmt], cond: &Expr) -> Result<(), CodeGenError> {
        let n = self.next_label("repeat");
        self.emit(format!(".repeat_{n}_start:"))?;
        for s in body {
            self.emit_stmt(s)?;
        }
        self.emit_expr(cond)?;
        self.emit("    pop eax")?;
        self.emit("    test eax, eax")?;
        self.emit(format!("    jz .repeat_{n}_start"))?;
        Ok(())
    }

    fn emit_for(
        &mut self,
        var: &LValue,
        from: &Expr,
        to: &Expr,
        step: Option<i32>,
        body: &[Stmt],
    ) -> Result<(), CodeGenError> {
        let n = self.next_label("for");
        let step_value = step.unwrap_or(1);
        let negative = step_value < 0;
        let increment = step_value.unsigned_abs();

        self.emit_assign(var, from)?;
        self.emit(format!(".for_{n}_start:"))?;
        self.emit_expr(to)?;
        self.emit_expr(&Expr::LValue(var.clone()))?;
        self.emit("    pop eax")?; // var
        self.emit("    pop ebx")?; // bound
        self.emit("    cmp eax, ebx")?;
        let skip = if negative { "jl" } else { "jg" };
        self.emit(format!("    {skip} .for_{n}_end"))?;
        for s in body {
            self.emit_stmt(s)?;
        }
        self.emit_expr(&Expr::LValue(var.clone()))?;
        self.emit("    pop eax")?;
        if negative {
            self.emit(format!("    sub eax, {increment}"))?;
        } else {
            self.emit(format!("    add eax, {increment}"))?;
        }
        self.emit("    push eax")?;
        self.emit_store_top_of_stack(var)?;
        self.emit(format!("    jmp .for_{n}_start"))?;
        self.emit(format!(".for_{n}_end:"))?;
        self.emit_expr(to)?;
        self.emit_store_top_of_stack(var)?;
        Ok(())
    }

    /// Pops the top of the virtual stack into `target`. Used by the `para`
    /// loop, which computes the next/bound value before it knows the final
    /// target lvalue's addressing mode.
    fn emit_store_top_of_stack(&mut self, target: &LValue) -> Result<(), CodeGenError> {
        if target.indices.is_empty() {
            self.emit("    pop eax")?;
            let slot = self.resolve(&target.name)?;
            let operand = self.scalar_operand(&slot);
            self.emit(format!("    mov [{operand}], eax"))?;
        } else {
            self.emit("    pop ebx")?; // value
            let slot = self.resolve(&target.name)?;
            let dims = self.matrix_dims(&slot)?.to_vec();
            let base = self.base_operand(&slot);
            self.emit_index_offset(&dims, &target.indices)?;
            self.emit(format!("    lea eax, [{base}]"))?;
            self.emit("    lea eax, [eax + ecx*4]")?;
            self.emit("    mov [eax], ebx")?;
        }
        Ok(())
    }

    fn emit_call_stmt(&mut self, call: &FuncCall) -> Result<(), CodeGenError> {
        if call.name == builtins::IMPRIMA {
            return self.emit_imprima(call);
        }
        if call.name == builtins::LEIA {
            self.emit("    call leia")?;
            return Ok(());
        }
        self.emit_call_core(call)
    }

    fn emit_imprima(&mut self, call: &FuncCall) -> Result<(), CodeGenError> {
        let n = call.args.len();
        for arg in call.args.iter().rev() {
            let tag = self.print_tag(arg);
            self.emit_expr(arg)?;
            self.emit(format!("    push dword {}", tag as u32))?;
        }
        self.emit(format!("    push dword {n}"))?;
        self.emit("    call imprima")?;
        self.emit(format!("    add esp, {}", n * 8 + 4))?;
        Ok(())
    }

    fn print_tag(&self, arg: &Expr) -> char {
        match self.static_type(arg) {
            SymbolType::Primitive(PrimitiveType::Literal) => 's',
            SymbolType::Primitive(PrimitiveType::Caractere) => 'c',
            SymbolType::Primitive(PrimitiveType::Real) => 'r',
            _ => 'i',
        }
    }

    // ---- calls ------------------------------------------------------------

    fn emit_call_core(&mut self, call: &FuncCall) -> Result<(), CodeGenError> {
        if call.name == builtins::LEIA {
            self.emit("    call leia")?;
            return Ok(());
        }
        let func = self
            .program
            .functions
            .iter()
            .find(|f| f.name == call.name)
            .cloned()
            .ok_or_else(|| CodeGenError::Logic(format!("função {} não declarada", call.name)))?;
        for (arg, param) in call.args.iter().zip(&func.params) {
            self.emit_arg_push(arg, &param.ty)?;
        }
        self.emit(format!("    call func_{}", func.name))?;
        if !func.params.is_empty() {
            self.emit(format!("    add esp, {}", func.params.len() * 4))?;
        }
        Ok(())
    }

    fn emit_arg_push(&mut self, arg: &Expr, param_ty: &SymbolType) -> Result<(), CodeGenError> {
        match param_ty {
            SymbolType::Matrix { .. } => {
                let name = match arg {
                    Expr::LValue(lv) if lv.indices.is_empty() => lv.name.clone(),
                    _ => {
                        return Err(CodeGenError::Logic(
                            "argumento de matriz deve ser um nome de array".to_string(),
                        ));
                    }
                };
                let slot = self.resolve(&name)?;
                let base = self.base_operand(&slot);
                self.emit(format!("    lea eax, [{base}]"))?;
                self.emit("    push eax")?;
            }
            SymbolType::Primitive(_) => {
                self.emit_expr(arg)?;
            }
        }
        Ok(())
    }

    // ---- expressions --------------------------------------------------------

    fn emit_expr(&mut self, expr: &Expr) -> Result<(), CodeGenError> {
        match expr {
            Expr::Literal(lit, _) => self.emit_literal(lit),
            Expr::LValue(lv) => self.emit_load(lv),
            Expr::Call(call) => {
                self.emit_call_core(call)?;
                self.emit("    push eax")
            }
            Expr::Unary { op, operand, .. } => self.emit_unary(*op, operand),
            Expr::Binary { op, lhs, rhs, .. } => self.emit_binary(*op, lhs, rhs),
        }
    }

    fn emit_literal(&mut self, lit: &Literal) -> Result<(), CodeGenError> {
        match lit {
            Literal::Int(n) => self.emit(format!("    push dword {}", *n as i32)),
            Literal::Real(r) => self.emit(format!("    push dword {}", *r as i32)),
            Literal::Char(c) => self.emit(format!("    push dword {}", *c as u32)),
            Literal::Bool(b) => self.emit(format!("    push dword {}", i32::from(*b))),
            Literal::Str(s) => {
                let label = self.literal_label(s);
                self.emit(format!("    push dword {label}"))
            }
        }
    }

    fn emit_load(&mut self, lv: &LValue) -> Result<(), CodeGenError> {
        if lv.indices.is_empty() {
            let slot = self.resolve(&lv.name)?;
            let operand = self.scalar_operand(&slot);
            return self.emit(format!("    push dword [{operand}]"));
        }
        let slot = self.resolve(&lv.name)?;
        let dims = self.matrix_dims(&slot)?.to_vec();
        let base = self.base_operand(&slot);
        self.emit_index_offset(&dims, &lv.indices)?;
        self.emit(format!("    lea eax, [{base}]"))?;
        self.emit("    lea eax, [eax + ecx*4]")?;
        self.emit("    push dword [eax]")
    }

    /// Leaves the flat row-major element index (§3.6) in `ecx`.
    fn emit_index_offset(&mut self, dims: &[u32], indices: &[Expr]) -> Result<(), CodeGenError> {
        self.emit("    xor ecx, ecx")?;
        for (dim, idx) in dims.iter().zip(indices) {
            self.emit("    push ecx")?;
            self.emit_expr(idx)?;
            self.emit("    pop eax")?;
            self.emit("    pop ecx")?;
            self.emit(format!("    imul ecx, ecx, {dim}"))?;
            self.emit("    add ecx, eax")?;
        }
        Ok(())
    }

    fn emit_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<(), CodeGenError> {
        self.emit_expr(operand)?;
        match op {
            UnaryOp::Pos => {}
            UnaryOp::Neg => {
                self.emit("    pop eax")?;
                self.emit("    neg eax")?;
                self.emit("    push eax")?;
            }
            UnaryOp::Not => {
                self.emit("    pop eax")?;
                self.emit("    test eax, eax")?;
                self.emit("    setz al")?;
                self.emit("    movzx eax, al")?;
                self.emit("    push eax")?;
            }
            UnaryOp::BitNot => {
                self.emit("    pop eax")?;
                self.emit("    not eax")?;
                self.emit("    push eax")?;
            }
        }
        Ok(())
    }

    fn emit_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<(), CodeGenError> {
        self.emit_expr(lhs)?;
        self.emit_expr(rhs)?;
        match op {
            BinOp::Div | BinOp::Mod => {
                self.emit("    pop ebx")?; // divisor (rhs)
                self.emit("    pop eax")?; // dividend (lhs)
                self.emit("    cdq")?;
                self.emit("    idiv ebx")?;
                let reg = if op == BinOp::Div { "eax" } else { "edx" };
                self.emit(format!("    push {reg}"))?;
            }
            BinOp::Or | BinOp::And => {
                self.emit("    pop eax")?; // rhs
                self.emit("    pop ebx")?; // lhs
                self.emit("    test eax, eax")?;
                self.emit("    setnz al")?;
                self.emit("    test ebx, ebx")?;
                self.emit("    setnz bl")?;
                let op_mnemonic = if op == BinOp::Or { "or" } else { "and" };
                self.emit(format!("    {op_mnemonic} al, bl"))?;
                self.emit("    movzx eax, al")?;
                self.emit("    push eax")?;
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                self.emit("    pop edx")?; // rhs
                self.emit("    pop ebx")?; // lhs
                self.emit("    cmp ebx, edx")?;
                self.emit("    mov eax, 0")?;
                let setcc = match op {
                    BinOp::Eq => "sete",
                    BinOp::Ne => "setne",
                    BinOp::Lt => "setl",
                    BinOp::Gt => "setg",
                    BinOp::Le => "setle",
                    BinOp::Ge => "setge",
                    _ => unreachable!(),
                };
                self.emit(format!("    {setcc} al"))?;
                self.emit("    push eax")?;
            }
            BinOp::BitOr | BinOp::BitXor | BinOp::BitAnd | BinOp::Add | BinOp::Sub | BinOp::Mul => {
                self.emit("    pop eax")?; // rhs
                self.emit("    pop ebx")?; // lhs
                let mnemonic = match op {
                    BinOp::BitOr => "or",
                    BinOp::BitXor => "xor",
                    BinOp::BitAnd => "and",
                    BinOp::Add => "add",
                    BinOp::Sub => "sub",
                    BinOp::Mul => "imul",
                    _ => unreachable!(),
                };
                self.emit(format!("    {mnemonic} ebx, eax"))?;
                self.emit("    push ebx")?;
            }
        }
        Ok(())
    }

    /// Best-effort static type, mirroring `interpreter::infer_type` and
    /// `codegen_c::static_type` — used only to choose an `imprima` tag or a
    /// `leia` conversion path.
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

fn format_ebp_offset(offset: i32) -> String {
    if offset >= 0 {
        format!("ebp+{offset}")
    } else {
        format!("ebp{offset}")
    }
}

fn alloc_local(frame: &mut Frame, cursor: &mut i32, decl: &VarDecl) {
    for name in &decl.names {
        match &decl.ty {
            SymbolType::Primitive(_) => {
                *cursor -= 4;
                frame.slots.insert(name.clone(), Slot::Scalar { offset: *cursor });
            }
            SymbolType::Matrix { dims, .. } => {
                let count = dims.iter().product::<u32>() as i32;
                *cursor -= 4 * count;
                frame.slots.insert(name.clone(), Slot::Matrix { offset: *cursor, dims: dims.clone() });
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

    fn emit(src: &str) -> String {
        let program = Parser::new(src).unwrap().parse().unwrap();
        let mut diagnostics = Diagnostics::new("prog.pol");
        let table = analyze(&program, &mut diagnostics);
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics.records());
        generate(&program, &table).unwrap()
    }

    #[test]
    fn scenario_s1_emits_main_label_and_arithmetic() {
        let asm = emit(
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
        assert!(asm.contains("main:"));
        assert!(asm.contains("add ebx, eax"));
        assert!(asm.contains("call imprima"));
        assert!(asm.contains("g_a: resd 1"));
    }

    #[test]
    fn imprima_pushes_tag_value_pairs_then_argcount() {
        let asm = emit(
            r#"
            algoritmo P
            inicio
              imprima("ola")
            fim
            "#,
        );
        assert!(asm.contains("push dword 1")); // argcount
        assert!(asm.contains(&format!("push dword {}", 's' as u32)));
        assert!(asm.contains("lit_0: db"));
    }

    #[test]
    fn recursive_function_gets_its_own_label_and_call_site() {
        let asm = emit(
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
        assert!(asm.contains("func_fat:"));
        assert!(asm.contains("call func_fat"));
        assert!(asm.contains("setle"));
    }

    #[test]
    fn matrix_parameter_is_copied_with_rep_movsd() {
        let asm = emit(
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
        assert!(asm.contains("rep movsd"));
    }

    #[test]
    fn for_loop_reassigns_bound_after_the_loop_body() {
        let asm = emit(
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
        assert!(asm.contains(".for_0_start:"));
        assert!(asm.contains("sub eax, 2"));
        assert!(asm.contains(".for_0_end:"));
    }
}
