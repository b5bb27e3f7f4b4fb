//! x86 generator state and core types: this module owns the emitter struct
//! and the small value types around it; `mod.rs` owns the actual emission
//! logic.

use std::collections::HashMap;

use gpt_core::{Program, SymbolType};

use crate::symtab::SymbolTable;

/// Where a variable's 32-bit cell lives, relative to the current function's
/// frame (or a fixed global label). Every value in this back-end — INTEIRO,
/// REAL (truncated, see `mod.rs`), CARACTERE, LOGICO, and LITERAL (a
/// pointer) — occupies exactly one dword; a `Matrix` slot is the base of a
/// contiguous run of `count` dwords.
#[derive(Debug, Clone)]
pub(super) enum Slot {
    Scalar { offset: i32 },
    Matrix { offset: i32, dims: Vec<u32> },
    Global { label: String },
    GlobalMatrix { label: String, dims: Vec<u32> },
}

/// A function's stack frame: where each local/param cell lives relative to
/// `ebp`, classified the way the original design note calls VAR_GLOBAL /
/// VAR_PARAM / VAR_LOCAL — globals are `Slot::Global*`, everything else is
/// `Slot::Scalar`/`Slot::Matrix` with a signed `ebp`-relative offset (params
/// positive, locals negative).
#[derive(Debug, Default)]
pub(super) struct Frame {
    pub(super) slots: HashMap<String, Slot>,
    /// For a matrix parameter: the positive `ebp`-relative offset of the
    /// incoming pointer, so the prologue can copy from it into the local
    /// `Slot::Matrix` buffer of the same name (pass-by-copy, §9).
    pub(super) incoming_matrix_ptrs: Vec<(String, i32)>,
    pub(super) frame_size: i32,
}

pub struct X86Gen<'a> {
    pub(super) table: &'a SymbolTable,
    pub(super) program: &'a Program,
    pub(super) scope: String,
    pub(super) frame: Frame,
    pub(super) globals: HashMap<String, Slot>,
    pub(super) out: String,
    pub(super) data: String,
    /// String literal pool, keyed by value to avoid duplicate emission.
    pub(super) literals: HashMap<String, String>,
    pub(super) literal_order: Vec<(String, String)>,
    pub(super) label_counters: HashMap<&'static str, u32>,
    pub(super) needs_atoi_helper: bool,
}

impl<'a> X86Gen<'a> {
    pub(super) fn new(table: &'a SymbolTable, program: &'a Program) -> Self {
        X86Gen {
            table,
            program,
            scope: crate::symtab::GLOBAL_SCOPE.to_string(),
            frame: Frame::default(),
            globals: HashMap::new(),
            out: String::new(),
            data: String::new(),
            literals: HashMap::new(),
            literal_order: Vec::new(),
            label_counters: HashMap::new(),
            needs_atoi_helper: false,
        }
    }

    /// Monotonic, per-kind label counter (e.g. `if_3`, `while_3_end`) —
    /// one counter per construct kind instead of one global counter, so
    /// labels stay legible in the emitted text.
    pub(super) fn next_label(&mut self, kind: &'static str) -> u32 {
        let counter = self.label_counters.entry(kind).or_insert(0);
        let n = *counter;
        *counter += 1;
        n
    }

    pub(super) fn literal_label(&mut self, value: &str) -> String {
        if let Some(label) = self.literals.get(value) {
            return label.clone();
        }
        let label = format!("lit_{}", self.literal_order.len());
        self.literals.insert(value.to_string(), label.clone());
        self.literal_order.push((label.clone(), value.to_string()));
        label
    }

    pub(super) fn element_count(ty: &SymbolType) -> u32 {
        match ty {
            SymbolType::Primitive(_) => 1,
            SymbolType::Matrix { dims, .. } => dims.iter().product(),
        }
    }
}
