// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

pub mod abi;
pub mod emit;
pub mod instr;
pub mod lowering;

use fool_frontend::{Line, Program};
use fool_runtime::DEFAULT_MEMSIZE;
use fool_sema::{Phase, Session, SessionError};
use thiserror::Error;

pub use emit::{assemble, to_asm, AssembleError};
pub use instr::{Instr, Operand};
pub use lowering::DispatchTables;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("line {line}: `{what}` reached code generation without a resolved declaration")]
    Unannotated { line: Line, what: String },

    #[error("no dispatch table was built for class {0}")]
    MissingDispatchTable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Must equal the VM's memory size: global slots are addressed as `memsize + offset`.
    pub memsize: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            memsize: DEFAULT_MEMSIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedCode {
    pub instrs: Vec<Instr>,
    pub dispatch_tables: DispatchTables,
}

impl GeneratedCode {
    pub fn asm(&self) -> String {
        to_asm(&self.instrs)
    }
}

/// Lowers a resolved, type-checked program. Refuses to run if the session
/// recorded any diagnostic.
pub fn generate(
    session: &mut Session,
    program: &Program,
    options: &CodegenOptions,
) -> Result<GeneratedCode, CodegenError> {
    if session.has_errors() {
        return Err(SessionError::ErrorsRecorded(session.error_count()).into());
    }
    session.advance("code generation", Phase::Checked, Phase::Generated)?;

    let (instrs, dispatch_tables) =
        lowering::Lowering::new(&mut session.labels, options.memsize).lower_program(program)?;
    tracing::debug!(
        instructions = instrs.len(),
        classes = dispatch_tables.len(),
        "code generation finished"
    );
    Ok(GeneratedCode {
        instrs,
        dispatch_tables,
    })
}
