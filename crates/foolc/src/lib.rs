// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! Whole-pipeline driver: source text in, assembled stack-machine code out.

use std::io::Write;

use fool_codegen::{assemble, generate, AssembleError, CodegenError, CodegenOptions, GeneratedCode};
use fool_frontend::{error_line, lex, parse_program, Lexed, ParseError, Program, Type};
use fool_runtime::{execute, Op, Outcome, VmConfig, VmError, DEFAULT_MEMSIZE};
use fool_sema::{check_program, resolve_program, Diagnostic, Session, SessionError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileConfig {
    /// Memory size of the VM the code will run on.
    pub memsize: usize,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            memsize: DEFAULT_MEMSIZE,
        }
    }
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{} error(s) found", .0.len())]
    Diagnostics(Vec<Diagnostic>),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

impl CompileError {
    /// Line-tagged diagnostics, empty for internal failures.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Diagnostics(d) => d,
            _ => &[],
        }
    }
}

/// Everything produced by one successful compilation.
#[derive(Debug, Clone)]
pub struct Compiled {
    /// The annotated program.
    pub program: Program,
    /// Type of the main expression.
    pub ty: Option<Type>,
    pub code: GeneratedCode,
    pub ops: Vec<Op>,
}

fn syntax_diagnostic(lexed: &Lexed, err: &ParseError<'_>) -> Diagnostic {
    let message = match err.found() {
        Some(tok) => format!("unexpected token {tok:?}"),
        None => "unexpected end of input".to_string(),
    };
    Diagnostic::syntax(error_line(lexed, err), message)
}

pub fn compile_source(src: &str, config: &CompileConfig) -> Result<Compiled, CompileError> {
    let lexed = lex(src).map_err(|errs| {
        CompileError::Diagnostics(
            errs.into_iter()
                .map(|e| Diagnostic::syntax(e.line, format!("unrecognized input {:?}", e.text)))
                .collect(),
        )
    })?;
    let mut program = parse_program(&lexed).map_err(|errs| {
        CompileError::Diagnostics(errs.iter().map(|e| syntax_diagnostic(&lexed, e)).collect())
    })?;

    let mut session = Session::new();
    resolve_program(&mut session, &mut program)?;
    let ty = check_program(&mut session, &program)?;
    if session.has_errors() {
        return Err(CompileError::Diagnostics(session.take_diagnostics()));
    }

    let code = generate(
        &mut session,
        &program,
        &CodegenOptions {
            memsize: config.memsize,
        },
    )?;
    let ops = assemble(&code.instrs)?;
    tracing::debug!(ty = ?ty, ops = ops.len(), "compiled");

    Ok(Compiled {
        program,
        ty,
        code,
        ops,
    })
}

/// Runs compiled code; `config.memsize` should match the one it was compiled for.
pub fn run_compiled(compiled: &Compiled, config: &VmConfig, out: &mut impl Write) -> Result<Outcome, VmError> {
    execute(&compiled.ops, *config, out)
}
