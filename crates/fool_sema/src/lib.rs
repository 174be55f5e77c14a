// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! Semantic analysis for FOOL: scope resolution and type checking, plus the
//! per-compilation [`Session`] they share with code generation.

pub mod diagnostic;
pub mod relations;
pub mod resolver;
pub mod scope;
pub mod session;
pub mod typechecker;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use relations::TypeRels;
pub use resolver::resolve_program;
pub use scope::{ClassInfo, ClassRegistry, ScopeMap, ScopeStack};
pub use session::{LabelGen, Phase, Session, SessionError};
pub use typechecker::{check_program, Check, TypeError};
