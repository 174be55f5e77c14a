// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use fool_frontend::Line;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Syntax,
    /// Duplicate name in one scope; the later declaration wins.
    DeclarationConflict,
    /// Identifier, class or method not found; the node stays unannotated.
    UnresolvedReference,
    TypeMismatch,
    /// Field or method override that is not a subtype of the inherited member.
    OverrideViolation,
    InheritanceCycle,
}

/// A line-tagged compilation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: Line,
    pub message: String,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(kind: DiagnosticKind, line: Line, message: S) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    pub fn syntax<S: Into<String>>(line: Line, message: S) -> Self {
        Self::new(DiagnosticKind::Syntax, line, message)
    }

    pub fn conflict<S: Into<String>>(line: Line, message: S) -> Self {
        Self::new(DiagnosticKind::DeclarationConflict, line, message)
    }

    pub fn unresolved<S: Into<String>>(line: Line, message: S) -> Self {
        Self::new(DiagnosticKind::UnresolvedReference, line, message)
    }

    pub fn mismatch<S: Into<String>>(line: Line, message: S) -> Self {
        Self::new(DiagnosticKind::TypeMismatch, line, message)
    }

    pub fn override_violation<S: Into<String>>(line: Line, message: S) -> Self {
        Self::new(DiagnosticKind::OverrideViolation, line, message)
    }

    pub fn cycle<S: Into<String>>(line: Line, message: S) -> Self {
        Self::new(DiagnosticKind::InheritanceCycle, line, message)
    }
}
