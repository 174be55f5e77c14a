// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::relations::TypeRels;
use crate::scope::ClassRegistry;

/// How far one compilation has progressed. Each pass runs at most once, in order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Fresh,
    Resolved,
    Checked,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{pass} cannot run in phase {phase:?}")]
    PassOutOfOrder { pass: &'static str, phase: Phase },

    #[error("{0} error(s) recorded; refusing to generate code")]
    ErrorsRecorded(usize),
}

/// Fresh-label allocator for generated code.
#[derive(Debug, Default, Clone)]
pub struct LabelGen {
    labels: usize,
    fun_labels: usize,
}

impl LabelGen {
    pub fn fresh_label(&mut self) -> String {
        let l = format!("label{}", self.labels);
        self.labels += 1;
        l
    }

    pub fn fresh_fun_label(&mut self) -> String {
        let l = format!("function{}", self.fun_labels);
        self.fun_labels += 1;
        l
    }
}

/// State owned by a single compilation. Create a new one per program.
#[derive(Debug, Clone)]
pub struct Session {
    pub classes: ClassRegistry,
    pub rels: TypeRels,
    pub labels: LabelGen,
    diagnostics: Vec<Diagnostic>,
    phase: Phase,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            classes: ClassRegistry::new(),
            rels: TypeRels::new(),
            labels: LabelGen::default(),
            diagnostics: Vec::new(),
            phase: Phase::Fresh,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Moves from `from` to `to`, or fails if `pass` is being run out of order.
    pub fn advance(&mut self, pass: &'static str, from: Phase, to: Phase) -> Result<(), SessionError> {
        if self.phase != from {
            return Err(SessionError::PassOutOfOrder {
                pass,
                phase: self.phase,
            });
        }
        self.phase = to;
        Ok(())
    }

    pub fn report(&mut self, diag: Diagnostic) {
        tracing::debug!(line = diag.line, kind = ?diag.kind, "{}", diag.message);
        self.diagnostics.push(diag);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique_per_session() {
        let mut s = Session::new();
        assert_eq!(s.labels.fresh_label(), "label0");
        assert_eq!(s.labels.fresh_label(), "label1");
        assert_eq!(s.labels.fresh_fun_label(), "function0");

        // a new session starts over
        let mut t = Session::new();
        assert_eq!(t.labels.fresh_label(), "label0");
    }

    #[test]
    fn passes_advance_once_in_order() {
        let mut s = Session::new();
        assert!(s.advance("check", Phase::Resolved, Phase::Checked).is_err());
        s.advance("resolve", Phase::Fresh, Phase::Resolved).unwrap();
        let err = s.advance("resolve", Phase::Fresh, Phase::Resolved).unwrap_err();
        assert_eq!(
            err,
            SessionError::PassOutOfOrder {
                pass: "resolve",
                phase: Phase::Resolved
            }
        );
    }
}
