// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! Static type checking over a resolved program.
//!
//! Expression checks fail fast with a [`TypeError`]. Each declaration is a
//! recovery point: its diagnostic is recorded and checking moves on to the
//! next sibling. Instantiation argument mismatches are recorded without
//! aborting anything.

use fool_frontend::*;
use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::session::{Phase, Session, SessionError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// A missing annotation or an unresolvable declared type; already reported
    /// during resolution, so it is never surfaced again.
    #[error("incomplete type")]
    Incomplete,

    #[error(transparent)]
    Diagnostic(#[from] Diagnostic),
}

pub type Check<T> = Result<T, TypeError>;

/// Type-checks `program`, returning the type of its main expression when that
/// expression checks.
pub fn check_program(session: &mut Session, program: &Program) -> Result<Option<Type>, SessionError> {
    session.advance("type checking", Phase::Resolved, Phase::Checked)?;
    let mut checker = TypeChecker { session: &mut *session };
    let ty = checker.program(program);
    tracing::debug!(errors = session.error_count(), ty = ?ty, "type checking finished");
    Ok(ty)
}

fn complete(ty: &Type) -> Check<()> {
    match ty {
        Type::Incomplete => Err(TypeError::Incomplete),
        Type::Arrow(at) => {
            at.params.iter().try_for_each(complete)?;
            complete(&at.ret)
        }
        Type::Class(ct) => {
            ct.fields.iter().try_for_each(complete)?;
            ct.methods
                .iter()
                .try_for_each(|m| complete(&Type::Arrow(m.clone())))
        }
        _ => Ok(()),
    }
}

fn mismatch(line: Line, message: String) -> TypeError {
    Diagnostic::mismatch(line, message).into()
}

struct TypeChecker<'s> {
    session: &'s mut Session,
}

impl TypeChecker<'_> {
    fn is_subtype(&self, a: &Type, b: &Type) -> bool {
        self.session.rels.is_subtype(a, b)
    }

    /// Runs one declaration check, recording its diagnostic if it fails.
    fn guard(&mut self, f: impl FnOnce(&mut Self) -> Check<()>) {
        match f(self) {
            Ok(()) => {}
            Err(TypeError::Incomplete) => tracing::trace!("skipped declaration with incomplete type"),
            Err(TypeError::Diagnostic(d)) => self.session.report(d),
        }
    }

    fn program(&mut self, p: &Program) -> Option<Type> {
        for class in &p.classes {
            self.guard(|c| c.class(class));
        }
        for dec in &p.decs {
            self.guard(|c| c.dec(dec));
        }
        match self.expr(&p.body) {
            Ok(ty) => Some(ty),
            Err(TypeError::Incomplete) => {
                tracing::debug!("main expression has an incomplete type");
                None
            }
            Err(TypeError::Diagnostic(d)) => {
                self.session.report(d);
                None
            }
        }
    }

    fn dec(&mut self, dec: &Dec) -> Check<()> {
        match dec {
            Dec::Var(v) => {
                let init = self.expr(&v.init)?;
                complete(&v.ty)?;
                if !self.is_subtype(&init, &v.ty) {
                    return Err(mismatch(v.line, format!("Incompatible value for variable {}", v.id)));
                }
                Ok(())
            }
            Dec::Fun(f) => self.body(&f.decs, &f.body, &f.ret, f.line, "function", &f.id),
        }
    }

    fn body(&mut self, decs: &[Dec], body: &Expr, ret: &Type, line: Line, what: &str, id: &str) -> Check<()> {
        for dec in decs {
            self.guard(|c| c.dec(dec));
        }
        let ty = self.expr(body)?;
        complete(ret)?;
        if !self.is_subtype(&ty, ret) {
            return Err(mismatch(line, format!("Wrong return type for {what} {id}")));
        }
        Ok(())
    }

    fn class(&mut self, class: &ClassDec) -> Check<()> {
        for m in &class.methods {
            self.guard(|c| c.body(&m.decs, &m.body, &m.ret, m.line, "method", &m.id));
        }

        let (Some(entry), Some(super_entry)) = (&class.entry, &class.super_entry) else {
            return Ok(());
        };
        let (Type::Class(own), Type::Class(parent)) = (&entry.ty, &super_entry.ty) else {
            return Ok(());
        };

        for field in &class.fields {
            let Some(offset) = field.offset else { continue };
            let slot = (-offset - 1) as usize;
            if let (Some(t), Some(inherited)) = (own.fields.get(slot), parent.fields.get(slot)) {
                complete(t)?;
                complete(inherited)?;
                if !self.is_subtype(t, inherited) {
                    return Err(Diagnostic::override_violation(
                        field.line,
                        format!("Override of field {} in class {} needs to be a subtype", field.id, class.id),
                    )
                    .into());
                }
            }
        }

        for m in &class.methods {
            let Some(slot) = m.offset else { continue };
            let slot = slot as usize;
            if let (Some(t), Some(inherited)) = (own.methods.get(slot), parent.methods.get(slot)) {
                let (t, inherited) = (Type::Arrow(t.clone()), Type::Arrow(inherited.clone()));
                complete(&t)?;
                complete(&inherited)?;
                if !self.is_subtype(&t, &inherited) {
                    return Err(Diagnostic::override_violation(
                        m.line,
                        format!("Override of method {} in class {} needs to be a subtype", m.id, class.id),
                    )
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Shared by plain calls and method calls.
    fn invocation(&mut self, at: &ArrowType, args: &[Expr], line: Line, noun: &str, callee: &str) -> Check<Type> {
        if at.params.len() != args.len() {
            return Err(mismatch(
                line,
                format!("Wrong number of {noun}s in the invocation of {callee}"),
            ));
        }
        for (i, (arg, par)) in args.iter().zip(&at.params).enumerate() {
            let ty = self.expr(arg)?;
            if !self.is_subtype(&ty, par) {
                return Err(mismatch(
                    line,
                    format!("Wrong type for {}-th {noun} in the invocation of {callee}", i + 1),
                ));
            }
        }
        Ok((*at.ret).clone())
    }

    fn expr(&mut self, e: &Expr) -> Check<Type> {
        let line = e.line;
        match &e.kind {
            ExprKind::Int(_) => Ok(Type::Int),
            ExprKind::Bool(_) => Ok(Type::Bool),
            ExprKind::Null => Ok(Type::Empty),

            ExprKind::Id { id, binding } => {
                let ty = &binding.as_ref().ok_or(TypeError::Incomplete)?.entry.ty;
                complete(ty)?;
                match ty {
                    Type::Class(_) => Err(mismatch(line, format!("Wrong usage of a class identifier {id}"))),
                    Type::Arrow(_) => Err(mismatch(line, format!("Wrong usage of function identifier {id}"))),
                    other => Ok(other.clone()),
                }
            }

            ExprKind::Call { id, args, binding } => {
                let ty = &binding.as_ref().ok_or(TypeError::Incomplete)?.entry.ty;
                complete(ty)?;
                let Type::Arrow(at) = ty else {
                    return Err(mismatch(line, format!("Invocation of a non-function {id}")));
                };
                let at = at.clone();
                self.invocation(&at, args, line, "parameter", id)
            }

            ExprKind::MethodCall {
                obj_id,
                method_id,
                args,
                method,
                ..
            } => {
                let entry = method.as_ref().ok_or(TypeError::Incomplete)?;
                complete(&entry.ty)?;
                let Some(at) = entry.ty.as_arrow().cloned() else {
                    return Err(mismatch(
                        line,
                        format!("Invocation of a non-method {obj_id}.{method_id}"),
                    ));
                };
                self.invocation(&at, args, line, "argument", &format!("{obj_id}.{method_id}"))
            }

            ExprKind::New { class_id, args, entry } => {
                if entry.is_none() {
                    return Err(TypeError::Incomplete);
                }
                // the registry has the finished layout even for `new C()` inside C itself
                let fields = self
                    .session
                    .classes
                    .shape(class_id)
                    .map(|shape| shape.fields.clone())
                    .ok_or(TypeError::Incomplete)?;

                if fields.len() != args.len() {
                    self.session.report(Diagnostic::mismatch(
                        line,
                        format!(
                            "Class {class_id} constructor expects {} argument(s), got {}",
                            fields.len(),
                            args.len()
                        ),
                    ));
                }
                for (i, arg) in args.iter().enumerate() {
                    let ty = self.expr(arg)?;
                    let Some(field) = fields.get(i) else { continue };
                    if complete(field).is_ok() && !self.is_subtype(&ty, field) {
                        self.session.report(Diagnostic::mismatch(
                            line,
                            format!("Incompatible type for argument {} in class {class_id} constructor", i + 1),
                        ));
                    }
                }
                Ok(Type::reference(class_id.clone()))
            }

            ExprKind::If { cond, then_, else_ } => {
                let c = self.expr(cond)?;
                if !self.is_subtype(&c, &Type::Bool) {
                    return Err(mismatch(line, "Non boolean condition in if".to_string()));
                }
                let t = self.expr(then_)?;
                let f = self.expr(else_)?;
                self.session
                    .rels
                    .lowest_common_ancestor(&t, &f)
                    .ok_or_else(|| mismatch(line, "Incompatible types in then-else branches".to_string()))
            }

            ExprKind::Bin { op, lhs, rhs } => {
                let l = self.expr(lhs)?;
                let r = self.expr(rhs)?;
                let both = |ty: &Type| self.is_subtype(&l, ty) && self.is_subtype(&r, ty);
                let (ok, result, what) = match op {
                    BinOp::Add => (both(&Type::Int), Type::Int, "Non integers in sum"),
                    BinOp::Sub => (both(&Type::Int), Type::Int, "Non integers in subtraction"),
                    BinOp::Mul => (both(&Type::Int), Type::Int, "Non integers in multiplication"),
                    BinOp::Div => (both(&Type::Int), Type::Int, "Non integers in division"),
                    BinOp::And => (both(&Type::Bool), Type::Bool, "Non booleans in and"),
                    BinOp::Or => (both(&Type::Bool), Type::Bool, "Non booleans in or"),
                    BinOp::Eq | BinOp::Le | BinOp::Ge => (
                        self.is_subtype(&l, &r) || self.is_subtype(&r, &l),
                        Type::Bool,
                        "Incompatible types in comparison",
                    ),
                };
                if ok {
                    Ok(result)
                } else {
                    Err(mismatch(line, format!("{what} ({l} {op} {r})")))
                }
            }

            ExprKind::Not(inner) => {
                let ty = self.expr(inner)?;
                if !self.is_subtype(&ty, &Type::Bool) {
                    return Err(mismatch(line, "Wrong type for not".to_string()));
                }
                Ok(Type::Bool)
            }

            ExprKind::Print(inner) => self.expr(inner),
        }
    }
}
