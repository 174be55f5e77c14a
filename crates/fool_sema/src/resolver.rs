// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! Scope resolution: binds every identifier occurrence to its declaration and
//! assigns storage offsets.
//!
//! Offset conventions:
//! - parameters: `1, 2, ..` in declaration order
//! - locals, globals and classes: `-2, -3, ..`
//! - methods: dispatch-table slots `0, 1, ..` continuing after inherited methods
//! - fields: `-1, -2, ..` continuing below inherited fields

use std::collections::HashSet;

use fool_frontend::*;

use crate::diagnostic::Diagnostic;
use crate::scope::{ClassInfo, ScopeMap, ScopeStack};
use crate::session::{Phase, Session, SessionError};

/// Resolves `program` in place, recording declaration errors in the session.
pub fn resolve_program(session: &mut Session, program: &mut Program) -> Result<(), SessionError> {
    session.advance("scope resolution", Phase::Fresh, Phase::Resolved)?;
    let mut r = Resolver::new(session, program);
    r.program(program);
    tracing::debug!(errors = session.error_count(), "scope resolution finished");
    Ok(())
}

struct Resolver<'s> {
    session: &'s mut Session,
    scopes: ScopeStack,
    nesting_level: usize,
    dec_offset: i64,
    /// Every class name declared anywhere in the program, so types may refer forward.
    declared_classes: HashSet<String>,
}

impl<'s> Resolver<'s> {
    fn new(session: &'s mut Session, program: &Program) -> Self {
        Self {
            session,
            scopes: ScopeStack::new(),
            nesting_level: 0,
            dec_offset: -2,
            declared_classes: program.classes.iter().map(|c| c.id.clone()).collect(),
        }
    }

    fn report(&mut self, diag: Diagnostic) {
        self.session.report(diag);
    }

    fn next_dec_offset(&mut self) -> i64 {
        let o = self.dec_offset;
        self.dec_offset -= 1;
        o
    }

    fn program(&mut self, p: &mut Program) {
        self.scopes.push();
        for class in &mut p.classes {
            self.class(class);
        }
        for dec in &mut p.decs {
            self.dec(dec);
        }
        self.expr(&mut p.body);
        self.scopes.pop();
    }

    /// Declared types naming unknown classes become `Incomplete`.
    fn resolve_type(&mut self, ty: &Type, line: Line) -> Type {
        match ty {
            Type::Ref(id) if !self.declared_classes.contains(id) => {
                self.report(Diagnostic::unresolved(
                    line,
                    format!("Class id {id} not declared"),
                ));
                Type::Incomplete
            }
            Type::Arrow(at) => {
                let params = at
                    .params
                    .iter()
                    .map(|p| self.resolve_type(p, line))
                    .collect();
                let ret = self.resolve_type(&at.ret, line);
                Type::arrow(params, ret)
            }
            other => other.clone(),
        }
    }

    fn dec(&mut self, dec: &mut Dec) {
        match dec {
            Dec::Var(v) => self.var(v),
            Dec::Fun(f) => self.fun(f),
        }
    }

    fn var(&mut self, v: &mut VarDec) {
        self.expr(&mut v.init);
        v.ty = self.resolve_type(&v.ty, v.line);

        let entry = SymEntry::new(self.nesting_level, v.ty.clone(), self.next_dec_offset());
        tracing::trace!(id = %v.id, nl = entry.nl, offset = entry.offset, "var");
        if self.scopes.insert(&v.id, entry).is_some() {
            self.report(Diagnostic::conflict(
                v.line,
                format!("Var id {} already declared", v.id),
            ));
        }
    }

    fn fun(&mut self, f: &mut FunDec) {
        let params = self.params(&mut f.params);
        f.ret = self.resolve_type(&f.ret, f.line);

        // bound before the body is visited so the function can call itself
        let entry = SymEntry::new(
            self.nesting_level,
            Type::arrow(params, f.ret.clone()),
            self.next_dec_offset(),
        );
        tracing::trace!(id = %f.id, nl = entry.nl, offset = entry.offset, "fun");
        if self.scopes.insert(&f.id, entry).is_some() {
            self.report(Diagnostic::conflict(
                f.line,
                format!("Fun id {} already declared", f.id),
            ));
        }

        self.body(&f.params, &mut f.decs, &mut f.body);
    }

    fn params(&mut self, params: &mut [Param]) -> Vec<Type> {
        params
            .iter_mut()
            .map(|p| {
                p.ty = self.resolve_type(&p.ty, p.line);
                p.ty.clone()
            })
            .collect()
    }

    /// Scope of a function or method body: parameters, local declarations, expression.
    fn body(&mut self, params: &[Param], decs: &mut [Dec], body: &mut Expr) {
        self.nesting_level += 1;
        self.scopes.push();
        let prev_dec_offset = self.dec_offset;
        self.dec_offset = -2;

        for (i, par) in params.iter().enumerate() {
            let entry = SymEntry::new(self.nesting_level, par.ty.clone(), i as i64 + 1);
            if self.scopes.insert(&par.id, entry).is_some() {
                self.report(Diagnostic::conflict(
                    par.line,
                    format!("Par id {} already declared", par.id),
                ));
            }
        }

        for dec in decs.iter_mut() {
            self.dec(dec);
        }
        self.expr(body);

        self.scopes.pop();
        self.nesting_level -= 1;
        self.dec_offset = prev_dec_offset;
    }

    /// Looks up the superclass layout; `None` (with a diagnostic) if it cannot be inherited.
    fn inherited(&mut self, class: &ClassDec) -> Option<(String, SymEntry, ClassInfo)> {
        let sid = class.super_id.as_ref()?;

        let found = match (self.scopes.get_global(sid), self.session.classes.get(sid)) {
            (Some(entry), Some(info)) if matches!(entry.ty, Type::Class(_)) => {
                Some((entry.clone(), info.clone()))
            }
            _ => None,
        };

        let Some((entry, info)) = found else {
            self.report(Diagnostic::unresolved(
                class.line,
                format!("Class id {sid} not declared"),
            ));
            return None;
        };

        if self.session.rels.would_cycle(&class.id, sid) {
            self.report(Diagnostic::cycle(
                class.line,
                format!("Class {} cannot extend {sid}: inheritance cycle", class.id),
            ));
            return None;
        }

        Some((sid.clone(), entry, info))
    }

    fn class(&mut self, class: &mut ClassDec) {
        let mut fields: Vec<Type> = Vec::new();
        let mut methods: Vec<ArrowType> = Vec::new();
        let mut members = ScopeMap::new();

        match self.inherited(class) {
            Some((sid, entry, info)) => {
                fields = info.shape.fields;
                methods = info.shape.methods;
                members = info.members;
                class.super_entry = Some(entry);
                self.session.rels.set_super(class.id.clone(), sid);
            }
            None => self.session.rels.forget(&class.id),
        }

        let offset = self.next_dec_offset();
        let provisional = SymEntry::new(
            0,
            Type::Class(ClassType {
                fields: fields.clone(),
                methods: methods.clone(),
            }),
            offset,
        );
        if self.scopes.insert_global(&class.id, provisional).is_some() {
            self.report(Diagnostic::conflict(
                class.line,
                format!("Class id {} already declared", class.id),
            ));
        }
        self.session.classes.insert(
            &class.id,
            ClassInfo {
                members: members.clone(),
                shape: ClassType {
                    fields: fields.clone(),
                    methods: methods.clone(),
                },
            },
        );

        self.nesting_level += 1;
        self.scopes.push_with(members);

        let mut seen = HashSet::new();
        for field in &mut class.fields {
            if !seen.insert(field.id.clone()) {
                self.report(Diagnostic::conflict(
                    field.line,
                    format!("Field id {} already declared", field.id),
                ));
            }
            field.ty = self.resolve_type(&field.ty, field.line);

            let previous = self.scopes.get_local(&field.id).map(|e| (e.is_method(), e.offset));
            let reused = match previous {
                Some((true, _)) => {
                    self.report(Diagnostic::conflict(
                        field.line,
                        format!("Cannot override method {0}() with field {0}", field.id),
                    ));
                    None
                }
                Some((false, o)) => Some(o),
                None => None,
            };
            let field_offset = match reused {
                Some(o) => {
                    if let Some(slot) = fields.get_mut((-o - 1) as usize) {
                        *slot = field.ty.clone();
                    }
                    o
                }
                None => {
                    fields.push(field.ty.clone());
                    -(fields.len() as i64)
                }
            };

            let entry = SymEntry::new(self.nesting_level, field.ty.clone(), field_offset);
            self.declare_member(&class.id, &field.id, entry);
            field.offset = Some(field_offset);
        }

        let prev_dec_offset = self.dec_offset;
        self.dec_offset = methods.len() as i64;

        let mut seen = HashSet::new();
        for method in &mut class.methods {
            if !seen.insert(method.id.clone()) {
                self.report(Diagnostic::conflict(
                    method.line,
                    format!("Method id {} already declared", method.id),
                ));
            }
            self.method(&class.id, method, &mut methods);
        }

        self.scopes.pop();
        self.nesting_level -= 1;
        self.dec_offset = prev_dec_offset;

        let shape = ClassType { fields, methods };
        tracing::debug!(
            class = %class.id,
            offset,
            fields = shape.fields.len(),
            methods = shape.methods.len(),
            "class layout"
        );
        if let Some(info) = self.session.classes.get_mut(&class.id) {
            info.shape = shape.clone();
        }
        let entry = SymEntry::new(0, Type::Class(shape), offset);
        self.scopes.insert_global(&class.id, entry.clone());
        class.entry = Some(entry);
    }

    /// Binds a field or method in both the class-body scope and the registry.
    fn declare_member(&mut self, class_id: &str, id: &str, entry: SymEntry) {
        tracing::trace!(class = class_id, member = id, offset = entry.offset, "member");
        self.scopes.insert(id, entry.clone());
        if let Some(info) = self.session.classes.get_mut(class_id) {
            info.members.insert(id.to_string(), entry);
        }
    }

    fn method(&mut self, class_id: &str, m: &mut MethodDec, methods: &mut Vec<ArrowType>) {
        let params = self.params(&mut m.params);
        m.ret = self.resolve_type(&m.ret, m.line);
        let arrow = ArrowType {
            params,
            ret: Box::new(m.ret.clone()),
        };

        let previous = self.scopes.get_local(&m.id).map(|e| (e.is_method(), e.offset));
        let offset = match previous {
            // override: reuse the inherited slot
            Some((true, o)) => {
                if let Some(slot) = methods.get_mut(o as usize) {
                    *slot = arrow.clone();
                }
                o
            }
            Some((false, _)) => {
                self.report(Diagnostic::conflict(
                    m.line,
                    format!("Cannot override field {0} with method {0}()", m.id),
                ));
                self.fresh_method_slot(methods, &arrow)
            }
            None => self.fresh_method_slot(methods, &arrow),
        };

        let entry = SymEntry::new(self.nesting_level, Type::Arrow(arrow), offset);
        self.declare_member(class_id, &m.id, entry);
        m.offset = Some(offset);

        self.body(&m.params, &mut m.decs, &mut m.body);
    }

    fn fresh_method_slot(&mut self, methods: &mut Vec<ArrowType>, arrow: &ArrowType) -> i64 {
        let o = self.dec_offset;
        self.dec_offset += 1;
        methods.push(arrow.clone());
        o
    }

    fn lookup(&self, id: &str) -> Option<Binding> {
        self.scopes.lookup(id).map(|entry| Binding {
            entry: entry.clone(),
            nl: self.nesting_level,
        })
    }

    fn expr(&mut self, e: &mut Expr) {
        let line = e.line;
        match &mut e.kind {
            ExprKind::Int(_) | ExprKind::Bool(_) | ExprKind::Null => {}

            ExprKind::Id { id, binding } => {
                *binding = self.lookup(id);
                if binding.is_none() {
                    self.report(Diagnostic::unresolved(
                        line,
                        format!("Var or Par id {id} not declared"),
                    ));
                }
            }

            ExprKind::Call { id, args, binding } => {
                *binding = self.lookup(id);
                if binding.is_none() {
                    self.report(Diagnostic::unresolved(
                        line,
                        format!("Fun id {id} not declared"),
                    ));
                }
                for arg in args {
                    self.expr(arg);
                }
            }

            ExprKind::MethodCall {
                obj_id,
                method_id,
                args,
                obj,
                method,
            } => {
                *obj = self.lookup(obj_id);
                match obj {
                    None => self.report(Diagnostic::unresolved(
                        line,
                        format!("Reference id {obj_id} not declared"),
                    )),
                    Some(b) => {
                        *method = b
                            .entry
                            .ty
                            .as_ref_class()
                            .and_then(|c| self.session.classes.member(c, method_id))
                            .filter(|m| m.is_method())
                            .cloned();
                        if method.is_none() {
                            self.report(Diagnostic::unresolved(
                                line,
                                format!("Method id {obj_id}.{method_id} not declared"),
                            ));
                        }
                    }
                }
                for arg in args {
                    self.expr(arg);
                }
            }

            ExprKind::New {
                class_id,
                args,
                entry,
            } => {
                if self.session.classes.contains(class_id) {
                    *entry = self.scopes.get_global(class_id).cloned();
                } else {
                    self.report(Diagnostic::unresolved(
                        line,
                        format!("Class id {class_id} not declared"),
                    ));
                }
                for arg in args {
                    self.expr(arg);
                }
            }

            ExprKind::If { cond, then_, else_ } => {
                self.expr(cond);
                self.expr(then_);
                self.expr(else_);
            }

            ExprKind::Bin { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }

            ExprKind::Not(inner) | ExprKind::Print(inner) => self.expr(inner),
        }
    }
}
