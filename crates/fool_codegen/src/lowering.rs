// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use std::collections::HashMap;
use std::iter;

use fool_frontend::{BinOp, Binding, ClassDec, Dec, Expr, ExprKind, Line, Program};
use fool_sema::LabelGen;

use crate::abi;
use crate::instr::Instr;
use crate::CodegenError;

/// Class name -> method labels in slot order.
pub type DispatchTables = HashMap<String, Vec<String>>;

pub(crate) struct Lowering<'s> {
    labels: &'s mut LabelGen,
    memsize: i64,
    /// Function and method bodies, placed after the main program.
    bodies: Vec<Instr>,
    dispatch_tables: DispatchTables,
}

fn unannotated(line: Line, what: &str) -> CodegenError {
    CodegenError::Unannotated {
        line,
        what: what.to_string(),
    }
}

impl<'s> Lowering<'s> {
    pub(crate) fn new(labels: &'s mut LabelGen, memsize: usize) -> Self {
        Self {
            labels,
            memsize: memsize as i64,
            bodies: Vec::new(),
            dispatch_tables: HashMap::new(),
        }
    }

    pub(crate) fn lower_program(mut self, p: &Program) -> Result<(Vec<Instr>, DispatchTables), CodegenError> {
        let mut out = vec![Instr::push(abi::GLOBAL_ACCESS_LINK)];
        for class in &p.classes {
            self.class(class, &mut out)?;
        }
        for dec in &p.decs {
            self.dec(dec, &mut out)?;
        }
        self.expr(&p.body, &mut out)?;
        out.push(Instr::Halt);
        out.append(&mut self.bodies);
        Ok((out, self.dispatch_tables))
    }

    fn dec(&mut self, dec: &Dec, out: &mut Vec<Instr>) -> Result<(), CodegenError> {
        match dec {
            Dec::Var(v) => self.expr(&v.init, out),
            Dec::Fun(f) => {
                let label = self.labels.fresh_fun_label();
                self.body(&label, f.params.len(), &f.decs, &f.body)?;
                out.push(Instr::push_label(label));
                Ok(())
            }
        }
    }

    /// Emits a callable body. On entry the caller has pushed the control link,
    /// the arguments in reverse and the access link.
    fn body(&mut self, label: &str, n_params: usize, decs: &[Dec], body: &Expr) -> Result<(), CodegenError> {
        let mut code = vec![Instr::Label(label.to_string()), Instr::Cfp, Instr::Lra];
        for dec in decs {
            self.dec(dec, &mut code)?;
        }
        self.expr(body, &mut code)?;
        code.push(Instr::Stm);
        code.extend(iter::repeat_n(Instr::Pop, decs.len()));
        code.push(Instr::Sra);
        // access link
        code.push(Instr::Pop);
        code.extend(iter::repeat_n(Instr::Pop, n_params));
        code.extend([Instr::Sfp, Instr::Ltm, Instr::Lra, Instr::Js]);
        self.bodies.append(&mut code);
        Ok(())
    }

    fn class(&mut self, class: &ClassDec, out: &mut Vec<Instr>) -> Result<(), CodegenError> {
        let mut table = match (&class.super_id, &class.super_entry) {
            (Some(super_id), Some(_)) => self
                .dispatch_tables
                .get(super_id)
                .cloned()
                .ok_or_else(|| CodegenError::MissingDispatchTable(super_id.clone()))?,
            _ => Vec::new(),
        };

        for m in &class.methods {
            let slot = m.offset.ok_or_else(|| unannotated(m.line, &m.id))? as usize;
            let label = self.labels.fresh_fun_label();
            self.body(&label, m.params.len(), &m.decs, &m.body)?;
            match table.get_mut(slot) {
                Some(inherited) => *inherited = label,
                None => table.push(label),
            }
        }

        tracing::debug!(class = %class.id, table = ?table, "dispatch table");

        // leaves the table's heap address in the class's global slot
        out.push(Instr::Lhp);
        for label in &table {
            out.push(Instr::push_label(label.clone()));
            out.extend([Instr::Lhp, Instr::Sw]);
            bump_heap(out);
        }
        self.dispatch_tables.insert(class.id.clone(), table);
        Ok(())
    }

    /// Pushes the address of the frame holding `b`'s declaration.
    fn frame_of(&self, b: &Binding, out: &mut Vec<Instr>) {
        out.push(Instr::Lfp);
        out.extend(iter::repeat_n(Instr::Lw, b.depth()));
    }

    fn args_reversed(&mut self, args: &[Expr], out: &mut Vec<Instr>) -> Result<(), CodegenError> {
        for arg in args.iter().rev() {
            self.expr(arg, out)?;
        }
        Ok(())
    }

    fn expr(&mut self, e: &Expr, out: &mut Vec<Instr>) -> Result<(), CodegenError> {
        match &e.kind {
            ExprKind::Int(n) => out.push(Instr::push(*n)),
            ExprKind::Bool(b) => out.push(Instr::push(if *b { abi::TRUE } else { abi::FALSE })),
            ExprKind::Null => out.push(Instr::push(abi::NULL_REF)),

            ExprKind::Id { id, binding } => {
                let b = binding.as_ref().ok_or_else(|| unannotated(e.line, id))?;
                self.frame_of(b, out);
                out.extend([Instr::push(b.entry.offset), Instr::Add, Instr::Lw]);
            }

            ExprKind::Call { id, args, binding } => {
                let b = binding.as_ref().ok_or_else(|| unannotated(e.line, id))?;
                // control link
                out.push(Instr::Lfp);
                self.args_reversed(args, out)?;
                self.frame_of(b, out);
                // the frame address is both the access link and the base for the callee address
                out.extend([Instr::Stm, Instr::Ltm, Instr::Ltm]);
                if b.entry.is_method() {
                    out.push(Instr::Lw);
                }
                out.extend([Instr::push(b.entry.offset), Instr::Add, Instr::Lw, Instr::Js]);
            }

            ExprKind::MethodCall {
                obj_id,
                method_id,
                args,
                obj,
                method,
            } => {
                let ob = obj.as_ref().ok_or_else(|| unannotated(e.line, obj_id))?;
                let m = method.as_ref().ok_or_else(|| unannotated(e.line, method_id))?;
                out.push(Instr::Lfp);
                self.args_reversed(args, out)?;
                self.frame_of(ob, out);
                out.extend([
                    Instr::push(ob.entry.offset),
                    Instr::Add,
                    Instr::Lw,
                    // object reference: access link and dispatch table holder
                    Instr::Stm,
                    Instr::Ltm,
                    Instr::Ltm,
                    Instr::Lw,
                    Instr::push(m.offset),
                    Instr::Add,
                    Instr::Lw,
                    Instr::Js,
                ]);
            }

            ExprKind::New { class_id, args, entry } => {
                let entry = entry.as_ref().ok_or_else(|| unannotated(e.line, class_id))?;
                for arg in args {
                    self.expr(arg, out)?;
                }
                // last argument lands lowest, so field i ends up at obj - 1 - i
                for _ in args {
                    out.extend([Instr::Lhp, Instr::Sw]);
                    bump_heap(out);
                }
                out.extend([
                    Instr::push(self.memsize + entry.offset),
                    Instr::Lw,
                    Instr::Lhp,
                    Instr::Sw,
                    // object reference
                    Instr::Lhp,
                ]);
                bump_heap(out);
            }

            ExprKind::If { cond, then_, else_ } => {
                let then_label = self.labels.fresh_label();
                let end = self.labels.fresh_label();
                self.expr(cond, out)?;
                out.extend([Instr::push(abi::TRUE), Instr::Beq(then_label.clone())]);
                self.expr(else_, out)?;
                out.extend([Instr::B(end.clone()), Instr::Label(then_label)]);
                self.expr(then_, out)?;
                out.push(Instr::Label(end));
            }

            ExprKind::Bin { op, lhs, rhs } => self.bin(*op, lhs, rhs, out)?,

            ExprKind::Not(inner) => {
                self.expr(inner, out)?;
                out.push(Instr::push(abi::FALSE));
                self.select(out, Instr::Beq, abi::FALSE, abi::TRUE);
            }

            ExprKind::Print(inner) => {
                self.expr(inner, out)?;
                out.push(Instr::Print);
            }
        }
        Ok(())
    }

    /// Emits `<branch> l1; push otherwise; b l2; l1: push taken; l2:`.
    fn select(&mut self, out: &mut Vec<Instr>, branch: fn(String) -> Instr, otherwise: i64, taken: i64) {
        let l1 = self.labels.fresh_label();
        let l2 = self.labels.fresh_label();
        out.extend([
            branch(l1.clone()),
            Instr::push(otherwise),
            Instr::B(l2.clone()),
            Instr::Label(l1),
            Instr::push(taken),
            Instr::Label(l2),
        ]);
    }

    fn bin(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, out: &mut Vec<Instr>) -> Result<(), CodegenError> {
        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                self.expr(lhs, out)?;
                self.expr(rhs, out)?;
                out.push(match op {
                    BinOp::Add => Instr::Add,
                    BinOp::Sub => Instr::Sub,
                    BinOp::Mul => Instr::Mult,
                    _ => Instr::Div,
                });
            }
            BinOp::Eq | BinOp::Le => {
                self.expr(lhs, out)?;
                self.expr(rhs, out)?;
                let branch: fn(String) -> Instr = if op == BinOp::Eq { Instr::Beq } else { Instr::Bleq };
                self.select(out, branch, abi::FALSE, abi::TRUE);
            }
            BinOp::Ge => {
                // a >= b  is  b <= a
                self.expr(rhs, out)?;
                self.expr(lhs, out)?;
                self.select(out, Instr::Bleq, abi::FALSE, abi::TRUE);
            }
            BinOp::And | BinOp::Or => {
                // short circuit on the value that decides the result
                let decisive = if op == BinOp::And { abi::FALSE } else { abi::TRUE };
                let other = if op == BinOp::And { abi::TRUE } else { abi::FALSE };
                let short = self.labels.fresh_label();
                let end = self.labels.fresh_label();
                self.expr(lhs, out)?;
                out.extend([Instr::push(decisive), Instr::Beq(short.clone())]);
                self.expr(rhs, out)?;
                out.extend([
                    Instr::push(decisive),
                    Instr::Beq(short.clone()),
                    Instr::push(other),
                    Instr::B(end.clone()),
                    Instr::Label(short),
                    Instr::push(decisive),
                    Instr::Label(end),
                ]);
            }
        }
        Ok(())
    }
}

/// `hp = hp + 1`
fn bump_heap(out: &mut Vec<Instr>) {
    out.extend([Instr::Lhp, Instr::push(1), Instr::Add, Instr::Shp]);
}
