// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use std::collections::HashMap;

use fool_runtime::Op;
use thiserror::Error;

use crate::instr::{Instr, Operand};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("undefined label `{0}`")]
    UndefinedLabel(String),
    #[error("label `{0}` defined more than once")]
    DuplicateLabel(String),
}

/// Textual assembly, one instruction per line.
pub fn to_asm(instrs: &[Instr]) -> String {
    instrs.iter().map(|i| format!("{i}\n")).collect()
}

/// Resolves labels to absolute code addresses.
pub fn assemble(instrs: &[Instr]) -> Result<Vec<Op>, AssembleError> {
    let mut addrs: HashMap<&str, usize> = HashMap::new();
    let mut next = 0;
    for i in instrs {
        match i {
            Instr::Label(l) => {
                if addrs.insert(l.as_str(), next).is_some() {
                    return Err(AssembleError::DuplicateLabel(l.clone()));
                }
            }
            _ => next += 1,
        }
    }

    let target = |l: &String| {
        addrs
            .get(l.as_str())
            .copied()
            .ok_or_else(|| AssembleError::UndefinedLabel(l.clone()))
    };

    let mut ops = Vec::with_capacity(next);
    for i in instrs {
        let op = match i {
            Instr::Label(_) => continue,
            Instr::Push(Operand::Int(v)) => Op::Push(*v),
            Instr::Push(Operand::Label(l)) => Op::Push(target(l)? as i64),
            Instr::B(l) => Op::B(target(l)?),
            Instr::Beq(l) => Op::Beq(target(l)?),
            Instr::Bleq(l) => Op::Bleq(target(l)?),
            Instr::Pop => Op::Pop,
            Instr::Add => Op::Add,
            Instr::Sub => Op::Sub,
            Instr::Mult => Op::Mult,
            Instr::Div => Op::Div,
            Instr::Sw => Op::Sw,
            Instr::Lw => Op::Lw,
            Instr::Js => Op::Js,
            Instr::Lra => Op::Lra,
            Instr::Sra => Op::Sra,
            Instr::Ltm => Op::Ltm,
            Instr::Stm => Op::Stm,
            Instr::Lfp => Op::Lfp,
            Instr::Sfp => Op::Sfp,
            Instr::Cfp => Op::Cfp,
            Instr::Lhp => Op::Lhp,
            Instr::Shp => Op::Shp,
            Instr::Print => Op::Print,
            Instr::Halt => Op::Halt,
        };
        ops.push(op);
    }
    tracing::debug!(instructions = ops.len(), labels = addrs.len(), "assembled");
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_resolve_to_following_instruction() {
        let code = vec![
            Instr::push_label("function0"),
            Instr::B("label0".into()),
            Instr::Label("label0".into()),
            Instr::Halt,
            Instr::Label("function0".into()),
            Instr::Label("alias".into()),
            Instr::Beq("alias".into()),
        ];
        assert_eq!(
            assemble(&code).unwrap(),
            vec![Op::Push(3), Op::B(2), Op::Halt, Op::Beq(3)]
        );
    }

    #[test]
    fn bad_labels_are_rejected() {
        let undefined = [Instr::Bleq("nowhere".into())];
        assert_eq!(
            assemble(&undefined),
            Err(AssembleError::UndefinedLabel("nowhere".into()))
        );

        let twice = [Instr::Label("l".into()), Instr::Halt, Instr::Label("l".into())];
        assert_eq!(
            assemble(&twice),
            Err(AssembleError::DuplicateLabel("l".into()))
        );
    }

    #[test]
    fn asm_text_is_one_instruction_per_line() {
        let code = [
            Instr::push(-1),
            Instr::Label("label3".into()),
            Instr::push_label("function1"),
            Instr::Lfp,
            Instr::Halt,
        ];
        assert_eq!(to_asm(&code), "push -1\nlabel3:\npush function1\nlfp\nhalt\n");
    }
}
