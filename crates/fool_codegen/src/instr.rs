// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Int(i64),
    Label(String),
}

/// Symbolic instruction: branch targets and code addresses are still labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Push(Operand),
    Pop,
    Add,
    Sub,
    Mult,
    Div,
    Sw,
    Lw,
    B(String),
    Beq(String),
    Bleq(String),
    Js,
    Lra,
    Sra,
    Ltm,
    Stm,
    Lfp,
    Sfp,
    Cfp,
    Lhp,
    Shp,
    Print,
    Halt,
    /// Marks the address of the next real instruction.
    Label(String),
}

impl Instr {
    pub fn push(v: i64) -> Self {
        Instr::Push(Operand::Int(v))
    }

    pub fn push_label(l: impl Into<String>) -> Self {
        Instr::Push(Operand::Label(l.into()))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(v) => write!(f, "{v}"),
            Operand::Label(l) => f.write_str(l),
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Instr::Push(v) => return write!(f, "push {v}"),
            Instr::B(l) => return write!(f, "b {l}"),
            Instr::Beq(l) => return write!(f, "beq {l}"),
            Instr::Bleq(l) => return write!(f, "bleq {l}"),
            Instr::Label(l) => return write!(f, "{l}:"),
            Instr::Pop => "pop",
            Instr::Add => "add",
            Instr::Sub => "sub",
            Instr::Mult => "mult",
            Instr::Div => "div",
            Instr::Sw => "sw",
            Instr::Lw => "lw",
            Instr::Js => "js",
            Instr::Lra => "lra",
            Instr::Sra => "sra",
            Instr::Ltm => "ltm",
            Instr::Stm => "stm",
            Instr::Lfp => "lfp",
            Instr::Sfp => "sfp",
            Instr::Cfp => "cfp",
            Instr::Lhp => "lhp",
            Instr::Shp => "shp",
            Instr::Print => "print",
            Instr::Halt => "halt",
        };
        f.write_str(s)
    }
}
