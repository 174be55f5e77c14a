// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use std::fmt;

/// One assembled instruction. Branch targets are absolute code addresses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Op {
    Push(i64),
    Pop,
    Add,
    Sub,
    Mult,
    Div,
    /// pop address, pop value, `memory[address] = value`
    Sw,
    /// pop address, push `memory[address]`
    Lw,
    B(usize),
    Beq(usize),
    Bleq(usize),
    /// pop address, `ra = ip`, jump
    Js,
    Lra,
    Sra,
    Ltm,
    Stm,
    Lfp,
    Sfp,
    /// `fp = sp`
    Cfp,
    Lhp,
    Shp,
    Print,
    Halt,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Push(v) => write!(f, "push {v}"),
            Op::B(a) => write!(f, "b {a}"),
            Op::Beq(a) => write!(f, "beq {a}"),
            Op::Bleq(a) => write!(f, "bleq {a}"),
            other => {
                let s = match other {
                    Op::Pop => "pop",
                    Op::Add => "add",
                    Op::Sub => "sub",
                    Op::Mult => "mult",
                    Op::Div => "div",
                    Op::Sw => "sw",
                    Op::Lw => "lw",
                    Op::Js => "js",
                    Op::Lra => "lra",
                    Op::Sra => "sra",
                    Op::Ltm => "ltm",
                    Op::Stm => "stm",
                    Op::Lfp => "lfp",
                    Op::Sfp => "sfp",
                    Op::Cfp => "cfp",
                    Op::Lhp => "lhp",
                    Op::Shp => "shp",
                    Op::Print => "print",
                    _ => "halt",
                };
                f.write_str(s)
            }
        }
    }
}
