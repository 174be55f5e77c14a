// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use std::io::Write;

use thiserror::Error;

use crate::op::Op;

pub const DEFAULT_MEMSIZE: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Words of memory. The stack grows down from here, the heap up from 0.
    pub memsize: usize,
    pub max_steps: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memsize: DEFAULT_MEMSIZE,
            max_steps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum VmError {
    #[error("segmentation fault: address {addr} is outside memory (ip {ip})")]
    Segfault { addr: i64, ip: usize },

    #[error("out of memory: heap pointer {hp} reached stack pointer {sp}")]
    OutOfMemory { hp: i64, sp: i64 },

    #[error("stack underflow (ip {ip})")]
    StackUnderflow { ip: usize },

    #[error("division by zero (ip {ip})")]
    DivisionByZero { ip: usize },

    #[error("jump to {target} outside code of {len} instructions")]
    BadJump { target: i64, len: usize },

    #[error("step limit of {0} exceeded")]
    StepLimit(u64),

    #[error("writing program output: {0}")]
    Io(#[from] std::io::Error),
}

/// Final state of a halted program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub top: Option<i64>,
    pub printed: Vec<i64>,
    pub steps: u64,
}

pub struct Vm<'c> {
    code: &'c [Op],
    config: VmConfig,
    memory: Vec<i64>,
    ip: usize,
    sp: i64,
    fp: i64,
    hp: i64,
    ra: i64,
    tm: i64,
}

impl<'c> Vm<'c> {
    pub fn new(code: &'c [Op], config: VmConfig) -> Self {
        let top = config.memsize as i64;
        Self {
            code,
            config,
            memory: vec![0; config.memsize],
            ip: 0,
            sp: top,
            fp: top,
            hp: 0,
            ra: 0,
            tm: 0,
        }
    }

    fn addr(&self, a: i64) -> Result<usize, VmError> {
        usize::try_from(a)
            .ok()
            .filter(|&a| a < self.memory.len())
            .ok_or(VmError::Segfault { addr: a, ip: self.ip })
    }

    fn push(&mut self, v: i64) -> Result<(), VmError> {
        self.sp -= 1;
        let a = self.addr(self.sp)?;
        self.memory[a] = v;
        Ok(())
    }

    fn pop(&mut self) -> Result<i64, VmError> {
        if self.sp >= self.memory.len() as i64 {
            return Err(VmError::StackUnderflow { ip: self.ip });
        }
        let a = self.addr(self.sp)?;
        self.sp += 1;
        Ok(self.memory[a])
    }

    /// Stack top, `None` when the stack is empty.
    fn peek(&self) -> Option<i64> {
        let a = usize::try_from(self.sp).ok()?;
        self.memory.get(a).copied()
    }

    fn jump(&mut self, target: i64) -> Result<(), VmError> {
        self.ip = usize::try_from(target)
            .ok()
            .filter(|&t| t < self.code.len())
            .ok_or(VmError::BadJump {
                target,
                len: self.code.len(),
            })?;
        Ok(())
    }

    /// Runs until `halt`. `print` output goes to `out`, one value per line.
    pub fn run(&mut self, out: &mut impl Write) -> Result<Outcome, VmError> {
        let mut printed = Vec::new();
        let mut steps: u64 = 0;

        loop {
            if self.hp + 1 >= self.sp {
                return Err(VmError::OutOfMemory {
                    hp: self.hp,
                    sp: self.sp,
                });
            }
            if let Some(limit) = self.config.max_steps {
                if steps >= limit {
                    return Err(VmError::StepLimit(limit));
                }
            }
            let Some(&op) = self.code.get(self.ip) else {
                return Err(VmError::BadJump {
                    target: self.ip as i64,
                    len: self.code.len(),
                });
            };
            tracing::trace!(ip = self.ip, %op, sp = self.sp, fp = self.fp, hp = self.hp);
            self.ip += 1;
            steps += 1;

            match op {
                Op::Push(v) => self.push(v)?,
                Op::Pop => {
                    self.pop()?;
                }
                Op::Add | Op::Sub | Op::Mult | Op::Div => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let v = match op {
                        Op::Add => left.wrapping_add(right),
                        Op::Sub => left.wrapping_sub(right),
                        Op::Mult => left.wrapping_mul(right),
                        _ => {
                            if right == 0 {
                                return Err(VmError::DivisionByZero { ip: self.ip - 1 });
                            }
                            left.wrapping_div(right)
                        }
                    };
                    self.push(v)?;
                }
                Op::Sw => {
                    let a = self.pop()?;
                    let v = self.pop()?;
                    let a = self.addr(a)?;
                    self.memory[a] = v;
                }
                Op::Lw => {
                    let a = self.pop()?;
                    let a = self.addr(a)?;
                    self.push(self.memory[a])?;
                }
                Op::B(target) => self.ip = target,
                Op::Beq(target) | Op::Bleq(target) => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let taken = match op {
                        Op::Beq(_) => left == right,
                        _ => left <= right,
                    };
                    if taken {
                        self.ip = target;
                    }
                }
                Op::Js => {
                    let target = self.pop()?;
                    self.ra = self.ip as i64;
                    self.jump(target)?;
                }
                Op::Lra => self.push(self.ra)?,
                Op::Sra => self.ra = self.pop()?,
                Op::Ltm => self.push(self.tm)?,
                Op::Stm => self.tm = self.pop()?,
                Op::Lfp => self.push(self.fp)?,
                Op::Sfp => self.fp = self.pop()?,
                Op::Cfp => self.fp = self.sp,
                Op::Lhp => self.push(self.hp)?,
                Op::Shp => self.hp = self.pop()?,
                Op::Print => match self.peek() {
                    Some(v) => {
                        writeln!(out, "{v}")?;
                        printed.push(v);
                    }
                    _ => writeln!(out, "Empty stack!")?,
                },
                Op::Halt => {
                    let top = self.peek();
                    tracing::debug!(steps, ?top, heap_words = self.hp, "halt");
                    return Ok(Outcome {
                        top,
                        printed,
                        steps,
                    });
                }
            }
        }
    }
}

/// Runs `code` on a fresh machine.
pub fn execute(code: &[Op], config: VmConfig, out: &mut impl Write) -> Result<Outcome, VmError> {
    Vm::new(code, config).run(out)
}
