// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! Stack virtual machine that runs assembled FOOL code.

mod op;
mod vm;

pub use op::Op;
pub use vm::{execute, Outcome, Vm, VmConfig, VmError, DEFAULT_MEMSIZE};
