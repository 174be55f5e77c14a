// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! Runtime value and frame conventions shared by generated code and the VM.
//!
//! Frame (fp points at the access link):
//! ```text
//!   fp + k     k-th argument (k >= 1)
//!   fp + 0     access link
//!   fp - 1     saved return address
//!   fp - 2..   local declarations
//! ```
//! Object (the reference points at the dispatch-table cell):
//! ```text
//!   obj - 1 - i   field i
//!   obj           dispatch table address
//! ```

/// `null` is never a valid heap address.
pub const NULL_REF: i64 = -1;

pub const TRUE: i64 = 1;
pub const FALSE: i64 = 0;

/// Stands in for the access link of the global frame.
pub const GLOBAL_ACCESS_LINK: i64 = 0;
