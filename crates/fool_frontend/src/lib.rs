// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use lexer::{lex, LexError, Lexed, Tok};
pub use parser::{error_line, parse_program};

// Re-export the lifetime error alias
pub use parser::ParseError;
