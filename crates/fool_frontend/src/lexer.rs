// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use logos::Logos;
use thiserror::Error;

use crate::ast::Line;

#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Tok {
    // Keywords
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,
    #[token("if")]
    KwIf,
    #[token("then")]
    KwThen,
    #[token("else")]
    KwElse,
    #[token("print")]
    KwPrint,
    #[token("let")]
    KwLet,
    #[token("in")]
    KwIn,
    #[token("var")]
    KwVar,
    #[token("fun")]
    KwFun,
    #[token("class")]
    KwClass,
    #[token("extends")]
    KwExtends,
    #[token("new")]
    KwNew,
    #[token("null")]
    KwNull,
    #[token("int")]
    KwInt,
    #[token("bool")]
    KwBool,

    // Symbols / operators
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    #[token("||")]
    Or,
    #[token("&&")]
    And,
    #[token("!")]
    Not,
    #[token(">=")]
    Ge,
    #[token("<=")]
    Le,
    #[token("==")]
    EqEq,
    #[token("=")]
    Assign,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    // Literals
    #[regex(r"0|[1-9][0-9]*", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"[a-zA-Z][a-zA-Z0-9]*", |lex| lex.slice().to_string())]
    Id(String),
}

/// Tokens paired with the 1-based source line each one starts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
    pub toks: Vec<Tok>,
    pub lines: Vec<Line>,
}

impl Lexed {
    /// Line of the token at `index`; past-the-end positions map to the last line.
    pub fn line_at(&self, index: usize) -> Line {
        line_at(&self.lines, index)
    }
}

pub(crate) fn line_at(lines: &[Line], index: usize) -> Line {
    lines
        .get(index)
        .or_else(|| lines.last())
        .copied()
        .unwrap_or(1)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: unrecognized input {text:?}")]
pub struct LexError {
    pub line: Line,
    pub text: String,
}

/// Blank out `/* ... */` comments. Newlines inside a comment are kept so token
/// lines stay the same as in the original input.
pub fn strip_comments(input: &str) -> Result<String, LexError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut line = 1;
    let mut open_line = None;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        match open_line {
            Some(_) if c == '*' && chars.peek() == Some(&'/') => {
                chars.next();
                out.push_str("  ");
                open_line = None;
            }
            Some(_) => out.push(if c == '\n' { '\n' } else { ' ' }),
            None if c == '/' && chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str("  ");
                open_line = Some(line);
            }
            None => out.push(c),
        }
    }

    match open_line {
        Some(line) => Err(LexError {
            line,
            text: "/*".to_string(),
        }),
        None => Ok(out),
    }
}

/// Lex FOOL input into tokens.
/// Every unrecognized slice is reported; lexing continues past it.
pub fn lex(input: &str) -> Result<Lexed, Vec<LexError>> {
    let cleaned = strip_comments(input).map_err(|e| vec![e])?;
    let input = cleaned.as_str();
    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(input.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    let line_of = |offset: usize| match line_starts.binary_search(&offset) {
        Ok(i) => i + 1,
        Err(i) => i,
    };

    let mut out = Lexed::default();
    let mut errors = Vec::new();
    let mut lx = Tok::lexer(input);

    while let Some(res) = lx.next() {
        let line = line_of(lx.span().start);
        match res {
            Ok(tok) => {
                out.toks.push(tok);
                out.lines.push(line);
            }
            Err(_) => errors.push(LexError {
                line,
                text: lx.slice().to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}
