// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use chumsky::prelude::*;
use chumsky::span::SimpleSpan;
use chumsky::{extra, pratt};

use crate::ast::*;
use crate::lexer::{line_at, Lexed, Tok};

/// chumsky 0.12 errors are lifetime-parameterized
pub type ParseError<'src> = chumsky::error::Simple<'src, Tok>;
pub type PExtra<'src> = extra::Err<ParseError<'src>>;

/// Public API: parse lexed tokens into a Program.
pub fn parse_program<'src>(lexed: &'src Lexed) -> Result<Program, Vec<ParseError<'src>>> {
    program_parser(&lexed.lines)
        .parse(lexed.toks.as_slice())
        .into_result()
}

/// Source line a parse error points at.
pub fn error_line(lexed: &Lexed, err: &ParseError<'_>) -> Line {
    lexed.line_at(err.span().start)
}

fn span_line(lines: &[Line], span: SimpleSpan) -> Line {
    line_at(lines, span.start)
}

pub fn program_parser<'src>(
    lines: &'src [Line],
) -> impl Parser<'src, &'src [Tok], Program, PExtra<'src>> + Clone {
    let let_in = just(Tok::KwLet)
        .ignore_then(class_parser(lines).repeated().collect::<Vec<_>>())
        .then(dec_parser(lines).repeated().collect::<Vec<_>>())
        .then_ignore(just(Tok::KwIn))
        .then(expr_parser(lines))
        .then_ignore(just(Tok::Semi))
        .map_with(move |((classes, decs), body), e| Program {
            classes,
            decs,
            body,
            line: span_line(lines, e.span()),
        });

    let plain = expr_parser(lines)
        .then_ignore(just(Tok::Semi))
        .map_with(move |body, e| Program {
            classes: Vec::new(),
            decs: Vec::new(),
            body,
            line: span_line(lines, e.span()),
        });

    let_in.or(plain).then_ignore(end())
}

fn class_parser<'src>(
    lines: &'src [Line],
) -> impl Parser<'src, &'src [Tok], ClassDec, PExtra<'src>> + Clone {
    let field = ident()
        .then_ignore(just(Tok::Colon))
        .then(type_parser())
        .map_with(move |(id, ty), e| FieldDec {
            id,
            ty,
            line: span_line(lines, e.span()),
            offset: None,
        });

    let fields = just(Tok::LParen)
        .ignore_then(field.separated_by(just(Tok::Comma)).collect::<Vec<_>>())
        .then_ignore(just(Tok::RParen));

    let method = fun_parts(lines, dec_parser(lines)).map(|p| MethodDec {
        id: p.id,
        ret: p.ret,
        params: p.params,
        decs: p.decs,
        body: p.body,
        line: p.line,
        offset: None,
    });

    just(Tok::KwClass)
        .ignore_then(ident())
        .then(just(Tok::KwExtends).ignore_then(ident()).or_not())
        .then(fields)
        .then(
            just(Tok::LBrace)
                .ignore_then(method.repeated().collect::<Vec<_>>())
                .then_ignore(just(Tok::RBrace)),
        )
        .map_with(move |(((id, super_id), fields), methods), e| ClassDec {
            id,
            super_id,
            fields,
            methods,
            line: span_line(lines, e.span()),
            entry: None,
            super_entry: None,
        })
}

/// Shared shape of function and method declarations.
struct FunParts {
    id: String,
    ret: Type,
    params: Vec<Param>,
    decs: Vec<Dec>,
    body: Expr,
    line: Line,
}

fn fun_parts<'src, D>(
    lines: &'src [Line],
    dec: D,
) -> impl Parser<'src, &'src [Tok], FunParts, PExtra<'src>> + Clone
where
    D: Parser<'src, &'src [Tok], Dec, PExtra<'src>> + Clone,
{
    let param = ident()
        .then_ignore(just(Tok::Colon))
        .then(type_parser())
        .map_with(move |(id, ty), e| Param {
            id,
            ty,
            line: span_line(lines, e.span()),
        });

    let params = just(Tok::LParen)
        .ignore_then(param.separated_by(just(Tok::Comma)).collect::<Vec<_>>())
        .then_ignore(just(Tok::RParen));

    let locals = just(Tok::KwLet)
        .ignore_then(dec.repeated().at_least(1).collect::<Vec<_>>())
        .then_ignore(just(Tok::KwIn));

    just(Tok::KwFun)
        .ignore_then(ident())
        .then_ignore(just(Tok::Colon))
        .then(type_parser())
        .then(params)
        .then(locals.or_not())
        .then(expr_parser(lines))
        .then_ignore(just(Tok::Semi))
        .map_with(move |((((id, ret), params), decs), body), e| FunParts {
            id,
            ret,
            params,
            decs: decs.unwrap_or_default(),
            body,
            line: span_line(lines, e.span()),
        })
}

pub fn dec_parser<'src>(
    lines: &'src [Line],
) -> impl Parser<'src, &'src [Tok], Dec, PExtra<'src>> + Clone {
    recursive(move |dec| {
        let var = just(Tok::KwVar)
            .ignore_then(ident())
            .then_ignore(just(Tok::Colon))
            .then(type_parser())
            .then_ignore(just(Tok::Assign))
            .then(expr_parser(lines))
            .then_ignore(just(Tok::Semi))
            .map_with(move |((id, ty), init), e| {
                Dec::Var(VarDec {
                    id,
                    ty,
                    init,
                    line: span_line(lines, e.span()),
                })
            });

        let fun = fun_parts(lines, dec).map(|p| {
            Dec::Fun(FunDec {
                id: p.id,
                ret: p.ret,
                params: p.params,
                decs: p.decs,
                body: p.body,
                line: p.line,
            })
        });

        var.or(fun)
    })
}

fn type_parser<'src>() -> impl Parser<'src, &'src [Tok], Type, PExtra<'src>> + Clone {
    just(Tok::KwInt)
        .to(Type::Int)
        .or(just(Tok::KwBool).to(Type::Bool))
        .or(ident().map(Type::Ref))
}

fn ident<'src>() -> impl Parser<'src, &'src [Tok], String, PExtra<'src>> + Clone {
    select! { Tok::Id(s) => s }
}

fn bin(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    // a binary expression starts where its left operand starts
    let line = lhs.line;
    Expr::new(
        ExprKind::Bin {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        line,
    )
}

pub fn expr_parser<'src>(
    lines: &'src [Line],
) -> impl Parser<'src, &'src [Tok], Expr, PExtra<'src>> + Clone {
    recursive(move |expr| {
        // args: ( [expr (, expr)*]? )
        let args = just(Tok::LParen)
            .ignore_then(
                expr.clone()
                    .separated_by(just(Tok::Comma))
                    .collect::<Vec<_>>(),
            )
            .then_ignore(just(Tok::RParen));

        let braced = just(Tok::LBrace)
            .ignore_then(expr.clone())
            .then_ignore(just(Tok::RBrace));

        let int = just(Tok::Minus)
            .or_not()
            .then(select! { Tok::Int(n) => n })
            .map(|(neg, n)| ExprKind::Int(if neg.is_some() { -n } else { n }));

        let literal = select! {
            Tok::KwTrue => ExprKind::Bool(true),
            Tok::KwFalse => ExprKind::Bool(false),
            Tok::KwNull => ExprKind::Null,
        };

        let new_ = just(Tok::KwNew)
            .ignore_then(ident())
            .then(args.clone())
            .map(|(class_id, args)| ExprKind::New {
                class_id,
                args,
                entry: None,
            });

        let if_ = just(Tok::KwIf)
            .ignore_then(expr.clone())
            .then_ignore(just(Tok::KwThen))
            .then(braced.clone())
            .then_ignore(just(Tok::KwElse))
            .then(braced)
            .map(|((cond, then_), else_)| ExprKind::If {
                cond: Box::new(cond),
                then_: Box::new(then_),
                else_: Box::new(else_),
            });

        let print = just(Tok::KwPrint)
            .ignore_then(just(Tok::LParen))
            .ignore_then(expr.clone())
            .then_ignore(just(Tok::RParen))
            .map(|e| ExprKind::Print(Box::new(e)));

        // obj.method(args)
        let method_call = ident()
            .then_ignore(just(Tok::Dot))
            .then(ident())
            .then(args.clone())
            .map(|((obj_id, method_id), args)| ExprKind::MethodCall {
                obj_id,
                method_id,
                args,
                obj: None,
                method: None,
            });

        let call = ident().then(args).map(|(id, args)| ExprKind::Call {
            id,
            args,
            binding: None,
        });

        let id = ident().map(|id| ExprKind::Id { id, binding: None });

        let atom = int
            .or(literal)
            .or(new_)
            .or(if_)
            .or(print)
            .or(method_call)
            .or(call)
            .or(id)
            .map_with(move |kind, e| Expr::new(kind, span_line(lines, e.span())));

        let paren = just(Tok::LParen)
            .ignore_then(expr.clone())
            .then_ignore(just(Tok::RParen));

        // prefix: |op, rhs, extra|
        // infix:  |lhs, op, rhs, extra|
        atom.or(paren)
            .pratt((
                pratt::prefix(5, just(Tok::Not), |_, rhs: Expr, _| {
                    let line = rhs.line;
                    Expr::new(ExprKind::Not(Box::new(rhs)), line)
                }),
                pratt::infix(pratt::left(4), just(Tok::Star), |lhs, _, rhs, _| {
                    bin(BinOp::Mul, lhs, rhs)
                }),
                pratt::infix(pratt::left(4), just(Tok::Slash), |lhs, _, rhs, _| {
                    bin(BinOp::Div, lhs, rhs)
                }),
                pratt::infix(pratt::left(3), just(Tok::Plus), |lhs, _, rhs, _| {
                    bin(BinOp::Add, lhs, rhs)
                }),
                pratt::infix(pratt::left(3), just(Tok::Minus), |lhs, _, rhs, _| {
                    bin(BinOp::Sub, lhs, rhs)
                }),
                pratt::infix(pratt::left(2), just(Tok::EqEq), |lhs, _, rhs, _| {
                    bin(BinOp::Eq, lhs, rhs)
                }),
                pratt::infix(pratt::left(2), just(Tok::Ge), |lhs, _, rhs, _| {
                    bin(BinOp::Ge, lhs, rhs)
                }),
                pratt::infix(pratt::left(2), just(Tok::Le), |lhs, _, rhs, _| {
                    bin(BinOp::Le, lhs, rhs)
                }),
                pratt::infix(pratt::left(1), just(Tok::And), |lhs, _, rhs, _| {
                    bin(BinOp::And, lhs, rhs)
                }),
                pratt::infix(pratt::left(1), just(Tok::Or), |lhs, _, rhs, _| {
                    bin(BinOp::Or, lhs, rhs)
                }),
            ))
            .boxed()
    })
}
