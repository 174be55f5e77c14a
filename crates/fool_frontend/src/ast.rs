// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

pub type Line = usize;

/// Type descriptors. Compared structurally, never by identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    Arrow(ArrowType),
    /// Instance of the named class.
    Ref(String),
    /// Shape of a class declaration: full field and method layout in slot order.
    Class(ClassType),
    /// Type of `null`.
    Empty,
    /// A declared type that could not be resolved.
    Incomplete,
}

impl Type {
    pub fn arrow(params: Vec<Type>, ret: Type) -> Self {
        Type::Arrow(ArrowType {
            params,
            ret: Box::new(ret),
        })
    }

    pub fn reference<S: Into<String>>(class: S) -> Self {
        Type::Ref(class.into())
    }

    pub fn as_arrow(&self) -> Option<&ArrowType> {
        match self {
            Type::Arrow(at) => Some(at),
            _ => None,
        }
    }

    pub fn as_ref_class(&self) -> Option<&str> {
        match self {
            Type::Ref(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Bool => write!(f, "bool"),
            Type::Arrow(at) => {
                write!(f, "(")?;
                for (i, p) in at.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {}", at.ret)
            }
            Type::Ref(id) => write!(f, "{id}"),
            Type::Class(ct) => write!(
                f,
                "class<{} fields, {} methods>",
                ct.fields.len(),
                ct.methods.len()
            ),
            Type::Empty => write!(f, "null"),
            Type::Incomplete => write!(f, "<incomplete>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrowType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ClassType {
    /// Field types; slot `i` is stored at offset `-(i + 1)`.
    pub fields: Vec<Type>,
    /// Method signatures; slot `i` is dispatch-table index `i`.
    pub methods: Vec<ArrowType>,
}

/// A symbol-table entry. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymEntry {
    /// Nesting level of the declaration (0 = global).
    pub nl: usize,
    pub ty: Type,
    pub offset: i64,
}

impl SymEntry {
    pub fn new(nl: usize, ty: Type, offset: i64) -> Self {
        Self { nl, ty, offset }
    }

    /// Methods are the only entries with a non-negative offset besides parameters,
    /// and parameters never hold arrow types.
    pub fn is_method(&self) -> bool {
        self.offset >= 0 && matches!(self.ty, Type::Arrow(_))
    }
}

/// Annotation left by the scope resolver on identifier-like nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub entry: SymEntry,
    /// Nesting level at the point of use.
    pub nl: usize,
}

impl Binding {
    /// Number of access links to follow from the use site to the declaring frame.
    pub fn depth(&self) -> usize {
        self.nl.saturating_sub(self.entry.nl)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub classes: Vec<ClassDec>,
    pub decs: Vec<Dec>,
    pub body: Expr,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dec {
    Var(VarDec),
    Fun(FunDec),
}

impl Dec {
    pub fn id(&self) -> &str {
        match self {
            Dec::Var(v) => &v.id,
            Dec::Fun(f) => &f.id,
        }
    }

    pub fn line(&self) -> Line {
        match self {
            Dec::Var(v) => v.line,
            Dec::Fun(f) => f.line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDec {
    pub id: String,
    pub ty: Type,
    pub init: Expr,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub id: String,
    pub ty: Type,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunDec {
    pub id: String,
    pub ret: Type,
    pub params: Vec<Param>,
    pub decs: Vec<Dec>,
    pub body: Expr,
    pub line: Line,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDec {
    pub id: String,
    pub super_id: Option<String>,
    pub fields: Vec<FieldDec>,
    pub methods: Vec<MethodDec>,
    pub line: Line,
    /// Global entry of this class (set by the resolver).
    pub entry: Option<SymEntry>,
    /// Global entry of the superclass (set by the resolver).
    pub super_entry: Option<SymEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDec {
    pub id: String,
    pub ty: Type,
    pub line: Line,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDec {
    pub id: String,
    pub ret: Type,
    pub params: Vec<Param>,
    pub decs: Vec<Dec>,
    pub body: Expr,
    pub line: Line,
    /// Dispatch-table slot (set by the resolver).
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: Line,
}

impl Expr {
    pub fn new(kind: ExprKind, line: Line) -> Self {
        Self { kind, line }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    Int(i64),
    Bool(bool),
    Null,

    Id {
        id: String,
        binding: Option<Binding>,
    },

    Call {
        id: String,
        args: Vec<Expr>,
        binding: Option<Binding>,
    },

    // obj.method(args)
    MethodCall {
        obj_id: String,
        method_id: String,
        args: Vec<Expr>,
        obj: Option<Binding>,
        method: Option<SymEntry>,
    },

    New {
        class_id: String,
        args: Vec<Expr>,
        entry: Option<SymEntry>,
    },

    If {
        cond: Box<Expr>,
        then_: Box<Expr>,
        else_: Box<Expr>,
    },

    Bin {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    Not(Box<Expr>),

    Print(Box<Expr>),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Le,
    Ge,
    And,
    Or,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        f.write_str(s)
    }
}
