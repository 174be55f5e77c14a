// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! Subtyping and least-common-ancestor over type descriptors.

use std::collections::{HashMap, HashSet};

use fool_frontend::{ArrowType, Type};

/// Class inheritance map (class -> superclass) plus the relations derived from it.
#[derive(Clone, Debug, Default)]
pub struct TypeRels {
    super_type: HashMap<String, String>,
}

impl TypeRels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_super(&mut self, class: impl Into<String>, super_class: impl Into<String>) {
        self.super_type.insert(class.into(), super_class.into());
    }

    /// Drops any superclass recorded for `class`, e.g. when it is redeclared without one.
    pub fn forget(&mut self, class: &str) {
        self.super_type.remove(class);
    }

    pub fn super_of(&self, class: &str) -> Option<&str> {
        self.super_type.get(class).map(String::as_str)
    }

    /// `class` followed by its ancestors, nearest first. Stops on a repeated name.
    pub fn ancestors<'a>(&'a self, class: &'a str) -> Vec<&'a str> {
        let mut chain = vec![class];
        let mut seen = HashSet::from([class]);
        let mut cur = class;
        while let Some(parent) = self.super_of(cur) {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            cur = parent;
        }
        chain
    }

    /// True if `sub` is `sup` or inherits from it.
    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        self.ancestors(sub).contains(&sup)
    }

    /// Whether declaring `class extends super_class` would close an inheritance cycle.
    pub fn would_cycle(&self, class: &str, super_class: &str) -> bool {
        self.is_subclass(super_class, class)
    }

    pub fn is_subtype(&self, a: &Type, b: &Type) -> bool {
        match (a, b) {
            (Type::Ref(x), Type::Ref(y)) => self.is_subclass(x, y),
            (Type::Arrow(x), Type::Arrow(y)) => self.is_sub_arrow(x, y),
            (Type::Int, Type::Int) | (Type::Bool, Type::Bool) | (Type::Empty, Type::Empty) => true,
            // bool coerces to int
            (Type::Bool, Type::Int) => true,
            // null inhabits every class type
            (Type::Empty, Type::Ref(_)) => true,
            _ => false,
        }
    }

    /// Covariant return, contravariant parameters.
    pub fn is_sub_arrow(&self, a: &ArrowType, b: &ArrowType) -> bool {
        self.is_subtype(&a.ret, &b.ret)
            && a.params.len() == b.params.len()
            && a
                .params
                .iter()
                .zip(&b.params)
                .all(|(pa, pb)| self.is_subtype(pb, pa))
    }

    /// Most specific type both `a` and `b` can be used as, if any.
    pub fn lowest_common_ancestor(&self, a: &Type, b: &Type) -> Option<Type> {
        if self.is_subtype(a, b) {
            return Some(b.clone());
        }
        if self.is_subtype(b, a) {
            return Some(a.clone());
        }
        match (a, b) {
            (Type::Ref(x), Type::Ref(y)) => self
                .ancestors(x)
                .into_iter()
                .skip(1)
                .find(|anc| self.is_subclass(y, anc))
                .map(Type::reference),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes() -> TypeRels {
        // Shape <- Polygon <- Square ; Shape <- Circle ; Other
        let mut rels = TypeRels::new();
        rels.set_super("Polygon", "Shape");
        rels.set_super("Square", "Polygon");
        rels.set_super("Circle", "Shape");
        rels
    }

    fn r(c: &str) -> Type {
        Type::reference(c)
    }

    #[test]
    fn non_class_types_are_reflexive() {
        let rels = TypeRels::new();
        for t in [
            Type::Int,
            Type::Bool,
            Type::Empty,
            Type::arrow(vec![Type::Int, Type::Bool], Type::Int),
        ] {
            assert!(rels.is_subtype(&t, &t), "{t} should be a subtype of itself");
        }
    }

    #[test]
    fn class_refs_follow_the_ancestor_chain() {
        let rels = shapes();
        assert!(rels.is_subtype(&r("Square"), &r("Square")));
        assert!(rels.is_subtype(&r("Square"), &r("Shape")));
        assert!(!rels.is_subtype(&r("Shape"), &r("Square")));
        assert!(!rels.is_subtype(&r("Circle"), &r("Polygon")));
        assert!(!rels.is_subtype(&r("Other"), &r("Shape")));
    }

    #[test]
    fn coercions_and_null() {
        let rels = shapes();
        assert!(rels.is_subtype(&Type::Bool, &Type::Int));
        assert!(!rels.is_subtype(&Type::Int, &Type::Bool));
        assert!(rels.is_subtype(&Type::Empty, &r("Circle")));
        assert!(!rels.is_subtype(&r("Circle"), &Type::Empty));
        assert!(!rels.is_subtype(&Type::Empty, &Type::Int));
        assert!(!rels.is_subtype(&Type::Incomplete, &Type::Incomplete));
    }

    #[test]
    fn arrows_are_contravariant_in_params_covariant_in_result() {
        let rels = shapes();
        let takes_shape_gives_square = Type::arrow(vec![r("Shape")], r("Square"));
        let takes_square_gives_shape = Type::arrow(vec![r("Square")], r("Shape"));
        assert!(rels.is_subtype(&takes_shape_gives_square, &takes_square_gives_shape));
        assert!(!rels.is_subtype(&takes_square_gives_shape, &takes_shape_gives_square));

        let unary = Type::arrow(vec![Type::Int], Type::Int);
        let binary = Type::arrow(vec![Type::Int, Type::Int], Type::Int);
        assert!(!rels.is_subtype(&unary, &binary));
        assert!(rels.is_subtype(
            &Type::arrow(vec![Type::Int], Type::Bool),
            &Type::arrow(vec![Type::Bool], Type::Int)
        ));
    }

    #[test]
    fn lowest_common_ancestor_cases() {
        let rels = shapes();
        assert_eq!(
            rels.lowest_common_ancestor(&r("Square"), &r("Circle")),
            Some(r("Shape"))
        );
        assert_eq!(
            rels.lowest_common_ancestor(&r("Square"), &r("Polygon")),
            Some(r("Polygon"))
        );
        assert_eq!(rels.lowest_common_ancestor(&r("Square"), &r("Other")), None);
        assert_eq!(
            rels.lowest_common_ancestor(&Type::Empty, &r("Circle")),
            Some(r("Circle"))
        );
        assert_eq!(
            rels.lowest_common_ancestor(&Type::Bool, &Type::Int),
            Some(Type::Int)
        );
        assert_eq!(
            rels.lowest_common_ancestor(&Type::Int, &Type::Bool),
            Some(Type::Int)
        );
        assert_eq!(rels.lowest_common_ancestor(&Type::Int, &r("Shape")), None);
    }

    #[test]
    fn ancestor_walk_terminates_on_cycles() {
        let mut rels = TypeRels::new();
        rels.set_super("A", "B");
        rels.set_super("B", "A");
        assert_eq!(rels.ancestors("A"), vec!["A", "B"]);
        assert!(!rels.is_subclass("A", "C"));
        assert!(rels.would_cycle("C", "C"));
        assert!(TypeRels::new().would_cycle("C", "C"));
    }
}
