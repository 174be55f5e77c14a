// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

use std::collections::HashMap;

use fool_frontend::{ClassType, SymEntry};

pub type ScopeMap = HashMap<String, SymEntry>;

/// Nested lexical scopes. Index 0 is the global scope, the last map is the innermost.
#[derive(Clone, Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<ScopeMap>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.push_with(HashMap::new());
    }

    pub fn push_with(&mut self, scope: ScopeMap) {
        self.scopes.push(scope);
        tracing::trace!(depth = self.scopes.len(), "push scope");
    }

    pub fn pop(&mut self) -> Option<ScopeMap> {
        let popped = self.scopes.pop();
        tracing::trace!(depth = self.scopes.len(), "pop scope");
        popped
    }

    /// Binds `id` in the innermost scope, returning the entry it replaced.
    pub fn insert(&mut self, id: &str, entry: SymEntry) -> Option<SymEntry> {
        self.scopes
            .last_mut()
            .and_then(|s| s.insert(id.to_string(), entry))
    }

    pub fn insert_global(&mut self, id: &str, entry: SymEntry) -> Option<SymEntry> {
        self.scopes
            .first_mut()
            .and_then(|s| s.insert(id.to_string(), entry))
    }

    pub fn get_local(&self, id: &str) -> Option<&SymEntry> {
        self.scopes.last().and_then(|s| s.get(id))
    }

    pub fn get_global(&self, id: &str) -> Option<&SymEntry> {
        self.scopes.first().and_then(|s| s.get(id))
    }

    /// Innermost binding of `id`, walking outward.
    pub fn lookup(&self, id: &str) -> Option<&SymEntry> {
        self.scopes.iter().rev().find_map(|s| s.get(id))
    }
}

/// Layout of one declared class.
#[derive(Clone, Debug, Default)]
pub struct ClassInfo {
    /// Fields and methods visible in the class body, inherited ones included.
    pub members: ScopeMap,
    pub shape: ClassType,
}

/// Class name -> layout, filled in during scope resolution.
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassInfo>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str, info: ClassInfo) -> Option<ClassInfo> {
        self.classes.insert(id.to_string(), info)
    }

    pub fn get(&self, id: &str) -> Option<&ClassInfo> {
        self.classes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ClassInfo> {
        self.classes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.classes.contains_key(id)
    }

    pub fn member(&self, class: &str, member: &str) -> Option<&SymEntry> {
        self.classes.get(class).and_then(|c| c.members.get(member))
    }

    pub fn shape(&self, class: &str) -> Option<&ClassType> {
        self.classes.get(class).map(|c| &c.shape)
    }
}
