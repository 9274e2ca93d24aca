//! Type names and the inheritance table used for common-type reduction.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully qualified, dot-separated type name (`java.lang.Integer`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(pub String);

impl TypeName {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name without the package prefix (`Integer` for `java.lang.Integer`).
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// Package prefix, empty for unqualified names.
    pub fn package(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Superclass table shipped alongside a class dump.
///
/// Maps each type to its direct superclass. Types without an entry are
/// treated as roots of their own chain; the reducer then only agrees on
/// exact matches for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeHierarchy {
    supers: HashMap<TypeName, TypeName>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ty: TypeName, superclass: TypeName) {
        self.supers.insert(ty, superclass);
    }

    /// Inheritance chain from the root type down to `ty` itself.
    pub fn base_chain(&self, ty: &TypeName) -> Vec<TypeName> {
        let mut chain = vec![ty.clone()];
        let mut current = ty;
        while let Some(superclass) = self.supers.get(current) {
            // A malformed cyclic table would loop forever otherwise.
            if chain.contains(superclass) {
                break;
            }
            chain.push(superclass.clone());
            current = superclass;
        }
        chain.reverse();
        chain
    }

    /// Most specific common ancestor of two types: the last point of
    /// agreement walking both base chains from the root down.
    pub fn common_ancestor(&self, a: &TypeName, b: &TypeName) -> Option<TypeName> {
        if a == b {
            return Some(a.clone());
        }
        let chain_a = self.base_chain(a);
        let chain_b = self.base_chain(b);
        let mut result = None;
        for (ta, tb) in chain_a.iter().zip(chain_b.iter()) {
            if ta == tb {
                result = Some(ta.clone());
            } else {
                break;
            }
        }
        result
    }
}
