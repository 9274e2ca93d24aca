//! Read-only accessors over an annotated method.
//!
//! Everything here is pure; detectors query the annotations, they never
//! mutate flow state. All of these treat a missing annotation as "no
//! flow information", which is a normal state, not an error.

use std::collections::HashSet;

use crate::ast::{Const, ExprId, MethodBody, Operation, TypeHierarchy, TypeName};

use super::{MethodFlow, SourceRef};

impl MethodFlow {
    /// The resolved defining source of `expr`, or `expr` itself if the
    /// pass recorded nothing for it.
    pub fn source(&self, expr: ExprId) -> SourceRef {
        self.data.source_of(expr)
    }

    /// Whether the value consumed at `expr` was merged from several
    /// candidate origins.
    pub fn has_phi_source(&self, expr: ExprId) -> bool {
        matches!(self.data.sources.get(&expr), Some(SourceRef::Phi(_)))
    }

    /// The flattened non-phi origins behind a phi source.
    pub fn phi_origins(&self, phi: super::PhiId) -> &[ExprId] {
        self.data.phi_origins(phi)
    }

    /// Every expression consuming `expr`: its direct tree parent plus
    /// each load resolved to it.
    pub fn usages(&self, expr: ExprId) -> &[ExprId] {
        self.data
            .consumers
            .get(&expr)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The propagated constant value of `expr`, if it has exactly one.
    pub fn value(&self, expr: ExprId) -> Option<&Const> {
        match self.data.values.get(&expr) {
            Some(super::Val::Const(c)) => Some(c),
            _ => None,
        }
    }

    /// Fold `mapper` over every concrete origin of `expr` reachable
    /// through phi chains, combining the results with `reducer`.
    pub fn reduce<T>(
        &self,
        expr: ExprId,
        mapper: &mut dyn FnMut(ExprId) -> T,
        reducer: &mut dyn FnMut(T, T) -> T,
    ) -> T {
        let mut seen = HashSet::new();
        self.reduce_inner(expr, mapper, reducer, &mut seen)
    }

    fn reduce_inner<T>(
        &self,
        expr: ExprId,
        mapper: &mut dyn FnMut(ExprId) -> T,
        reducer: &mut dyn FnMut(T, T) -> T,
        seen: &mut HashSet<super::PhiId>,
    ) -> T {
        match self.source(expr) {
            SourceRef::Expr(e) => mapper(e),
            // A phi revisited through its own origins maps as itself.
            SourceRef::Phi(p) if !seen.insert(p) => mapper(expr),
            SourceRef::Phi(p) => {
                let origins = self.data.phi_origins(p).to_vec();
                let Some((&first, rest)) = origins.split_first() else {
                    return mapper(expr);
                };
                let mut acc = self.reduce_inner(first, mapper, reducer, seen);
                for &origin in rest {
                    let mapped = self.reduce_inner(origin, mapper, reducer, seen);
                    acc = reducer(acc, mapped);
                }
                acc
            }
        }
    }

    /// Most specific declared type common to every concrete origin of
    /// `expr`; `None` when any origin's type is unknown or the chains
    /// never agree.
    pub fn reduce_type(
        &self,
        body: &MethodBody,
        types: &TypeHierarchy,
        expr: ExprId,
    ) -> Option<TypeName> {
        self.reduce(
            expr,
            &mut |e| body.expr(e).ty.clone(),
            &mut |a, b| match (a, b) {
                (Some(a), Some(b)) => types.common_ancestor(&a, &b),
                _ => None,
            },
        )
    }

    /// Whether `pred` holds for every concrete origin behind `src`,
    /// looking through phi joins and both result operands of a ternary.
    pub fn all_match(
        &self,
        body: &MethodBody,
        src: SourceRef,
        pred: &dyn Fn(ExprId) -> bool,
    ) -> bool {
        match src {
            SourceRef::Phi(p) => self.data.phi_origins(p).iter().all(|&o| pred(o)),
            SourceRef::Expr(e) => {
                let expr = body.expr(e);
                if expr.op == Operation::Ternary && expr.args.len() == 3 {
                    self.all_match(body, self.source(expr.args[1]), pred)
                        && self.all_match(body, self.source(expr.args[2]), pred)
                } else {
                    pred(e)
                }
            }
        }
    }

    /// Whether `pred` holds for any concrete origin behind `src`.
    pub fn any_match(
        &self,
        body: &MethodBody,
        src: SourceRef,
        pred: &dyn Fn(ExprId) -> bool,
    ) -> bool {
        match src {
            SourceRef::Phi(p) => self.data.phi_origins(p).iter().any(|&o| pred(o)),
            SourceRef::Expr(e) => {
                let expr = body.expr(e);
                if expr.op == Operation::Ternary && expr.args.len() == 3 {
                    self.any_match(body, self.source(expr.args[1]), pred)
                        || self.any_match(body, self.source(expr.args[2]), pred)
                } else {
                    pred(e)
                }
            }
        }
    }

    /// First concrete origin behind `src` satisfying `pred`.
    pub fn find_first(
        &self,
        body: &MethodBody,
        src: SourceRef,
        pred: &dyn Fn(ExprId) -> bool,
    ) -> Option<ExprId> {
        match src {
            SourceRef::Phi(p) => self.data.phi_origins(p).iter().copied().find(|&o| pred(o)),
            SourceRef::Expr(e) => {
                let expr = body.expr(e);
                if expr.op == Operation::Ternary && expr.args.len() == 3 {
                    self.find_first(body, self.source(expr.args[1]), pred)
                        .or_else(|| self.find_first(body, self.source(expr.args[2]), pred))
                } else {
                    pred(e).then_some(e)
                }
            }
        }
    }

    /// Consumers of `expr` reached by walking forward through pure
    /// read-after-write indirections: stores are skipped, a load that
    /// merely re-reads a binding recurses into its own consumers.
    /// With `include_phi` false, consumers whose value was merged at a
    /// join are left out.
    pub fn find_transitive_usages(
        &self,
        body: &MethodBody,
        expr: ExprId,
        include_phi: bool,
    ) -> Vec<ExprId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect_transitive(body, expr, include_phi, &mut seen, &mut out);
        out
    }

    fn collect_transitive(
        &self,
        body: &MethodBody,
        expr: ExprId,
        include_phi: bool,
        seen: &mut HashSet<ExprId>,
        out: &mut Vec<ExprId>,
    ) {
        if !seen.insert(expr) {
            return;
        }
        for &consumer in self.usages(expr) {
            if !include_phi && self.has_phi_source(consumer) {
                continue;
            }
            match body.expr(consumer).op {
                Operation::Store => {}
                Operation::Load => self.collect_transitive(body, consumer, include_phi, seen, out),
                _ => {
                    if !out.contains(&consumer) {
                        out.push(consumer);
                    }
                }
            }
        }
    }

    /// Whether every consumer of `expr`, recursively, only ever feeds
    /// an assertion guard (`!$assertionsDisabled && ...` conditions the
    /// compiler emits for `assert`).
    pub fn is_assertion(&self, body: &MethodBody, expr: ExprId) -> bool {
        let mut seen = HashSet::new();
        self.is_assertion_inner(body, expr, &mut seen)
    }

    fn is_assertion_inner(
        &self,
        body: &MethodBody,
        expr: ExprId,
        seen: &mut HashSet<ExprId>,
    ) -> bool {
        if !seen.insert(expr) {
            return false;
        }
        // Stores are plumbing: the loads reading them back are already
        // in the consumer set through the flow edges.
        let mut real = self
            .usages(expr)
            .iter()
            .filter(|&&u| body.expr(u).op != Operation::Store)
            .peekable();
        real.peek().is_some()
            && real.all(|&parent| {
                is_assertion_condition(body, parent) || self.is_assertion_inner(body, parent, seen)
            })
    }
}

fn is_assertion_status_check(body: &MethodBody, expr: ExprId) -> bool {
    let e = body.expr(expr);
    if e.op != Operation::LogicalNot {
        return false;
    }
    let Some(&arg) = e.args.first() else {
        return false;
    };
    let arg = body.expr(arg);
    if arg.op != Operation::GetStatic {
        return false;
    }
    arg.field().is_some_and(|f| f.name.starts_with("$assertions"))
}

fn is_assertion_condition(body: &MethodBody, expr: ExprId) -> bool {
    let e = body.expr(expr);
    e.op == Operation::LogicalAnd
        && e.args.iter().any(|&a| is_assertion_status_check(body, a))
}
