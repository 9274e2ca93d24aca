//! Per-method value-flow engine.
//!
//! For every expression of a decompiled method body this pass works out
//! which earlier expression(s) produced the value it consumes, merging
//! provenance across branches, switches and loops, and propagating
//! constants along the way. Detectors use the resulting annotations to
//! see through local-variable reuse and compiler-introduced flags
//! instead of pattern-matching raw trees.
//!
//! The engine is strictly intraprocedural and best-effort: on any
//! construct it does not understand (labeled jumps, real try/catch,
//! diverging loop fixpoints) it abandons the whole method and reports
//! no flow data at all. Callers must treat an absent [`MethodFlow`] as
//! a normal, frequent outcome.
//!
//! Annotations live in side tables keyed by expression id, never on the
//! tree itself; abandoning a method discards the tables wholesale, so a
//! failed pass can never leave a stale annotation behind.

mod backlinks;
mod frame;
mod query;
mod walker;

use std::collections::HashMap;

use thiserror::Error;

use crate::analysis::{AnalysisOptions, StatsSink};
use crate::ast::{ClosureId, Const, ExprId, Expression, MethodBody, Operand, Operation, VarId};

pub use frame::Frame;

/// Why the engine abandoned a method.
///
/// Aborts are expected outcomes, not user-facing errors; they surface
/// to callers only as "no flow data".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlowAbort {
    #[error("unsupported construct: {0}")]
    Unsupported(&'static str),
    #[error("loop failed to stabilize within the iteration cap")]
    Diverged,
}

/// Identifier of a synthetic phi source inside one [`FlowData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhiId(pub u32);

impl PhiId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Resolved origin of a value: either a real tree expression or a phi
/// join over several candidate origins.
///
/// Phi sources are analysis-internal; they never appear in the tree and
/// are only reachable through the query API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceRef {
    Expr(ExprId),
    Phi(PhiId),
}

/// Propagated value of an expression.
///
/// `Unknown` means "evaluated, deliberately not a constant" and is
/// distinct from a missing entry ("never evaluated"). The query layer
/// exposes neither; both come back as `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Unknown,
    Const(Const),
}

/// Side tables holding every annotation one analysis run produces.
#[derive(Debug, Default)]
pub struct FlowData {
    pub(crate) sources: HashMap<ExprId, SourceRef>,
    pub(crate) values: HashMap<ExprId, Val>,
    pub(crate) consumers: HashMap<ExprId, Vec<ExprId>>,
    phis: Vec<Vec<ExprId>>,
    phi_index: HashMap<Vec<ExprId>, PhiId>,
}

impl FlowData {
    /// Resolved source of an expression, the expression itself if the
    /// pass recorded nothing for it.
    pub fn source_of(&self, id: ExprId) -> SourceRef {
        self.sources.get(&id).copied().unwrap_or(SourceRef::Expr(id))
    }

    /// Flattened non-phi origins of a phi source.
    pub fn phi_origins(&self, id: PhiId) -> &[ExprId] {
        &self.phis[id.index()]
    }

    pub(crate) fn value_of(&self, id: ExprId) -> Val {
        self.values.get(&id).cloned().unwrap_or(Val::Unknown)
    }

    pub(crate) fn add_consumer(&mut self, of: ExprId, consumer: ExprId) {
        let list = self.consumers.entry(of).or_default();
        if !list.contains(&consumer) {
            list.push(consumer);
        }
    }

    /// Record a load against every origin it may read from.
    pub(crate) fn add_read(&mut self, src: SourceRef, load: ExprId) {
        match src {
            SourceRef::Expr(e) => self.add_consumer(e, load),
            SourceRef::Phi(p) => {
                let origins = self.phis[p.index()].clone();
                for origin in origins {
                    self.add_consumer(origin, load);
                }
            }
        }
    }

    pub(crate) fn origins_of(&self, src: SourceRef) -> Vec<ExprId> {
        match src {
            SourceRef::Expr(e) => vec![e],
            SourceRef::Phi(p) => self.phis[p.index()].clone(),
        }
    }

    /// Canonical phi over a sorted, deduplicated origin set. A single
    /// origin collapses back to a plain source. Interning keeps phi
    /// identity stable, which makes frame equality a plain comparison.
    pub(crate) fn phi_over(&mut self, origins: Vec<ExprId>) -> SourceRef {
        debug_assert!(origins.windows(2).all(|w| w[0] < w[1]));
        if origins.len() == 1 {
            return SourceRef::Expr(origins[0]);
        }
        if let Some(&id) = self.phi_index.get(&origins) {
            return SourceRef::Phi(id);
        }
        let id = PhiId(self.phis.len() as u32);
        self.phis.push(origins.clone());
        self.phi_index.insert(origins, id);
        SourceRef::Phi(id)
    }

    /// Pointwise join of two sources. Nested phis are flattened so a
    /// phi never contains another phi as a direct child.
    pub(crate) fn merge_sources(&mut self, a: SourceRef, b: SourceRef) -> SourceRef {
        if a == b {
            return a;
        }
        let mut origins = self.origins_of(a);
        origins.extend(self.origins_of(b));
        origins.sort_unstable();
        origins.dedup();
        self.phi_over(origins)
    }

    /// Value seen through a source: a phi is constant only when every
    /// origin agrees on the same constant.
    pub(crate) fn merged_value(&self, src: SourceRef) -> Val {
        match src {
            SourceRef::Expr(e) => self.value_of(e),
            SourceRef::Phi(p) => {
                let mut common: Option<Const> = None;
                for &origin in &self.phis[p.index()] {
                    match self.value_of(origin) {
                        Val::Const(c) => match &common {
                            None => common = Some(c),
                            Some(prev) if *prev == c => {}
                            Some(_) => return Val::Unknown,
                        },
                        Val::Unknown => return Val::Unknown,
                    }
                }
                common.map_or(Val::Unknown, Val::Const)
            }
        }
    }
}

/// Traversal state threaded through the frame walker.
pub(crate) struct FlowCx<'a> {
    pub body: &'a MethodBody,
    pub data: &'a mut FlowData,
    /// Frame valid at each closure's declaration point, recorded when
    /// the walker reaches its `Bind` expression.
    pub captures: &'a mut HashMap<ClosureId, Frame>,
    pub options: &'a AnalysisOptions,
    pub stats: &'a dyn StatsSink,
}

/// The annotated result of a successful pass over one method.
#[derive(Debug)]
pub struct MethodFlow {
    data: FlowData,
    params: Vec<ExprId>,
}

impl MethodFlow {
    /// Synthetic definitions representing the method's incoming
    /// parameters. A load whose source is one of these reads the
    /// original, never-reassigned parameter value.
    pub fn params(&self) -> &[ExprId] {
        &self.params
    }
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    Method,
    Closure(ClosureId),
}

/// Annotate one method body, including every closure nested inside it.
///
/// Returns `None` when any scope hit an unsupported construct or a
/// diverging loop; in that case no annotation survives. Counters:
/// `flow.total` per analyzed scope, `flow.success` per fully annotated
/// scope, `loop.diverged` per abandoned fixpoint.
pub fn annotate(
    options: &AnalysisOptions,
    body: &mut MethodBody,
    stats: &dyn StatsSink,
) -> Option<MethodFlow> {
    let mut data = FlowData::default();
    let mut captures = HashMap::new();
    match annotate_scope(
        options,
        body,
        &mut data,
        &mut captures,
        stats,
        Scope::Method,
        None,
    ) {
        Ok(params) => Some(MethodFlow { data, params }),
        Err(_) => None,
    }
}

fn scope_block(body: &MethodBody, scope: Scope) -> &crate::ast::Block {
    match scope {
        Scope::Method => &body.root,
        Scope::Closure(c) => &body.closure(c).body,
    }
}

fn annotate_scope(
    options: &AnalysisOptions,
    body: &mut MethodBody,
    data: &mut FlowData,
    captures: &mut HashMap<ClosureId, Frame>,
    stats: &dyn StatsSink,
    scope: Scope,
    seed: Option<Frame>,
) -> Result<Vec<ExprId>, FlowAbort> {
    stats.increment("flow.total");

    let closures = backlinks::build(body, scope_block(body, scope), data);

    // Seed the frame: the enclosing frame at the capture point for a
    // closure, then a fresh synthetic definition per parameter.
    let mut frame = seed.unwrap_or_default();
    let param_vars: Vec<VarId> = match scope {
        Scope::Method => body.params.clone(),
        Scope::Closure(c) => body.closure(c).params.clone(),
    };
    let mut param_ids = Vec::with_capacity(param_vars.len());
    for var in param_vars {
        let id = body.push_expr(Expression {
            op: Operation::ParamDef,
            args: vec![],
            operand: Some(Operand::Variable(var)),
            ty: None,
        });
        frame.bind(var, SourceRef::Expr(id));
        param_ids.push(id);
    }

    {
        let mut cx = FlowCx {
            body,
            data,
            captures,
            options,
            stats,
        };
        let block = scope_block(cx.body, scope);
        walker::FrameSet::new(frame).process(&mut cx, block)?;
    }

    // Closures are analyzed sequentially: each needs the frame the
    // walker captured at its declaration point. A closure in dead code
    // is never captured and starts from its parameters alone.
    let mut result = Ok(());
    for closure in closures {
        let seed = captures.remove(&closure);
        let nested = annotate_scope(
            options,
            body,
            data,
            captures,
            stats,
            Scope::Closure(closure),
            seed,
        );
        if let Err(abort) = nested {
            if result.is_ok() {
                result = Err(abort);
            }
        }
    }
    result?;

    stats.increment("flow.success");
    Ok(param_ids)
}
