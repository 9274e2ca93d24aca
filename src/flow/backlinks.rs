//! Consumer-set construction.
//!
//! A single top-down walk over one scope's tree records, for every
//! expression, the expression that takes it as a direct operand, and
//! collects the closure literals found along the way for later
//! analysis. Closure bodies are skipped here; each nested scope builds
//! its own back-links.

use crate::ast::{Block, ClosureId, ExprId, LoopKind, MethodBody, Node};

use super::FlowData;

/// Build consumer sets for every expression under `block`.
///
/// Returns the closures encountered, in declaration order. Infallible;
/// touches only consumer sets.
pub(crate) fn build(body: &MethodBody, block: &Block, data: &mut FlowData) -> Vec<ClosureId> {
    let mut closures = Vec::new();
    build_block(body, block, data, &mut closures);
    closures
}

fn build_block(body: &MethodBody, block: &Block, data: &mut FlowData, closures: &mut Vec<ClosureId>) {
    for node in &block.body {
        match node {
            Node::Expr(id) => build_expr(body, *id, data, closures),
            Node::Block(inner) => build_block(body, inner, data, closures),
            Node::Condition(cond) => {
                build_expr(body, cond.test, data, closures);
                build_block(body, &cond.then_block, data, closures);
                build_block(body, &cond.else_block, data, closures);
            }
            Node::Loop(lp) => {
                match lp.kind {
                    LoopKind::NoTest => {}
                    LoopKind::PreTest(test) | LoopKind::PostTest(test) => {
                        build_expr(body, test, data, closures)
                    }
                }
                build_block(body, &lp.body, data, closures);
            }
            Node::Switch(sw) => {
                build_expr(body, sw.selector, data, closures);
                for case in &sw.cases {
                    build_block(body, &case.body, data, closures);
                }
            }
            Node::Try(tr) => build_block(body, &tr.protected, data, closures),
            Node::Label(_) => {}
        }
    }
}

fn build_expr(body: &MethodBody, id: ExprId, data: &mut FlowData, closures: &mut Vec<ClosureId>) {
    let expr = body.expr(id);
    for &arg in &expr.args {
        data.add_consumer(arg, id);
        build_expr(body, arg, data, closures);
    }
    if let Some(closure) = expr.closure() {
        closures.push(closure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{stmt, Block, MethodBuilder, Operation};
    use crate::flow::FlowData;

    #[test]
    fn test_consumer_is_direct_parent() {
        let mut b = MethodBuilder::new("f");
        let x = b.param(0);
        let a = b.load(x);
        let c = b.const_int(1);
        let sum = b.expr(Operation::Add, vec![a, c], None);
        let ret = b.ret(sum);
        let body = b.finish(Block::new(vec![stmt(ret)]));

        let mut data = FlowData::default();
        let closures = build(&body, &body.root, &mut data);

        assert!(closures.is_empty());
        assert_eq!(data.consumers[&a], vec![sum]);
        assert_eq!(data.consumers[&c], vec![sum]);
        assert_eq!(data.consumers[&sum], vec![ret]);
        assert!(!data.consumers.contains_key(&ret));
    }

    #[test]
    fn test_collects_closures_in_order() {
        let mut b = MethodBuilder::new("f");
        let (first, bind1) = b.bind_closure(vec![], Block::default());
        let (second, bind2) = b.bind_closure(vec![], Block::default());
        let body = b.finish(Block::new(vec![stmt(bind1), stmt(bind2)]));

        let mut data = FlowData::default();
        let closures = build(&body, &body.root, &mut data);
        assert_eq!(closures, vec![first, second]);
    }
}
