//! Loops with no reachable exit.
//!
//! A `while (true)` body with no `break` at its own level and no
//! `return` or `throw` anywhere inside never terminates. Busy-wait
//! loops of this shape are a classic broken-synchronization symptom.

use crate::ast::{Block, LoopKind, MethodBody, Node, Operation};

use super::{Detector, MethodContext, WarningKind};

/// A `break` at the loop's own level. Nested loops and switches bind
/// their own `break`, so those subtrees are not descended into.
fn has_own_break(body: &MethodBody, block: &Block) -> bool {
    block.body.iter().any(|node| match node {
        Node::Expr(e) => body.expr(*e).op == Operation::Break,
        Node::Block(b) => has_own_break(body, b),
        Node::Condition(c) => {
            has_own_break(body, &c.then_block) || has_own_break(body, &c.else_block)
        }
        Node::Try(t) => has_own_break(body, &t.protected),
        Node::Loop(_) | Node::Switch(_) | Node::Label(_) => false,
    })
}

/// A `return` or `throw` at any depth.
fn has_exit(body: &MethodBody, block: &Block) -> bool {
    block.body.iter().any(|node| match node {
        Node::Expr(e) => matches!(
            body.expr(*e).op,
            Operation::Return | Operation::Throw
        ),
        Node::Block(b) => has_exit(body, b),
        Node::Condition(c) => has_exit(body, &c.then_block) || has_exit(body, &c.else_block),
        Node::Loop(l) => has_exit(body, &l.body),
        Node::Switch(s) => s.cases.iter().any(|case| has_exit(body, &case.body)),
        Node::Try(t) => has_exit(body, &t.protected),
        Node::Label(_) => false,
    })
}

pub struct InfiniteLoop;

impl InfiniteLoop {
    fn walk(&self, cx: &mut MethodContext<'_>, block: &Block) {
        for node in &block.body {
            match node {
                Node::Loop(l) => {
                    if l.kind == LoopKind::NoTest
                        && !has_own_break(cx.body, &l.body)
                        && !has_exit(cx.body, &l.body)
                    {
                        cx.report(WarningKind::InfiniteLoop, 0, Vec::<String>::new());
                    }
                    self.walk(cx, &l.body);
                }
                Node::Block(b) => self.walk(cx, b),
                Node::Condition(c) => {
                    self.walk(cx, &c.then_block);
                    self.walk(cx, &c.else_block);
                }
                Node::Switch(s) => {
                    for case in &s.cases {
                        self.walk(cx, &case.body);
                    }
                }
                Node::Try(t) => self.walk(cx, &t.protected),
                Node::Expr(_) | Node::Label(_) => {}
            }
        }
    }
}

impl Detector for InfiniteLoop {
    fn name(&self) -> &'static str {
        "infinite-loop"
    }

    fn kinds(&self) -> &'static [WarningKind] {
        &[WarningKind::InfiniteLoop]
    }

    fn check(&self, cx: &mut MethodContext<'_>) {
        let body = cx.body;
        self.walk(cx, &body.root);
    }
}
