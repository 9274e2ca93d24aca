//! Structured frame-set traversal.
//!
//! Walks one block tree with a set of frames: the frame reaching the
//! next statement, the merged frame reaching enclosing-loop/switch
//! breaks, and the merged frame reaching loop continues. Loops run a
//! bounded fixpoint; everything the walker cannot model makes it abort
//! the whole method.

use crate::ast::{Block, Condition, Loop, LoopKind, Node, Operand, Operation, Switch};

use super::{FlowAbort, FlowCx, Frame};

/// Mutable traversal state for one block. Never outlives the traversal
/// call that created it.
pub(crate) struct FrameSet {
    /// Frame reaching fallthrough; `None` after a terminator.
    pass: Option<Frame>,
    /// Merged frame over every break out of the enclosing loop/switch.
    brk: Option<Frame>,
    /// Merged frame over every continue of the enclosing loop.
    cont: Option<Frame>,
}

impl FrameSet {
    pub fn new(start: Frame) -> Self {
        Self {
            pass: Some(start),
            brk: None,
            cont: None,
        }
    }

    /// The upstream decompiler guarantees nothing follows a block
    /// terminator; a tree violating that is a defect in the input
    /// contract, not an analysis outcome.
    fn take_pass(&mut self) -> Frame {
        match self.pass.take() {
            Some(frame) => frame,
            None => panic!("malformed method tree: node follows a block terminator"),
        }
    }

    pub fn process(&mut self, cx: &mut FlowCx<'_>, block: &Block) -> Result<(), FlowAbort> {
        let mut was_monitor = false;
        for node in &block.body {
            match node {
                Node::Expr(id) => {
                    let expr = cx.body.expr(*id);
                    match expr.op {
                        Operation::Break => {
                            if matches!(expr.operand, Some(Operand::Label(_))) {
                                return Err(FlowAbort::Unsupported("labeled break"));
                            }
                            let frame = self.take_pass();
                            self.brk = Frame::merge_opt(cx.data, self.brk.take(), Some(frame));
                            return Ok(());
                        }
                        Operation::Continue => {
                            if matches!(expr.operand, Some(Operand::Label(_))) {
                                return Err(FlowAbort::Unsupported("labeled continue"));
                            }
                            let frame = self.take_pass();
                            self.cont = Frame::merge_opt(cx.data, self.cont.take(), Some(frame));
                            return Ok(());
                        }
                        Operation::Return | Operation::Throw => {
                            let frame = self.take_pass();
                            frame.process(cx, *id);
                            // Keep walking: a node after this one has no
                            // incoming frame and trips take_pass.
                            self.pass = None;
                        }
                        Operation::Goto | Operation::Ret => {
                            return Err(FlowAbort::Unsupported("unstructured jump"));
                        }
                        Operation::MonitorEnter => {
                            let frame = self.take_pass();
                            self.pass = Some(frame.process(cx, *id));
                            was_monitor = true;
                            continue;
                        }
                        _ => {
                            let frame = self.take_pass();
                            self.pass = Some(frame.process(cx, *id));
                        }
                    }
                }
                Node::Block(inner) => {
                    self.process(cx, inner)?;
                    if self.pass.is_none() {
                        return Ok(());
                    }
                }
                Node::Condition(cond) => self.process_condition(cx, cond)?,
                Node::Switch(sw) => self.process_switch(cx, sw)?,
                Node::Loop(lp) => {
                    let done = self.process_loop(cx, lp)?;
                    if done {
                        return Ok(());
                    }
                }
                Node::Try(tr) => {
                    // The only analyzable protected region is the
                    // monitor-guarded synchronized shape with no
                    // handlers and no finally.
                    if was_monitor && tr.handlers == 0 && !tr.has_finally {
                        self.process(cx, &tr.protected)?;
                        was_monitor = false;
                        continue;
                    }
                    return Err(FlowAbort::Unsupported("try/catch/finally"));
                }
                Node::Label(_) => return Err(FlowAbort::Unsupported("label")),
            }
            was_monitor = false;
        }
        Ok(())
    }

    fn process_condition(&mut self, cx: &mut FlowCx<'_>, cond: &Condition) -> Result<(), FlowAbort> {
        let frame = self.take_pass().process(cx, cond.test);

        let mut left = FrameSet::new(frame.clone());
        left.process(cx, &cond.then_block)?;
        let mut right = FrameSet::new(frame);
        right.process(cx, &cond.else_block)?;

        self.pass = Frame::merge_opt(cx.data, left.pass.take(), right.pass.take());
        let branch_brk = Frame::merge_opt(cx.data, left.brk.take(), right.brk.take());
        self.brk = Frame::merge_opt(cx.data, self.brk.take(), branch_brk);
        let branch_cont = Frame::merge_opt(cx.data, left.cont.take(), right.cont.take());
        self.cont = Frame::merge_opt(cx.data, self.cont.take(), branch_cont);
        Ok(())
    }

    fn process_switch(&mut self, cx: &mut FlowCx<'_>, sw: &Switch) -> Result<(), FlowAbort> {
        let before = self.take_pass().process(cx, sw.selector);

        // Cases run as one continued traversal: each case entry merges
        // the pre-switch frame (no case matched yet) with the frame
        // falling through from the previous case. Detectors depend on
        // this exact join rule.
        let mut body = FrameSet {
            pass: None,
            brk: None,
            cont: None,
        };
        let mut has_default = false;
        for case in &sw.cases {
            body.pass = Frame::merge_opt(cx.data, Some(before.clone()), body.pass.take());
            body.process(cx, &case.body)?;
            has_default |= case.default;
        }

        let exit = if has_default {
            Frame::merge_opt(cx.data, body.pass.take(), body.brk.take())
        } else {
            // Without a default the selector may match nothing and
            // control skips every case.
            let fallthrough = Frame::merge_opt(cx.data, Some(before), body.pass.take());
            Frame::merge_opt(cx.data, fallthrough, body.brk.take())
        };
        self.pass = exit;
        self.cont = Frame::merge_opt(cx.data, self.cont.take(), body.cont.take());
        Ok(())
    }

    /// Returns `true` when the remainder of the enclosing block is
    /// unreachable (an exit-by-break loop that never breaks).
    fn process_loop(&mut self, cx: &mut FlowCx<'_>, lp: &Loop) -> Result<bool, FlowAbort> {
        cx.stats.increment("loop.total");
        match lp.kind {
            LoopKind::NoTest => {
                let mut loop_end: Option<Frame> = None;
                let mut loop_start = self.take_pass();
                let mut iter = 0u32;
                loop {
                    let mut body = FrameSet::new(loop_start.clone());
                    body.process(cx, &lp.body)?;
                    loop_end = Frame::merge_opt(cx.data, body.brk.take(), loop_end);
                    let next = Frame::merge_opt(cx.data, body.pass.take(), body.cont.take());
                    let next = Frame::merge_into(cx.data, loop_start.clone(), next);
                    if next == loop_start {
                        break;
                    }
                    loop_start = next;
                    bump_iteration(&mut iter, cx)?;
                }
                match loop_end {
                    Some(frame) => {
                        self.pass = Some(frame);
                        Ok(false)
                    }
                    // No break anywhere: whatever follows the loop can
                    // never run and stays unannotated.
                    None => {
                        self.pass = None;
                        Ok(true)
                    }
                }
            }
            LoopKind::PreTest(test) => {
                let mut loop_end = self.take_pass().process(cx, test);
                let mut iter = 0u32;
                loop {
                    let mut body = FrameSet::new(loop_end.clone());
                    body.process(cx, &lp.body)?;
                    let new_start = Frame::merge_opt(cx.data, body.pass.take(), body.cont.take());
                    let new_end = new_start.map(|f| f.process(cx, test));
                    let new_end = Frame::merge_opt(cx.data, body.brk.take(), new_end);
                    let new_end = Frame::merge_into(cx.data, loop_end.clone(), new_end);
                    if new_end == loop_end {
                        break;
                    }
                    loop_end = new_end;
                    bump_iteration(&mut iter, cx)?;
                }
                self.pass = Some(loop_end);
                Ok(false)
            }
            LoopKind::PostTest(test) => {
                let mut loop_end: Option<Frame> = None;
                let mut loop_start = Some(self.take_pass());
                let mut iter = 0u32;
                loop {
                    let start = match loop_start.clone() {
                        Some(frame) => frame,
                        // The body is no longer reachable; the estimate
                        // cannot change further.
                        None => break,
                    };
                    let mut body = FrameSet::new(start);
                    body.process(cx, &lp.body)?;
                    let before_test = Frame::merge_opt(cx.data, body.pass.take(), body.cont.take());
                    let new_end = before_test.map(|f| f.process(cx, test));
                    let new_end = Frame::merge_opt(cx.data, loop_end.clone(), new_end);
                    loop_start = new_end.clone();
                    let new_end = Frame::merge_opt(cx.data, body.brk.take(), new_end);
                    if new_end == loop_end {
                        break;
                    }
                    loop_end = new_end;
                    bump_iteration(&mut iter, cx)?;
                }
                self.pass = loop_end;
                Ok(false)
            }
        }
    }
}

fn bump_iteration(iter: &mut u32, cx: &mut FlowCx<'_>) -> Result<(), FlowAbort> {
    *iter += 1;
    if *iter > cx.options.max_loop_iterations {
        cx.stats.increment("loop.diverged");
        return Err(FlowAbort::Diverged);
    }
    Ok(())
}
