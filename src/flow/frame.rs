//! Value slot frames.
//!
//! A frame is a snapshot of binding -> defining-source at one program
//! point. Processing an expression never mutates the frame it was given;
//! it returns a new one, so frames reaching different branches can be
//! shared freely.

use std::collections::BTreeMap;

use crate::ast::{Const, ExprId, Expression, Operand, Operation, VarId};

use super::{FlowCx, FlowData, SourceRef, Val};

/// Immutable binding snapshot. Two frames are equal iff every binding
/// maps to the identical source (phi identity is canonical, see
/// [`FlowData::phi_over`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    slots: BTreeMap<VarId, SourceRef>,
}

impl Frame {
    pub fn bind(&mut self, var: VarId, src: SourceRef) {
        self.slots.insert(var, src);
    }

    pub fn get(&self, var: VarId) -> Option<SourceRef> {
        self.slots.get(&var).copied()
    }

    /// Pointwise join. A binding present on both sides keeps its
    /// definition when they agree and becomes a phi over every distinct
    /// contributing definition otherwise; a one-sided binding is kept
    /// as-is.
    pub fn merge(data: &mut FlowData, a: &Frame, b: &Frame) -> Frame {
        let mut slots = a.slots.clone();
        for (&var, &src_b) in &b.slots {
            match slots.get(&var) {
                Some(&src_a) => {
                    let merged = data.merge_sources(src_a, src_b);
                    slots.insert(var, merged);
                }
                None => {
                    slots.insert(var, src_b);
                }
            }
        }
        Frame { slots }
    }

    /// Join of optional frames: absence means "unreachable" and is the
    /// neutral element.
    pub fn merge_opt(data: &mut FlowData, a: Option<Frame>, b: Option<Frame>) -> Option<Frame> {
        match (a, b) {
            (None, other) | (other, None) => other,
            (Some(a), Some(b)) => Some(Frame::merge(data, &a, &b)),
        }
    }

    /// Join where the left side is known reachable.
    pub(crate) fn merge_into(data: &mut FlowData, a: Frame, b: Option<Frame>) -> Frame {
        match b {
            None => a,
            Some(b) => Frame::merge(data, &a, &b),
        }
    }

    /// Simulate one expression: thread the frame through its operands,
    /// record source/value annotations, and rebind on a store.
    pub(crate) fn process(&self, cx: &mut FlowCx<'_>, id: ExprId) -> Frame {
        let expr = cx.body.expr(id);
        let mut frame = self.clone();
        for &arg in &expr.args {
            frame = frame.process(cx, arg);
        }
        match expr.op {
            Operation::Store => {
                if let (Some(var), Some(&value)) = (expr.variable(), expr.args.first()) {
                    // The binding points at the origin of the stored
                    // value, so loads resolve straight to the producer.
                    let src = cx.data.source_of(value);
                    frame.bind(var, src);
                    cx.data.sources.insert(id, src);
                    let val = cx.data.value_of(value);
                    cx.data.values.insert(id, val);
                }
            }
            Operation::Load => {
                if let Some(var) = expr.variable() {
                    match frame.get(var) {
                        Some(src) => {
                            cx.data.sources.insert(id, src);
                            cx.data.add_read(src, id);
                            let val = cx.data.merged_value(src);
                            cx.data.values.insert(id, val);
                        }
                        None => {
                            cx.data.values.insert(id, Val::Unknown);
                        }
                    }
                }
            }
            Operation::Const => {
                if let Some(Operand::Const(c)) = &expr.operand {
                    cx.data.values.insert(id, Val::Const(c.clone()));
                }
            }
            Operation::Bind => {
                if let Some(closure) = expr.closure() {
                    cx.captures.insert(closure, frame.clone());
                }
                cx.data.values.insert(id, Val::Unknown);
            }
            _ => {
                let val = match try_fold(cx.data, expr) {
                    Some(c) => Val::Const(c),
                    None => Val::Unknown,
                };
                cx.data.values.insert(id, val);
            }
        }
        frame
    }
}

/// Constant-fold an expression from its operands' propagated values.
fn try_fold(data: &FlowData, expr: &Expression) -> Option<Const> {
    let arg = |i: usize| -> Option<Const> {
        match data.values.get(expr.args.get(i)?) {
            Some(Val::Const(c)) => Some(c.clone()),
            _ => None,
        }
    };
    match expr.op {
        Operation::Neg => match arg(0)? {
            Const::Int(x) => Some(Const::Int(x.wrapping_neg())),
            Const::Long(x) => Some(Const::Long(x.wrapping_neg())),
            _ => None,
        },
        Operation::LogicalNot => match arg(0)? {
            Const::Int(x) => Some(Const::Int(i32::from(x == 0))),
            _ => None,
        },
        Operation::LogicalAnd => fold_logical(arg(0), arg(1), true),
        Operation::LogicalOr => fold_logical(arg(0), arg(1), false),
        Operation::Ternary => match arg(0)? {
            Const::Int(0) => arg(2),
            Const::Int(_) => arg(1),
            _ => None,
        },
        Operation::Add
        | Operation::Sub
        | Operation::Mul
        | Operation::Div
        | Operation::Rem
        | Operation::And
        | Operation::Or
        | Operation::Xor
        | Operation::Shl
        | Operation::Shr
        | Operation::UShr
        | Operation::CmpEq
        | Operation::CmpNe
        | Operation::CmpLt
        | Operation::CmpGe
        | Operation::CmpGt
        | Operation::CmpLe => fold_binary(expr.op, arg(0)?, arg(1)?),
        _ => None,
    }
}

/// `&&`/`||` over JVM ints: fold when the left side short-circuits or
/// both sides are known.
fn fold_logical(a: Option<Const>, b: Option<Const>, is_and: bool) -> Option<Const> {
    let truth = |c: &Const| match c {
        Const::Int(x) => Some(*x != 0),
        _ => None,
    };
    let left = a.as_ref().and_then(truth);
    if let Some(l) = left {
        if l != is_and {
            // false && _ or true || _
            return Some(Const::Int(i32::from(l)));
        }
        let right = b.as_ref().and_then(truth)?;
        return Some(Const::Int(i32::from(right)));
    }
    None
}

fn fold_binary(op: Operation, a: Const, b: Const) -> Option<Const> {
    match (a, b) {
        (Const::Int(x), Const::Int(y)) => fold_int(op, x, y),
        (Const::Long(x), Const::Long(y)) => fold_long(op, x, y),
        _ => None,
    }
}

fn fold_int(op: Operation, x: i32, y: i32) -> Option<Const> {
    let val = match op {
        Operation::Add => x.wrapping_add(y),
        Operation::Sub => x.wrapping_sub(y),
        Operation::Mul => x.wrapping_mul(y),
        Operation::Div => {
            if y == 0 {
                return None;
            }
            x.wrapping_div(y)
        }
        Operation::Rem => {
            if y == 0 {
                return None;
            }
            x.wrapping_rem(y)
        }
        Operation::And => x & y,
        Operation::Or => x | y,
        Operation::Xor => x ^ y,
        // Shift distances use the low five bits, as the JVM does.
        Operation::Shl => x.wrapping_shl(y as u32 & 31),
        Operation::Shr => x.wrapping_shr(y as u32 & 31),
        Operation::UShr => ((x as u32) >> (y as u32 & 31)) as i32,
        Operation::CmpEq => i32::from(x == y),
        Operation::CmpNe => i32::from(x != y),
        Operation::CmpLt => i32::from(x < y),
        Operation::CmpGe => i32::from(x >= y),
        Operation::CmpGt => i32::from(x > y),
        Operation::CmpLe => i32::from(x <= y),
        _ => return None,
    };
    Some(Const::Int(val))
}

fn fold_long(op: Operation, x: i64, y: i64) -> Option<Const> {
    let val = match op {
        Operation::Add => x.wrapping_add(y),
        Operation::Sub => x.wrapping_sub(y),
        Operation::Mul => x.wrapping_mul(y),
        Operation::Div => {
            if y == 0 {
                return None;
            }
            x.wrapping_div(y)
        }
        Operation::Rem => {
            if y == 0 {
                return None;
            }
            x.wrapping_rem(y)
        }
        Operation::And => x & y,
        Operation::Or => x | y,
        Operation::Xor => x ^ y,
        Operation::Shl => x.wrapping_shl(y as u32 & 63),
        Operation::Shr => x.wrapping_shr(y as u32 & 63),
        Operation::UShr => return Some(Const::Long(((x as u64) >> (y as u64 & 63)) as i64)),
        Operation::CmpEq => return Some(Const::Int(i32::from(x == y))),
        Operation::CmpNe => return Some(Const::Int(i32::from(x != y))),
        Operation::CmpLt => return Some(Const::Int(i32::from(x < y))),
        Operation::CmpGe => return Some(Const::Int(i32::from(x >= y))),
        Operation::CmpGt => return Some(Const::Int(i32::from(x > y))),
        Operation::CmpLe => return Some(Const::Int(i32::from(x <= y))),
        _ => return None,
    };
    Some(Const::Long(val))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprId;

    fn src(n: u32) -> SourceRef {
        SourceRef::Expr(ExprId(n))
    }

    #[test]
    fn test_merge_agreement_keeps_definition() {
        let mut data = FlowData::default();
        let mut a = Frame::default();
        let mut b = Frame::default();
        a.bind(VarId(0), src(3));
        b.bind(VarId(0), src(3));

        let merged = Frame::merge(&mut data, &a, &b);
        assert_eq!(merged.get(VarId(0)), Some(src(3)));
    }

    #[test]
    fn test_merge_disagreement_builds_phi() {
        let mut data = FlowData::default();
        let mut a = Frame::default();
        let mut b = Frame::default();
        a.bind(VarId(0), src(3));
        b.bind(VarId(0), src(5));

        let merged = Frame::merge(&mut data, &a, &b);
        match merged.get(VarId(0)) {
            Some(SourceRef::Phi(p)) => {
                assert_eq!(data.phi_origins(p), &[ExprId(3), ExprId(5)]);
            }
            other => panic!("expected phi, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_flattens_nested_phi() {
        let mut data = FlowData::default();
        let phi = data.merge_sources(src(1), src(2));
        let merged = data.merge_sources(phi, src(3));
        match merged {
            SourceRef::Phi(p) => {
                assert_eq!(data.phi_origins(p), &[ExprId(1), ExprId(2), ExprId(3)]);
            }
            other => panic!("expected phi, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_is_canonical() {
        let mut data = FlowData::default();
        let left = data.merge_sources(src(1), src(2));
        let right = data.merge_sources(src(2), src(1));
        assert_eq!(left, right);
    }

    #[test]
    fn test_merge_one_sided_binding() {
        let mut data = FlowData::default();
        let mut a = Frame::default();
        a.bind(VarId(7), src(1));
        let b = Frame::default();

        let merged = Frame::merge(&mut data, &a, &b);
        assert_eq!(merged.get(VarId(7)), Some(src(1)));
    }

    #[test]
    fn test_merge_opt_treats_absent_as_unreachable() {
        let mut data = FlowData::default();
        let mut a = Frame::default();
        a.bind(VarId(0), src(1));

        assert_eq!(Frame::merge_opt(&mut data, None, None), None);
        assert_eq!(
            Frame::merge_opt(&mut data, Some(a.clone()), None),
            Some(a.clone())
        );
        assert_eq!(Frame::merge_opt(&mut data, None, Some(a.clone())), Some(a));
    }

    #[test]
    fn test_fold_int_arithmetic() {
        assert_eq!(fold_int(Operation::Add, 2, 3), Some(Const::Int(5)));
        assert_eq!(
            fold_int(Operation::Add, i32::MAX, 1),
            Some(Const::Int(i32::MIN))
        );
        assert_eq!(fold_int(Operation::Div, 7, 2), Some(Const::Int(3)));
        assert_eq!(fold_int(Operation::Div, 7, 0), None);
        assert_eq!(fold_int(Operation::CmpLt, 1, 2), Some(Const::Int(1)));
        assert_eq!(fold_int(Operation::Shl, 1, 33), Some(Const::Int(2)));
    }

    #[test]
    fn test_fold_logical_short_circuit() {
        assert_eq!(
            fold_logical(Some(Const::Int(0)), None, true),
            Some(Const::Int(0))
        );
        assert_eq!(
            fold_logical(Some(Const::Int(1)), None, false),
            Some(Const::Int(1))
        );
        assert_eq!(fold_logical(Some(Const::Int(1)), None, true), None);
        assert_eq!(
            fold_logical(Some(Const::Int(1)), Some(Const::Int(5)), true),
            Some(Const::Int(1))
        );
    }
}
