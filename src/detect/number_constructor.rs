//! Boxed-primitive constructor calls that should be `valueOf`.
//!
//! `new Integer(n)` always allocates; `Integer.valueOf(n)` serves small
//! values from the JVM's box cache. The score drops when the boxed
//! value is known to fall outside the cached range, since the rewrite
//! buys nothing there.

use phf::{phf_set, Set};

use crate::ast::{Const, ExprId, Operand, Operation};

use super::{Detector, MethodContext, WarningKind};

static NUMBER_WRAPPERS: Set<&'static str> = phf_set! {
    "Integer",
    "Long",
    "Short",
    "Byte",
    "Character",
};

pub struct NumberConstructor;

impl NumberConstructor {
    /// Boxed value, preferring the propagated constant over the
    /// syntactic operand.
    fn boxed_value(cx: &MethodContext<'_>, arg: ExprId) -> Option<i64> {
        let flowed = cx.flow.and_then(|f| f.value(arg).cloned());
        let constant = flowed.or_else(|| match &cx.body.expr(arg).operand {
            Some(Operand::Const(c)) => Some(c.clone()),
            _ => None,
        })?;
        match constant {
            Const::Int(v) => Some(i64::from(v)),
            Const::Long(v) => Some(v),
            _ => None,
        }
    }
}

impl Detector for NumberConstructor {
    fn name(&self) -> &'static str {
        "number-constructor"
    }

    fn kinds(&self) -> &'static [WarningKind] {
        &[WarningKind::NumberConstructor, WarningKind::BooleanConstructor]
    }

    fn check(&self, cx: &mut MethodContext<'_>) {
        for id in cx.body.expr_ids() {
            let expr = cx.body.expr(id);
            if expr.op != Operation::InitObject || expr.args.len() != 1 {
                continue;
            }
            let Some(ctor) = expr.method() else { continue };
            if ctor.owner.package() != "java.lang" {
                continue;
            }
            let simple = ctor.owner.simple_name().to_string();
            if simple == "Boolean" {
                cx.report(
                    WarningKind::BooleanConstructor,
                    0,
                    vec!["REPLACEMENT: Boolean.valueOf()".to_string()],
                );
                continue;
            }
            if !NUMBER_WRAPPERS.contains(simple.as_str()) {
                continue;
            }
            // Boxing that only ever feeds `assert` checks disappears
            // in production class files; not worth reporting.
            if cx.flow.is_some_and(|f| f.is_assertion(cx.body, id)) {
                continue;
            }
            let replacement = format!("REPLACEMENT: {simple}.valueOf()");
            match Self::boxed_value(cx, expr.args[0]) {
                Some(value) => {
                    let adjustment = if (-128..127).contains(&value) {
                        0
                    } else if simple == "Integer" {
                        15
                    } else {
                        35
                    };
                    cx.report(
                        WarningKind::NumberConstructor,
                        adjustment,
                        vec![format!("NUMBER: {value}"), replacement],
                    );
                }
                None => cx.report(WarningKind::NumberConstructor, 5, vec![replacement]),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::{AnalysisOptions, NullStats};
    use crate::ast::{stmt, Block, MethodBuilder, MethodRef, TypeHierarchy, TypeName, VarId};
    use crate::flow::annotate;

    use super::*;

    fn ctor(owner: &str) -> MethodRef {
        MethodRef {
            owner: TypeName::new(owner),
            name: "<init>".into(),
            descriptor: "(I)V".into(),
        }
    }

    fn check(body: &mut crate::ast::MethodBody) -> Vec<super::super::Warning> {
        let flow = annotate(&AnalysisOptions::default(), body, &NullStats);
        let types = TypeHierarchy::new();
        let mut cx = MethodContext::new("com.example.Widget", body, flow.as_ref(), &types);
        NumberConstructor.check(&mut cx);
        cx.into_warnings()
    }

    #[test]
    fn test_cached_range_box_scores_full() {
        let mut b = MethodBuilder::new("m");
        let x = VarId(0);
        let small = b.const_int(42);
        let boxed = b.init_object(ctor("java.lang.Integer"), vec![small]);
        let hold = b.store(x, boxed);
        let ret = b.ret_void();
        let mut body = b.finish(Block::new(vec![stmt(hold), stmt(ret)]));

        let warnings = check(&mut body);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::NumberConstructor);
        assert_eq!(warnings[0].score, 45);
        assert!(warnings[0].notes.contains(&"NUMBER: 42".to_string()));
    }

    #[test]
    fn test_value_outside_cache_scores_lower() {
        let mut b = MethodBuilder::new("m");
        let x = VarId(0);
        let big = b.const_int(100_000);
        let boxed = b.init_object(ctor("java.lang.Integer"), vec![big]);
        let hold = b.store(x, boxed);
        let ret = b.ret_void();
        let mut body = b.finish(Block::new(vec![stmt(hold), stmt(ret)]));

        let warnings = check(&mut body);
        assert_eq!(warnings[0].score, 30);
    }

    #[test]
    fn test_constant_found_through_local_variable() {
        // int n = 40000; new Long(n)
        let mut b = MethodBuilder::new("m");
        let n = VarId(0);
        let x = VarId(1);
        let value = b.const_int(40_000);
        let assign = b.store(n, value);
        let read = b.load(n);
        let boxed = b.init_object(ctor("java.lang.Long"), vec![read]);
        let hold = b.store(x, boxed);
        let ret = b.ret_void();
        let mut body = b.finish(Block::new(vec![stmt(assign), stmt(hold), stmt(ret)]));

        let warnings = check(&mut body);
        assert_eq!(warnings[0].score, 45 - 35);
        assert!(warnings[0].notes.contains(&"NUMBER: 40000".to_string()));
    }

    #[test]
    fn test_boolean_constructor_is_its_own_kind() {
        let mut b = MethodBuilder::new("m");
        let x = VarId(0);
        let flag = b.const_int(1);
        let boxed = b.init_object(ctor("java.lang.Boolean"), vec![flag]);
        let hold = b.store(x, boxed);
        let ret = b.ret_void();
        let mut body = b.finish(Block::new(vec![stmt(hold), stmt(ret)]));

        let warnings = check(&mut body);
        assert_eq!(warnings[0].kind, WarningKind::BooleanConstructor);
        assert_eq!(warnings[0].score, 55);
    }

    #[test]
    fn test_unrelated_constructor_ignored() {
        let mut b = MethodBuilder::new("m");
        let x = VarId(0);
        let arg = b.const_int(5);
        let boxed = b.init_object(ctor("com.example.Integer"), vec![arg]);
        let hold = b.store(x, boxed);
        let ret = b.ret_void();
        let mut body = b.finish(Block::new(vec![stmt(hold), stmt(ret)]));

        assert!(check(&mut body).is_empty());
    }
}
