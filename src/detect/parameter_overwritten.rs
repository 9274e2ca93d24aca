//! Parameters overwritten before their incoming value is ever read.
//!
//! Usually a sign that the author meant to assign a field or a fresh
//! local: the caller's argument is silently thrown away.

use crate::ast::Operation;

use super::{Detector, MethodContext, WarningKind};

pub struct ParameterOverwritten;

impl Detector for ParameterOverwritten {
    fn name(&self) -> &'static str {
        "parameter-overwritten"
    }

    fn kinds(&self) -> &'static [WarningKind] {
        &[WarningKind::ParameterOverwritten]
    }

    fn check(&self, cx: &mut MethodContext<'_>) {
        let Some(flow) = cx.flow else { return };
        for &param in flow.params() {
            let Some(var) = cx.body.expr(param).variable() else {
                continue;
            };
            let reassigned = cx.body.expr_ids().any(|id| {
                let e = cx.body.expr(id);
                e.op == Operation::Store && e.variable() == Some(var)
            });
            if reassigned && flow.usages(param).is_empty() {
                cx.report(
                    WarningKind::ParameterOverwritten,
                    0,
                    vec![format!("PARAMETER: {}", var.0)],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::analysis::{AnalysisOptions, NullStats};
    use crate::ast::{stmt, Block, MethodBuilder, TypeHierarchy, VarId};
    use crate::flow::annotate;

    use super::*;

    fn check(body: &mut crate::ast::MethodBody) -> Vec<super::super::Warning> {
        let flow = annotate(&AnalysisOptions::default(), body, &NullStats);
        let types = TypeHierarchy::new();
        let mut cx = MethodContext::new("com.example.Widget", body, flow.as_ref(), &types);
        ParameterOverwritten.check(&mut cx);
        cx.into_warnings()
    }

    #[test]
    fn test_overwrite_without_read_is_reported() {
        let mut b = MethodBuilder::new("m");
        let p = b.param(0);
        let zero = b.const_int(0);
        let clobber = b.store(p, zero);
        let read = b.load(p);
        let ret = b.ret(read);
        let mut body = b.finish(Block::new(vec![stmt(clobber), stmt(ret)]));

        let warnings = check(&mut body);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::ParameterOverwritten);
    }

    #[test]
    fn test_read_before_overwrite_is_fine() {
        // q = p; p = 0; return q
        let mut b = MethodBuilder::new("m");
        let p = b.param(0);
        let q = VarId(1);
        let saved = b.load(p);
        let keep = b.store(q, saved);
        let zero = b.const_int(0);
        let clobber = b.store(p, zero);
        let read = b.load(q);
        let ret = b.ret(read);
        let mut body = b.finish(Block::new(vec![stmt(keep), stmt(clobber), stmt(ret)]));

        assert!(check(&mut body).is_empty());
    }

    #[test]
    fn test_untouched_parameter_is_fine() {
        let mut b = MethodBuilder::new("m");
        let p = b.param(0);
        let read = b.load(p);
        let ret = b.ret(read);
        let mut body = b.finish(Block::new(vec![stmt(ret)]));

        assert!(check(&mut body).is_empty());
    }
}
