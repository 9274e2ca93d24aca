//! `new Foo().getClass()` where `Foo.class` would do.

use crate::ast::{MethodRef, Operation};

use super::{Detector, MethodContext, WarningKind};

fn is_get_class(method: &MethodRef) -> bool {
    method.name == "getClass" && method.descriptor == "()Ljava/lang/Class;"
}

pub struct NewGetClass;

impl Detector for NewGetClass {
    fn name(&self) -> &'static str {
        "new-get-class"
    }

    fn kinds(&self) -> &'static [WarningKind] {
        &[WarningKind::NewForGetClass]
    }

    fn check(&self, cx: &mut MethodContext<'_>) {
        for id in cx.body.expr_ids() {
            let expr = cx.body.expr(id);
            if expr.op != Operation::InvokeVirtual {
                continue;
            }
            let Some(method) = expr.method() else { continue };
            if !is_get_class(method) {
                continue;
            }
            let Some(&receiver) = expr.args.first() else {
                continue;
            };
            // With flow available the receiver is traced to its
            // producing expression, so the allocation may hide behind
            // a local variable.
            let fresh = match cx.flow {
                Some(flow) => flow.all_match(cx.body, flow.source(receiver), &|e| {
                    cx.body.expr(e).op == Operation::InitObject
                }),
                None => cx.body.expr(receiver).op == Operation::InitObject,
            };
            if fresh {
                // Name the allocated type when the origins declare one;
                // the invocation owner is the fallback.
                let object_type = cx
                    .flow
                    .and_then(|flow| flow.reduce_type(cx.body, cx.types, receiver))
                    .unwrap_or_else(|| method.owner.clone());
                cx.report(
                    WarningKind::NewForGetClass,
                    0,
                    vec![format!("OBJECT_TYPE: {}", object_type.as_str())],
                );
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

    fn get_class(owner: &str) -> MethodRef {
        MethodRef {
            owner: TypeName::new(owner),
            name: "getClass".into(),
            descriptor: "()Ljava/lang/Class;".into(),
        }
    }

    fn check(body: &mut crate::ast::MethodBody) -> Vec<super::super::Warning> {
        let flow = annotate(&AnalysisOptions::default(), body, &NullStats);
        let types = TypeHierarchy::new();
        let mut cx = MethodContext::new("com.example.Widget", body, flow.as_ref(), &types);
        NewGetClass.check(&mut cx);
        cx.into_warnings()
    }

    #[test]
    fn test_get_class_on_fresh_allocation() {
        let mut b = MethodBuilder::new("m");
        let x = VarId(0);
        let obj = b.init_object(
            MethodRef {
                owner: TypeName::new("com.example.Widget"),
                name: "<init>".into(),
                descriptor: "()V".into(),
            },
            vec![],
        );
        let call = b.invoke_virtual(get_class("com.example.Widget"), vec![obj]);
        let hold = b.store(x, call);
        let ret = b.ret_void();
        let mut body = b.finish(Block::new(vec![stmt(hold), stmt(ret)]));

        let warnings = check(&mut body);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::NewForGetClass);
        assert!(warnings[0].notes[0].contains("com.example.Widget"));
    }

    #[test]
    fn test_allocation_hidden_behind_local() {
        let mut b = MethodBuilder::new("m");
        let tmp = VarId(0);
        let x = VarId(1);
        let obj = b.init_object(
            MethodRef {
                owner: TypeName::new("com.example.Widget"),
                name: "<init>".into(),
                descriptor: "()V".into(),
            },
            vec![],
        );
        let assign = b.store(tmp, obj);
        let read = b.load(tmp);
        let call = b.invoke_virtual(get_class("com.example.Widget"), vec![read]);
        let hold = b.store(x, call);
        let ret = b.ret_void();
        let mut body = b.finish(Block::new(vec![stmt(assign), stmt(hold), stmt(ret)]));

        assert_eq!(check(&mut body).len(), 1);
    }

    #[test]
    fn test_note_prefers_the_declared_allocation_type() {
        let mut b = MethodBuilder::new("m");
        let x = VarId(0);
        let obj = b.init_object(
            MethodRef {
                owner: TypeName::new("com.example.Gadget"),
                name: "<init>".into(),
                descriptor: "()V".into(),
            },
            vec![],
        );
        let call = b.invoke_virtual(get_class("java.lang.Object"), vec![obj]);
        let hold = b.store(x, call);
        let ret = b.ret_void();
        let mut body = b.finish(Block::new(vec![stmt(hold), stmt(ret)]));
        body.exprs[obj.index()].ty = Some(TypeName::new("com.example.Gadget"));

        let warnings = check(&mut body);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].notes[0], "OBJECT_TYPE: com.example.Gadget");
    }

    #[test]
    fn test_get_class_on_parameter_ignored() {
        let mut b = MethodBuilder::new("m");
        let p = b.param(0);
        let x = VarId(1);
        let read = b.load(p);
        let call = b.invoke_virtual(get_class("java.lang.Object"), vec![read]);
        let hold = b.store(x, call);
        let ret = b.ret_void();
        let mut body = b.finish(Block::new(vec![stmt(hold), stmt(ret)]));

        assert!(check(&mut body).is_empty());
    }
}
