//! Programmatic construction of method bodies.
//!
//! Mostly used by tests, which need small hand-built trees, and by the
//! dump fixtures under `testdata/`.

use super::nodes::{
    Block, Closure, ClosureId, Condition, Const, ExprId, Expression, Loop, LoopKind, MethodBody,
    MethodRef, Node, Operand, Operation, VarId,
};

/// Incremental builder for a [`MethodBody`].
#[derive(Debug, Default)]
pub struct MethodBuilder {
    name: String,
    descriptor: String,
    params: Vec<VarId>,
    exprs: Vec<Expression>,
    closures: Vec<Closure>,
}

impl MethodBuilder {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn descriptor<S: Into<String>>(mut self, descriptor: S) -> Self {
        self.descriptor = descriptor.into();
        self
    }

    /// Declare a method parameter and return its binding id.
    pub fn param(&mut self, id: u32) -> VarId {
        let var = VarId(id);
        self.params.push(var);
        var
    }

    /// Append an arbitrary expression to the arena.
    pub fn expr(&mut self, op: Operation, args: Vec<ExprId>, operand: Option<Operand>) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expression {
            op,
            args,
            operand,
            ty: None,
        });
        id
    }

    pub fn const_int(&mut self, value: i32) -> ExprId {
        self.expr(Operation::Const, vec![], Some(Operand::Const(Const::Int(value))))
    }

    pub fn load(&mut self, var: VarId) -> ExprId {
        self.expr(Operation::Load, vec![], Some(Operand::Variable(var)))
    }

    pub fn store(&mut self, var: VarId, value: ExprId) -> ExprId {
        self.expr(Operation::Store, vec![value], Some(Operand::Variable(var)))
    }

    pub fn ret(&mut self, value: ExprId) -> ExprId {
        self.expr(Operation::Return, vec![value], None)
    }

    pub fn ret_void(&mut self) -> ExprId {
        self.expr(Operation::Return, vec![], None)
    }

    pub fn invoke_virtual(&mut self, method: MethodRef, args: Vec<ExprId>) -> ExprId {
        self.expr(Operation::InvokeVirtual, args, Some(Operand::Method(method)))
    }

    pub fn invoke_static(&mut self, method: MethodRef, args: Vec<ExprId>) -> ExprId {
        self.expr(Operation::InvokeStatic, args, Some(Operand::Method(method)))
    }

    pub fn init_object(&mut self, method: MethodRef, args: Vec<ExprId>) -> ExprId {
        self.expr(Operation::InitObject, args, Some(Operand::Method(method)))
    }

    /// Register a closure body and the `Bind` expression referencing it.
    pub fn bind_closure(&mut self, params: Vec<VarId>, body: Block) -> (ClosureId, ExprId) {
        let id = ClosureId(self.closures.len() as u32);
        self.closures.push(Closure { params, body });
        let bind = self.expr(Operation::Bind, vec![], Some(Operand::Closure(id)));
        (id, bind)
    }

    pub fn finish(self, root: Block) -> MethodBody {
        MethodBody {
            name: self.name,
            descriptor: self.descriptor,
            params: self.params,
            exprs: self.exprs,
            closures: self.closures,
            root,
        }
    }
}

/// Wrap an expression as a statement node.
pub fn stmt(expr: ExprId) -> Node {
    Node::Expr(expr)
}

/// Build a conditional node.
pub fn cond(test: ExprId, then_block: Vec<Node>, else_block: Vec<Node>) -> Node {
    Node::Condition(Condition {
        test,
        then_block: Block::new(then_block),
        else_block: Block::new(else_block),
    })
}

/// Build a loop node.
pub fn looped(kind: LoopKind, body: Vec<Node>) -> Node {
    Node::Loop(Loop {
        kind,
        body: Block::new(body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_ids_are_dense() {
        let mut b = MethodBuilder::new("f");
        let x = b.param(0);
        let c = b.const_int(7);
        let s = b.store(x, c);
        let body = b.finish(Block::new(vec![stmt(s)]));

        assert_eq!(c, ExprId(0));
        assert_eq!(s, ExprId(1));
        assert_eq!(body.expr(s).args, vec![c]);
        assert_eq!(body.expr(s).variable(), Some(x));
    }
}
