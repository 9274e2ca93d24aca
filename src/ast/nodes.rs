//! Node and expression types for decompiled method bodies.

use serde::{Deserialize, Serialize};

use super::types::TypeName;

/// Arena index of an expression within one [`MethodBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExprId(pub u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Binding id: a parameter, local variable, or synthetic stack slot.
///
/// Binding ids are scoped to one method and its nested closures; the
/// decompiler guarantees captured variables keep their enclosing id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarId(pub u32);

/// Index of a closure literal within one [`MethodBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClosureId(pub u32);

impl ClosureId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Operation kind of a decompiled expression.
///
/// This is the subset of the decompiler's instruction vocabulary that
/// the flow engine and the detectors care about. `ParamDef` is
/// synthetic: the flow engine appends one per parameter to represent
/// the method's initial frame; it never appears in a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    // Bindings
    Load,
    Store,
    Const,
    // Control transfer
    Return,
    Throw,
    Break,
    Continue,
    Goto,
    Ret,
    // Synchronization
    MonitorEnter,
    MonitorExit,
    // Arithmetic and bitwise
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
    // Comparisons (produce int 0/1)
    CmpEq,
    CmpNe,
    CmpLt,
    CmpGe,
    CmpGt,
    CmpLe,
    // Boolean logic
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    Ternary,
    // Objects and members
    InitObject,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    GetStatic,
    PutStatic,
    GetField,
    PutField,
    ArrayLength,
    ArrayLoad,
    ArrayStore,
    Cast,
    InstanceOf,
    /// Closure literal; its operand names the captured closure body.
    Bind,
    /// Synthetic parameter definition created by the flow engine.
    ParamDef,
}

/// Reference to a field, used by `GetStatic`/`GetField` and friends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRef {
    pub owner: TypeName,
    pub name: String,
    pub ty: TypeName,
}

/// Reference to a method, used by the invoke operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRef {
    pub owner: TypeName,
    pub name: String,
    pub descriptor: String,
}

/// Constant value carried by a `Const` expression or propagated by the
/// flow engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Const {
    Null,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

/// Typed operand attached to an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Variable(VarId),
    Field(FieldRef),
    Method(MethodRef),
    Const(Const),
    Closure(ClosureId),
    Label(String),
}

/// A decompiled expression: an operation, its operand expressions, and
/// an optional typed operand reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub op: Operation,
    #[serde(default)]
    pub args: Vec<ExprId>,
    #[serde(default)]
    pub operand: Option<Operand>,
    /// Declared type of the produced value, when the decompiler knows it.
    #[serde(default)]
    pub ty: Option<TypeName>,
}

impl Expression {
    /// The bound variable, for `Load`/`Store`/`ParamDef` expressions.
    pub fn variable(&self) -> Option<VarId> {
        match self.operand {
            Some(Operand::Variable(v)) => Some(v),
            _ => None,
        }
    }

    /// The referenced method, for invoke expressions.
    pub fn method(&self) -> Option<&MethodRef> {
        match &self.operand {
            Some(Operand::Method(m)) => Some(m),
            _ => None,
        }
    }

    /// The referenced field, for field access expressions.
    pub fn field(&self) -> Option<&FieldRef> {
        match &self.operand {
            Some(Operand::Field(f)) => Some(f),
            _ => None,
        }
    }

    /// The referenced closure, for `Bind` expressions.
    pub fn closure(&self) -> Option<ClosureId> {
        match self.operand {
            Some(Operand::Closure(c)) => Some(c),
            _ => None,
        }
    }
}

/// One structured node of a method body tree. The variant set is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Expr(ExprId),
    Block(Block),
    Condition(Condition),
    Loop(Loop),
    Switch(Switch),
    Try(TryBlock),
    Label(String),
}

/// Sequence of nodes executed in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    pub body: Vec<Node>,
}

impl Block {
    pub fn new(body: Vec<Node>) -> Self {
        Self { body }
    }
}

/// Two-way conditional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub test: ExprId,
    pub then_block: Block,
    #[serde(default)]
    pub else_block: Block,
}

/// Loop shape: exit-by-break only, test before body, or test after body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopKind {
    NoTest,
    PreTest(ExprId),
    PostTest(ExprId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    pub kind: LoopKind,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    pub selector: ExprId,
    pub cases: Vec<CaseBlock>,
}

/// One switch case. Cases appear in source order; a case without a
/// trailing break falls through into the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseBlock {
    #[serde(default)]
    pub values: Vec<i32>,
    #[serde(default)]
    pub default: bool,
    pub body: Block,
}

/// Protected region. The only analyzable shape is a monitor-guarded
/// region with no handlers and no finally; everything else makes the
/// flow engine abandon the method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryBlock {
    pub protected: Block,
    #[serde(default)]
    pub handlers: usize,
    #[serde(default)]
    pub has_finally: bool,
}

/// A closure literal nested inside a method. Its body shares the
/// enclosing method's expression arena and binding-id space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Closure {
    #[serde(default)]
    pub params: Vec<VarId>,
    pub body: Block,
}

/// A full decompiled method body: the expression arena, the closure
/// table, and the structured tree rooted at `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBody {
    pub name: String,
    #[serde(default)]
    pub descriptor: String,
    #[serde(default)]
    pub params: Vec<VarId>,
    pub exprs: Vec<Expression>,
    #[serde(default)]
    pub closures: Vec<Closure>,
    pub root: Block,
}

impl MethodBody {
    pub fn expr(&self, id: ExprId) -> &Expression {
        &self.exprs[id.index()]
    }

    pub fn closure(&self, id: ClosureId) -> &Closure {
        &self.closures[id.index()]
    }

    /// Append an expression to the arena. Used by the flow engine for
    /// synthetic parameter definitions; dump-loaded ids stay stable.
    pub fn push_expr(&mut self, expr: Expression) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    /// All expression ids currently in the arena.
    pub fn expr_ids(&self) -> impl Iterator<Item = ExprId> {
        (0..self.exprs.len() as u32).map(ExprId)
    }
}
