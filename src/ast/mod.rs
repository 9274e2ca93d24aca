//! Decompiled method body representation.
//!
//! classcheck does not parse raw class files. The upstream decompiler
//! emits one JSON dump per class; the structures here are the schema of
//! that dump plus the in-memory arena the flow engine works on.
//!
//! Expressions live in a flat arena on the [`MethodBody`] and reference
//! each other by [`ExprId`]. Structured control flow (blocks,
//! conditionals, loops, switches) is a tree of [`Node`] values that
//! refer into the arena. The variant set is closed; the engine matches
//! over it exhaustively.

mod builder;
mod nodes;
mod types;

pub use builder::{cond, looped, stmt, MethodBuilder};
pub use nodes::{
    Block, CaseBlock, Closure, ClosureId, Condition, Const, ExprId, Expression, FieldRef, Loop,
    LoopKind, MethodBody, MethodRef, Node, Operand, Operation, Switch, TryBlock, VarId,
};
pub use types::{TypeHierarchy, TypeName};
