//! Bound command trees.
//!
//! Binding turns token trees into chains of `BoundNode`s in which every
//! member access, invocation and conversion has already been pinned to a
//! concrete registry entry. Evaluation walks the chain left to right
//! threading a current value; no name lookup happens after binding.

use scry_common::value::{TyRef, TypeId, Value};

/// The statically-known type of a bound expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprTy {
    /// A concrete type.
    Known(TyRef),
    /// The untyped `null` literal.
    Null,
    /// The expression produces no value.
    Void,
}

impl ExprTy {
    pub fn as_ty(&self) -> Option<&TyRef> {
        match self {
            ExprTy::Known(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ExprTy::Void)
    }
}

/// Index of a member inside the type that declares it.
///
/// `owner` is the declaring type, which for inherited members differs from
/// the type the chain was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRef {
    pub owner: TypeId,
    pub index: usize,
}

/// What an invocation dispatches to.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// A method declared on `MemberRef::owner`.
    Method(MemberRef),
    /// A constructor. `index` is `None` for the implicit zero-argument
    /// construction of a value type with no matching declared constructor.
    Ctor { ty: TypeId, index: Option<usize> },
    /// A built-in global function, by index into the global table.
    Global(usize),
}

/// An invocation with its arguments already bound.
///
/// `fixed` is the number of leading arguments bound one-to-one against
/// declared parameters; any remaining arguments are packed into the
/// trailing variadic array at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundInvoke {
    pub callee: Callee,
    pub args: Vec<BoundExpr>,
    pub fixed: usize,
}

/// A single step of a bound chain.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundNode {
    /// A literal value produced at bind time.
    Literal(Value),
    /// A type used as a value, e.g. the result of `int[]`.
    TypeRef(TyRef),
    /// A variable read. The name is stored without the `$` sigil.
    Variable(String),
    /// Field read. Static fields ignore the current value.
    FieldGet(MemberRef),
    /// Parameterless property read.
    PropertyGet(MemberRef),
    /// A nested type accessed through its parent, e.g. `Player.Stats`.
    NestedType(TypeId),
    Invoke(BoundInvoke),
    /// Array construction with explicit lengths, e.g. `int[3, 4]`.
    ArrayNew { elem: TypeId, lengths: Vec<BoundExpr> },
    /// The built-in `Length` member of arrays.
    ArrayLen,
    /// Array element read; one index per dimension.
    ArrayGet { indices: Vec<BoundExpr> },
    /// Indexer getter declared on `MemberRef::owner`.
    IndexerGet { member: MemberRef, indices: Vec<BoundExpr> },
    Assign(BoundAssign),
}

/// A bound assignment. Always the sole node of its statement and always
/// evaluates to void.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundAssign {
    /// `$name = value`. `ty` is the declared type recorded for later reads.
    Variable {
        name: String,
        ty: TyRef,
        value: BoundExpr,
    },
    Field {
        target: BoundExpr,
        member: MemberRef,
        value: BoundExpr,
    },
    Property {
        target: BoundExpr,
        member: MemberRef,
        value: BoundExpr,
    },
    ArraySet {
        target: BoundExpr,
        indices: Vec<BoundExpr>,
        value: BoundExpr,
    },
    IndexerSet {
        target: BoundExpr,
        member: MemberRef,
        indices: Vec<BoundExpr>,
        value: BoundExpr,
    },
}

/// A fully bound expression chain and its result type.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundExpr {
    pub nodes: Vec<BoundNode>,
    pub ty: ExprTy,
}

/// A bound command: one bound expression per statement, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundCommand {
    pub statements: Vec<BoundExpr>,
}
