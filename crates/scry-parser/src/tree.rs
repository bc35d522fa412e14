//! The token tree: statements of chained expression nodes.
//!
//! An [`Expr`] is an ordered chain -- identifier/literal atoms joined by
//! `.`, with invoke (`(...)`) and subscript (`[...]`) groups attached where
//! they occur. A [`Command`] is the `;`-separated statement list of one
//! submitted line. Assignments are split out of the chain by the builder's
//! post-pass into an explicit [`Assignment`] node.

use serde::Serialize;

use scry_common::span::Span;
use scry_common::token::Token;

/// What kind of group a bracket pair opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupKind {
    /// `( ... )` -- invocation argument list.
    Invoke,
    /// `[ ... ]` -- subscript argument list.
    Subscript,
}

/// A bracketed argument group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub kind: GroupKind,
    pub args: Vec<Expr>,
    /// Full source span from the opening bracket to the closing one (or to
    /// the last consumed token when the group was never closed).
    pub span: Span,
    /// Whether the matching close bracket was seen. Unclosed groups are
    /// kept in the tree so the suggestion engine can anchor overload hints
    /// at them.
    pub closed: bool,
}

/// One element of an expression chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprNode {
    /// Identifier segment or literal.
    Atom(Token),
    /// Invoke or subscript argument group.
    Group(Group),
    /// Root-level assignment (always the only node of its expression).
    Assign(Box<Assignment>),
}

/// One value-producing chain.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Expr {
    pub nodes: Vec<ExprNode>,
    pub span: Span,
}

impl Expr {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Push a node, widening the expression span.
    pub(crate) fn push(&mut self, node: ExprNode, span: Span) {
        if self.nodes.is_empty() {
            self.span = span;
        } else {
            self.span = self.span.merge(span);
        }
        self.nodes.push(node);
    }
}

/// Where an assignment writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AssignTarget {
    /// `$name = value`
    Variable(Token),
    /// `chain.member = value`
    Member { target: Expr, member: Token },
    /// `chain[indices...] = value`
    Index { target: Expr, indices: Vec<Expr> },
}

/// A split assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub target: AssignTarget,
    pub value: Expr,
    pub span: Span,
}

impl Assignment {
    /// Operand count under the setter calling convention:
    /// 1 for a bare variable (value), 2 for field/property (target, value),
    /// 2 + indices for an indexer (target, value, indices...).
    pub fn arg_count(&self) -> usize {
        match &self.target {
            AssignTarget::Variable(_) => 1,
            AssignTarget::Member { .. } => 2,
            AssignTarget::Index { indices, .. } => 2 + indices.len(),
        }
    }

    /// The setter operands in invocation order (indices first, value last),
    /// matching the host's setter calling convention.
    pub fn setter_operands(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        if let AssignTarget::Index { indices, .. } = &self.target {
            out.extend(indices.iter());
        }
        out.push(&self.value);
        out
    }
}

/// The `;`-separated statement list of one submitted command line.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Command {
    pub statements: Vec<Expr>,
}
