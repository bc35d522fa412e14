//! Token stream -> token tree.
//!
//! The builder consumes the full token stream with a stack of open groups,
//! then runs a post-pass that splits root-level assignments into explicit
//! target/value nodes. Structural errors are recorded, not thrown: the scan
//! always completes and the partial tree (including never-closed groups) is
//! retained so the suggestion engine can anchor on it. The reported error is
//! the first unexpected condition encountered.

use scry_common::error::{SyntaxError, SyntaxErrorKind};
use scry_common::span::Span;
use scry_common::token::{Token, TokenKind};

use crate::tree::{AssignTarget, Assignment, Command, Expr, ExprNode, Group, GroupKind};

/// Result of building one command line.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub command: Command,
    pub error: Option<SyntaxError>,
}

/// Build the statement list from a complete token stream (the lexer's
/// output, including the implicit trailing `;`).
pub fn build(tokens: &[Token]) -> BuildOutput {
    let mut builder = Builder::default();
    for token in tokens {
        builder.consume(token);
    }
    BuildOutput {
        command: Command { statements: builder.statements },
        error: builder.errors.into_iter().next(),
    }
}

/// A bracket group still waiting for its close token.
struct OpenGroup {
    kind: GroupKind,
    open_span: Span,
    last_span: Span,
    args: Vec<Expr>,
    current: Expr,
    saw_comma: bool,
}

#[derive(Default)]
struct Builder {
    stack: Vec<OpenGroup>,
    statements: Vec<Expr>,
    /// Root-level chain currently being built (the RHS once `=` was seen).
    current: Expr,
    /// LHS chain and `=` span, set when the root expression's `=` arrives.
    pending_assign: Option<(Expr, Span)>,
    /// Span of a `.` waiting for its member segment.
    pending_dot: Option<Span>,
    errors: Vec<SyntaxError>,
}

impl Builder {
    fn error(&mut self, kind: SyntaxErrorKind, span: Span) {
        self.errors.push(SyntaxError::new(kind, span));
    }

    /// The expression tokens currently accumulate into: the innermost open
    /// group's argument, or the root chain.
    fn cur(&mut self) -> &mut Expr {
        match self.stack.last_mut() {
            Some(group) => &mut group.current,
            None => &mut self.current,
        }
    }

    fn consume(&mut self, token: &Token) {
        if let Some(group) = self.stack.last_mut() {
            group.last_span = group.last_span.merge(token.span);
        }
        match token.kind {
            TokenKind::Ident | TokenKind::Str | TokenKind::Char => self.atom(token),
            TokenKind::Dot => self.dot(token.span),
            TokenKind::LParen => self.open(GroupKind::Invoke, token.span),
            TokenKind::LBracket => self.open(GroupKind::Subscript, token.span),
            TokenKind::RParen => self.close(GroupKind::Invoke, ')', token.span),
            TokenKind::RBracket => self.close(GroupKind::Subscript, ']', token.span),
            TokenKind::Comma => self.comma(token.span),
            TokenKind::Eq => self.assign(token.span),
            TokenKind::Semicolon => self.semicolon(token.span),
            // The lexer already reported these; keep building around them.
            TokenKind::Error => {}
        }
    }

    fn atom(&mut self, token: &Token) {
        let chained = self.pending_dot.take().is_some();
        let cur = self.cur();
        if !cur.is_empty() && !chained {
            // Two segments with no `.` between them.
            self.error(SyntaxErrorKind::UnexpectedEnd, token.span);
        }
        self.cur().push(ExprNode::Atom(token.clone()), token.span);
    }

    fn dot(&mut self, span: Span) {
        if self.cur().is_empty() || self.pending_dot.is_some() {
            self.error(SyntaxErrorKind::UnexpectedEnd, span);
            return;
        }
        self.pending_dot = Some(span);
    }

    fn open(&mut self, kind: GroupKind, span: Span) {
        if let Some(dot) = self.pending_dot.take() {
            self.error(SyntaxErrorKind::UnexpectedEnd, dot);
        }
        self.stack.push(OpenGroup {
            kind,
            open_span: span,
            last_span: span,
            args: Vec::new(),
            current: Expr::default(),
            saw_comma: false,
        });
    }

    fn comma(&mut self, span: Span) {
        if let Some(dot) = self.pending_dot.take() {
            self.error(SyntaxErrorKind::UnexpectedEnd, dot);
        }
        let Some(group) = self.stack.last_mut() else {
            self.error(SyntaxErrorKind::UnexpectedEnd, span);
            return;
        };
        group.saw_comma = true;
        let arg = std::mem::take(&mut group.current);
        if arg.is_empty() {
            self.error(SyntaxErrorKind::UnexpectedEnd, span);
        } else {
            // A `,` finalizes the current argument and starts a sibling.
            self.stack.last_mut().unwrap().args.push(arg);
        }
    }

    fn close(&mut self, kind: GroupKind, close_char: char, span: Span) {
        if let Some(dot) = self.pending_dot.take() {
            self.error(SyntaxErrorKind::UnexpectedEnd, dot);
        }
        let matches = self.stack.last().is_some_and(|g| g.kind == kind);
        if !matches {
            self.error(SyntaxErrorKind::MismatchedClose(close_char), span);
            return;
        }
        let mut group = self.stack.pop().unwrap();
        let arg = std::mem::take(&mut group.current);
        if !arg.is_empty() {
            group.args.push(arg);
        } else if group.saw_comma {
            self.error(SyntaxErrorKind::UnexpectedEnd, span);
        }
        let node = Group {
            kind: group.kind,
            args: group.args,
            span: group.open_span.merge(span),
            closed: true,
        };
        self.cur().push(ExprNode::Group(node), group.open_span.merge(span));
    }

    fn assign(&mut self, span: Span) {
        if let Some(dot) = self.pending_dot.take() {
            self.error(SyntaxErrorKind::UnexpectedEnd, dot);
        }
        if !self.stack.is_empty() {
            self.error(SyntaxErrorKind::AssignmentNotRoot, span);
            return;
        }
        if self.pending_assign.is_some() {
            self.error(SyntaxErrorKind::DuplicateAssignment, span);
            return;
        }
        self.pending_assign = Some((std::mem::take(&mut self.current), span));
    }

    fn semicolon(&mut self, span: Span) {
        if let Some(dot) = self.pending_dot.take() {
            self.error(SyntaxErrorKind::UnexpectedEnd, dot);
        }
        if !self.stack.is_empty() {
            // Leftover open groups. Keep them in the tree, unclosed, so
            // overload hints can still anchor at them.
            self.error(SyntaxErrorKind::UnexpectedEnd, span);
            while let Some(mut group) = self.stack.pop() {
                let arg = std::mem::take(&mut group.current);
                if !arg.is_empty() {
                    group.args.push(arg);
                }
                let node_span = group.open_span.merge(group.last_span);
                let node = Group {
                    kind: group.kind,
                    args: group.args,
                    span: node_span,
                    closed: false,
                };
                self.cur().push(ExprNode::Group(node), node_span);
            }
        }
        self.finish_statement(span);
    }

    fn finish_statement(&mut self, semi_span: Span) {
        if let Some((lhs, eq_span)) = self.pending_assign.take() {
            let value = std::mem::take(&mut self.current);
            match split_assignment(lhs, value, eq_span) {
                Ok(assignment) => {
                    let span = assignment.span;
                    let mut stmt = Expr::default();
                    stmt.push(ExprNode::Assign(Box::new(assignment)), span);
                    self.statements.push(stmt);
                }
                Err(err) => self.errors.push(err),
            }
            return;
        }
        let stmt = std::mem::take(&mut self.current);
        if stmt.is_empty() {
            // Covers both a trailing explicit `;` (the implicit terminator
            // then closes an empty statement) and empty input.
            self.error(SyntaxErrorKind::UnexpectedEnd, semi_span);
        } else {
            self.statements.push(stmt);
        }
    }
}

/// Post-pass: split an assignment into target and value by the shape of the
/// left-hand chain. Operand counts map 1 / 2 / >2 to variable, field or
/// property, and indexer targets respectively.
fn split_assignment(mut lhs: Expr, value: Expr, eq_span: Span) -> Result<Assignment, SyntaxError> {
    if value.is_empty() || lhs.is_empty() {
        return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedEnd, eq_span));
    }
    let span = lhs.span.merge(eq_span).merge(value.span);

    // Bare `$name` on the left: variable binding.
    if lhs.nodes.len() == 1 {
        if let ExprNode::Atom(tok) = &lhs.nodes[0] {
            if tok.is_variable() {
                let tok = tok.clone();
                return Ok(Assignment {
                    target: AssignTarget::Variable(tok),
                    value,
                    span,
                });
            }
        }
    }

    let last = lhs.nodes.pop().unwrap();
    let target = match last {
        ExprNode::Atom(member) => AssignTarget::Member { target: lhs, member },
        ExprNode::Group(group) if group.kind == GroupKind::Subscript => {
            if lhs.is_empty() {
                return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedEnd, eq_span));
            }
            AssignTarget::Index { target: lhs, indices: group.args }
        }
        // `f(...) = x` has nothing writable on the left.
        _ => return Err(SyntaxError::new(SyntaxErrorKind::UnexpectedEnd, eq_span)),
    };
    Ok(Assignment { target, value, span })
}
