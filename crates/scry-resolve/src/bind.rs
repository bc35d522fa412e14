//! The binder: token trees in, bound chains out.
//!
//! Binding threads a chain context (static type reference, or a value of a
//! known type) left to right through each expression, probing the registry
//! without throwing. Only the final unmatched case produces a
//! `ResolutionError` naming the symbol and the type searched.

use rustc_hash::FxHashMap;

use scry_catalog::Catalog;
use scry_common::error::ResolutionError;
use scry_common::token::TokenKind;
use scry_common::value::{prim, ArrayTy, TyRef, TypeId, Value};
use scry_common::vars::VarTable;
use scry_parser::{AssignTarget, Assignment, Command, Expr, ExprNode, Group, GroupKind};
use scry_registry::{GlobalFn, Param, Registry, TypeDesc, TypeKind};

use crate::bound::{
    BoundAssign, BoundCommand, BoundExpr, BoundInvoke, BoundNode, Callee, ExprTy, MemberRef,
};

/// Binding-time variable types.
///
/// Statements later in a command see variables declared by earlier
/// statements before anything has executed, so the binder tracks declared
/// types itself rather than reading the runtime table.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    types: FxHashMap<String, TyRef>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an already-populated runtime table (the suggestion path
    /// binds against whatever the last execution left behind).
    pub fn from_table(vars: &VarTable) -> Self {
        let mut scope = Self::new();
        for name in vars.names() {
            if let Some(binding) = vars.get(name) {
                scope.types.insert(name.to_string(), binding.ty);
            }
        }
        scope
    }

    pub fn declare(&mut self, name: &str, ty: TyRef) {
        self.types.insert(name.to_string(), ty);
    }

    pub fn get(&self, name: &str) -> Option<TyRef> {
        self.types.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

/// The context a chain threads between nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainCtx {
    /// A type used as a receiver: members resolve statically.
    Static(TyRef),
    /// A value of the given type (or the untyped null literal).
    Value(ExprTy),
}

impl ChainCtx {
    fn ty(&self) -> ExprTy {
        match self {
            // A chain ending on a type reference yields the type object,
            // which travels as a plain object value.
            ChainCtx::Static(_) => ExprTy::Known(TyRef::Named(prim::OBJECT)),
            ChainCtx::Value(ty) => ty.clone(),
        }
    }
}

pub struct Binder<'a> {
    registry: &'a Registry,
    catalog: &'a Catalog,
    usings: &'a [String],
    safe_mode: bool,
    globals: &'a [GlobalFn],
}

impl<'a> Binder<'a> {
    pub fn new(
        registry: &'a Registry,
        catalog: &'a Catalog,
        usings: &'a [String],
        safe_mode: bool,
        globals: &'a [GlobalFn],
    ) -> Self {
        Self { registry, catalog, usings, safe_mode, globals }
    }

    /// Bind every statement in order, threading declared variable types
    /// forward.
    pub fn bind_command(
        &self,
        command: &Command,
        scope: &mut Scope,
    ) -> Result<BoundCommand, ResolutionError> {
        let mut statements = Vec::with_capacity(command.statements.len());
        for expr in &command.statements {
            statements.push(self.bind_expr(expr, scope)?);
        }
        Ok(BoundCommand { statements })
    }

    pub fn bind_expr(&self, expr: &Expr, scope: &mut Scope) -> Result<BoundExpr, ResolutionError> {
        if let [ExprNode::Assign(assign)] = expr.nodes.as_slice() {
            let node = self.bind_assignment(assign, scope)?;
            return Ok(BoundExpr { nodes: vec![BoundNode::Assign(node)], ty: ExprTy::Void });
        }
        let (nodes, ctx) = self.bind_chain(&expr.nodes, scope)?;
        Ok(BoundExpr { nodes, ty: ctx.ty() })
    }

    /// The context after binding a whole chain, for completion anchoring.
    /// Suppresses the error detail; a failed anchor just means no
    /// member candidates.
    pub fn chain_context(&self, nodes: &[ExprNode], scope: &Scope) -> Option<ChainCtx> {
        self.bind_chain(nodes, scope).ok().map(|(_, ctx)| ctx)
    }

    fn visible(&self, is_public: bool) -> bool {
        is_public || !self.safe_mode
    }

    // ── Chains ───────────────────────────────────────────────────────────

    fn bind_chain(
        &self,
        nodes: &[ExprNode],
        scope: &Scope,
    ) -> Result<(Vec<BoundNode>, ChainCtx), ResolutionError> {
        let mut out = Vec::with_capacity(nodes.len());
        let (mut i, mut ctx) = self.bind_root(nodes, scope, &mut out)?;

        while i < nodes.len() {
            if let ChainCtx::Value(ExprTy::Void) = ctx {
                return Err(ResolutionError::VoidDereference);
            }
            match &nodes[i] {
                ExprNode::Atom(token) => {
                    // An identifier followed by an invoke group is a call;
                    // bare, it is a member read.
                    if let Some(ExprNode::Group(group)) = nodes.get(i + 1) {
                        if group.kind == GroupKind::Invoke {
                            ctx = self.bind_member_invoke(&ctx, &token.text, group, scope, &mut out)?;
                            i += 2;
                            continue;
                        }
                    }
                    ctx = self.bind_deref(&ctx, &token.text, &mut out)?;
                    i += 1;
                }
                ExprNode::Group(group) => {
                    ctx = match group.kind {
                        GroupKind::Invoke => self.bind_direct_invoke(&ctx, group, scope, &mut out)?,
                        GroupKind::Subscript => self.bind_subscript(&ctx, group, scope, &mut out)?,
                    };
                    i += 1;
                }
                // The builder only ever places assignments as the sole
                // node of a statement.
                ExprNode::Assign(_) => {
                    return Err(ResolutionError::UnresolvedRoot("=".to_string()));
                }
            }
        }
        Ok((out, ctx))
    }

    fn bind_root(
        &self,
        nodes: &[ExprNode],
        scope: &Scope,
        out: &mut Vec<BoundNode>,
    ) -> Result<(usize, ChainCtx), ResolutionError> {
        let first = match nodes.first() {
            Some(ExprNode::Atom(token)) => token,
            Some(ExprNode::Group(group)) => {
                let open = match group.kind {
                    GroupKind::Invoke => "(",
                    GroupKind::Subscript => "[",
                };
                return Err(ResolutionError::UnresolvedRoot(open.to_string()));
            }
            Some(ExprNode::Assign(_)) => {
                return Err(ResolutionError::UnresolvedRoot("=".to_string()));
            }
            None => return Err(ResolutionError::EmptyInput),
        };

        if first.is_variable() {
            let name = first.text.trim_start_matches('$');
            let ty = scope
                .get(name)
                .ok_or_else(|| ResolutionError::UnknownVariable(name.to_string()))?;
            out.push(BoundNode::Variable(name.to_string()));
            return Ok((1, ChainCtx::Value(ExprTy::Known(ty))));
        }
        // String and char tokens carry their unquoted text; numeric and
        // keyword literals are identifier-shaped.
        let literal = match first.kind {
            TokenKind::Str => Some(Value::Str(first.text.clone())),
            TokenKind::Char => first.text.chars().next().map(Value::Char),
            _ if first.is_literal_shaped() || is_keyword_literal(&first.text) => {
                Some(parse_literal(&first.text).ok_or_else(|| {
                    ResolutionError::UnresolvedRoot(first.text.clone())
                })?)
            }
            _ => None,
        };
        if let Some(value) = literal {
            let ty = match self.registry.type_of(&value) {
                Some(ty) => ExprTy::Known(ty),
                None => ExprTy::Null,
            };
            out.push(BoundNode::Literal(value));
            return Ok((1, ChainCtx::Value(ty)));
        }

        // Invoke-shaped roots check the global table before the catalog.
        if let Some(ExprNode::Group(group)) = nodes.get(1) {
            if group.kind == GroupKind::Invoke
                && self.globals.iter().any(|g| g.name == first.text)
            {
                let ctx = self.bind_global(&first.text, group, scope, out)?;
                return Ok((2, ctx));
            }
        }

        // Progressively longer dotted prefixes against the catalog; the
        // first prefix naming a type wins, and the remaining leading
        // segments fall through as ordinary chained tokens.
        let mut segments = Vec::new();
        for node in nodes {
            match node {
                ExprNode::Atom(token)
                    if !token.is_variable() && !token.is_literal_shaped() =>
                {
                    segments.push(token.text.as_str());
                }
                _ => break,
            }
        }
        let mut prefix = String::new();
        for (k, segment) in segments.iter().enumerate() {
            if k > 0 {
                prefix.push('.');
            }
            prefix.push_str(segment);
            if let Some(id) = self.catalog.resolve(&prefix, self.usings) {
                out.push(BoundNode::TypeRef(TyRef::Named(id)));
                return Ok((k + 1, ChainCtx::Static(TyRef::Named(id))));
            }
        }
        Err(ResolutionError::UnresolvedRoot(prefix))
    }

    // ── Member access ────────────────────────────────────────────────────

    /// Field, read-only parameterless property, or nested type. Each base
    /// level is searched in full before walking outward, so a derived
    /// member always shadows a base one.
    fn bind_deref(
        &self,
        ctx: &ChainCtx,
        name: &str,
        out: &mut Vec<BoundNode>,
    ) -> Result<ChainCtx, ResolutionError> {
        let (id, want_static) = match ctx {
            ChainCtx::Static(TyRef::Named(id)) => (*id, true),
            ChainCtx::Static(ty @ TyRef::Array(_)) => {
                return Err(ResolutionError::NoSuchMember {
                    name: name.to_string(),
                    on: self.registry.ty_name(ty),
                });
            }
            ChainCtx::Value(ExprTy::Known(TyRef::Named(id))) => (*id, false),
            ChainCtx::Value(ExprTy::Known(ty @ TyRef::Array(_))) => {
                if name == "Length" {
                    out.push(BoundNode::ArrayLen);
                    return Ok(ChainCtx::Value(ExprTy::Known(TyRef::Named(prim::I32))));
                }
                return Err(ResolutionError::NoSuchMember {
                    name: name.to_string(),
                    on: self.registry.ty_name(ty),
                });
            }
            ChainCtx::Value(ExprTy::Null) => {
                return Err(ResolutionError::NoSuchMember {
                    name: name.to_string(),
                    on: "null".to_string(),
                });
            }
            ChainCtx::Value(ExprTy::Void) => return Err(ResolutionError::VoidDereference),
        };

        for owner in self.registry.base_chain(id) {
            let desc = self.registry.get(owner);
            for (index, field) in desc.fields.iter().enumerate() {
                if field.name == name
                    && field.is_static == want_static
                    && self.visible(field.is_public)
                {
                    out.push(BoundNode::FieldGet(MemberRef { owner, index }));
                    return Ok(ChainCtx::Value(ExprTy::Known(field.ty)));
                }
            }
            for (index, prop) in desc.properties.iter().enumerate() {
                if prop.name == name
                    && prop.is_static == want_static
                    && prop.get.is_some()
                    && self.visible(prop.is_public)
                {
                    out.push(BoundNode::PropertyGet(MemberRef { owner, index }));
                    return Ok(ChainCtx::Value(ExprTy::Known(prop.ty)));
                }
            }
            if want_static {
                if let Some(nested) = self.find_nested(desc, name) {
                    out.push(BoundNode::NestedType(nested));
                    return Ok(ChainCtx::Static(TyRef::Named(nested)));
                }
            }
        }
        Err(ResolutionError::NoSuchMember {
            name: name.to_string(),
            on: self.registry.get(id).full_name(),
        })
    }

    fn find_nested(&self, desc: &TypeDesc, name: &str) -> Option<TypeId> {
        desc.nested
            .iter()
            .copied()
            .find(|&id| {
                let nested = self.registry.get(id);
                nested.name == name && self.visible(nested.is_public)
            })
    }

    // ── Invocation ───────────────────────────────────────────────────────

    /// `name(...)`: a method on the current type, then a nested-type
    /// constructor, then a delegate-typed field bound as field + invoke.
    fn bind_member_invoke(
        &self,
        ctx: &ChainCtx,
        name: &str,
        group: &Group,
        scope: &Scope,
        out: &mut Vec<BoundNode>,
    ) -> Result<ChainCtx, ResolutionError> {
        let (id, want_static) = match ctx {
            ChainCtx::Static(TyRef::Named(id)) => (*id, true),
            ChainCtx::Value(ExprTy::Known(TyRef::Named(id))) => (*id, false),
            ChainCtx::Value(ExprTy::Null) => {
                return Err(ResolutionError::NoSuchMember {
                    name: name.to_string(),
                    on: "null".to_string(),
                });
            }
            ChainCtx::Value(ExprTy::Void) => return Err(ResolutionError::VoidDereference),
            ChainCtx::Static(ty) | ChainCtx::Value(ExprTy::Known(ty)) => {
                return Err(ResolutionError::NoSuchMember {
                    name: name.to_string(),
                    on: self.registry.ty_name(ty),
                });
            }
        };

        let args = self.bind_args(&group.args, scope)?;
        let mut name_seen = false;

        for owner in self.registry.base_chain(id) {
            let desc = self.registry.get(owner);
            for (index, method) in desc.methods.iter().enumerate() {
                if method.name != name
                    || method.is_static != want_static
                    || !self.visible(method.is_public)
                {
                    continue;
                }
                name_seen = true;
                if let Some(fixed) = self.args_compatible(&method.params, &args) {
                    let ret = match &method.ret {
                        Some(ty) => ExprTy::Known(*ty),
                        None => ExprTy::Void,
                    };
                    out.push(BoundNode::Invoke(BoundInvoke {
                        callee: Callee::Method(MemberRef { owner, index }),
                        args,
                        fixed,
                    }));
                    return Ok(ChainCtx::Value(ret));
                }
            }
        }

        if want_static {
            for owner in self.registry.base_chain(id) {
                if let Some(nested) = self.find_nested(self.registry.get(owner), name) {
                    name_seen = true;
                    if let Some((index, fixed)) = self.find_ctor(nested, &args) {
                        out.push(BoundNode::Invoke(BoundInvoke {
                            callee: Callee::Ctor { ty: nested, index },
                            args,
                            fixed,
                        }));
                        return Ok(ChainCtx::Value(ExprTy::Known(TyRef::Named(nested))));
                    }
                }
            }
        }

        // A field holding a delegate: bind the read, then its Invoke.
        for owner in self.registry.base_chain(id) {
            let desc = self.registry.get(owner);
            for (index, field) in desc.fields.iter().enumerate() {
                if field.name != name
                    || field.is_static != want_static
                    || !self.visible(field.is_public)
                {
                    continue;
                }
                name_seen = true;
                let TyRef::Named(delegate) = field.ty else { continue };
                if self.registry.get(delegate).kind != TypeKind::Delegate {
                    continue;
                }
                if let Some((invoke, fixed)) = self.find_delegate_invoke(delegate, &args) {
                    out.push(BoundNode::FieldGet(MemberRef { owner, index }));
                    let ret = invoke.1.clone();
                    out.push(BoundNode::Invoke(BoundInvoke {
                        callee: Callee::Method(invoke.0),
                        args,
                        fixed,
                    }));
                    return Ok(ChainCtx::Value(ret));
                }
            }
        }

        let on = self.registry.get(id).full_name();
        if name_seen {
            Err(ResolutionError::NoMatchingOverload { name: name.to_string(), on })
        } else {
            Err(ResolutionError::NoSuchMember { name: name.to_string(), on })
        }
    }

    /// `(...)` directly after the current node: a constructor on a static
    /// type reference, or the Invoke of a delegate value.
    fn bind_direct_invoke(
        &self,
        ctx: &ChainCtx,
        group: &Group,
        scope: &Scope,
        out: &mut Vec<BoundNode>,
    ) -> Result<ChainCtx, ResolutionError> {
        let args = self.bind_args(&group.args, scope)?;
        match ctx {
            ChainCtx::Static(TyRef::Named(id)) => {
                let Some((index, fixed)) = self.find_ctor(*id, &args) else {
                    return Err(ResolutionError::NoMatchingConstructor {
                        on: self.registry.get(*id).full_name(),
                    });
                };
                out.push(BoundNode::Invoke(BoundInvoke {
                    callee: Callee::Ctor { ty: *id, index },
                    args,
                    fixed,
                }));
                Ok(ChainCtx::Value(ExprTy::Known(TyRef::Named(*id))))
            }
            ChainCtx::Value(ExprTy::Known(TyRef::Named(id)))
                if self.registry.get(*id).kind == TypeKind::Delegate =>
            {
                let Some((invoke, fixed)) = self.find_delegate_invoke(*id, &args) else {
                    return Err(ResolutionError::NoMatchingOverload {
                        name: "Invoke".to_string(),
                        on: self.registry.get(*id).full_name(),
                    });
                };
                let ret = invoke.1.clone();
                out.push(BoundNode::Invoke(BoundInvoke {
                    callee: Callee::Method(invoke.0),
                    args,
                    fixed,
                }));
                Ok(ChainCtx::Value(ret))
            }
            ChainCtx::Value(ExprTy::Void) => Err(ResolutionError::VoidDereference),
            ChainCtx::Value(ExprTy::Null) => Err(ResolutionError::NoSuchMember {
                name: "Invoke".to_string(),
                on: "null".to_string(),
            }),
            ChainCtx::Static(ty) | ChainCtx::Value(ExprTy::Known(ty)) => {
                Err(ResolutionError::NoMatchingConstructor { on: self.registry.ty_name(ty) })
            }
        }
    }

    /// `[...]`: array-type construction on a static type, element access
    /// or an indexed property on a value.
    fn bind_subscript(
        &self,
        ctx: &ChainCtx,
        group: &Group,
        scope: &Scope,
        out: &mut Vec<BoundNode>,
    ) -> Result<ChainCtx, ResolutionError> {
        match ctx {
            ChainCtx::Static(TyRef::Named(elem)) => {
                if group.args.is_empty() {
                    // `int[]` is the rank-1 array type itself.
                    let ty = TyRef::Array(ArrayTy { elem: *elem, rank: 1 });
                    out.push(BoundNode::TypeRef(ty));
                    return Ok(ChainCtx::Static(ty));
                }
                let lengths = self.bind_args(&group.args, scope)?;
                let int = TyRef::Named(prim::I32);
                for len in &lengths {
                    if !self.converts(&int, &len.ty) {
                        return Err(ResolutionError::NoMatchingConstructor {
                            on: self
                                .registry
                                .ty_name(&TyRef::Array(ArrayTy { elem: *elem, rank: 1 })),
                        });
                    }
                }
                let rank = lengths.len() as u8;
                let ty = TyRef::Array(ArrayTy { elem: *elem, rank });
                out.push(BoundNode::ArrayNew { elem: *elem, lengths });
                Ok(ChainCtx::Value(ExprTy::Known(ty)))
            }
            ChainCtx::Static(ty @ TyRef::Array(_)) => {
                Err(ResolutionError::NoMatchingIndexer { on: self.registry.ty_name(ty) })
            }
            ChainCtx::Value(ExprTy::Known(ty @ TyRef::Array(arr))) => {
                let indices = self.bind_args(&group.args, scope)?;
                let int = TyRef::Named(prim::I32);
                let compatible = indices.len() == arr.rank as usize
                    && indices.iter().all(|ix| self.converts(&int, &ix.ty));
                if !compatible {
                    return Err(ResolutionError::NoMatchingIndexer {
                        on: self.registry.ty_name(ty),
                    });
                }
                out.push(BoundNode::ArrayGet { indices });
                Ok(ChainCtx::Value(ExprTy::Known(TyRef::Named(arr.elem))))
            }
            ChainCtx::Value(ExprTy::Known(TyRef::Named(id))) => {
                let indices = self.bind_args(&group.args, scope)?;
                let Some((member, ty)) = self.find_indexer(*id, &indices, IndexerSide::Get) else {
                    return Err(ResolutionError::NoMatchingIndexer {
                        on: self.registry.get(*id).full_name(),
                    });
                };
                out.push(BoundNode::IndexerGet { member, indices });
                Ok(ChainCtx::Value(ExprTy::Known(ty)))
            }
            ChainCtx::Value(ExprTy::Null) => {
                Err(ResolutionError::NoMatchingIndexer { on: "null".to_string() })
            }
            ChainCtx::Value(ExprTy::Void) => Err(ResolutionError::VoidDereference),
        }
    }

    // ── Assignment ───────────────────────────────────────────────────────

    fn bind_assignment(
        &self,
        assign: &Assignment,
        scope: &mut Scope,
    ) -> Result<BoundAssign, ResolutionError> {
        match &assign.target {
            AssignTarget::Variable(token) => {
                let value = self.bind_expr(&assign.value, scope)?;
                let name = token.text.trim_start_matches('$').to_string();
                let ty = match &value.ty {
                    ExprTy::Known(ty) => *ty,
                    ExprTy::Null => TyRef::Named(prim::OBJECT),
                    ExprTy::Void => {
                        return Err(ResolutionError::CannotAssign {
                            name: token.text.clone(),
                            on: "void".to_string(),
                        });
                    }
                };
                scope.declare(&name, ty);
                Ok(BoundAssign::Variable { name, ty, value })
            }
            AssignTarget::Member { target, member } => {
                if target.is_empty() {
                    return Err(ResolutionError::UnresolvedRoot(member.text.clone()));
                }
                let (nodes, ctx) = self.bind_chain(&target.nodes, scope)?;
                let target = BoundExpr { nodes, ty: ctx.ty() };
                let value = self.bind_expr(&assign.value, scope)?;
                self.bind_member_set(&ctx, &member.text, target, value)
            }
            AssignTarget::Index { target, indices } => {
                let (nodes, ctx) = self.bind_chain(&target.nodes, scope)?;
                let target = BoundExpr { nodes, ty: ctx.ty() };
                let indices = self.bind_args(indices, scope)?;
                let value = self.bind_expr(&assign.value, scope)?;
                self.bind_index_set(&ctx, target, indices, value)
            }
        }
    }

    fn bind_member_set(
        &self,
        ctx: &ChainCtx,
        name: &str,
        target: BoundExpr,
        value: BoundExpr,
    ) -> Result<BoundAssign, ResolutionError> {
        let cannot = |on: String| ResolutionError::CannotAssign { name: name.to_string(), on };
        let (id, want_static) = match ctx {
            ChainCtx::Static(TyRef::Named(id)) => (*id, true),
            ChainCtx::Value(ExprTy::Known(TyRef::Named(id))) => (*id, false),
            ChainCtx::Static(ty) | ChainCtx::Value(ExprTy::Known(ty)) => {
                return Err(cannot(self.registry.ty_name(ty)));
            }
            ChainCtx::Value(ExprTy::Null) => return Err(cannot("null".to_string())),
            ChainCtx::Value(ExprTy::Void) => return Err(ResolutionError::VoidDereference),
        };
        let on = self.registry.get(id).full_name();

        for owner in self.registry.base_chain(id) {
            let desc = self.registry.get(owner);
            for (index, field) in desc.fields.iter().enumerate() {
                if field.name != name
                    || field.is_static != want_static
                    || !self.visible(field.is_public)
                {
                    continue;
                }
                if field.set.is_none() || !self.converts(&field.ty, &value.ty) {
                    return Err(cannot(on));
                }
                return Ok(BoundAssign::Field {
                    target,
                    member: MemberRef { owner, index },
                    value,
                });
            }
            for (index, prop) in desc.properties.iter().enumerate() {
                if prop.name != name
                    || prop.is_static != want_static
                    || !self.visible(prop.is_public)
                {
                    continue;
                }
                if prop.set.is_none() || !self.converts(&prop.ty, &value.ty) {
                    return Err(cannot(on));
                }
                return Ok(BoundAssign::Property {
                    target,
                    member: MemberRef { owner, index },
                    value,
                });
            }
        }
        Err(cannot(on))
    }

    fn bind_index_set(
        &self,
        ctx: &ChainCtx,
        target: BoundExpr,
        indices: Vec<BoundExpr>,
        value: BoundExpr,
    ) -> Result<BoundAssign, ResolutionError> {
        let cannot = |on: String| ResolutionError::CannotAssign { name: "[]".to_string(), on };
        match ctx {
            ChainCtx::Value(ExprTy::Known(ty @ TyRef::Array(arr))) => {
                let int = TyRef::Named(prim::I32);
                let compatible = indices.len() == arr.rank as usize
                    && indices.iter().all(|ix| self.converts(&int, &ix.ty));
                if !compatible {
                    return Err(ResolutionError::NoMatchingIndexer {
                        on: self.registry.ty_name(ty),
                    });
                }
                if !self.converts(&TyRef::Named(arr.elem), &value.ty) {
                    return Err(cannot(self.registry.ty_name(ty)));
                }
                Ok(BoundAssign::ArraySet { target, indices, value })
            }
            ChainCtx::Value(ExprTy::Known(TyRef::Named(id))) => {
                let on = self.registry.get(*id).full_name();
                let Some((member, ty)) = self.find_indexer(*id, &indices, IndexerSide::Set) else {
                    return Err(ResolutionError::NoMatchingIndexer { on });
                };
                if !self.converts(&ty, &value.ty) {
                    return Err(cannot(on));
                }
                Ok(BoundAssign::IndexerSet { target, member, indices, value })
            }
            ChainCtx::Value(ExprTy::Null) => Err(cannot("null".to_string())),
            ChainCtx::Value(ExprTy::Void) => Err(ResolutionError::VoidDereference),
            ChainCtx::Static(ty) => Err(cannot(self.registry.ty_name(ty))),
        }
    }

    // ── Probes ───────────────────────────────────────────────────────────

    fn bind_args(
        &self,
        args: &[Expr],
        scope: &Scope,
    ) -> Result<Vec<BoundExpr>, ResolutionError> {
        args.iter()
            .map(|arg| {
                let (nodes, ctx) = self.bind_chain(&arg.nodes, scope)?;
                Ok(BoundExpr { nodes, ty: ctx.ty() })
            })
            .collect()
    }

    fn converts(&self, target: &TyRef, source: &ExprTy) -> bool {
        match source {
            ExprTy::Known(ty) => self.registry.can_convert(target, Some(ty)),
            ExprTy::Null => self.registry.can_convert(target, None),
            ExprTy::Void => false,
        }
    }

    /// First-fit compatibility in declaration order: exact parameter count
    /// with convertible arguments, or a trailing variadic parameter whose
    /// element type accepts the extra arguments. Returns the number of
    /// arguments bound to fixed parameters.
    fn args_compatible(&self, params: &[Param], args: &[BoundExpr]) -> Option<usize> {
        if params.len() == args.len() {
            let exact = params
                .iter()
                .zip(args)
                .all(|(param, arg)| self.converts(&param.ty, &arg.ty));
            if exact {
                return Some(args.len());
            }
        }
        let last = params.last()?;
        let elem = last.variadic_elem()?;
        let fixed = params.len() - 1;
        if args.len() < fixed {
            return None;
        }
        let leading_ok = params[..fixed]
            .iter()
            .zip(args)
            .all(|(param, arg)| self.converts(&param.ty, &arg.ty));
        let elem_ty = TyRef::Named(elem);
        let trailing_ok = args[fixed..].iter().all(|arg| self.converts(&elem_ty, &arg.ty));
        (leading_ok && trailing_ok).then_some(fixed)
    }

    /// First argument-compatible declared constructor; falls back to the
    /// implicit zero-argument construction of a value type.
    fn find_ctor(&self, id: TypeId, args: &[BoundExpr]) -> Option<(Option<usize>, usize)> {
        let desc = self.registry.get(id);
        for (index, ctor) in desc.ctors.iter().enumerate() {
            if !self.visible(ctor.is_public) {
                continue;
            }
            if let Some(fixed) = self.args_compatible(&ctor.params, args) {
                return Some((Some(index), fixed));
            }
        }
        if args.is_empty() && desc.kind == TypeKind::Struct {
            return Some((None, 0));
        }
        None
    }

    fn find_delegate_invoke(
        &self,
        delegate: TypeId,
        args: &[BoundExpr],
    ) -> Option<((MemberRef, ExprTy), usize)> {
        for owner in self.registry.base_chain(delegate) {
            let desc = self.registry.get(owner);
            for (index, method) in desc.methods.iter().enumerate() {
                if method.name != "Invoke" || method.is_static || !self.visible(method.is_public)
                {
                    continue;
                }
                if let Some(fixed) = self.args_compatible(&method.params, args) {
                    let ret = match &method.ret {
                        Some(ty) => ExprTy::Known(*ty),
                        None => ExprTy::Void,
                    };
                    return Some(((MemberRef { owner, index }, ret), fixed));
                }
            }
        }
        None
    }

    fn find_indexer(
        &self,
        id: TypeId,
        indices: &[BoundExpr],
        side: IndexerSide,
    ) -> Option<(MemberRef, TyRef)> {
        for owner in self.registry.base_chain(id) {
            let desc = self.registry.get(owner);
            for (index, indexer) in desc.indexers.iter().enumerate() {
                if !self.visible(indexer.is_public) {
                    continue;
                }
                let accessor_ok = match side {
                    IndexerSide::Get => indexer.get.is_some(),
                    IndexerSide::Set => indexer.set.is_some(),
                };
                if !accessor_ok || indexer.params.len() != indices.len() {
                    continue;
                }
                let compatible = indexer
                    .params
                    .iter()
                    .zip(indices)
                    .all(|(param, ix)| self.converts(&param.ty, &ix.ty));
                if compatible {
                    return Some((MemberRef { owner, index }, indexer.ty));
                }
            }
        }
        None
    }

    fn bind_global(
        &self,
        name: &str,
        group: &Group,
        scope: &Scope,
        out: &mut Vec<BoundNode>,
    ) -> Result<ChainCtx, ResolutionError> {
        let args = self.bind_args(&group.args, scope)?;
        for (index, global) in self.globals.iter().enumerate() {
            if global.name != name {
                continue;
            }
            if let Some(fixed) = self.args_compatible(&global.params, &args) {
                let ret = match &global.ret {
                    Some(ty) => ExprTy::Known(*ty),
                    None => ExprTy::Void,
                };
                out.push(BoundNode::Invoke(BoundInvoke {
                    callee: Callee::Global(index),
                    args,
                    fixed,
                }));
                return Ok(ChainCtx::Value(ret));
            }
        }
        Err(ResolutionError::NoMatchingOverload {
            name: name.to_string(),
            on: "globals".to_string(),
        })
    }
}

#[derive(Clone, Copy)]
enum IndexerSide {
    Get,
    Set,
}

/// The identifier-shaped constant keywords.
pub fn is_keyword_literal(text: &str) -> bool {
    matches!(text, "true" | "false" | "null")
}

/// Parse a numeric or keyword literal token into a value.
///
/// Integers bind as `int` when they fit, `long` otherwise; an `L` suffix
/// forces `long`, `f`/`F` forces `float`, and a decimal point defaults to
/// `double`.
pub fn parse_literal(text: &str) -> Option<Value> {
    match text {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        _ => {}
    }
    if let Some(rest) = text.strip_suffix(['f', 'F']) {
        return rest.parse::<f32>().ok().map(Value::F32);
    }
    if let Some(rest) = text.strip_suffix(['L', 'l']) {
        return rest.parse::<i64>().ok().map(Value::I64);
    }
    if let Some(rest) = text.strip_suffix(['d', 'D']) {
        return rest.parse::<f64>().ok().map(Value::F64);
    }
    if text.contains('.') {
        return text.parse::<f64>().ok().map(Value::F64);
    }
    if let Ok(v) = text.parse::<i32>() {
        return Some(Value::I32(v));
    }
    text.parse::<i64>().ok().map(Value::I64)
}
