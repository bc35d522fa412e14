//! The suggestion engine proper.
//!
//! Runs on whichever thread owns the [`SuggestContext`] snapshot: the
//! worker for background builds, or the caller directly for in-process
//! completers. Everything here is read-only over the published catalog
//! and registry.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use scry_catalog::{Catalog, EntryKind};
use scry_common::token::{Token, TokenKind};
use scry_common::value::{prim, TyRef, TypeId};
use scry_parser::{build, Expr, ExprNode, Group, GroupKind};
use scry_registry::{GlobalFn, Param, Registry, TypeKind};
use scry_resolve::{Binder, ChainCtx, ExprTy, Scope};

use crate::{Candidate, CandidateKind, SuggestMode, Suggestions};

/// Read-only snapshot a suggestion build runs against.
///
/// Cloning is cheap (shared `Arc`s); the variable scope is copied so the
/// worker never races the interactive thread.
#[derive(Clone)]
pub struct SuggestContext {
    pub registry: Arc<Registry>,
    pub catalog: Arc<Catalog>,
    pub usings: Vec<String>,
    pub safe_mode: bool,
    pub globals: Arc<Vec<GlobalFn>>,
    pub scope: Scope,
}

/// Compute suggestions for `input` with the caret at byte offset `cursor`.
pub fn suggest(ctx: &SuggestContext, input: &str, cursor: usize) -> Suggestions {
    let mut cut = cursor.min(input.len());
    while cut > 0 && !input.is_char_boundary(cut) {
        cut -= 1;
    }
    let truncated = &input[..cut];
    if truncated.trim().is_empty() {
        return Suggestions::none();
    }

    // Lenient reparse: lex and structural errors are ignored, the partial
    // tree is what matters.
    let lexed = scry_lexer::tokenize(truncated);
    let built = build(&lexed.tokens);
    let Some(last) = last_real_token(&lexed.tokens) else {
        return Suggestions::none();
    };
    let Some(statement) = built.command.statements.last() else {
        return Suggestions::none();
    };

    let binder = Binder::new(
        &ctx.registry,
        &ctx.catalog,
        &ctx.usings,
        ctx.safe_mode,
        ctx.globals.as_slice(),
    );
    // Variables declared by earlier statements on the same line are
    // visible while typing the last one; binding failures along the way
    // just leave the scope as-is.
    let mut scope = ctx.scope.clone();
    for stmt in &built.command.statements[..built.command.statements.len() - 1] {
        let _ = binder.bind_expr(stmt, &mut scope);
    }
    let engine = Engine { ctx, binder, scope };

    let at_cursor = last.span.end as usize == cut;
    let ident_at_cursor =
        at_cursor && last.kind == TokenKind::Ident && !last.is_literal_shaped();
    let dot_at_cursor = at_cursor && last.kind == TokenKind::Dot;

    if ident_at_cursor || dot_at_cursor {
        let (chain, at_root) = active_chain(statement);
        if let Some(chain) = chain {
            let (prefix, anchor): (&str, &[ExprNode]) = if ident_at_cursor {
                match chain.nodes.split_last() {
                    Some((ExprNode::Atom(token), rest)) if token.text == last.text => {
                        (last.text.as_str(), rest)
                    }
                    _ => ("", chain.nodes.as_slice()),
                }
            } else {
                ("", chain.nodes.as_slice())
            };
            return engine.completions(prefix, anchor, at_root && anchor.is_empty());
        }
    }

    if let Some((parent, group)) = innermost_open_group(statement) {
        return engine.overload_hints(parent, group, last);
    }
    Suggestions::none()
}

/// Skip the implicit zero-width terminator the lexer appends.
fn last_real_token(tokens: &[Token]) -> Option<&Token> {
    tokens
        .iter()
        .rev()
        .find(|t| !(t.kind == TokenKind::Semicolon && t.span.len() == 0))
}

/// Descend to the innermost in-progress chain: through an assignment's
/// value and through the trailing argument of every unclosed group.
/// Returns whether the chain is still the bare statement root.
fn active_chain(expr: &Expr) -> (Option<&Expr>, bool) {
    let mut cur = expr;
    let mut at_root = true;
    loop {
        match cur.nodes.last() {
            Some(ExprNode::Assign(assign)) => {
                cur = &assign.value;
                at_root = false;
            }
            Some(ExprNode::Group(group)) if !group.closed => {
                at_root = false;
                match group.args.last() {
                    Some(arg) => cur = arg,
                    None => return (None, at_root),
                }
            }
            Some(_) => return (Some(cur), at_root),
            None => return (None, at_root),
        }
    }
}

/// The deepest unclosed group and the chain that contains it.
fn innermost_open_group(expr: &Expr) -> Option<(&Expr, &Group)> {
    let mut cur = expr;
    let mut found = None;
    loop {
        match cur.nodes.last() {
            Some(ExprNode::Assign(assign)) => cur = &assign.value,
            Some(ExprNode::Group(group)) if !group.closed => {
                found = Some((cur, group));
                match group.args.last() {
                    Some(arg) => cur = arg,
                    None => break,
                }
            }
            _ => break,
        }
    }
    found
}

/// Priority-ordered, deduplicated accumulator. The first source to claim
/// a display name wins; the final list sorts lexicographically.
struct CandidateSet<'a> {
    prefix: &'a str,
    seen: FxHashSet<String>,
    out: Vec<Candidate>,
}

impl<'a> CandidateSet<'a> {
    fn new(prefix: &'a str) -> Self {
        Self { prefix, seen: FxHashSet::default(), out: Vec::new() }
    }

    fn push(&mut self, display: impl Into<String>, kind: CandidateKind) {
        let display = display.into();
        let matched = display
            .get(..self.prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(self.prefix));
        if matched && self.seen.insert(display.clone()) {
            self.out.push(Candidate { display, kind });
        }
    }

    fn finish(mut self) -> Vec<Candidate> {
        self.out.sort_by(|a, b| a.display.cmp(&b.display));
        self.out
    }
}

struct Engine<'a> {
    ctx: &'a SuggestContext,
    binder: Binder<'a>,
    scope: Scope,
}

impl Engine<'_> {
    fn visible(&self, is_public: bool) -> bool {
        is_public || !self.ctx.safe_mode
    }

    fn converts(&self, target: &TyRef, source: &ExprTy) -> bool {
        match source {
            ExprTy::Known(ty) => self.ctx.registry.can_convert(target, Some(ty)),
            ExprTy::Null => self.ctx.registry.can_convert(target, None),
            ExprTy::Void => false,
        }
    }

    // ── Mode (a): identifier completion ─────────────────────────────────

    fn completions(&self, prefix: &str, anchor: &[ExprNode], at_root: bool) -> Suggestions {
        let mut cands = CandidateSet::new(prefix);
        if anchor.is_empty() {
            self.root_candidates(&mut cands, at_root);
        } else if let Some(ctx) = self.binder.chain_context(anchor, &self.scope) {
            self.member_candidates(&mut cands, &ctx);
        } else {
            self.namespace_candidates(&mut cands, anchor);
        }
        Suggestions {
            mode: SuggestMode::Completions,
            candidates: cands.finish(),
            match_len: prefix.len(),
            active_param: None,
        }
    }

    fn root_candidates(&self, cands: &mut CandidateSet<'_>, at_root: bool) {
        self.catalog_children(cands, "");
        for using in &self.ctx.usings {
            self.catalog_children(cands, using);
        }
        for name in self.scope.names() {
            cands.push(format!("${name}"), CandidateKind::Variable);
        }
        if at_root {
            for keyword in ["true", "false", "null"] {
                cands.push(keyword, CandidateKind::Keyword);
            }
            for global in self.ctx.globals.iter() {
                cands.push(global.name.clone(), CandidateKind::Method);
            }
        }
    }

    fn catalog_children(&self, cands: &mut CandidateSet<'_>, dotted: &str) {
        for (name, kind) in self.ctx.catalog.children(dotted) {
            let kind = match kind {
                EntryKind::Namespace => CandidateKind::Namespace,
                EntryKind::Type(_) => CandidateKind::Type,
            };
            cands.push(name, kind);
        }
    }

    fn member_candidates(&self, cands: &mut CandidateSet<'_>, ctx: &ChainCtx) {
        match ctx {
            ChainCtx::Static(TyRef::Named(id)) => {
                self.type_members(cands, *id, true);
                // Nested types live under the type's node in the trie.
                self.catalog_children(cands, &self.ctx.registry.get(*id).full_name());
            }
            ChainCtx::Value(ExprTy::Known(TyRef::Named(id))) => {
                self.type_members(cands, *id, false);
            }
            ChainCtx::Value(ExprTy::Known(TyRef::Array(_))) => {
                cands.push("Length", CandidateKind::Member);
            }
            _ => {}
        }
    }

    fn type_members(&self, cands: &mut CandidateSet<'_>, id: TypeId, want_static: bool) {
        for owner in self.ctx.registry.base_chain(id) {
            let desc = self.ctx.registry.get(owner);
            for field in &desc.fields {
                if field.is_static == want_static && self.visible(field.is_public) {
                    cands.push(field.name.clone(), CandidateKind::Member);
                }
            }
            for prop in &desc.properties {
                if prop.is_static == want_static
                    && prop.get.is_some()
                    && self.visible(prop.is_public)
                {
                    cands.push(prop.name.clone(), CandidateKind::Member);
                }
            }
            for method in &desc.methods {
                if method.is_static == want_static && self.visible(method.is_public) {
                    cands.push(method.name.clone(), CandidateKind::Method);
                }
            }
        }
    }

    /// Anchor is a dotted namespace prefix rather than a resolved type.
    fn namespace_candidates(&self, cands: &mut CandidateSet<'_>, anchor: &[ExprNode]) {
        let mut dotted = String::new();
        for node in anchor {
            match node {
                ExprNode::Atom(token)
                    if token.kind == TokenKind::Ident
                        && !token.is_variable()
                        && !token.is_literal_shaped() =>
                {
                    if !dotted.is_empty() {
                        dotted.push('.');
                    }
                    dotted.push_str(&token.text);
                }
                _ => return,
            }
        }
        // Bare prefix first, then each using-namespace, mirroring the
        // resolver's search order; the first prefix that exists wins.
        let qualified = self.ctx.usings.iter().map(|u| format!("{u}.{dotted}"));
        for path in std::iter::once(dotted.clone()).chain(qualified) {
            let children = self.ctx.catalog.children(&path);
            if !children.is_empty() {
                self.catalog_children(cands, &path);
                return;
            }
        }
    }

    // ── Mode (b): overload hints ────────────────────────────────────────

    fn overload_hints(&self, parent: &Expr, group: &Group, last: &Token) -> Suggestions {
        let before = &parent.nodes[..parent.nodes.len().saturating_sub(1)];
        let after_separator = matches!(
            last.kind,
            TokenKind::Comma | TokenKind::LParen | TokenKind::LBracket
        );
        let active_param = if after_separator {
            group.args.len()
        } else {
            group.args.len().saturating_sub(1)
        };
        // Only fully typed arguments constrain the overload set; the
        // argument still being typed does not.
        let complete = if after_separator {
            group.args.len()
        } else {
            group.args.len().saturating_sub(1)
        };
        let arg_tys: Vec<Option<ExprTy>> = group.args[..complete]
            .iter()
            .map(|arg| {
                self.binder
                    .chain_context(&arg.nodes, &self.scope)
                    .map(|ctx| ctx_result_ty(&ctx))
            })
            .collect();
        // Minimum argument count the call has committed to: a trailing
        // comma promises one more, a bare open bracket promises none yet.
        let min_args = match last.kind {
            TokenKind::Comma => group.args.len() + 1,
            TokenKind::LParen | TokenKind::LBracket => 0,
            _ => group.args.len(),
        };

        let mut cands = CandidateSet::new("");
        match group.kind {
            GroupKind::Invoke => self.invoke_overloads(&mut cands, before, &arg_tys, min_args),
            GroupKind::Subscript => self.indexer_overloads(&mut cands, before, &arg_tys, min_args),
        }
        Suggestions {
            mode: SuggestMode::OverloadHints,
            candidates: cands.finish(),
            match_len: 0,
            active_param: Some(active_param),
        }
    }

    fn invoke_overloads(
        &self,
        cands: &mut CandidateSet<'_>,
        before: &[ExprNode],
        arg_tys: &[Option<ExprTy>],
        min_args: usize,
    ) {
        let Some((last, receiver)) = before.split_last() else {
            return;
        };
        match last {
            ExprNode::Atom(token)
                if token.kind == TokenKind::Ident
                    && !token.is_variable()
                    && !token.is_literal_shaped() =>
            {
                let name = token.text.as_str();
                if receiver.is_empty() {
                    for global in self.ctx.globals.iter() {
                        if global.name == name
                            && self.compatible(&global.params, arg_tys, min_args)
                        {
                            cands.push(
                                self.signature(&global.name, &global.params, global.ret.as_ref()),
                                CandidateKind::Overload,
                            );
                        }
                    }
                }
                if !receiver.is_empty() {
                    if let Some(ctx) = self.binder.chain_context(receiver, &self.scope) {
                        self.member_overloads(cands, &ctx, name, arg_tys, min_args);
                        return;
                    }
                }
                // The whole prefix may be a dotted type path: its
                // constructors are the callable.
                if let Some(id) = self.resolve_atom_path(before) {
                    self.ctor_overloads(cands, id, arg_tys, min_args);
                }
            }
            _ => {
                // Direct invoke: a constructor on a type reference, or a
                // delegate value.
                match self.binder.chain_context(before, &self.scope) {
                    Some(ChainCtx::Static(TyRef::Named(id))) => {
                        self.ctor_overloads(cands, id, arg_tys, min_args);
                    }
                    Some(ChainCtx::Value(ExprTy::Known(TyRef::Named(id))))
                        if self.ctx.registry.get(id).kind == TypeKind::Delegate =>
                    {
                        self.method_overloads_named(cands, id, "Invoke", false, arg_tys, min_args);
                    }
                    _ => {}
                }
            }
        }
    }

    fn member_overloads(
        &self,
        cands: &mut CandidateSet<'_>,
        ctx: &ChainCtx,
        name: &str,
        arg_tys: &[Option<ExprTy>],
        min_args: usize,
    ) {
        let (id, want_static) = match ctx {
            ChainCtx::Static(TyRef::Named(id)) => (*id, true),
            ChainCtx::Value(ExprTy::Known(TyRef::Named(id))) => (*id, false),
            _ => return,
        };
        self.method_overloads_named(cands, id, name, want_static, arg_tys, min_args);
        for owner in self.ctx.registry.base_chain(id) {
            let desc = self.ctx.registry.get(owner);
            // Nested-type constructors answer to the member name too.
            if want_static {
                for &nested in &desc.nested {
                    let nested_desc = self.ctx.registry.get(nested);
                    if nested_desc.name == name && self.visible(nested_desc.is_public) {
                        self.ctor_overloads(cands, nested, arg_tys, min_args);
                    }
                }
            }
            // Delegate-typed fields surface their Invoke signature under
            // the field's name.
            for field in &desc.fields {
                if field.name != name
                    || field.is_static != want_static
                    || !self.visible(field.is_public)
                {
                    continue;
                }
                if let TyRef::Named(delegate) = field.ty {
                    if self.ctx.registry.get(delegate).kind == TypeKind::Delegate {
                        for owner in self.ctx.registry.base_chain(delegate) {
                            for method in &self.ctx.registry.get(owner).methods {
                                if method.name == "Invoke"
                                    && self.compatible(&method.params, arg_tys, min_args)
                                {
                                    cands.push(
                                        self.signature(name, &method.params, method.ret.as_ref()),
                                        CandidateKind::Overload,
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn method_overloads_named(
        &self,
        cands: &mut CandidateSet<'_>,
        id: TypeId,
        name: &str,
        want_static: bool,
        arg_tys: &[Option<ExprTy>],
        min_args: usize,
    ) {
        for owner in self.ctx.registry.base_chain(id) {
            for method in &self.ctx.registry.get(owner).methods {
                if method.name == name
                    && method.is_static == want_static
                    && self.visible(method.is_public)
                    && self.compatible(&method.params, arg_tys, min_args)
                {
                    cands.push(
                        self.signature(name, &method.params, method.ret.as_ref()),
                        CandidateKind::Overload,
                    );
                }
            }
        }
    }

    fn ctor_overloads(
        &self,
        cands: &mut CandidateSet<'_>,
        id: TypeId,
        arg_tys: &[Option<ExprTy>],
        min_args: usize,
    ) {
        let desc = self.ctx.registry.get(id);
        for ctor in &desc.ctors {
            if self.visible(ctor.is_public) && self.compatible(&ctor.params, arg_tys, min_args) {
                cands.push(
                    self.signature(&desc.name, &ctor.params, None),
                    CandidateKind::Overload,
                );
            }
        }
        if desc.ctors.is_empty() && desc.kind == TypeKind::Struct {
            cands.push(format!("{}()", desc.name), CandidateKind::Overload);
        }
    }

    fn indexer_overloads(
        &self,
        cands: &mut CandidateSet<'_>,
        before: &[ExprNode],
        arg_tys: &[Option<ExprTy>],
        min_args: usize,
    ) {
        let Some(ChainCtx::Value(ExprTy::Known(ty))) =
            self.binder.chain_context(before, &self.scope)
        else {
            return;
        };
        match ty {
            TyRef::Named(id) => {
                for owner in self.ctx.registry.base_chain(id) {
                    let desc = self.ctx.registry.get(owner);
                    for indexer in &desc.indexers {
                        if self.visible(indexer.is_public)
                            && self.compatible(&indexer.params, arg_tys, min_args)
                        {
                            let params = self.render_params(&indexer.params);
                            cands.push(
                                format!("[{params}] -> {}", self.ctx.registry.ty_name(&indexer.ty)),
                                CandidateKind::Overload,
                            );
                        }
                    }
                }
            }
            TyRef::Array(arr) => {
                let indices = vec!["index: int"; arr.rank as usize].join(", ");
                let elem = self.ctx.registry.ty_name(&TyRef::Named(arr.elem));
                cands.push(format!("[{indices}] -> {elem}"), CandidateKind::Overload);
            }
        }
    }

    // ── Probes and rendering ────────────────────────────────────────────

    fn resolve_atom_path(&self, nodes: &[ExprNode]) -> Option<TypeId> {
        let mut dotted = String::new();
        for node in nodes {
            match node {
                ExprNode::Atom(token)
                    if token.kind == TokenKind::Ident
                        && !token.is_variable()
                        && !token.is_literal_shaped() =>
                {
                    if !dotted.is_empty() {
                        dotted.push('.');
                    }
                    dotted.push_str(&token.text);
                }
                _ => return None,
            }
        }
        self.ctx.catalog.resolve(&dotted, &self.ctx.usings)
    }

    /// Whether the overload could still accept the arguments typed so far.
    /// Unresolvable arguments are given the benefit of the doubt.
    fn compatible(&self, params: &[Param], arg_tys: &[Option<ExprTy>], min_args: usize) -> bool {
        let variadic = params.last().is_some_and(|p| p.variadic);
        if !variadic && min_args > params.len() {
            return false;
        }
        let fixed = params.len() - usize::from(variadic);
        for (i, ty) in arg_tys.iter().enumerate() {
            let Some(ty) = ty else { continue };
            if i < fixed {
                if !self.converts(&params[i].ty, ty) {
                    return false;
                }
            } else {
                let Some(last) = params.last() else { return false };
                let elem_ok = last
                    .variadic_elem()
                    .is_some_and(|elem| self.converts(&TyRef::Named(elem), ty));
                if !elem_ok && !self.converts(&last.ty, ty) {
                    return false;
                }
            }
        }
        true
    }

    fn render_params(&self, params: &[Param]) -> String {
        let rendered: Vec<String> = params
            .iter()
            .map(|param| match param.variadic_elem() {
                Some(elem) => format!(
                    "{}: {}...",
                    param.name,
                    self.ctx.registry.ty_name(&TyRef::Named(elem))
                ),
                None => format!("{}: {}", param.name, self.ctx.registry.ty_name(&param.ty)),
            })
            .collect();
        rendered.join(", ")
    }

    fn signature(&self, name: &str, params: &[Param], ret: Option<&TyRef>) -> String {
        let params = self.render_params(params);
        match ret {
            Some(ty) => format!("{name}({params}) -> {}", self.ctx.registry.ty_name(ty)),
            None => format!("{name}({params})"),
        }
    }
}

fn ctx_result_ty(ctx: &ChainCtx) -> ExprTy {
    match ctx {
        ChainCtx::Static(_) => ExprTy::Known(TyRef::Named(prim::OBJECT)),
        ChainCtx::Value(ty) => ty.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use scry_catalog::{build as build_catalog, CancelToken};
    use scry_common::settings::Settings;
    use scry_common::value::Value;
    use scry_registry::demo::build_demo;

    fn context(safe_mode: bool) -> SuggestContext {
        let demo = build_demo();
        let settings = Settings {
            safe_mode,
            using_namespaces: vec!["Demo".to_string(), "Game".to_string()],
            ..Settings::default()
        };
        let catalog = build_catalog(&demo.registry, &settings, &CancelToken::new())
            .expect("uncancelled build completes");
        let mut scope = Scope::new();
        scope.declare("player", TyRef::Named(demo.player));
        SuggestContext {
            registry: Arc::new(demo.registry),
            catalog: Arc::new(catalog),
            usings: settings.using_namespaces,
            safe_mode,
            globals: Arc::new(vec![GlobalFn {
                name: "typeof".to_string(),
                params: vec![Param::new("value", TyRef::Named(prim::OBJECT))],
                ret: Some(TyRef::Named(prim::STRING)),
                invoke: Arc::new(|_, _| Ok(Value::Str(String::new()))),
            }]),
            scope,
        }
    }

    fn displays(s: &Suggestions) -> Vec<&str> {
        s.candidates.iter().map(|c| c.display.as_str()).collect()
    }

    fn at_end(ctx: &SuggestContext, input: &str) -> Suggestions {
        suggest(ctx, input, input.len())
    }

    #[test]
    fn empty_input_offers_nothing() {
        let ctx = context(true);
        assert_eq!(at_end(&ctx, "").mode, SuggestMode::None);
        assert_eq!(at_end(&ctx, "   ").mode, SuggestMode::None);
    }

    #[test]
    fn namespace_prefix_completes() {
        let ctx = context(true);
        let s = at_end(&ctx, "Ga");
        assert_eq!(s.mode, SuggestMode::Completions);
        assert_eq!(s.match_len, 2);
        assert!(displays(&s).contains(&"Game"));
        assert!(!displays(&s).contains(&"Demo"));
    }

    #[test]
    fn dotted_namespace_lists_children() {
        let ctx = context(true);
        let s = at_end(&ctx, "Game.Pl");
        assert!(displays(&s).contains(&"Player"));
        assert!(!displays(&s).contains(&"Color"));
        // With an empty partial segment after the dot, everything under
        // the namespace shows.
        let s = at_end(&ctx, "Game.");
        assert!(displays(&s).contains(&"Color"));
        assert!(displays(&s).contains(&"Inventory"));
    }

    #[test]
    fn safe_mode_hides_secret_type() {
        let open = context(false);
        assert!(displays(&at_end(&open, "Game.")).contains(&"Secret"));
        let safe = context(true);
        assert!(!displays(&at_end(&safe, "Game.")).contains(&"Secret"));
    }

    #[test]
    fn static_anchor_lists_statics_and_nested() {
        let ctx = context(true);
        let s = at_end(&ctx, "Player.");
        let names = displays(&s);
        assert!(names.contains(&"Default"));
        assert!(names.contains(&"Stats"));
        // Instance members stay out of static context.
        assert!(!names.contains(&"Heal"));
    }

    #[test]
    fn instance_anchor_lists_instance_members() {
        let ctx = context(true);
        let s = at_end(&ctx, "Player.Default().");
        let names = displays(&s);
        for expected in ["Name", "Health", "Heal", "Say", "Kind", "OnHit", "Id"] {
            assert!(names.contains(&expected), "missing {expected} in {names:?}");
        }
        assert!(!names.contains(&"Cheats"));
        assert!(!names.contains(&"Default"));
    }

    #[test]
    fn variables_complete_at_root() {
        let ctx = context(true);
        let s = at_end(&ctx, "$pl");
        assert!(displays(&s).contains(&"$player"));
    }

    #[test]
    fn earlier_statements_declare_variables_for_later_ones() {
        let ctx = context(true);
        let s = at_end(&ctx, "$p = Player(\"ada\"); $p.");
        let names = displays(&s);
        assert!(names.contains(&"Name"), "missing Name in {names:?}");
        assert!(names.contains(&"Heal"));
    }

    #[test]
    fn keywords_only_at_command_root() {
        let ctx = context(true);
        assert!(displays(&at_end(&ctx, "tr")).contains(&"true"));
        assert!(displays(&at_end(&ctx, "ty")).contains(&"typeof"));
        // Inside an argument, the keyword list stays away.
        assert!(!displays(&at_end(&ctx, "Math.Abs(tr")).contains(&"true"));
    }

    #[test]
    fn candidates_are_sorted_and_deduplicated() {
        let ctx = context(true);
        let s = at_end(&ctx, "Player.Default().");
        let names = displays(&s);
        for pair in names.windows(2) {
            assert!(pair[0] < pair[1], "unsorted or duplicate: {pair:?}");
        }
    }

    #[test]
    fn open_invoke_switches_to_overload_hints() {
        let ctx = context(true);
        let s = at_end(&ctx, "Math.Clamp(1,");
        assert_eq!(s.mode, SuggestMode::OverloadHints);
        assert_eq!(s.active_param, Some(1));
        assert_eq!(s.candidates.len(), 2);
        assert!(displays(&s)
            .iter()
            .any(|d| d.contains("value: long")));
    }

    #[test]
    fn typed_arguments_filter_overloads() {
        let ctx = context(true);
        let s = at_end(&ctx, "Math.Clamp(\"oops\",");
        assert_eq!(s.mode, SuggestMode::OverloadHints);
        assert!(s.candidates.is_empty());
    }

    #[test]
    fn constructor_hints() {
        let ctx = context(true);
        let s = at_end(&ctx, "Player(");
        assert_eq!(s.active_param, Some(0));
        assert_eq!(displays(&s), vec!["Player(name: string)"]);
    }

    #[test]
    fn unresolved_anchor_still_engages_hint_mode() {
        let ctx = context(true);
        let s = at_end(&ctx, "Foo.Bar(1,2");
        assert_eq!(s.mode, SuggestMode::OverloadHints);
        assert!(s.candidates.is_empty());
    }

    #[test]
    fn variadic_signature_renders_ellipsis() {
        let ctx = context(true);
        let s = at_end(&ctx, "Math.Sum(1, 2,");
        assert_eq!(s.active_param, Some(2));
        assert_eq!(displays(&s), vec!["Sum(values: long...) -> long"]);
    }

    #[test]
    fn delegate_field_hints_show_invoke_signature() {
        let ctx = context(true);
        let s = at_end(&ctx, "$player.OnHit(3");
        assert_eq!(s.mode, SuggestMode::OverloadHints);
        assert_eq!(displays(&s), vec!["OnHit(value: long) -> long"]);
    }

    #[test]
    fn indexer_hints() {
        let ctx = context(true);
        let s = at_end(&ctx, "Inventory(3)[");
        assert_eq!(s.mode, SuggestMode::OverloadHints);
        assert_eq!(displays(&s), vec!["[index: int] -> long"]);
    }

    #[test]
    fn cursor_truncation_ignores_the_tail() {
        let ctx = context(true);
        // Caret right after "Game.Pl", with more text beyond it.
        let s = suggest(&ctx, "Game.Pl.Name", "Game.Pl".len());
        assert!(displays(&s).contains(&"Player"));
    }
}
