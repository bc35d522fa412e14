// scry-resolve -- name and overload resolution.
//
// Turns parsed token trees into bound chains against a catalog and
// registry. Resolution is first-fit: the first structurally compatible
// member in declaration order wins, with no specificity ranking.

mod bind;
mod bound;

pub use bind::{is_keyword_literal, parse_literal, Binder, ChainCtx, Scope};
pub use bound::{
    BoundAssign, BoundCommand, BoundExpr, BoundInvoke, BoundNode, Callee, ExprTy, MemberRef,
};

#[cfg(test)]
mod tests {
    use super::*;

    use scry_catalog::{build as build_catalog, Catalog, CancelToken};
    use scry_common::error::ResolutionError;
    use scry_common::settings::Settings;
    use scry_common::value::{prim, ArrayTy, TyRef, Value};
    use scry_registry::demo::{build_demo, Demo};
    use scry_registry::{GlobalFn, Param};

    struct Fixture {
        demo: Demo,
        catalog: Catalog,
        settings: Settings,
    }

    fn fixture(safe_mode: bool) -> Fixture {
        let demo = build_demo();
        let settings = Settings {
            safe_mode,
            using_namespaces: vec!["Demo".to_string(), "Game".to_string()],
            ..Settings::default()
        };
        let catalog = build_catalog(&demo.registry, &settings, &CancelToken::new())
            .expect("uncancelled build completes");
        Fixture { demo, catalog, settings }
    }

    fn bind_in(fx: &Fixture, source: &str) -> Result<BoundCommand, ResolutionError> {
        let parsed = scry_parser::parse(source);
        assert!(parsed.first_error().is_none(), "parse failed for {source:?}");
        let binder = Binder::new(
            &fx.demo.registry,
            &fx.catalog,
            &fx.settings.using_namespaces,
            fx.settings.safe_mode,
            &[],
        );
        binder.bind_command(&parsed.command, &mut Scope::new())
    }

    fn bind(source: &str) -> Result<BoundCommand, ResolutionError> {
        bind_in(&fixture(true), source)
    }

    fn last_ty(command: &BoundCommand) -> ExprTy {
        command.statements.last().expect("at least one statement").ty.clone()
    }

    #[test]
    fn literal_roots() {
        assert_eq!(
            bind("5").unwrap().statements[0].nodes,
            vec![BoundNode::Literal(Value::I32(5))]
        );
        assert_eq!(last_ty(&bind("5000000000").unwrap()), ExprTy::Known(TyRef::Named(prim::I64)));
        assert_eq!(last_ty(&bind("3.5").unwrap()), ExprTy::Known(TyRef::Named(prim::F64)));
        assert_eq!(last_ty(&bind("2.5f").unwrap()), ExprTy::Known(TyRef::Named(prim::F32)));
        assert_eq!(
            bind("\"hi\"").unwrap().statements[0].nodes,
            vec![BoundNode::Literal(Value::Str("hi".to_string()))]
        );
        assert_eq!(
            bind("true").unwrap().statements[0].nodes,
            vec![BoundNode::Literal(Value::Bool(true))]
        );
        assert_eq!(last_ty(&bind("null").unwrap()), ExprTy::Null);
    }

    #[test]
    fn progressive_prefix_finds_type_then_chains() {
        // `Game.Player` resolves as a two-segment prefix; `Stats` is a
        // nested type and `Version` a static field on it.
        let bound = bind("Game.Player.Stats.Version").unwrap();
        let nodes = &bound.statements[0].nodes;
        assert!(matches!(nodes[0], BoundNode::TypeRef(_)));
        assert!(matches!(nodes[1], BoundNode::NestedType(_)));
        assert!(matches!(nodes[2], BoundNode::FieldGet(_)));
        assert_eq!(bound.statements[0].ty, ExprTy::Known(TyRef::Named(prim::I32)));
    }

    #[test]
    fn using_namespaces_shorten_roots() {
        let bound = bind("Math.Pi").unwrap();
        assert_eq!(last_ty(&bound), ExprTy::Known(TyRef::Named(prim::F64)));
        let err = bind_in(
            &Fixture { settings: Settings::default(), ..fixture(true) },
            "Math.Pi",
        );
        // Without usings the bare name resolves nothing.
        assert!(matches!(err, Err(ResolutionError::UnresolvedRoot(_))));
    }

    #[test]
    fn first_fit_ignores_specificity() {
        let fx = fixture(true);
        // Clamp(long, long, long) is declared before Clamp(double, double,
        // double); numeric kinds interconvert, so the first one always wins.
        for source in ["Math.Clamp(5, 0, 10)", "Math.Clamp(0.5, 0.0, 1.0)"] {
            let bound = bind_in(&fx, source).unwrap();
            let BoundNode::Invoke(invoke) = &bound.statements[0].nodes[1] else {
                panic!("expected invoke");
            };
            let Callee::Method(member) = &invoke.callee else {
                panic!("expected method callee");
            };
            assert_eq!(member.owner, fx.demo.math);
            assert_eq!(member.index, 0);
            assert_eq!(bound.statements[0].ty, ExprTy::Known(TyRef::Named(prim::I64)));
        }
    }

    #[test]
    fn variadic_matches_with_any_trailing_count() {
        for (source, want_args) in [("Math.Sum(1, 2, 3)", 3), ("Math.Sum()", 0)] {
            let bound = bind(source).unwrap();
            let BoundNode::Invoke(invoke) = &bound.statements[0].nodes[1] else {
                panic!("expected invoke");
            };
            assert_eq!(invoke.args.len(), want_args);
            assert_eq!(invoke.fixed, 0);
        }
    }

    #[test]
    fn variables_thread_through_statements() {
        let bound = bind("$a = 5; $a").unwrap();
        assert_eq!(bound.statements.len(), 2);
        assert_eq!(bound.statements[0].ty, ExprTy::Void);
        assert_eq!(bound.statements[1].ty, ExprTy::Known(TyRef::Named(prim::I32)));
        assert!(matches!(
            bind("$missing"),
            Err(ResolutionError::UnknownVariable(ref name)) if name == "missing"
        ));
    }

    #[test]
    fn derived_member_shadows_base() {
        let fx = fixture(true);
        let bound = bind_in(&fx, "Player.Default().Kind").unwrap();
        let nodes = &bound.statements[0].nodes;
        let BoundNode::FieldGet(member) = &nodes[2] else {
            panic!("expected field get");
        };
        assert_eq!(member.owner, fx.demo.player);
        // A base-only member still resolves through the chain walk.
        let bound = bind_in(&fx, "Player.Default().Id").unwrap();
        let BoundNode::FieldGet(member) = &bound.statements[0].nodes[2] else {
            panic!("expected field get");
        };
        assert_eq!(member.owner, fx.demo.entity);
    }

    #[test]
    fn delegate_field_binds_as_field_plus_invoke() {
        let bound = bind("Player.Default().OnHit(7)").unwrap();
        let nodes = &bound.statements[0].nodes;
        assert!(matches!(nodes[2], BoundNode::FieldGet(_)));
        assert!(matches!(nodes[3], BoundNode::Invoke(_)));
        assert_eq!(bound.statements[0].ty, ExprTy::Known(TyRef::Named(prim::I64)));
    }

    #[test]
    fn constructors_resolve_on_type_nodes() {
        let bound = bind("Player(\"Ada\")").unwrap();
        let BoundNode::Invoke(invoke) = &bound.statements[0].nodes[1] else {
            panic!("expected invoke");
        };
        assert!(matches!(invoke.callee, Callee::Ctor { index: Some(0), .. }));

        // Value types construct with zero arguments even without a
        // declared zero-argument constructor.
        let bound = bind("Vec2()").unwrap();
        let BoundNode::Invoke(invoke) = &bound.statements[0].nodes[1] else {
            panic!("expected invoke");
        };
        assert!(matches!(invoke.callee, Callee::Ctor { index: None, .. }));

        assert!(matches!(
            bind("Player(1, 2, 3)"),
            Err(ResolutionError::NoMatchingConstructor { .. })
        ));
    }

    #[test]
    fn subscript_on_types_builds_arrays() {
        let bound = bind("int[3]").unwrap();
        assert_eq!(
            bound.statements[0].ty,
            ExprTy::Known(TyRef::Array(ArrayTy { elem: prim::I32, rank: 1 }))
        );
        let bound = bind("int[2, 3]").unwrap();
        assert_eq!(
            bound.statements[0].ty,
            ExprTy::Known(TyRef::Array(ArrayTy { elem: prim::I32, rank: 2 }))
        );
        // Zero subscript arguments name the rank-1 array type itself.
        let bound = bind("int[]").unwrap();
        assert!(matches!(
            bound.statements[0].nodes[1],
            BoundNode::TypeRef(TyRef::Array(ArrayTy { elem: prim::I32, rank: 1 }))
        ));
    }

    #[test]
    fn array_length_and_element_access() {
        let bound = bind("int[4].Length").unwrap();
        assert!(matches!(bound.statements[0].nodes[2], BoundNode::ArrayLen));
        let bound = bind("int[4][0]").unwrap();
        assert!(matches!(bound.statements[0].nodes[2], BoundNode::ArrayGet { .. }));
        assert_eq!(bound.statements[0].ty, ExprTy::Known(TyRef::Named(prim::I32)));
        // Rank mismatch is an indexer failure.
        assert!(matches!(
            bind("int[2, 2][0]"),
            Err(ResolutionError::NoMatchingIndexer { .. })
        ));
    }

    #[test]
    fn indexers_resolve_on_values() {
        let bound = bind("Inventory(3)[0]").unwrap();
        assert!(matches!(bound.statements[0].nodes[2], BoundNode::IndexerGet { .. }));
        assert_eq!(bound.statements[0].ty, ExprTy::Known(TyRef::Named(prim::I64)));
    }

    #[test]
    fn assignment_targets() {
        let bound = bind("Player.Default().Name = \"Grace\"").unwrap();
        assert!(matches!(
            bound.statements[0].nodes[0],
            BoundNode::Assign(BoundAssign::Field { .. })
        ));
        let bound = bind("Inventory(3)[1] = 42").unwrap();
        assert!(matches!(
            bound.statements[0].nodes[0],
            BoundNode::Assign(BoundAssign::IndexerSet { .. })
        ));
        // Read-only members refuse assignment.
        assert!(matches!(
            bind("Math.Pi = 3"),
            Err(ResolutionError::CannotAssign { .. })
        ));
        // A void-yielding value cannot be stored.
        assert!(matches!(
            bind("$v = Player.Default().Say(\"hi\")"),
            Err(ResolutionError::CannotAssign { .. })
        ));
    }

    #[test]
    fn void_results_do_not_chain() {
        assert!(matches!(
            bind("Player.Default().Say(\"hi\").Id"),
            Err(ResolutionError::VoidDereference)
        ));
    }

    #[test]
    fn null_roots_have_no_members() {
        assert!(matches!(
            bind("null.Anything"),
            Err(ResolutionError::NoSuchMember { ref on, .. }) if on == "null"
        ));
    }

    #[test]
    fn safe_mode_hides_non_public_entries() {
        // The type never made it into the safe catalog.
        assert!(matches!(
            bind("Game.Secret.Token"),
            Err(ResolutionError::UnresolvedRoot(_))
        ));
        // Non-public members of public types are skipped too.
        assert!(matches!(
            bind("Player.Default().Cheats"),
            Err(ResolutionError::NoSuchMember { .. })
        ));

        let fx = fixture(false);
        assert!(bind_in(&fx, "Game.Secret.Token").is_ok());
        assert!(bind_in(&fx, "Player.Default().Cheats").is_ok());
    }

    #[test]
    fn overload_error_names_symbol_and_type() {
        let err = bind("Math.Clamp(\"a\", \"b\", \"c\")").unwrap_err();
        assert_eq!(
            err,
            ResolutionError::NoMatchingOverload {
                name: "Clamp".to_string(),
                on: "Demo.Math".to_string(),
            }
        );
        let err = bind("Math.Missing()").unwrap_err();
        assert!(matches!(err, ResolutionError::NoSuchMember { .. }));
    }

    #[test]
    fn invoke_shaped_roots_try_globals_first() {
        let fx = fixture(true);
        let globals = [GlobalFn {
            name: "typeof".to_string(),
            params: vec![Param::new("value", TyRef::Named(prim::OBJECT))],
            ret: Some(TyRef::Named(prim::STRING)),
            invoke: std::sync::Arc::new(|_, _| Ok(Value::Str(String::new()))),
        }];
        let binder = Binder::new(
            &fx.demo.registry,
            &fx.catalog,
            &fx.settings.using_namespaces,
            true,
            &globals,
        );
        let parsed = scry_parser::parse("typeof(5)");
        let bound = binder.bind_command(&parsed.command, &mut Scope::new()).unwrap();
        let BoundNode::Invoke(invoke) = &bound.statements[0].nodes[0] else {
            panic!("expected invoke");
        };
        assert_eq!(invoke.callee, Callee::Global(0));
    }

    #[test]
    fn binding_is_deterministic() {
        let fx = fixture(true);
        let source = "Math.Clamp(Math.Abs(-3.0), 0, Math.Pi); $a = int[2]; $a[1]";
        let first = bind_in(&fx, source).unwrap();
        let second = bind_in(&fx, source).unwrap();
        assert_eq!(first, second);
    }
}
