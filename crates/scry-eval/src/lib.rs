// scry-eval -- evaluation of bound command trees.
//
// Executes one bound chain by threading a current value through its nodes.
// All name and overload decisions were made at bind time; the evaluator
// only threads values, converts arguments to their declared parameter
// types, and calls the registered thunks.

use scry_common::error::RuntimeError;
use scry_common::value::{ArrayRef, ArrayTy, TyRef, TypeId, Value};
use scry_common::vars::VarTable;
use scry_registry::{GlobalFn, Param, Registry};
use scry_resolve::{BoundAssign, BoundCommand, BoundExpr, BoundInvoke, BoundNode, Callee};

/// Host predicate marking values the console must never hand out.
///
/// Checked by identity after every evaluation step; a matching value is
/// replaced with null, which blocks self-referential access to the
/// hosting console object.
pub type ForbiddenFn = dyn Fn(&Value) -> bool + Send + Sync;

/// Upper bound on cells per array allocation. Commands are typed
/// interactively; anything near this limit is a typo, not intent.
const MAX_ARRAY_CELLS: usize = 1 << 24;

/// Result of running a whole command.
#[derive(Debug)]
pub struct CommandOutcome {
    /// Value of the last statement that ran to completion.
    pub value: Option<Value>,
    /// First statement failure, if any.
    pub error: Option<RuntimeError>,
}

pub struct Evaluator<'a> {
    registry: &'a Registry,
    globals: &'a [GlobalFn],
    vars: &'a mut VarTable,
    forbidden: Option<&'a ForbiddenFn>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        registry: &'a Registry,
        globals: &'a [GlobalFn],
        vars: &'a mut VarTable,
        forbidden: Option<&'a ForbiddenFn>,
    ) -> Self {
        Self { registry, globals, vars, forbidden }
    }

    /// Run statements in order. Execution stops at the first failing
    /// statement unless `continue_on_error` is set (used by non-terminal
    /// interpretation passes to maximize diagnostics).
    pub fn eval_command(
        &mut self,
        command: &BoundCommand,
        continue_on_error: bool,
    ) -> CommandOutcome {
        let mut value = None;
        let mut error = None;
        for statement in &command.statements {
            match self.eval_expr(statement) {
                Ok(v) => value = Some(v),
                Err(e) => {
                    if error.is_none() {
                        error = Some(e);
                    }
                    if !continue_on_error {
                        break;
                    }
                }
            }
        }
        CommandOutcome { value, error }
    }

    pub fn eval_expr(&mut self, expr: &BoundExpr) -> Result<Value, RuntimeError> {
        let mut current: Option<Value> = None;
        for node in &expr.nodes {
            let next = self.eval_node(node, &current)?;
            current = Some(self.censor(next));
        }
        Ok(current.unwrap_or(Value::Void))
    }

    /// Replace a host-forbidden value with null.
    fn censor(&self, value: Value) -> Value {
        match self.forbidden {
            Some(pred) if !value.is_void() && pred(&value) => Value::Null,
            _ => value,
        }
    }

    fn eval_node(&mut self, node: &BoundNode, current: &Option<Value>) -> Result<Value, RuntimeError> {
        match node {
            BoundNode::Literal(value) => Ok(value.clone()),
            BoundNode::TypeRef(ty) => Ok(Value::Type(*ty)),
            BoundNode::NestedType(id) => Ok(Value::Type(TyRef::Named(*id))),
            BoundNode::Variable(name) => match self.vars.get(name) {
                Some(binding) => Ok(binding.value.clone()),
                None => Err(RuntimeError::invocation(format!(
                    "variable ${name} disappeared between binding and evaluation"
                ))),
            },
            BoundNode::FieldGet(member) => {
                let field = &self.registry.get(member.owner).fields[member.index];
                let recv = if field.is_static {
                    None
                } else {
                    Some(self.instance(current, member.owner)?)
                };
                (field.get)(recv)
            }
            BoundNode::PropertyGet(member) => {
                let prop = &self.registry.get(member.owner).properties[member.index];
                let get = prop
                    .get
                    .as_ref()
                    .ok_or_else(|| RuntimeError::invocation("property has no getter"))?;
                let recv = if prop.is_static {
                    None
                } else {
                    Some(self.instance(current, member.owner)?)
                };
                get(recv)
            }
            BoundNode::Invoke(invoke) => self.eval_invoke(invoke, current),
            BoundNode::ArrayNew { elem, lengths } => self.eval_array_new(*elem, lengths),
            BoundNode::ArrayLen => {
                let arr = self.current_array(current)?;
                Ok(Value::I32(arr.len() as i32))
            }
            BoundNode::ArrayGet { indices } => {
                let arr = self.current_array(current)?.clone();
                let indices = self.eval_indices(indices)?;
                arr.get(&indices).ok_or(RuntimeError::IndexOutOfRange)
            }
            BoundNode::IndexerGet { member, indices } => {
                let indexer = &self.registry.get(member.owner).indexers[member.index];
                let get = indexer
                    .get
                    .clone()
                    .ok_or_else(|| RuntimeError::invocation("indexer has no getter"))?;
                let params = indexer.params.clone();
                let recv = self.instance(current, member.owner)?.clone();
                let vals = self.eval_converted(indices, &params)?;
                get(&recv, &vals)
            }
            BoundNode::Assign(assign) => {
                self.eval_assign(assign)?;
                Ok(Value::Void)
            }
        }
    }

    fn eval_invoke(
        &mut self,
        invoke: &BoundInvoke,
        current: &Option<Value>,
    ) -> Result<Value, RuntimeError> {
        match &invoke.callee {
            Callee::Method(member) => {
                let method = &self.registry.get(member.owner).methods[member.index];
                let thunk = method.invoke.clone();
                let params = method.params.clone();
                let is_void = method.ret.is_none();
                let recv = if method.is_static {
                    None
                } else {
                    Some(self.instance(current, member.owner)?.clone())
                };
                let vals = self.eval_args(&invoke.args, &params, invoke.fixed)?;
                let out = thunk(recv.as_ref(), &vals)?;
                Ok(if is_void { Value::Void } else { out })
            }
            Callee::Ctor { ty, index: Some(index) } => {
                let ctor = &self.registry.get(*ty).ctors[*index];
                let thunk = ctor.construct.clone();
                let params = ctor.params.clone();
                let vals = self.eval_args(&invoke.args, &params, invoke.fixed)?;
                thunk(&vals)
            }
            // Implicit zero-argument construction of a value type.
            Callee::Ctor { ty, index: None } => Ok(self.registry.zero_value(*ty)),
            Callee::Global(index) => {
                let global = &self.globals[*index];
                let thunk = global.invoke.clone();
                let params = global.params.clone();
                let is_void = global.ret.is_none();
                let vals = self.eval_args(&invoke.args, &params, invoke.fixed)?;
                let out = thunk(None, &vals)?;
                Ok(if is_void { Value::Void } else { out })
            }
        }
    }

    /// Evaluate arguments depth-first left to right, convert each to its
    /// declared parameter type, and pack any trailing variadic arguments
    /// into an array.
    fn eval_args(
        &mut self,
        args: &[BoundExpr],
        params: &[Param],
        fixed: usize,
    ) -> Result<Vec<Value>, RuntimeError> {
        let mut raw = Vec::with_capacity(args.len());
        for arg in args {
            raw.push(self.eval_expr(arg)?);
        }
        let mut out = Vec::with_capacity(params.len());
        for (value, param) in raw.iter().zip(params).take(fixed) {
            out.push(self.registry.convert_value(value, &param.ty)?);
        }
        if fixed < params.len() {
            let elem = params
                .last()
                .and_then(Param::variadic_elem)
                .ok_or_else(|| RuntimeError::invocation("missing variadic parameter"))?;
            let elem_ty = TyRef::Named(elem);
            let mut cells = Vec::with_capacity(raw.len() - fixed);
            for value in &raw[fixed..] {
                cells.push(self.registry.convert_value(value, &elem_ty)?);
            }
            out.push(Value::Array(ArrayRef::from_values(elem, cells)));
        }
        Ok(out)
    }

    fn eval_converted(
        &mut self,
        exprs: &[BoundExpr],
        params: &[Param],
    ) -> Result<Vec<Value>, RuntimeError> {
        let mut out = Vec::with_capacity(exprs.len());
        for (expr, param) in exprs.iter().zip(params) {
            let value = self.eval_expr(expr)?;
            out.push(self.registry.convert_value(&value, &param.ty)?);
        }
        Ok(out)
    }

    fn eval_array_new(
        &mut self,
        elem: TypeId,
        lengths: &[BoundExpr],
    ) -> Result<Value, RuntimeError> {
        let mut dims = Vec::with_capacity(lengths.len());
        let mut total = 1usize;
        for expr in lengths {
            let value = self.eval_expr(expr)?;
            let len = value.as_i128().ok_or(RuntimeError::NegativeArrayLength)?;
            if len < 0 {
                return Err(RuntimeError::NegativeArrayLength);
            }
            let len = usize::try_from(len).map_err(|_| RuntimeError::ArrayTooLarge)?;
            total = total
                .checked_mul(len)
                .filter(|cells| *cells <= MAX_ARRAY_CELLS)
                .ok_or(RuntimeError::ArrayTooLarge)?;
            dims.push(len);
        }
        let ty = ArrayTy { elem, rank: lengths.len() as u8 };
        let fill = self.registry.zero_value(elem);
        Ok(Value::Array(ArrayRef::new(ty, dims, fill)))
    }

    fn eval_indices(&mut self, indices: &[BoundExpr]) -> Result<Vec<usize>, RuntimeError> {
        let mut out = Vec::with_capacity(indices.len());
        for expr in indices {
            let value = self.eval_expr(expr)?;
            let ix = value
                .as_i128()
                .filter(|ix| *ix >= 0)
                .ok_or(RuntimeError::IndexOutOfRange)?;
            out.push(ix as usize);
        }
        Ok(out)
    }

    fn eval_assign(&mut self, assign: &BoundAssign) -> Result<(), RuntimeError> {
        match assign {
            BoundAssign::Variable { name, ty, value } => {
                let value = self.eval_expr(value)?;
                self.vars.set(name, *ty, value);
                Ok(())
            }
            BoundAssign::Field { target, member, value } => {
                let receiver = self.eval_expr(target)?;
                let field = &self.registry.get(member.owner).fields[member.index];
                let set = field
                    .set
                    .clone()
                    .ok_or_else(|| RuntimeError::invocation("field is read-only"))?;
                let ty = field.ty;
                let is_static = field.is_static;
                let owner = member.owner;
                let value = self.eval_expr(value)?;
                let value = self.registry.convert_value(&value, &ty)?;
                if is_static {
                    set(None, value)
                } else {
                    self.check_instance(&receiver, owner)?;
                    set(Some(&receiver), value)
                }
            }
            BoundAssign::Property { target, member, value } => {
                let receiver = self.eval_expr(target)?;
                let prop = &self.registry.get(member.owner).properties[member.index];
                let set = prop
                    .set
                    .clone()
                    .ok_or_else(|| RuntimeError::invocation("property is read-only"))?;
                let ty = prop.ty;
                let is_static = prop.is_static;
                let owner = member.owner;
                let value = self.eval_expr(value)?;
                let value = self.registry.convert_value(&value, &ty)?;
                if is_static {
                    set(None, value)
                } else {
                    self.check_instance(&receiver, owner)?;
                    set(Some(&receiver), value)
                }
            }
            BoundAssign::ArraySet { target, indices, value } => {
                let receiver = self.eval_expr(target)?;
                let Value::Array(arr) = receiver else {
                    return Err(RuntimeError::invocation("subscript target is not an array"));
                };
                let indices = self.eval_indices(indices)?;
                let value = self.eval_expr(value)?;
                let value = self.registry.convert_value(&value, &TyRef::Named(arr.ty.elem))?;
                if arr.set(&indices, value) {
                    Ok(())
                } else {
                    Err(RuntimeError::IndexOutOfRange)
                }
            }
            BoundAssign::IndexerSet { target, member, indices, value } => {
                let receiver = self.eval_expr(target)?;
                let indexer = &self.registry.get(member.owner).indexers[member.index];
                let set = indexer
                    .set
                    .clone()
                    .ok_or_else(|| RuntimeError::invocation("indexer is read-only"))?;
                let params = indexer.params.clone();
                let ty = indexer.ty;
                self.check_instance(&receiver, member.owner)?;
                let indices = self.eval_converted(indices, &params)?;
                let value = self.eval_expr(value)?;
                let value = self.registry.convert_value(&value, &ty)?;
                set(&receiver, &indices, value)
            }
        }
    }

    fn check_instance(&self, value: &Value, owner: TypeId) -> Result<(), RuntimeError> {
        if value.is_null() {
            return Err(RuntimeError::NullDereference {
                type_name: self.registry.get(owner).full_name(),
            });
        }
        Ok(())
    }

    /// Require a non-null current value for instance member access.
    fn instance<'v>(
        &self,
        current: &'v Option<Value>,
        owner: TypeId,
    ) -> Result<&'v Value, RuntimeError> {
        match current {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(RuntimeError::NullDereference {
                type_name: self.registry.get(owner).full_name(),
            }),
        }
    }

    fn current_array<'v>(&self, current: &'v Option<Value>) -> Result<&'v ArrayRef, RuntimeError> {
        match current {
            Some(Value::Array(arr)) => Ok(arr),
            Some(Value::Null) | None => Err(RuntimeError::NullDereference {
                type_name: "array".to_string(),
            }),
            Some(_) => Err(RuntimeError::invocation("subscript target is not an array")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use scry_catalog::{build as build_catalog, CancelToken};
    use scry_common::settings::Settings;
    use scry_registry::demo::build_demo;
    use scry_resolve::{Binder, Scope};

    fn run_with(
        source: &str,
        forbidden: Option<&ForbiddenFn>,
        continue_on_error: bool,
    ) -> (CommandOutcome, VarTable) {
        let demo = build_demo();
        let settings = Settings {
            safe_mode: true,
            using_namespaces: vec!["Demo".to_string(), "Game".to_string()],
            ..Settings::default()
        };
        let catalog = build_catalog(&demo.registry, &settings, &CancelToken::new())
            .expect("uncancelled build completes");
        let parsed = scry_parser::parse(source);
        assert!(parsed.first_error().is_none(), "parse failed for {source:?}");
        let binder = Binder::new(
            &demo.registry,
            &catalog,
            &settings.using_namespaces,
            settings.safe_mode,
            &[],
        );
        let bound = binder
            .bind_command(&parsed.command, &mut Scope::new())
            .unwrap_or_else(|e| panic!("bind failed for {source:?}: {e}"));
        let mut vars = VarTable::new();
        let outcome = Evaluator::new(&demo.registry, &[], &mut vars, forbidden)
            .eval_command(&bound, continue_on_error);
        (outcome, vars)
    }

    fn run(source: &str) -> Value {
        let (outcome, _) = run_with(source, None, false);
        assert!(outcome.error.is_none(), "runtime error: {:?}", outcome.error);
        outcome.value.expect("command produced a value")
    }

    #[test]
    fn literals_and_statics() {
        assert_eq!(run("42"), Value::I32(42));
        assert_eq!(run("Math.Clamp(15, 0, 10)"), Value::I64(10));
    }

    #[test]
    fn enum_constants_read_as_enum_values() {
        match run("Game.Color.Green") {
            Value::Enum(_, repr) => assert_eq!(repr, 1),
            other => panic!("expected enum value, got {other:?}"),
        }
    }

    #[test]
    fn variables_persist_across_statements() {
        let (outcome, vars) = run_with("$a = 5; $a", None, false);
        assert_eq!(outcome.value, Some(Value::I32(5)));
        assert!(vars.get("a").is_some());
    }

    #[test]
    fn instance_members_and_mutation() {
        assert_eq!(run("Player(\"Ada\").Name"), Value::Str("Ada".to_string()));
        let (outcome, _) = run_with(
            "$p = Player.Default(); $p.Health = 55; $p.Heal(10)",
            None,
            false,
        );
        assert!(outcome.error.is_none());
        assert_eq!(outcome.value, Some(Value::I32(65)));
    }

    #[test]
    fn variadic_invocations_pack_trailing_arguments() {
        assert_eq!(run("Math.Sum(1, 2, 3)"), Value::I64(6));
        assert_eq!(run("Math.Sum()"), Value::I64(0));
    }

    #[test]
    fn implicit_conversion_operators_apply_to_arguments() {
        // Vec2 converts to double via its declared operator (length).
        assert_eq!(run("Math.Abs(Vec2(3.0, 4.0))"), Value::F64(5.0));
    }

    #[test]
    fn delegate_fields_invoke() {
        assert_eq!(run("Player.Default().OnHit(7)"), Value::I64(14));
    }

    #[test]
    fn void_calls_yield_the_sentinel() {
        assert_eq!(run("Player.Default().Say(\"hi\")"), Value::Void);
    }

    #[test]
    fn arrays_allocate_index_and_measure() {
        let (outcome, _) = run_with("$a = int[3]; $a[1] = 7; $a[1]", None, false);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.value, Some(Value::I32(7)));
        assert_eq!(run("int[2, 3].Length"), Value::I32(6));
        assert_eq!(run("long[2][0]"), Value::I64(0));
    }

    #[test]
    fn array_errors() {
        let (outcome, _) = run_with("int[2][5]", None, false);
        assert_eq!(outcome.error, Some(RuntimeError::IndexOutOfRange));
        let (outcome, _) = run_with("int[-1]", None, false);
        assert_eq!(outcome.error, Some(RuntimeError::NegativeArrayLength));
    }

    #[test]
    fn oversized_allocations_are_refused() {
        let (outcome, _) = run_with("int[9999999999]", None, false);
        assert_eq!(outcome.error, Some(RuntimeError::ArrayTooLarge));
        // The extent product overflows even though each extent fits.
        let (outcome, _) = run_with("int[100000, 100000, 100000, 100000]", None, false);
        assert_eq!(outcome.error, Some(RuntimeError::ArrayTooLarge));
    }

    #[test]
    fn indexer_round_trip() {
        let (outcome, _) = run_with("$i = Inventory(3); $i[2] = 9; $i[2]", None, false);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.value, Some(Value::I64(9)));
    }

    #[test]
    fn forbidden_values_become_null() {
        // Every player the command produces is forbidden, so the first
        // instance member access trips the null dereference guard.
        let forbid = |v: &Value| matches!(v, Value::Object(_, _));
        let (outcome, _) = run_with("Player.Default().Name", Some(&forbid), false);
        assert_eq!(
            outcome.error,
            Some(RuntimeError::NullDereference { type_name: "Game.Player".to_string() })
        );
        let (outcome, _) = run_with("Player.Default()", Some(&forbid), false);
        assert_eq!(outcome.value, Some(Value::Null));
    }

    #[test]
    fn execution_stops_at_first_failure() {
        let (outcome, _) = run_with("int[-1]; 5", None, false);
        assert_eq!(outcome.error, Some(RuntimeError::NegativeArrayLength));
        assert_eq!(outcome.value, None);

        let (outcome, _) = run_with("int[-1]; 5", None, true);
        assert_eq!(outcome.error, Some(RuntimeError::NegativeArrayLength));
        assert_eq!(outcome.value, Some(Value::I32(5)));
    }
}
