//! A small sample host domain.
//!
//! Used by the demo REPL binary and by integration tests across the
//! pipeline crates. It exercises every member shape the resolver knows:
//! overloads in declaration order, varargs, base-type shadowing, nested
//! types, delegates, indexers, enums, value types, implicit conversion
//! operators, and non-public entries for safe mode.

use std::sync::{Arc, Mutex};

use scry_common::error::RuntimeError;
use scry_common::value::{prim, ObjectHandle, TyRef, TypeId, Value};

use crate::build::RegistryBuilder;
use crate::desc::{receiver, FieldDesc, Param, TypeKind};
use crate::registry::Registry;

/// Built demo registry plus the ids tests care about.
pub struct Demo {
    pub registry: Registry,
    pub vec2: TypeId,
    pub entity: TypeId,
    pub player: TypeId,
    pub stats: TypeId,
    pub inventory: TypeId,
    pub callback: TypeId,
    pub color: TypeId,
    pub math: TypeId,
    pub secret: TypeId,
}

/// A 2D vector value type.
pub struct DemoVec2 {
    pub x: Mutex<f64>,
    pub y: Mutex<f64>,
}

impl DemoVec2 {
    fn length(&self) -> f64 {
        let x = *self.x.lock().unwrap();
        let y = *self.y.lock().unwrap();
        (x * x + y * y).sqrt()
    }
}

/// The concrete object behind both `Game.Entity` and `Game.Player`.
pub struct DemoPlayer {
    pub id: i32,
    pub name: Mutex<String>,
    pub health: Mutex<i32>,
    pub on_hit: Arc<dyn Fn(i64) -> i64 + Send + Sync>,
}

/// A delegate instance.
pub struct DemoCallback(pub Arc<dyn Fn(i64) -> i64 + Send + Sync>);

/// A list-shaped container with an indexer.
pub struct DemoInventory(pub Mutex<Vec<i64>>);

fn want_i32(v: &Value) -> Result<i32, RuntimeError> {
    match v {
        Value::I32(n) => Ok(*n),
        other => Err(RuntimeError::invocation(format!("expected int, got {other:?}"))),
    }
}

fn want_i64(v: &Value) -> Result<i64, RuntimeError> {
    match v {
        Value::I64(n) => Ok(*n),
        other => Err(RuntimeError::invocation(format!("expected long, got {other:?}"))),
    }
}

fn want_f64(v: &Value) -> Result<f64, RuntimeError> {
    match v {
        Value::F64(n) => Ok(*n),
        other => Err(RuntimeError::invocation(format!("expected double, got {other:?}"))),
    }
}

fn want_str(v: &Value) -> Result<String, RuntimeError> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        other => Err(RuntimeError::invocation(format!("expected string, got {other:?}"))),
    }
}

fn new_vec2(x: f64, y: f64, ty: TypeId) -> Value {
    Value::Object(ty, ObjectHandle::new(DemoVec2 { x: Mutex::new(x), y: Mutex::new(y) }))
}

pub fn new_player(id: i32, name: &str, health: i32, ty: TypeId) -> Value {
    Value::Object(
        ty,
        ObjectHandle::new(DemoPlayer {
            id,
            name: Mutex::new(name.to_string()),
            health: Mutex::new(health),
            on_hit: Arc::new(|damage| damage * 2),
        }),
    )
}

/// Build the demo registry: module `demo` (Demo.*) then module `game`
/// (Game.*), in that registration order.
pub fn build_demo() -> Demo {
    let double = TyRef::Named(prim::F64);
    let int = TyRef::Named(prim::I32);
    let long = TyRef::Named(prim::I64);
    let string = TyRef::Named(prim::STRING);

    let mut b = RegistryBuilder::new();
    b.module("demo");

    // ── Demo.Vec2 ────────────────────────────────────────────────────────
    let vec2_builder = b.ty("Demo", "Vec2").value_type();
    let vec2 = vec2_builder.id();
    let vec2 = vec2_builder
        .field_rw(
            "X",
            double,
            |recv| Ok(Value::F64(*receiver::<DemoVec2>(recv)?.x.lock().unwrap())),
            |recv, v| {
                *receiver::<DemoVec2>(recv)?.x.lock().unwrap() = want_f64(&v)?;
                Ok(())
            },
        )
        .field_rw(
            "Y",
            double,
            |recv| Ok(Value::F64(*receiver::<DemoVec2>(recv)?.y.lock().unwrap())),
            |recv, v| {
                *receiver::<DemoVec2>(recv)?.y.lock().unwrap() = want_f64(&v)?;
                Ok(())
            },
        )
        .property("Length", double, |recv| {
            Ok(Value::F64(receiver::<DemoVec2>(recv)?.length()))
        })
        .static_field("Origin", TyRef::Named(vec2), move |_| Ok(new_vec2(0.0, 0.0, vec2)))
        .ctor(
            vec![Param::new("x", double), Param::new("y", double)],
            move |args| Ok(new_vec2(want_f64(&args[0])?, want_f64(&args[1])?, vec2)),
        )
        // Implicit conversion: a Vec2 converts to its length.
        .conversion(TyRef::Named(vec2), double, |v| match v {
            Value::Object(_, handle) => match handle.downcast::<DemoVec2>() {
                Some(vec) => Ok(Value::F64(vec.length())),
                None => Err(RuntimeError::invocation("not a Vec2")),
            },
            _ => Err(RuntimeError::invocation("not a Vec2")),
        })
        .default_with(move || new_vec2(0.0, 0.0, vec2))
        .display_with(|v| match v {
            Value::Object(_, handle) => match handle.downcast::<DemoVec2>() {
                Some(vec) => format!(
                    "({}, {})",
                    *vec.x.lock().unwrap(),
                    *vec.y.lock().unwrap()
                ),
                None => "<Vec2>".to_string(),
            },
            _ => "<Vec2>".to_string(),
        })
        .finish();

    // ── Demo.Math ────────────────────────────────────────────────────────
    // Overload order matters: the long overload is declared first and wins
    // first-fit resolution even for float arguments.
    let math = b
        .ty("Demo", "Math")
        .static_method(
            "Clamp",
            vec![Param::new("value", long), Param::new("min", long), Param::new("max", long)],
            Some(long),
            |_, args| {
                let v = want_i64(&args[0])?;
                Ok(Value::I64(v.clamp(want_i64(&args[1])?, want_i64(&args[2])?)))
            },
        )
        .static_method(
            "Clamp",
            vec![
                Param::new("value", double),
                Param::new("min", double),
                Param::new("max", double),
            ],
            Some(double),
            |_, args| {
                let v = want_f64(&args[0])?;
                Ok(Value::F64(v.clamp(want_f64(&args[1])?, want_f64(&args[2])?)))
            },
        )
        .static_method("Abs", vec![Param::new("value", double)], Some(double), |_, args| {
            Ok(Value::F64(want_f64(&args[0])?.abs()))
        })
        .static_method("Sum", vec![Param::rest("values", prim::I64)], Some(long), |_, args| {
            let Value::Array(arr) = &args[0] else {
                return Err(RuntimeError::invocation("expected packed varargs"));
            };
            let cells = arr.cells.lock().unwrap();
            let mut total = 0i64;
            for cell in cells.iter() {
                total += want_i64(cell)?;
            }
            Ok(Value::I64(total))
        })
        .static_field("Pi", double, |_| Ok(Value::F64(std::f64::consts::PI)))
        .finish();

    b.module("game");

    // ── Game.Color ───────────────────────────────────────────────────────
    let color = b
        .ty("Game", "Color")
        .enum_type()
        .constant("Red", 0)
        .constant("Green", 1)
        .constant("Blue", 2)
        .finish();

    // ── Game.Callback (delegate) ─────────────────────────────────────────
    let callback = b
        .ty("Game", "Callback")
        .delegate()
        .method("Invoke", vec![Param::new("value", long)], Some(long), |recv, args| {
            let cb = receiver::<DemoCallback>(recv)?;
            Ok(Value::I64((cb.0)(want_i64(&args[0])?)))
        })
        .finish();

    // ── Game.Entity (base) ───────────────────────────────────────────────
    let entity = b
        .ty("Game", "Entity")
        .field("Id", int, |recv| Ok(Value::I32(receiver::<DemoPlayer>(recv)?.id)))
        // Shadowed by the derived declaration on Player.
        .field("Kind", string, |_| Ok(Value::Str("entity".to_string())))
        .finish();

    // ── Game.Player ──────────────────────────────────────────────────────
    let player_builder = b.ty("Game", "Player").base(entity);
    let player = player_builder.id();
    let player = player_builder
        .field_rw(
            "Name",
            string,
            |recv| Ok(Value::Str(receiver::<DemoPlayer>(recv)?.name.lock().unwrap().clone())),
            |recv, v| {
                *receiver::<DemoPlayer>(recv)?.name.lock().unwrap() = want_str(&v)?;
                Ok(())
            },
        )
        .field_rw(
            "Health",
            int,
            |recv| Ok(Value::I32(*receiver::<DemoPlayer>(recv)?.health.lock().unwrap())),
            |recv, v| {
                *receiver::<DemoPlayer>(recv)?.health.lock().unwrap() = want_i32(&v)?;
                Ok(())
            },
        )
        .field("Kind", string, |_| Ok(Value::Str("player".to_string())))
        .field("OnHit", TyRef::Named(callback), move |recv| {
            let p = receiver::<DemoPlayer>(recv)?;
            Ok(Value::Object(callback, ObjectHandle::new(DemoCallback(p.on_hit.clone()))))
        })
        .add_field(FieldDesc {
            name: "Cheats".to_string(),
            ty: TyRef::Named(prim::BOOL),
            is_static: false,
            is_public: false,
            get: Arc::new(|_| Ok(Value::Bool(true))),
            set: None,
        })
        .method("Heal", vec![Param::new("amount", int)], Some(int), |recv, args| {
            let p = receiver::<DemoPlayer>(recv)?;
            let mut health = p.health.lock().unwrap();
            *health += want_i32(&args[0])?;
            Ok(Value::I32(*health))
        })
        .method("Say", vec![Param::new("text", string)], None, |recv, args| {
            let _ = (receiver::<DemoPlayer>(recv)?, want_str(&args[0])?);
            Ok(Value::Void)
        })
        .ctor(vec![Param::new("name", string)], move |args| {
            Ok(new_player(1, &want_str(&args[0])?, 100, player))
        })
        .static_method("Default", Vec::new(), Some(TyRef::Named(player)), move |_, _| {
            Ok(new_player(0, "default", 100, player))
        })
        .display_with(|v| match v {
            Value::Object(_, handle) => match handle.downcast::<DemoPlayer>() {
                Some(p) => format!("Player({})", p.name.lock().unwrap()),
                None => "<Player>".to_string(),
            },
            _ => "<Player>".to_string(),
        })
        .finish();

    // ── Game.Player.Stats (nested) ───────────────────────────────────────
    let stats = b
        .ty("", "Stats")
        .nested_in(player)
        .ctor(Vec::new(), |_| Ok(Value::Str("fresh stats".to_string())))
        .static_field("Version", int, |_| Ok(Value::I32(3)))
        .finish();

    // ── Game.Inventory ───────────────────────────────────────────────────
    let inventory_builder = b.ty("Game", "Inventory");
    let inventory = inventory_builder.id();
    let inventory = inventory_builder
        .property("Count", int, |recv| {
            Ok(Value::I32(receiver::<DemoInventory>(recv)?.0.lock().unwrap().len() as i32))
        })
        .indexer(
            vec![Param::new("index", int)],
            long,
            |recv, indices| {
                let inv = receiver::<DemoInventory>(Some(recv))?;
                let idx = want_i32(&indices[0])? as usize;
                inv.0
                    .lock()
                    .unwrap()
                    .get(idx)
                    .map(|v| Value::I64(*v))
                    .ok_or(RuntimeError::IndexOutOfRange)
            },
            Some(|recv: &Value, indices: &[Value], value: Value| {
                let inv = receiver::<DemoInventory>(Some(recv))?;
                let idx = want_i32(&indices[0])? as usize;
                let mut items = inv.0.lock().unwrap();
                match items.get_mut(idx) {
                    Some(cell) => {
                        *cell = want_i64(&value)?;
                        Ok(())
                    }
                    None => Err(RuntimeError::IndexOutOfRange),
                }
            }),
        )
        .ctor(vec![Param::new("size", int)], move |args| {
            let size = want_i32(&args[0])?.max(0) as usize;
            Ok(Value::Object(
                inventory,
                ObjectHandle::new(DemoInventory(Mutex::new(vec![0; size]))),
            ))
        })
        .finish();

    // ── Game.Secret (non-public, hidden in safe mode) ────────────────────
    let secret = b
        .ty("Game", "Secret")
        .non_public()
        .static_field("Token", string, |_| Ok(Value::Str("hunter2".to_string())))
        .finish();

    let registry = b.finish();
    debug_assert_eq!(registry.get(color).kind, TypeKind::Enum);

    Demo {
        registry,
        vec2,
        entity,
        player,
        stats,
        inventory,
        callback,
        color,
        math,
        secret,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_builds_with_expected_shape() {
        let demo = build_demo();
        let reg = &demo.registry;
        assert_eq!(reg.get(demo.player).full_name(), "Game.Player");
        assert_eq!(reg.get(demo.stats).full_name(), "Game.Player.Stats");
        assert_eq!(reg.get(demo.player).base, Some(demo.entity));
        assert!(reg.get(demo.player).nested.contains(&demo.stats));
        assert!(!reg.get(demo.secret).is_public);
        // Module order: core, demo, game.
        let names: Vec<&str> = reg.modules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["core", "demo", "game"]);
        // First-fit ordering preserved: long Clamp before double Clamp.
        let math = reg.get(demo.math);
        assert_eq!(math.methods[0].name, "Clamp");
        assert_eq!(math.methods[0].params[0].ty, TyRef::Named(prim::I64));
    }

    #[test]
    fn vec2_display_and_conversion() {
        let demo = build_demo();
        let v = new_vec2(3.0, 4.0, demo.vec2);
        assert_eq!(demo.registry.display(&v), "(3, 4)");
        let converted = demo
            .registry
            .convert_value(&v, &TyRef::Named(prim::F64))
            .unwrap();
        assert_eq!(converted, Value::F64(5.0));
    }
}
