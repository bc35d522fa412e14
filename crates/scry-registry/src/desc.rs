//! Type and member descriptors.
//!
//! A [`TypeDesc`] is the unit the catalog indexes and the resolver searches.
//! Members carry bound closures (thunks) supplied by the host at
//! registration time; invoking a member never goes through reflection, it
//! calls the thunk. Receivers are passed as `Option<&Value>` -- `None` for
//! statics.

use std::sync::Arc;

use scry_common::error::RuntimeError;
use scry_common::value::{TyRef, TypeId, Value};

/// Read a field/property: `get(receiver)`.
pub type GetFn = Arc<dyn Fn(Option<&Value>) -> Result<Value, RuntimeError> + Send + Sync>;
/// Write a field/property: `set(receiver, value)`.
pub type SetFn = Arc<dyn Fn(Option<&Value>, Value) -> Result<(), RuntimeError> + Send + Sync>;
/// Invoke a method or delegate: `invoke(receiver, args)`.
pub type InvokeFn =
    Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value, RuntimeError> + Send + Sync>;
/// Construct an instance: `construct(args)`.
pub type CtorFn = Arc<dyn Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync>;
/// Read through an indexer: `get(receiver, indices)`.
pub type IndexGetFn = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, RuntimeError> + Send + Sync>;
/// Write through an indexer: `set(receiver, indices, value)`.
pub type IndexSetFn =
    Arc<dyn Fn(&Value, &[Value], Value) -> Result<(), RuntimeError> + Send + Sync>;
/// Apply an implicit conversion operator to a value.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value, RuntimeError> + Send + Sync>;
/// Render an object for display.
pub type DisplayFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;
/// Produce the zero value of a value type.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// A declared parameter.
#[derive(Clone)]
pub struct Param {
    pub name: String,
    /// Declared type. For a variadic parameter this is the rank-1 array
    /// type; callers may also pass trailing arguments of its element type.
    pub ty: TyRef,
    /// Only valid on the last parameter.
    pub variadic: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TyRef) -> Self {
        Self { name: name.into(), ty, variadic: false }
    }

    /// A trailing variable-length parameter with the given element type.
    pub fn rest(name: impl Into<String>, elem: TypeId) -> Self {
        Self {
            name: name.into(),
            ty: TyRef::Array(scry_common::value::ArrayTy { elem, rank: 1 }),
            variadic: true,
        }
    }

    /// Element type of a variadic parameter.
    pub fn variadic_elem(&self) -> Option<TypeId> {
        match (self.variadic, self.ty) {
            (true, TyRef::Array(arr)) => Some(arr.elem),
            _ => None,
        }
    }
}

pub struct FieldDesc {
    pub name: String,
    pub ty: TyRef,
    pub is_static: bool,
    pub is_public: bool,
    pub get: GetFn,
    pub set: Option<SetFn>,
}

/// A parameterless property. Only read-only parameterless getters are
/// dereferenceable; a setter makes the property assignable.
pub struct PropertyDesc {
    pub name: String,
    pub ty: TyRef,
    pub is_static: bool,
    pub is_public: bool,
    pub get: Option<GetFn>,
    pub set: Option<SetFn>,
}

pub struct MethodDesc {
    pub name: String,
    pub is_static: bool,
    pub is_public: bool,
    pub params: Vec<Param>,
    /// `None` means void: the call yields the no-value sentinel.
    pub ret: Option<TyRef>,
    pub invoke: InvokeFn,
}

pub struct CtorDesc {
    pub is_public: bool,
    pub params: Vec<Param>,
    pub construct: CtorFn,
}

/// An indexed property (one or more index parameters).
pub struct IndexerDesc {
    pub is_public: bool,
    pub params: Vec<Param>,
    pub ty: TyRef,
    pub get: Option<IndexGetFn>,
    pub set: Option<IndexSetFn>,
}

/// A one-argument implicit conversion operator declared on this type.
pub struct ConversionDesc {
    pub from: TyRef,
    pub to: TyRef,
    pub convert: ConvertFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Reference type.
    Class,
    /// Value type: zero-argument construction succeeds even without a
    /// declared constructor.
    Struct,
    /// Named integral constants; converts like a numeric primitive.
    Enum,
    /// Callable object type; a field of this type binds as field + invoke.
    Delegate,
    /// Seeded primitive.
    Primitive,
}

/// A registered type.
pub struct TypeDesc {
    pub name: String,
    /// Dotted declaring namespace; empty for the root namespace. For a
    /// nested type this is the full name of the declaring type.
    pub namespace: String,
    pub kind: TypeKind,
    pub is_public: bool,
    pub base: Option<TypeId>,
    pub fields: Vec<FieldDesc>,
    pub properties: Vec<PropertyDesc>,
    pub methods: Vec<MethodDesc>,
    pub ctors: Vec<CtorDesc>,
    pub indexers: Vec<IndexerDesc>,
    pub nested: Vec<TypeId>,
    pub conversions: Vec<ConversionDesc>,
    /// Enum constant names in declaration order, for display.
    pub enum_names: Vec<(String, i64)>,
    pub default_value: Option<DefaultFn>,
    pub display: Option<DisplayFn>,
}

impl TypeDesc {
    /// Dotted full name.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn is_value_kind(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Enum | TypeKind::Primitive)
    }
}

/// An ordered group of types exposed together (the unit the allow/deny
/// module filter applies to, computed by the host before registration).
pub struct ModuleDesc {
    pub name: String,
    pub types: Vec<TypeId>,
}

/// A built-in global function, callable without any type prefix.
pub struct GlobalFn {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: Option<TyRef>,
    pub invoke: InvokeFn,
}

/// Downcast an instance receiver to its concrete host type.
///
/// Shared helper for host thunks: statics pass `None`, instance thunks get
/// the object handle.
pub fn receiver<'a, T: std::any::Any + Send + Sync>(
    recv: Option<&'a Value>,
) -> Result<&'a T, RuntimeError> {
    match recv {
        Some(Value::Object(_, handle)) => handle
            .downcast::<T>()
            .ok_or_else(|| RuntimeError::invocation("receiver has the wrong concrete type")),
        Some(other) => Err(RuntimeError::invocation(format!(
            "expected an object receiver, got {other:?}"
        ))),
        None => Err(RuntimeError::invocation("missing instance receiver")),
    }
}
