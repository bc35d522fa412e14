//! Fluent registration API.
//!
//! Hosts describe their types once at startup:
//!
//! ```ignore
//! let mut b = RegistryBuilder::new();
//! b.module("game");
//! let vec2 = b.ty("Demo", "Vec2")
//!     .value_type()
//!     .field("x", TyRef::Named(prim::F64), |recv| { ... })
//!     .finish();
//! let registry = b.finish();
//! ```
//!
//! Sugar helpers cover the common public-member cases; the `add_*` methods
//! take full descriptors when visibility or thunk sharing matters.

use std::sync::Arc;

use scry_common::error::RuntimeError;
use scry_common::value::{TyRef, TypeId, Value};

use crate::desc::{
    ConversionDesc, CtorDesc, FieldDesc, IndexerDesc, MethodDesc, ModuleDesc, Param,
    PropertyDesc, TypeDesc, TypeKind,
};
use crate::registry::Registry;

pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    /// A builder over a fresh registry (primitives already seeded into the
    /// built-in `core` module).
    pub fn new() -> Self {
        Self { registry: Registry::new() }
    }

    /// Start a new module. Types registered afterwards belong to it, in
    /// order. Module order is catalog scan order.
    pub fn module(&mut self, name: &str) -> &mut Self {
        self.registry.modules.push(ModuleDesc { name: name.to_string(), types: Vec::new() });
        self
    }

    /// Begin a type in the current module, reserving its id immediately so
    /// members may reference the type being built.
    pub fn ty(&mut self, namespace: &str, name: &str) -> TypeBuilder<'_> {
        assert!(
            self.registry.modules.len() > 1,
            "call module() before registering types"
        );
        let id = self.registry.types.len() as TypeId;
        self.registry.types.push(empty_desc(namespace, name));
        self.registry.modules.last_mut().unwrap().types.push(id);
        TypeBuilder {
            registry: &mut self.registry,
            id,
            desc: empty_desc(namespace, name),
        }
    }

    pub fn finish(self) -> Registry {
        self.registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_desc(namespace: &str, name: &str) -> TypeDesc {
    TypeDesc {
        name: name.to_string(),
        namespace: namespace.to_string(),
        kind: TypeKind::Class,
        is_public: true,
        base: None,
        fields: Vec::new(),
        properties: Vec::new(),
        methods: Vec::new(),
        ctors: Vec::new(),
        indexers: Vec::new(),
        nested: Vec::new(),
        conversions: Vec::new(),
        enum_names: Vec::new(),
        default_value: None,
        display: None,
    }
}

/// Builder for one [`TypeDesc`]. Call [`TypeBuilder::finish`] to register.
pub struct TypeBuilder<'a> {
    registry: &'a mut Registry,
    id: TypeId,
    desc: TypeDesc,
}

impl TypeBuilder<'_> {
    /// The reserved id of the type being built.
    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn non_public(mut self) -> Self {
        self.desc.is_public = false;
        self
    }

    pub fn value_type(mut self) -> Self {
        self.desc.kind = TypeKind::Struct;
        self
    }

    pub fn enum_type(mut self) -> Self {
        self.desc.kind = TypeKind::Enum;
        self
    }

    pub fn delegate(mut self) -> Self {
        self.desc.kind = TypeKind::Delegate;
        self
    }

    pub fn base(mut self, base: TypeId) -> Self {
        self.desc.base = Some(base);
        self
    }

    /// Register as a nested type of `parent` (namespace becomes the
    /// parent's full name).
    pub fn nested_in(mut self, parent: TypeId) -> Self {
        self.desc.namespace = self.registry.get(parent).full_name();
        self.registry.types[parent as usize].nested.push(self.id);
        self
    }

    // ── Raw descriptor adders ────────────────────────────────────────────

    pub fn add_field(mut self, field: FieldDesc) -> Self {
        self.desc.fields.push(field);
        self
    }

    pub fn add_property(mut self, property: PropertyDesc) -> Self {
        self.desc.properties.push(property);
        self
    }

    pub fn add_method(mut self, method: MethodDesc) -> Self {
        self.desc.methods.push(method);
        self
    }

    pub fn add_ctor(mut self, ctor: CtorDesc) -> Self {
        self.desc.ctors.push(ctor);
        self
    }

    pub fn add_indexer(mut self, indexer: IndexerDesc) -> Self {
        self.desc.indexers.push(indexer);
        self
    }

    // ── Sugar for the common public cases ────────────────────────────────

    pub fn field<G>(self, name: &str, ty: TyRef, get: G) -> Self
    where
        G: Fn(Option<&Value>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        self.add_field(FieldDesc {
            name: name.to_string(),
            ty,
            is_static: false,
            is_public: true,
            get: Arc::new(get),
            set: None,
        })
    }

    pub fn field_rw<G, S>(self, name: &str, ty: TyRef, get: G, set: S) -> Self
    where
        G: Fn(Option<&Value>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
        S: Fn(Option<&Value>, Value) -> Result<(), RuntimeError> + Send + Sync + 'static,
    {
        self.add_field(FieldDesc {
            name: name.to_string(),
            ty,
            is_static: false,
            is_public: true,
            get: Arc::new(get),
            set: Some(Arc::new(set)),
        })
    }

    pub fn static_field<G>(self, name: &str, ty: TyRef, get: G) -> Self
    where
        G: Fn(Option<&Value>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        self.add_field(FieldDesc {
            name: name.to_string(),
            ty,
            is_static: true,
            is_public: true,
            get: Arc::new(get),
            set: None,
        })
    }

    /// Read-only parameterless property.
    pub fn property<G>(self, name: &str, ty: TyRef, get: G) -> Self
    where
        G: Fn(Option<&Value>) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        self.add_property(PropertyDesc {
            name: name.to_string(),
            ty,
            is_static: false,
            is_public: true,
            get: Some(Arc::new(get)),
            set: None,
        })
    }

    pub fn method<F>(self, name: &str, params: Vec<Param>, ret: Option<TyRef>, invoke: F) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        self.add_method(MethodDesc {
            name: name.to_string(),
            is_static: false,
            is_public: true,
            params,
            ret,
            invoke: Arc::new(invoke),
        })
    }

    pub fn static_method<F>(
        self,
        name: &str,
        params: Vec<Param>,
        ret: Option<TyRef>,
        invoke: F,
    ) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        self.add_method(MethodDesc {
            name: name.to_string(),
            is_static: true,
            is_public: true,
            params,
            ret,
            invoke: Arc::new(invoke),
        })
    }

    pub fn ctor<F>(self, params: Vec<Param>, construct: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        self.add_ctor(CtorDesc {
            is_public: true,
            params,
            construct: Arc::new(construct),
        })
    }

    pub fn indexer<G, S>(self, params: Vec<Param>, ty: TyRef, get: G, set: Option<S>) -> Self
    where
        G: Fn(&Value, &[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
        S: Fn(&Value, &[Value], Value) -> Result<(), RuntimeError> + Send + Sync + 'static,
    {
        self.add_indexer(IndexerDesc {
            is_public: true,
            params,
            ty,
            get: Some(Arc::new(get)),
            set: set.map(|s| Arc::new(s) as crate::desc::IndexSetFn),
        })
    }

    /// Implicit conversion operator declared on this type.
    pub fn conversion<F>(mut self, from: TyRef, to: TyRef, convert: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        self.desc.conversions.push(ConversionDesc { from, to, convert: Arc::new(convert) });
        self
    }

    /// Enum constant: registered as a static get-only field of the enum
    /// type and listed for display.
    pub fn constant(mut self, name: &str, value: i64) -> Self {
        let id = self.id;
        self.desc.enum_names.push((name.to_string(), value));
        self.add_field_inner(FieldDesc {
            name: name.to_string(),
            ty: TyRef::Named(id),
            is_static: true,
            is_public: true,
            get: Arc::new(move |_| Ok(Value::Enum(id, value))),
            set: None,
        });
        self
    }

    fn add_field_inner(&mut self, field: FieldDesc) {
        self.desc.fields.push(field);
    }

    /// Zero value produced by zero-argument construction of a value type
    /// with no declared constructor.
    pub fn default_with<F>(mut self, default: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.desc.default_value = Some(Arc::new(default));
        self
    }

    pub fn display_with<F>(mut self, display: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.desc.display = Some(Arc::new(display));
        self
    }

    /// Commit the descriptor into its reserved slot.
    pub fn finish(self) -> TypeId {
        self.registry.types[self.id as usize] = self.desc;
        self.id
    }
}
