//! The registry proper: every descriptor the host registered, in module
//! registration order, plus naming and display helpers.

use scry_common::value::{prim, ArrayTy, NumKind, TyRef, TypeId, Value};

use crate::desc::{ModuleDesc, TypeDesc, TypeKind};

/// All type metadata the console can see.
///
/// Built once by the host (via [`crate::RegistryBuilder`]), shared read-only
/// behind an `Arc` afterwards. The seeded primitives always occupy the first
/// [`prim::COUNT`] slots in a fixed order so the value model can reference
/// them by constant id.
pub struct Registry {
    pub(crate) types: Vec<TypeDesc>,
    pub(crate) modules: Vec<ModuleDesc>,
}

impl Registry {
    /// An empty registry holding only the seeded primitives.
    pub fn new() -> Self {
        let mut types = Vec::with_capacity(prim::COUNT);
        let prims: [(&str, TypeId); prim::COUNT] = [
            ("bool", prim::BOOL),
            ("sbyte", prim::I8),
            ("short", prim::I16),
            ("int", prim::I32),
            ("long", prim::I64),
            ("byte", prim::U8),
            ("ushort", prim::U16),
            ("uint", prim::U32),
            ("ulong", prim::U64),
            ("float", prim::F32),
            ("double", prim::F64),
            ("char", prim::CHAR),
            ("string", prim::STRING),
            ("object", prim::OBJECT),
        ];
        for (i, (name, id)) in prims.iter().enumerate() {
            debug_assert_eq!(i as TypeId, *id, "primitive seed order drifted");
            types.push(TypeDesc {
                name: (*name).to_string(),
                namespace: String::new(),
                kind: TypeKind::Primitive,
                is_public: true,
                base: if *id == prim::OBJECT { None } else { Some(prim::OBJECT) },
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
            });
        }
        let modules = vec![ModuleDesc {
            name: "core".to_string(),
            types: (0..prim::COUNT as TypeId).collect(),
        }];
        Self { types, modules }
    }

    pub fn get(&self, id: TypeId) -> &TypeDesc {
        &self.types[id as usize]
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Modules in registration order (the catalog's scan order).
    pub fn modules(&self) -> &[ModuleDesc] {
        &self.modules
    }

    /// Base chain starting at `id` itself, walking outward.
    pub fn base_chain(&self, id: TypeId) -> BaseChain<'_> {
        BaseChain { registry: self, next: Some(id) }
    }

    /// Whether `source` is `target` or derives from it. `object` is
    /// assignable from everything.
    pub fn is_assignable(&self, target: TypeId, source: TypeId) -> bool {
        if target == prim::OBJECT {
            return true;
        }
        self.base_chain(source).any(|id| id == target)
    }

    /// Human-readable name of a type reference. Arrays render with one
    /// comma per extra rank, `int[]` / `int[,]`.
    pub fn ty_name(&self, ty: &TyRef) -> String {
        match ty {
            TyRef::Named(id) => self.get(*id).full_name(),
            TyRef::Array(ArrayTy { elem, rank }) => {
                let commas = ",".repeat(rank.saturating_sub(1) as usize);
                format!("{}[{}]", self.get(*elem).full_name(), commas)
            }
        }
    }

    /// Declared type of a runtime value. `Null` and `Void` have none.
    pub fn type_of(&self, value: &Value) -> Option<TyRef> {
        let id = match value {
            Value::Null | Value::Void | Value::Type(_) => return None,
            Value::Bool(_) => prim::BOOL,
            Value::I8(_) => prim::I8,
            Value::I16(_) => prim::I16,
            Value::I32(_) => prim::I32,
            Value::I64(_) => prim::I64,
            Value::U8(_) => prim::U8,
            Value::U16(_) => prim::U16,
            Value::U32(_) => prim::U32,
            Value::U64(_) => prim::U64,
            Value::F32(_) => prim::F32,
            Value::F64(_) => prim::F64,
            Value::Char(_) => prim::CHAR,
            Value::Str(_) => prim::STRING,
            Value::Enum(id, _) => *id,
            Value::Object(id, _) => *id,
            Value::Array(arr) => return Some(TyRef::Array(arr.ty)),
        };
        Some(TyRef::Named(id))
    }

    /// Whether a null reference can inhabit this type.
    pub fn accepts_null(&self, ty: &TyRef) -> bool {
        match ty {
            TyRef::Array(_) => true,
            TyRef::Named(id) => {
                if *id == prim::STRING || *id == prim::OBJECT {
                    return true;
                }
                matches!(self.get(*id).kind, TypeKind::Class | TypeKind::Delegate)
            }
        }
    }

    /// The zero value for array cells of the given element type.
    pub fn zero_value(&self, elem: TypeId) -> Value {
        if let Some(kind) = NumKind::of_type(elem) {
            return Value::I32(0).convert_numeric(kind).unwrap_or(Value::Null);
        }
        match self.get(elem).kind {
            TypeKind::Enum => Value::Enum(elem, 0),
            TypeKind::Struct => match &self.get(elem).default_value {
                Some(thunk) => thunk(),
                None => Value::Null,
            },
            _ => Value::Null,
        }
    }

    /// Render a value for the output sink. `Void` renders empty; the host
    /// suppresses it anyway.
    pub fn display(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Void => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::I8(v) => v.to_string(),
            Value::I16(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::U8(v) => v.to_string(),
            Value::U16(v) => v.to_string(),
            Value::U32(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::F32(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::Char(c) => c.to_string(),
            Value::Str(s) => s.clone(),
            Value::Type(ty) => self.ty_name(ty),
            Value::Enum(id, repr) => {
                let desc = self.get(*id);
                match desc.enum_names.iter().find(|(_, v)| v == repr) {
                    Some((name, _)) => format!("{}.{name}", desc.full_name()),
                    None => repr.to_string(),
                }
            }
            Value::Array(arr) => {
                let cells = match arr.cells.lock() {
                    Ok(cells) => cells,
                    Err(_) => return "<poisoned array>".to_string(),
                };
                let rendered: Vec<String> = cells.iter().map(|v| self.display(v)).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Object(id, _) => {
                let desc = self.get(*id);
                match &desc.display {
                    Some(thunk) => thunk(value),
                    None => format!("<{}>", desc.full_name()),
                }
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a type and its base types, derived-most first.
pub struct BaseChain<'a> {
    registry: &'a Registry,
    next: Option<TypeId>,
}

impl Iterator for BaseChain<'_> {
    type Item = TypeId;

    fn next(&mut self) -> Option<TypeId> {
        let id = self.next?;
        self.next = self.registry.get(id).base;
        Some(id)
    }
}
