//! The tagged-union value type threaded through evaluation.
//!
//! Everything a command can produce or consume is a [`Value`]: primitives,
//! strings, chars, enums, type references, arrays, and opaque host objects.
//! Host objects are `Arc<dyn Any>` handles; reference identity (`Arc::ptr_eq`)
//! is what the forbidden-value suppression compares against.

use std::any::Any;
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Index of a type descriptor inside the host registry.
pub type TypeId = u32;

/// Well-known ids of the primitive types seeded into every registry.
///
/// The registry constructor inserts these descriptors first, in this order,
/// so the value model can name primitive types without a registry in hand.
pub mod prim {
    use super::TypeId;

    pub const BOOL: TypeId = 0;
    pub const I8: TypeId = 1;
    pub const I16: TypeId = 2;
    pub const I32: TypeId = 3;
    pub const I64: TypeId = 4;
    pub const U8: TypeId = 5;
    pub const U16: TypeId = 6;
    pub const U32: TypeId = 7;
    pub const U64: TypeId = 8;
    pub const F32: TypeId = 9;
    pub const F64: TypeId = 10;
    pub const CHAR: TypeId = 11;
    pub const STRING: TypeId = 12;
    /// Universal base: every registered type and array converts to it.
    pub const OBJECT: TypeId = 13;

    /// Number of seeded primitive descriptors.
    pub const COUNT: usize = 14;
}

/// Reference to a type: either a registered descriptor or an array type
/// derived from one (arrays are synthesized by subscripting a type, they
/// never appear in the registry itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TyRef {
    Named(TypeId),
    Array(ArrayTy),
}

/// An array type: element descriptor plus rank (number of dimensions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArrayTy {
    pub elem: TypeId,
    pub rank: u8,
}

impl TyRef {
    /// The underlying named type id, if this is not an array.
    pub fn as_named(&self) -> Option<TypeId> {
        match self {
            TyRef::Named(id) => Some(*id),
            TyRef::Array(_) => None,
        }
    }
}

/// Opaque handle to a host-owned object.
///
/// Cloning is cheap (Arc). Mutation is the host's business: thunks that
/// mutate use interior mutability inside the concrete type.
#[derive(Clone)]
pub struct ObjectHandle(pub Arc<dyn Any + Send + Sync>);

impl ObjectHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Downcast to a concrete host type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &ObjectHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectHandle({:p})", Arc::as_ptr(&self.0))
    }
}

/// A mutable array of values. Multi-dimensional arrays are stored row-major
/// with explicit dimension extents.
#[derive(Debug, Clone)]
pub struct ArrayRef {
    pub ty: ArrayTy,
    pub dims: Vec<usize>,
    pub cells: Arc<Mutex<Vec<Value>>>,
}

impl ArrayRef {
    /// Allocate an array with the given extents, every cell set to `fill`.
    pub fn new(ty: ArrayTy, dims: Vec<usize>, fill: Value) -> Self {
        let total: usize = dims.iter().product();
        Self {
            ty,
            dims,
            cells: Arc::new(Mutex::new(vec![fill; total])),
        }
    }

    /// Build a one-dimensional array from existing values.
    pub fn from_values(elem: TypeId, values: Vec<Value>) -> Self {
        Self {
            ty: ArrayTy { elem, rank: 1 },
            dims: vec![values.len()],
            cells: Arc::new(Mutex::new(values)),
        }
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten a multi-dimensional index into a row-major offset.
    /// Returns `None` when the index count or any extent is out of range.
    pub fn flat_index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.dims.len() {
            return None;
        }
        let mut flat = 0usize;
        for (&idx, &dim) in indices.iter().zip(&self.dims) {
            if idx >= dim {
                return None;
            }
            flat = flat * dim + idx;
        }
        Some(flat)
    }

    pub fn get(&self, indices: &[usize]) -> Option<Value> {
        let flat = self.flat_index(indices)?;
        self.cells.lock().ok()?.get(flat).cloned()
    }

    pub fn set(&self, indices: &[usize], value: Value) -> bool {
        let Some(flat) = self.flat_index(indices) else {
            return false;
        };
        match self.cells.lock() {
            Ok(mut cells) => match cells.get_mut(flat) {
                Some(cell) => {
                    *cell = value;
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null reference.
    Null,
    /// "No value" sentinel produced by void calls and assignments.
    /// Hosts suppress it instead of displaying it.
    Void,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
    /// Enum constant: declaring type plus underlying integral value.
    Enum(TypeId, i64),
    /// A type used as a value (the root of static member chains).
    Type(TyRef),
    Array(ArrayRef),
    /// Opaque host object with its declared type.
    Object(TypeId, ObjectHandle),
}

/// Primitive kind classification used by the numeric conversion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    Bool,
}

impl NumKind {
    /// The primitive type id this kind corresponds to.
    pub fn type_id(self) -> TypeId {
        match self {
            NumKind::Bool => prim::BOOL,
            NumKind::I8 => prim::I8,
            NumKind::I16 => prim::I16,
            NumKind::I32 => prim::I32,
            NumKind::I64 => prim::I64,
            NumKind::U8 => prim::U8,
            NumKind::U16 => prim::U16,
            NumKind::U32 => prim::U32,
            NumKind::U64 => prim::U64,
            NumKind::F32 => prim::F32,
            NumKind::F64 => prim::F64,
            NumKind::Char => prim::CHAR,
        }
    }

    /// Classify a primitive type id, if it is one of the convertible kinds.
    pub fn of_type(id: TypeId) -> Option<NumKind> {
        match id {
            prim::BOOL => Some(NumKind::Bool),
            prim::I8 => Some(NumKind::I8),
            prim::I16 => Some(NumKind::I16),
            prim::I32 => Some(NumKind::I32),
            prim::I64 => Some(NumKind::I64),
            prim::U8 => Some(NumKind::U8),
            prim::U16 => Some(NumKind::U16),
            prim::U32 => Some(NumKind::U32),
            prim::U64 => Some(NumKind::U64),
            prim::F32 => Some(NumKind::F32),
            prim::F64 => Some(NumKind::F64),
            prim::CHAR => Some(NumKind::Char),
            _ => None,
        }
    }
}

impl Value {
    /// Whether this value is the null reference.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is the no-value sentinel.
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Primitive kind, if this value participates in numeric conversion.
    /// Enums count with their underlying integral kind.
    pub fn num_kind(&self) -> Option<NumKind> {
        match self {
            Value::Bool(_) => Some(NumKind::Bool),
            Value::I8(_) => Some(NumKind::I8),
            Value::I16(_) => Some(NumKind::I16),
            Value::I32(_) => Some(NumKind::I32),
            Value::I64(_) | Value::Enum(_, _) => Some(NumKind::I64),
            Value::U8(_) => Some(NumKind::U8),
            Value::U16(_) => Some(NumKind::U16),
            Value::U32(_) => Some(NumKind::U32),
            Value::U64(_) => Some(NumKind::U64),
            Value::F32(_) => Some(NumKind::F32),
            Value::F64(_) => Some(NumKind::F64),
            Value::Char(_) => Some(NumKind::Char),
            _ => None,
        }
    }

    /// Widen to i128 for lossless integral conversion. Floats truncate.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Value::Bool(b) => *b as i128,
            Value::I8(v) => *v as i128,
            Value::I16(v) => *v as i128,
            Value::I32(v) => *v as i128,
            Value::I64(v) => *v as i128,
            Value::U8(v) => *v as i128,
            Value::U16(v) => *v as i128,
            Value::U32(v) => *v as i128,
            Value::U64(v) => *v as i128,
            Value::F32(v) => *v as i128,
            Value::F64(v) => *v as i128,
            Value::Char(c) => *c as i128,
            Value::Enum(_, v) => *v as i128,
            _ => return None,
        })
    }

    /// Widen to f64.
    pub fn as_f64(&self) -> Option<f64> {
        Some(match self {
            Value::F32(v) => *v as f64,
            Value::F64(v) => *v,
            other => other.as_i128()? as f64,
        })
    }

    /// Convert this value to another primitive kind with the usual
    /// truncating/widening semantics. Returns `None` for non-primitives.
    pub fn convert_numeric(&self, target: NumKind) -> Option<Value> {
        if target == NumKind::Bool {
            return match self {
                Value::Bool(b) => Some(Value::Bool(*b)),
                _ => Some(Value::Bool(self.as_i128()? != 0)),
            };
        }
        if target == NumKind::Char {
            return match self {
                Value::Char(c) => Some(Value::Char(*c)),
                _ => char::from_u32(self.as_i128()? as u32).map(Value::Char),
            };
        }
        match target {
            NumKind::F32 => Some(Value::F32(self.as_f64()? as f32)),
            NumKind::F64 => Some(Value::F64(self.as_f64()?)),
            _ => {
                let wide = self.as_i128()?;
                Some(match target {
                    NumKind::I8 => Value::I8(wide as i8),
                    NumKind::I16 => Value::I16(wide as i16),
                    NumKind::I32 => Value::I32(wide as i32),
                    NumKind::I64 => Value::I64(wide as i64),
                    NumKind::U8 => Value::U8(wide as u8),
                    NumKind::U16 => Value::U16(wide as u16),
                    NumKind::U32 => Value::U32(wide as u32),
                    NumKind::U64 => Value::U64(wide as u64),
                    _ => unreachable!(),
                })
            }
        }
    }

    /// Reference identity for the forbidden-value check. Only objects and
    /// arrays have identity; everything else compares false.
    pub fn same_object(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(_, a), Value::Object(_, b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(&a.cells, &b.cells),
            _ => false,
        }
    }
}

/// Structural equality for primitives, identity for objects and arrays.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Void, Value::Void) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(ta, va), Value::Enum(tb, vb)) => ta == tb && va == vb,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Object(_, _), Value::Object(_, _))
            | (Value::Array(_), Value::Array(_)) => self.same_object(other),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_widening_and_truncation() {
        assert_eq!(Value::I32(300).convert_numeric(NumKind::U8), Some(Value::U8(44)));
        assert_eq!(
            Value::I32(5).convert_numeric(NumKind::F64).and_then(|v| v.as_f64()),
            Some(5.0)
        );
        assert_eq!(Value::Char('A').as_i128(), Some(65));
        assert_eq!(Value::Str("x".into()).convert_numeric(NumKind::I32), None);
    }

    #[test]
    fn enum_counts_as_integral() {
        let v = Value::Enum(42, 3);
        assert_eq!(v.num_kind(), Some(NumKind::I64));
        assert_eq!(v.as_i128(), Some(3));
    }

    #[test]
    fn object_identity() {
        let h = ObjectHandle::new(7u64);
        let a = Value::Object(0, h.clone());
        let b = Value::Object(0, h);
        let c = Value::Object(0, ObjectHandle::new(7u64));
        assert!(a.same_object(&b));
        assert!(!a.same_object(&c));
        assert!(!a.same_object(&Value::Null));
    }

    #[test]
    fn array_row_major_indexing() {
        let arr = ArrayRef::new(ArrayTy { elem: prim::I32, rank: 2 }, vec![2, 3], Value::I32(0));
        assert!(arr.set(&[1, 2], Value::I32(9)));
        assert_eq!(arr.get(&[1, 2]), Some(Value::I32(9)));
        assert_eq!(arr.get(&[0, 0]), Some(Value::I32(0)));
        assert_eq!(arr.get(&[2, 0]), None);
        assert_eq!(arr.get(&[0]), None);
    }
}
