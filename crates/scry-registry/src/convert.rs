//! The conversion rule shared by the resolver (static `can_convert` probes)
//! and the evaluator (runtime `convert_value`).
//!
//! A source converts to a target when any of the following holds:
//! identical type; target assignable from source; both are convertible
//! numeric/enum primitive kinds; or a one-argument implicit conversion
//! operator exists from source to target, searched on both types' operator
//! tables. A null source additionally converts to any reference-shaped
//! target.

use scry_common::error::RuntimeError;
use scry_common::value::{prim, NumKind, TyRef, Value};

use crate::desc::{ConvertFn, TypeKind};
use crate::registry::Registry;

impl Registry {
    /// Whether this named type counts as a numeric/enum primitive kind.
    fn is_numeric_kind(&self, id: scry_common::value::TypeId) -> bool {
        NumKind::of_type(id).is_some() || self.get(id).kind == TypeKind::Enum
    }

    /// Static convertibility probe. `source = None` is the null literal.
    pub fn can_convert(&self, target: &TyRef, source: Option<&TyRef>) -> bool {
        let Some(source) = source else {
            return self.accepts_null(target);
        };
        if target == source {
            return true;
        }
        match (target, source) {
            (TyRef::Named(t), TyRef::Named(s)) => {
                if self.is_assignable(*t, *s) {
                    return true;
                }
                if self.is_numeric_kind(*t) && self.is_numeric_kind(*s) {
                    return true;
                }
                self.find_conversion(target, source).is_some()
            }
            // Arrays convert only to object (and to their own type, above).
            (TyRef::Named(t), TyRef::Array(_)) => *t == prim::OBJECT,
            _ => false,
        }
    }

    /// Find an implicit conversion operator from `source` to `target`,
    /// searching the operator tables of both types.
    pub fn find_conversion(&self, target: &TyRef, source: &TyRef) -> Option<ConvertFn> {
        let mut sides = Vec::with_capacity(2);
        if let TyRef::Named(t) = target {
            sides.push(*t);
        }
        if let TyRef::Named(s) = source {
            sides.push(*s);
        }
        for side in sides {
            for conv in &self.get(side).conversions {
                if &conv.from == source && &conv.to == target {
                    return Some(conv.convert.clone());
                }
            }
        }
        None
    }

    /// Runtime conversion of an argument or assignment value to its
    /// declared parameter/member type.
    pub fn convert_value(&self, value: &Value, target: &TyRef) -> Result<Value, RuntimeError> {
        let fail = || RuntimeError::ConversionFailed { to: self.ty_name(target) };

        if value.is_null() {
            return if self.accepts_null(target) { Ok(Value::Null) } else { Err(fail()) };
        }
        let source = self.type_of(value);
        if source.as_ref() == Some(target) {
            return Ok(value.clone());
        }
        if let TyRef::Named(t) = target {
            if *t == prim::OBJECT {
                return Ok(value.clone());
            }
            // Numeric/enum kind conversion.
            if self.get(*t).kind == TypeKind::Enum {
                if let Some(repr) = value.as_i128() {
                    return Ok(Value::Enum(*t, repr as i64));
                }
            }
            if let Some(kind) = NumKind::of_type(*t) {
                if let Some(converted) = value.convert_numeric(kind) {
                    return Ok(converted);
                }
            }
            // Upcast along the base chain.
            if let Some(TyRef::Named(s)) = source {
                if self.is_assignable(*t, s) {
                    return Ok(value.clone());
                }
            }
        }
        if let Some(source) = &source {
            if let Some(thunk) = self.find_conversion(target, source) {
                return thunk(value);
            }
        }
        Err(fail())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_kinds_interconvert() {
        let reg = Registry::new();
        let int = TyRef::Named(prim::I32);
        let double = TyRef::Named(prim::F64);
        assert!(reg.can_convert(&double, Some(&int)));
        assert!(reg.can_convert(&int, Some(&double)));
        assert!(!reg.can_convert(&int, Some(&TyRef::Named(prim::STRING))));
        assert_eq!(
            reg.convert_value(&Value::I32(5), &double).unwrap(),
            Value::F64(5.0)
        );
    }

    #[test]
    fn null_converts_to_reference_targets_only() {
        let reg = Registry::new();
        assert!(reg.can_convert(&TyRef::Named(prim::STRING), None));
        assert!(reg.can_convert(&TyRef::Named(prim::OBJECT), None));
        assert!(!reg.can_convert(&TyRef::Named(prim::I32), None));
    }

    #[test]
    fn everything_converts_to_object() {
        let reg = Registry::new();
        let object = TyRef::Named(prim::OBJECT);
        assert!(reg.can_convert(&object, Some(&TyRef::Named(prim::BOOL))));
        let arr = TyRef::Array(scry_common::value::ArrayTy { elem: prim::I32, rank: 1 });
        assert!(reg.can_convert(&object, Some(&arr)));
        assert_eq!(
            reg.convert_value(&Value::Str("x".into()), &object).unwrap(),
            Value::Str("x".into())
        );
    }
}
