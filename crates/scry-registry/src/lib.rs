// scry-registry -- host type metadata for the scry console.
//
// Rust has no runtime reflection, so the "live type metadata" the console
// resolves against is an explicit registry the host populates at startup:
// type descriptors whose members carry bound closures. The same interface
// could sit in front of genuine introspection on a platform that has it.

mod build;
mod convert;
mod desc;
pub mod demo;
mod registry;

pub use build::{RegistryBuilder, TypeBuilder};
pub use desc::{
    receiver, ConversionDesc, ConvertFn, CtorDesc, CtorFn, DefaultFn, DisplayFn, FieldDesc,
    GetFn, GlobalFn, IndexGetFn, IndexSetFn, IndexerDesc, InvokeFn, MethodDesc, ModuleDesc,
    Param, PropertyDesc, SetFn, TypeDesc, TypeKind,
};
pub use registry::{BaseChain, Registry};

#[cfg(test)]
mod tests {
    use super::*;
    use scry_common::value::{prim, TyRef, Value};

    #[test]
    fn primitives_are_seeded_in_order() {
        let reg = Registry::new();
        assert_eq!(reg.get(prim::I32).name, "int");
        assert_eq!(reg.get(prim::STRING).name, "string");
        assert_eq!(reg.get(prim::OBJECT).name, "object");
        assert_eq!(reg.type_count(), prim::COUNT);
        assert_eq!(reg.modules()[0].name, "core");
    }

    #[test]
    fn base_chain_walks_outward() {
        let mut b = RegistryBuilder::new();
        b.module("m");
        let base = b.ty("N", "Base").finish();
        let derived = b.ty("N", "Derived").base(base).finish();
        let reg = b.finish();
        let chain: Vec<_> = reg.base_chain(derived).collect();
        assert_eq!(chain, vec![derived, base]);
        assert!(reg.is_assignable(base, derived));
        assert!(!reg.is_assignable(derived, base));
    }

    #[test]
    fn array_names_render_rank() {
        let reg = Registry::new();
        let one = TyRef::Array(scry_common::value::ArrayTy { elem: prim::I32, rank: 1 });
        let two = TyRef::Array(scry_common::value::ArrayTy { elem: prim::I32, rank: 2 });
        assert_eq!(reg.ty_name(&one), "int[]");
        assert_eq!(reg.ty_name(&two), "int[,]");
    }

    #[test]
    fn enum_constant_display_uses_names() {
        let mut b = RegistryBuilder::new();
        b.module("m");
        let color = b
            .ty("N", "Color")
            .enum_type()
            .constant("Red", 0)
            .constant("Blue", 2)
            .finish();
        let reg = b.finish();
        assert_eq!(reg.display(&Value::Enum(color, 2)), "N.Color.Blue");
        assert_eq!(reg.display(&Value::Enum(color, 9)), "9");
    }
}
