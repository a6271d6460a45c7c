//! Maps canonical types to LLVM types.
//!
//! Every type is registered after the types it is built from, so walking
//! the registry in order only ever looks up already-converted children.

use inkwell::{
    context::Context,
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum},
    AddressSpace,
};
use rustc_hash::FxHashMap;

use crate::types::type_manager::{Primitive, TypeId, TypeKind, TypeManager};

pub struct LowLevelTypes<'ctx> {
    context: &'ctx Context,
    cache: FxHashMap<TypeId, BasicTypeEnum<'ctx>>,
}

impl<'ctx> LowLevelTypes<'ctx> {
    pub fn new(context: &'ctx Context) -> Self {
        LowLevelTypes {
            context,
            cache: FxHashMap::default(),
        }
    }

    /// Converts every registered type in registration order. Parameters and
    /// the error type have no low-level form and yield `None`.
    pub fn lower_all(&mut self, types: &TypeManager) -> Vec<Option<BasicTypeEnum<'ctx>>> {
        (0..types.len())
            .map(|index| self.to_low_level_type(types, TypeId(index as u32)))
            .collect()
    }

    pub fn to_low_level_type(&mut self, types: &TypeManager, ty: TypeId) -> Option<BasicTypeEnum<'ctx>> {
        if let Some(&cached) = self.cache.get(&ty) {
            return Some(cached);
        }

        let lowered: BasicTypeEnum<'ctx> = match types.kind(ty) {
            TypeKind::Primitive(primitive) => self.primitive(*primitive),
            TypeKind::List { element, length } => {
                let element = self.to_low_level_type(types, *element)?;
                match length {
                    Some(length) => element.array_type(*length as u32).into(),
                    None => element.ptr_type(AddressSpace::default()).into(),
                }
            }
            TypeKind::Tuple { fields } => {
                let fields = fields
                    .iter()
                    .map(|field| self.to_low_level_type(types, field.ty))
                    .collect::<Option<Vec<_>>>()?;
                self.context.struct_type(&fields, false).into()
            }
            TypeKind::Reference { target } => {
                let target = self.to_low_level_type(types, *target)?;
                target.ptr_type(AddressSpace::default()).into()
            }
            TypeKind::Named { expanded, .. } => self.to_low_level_type(types, *expanded)?,
            TypeKind::Func { arguments, ret } => {
                let parameters: Vec<BasicMetadataTypeEnum<'ctx>> = types
                    .tuple_fields(*arguments)
                    .unwrap_or(&[])
                    .iter()
                    .map(|field| self.to_low_level_type(types, field.ty).map(Into::into))
                    .collect::<Option<_>>()?;
                let ret = self.to_low_level_type(types, *ret)?;
                ret.fn_type(&parameters, false)
                    .ptr_type(AddressSpace::default())
                    .into()
            }
            TypeKind::Param { .. } | TypeKind::Error => return None,
        };

        self.cache.insert(ty, lowered);
        Some(lowered)
    }

    fn primitive(&self, primitive: Primitive) -> BasicTypeEnum<'ctx> {
        match primitive {
            Primitive::Bool => self.context.bool_type().into(),
            Primitive::Int8 => self.context.i8_type().into(),
            Primitive::Int16 => self.context.i16_type().into(),
            Primitive::Int32 => self.context.i32_type().into(),
            Primitive::Int64 => self.context.i64_type().into(),
            Primitive::Float32 => self.context.f32_type().into(),
            Primitive::Float64 => self.context.f64_type().into(),
            Primitive::Float80 => self.context.x86_f80_type().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use inkwell::context::Context;

    use super::LowLevelTypes;
    use crate::types::type_manager::{TupleField, TypeId, TypeManager};

    #[test]
    fn test_lowering_follows_registration_order() {
        let context = Context::create();
        let mut types = TypeManager::new();
        let list = types.make_list(TypeId::INT32, Some(4));
        let pair = types.make_tuple(vec![TupleField::named("x", TypeId::FLOAT64), TupleField::unnamed(list)]);
        let param = types.make_param("T");

        let mut lowering = LowLevelTypes::new(&context);
        let lowered = lowering.lower_all(&types);

        assert_eq!(lowered.len(), types.len());
        assert!(lowered[TypeId::ERROR.0 as usize].is_none());
        assert!(lowered[param.0 as usize].is_none());
        assert_eq!(
            lowered[list.0 as usize],
            Some(context.i32_type().array_type(4).into())
        );
        assert!(lowered[pair.0 as usize].unwrap().is_struct_type());
    }
}
