//! Unit tests for hash-consing, generic instantiation and the cost compare.

use super::{
    compare::{primitive_cost, promote, Cost},
    type_manager::{Primitive, TupleField, TypeId, TypeKind, TypeManager},
};

#[test]
fn test_primitives_have_fixed_handles() {
    let types = TypeManager::new();

    for primitive in Primitive::ALL {
        assert_eq!(types.primitive(primitive.type_id()), Some(primitive));
    }
    assert!(types.is_error(TypeId::ERROR));
    assert_eq!(types.tuple_fields(TypeId::UNIT).map(|f| f.len()), Some(0));
}

#[test]
fn test_structural_types_are_hash_consed() {
    let mut types = TypeManager::new();

    let a = types.make_list(TypeId::INT32, Some(4));
    let b = types.make_list(TypeId::INT32, Some(4));
    let c = types.make_list(TypeId::INT32, None);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let t1 = types.make_tuple(vec![TupleField::named("x", TypeId::INT32), TupleField::unnamed(a)]);
    let t2 = types.make_tuple(vec![TupleField::named("x", TypeId::INT32), TupleField::unnamed(b)]);
    assert_eq!(t1, t2);

    let r1 = types.make_reference(t1);
    let r2 = types.make_reference(t2);
    assert_eq!(r1, r2);

    assert_eq!(types.make_unnamed_tuple(&[]), TypeId::UNIT);
}

#[test]
fn test_params_are_never_shared() {
    let mut types = TypeManager::new();

    let first = types.make_param("T");
    let second = types.make_param("T");

    assert_ne!(first, second);
}

#[test]
fn test_generic_instantiation_substitutes_and_clears() {
    let mut types = TypeManager::new();
    let param = types.make_param("T");
    let body = types.make_tuple(vec![
        TupleField::named("first", param),
        TupleField::named("second", param),
    ]);

    let pair_int = types.make_named(body, "Pair", &[param], vec![TypeId::INT32]);
    let again = types.make_named(body, "Pair", &[param], vec![TypeId::INT32]);
    assert_eq!(pair_int, again);

    let expected_body = types.make_tuple(vec![
        TupleField::named("first", TypeId::INT32),
        TupleField::named("second", TypeId::INT32),
    ]);
    assert_eq!(types.strip_named(pair_int), expected_body);

    // The parameter is free again: a second instantiation sees it unsubstituted.
    let pair_bool = types.make_named(body, "Pair", &[param], vec![TypeId::BOOL]);
    assert_ne!(pair_bool, pair_int);
    let bool_fields = types.tuple_fields(types.strip_named(pair_bool)).unwrap();
    assert_eq!(bool_fields[0].ty, TypeId::BOOL);
}

#[test]
fn test_missing_generic_args_become_synthesized_params() {
    let mut types = TypeManager::new();
    let param = types.make_param("T");
    let body = types.make_list(param, None);

    let open = types.make_named(body, "Vec", &[param], vec![]);

    match types.kind(open) {
        TypeKind::Named { args, .. } => {
            assert_eq!(args.len(), 1);
            assert_eq!(types.display(args[0]), "<T in Vec>");
            assert_ne!(args[0], param);
        }
        other => panic!("expected a named type, got {:?}", other),
    }
}

#[test]
fn test_compare_is_reflexive() {
    let mut types = TypeManager::new();
    let list = types.make_list(TypeId::FLOAT64, Some(3));
    let tuple = types.make_unnamed_tuple(&[list, TypeId::BOOL]);
    let reference = types.make_reference(tuple);
    let func = types.make_func(tuple, reference);
    let named = types.make_named(TypeId::INT32, "Meters", &[], vec![]);

    for ty in [TypeId::INT8, list, tuple, reference, func, named, TypeId::UNIT] {
        assert_eq!(types.compare(ty, ty), Cost::ZERO);
    }
}

#[test]
fn test_primitive_costs() {
    assert_eq!(primitive_cost(Primitive::Int32, Primitive::Int64), Cost::Valid(1));
    assert_eq!(primitive_cost(Primitive::Int64, Primitive::Int32), Cost::Valid(2));
    assert_eq!(primitive_cost(Primitive::Int64, Primitive::Int8), Cost::Valid(6));
    assert_eq!(primitive_cost(Primitive::Int64, Primitive::Float32), Cost::Valid(10));
    assert_eq!(primitive_cost(Primitive::Int8, Primitive::Float64), Cost::Valid(11));
    assert_eq!(primitive_cost(Primitive::Float32, Primitive::Float80), Cost::Valid(2));
    assert_eq!(primitive_cost(Primitive::Float64, Primitive::Float32), Cost::Valid(2));
    assert_eq!(primitive_cost(Primitive::Float64, Primitive::Int64), Cost::Invalid);
    assert_eq!(primitive_cost(Primitive::Bool, Primitive::Int8), Cost::Invalid);
    assert_eq!(primitive_cost(Primitive::Int8, Primitive::Bool), Cost::Invalid);
}

#[test]
fn test_invalid_sorts_after_every_valid_cost() {
    assert!(Cost::Valid(u32::MAX) < Cost::Invalid);
    assert_eq!(Cost::Valid(3) + Cost::Valid(4), Cost::Valid(7));
    assert_eq!(Cost::Valid(3) + Cost::Invalid, Cost::Invalid);
}

#[test]
fn test_two_nominal_types_with_same_expansion_compare_equal() {
    let mut types = TypeManager::new();
    let meters = types.make_named(TypeId::INT32, "Meters", &[], vec![]);
    let feet = types.make_named(TypeId::INT32, "Feet", &[], vec![]);

    assert_ne!(meters, feet);
    assert_eq!(types.compare(meters, feet), Cost::ZERO);
    assert_eq!(types.compare(meters, TypeId::INT32), Cost::Valid(1));
    assert_eq!(types.compare(TypeId::INT32, feet), Cost::Valid(1));
}

#[test]
fn test_singleton_tuple_matches_its_field() {
    let mut types = TypeManager::new();
    let single = types.make_unnamed_tuple(&[TypeId::INT64]);

    assert_eq!(types.compare(single, TypeId::INT64), Cost::ZERO);
    assert_eq!(types.compare(TypeId::INT64, single), Cost::ZERO);
    assert_eq!(types.compare(single, TypeId::INT32), Cost::Valid(2));
}

#[test]
fn test_list_length_rules() {
    let mut types = TypeManager::new();
    let fixed = types.make_list(TypeId::INT8, Some(4));
    let other_fixed = types.make_list(TypeId::INT8, Some(5));
    let open = types.make_list(TypeId::INT8, None);

    assert_eq!(types.compare(fixed, open), Cost::Valid(1));
    assert_eq!(types.compare(open, fixed), Cost::Invalid);
    assert_eq!(types.compare(fixed, other_fixed), Cost::Invalid);
}

#[test]
fn test_tuple_field_names_must_agree() {
    let mut types = TypeManager::new();
    let xy = types.make_tuple(vec![TupleField::named("x", TypeId::INT32), TupleField::named("y", TypeId::INT32)]);
    let yx = types.make_tuple(vec![TupleField::named("y", TypeId::INT32), TupleField::named("x", TypeId::INT32)]);
    let plain = types.make_unnamed_tuple(&[TypeId::INT32, TypeId::INT64]);

    assert_eq!(types.compare(xy, yx), Cost::Invalid);
    assert_eq!(types.compare(plain, xy), Cost::Valid(2));
}

#[test]
fn test_references_only_match_exactly() {
    let mut types = TypeManager::new();
    let ref_int32 = types.make_reference(TypeId::INT32);
    let ref_int64 = types.make_reference(TypeId::INT64);

    assert_eq!(types.compare(ref_int32, ref_int64), Cost::Invalid);
    assert_eq!(types.compare(ref_int32, TypeId::INT32), Cost::Invalid);
}

#[test]
fn test_params_and_errors_match_anything() {
    let mut types = TypeManager::new();
    let param = types.make_param("T");

    assert_eq!(types.compare(TypeId::BOOL, param), Cost::Valid(2));
    assert_eq!(types.compare(TypeId::ERROR, TypeId::BOOL), Cost::ZERO);
    let poisoned = types.make_unnamed_tuple(&[TypeId::INT8, TypeId::ERROR]);
    assert!(types.contains_error(poisoned));
}

#[test]
fn test_promotion_target() {
    assert_eq!(promote(Primitive::Int32, Primitive::Int32), None);
    assert_eq!(promote(Primitive::Int8, Primitive::Int32), Some(Primitive::Int32));
    assert_eq!(promote(Primitive::Int64, Primitive::Float32), Some(Primitive::Float32));
    assert_eq!(promote(Primitive::Float80, Primitive::Float64), Some(Primitive::Float80));
    assert_eq!(promote(Primitive::Bool, Primitive::Int8), None);
}

#[test]
fn test_display() {
    let mut types = TypeManager::new();
    let list = types.make_list(TypeId::INT8, Some(4));
    let tuple = types.make_tuple(vec![TupleField::named("x", TypeId::INT32), TupleField::unnamed(TypeId::BOOL)]);
    let reference = types.make_reference(TypeId::FLOAT64);
    let args = types.make_unnamed_tuple(&[TypeId::INT32]);
    let func = types.make_func(args, TypeId::BOOL);

    assert_eq!(types.display(list), "[int8; 4]");
    assert_eq!(types.display(tuple), "(x: int32, bool)");
    assert_eq!(types.display(reference), "@float64");
    assert_eq!(types.display(func), "fn(int32) -> bool");
    assert_eq!(types.display(TypeId::UNIT), "()");
}
