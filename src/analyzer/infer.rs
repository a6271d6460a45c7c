//! Phase 3: type inference, overload resolution and constant folding.
//!
//! Statements are analyzed in order and the steps of every basic block
//! one after another, so a step's operands are always typed before the
//! step itself. Nodes may be replaced while this runs (operators become
//! intrinsic calls, constant branches collapse), and each analysis
//! function returns whatever node ends up in the analyzed slot.

use crate::{
    analyzer::{
        overload::{binding_of, callable_signature, resolve_overload, Binding, Resolution},
        promotion::promote_operands,
        signature::{function_signature, return_type},
        type_resolve::{resolve_type, resolve_type_def},
    },
    ast::{
        ast::{Annotation, NodeId},
        nodes::{NodeKind, TempId, TypeExpr},
    },
    context::Context,
    errors::errors::{Error, ErrorImpl, Severity},
    scope::decls::DeclId,
    types::{
        compare::Cost,
        type_manager::{TupleField, TypeId, TypeKind},
    },
    value::{
        fold::{cast_value, fold_intrinsic, Folded},
        value::Value,
    },
    Position,
};

use super::intrinsics::IntrinsicOp;

/// What the code being analyzed sits inside of.
#[derive(Debug, Clone, Copy)]
struct FnContext {
    /// Declared return type of the enclosing function.
    ret: Option<TypeId>,
}

pub fn infer_module(ctx: &mut Context, root: NodeId) {
    let top_level = FnContext { ret: None };
    analyze_children(ctx, root, top_level);
}

fn analyze_children(ctx: &mut Context, node: NodeId, fcx: FnContext) {
    let mut index = 0;
    while let Some(child) = ctx.ast.child(node, index) {
        let analyzed = analyze_statement(ctx, child, fcx);
        index = match ctx.ast.parent(analyzed) {
            Some(parent) if parent == node => ctx.ast.index_in_parent(analyzed).unwrap_or(index) + 1,
            _ => index + 1,
        };
    }
}

fn analyze_statement(ctx: &mut Context, node: NodeId, fcx: FnContext) -> NodeId {
    match ctx.ast.kind(node) {
        NodeKind::Pair | NodeKind::BasicBlock => {
            analyze_children(ctx, node, fcx);
            annotate_container(ctx, node);
            node
        }
        NodeKind::If => analyze_if(ctx, node, fcx),
        NodeKind::While => analyze_while(ctx, node, fcx),
        NodeKind::FuncDecl { decl } => {
            let decl = *decl;
            analyze_function(ctx, node, decl);
            node
        }
        NodeKind::TypeDecl { name } => {
            let name = name.clone();
            analyze_type_decl(ctx, node, &name);
            node
        }
        NodeKind::Import { .. } | NodeKind::Module { .. } => node,
        _ => analyze_step(ctx, node, fcx),
    }
}

/// A container's value is the value of its last element.
fn annotate_container(ctx: &mut Context, node: NodeId) {
    let annotation = match ctx.ast.children(node).last() {
        Some(&last) => {
            let last = ctx.ast.annotation(last);
            Annotation {
                ty: Some(last.ty.unwrap_or(TypeId::UNIT)),
                value: last.value.clone(),
                lvalue: false,
                binding: None,
            }
        }
        None => Annotation {
            ty: Some(TypeId::UNIT),
            ..Annotation::default()
        },
    };
    *ctx.ast.annotation_mut(node) = annotation;
}

fn set_type(ctx: &mut Context, node: NodeId, ty: TypeId) {
    ctx.ast.annotation_mut(node).ty = Some(ty);
}

fn type_of(ctx: &Context, node: NodeId) -> TypeId {
    ctx.ast.ty(node).unwrap_or(TypeId::ERROR)
}

fn position_of(ctx: &Context, node: NodeId) -> Position {
    ctx.ast.span(node).start.clone()
}

fn type_mismatch(ctx: &mut Context, node: NodeId, expected: TypeId, received: TypeId) {
    let error = Error::new(
        ErrorImpl::TypeMatchError {
            expected: ctx.types.display(expected),
            received: ctx.types.display(received),
        },
        position_of(ctx, node),
    );
    ctx.report(error);
}

/// Whether some temporary holds the result of `node`.
fn produces_value(ctx: &Context, node: NodeId) -> bool {
    ctx.temps.iter().any(|temp| temp.set_by == node)
}

/// Replaces an attached `old` by `new` and points its temporaries at `new`.
fn substitute_node(ctx: &mut Context, old: NodeId, new: NodeId) {
    ctx.ast.replace_node(old, new);
    ctx.retarget_temps(old, new);
}

fn check_condition(ctx: &mut Context, condition: NodeId) {
    let ty = type_of(ctx, condition);
    if ctx.types.contains_error(ty) {
        return;
    }
    if !ctx.types.compare(ty, TypeId::BOOL).is_valid() {
        type_mismatch(ctx, condition, TypeId::BOOL, ty);
    }
}

fn constant_condition(ctx: &mut Context, condition: NodeId) -> Option<bool> {
    let value = ctx.ast.annotation(condition).value.as_ref()?.as_bool()?;
    ctx.report(
        Error::new(ErrorImpl::ConstantCondition { value }, position_of(ctx, condition))
            .with_severity(Severity::Nitpick),
    );
    Some(value)
}

fn empty_block_like(ctx: &mut Context, node: NodeId) -> NodeId {
    let span = ctx.ast.span(node).clone();
    let scope = ctx.ast.scope(node);
    let block = ctx.ast.add(NodeKind::BasicBlock, span, scope);
    set_type(ctx, block, TypeId::UNIT);
    block
}

fn analyze_if(ctx: &mut Context, node: NodeId, fcx: FnContext) -> NodeId {
    let condition = match ctx.ast.child(node, 0) {
        Some(condition) => analyze_statement(ctx, condition, fcx),
        None => return node,
    };
    check_condition(ctx, condition);

    if let Some(taken) = constant_condition(ctx, condition) {
        let parts = ctx.ast.take_children(node);
        let arm = parts.get(if taken { 1 } else { 2 }).copied();

        let replacement = match arm {
            Some(arm) => arm,
            None => empty_block_like(ctx, node),
        };
        substitute_node(ctx, node, replacement);
        tracing::debug!(target: "fold", taken, "constant condition selected one arm");

        let analyzed = analyze_statement(ctx, replacement, fcx);
        ctx.retarget_temps(replacement, analyzed);
        return analyzed;
    }

    let mut arm_types = vec![];
    let mut index = 1;
    while let Some(arm) = ctx.ast.child(node, index) {
        let analyzed = analyze_statement(ctx, arm, fcx);
        arm_types.push(type_of(ctx, analyzed));
        index += 1;
    }

    let ty = match arm_types.as_slice() {
        [then_ty, else_ty] if produces_value(ctx, node) => join_arms(ctx, node, *then_ty, *else_ty),
        _ => TypeId::UNIT,
    };
    set_type(ctx, node, ty);
    node
}

/// Type of an `if` whose value is used: the arm the other converts to.
fn join_arms(ctx: &mut Context, node: NodeId, then_ty: TypeId, else_ty: TypeId) -> TypeId {
    if ctx.types.contains_error(then_ty) || ctx.types.contains_error(else_ty) {
        return TypeId::ERROR;
    }
    if ctx.types.compare(else_ty, then_ty).is_valid() {
        then_ty
    } else if ctx.types.compare(then_ty, else_ty).is_valid() {
        else_ty
    } else {
        type_mismatch(ctx, node, then_ty, else_ty);
        TypeId::ERROR
    }
}

fn analyze_while(ctx: &mut Context, node: NodeId, fcx: FnContext) -> NodeId {
    let condition = match ctx.ast.child(node, 0) {
        Some(condition) => analyze_statement(ctx, condition, fcx),
        None => return node,
    };
    check_condition(ctx, condition);

    if constant_condition(ctx, condition) == Some(false) {
        ctx.ast.take_children(node);
        let replacement = empty_block_like(ctx, node);
        substitute_node(ctx, node, replacement);
        return replacement;
    }

    if let Some(body) = ctx.ast.child(node, 1) {
        analyze_statement(ctx, body, fcx);
    }
    set_type(ctx, node, TypeId::UNIT);
    node
}

fn analyze_function(ctx: &mut Context, node: NodeId, decl: DeclId) {
    let signature = function_signature(ctx, decl);
    let ret = return_type(ctx, decl);
    set_type(ctx, node, signature);

    if let Some(body) = ctx.ast.child(node, 0) {
        analyze_statement(ctx, body, FnContext { ret: Some(ret) });
    }
}

fn analyze_type_decl(ctx: &mut Context, node: NodeId, name: &str) {
    let scope = ctx.ast.scope(node);
    if let Some(def) = ctx.scopes.get_type_def(scope, name) {
        let position = position_of(ctx, node);
        resolve_type_def(ctx, def, &position);
    }
    set_type(ctx, node, TypeId::UNIT);
}

/// A temporary reads whatever its producing step was annotated with.
fn copy_producer(ctx: &mut Context, node: NodeId, temp: TempId) {
    let producer = ctx.temp(temp).set_by;
    let mut annotation = ctx.ast.annotation(producer).clone();
    annotation.value = annotation.value.map(|value| value.duplicate());
    if annotation.ty.is_none() {
        annotation.ty = Some(TypeId::ERROR);
    }
    *ctx.ast.annotation_mut(node) = annotation;
}

/// Analyzes one basic-block step.
fn analyze_step(ctx: &mut Context, node: NodeId, fcx: FnContext) -> NodeId {
    let kind = ctx.ast.kind(node).clone();
    let operands = ctx.ast.children(node).to_vec();
    for operand in operands {
        if let NodeKind::Temp { temp } = ctx.ast.kind(operand) {
            let temp = *temp;
            copy_producer(ctx, operand, temp);
        }
    }
    let poisoned = ctx
        .ast
        .children(node)
        .iter()
        .any(|&operand| ctx.types.contains_error(type_of(ctx, operand)));

    match kind {
        NodeKind::Literal => {
            if ctx.ast.ty(node).is_none() {
                set_type(ctx, node, TypeId::ERROR);
            }
            node
        }
        NodeKind::NullValue => {
            let annotation = ctx.ast.annotation_mut(node);
            annotation.ty = Some(TypeId::UNIT);
            annotation.value = Some(Value::null());
            node
        }
        NodeKind::Temp { temp } => {
            copy_producer(ctx, node, temp);
            node
        }
        NodeKind::Symbol { name } => {
            analyze_symbol(ctx, node, &name);
            node
        }
        NodeKind::Binary { op } => {
            if poisoned {
                set_type(ctx, node, TypeId::ERROR);
                return node;
            }
            analyze_operator(ctx, node, op.symbol(), op.promotes_operands())
        }
        NodeKind::Unary { op } => {
            if poisoned {
                set_type(ctx, node, TypeId::ERROR);
                return node;
            }
            analyze_operator(ctx, node, op.symbol(), false)
        }
        NodeKind::Call { name } => {
            if poisoned {
                set_type(ctx, node, TypeId::ERROR);
                return node;
            }
            analyze_call(ctx, node, &name)
        }
        NodeKind::IntrinsicCall { op } => {
            fold(ctx, node, op);
            node
        }
        NodeKind::Cast { target } => {
            analyze_cast(ctx, node, target);
            node
        }
        NodeKind::Assign => {
            let ty = if poisoned { TypeId::ERROR } else { analyze_assign(ctx, node) };
            set_type(ctx, node, ty);
            node
        }
        NodeKind::RefBind => {
            let ty = if poisoned { TypeId::ERROR } else { analyze_ref_bind(ctx, node) };
            set_type(ctx, node, ty);
            node
        }
        NodeKind::Tuple { names } => {
            analyze_tuple(ctx, node, &names);
            node
        }
        NodeKind::List => {
            let ty = if poisoned { TypeId::ERROR } else { analyze_list(ctx, node) };
            set_type(ctx, node, ty);
            node
        }
        NodeKind::Index => {
            if poisoned {
                set_type(ctx, node, TypeId::ERROR);
            } else {
                analyze_index(ctx, node);
            }
            node
        }
        NodeKind::Field { name } => {
            if poisoned {
                set_type(ctx, node, TypeId::ERROR);
            } else {
                analyze_field(ctx, node, &name);
            }
            node
        }
        NodeKind::Return => {
            analyze_return(ctx, node, fcx, poisoned);
            node
        }
        NodeKind::VarDecl {
            decl,
            declared,
            is_ref,
        } => {
            analyze_var_decl(ctx, node, decl, declared.as_ref(), is_ref);
            node
        }
        NodeKind::ExprStmt => {
            let value = ctx.ast.child(node, 0);
            if let Some(value) = value {
                analyze_step(ctx, value, fcx);
            }
            set_type(ctx, node, TypeId::UNIT);
            node
        }
        NodeKind::Module { .. }
        | NodeKind::Block
        | NodeKind::Pair
        | NodeKind::BasicBlock
        | NodeKind::If
        | NodeKind::While
        | NodeKind::FuncDecl { .. }
        | NodeKind::TypeDecl { .. }
        | NodeKind::Import { .. } => analyze_statement(ctx, node, fcx),
    }
}

fn analyze_symbol(ctx: &mut Context, node: NodeId, name: &str) {
    let scope = ctx.ast.scope(node);
    let defs = ctx.scopes.get_var_defs(scope, name);

    let decl = match defs.first() {
        Some(&decl) => decl,
        None => {
            ctx.report(Error::new(
                ErrorImpl::VariableNotDeclared {
                    variable: name.to_string(),
                },
                position_of(ctx, node),
            ));
            set_type(ctx, node, TypeId::ERROR);
            return;
        }
    };

    let entry = ctx.decls.get(decl);
    if entry.is_callable_decl() {
        let callables: Vec<DeclId> = defs
            .iter()
            .copied()
            .filter(|&candidate| ctx.decls.get(candidate).is_callable_decl())
            .collect();
        if callables.len() > 1 {
            report_ambiguity(ctx, node, name, &callables);
        }

        let ty = callable_signature(ctx, decl).unwrap_or(TypeId::ERROR);
        let binding = binding_of(ctx, decl);
        let annotation = ctx.ast.annotation_mut(node);
        annotation.ty = Some(ty);
        annotation.value = Some(Value::function(decl, ty));
        annotation.binding = Some(binding);
        annotation.lvalue = false;
        return;
    }

    if !entry.ready {
        ctx.report(Error::new(
            ErrorImpl::UsedBeforeDeclaration {
                variable: name.to_string(),
            },
            position_of(ctx, node),
        ));
        set_type(ctx, node, TypeId::ERROR);
        return;
    }

    let value = if entry.is_const() {
        entry.value.as_ref().map(Value::duplicate)
    } else {
        None
    };
    let ty = entry.ty.unwrap_or(TypeId::ERROR);

    let annotation = ctx.ast.annotation_mut(node);
    annotation.ty = Some(ty);
    annotation.value = value;
    annotation.binding = Some(Binding::Decl(decl));
}

fn report_ambiguity(ctx: &mut Context, node: NodeId, name: &str, tied: &[DeclId]) {
    let notes = tied
        .iter()
        .map(|&decl| ctx.decls.get(decl).position.clone())
        .collect();
    ctx.report(
        Error::new(
            ErrorImpl::AmbiguousOverload {
                name: name.to_string(),
                candidates: tied.len(),
            },
            position_of(ctx, node),
        )
        .with_notes(notes),
    );
}

fn argument_tuple(ctx: &mut Context, node: NodeId) -> TypeId {
    let types: Vec<TypeId> = ctx
        .ast
        .children(node)
        .iter()
        .map(|&operand| type_of(ctx, operand))
        .collect();
    ctx.types.make_unnamed_tuple(&types)
}

/// True when the resolved candidate takes exactly the argument types.
fn is_exact_match(ctx: &Context, resolution: &Resolution, arguments: TypeId) -> bool {
    match resolution {
        Resolution::Resolved { signature, .. } => ctx
            .types
            .func_parts(*signature)
            .map_or(false, |(parameters, _)| parameters == arguments),
        _ => false,
    }
}

/// Resolves an operator. Mixed arithmetic operands that do not hit an
/// exact overload are promoted to a common type and resolved again.
fn analyze_operator(ctx: &mut Context, node: NodeId, symbol: &str, promotes: bool) -> NodeId {
    let mut arguments = argument_tuple(ctx, node);
    let scope = ctx.ast.scope(node);

    let mut resolution = resolve_overload(ctx, scope, symbol, arguments);
    if promotes && !is_exact_match(ctx, &resolution, arguments) && promote_operands(ctx, node) > 0 {
        arguments = argument_tuple(ctx, node);
        resolution = resolve_overload(ctx, scope, symbol, arguments);
    }

    match resolution {
        Resolution::Resolved { decl, signature } => bind(ctx, node, decl, signature),
        Resolution::Ambiguous {
            first,
            signature,
            tied,
        } => {
            report_ambiguity(ctx, node, symbol, &tied);
            bind(ctx, node, first, signature)
        }
        Resolution::NoMatch | Resolution::NotDefined => {
            let error = Error::new(
                ErrorImpl::NoMatchingOverload {
                    name: symbol.to_string(),
                    arguments: ctx.types.display(arguments),
                },
                position_of(ctx, node),
            );
            ctx.report(error);
            set_type(ctx, node, TypeId::ERROR);
            node
        }
    }
}

fn analyze_call(ctx: &mut Context, node: NodeId, name: &str) -> NodeId {
    let arguments = argument_tuple(ctx, node);
    let scope = ctx.ast.scope(node);

    match resolve_overload(ctx, scope, name, arguments) {
        Resolution::Resolved { decl, signature } => bind(ctx, node, decl, signature),
        Resolution::Ambiguous {
            first,
            signature,
            tied,
        } => {
            report_ambiguity(ctx, node, name, &tied);
            bind(ctx, node, first, signature)
        }
        Resolution::NoMatch => {
            let error = Error::new(
                ErrorImpl::NoMatchingOverload {
                    name: name.to_string(),
                    arguments: ctx.types.display(arguments),
                },
                position_of(ctx, node),
            );
            ctx.report(error);
            set_type(ctx, node, TypeId::ERROR);
            node
        }
        Resolution::NotDefined => {
            ctx.report(Error::new(
                ErrorImpl::VariableNotDeclared {
                    variable: name.to_string(),
                },
                position_of(ctx, node),
            ));
            set_type(ctx, node, TypeId::ERROR);
            node
        }
    }
}

/// Annotates a resolved call. Intrinsics replace the node by a
/// specialized call, which is then folded.
fn bind(ctx: &mut Context, node: NodeId, decl: DeclId, signature: TypeId) -> NodeId {
    let ret = ctx
        .types
        .func_parts(signature)
        .map(|(_, ret)| ret)
        .unwrap_or(TypeId::ERROR);

    match binding_of(ctx, decl) {
        Binding::Intrinsic(op) => {
            let span = ctx.ast.span(node).clone();
            let scope = ctx.ast.scope(node);
            let operands = ctx.ast.take_children(node);
            let call = ctx
                .ast
                .add_with_children(NodeKind::IntrinsicCall { op }, span, scope, operands);
            substitute_node(ctx, node, call);

            let annotation = ctx.ast.annotation_mut(call);
            annotation.ty = Some(ret);
            annotation.binding = Some(Binding::Intrinsic(op));
            fold(ctx, call, op);
            call
        }
        binding => {
            let annotation = ctx.ast.annotation_mut(node);
            annotation.ty = Some(ret);
            annotation.binding = Some(binding);
            node
        }
    }
}

fn fold(ctx: &mut Context, node: NodeId, op: IntrinsicOp) {
    let values: Option<Vec<Value>> = ctx
        .ast
        .children(node)
        .iter()
        .map(|&operand| ctx.ast.annotation(operand).value.clone())
        .collect();
    let values = match values {
        Some(values) => values,
        None => return,
    };
    let ty = type_of(ctx, node);

    match fold_intrinsic(op, ty, &values) {
        Folded::Value(value) => {
            tracing::debug!(target: "fold", op = %op, value = %value, "folded");
            ctx.ast.annotation_mut(node).value = Some(value);
        }
        Folded::DivisionByZero => {
            ctx.report(
                Error::new(ErrorImpl::DivisionByZero, position_of(ctx, node))
                    .with_severity(Severity::Warning),
            );
        }
        Folded::NotConstant => {}
    }
}

fn analyze_cast(ctx: &mut Context, node: NodeId, target: TypeId) {
    if ctx.ast.ty(node).is_some() {
        return;
    }
    let operand = match ctx.ast.child(node, 0) {
        Some(operand) => operand,
        None => return,
    };

    let value = match (ctx.types.primitive(target), &ctx.ast.annotation(operand).value) {
        (Some(primitive), Some(value)) => cast_value(value, target, primitive),
        _ => None,
    };
    let annotation = ctx.ast.annotation_mut(node);
    annotation.ty = Some(target);
    annotation.value = value;
}

/// Type a write through `ty` stores: references write to their target.
fn storage_type(ctx: &Context, ty: TypeId) -> TypeId {
    match ctx.types.kind(ctx.types.strip_named(ty)) {
        TypeKind::Reference { target } => *target,
        _ => ty,
    }
}

fn is_immutable_binding(ctx: &Context, node: NodeId) -> bool {
    match ctx.ast.annotation(node).binding {
        Some(Binding::Decl(decl)) => {
            let entry = ctx.decls.get(decl);
            entry.is_const() || entry.is_callable_decl()
        }
        Some(Binding::Intrinsic(_)) => true,
        None => false,
    }
}

fn analyze_assign(ctx: &mut Context, node: NodeId) -> TypeId {
    let (target, value) = match ctx.ast.children(node) {
        [target, value] => (*target, *value),
        _ => return TypeId::ERROR,
    };
    if !ctx.ast.annotation(target).lvalue {
        return TypeId::ERROR;
    }
    if is_immutable_binding(ctx, target) {
        ctx.report(Error::new(
            ErrorImpl::NotAnLvalue {
                operation: String::from("="),
            },
            position_of(ctx, target),
        ));
        return TypeId::ERROR;
    }

    let storage = storage_type(ctx, type_of(ctx, target));
    let value_ty = type_of(ctx, value);
    if !ctx.types.compare(value_ty, storage).is_valid() {
        type_mismatch(ctx, value, storage, value_ty);
        return TypeId::ERROR;
    }
    storage
}

fn analyze_ref_bind(ctx: &mut Context, node: NodeId) -> TypeId {
    let (target, referent) = match ctx.ast.children(node) {
        [target, referent] => (*target, *referent),
        _ => return TypeId::ERROR,
    };
    let target_ty = type_of(ctx, target);

    if !matches!(ctx.types.kind(target_ty), TypeKind::Reference { .. }) {
        let variable = match ctx.ast.annotation(target).binding {
            Some(Binding::Decl(decl)) => ctx.decls.get(decl).name.clone(),
            _ => String::from("expression"),
        };
        ctx.report(Error::new(
            ErrorImpl::NotAReference { variable },
            position_of(ctx, target),
        ));
        return TypeId::ERROR;
    }

    let referent_ty = type_of(ctx, referent);
    let bound = ctx.types.make_reference(referent_ty);
    if !ctx.types.compare(bound, target_ty).is_valid() {
        type_mismatch(ctx, referent, target_ty, bound);
        return TypeId::ERROR;
    }
    target_ty
}

fn analyze_tuple(ctx: &mut Context, node: NodeId, names: &[Option<String>]) {
    let elements = ctx.ast.children(node).to_vec();
    let fields: Vec<TupleField> = elements
        .iter()
        .zip(names.iter())
        .map(|(&element, name)| TupleField {
            name: name.clone(),
            ty: type_of(ctx, element),
        })
        .collect();
    let ty = ctx.types.make_tuple(fields);

    let value = constant_elements(ctx, &elements).map(|values| Value::sequence(ty, values));
    let annotation = ctx.ast.annotation_mut(node);
    annotation.ty = Some(ty);
    annotation.value = value;
}

fn constant_elements(ctx: &Context, elements: &[NodeId]) -> Option<Vec<Value>> {
    elements
        .iter()
        .map(|&element| ctx.ast.annotation(element).value.as_ref().map(Value::duplicate))
        .collect()
}

fn analyze_list(ctx: &mut Context, node: NodeId) -> TypeId {
    let elements = ctx.ast.children(node).to_vec();
    let element_ty = match elements.first() {
        Some(&first) => type_of(ctx, first),
        None => return ctx.types.make_list(TypeId::UNIT, Some(0)),
    };

    for &element in &elements[1..] {
        let ty = type_of(ctx, element);
        if !ctx.types.compare(ty, element_ty).is_valid() {
            type_mismatch(ctx, element, element_ty, ty);
            return TypeId::ERROR;
        }
    }

    let ty = ctx.types.make_list(element_ty, Some(elements.len() as u64));
    let value = constant_elements(ctx, &elements).map(|values| Value::sequence(ty, values));
    ctx.ast.annotation_mut(node).value = value;
    ty
}

/// Constant value of an operand as an index, if it has one.
fn constant_index(ctx: &Context, node: NodeId) -> Option<i64> {
    ctx.ast.annotation(node).value.as_ref()?.as_i64()
}

fn out_of_bounds(ctx: &mut Context, node: NodeId, index: i64, length: u64) {
    ctx.report(Error::new(
        ErrorImpl::IndexOutOfBounds { index, length },
        position_of(ctx, node),
    ));
    set_type(ctx, node, TypeId::ERROR);
}

fn element_value(ctx: &Context, base: NodeId, index: usize) -> Option<Value> {
    ctx.ast.annotation(base).value.as_ref()?.element(index)
}

fn analyze_index(ctx: &mut Context, node: NodeId) {
    let (base, index) = match ctx.ast.children(node) {
        [base, index] => (*base, *index),
        _ => return set_type(ctx, node, TypeId::ERROR),
    };
    let base_ty = type_of(ctx, base);
    let shape = ctx.types.kind(ctx.types.strip_all(base_ty)).clone();
    let constant = constant_index(ctx, index);

    match shape {
        TypeKind::List { element, length } => {
            let index_ty = type_of(ctx, index);
            let is_integer = ctx
                .types
                .underlying_primitive(index_ty)
                .map(|primitive| primitive.is_integer())
                .unwrap_or(false);
            if !is_integer {
                type_mismatch(ctx, index, TypeId::INT64, index_ty);
                return set_type(ctx, node, TypeId::ERROR);
            }

            if let Some(i) = constant {
                let beyond = length.map(|length| i >= length as i64).unwrap_or(false);
                if i < 0 || beyond {
                    return out_of_bounds(ctx, node, i, length.unwrap_or(0));
                }
            }

            let value = constant.and_then(|i| element_value(ctx, base, i as usize));
            let annotation = ctx.ast.annotation_mut(node);
            annotation.ty = Some(element);
            annotation.value = value;
        }
        TypeKind::Tuple { fields } => {
            let i = match constant {
                Some(i) => i,
                None => {
                    let error = Error::new(
                        ErrorImpl::NotIndexable {
                            type_: ctx.types.display(base_ty),
                        },
                        position_of(ctx, index),
                    );
                    ctx.report(error);
                    return set_type(ctx, node, TypeId::ERROR);
                }
            };
            if i < 0 || i as usize >= fields.len() {
                return out_of_bounds(ctx, node, i, fields.len() as u64);
            }

            let value = element_value(ctx, base, i as usize);
            let annotation = ctx.ast.annotation_mut(node);
            annotation.ty = Some(fields[i as usize].ty);
            annotation.value = value;
        }
        _ => {
            let error = Error::new(
                ErrorImpl::NotIndexable {
                    type_: ctx.types.display(base_ty),
                },
                position_of(ctx, node),
            );
            ctx.report(error);
            set_type(ctx, node, TypeId::ERROR);
        }
    }
}

fn analyze_field(ctx: &mut Context, node: NodeId, name: &str) {
    let base = match ctx.ast.child(node, 0) {
        Some(base) => base,
        None => return set_type(ctx, node, TypeId::ERROR),
    };
    let base_ty = type_of(ctx, base);

    let found = ctx
        .types
        .tuple_fields(ctx.types.strip_all(base_ty))
        .and_then(|fields| {
            let position = fields
                .iter()
                .position(|field| field.name.as_deref() == Some(name))
                .or_else(|| name.parse::<usize>().ok().filter(|&i| i < fields.len()))?;
            Some((position, fields[position].ty))
        });

    match found {
        Some((position, ty)) => {
            let value = element_value(ctx, base, position);
            let annotation = ctx.ast.annotation_mut(node);
            annotation.ty = Some(ty);
            annotation.value = value;
        }
        None => {
            let error = Error::new(
                ErrorImpl::FieldNotFound {
                    field: name.to_string(),
                    type_: ctx.types.display(base_ty),
                },
                position_of(ctx, node),
            );
            ctx.report(error);
            set_type(ctx, node, TypeId::ERROR);
        }
    }
}

fn analyze_return(ctx: &mut Context, node: NodeId, fcx: FnContext, poisoned: bool) {
    set_type(ctx, node, TypeId::UNIT);

    let ret = match fcx.ret {
        Some(ret) => ret,
        None => {
            ctx.report(Error::new(ErrorImpl::ReturnOutsideFunction, position_of(ctx, node)));
            return;
        }
    };
    if poisoned || ctx.types.contains_error(ret) {
        return;
    }

    let value_ty = match ctx.ast.child(node, 0) {
        Some(value) => type_of(ctx, value),
        None => TypeId::UNIT,
    };
    if ctx.types.compare(value_ty, ret) == Cost::Invalid {
        type_mismatch(ctx, node, ret, value_ty);
    }
}

fn analyze_var_decl(ctx: &mut Context, node: NodeId, decl: DeclId, declared: Option<&TypeExpr>, is_ref: bool) {
    let scope = ctx.ast.scope(node);
    let declared = declared.map(|declared| resolve_type(ctx, scope, declared));
    let initializer = ctx.ast.child(node, 0);
    let init_ty = initializer.map(|init| type_of(ctx, init));

    let ty = if is_ref {
        let target = declared.map(|declared| {
            if matches!(ctx.types.kind(declared), TypeKind::Reference { .. }) {
                declared
            } else {
                ctx.types.make_reference(declared)
            }
        });
        let bound = init_ty.map(|init_ty| ctx.types.make_reference(init_ty));
        match (target, bound) {
            (Some(target), Some(bound)) => {
                let poisoned = ctx.types.contains_error(bound) || ctx.types.contains_error(target);
                if !poisoned && !ctx.types.compare(bound, target).is_valid() {
                    type_mismatch(ctx, node, target, bound);
                }
                target
            }
            (Some(target), None) => target,
            (None, Some(bound)) => bound,
            (None, None) => TypeId::ERROR,
        }
    } else {
        match (declared, init_ty) {
            (Some(declared), Some(init_ty)) => {
                let poisoned = ctx.types.contains_error(init_ty) || ctx.types.contains_error(declared);
                if !poisoned && !ctx.types.compare(init_ty, declared).is_valid() {
                    type_mismatch(ctx, node, declared, init_ty);
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(init_ty)) => init_ty,
            (None, None) => TypeId::ERROR,
        }
    };

    let value = match initializer {
        Some(init) if ctx.decls.get(decl).is_const() && !is_ref => {
            constant_of_type(ctx, ctx.ast.annotation(init).value.clone(), ty)
        }
        _ => None,
    };

    let entry = ctx.decls.get_mut(decl);
    entry.ty = Some(ty);
    entry.ready = true;
    entry.value = value;
    set_type(ctx, node, TypeId::UNIT);
}

/// Converts a constant to the declared type of the variable holding it.
fn constant_of_type(ctx: &Context, value: Option<Value>, ty: TypeId) -> Option<Value> {
    let value = value?;
    if value.ty() == Some(ty) {
        return Some(value.duplicate());
    }
    match (ctx.types.underlying_primitive(ty), value.primitive()) {
        (Some(target), Some(_)) => cast_value(&value, ty, target),
        _ => Some(value.retyped(ty)),
    }
}
