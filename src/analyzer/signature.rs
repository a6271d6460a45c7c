use crate::{
    analyzer::type_resolve::resolve_type,
    context::Context,
    scope::decls::{DeclId, DeclKind},
    types::type_manager::TypeId,
};

/// Signature of a function declaration, computed on first use.
///
/// Also types the function's parameters. The return type defaults to unit.
pub fn function_signature(ctx: &mut Context, decl: DeclId) -> TypeId {
    let entry = ctx.decls.get(decl);
    if let Some(ty) = entry.ty {
        return ty;
    }
    if entry.resolving {
        return TypeId::ERROR;
    }

    let (params, ret, body_scope) = match &entry.kind {
        DeclKind::Function {
            params,
            ret,
            body_scope,
        } => (params.clone(), ret.clone(), *body_scope),
        _ => return entry.ty.unwrap_or(TypeId::ERROR),
    };
    ctx.decls.get_mut(decl).resolving = true;

    let mut arguments = Vec::with_capacity(params.len());
    for param in &params {
        let ty = resolve_type(ctx, body_scope, &param.ty);
        let param_decl = ctx.decls.get_mut(param.decl);
        param_decl.ty = Some(ty);
        param_decl.ready = true;
        arguments.push(ty);
    }
    let ret = match ret {
        Some(ret) => resolve_type(ctx, body_scope, &ret),
        None => TypeId::UNIT,
    };

    let arguments = ctx.types.make_unnamed_tuple(&arguments);
    let signature = ctx.types.make_func(arguments, ret);

    let entry = ctx.decls.get_mut(decl);
    entry.resolving = false;
    entry.ty = Some(signature);
    entry.ready = true;
    signature
}

/// Return type of a function declaration.
pub fn return_type(ctx: &mut Context, decl: DeclId) -> TypeId {
    let signature = function_signature(ctx, decl);
    ctx.types
        .func_parts(signature)
        .map(|(_, ret)| ret)
        .unwrap_or(TypeId::ERROR)
}
