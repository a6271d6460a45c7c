//! Resolution of type syntax to interned types.
//!
//! Type definitions are resolved lazily the first time they are named and
//! cached on the definition. A definition that is reached again while it is
//! still being resolved is recursive and rejected.

use crate::{
    ast::nodes::TypeExpr,
    context::Context,
    errors::errors::{Error, ErrorImpl},
    scope::scope::{ResolvedTypeDef, ScopeId, TypeDefBody, TypeDefId},
    types::type_manager::{TupleField, TypeId},
    Position,
};

/// Generic parameters in scope while resolving a definition body.
type ParamEnv<'a> = &'a [(String, TypeId)];

/// Resolves `expr` as seen from `scope`. Problems are reported and yield
/// the error type.
pub fn resolve_type(ctx: &mut Context, scope: ScopeId, expr: &TypeExpr) -> TypeId {
    resolve_in(ctx, scope, &[], expr)
}

fn resolve_in(ctx: &mut Context, scope: ScopeId, env: ParamEnv, expr: &TypeExpr) -> TypeId {
    match expr {
        TypeExpr::Name {
            name,
            args,
            position,
        } => {
            if args.is_empty() {
                if let Some((_, param)) = env.iter().find(|(param, _)| param == name) {
                    return *param;
                }
            }

            let args: Vec<TypeId> = args.iter().map(|arg| resolve_in(ctx, scope, env, arg)).collect();
            resolve_named(ctx, scope, name, args, position)
        }
        TypeExpr::List { element, length } => {
            let element = resolve_in(ctx, scope, env, element);
            ctx.types.make_list(element, *length)
        }
        TypeExpr::Tuple(fields) => {
            let fields = fields
                .iter()
                .map(|(name, ty)| TupleField {
                    name: name.clone(),
                    ty: resolve_in(ctx, scope, env, ty),
                })
                .collect();
            ctx.types.make_tuple(fields)
        }
        TypeExpr::Ref(target) => {
            let target = resolve_in(ctx, scope, env, target);
            ctx.types.make_reference(target)
        }
        TypeExpr::Func { arguments, ret } => {
            let arguments: Vec<TypeId> = arguments
                .iter()
                .map(|argument| resolve_in(ctx, scope, env, argument))
                .collect();
            let arguments = ctx.types.make_unnamed_tuple(&arguments);
            let ret = resolve_in(ctx, scope, env, ret);
            ctx.types.make_func(arguments, ret)
        }
    }
}

fn resolve_named(ctx: &mut Context, scope: ScopeId, name: &str, args: Vec<TypeId>, position: &Position) -> TypeId {
    let def = match ctx.scopes.get_type_def(scope, name) {
        Some(def) => def,
        None => {
            ctx.report(Error::new(
                ErrorImpl::UnknownType {
                    type_: name.to_string(),
                },
                position.clone(),
            ));
            return TypeId::ERROR;
        }
    };

    let resolved = match resolve_type_def(ctx, def, position) {
        Some(resolved) => resolved,
        None => return TypeId::ERROR,
    };

    if let TypeDefBody::Builtin(builtin) = ctx.scopes.type_def(def).body {
        return builtin;
    }

    let params = ctx.scopes.type_def(def).param_types.clone();
    ctx.types.make_named(resolved.body, name, &params, args)
}

/// Resolves the body of a definition once. `used_at` is where the
/// definition was named, for the recursion diagnostic.
pub fn resolve_type_def(ctx: &mut Context, id: TypeDefId, used_at: &Position) -> Option<ResolvedTypeDef> {
    let def = ctx.scopes.type_def(id);
    if let Some(resolved) = def.resolved {
        return Some(resolved);
    }
    if def.resolving {
        let error = Error::new(
            ErrorImpl::RecursiveType {
                type_: def.name.clone(),
            },
            used_at.clone(),
        )
        .with_notes(vec![def.position.clone()]);
        ctx.report(error);
        return None;
    }

    let body = match &def.body {
        TypeDefBody::Builtin(builtin) => {
            let resolved = ResolvedTypeDef { body: *builtin };
            ctx.scopes.type_def_mut(id).resolved = Some(resolved);
            return Some(resolved);
        }
        TypeDefBody::Syntax(body) => body.clone(),
    };
    let scope = def.scope;
    let names = def.params.clone();

    ctx.scopes.type_def_mut(id).resolving = true;
    let env: Vec<(String, TypeId)> = names
        .into_iter()
        .map(|name| {
            let param = ctx.types.make_param(&name);
            (name, param)
        })
        .collect();
    let body = resolve_in(ctx, scope, &env, &body);

    let def = ctx.scopes.type_def_mut(id);
    def.resolving = false;
    def.param_types = env.into_iter().map(|(_, param)| param).collect();
    let resolved = ResolvedTypeDef { body };
    def.resolved = Some(resolved);
    Some(resolved)
}
