use std::rc::Rc;

use crate::{
    analyzer::overload::{resolve_overload, Resolution},
    context::{Context, ModuleId},
    errors::errors::{Error, ErrorImpl},
    scope::decls::{DeclId, DeclKind},
    types::type_manager::TypeId,
    Position,
};

/// Finds the function execution starts at: the entry symbol visible from
/// `module`, resolved like a call with no arguments.
pub fn resolve_entry_point(ctx: &mut Context, module: ModuleId) -> Result<DeclId, Error> {
    let symbol = ctx.options.entry_symbol.clone();
    let scope = ctx.module(module).layers.private;
    let at = Position(0, Rc::new(ctx.module(module).path.clone()));

    let candidates = ctx.scopes.get_var_defs(scope, &symbol);
    if candidates.is_empty() {
        return Err(Error::fatal(ErrorImpl::NoEntryPoint { symbol }, at));
    }

    match resolve_overload(ctx, scope, &symbol, TypeId::UNIT) {
        Resolution::Resolved { decl, .. }
            if matches!(ctx.decls.get(decl).kind, DeclKind::Function { .. }) =>
        {
            tracing::debug!(target: "pipeline", symbol = %symbol, decl = decl.0, "entry point");
            Ok(decl)
        }
        Resolution::Resolved { decl, .. } => Err(not_callable(&*ctx, symbol, at, &[decl])),
        Resolution::Ambiguous { tied, .. } => Err(not_callable(&*ctx, symbol, at, &tied)),
        Resolution::NoMatch | Resolution::NotDefined => Err(not_callable(&*ctx, symbol, at, &candidates)),
    }
}

fn not_callable(ctx: &Context, symbol: String, at: Position, candidates: &[DeclId]) -> Error {
    let notes = candidates
        .iter()
        .map(|&decl| ctx.decls.get(decl).position.clone())
        .collect();
    Error::fatal(ErrorImpl::EntryPointNotCallable { symbol }, at).with_notes(notes)
}
