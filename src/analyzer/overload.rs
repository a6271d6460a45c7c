//! Overload resolution.
//!
//! Every callable visible under a name is priced by comparing the call's
//! argument tuple against the candidate's parameter tuple. The cheapest
//! candidate wins; a tie for the cheapest valid cost is ambiguous.

use std::{cmp::Reverse, collections::BinaryHeap};

use crate::{
    analyzer::{intrinsics::IntrinsicOp, signature::function_signature},
    context::Context,
    scope::{
        decls::{DeclId, DeclKind},
        scope::ScopeId,
    },
    types::{compare::Cost, type_manager::TypeId},
};

/// What a call or operator resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Decl(DeclId),
    Intrinsic(IntrinsicOp),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { decl: DeclId, signature: TypeId },
    /// Several candidates share the lowest cost. The first one found is
    /// kept for recovery.
    Ambiguous {
        first: DeclId,
        signature: TypeId,
        tied: Vec<DeclId>,
    },
    /// Candidates exist but none accepts the arguments.
    NoMatch,
    /// Nothing callable is visible under the name.
    NotDefined,
}

/// Signature a declaration can be called through, if any.
pub fn callable_signature(ctx: &mut Context, decl: DeclId) -> Option<TypeId> {
    match ctx.decls.get(decl).kind {
        DeclKind::Function { .. } => Some(function_signature(ctx, decl)),
        DeclKind::Intrinsic { .. } => ctx.decls.get(decl).ty,
        DeclKind::Variable { .. } | DeclKind::Parameter => {
            let ty = ctx.decls.get(decl).ty?;
            ctx.types.func_parts(ty).map(|_| ty)
        }
    }
}

/// Picks the overload of `name` visible from `scope` that best accepts
/// `arguments`, an unnamed tuple type.
pub fn resolve_overload(ctx: &mut Context, scope: ScopeId, name: &str, arguments: TypeId) -> Resolution {
    let candidates = ctx.scopes.get_var_defs(scope, name);

    let mut queue = BinaryHeap::new();
    for (order, decl) in candidates.into_iter().enumerate() {
        let signature = match callable_signature(ctx, decl) {
            Some(signature) => signature,
            None => continue,
        };
        let parameters = match ctx.types.func_parts(signature) {
            Some((parameters, _)) => parameters,
            None => continue,
        };
        let cost = ctx.types.compare(arguments, parameters);
        queue.push(Reverse((cost, order, decl, signature)));
    }

    let Reverse((best_cost, _, best, signature)) = match queue.pop() {
        Some(best) => best,
        None => return Resolution::NotDefined,
    };
    if best_cost == Cost::Invalid {
        return Resolution::NoMatch;
    }

    let mut tied = vec![];
    while let Some(Reverse((cost, _, decl, _))) = queue.pop() {
        if cost != best_cost {
            break;
        }
        tied.push(decl);
    }

    tracing::debug!(
        target: "overload",
        name,
        arguments = %ctx.types.display(arguments),
        cost = %best_cost,
        decl = best.0,
        tied = tied.len(),
        "resolved call"
    );

    if tied.is_empty() {
        Resolution::Resolved {
            decl: best,
            signature,
        }
    } else {
        tied.insert(0, best);
        Resolution::Ambiguous {
            first: best,
            signature,
            tied,
        }
    }
}

/// How a declaration is referred to from an annotated node.
pub fn binding_of(ctx: &Context, decl: DeclId) -> Binding {
    match ctx.decls.get(decl).intrinsic() {
        Some(op) => Binding::Intrinsic(op),
        None => Binding::Decl(decl),
    }
}
