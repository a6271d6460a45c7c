//! Module loading and the three analysis phases.
//!
//! A module is analyzed after every module it imports, so exported
//! declarations are typed before they are used. A module whose analysis
//! has already started is skipped, which is what stops import cycles.

use std::{rc::Rc, time::Instant};

use tracing::info;

use crate::{
    ast::nodes::NodeKind,
    context::{Context, ModuleId},
    errors::errors::{Error, Severity},
    lexer::lexer::tokenize,
    loader::SourceLoader,
    parser::parser::parse_module,
    Position,
};

use super::{infer::infer_module, lowering::lower_module, normalize::normalize};

/// Returns the module registered under `name`, reading and parsing it
/// first if needed. Load and syntax errors are fatal.
pub fn load_module(
    ctx: &mut Context,
    loader: &mut dyn SourceLoader,
    name: &str,
    requested_at: &Position,
) -> Result<ModuleId, Error> {
    if let Some(module) = ctx.find_module(name) {
        return Ok(module);
    }

    let start = Instant::now();
    let source = loader.load(name, requested_at)?;
    let text = Rc::new(source.text);
    let module = ctx.add_module(name, &source.path, Rc::clone(&text));

    let tokens = tokenize(&text, Some(source.path.clone())).map_err(|e| e.with_severity(Severity::Fatal))?;
    parse_module(tokens, Rc::new(source.path), ctx, module).map_err(|e| e.with_severity(Severity::Fatal))?;

    info!(
        target: "pipeline",
        stage = "parse",
        module = name,
        elapsed_ms = start.elapsed().as_millis() as u64
    );
    Ok(module)
}

/// Runs normalization, lowering and inference over `module` once its
/// imports are done.
pub fn analyze_module(ctx: &mut Context, loader: &mut dyn SourceLoader, module: ModuleId) -> Result<(), Error> {
    if ctx.module(module).analysis_started {
        return Ok(());
    }
    ctx.module_mut(module).analysis_started = true;

    let root = ctx.module(module).root;
    let layers = ctx.module(module).layers;
    let imports: Vec<(String, bool, Position)> = ctx
        .ast
        .children(root)
        .iter()
        .filter_map(|&item| match ctx.ast.kind(item) {
            NodeKind::Import { module: imported, public } => {
                Some((imported.clone(), *public, ctx.ast.span(item).start.clone()))
            }
            _ => None,
        })
        .collect();

    for (name, public, at) in imports {
        let imported = load_module(ctx, loader, &name, &at)?;
        analyze_module(ctx, loader, imported)?;

        let layer = if public { layers.public_import } else { layers.private_import };
        let exported = ctx.module(imported).layers.public;
        ctx.scopes.add_import(layer, exported);
    }

    let name = ctx.module(module).name.clone();

    let start = Instant::now();
    normalize(ctx, root);
    info!(target: "pipeline", stage = "normalize", module = %name, elapsed_ms = start.elapsed().as_millis() as u64);

    let start = Instant::now();
    lower_module(ctx, root);
    info!(target: "pipeline", stage = "lower", module = %name, elapsed_ms = start.elapsed().as_millis() as u64);

    let start = Instant::now();
    infer_module(ctx, root);
    info!(
        target: "pipeline",
        stage = "infer",
        module = %name,
        errors = ctx.diagnostics.error_count(),
        elapsed_ms = start.elapsed().as_millis() as u64
    );

    ctx.module_mut(module).analyzed = true;
    Ok(())
}
