//! Driving a whole compilation: loading the root module and everything it
//! imports, analyzing it and resolving the entry point.

use std::time::Instant;

use tracing::info;

use crate::{
    analyzer::{
        analyzer::{analyze_module, load_module},
        entry::resolve_entry_point,
    },
    ast::dump::dump_tree,
    context::{Context, ModuleId},
    errors::errors::{Diagnostics, Error},
    loader::{MemoryLoader, SourceLoader},
    scope::decls::DeclId,
    Position,
};

#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Name of the function execution starts at.
    pub entry_symbol: String,
    /// Log every phase, not just warnings.
    pub trace: bool,
    /// Print each analyzed module's tree.
    pub dump_ast: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            entry_symbol: String::from("main"),
            trace: false,
            dump_ast: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompileOutput {
    pub root: ModuleId,
    pub entry: DeclId,
}

pub struct Compilation {
    pub context: Context,
    loader: Box<dyn SourceLoader>,
}

impl Compilation {
    pub fn new(options: CompilerOptions, loader: Box<dyn SourceLoader>) -> Self {
        Compilation {
            context: Context::new(options),
            loader,
        }
    }

    /// Convenience for a single in-memory module named `main`.
    pub fn from_source(source: &str) -> Self {
        let loader = MemoryLoader::new().with("main", source);
        Compilation::new(CompilerOptions::default(), Box::new(loader))
    }

    /// Reads and parses the root module.
    pub fn load_root(&mut self, name: &str) -> Result<ModuleId, Error> {
        load_module(&mut self.context, self.loader.as_mut(), name, &Position::null())
    }

    /// Analyzes `module` and, before it, everything it imports.
    /// Recoverable problems end up in [`Compilation::diagnostics`].
    pub fn analyze(&mut self, module: ModuleId) -> Result<(), Error> {
        let start = Instant::now();
        analyze_module(&mut self.context, self.loader.as_mut(), module)?;
        info!(
            target: "pipeline",
            stage = "analyze",
            modules = self.context.modules.len(),
            diagnostics = self.context.diagnostics.len(),
            elapsed_ms = start.elapsed().as_millis() as u64
        );
        Ok(())
    }

    pub fn entry_point(&mut self, module: ModuleId) -> Result<DeclId, Error> {
        resolve_entry_point(&mut self.context, module)
    }

    /// Loads `root`, analyzes it with its imports and resolves the entry
    /// point. A fatal problem is returned; everything else is collected.
    pub fn compile(&mut self, root: &str) -> Result<CompileOutput, Error> {
        let module = self.load_root(root)?;
        self.analyze(module)?;
        let entry = self.entry_point(module)?;
        Ok(CompileOutput {
            root: module,
            entry,
        })
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.context.diagnostics
    }

    /// Indented rendering of a module's current tree.
    pub fn dump(&self, module: ModuleId) -> String {
        let root = self.context.module(module).root;
        dump_tree(&self.context.ast, &self.context.types, root)
    }
}
