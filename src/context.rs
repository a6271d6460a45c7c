//! Shared state of one compilation.
//!
//! Every phase receives the [`Context`] explicitly. It owns the node arena,
//! the type manager, the scopes and declarations, the temporaries table,
//! the collected diagnostics and the module registry.

use std::rc::Rc;

use crate::{
    analyzer::intrinsics::register_intrinsics,
    ast::{
        ast::{Ast, NodeId},
        nodes::{NodeKind, TempId},
    },
    compilation::CompilerOptions,
    errors::errors::{Diagnostics, Error},
    scope::{
        decls::DeclTable,
        scope::{ScopeId, ScopeKind, ScopeTable, TypeDef, TypeDefBody},
    },
    types::type_manager::{Primitive, TypeManager},
    Position, Span,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

/// The four scope layers of a module, innermost first.
#[derive(Debug, Clone, Copy)]
pub struct ModuleLayers {
    pub private: ScopeId,
    pub private_import: ScopeId,
    pub public: ScopeId,
    pub public_import: ScopeId,
}

#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub path: String,
    pub source: Rc<String>,
    pub root: NodeId,
    pub layers: ModuleLayers,
    /// Set when analysis begins, so cyclic imports do not re-enter.
    pub analysis_started: bool,
    pub analyzed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TempInfo {
    /// Node whose result the temporary holds.
    pub set_by: NodeId,
}

pub struct Context {
    pub ast: Ast,
    pub types: TypeManager,
    pub scopes: ScopeTable,
    pub decls: DeclTable,
    pub temps: Vec<TempInfo>,
    pub diagnostics: Diagnostics,
    pub modules: Vec<Module>,
    pub universal: ScopeId,
    pub options: CompilerOptions,
}

impl Context {
    pub fn new(options: CompilerOptions) -> Self {
        let mut scopes = ScopeTable::new();
        let universal = scopes.add_scope(ScopeKind::Universal, None);

        let mut context = Context {
            ast: Ast::new(),
            types: TypeManager::new(),
            scopes,
            decls: DeclTable::new(),
            temps: vec![],
            diagnostics: Diagnostics::new(),
            modules: vec![],
            universal,
            options,
        };

        for primitive in Primitive::ALL {
            let builtin = TypeDef {
                name: primitive.name().to_string(),
                params: vec![],
                body: TypeDefBody::Builtin(primitive.type_id()),
                scope: universal,
                position: Position::null(),
                param_types: vec![],
                resolved: None,
                resolving: false,
            };
            let _ = context.scopes.add_type_def(universal, builtin);
        }
        register_intrinsics(&mut context, universal);

        context
    }

    /// Registers a module with fresh scope layers and an empty root node.
    pub fn add_module(&mut self, name: &str, path: &str, source: Rc<String>) -> ModuleId {
        let public_import = self.scopes.add_scope(ScopeKind::PublicImport, Some(self.universal));
        let public = self.scopes.add_scope(ScopeKind::Public, Some(public_import));
        let private_import = self.scopes.add_scope(ScopeKind::PrivateImport, Some(public));
        let private = self.scopes.add_scope(ScopeKind::Private, Some(private_import));

        let file = Rc::new(path.to_string());
        let span = Span {
            start: Position(0, Rc::clone(&file)),
            end: Position(source.len() as u32, file),
        };
        let root = self.ast.add(
            NodeKind::Module {
                name: name.to_string(),
            },
            span,
            private,
        );

        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(Module {
            name: name.to_string(),
            path: path.to_string(),
            source,
            root,
            layers: ModuleLayers {
                private,
                private_import,
                public,
                public_import,
            },
            analysis_started: false,
            analyzed: false,
        });
        id
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0 as usize]
    }

    pub fn find_module(&self, name: &str) -> Option<ModuleId> {
        self.modules
            .iter()
            .position(|module| module.name == name)
            .map(|index| ModuleId(index as u32))
    }

    /// Records a temporary produced by `set_by`.
    pub fn new_temp(&mut self, set_by: NodeId) -> TempId {
        let id = TempId(self.temps.len() as u32);
        self.temps.push(TempInfo { set_by });
        id
    }

    pub fn temp(&self, id: TempId) -> TempInfo {
        self.temps[id.0 as usize]
    }

    /// Points every temporary set by `old` at `new`.
    pub fn retarget_temps(&mut self, old: NodeId, new: NodeId) {
        for temp in self.temps.iter_mut() {
            if temp.set_by == old {
                temp.set_by = new;
            }
        }
    }

    pub fn report(&mut self, error: Error) {
        self.diagnostics.report(error);
    }

    /// Source text of the module a file name belongs to, for rendering
    /// diagnostics.
    pub fn source_of(&self, path: &str) -> Option<&str> {
        self.modules
            .iter()
            .find(|module| module.path == path)
            .map(|module| module.source.as_str())
    }
}

impl crate::ast::traverse::TreeAccess for Context {
    fn tree(&self) -> &Ast {
        &self.ast
    }
}
