use std::cell::Cell;

use rustc_hash::FxHashMap;

use crate::{
    ast::nodes::TypeExpr,
    errors::errors::ErrorImpl,
    types::type_manager::TypeId,
    Position,
};

use super::decls::DeclId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Builtin types and intrinsics. Shared by every module.
    Universal,
    PublicImport,
    Public,
    PrivateImport,
    Private,
    Function,
    Block,
}

/// Every declaration visible under one name in one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarDef {
    Single(DeclId),
    /// Functions sharing a name, in declaration order.
    Overloads(Vec<DeclId>),
}

impl VarDef {
    pub fn decls(&self) -> &[DeclId] {
        match self {
            VarDef::Single(decl) => std::slice::from_ref(decl),
            VarDef::Overloads(group) => group,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDefId(pub u32);

#[derive(Debug, Clone)]
pub enum TypeDefBody {
    Builtin(TypeId),
    Syntax(TypeExpr),
}

/// Instantiated shape of a definition: its parameters and its body in
/// terms of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTypeDef {
    pub body: TypeId,
}

#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: TypeDefBody,
    /// Scope the body is resolved in.
    pub scope: ScopeId,
    pub position: Position,
    pub param_types: Vec<TypeId>,
    pub resolved: Option<ResolvedTypeDef>,
    pub resolving: bool,
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    vars: FxHashMap<String, VarDef>,
    types: FxHashMap<String, TypeDefId>,
    /// Public layers of imported modules. Only import layers have these.
    imports: Vec<ScopeId>,
    visiting: Cell<bool>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Scope {
            kind,
            parent,
            vars: FxHashMap::default(),
            types: FxHashMap::default(),
            imports: vec![],
            visiting: Cell::new(false),
        }
    }
}

/// All scopes of a compilation plus the type definitions they declare.
///
/// Lookups walk the parent chain. Import layers fan out into the public
/// layers of the modules they import, stopping short of the universal
/// scope so builtins are found once. A per-scope visiting flag keeps
/// cyclic imports from recursing forever.
#[derive(Debug, Default)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
    type_defs: Vec<TypeDef>,
}

impl ScopeTable {
    pub fn new() -> Self {
        ScopeTable {
            scopes: vec![],
            type_defs: vec![],
        }
    }

    pub fn add_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, parent));
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn kind(&self, id: ScopeId) -> ScopeKind {
        self.get(id).kind
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).parent
    }

    /// Makes the public layer `exported` visible through the import layer `layer`.
    pub fn add_import(&mut self, layer: ScopeId, exported: ScopeId) {
        let imports = &mut self.get_mut(layer).imports;
        if !imports.contains(&exported) {
            imports.push(exported);
        }
    }

    /// Declares `name` in `scope`. Overloadable declarations accumulate into
    /// a group; anything else may not share its name with another
    /// declaration of the same scope.
    pub fn add_var_def(
        &mut self,
        scope: ScopeId,
        name: &str,
        decl: DeclId,
        overloadable: bool,
    ) -> Result<(), ErrorImpl> {
        let vars = &mut self.get_mut(scope).vars;
        match vars.get_mut(name) {
            None => {
                let def = if overloadable {
                    VarDef::Overloads(vec![decl])
                } else {
                    VarDef::Single(decl)
                };
                vars.insert(name.to_string(), def);
                Ok(())
            }
            Some(VarDef::Overloads(group)) if overloadable => {
                group.push(decl);
                Ok(())
            }
            Some(_) => Err(ErrorImpl::VariableAlreadyDeclared {
                variable: name.to_string(),
            }),
        }
    }

    /// The nearest definition of `name` visible from `scope`.
    pub fn get_var_def(&self, scope: ScopeId, name: &str) -> Option<&VarDef> {
        let mut found = None;
        self.visit_chain(scope, true, &mut |candidate| match candidate.vars.get(name) {
            Some(def) => {
                found = Some(def);
                true
            }
            None => false,
        });
        found
    }

    /// Every declaration of `name` visible from `scope`, nearest first,
    /// without duplicates.
    pub fn get_var_defs(&self, scope: ScopeId, name: &str) -> Vec<DeclId> {
        let mut found: Vec<DeclId> = vec![];
        self.visit_chain(scope, true, &mut |candidate| {
            if let Some(def) = candidate.vars.get(name) {
                for &decl in def.decls() {
                    if !found.contains(&decl) {
                        found.push(decl);
                    }
                }
            }
            false
        });
        found
    }

    pub fn add_type_def(&mut self, scope: ScopeId, def: TypeDef) -> Result<TypeDefId, ErrorImpl> {
        if self.get(scope).types.contains_key(&def.name) {
            return Err(ErrorImpl::TypeAlreadyDeclared {
                type_: def.name.clone(),
            });
        }

        let id = TypeDefId(self.type_defs.len() as u32);
        let name = def.name.clone();
        self.type_defs.push(def);
        self.get_mut(scope).types.insert(name, id);
        Ok(id)
    }

    pub fn get_type_def(&self, scope: ScopeId, name: &str) -> Option<TypeDefId> {
        let mut found = None;
        self.visit_chain(scope, true, &mut |candidate| match candidate.types.get(name) {
            Some(&def) => {
                found = Some(def);
                true
            }
            None => false,
        });
        found
    }

    pub fn type_def(&self, id: TypeDefId) -> &TypeDef {
        &self.type_defs[id.0 as usize]
    }

    pub fn type_def_mut(&mut self, id: TypeDefId) -> &mut TypeDef {
        &mut self.type_defs[id.0 as usize]
    }

    /// Walks `start` and its ancestors, fanning out through imports. Stops
    /// as soon as `visit` returns true and reports whether it did.
    fn visit_chain<'t>(
        &'t self,
        start: ScopeId,
        include_universal: bool,
        visit: &mut dyn FnMut(&'t Scope) -> bool,
    ) -> bool {
        let mut current = Some(start);
        while let Some(id) = current {
            let scope = self.get(id);
            if !include_universal && scope.kind == ScopeKind::Universal {
                break;
            }
            if visit(scope) {
                return true;
            }

            for &imported in &scope.imports {
                let target = self.get(imported);
                if target.visiting.get() {
                    continue;
                }
                target.visiting.set(true);
                let stopped = self.visit_chain(imported, false, visit);
                target.visiting.set(false);
                if stopped {
                    return true;
                }
            }

            current = scope.parent;
        }
        false
    }
}
