use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

/// Handle of a canonical type. Structurally equal types share one handle,
/// except parameters, which are unique per declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub const BOOL: TypeId = TypeId(0);
    pub const INT8: TypeId = TypeId(1);
    pub const INT16: TypeId = TypeId(2);
    pub const INT32: TypeId = TypeId(3);
    pub const INT64: TypeId = TypeId(4);
    pub const FLOAT32: TypeId = TypeId(5);
    pub const FLOAT64: TypeId = TypeId(6);
    pub const FLOAT80: TypeId = TypeId(7);
    /// Stands in for anything that failed to type check.
    pub const ERROR: TypeId = TypeId(8);
    /// The empty tuple.
    pub const UNIT: TypeId = TypeId(9);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Primitive {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Float80,
}

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::Bool,
        Primitive::Int8,
        Primitive::Int16,
        Primitive::Int32,
        Primitive::Int64,
        Primitive::Float32,
        Primitive::Float64,
        Primitive::Float80,
    ];

    pub const ARITHMETIC: [Primitive; 7] = [
        Primitive::Int8,
        Primitive::Int16,
        Primitive::Int32,
        Primitive::Int64,
        Primitive::Float32,
        Primitive::Float64,
        Primitive::Float80,
    ];

    pub fn type_id(self) -> TypeId {
        TypeId(self as u32)
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Int8 => "int8",
            Primitive::Int16 => "int16",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::Float80 => "float80",
        }
    }

    /// Storage size in bytes.
    pub fn size(self) -> usize {
        match self {
            Primitive::Bool | Primitive::Int8 => 1,
            Primitive::Int16 => 2,
            Primitive::Int32 | Primitive::Float32 => 4,
            Primitive::Int64 | Primitive::Float64 => 8,
            Primitive::Float80 => 10,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Primitive::Int8 | Primitive::Int16 | Primitive::Int32 | Primitive::Int64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Primitive::Float32 | Primitive::Float64 | Primitive::Float80)
    }

    pub fn is_arithmetic(self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Position within the primitive's own family, smallest first.
    pub fn rank(self) -> u32 {
        match self {
            Primitive::Bool => 0,
            Primitive::Int8 => 0,
            Primitive::Int16 => 1,
            Primitive::Int32 => 2,
            Primitive::Int64 => 3,
            Primitive::Float32 => 0,
            Primitive::Float64 => 1,
            Primitive::Float80 => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleField {
    pub name: Option<String>,
    pub ty: TypeId,
}

impl TupleField {
    pub fn unnamed(ty: TypeId) -> Self {
        TupleField { name: None, ty }
    }

    pub fn named(name: &str, ty: TypeId) -> Self {
        TupleField {
            name: Some(name.to_string()),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Primitive(Primitive),
    List {
        element: TypeId,
        /// `None` when the length is not known statically.
        length: Option<u64>,
    },
    Tuple {
        fields: Vec<TupleField>,
    },
    Reference {
        target: TypeId,
    },
    Named {
        name: String,
        args: Vec<TypeId>,
        /// The definition's body with `args` substituted for its parameters.
        expanded: TypeId,
    },
    Param {
        name: String,
    },
    Func {
        /// Always a tuple.
        arguments: TypeId,
        ret: TypeId,
    },
    Error,
}

#[derive(Debug)]
struct TypeEntry {
    kind: TypeKind,
    /// Set only while a generic body is being instantiated.
    substitution: Option<TypeId>,
}

/// Owns every type and hands out canonical handles.
pub struct TypeManager {
    entries: Vec<TypeEntry>,
    buckets: FxHashMap<u64, Vec<TypeId>>,
}

impl Default for TypeManager {
    fn default() -> Self {
        TypeManager::new()
    }
}

impl TypeManager {
    pub fn new() -> Self {
        let mut manager = TypeManager {
            entries: vec![],
            buckets: FxHashMap::default(),
        };

        for primitive in Primitive::ALL {
            let id = manager.unique(TypeKind::Primitive(primitive));
            debug_assert_eq!(id, primitive.type_id());
        }
        let error = manager.unique(TypeKind::Error);
        debug_assert_eq!(error, TypeId::ERROR);
        let unit = manager.make_tuple(vec![]);
        debug_assert_eq!(unit, TypeId::UNIT);

        manager
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.entries[id.0 as usize].kind
    }

    pub fn primitive(&self, id: TypeId) -> Option<Primitive> {
        match self.kind(id) {
            TypeKind::Primitive(primitive) => Some(*primitive),
            _ => None,
        }
    }

    pub fn is_error(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Error)
    }

    /// Returns the canonical handle for `kind`, registering it if it is new.
    pub fn unique(&mut self, kind: TypeKind) -> TypeId {
        if let TypeKind::Param { .. } = kind {
            return self.register(kind);
        }

        let hash = hash_kind(&kind);
        if let Some(bucket) = self.buckets.get(&hash) {
            for &candidate in bucket {
                if insert_compare(self.kind(candidate), &kind) {
                    return candidate;
                }
            }
        }

        let id = self.register(kind);
        self.buckets.entry(hash).or_default().push(id);
        id
    }

    fn register(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.entries.len() as u32);
        self.entries.push(TypeEntry {
            kind,
            substitution: None,
        });
        id
    }

    pub fn make_list(&mut self, element: TypeId, length: Option<u64>) -> TypeId {
        self.unique(TypeKind::List { element, length })
    }

    pub fn make_tuple(&mut self, fields: Vec<TupleField>) -> TypeId {
        self.unique(TypeKind::Tuple { fields })
    }

    pub fn make_unnamed_tuple(&mut self, types: &[TypeId]) -> TypeId {
        let fields = types.iter().map(|&ty| TupleField::unnamed(ty)).collect();
        self.make_tuple(fields)
    }

    pub fn make_reference(&mut self, target: TypeId) -> TypeId {
        self.unique(TypeKind::Reference { target })
    }

    pub fn make_func(&mut self, arguments: TypeId, ret: TypeId) -> TypeId {
        self.unique(TypeKind::Func { arguments, ret })
    }

    /// A fresh type parameter. Never shared with another declaration.
    pub fn make_param(&mut self, name: &str) -> TypeId {
        self.unique(TypeKind::Param {
            name: name.to_string(),
        })
    }

    /// Instantiates a generic definition.
    ///
    /// `base` is the definition body written in terms of `params`. Missing
    /// arguments are filled with fresh parameters named `<P in Name>`; extra
    /// arguments are dropped. Substitutions are cleared before returning.
    pub fn make_named(&mut self, base: TypeId, name: &str, params: &[TypeId], args: Vec<TypeId>) -> TypeId {
        let mut args = args;
        args.truncate(params.len());
        while args.len() < params.len() {
            let param_name = match self.kind(params[args.len()]) {
                TypeKind::Param { name } => name.clone(),
                _ => String::from("?"),
            };
            let synthesized = self.make_param(&format!("<{} in {}>", param_name, name));
            args.push(synthesized);
        }

        for (&param, &arg) in params.iter().zip(args.iter()) {
            self.entries[param.0 as usize].substitution = Some(arg);
        }

        let mut memo = FxHashMap::default();
        let expanded = self.substitute(base, &mut memo);

        for &param in params {
            self.entries[param.0 as usize].substitution = None;
        }
        tracing::debug!(target: "types", name, arguments = args.len(), "instantiated named type");

        self.unique(TypeKind::Named {
            name: name.to_string(),
            args,
            expanded,
        })
    }

    /// Clones `ty` with active parameter substitutions applied, re-uniquing
    /// every rebuilt node. Shared sub-terms are rebuilt once.
    fn substitute(&mut self, ty: TypeId, memo: &mut FxHashMap<TypeId, TypeId>) -> TypeId {
        if let Some(&done) = memo.get(&ty) {
            return done;
        }

        let result = match self.kind(ty).clone() {
            TypeKind::Param { .. } => self.entries[ty.0 as usize].substitution.unwrap_or(ty),
            TypeKind::Primitive(_) | TypeKind::Error => ty,
            TypeKind::List { element, length } => {
                let element = self.substitute(element, memo);
                self.make_list(element, length)
            }
            TypeKind::Tuple { fields } => {
                let fields = fields
                    .into_iter()
                    .map(|field| TupleField {
                        name: field.name,
                        ty: self.substitute(field.ty, memo),
                    })
                    .collect();
                self.make_tuple(fields)
            }
            TypeKind::Reference { target } => {
                let target = self.substitute(target, memo);
                self.make_reference(target)
            }
            TypeKind::Named { name, args, expanded } => {
                let args = args.into_iter().map(|arg| self.substitute(arg, memo)).collect();
                let expanded = self.substitute(expanded, memo);
                self.unique(TypeKind::Named { name, args, expanded })
            }
            TypeKind::Func { arguments, ret } => {
                let arguments = self.substitute(arguments, memo);
                let ret = self.substitute(ret, memo);
                self.make_func(arguments, ret)
            }
        };

        memo.insert(ty, result);
        result
    }

    /// One level of denaming: a Named type yields its expansion and a
    /// single-field tuple yields its field. Anything else is returned as is.
    pub fn dename(&self, ty: TypeId) -> TypeId {
        match self.kind(ty) {
            TypeKind::Named { expanded, .. } => *expanded,
            TypeKind::Tuple { fields } if fields.len() == 1 => fields[0].ty,
            _ => ty,
        }
    }

    /// Removes every Named layer.
    pub fn strip_named(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        while let TypeKind::Named { expanded, .. } = self.kind(current) {
            current = *expanded;
        }
        current
    }

    /// Removes Named layers and references.
    pub fn strip_all(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        loop {
            match self.kind(current) {
                TypeKind::Named { expanded, .. } => current = *expanded,
                TypeKind::Reference { target } => current = *target,
                _ => return current,
            }
        }
    }

    /// The primitive underneath any Named layers.
    pub fn underlying_primitive(&self, ty: TypeId) -> Option<Primitive> {
        self.primitive(self.strip_named(ty))
    }

    /// Whether the error type appears anywhere inside `ty`.
    pub fn contains_error(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TypeKind::Error => true,
            TypeKind::Primitive(_) | TypeKind::Param { .. } => false,
            TypeKind::List { element, .. } => self.contains_error(*element),
            TypeKind::Tuple { fields } => fields.iter().any(|field| self.contains_error(field.ty)),
            TypeKind::Reference { target } => self.contains_error(*target),
            TypeKind::Named { expanded, .. } => self.contains_error(*expanded),
            TypeKind::Func { arguments, ret } => {
                self.contains_error(*arguments) || self.contains_error(*ret)
            }
        }
    }

    pub fn tuple_fields(&self, ty: TypeId) -> Option<&[TupleField]> {
        match self.kind(ty) {
            TypeKind::Tuple { fields } => Some(fields),
            _ => None,
        }
    }

    /// Argument tuple and return type of a function type.
    pub fn func_parts(&self, ty: TypeId) -> Option<(TypeId, TypeId)> {
        match self.kind(self.strip_named(ty)) {
            TypeKind::Func { arguments, ret } => Some((*arguments, *ret)),
            _ => None,
        }
    }
}

fn hash_kind(kind: &TypeKind) -> u64 {
    let mut hasher = FxHasher::default();
    kind.hash(&mut hasher);
    hasher.finish()
}

/// Structural equality used when interning. Children are already canonical,
/// so comparing their handles compares them structurally.
fn insert_compare(existing: &TypeKind, candidate: &TypeKind) -> bool {
    match (existing, candidate) {
        (TypeKind::Param { .. }, _) | (_, TypeKind::Param { .. }) => false,
        _ => existing == candidate,
    }
}
