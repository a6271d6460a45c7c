use std::{
    cell::{Ref, RefCell},
    fmt::Display,
    rc::Rc,
};

use crate::{
    scope::decls::DeclId,
    types::type_manager::{Primitive, TypeId},
};

/// A decoded primitive payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Scalar {
    /// Converts the payload to the representation `primitive` stores.
    pub fn convert(self, primitive: Primitive) -> Scalar {
        match (self, primitive) {
            (Scalar::Bool(b), Primitive::Bool) => Scalar::Bool(b),
            (Scalar::Bool(b), p) if p.is_float() => Scalar::Float(b as u8 as f64),
            (Scalar::Bool(b), _) => Scalar::Int(b as i64),
            (Scalar::Int(i), Primitive::Bool) => Scalar::Bool(i != 0),
            (Scalar::Int(i), p) if p.is_float() => Scalar::Float(i as f64),
            (Scalar::Int(i), _) => Scalar::Int(i),
            (Scalar::Float(f), Primitive::Bool) => Scalar::Bool(f != 0.0),
            (Scalar::Float(f), p) if p.is_float() => Scalar::Float(f),
            (Scalar::Float(f), _) => Scalar::Int(f as i64),
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// Placement of one element inside a packed buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub offset: usize,
    pub ty: TypeId,
    pub primitive: Primitive,
}

#[derive(Debug)]
pub enum ValueKind {
    Null,
    Error,
    Scalar {
        ty: TypeId,
        primitive: Primitive,
        bytes: Vec<u8>,
    },
    /// Sequence of scalars sharing one byte buffer.
    Packed {
        ty: TypeId,
        layout: Vec<Slot>,
        buffer: Vec<u8>,
    },
    /// Sequence whose elements are themselves structured.
    Sequence {
        ty: TypeId,
        elements: Vec<Value>,
    },
    Function {
        decl: DeclId,
        ty: TypeId,
    },
    Reference {
        ty: TypeId,
        target: Value,
    },
    /// View of one element of a packed sequence. Reads and writes go
    /// through to the sequence's buffer.
    Element {
        sequence: Value,
        index: usize,
    },
}

/// Shared handle to a compile-time value.
#[derive(Debug, Clone)]
pub struct Value(Rc<RefCell<ValueKind>>);

impl Value {
    fn wrap(kind: ValueKind) -> Self {
        Value(Rc::new(RefCell::new(kind)))
    }

    pub fn null() -> Self {
        Value::wrap(ValueKind::Null)
    }

    pub fn error() -> Self {
        Value::wrap(ValueKind::Error)
    }

    pub fn from_scalar(ty: TypeId, primitive: Primitive, scalar: Scalar) -> Self {
        Value::wrap(ValueKind::Scalar {
            ty,
            primitive,
            bytes: encode(primitive, scalar),
        })
    }

    pub fn from_bool(value: bool) -> Self {
        Value::from_scalar(TypeId::BOOL, Primitive::Bool, Scalar::Bool(value))
    }

    pub fn from_i64(ty: TypeId, primitive: Primitive, value: i64) -> Self {
        Value::from_scalar(ty, primitive, Scalar::Int(value))
    }

    pub fn from_f64(ty: TypeId, primitive: Primitive, value: f64) -> Self {
        Value::from_scalar(ty, primitive, Scalar::Float(value))
    }

    pub fn function(decl: DeclId, ty: TypeId) -> Self {
        Value::wrap(ValueKind::Function { decl, ty })
    }

    pub fn reference(ty: TypeId, target: Value) -> Self {
        Value::wrap(ValueKind::Reference { ty, target })
    }

    /// Builds a sequence. Scalars are packed into one buffer; anything else
    /// is kept element by element.
    pub fn sequence(ty: TypeId, elements: Vec<Value>) -> Self {
        let scalars: Option<Vec<(TypeId, Primitive, Scalar)>> = elements
            .iter()
            .map(|element| {
                let primitive = element.primitive()?;
                let scalar = element.scalar()?;
                Some((element.ty()?, primitive, scalar))
            })
            .collect();

        match scalars {
            Some(scalars) if !elements.is_empty() => {
                let mut layout = vec![];
                let mut buffer = vec![];
                for (element_ty, primitive, scalar) in scalars {
                    layout.push(Slot {
                        offset: buffer.len(),
                        ty: element_ty,
                        primitive,
                    });
                    buffer.extend(encode(primitive, scalar));
                }
                Value::wrap(ValueKind::Packed { ty, layout, buffer })
            }
            _ => Value::wrap(ValueKind::Sequence { ty, elements }),
        }
    }

    pub fn kind(&self) -> Ref<'_, ValueKind> {
        self.0.borrow()
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_null(&self) -> bool {
        matches!(*self.kind(), ValueKind::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(*self.kind(), ValueKind::Error)
    }

    pub fn ty(&self) -> Option<TypeId> {
        match &*self.kind() {
            ValueKind::Null => Some(TypeId::UNIT),
            ValueKind::Error => Some(TypeId::ERROR),
            ValueKind::Scalar { ty, .. }
            | ValueKind::Packed { ty, .. }
            | ValueKind::Sequence { ty, .. }
            | ValueKind::Function { ty, .. }
            | ValueKind::Reference { ty, .. } => Some(*ty),
            ValueKind::Element { sequence, index } => match &*sequence.kind() {
                ValueKind::Packed { layout, .. } => layout.get(*index).map(|slot| slot.ty),
                _ => None,
            },
        }
    }

    pub fn primitive(&self) -> Option<Primitive> {
        match &*self.kind() {
            ValueKind::Scalar { primitive, .. } => Some(*primitive),
            ValueKind::Element { sequence, index } => match &*sequence.kind() {
                ValueKind::Packed { layout, .. } => layout.get(*index).map(|slot| slot.primitive),
                _ => None,
            },
            _ => None,
        }
    }

    /// Reads the primitive payload of a scalar or of a packed element view.
    pub fn scalar(&self) -> Option<Scalar> {
        match &*self.kind() {
            ValueKind::Scalar { primitive, bytes, .. } => Some(decode(*primitive, bytes)),
            ValueKind::Element { sequence, index } => match &*sequence.kind() {
                ValueKind::Packed { layout, buffer, .. } => {
                    let slot = layout.get(*index)?;
                    let end = slot.offset + slot.primitive.size();
                    Some(decode(slot.primitive, &buffer[slot.offset..end]))
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.scalar()? {
            Scalar::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.scalar()? {
            Scalar::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.scalar()? {
            Scalar::Float(f) => Some(f),
            Scalar::Int(i) => Some(i as f64),
            Scalar::Bool(_) => None,
        }
    }

    pub fn function_decl(&self) -> Option<DeclId> {
        match &*self.kind() {
            ValueKind::Function { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match &*self.kind() {
            ValueKind::Packed { layout, .. } => Some(layout.len()),
            ValueKind::Sequence { elements, .. } => Some(elements.len()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Element `index` of a sequence. Packed sequences hand out views into
    /// their buffer; structured sequences hand out the element itself.
    pub fn element(&self, index: usize) -> Option<Value> {
        match &*self.kind() {
            ValueKind::Packed { layout, .. } if index < layout.len() => {
                Some(Value::wrap(ValueKind::Element {
                    sequence: self.clone(),
                    index,
                }))
            }
            ValueKind::Sequence { elements, .. } => elements.get(index).cloned(),
            _ => None,
        }
    }

    /// Follows one level of indirection. An element view yields a detached
    /// copy of the element.
    pub fn deref(&self) -> Option<Value> {
        match &*self.kind() {
            ValueKind::Reference { target, .. } => Some(target.clone()),
            ValueKind::Element { .. } => {
                let ty = self.ty()?;
                let primitive = self.primitive()?;
                let scalar = self.scalar()?;
                Some(Value::from_scalar(ty, primitive, scalar))
            }
            _ => None,
        }
    }

    /// Writes the scalar payload of `source` into this value's storage,
    /// converting it to the destination's primitive. Returns false when
    /// this value is not writable storage.
    pub fn store(&self, source: &Value) -> bool {
        let scalar = match source.scalar() {
            Some(scalar) => scalar,
            None => return false,
        };

        let target = match &*self.kind() {
            ValueKind::Reference { target, .. } => Some(target.clone()),
            _ => None,
        };
        if let Some(target) = target {
            return target.store(source);
        }

        let mut kind = self.0.borrow_mut();
        match &mut *kind {
            ValueKind::Scalar { primitive, bytes, .. } => {
                *bytes = encode(*primitive, scalar);
                true
            }
            ValueKind::Element { sequence, index } => {
                let mut sequence = sequence.0.borrow_mut();
                match &mut *sequence {
                    ValueKind::Packed { layout, buffer, .. } => {
                        let slot = match layout.get(*index) {
                            Some(slot) => slot.clone(),
                            None => return false,
                        };
                        let encoded = encode(slot.primitive, scalar);
                        buffer[slot.offset..slot.offset + encoded.len()].copy_from_slice(&encoded);
                        true
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Deep copy. Nothing reachable from the copy is shared with `self`.
    pub fn duplicate(&self) -> Value {
        let copy = match &*self.kind() {
            ValueKind::Null => ValueKind::Null,
            ValueKind::Error => ValueKind::Error,
            ValueKind::Scalar { ty, primitive, bytes } => ValueKind::Scalar {
                ty: *ty,
                primitive: *primitive,
                bytes: bytes.clone(),
            },
            ValueKind::Packed { ty, layout, buffer } => ValueKind::Packed {
                ty: *ty,
                layout: layout.clone(),
                buffer: buffer.clone(),
            },
            ValueKind::Sequence { ty, elements } => ValueKind::Sequence {
                ty: *ty,
                elements: elements.iter().map(Value::duplicate).collect(),
            },
            ValueKind::Function { decl, ty } => ValueKind::Function { decl: *decl, ty: *ty },
            ValueKind::Reference { ty, target } => ValueKind::Reference {
                ty: *ty,
                target: target.duplicate(),
            },
            ValueKind::Element { sequence, index } => ValueKind::Element {
                sequence: sequence.duplicate(),
                index: *index,
            },
        };
        Value::wrap(copy)
    }

    /// Same value with a different static type, e.g. after a nominal wrap.
    pub fn retyped(&self, new_ty: TypeId) -> Value {
        let copy = self.duplicate();
        {
            let mut kind = copy.0.borrow_mut();
            match &mut *kind {
                ValueKind::Scalar { ty, .. }
                | ValueKind::Packed { ty, .. }
                | ValueKind::Sequence { ty, .. }
                | ValueKind::Function { ty, .. }
                | ValueKind::Reference { ty, .. } => *ty = new_ty,
                _ => {}
            }
        }
        copy
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(scalar) = self.scalar() {
            return write!(f, "{}", scalar);
        }
        match &*self.kind() {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Error => write!(f, "<error>"),
            ValueKind::Function { decl, .. } => write!(f, "fn#{}", decl.0),
            ValueKind::Reference { target, .. } => write!(f, "@{}", target),
            ValueKind::Packed { .. } | ValueKind::Sequence { .. } => {
                let count = self.len().unwrap_or(0);
                write!(f, "[")?;
                for index in 0..count {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    match self.element(index) {
                        Some(element) => write!(f, "{}", element)?,
                        None => write!(f, "?")?,
                    }
                }
                write!(f, "]")
            }
            _ => write!(f, "?"),
        }
    }
}

/// Little-endian encoding at the primitive's width. Integers are truncated,
/// which is what makes folded arithmetic wrap. `float80` keeps `f64`
/// precision padded to ten bytes.
pub fn encode(primitive: Primitive, scalar: Scalar) -> Vec<u8> {
    match scalar.convert(primitive) {
        Scalar::Bool(b) => vec![b as u8],
        Scalar::Int(i) => i.to_le_bytes()[..primitive.size()].to_vec(),
        Scalar::Float(x) => match primitive {
            Primitive::Float32 => (x as f32).to_le_bytes().to_vec(),
            Primitive::Float64 => x.to_le_bytes().to_vec(),
            _ => {
                let mut bytes = x.to_le_bytes().to_vec();
                bytes.resize(primitive.size(), 0);
                bytes
            }
        },
    }
}

pub fn decode(primitive: Primitive, bytes: &[u8]) -> Scalar {
    match primitive {
        Primitive::Bool => Scalar::Bool(bytes.first().copied().unwrap_or(0) != 0),
        Primitive::Float32 => {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[..4]);
            Scalar::Float(f32::from_le_bytes(raw) as f64)
        }
        Primitive::Float64 | Primitive::Float80 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[..8]);
            Scalar::Float(f64::from_le_bytes(raw))
        }
        _ => {
            let size = primitive.size();
            let negative = bytes[size - 1] & 0x80 != 0;
            let mut raw = if negative { [0xffu8; 8] } else { [0u8; 8] };
            raw[..size].copy_from_slice(&bytes[..size]);
            Scalar::Int(i64::from_le_bytes(raw))
        }
    }
}
