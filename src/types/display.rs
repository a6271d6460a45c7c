use super::type_manager::{TypeId, TypeKind, TypeManager};

impl TypeManager {
    /// Source-like rendering, e.g. `Pair<int32>`, `[int8; 4]`, `(x: int32, bool)`.
    pub fn display(&self, ty: TypeId) -> String {
        match self.kind(ty) {
            TypeKind::Primitive(primitive) => primitive.name().to_string(),
            TypeKind::Error => String::from("<error>"),
            TypeKind::Param { name } => name.clone(),
            TypeKind::List { element, length } => match length {
                Some(length) => format!("[{}; {}]", self.display(*element), length),
                None => format!("[{}]", self.display(*element)),
            },
            TypeKind::Tuple { fields } => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|field| match &field.name {
                        Some(name) => format!("{}: {}", name, self.display(field.ty)),
                        None => self.display(field.ty),
                    })
                    .collect();
                if rendered.len() == 1 && fields[0].name.is_none() {
                    format!("({},)", rendered[0])
                } else {
                    format!("({})", rendered.join(", "))
                }
            }
            TypeKind::Reference { target } => format!("@{}", self.display(*target)),
            TypeKind::Named { name, args, .. } => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let rendered: Vec<String> = args.iter().map(|&arg| self.display(arg)).collect();
                    format!("{}<{}>", name, rendered.join(", "))
                }
            }
            TypeKind::Func { arguments, ret } => {
                let arguments = match self.kind(*arguments) {
                    TypeKind::Tuple { fields } => fields
                        .iter()
                        .map(|field| self.display(field.ty))
                        .collect::<Vec<String>>()
                        .join(", "),
                    _ => self.display(*arguments),
                };
                format!("fn({}) -> {}", arguments, self.display(*ret))
            }
        }
    }
}
