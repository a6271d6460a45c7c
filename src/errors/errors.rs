use std::fmt::Display;

use thiserror::Error;

use crate::Position;

/// How bad a diagnostic is. Only `Fatal` and `Error` count as hard errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Nitpick,
    Warning,
    Error,
    Fatal,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Nitpick => write!(f, "Nitpick"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Error => write!(f, "Error"),
            Severity::Fatal => write!(f, "Fatal"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
    severity: Severity,
    notes: Vec<Position>,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
            severity: Severity::Error,
            notes: vec![],
        }
    }

    /// Creates an error that stops the whole compilation.
    pub fn fatal(error_impl: ErrorImpl, position: Position) -> Self {
        Error::new(error_impl, position).with_severity(Severity::Fatal)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attaches secondary locations, printed as notes after the main message.
    pub fn with_notes(mut self, notes: Vec<Position>) -> Self {
        self.notes = notes;
        self
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_severity(&self) -> Severity {
        self.severity
    }

    pub fn get_notes(&self) -> &[Position] {
        &self.notes
    }

    pub fn get_kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    pub fn is_hard(&self) -> bool {
        self.severity >= Severity::Error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::TypeAlreadyDeclared { .. } => "TypeAlreadyDeclared",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::UsedBeforeDeclaration { .. } => "UsedBeforeDeclaration",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::RecursiveType { .. } => "RecursiveType",
            ErrorImpl::NotAnLvalue { .. } => "NotAnLvalue",
            ErrorImpl::NotAReference { .. } => "NotAReference",
            ErrorImpl::NoMatchingOverload { .. } => "NoMatchingOverload",
            ErrorImpl::AmbiguousOverload { .. } => "AmbiguousOverload",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::FieldNotFound { .. } => "FieldNotFound",
            ErrorImpl::NotIndexable { .. } => "NotIndexable",
            ErrorImpl::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            ErrorImpl::ReturnOutsideFunction => "ReturnOutsideFunction",
            ErrorImpl::ModuleNotFound { .. } => "ModuleNotFound",
            ErrorImpl::DivisionByZero => "DivisionByZero",
            ErrorImpl::ConstantCondition { .. } => "ConstantCondition",
            ErrorImpl::FileUnreadable { .. } => "FileUnreadable",
            ErrorImpl::NoEntryPoint { .. } => "NoEntryPoint",
            ErrorImpl::EntryPointNotCallable { .. } => "EntryPointNotCallable",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` already declared", variable))
            }
            ErrorImpl::TypeAlreadyDeclared { type_ } => {
                ErrorTip::Suggestion(format!("Type `{}` already declared", type_))
            }
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("`{}` is not defined", variable))
            }
            ErrorImpl::UsedBeforeDeclaration { variable } => ErrorTip::Suggestion(format!(
                "Variable `{}` is used before its declaration",
                variable
            )),
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::RecursiveType { type_ } => ErrorTip::Suggestion(format!(
                "Type `{}` refers to itself",
                type_
            )),
            ErrorImpl::NotAnLvalue { operation } => ErrorTip::Suggestion(format!(
                "The left side of `{}` must be something that can be stored to",
                operation
            )),
            ErrorImpl::NotAReference { variable } => ErrorTip::Suggestion(format!(
                "`{}` is not a reference, declare it with `@=`",
                variable
            )),
            ErrorImpl::NoMatchingOverload { name, arguments } => ErrorTip::Suggestion(format!(
                "No accessible overload of `{}` matches arguments `{}`",
                name, arguments
            )),
            ErrorImpl::AmbiguousOverload { name, candidates } => ErrorTip::Suggestion(format!(
                "Call to `{}` is ambiguous between {} candidates",
                name, candidates
            )),
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::FieldNotFound { field, type_ } => {
                ErrorTip::Suggestion(format!("Type `{}` has no field `{}`", type_, field))
            }
            ErrorImpl::NotIndexable { type_ } => {
                ErrorTip::Suggestion(format!("Type `{}` cannot be indexed", type_))
            }
            ErrorImpl::IndexOutOfBounds { index, length } => ErrorTip::Suggestion(format!(
                "Index {} is out of bounds for length {}",
                index, length
            )),
            ErrorImpl::ReturnOutsideFunction => {
                ErrorTip::Suggestion(String::from("`return` can only be used inside a function"))
            }
            ErrorImpl::ModuleNotFound { module } => {
                ErrorTip::Suggestion(format!("Module `{}` could not be found", module))
            }
            ErrorImpl::DivisionByZero => ErrorTip::Suggestion(String::from(
                "This division by a constant zero is left for the program to trap on",
            )),
            ErrorImpl::ConstantCondition { value } => {
                ErrorTip::Suggestion(format!("Condition is always `{}`", value))
            }
            ErrorImpl::FileUnreadable { path } => {
                ErrorTip::Suggestion(format!("Could not read `{}`", path))
            }
            ErrorImpl::NoEntryPoint { symbol } => ErrorTip::Suggestion(format!(
                "Declare `fn {}()` to give the program an entry point",
                symbol
            )),
            ErrorImpl::EntryPointNotCallable { symbol } => {
                ErrorTip::Suggestion(format!("`{}` must be a function taking no arguments", symbol))
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.internal_error)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("type {type_:?} already declared")]
    TypeAlreadyDeclared { type_: String },
    #[error("{variable:?} not defined")]
    VariableNotDeclared { variable: String },
    #[error("variable {variable:?} used before declaration")]
    UsedBeforeDeclaration { variable: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("type {type_} is recursive")]
    RecursiveType { type_: String },
    #[error("cannot apply {operation:?} to a non-lvalue")]
    NotAnLvalue { operation: String },
    #[error("{variable:?} is not a reference")]
    NotAReference { variable: String },
    #[error("no accessible overload of {name:?} matches {arguments}")]
    NoMatchingOverload { name: String, arguments: String },
    #[error("ambiguous call to {name:?}: {candidates} candidates")]
    AmbiguousOverload { name: String, candidates: usize },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMatchError { expected: String, received: String },
    #[error("no field {field:?} on {type_}")]
    FieldNotFound { field: String, type_: String },
    #[error("{type_} is not indexable")]
    NotIndexable { type_: String },
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: i64, length: u64 },
    #[error("return outside of function")]
    ReturnOutsideFunction,
    #[error("module {module:?} not found")]
    ModuleNotFound { module: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("condition is always {value}")]
    ConstantCondition { value: bool },
    #[error("file {path:?} is unreadable")]
    FileUnreadable { path: String },
    #[error("no entry point {symbol:?} found")]
    NoEntryPoint { symbol: String },
    #[error("entry point {symbol:?} is not callable")]
    EntryPointNotCallable { symbol: String },
}

/// Accumulates every diagnostic reported during a compilation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    reported: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn report(&mut self, error: Error) {
        tracing::debug!(target: "diagnostics", name = error.get_error_name(), severity = %error.get_severity());
        self.reported.push(error);
    }

    /// Number of hard (`Error` or `Fatal`) diagnostics; later stages only run when this is zero.
    pub fn error_count(&self) -> usize {
        self.reported.iter().filter(|error| error.is_hard()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.reported.iter()
    }

    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }

    /// Returns the first diagnostic with the given name, mostly useful in tests.
    pub fn find(&self, name: &str) -> Option<&Error> {
        self.reported.iter().find(|error| error.get_error_name() == name)
    }
}
