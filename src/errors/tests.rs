//! Unit tests for error handling.

use crate::errors::errors::{Diagnostics, Error, ErrorImpl, ErrorTip, Severity};
use crate::Position;
use std::rc::Rc;

fn position(offset: u32) -> Position {
    Position(offset, Rc::new("test.lang".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "#".to_string(),
        },
        position(10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 10);
    assert_eq!(error.get_severity(), Severity::Error);
}

#[test]
fn test_fatal_error_is_hard() {
    let error = Error::fatal(
        ErrorImpl::NoEntryPoint {
            symbol: "main".to_string(),
        },
        position(0),
    );

    assert!(error.is_fatal());
    assert!(error.is_hard());
    assert_eq!(error.get_error_name(), "NoEntryPoint");
}

#[test]
fn test_warnings_and_nitpicks_are_not_hard() {
    let warning = Error::new(ErrorImpl::DivisionByZero, position(0)).with_severity(Severity::Warning);
    let nitpick = Error::new(ErrorImpl::ConstantCondition { value: true }, position(0))
        .with_severity(Severity::Nitpick);

    assert!(!warning.is_hard());
    assert!(!nitpick.is_hard());
}

#[test]
fn test_ambiguity_notes() {
    let error = Error::new(
        ErrorImpl::AmbiguousOverload {
            name: "f".to_string(),
            candidates: 2,
        },
        position(40),
    )
    .with_notes(vec![position(3), position(20)]);

    assert_eq!(error.get_notes().len(), 2);
    assert_eq!(error.get_notes()[1].0, 20);
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "#".to_string(),
        },
        position(0),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_suggestion() {
    let error = Error::new(
        ErrorImpl::VariableNotDeclared {
            variable: "g".to_string(),
        },
        position(0),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(text) => assert_eq!(text, "`g` is not defined"),
        _ => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_error_display_includes_severity() {
    let error = Error::new(
        ErrorImpl::NotAnLvalue {
            operation: "=".to_string(),
        },
        position(0),
    );

    assert_eq!(error.to_string(), "Error: cannot apply \"=\" to a non-lvalue");
}

#[test]
fn test_diagnostics_count_only_hard_errors() {
    let mut diagnostics = Diagnostics::new();
    diagnostics.report(Error::new(ErrorImpl::DivisionByZero, position(0)).with_severity(Severity::Warning));
    assert!(!diagnostics.has_errors());

    diagnostics.report(Error::new(
        ErrorImpl::TypeMatchError {
            expected: "bool".to_string(),
            received: "int32".to_string(),
        },
        position(5),
    ));

    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics.error_count(), 1);
    assert!(diagnostics.find("TypeMatchError").is_some());
    assert!(diagnostics.find("NoEntryPoint").is_none());
}
