//! Parser implementation for building the syntax tree.
//!
//! This module contains the main Parser struct and the module entry point.
//! The parser uses a Pratt parser approach with NUD/LED handlers for
//! expression parsing and specialized functions for statement parsing.
//!
//! It maintains lookup tables for:
//! - Statement handlers
//! - NUD (null denotation) handlers for prefix expressions
//! - LED (left denotation) handlers for infix expressions
//! - Binding powers for operator precedence
//! - Type parsing handlers
//!
//! Nodes are written straight into the compilation's arena, and every
//! declaration is registered in the scope the parser is currently in.

use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::{ast::NodeId, nodes::NodeKind},
    context::{Context, ModuleId},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    scope::scope::{ScopeId, ScopeKind},
    Position, Span,
};

use super::{
    lookups::{
        create_token_lookups, BPLookup, BindingPower, LEDHandler, LEDLookup, NUDHandler, NUDLookup,
        StmtHandler, StmtLookup,
    },
    stmt::parse_stmt,
    types::{create_token_type_lookups, TypeNUDHandler, TypeNUDLookup},
};

/// The main parser structure that maintains parsing state.
pub struct Parser<'c> {
    /// The list of tokens to parse
    tokens: Vec<Token>,
    /// Current position in the token stream
    pos: usize,
    /// The name of the source file being parsed
    file: Rc<String>,
    stmt_lookup: StmtLookup,
    nud_lookup: NUDLookup,
    led_lookup: LEDLookup,
    binding_power_lookup: BPLookup,
    type_nud_lookup: TypeNUDLookup,
    /// Compilation the parsed nodes and declarations are added to
    pub context: &'c mut Context,
    module: ModuleId,
    /// Innermost scope last
    scopes: Vec<ScopeId>,
    /// Set while parsing the item after `export`
    exporting: bool,
}

impl<'c> Parser<'c> {
    pub fn new(tokens: Vec<Token>, file: Rc<String>, context: &'c mut Context, module: ModuleId) -> Self {
        let private = context.module(module).layers.private;

        Parser {
            tokens,
            pos: 0,
            file,
            stmt_lookup: HashMap::new(),
            nud_lookup: HashMap::new(),
            led_lookup: HashMap::new(),
            binding_power_lookup: HashMap::new(),
            type_nud_lookup: HashMap::new(),
            context,
            module,
            scopes: vec![private],
            exporting: false,
        }
    }

    /// Returns the current token without advancing. Past the end this is
    /// the EOF token.
    pub fn current_token(&self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Kind of the token `offset` places ahead of the current one.
    pub fn peek_kind(&self, offset: usize) -> TokenKind {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[index].kind
    }

    /// Advances to the next token and returns the previous token.
    pub fn advance(&mut self) -> &Token {
        let index = self.pos.min(self.tokens.len() - 1);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[index]
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(&mut self, expected_kind: TokenKind, error: Option<Error>) -> Result<Token, Error> {
        let token = self.current_token();
        if token.kind != expected_kind {
            return match error {
                Some(error) => Err(error),
                None => Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: token.value.clone(),
                    },
                    token.span.start.clone(),
                )),
            };
        }

        Ok(self.advance().clone())
    }

    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Error for the current token carrying an explanation.
    pub fn unexpected(&self, message: &str) -> Error {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: self.current_token().value.clone(),
                message: message.to_string(),
            },
            self.get_position(),
        )
    }

    pub fn has_tokens(&self) -> bool {
        self.current_token_kind() != TokenKind::EOF
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    pub fn get_nud_lookup(&self) -> &NUDLookup {
        &self.nud_lookup
    }

    pub fn get_led_lookup(&self) -> &LEDLookup {
        &self.led_lookup
    }

    pub fn get_bp_lookup(&self) -> &BPLookup {
        &self.binding_power_lookup
    }

    pub fn get_type_nud_lookup(&self) -> &TypeNUDLookup {
        &self.type_nud_lookup
    }

    /// Registers a left denotation (infix) handler for a token.
    pub fn led(&mut self, kind: TokenKind, binding_power: BindingPower, led_fn: LEDHandler) {
        self.binding_power_lookup.insert(kind, binding_power);
        self.led_lookup.insert(kind, led_fn);
    }

    /// Registers a null denotation (prefix) handler for a token.
    pub fn nud(&mut self, kind: TokenKind, nud_fn: NUDHandler) {
        self.nud_lookup.insert(kind, nud_fn);
    }

    /// Registers a statement handler for a token.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    /// Registers a type null denotation handler.
    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: TypeNUDHandler) {
        self.type_nud_lookup.insert(kind, nud_fn);
    }

    /// Start of the current token.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    /// End of the most recently consumed token.
    pub fn previous_end(&self) -> Position {
        match self.pos.checked_sub(1).and_then(|index| self.tokens.get(index)) {
            Some(token) => token.span.end.clone(),
            None => Position(0, Rc::clone(&self.file)),
        }
    }

    pub fn span_from(&self, start: Position) -> Span {
        Span {
            start,
            end: self.previous_end(),
        }
    }

    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn current_scope(&self) -> ScopeId {
        *self.scopes.last().unwrap_or(&self.context.universal)
    }

    pub fn at_top_level(&self) -> bool {
        self.scopes.len() == 1
    }

    pub fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let scope = self.context.scopes.add_scope(kind, Some(self.current_scope()));
        self.scopes.push(scope);
        scope
    }

    /// Enters an existing scope, e.g. a function's parameter scope.
    pub fn enter_scope(&mut self, scope: ScopeId) {
        self.scopes.push(scope);
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn set_exporting(&mut self, exporting: bool) {
        self.exporting = exporting;
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Scope a declaration at the current point belongs to: the module's
    /// public layer for exported items, otherwise the current scope.
    pub fn declaration_scope(&self) -> ScopeId {
        if self.exporting && self.at_top_level() {
            self.context.module(self.module).layers.public
        } else {
            self.current_scope()
        }
    }

    pub fn node(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let scope = self.current_scope();
        self.context.ast.add_with_children(kind, span, scope, children)
    }
}

/// Parses `tokens` into the root node of `module`.
///
/// Stops at the first syntax error.
pub fn parse_module(tokens: Vec<Token>, file: Rc<String>, context: &mut Context, module: ModuleId) -> Result<(), Error> {
    let root = context.module(module).root;
    let mut parser = Parser::new(tokens, file, context, module);
    create_token_lookups(&mut parser);
    create_token_type_lookups(&mut parser);

    while parser.has_tokens() {
        let stmt = parse_stmt(&mut parser)?;
        parser.context.ast.push_child(root, stmt);
    }

    Ok(())
}
