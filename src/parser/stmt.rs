use crate::{
    ast::{
        ast::NodeId,
        nodes::{NodeKind, TypeExpr},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
    scope::{
        decls::{DeclKind, Param},
        scope::{ScopeId, ScopeKind, TypeDef, TypeDefBody},
    },
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    if let Some(handler) = parser.get_stmt_lookup().get(&parser.current_token_kind()).copied() {
        return handler(parser);
    }

    let expr = parse_expr(parser, BindingPower::Default)?;

    match parser.current_token_kind() {
        TokenKind::Semicolon => {
            parser.advance();
            let span = parser.context.ast.span(expr).clone();
            Ok(parser.node(NodeKind::ExprStmt, span, vec![expr]))
        }
        // A trailing expression without a semicolon is the value of its block.
        TokenKind::CloseCurly | TokenKind::Else => Ok(expr),
        _ => Err(parser.unexpected("expected `;` after expression")),
    }
}

pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start_token = parser.advance().clone();
    let is_const = start_token.kind == TokenKind::Const;

    let error = parser.unexpected("expected identifier during variable declaration");
    let name_token = parser.expect_error(TokenKind::Identifier, Some(error))?;

    let declared = if parser.current_token_kind() == TokenKind::Colon {
        parser.advance();
        Some(parse_type(parser)?)
    } else {
        None
    };

    let mut is_ref = false;
    let initializer = match parser.current_token_kind() {
        TokenKind::Assignment => {
            parser.advance();
            Some(parse_expr(parser, BindingPower::Default)?)
        }
        TokenKind::AtEquals => {
            parser.advance();
            is_ref = true;
            Some(parse_expr(parser, BindingPower::Default)?)
        }
        TokenKind::Semicolon if declared.is_none() => {
            return Err(parser.unexpected("expected rhs or explicit type"));
        }
        TokenKind::Semicolon if is_const => {
            return Err(parser.unexpected("expected rhs in constant definition"));
        }
        TokenKind::Semicolon => None,
        _ => return Err(parser.unexpected("expected `=`, `@=` or `;`")),
    };

    parser.expect(TokenKind::Semicolon)?;

    let scope = parser.declaration_scope();
    let decl = parser.context.decls.add(
        &name_token.value,
        DeclKind::Variable { is_const, is_ref },
        scope,
        name_token.span.start.clone(),
    );
    parser
        .context
        .scopes
        .add_var_def(scope, &name_token.value, decl, false)
        .map_err(|error| Error::new(error, name_token.span.start.clone()))?;

    let span = parser.span_from(start_token.span.start);
    let node = parser.node(
        NodeKind::VarDecl {
            decl,
            declared,
            is_ref,
        },
        span,
        initializer.into_iter().collect(),
    );
    parser.context.decls.get_mut(decl).node = Some(node);

    Ok(node)
}

/// `fn name(a: T, b: U) -> R { ... }`. The return type defaults to unit.
pub fn parse_fn_decl_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start.clone();
    let name_token = parser.expect(TokenKind::Identifier)?;
    let scope = parser.declaration_scope();

    let body_scope = parser.push_scope(ScopeKind::Function);
    let result = parse_fn_signature_and_body(parser, body_scope);
    parser.pop_scope();
    let (params, ret, body) = result?;

    let decl = parser.context.decls.add(
        &name_token.value,
        DeclKind::Function {
            params,
            ret,
            body_scope,
        },
        scope,
        name_token.span.start.clone(),
    );
    parser
        .context
        .scopes
        .add_var_def(scope, &name_token.value, decl, true)
        .map_err(|error| Error::new(error, name_token.span.start.clone()))?;

    let span = parser.span_from(start);
    let node = parser.node(NodeKind::FuncDecl { decl }, span, vec![body]);
    parser.context.decls.get_mut(decl).node = Some(node);

    Ok(node)
}

type FnParts = (Vec<Param>, Option<TypeExpr>, NodeId);

fn parse_fn_signature_and_body(parser: &mut Parser, body_scope: ScopeId) -> Result<FnParts, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut params = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        let param_token = parser.expect(TokenKind::Identifier)?;
        parser.expect(TokenKind::Colon)?;
        let ty = parse_type(parser)?;

        let decl = parser.context.decls.add(
            &param_token.value,
            DeclKind::Parameter,
            body_scope,
            param_token.span.start.clone(),
        );
        parser
            .context
            .scopes
            .add_var_def(body_scope, &param_token.value, decl, false)
            .map_err(|error| Error::new(error, param_token.span.start.clone()))?;
        params.push(Param {
            name: param_token.value,
            ty,
            decl,
        });

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in parameter list"));
        }
    }
    parser.expect(TokenKind::CloseParen)?;

    let ret = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        Some(parse_type(parser)?)
    } else {
        None
    };

    if parser.current_token_kind() != TokenKind::OpenCurly {
        return Err(parser.unexpected("expected function body"));
    }
    let body = parse_block_stmt(parser)?;

    Ok((params, ret, body))
}

/// `type Name<T, U> = body;`
pub fn parse_type_decl_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start.clone();
    let name_token = parser.expect(TokenKind::Identifier)?;

    let mut params = vec![];
    if parser.current_token_kind() == TokenKind::Less {
        parser.advance();
        while parser.current_token_kind() != TokenKind::Greater {
            params.push(parser.expect(TokenKind::Identifier)?.value);
            if parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
            } else if parser.current_token_kind() != TokenKind::Greater {
                return Err(parser.unexpected("expected `,` or `>` in type parameters"));
            }
        }
        parser.expect(TokenKind::Greater)?;
    }

    parser.expect(TokenKind::Assignment)?;
    let body = parse_type(parser)?;
    parser.expect(TokenKind::Semicolon)?;

    let scope = parser.declaration_scope();
    let def = TypeDef {
        name: name_token.value.clone(),
        params,
        body: TypeDefBody::Syntax(body),
        scope: parser.current_scope(),
        position: name_token.span.start.clone(),
        param_types: vec![],
        resolved: None,
        resolving: false,
    };
    parser
        .context
        .scopes
        .add_type_def(scope, def)
        .map_err(|error| Error::new(error, name_token.span.start.clone()))?;

    let span = parser.span_from(start);
    Ok(parser.node(
        NodeKind::TypeDecl {
            name: name_token.value,
        },
        span,
        vec![],
    ))
}

/// `import name;`, or `export import name;` to re-export.
pub fn parse_import_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start.clone();
    if !parser.at_top_level() {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: String::from("import"),
                message: String::from("imports are only allowed at the top level"),
            },
            start,
        ));
    }

    let module = parser.expect(TokenKind::Identifier)?.value;
    parser.expect(TokenKind::Semicolon)?;

    let public = parser.is_exporting();
    let span = parser.span_from(start);
    Ok(parser.node(NodeKind::Import { module, public }, span, vec![]))
}

pub fn parse_export_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start.clone();
    if !parser.at_top_level() {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: String::from("export"),
                message: String::from("only top-level items can be exported"),
            },
            start,
        ));
    }

    match parser.current_token_kind() {
        TokenKind::Fn | TokenKind::Type | TokenKind::Let | TokenKind::Const | TokenKind::Import => {}
        _ => return Err(parser.unexpected("expected an item after `export`")),
    }

    parser.set_exporting(true);
    let item = parse_stmt(parser);
    parser.set_exporting(false);
    item
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start.clone();

    let mut children = vec![];
    if parser.current_token_kind() != TokenKind::Semicolon {
        children.push(parse_expr(parser, BindingPower::Default)?);
    }
    parser.expect(TokenKind::Semicolon)?;

    let span = parser.span_from(start);
    Ok(parser.node(NodeKind::Return, span, children))
}

/// Shared by statement and expression `if`; `arm` parses each branch.
pub fn parse_if(parser: &mut Parser, arm: fn(&mut Parser<'_>) -> Result<NodeId, Error>) -> Result<NodeId, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let then_body = arm(parser)?;

    let mut children = vec![condition, then_body];
    if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        children.push(arm(parser)?);
    }

    let span = parser.span_from(start);
    Ok(parser.node(NodeKind::If, span, children))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    parse_if(parser, parse_stmt)
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start.clone();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_stmt(parser)?;

    let span = parser.span_from(start);
    Ok(parser.node(NodeKind::While, span, vec![condition, body]))
}

/// `{ a; b; c }` becomes `Block(Pair(a, Pair(b, c)))`.
pub fn parse_block_stmt(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start.clone();
    parser.push_scope(ScopeKind::Block);

    let mut statements = Vec::new();
    let result = loop {
        match parser.current_token_kind() {
            TokenKind::CloseCurly => break Ok(()),
            TokenKind::EOF => break Err(parser.unexpected("unterminated block")),
            _ => match parse_stmt(parser) {
                Ok(stmt) => statements.push(stmt),
                Err(error) => break Err(error),
            },
        }
    };

    let sequence = result.map(|_| chain_statements(parser, statements));
    parser.pop_scope();
    let sequence = sequence?;

    parser.expect(TokenKind::CloseCurly)?;

    let span = parser.span_from(start);
    Ok(parser.node(NodeKind::Block, span, sequence.into_iter().collect()))
}

/// Folds statements into a right-nested chain of pairs.
fn chain_statements(parser: &mut Parser, statements: Vec<NodeId>) -> Option<NodeId> {
    let mut iter = statements.into_iter().rev();
    let mut rest = iter.next()?;

    for first in iter {
        let span = parser
            .context
            .ast
            .span(first)
            .to(parser.context.ast.span(rest));
        rest = parser.node(NodeKind::Pair, span, vec![first, rest]);
    }

    Some(rest)
}
