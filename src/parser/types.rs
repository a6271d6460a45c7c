//! Type parsing implementation.
//!
//! Types are prefix-only, so a single NUD table covers them:
//!
//! - Names with optional generic arguments: `Vec<int32>`
//! - Lists of unknown or fixed length: `[int8]`, `[int8; 4]`
//! - Tuples, optionally with field names: `()`, `(int32,)`, `(x: float64, y: float64)`
//! - References: `@int32`
//! - Function types: `fn(int32, bool) -> int64`

use std::collections::HashMap;

use crate::{
    ast::nodes::TypeExpr,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::parser::Parser;

/// Type alias for type null denotation handler functions.
pub type TypeNUDHandler = fn(&mut Parser<'_>) -> Result<TypeExpr, Error>;

/// Type alias for type NUD lookup table.
pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

/// Initializes the type parsing lookup table.
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    parser.type_nud(TokenKind::OpenBracket, parse_list_type);
    parser.type_nud(TokenKind::OpenParen, parse_tuple_type);
    parser.type_nud(TokenKind::At, parse_reference_type);
    parser.type_nud(TokenKind::Fn, parse_func_type);
}

pub fn parse_symbol_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    let token = parser.expect(TokenKind::Identifier)?;

    let mut args = vec![];
    if parser.current_token_kind() == TokenKind::Less {
        parser.advance();
        while parser.current_token_kind() != TokenKind::Greater {
            args.push(parse_type(parser)?);
            if parser.current_token_kind() == TokenKind::Comma {
                parser.advance();
            } else if parser.current_token_kind() != TokenKind::Greater {
                return Err(parser.unexpected("expected `,` or `>` in type arguments"));
            }
        }
        parser.expect(TokenKind::Greater)?;
    }

    Ok(TypeExpr::Name {
        name: token.value,
        args,
        position: token.span.start,
    })
}

pub fn parse_list_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    parser.expect(TokenKind::OpenBracket)?;
    let element = parse_type(parser)?;

    let length = if parser.current_token_kind() == TokenKind::Semicolon {
        parser.advance();
        let token = parser.expect(TokenKind::Number)?;
        let length = token.value.parse::<u64>().map_err(|_| {
            Error::new(
                ErrorImpl::NumberParseError {
                    token: token.value.clone(),
                },
                token.span.start.clone(),
            )
        })?;
        Some(length)
    } else {
        None
    };

    parser.expect(TokenKind::CloseBracket)?;
    Ok(TypeExpr::List {
        element: Box::new(element),
        length,
    })
}

pub fn parse_tuple_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    parser.expect(TokenKind::OpenParen)?;

    let mut fields = vec![];
    let mut saw_comma = false;
    while parser.current_token_kind() != TokenKind::CloseParen {
        let name = if parser.current_token_kind() == TokenKind::Identifier
            && parser.peek_kind(1) == TokenKind::Colon
        {
            let name = parser.advance().value.clone();
            parser.advance();
            Some(name)
        } else {
            None
        };
        fields.push((name, parse_type(parser)?));

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
            saw_comma = true;
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in tuple type"));
        }
    }
    parser.expect(TokenKind::CloseParen)?;

    // `(T)` is just `T`.
    if fields.len() == 1 && !saw_comma && fields[0].0.is_none() {
        if let Some((_, inner)) = fields.pop() {
            return Ok(inner);
        }
    }

    Ok(TypeExpr::Tuple(fields))
}

pub fn parse_reference_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    parser.expect(TokenKind::At)?;
    Ok(TypeExpr::Ref(Box::new(parse_type(parser)?)))
}

pub fn parse_func_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    parser.expect(TokenKind::Fn)?;
    parser.expect(TokenKind::OpenParen)?;

    let mut arguments = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        arguments.push(parse_type(parser)?);
        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)` in function type"));
        }
    }
    parser.expect(TokenKind::CloseParen)?;

    let ret = if parser.current_token_kind() == TokenKind::Arrow {
        parser.advance();
        parse_type(parser)?
    } else {
        TypeExpr::Tuple(vec![])
    };

    Ok(TypeExpr::Func {
        arguments,
        ret: Box::new(ret),
    })
}

pub fn parse_type(parser: &mut Parser) -> Result<TypeExpr, Error> {
    let token_kind = parser.current_token_kind();
    match parser.get_type_nud_lookup().get(&token_kind).copied() {
        Some(nud) => nud(parser),
        None => Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        )),
    }
}
