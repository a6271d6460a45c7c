use crate::{
    ast::{
        ast::NodeId,
        nodes::{BinaryOp, NodeKind, UnaryOp},
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    types::type_manager::{Primitive, TypeId},
    value::value::Value,
    Span,
};

use super::{
    lookups::BindingPower,
    parser::Parser,
    stmt::{parse_block_stmt, parse_if},
};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<NodeId, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind).copied() {
        Some(nud) => nud,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_position(),
            ))
        }
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);
        if token_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind).copied() {
            Some(led) => led,
            None => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: parser.current_token().value.clone(),
                    },
                    parser.get_position(),
                ))
            }
        };

        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}

fn literal(parser: &mut Parser, ty: TypeId, value: Value, span: Span) -> NodeId {
    let node = parser.node(NodeKind::Literal, span, vec![]);
    let annotation = parser.context.ast.annotation_mut(node);
    annotation.ty = Some(ty);
    annotation.value = Some(value);
    node
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let token = parser.current_token().clone();

    match token.kind {
        TokenKind::Number => {
            let value: i64 = token.value.parse().map_err(|_| {
                Error::new(
                    ErrorImpl::NumberParseError {
                        token: token.value.clone(),
                    },
                    token.span.start.clone(),
                )
            })?;
            parser.advance();
            let value = Value::from_i64(TypeId::INT64, Primitive::Int64, value);
            Ok(literal(parser, TypeId::INT64, value, token.span))
        }
        TokenKind::Float => {
            let value: f64 = token.value.parse().map_err(|_| {
                Error::new(
                    ErrorImpl::NumberParseError {
                        token: token.value.clone(),
                    },
                    token.span.start.clone(),
                )
            })?;
            parser.advance();
            let value = Value::from_f64(TypeId::FLOAT64, Primitive::Float64, value);
            Ok(literal(parser, TypeId::FLOAT64, value, token.span))
        }
        TokenKind::True | TokenKind::False => {
            parser.advance();
            let value = Value::from_bool(token.kind == TokenKind::True);
            Ok(literal(parser, TypeId::BOOL, value, token.span))
        }
        TokenKind::String => {
            parser.advance();
            // Strings are fixed-length lists of bytes.
            let bytes = token.value.as_bytes();
            let ty = parser
                .context
                .types
                .make_list(TypeId::INT8, Some(bytes.len() as u64));
            let elements = bytes
                .iter()
                .map(|&byte| Value::from_i64(TypeId::INT8, Primitive::Int8, byte as i8 as i64))
                .collect();
            let value = Value::sequence(ty, elements);
            Ok(literal(parser, ty, value, token.span))
        }
        TokenKind::Identifier => {
            parser.advance();
            Ok(parser.node(NodeKind::Symbol { name: token.value }, token.span, vec![]))
        }
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken { token: token.value },
            token.span.start,
        )),
    }
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Dash => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Rem,
        TokenKind::Equals => BinaryOp::Eq,
        TokenKind::NotEquals => BinaryOp::Ne,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEquals => BinaryOp::Le,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEquals => BinaryOp::Ge,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        _ => return None,
    })
}

pub fn parse_binary_expr(parser: &mut Parser, left: NodeId, bp: BindingPower) -> Result<NodeId, Error> {
    let operator_token = parser.advance().clone();
    let op = match binary_op(operator_token.kind) {
        Some(op) => op,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: operator_token.value,
                },
                operator_token.span.start,
            ))
        }
    };

    let right = parse_expr(parser, bp)?;
    let span = parser.context.ast.span(left).to(parser.context.ast.span(right));

    Ok(parser.node(NodeKind::Binary { op }, span, vec![left, right]))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let operator_token = parser.advance().clone();
    let op = if operator_token.kind == TokenKind::Not {
        UnaryOp::Not
    } else {
        UnaryOp::Neg
    };
    let rhs = parse_expr(parser, BindingPower::Unary)?;
    let span = parser.span_from(operator_token.span.start);

    Ok(parser.node(NodeKind::Unary { op }, span, vec![rhs]))
}

/// `target = value` and `target @= referent`. Right associative.
pub fn parse_assignment_expr(parser: &mut Parser, left: NodeId, _bp: BindingPower) -> Result<NodeId, Error> {
    let operator_token = parser.advance().clone();
    let rhs = parse_expr(parser, BindingPower::Comma)?;
    let span = parser.context.ast.span(left).to(parser.context.ast.span(rhs));

    let kind = if operator_token.kind == TokenKind::AtEquals {
        NodeKind::RefBind
    } else {
        NodeKind::Assign
    };
    Ok(parser.node(kind, span, vec![left, rhs]))
}

/// `(expr)`, `()`, `(a, b)` and `(x: a, y: b)`.
pub fn parse_grouping_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start.clone();

    let mut names = vec![];
    let mut elements = vec![];
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

        names.push(name);
        elements.push(parse_expr(parser, BindingPower::Comma)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
            saw_comma = true;
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(parser.unexpected("expected `,` or `)`"));
        }
    }
    parser.expect(TokenKind::CloseParen)?;

    // Plain parentheses around one unnamed expression are just grouping.
    if elements.len() == 1 && !saw_comma && names[0].is_none() {
        return Ok(elements[0]);
    }

    let span = parser.span_from(start);
    Ok(parser.node(NodeKind::Tuple { names }, span, elements))
}

pub fn parse_list_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    let start = parser.advance().span.start.clone();

    let mut elements = vec![];
    while parser.current_token_kind() != TokenKind::CloseBracket {
        elements.push(parse_expr(parser, BindingPower::Comma)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseBracket {
            return Err(parser.unexpected("expected `,` or `]`"));
        }
    }
    parser.expect(TokenKind::CloseBracket)?;

    let span = parser.span_from(start);
    Ok(parser.node(NodeKind::List, span, elements))
}

/// Calls name their callee; overloads are picked during analysis.
pub fn parse_call_expr(parser: &mut Parser, left: NodeId, _bp: BindingPower) -> Result<NodeId, Error> {
    let name = match parser.context.ast.kind(left) {
        NodeKind::Symbol { name } => name.clone(),
        _ => return Err(parser.unexpected("only named functions can be called")),
    };
    let start = parser.context.ast.span(left).start.clone();
    parser.advance();

    let mut args = vec![];
    while parser.current_token_kind() != TokenKind::CloseParen {
        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
            continue;
        }
        args.push(parse_expr(parser, BindingPower::Comma)?);
    }

    parser.expect(TokenKind::CloseParen)?;

    let span = parser.span_from(start);
    Ok(parser.node(NodeKind::Call { name }, span, args))
}

pub fn parse_index_expr(parser: &mut Parser, left: NodeId, _bp: BindingPower) -> Result<NodeId, Error> {
    parser.advance();
    let index = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseBracket)?;

    let start = parser.context.ast.span(left).start.clone();
    let span = parser.span_from(start);
    Ok(parser.node(NodeKind::Index, span, vec![left, index]))
}

/// `base.name` or positional `base.0`.
pub fn parse_member_expr(parser: &mut Parser, left: NodeId, _bp: BindingPower) -> Result<NodeId, Error> {
    parser.advance();
    let member = match parser.current_token_kind() {
        TokenKind::Identifier | TokenKind::Number => parser.advance().value.clone(),
        _ => return Err(parser.unexpected("expected a field name after `.`")),
    };

    let start = parser.context.ast.span(left).start.clone();
    let span = parser.span_from(start);
    Ok(parser.node(NodeKind::Field { name: member }, span, vec![left]))
}

/// `if` in expression position. Arms are blocks or bare expressions.
pub fn parse_if_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    parse_if(parser, parse_arm_expr)
}

fn parse_arm_expr(parser: &mut Parser) -> Result<NodeId, Error> {
    if parser.current_token_kind() == TokenKind::OpenCurly {
        parse_block_stmt(parser)
    } else {
        parse_expr(parser, BindingPower::Comma)
    }
}
