use rowql_ast::{Cond, CondValue, FnArg, FunctionCall, Join, JoinSource, Ordering, Query, SelectedField};
use rowql_core::{CompareOp, Error, JoinKind, LinkOp, SortMode, Value};
use rowql_lexer::{Keyword, Token};

use crate::error::unexpected;
use crate::parser::Parser;

/// Parses a full statement (spec.md §4.5's grammar) into a [`Query`].
pub fn parse_query(text: &str) -> Result<Query, Error> {
    let mut parser = Parser::new_with_text(text)?;
    let query = parse_stmt(&mut parser)?;
    if !parser.at_end() {
        return Err(unexpected("end of input", parser.peek_token().cloned()));
    }
    Ok(query)
}

fn parse_stmt(p: &mut Parser) -> Result<Query, Error> {
    let mut query = Query::new();

    p.expect_keyword(Keyword::Select)?;
    query.distinct = p.parse_keyword(Keyword::Distinct);
    query.selections = p.parse_comma_separated(parse_select_item)?;

    p.expect_keyword(Keyword::From)?;
    query.from = Some(parse_file_query(p)?);

    while let Some(kind) = parse_join_kind(p) {
        query.joins.push(parse_join(p, kind)?);
    }

    if p.parse_keyword(Keyword::Where) {
        query.where_cond = parse_cond(p)?;
    }

    if p.parse_keywords(&[Keyword::Group, Keyword::By]) {
        query.group_by = p.parse_comma_separated(parse_ident)?;
    }

    if p.parse_keyword(Keyword::Having) {
        query.having_cond = parse_cond(p)?;
    }

    if p.parse_keywords(&[Keyword::Order, Keyword::By]) {
        query.order_by = p.parse_comma_separated(parse_ordering)?;
    }

    parse_limit_offset(p, &mut query)?;

    Ok(query)
}

fn parse_select_item(p: &mut Parser) -> Result<SelectedField, Error> {
    let mut field = if p.next_token_if_is(&Token::Star) {
        SelectedField::star()
    } else if let Some(Token::FunctionName(_)) = p.peek_token() {
        SelectedField::function(parse_function_call(p)?)
    } else {
        SelectedField::field(parse_ident(p)?)
    };
    if p.parse_keyword(Keyword::As) {
        field = field.with_alias(parse_ident(p)?);
    }
    Ok(field)
}

fn parse_function_call(p: &mut Parser) -> Result<FunctionCall, Error> {
    let name = match p.next_token() {
        Some(Token::FunctionName(name)) => name,
        other => return Err(unexpected("function name", other)),
    };
    p.expect_token(&Token::LParen)?;
    let args = if matches!(p.peek_token(), Some(Token::RParen)) {
        Vec::new()
    } else {
        p.parse_comma_separated(parse_fn_arg)?
    };
    p.expect_token(&Token::RParen)?;
    Ok(FunctionCall { name, args })
}

fn parse_fn_arg(p: &mut Parser) -> Result<FnArg, Error> {
    match p.peek_token() {
        Some(Token::Star) => {
            p.next_token();
            Ok(FnArg::Star)
        }
        Some(Token::Str(_)) | Some(Token::Number(_)) | Some(Token::Keyword(Keyword::Null))
        | Some(Token::Keyword(Keyword::True)) | Some(Token::Keyword(Keyword::False)) => {
            Ok(FnArg::Literal(parse_scalar_literal(p)?))
        }
        Some(Token::Ident(_)) => Ok(FnArg::Field(parse_ident(p)?)),
        other => Err(unexpected("function argument", other.cloned())),
    }
}

fn parse_ident(p: &mut Parser) -> Result<String, Error> {
    match p.next_token() {
        Some(Token::Ident(s)) => Ok(s),
        other => Err(unexpected("identifier", other)),
    }
}

fn parse_file_query(p: &mut Parser) -> Result<String, Error> {
    match p.next_token() {
        Some(Token::FileQuery(s)) => Ok(s),
        other => Err(unexpected("file-query literal", other)),
    }
}

fn parse_join_kind(p: &mut Parser) -> Option<JoinKind> {
    if p.parse_keyword(Keyword::Inner) {
        Some(JoinKind::Inner)
    } else if p.parse_keyword(Keyword::Left) {
        Some(JoinKind::Left)
    } else {
        None
    }
}

fn parse_join(p: &mut Parser, kind: JoinKind) -> Result<Join, Error> {
    p.expect_keyword(Keyword::Join)?;
    let right = JoinSource::Selector(parse_file_query(p)?);
    p.expect_keyword(Keyword::As)?;
    let alias = parse_ident(p)?;
    p.expect_keyword(Keyword::On)?;
    let left_key = parse_ident(p)?;
    let op = parse_compare_op(p)?;
    let right_key = parse_ident(p)?;
    Ok(Join {
        right,
        alias: Some(alias),
        left_key,
        right_key,
        op,
        kind,
    })
}

fn parse_compare_op(p: &mut Parser) -> Result<CompareOp, Error> {
    if p.parse_keyword(Keyword::Not) {
        if p.parse_keyword(Keyword::Like) {
            return Ok(CompareOp::NotLike);
        }
        if p.parse_keyword(Keyword::In) {
            return Ok(CompareOp::NotIn);
        }
        return Err(unexpected("LIKE or IN after NOT", p.peek_token().cloned()));
    }
    if p.parse_keyword(Keyword::Is) {
        return Ok(if p.parse_keyword(Keyword::Not) {
            CompareOp::IsNot
        } else {
            CompareOp::Is
        });
    }
    if p.parse_keyword(Keyword::Like) {
        return Ok(CompareOp::Like);
    }
    if p.parse_keyword(Keyword::In) {
        return Ok(CompareOp::In);
    }
    match p.next_token() {
        Some(Token::Eq) => Ok(CompareOp::Eq),
        Some(Token::NotEq) => Ok(CompareOp::NotEq),
        Some(Token::Lt) => Ok(CompareOp::Lt),
        Some(Token::LtEq) => Ok(CompareOp::LtEq),
        Some(Token::Gt) => Ok(CompareOp::Gt),
        Some(Token::GtEq) => Ok(CompareOp::GtEq),
        other => Err(unexpected("comparison operator", other)),
    }
}

fn parse_scalar_literal(p: &mut Parser) -> Result<Value, Error> {
    match p.next_token() {
        Some(Token::Str(s)) => Ok(Value::Str(s)),
        Some(Token::Number(n)) => Ok(Value::coerce_str(&n)),
        Some(Token::Keyword(Keyword::Null)) => Ok(Value::Null),
        Some(Token::Keyword(Keyword::True)) => Ok(Value::Bool(true)),
        Some(Token::Keyword(Keyword::False)) => Ok(Value::Bool(false)),
        other => Err(unexpected("literal", other)),
    }
}

fn parse_cond_value(p: &mut Parser, op: CompareOp) -> Result<CondValue, Error> {
    if matches!(op, CompareOp::In | CompareOp::NotIn) {
        p.expect_token(&Token::LParen)?;
        let items = p.parse_comma_separated(parse_scalar_literal)?;
        p.expect_token(&Token::RParen)?;
        Ok(CondValue::List(items))
    } else {
        Ok(CondValue::Scalar(parse_scalar_literal(p)?))
    }
}

/// Parses `condTerm ((AND|OR|XOR) condTerm)*` where a `condTerm` may itself
/// be a parenthesized nested group — spec.md's grammar does not require
/// this, but SPEC_FULL.md's open-question decision extends it so text and
/// builder queries share one `Cond` tree shape.
fn parse_cond(p: &mut Parser) -> Result<Cond, Error> {
    let mut group = Cond::root();
    parse_cond_term_into(p, &mut group, LinkOp::And)?;
    loop {
        let link = if p.parse_keyword(Keyword::And) {
            LinkOp::And
        } else if p.parse_keyword(Keyword::Or) {
            LinkOp::Or
        } else if p.parse_keyword(Keyword::Xor) {
            LinkOp::Xor
        } else {
            break;
        };
        parse_cond_term_into(p, &mut group, link)?;
    }
    Ok(group)
}

fn parse_cond_term_into(p: &mut Parser, group: &mut Cond, link: LinkOp) -> Result<(), Error> {
    if p.next_token_if_is(&Token::LParen) {
        let nested = parse_cond(p)?;
        p.expect_token(&Token::RParen)?;
        if let Cond::Group { children, .. } = group {
            let relinked = match nested {
                Cond::Group { children: nested_children, .. } => Cond::Group {
                    link,
                    children: nested_children,
                },
                leaf => leaf,
            };
            children.push(relinked);
        }
        return Ok(());
    }
    let key = parse_ident(p)?;
    let op = parse_compare_op(p)?;
    let value = parse_cond_value(p, op)?;
    group.add_leaf(link, key, op, value);
    Ok(())
}

fn parse_ordering(p: &mut Parser) -> Result<Ordering, Error> {
    let field = parse_ident(p)?;
    let mode = if p.parse_keyword(Keyword::Asc) {
        SortMode::Asc
    } else if p.parse_keyword(Keyword::Desc) {
        SortMode::Desc
    } else if p.parse_keyword(Keyword::Natsort) {
        SortMode::NatSort
    } else if p.parse_keyword(Keyword::Shuffle) {
        SortMode::Shuffle
    } else {
        return Err(unexpected("ASC, DESC, NATSORT or SHUFFLE", p.peek_token().cloned()));
    };
    Ok(Ordering { field, mode })
}

fn parse_limit_offset(p: &mut Parser, query: &mut Query) -> Result<(), Error> {
    if p.parse_keyword(Keyword::Limit) {
        let n = parse_u64(p)?;
        if p.next_token_if_is(&Token::Comma) {
            query.limit = Some(n);
            query.offset = Some(parse_u64(p)?);
        } else {
            query.limit = Some(n);
            if p.parse_keyword(Keyword::Offset) {
                query.offset = Some(parse_u64(p)?);
            }
        }
        return Ok(());
    }
    if p.parse_keyword(Keyword::Offset) {
        query.offset = Some(parse_u64(p)?);
    }
    Ok(())
}

fn parse_u64(p: &mut Parser) -> Result<u64, Error> {
    match p.next_token() {
        Some(Token::Number(s)) => s
            .parse::<u64>()
            .map_err(|_| Error::Parse(format!("invalid integer literal '{}'", s))),
        other => Err(unexpected("integer literal", other)),
    }
}
