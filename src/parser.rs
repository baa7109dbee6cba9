use std::{iter::Peekable, str::Chars, vec::IntoIter};

use log::debug;

use crate::{
    env::Environment,
    errors::JSONPathError,
    filter::{ComparisonOperator, FilterQuery, LogicalOperator, Pattern, Predicate},
    query::Query,
    segment::Segment,
    token::{Position, Token, TokenType},
    value::Value,
};

use TokenType::*;

/// A token iterator that keeps returning an end of query token when
/// exhausted.
struct TokenStream {
    tokens: Peekable<IntoIter<Token>>,
    eoq: Token,
}

impl TokenStream {
    fn new(tokens: Vec<Token>) -> Self {
        let (end, position) = tokens
            .last()
            .map(|t| (t.span.1, t.position))
            .unwrap_or_default();

        Self {
            tokens: tokens.into_iter().peekable(),
            eoq: Token::new(Eoq, "", end, end, position),
        }
    }

    fn next(&mut self) -> Token {
        self.tokens.next().unwrap_or_else(|| self.eoq.clone())
    }

    fn peek(&mut self) -> &Token {
        self.tokens.peek().unwrap_or(&self.eoq)
    }
}

/// Maximum nesting of parentheses, `not` and filters within a filter.
const MAX_NESTING_DEPTH: usize = 64;

/// Builds a [`Query`] from tokens, checking function calls against the
/// functions registered with an [`Environment`].
#[derive(Debug, Clone, Copy)]
pub struct Parser<'e> {
    env: &'e Environment,
    depth: usize,
}

impl<'e> Parser<'e> {
    pub fn new(env: &'e Environment) -> Self {
        Parser { env, depth: 0 }
    }

    /// A parser for an expression nested one level below this one.
    fn nested(&self, position: Position) -> Result<Self, JSONPathError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(JSONPathError::syntax(
                String::from("filter expression nested too deeply"),
                position,
            ));
        }

        Ok(Parser {
            depth: self.depth + 1,
            ..*self
        })
    }

    pub fn parse(&self, tokens: Vec<Token>) -> Result<Query, JSONPathError> {
        let count = tokens.len();
        let mut it = TokenStream::new(tokens);
        let token = it.next();

        match token.kind {
            Root => {
                let segments = self.parse_segments(&mut it)?;
                // parse_segments stops at the first token that can't start a segment
                let token = it.next();
                match token.kind {
                    Eoq => {
                        let query = Query { segments };
                        debug!("parsed {} tokens as {}", count, query);
                        Ok(query)
                    }
                    kind => Err(JSONPathError::syntax(
                        format!("expected end of query, found {}", kind),
                        token.position,
                    )),
                }
            }
            kind => Err(JSONPathError::syntax(
                format!("expected '$', found {}", kind),
                token.position,
            )),
        }
    }

    /// Parse the tokens of a filter expression, excluding the filter's
    /// enclosing brackets.
    pub fn parse_predicate(&self, tokens: Vec<Token>) -> Result<Predicate, JSONPathError> {
        let mut it = TokenStream::new(tokens);
        let predicate = self.parse_or(&mut it)?;
        let token = it.next();

        match token.kind {
            Eoq => Ok(predicate),
            kind => Err(JSONPathError::syntax(
                format!("unexpected {} in filter expression", kind),
                token.position,
            )),
        }
    }

    fn parse_segments(&self, it: &mut TokenStream) -> Result<Vec<Segment>, JSONPathError> {
        let mut segments: Vec<Segment> = Vec::new();

        loop {
            match it.peek().kind {
                DoubleDot => {
                    it.next();
                    segments.push(Segment::Recursive);
                    segments.push(self.parse_descendant_selection(it)?);
                }
                Dot => {
                    it.next();
                    segments.push(self.parse_shorthand_selection(it)?);
                }
                LBracket => segments.push(self.parse_bracketed(it)?),
                _ => break,
            }
        }

        Ok(segments)
    }

    fn parse_descendant_selection(&self, it: &mut TokenStream) -> Result<Segment, JSONPathError> {
        match it.peek().kind {
            LBracket => self.parse_bracketed(it),
            _ => {
                let token = it.next();
                match token.kind {
                    Name { value } => Ok(Segment::Field {
                        name: value.to_string(),
                    }),
                    Wild => Ok(Segment::Wild),
                    kind => Err(JSONPathError::syntax(
                        format!("expected a name, '*' or a bracketed selection after '..', found {}", kind),
                        token.position,
                    )),
                }
            }
        }
    }

    fn parse_shorthand_selection(&self, it: &mut TokenStream) -> Result<Segment, JSONPathError> {
        match it.peek().kind {
            Function { .. } => self.parse_function_call(it),
            _ => {
                let token = it.next();
                match token.kind {
                    Name { value } => Ok(Segment::Field {
                        name: value.to_string(),
                    }),
                    Wild => Ok(Segment::Wild),
                    kind => Err(JSONPathError::syntax(
                        format!("expected a name or '*' after '.', found {}", kind),
                        token.position,
                    )),
                }
            }
        }
    }

    fn parse_bracketed(&self, it: &mut TokenStream) -> Result<Segment, JSONPathError> {
        #[cfg(debug_assertions)]
        debug_assert!(
            matches!(it.peek().kind, LBracket),
            "expected the start of a bracketed selection"
        );

        let open = it.next();

        let segment = match it.peek().kind {
            Wild => {
                it.next();
                Segment::Wild
            }
            Int { .. } | Colon => self.parse_slice_or_index(it)?,
            DoubleQuoteString { .. } | SingleQuoteString { .. } => self.parse_names(it)?,
            Function { .. } => self.parse_function_call(it)?,
            // A filter consumes its own closing bracket.
            Filter => return self.parse_filter(it),
            RBracket => {
                return Err(JSONPathError::syntax(
                    String::from("empty bracketed selection"),
                    open.position,
                ))
            }
            Eoq => {
                return Err(JSONPathError::syntax(
                    String::from("unclosed bracketed selection"),
                    open.position,
                ))
            }
            _ => {
                let token = it.next();
                return Err(JSONPathError::syntax(
                    format!("unexpected {} in bracketed selection", token.kind),
                    token.position,
                ));
            }
        };

        let token = it.next();
        match token.kind {
            RBracket => Ok(segment),
            Eoq => Err(JSONPathError::syntax(
                String::from("unclosed bracketed selection"),
                open.position,
            )),
            kind => Err(JSONPathError::syntax(
                format!("expected ']', found {}", kind),
                token.position,
            )),
        }
    }

    fn parse_slice_or_index(&self, it: &mut TokenStream) -> Result<Segment, JSONPathError> {
        let position = it.peek().position;
        let mut parts: Vec<Option<i64>> = vec![None];

        while !matches!(it.peek().kind, RBracket | Comma | Eoq) {
            let token = it.next();
            match token.kind {
                Colon => {
                    parts.push(None);
                    if parts.len() > 3 {
                        return Err(JSONPathError::syntax(
                            String::from("too many colons in slice"),
                            token.position,
                        ));
                    }
                }
                Int { value } => {
                    let index = parse_index(&value, token.position)?;
                    match parts.last_mut() {
                        Some(part) if part.is_none() => *part = Some(index),
                        _ => {
                            return Err(JSONPathError::syntax(
                                format!("expected ':' or ']', found {}", value),
                                token.position,
                            ))
                        }
                    }
                }
                kind => {
                    return Err(JSONPathError::syntax(
                        format!("unexpected {} in slice", kind),
                        token.position,
                    ))
                }
            }
        }

        match parts.as_slice() {
            [Some(index)] => Ok(Segment::Index { index: *index }),
            [start, stop] => Ok(Segment::Slice {
                start: *start,
                stop: *stop,
                step: None,
            }),
            [_, _, Some(0)] => Err(JSONPathError::syntax(
                String::from("slice step cannot be zero"),
                position,
            )),
            [start, stop, step] => Ok(Segment::Slice {
                start: *start,
                stop: *stop,
                step: *step,
            }),
            _ => Err(JSONPathError::syntax(
                String::from("expected an index or slice"),
                position,
            )),
        }
    }

    fn parse_names(&self, it: &mut TokenStream) -> Result<Segment, JSONPathError> {
        let mut names: Vec<String> = Vec::new();

        loop {
            let token = it.next();
            match token.kind {
                DoubleQuoteString { value } | SingleQuoteString { value } => {
                    names.push(unescape_string(&value, token.position)?)
                }
                kind => {
                    return Err(JSONPathError::syntax(
                        format!("expected a quoted name, found {}", kind),
                        token.position,
                    ))
                }
            }

            if it.peek().kind == Comma {
                it.next();
            } else {
                break;
            }
        }

        Ok(match <[String; 1]>::try_from(names) {
            Ok([name]) => Segment::Field { name },
            Err(names) => Segment::KeyUnion { names },
        })
    }

    fn parse_function_call(&self, it: &mut TokenStream) -> Result<Segment, JSONPathError> {
        let token = it.next();
        let position = token.position;
        let name = match token.kind {
            Function { name } => name.to_string(),
            kind => {
                return Err(JSONPathError::syntax(
                    format!("expected a function call, found {}", kind),
                    position,
                ))
            }
        };

        let token = it.next();
        if token.kind != LParen {
            return Err(JSONPathError::syntax(
                format!("expected '(' after {}, found {}", name, token.kind),
                token.position,
            ));
        }

        let mut args: Vec<Value> = Vec::new();

        if it.peek().kind == RParen {
            it.next();
        } else {
            loop {
                args.push(parse_literal(it.next())?);

                let token = it.next();
                match token.kind {
                    Comma => continue,
                    RParen => break,
                    Eoq => {
                        return Err(JSONPathError::syntax(
                            String::from("unclosed function call"),
                            position,
                        ))
                    }
                    kind => {
                        return Err(JSONPathError::syntax(
                            format!("expected ',' or ')', found {}", kind),
                            token.position,
                        ))
                    }
                }
            }
        }

        let function = self.env.get(&name).ok_or_else(|| {
            JSONPathError::syntax(format!("unknown function '{}'", name), position)
        })?;

        function
            .sig()
            .check(&name, &args)
            .map_err(|msg| JSONPathError::syntax(msg, position))?;

        Ok(Segment::Function { name, args })
    }

    fn parse_filter(&self, it: &mut TokenStream) -> Result<Segment, JSONPathError> {
        let filter = it.next();
        let mut tokens: Vec<Token> = Vec::new();
        let mut depth = 0;

        // Collect tokens up to the bracket that closes this filter. Brackets
        // belonging to subpaths and nested filters are balanced by the lexer.
        loop {
            let token = it.next();
            match token.kind {
                LBracket => depth += 1,
                RBracket if depth == 0 => {
                    tokens.push(Token::new(
                        Eoq,
                        "",
                        token.span.0,
                        token.span.0,
                        token.position,
                    ));
                    break;
                }
                RBracket => depth -= 1,
                Eoq => {
                    return Err(JSONPathError::syntax(
                        String::from("unclosed bracketed selection"),
                        filter.position,
                    ))
                }
                _ => (),
            }
            tokens.push(token);
        }

        if tokens.len() == 1 {
            return Err(JSONPathError::syntax(
                String::from("expected a filter expression"),
                filter.position,
            ));
        }

        Ok(Segment::Filter {
            predicate: Box::new(self.nested(filter.position)?.parse_predicate(tokens)?),
        })
    }

    fn parse_or(&self, it: &mut TokenStream) -> Result<Predicate, JSONPathError> {
        let mut left = self.parse_and(it)?;

        while it.peek().kind == Or {
            it.next();
            let right = self.parse_and(it)?;
            left = Predicate::Logical {
                left: Box::new(left),
                operator: LogicalOperator::Or,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and(&self, it: &mut TokenStream) -> Result<Predicate, JSONPathError> {
        let mut left = self.parse_atom(it)?;

        while it.peek().kind == And {
            it.next();
            let right = self.parse_atom(it)?;
            left = Predicate::Logical {
                left: Box::new(left),
                operator: LogicalOperator::And,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_atom(&self, it: &mut TokenStream) -> Result<Predicate, JSONPathError> {
        match it.peek().kind {
            LParen => {
                let paren = it.next();
                let predicate = self.nested(paren.position)?.parse_or(it)?;
                let token = it.next();
                match token.kind {
                    RParen => Ok(predicate),
                    kind => Err(JSONPathError::syntax(
                        format!("expected ')', found {}", kind),
                        token.position,
                    )),
                }
            }
            Not => {
                let not = it.next();
                Ok(Predicate::Not {
                    predicate: Box::new(self.nested(not.position)?.parse_atom(it)?),
                })
            }
            Current | Root => self.parse_test(it),
            DoubleQuoteString { .. }
            | SingleQuoteString { .. }
            | Int { .. }
            | Float { .. }
            | True
            | False
            | Null => self.parse_flipped_comparison(it),
            Eoq | RParen => {
                let token = it.next();
                Err(JSONPathError::syntax(
                    String::from("expected a filter expression"),
                    token.position,
                ))
            }
            _ => {
                let token = it.next();
                Err(JSONPathError::syntax(
                    format!("unexpected {} in filter expression", token.kind),
                    token.position,
                ))
            }
        }
    }

    /// A subpath, optionally followed by a comparison or regex match.
    fn parse_test(&self, it: &mut TokenStream) -> Result<Predicate, JSONPathError> {
        let query = self.parse_filter_query(it)?;

        match it.peek().kind {
            Eq | Ne | Ge | Gt | Le | Lt => {
                let operator = parse_comparison_operator(it.next())?;
                let value = parse_literal(it.next())?;
                Ok(Predicate::Comparison {
                    query,
                    operator,
                    value,
                })
            }
            Match => {
                it.next();
                let token = it.next();
                match token.kind {
                    Regex { pattern, flags } => {
                        let compiled = Pattern::new(&unescape_regex(&pattern), &flags)
                            .map_err(|err| {
                                JSONPathError::syntax(
                                    format!("invalid regex /{}/{}: {}", pattern, flags, err),
                                    token.position,
                                )
                            })?;
                        Ok(Predicate::RegexMatch {
                            query,
                            pattern: compiled,
                        })
                    }
                    kind => Err(JSONPathError::syntax(
                        format!("expected a regex literal, found {}", kind),
                        token.position,
                    )),
                }
            }
            _ => Ok(Predicate::Exists { query }),
        }
    }

    /// A comparison written with the literal first, like `5 < @.x`.
    fn parse_flipped_comparison(&self, it: &mut TokenStream) -> Result<Predicate, JSONPathError> {
        let token = it.next();
        let position = token.position;
        let value = parse_literal(token)?;

        match it.peek().kind {
            Eq | Ne | Ge | Gt | Le | Lt => {
                let operator = parse_comparison_operator(it.next())?;
                match it.peek().kind {
                    Current | Root => Ok(Predicate::Comparison {
                        query: self.parse_filter_query(it)?,
                        operator: operator.flip(),
                        value,
                    }),
                    _ => {
                        let token = it.next();
                        Err(JSONPathError::syntax(
                            format!("expected a filter query after '{}', found {}", operator, token.kind),
                            token.position,
                        ))
                    }
                }
            }
            _ => Err(JSONPathError::syntax(
                String::from("filter expression literals must be compared"),
                position,
            )),
        }
    }

    fn parse_filter_query(&self, it: &mut TokenStream) -> Result<FilterQuery, JSONPathError> {
        let token = it.next();
        match token.kind {
            Current => Ok(FilterQuery::Relative {
                query: Box::new(Query {
                    segments: self.parse_segments(it)?,
                }),
            }),
            Root => Ok(FilterQuery::Root {
                query: Box::new(Query {
                    segments: self.parse_segments(it)?,
                }),
            }),
            kind => Err(JSONPathError::syntax(
                format!("expected '@' or '$', found {}", kind),
                token.position,
            )),
        }
    }
}

fn parse_comparison_operator(token: Token) -> Result<ComparisonOperator, JSONPathError> {
    match token.kind {
        Eq => Ok(ComparisonOperator::Eq),
        Ne => Ok(ComparisonOperator::Ne),
        Ge => Ok(ComparisonOperator::Ge),
        Gt => Ok(ComparisonOperator::Gt),
        Le => Ok(ComparisonOperator::Le),
        Lt => Ok(ComparisonOperator::Lt),
        kind => Err(JSONPathError::syntax(
            format!("expected a comparison operator, found {}", kind),
            token.position,
        )),
    }
}

fn parse_literal(token: Token) -> Result<Value, JSONPathError> {
    match token.kind {
        DoubleQuoteString { value } | SingleQuoteString { value } => {
            Ok(Value::String(unescape_string(&value, token.position)?))
        }
        Int { value } | Float { value } => value.parse::<f64>().map(Value::Number).map_err(|_| {
            JSONPathError::syntax(format!("invalid number literal {}", value), token.position)
        }),
        True => Ok(Value::Bool(true)),
        False => Ok(Value::Bool(false)),
        Null => Ok(Value::Null),
        kind => Err(JSONPathError::syntax(
            format!("expected a literal, found {}", kind),
            token.position,
        )),
    }
}

fn parse_index(value: &str, position: Position) -> Result<i64, JSONPathError> {
    if value.len() > 1 && (value.starts_with('0') || value.starts_with("-0")) {
        return Err(JSONPathError::syntax(
            format!("invalid index '{}'", value),
            position,
        ));
    }

    value
        .parse::<i64>()
        .map_err(|_| JSONPathError::syntax(format!("index out of range '{}'", value), position))
}

fn unescape_string(value: &str, position: Position) -> Result<String, JSONPathError> {
    let invalid = || JSONPathError::syntax(String::from("invalid escape"), position);
    let mut rv = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            rv.push(ch);
            continue;
        }

        match chars.next() {
            Some('"') => rv.push('"'),
            Some('\'') => rv.push('\''),
            Some('\\') => rv.push('\\'),
            Some('/') => rv.push('/'),
            Some('b') => rv.push('\x08'),
            Some('f') => rv.push('\x0C'),
            Some('n') => rv.push('\n'),
            Some('r') => rv.push('\r'),
            Some('t') => rv.push('\t'),
            Some('u') => {
                let mut codepoint = hex_digits(&mut chars).ok_or_else(invalid)?;

                if (0xD800..=0xDBFF).contains(&codepoint) {
                    // a high surrogate must be followed by an escaped low surrogate
                    if chars.next() != Some('\\') || chars.next() != Some('u') {
                        return Err(invalid());
                    }

                    let low_surrogate = hex_digits(&mut chars)
                        .filter(|low| (0xDC00..=0xDFFF).contains(low))
                        .ok_or_else(invalid)?;

                    codepoint =
                        0x10000 + (((codepoint & 0x03FF) << 10) | (low_surrogate & 0x03FF));
                }

                rv.push(char::from_u32(codepoint).ok_or_else(invalid)?);
            }
            _ => return Err(invalid()),
        }
    }

    Ok(rv)
}

fn hex_digits(chars: &mut Chars) -> Option<u32> {
    let digits: String = chars.by_ref().take(4).collect();
    if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        u32::from_str_radix(&digits, 16).ok()
    } else {
        None
    }
}

/// Regex literals only escape their delimiter. Every other escape belongs
/// to the regex.
fn unescape_regex(pattern: &str) -> String {
    let mut rv = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            rv.push(ch);
            continue;
        }

        match chars.next() {
            Some('/') => rv.push('/'),
            Some(c) => {
                rv.push('\\');
                rv.push(c);
            }
            None => rv.push('\\'),
        }
    }

    rv
}
