use crate::{
    errors::JSONPathError,
    token::{Position, Token, TokenType, EOQ},
};

use std::str::CharIndices;

enum State {
    Error,
    EndOfQuery,
    LexRoot,
    LexSegment,
    LexDescendantSegment,
    LexShorthandSegment,
    LexInsideBracketedSegment,
    LexInsideFilter,
    LexFunctionArguments,
    LexRegex,
}

/// A JSONPath tokenizer, producing a vector of tokens.
struct Lexer<'q> {
    query: &'q str,
    tokens: Vec<Token>,

    chars: CharIndices<'q>,
    start: usize,
    pos: usize,
    start_position: Position,
    position: Position,

    // One entry per open filter, counting its unclosed parentheses.
    paren_stack: Vec<u32>,
}

impl<'q> Lexer<'q> {
    fn new(query: &'q str) -> Self {
        Self {
            query,
            tokens: Vec::new(),
            chars: query.char_indices(),
            start: 0,
            pos: 0,
            start_position: Position::default(),
            position: Position::default(),
            paren_stack: Vec::new(),
        }
    }

    fn run(&mut self) {
        let mut state = State::LexRoot;
        loop {
            match state {
                State::Error | State::EndOfQuery => break,
                State::LexRoot => state = lex_root(self),
                State::LexSegment => state = lex_segment(self),
                State::LexDescendantSegment => state = lex_descendant_segment(self),
                State::LexShorthandSegment => state = lex_shorthand_selector(self),
                State::LexInsideBracketedSegment => state = lex_inside_bracketed_segment(self),
                State::LexInsideFilter => state = lex_inside_filter(self),
                State::LexFunctionArguments => state = lex_function_arguments(self),
                State::LexRegex => state = lex_regex(self),
            }
        }
    }

    fn emit(&mut self, t: TokenType) {
        let lexeme = self.value();
        self.tokens.push(Token::new(
            t,
            lexeme,
            self.start,
            self.pos,
            self.start_position,
        ));
        self.ignore();
    }

    fn value(&self) -> &'q str {
        self.query.get(self.start..self.pos).unwrap_or_default()
    }

    fn boxed_value(&self) -> Box<str> {
        self.value().to_string().into_boxed_str()
    }

    fn next(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.pos = pos + ch.len_utf8();

            if ch == '\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }

            Some(ch)
        } else {
            None
        }
    }

    fn ignore(&mut self) {
        self.start = self.pos;
        self.start_position = self.position;
    }

    fn peek(&self) -> char {
        if let Some((_, ch)) = self.chars.clone().next() {
            ch
        } else {
            EOQ
        }
    }

    fn accept(&mut self, ch: char) -> bool {
        if self.peek() == ch {
            self.next();
            true
        } else {
            false
        }
    }

    fn accept_if(&mut self, pred: impl FnOnce(char) -> bool) -> bool {
        if pred(self.peek()) {
            self.next();
            true
        } else {
            false
        }
    }

    fn accept_run(&mut self, pred: impl Fn(char) -> bool) -> bool {
        let mut accepted = false;
        while self.peek() != EOQ && pred(self.peek()) {
            self.next();
            accepted = true;
        }
        accepted
    }

    fn ignore_whitespace(&mut self) -> bool {
        #[cfg(debug_assertions)]
        debug_assert!(
            self.pos == self.start,
            "must emit or ignore before eating whitespace"
        );

        if self.accept_run(is_whitespace_char) {
            self.ignore();
            true
        } else {
            false
        }
    }

    fn in_filter(&self) -> bool {
        !self.paren_stack.is_empty()
    }

    fn error(&mut self, msg: String) -> State {
        let lexeme = self.value();
        self.tokens.push(Token::new(
            TokenType::Error {
                msg: msg.into_boxed_str(),
            },
            lexeme,
            self.start,
            self.pos,
            self.start_position,
        ));
        State::Error
    }
}

/// Tokenize `query` without failing. If the query is malformed, the last
/// token is an `Error` token.
pub fn tokenize(query: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(query);
    lexer.run();
    lexer.tokens
}

pub fn lex(query: &str) -> Result<Vec<Token>, JSONPathError> {
    let tokens = tokenize(query);

    match tokens.last() {
        Some(Token {
            kind: TokenType::Error { msg },
            position,
            ..
        }) => Err(JSONPathError::syntax((*msg).to_string(), *position)),
        _ => Ok(tokens),
    }
}

fn lex_root(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    if l.accept('$') {
        l.emit(TokenType::Root);
        State::LexSegment
    } else {
        let msg = format!("expected '$', found '{}'", l.peek());
        l.error(msg)
    }
}

fn lex_segment(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    if l.accept('.') {
        if l.accept('.') {
            l.emit(TokenType::DoubleDot);
            State::LexDescendantSegment
        } else {
            l.emit(TokenType::Dot);
            State::LexShorthandSegment
        }
    } else if l.accept('[') {
        l.emit(TokenType::LBracket);
        State::LexInsideBracketedSegment
    } else if l.in_filter() {
        State::LexInsideFilter
    } else if l.peek() == EOQ {
        l.emit(TokenType::Eoq);
        State::EndOfQuery
    } else {
        let msg = format!(
            "expected '.', '..' or a bracketed selection, found '{}'",
            l.peek()
        );
        l.error(msg)
    }
}

fn lex_descendant_segment(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    if l.accept('*') {
        l.emit(TokenType::Wild);
        State::LexSegment
    } else if l.accept('[') {
        l.emit(TokenType::LBracket);
        State::LexInsideBracketedSegment
    } else if l.accept_if(is_name_first) {
        l.accept_run(is_name_char);
        l.emit(TokenType::Name {
            value: l.boxed_value(),
        });
        State::LexSegment
    } else {
        let msg = format!("unexpected descendant selection token '{}'", l.peek());
        l.error(msg)
    }
}

fn lex_shorthand_selector(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    if l.accept('*') {
        l.emit(TokenType::Wild);
        State::LexSegment
    } else if l.accept_if(is_name_first) {
        l.accept_run(is_name_char);
        if l.peek() == '(' {
            l.emit(TokenType::Function {
                name: l.boxed_value(),
            });
            State::LexFunctionArguments
        } else {
            l.emit(TokenType::Name {
                value: l.boxed_value(),
            });
            State::LexSegment
        }
    } else {
        let msg = format!("unexpected shorthand selector '{}'", l.peek());
        l.error(msg)
    }
}

fn lex_inside_bracketed_segment(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    match l.peek() {
        ']' => {
            l.next();
            l.emit(TokenType::RBracket);
            State::LexSegment
        }
        '*' => {
            l.next();
            l.emit(TokenType::Wild);
            State::LexInsideBracketedSegment
        }
        '?' => {
            l.next();
            l.emit(TokenType::Filter);
            l.paren_stack.push(0);
            State::LexInsideFilter
        }
        ',' => {
            l.next();
            l.emit(TokenType::Comma);
            State::LexInsideBracketedSegment
        }
        ':' => {
            l.next();
            l.emit(TokenType::Colon);
            State::LexInsideBracketedSegment
        }
        '(' => {
            l.next();
            l.emit(TokenType::LParen);
            State::LexInsideBracketedSegment
        }
        ')' => {
            l.next();
            l.emit(TokenType::RParen);
            State::LexInsideBracketedSegment
        }
        '\'' | '"' => lex_string(l, State::LexInsideBracketedSegment),
        EOQ => l.error(String::from("unclosed bracketed selection")),
        ch => {
            if ch == '-' || is_digit(ch) {
                lex_number(l, State::LexInsideBracketedSegment)
            } else if l.accept_if(is_name_first) {
                l.accept_run(is_name_char);
                if l.peek() == '(' {
                    l.emit(TokenType::Function {
                        name: l.boxed_value(),
                    });
                    State::LexInsideBracketedSegment
                } else {
                    let msg = format!(
                        "unexpected '{}' in bracketed selection, names must be quoted",
                        l.value()
                    );
                    l.error(msg)
                }
            } else {
                let msg = format!("unexpected '{}' in bracketed selection", ch);
                l.error(msg)
            }
        }
    }
}

fn lex_function_arguments(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    match l.peek() {
        '(' => {
            l.next();
            l.emit(TokenType::LParen);
            State::LexFunctionArguments
        }
        ')' => {
            l.next();
            l.emit(TokenType::RParen);
            State::LexSegment
        }
        ',' => {
            l.next();
            l.emit(TokenType::Comma);
            State::LexFunctionArguments
        }
        '\'' | '"' => lex_string(l, State::LexFunctionArguments),
        EOQ => l.error(String::from("unclosed function call")),
        ch => {
            if ch == '-' || is_digit(ch) {
                lex_number(l, State::LexFunctionArguments)
            } else {
                let msg = format!("unexpected '{}' in function arguments", ch);
                l.error(msg)
            }
        }
    }
}

fn lex_inside_filter(l: &mut Lexer) -> State {
    l.ignore_whitespace();

    match l.peek() {
        EOQ => l.error(String::from("unclosed bracketed selection")),
        ']' => {
            if l.paren_stack.last().is_some_and(|open| *open > 0) {
                return l.error(String::from("unbalanced parentheses"));
            }
            l.paren_stack.pop();
            l.next();
            l.emit(TokenType::RBracket);
            State::LexSegment
        }
        '(' => {
            l.next();
            l.emit(TokenType::LParen);
            if let Some(open) = l.paren_stack.last_mut() {
                *open += 1;
            }
            State::LexInsideFilter
        }
        ')' => {
            match l.paren_stack.last_mut() {
                Some(open) if *open > 0 => *open -= 1,
                _ => return l.error(String::from("unbalanced parentheses")),
            }
            l.next();
            l.emit(TokenType::RParen);
            State::LexInsideFilter
        }
        '\'' | '"' => lex_string(l, State::LexInsideFilter),
        '$' => {
            l.next();
            l.emit(TokenType::Root);
            State::LexSegment
        }
        '@' => {
            l.next();
            l.emit(TokenType::Current);
            State::LexSegment
        }
        '.' | '[' => State::LexSegment,
        '!' => {
            l.next();
            if l.accept('=') {
                l.emit(TokenType::Ne);
            } else {
                l.emit(TokenType::Not);
            }
            State::LexInsideFilter
        }
        '=' => {
            l.next();
            if l.accept('~') {
                l.emit(TokenType::Match);
                l.ignore_whitespace();
                if l.peek() == '/' {
                    State::LexRegex
                } else {
                    let msg = format!("expected a regex literal after '=~', found '{}'", l.peek());
                    l.error(msg)
                }
            } else {
                // `==` is accepted as an alias of `=`
                l.accept('=');
                l.emit(TokenType::Eq);
                State::LexInsideFilter
            }
        }
        '<' => {
            l.next();
            if l.accept('=') {
                l.emit(TokenType::Le);
            } else {
                l.emit(TokenType::Lt);
            }
            State::LexInsideFilter
        }
        '>' => {
            l.next();
            if l.accept('=') {
                l.emit(TokenType::Ge);
            } else {
                l.emit(TokenType::Gt);
            }
            State::LexInsideFilter
        }
        '&' => {
            l.next();
            if l.accept('&') {
                l.emit(TokenType::And);
                State::LexInsideFilter
            } else {
                l.error(String::from("unexpected '&', did you mean '&&'?"))
            }
        }
        '|' => {
            l.next();
            if l.accept('|') {
                l.emit(TokenType::Or);
                State::LexInsideFilter
            } else {
                l.error(String::from("unexpected '|', did you mean '||'?"))
            }
        }
        ch => {
            if ch == '-' || is_digit(ch) {
                lex_number(l, State::LexInsideFilter)
            } else if l.accept_if(is_name_first) {
                l.accept_run(is_name_char);
                match l.value() {
                    "and" => l.emit(TokenType::And),
                    "or" => l.emit(TokenType::Or),
                    "not" => l.emit(TokenType::Not),
                    "true" => l.emit(TokenType::True),
                    "false" => l.emit(TokenType::False),
                    "null" => l.emit(TokenType::Null),
                    _ => {
                        if l.peek() == '(' {
                            l.emit(TokenType::Function {
                                name: l.boxed_value(),
                            });
                        } else {
                            l.emit(TokenType::Name {
                                value: l.boxed_value(),
                            });
                        }
                    }
                }
                State::LexInsideFilter
            } else {
                let msg = format!("unexpected filter expression token '{}'", ch);
                l.error(msg)
            }
        }
    }
}

fn lex_string(l: &mut Lexer, next_state: State) -> State {
    let quote = l.peek();
    let opened_at = l.start_position;
    l.next(); // open quote

    loop {
        match l.peek() {
            '\\' => {
                l.next();
                if !l.accept_if(|c| is_escape_char(c) || c == '\'' || c == '"') {
                    return l.error(String::from("invalid escape sequence"));
                }
            }
            EOQ => {
                let msg = format!("unclosed string starting at {}", opened_at);
                return l.error(msg);
            }
            ch => {
                l.next();
                if ch == quote {
                    let value = l
                        .query
                        .get(l.start + 1..l.pos - 1)
                        .unwrap_or_default()
                        .to_string()
                        .into_boxed_str();

                    if quote == '\'' {
                        l.emit(TokenType::SingleQuoteString { value });
                    } else {
                        l.emit(TokenType::DoubleQuoteString { value });
                    }
                    return next_state;
                }
            }
        }
    }
}

fn lex_regex(l: &mut Lexer) -> State {
    let opened_at = l.start_position;
    l.next(); // open slash

    loop {
        match l.peek() {
            '\\' => {
                l.next();
                if l.peek() == EOQ {
                    let msg = format!("unclosed regex literal starting at {}", opened_at);
                    return l.error(msg);
                }
                l.next();
            }
            '/' => {
                let pattern = l
                    .query
                    .get(l.start + 1..l.pos)
                    .unwrap_or_default()
                    .to_string()
                    .into_boxed_str();

                l.next(); // close slash
                let flags_start = l.pos;
                l.accept_run(is_regex_flag);
                let flags = l
                    .query
                    .get(flags_start..l.pos)
                    .unwrap_or_default()
                    .to_string()
                    .into_boxed_str();

                l.emit(TokenType::Regex { pattern, flags });
                return State::LexInsideFilter;
            }
            EOQ => {
                let msg = format!("unclosed regex literal starting at {}", opened_at);
                return l.error(msg);
            }
            _ => {
                l.next();
            }
        }
    }
}

fn lex_number(l: &mut Lexer, next_state: State) -> State {
    let negative = l.accept('-');

    if !l.accept_run(is_digit) {
        let msg = if negative {
            format!("expected a digit after '-', found '{}'", l.peek())
        } else {
            format!("expected a digit, found '{}'", l.peek())
        };
        return l.error(msg);
    }

    let mut float = false;

    if l.accept('.') {
        if !l.accept_run(is_digit) {
            return l.error(String::from(
                "a fractional digit is required after a decimal point",
            ));
        }
        float = true;
    }

    if l.accept_if(|ch| ch == 'e' || ch == 'E') {
        l.accept_if(|ch| ch == '+' || ch == '-');
        if !l.accept_run(is_digit) {
            return l.error(String::from("at least one exponent digit is required"));
        }
        float = true;
    }

    if float {
        l.emit(TokenType::Float {
            value: l.boxed_value(),
        });
    } else {
        l.emit(TokenType::Int {
            value: l.boxed_value(),
        });
    }

    next_state
}

fn is_name_first(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch as u32 >= 0x80
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch as u32 >= 0x80
}

fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_escape_char(ch: char) -> bool {
    matches!(ch, 'b' | 'f' | 'n' | 'r' | 't' | 'u' | '/' | '\\')
}

fn is_regex_flag(ch: char) -> bool {
    matches!(ch, 'i' | 'm' | 's' | 'x')
}

fn is_whitespace_char(ch: char) -> bool {
    matches!(ch, ' ' | '\n' | '\r' | '\t')
}
