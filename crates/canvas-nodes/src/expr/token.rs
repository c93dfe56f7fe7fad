//! Expression lexer

use super::ExprError;

/// A lexical token
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,
    Not,
    LParen,
    RParen,
    Comma,
    Dot,
}

/// A token plus its byte offset in the source, for error messages
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Split expression text into tokens
pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => push_single(&mut chars, &mut tokens, Token::LParen, offset),
            ')' => push_single(&mut chars, &mut tokens, Token::RParen, offset),
            ',' => push_single(&mut chars, &mut tokens, Token::Comma, offset),
            '.' => push_single(&mut chars, &mut tokens, Token::Dot, offset),
            '+' => push_single(&mut chars, &mut tokens, Token::Plus, offset),
            '-' => push_single(&mut chars, &mut tokens, Token::Minus, offset),
            '*' => push_single(&mut chars, &mut tokens, Token::Star, offset),
            '/' => push_single(&mut chars, &mut tokens, Token::Slash, offset),
            '%' => push_single(&mut chars, &mut tokens, Token::Percent, offset),
            '=' => {
                chars.next();
                if chars.peek().map(|&(_, c)| c) == Some('=') {
                    chars.next();
                    tokens.push(Spanned {
                        token: Token::EqEq,
                        offset,
                    });
                } else {
                    return Err(ExprError::parse(offset, "expected '==' (assignment is not supported)"));
                }
            }
            '!' => {
                chars.next();
                if chars.peek().map(|&(_, c)| c) == Some('=') {
                    chars.next();
                    tokens.push(Spanned {
                        token: Token::NotEq,
                        offset,
                    });
                } else {
                    tokens.push(Spanned {
                        token: Token::Not,
                        offset,
                    });
                }
            }
            '<' => {
                chars.next();
                if chars.peek().map(|&(_, c)| c) == Some('=') {
                    chars.next();
                    tokens.push(Spanned {
                        token: Token::LtEq,
                        offset,
                    });
                } else {
                    tokens.push(Spanned {
                        token: Token::Lt,
                        offset,
                    });
                }
            }
            '>' => {
                chars.next();
                if chars.peek().map(|&(_, c)| c) == Some('=') {
                    chars.next();
                    tokens.push(Spanned {
                        token: Token::GtEq,
                        offset,
                    });
                } else {
                    tokens.push(Spanned {
                        token: Token::Gt,
                        offset,
                    });
                }
            }
            '&' => {
                chars.next();
                if chars.peek().map(|&(_, c)| c) == Some('&') {
                    chars.next();
                    tokens.push(Spanned {
                        token: Token::AndAnd,
                        offset,
                    });
                } else {
                    return Err(ExprError::parse(offset, "expected '&&'"));
                }
            }
            '|' => {
                chars.next();
                if chars.peek().map(|&(_, c)| c) == Some('|') {
                    chars.next();
                    tokens.push(Spanned {
                        token: Token::OrOr,
                        offset,
                    });
                } else {
                    return Err(ExprError::parse(offset, "expected '||'"));
                }
            }
            '\'' | '"' => {
                tokens.push(Spanned {
                    token: lex_string(&mut chars, offset)?,
                    offset,
                });
            }
            c if c.is_ascii_digit() => {
                tokens.push(Spanned {
                    token: lex_number(&mut chars, source, offset)?,
                    offset,
                });
            }
            c if c.is_alphabetic() || c == '_' => {
                tokens.push(Spanned {
                    token: lex_ident(&mut chars, source, offset),
                    offset,
                });
            }
            other => {
                return Err(ExprError::parse(
                    offset,
                    format!("unexpected character '{}'", other),
                ));
            }
        }
    }

    Ok(tokens)
}

fn push_single(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    tokens: &mut Vec<Spanned>,
    token: Token,
    offset: usize,
) {
    chars.next();
    tokens.push(Spanned { token, offset });
}

fn lex_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
) -> Result<Token, ExprError> {
    let (_, quote) = chars.next().unwrap_or((start, '\''));
    let mut value = String::new();
    loop {
        match chars.next() {
            Some((_, c)) if c == quote => return Ok(Token::Str(value)),
            Some((offset, '\\')) => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, '\\')) => value.push('\\'),
                Some((_, c)) if c == quote => value.push(c),
                _ => return Err(ExprError::parse(offset, "bad escape sequence")),
            },
            Some((_, c)) => value.push(c),
            None => return Err(ExprError::parse(start, "unterminated string")),
        }
    }
}

fn lex_number(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    source: &str,
    start: usize,
) -> Result<Token, ExprError> {
    let mut end = start;
    let mut seen_dot = false;
    while let Some(&(offset, c)) = chars.peek() {
        if c.is_ascii_digit() {
            end = offset + c.len_utf8();
            chars.next();
        } else if c == '.' && !seen_dot {
            // Only a fraction if a digit follows; otherwise leave the dot
            // for field access
            let mut lookahead = chars.clone();
            lookahead.next();
            match lookahead.peek() {
                Some(&(_, next)) if next.is_ascii_digit() => {
                    seen_dot = true;
                    end = offset + 1;
                    chars.next();
                }
                _ => break,
            }
        } else {
            break;
        }
    }

    source[start..end]
        .parse::<f64>()
        .map(Token::Number)
        .map_err(|_| ExprError::parse(start, "malformed number"))
}

fn lex_ident(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    source: &str,
    start: usize,
) -> Token {
    let mut end = start;
    while let Some(&(offset, c)) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            end = offset + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }

    match &source[start..end] {
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        ident => Token::Ident(ident.to_string()),
    }
}
