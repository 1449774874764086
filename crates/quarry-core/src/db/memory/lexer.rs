use crate::error::PersistenceError;

///
/// Token
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) enum Token {
    /// Identifier or keyword; keywords are matched case-insensitively.
    Word(String),
    Str(String),
    Int(i64),
    Uint(u64),
    /// `?n` when numbered, `?` otherwise.
    Positional(Option<usize>),
    Named(String),
    Op(&'static str),
    Dot,
    Comma,
    LParen,
    RParen,
    Star,
}

impl Token {
    pub(super) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Self::Word(word) if word.eq_ignore_ascii_case(keyword))
    }
}

/// Tokenize a query-language or native SQL string.
pub(super) fn tokenize(query: &str) -> Result<Vec<Token>, PersistenceError> {
    let chars: Vec<char> = query.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        match c {
            c if c.is_whitespace() => i += 1,
            '.' => push(&mut tokens, &mut i, Token::Dot, 1),
            ',' => push(&mut tokens, &mut i, Token::Comma, 1),
            '(' => push(&mut tokens, &mut i, Token::LParen, 1),
            ')' => push(&mut tokens, &mut i, Token::RParen, 1),
            '*' => push(&mut tokens, &mut i, Token::Star, 1),
            '=' => push(&mut tokens, &mut i, Token::Op("="), 1),
            '<' => match chars.get(i + 1) {
                Some('=') => push(&mut tokens, &mut i, Token::Op("<="), 2),
                Some('>') => push(&mut tokens, &mut i, Token::Op("<>"), 2),
                _ => push(&mut tokens, &mut i, Token::Op("<"), 1),
            },
            '>' => match chars.get(i + 1) {
                Some('=') => push(&mut tokens, &mut i, Token::Op(">="), 2),
                _ => push(&mut tokens, &mut i, Token::Op(">"), 1),
            },
            '!' if chars.get(i + 1) == Some(&'=') => push(&mut tokens, &mut i, Token::Op("<>"), 2),
            '\'' => {
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            text.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            text.push(ch);
                            i += 1;
                        }
                        None => return Err(PersistenceError::syntax(query, "unterminated string")),
                    }
                }
                tokens.push(Token::Str(text));
            }
            '?' => {
                let digits = take_while(&chars, i + 1, |ch| ch.is_ascii_digit());
                i += 1 + digits.len();
                if digits.is_empty() {
                    tokens.push(Token::Positional(None));
                } else {
                    let position = digits
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| {
                            PersistenceError::syntax(query, format!("invalid parameter ?{digits}"))
                        })?;
                    tokens.push(Token::Positional(Some(position)));
                }
            }
            ':' => {
                let name = take_while(&chars, i + 1, is_ident_char);
                if name.is_empty() {
                    return Err(PersistenceError::syntax(query, "empty parameter name"));
                }
                i += 1 + name.len();
                tokens.push(Token::Named(name));
            }
            c if c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) =>
            {
                let digits = take_while(&chars, i + 1, |ch| ch.is_ascii_digit());
                let literal = format!("{c}{digits}");
                i += literal.len();
                let token = literal
                    .parse::<i64>()
                    .map(Token::Int)
                    .or_else(|_| literal.parse::<u64>().map(Token::Uint))
                    .map_err(|_| {
                        PersistenceError::syntax(query, format!("invalid number {literal}"))
                    })?;
                tokens.push(token);
            }
            c if is_ident_start(c) => {
                let word = take_while(&chars, i, is_ident_char);
                i += word.chars().count();
                tokens.push(Token::Word(word));
            }
            other => {
                return Err(PersistenceError::syntax(
                    query,
                    format!("unexpected character '{other}'"),
                ));
            }
        }
    }

    Ok(tokens)
}

fn push(tokens: &mut Vec<Token>, i: &mut usize, token: Token, width: usize) {
    tokens.push(token);
    *i += width;
}

fn take_while(chars: &[char], start: usize, pred: impl Fn(char) -> bool) -> String {
    chars
        .iter()
        .skip(start)
        .take_while(|ch| pred(**ch))
        .collect()
}

const fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
