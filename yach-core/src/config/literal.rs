//! Literal parsing for `key=value` overrides.
//!
//! Recognises numbers, booleans, null, quoted strings, lists, tuples and
//! string-keyed mappings. Nothing is ever evaluated: names, operators and
//! calls are rejected, and the caller falls back to the raw text.

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("literal parse error: {0}")]
    Parse(String),
}

type Result<T> = std::result::Result<T, LiteralError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
    True,
    False,
    Null,
}

pub fn parse_literal(input: &str) -> Result<Value> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(LiteralError::Parse("empty literal".to_owned()));
    }

    let mut parser = Parser::new(tokens);
    let value = parser.parse_value()?;
    parser.expect_end()?;
    Ok(value)
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut chars = input.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some((idx, ch)) = chars.peek().copied() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let rest = &input[idx + ch.len_utf8()..];
        let starts_number = ch.is_ascii_digit()
            || (ch == '.' && leads_with_digit(rest))
            || (matches!(ch, '-' | '+')
                && (leads_with_digit(rest)
                    || rest.strip_prefix('.').is_some_and(leads_with_digit)));
        if starts_number {
            let start = idx;
            chars.next();
            let mut previous = ch;
            while let Some((_, c)) = chars.peek().copied() {
                let exponent_sign = matches!(c, '-' | '+') && matches!(previous, 'e' | 'E');
                if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                    previous = c;
                    chars.next();
                } else {
                    break;
                }
            }
            let end = chars.peek().map(|(i, _)| *i).unwrap_or(input.len());
            tokens.push(lex_number(&input[start..end])?);
            continue;
        }

        if ch == '\'' || ch == '"' {
            let quote = ch;
            chars.next();
            let mut value = String::new();
            let mut escaped = false;
            let mut terminated = false;

            for (_, c) in chars.by_ref() {
                if escaped {
                    let translated = match c {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        '0' => '\0',
                        '\\' | '\'' | '"' => c,
                        other => {
                            return Err(LiteralError::Parse(format!(
                                "unknown escape '\\{other}'"
                            )))
                        }
                    };
                    value.push(translated);
                    escaped = false;
                    continue;
                }

                if c == '\\' {
                    escaped = true;
                    continue;
                }
                if c == quote {
                    terminated = true;
                    break;
                }
                value.push(c);
            }

            if !terminated {
                return Err(LiteralError::Parse(
                    "unterminated string literal".to_owned(),
                ));
            }
            tokens.push(Token::String(value));
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let start = idx;
            chars.next();
            while let Some((_, c)) = chars.peek().copied() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    chars.next();
                } else {
                    break;
                }
            }
            let end = chars.peek().map(|(i, _)| *i).unwrap_or(input.len());
            let token = match &input[start..end] {
                "True" | "true" => Token::True,
                "False" | "false" => Token::False,
                "None" | "null" => Token::Null,
                other => {
                    return Err(LiteralError::Parse(format!(
                        "'{other}' is not a literal"
                    )))
                }
            };
            tokens.push(token);
            continue;
        }

        let token = match ch {
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            ':' => Token::Colon,
            other => {
                return Err(LiteralError::Parse(format!(
                    "unexpected character '{other}'"
                )));
            }
        };

        chars.next();
        tokens.push(token);
    }

    Ok(tokens)
}

fn leads_with_digit(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_digit())
}

fn lex_number(text: &str) -> Result<Token> {
    let invalid = || LiteralError::Parse(format!("invalid number '{text}'"));

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if body.starts_with('_') || body.ends_with('_') || body.contains("__") {
        return Err(invalid());
    }
    let digits: String = body.chars().filter(|c| *c != '_').collect();

    let radix = match digits.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let magnitude = i64::from_str_radix(&digits[2..], radix).map_err(|_| invalid())?;
        return Ok(Token::Integer(if negative { -magnitude } else { magnitude }));
    }

    if digits.contains(&['.', 'e', 'E'][..]) {
        if digits.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) {
            return Err(invalid());
        }
        let magnitude: f64 = digits.parse().map_err(|_| invalid())?;
        if !magnitude.is_finite() {
            return Err(invalid());
        }
        return Ok(Token::Float(if negative { -magnitude } else { magnitude }));
    }

    // Leading zeros are ambiguous (octal in some languages), keep them as text.
    if digits.len() > 1 && digits.starts_with('0') && digits.chars().any(|c| c != '0') {
        return Err(invalid());
    }
    if negative {
        return format!("-{digits}")
            .parse::<i64>()
            .map(Token::Integer)
            .map_err(|_| invalid());
    }
    if let Ok(value) = digits.parse::<i64>() {
        return Ok(Token::Integer(value));
    }
    digits.parse::<u64>().map(Token::Unsigned).map_err(|_| invalid())
}

struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    fn parse_value(&mut self) -> Result<Value> {
        let Some(token) = self.peek().cloned() else {
            return Err(LiteralError::Parse("unexpected end of literal".to_owned()));
        };
        self.index += 1;

        match token {
            Token::True => Ok(Value::Bool(true)),
            Token::False => Ok(Value::Bool(false)),
            Token::Null => Ok(Value::Null),
            Token::Integer(v) => Ok(Value::from(v)),
            Token::Unsigned(v) => Ok(Value::from(v)),
            Token::Float(v) => Number::from_f64(v)
                .map(Value::Number)
                .ok_or_else(|| LiteralError::Parse(format!("invalid finite number '{v}'"))),
            Token::String(v) => Ok(Value::String(v)),
            Token::LBracket => Ok(Value::Array(self.parse_sequence(Token::RBracket)?.0)),
            Token::LParen => {
                // `(x)` is just `x`; only `(x,)` or `(x, y)` form a tuple.
                let (mut items, trailing_comma) = self.parse_sequence(Token::RParen)?;
                if items.len() == 1 && !trailing_comma {
                    return Ok(items.remove(0));
                }
                Ok(Value::Array(items))
            }
            Token::LBrace => self.parse_mapping(),
            other => Err(LiteralError::Parse(format!("unexpected token '{other:?}'"))),
        }
    }

    /// Returns the items and whether the last item was followed by a comma.
    fn parse_sequence(&mut self, close: Token) -> Result<(Vec<Value>, bool)> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            if self.match_token(&close) {
                break;
            }
            items.push(self.parse_value()?);
            trailing_comma = self.match_token(&Token::Comma);
            if !trailing_comma {
                self.consume(&close, "expected ',' or closing bracket")?;
                break;
            }
        }
        Ok((items, trailing_comma))
    }

    fn parse_mapping(&mut self) -> Result<Value> {
        let mut map = Map::new();
        loop {
            if self.match_token(&Token::RBrace) {
                break;
            }
            let key = match self.parse_value()? {
                Value::String(key) => key,
                other => {
                    return Err(LiteralError::Parse(format!(
                        "mapping keys must be strings, found '{other}'"
                    )))
                }
            };
            self.consume(&Token::Colon, "expected ':' after mapping key")?;
            let value = self.parse_value()?;
            map.insert(key, value);
            if !self.match_token(&Token::Comma) {
                self.consume(&Token::RBrace, "expected ',' or '}' in mapping")?;
                break;
            }
        }
        Ok(Value::Object(map))
    }

    fn consume(&mut self, expected: &Token, msg: &str) -> Result<()> {
        if self.match_token(expected) {
            Ok(())
        } else {
            Err(LiteralError::Parse(msg.to_owned()))
        }
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.index += 1;
            return true;
        }
        false
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn expect_end(&self) -> Result<()> {
        if self.peek().is_some() {
            return Err(LiteralError::Parse(
                "unexpected trailing tokens".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_literal;

    #[test]
    fn parses_scalars() {
        assert_eq!(parse_literal("1"), Ok(json!(1)));
        assert_eq!(parse_literal("-42"), Ok(json!(-42)));
        assert_eq!(parse_literal("1_000"), Ok(json!(1000)));
        assert_eq!(parse_literal("0x1F"), Ok(json!(31)));
        assert_eq!(parse_literal("0b101"), Ok(json!(5)));
        assert_eq!(parse_literal("18446744073709551615"), Ok(json!(u64::MAX)));
        assert_eq!(parse_literal("0.5"), Ok(json!(0.5)));
        assert_eq!(parse_literal(".5"), Ok(json!(0.5)));
        assert_eq!(parse_literal("-.5"), Ok(json!(-0.5)));
        assert_eq!(parse_literal("+.5"), Ok(json!(0.5)));
        assert_eq!(parse_literal("[-.25, +1]"), Ok(json!([-0.25, 1])));
        assert_eq!(parse_literal("1e-3"), Ok(json!(0.001)));
        assert_eq!(parse_literal("-2.5E2"), Ok(json!(-250.0)));
        assert_eq!(parse_literal("True"), Ok(json!(true)));
        assert_eq!(parse_literal("false"), Ok(json!(false)));
        assert_eq!(parse_literal("None"), Ok(json!(null)));
        assert_eq!(parse_literal("'it\\'s'"), Ok(json!("it's")));
        assert_eq!(parse_literal(r#"'a\\b\tc'"#), Ok(json!("a\\b\tc")));
        assert_eq!(parse_literal("\"a b\""), Ok(json!("a b")));
    }

    #[test]
    fn parses_containers() {
        assert_eq!(parse_literal("[1, 'a', [True]]"), Ok(json!([1, "a", [true]])));
        assert_eq!(parse_literal("[]"), Ok(json!([])));
        assert_eq!(parse_literal("[1, 2,]"), Ok(json!([1, 2])));
        assert_eq!(parse_literal("(1, 2)"), Ok(json!([1, 2])));
        assert_eq!(parse_literal("(1,)"), Ok(json!([1])));
        assert_eq!(parse_literal("(1)"), Ok(json!(1)));
        assert_eq!(parse_literal("()"), Ok(json!([])));
        assert_eq!(
            parse_literal("{'lr': 0.1, \"steps\": [1, 2]}"),
            Ok(json!({ "lr": 0.1, "steps": [1, 2] }))
        );
    }

    #[test]
    fn rejects_non_literals() {
        for raw in [
            "", "test", "1 2", "1 + 2", "[1, 2", "{1: 2}", "{'a' 1}", "'open",
            "007", "1e999", "0xZZ", "__import__('os')", "1__0", "inf", "1.2.3",
            "-.", "+.e1", r"'\x41'", r"'\u0041'",
        ] {
            assert!(parse_literal(raw).is_err(), "{raw:?} should not parse");
        }
    }
}
