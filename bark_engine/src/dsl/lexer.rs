//! Tokenizer for rule text.
//!
//! Produces a flat token list with line numbers. Keywords are not recognized
//! here; the parser matches them case-insensitively against `Word` tokens.
//!
//! ```text
//! WHEN ACTION IS SAY, guard.hunger >= 10 DO SAY "Hi" DELAY 1.5 .
//! ^^^^ Word                ^^^^^^^^^^^^ Word (qualified)
//!                                  ^^ Op(Ge)  ^^ Number   ^^^^ Str   ^ Dot
//! ```
//!
//! A `.` between two identifier characters joins them into one qualified
//! word (`guard.hunger`); any other `.` is a statement terminator.

use super::ParseError;

/// Relational operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelOp::Eq => "=",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword, possibly dot-qualified.
    Word(String),
    /// Numeric literal, kept as written.
    Number(String),
    /// Contents of a double-quoted string, escapes resolved.
    Str(String),
    Dot,
    Comma,
    Percent,
    Bang,
    Op(RelOp),
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Word(w) | TokenKind::Number(w) => f.write_str(w),
            TokenKind::Str(s) => write!(f, "\"{}\"", s),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::Op(op) => f.write_str(op.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split rule text into tokens. `//` comments run to end of line.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut i = 0;

    let at = |i: usize| chars.get(i).copied();

    while let Some(c) = at(i) {
        match c {
            '\n' => {
                line += 1;
                i += 1;
            }
            c if c.is_whitespace() => i += 1,
            '/' if at(i + 1) == Some('/') => {
                while let Some(c) = at(i) {
                    if c == '\n' {
                        break;
                    }
                    i += 1;
                }
            }
            '"' => {
                let start_line = line;
                let mut text = String::new();
                i += 1;
                loop {
                    match at(i) {
                        None => return Err(ParseError::UnterminatedString { line: start_line }),
                        Some('"') => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            match at(i + 1) {
                                Some('n') => text.push('\n'),
                                Some('t') => text.push('\t'),
                                Some(other) => text.push(other),
                                None => {
                                    return Err(ParseError::UnterminatedString { line: start_line })
                                }
                            }
                            i += 2;
                        }
                        Some(other) => {
                            if other == '\n' {
                                line += 1;
                            }
                            text.push(other);
                            i += 1;
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Str(text),
                    line: start_line,
                });
            }
            c if c.is_ascii_digit()
                || (c == '-' && at(i + 1).is_some_and(|n| n.is_ascii_digit())) =>
            {
                let start = i;
                i += 1;
                while at(i).is_some_and(|n| n.is_ascii_digit()) {
                    i += 1;
                }
                if at(i) == Some('.') && at(i + 1).is_some_and(|n| n.is_ascii_digit()) {
                    i += 1;
                    while at(i).is_some_and(|n| n.is_ascii_digit()) {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                if at(i).is_some_and(is_ident_start) {
                    return Err(ParseError::InvalidNumber {
                        line,
                        found: format!("{}{}", text, chars[i]),
                    });
                }
                tokens.push(Token {
                    kind: TokenKind::Number(text),
                    line,
                });
            }
            c if is_ident_start(c) => {
                let start = i;
                while at(i).is_some_and(is_ident_char) {
                    i += 1;
                }
                while at(i) == Some('.') && at(i + 1).is_some_and(is_ident_start) {
                    i += 1;
                    while at(i).is_some_and(is_ident_char) {
                        i += 1;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Word(chars[start..i].iter().collect()),
                    line,
                });
            }
            _ => {
                let (kind, width) = match (c, at(i + 1)) {
                    ('.', _) => (TokenKind::Dot, 1),
                    (',', _) => (TokenKind::Comma, 1),
                    ('%', _) => (TokenKind::Percent, 1),
                    ('!', Some('=')) => (TokenKind::Op(RelOp::Ne), 2),
                    ('!', _) => (TokenKind::Bang, 1),
                    ('=', Some('=')) => (TokenKind::Op(RelOp::Eq), 2),
                    ('=', _) => (TokenKind::Op(RelOp::Eq), 1),
                    ('<', Some('=')) => (TokenKind::Op(RelOp::Le), 2),
                    ('<', _) => (TokenKind::Op(RelOp::Lt), 1),
                    ('>', Some('=')) => (TokenKind::Op(RelOp::Ge), 2),
                    ('>', _) => (TokenKind::Op(RelOp::Gt), 1),
                    _ => return Err(ParseError::InvalidCharacter { line, found: c }),
                };
                tokens.push(Token { kind, line });
                i += width;
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn word(w: &str) -> TokenKind {
        TokenKind::Word(w.to_string())
    }

    #[test]
    fn test_qualified_words_and_terminator() {
        assert_eq!(
            kinds("guard.hunger >= 10 ."),
            vec![
                word("guard.hunger"),
                TokenKind::Op(RelOp::Ge),
                TokenKind::Number("10".into()),
                TokenKind::Dot,
            ]
        );
        // A dot followed by whitespace ends the statement even right after a word.
        assert_eq!(
            kinds("RAISE alarm.\nWHEN"),
            vec![word("RAISE"), word("alarm"), TokenKind::Dot, word("WHEN")]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1.5 -3 7."),
            vec![
                TokenKind::Number("1.5".into()),
                TokenKind::Number("-3".into()),
                TokenKind::Number("7".into()),
                TokenKind::Dot,
            ]
        );
        assert!(matches!(
            tokenize("12abc"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_strings_and_comments() {
        let tokens = tokenize("// a comment\nSAY \"He said \\\"hi\\\"\" // trailing\n.").unwrap();
        assert_eq!(tokens[0].kind, word("SAY"));
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].kind, TokenKind::Str("He said \"hi\"".into()));
        assert_eq!(tokens[2].kind, TokenKind::Dot);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("= == != < <= > >= ! % ,"),
            vec![
                TokenKind::Op(RelOp::Eq),
                TokenKind::Op(RelOp::Eq),
                TokenKind::Op(RelOp::Ne),
                TokenKind::Op(RelOp::Lt),
                TokenKind::Op(RelOp::Le),
                TokenKind::Op(RelOp::Gt),
                TokenKind::Op(RelOp::Ge),
                TokenKind::Bang,
                TokenKind::Percent,
                TokenKind::Comma,
            ]
        );
    }

    #[test]
    fn test_errors_carry_line() {
        assert_eq!(
            tokenize("WHEN\n\"open"),
            Err(ParseError::UnterminatedString { line: 2 })
        );
        assert_eq!(
            tokenize("WHEN\n\n#"),
            Err(ParseError::InvalidCharacter { line: 3, found: '#' })
        );
    }
}
