//! Tokenizer for propositional-logic rule expressions.
//!
//! Identifiers are tokenized by maximal munch
//! (`[A-Za-z_][A-Za-z0-9_]*`), which is what makes the "longest name
//! wins" substitution law hold without a textual substitution pass: a
//! predicate named `a` can never swallow part of a token `a_b`,
//! because the lexer already consumed `a_b` as one identifier.

use caliber_core::LogicError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Not,
    And,
    Or,
    Implies,
    LParen,
    RParen,
    Ident(String),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Not => write!(f, "NOT"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Implies => write!(f, "IMPLIES"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Ident(s) => write!(f, "{s}"),
        }
    }
}

pub fn tokenize(expr: &str) -> Result<Vec<Token>, LogicError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '(' {
            tokens.push(Token::LParen);
            i += 1;
            continue;
        }
        if c == ')' {
            tokens.push(Token::RParen);
            i += 1;
            continue;
        }
        if c == '_' || c.is_alphabetic() {
            let start = i;
            while i < chars.len() && (chars[i] == '_' || chars[i].is_alphanumeric()) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            tokens.push(match word.as_str() {
                "NOT" => Token::Not,
                "AND" => Token::And,
                "OR" => Token::Or,
                "IMPLIES" => Token::Implies,
                _ => Token::Ident(word),
            });
            continue;
        }
        return Err(LogicError::MalformedExpression {
            reason: format!("unexpected character '{c}' at offset {i}"),
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_longest_identifier_greedily() {
        let tokens = tokenize("a_b AND a").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a_b".to_string()),
                Token::And,
                Token::Ident("a".to_string()),
            ]
        );
    }

    #[test]
    fn tokenizes_parens_and_keywords() {
        let tokens = tokenize("(NOT a) IMPLIES b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Not,
                Token::Ident("a".to_string()),
                Token::RParen,
                Token::Implies,
                Token::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_unexpected_characters() {
        assert!(tokenize("a AND $b").is_err());
    }
}
