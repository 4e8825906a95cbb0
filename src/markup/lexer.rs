//! logos-based lexer for `key:value;key2:value2` declarations.

use logos::Logos;

/// Declaration token.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `:`
    #[token(":")]
    Colon,

    /// `;`
    #[token(";")]
    Semicolon,

    /// Any run of characters other than the two separators.
    #[regex(r"[^:;]+")]
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<(Token, &str)> {
        let mut lexer = Token::lexer(input);
        let mut out = Vec::new();
        while let Some(token) = lexer.next() {
            out.push((token.unwrap(), lexer.slice()));
        }
        out
    }

    #[test]
    fn splits_on_separators() {
        assert_eq!(
            tokens("type:Button; text : Go"),
            vec![
                (Token::Text, "type"),
                (Token::Colon, ":"),
                (Token::Text, "Button"),
                (Token::Semicolon, ";"),
                (Token::Text, " text "),
                (Token::Colon, ":"),
                (Token::Text, " Go"),
            ]
        );
    }

    #[test]
    fn empty_input_has_no_tokens() {
        assert!(tokens("").is_empty());
    }
}
