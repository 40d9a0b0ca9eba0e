//! Lexer for material scripts.
//!
//! Converts source text into a flat stream of [`Token`]s. Lexing never
//! fails: characters that cannot start a token come out as
//! [`TokenKind::Unknown`] and are rejected later by the parser.

use std::sync::Arc;

use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    file: Arc<str>,
}

impl Lexer {
    pub fn new(source: &str, file: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            file: Arc::from(file),
        }
    }

    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();

        loop {
            self.skip_whitespace();
            if self.skip_comment() {
                continue;
            }

            if self.is_at_end() {
                tokens.push(self.token(TokenKind::End, String::new(), self.line));
                break;
            }

            let ch = self.peek();
            let line = self.line;

            let token = match ch {
                '\n' => {
                    self.advance();
                    self.line += 1;
                    // Consecutive newlines collapse into one token
                    if tokens.last().is_some_and(|t| t.kind == TokenKind::Newline) {
                        continue;
                    }
                    self.token(TokenKind::Newline, "\n".to_string(), line)
                }
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                ':' => self.single_char(TokenKind::Colon),
                '"' => self.lex_quote(),
                '$' => self.lex_run(TokenKind::Variable),
                c if is_word_char(c) => self.lex_run(TokenKind::Word),
                _ => self.single_char(TokenKind::Unknown),
            };

            tokens.push(token);
        }

        tokens
    }

    fn token(&self, kind: TokenKind, lexeme: String, line: u32) -> Token {
        Token {
            kind,
            lexeme,
            file: Arc::clone(&self.file),
            line,
        }
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            let ch = self.peek();
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skips one `//` or `/* */` comment. Returns whether anything was skipped.
    fn skip_comment(&mut self) -> bool {
        if self.is_at_end() || self.peek() != '/' {
            return false;
        }
        match self.peek_next() {
            Some('/') => {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
                true
            }
            Some('*') => {
                self.advance();
                self.advance();
                while !self.is_at_end() {
                    let ch = self.advance();
                    if ch == '\n' {
                        self.line += 1;
                    } else if ch == '*' && !self.is_at_end() && self.peek() == '/' {
                        self.advance();
                        break;
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let ch = self.advance();
        self.token(kind, ch.to_string(), line)
    }

    /// A run of word characters; `{`, `}` and `:` end it.
    fn lex_run(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let mut s = String::new();
        s.push(self.advance());
        while !self.is_at_end() && is_word_char(self.peek()) {
            s.push(self.advance());
        }
        self.token(kind, s, line)
    }

    fn lex_quote(&mut self) -> Token {
        let line = self.line;
        let mut s = String::new();
        s.push(self.advance()); // opening '"'
        while !self.is_at_end() {
            let ch = self.advance();
            match ch {
                '\\' if !self.is_at_end() && self.peek() == '"' => {
                    s.push(self.advance());
                }
                '"' => {
                    s.push(ch);
                    return self.token(TokenKind::Quote, s, line);
                }
                '\n' => {
                    self.line += 1;
                    s.push(ch);
                }
                _ => s.push(ch),
            }
        }
        self.token(TokenKind::Unknown, s, line)
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_control() && !matches!(c, '{' | '}' | ':' | '"')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src, "test").tokenize().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_object_header() {
        let tokens = Lexer::new("material Red\n{\n}", "red.material").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[0].lexeme, "material");
        assert_eq!(tokens[1].lexeme, "Red");
        assert_eq!(tokens[2].kind, TokenKind::Newline);
        assert_eq!(tokens[3].kind, TokenKind::LBrace);
        assert_eq!(tokens[5].kind, TokenKind::RBrace);
        assert_eq!(tokens[6].kind, TokenKind::End);
        assert_eq!(&*tokens[0].file, "red.material");
    }

    #[test]
    fn lex_braces_glued_to_words() {
        assert_eq!(
            kinds("pass{}"),
            vec![
                TokenKind::Word,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::End
            ]
        );
    }

    #[test]
    fn lex_colon_inheritance() {
        let tokens = Lexer::new("material Child : Base", "t").tokenize();
        assert_eq!(tokens[2].kind, TokenKind::Colon);
        assert_eq!(tokens[3].lexeme, "Base");
    }

    #[test]
    fn lex_variable() {
        let tokens = Lexer::new("set $colour 1 0 0", "t").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Variable);
        assert_eq!(tokens[1].lexeme, "$colour");
    }

    #[test]
    fn lex_quote_with_escape() {
        let tokens = Lexer::new(r#"texture "a \"b\".png""#, "t").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Quote);
        assert_eq!(tokens[1].text(), r#"a "b".png"#);
    }

    #[test]
    fn lex_unterminated_quote_is_unknown() {
        let tokens = Lexer::new("source \"abc", "t").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Unknown);
        assert_eq!(tokens[2].kind, TokenKind::End);
    }

    #[test]
    fn lex_control_char_is_unknown() {
        assert_eq!(
            kinds("a \u{7} b"),
            vec![
                TokenKind::Word,
                TokenKind::Unknown,
                TokenKind::Word,
                TokenKind::End
            ]
        );
    }

    #[test]
    fn lex_newlines_collapse() {
        assert_eq!(
            kinds("a\n\n\n\nb"),
            vec![
                TokenKind::Word,
                TokenKind::Newline,
                TokenKind::Word,
                TokenKind::End
            ]
        );
    }

    #[test]
    fn lex_line_tracking() {
        let tokens = Lexer::new("a\n\nb /* x\ny */ c\nd", "t").tokenize();
        let d = tokens.iter().find(|t| t.lexeme == "d").unwrap();
        let c = tokens.iter().find(|t| t.lexeme == "c").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(c.line, 4);
        assert_eq!(d.line, 5);
    }

    #[test]
    fn lex_line_comment() {
        assert_eq!(
            kinds("lighting off // comment\n"),
            vec![
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Newline,
                TokenKind::End
            ]
        );
    }

    #[test]
    fn lex_slash_in_word() {
        let tokens = Lexer::new("texture dir/file.png", "t").tokenize();
        assert_eq!(tokens[1].lexeme, "dir/file.png");
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::End]);
    }
}
