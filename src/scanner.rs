use peekmore::{PeekMore, PeekMoreIterator};
use substring::Substring;

use crate::error::Diagnostics;
use crate::literal::Literal;
use crate::token::{Token, TokenKind};

/// Converts source text into a token stream terminated by `Eof`.
///
/// A single left-to-right pass over the characters, tracking `start`
/// (byte offset of the token currently being scanned) and `current`
/// (byte offset of the next unconsumed character). Conformance only
/// requires ASCII source text (per spec), so byte offsets double as char
/// offsets and lexemes can be sliced straight out of the source string.
pub struct Scanner<'a> {
    source: &'a str,
    chars: PeekMoreIterator<std::str::Chars<'a>>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            chars: source.chars().peekmore(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(diagnostics);
        }

        self.tokens.push(Token::new(TokenKind::Eof, "", None, self.line));
        self.tokens
    }

    fn is_at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn advance(&mut self) -> char {
        let c = self.chars.next().expect("advance past end of source");
        self.current += c.len_utf8();
        c
    }

    fn peek(&mut self) -> char {
        self.chars.peek().copied().unwrap_or('\0')
    }

    fn peek_next(&mut self) -> char {
        self.chars.peek_next().copied().unwrap_or('\0')
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        }
        self.advance();
        true
    }

    fn lexeme(&self) -> String {
        self.source.substring(self.start, self.current).to_string()
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_with_literal(kind, None);
    }

    fn add_token_with_literal(&mut self, kind: TokenKind, literal: Option<Literal>) {
        self.tokens.push(Token::new(kind, self.lexeme(), literal, self.line));
    }

    fn scan_token(&mut self, diagnostics: &mut Diagnostics) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),

            '!' => {
                let kind = if self.matches('=') { TokenKind::BangEqual } else { TokenKind::Bang };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.matches('=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.matches('=') { TokenKind::LessEqual } else { TokenKind::Less };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.matches('=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                self.add_token(kind);
            }

            '/' => {
                if self.matches('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }

            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,

            '"' => self.string(diagnostics),

            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),

            other => diagnostics.scan_error(self.line, &format!("Unexpected character '{other}'")),
        }
    }

    fn string(&mut self, diagnostics: &mut Diagnostics) {
        let start_line = self.line;

        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            diagnostics.scan_error(start_line, "Unterminated string.");
            return;
        }

        self.advance(); // closing quote

        // Literal excludes the surrounding quotes; the lexeme includes them.
        let value = self.source.substring(self.start + 1, self.current - 1).to_string();
        self.add_token_with_literal(TokenKind::String, Some(Literal::Str(value)));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance(); // consume the '.'
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let value: f64 = self.lexeme().parse().expect("scanned number to be valid");
        self.add_token_with_literal(TokenKind::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();
        let kind = keyword(&text).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }
}

fn keyword(text: &str) -> Option<TokenKind> {
    Some(match text {
        "and" => TokenKind::And,
        "break" => TokenKind::Break,
        "class" => TokenKind::Class,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "for" => TokenKind::For,
        "fun" => TokenKind::Fun,
        "if" => TokenKind::If,
        "nil" => TokenKind::Nil,
        "or" => TokenKind::Or,
        "print" => TokenKind::Print,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut diagnostics = Diagnostics::new();
        Scanner::new(source).scan_tokens(&mut diagnostics).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_arithmetic_expression() {
        assert_eq!(
            kinds("1 + 2 * 3;"),
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Star,
                TokenKind::Number,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_two_char_operators() {
        assert_eq!(
            kinds("!= == <= >="),
            vec![
                TokenKind::BangEqual,
                TokenKind::EqualEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_produces_no_tokens() {
        assert_eq!(kinds("// comment\n1;"), vec![TokenKind::Number, TokenKind::Semicolon, TokenKind::Eof]);
    }

    #[test]
    fn multiline_string_tracks_line_number() {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new("\"a\nb\"").scan_tokens(&mut diagnostics);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].literal, Some(Literal::Str("a\nb".to_string())));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_string_reports_error_and_no_token() {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new("\"unterminated").scan_tokens(&mut diagnostics);
        assert!(diagnostics.had_error());
        assert_eq!(tokens, vec![Token::new(TokenKind::Eof, "", None, 1)]);
    }

    #[test]
    fn keyword_table_recognizes_break() {
        assert_eq!(kinds("break;"), vec![TokenKind::Break, TokenKind::Semicolon, TokenKind::Eof]);
    }

    #[test]
    fn unexpected_character_reports_error_but_continues() {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new("1 @ 2;").scan_tokens(&mut diagnostics);
        assert!(diagnostics.had_error());
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Semicolon, TokenKind::Eof]
        );
    }
}
