// sas - an interpreter for a subset of the SAS data-analysis language.
// Copyright (C) 2026 sas-rs contributors.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! SAS-aware tokenizer.
//!
//! Single-pass, deterministic, at most two characters of lookahead (for the
//! line-comment disambiguation rule). Diagnostics for recoverable lex errors
//! (unterminated comment/string) are queued rather than returned as a hard
//! failure: the lexer keeps producing tokens, with the unterminated
//! construct simply extended to EOF.

use crate::{
    identifier::Keyword,
    lex::token::{Punct, Token, TokenKind},
    message::{Diagnostic, Location, Point},
};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    /// True when the next non-whitespace character is in "statement start"
    /// position: right after a `;` or at the very beginning of the buffer.
    /// Used to disambiguate a bare `*` as a line comment vs. the multiply
    /// operator.
    at_stmt_start: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            at_stmt_start: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn point(&self) -> Point {
        Point::new(self.line, self.col)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn warn(&mut self, point: Point, text: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::warning(Location::at(point), text));
    }

    /// Skips whitespace and comments, tracking whether the lexer is
    /// positioned at a statement start for the `*` disambiguation rule.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.skip_block_comment();
                }
                Some('*') if self.at_stmt_start => {
                    self.skip_line_comment();
                }
                Some('%') if self.peek_at(1) == Some('*') => {
                    self.skip_macro_line_comment();
                }
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let start = self.point();
        self.advance(); // '/'
        self.advance(); // '*'
        loop {
            match self.peek() {
                None => {
                    self.warn(start, "unterminated comment, treated as extending to end of file");
                    return;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Consumes a bare `*...;` line comment (the `*` itself through the
    /// next `;`, inclusive).
    fn skip_line_comment(&mut self) {
        self.advance(); // '*'
        self.consume_through_semicolon();
    }

    /// Consumes a `%*...;` macro-style line comment.
    fn skip_macro_line_comment(&mut self) {
        self.advance(); // '%'
        self.advance(); // '*'
        self.consume_through_semicolon();
    }

    fn consume_through_semicolon(&mut self) {
        while let Some(c) = self.peek() {
            self.advance();
            if c == ';' {
                break;
            }
        }
        self.at_stmt_start = true;
    }

    /// Produces the next token. Never returns a hard error: malformed
    /// constructs are recovered from and reported via [Lexer::take_diagnostics].
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.point();
        let Some(c) = self.peek() else {
            return self.token(TokenKind::Eof, String::new(), start);
        };

        self.at_stmt_start = false;

        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.lex_number(start);
        }
        if c == '\'' || c == '"' {
            return self.lex_string(c, start);
        }
        if c.is_alphabetic() || c == '_' {
            return self.lex_identifier(start);
        }

        self.advance();
        let tok = match c {
            ';' => {
                self.at_stmt_start = true;
                self.token(TokenKind::Punct(Punct::Semicolon), ";".into(), start)
            }
            '=' if self.peek() == Some('=') => {
                self.advance();
                self.token(TokenKind::Punct(Punct::EqEq), "==".into(), start)
            }
            '=' => self.token(TokenKind::Punct(Punct::Equals), "=".into(), start),
            '(' => self.token(TokenKind::Punct(Punct::LParen), "(".into(), start),
            ')' => self.token(TokenKind::Punct(Punct::RParen), ")".into(), start),
            ',' => self.token(TokenKind::Punct(Punct::Comma), ",".into(), start),
            '.' => self.token(TokenKind::Punct(Punct::Dot), ".".into(), start),
            '*' if self.peek() == Some('*') => {
                self.advance();
                self.token(TokenKind::Punct(Punct::Power), "**".into(), start)
            }
            '*' => self.token(TokenKind::Punct(Punct::Star), "*".into(), start),
            '/' => self.token(TokenKind::Punct(Punct::Slash), "/".into(), start),
            '+' => self.token(TokenKind::Punct(Punct::Plus), "+".into(), start),
            '-' => self.token(TokenKind::Punct(Punct::Minus), "-".into(), start),
            '<' if self.peek() == Some('=') => {
                self.advance();
                self.token(TokenKind::Punct(Punct::Le), "<=".into(), start)
            }
            '<' => self.token(TokenKind::Punct(Punct::Lt), "<".into(), start),
            '>' if self.peek() == Some('=') => {
                self.advance();
                self.token(TokenKind::Punct(Punct::Ge), ">=".into(), start)
            }
            '>' => self.token(TokenKind::Punct(Punct::Gt), ">".into(), start),
            '!' if self.peek() == Some('=') => {
                self.advance();
                self.token(TokenKind::Punct(Punct::NotEq), "!=".into(), start)
            }
            '&' => self.token(TokenKind::Punct(Punct::Amp), "&".into(), start),
            '|' => self.token(TokenKind::Punct(Punct::Pipe), "|".into(), start),
            '$' => self.token(TokenKind::Punct(Punct::Dollar), "$".into(), start),
            '[' => self.token(TokenKind::Punct(Punct::LBracket), "[".into(), start),
            ']' => self.token(TokenKind::Punct(Punct::RBracket), "]".into(), start),
            other => {
                self.warn(start, format!("invalid character {other:?}, ignored"));
                return self.next_token();
            }
        };
        tok
    }

    fn token(&self, kind: TokenKind, text: String, start: Point) -> Token {
        Token {
            kind,
            text,
            line: start.line,
            col: start.col,
        }
    }

    fn lex_number(&mut self, start: Point) -> Token {
        let begin = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        } else if self.peek() == Some('.') && self.peek_at(1) != Some('.') {
            // A bare trailing dot, e.g. `10.`, is still a valid number.
            self.advance();
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let save = self.pos;
            let save_line = self.line;
            let save_col = self.col;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                self.pos = save;
                self.line = save_line;
                self.col = save_col;
            }
        }
        let text: String = self.chars[begin..self.pos].iter().collect();
        let value = text.parse::<f64>().unwrap_or(0.0);
        self.token(TokenKind::Number(value), text, start)
    }

    fn lex_string(&mut self, quote: char, start: Point) -> Token {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek() {
                None => {
                    self.warn(start, "unterminated string literal");
                    break;
                }
                Some(c) if c == quote => {
                    self.advance();
                    if self.peek() == Some(quote) {
                        // Doubled delimiter: a literal quote character.
                        self.advance();
                        s.push(quote);
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    self.advance();
                    s.push(c);
                }
            }
        }
        let text = format!("{quote}{s}{quote}");
        self.token(TokenKind::String(s), text, start)
    }

    fn lex_identifier(&mut self, start: Point) -> Token {
        let begin = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let text: String = self.chars[begin..self.pos].iter().collect();
        let kind = match Keyword::lookup(&text) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(text.clone()),
        };
        self.token(kind, text, start)
    }

    /// Switches to raw-line mode for a DATALINES/CARDS block: reads lines
    /// verbatim, without tokenizing, until a line consisting of
    /// a single `;` (optionally surrounded by whitespace) is seen. That
    /// terminating line is consumed but not included in the result.
    pub fn read_datalines(&mut self) -> Vec<String> {
        // Skip to the start of the line following the `datalines;` keyword.
        if self.peek() == Some('\n') {
            self.advance();
        } else {
            while let Some(c) = self.peek() {
                self.advance();
                if c == '\n' {
                    break;
                }
            }
        }

        let mut lines = Vec::new();
        loop {
            if self.pos >= self.chars.len() {
                break;
            }
            let line_start = self.pos;
            while self.peek().is_some() && self.peek() != Some('\n') {
                self.advance();
            }
            let line: String = self.chars[line_start..self.pos].iter().collect();
            if self.peek() == Some('\n') {
                self.advance();
            }
            if line.trim() == ";" {
                break;
            }
            lines.push(line);
        }
        self.at_stmt_start = true;
        lines
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            if tok.is_eof() {
                break;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn lexes_data_step_header() {
        let kinds = kinds("data a; a = 10; output; run;");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword(Keyword::Data),
                TokenKind::Identifier("a".into()),
                TokenKind::Punct(Punct::Semicolon),
                TokenKind::Identifier("a".into()),
                TokenKind::Punct(Punct::Equals),
                TokenKind::Number(10.0),
                TokenKind::Punct(Punct::Semicolon),
                TokenKind::Keyword(Keyword::Output),
                TokenKind::Punct(Punct::Semicolon),
                TokenKind::Keyword(Keyword::Run),
                TokenKind::Punct(Punct::Semicolon),
            ]
        );
    }

    #[test]
    fn keyword_matching_is_case_insensitive() {
        assert_eq!(kinds("DATA"), vec![TokenKind::Keyword(Keyword::Data)]);
        assert_eq!(kinds("Data"), vec![TokenKind::Keyword(Keyword::Data)]);
    }

    #[test]
    fn block_comment_is_skipped() {
        assert_eq!(
            kinds("a /* comment */ b"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Identifier("b".into()),
            ]
        );
    }

    #[test]
    fn bare_star_at_statement_start_is_a_comment() {
        assert_eq!(
            kinds("* this is a comment; a = 1;"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Punct(Punct::Equals),
                TokenKind::Number(1.0),
                TokenKind::Punct(Punct::Semicolon),
            ]
        );
    }

    #[test]
    fn star_elsewhere_is_multiply() {
        assert_eq!(
            kinds("a = b * c;"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Punct(Punct::Equals),
                TokenKind::Identifier("b".into()),
                TokenKind::Punct(Punct::Star),
                TokenKind::Identifier("c".into()),
                TokenKind::Punct(Punct::Semicolon),
            ]
        );
    }

    #[test]
    fn macro_style_line_comment_is_skipped() {
        assert_eq!(
            kinds("%* a macro comment; a = 1;"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Punct(Punct::Equals),
                TokenKind::Number(1.0),
                TokenKind::Punct(Punct::Semicolon),
            ]
        );
    }

    #[test]
    fn doubled_quote_is_escaped_delimiter() {
        let mut lexer = Lexer::new("'it''s'");
        let tok = lexer.next_token();
        assert_eq!(tok.as_string_literal(), Some("it's"));
    }

    #[test]
    fn double_quoted_string_with_doubled_delimiter() {
        let mut lexer = Lexer::new("\"she said \"\"hi\"\"\"");
        let tok = lexer.next_token();
        assert_eq!(tok.as_string_literal(), Some("she said \"hi\""));
    }

    #[test]
    fn unterminated_comment_reports_warning_and_reaches_eof() {
        let mut lexer = Lexer::new("a /* never closed");
        let first = lexer.next_token();
        assert_eq!(first.as_identifier(), Some("a"));
        let next = lexer.next_token();
        assert!(next.is_eof());
        assert_eq!(lexer.take_diagnostics().len(), 1);
    }

    #[test]
    fn unterminated_string_reports_warning() {
        let mut lexer = Lexer::new("'never closed");
        let tok = lexer.next_token();
        assert_eq!(tok.as_string_literal(), Some("never closed"));
        assert_eq!(lexer.take_diagnostics().len(), 1);
    }

    #[test]
    fn scientific_notation_numbers() {
        assert_eq!(kinds("1.5e10 2E-3"), vec![
            TokenKind::Number(1.5e10),
            TokenKind::Number(2e-3),
        ]);
    }

    #[test]
    fn datalines_reads_raw_lines_until_lone_semicolon() {
        let mut lexer = Lexer::new("datalines;\njohn 23\nmary 30\n;\nrun;");
        let tok = lexer.next_token();
        assert_eq!(tok.as_keyword(), Some(Keyword::Datalines));
        let semi = lexer.next_token();
        assert_eq!(semi.as_punct(), Some(Punct::Semicolon));
        let lines = lexer.read_datalines();
        assert_eq!(lines, vec!["john 23".to_string(), "mary 30".to_string()]);
        let after = lexer.next_token();
        assert_eq!(after.as_keyword(), Some(Keyword::Run));
    }
}
