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

//! Recursive-descent parser.
//!
//! One token of lookahead, matching the lexer's own lookahead budget. On a
//! syntax error inside a DATA/PROC step the parser consumes tokens up to the
//! next `;`, stopping early at a `run` keyword or end of input so it never
//! swallows the statement that would have ended the enclosing step; the
//! caller's loop then resumes from there. Statements dispatch by leading
//! keyword, hand-written rather than derive-macro driven (see DESIGN.md).

use crate::{
    ast::{
        DataStatement, DataStep, DoKind, DoLoop, Expr, BinOp, Proc, ProcFreq, ProcMeans,
        ProcPrint, ProcSort, Program, Statement, UnOp, Value,
    },
    identifier::Keyword,
    lex::{Lexer, Punct, Token, TokenKind},
    message::{Diagnostic, Location, Point},
};

type PResult<T> = Result<T, ()>;

pub struct Parser {
    lexer: Lexer,
    current: Token,
    diagnostics: Vec<Diagnostic>,
}

/// Parses a complete program, returning the AST built so far (errors leave
/// partial statements out, not the whole program) and any diagnostics
/// collected along the way, lexer warnings included.
pub fn parse(source: &str) -> (Program, Vec<Diagnostic>) {
    Parser::parse(source)
}

impl Parser {
    /// Parses a complete program in one call, for callers that don't need
    /// the separate `new`/`parse_program` steps.
    pub fn parse(source: &str) -> (Program, Vec<Diagnostic>) {
        Self::new(source).parse_program()
    }

    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse_program(mut self) -> (Program, Vec<Diagnostic>) {
        let mut statements = Vec::new();
        while !self.current.is_eof() {
            match self.parse_top_level_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize_top_level(),
            }
        }
        let lex_diags = self.lexer.take_diagnostics();
        self.diagnostics.extend(lex_diags);
        (Program { statements }, self.diagnostics)
    }

    // -- token helpers --------------------------------------------------

    fn bump(&mut self) -> Token {
        std::mem::replace(&mut self.current, self.lexer.next_token())
    }

    fn at_punct(&self, p: Punct) -> bool {
        self.current.as_punct() == Some(p)
    }

    fn eat_punct(&mut self, p: Punct) -> bool {
        if self.at_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: Punct) -> PResult<()> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            self.error_at(format!(
                "expected '{}', found '{}'",
                p.as_str(),
                self.current.text
            ));
            Err(())
        }
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.current.as_keyword() == Some(kw)
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: Keyword, name: &str) -> PResult<()> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            self.error_at(format!("expected '{name}', found '{}'", self.current.text));
            Err(())
        }
    }

    /// Matches the current token's text case-insensitively against a
    /// contextual keyword (`data=`, `out=`, `var`, `sort`, …) without those
    /// words being globally reserved — so an ordinary dataset or variable
    /// named e.g. `out` still lexes as a plain identifier everywhere else.
    fn at_word(&self, word: &str) -> bool {
        match &self.current.kind {
            TokenKind::Identifier(s) => s.eq_ignore_ascii_case(word),
            TokenKind::Keyword(_) => self.current.text.eq_ignore_ascii_case(word),
            _ => false,
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_identifier(&mut self) -> PResult<String> {
        if let TokenKind::Identifier(s) = &self.current.kind {
            let s = s.clone();
            self.bump();
            Ok(s)
        } else {
            self.error_at(format!("expected identifier, found '{}'", self.current.text));
            Err(())
        }
    }

    fn expect_number(&mut self) -> PResult<f64> {
        if let TokenKind::Number(n) = self.current.kind {
            self.bump();
            Ok(n)
        } else {
            self.error_at(format!("expected a number, found '{}'", self.current.text));
            Err(())
        }
    }

    fn expect_string(&mut self) -> PResult<String> {
        if let TokenKind::String(s) = &self.current.kind {
            let s = s.clone();
            self.bump();
            Ok(s)
        } else {
            self.error_at(format!(
                "expected a quoted string, found '{}'",
                self.current.text
            ));
            Err(())
        }
    }

    fn error_at(&mut self, text: impl Into<String>) {
        let point = Point::new(self.current.line, self.current.col);
        self.diagnostics
            .push(Diagnostic::error(Location::at(point), text));
    }

    /// Skips to the next `;` (consumed) or, failing that, stops right before
    /// a `run` keyword or end of input so the enclosing step's terminator is
    /// left for the caller to see.
    fn synchronize(&mut self) {
        loop {
            if self.current.is_eof() || self.at_keyword(Keyword::Run) {
                return;
            }
            if self.at_punct(Punct::Semicolon) {
                self.bump();
                return;
            }
            self.bump();
        }
    }

    /// Top-level recovery has no enclosing `run;` to preserve, so unlike
    /// [Self::synchronize] it always discards at least the offending token
    /// before hunting for the next `;`.
    fn synchronize_top_level(&mut self) {
        if self.current.is_eof() {
            return;
        }
        self.bump();
        while !self.current.is_eof() && !self.at_punct(Punct::Semicolon) {
            self.bump();
        }
        self.eat_punct(Punct::Semicolon);
    }

    // -- names ------------------------------------------------------------

    /// A dataset name, optionally `libref.name`.
    fn parse_dataset_name(&mut self) -> PResult<String> {
        let mut name = self.expect_identifier()?;
        if self.eat_punct(Punct::Dot) {
            let rest = self.expect_identifier()?;
            name = format!("{name}.{rest}");
        }
        Ok(name)
    }

    fn parse_dataset_name_list(&mut self) -> PResult<Vec<String>> {
        let mut names = Vec::new();
        while matches!(self.current.kind, TokenKind::Identifier(_)) {
            names.push(self.parse_dataset_name()?);
        }
        if names.is_empty() {
            self.error_at("expected a dataset name");
            return Err(());
        }
        Ok(names)
    }

    fn parse_name_list(&mut self) -> PResult<Vec<String>> {
        let mut names = Vec::new();
        while matches!(self.current.kind, TokenKind::Identifier(_)) {
            names.push(self.expect_identifier()?);
        }
        if names.is_empty() {
            self.error_at("expected a variable name");
            return Err(());
        }
        Ok(names)
    }

    /// `name` or `name(opt=value, ...)`; only `obs=` is meaningful today, the
    /// rest is consumed and discarded.
    fn parse_dataset_ref(&mut self) -> PResult<(String, Option<usize>)> {
        let name = self.parse_dataset_name()?;
        let mut obs_limit = None;
        if self.eat_punct(Punct::LParen) {
            loop {
                if self.eat_punct(Punct::RParen) {
                    break;
                }
                if self.current.is_eof() {
                    self.error_at("unterminated dataset option list");
                    return Err(());
                }
                if self.eat_word("obs") {
                    self.expect_punct(Punct::Equals)?;
                    obs_limit = Some(self.expect_number()? as usize);
                } else {
                    self.bump();
                }
            }
        }
        Ok((name, obs_limit))
    }

    // -- top level ----------------------------------------------------------

    fn parse_top_level_statement(&mut self) -> PResult<Statement> {
        if self.at_keyword(Keyword::Data) {
            self.parse_data_step()
        } else if self.at_keyword(Keyword::Proc) {
            self.parse_proc()
        } else if self.at_keyword(Keyword::Libname) {
            self.parse_libname()
        } else if self.at_keyword(Keyword::Options) {
            self.parse_options()
        } else if self.at_keyword(Keyword::Title) {
            self.parse_title()
        } else {
            self.error_at(format!(
                "unexpected token '{}' at top level",
                self.current.text
            ));
            Err(())
        }
    }

    fn parse_options(&mut self) -> PResult<Statement> {
        self.bump(); // 'options'
        let mut pairs = Vec::new();
        loop {
            if self.eat_punct(Punct::Semicolon) {
                break;
            }
            if self.current.is_eof() {
                self.error_at("unexpected end of input in options statement");
                return Err(());
            }
            let key = self.expect_identifier()?;
            self.expect_punct(Punct::Equals)?;
            let value = self.parse_option_value()?;
            pairs.push((key, value));
        }
        Ok(Statement::Options(pairs))
    }

    fn parse_option_value(&mut self) -> PResult<String> {
        match self.current.kind.clone() {
            TokenKind::Identifier(s) => {
                self.bump();
                Ok(s)
            }
            TokenKind::Keyword(_) => {
                let s = self.current.text.clone();
                self.bump();
                Ok(s)
            }
            TokenKind::Number(n) => {
                self.bump();
                Ok(crate::value::format_number(n))
            }
            TokenKind::String(s) => {
                self.bump();
                Ok(s)
            }
            _ => {
                self.error_at("expected an option value");
                Err(())
            }
        }
    }

    fn parse_libname(&mut self) -> PResult<Statement> {
        self.bump(); // 'libname'
        let libref = self.expect_identifier()?;
        let path = self.expect_string()?;
        self.expect_punct(Punct::Semicolon)?;
        Ok(Statement::Libname { libref, path })
    }

    fn parse_title(&mut self) -> PResult<Statement> {
        self.bump(); // 'title'
        let text = self.expect_string()?;
        self.expect_punct(Punct::Semicolon)?;
        Ok(Statement::Title(text))
    }

    // -- DATA step ------------------------------------------------------------

    fn parse_data_step(&mut self) -> PResult<Statement> {
        self.bump(); // 'data'
        let output_dataset = self.parse_dataset_name()?;
        self.expect_punct(Punct::Semicolon)?;
        let mut body = Vec::new();
        loop {
            if self.eat_keyword(Keyword::Run) {
                self.eat_punct(Punct::Semicolon);
                break;
            }
            if self.current.is_eof() {
                self.error_at("unexpected end of input inside data step");
                return Err(());
            }
            match self.parse_data_statement() {
                Ok(stmt) => body.push(stmt),
                Err(()) => self.synchronize(),
            }
        }
        Ok(Statement::DataStep(DataStep {
            output_dataset,
            body,
        }))
    }

    fn parse_data_statement(&mut self) -> PResult<DataStatement> {
        if self.at_keyword(Keyword::If) {
            self.parse_if()
        } else if self.at_keyword(Keyword::Do) {
            Ok(DataStatement::DoLoop(self.parse_do()?))
        } else if self.eat_keyword(Keyword::Output) {
            // An explicit output dataset name is accepted and ignored; the
            // interpreter always targets the step's own output dataset.
            if matches!(self.current.kind, TokenKind::Identifier(_)) {
                self.bump();
            }
            self.expect_punct(Punct::Semicolon)?;
            Ok(DataStatement::Output)
        } else if self.eat_keyword(Keyword::Drop) {
            let vars = self.parse_name_list()?;
            self.expect_punct(Punct::Semicolon)?;
            Ok(DataStatement::Drop(vars))
        } else if self.eat_keyword(Keyword::Keep) {
            let vars = self.parse_name_list()?;
            self.expect_punct(Punct::Semicolon)?;
            Ok(DataStatement::Keep(vars))
        } else if self.eat_keyword(Keyword::Retain) {
            self.parse_retain()
        } else if self.eat_keyword(Keyword::Array) {
            self.parse_array()
        } else if self.eat_keyword(Keyword::Set) {
            let sets = self.parse_dataset_name_list()?;
            self.expect_punct(Punct::Semicolon)?;
            Ok(DataStatement::Set(sets))
        } else if self.eat_keyword(Keyword::Merge) {
            let sets = self.parse_dataset_name_list()?;
            self.expect_punct(Punct::Semicolon)?;
            Ok(DataStatement::Merge(sets))
        } else if self.eat_keyword(Keyword::By) {
            let vars = self.parse_name_list()?;
            self.expect_punct(Punct::Semicolon)?;
            Ok(DataStatement::By(vars))
        } else if self.eat_keyword(Keyword::Input) {
            self.parse_input()
        } else if self.eat_keyword(Keyword::Datalines) {
            self.expect_punct(Punct::Semicolon)?;
            let lines = self.lexer.read_datalines();
            self.current = self.lexer.next_token();
            Ok(DataStatement::Datalines(lines))
        } else if self.eat_keyword(Keyword::Where) {
            let expr = self.parse_expr()?;
            self.expect_punct(Punct::Semicolon)?;
            Ok(DataStatement::Where(expr))
        } else if let TokenKind::Identifier(name) = self.current.kind.clone() {
            self.bump();
            if self.eat_punct(Punct::LBracket) {
                let index = self.parse_expr()?;
                self.expect_punct(Punct::RBracket)?;
                self.expect_punct(Punct::Equals)?;
                let expr = self.parse_expr()?;
                self.expect_punct(Punct::Semicolon)?;
                return Ok(DataStatement::ArrayAssignment {
                    array: name,
                    index,
                    expr,
                });
            }
            self.expect_punct(Punct::Equals)?;
            let expr = self.parse_expr()?;
            self.expect_punct(Punct::Semicolon)?;
            Ok(DataStatement::Assignment { var: name, expr })
        } else {
            self.error_at(format!(
                "unexpected token '{}' in data step",
                self.current.text
            ));
            Err(())
        }
    }

    fn parse_if(&mut self) -> PResult<DataStatement> {
        self.bump(); // 'if'
        let condition = self.parse_expr()?;
        if self.eat_keyword(Keyword::Then) {
            let then_body = self.parse_single_or_block()?;
            let mut else_ifs = Vec::new();
            let mut else_body = None;
            loop {
                if !self.eat_keyword(Keyword::Else) {
                    break;
                }
                if self.eat_keyword(Keyword::If) {
                    let econd = self.parse_expr()?;
                    self.expect_keyword(Keyword::Then, "then")?;
                    let ebody = self.parse_single_or_block()?;
                    else_ifs.push((econd, ebody));
                } else {
                    else_body = Some(self.parse_single_or_block()?);
                    break;
                }
            }
            Ok(DataStatement::IfThenElse {
                condition,
                then_body,
                else_ifs,
                else_body,
            })
        } else {
            self.expect_punct(Punct::Semicolon)?;
            Ok(DataStatement::SubsettingIf(condition))
        }
    }

    fn parse_single_or_block(&mut self) -> PResult<Vec<DataStatement>> {
        if self.at_keyword(Keyword::Do) {
            Ok(vec![DataStatement::DoLoop(self.parse_do()?)])
        } else {
            Ok(vec![self.parse_data_statement()?])
        }
    }

    fn parse_do(&mut self) -> PResult<DoLoop> {
        self.bump(); // 'do'
        if self.eat_keyword(Keyword::While) {
            self.expect_punct(Punct::LParen)?;
            let cond = self.parse_expr()?;
            self.expect_punct(Punct::RParen)?;
            self.expect_punct(Punct::Semicolon)?;
            let body = self.parse_statements_until_end()?;
            self.expect_keyword(Keyword::End, "end")?;
            self.expect_punct(Punct::Semicolon)?;
            return Ok(DoLoop {
                kind: DoKind::While(cond),
                body,
            });
        }
        if self.eat_keyword(Keyword::Until) {
            self.expect_punct(Punct::LParen)?;
            let cond = self.parse_expr()?;
            self.expect_punct(Punct::RParen)?;
            self.expect_punct(Punct::Semicolon)?;
            let body = self.parse_statements_until_end()?;
            self.expect_keyword(Keyword::End, "end")?;
            self.expect_punct(Punct::Semicolon)?;
            return Ok(DoLoop {
                kind: DoKind::Until(cond),
                body,
            });
        }
        if self.eat_punct(Punct::Semicolon) {
            let body = self.parse_statements_until_end()?;
            self.expect_keyword(Keyword::End, "end")?;
            self.expect_punct(Punct::Semicolon)?;
            return Ok(DoLoop {
                kind: DoKind::Block,
                body,
            });
        }
        let var = self.expect_identifier()?;
        self.expect_punct(Punct::Equals)?;
        let start = self.parse_expr()?;
        self.expect_keyword(Keyword::To, "to")?;
        let end = self.parse_expr()?;
        let by = if self.eat_keyword(Keyword::By) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect_punct(Punct::Semicolon)?;
        let body = self.parse_statements_until_end()?;
        self.expect_keyword(Keyword::End, "end")?;
        self.expect_punct(Punct::Semicolon)?;
        Ok(DoLoop {
            kind: DoKind::Iterative {
                var,
                start,
                end,
                by,
            },
            body,
        })
    }

    fn parse_statements_until_end(&mut self) -> PResult<Vec<DataStatement>> {
        let mut body = Vec::new();
        loop {
            if self.at_keyword(Keyword::End) || self.current.is_eof() {
                break;
            }
            match self.parse_data_statement() {
                Ok(stmt) => body.push(stmt),
                Err(()) => self.synchronize(),
            }
        }
        Ok(body)
    }

    fn parse_retain(&mut self) -> PResult<DataStatement> {
        let mut vars = Vec::new();
        while matches!(self.current.kind, TokenKind::Identifier(_)) {
            vars.push(self.expect_identifier()?);
        }
        if vars.is_empty() {
            self.error_at("retain requires at least one variable");
            return Err(());
        }
        let initial = match self.current.kind.clone() {
            TokenKind::Number(n) => {
                self.bump();
                Some(Value::Number(n))
            }
            TokenKind::String(s) => {
                self.bump();
                Some(Value::String(s))
            }
            _ => None,
        };
        self.expect_punct(Punct::Semicolon)?;
        Ok(DataStatement::Retain { vars, initial })
    }

    fn parse_array(&mut self) -> PResult<DataStatement> {
        let name = self.expect_identifier()?;
        let mut size = None;
        if self.eat_punct(Punct::LBracket) {
            size = Some(self.expect_number()? as usize);
            self.expect_punct(Punct::RBracket)?;
        }
        let vars = self.parse_name_list()?;
        let size = size.unwrap_or(vars.len());
        self.expect_punct(Punct::Semicolon)?;
        Ok(DataStatement::Array { name, size, vars })
    }

    fn parse_input(&mut self) -> PResult<DataStatement> {
        let mut vars = Vec::new();
        while matches!(self.current.kind, TokenKind::Identifier(_)) {
            let name = self.expect_identifier()?;
            let is_char = self.eat_punct(Punct::Dollar);
            vars.push((name, is_char));
        }
        if vars.is_empty() {
            self.error_at("input requires at least one variable");
            return Err(());
        }
        self.expect_punct(Punct::Semicolon)?;
        Ok(DataStatement::Input(vars))
    }

    // -- PROC steps -----------------------------------------------------------

    fn parse_proc(&mut self) -> PResult<Statement> {
        self.bump(); // 'proc'
        if self.eat_word("sort") {
            self.parse_proc_sort()
        } else if self.eat_word("print") {
            self.parse_proc_print()
        } else if self.eat_word("means") {
            self.parse_proc_means()
        } else if self.eat_word("freq") {
            self.parse_proc_freq()
        } else {
            self.error_at(format!("unknown procedure '{}'", self.current.text));
            Err(())
        }
    }

    fn parse_proc_sort(&mut self) -> PResult<Statement> {
        let mut input = None;
        let mut output = None;
        let mut nodupkey = false;
        loop {
            if self.at_punct(Punct::Semicolon) {
                break;
            }
            if self.eat_word("data") {
                self.expect_punct(Punct::Equals)?;
                input = Some(self.parse_dataset_name()?);
            } else if self.eat_word("out") {
                self.expect_punct(Punct::Equals)?;
                output = Some(self.parse_dataset_name()?);
            } else if self.eat_word("nodupkey") {
                nodupkey = true;
            } else {
                self.error_at(format!(
                    "unexpected token '{}' in proc sort options",
                    self.current.text
                ));
                return Err(());
            }
        }
        self.expect_punct(Punct::Semicolon)?;
        let mut by = Vec::new();
        let mut where_clause = None;
        loop {
            if self.eat_keyword(Keyword::By) {
                by = self.parse_name_list()?;
                self.expect_punct(Punct::Semicolon)?;
            } else if self.eat_keyword(Keyword::Where) {
                where_clause = Some(self.parse_expr()?);
                self.expect_punct(Punct::Semicolon)?;
            } else if self.eat_word("nodupkey") {
                nodupkey = true;
                self.expect_punct(Punct::Semicolon)?;
            } else if self.eat_keyword(Keyword::Run) {
                self.eat_punct(Punct::Semicolon);
                break;
            } else if self.current.is_eof() {
                self.error_at("unexpected end of input in proc sort");
                return Err(());
            } else {
                self.error_at(format!(
                    "unexpected token '{}' in proc sort",
                    self.current.text
                ));
                return Err(());
            }
        }
        let input = input.ok_or(()).inspect_err(|_| {
            let point = Point::new(self.current.line, self.current.col);
            self.diagnostics
                .push(Diagnostic::error(Location::at(point), "proc sort requires data="));
        })?;
        Ok(Statement::Proc(Proc::Sort(ProcSort {
            input,
            output,
            by,
            nodupkey,
            where_clause,
        })))
    }

    fn parse_proc_print(&mut self) -> PResult<Statement> {
        let mut dataset = None;
        let mut obs_limit = None;
        let mut noobs = false;
        loop {
            if self.at_punct(Punct::Semicolon) {
                break;
            }
            if self.eat_word("data") {
                self.expect_punct(Punct::Equals)?;
                let (name, obs) = self.parse_dataset_ref()?;
                dataset = Some(name);
                obs_limit = obs;
            } else if self.eat_word("noobs") {
                noobs = true;
            } else {
                self.error_at(format!(
                    "unexpected token '{}' in proc print options",
                    self.current.text
                ));
                return Err(());
            }
        }
        self.expect_punct(Punct::Semicolon)?;
        let mut vars = None;
        loop {
            if self.eat_word("var") {
                vars = Some(self.parse_name_list()?);
                self.expect_punct(Punct::Semicolon)?;
            } else if self.eat_word("noobs") {
                noobs = true;
                self.expect_punct(Punct::Semicolon)?;
            } else if self.eat_keyword(Keyword::Run) {
                self.eat_punct(Punct::Semicolon);
                break;
            } else if self.current.is_eof() {
                self.error_at("unexpected end of input in proc print");
                return Err(());
            } else {
                self.error_at(format!(
                    "unexpected token '{}' in proc print",
                    self.current.text
                ));
                return Err(());
            }
        }
        let dataset = dataset.ok_or(()).inspect_err(|_| {
            let point = Point::new(self.current.line, self.current.col);
            self.diagnostics
                .push(Diagnostic::error(Location::at(point), "proc print requires data="));
        })?;
        Ok(Statement::Proc(Proc::Print(ProcPrint {
            dataset,
            obs_limit,
            vars,
            noobs,
        })))
    }

    fn parse_proc_means(&mut self) -> PResult<Statement> {
        let mut dataset = None;
        loop {
            if self.at_punct(Punct::Semicolon) {
                break;
            }
            if self.eat_word("data") {
                self.expect_punct(Punct::Equals)?;
                dataset = Some(self.parse_dataset_name()?);
            } else {
                self.error_at(format!(
                    "unexpected token '{}' in proc means options",
                    self.current.text
                ));
                return Err(());
            }
        }
        self.expect_punct(Punct::Semicolon)?;
        let mut vars = None;
        loop {
            if self.eat_word("var") {
                vars = Some(self.parse_name_list()?);
                self.expect_punct(Punct::Semicolon)?;
            } else if self.eat_keyword(Keyword::Run) {
                self.eat_punct(Punct::Semicolon);
                break;
            } else if self.current.is_eof() {
                self.error_at("unexpected end of input in proc means");
                return Err(());
            } else {
                self.error_at(format!(
                    "unexpected token '{}' in proc means",
                    self.current.text
                ));
                return Err(());
            }
        }
        let dataset = dataset.ok_or(()).inspect_err(|_| {
            let point = Point::new(self.current.line, self.current.col);
            self.diagnostics
                .push(Diagnostic::error(Location::at(point), "proc means requires data="));
        })?;
        Ok(Statement::Proc(Proc::Means(ProcMeans { dataset, vars })))
    }

    fn parse_proc_freq(&mut self) -> PResult<Statement> {
        let mut dataset = None;
        loop {
            if self.at_punct(Punct::Semicolon) {
                break;
            }
            if self.eat_word("data") {
                self.expect_punct(Punct::Equals)?;
                dataset = Some(self.parse_dataset_name()?);
            } else {
                self.error_at(format!(
                    "unexpected token '{}' in proc freq options",
                    self.current.text
                ));
                return Err(());
            }
        }
        self.expect_punct(Punct::Semicolon)?;
        let mut tables = Vec::new();
        loop {
            if self.eat_word("tables") {
                let mut more = self.parse_name_list()?;
                tables.append(&mut more);
                self.expect_punct(Punct::Semicolon)?;
            } else if self.eat_keyword(Keyword::Run) {
                self.eat_punct(Punct::Semicolon);
                break;
            } else if self.current.is_eof() {
                self.error_at("unexpected end of input in proc freq");
                return Err(());
            } else {
                self.error_at(format!(
                    "unexpected token '{}' in proc freq",
                    self.current.text
                ));
                return Err(());
            }
        }
        let dataset = dataset.ok_or(()).inspect_err(|_| {
            let point = Point::new(self.current.line, self.current.col);
            self.diagnostics
                .push(Diagnostic::error(Location::at(point), "proc freq requires data="));
        })?;
        Ok(Statement::Proc(Proc::Freq(ProcFreq { dataset, tables })))
    }

    // -- expressions ------------------------------------------------------

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat_keyword(Keyword::Or) || self.eat_punct(Punct::Pipe) {
            let right = self.parse_and()?;
            left = Expr::BinaryOp(BinOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat_keyword(Keyword::And) || self.eat_punct(Punct::Amp) {
            let right = self.parse_equality()?;
            left = Expr::BinaryOp(BinOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = if self.eat_punct(Punct::EqEq) {
                BinOp::Eq
            } else if self.eat_punct(Punct::NotEq) {
                BinOp::Ne
            } else {
                break;
            };
            let right = self.parse_relational()?;
            left = Expr::BinaryOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> PResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = if self.eat_punct(Punct::Le) {
                BinOp::Le
            } else if self.eat_punct(Punct::Ge) {
                BinOp::Ge
            } else if self.eat_punct(Punct::Lt) {
                BinOp::Lt
            } else if self.eat_punct(Punct::Gt) {
                BinOp::Gt
            } else {
                break;
            };
            let right = self.parse_additive()?;
            left = Expr::BinaryOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = if self.eat_punct(Punct::Plus) {
                BinOp::Add
            } else if self.eat_punct(Punct::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = if self.eat_punct(Punct::Star) {
                BinOp::Mul
            } else if self.eat_punct(Punct::Slash) {
                BinOp::Div
            } else {
                break;
            };
            let right = self.parse_unary()?;
            left = Expr::BinaryOp(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        if self.eat_punct(Punct::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp(UnOp::Neg, Box::new(operand)));
        }
        if self.eat_keyword(Keyword::Not) {
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp(UnOp::Not, Box::new(operand)));
        }
        self.parse_power()
    }

    /// Right-associative: the exponent is parsed through [Self::parse_unary]
    /// so a chain like `2 ** 2 ** 3` recurses into further `parse_power`
    /// calls rather than binding left-to-right.
    fn parse_power(&mut self) -> PResult<Expr> {
        let base = self.parse_primary()?;
        if self.eat_punct(Punct::Power) {
            let exponent = self.parse_unary()?;
            return Ok(Expr::BinaryOp(BinOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        match self.current.kind.clone() {
            TokenKind::Number(n) => {
                self.bump();
                Ok(Expr::Number(n))
            }
            TokenKind::String(s) => {
                self.bump();
                Ok(Expr::String(s))
            }
            TokenKind::Punct(Punct::LParen) => {
                self.bump();
                let inner = self.parse_expr()?;
                self.expect_punct(Punct::RParen)?;
                Ok(inner)
            }
            TokenKind::Identifier(name) => {
                self.bump();
                if self.eat_punct(Punct::LParen) {
                    let mut args = Vec::new();
                    if !self.at_punct(Punct::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.eat_punct(Punct::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect_punct(Punct::RParen)?;
                    Ok(Expr::FunctionCall(name, args))
                } else if self.eat_punct(Punct::LBracket) {
                    let index = self.parse_expr()?;
                    self.expect_punct(Punct::RBracket)?;
                    Ok(Expr::ArrayElement(name, Box::new(index)))
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            _ => {
                self.error_at(format!(
                    "expected expression, found '{}'",
                    self.current.text
                ));
                Err(())
            }
        }
    }
}
