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

//! Diagnostic model shared by the lexer, parser, and interpreter.
//!
//! A [Diagnostic] carries a [Severity], a source [Location], and a message;
//! it is handed to a [crate::sink::LogSink] rather than printed directly, so
//! the destination (memory, stderr, a file) is the caller's choice rather
//! than a global logger.

use std::fmt::{Display, Formatter, Result as FmtResult};

use enum_map::Enum;
use thiserror::Error;

/// A 1-based line and column within the source text.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point {
    pub line: u32,
    pub col: u32,
}

impl Point {
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}", self.line, self.col)
    }
}

/// Source location of a diagnostic, or nothing for diagnostics that aren't
/// anchored to a specific position (e.g. a step-timer note).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Location(pub Option<Point>);

impl Location {
    pub const fn none() -> Self {
        Self(None)
    }

    pub const fn at(point: Point) -> Self {
        Self(Some(point))
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.0 {
            Some(point) => write!(f, "{point}"),
            None => Ok(()),
        }
    }
}

/// Diagnostic severity: "ERROR:"/"WARNING:" prefixes, plus an informational
/// `Note` level for step-completion banners and timer lines.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Enum)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    pub fn prefix(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Note => "NOTE",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.prefix())
    }
}

/// Error-kind categorization carried on a [Diagnostic] so callers that care
/// (tests checking recovery behavior, a future richer log format) can
/// distinguish e.g. a `RangeError` abort from an `UndefinedName`
/// substitution without parsing the message text.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("lex error")]
    Lex,
    #[error("parse error")]
    Parse,
    #[error("undefined name")]
    UndefinedName,
    #[error("type error")]
    Type,
    #[error("arithmetic error")]
    Arith,
    #[error("range error")]
    Range,
    #[error("runtime fatal error")]
    RuntimeFatal,
}

/// One diagnostic line headed for the log sink.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: Location,
    pub text: String,
    /// `None` for diagnostics that don't name one of the error kinds above
    /// (step-timer notes, step-completion banners).
    pub kind: Option<ErrorKind>,
}

impl Diagnostic {
    pub fn error(location: Location, text: impl Into<String>) -> Self {
        Self::error_kind(None, location, text)
    }

    pub fn error_kind(kind: Option<ErrorKind>, location: Location, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            location,
            text: text.into(),
            kind,
        }
    }

    pub fn warning(location: Location, text: impl Into<String>) -> Self {
        Self::warning_kind(None, location, text)
    }

    pub fn warning_kind(kind: Option<ErrorKind>, location: Location, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            location,
            text: text.into(),
            kind,
        }
    }

    pub fn note(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            location: Location::none(),
            text: text.into(),
            kind: None,
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: ", self.severity)?;
        if self.location.0.is_some() {
            write!(f, "({}) ", self.location)?;
        }
        write!(f, "{}", self.text)
    }
}
