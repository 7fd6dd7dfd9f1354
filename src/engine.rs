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

//! Program execution entry point.
//!
//! Wires the lexer/parser/interpreter pipeline together behind a single
//! `execute_program` call that drives a lex -> parse -> statement-dispatch
//! loop in one place.

use crate::{
    interp::Interpreter,
    message::{Location, Severity},
    parser,
    sink::{ListingSink, LogSink},
};

/// The process exit code assigned to each outcome: 0 clean, 1 any warning,
/// 2 any error, 3 a parse failure severe enough that nothing could be
/// interpreted at all.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Clean,
    Warning,
    Error,
    ParseFailure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::Warning => 1,
            ExitStatus::Error => 2,
            ExitStatus::ParseFailure => 3,
        }
    }
}

/// Parses and interprets `source` against a fresh catalog, returning the
/// interpreter (for `catalog()` access in tests and callers) and the
/// resulting [ExitStatus].
///
/// A parse that couldn't build any top-level statement out of non-blank
/// source is treated as catastrophic (status 3) and the program is not
/// interpreted at all; otherwise parse diagnostics are logged and
/// interpretation proceeds with whatever statements were recovered.
pub fn execute_program(
    source: &str,
    log: Box<dyn LogSink>,
    listing: Box<dyn ListingSink>,
) -> (Interpreter, ExitStatus) {
    let mut interp = Interpreter::new(log, listing);
    let (program, diagnostics) = parser::parse(source);

    let catastrophic = program.statements.is_empty() && !diagnostics.is_empty() && !source.trim().is_empty();

    for diagnostic in diagnostics {
        interp.report(diagnostic);
    }

    if catastrophic {
        interp.error(Location::none(), "no statements could be parsed from the program");
        return (interp, ExitStatus::ParseFailure);
    }

    interp.run_program(&program);

    let counts = interp.counts();
    let status = if counts[Severity::Error] > 0 {
        ExitStatus::Error
    } else if counts[Severity::Warning] > 0 {
        ExitStatus::Warning
    } else {
        ExitStatus::Clean
    };
    (interp, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{VecListingSink, VecLogSink};

    #[test]
    fn clean_run_exits_zero() {
        let (interp, status) = execute_program(
            "data a; a = 10; output; run;",
            Box::new(VecLogSink::default()),
            Box::new(VecListingSink::default()),
        );
        assert_eq!(status, ExitStatus::Clean);
        assert_eq!(status.code(), 0);
        assert!(interp.catalog().get_dataset("a").is_some());
    }

    #[test]
    fn undefined_dataset_reports_error_and_exits_two() {
        let (_interp, status) = execute_program(
            "data a; set does_not_exist; run;",
            Box::new(VecLogSink::default()),
            Box::new(VecListingSink::default()),
        );
        assert_eq!(status, ExitStatus::Error);
        assert_eq!(status.code(), 2);
    }

    #[test]
    fn garbage_input_is_catastrophic() {
        let (_interp, status) = execute_program(
            ";;; ### !!!",
            Box::new(VecLogSink::default()),
            Box::new(VecListingSink::default()),
        );
        assert_eq!(status, ExitStatus::ParseFailure);
        assert_eq!(status.code(), 3);
    }

    #[test]
    fn blank_input_is_clean() {
        let (_interp, status) = execute_program(
            "",
            Box::new(VecLogSink::default()),
            Box::new(VecListingSink::default()),
        );
        assert_eq!(status, ExitStatus::Clean);
    }
}
