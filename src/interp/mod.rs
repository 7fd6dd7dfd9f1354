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

//! Interpreter: evaluates the AST against the catalog and a per-step PDV,
//! and dispatches PROC steps.
//!
//! Walks a statement stream and hands each one to a per-kind handler for
//! DATA/PROC/OPTIONS/LIBNAME/TITLE statements.

pub mod data_step;
pub mod expr;
pub mod merge;
pub mod proc_freq;
pub mod proc_means;
pub mod proc_print;
pub mod proc_sort;
pub mod sort;

use std::collections::HashMap;

use enum_map::EnumMap;

use crate::{
    ast::{Expr, Program, Proc, Statement},
    catalog::{Catalog, ColumnMeta, Dataset, LibraryAccess, Row},
    identifier,
    message::{Diagnostic, Location, Severity},
    pdv::Pdv,
    settings::Settings,
    sink::{ListingSink, LogSink},
    timer::StepTimer,
};

/// Owns the catalog and the two output sinks for one program run, the state
/// `execute_program`/`catalog()` expose to callers.
pub struct Interpreter {
    catalog: Catalog,
    title: Option<String>,
    settings: Settings,
    log: Box<dyn LogSink>,
    listing: Box<dyn ListingSink>,
    counts: EnumMap<Severity, usize>,
}

impl Interpreter {
    pub fn new(log: Box<dyn LogSink>, listing: Box<dyn ListingSink>) -> Self {
        Self {
            catalog: Catalog::new(),
            title: None,
            settings: *Settings::global(),
            log,
            listing,
            counts: EnumMap::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn counts(&self) -> EnumMap<Severity, usize> {
        self.counts
    }

    pub fn get_dataset_cloned(&self, name: &str) -> Option<Dataset> {
        self.catalog.get_dataset(name).cloned()
    }

    pub fn put_dataset(&mut self, name: &str, dataset: Dataset) {
        self.catalog.put_dataset(name, dataset);
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.counts[diagnostic.severity] += 1;
        self.log.log(diagnostic);
    }

    pub fn error(&mut self, location: Location, text: impl Into<String>) {
        self.report(Diagnostic::error(location, text));
    }

    pub fn error_kind(&mut self, kind: crate::message::ErrorKind, location: Location, text: impl Into<String>) {
        self.report(Diagnostic::error_kind(Some(kind), location, text));
    }

    pub fn warning(&mut self, location: Location, text: impl Into<String>) {
        self.report(Diagnostic::warning(location, text));
    }

    pub fn warning_kind(&mut self, kind: crate::message::ErrorKind, location: Location, text: impl Into<String>) {
        self.report(Diagnostic::warning_kind(Some(kind), location, text));
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.report(Diagnostic::note(text));
    }

    pub fn write_listing_line(&mut self, line: impl Into<String>) {
        self.listing.write_line(line.into());
    }

    /// Lines captured so far, for tests driven with a [crate::sink::VecListingSink].
    /// Returns `None` against any other sink (stdout, file).
    pub fn listing_lines(&self) -> Option<&[String]> {
        self.listing
            .as_any()
            .downcast_ref::<crate::sink::VecListingSink>()
            .map(|sink| sink.0.as_slice())
    }

    pub fn run_program(&mut self, program: &Program) {
        for statement in &program.statements {
            self.run_statement(statement);
        }
    }

    fn run_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::DataStep(step) => {
                let timer = StepTimer::start();
                let _ = data_step::run(self, step);
                for note in timer.finish() {
                    self.report(note);
                }
            }
            Statement::Proc(proc) => {
                let timer = StepTimer::start();
                let _ = match proc {
                    Proc::Sort(p) => proc_sort::run(self, p),
                    Proc::Print(p) => proc_print::run(self, p),
                    Proc::Means(p) => proc_means::run(self, p),
                    Proc::Freq(p) => proc_freq::run(self, p),
                };
                for note in timer.finish() {
                    self.report(note);
                }
            }
            Statement::Options(pairs) => {
                for (key, value) in pairs {
                    self.note(format!("option {key} = {value}"));
                }
            }
            Statement::Libname { libref, path } => {
                self.catalog.define_library(libref, path, LibraryAccess::ReadWrite);
                self.note(format!(
                    "Libref {} was successfully assigned as referring to {path}.",
                    libref.to_uppercase()
                ));
            }
            Statement::Title(text) => {
                self.title = Some(text.clone());
            }
        }
    }
}

/// Evaluates `expr` once per row of `rows`, keeping the rows it's truthy
/// for. Shared by PROC SORT's `WHERE=` and the DATA step's own `WHERE`
/// statement: a row is installed into a scratch PDV built from `columns` so
/// it can be evaluated like any other expression.
pub(crate) fn filter_rows(
    interp: &mut Interpreter,
    columns: &[ColumnMeta],
    rows: Vec<Row>,
    expr: &Expr,
) -> Result<Vec<Row>, ()> {
    let mut scratch = Dataset::new("WORK._SCRATCH");
    scratch.columns = columns.to_vec();
    let mut pdv = Pdv::new();
    let arrays: expr::ArrayTable = HashMap::new();
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        pdv.load_row(&scratch, &row);
        if expr::eval(interp, &pdv, &arrays, expr)?.is_truthy() {
            kept.push(row);
        }
    }
    Ok(kept)
}

/// Reads `row[name]` using `columns` for the typed-missing fallback: missing
/// columns read as typed-missing.
pub(crate) fn cell(row: &Row, columns: &[ColumnMeta], name: &str) -> crate::value::Value {
    row.get(&identifier::key(name)).cloned().unwrap_or_else(|| {
        let is_numeric = columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .is_none_or(|c| c.is_numeric);
        crate::value::Value::missing_default(is_numeric)
    })
}
