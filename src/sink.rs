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

//! Injected log/listing sinks.
//!
//! The interpreter never writes to stdout/stderr itself; it hands lines to
//! whatever [LogSink]/[ListingSink] the caller supplied, which is how the
//! CLI front end wires files in batch mode and the test suite captures
//! output in memory.

use std::{
    any::Any,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::message::Diagnostic;

/// Append-only diagnostic stream: a line-oriented sink with levels
/// {info, warn, error}.
pub trait LogSink {
    fn log(&mut self, diagnostic: Diagnostic);
}

/// Append-only tabular output stream.
///
/// Extends `Any` so callers holding a `Box<dyn ListingSink>` (the
/// `Interpreter`'s own storage) can downcast back to a concrete sink, which
/// is how tests recover the captured lines from a [VecListingSink].
pub trait ListingSink: Any {
    fn write_line(&mut self, line: String);
    fn as_any(&self) -> &dyn Any;
}

/// Captures log lines in memory; used by tests and available to the CLI for
/// `-log=` when the destination cannot be opened directly.
#[derive(Default)]
pub struct VecLogSink(pub Vec<Diagnostic>);

impl LogSink for VecLogSink {
    fn log(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }
}

/// Captures listing lines in memory.
#[derive(Default)]
pub struct VecListingSink(pub Vec<String>);

impl ListingSink for VecListingSink {
    fn write_line(&mut self, line: String) {
        self.0.push(line);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Writes log lines to stderr, in the manner of interactive mode: absence
/// of all file destinations selects interactive mode with console sinks.
pub struct StderrLogSink;

impl LogSink for StderrLogSink {
    fn log(&mut self, diagnostic: Diagnostic) {
        eprintln!("{diagnostic}");
    }
}

/// Writes listing lines to stdout.
pub struct StdoutListingSink;

impl ListingSink for StdoutListingSink {
    fn write_line(&mut self, line: String) {
        println!("{line}");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Appends log lines to a file, for batch mode's `-log=PATH`.
pub struct FileLogSink(BufWriter<File>);

impl FileLogSink {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self(BufWriter::new(File::create(path)?)))
    }
}

impl LogSink for FileLogSink {
    fn log(&mut self, diagnostic: Diagnostic) {
        let _ = writeln!(self.0, "{diagnostic}");
    }
}

/// Appends listing lines to a file, for batch mode's `-lst=PATH`.
pub struct FileListingSink(BufWriter<File>);

impl FileListingSink {
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self(BufWriter::new(File::create(path)?)))
    }
}

impl ListingSink for FileListingSink {
    fn write_line(&mut self, line: String) {
        let _ = writeln!(self.0, "{line}");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
