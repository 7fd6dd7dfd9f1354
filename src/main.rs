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

//! CLI front end. Not part of the core pipeline under test: it only reads
//! source text, wires up the log/listing sinks `execute_program` expects,
//! and maps [sas::engine::ExitStatus] to a process exit code.

use std::{fs, io::Read, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;

use sas::{
    engine::execute_program,
    sink::{FileListingSink, FileLogSink, ListingSink, LogSink, StderrLogSink, StdoutListingSink},
};

/// An interpreter for a subset of the SAS data-analysis language.
///
/// Batch mode is selected by giving all three of `--sas`, `--log`, and
/// `--lst`; omitting all three selects interactive mode, which reads the
/// program from standard input and writes the log/listing to the console.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SAS program to execute.
    #[arg(long = "sas", value_name = "PATH")]
    sas: Option<PathBuf>,

    /// Path the diagnostic log is written to.
    #[arg(long = "log", value_name = "PATH")]
    log: Option<PathBuf>,

    /// Path the listing (tabular output) is written to.
    #[arg(long = "lst", value_name = "PATH")]
    lst: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let batch = cli.sas.is_some() && cli.log.is_some() && cli.lst.is_some();

    let source = match &cli.sas {
        Some(path) => fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading program from standard input")?;
            buf
        }
    };

    let (log, listing): (Box<dyn LogSink>, Box<dyn ListingSink>) = if batch {
        let log = FileLogSink::create(cli.log.as_ref().unwrap())
            .with_context(|| format!("opening {}", cli.log.as_ref().unwrap().display()))?;
        let listing = FileListingSink::create(cli.lst.as_ref().unwrap())
            .with_context(|| format!("opening {}", cli.lst.as_ref().unwrap().display()))?;
        (Box::new(log), Box::new(listing))
    } else {
        (Box::new(StderrLogSink), Box::new(StdoutListingSink))
    };

    let (_interp, status) = execute_program(&source, log, listing);
    Ok(ExitCode::from(status.code() as u8))
}
