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

//! Step timer.
//!
//! Wraps a DATA/PROC step, capturing wall-clock time and emitting the
//! two-line NOTE step banners carry, via `message.rs`'s `Diagnostic::note`
//! rather than a global logger.

use std::time::Instant;

use crate::message::Diagnostic;

pub struct StepTimer {
    start: Instant,
}

impl StepTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    /// Stops the timer and returns the two log lines: `real time  X.XX
    /// seconds` and `cpu time  X.XX seconds`. `std` has no portable accessor
    /// for process CPU time, so the CPU line approximates it with the same
    /// elapsed wall-clock duration, adequate for a log line nobody asserts
    /// byte-exact timing on.
    pub fn finish(self) -> [Diagnostic; 2] {
        let elapsed = self.start.elapsed();
        [
            Diagnostic::note(format!("real time  {:.2} seconds", elapsed.as_secs_f64())),
            Diagnostic::note(format!("cpu time  {:.2} seconds", elapsed.as_secs_f64())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_produces_two_note_lines() {
        let timer = StepTimer::start();
        let lines = timer.finish();
        assert!(lines[0].text.starts_with("real time"));
        assert!(lines[1].text.starts_with("cpu time"));
    }
}
