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

//! Process-wide tunables.
//!
//! Threaded explicitly through [crate::engine::Engine]/[crate::interp::Interpreter]
//! rather than read from statics, except for the `global()` fallback used by
//! the CLI entry point.

use std::sync::OnceLock;

/// Tunables that would otherwise be scattered as literal constants.
#[derive(Copy, Clone, Debug)]
pub struct Settings {
    /// Safety cap on iterations of a single DO-loop invocation: a loop that
    /// runs past this many iterations aborts with a runtime error.
    pub max_loop_iterations: u64,

    /// Decimal places used when a PROC MEANS/PROC FREQ table doesn't specify
    /// its own formatting.
    pub default_decimals: usize,

    /// Whether PROC PRINT echoes the current TITLE above its table.
    pub print_titles: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_loop_iterations: 1_000_000,
            default_decimals: 2,
            print_titles: true,
        }
    }
}

impl Settings {
    pub fn global() -> &'static Settings {
        static GLOBAL: OnceLock<Settings> = OnceLock::new();
        GLOBAL.get_or_init(Settings::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_loop_cap_is_one_million() {
        let settings = Settings::default();
        assert_eq!(settings.max_loop_iterations, 1_000_000);
    }
}
