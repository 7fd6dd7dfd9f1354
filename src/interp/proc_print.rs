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

//! PROC PRINT.
//!
//! Writes a dataset to the listing sink as a tab-separated header and rows,
//! each row prefixed by its observation number unless NOOBS is given.
//! Honors a current TITLE, printed as its own listing line first.

use unicode_width::UnicodeWidthStr;

use crate::ast::ProcPrint;
use crate::message::Location;

use super::Interpreter;

pub fn run(interp: &mut Interpreter, proc: &ProcPrint) -> Result<(), ()> {
    let Some(dataset) = interp.get_dataset_cloned(&proc.dataset) else {
        interp.error_kind(crate::message::ErrorKind::UndefinedName, Location::none(), format!("dataset {} does not exist", proc.dataset));
        return Err(());
    };

    if interp.settings().print_titles {
        if let Some(title) = interp.title() {
            interp.write_listing_line(title.to_string());
        }
    }

    let var_names: Vec<String> = match &proc.vars {
        Some(names) => names.clone(),
        None => dataset.column_names().into_iter().map(str::to_string).collect(),
    };
    let columns: Vec<_> = var_names
        .iter()
        .filter_map(|name| dataset.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
        .collect();

    let obs_width = dataset.rows.len().max(1).to_string().width();

    let mut header_cells: Vec<String> = Vec::new();
    if !proc.noobs {
        header_cells.push("Obs".to_string());
    }
    header_cells.extend(columns.iter().map(|c| c.name.clone()));
    interp.write_listing_line(header_cells.join("\t"));

    let limit = proc.obs_limit.unwrap_or(dataset.rows.len());
    for (i, row) in dataset.rows.iter().take(limit).enumerate() {
        let mut cells: Vec<String> = Vec::new();
        if !proc.noobs {
            cells.push(pad_obs(i + 1, obs_width));
        }
        for column in &columns {
            cells.push(dataset.cell(row, &column.name).to_display_string());
        }
        interp.write_listing_line(cells.join("\t"));
    }

    Ok(())
}

/// Right-aligns an observation number to `width` columns, the one place the
/// listing bothers with fixed-width alignment; listing output is otherwise
/// tab-separated, not column-padded.
fn pad_obs(n: usize, width: usize) -> String {
    let text = n.to_string();
    let pad = width.saturating_sub(text.width());
    format!("{}{}", " ".repeat(pad), text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, Dataset, Row};
    use crate::sink::{VecListingSink, VecLogSink};
    use crate::value::Value;
    use unicase::UniCase;

    fn interp() -> Interpreter {
        Interpreter::new(Box::new(VecLogSink::default()), Box::new(VecListingSink::default()))
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        let mut row = Row::new();
        for (k, v) in pairs {
            row.insert(UniCase::new(k.to_string()), v.clone());
        }
        row
    }

    #[test]
    fn header_and_rows_are_tab_separated() {
        let mut interp = interp();
        let mut a = Dataset::new("WORK.A");
        a.columns = vec![ColumnMeta::new("x", true), ColumnMeta::new("y", false)];
        a.rows = vec![row(&[("x", Value::number(1.0)), ("y", Value::string("hi"))])];
        interp.put_dataset("a", a);

        run(
            &mut interp,
            &ProcPrint {
                dataset: "a".to_string(),
                obs_limit: None,
                vars: None,
                noobs: false,
            },
        )
        .unwrap();

        let lines = interp.listing_lines().unwrap();
        assert_eq!(lines, ["Obs\tx\ty", "1\t1\thi"]);
    }

    #[test]
    fn noobs_suppresses_observation_column() {
        let mut interp = interp();
        let mut a = Dataset::new("WORK.A");
        a.columns = vec![ColumnMeta::new("x", true)];
        a.rows = vec![row(&[("x", Value::number(1.0))])];
        interp.put_dataset("a", a);

        run(
            &mut interp,
            &ProcPrint {
                dataset: "a".to_string(),
                obs_limit: None,
                vars: None,
                noobs: true,
            },
        )
        .unwrap();

        let lines = interp.listing_lines().unwrap();
        assert_eq!(lines, ["x", "1"]);
    }

    #[test]
    fn obs_limit_truncates_rows() {
        let mut interp = interp();
        let mut a = Dataset::new("WORK.A");
        a.columns = vec![ColumnMeta::new("x", true)];
        a.rows = vec![
            row(&[("x", Value::number(1.0))]),
            row(&[("x", Value::number(2.0))]),
            row(&[("x", Value::number(3.0))]),
        ];
        interp.put_dataset("a", a);

        run(
            &mut interp,
            &ProcPrint {
                dataset: "a".to_string(),
                obs_limit: Some(2),
                vars: None,
                noobs: false,
            },
        )
        .unwrap();

        let lines = interp.listing_lines().unwrap();
        assert_eq!(lines, ["Obs\tx", "1\t1", "2\t2"]);
    }
}
