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

//! PROC SORT.
//!
//! Reads an input dataset, optionally filters it by WHERE, sorts it stably
//! ascending by the BY variables, optionally dedups on the BY key, and
//! writes the result to OUT= (default: overwrite the input).

use crate::ast::ProcSort;
use crate::message::Location;

use super::sort::{dedup_by_key, stable_sort_rows};
use super::{filter_rows, Interpreter};

pub fn run(interp: &mut Interpreter, proc: &ProcSort) -> Result<(), ()> {
    if proc.by.is_empty() {
        interp.error_kind(crate::message::ErrorKind::RuntimeFatal, Location::none(), "PROC SORT requires a BY statement");
        return Err(());
    }

    let Some(dataset) = interp.get_dataset_cloned(&proc.input) else {
        interp.error_kind(crate::message::ErrorKind::UndefinedName, Location::none(), format!("dataset {} does not exist", proc.input));
        return Err(());
    };

    let columns = dataset.columns.clone();
    let mut rows = dataset.rows;
    if let Some(where_clause) = &proc.where_clause {
        rows = filter_rows(interp, &columns, rows, where_clause)?;
    }

    stable_sort_rows(&mut rows, &columns, &proc.by);

    let removed = if proc.nodupkey {
        let (kept, removed) = dedup_by_key(rows, &columns, &proc.by);
        rows = kept;
        removed
    } else {
        0
    };

    let output_name = proc.output.clone().unwrap_or_else(|| proc.input.clone());
    let (libref, name) = crate::catalog::split_qualified_name(&output_name);
    let qualified = format!("{}.{}", libref.unwrap_or("WORK").to_uppercase(), name.to_uppercase());
    let mut output = crate::catalog::Dataset::new(qualified);
    output.columns = columns;
    output.rows = rows;
    let row_count = output.rows.len();
    interp.put_dataset(&output_name, output);

    interp.note(format!("The data set {} has {row_count} observations.", output_name.to_uppercase()));
    if proc.nodupkey && removed > 0 {
        interp.note(format!(
            "{removed} observations with duplicate key values were deleted."
        ));
    }

    Ok(())
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
    fn sorts_ascending_by_key() {
        let mut interp = interp();
        let mut a = Dataset::new("WORK.A");
        a.columns = vec![ColumnMeta::new("x", true)];
        a.rows = vec![
            row(&[("x", Value::number(3.0))]),
            row(&[("x", Value::number(1.0))]),
            row(&[("x", Value::number(2.0))]),
        ];
        interp.put_dataset("a", a);

        run(
            &mut interp,
            &ProcSort {
                input: "a".to_string(),
                output: None,
                by: vec!["x".to_string()],
                nodupkey: false,
                where_clause: None,
            },
        )
        .unwrap();

        let sorted = interp.catalog().get_dataset("a").unwrap();
        let values: Vec<_> = sorted.rows.iter().map(|r| sorted.cell(r, "x")).collect();
        assert_eq!(values, vec![Value::number(1.0), Value::number(2.0), Value::number(3.0)]);
        assert_eq!(sorted.name, "WORK.A");
    }

    #[test]
    fn nodupkey_keeps_first_of_each_group() {
        let mut interp = interp();
        let mut a = Dataset::new("WORK.A");
        a.columns = vec![ColumnMeta::new("x", true), ColumnMeta::new("y", true)];
        a.rows = vec![
            row(&[("x", Value::number(1.0)), ("y", Value::number(10.0))]),
            row(&[("x", Value::number(1.0)), ("y", Value::number(20.0))]),
            row(&[("x", Value::number(2.0)), ("y", Value::number(30.0))]),
        ];
        interp.put_dataset("a", a);

        run(
            &mut interp,
            &ProcSort {
                input: "a".to_string(),
                output: Some("out".to_string()),
                by: vec!["x".to_string()],
                nodupkey: true,
                where_clause: None,
            },
        )
        .unwrap();

        let out = interp.catalog().get_dataset("out").unwrap();
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.cell(&out.rows[0], "y"), Value::number(10.0));
        assert_eq!(out.name, "WORK.OUT");
    }

    #[test]
    fn where_clause_filters_before_sort() {
        let mut interp = interp();
        let mut a = Dataset::new("WORK.A");
        a.columns = vec![ColumnMeta::new("x", true)];
        a.rows = vec![
            row(&[("x", Value::number(1.0))]),
            row(&[("x", Value::number(5.0))]),
        ];
        interp.put_dataset("a", a);

        run(
            &mut interp,
            &ProcSort {
                input: "a".to_string(),
                output: Some("out".to_string()),
                by: vec!["x".to_string()],
                nodupkey: false,
                where_clause: Some(crate::ast::Expr::BinaryOp(
                    crate::ast::BinOp::Gt,
                    Box::new(crate::ast::Expr::Variable("x".to_string())),
                    Box::new(crate::ast::Expr::Number(2.0)),
                )),
            },
        )
        .unwrap();

        let out = interp.catalog().get_dataset("out").unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.cell(&out.rows[0], "x"), Value::number(5.0));
    }
}
