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

//! MERGE: a k-way merge of datasets sorted ascending by a shared BY-key,
//! where a later dataset's variables win over an earlier one's on a name
//! conflict.

use crate::catalog::{ColumnMeta, Row};
use crate::message::Location;

use super::sort::{by_key, stable_sort_rows};
use super::Interpreter;

/// Merges the named datasets on `by`, returning the union schema and the
/// merged rows. Later datasets in `names` win on a variable-name conflict:
/// each contributing dataset's columns are inserted into the combined row
/// in `names` order, so a later insert naturally overwrites an earlier one
/// for the same key (this is deliberate, see DESIGN.md).
pub fn merge_datasets(
    interp: &mut Interpreter,
    names: &[String],
    by: &[String],
) -> Result<(Vec<ColumnMeta>, Vec<Row>), ()> {
    let mut inputs: Vec<(Vec<ColumnMeta>, Vec<Row>)> = Vec::with_capacity(names.len());
    for name in names {
        let Some(dataset) = interp.catalog().get_dataset(name) else {
            interp.error_kind(crate::message::ErrorKind::UndefinedName, Location::none(), format!("dataset {name} does not exist"));
            return Err(());
        };
        let mut rows = dataset.rows.clone();
        let columns = dataset.columns.clone();
        stable_sort_rows(&mut rows, &columns, by);
        inputs.push((columns, rows));
    }

    let mut union_columns: Vec<ColumnMeta> = Vec::new();
    for (columns, _) in &inputs {
        for column in columns {
            if !union_columns.iter().any(|c| c.name.eq_ignore_ascii_case(&column.name)) {
                union_columns.push(column.clone());
            }
        }
    }

    let mut cursors = vec![0usize; inputs.len()];
    let mut merged = Vec::new();

    loop {
        let mut smallest: Option<Vec<crate::value::Value>> = None;
        for (i, (columns, rows)) in inputs.iter().enumerate() {
            if cursors[i] >= rows.len() {
                continue;
            }
            let key = by_key(&rows[cursors[i]], columns, by);
            smallest = Some(match smallest {
                Some(best) if best <= key => best,
                _ => key,
            });
        }
        let Some(target_key) = smallest else {
            break;
        };

        let mut combined = Row::new();
        for (i, (columns, rows)) in inputs.iter().enumerate() {
            if cursors[i] >= rows.len() {
                continue;
            }
            if by_key(&rows[cursors[i]], columns, by) != target_key {
                continue;
            }
            for (key, value) in &rows[cursors[i]] {
                combined.insert(key.clone(), value.clone());
            }
            cursors[i] += 1;
        }
        merged.push(combined);
    }

    Ok((union_columns, merged))
}
