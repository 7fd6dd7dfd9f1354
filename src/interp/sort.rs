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

//! Row ordering shared by PROC SORT and MERGE.

use itertools::Itertools;

use crate::catalog::{ColumnMeta, Row};
use crate::value::Value;

fn cell(row: &Row, columns: &[ColumnMeta], name: &str) -> Value {
    super::cell(row, columns, name)
}

/// BY-key for `row`, in BY-variable order.
pub fn by_key(row: &Row, columns: &[ColumnMeta], by: &[String]) -> Vec<Value> {
    by.iter().map(|name| cell(row, columns, name)).collect()
}

/// Sorts `rows` ascending by `by`, stably: ties keep their relative input
/// order.
pub fn stable_sort_rows(rows: &mut [Row], columns: &[ColumnMeta], by: &[String]) {
    rows.sort_by(|a, b| by_key(a, columns, by).cmp(&by_key(b, columns, by)));
}

/// Removes all but the first row of each run of equal BY-keys from an
/// already-sorted `rows`. Returns the number of rows removed, for PROC
/// SORT NODUPKEY's log note.
pub fn dedup_by_key(rows: Vec<Row>, columns: &[ColumnMeta], by: &[String]) -> (Vec<Row>, usize) {
    let mut removed = 0;
    let kept = rows
        .into_iter()
        .dedup_by_with_count(|a, b| by_key(a, columns, by) == by_key(b, columns, by))
        .map(|(count, row)| {
            removed += count - 1;
            row
        })
        .collect();
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicase::UniCase;

    fn row(pairs: &[(&str, Value)]) -> Row {
        let mut row = Row::new();
        for (k, v) in pairs {
            row.insert(UniCase::new(k.to_string()), v.clone());
        }
        row
    }

    #[test]
    fn sorts_ascending_and_stable() {
        let columns = vec![ColumnMeta::new("x", true)];
        let mut rows = vec![
            row(&[("x", Value::number(2.0))]),
            row(&[("x", Value::number(1.0))]),
            row(&[("x", Value::number(1.0))]),
        ];
        stable_sort_rows(&mut rows, &columns, &["x".to_string()]);
        assert_eq!(rows[0].get(&UniCase::new("x".to_string())), Some(&Value::number(1.0)));
        assert_eq!(rows[2].get(&UniCase::new("x".to_string())), Some(&Value::number(2.0)));
    }

    #[test]
    fn dedup_keeps_first_of_each_run() {
        let columns = vec![ColumnMeta::new("x", true)];
        let rows = vec![
            row(&[("x", Value::number(1.0))]),
            row(&[("x", Value::number(1.0))]),
            row(&[("x", Value::number(2.0))]),
        ];
        let (kept, removed) = dedup_by_key(rows, &columns, &["x".to_string()]);
        assert_eq!(kept.len(), 2);
        assert_eq!(removed, 1);
    }
}
