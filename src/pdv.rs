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

//! Program Data Vector.
//!
//! An ordered `(PdvVar, Value)` list, rebuilt at the start of every DATA
//! step and thrown away at its end, with its own reset-and-retain
//! lifecycle.

use indexmap::IndexMap;
use unicase::UniCase;

use crate::catalog::{ColumnMeta, Dataset, Row};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct PdvVar {
    pub meta: ColumnMeta,
    pub retained: bool,
}

/// The current-row variable table for one DATA step.
#[derive(Debug, Clone, Default)]
pub struct Pdv {
    vars: Vec<PdvVar>,
    values: Vec<Value>,
    index: IndexMap<UniCase<String>, usize>,
}

impl Pdv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable if it isn't already present (case-insensitively);
    /// returns its index either way. New variables start out non-retained
    /// and at their typed-missing default.
    pub fn add_variable(&mut self, name: &str, is_numeric: bool) -> usize {
        let key = UniCase::new(name.to_string());
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.vars.len();
        self.vars.push(PdvVar {
            meta: ColumnMeta::new(name, is_numeric),
            retained: false,
        });
        self.values.push(Value::missing_default(is_numeric));
        self.index.insert(key, idx);
        idx
    }

    pub fn locate(&self, name: &str) -> Option<usize> {
        self.index.get(&UniCase::new(name.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn var(&self, idx: usize) -> &PdvVar {
        &self.vars[idx]
    }

    pub fn get(&self, idx: usize) -> &Value {
        &self.values[idx]
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.locate(name).map(|idx| self.get(idx))
    }

    pub fn set(&mut self, idx: usize, value: Value) {
        self.values[idx] = value;
    }

    pub fn set_retained(&mut self, idx: usize, retained: bool) {
        self.vars[idx].retained = retained;
    }

    pub fn is_numeric(&self, idx: usize) -> bool {
        self.vars[idx].meta.is_numeric
    }

    /// Loads a dataset row into the PDV, overwriting only the variables the
    /// row actually carries and treating them as retained until the next
    /// input row replaces them.
    pub fn load_row(&mut self, dataset: &Dataset, row: &Row) {
        for column in &dataset.columns {
            let idx = self.add_variable(&column.name, column.is_numeric);
            self.values[idx] = dataset.cell(row, &column.name);
            self.vars[idx].retained = true;
        }
    }

    /// Resets every non-retained variable to its typed-missing default.
    pub fn reset_non_retained(&mut self) {
        for (var, value) in self.vars.iter().zip(self.values.iter_mut()) {
            if !var.retained {
                *value = Value::missing_default(var.meta.is_numeric);
            }
        }
    }

    /// Bulk-copies the PDV's current values into a [Row], in `columns`'
    /// order. Used for KEEP/DROP projection into the output dataset.
    pub fn to_row(&self, columns: &[ColumnMeta]) -> Row {
        let mut row = Row::new();
        for column in columns {
            let value = self
                .locate(&column.name)
                .map(|idx| self.values[idx].clone())
                .unwrap_or_else(|| Value::missing_default(column.is_numeric));
            row.insert(UniCase::new(column.name.clone()), value);
        }
        row
    }

    /// The PDV's variables in first-seen order, the schema of an output
    /// dataset before KEEP/DROP projection is applied.
    pub fn column_order(&self) -> Vec<ColumnMeta> {
        self.vars.iter().map(|v| v.meta.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnMeta;

    #[test]
    fn add_variable_is_idempotent_and_case_insensitive() {
        let mut pdv = Pdv::new();
        let a = pdv.add_variable("Foo", true);
        let b = pdv.add_variable("FOO", true);
        assert_eq!(a, b);
        assert_eq!(pdv.len(), 1);
    }

    #[test]
    fn reset_clears_only_non_retained() {
        let mut pdv = Pdv::new();
        let retained = pdv.add_variable("total", true);
        let plain = pdv.add_variable("x", true);
        pdv.set(retained, Value::number(5.0));
        pdv.set(plain, Value::number(9.0));
        pdv.set_retained(retained, true);
        pdv.reset_non_retained();
        assert_eq!(*pdv.get(retained), Value::number(5.0));
        assert_eq!(*pdv.get(plain), Value::MISSING_NUMBER);
    }

    #[test]
    fn load_row_seeds_from_dataset_columns() {
        let mut dataset = Dataset::new("WORK.A");
        dataset.columns.push(ColumnMeta::new("x", true));
        let mut row = Row::new();
        row.insert(UniCase::new("x".to_string()), Value::number(42.0));
        dataset.rows.push(row.clone());

        let mut pdv = Pdv::new();
        pdv.load_row(&dataset, &row);
        assert_eq!(pdv.get_by_name("x"), Some(&Value::number(42.0)));
    }

    #[test]
    fn to_row_projects_in_given_column_order() {
        let mut pdv = Pdv::new();
        let a = pdv.add_variable("a", true);
        let b = pdv.add_variable("b", true);
        pdv.set(a, Value::number(1.0));
        pdv.set(b, Value::number(2.0));
        let columns = vec![ColumnMeta::new("b", true), ColumnMeta::new("a", true)];
        let row = pdv.to_row(&columns);
        let keys: Vec<_> = row.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
    }
}
