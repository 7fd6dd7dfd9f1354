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

//! Libraries and datasets.
//!
//! The catalog owns every dataset for the life of the process; a DATA or
//! PROC step never frees a dataset, it only replaces the contents of the one
//! it's writing to.

use std::collections::HashMap;

use indexmap::IndexMap;
use unicase::UniCase;

use crate::value::Value;

/// How a library was opened. Only `Temp` (the `WORK` library) is actually
/// exercised by the interpreter today; `ReadOnly`/`ReadWrite` are recorded
/// for LIBNAME-declared libraries even though no binary dataset codec that
/// would read/write their contents is implemented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LibraryAccess {
    ReadWrite,
    ReadOnly,
    Temp,
}

#[derive(Debug, Clone)]
pub struct Library {
    pub libref: String,
    pub path: String,
    pub access: LibraryAccess,
    pub created_at: std::time::SystemTime,
    datasets: IndexMap<UniCase<String>, Dataset>,
}

impl Library {
    fn new(libref: impl Into<String>, path: impl Into<String>, access: LibraryAccess) -> Self {
        Self {
            libref: libref.into(),
            path: path.into(),
            access,
            created_at: std::time::SystemTime::now(),
            datasets: IndexMap::new(),
        }
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(&UniCase::new(name.to_string()))
    }

    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.values()
    }
}

/// Column metadata, shared between a [Dataset]'s schema and a PDV variable
/// ([crate::pdv::PdvVar] extends this with a `retained: bool` flag).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    pub is_numeric: bool,
    pub length: usize,
    pub label: Option<String>,
    pub format: Option<String>,
    pub decimals: usize,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, is_numeric: bool) -> Self {
        Self {
            name: name.into(),
            is_numeric,
            length: if is_numeric { 8 } else { 200 },
            label: None,
            format: None,
            decimals: crate::settings::Settings::global().default_decimals,
        }
    }
}

/// A row is a mapping from column name to value; reads for a column absent
/// from the map yield that column's typed-missing value.
pub type Row = IndexMap<UniCase<String>, Value>;

#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        let key = UniCase::new(name.to_string());
        self.columns.iter().find(|c| UniCase::new(c.name.clone()) == key)
    }

    pub fn cell(&self, row: &Row, name: &str) -> Value {
        let key = UniCase::new(name.to_string());
        row.get(&key).cloned().unwrap_or_else(|| {
            let numeric = self.column(name).map_or(true, |c| c.is_numeric);
            Value::missing_default(numeric)
        })
    }

    /// Variable names in first-seen order, for tests and PROC PRINT's
    /// default VAR list.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// A one-line summary in the shape of PROC CONTENTS' headline ("N
    /// observations and M variables"), without implementing the procedure
    /// itself.
    pub fn describe(&self) -> String {
        format!(
            "{} has {} observations and {} variables",
            self.name,
            self.rows.len(),
            self.columns.len()
        )
    }
}

/// Splits a possibly-qualified name (`LIBREF.NAME`) into its parts. A bare
/// name has no libref.
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((libref, dataset)) => (Some(libref), dataset),
        None => (None, name),
    }
}

/// Owns every [Library] for the life of the process: libraries are created
/// by LIBNAME and persist until process exit.
pub struct Catalog {
    libraries: HashMap<UniCase<String>, Library>,
}

impl Catalog {
    pub fn new() -> Self {
        let mut libraries = HashMap::new();
        libraries.insert(
            UniCase::new("WORK".to_string()),
            Library::new("WORK", "", LibraryAccess::Temp),
        );
        Self { libraries }
    }

    pub fn define_library(&mut self, libref: &str, path: &str, access: LibraryAccess) {
        self.libraries.insert(
            UniCase::new(libref.to_string()),
            Library::new(libref.to_uppercase(), path, access),
        );
    }

    pub fn get_library(&self, libref: &str) -> Option<&Library> {
        self.libraries.get(&UniCase::new(libref.to_string()))
    }

    /// Looks up a dataset by its possibly-qualified name without creating
    /// one, for read-only access (e.g. SET/MERGE inputs).
    pub fn get_dataset(&self, name: &str) -> Option<&Dataset> {
        let (libref, dataset_name) = split_qualified_name(name);
        let libref = libref.unwrap_or("WORK");
        self.get_library(libref)?.dataset(dataset_name)
    }

    /// Returns the dataset for `name`, creating an empty one (and its
    /// library's `WORK` default) if it doesn't exist yet.
    pub fn get_or_create_dataset(&mut self, name: &str) -> &mut Dataset {
        let (libref, dataset_name) = split_qualified_name(name);
        let libref = libref.unwrap_or("WORK").to_string();
        let library = self
            .libraries
            .entry(UniCase::new(libref.clone()))
            .or_insert_with(|| Library::new(libref.to_uppercase(), "", LibraryAccess::Temp));
        library
            .datasets
            .entry(UniCase::new(dataset_name.to_string()))
            .or_insert_with(|| Dataset::new(format!("{}.{}", library.libref, dataset_name)))
    }

    /// Replaces a dataset wholesale, used by PROC/DATA steps that write a
    /// fully materialized output dataset rather than mutating in place.
    pub fn put_dataset(&mut self, name: &str, dataset: Dataset) {
        let (libref, dataset_name) = split_qualified_name(name);
        let libref = libref.unwrap_or("WORK").to_string();
        let library = self
            .libraries
            .entry(UniCase::new(libref.clone()))
            .or_insert_with(|| Library::new(libref.to_uppercase(), "", LibraryAccess::Temp));
        library
            .datasets
            .insert(UniCase::new(dataset_name.to_string()), dataset);
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
