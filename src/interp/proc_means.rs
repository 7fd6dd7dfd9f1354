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

//! PROC MEANS.
//!
//! Computes N, mean, min, max, and std for each VAR (default: every numeric
//! column) and writes a tab-separated table to the listing.

use crate::ast::ProcMeans;
use crate::message::Location;
use crate::value::format_number;

use super::Interpreter;

struct Summary {
    n: usize,
    mean: f64,
    min: f64,
    max: f64,
    std: f64,
}

/// N/mean/min/max/sample-std over the non-missing values of one column
/// (the statistic set is fixed to exactly this list; see DESIGN.md).
fn summarize(values: &[f64]) -> Summary {
    let n = values.len();
    if n == 0 {
        return Summary { n: 0, mean: f64::NAN, min: f64::NAN, max: f64::NAN, std: f64::NAN };
    }
    let sum: f64 = values.iter().sum();
    let mean = sum / n as f64;
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let std = if n > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    } else {
        f64::NAN
    };
    Summary { n, mean, min, max, std }
}

fn fmt_stat(v: f64) -> String {
    if v.is_nan() {
        ".".to_string()
    } else {
        format_number(v)
    }
}

pub fn run(interp: &mut Interpreter, proc: &ProcMeans) -> Result<(), ()> {
    let Some(dataset) = interp.get_dataset_cloned(&proc.dataset) else {
        interp.error_kind(crate::message::ErrorKind::UndefinedName, Location::none(), format!("dataset {} does not exist", proc.dataset));
        return Err(());
    };

    let var_names: Vec<String> = match &proc.vars {
        Some(vars) => vars.clone(),
        None => dataset.columns.iter().filter(|c| c.is_numeric).map(|c| c.name.clone()).collect(),
    };

    if interp.settings().print_titles {
        if let Some(title) = interp.title() {
            interp.write_listing_line(title.to_string());
        }
    }
    interp.write_listing_line("The MEANS Procedure".to_string());
    interp.write_listing_line("Variable\tN\tMean\tStd Dev\tMinimum\tMaximum".to_string());

    for name in &var_names {
        let values: Vec<f64> = dataset
            .rows
            .iter()
            .map(|row| dataset.cell(row, name))
            .filter(|v| !v.is_missing())
            .filter_map(|v| v.as_f64())
            .collect();
        let summary = summarize(&values);
        interp.write_listing_line(format!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            name,
            summary.n,
            fmt_stat(summary.mean),
            fmt_stat(summary.std),
            fmt_stat(summary.min),
            fmt_stat(summary.max),
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
    fn computes_summary_statistics() {
        assert!(summarize(&[]).n == 0);
        let s = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.n, 8);
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert!((s.std - 2.138_089_935_299_395).abs() < 1e-9);
    }

    #[test]
    fn defaults_to_all_numeric_columns() {
        let mut interp = interp();
        let mut a = Dataset::new("WORK.A");
        a.columns = vec![ColumnMeta::new("x", true), ColumnMeta::new("label", false)];
        a.rows = vec![
            row(&[("x", Value::number(1.0)), ("label", Value::string("a"))]),
            row(&[("x", Value::number(3.0)), ("label", Value::string("b"))]),
        ];
        interp.put_dataset("a", a);

        run(
            &mut interp,
            &ProcMeans { dataset: "a".to_string(), vars: None },
        )
        .unwrap();

        let lines = interp.listing_lines().unwrap();
        assert_eq!(lines[0], "The MEANS Procedure");
        assert_eq!(lines[1], "Variable\tN\tMean\tStd Dev\tMinimum\tMaximum");
        assert_eq!(lines.len(), 3);
        let fields: Vec<&str> = lines[2].split('\t').collect();
        assert_eq!(fields[0], "x");
        assert_eq!(fields[1], "2");
        assert_eq!(fields[2], "2");
        assert_eq!(fields[4], "1");
        assert_eq!(fields[5], "3");
        let std: f64 = fields[3].parse().unwrap();
        assert!((std - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn missing_values_are_excluded_from_n() {
        let mut interp = interp();
        let mut a = Dataset::new("WORK.A");
        a.columns = vec![ColumnMeta::new("x", true)];
        a.rows = vec![
            row(&[("x", Value::number(1.0))]),
            row(&[("x", Value::MISSING_NUMBER)]),
            row(&[("x", Value::number(3.0))]),
        ];
        interp.put_dataset("a", a);

        run(
            &mut interp,
            &ProcMeans { dataset: "a".to_string(), vars: Some(vec!["x".to_string()]) },
        )
        .unwrap();

        let lines = interp.listing_lines().unwrap();
        let fields: Vec<&str> = lines[2].split('\t').collect();
        assert_eq!(fields[1], "2");
        assert_eq!(fields[4], "1");
        assert_eq!(fields[5], "3");
    }
}
