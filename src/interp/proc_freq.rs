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

//! PROC FREQ.
//!
//! For each TABLES variable, emits a frequency table sorted by descending
//! count, ties broken by value order.

use crate::ast::ProcFreq;
use crate::message::Location;
use crate::value::Value;

use super::Interpreter;

pub fn run(interp: &mut Interpreter, proc: &ProcFreq) -> Result<(), ()> {
    let Some(dataset) = interp.get_dataset_cloned(&proc.dataset) else {
        interp.error_kind(crate::message::ErrorKind::UndefinedName, Location::none(), format!("dataset {} does not exist", proc.dataset));
        return Err(());
    };

    if interp.settings().print_titles {
        if let Some(title) = interp.title() {
            interp.write_listing_line(title.to_string());
        }
    }
    interp.write_listing_line("The FREQ Procedure".to_string());

    for name in &proc.tables {
        let mut counts: Vec<(Value, usize)> = Vec::new();
        let mut total = 0usize;
        for row in &dataset.rows {
            let value = dataset.cell(row, name);
            if value.is_missing() {
                continue;
            }
            total += 1;
            match counts.iter_mut().find(|(v, _)| v == &value) {
                Some((_, n)) => *n += 1,
                None => counts.push((value, 1)),
            }
        }

        // Descending count, ties broken by value order.
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        interp.write_listing_line(format!("{name}\tFrequency\tPercent"));
        for (value, count) in &counts {
            let percent = if total > 0 { 100.0 * (*count as f64) / (total as f64) } else { 0.0 };
            interp.write_listing_line(format!("{value}\t{count}\t{percent:.2}"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnMeta, Dataset, Row};
    use crate::sink::{VecListingSink, VecLogSink};
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
    fn counts_descend_with_value_tiebreak() {
        let mut interp = interp();
        let mut a = Dataset::new("WORK.A");
        a.columns = vec![ColumnMeta::new("grp", false)];
        a.rows = vec![
            row(&[("grp", Value::string("a"))]),
            row(&[("grp", Value::string("b"))]),
            row(&[("grp", Value::string("a"))]),
            row(&[("grp", Value::string("c"))]),
        ];
        interp.put_dataset("a", a);

        run(
            &mut interp,
            &ProcFreq { dataset: "a".to_string(), tables: vec!["grp".to_string()] },
        )
        .unwrap();

        let lines = interp.listing_lines().unwrap();
        assert_eq!(
            lines,
            [
                "The FREQ Procedure",
                "grp\tFrequency\tPercent",
                "a\t2\t50.00",
                "b\t1\t25.00",
                "c\t1\t25.00",
            ]
        );
    }

    #[test]
    fn missing_values_excluded_from_total() {
        let mut interp = interp();
        let mut a = Dataset::new("WORK.A");
        a.columns = vec![ColumnMeta::new("grp", false)];
        a.rows = vec![
            row(&[("grp", Value::string("a"))]),
            row(&[("grp", Value::string(""))]),
        ];
        interp.put_dataset("a", a);

        run(
            &mut interp,
            &ProcFreq { dataset: "a".to_string(), tables: vec!["grp".to_string()] },
        )
        .unwrap();

        let lines = interp.listing_lines().unwrap();
        assert_eq!(
            lines,
            ["The FREQ Procedure", "grp\tFrequency\tPercent", "a\t1\t100.00"]
        );
    }
}
