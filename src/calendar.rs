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

//! Date helpers backing the `today`/`intck`/`intnx` functions.
//!
//! SAS represents dates as a day count from 1960-01-01; `today()` instead
//! returns the current date as a `YYYYMMDD` integer, and `intck`/`intnx`
//! operate on day counts passed in as ordinary numbers. Day-count arithmetic
//! is delegated to `chrono`.

use chrono::{Datelike, Days, Local, NaiveDate};

/// Returns today's date as a `YYYYMMDD` integer.
pub fn today_yyyymmdd() -> i64 {
    let today = Local::now().date_naive();
    date_to_yyyymmdd(today)
}

fn date_to_yyyymmdd(date: NaiveDate) -> i64 {
    date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64
}

fn yyyymmdd_to_date(value: f64) -> Option<NaiveDate> {
    let value = value as i64;
    let year = value / 10_000;
    let month = (value / 100) % 100;
    let day = value % 100;
    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
}

/// `intck("day", a, b)`: the integer day difference between two `YYYYMMDD`
/// dates. Only the `"day"` interval is supported; any other interval is a
/// runtime error reported by the caller.
pub fn intck_day(a: f64, b: f64) -> Option<i64> {
    let a = yyyymmdd_to_date(a)?;
    let b = yyyymmdd_to_date(b)?;
    Some((b - a).num_days())
}

/// `intnx("day", start, n)`: `start` advanced by `n` days, returned as a
/// `YYYYMMDD` integer. Only the `"day"` interval is supported.
pub fn intnx_day(start: f64, n: f64) -> Option<f64> {
    let start = yyyymmdd_to_date(start)?;
    let n = n as i64;
    let result = if n >= 0 {
        start.checked_add_days(Days::new(n as u64))?
    } else {
        start.checked_sub_days(Days::new((-n) as u64))?
    };
    Some(date_to_yyyymmdd(result) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intck_day_counts_forward() {
        assert_eq!(intck_day(20240101.0, 20240110.0), Some(9));
    }

    #[test]
    fn intck_day_counts_backward() {
        assert_eq!(intck_day(20240110.0, 20240101.0), Some(-9));
    }

    #[test]
    fn intnx_day_advances() {
        assert_eq!(intnx_day(20240128.0, 3.0), Some(20240131.0));
        assert_eq!(intnx_day(20240131.0, 1.0), Some(20240201.0));
    }

    #[test]
    fn intnx_day_retreats() {
        assert_eq!(intnx_day(20240201.0, -1.0), Some(20240131.0));
    }
}
