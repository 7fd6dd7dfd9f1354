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

//! DATA step execution.
//!
//! A step is compiled once (collecting its declarative statements: SET,
//! MERGE, RETAIN, ARRAY, KEEP/DROP, INPUT/DATALINES) and then iterated row
//! by row against a fresh PDV, separating the one-time setup work from the
//! per-row execution loop.

use std::collections::HashMap;

use crate::{
    ast::{self, DataStatement, DataStep, DoKind, DoLoop, Expr},
    catalog::{ColumnMeta, Dataset, Row},
    message::Location,
    pdv::Pdv,
    value::Value,
};

use super::expr::{self, ArrayTable};
use super::merge;
use super::Interpreter;

struct Compiled<'a> {
    set_names: Option<Vec<String>>,
    merge_names: Option<Vec<String>>,
    by_vars: Vec<String>,
    input_vars: Option<Vec<(String, bool)>>,
    datalines: Option<Vec<String>>,
    where_clause: Option<Expr>,
    retains: Vec<(Vec<String>, Option<ast::Value>)>,
    arrays: Vec<(String, usize, Vec<String>)>,
    drop: Vec<String>,
    keep: Vec<String>,
    runtime: Vec<&'a DataStatement>,
    has_output: bool,
}

fn compile(body: &[DataStatement]) -> Compiled<'_> {
    let mut compiled = Compiled {
        set_names: None,
        merge_names: None,
        by_vars: Vec::new(),
        input_vars: None,
        datalines: None,
        where_clause: None,
        retains: Vec::new(),
        arrays: Vec::new(),
        drop: Vec::new(),
        keep: Vec::new(),
        runtime: Vec::new(),
        has_output: false,
    };
    for statement in body {
        match statement {
            DataStatement::Set(names) => compiled.set_names = Some(names.clone()),
            DataStatement::Merge(names) => compiled.merge_names = Some(names.clone()),
            DataStatement::By(vars) => compiled.by_vars = vars.clone(),
            DataStatement::Input(vars) => compiled.input_vars = Some(vars.clone()),
            DataStatement::Datalines(lines) => compiled.datalines = Some(lines.clone()),
            DataStatement::Where(expr) => compiled.where_clause = Some(expr.clone()),
            DataStatement::Retain { vars, initial } => {
                compiled.retains.push((vars.clone(), initial.clone()))
            }
            DataStatement::Array { name, size, vars } => {
                compiled.arrays.push((name.clone(), *size, vars.clone()))
            }
            DataStatement::Drop(names) => compiled.drop.extend(names.clone()),
            DataStatement::Keep(names) => compiled.keep.extend(names.clone()),
            other => {
                if contains_output(other) {
                    compiled.has_output = true;
                }
                compiled.runtime.push(other);
            }
        }
    }
    compiled
}

fn contains_output(statement: &DataStatement) -> bool {
    match statement {
        DataStatement::Output => true,
        DataStatement::IfThenElse { then_body, else_ifs, else_body, .. } => {
            then_body.iter().any(contains_output)
                || else_ifs.iter().any(|(_, body)| body.iter().any(contains_output))
                || else_body.as_ref().is_some_and(|body| body.iter().any(contains_output))
        }
        DataStatement::DoLoop(DoLoop { body, .. }) => body.iter().any(contains_output),
        _ => false,
    }
}

enum Flow {
    Normal,
    StopIteration,
}

struct StepState {
    pdv: Pdv,
    arrays: ArrayTable,
    outputs: Vec<Row>,
}

/// Builds the `(schema, rows)` a step iterates over, unifying the four
/// input modes (SET, MERGE, INPUT+DATALINES, neither) into one shape so the
/// main loop doesn't need to special-case them.
fn build_source(interp: &mut Interpreter, compiled: &Compiled) -> Result<(Dataset, Vec<Row>), ()> {
    if let Some(names) = &compiled.merge_names {
        if compiled.by_vars.is_empty() {
            interp.error_kind(crate::message::ErrorKind::RuntimeFatal, Location::none(), "MERGE requires a BY statement");
            return Err(());
        }
        let (columns, rows) = merge::merge_datasets(interp, names, &compiled.by_vars)?;
        let mut dataset = Dataset::new("WORK._MERGE");
        dataset.columns = columns;
        return Ok((dataset, rows));
    }

    if let Some(names) = &compiled.set_names {
        let mut columns: Vec<ColumnMeta> = Vec::new();
        let mut rows = Vec::new();
        for name in names {
            let Some(dataset) = interp.catalog().get_dataset(name) else {
                interp.error_kind(crate::message::ErrorKind::UndefinedName, Location::none(), format!("dataset {name} does not exist"));
                return Err(());
            };
            for column in &dataset.columns {
                if !columns.iter().any(|c| c.name.eq_ignore_ascii_case(&column.name)) {
                    columns.push(column.clone());
                }
            }
            rows.extend(dataset.rows.clone());
        }
        let mut dataset = Dataset::new("WORK._SET");
        dataset.columns = columns;
        return Ok((dataset, rows));
    }

    if let Some(vars) = &compiled.input_vars {
        let lines = compiled.datalines.clone().unwrap_or_default();
        let mut dataset = Dataset::new("WORK._INPUT");
        dataset.columns = vars.iter().map(|(name, is_char)| ColumnMeta::new(name, !is_char)).collect();
        let mut rows = Vec::new();
        for line in &lines {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let mut row = Row::new();
            for (i, (name, is_char)) in vars.iter().enumerate() {
                let value = match tokens.get(i) {
                    Some(token) if *is_char => Value::string(*token),
                    Some(token) => token.trim().parse::<f64>().map(Value::number).unwrap_or(Value::MISSING_NUMBER),
                    None => Value::missing_default(!is_char),
                };
                row.insert(crate::identifier::key(name), value);
            }
            rows.push(row);
        }
        return Ok((dataset, rows));
    }

    // No input source: a DATA step with no SET/MERGE/INPUT still iterates
    // a single empty row, so the step body runs exactly once.
    Ok((Dataset::new("WORK._NONE"), vec![Row::new()]))
}

fn resolve_array_vars(name: &str, size: usize, declared: &[String]) -> Vec<String> {
    if !declared.is_empty() {
        declared.to_vec()
    } else {
        (1..=size).map(|i| format!("{name}{i}")).collect()
    }
}

pub fn run(interp: &mut Interpreter, step: &DataStep) -> Result<(), ()> {
    let compiled = compile(&step.body);
    let (source, rows) = build_source(interp, &compiled)?;

    let mut pdv = Pdv::new();
    let mut arrays: ArrayTable = HashMap::new();

    for (name, size, vars) in &compiled.arrays {
        let resolved = resolve_array_vars(name, *size, vars);
        for var in &resolved {
            pdv.add_variable(var, true);
        }
        arrays.insert(expr::array_key(name), resolved);
    }

    for (vars, initial) in &compiled.retains {
        let is_numeric = !matches!(initial, Some(ast::Value::String(_)));
        for var in vars {
            let idx = pdv.add_variable(var, is_numeric);
            pdv.set_retained(idx, true);
            if let Some(value) = initial {
                let value = match value {
                    ast::Value::Number(n) => Value::number(*n),
                    ast::Value::String(s) => Value::string(s),
                };
                pdv.set(idx, value);
            }
        }
    }

    let mut state = StepState {
        pdv,
        arrays,
        outputs: Vec::new(),
    };

    let runtime_body: Vec<DataStatement> = compiled.runtime.iter().map(|s| (*s).clone()).collect();

    for row in &rows {
        state.pdv.load_row(&source, row);

        if let Some(where_clause) = &compiled.where_clause {
            if !expr::eval(interp, &state.pdv, &state.arrays, where_clause)?.is_truthy() {
                state.pdv.reset_non_retained();
                continue;
            }
        }

        let flow = exec_block(interp, &mut state, &runtime_body)?;

        if matches!(flow, Flow::Normal) && !compiled.has_output {
            let columns = state.pdv.column_order();
            let snapshot = state.pdv.to_row(&columns);
            state.outputs.push(snapshot);
        }

        state.pdv.reset_non_retained();
    }

    let final_columns = project_columns(state.pdv.column_order(), &compiled.keep, &compiled.drop);
    let projected: Vec<Row> = state
        .outputs
        .iter()
        .map(|snapshot| project_row(snapshot, &final_columns))
        .collect();

    let (libref, name) = crate::catalog::split_qualified_name(&step.output_dataset);
    let qualified = format!("{}.{}", libref.unwrap_or("WORK").to_uppercase(), name.to_uppercase());
    let mut dataset = Dataset::new(qualified);
    dataset.columns = final_columns;
    dataset.rows = projected;

    let summary = dataset.describe();
    interp.put_dataset(&step.output_dataset, dataset);
    interp.note(format!("The data set {summary}."));

    Ok(())
}

fn project_columns(columns: Vec<ColumnMeta>, keep: &[String], drop: &[String]) -> Vec<ColumnMeta> {
    if !keep.is_empty() {
        return keep
            .iter()
            .filter_map(|name| columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)).cloned())
            .collect();
    }
    if !drop.is_empty() {
        return columns
            .into_iter()
            .filter(|c| !drop.iter().any(|d| d.eq_ignore_ascii_case(&c.name)))
            .collect();
    }
    columns
}

fn project_row(snapshot: &Row, columns: &[ColumnMeta]) -> Row {
    let mut row = Row::new();
    for column in columns {
        let value = snapshot
            .get(&crate::identifier::key(&column.name))
            .cloned()
            .unwrap_or_else(|| Value::missing_default(column.is_numeric));
        row.insert(crate::identifier::key(&column.name), value);
    }
    row
}

fn exec_block(interp: &mut Interpreter, state: &mut StepState, body: &[DataStatement]) -> Result<Flow, ()> {
    for statement in body {
        match exec_statement(interp, state, statement)? {
            Flow::Normal => {}
            Flow::StopIteration => return Ok(Flow::StopIteration),
        }
    }
    Ok(Flow::Normal)
}

fn exec_statement(interp: &mut Interpreter, state: &mut StepState, statement: &DataStatement) -> Result<Flow, ()> {
    match statement {
        DataStatement::Assignment { var, expr } => {
            let value = expr::eval(interp, &state.pdv, &state.arrays, expr)?;
            let is_numeric = value.is_numeric();
            let idx = state.pdv.add_variable(var, is_numeric);
            state.pdv.set(idx, value);
        }
        DataStatement::ArrayAssignment { array, index, expr } => {
            let vars = state.arrays.get(&expr::array_key(array)).cloned().ok_or_else(|| {
                interp.error_kind(crate::message::ErrorKind::RuntimeFatal, Location::none(), format!("array {array} is not defined"));
            })?;
            let index_value = expr::eval(interp, &state.pdv, &state.arrays, index)?;
            let i = index_value.as_f64().unwrap_or(0.0) as i64;
            if i < 1 || i as usize > vars.len() {
                interp.error_kind(crate::message::ErrorKind::Range, Location::none(), format!("subscript {i} is out of range for array {array}"));
                return Err(());
            }
            let value = expr::eval(interp, &state.pdv, &state.arrays, expr)?;
            let var_name = &vars[(i - 1) as usize];
            let idx = state.pdv.add_variable(var_name, value.is_numeric());
            state.pdv.set(idx, value);
        }
        DataStatement::IfThenElse { condition, then_body, else_ifs, else_body } => {
            if expr::eval(interp, &state.pdv, &state.arrays, condition)?.is_truthy() {
                return exec_block(interp, state, then_body);
            }
            for (cond, body) in else_ifs {
                if expr::eval(interp, &state.pdv, &state.arrays, cond)?.is_truthy() {
                    return exec_block(interp, state, body);
                }
            }
            if let Some(body) = else_body {
                return exec_block(interp, state, body);
            }
        }
        DataStatement::SubsettingIf(condition) => {
            if !expr::eval(interp, &state.pdv, &state.arrays, condition)?.is_truthy() {
                return Ok(Flow::StopIteration);
            }
        }
        DataStatement::DoLoop(do_loop) => return exec_do_loop(interp, state, do_loop),
        DataStatement::Output => {
            let columns = state.pdv.column_order();
            state.outputs.push(state.pdv.to_row(&columns));
        }
        DataStatement::Set(_)
        | DataStatement::Merge(_)
        | DataStatement::By(_)
        | DataStatement::Input(_)
        | DataStatement::Datalines(_)
        | DataStatement::Where(_)
        | DataStatement::Retain { .. }
        | DataStatement::Array { .. }
        | DataStatement::Drop(_)
        | DataStatement::Keep(_) => {
            unreachable!("declarative statements are filtered out by compile()")
        }
    }
    Ok(Flow::Normal)
}

fn exec_do_loop(interp: &mut Interpreter, state: &mut StepState, do_loop: &DoLoop) -> Result<Flow, ()> {
    let max_iterations = interp.settings().max_loop_iterations;
    match &do_loop.kind {
        DoKind::Block => exec_block(interp, state, &do_loop.body),
        DoKind::While(cond) => {
            let mut iterations = 0u64;
            loop {
                if !expr::eval(interp, &state.pdv, &state.arrays, cond)?.is_truthy() {
                    return Ok(Flow::Normal);
                }
                if let Flow::StopIteration = exec_block(interp, state, &do_loop.body)? {
                    return Ok(Flow::StopIteration);
                }
                iterations += 1;
                if iterations > max_iterations {
                    interp.error_kind(crate::message::ErrorKind::RuntimeFatal, Location::none(), "DO loop exceeded the safety cap; possible infinite loop");
                    return Err(());
                }
            }
        }
        DoKind::Until(cond) => {
            let mut iterations = 0u64;
            loop {
                if let Flow::StopIteration = exec_block(interp, state, &do_loop.body)? {
                    return Ok(Flow::StopIteration);
                }
                if expr::eval(interp, &state.pdv, &state.arrays, cond)?.is_truthy() {
                    return Ok(Flow::Normal);
                }
                iterations += 1;
                if iterations > max_iterations {
                    interp.error_kind(crate::message::ErrorKind::RuntimeFatal, Location::none(), "DO loop exceeded the safety cap; possible infinite loop");
                    return Err(());
                }
            }
        }
        DoKind::Iterative { var, start, end, by } => {
            let start_value = expr::eval(interp, &state.pdv, &state.arrays, start)?.as_f64().unwrap_or(0.0);
            let end_value = expr::eval(interp, &state.pdv, &state.arrays, end)?.as_f64().unwrap_or(0.0);
            let step_value = match by {
                Some(expr) => expr::eval(interp, &state.pdv, &state.arrays, expr)?.as_f64().unwrap_or(1.0),
                None => 1.0,
            };
            if step_value == 0.0 {
                interp.error_kind(crate::message::ErrorKind::Range, Location::none(), "DO loop STEP value is zero");
                return Err(());
            }
            let idx = state.pdv.add_variable(var, true);
            let mut current = start_value;
            let mut iterations = 0u64;
            loop {
                if step_value > 0.0 && current > end_value {
                    break;
                }
                if step_value < 0.0 && current < end_value {
                    break;
                }
                state.pdv.set(idx, Value::number(current));
                if let Flow::StopIteration = exec_block(interp, state, &do_loop.body)? {
                    return Ok(Flow::StopIteration);
                }
                current += step_value;
                iterations += 1;
                if iterations > max_iterations {
                    interp.error_kind(crate::message::ErrorKind::RuntimeFatal, Location::none(), "DO loop exceeded the safety cap; possible infinite loop");
                    return Err(());
                }
            }
            Ok(Flow::Normal)
        }
    }
}
