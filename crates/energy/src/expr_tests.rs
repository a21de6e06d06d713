// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn values(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn sums_package_and_dram_power() {
    let expr = PowerExpr::parse("pow_pkg0 + pow_pkg1 + pow_dram0 + pow_dram1").unwrap();
    let result = expr
        .eval(&values(&[
            ("pow_pkg0", 90.0),
            ("pow_pkg1", 85.0),
            ("pow_dram0", 12.5),
            ("pow_dram1", 12.5),
        ]))
        .unwrap();
    assert_eq!(result, 200.0);
}

#[test]
fn precedence_and_parentheses() {
    let expr = PowerExpr::parse("a + b * 2").unwrap();
    assert_eq!(expr.eval(&values(&[("a", 1.0), ("b", 3.0)])).unwrap(), 7.0);

    let expr = PowerExpr::parse("(a + b) * 2").unwrap();
    assert_eq!(expr.eval(&values(&[("a", 1.0), ("b", 3.0)])).unwrap(), 8.0);
}

#[test]
fn division_and_constants() {
    let expr = PowerExpr::parse("total / 1000 + 0.5").unwrap();
    assert_eq!(expr.eval(&values(&[("total", 1500.0)])).unwrap(), 2.0);
}

#[test]
fn metric_names_are_reported() {
    let expr = PowerExpr::parse("a + b * c").unwrap();
    assert_eq!(expr.metrics(), ["a", "b", "c"]);
}

#[test]
fn unknown_metric_is_an_error() {
    let expr = PowerExpr::parse("a + b").unwrap();
    let err = expr.eval(&values(&[("a", 1.0)])).unwrap_err();
    assert_eq!(err, ExprError::UnknownMetric("b".to_string()));
}

#[test]
fn division_by_zero_is_an_error() {
    let expr = PowerExpr::parse("a / b").unwrap();
    let err = expr.eval(&values(&[("a", 1.0), ("b", 0.0)])).unwrap_err();
    assert_eq!(err, ExprError::DivisionByZero);
}

#[yare::parameterized(
    empty = { "" },
    dangling_op = { "a +" },
    unbalanced = { "(a + b" },
    bad_char = { "a ? b" },
)]
fn malformed_expressions_fail_to_parse_or_eval(source: &str) {
    match PowerExpr::parse(source) {
        Err(_) => {}
        Ok(expr) => {
            assert!(expr.eval(&values(&[("a", 1.0), ("b", 1.0)])).is_err());
        }
    }
}
