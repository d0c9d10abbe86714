//! Linear, multiple, and polynomial regression via the normal equations.
//!
//! The design matrix gains an intercept column, X'X is solved by the
//! elimination kernel with the identity appended as extra right-hand sides,
//! so one solve yields both the coefficients and the (X'X)^-1 diagonal the
//! standard errors need. Collinear predictors surface as `SingularMatrix`
//! from the kernel.

use sg_common::{CanonicalResult, Error, GuardianOutcome, Result};
use sg_math::dist::{f_cdf, student_t_cdf};
use sg_math::{linalg, safe_div, sig_string, stats, Dec};

use super::{p_from_cdf, put, upper_tail};
use crate::model::{Alternative, Dataset};

pub(super) fn run(
    response: &Dataset,
    predictors: &[Dataset],
    _alpha: &Dec,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    let n = response.len();
    let p = predictors.len() + 1; // intercept included
    for (j, column) in predictors.iter().enumerate() {
        if column.len() != n {
            return Err(Error::Validation {
                field: "predictors".into(),
                reason: format!(
                    "predictor {} has {} rows but the response has {n}",
                    j + 1,
                    column.len()
                ),
            });
        }
    }
    if n <= p {
        return Err(Error::DegenerateInput {
            quantity: "residual degrees of freedom".into(),
            detail: format!("{n} observations cannot support {p} coefficients"),
        });
    }

    // Row i of the design matrix: [1, x_1i, ..., x_ki].
    let design: Vec<Vec<Dec>> = (0..n)
        .map(|i| {
            let mut row = Vec::with_capacity(p);
            row.push(Dec::one());
            for column in predictors {
                row.push(column[i].clone());
            }
            row
        })
        .collect();

    // Normal equations: X'X beta = X'y, with the identity appended so the
    // same elimination produces (X'X)^-1.
    let mut xtx = vec![vec![Dec::zero(); p]; p];
    let mut xty = vec![Dec::zero(); p];
    for row in 0..p {
        for col in 0..p {
            let mut acc = Dec::zero();
            for item in &design {
                acc = &acc + &(&item[row] * &item[col]);
            }
            xtx[row][col] = acc;
        }
        let mut acc = Dec::zero();
        for (item, y) in design.iter().zip(response.iter()) {
            acc = &acc + &(&item[row] * y);
        }
        xty[row] = acc;
    }
    let rhs: Vec<Vec<Dec>> = (0..p)
        .map(|row| {
            let mut r = Vec::with_capacity(p + 1);
            r.push(xty[row].clone());
            for col in 0..p {
                r.push(if row == col { Dec::one() } else { Dec::zero() });
            }
            r
        })
        .collect();
    let solved = linalg::solve(&xtx, &rhs)?;
    let beta: Vec<Dec> = solved.iter().map(|row| row[0].clone()).collect();
    let inv_diag: Vec<Dec> = (0..p).map(|j| solved[j][j + 1].clone()).collect();

    // Residual and total sums of squares.
    let mean_y = stats::mean(response)?;
    let mut sse = Dec::zero();
    let mut sst = Dec::zero();
    for (item, y) in design.iter().zip(response.iter()) {
        let mut fitted = Dec::zero();
        for (x, b) in item.iter().zip(beta.iter()) {
            fitted = &fitted + &(x * b);
        }
        let e = y - &fitted;
        sse = &sse + &(&e * &e);
        let d = y - &mean_y;
        sst = &sst + &(&d * &d);
    }
    if sst.is_zero() {
        return Err(Error::DegenerateInput {
            quantity: "total sum of squares".into(),
            detail: "the response is constant".into(),
        });
    }
    if sse.is_zero() {
        return Err(Error::DegenerateInput {
            quantity: "residual sum of squares".into(),
            detail: "the model fits exactly; coefficient inference is undefined".into(),
        });
    }

    let df_residual = Dec::from_usize(n - p);
    let df_model = Dec::from_usize(p - 1);
    let sigma2 = safe_div(&sse, &df_residual, "residual df")?;
    let residual_sd = sigma2.sqrt()?;

    let r_squared = &Dec::one() - &safe_div(&sse, &sst, "total sum of squares")?;
    let shrink = safe_div(
        &(&(&Dec::one() - &r_squared) * &Dec::from_usize(n - 1)),
        &df_residual,
        "residual df",
    )?;
    let adj_r_squared = &Dec::one() - &shrink;

    // Overall F for the model.
    let ss_model = &sst - &sse;
    let f = safe_div(
        &safe_div(&ss_model, &df_model, "model df")?,
        &sigma2,
        "residual variance",
    )?;
    let p_model = upper_tail(&f_cdf(&f, &df_model, &df_residual)?);

    let mut result = CanonicalResult::new("linear_regression", outcome);
    put(&mut result.statistics, "f", &f);
    put(&mut result.statistics, "df_model", &df_model);
    put(&mut result.statistics, "df_residual", &df_residual);
    put(&mut result.statistics, "r_squared", &r_squared);
    put(&mut result.statistics, "adj_r_squared", &adj_r_squared);
    put(&mut result.statistics, "residual_sd", &residual_sd);
    result.p_value = sig_string(&p_model);

    // Per-coefficient inference: estimate, standard error, t, p.
    for (j, b) in beta.iter().enumerate() {
        let label = if j == 0 {
            "intercept".to_string()
        } else {
            format!("b{j}")
        };
        let se = (&sigma2 * &inv_diag[j]).sqrt()?;
        put(&mut result.diagnostics, &format!("coef_{label}"), b);
        put(&mut result.diagnostics, &format!("se_{label}"), &se);
        if !se.is_zero() {
            let t = safe_div(b, &se, "coefficient standard error")?;
            let p_coef = p_from_cdf(&student_t_cdf(&t, &df_residual)?, Alternative::TwoSided);
            put(&mut result.diagnostics, &format!("t_{label}"), &t);
            put(&mut result.diagnostics, &format!("p_{label}"), &p_coef);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(vals: &[&str]) -> Dataset {
        vals.iter().map(|s| Dec::parse(s).unwrap()).collect()
    }

    fn alpha() -> Dec {
        Dec::parse("0.05").unwrap()
    }

    #[test]
    fn simple_regression_known_line() {
        // y = 2x + 1 with symmetric noise: x = 1..5, y = 3.1, 4.9, 7.1, 8.9, 11.
        let x = data(&["1", "2", "3", "4", "5"]);
        let y = data(&["3.1", "4.9", "7.1", "8.9", "11"]);
        let result = run(&y, &[x], &alpha(), GuardianOutcome::Skipped).unwrap();
        let slope = Dec::parse(&result.diagnostics["coef_b1"]).unwrap();
        let diff = (&slope - &Dec::parse("1.98").unwrap()).abs();
        assert!(diff < Dec::parse("0.01").unwrap(), "slope = {slope}");
        let r2 = Dec::parse(&result.statistics["r_squared"]).unwrap();
        assert!(r2 > Dec::parse("0.99").unwrap());
    }

    #[test]
    fn collinear_predictors_are_singular() {
        let x1 = data(&["1", "2", "3", "4", "5"]);
        let x2 = data(&["2", "4", "6", "8", "10"]); // 2 * x1
        let y = data(&["1.2", "2.1", "2.9", "4.2", "5.1"]);
        let err = run(&y, &[x1, x2], &alpha(), GuardianOutcome::Skipped).unwrap_err();
        assert!(matches!(err, Error::SingularMatrix { .. }));
    }

    #[test]
    fn constant_response_is_degenerate() {
        let x = data(&["1", "2", "3", "4", "5"]);
        let y = data(&["4", "4", "4", "4", "4"]);
        let err = run(&y, &[x], &alpha(), GuardianOutcome::Skipped).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput { .. }));
    }

    #[test]
    fn exact_fit_is_degenerate_for_inference() {
        let x = data(&["1", "2", "3", "4"]);
        let y = data(&["3", "5", "7", "9"]); // exactly 2x + 1
        let err = run(&y, &[x], &alpha(), GuardianOutcome::Skipped).unwrap_err();
        match err {
            Error::DegenerateInput { quantity, .. } => {
                assert_eq!(quantity, "residual sum of squares")
            }
            other => panic!("expected degenerate input, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_predictor_length_is_validation() {
        let x = data(&["1", "2", "3"]);
        let y = data(&["1", "2", "3", "4"]);
        let err = run(&y, &[x], &alpha(), GuardianOutcome::Skipped).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
