//! Dense linear solves and rank assignment.
//!
//! The solver is Gaussian elimination with partial pivoting over [`Dec`].
//! A pivot is treated as singular when it is zero or vanishingly small
//! relative to the largest entry of the matrix, measured in decimal orders
//! of magnitude rather than by an absolute epsilon.

use crate::ctx;
use crate::dec::{safe_div, Dec};
use sg_common::{Error, Result};

/// Solve `A X = B` for X, where `b` holds one column per right-hand side.
/// Both inputs are row-major; A must be square and B conformant.
pub fn solve(a: &[Vec<Dec>], b: &[Vec<Dec>]) -> Result<Vec<Vec<Dec>>> {
    let n = a.len();
    if n == 0 {
        return Err(Error::DegenerateInput {
            quantity: "coefficient matrix".into(),
            detail: "matrix is empty".into(),
        });
    }
    if a.iter().any(|row| row.len() != n) {
        return Err(Error::Validation {
            field: "matrix".into(),
            reason: "coefficient matrix is not square".into(),
        });
    }
    let nrhs = b.first().map(Vec::len).unwrap_or(0);
    if b.len() != n || b.iter().any(|row| row.len() != nrhs) {
        return Err(Error::Validation {
            field: "rhs".into(),
            reason: format!("right-hand side must be {n} rows of equal width"),
        });
    }

    let mut m: Vec<Vec<Dec>> = a.to_vec();
    let mut rhs: Vec<Vec<Dec>> = b.to_vec();

    // Largest magnitude in A anchors the relative singularity threshold.
    let order_max = m
        .iter()
        .flatten()
        .filter(|v| !v.is_zero())
        .map(Dec::order)
        .max();
    let order_max = match order_max {
        Some(o) => o,
        None => {
            return Err(Error::SingularMatrix {
                detail: "coefficient matrix is identically zero".into(),
            })
        }
    };
    let w = ctx::working_digits() as i64;
    let pivot_floor = order_max - (w - 8).max(4);

    for col in 0..n {
        // Partial pivoting: swap in the row with the largest magnitude.
        let mut best = col;
        for row in col + 1..n {
            if m[row][col].abs() > m[best][col].abs() {
                best = row;
            }
        }
        if best != col {
            m.swap(col, best);
            rhs.swap(col, best);
        }
        let pivot = m[col][col].clone();
        if pivot.is_zero() || pivot.order() <= pivot_floor {
            return Err(Error::SingularMatrix {
                detail: format!("pivot in column {col} below the singularity threshold"),
            });
        }
        for row in col + 1..n {
            if m[row][col].is_zero() {
                continue;
            }
            let factor = safe_div(&m[row][col], &pivot, "pivot")?;
            for k in col..n {
                let delta = &factor * &m[col][k];
                m[row][k] = &m[row][k] - &delta;
            }
            for k in 0..nrhs {
                let delta = &factor * &rhs[col][k];
                rhs[row][k] = &rhs[row][k] - &delta;
            }
        }
    }

    // Back substitution.
    let mut x = vec![vec![Dec::zero(); nrhs]; n];
    for col in (0..n).rev() {
        for k in 0..nrhs {
            let mut acc = rhs[col][k].clone();
            for j in col + 1..n {
                let delta = &m[col][j] * &x[j][k];
                acc = &acc - &delta;
            }
            x[col][k] = safe_div(&acc, &m[col][col], "pivot")?;
        }
    }
    Ok(x)
}

/// Average-rank assignment. Tied observations all receive the mean of the
/// rank positions they span. Returns the ranks in input order together with
/// the size of each tie group (singletons included), for tie corrections.
pub fn ranks(values: &[Dec]) -> (Vec<Dec>, Vec<usize>) {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| values[i].cmp(&values[j]));

    let mut out = vec![Dec::zero(); n];
    let mut groups = Vec::new();
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start+1 ..= end average to (start + end + 1) / 2.
        let avg = Dec::from_usize(start + end + 1).halve();
        for &idx in &order[start..end] {
            out[idx] = avg.clone();
        }
        groups.push(end - start);
        start = end;
    }
    (out, groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        Dec::parse(s).unwrap()
    }

    fn row(vals: &[&str]) -> Vec<Dec> {
        vals.iter().map(|s| dec(s)).collect()
    }

    #[test]
    fn solves_a_two_by_two_system() {
        let a = vec![row(&["2", "1"]), row(&["1", "3"])];
        let b = vec![row(&["5"]), row(&["10"])];
        let x = solve(&a, &b).unwrap();
        assert_eq!(x[0][0], dec("1"));
        assert_eq!(x[1][0], dec("3"));
    }

    #[test]
    fn pivoting_handles_zero_leading_entry() {
        let a = vec![row(&["0", "1"]), row(&["1", "0"])];
        let b = vec![row(&["2"]), row(&["3"])];
        let x = solve(&a, &b).unwrap();
        assert_eq!(x[0][0], dec("3"));
        assert_eq!(x[1][0], dec("2"));
    }

    #[test]
    fn multiple_right_hand_sides() {
        let a = vec![row(&["1", "0"]), row(&["0", "2"])];
        let b = vec![row(&["4", "6"]), row(&["8", "10"])];
        let x = solve(&a, &b).unwrap();
        assert_eq!(x[0][1], dec("6"));
        assert_eq!(x[1][0], dec("4"));
        assert_eq!(x[1][1], dec("5"));
    }

    #[test]
    fn singular_matrix_is_reported_not_divided() {
        let a = vec![row(&["1", "2"]), row(&["2", "4"])];
        let b = vec![row(&["1"]), row(&["2"])];
        match solve(&a, &b) {
            Err(Error::SingularMatrix { .. }) => {}
            other => panic!("expected SingularMatrix, got {other:?}"),
        }
    }

    #[test]
    fn near_singular_relative_threshold() {
        // Second row differs from a multiple of the first by ~1e-60,
        // far below 50-digit working precision.
        let a = vec![
            row(&["1", "1"]),
            row(&["1", "1.0000000000000000000000000000000000000000000000000000000000000001"]),
        ];
        let b = vec![row(&["1"]), row(&["1"])];
        assert!(matches!(solve(&a, &b), Err(Error::SingularMatrix { .. })));
    }

    #[test]
    fn average_ranks_for_ties() {
        let values = row(&["5", "5", "1", "3"]);
        let (r, groups) = ranks(&values);
        assert_eq!(r[0], dec("3.5"));
        assert_eq!(r[1], dec("3.5"));
        assert_eq!(r[2], dec("1"));
        assert_eq!(r[3], dec("2"));
        assert_eq!(groups, vec![1, 1, 2]);
    }

    #[test]
    fn rank_sum_is_preserved() {
        let values = row(&["2", "2", "2", "7", "-1"]);
        let (r, _) = ranks(&values);
        let total: Dec = r.iter().fold(Dec::zero(), |acc, v| &acc + v);
        // 1 + 2 + 3 + 4 + 5 = 15 regardless of ties.
        assert_eq!(total, dec("15"));
    }
}
