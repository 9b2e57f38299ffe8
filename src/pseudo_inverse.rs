// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the Moore-Penrose pseudo-inverse used for redundancy resolution.

use crate::exception::{create_invalid_argument, DisplacementException, DisplacementResult};
use nalgebra::{DMatrix, SVD};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Decides what happens if the matrix to invert has singular values below the threshold.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum SingularityHandling {
    /// Fail with a [`KinematicSingularity`](`crate::exception::DisplacementException::KinematicSingularity`).
    Reject,
    /// Treat degenerate singular values as zero, which drops the corresponding directions.
    Truncate,
    /// Damped least squares. Every singular value σ is inverted as σ / (σ² + damping²),
    /// which bounds the gain by 1 / (2 * damping).
    Damped { damping: f64 },
}

impl Default for SingularityHandling {
    fn default() -> Self {
        SingularityHandling::Reject
    }
}

/// Computes the pseudo-inverse of a matrix with a singular value decomposition.
///
/// For a matrix with full row rank the result equals `Aᵀ (A Aᵀ)⁻¹`, so applying it to a
/// vector yields the minimum-norm solution of `A x = b`.
/// # Arguments
/// * `matrix` - Matrix to invert.
/// * `threshold` - Singular values below this value are considered degenerate.
/// * `handling` - What to do with degenerate singular values.
/// # Errors
/// * [`InvalidArgument`](`crate::exception::DisplacementException::InvalidArgument`) if the
/// matrix contains non-finite values or the threshold or the damping is not positive.
/// * [`KinematicSingularity`](`crate::exception::DisplacementException::KinematicSingularity`)
/// if a singular value is degenerate and `handling` is [`SingularityHandling::Reject`].
pub fn pseudo_inverse(
    matrix: &DMatrix<f64>,
    threshold: f64,
    handling: SingularityHandling,
) -> DisplacementResult<DMatrix<f64>> {
    if matrix.iter().any(|x| !x.is_finite()) {
        return Err(create_invalid_argument(
            "cannot invert a matrix with non-finite entries",
        ));
    }
    if !(threshold.is_finite() && threshold > 0.) {
        return Err(create_invalid_argument(format!(
            "singular value threshold has to be positive and finite, got {}",
            threshold
        )));
    }
    if let SingularityHandling::Damped { damping } = handling {
        if !(damping.is_finite() && damping > 0.) {
            return Err(create_invalid_argument(format!(
                "damping has to be positive and finite, got {}",
                damping
            )));
        }
    }
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return Ok(DMatrix::zeros(matrix.ncols(), matrix.nrows()));
    }

    let svd = SVD::new(matrix.clone(), true, true);
    let smallest_singular_value = svd.singular_values.min();
    let degenerate = smallest_singular_value < threshold;

    let inverted: Vec<f64> = match handling {
        SingularityHandling::Reject => {
            if degenerate {
                return Err(DisplacementException::KinematicSingularity {
                    smallest_singular_value,
                    log: None,
                });
            }
            svd.singular_values.iter().map(|&s| 1. / s).collect()
        }
        SingularityHandling::Truncate => {
            if degenerate {
                warn!(
                    smallest_singular_value,
                    threshold, "truncating degenerate singular values"
                );
            }
            svd.singular_values
                .iter()
                .map(|&s| if s < threshold { 0. } else { 1. / s })
                .collect()
        }
        SingularityHandling::Damped { damping } => {
            if degenerate {
                warn!(
                    smallest_singular_value,
                    damping, "damping a near singular configuration"
                );
            }
            svd.singular_values
                .iter()
                .map(|&s| s / (s * s + damping * damping))
                .collect()
        }
    };

    // u and v_t are always computed, see SVD::new above
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => {
            return Err(create_invalid_argument(
                "singular value decomposition did not converge",
            ))
        }
    };
    let mut v_sigma_inv = v_t.transpose();
    for (mut column, &s) in v_sigma_inv.column_iter_mut().zip(inverted.iter()) {
        column *= s;
    }
    Ok(v_sigma_inv * u.transpose())
}

#[cfg(test)]
mod tests {
    use crate::exception::DisplacementException;
    use crate::pseudo_inverse::{pseudo_inverse, SingularityHandling};
    use nalgebra::{DMatrix, DVector};

    fn slice_compare(a: &[f64], b: &[f64], thresh: f64) {
        assert_eq!(a.len(), b.len());
        for i in 0..a.len() {
            assert!((a[i] - b[i]).abs() < thresh, "{:?} != {:?}", a, b);
        }
    }

    fn redundant_jacobian() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            6,
            7,
            &[
                0.1, -0.3, 0.2, 0.0, 0.5, -0.1, 0.2, //
                0.4, 0.1, -0.2, 0.3, 0.0, 0.2, -0.1, //
                -0.2, 0.2, 0.1, -0.4, 0.1, 0.0, 0.3, //
                0.0, 1.0, 0.0, 0.7, 0.0, 0.3, 0.0, //
                0.0, 0.0, 1.0, 0.0, 0.6, 0.0, 0.4, //
                1.0, 0.0, 0.0, 0.2, 0.0, 0.9, 0.1,
            ],
        )
    }

    #[test]
    fn square_matrix_inverse() {
        let matrix = DMatrix::from_row_slice(2, 2, &[2., 0., 1., 3.]);
        let inverse = pseudo_inverse(&matrix, 1e-6, SingularityHandling::Reject).unwrap();
        let expected = matrix.clone().try_inverse().unwrap();
        slice_compare(inverse.as_slice(), expected.as_slice(), 1e-12);
    }

    #[test]
    fn redundant_matrix_gives_minimum_norm_solution() {
        let jacobian = redundant_jacobian();
        let twist = DVector::from_vec(vec![0.05, -0.02, 0.01, 0.1, 0.0, -0.2]);
        let inverse = pseudo_inverse(&jacobian, 1e-6, SingularityHandling::Reject).unwrap();
        assert_eq!(inverse.shape(), (7, 6));
        let dq = &inverse * &twist;

        // reaches the twist
        slice_compare((&jacobian * &dq).as_slice(), twist.as_slice(), 1e-10);

        // equals the closed form minimum norm solution
        let j_jt_inv = (&jacobian * jacobian.transpose()).try_inverse().unwrap();
        let closed_form = jacobian.transpose() * j_jt_inv * &twist;
        slice_compare(dq.as_slice(), closed_form.as_slice(), 1e-10);

        // adding any null space motion only increases the norm
        let null_space = DMatrix::<f64>::identity(7, 7) - &inverse * &jacobian;
        for i in 0..7 {
            let mut direction = DVector::zeros(7);
            direction[i] = 1.;
            let other = &dq + &null_space * direction;
            slice_compare((&jacobian * &other).as_slice(), twist.as_slice(), 1e-10);
            assert!(other.norm() >= dq.norm() - 1e-12);
        }
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let matrix = DMatrix::from_row_slice(2, 3, &[1., 0., 0., 2., 0., 0.]);
        match pseudo_inverse(&matrix, 1e-6, SingularityHandling::Reject) {
            Err(DisplacementException::KinematicSingularity {
                smallest_singular_value,
                log,
            }) => {
                assert!(smallest_singular_value < 1e-6);
                assert!(log.is_none());
            }
            other => panic!("expected singularity, got {:?}", other),
        }
    }

    #[test]
    fn singular_matrix_is_truncated() {
        let matrix = DMatrix::from_row_slice(2, 3, &[1., 0., 0., 2., 0., 0.]);
        let inverse = pseudo_inverse(&matrix, 1e-6, SingularityHandling::Truncate).unwrap();
        // rank one: pinv = Aᵀ / |A|²
        let expected = matrix.transpose() / 5.;
        slice_compare(inverse.as_slice(), expected.as_slice(), 1e-12);
        for x in inverse.iter() {
            assert!(x.is_finite());
        }
    }

    #[test]
    fn damping_bounds_the_gain() {
        let matrix = DMatrix::from_row_slice(2, 2, &[1., 0., 0., 1e-9]);
        let damping = 0.05;
        let inverse =
            pseudo_inverse(&matrix, 1e-6, SingularityHandling::Damped { damping }).unwrap();
        assert!(inverse.norm() < 1.);
        for x in inverse.iter() {
            assert!(x.abs() <= 1. / (2. * damping) + 1e-12);
        }
        assert!(matches!(
            pseudo_inverse(&matrix, 1e-6, SingularityHandling::Damped { damping: 0. }),
            Err(DisplacementException::InvalidArgument { .. })
        ));
    }

    #[test]
    fn threshold_has_to_be_positive() {
        let matrix = DMatrix::from_row_slice(2, 2, &[1., 0., 0., 0.]);
        for &threshold in [0., -1e-6, f64::NAN, f64::INFINITY].iter() {
            for &handling in [
                SingularityHandling::Reject,
                SingularityHandling::Truncate,
                SingularityHandling::Damped { damping: 0.1 },
            ]
            .iter()
            {
                assert!(matches!(
                    pseudo_inverse(&matrix, threshold, handling),
                    Err(DisplacementException::InvalidArgument { .. })
                ));
            }
        }
    }

    #[test]
    fn non_finite_matrix_is_rejected() {
        let matrix = DMatrix::from_row_slice(1, 2, &[1., f64::NAN]);
        assert!(matches!(
            pseudo_inverse(&matrix, 1e-6, SingularityHandling::Truncate),
            Err(DisplacementException::InvalidArgument { .. })
        ));
    }
}
