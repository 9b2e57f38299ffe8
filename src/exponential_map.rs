// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the exponential map of SE(3) and its inverse.
//!
//! Twists are ordered `[v; ω]`, linear velocity first. The inverse map answers the question
//! which constant twist has to be applied for `dt` seconds to end up at a given pose
//! displacement; [`direct`] integrates a constant twist back into that displacement.

use crate::exception::{create_invalid_argument, DisplacementResult};
use crate::utils::{skew, Twist};
use nalgebra::{Isometry3, Matrix3, UnitQuaternion, Vector3};

/// Below this rotation angle the closed form coefficients are replaced by their Taylor series.
pub static SMALL_ANGLE: f64 = 1e-4;
/// Cutoff of the series of the `[φ]x²` coefficient of `V(φ)⁻¹`.
static SERIES_ANGLE: f64 = 1e-2;

/// Computes the pose displacement reached by applying `twist` for `dt` seconds.
///
/// # Arguments
/// * `twist` - Constant twist `[v; ω]` in \[m/s\] and \[rad/s\].
/// * `dt` - Integration time in \[s\]. May be zero or negative.
/// # Return
/// The pose displacement `exp([twist] * dt)`.
pub fn direct(twist: &Twist, dt: f64) -> Isometry3<f64> {
    let v = Vector3::new(twist[0], twist[1], twist[2]) * dt;
    let phi = Vector3::new(twist[3], twist[4], twist[5]) * dt;
    let rotation = UnitQuaternion::from_scaled_axis(phi);
    let translation = left_jacobian(&phi) * v;
    Isometry3::from_parts(translation.into(), rotation)
}

/// Computes the constant twist which integrates to `pose` within `dt` seconds.
///
/// For a pure translation the result is exactly `translation / dt`.
/// # Arguments
/// * `pose` - Desired pose displacement.
/// * `dt` - Time budget in \[s\].
/// # Errors
/// * [`InvalidArgument`](`crate::exception::DisplacementException::InvalidArgument`) if `dt`
/// is not strictly positive and finite or if the pose contains non-finite values.
pub fn inverse(pose: &Isometry3<f64>, dt: f64) -> DisplacementResult<Twist> {
    if !(dt.is_finite() && dt > 0.) {
        return Err(create_invalid_argument(format!(
            "the time of the exponential map has to be positive and finite, got {}",
            dt
        )));
    }
    if pose.to_homogeneous().iter().any(|x| !x.is_finite()) {
        return Err(create_invalid_argument(
            "the pose of the exponential map contains non-finite values",
        ));
    }
    let phi = rotation_log(&pose.rotation);
    let u = left_jacobian_inverse(&phi) * pose.translation.vector;
    Ok(Twist::new(
        u.x / dt,
        u.y / dt,
        u.z / dt,
        phi.x / dt,
        phi.y / dt,
        phi.z / dt,
    ))
}

/// Logarithm of a rotation as rotation vector `θ u`.
///
/// Uses the quaternion representation so the result stays accurate for angles close to zero
/// and close to π.
pub fn rotation_log(rotation: &UnitQuaternion<f64>) -> Vector3<f64> {
    let mut w = rotation.scalar();
    let mut imaginary = rotation.imag();
    if w < 0. {
        w = -w;
        imaginary = -imaginary;
    }
    let norm = imaginary.norm();
    if norm < SMALL_ANGLE {
        // 2 * atan(n / w) / n = 2 / w * (1 - n^2 / (3 w^2)) + O(n^4)
        imaginary * (2. / w) * (1. - norm * norm / (3. * w * w))
    } else {
        imaginary * (2. * norm.atan2(w) / norm)
    }
}

/// `V(φ) = I + (1 - cos θ) / θ² [φ]x + (θ - sin θ) / θ³ [φ]x²`
fn left_jacobian(phi: &Vector3<f64>) -> Matrix3<f64> {
    let theta = phi.norm();
    let phi_x = skew(phi);
    let (a, b) = if theta < SMALL_ANGLE {
        let theta_2 = theta * theta;
        (0.5 - theta_2 / 24., 1. / 6. - theta_2 / 120.)
    } else {
        let theta_2 = theta * theta;
        let half_sin = (0.5 * theta).sin();
        (
            2. * half_sin * half_sin / theta_2,
            (theta - theta.sin()) / (theta_2 * theta),
        )
    };
    Matrix3::identity() + phi_x * a + phi_x * phi_x * b
}

/// `V(φ)⁻¹ = I - [φ]x / 2 + (1 - θ/2 cot(θ/2)) / θ² [φ]x²`
fn left_jacobian_inverse(phi: &Vector3<f64>) -> Matrix3<f64> {
    let theta = phi.norm();
    let phi_x = skew(phi);
    let theta_2 = theta * theta;
    let c = if theta < SERIES_ANGLE {
        1. / 12. + theta_2 / 720. + theta_2 * theta_2 / 30240.
    } else {
        let half = 0.5 * theta;
        (1. - half * half.cos() / half.sin()) / theta_2
    };
    Matrix3::identity() - phi_x * 0.5 + phi_x * phi_x * c
}

#[cfg(test)]
mod tests {
    use crate::exception::DisplacementException;
    use crate::exponential_map::{direct, inverse, rotation_log};
    use crate::utils::{rxyz_to_rotation, Twist};
    use nalgebra::{Isometry3, UnitQuaternion, Vector3};
    use std::f64::consts::PI;

    fn slice_compare(a: &[f64], b: &[f64], thresh: f64) {
        assert_eq!(a.len(), b.len());
        for i in 0..a.len() {
            assert!((a[i] - b[i]).abs() < thresh, "{:?} != {:?}", a, b);
        }
    }

    fn pose(translation: [f64; 3], rxyz: [f64; 3]) -> Isometry3<f64> {
        let rotation = rxyz_to_rotation(&Vector3::from(rxyz));
        Isometry3::from_parts(Vector3::from(translation).into(), rotation.into())
    }

    #[test]
    fn translation_only_is_divided_by_time() {
        let twist = inverse(&pose([0.1, 0., 0.], [0.; 3]), 2.).unwrap();
        assert_eq!(twist, Twist::new(0.05, 0., 0., 0., 0., 0.));

        let twist = inverse(&pose([0.3, -0.2, 0.7], [0.; 3]), 0.5).unwrap();
        assert_eq!(twist, Twist::new(0.6, -0.4, 1.4, 0., 0., 0.));
    }

    #[test]
    fn round_trip_reproduces_displacement() {
        let displacements = [
            pose([0.1, 0., 0.], [0.; 3]),
            pose([0., 0., 0.], [0.2, 0., 0.]),
            pose([0.05, -0.02, 0.3], [0.1, -0.4, 0.25]),
            pose([-0.4, 0.1, 0.2], [1.2, 0.7, -2.1]),
            pose([0.01, 0.02, 0.03], [1e-7, -2e-7, 5e-8]),
            pose([0.2, 0.2, 0.], [PI - 1e-3, 0., 0.]),
        ];
        for displacement in displacements.iter() {
            for &dt in [0.01, 1., 2., 7.5].iter() {
                let twist = inverse(displacement, dt).unwrap();
                let reached = direct(&twist, dt);
                slice_compare(
                    reached.to_homogeneous().as_slice(),
                    displacement.to_homogeneous().as_slice(),
                    1e-9,
                );
            }
        }
    }

    #[test]
    fn half_turn_round_trip() {
        let displacement = pose([0.1, -0.3, 0.2], [0., PI, 0.]);
        let twist = inverse(&displacement, 1.).unwrap();
        assert!((twist.fixed_rows::<3>(3).norm() - PI).abs() < 1e-9);
        slice_compare(
            direct(&twist, 1.).to_homogeneous().as_slice(),
            displacement.to_homogeneous().as_slice(),
            1e-9,
        );
    }

    #[test]
    fn direct_of_pure_rotation_keeps_origin() {
        let twist = Twist::new(0., 0., 0., 0., 0., PI / 2.);
        let reached = direct(&twist, 1.);
        slice_compare(reached.translation.vector.as_slice(), &[0.; 3], 1e-12);
        slice_compare(
            (reached.rotation * Vector3::x()).as_slice(),
            Vector3::y().as_slice(),
            1e-12,
        );
    }

    #[test]
    fn direct_screw_motion() {
        // quarter turn around z while moving along x: the origin travels on a circle
        let twist = Twist::new(1., 0., 0., 0., 0., PI / 2.);
        let reached = direct(&twist, 1.);
        slice_compare(
            reached.translation.vector.as_slice(),
            &[2. / PI, 2. / PI, 0.],
            1e-12,
        );
    }

    #[test]
    fn small_angles_are_stable() {
        let tiny = UnitQuaternion::from_scaled_axis(Vector3::new(1e-12, 0., -3e-12));
        let log = rotation_log(&tiny);
        slice_compare(log.as_slice(), &[1e-12, 0., -3e-12], 1e-20);
        for x in log.iter() {
            assert!(x.is_finite());
        }
        let twist = inverse(&pose([0.1, 0., 0.], [1e-10, 0., 0.]), 1.).unwrap();
        for x in twist.iter() {
            assert!(x.is_finite());
        }
        assert!((twist[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn round_trip_near_the_series_cutoffs() {
        let translation = [1., -2., 1.5];
        for &angle in [0.9e-4, 1.0101e-4, 2e-4, 5e-4, 1e-3, 9.9e-3, 1.01e-2, 0.05].iter() {
            for axis in [Vector3::x(), Vector3::new(0.6, -0.8, 0.)].iter() {
                let rotation = UnitQuaternion::from_scaled_axis(axis * angle);
                let displacement =
                    Isometry3::from_parts(Vector3::from(translation).into(), rotation);
                let twist = inverse(&displacement, 1.).unwrap();
                let reached = direct(&twist, 1.);
                slice_compare(reached.translation.vector.as_slice(), &translation, 1e-12);
                slice_compare(
                    reached.rotation.coords.as_slice(),
                    rotation.coords.as_slice(),
                    1e-12,
                );
            }
        }
    }

    #[test]
    fn non_positive_time_is_rejected() {
        let displacement = pose([0.1, 0., 0.], [0.; 3]);
        for &dt in [0., -1., f64::NAN, f64::INFINITY].iter() {
            assert!(matches!(
                inverse(&displacement, dt),
                Err(DisplacementException::InvalidArgument { .. })
            ));
        }
    }
}
