// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! contains useful type definitions and conversion functions.
use nalgebra::{Isometry3, Matrix3, Rotation3, SMatrix, SVector, Vector3};

/// A Vector with 6 entries
pub type Vector6 = SVector<f64, 6>;
/// A Matrix with 6 rows and 6 columns
pub type Matrix6 = SMatrix<f64, 6, 6>;
/// A twist `[v; ω]`: linear velocity in \[m/s\] followed by angular velocity in \[rad/s\].
pub type Twist = Vector6;

/// Builds a rotation from a `Rxyz` vector, i.e. `R = Rx(rxyz.x) * Ry(rxyz.y) * Rz(rxyz.z)`.
pub fn rxyz_to_rotation(rxyz: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), rxyz.x)
        * Rotation3::from_axis_angle(&Vector3::y_axis(), rxyz.y)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), rxyz.z)
}

/// Skew-symmetric matrix `[v]x` such that `[v]x * w == v.cross(w)`.
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0., -v.z, v.y, v.z, 0., -v.x, -v.y, v.x, 0.)
}

/// Velocity twist matrix of a pose `aMb`.
///
/// Re-expresses a `[v; ω]` twist given in frame `b` in frame `a`:
/// ```text
/// aVb = | R   [t]x R |
///       | 0     R    |
/// ```
pub fn velocity_twist_matrix(pose: &Isometry3<f64>) -> Matrix6 {
    let rotation = pose.rotation.to_rotation_matrix().into_inner();
    let translation = pose.translation.vector;
    let mut out = Matrix6::zeros();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
    out.fixed_view_mut::<3, 3>(0, 3)
        .copy_from(&(skew(&translation) * rotation));
    out.fixed_view_mut::<3, 3>(3, 3).copy_from(&rotation);
    out
}

/// Block diagonal velocity twist matrix which only rotates a `[v; ω]` twist.
pub fn rotation_twist_matrix(rotation: &Rotation3<f64>) -> Matrix6 {
    let mut out = Matrix6::zeros();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation.matrix());
    out.fixed_view_mut::<3, 3>(3, 3).copy_from(rotation.matrix());
    out
}

#[cfg(test)]
mod test {
    use crate::utils::{
        rotation_twist_matrix, rxyz_to_rotation, skew, velocity_twist_matrix, Vector6,
    };
    use nalgebra::{Isometry3, Rotation3, Vector3};
    use std::f64::consts::PI;

    fn slice_compare(a: &[f64], b: &[f64], thresh: f64) {
        assert_eq!(a.len(), b.len());
        for i in 0..a.len() {
            float_compare(a[i], b[i], thresh);
        }
    }

    fn float_compare(a: f64, b: f64, thresh: f64) {
        assert!((a - b).abs() < thresh, "{} != {}", a, b);
    }

    #[test]
    fn rxyz_single_axes() {
        let rx = rxyz_to_rotation(&Vector3::new(PI / 2., 0., 0.));
        slice_compare(
            (rx * Vector3::y()).as_slice(),
            Vector3::z().as_slice(),
            1e-12,
        );
        let rz = rxyz_to_rotation(&Vector3::new(0., 0., PI / 2.));
        slice_compare(
            (rz * Vector3::x()).as_slice(),
            Vector3::y().as_slice(),
            1e-12,
        );
    }

    #[test]
    fn rxyz_composition_order() {
        let rxyz = Vector3::new(0.3, -0.2, 0.9);
        let expected = Rotation3::from_axis_angle(&Vector3::x_axis(), 0.3)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), -0.2)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), 0.9);
        slice_compare(
            rxyz_to_rotation(&rxyz).matrix().as_slice(),
            expected.matrix().as_slice(),
            1e-12,
        );
    }

    #[test]
    fn skew_is_cross_product() {
        let a = Vector3::new(1., -2., 0.5);
        let b = Vector3::new(0.3, 0.7, -1.1);
        slice_compare((skew(&a) * b).as_slice(), a.cross(&b).as_slice(), 1e-12);
    }

    #[test]
    fn velocity_twist_matrix_moves_point_velocity() {
        // pure rotation about z of frame b, seen from a frame displaced along x
        let pose = Isometry3::new(Vector3::new(1., 0., 0.), Vector3::zeros());
        let twist_b = Vector6::new(0., 0., 0., 0., 0., 1.);
        let twist_a = velocity_twist_matrix(&pose) * twist_b;
        slice_compare(
            twist_a.as_slice(),
            &[0., -1., 0., 0., 0., 1.],
            1e-12,
        );
    }

    #[test]
    fn rotation_twist_matrix_is_block_diagonal() {
        let rotation = rxyz_to_rotation(&Vector3::new(0.1, 0.2, 0.3));
        let matrix = rotation_twist_matrix(&rotation);
        let pose = Isometry3::from_parts(Vector3::zeros().into(), rotation.into());
        slice_compare(
            matrix.as_slice(),
            velocity_twist_matrix(&pose).as_slice(),
            1e-12,
        );
    }
}
