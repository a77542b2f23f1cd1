//! Pivot calibration
//!
//! A tool pivoting about a fixed point satisfies `R_i * tip + p_i = pivot`
//! for every tracked pose `(R_i, p_i)`. Stacking the poses gives the
//! overdetermined system `[R_i  -I] [tip; pivot] = -p_i`, solved here by SVD.

use markupmodel_core::{Error, Result};
use nalgebra::{DMatrix, DVector, Isometry3, Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Minimum number of poses accepted by [`compute_pivot_calibration`]
pub const MIN_PIVOT_SAMPLES: usize = 3;

/// Singular values below this fraction of the largest are treated as zero
const RANK_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotCalibration {
    /// Tip position in the tool's own frame
    pub tip_offset: Vector3<f64>,
    /// Pivot position in the tracker frame
    pub pivot_point: Point3<f64>,
    /// Root mean square distance between each pose's tip and the pivot
    pub rms_error: f64,
}

/// Solve for the tool tip offset and pivot point
///
/// Fails with [`Error::InvalidData`] below [`MIN_PIVOT_SAMPLES`] poses and
/// with [`Error::Degenerate`] when the rotations do not vary enough to
/// determine the tip.
pub fn compute_pivot_calibration(poses: &[Isometry3<f64>]) -> Result<PivotCalibration> {
    if poses.len() < MIN_PIVOT_SAMPLES {
        return Err(Error::InvalidData(format!(
            "Pivot calibration needs at least {} poses, got {}",
            MIN_PIVOT_SAMPLES,
            poses.len()
        )));
    }

    let rows = poses.len() * 3;
    let mut a = DMatrix::<f64>::zeros(rows, 6);
    let mut b = DVector::<f64>::zeros(rows);
    let minus_identity = -Matrix3::<f64>::identity();

    for (i, pose) in poses.iter().enumerate() {
        let rotation = pose.rotation.to_rotation_matrix();
        a.fixed_view_mut::<3, 3>(i * 3, 0).copy_from(rotation.matrix());
        a.fixed_view_mut::<3, 3>(i * 3, 3).copy_from(&minus_identity);
        b.fixed_rows_mut::<3>(i * 3).copy_from(&(-pose.translation.vector));
    }

    let svd = a.svd(true, true);
    let largest = svd.singular_values.max();
    let smallest = svd.singular_values.min();
    if largest <= 0.0 || smallest / largest < RANK_TOLERANCE {
        return Err(Error::Degenerate(
            "Poses do not rotate about enough axes to locate the tip".to_string(),
        ));
    }

    let solution = svd
        .solve(&b, RANK_TOLERANCE * largest)
        .map_err(|e| Error::Algorithm(format!("Pivot least squares failed: {}", e)))?;

    let tip_offset = Vector3::new(solution[0], solution[1], solution[2]);
    let pivot_point = Point3::new(solution[3], solution[4], solution[5]);

    let squared_sum: f64 = poses
        .iter()
        .map(|pose| (pose * Point3::from(tip_offset) - pivot_point).norm_squared())
        .sum();
    let rms_error = (squared_sum / poses.len() as f64).sqrt();

    log::info!(
        "Pivot calibration from {} poses: tip {:?}, RMS error {:.4}",
        poses.len(),
        tip_offset,
        rms_error
    );

    Ok(PivotCalibration {
        tip_offset,
        pivot_point,
        rms_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    /// Poses of a tool with tip `tip` pivoting about `pivot`
    fn pivot_poses(tip: Vector3<f64>, pivot: Point3<f64>) -> Vec<Isometry3<f64>> {
        let angles = [
            (0.3, 0.0, 0.0),
            (-0.3, 0.1, 0.0),
            (0.0, 0.4, 0.2),
            (0.1, -0.35, -0.1),
            (0.25, 0.25, 0.5),
            (-0.2, -0.1, 1.2),
        ];
        angles
            .iter()
            .map(|&(roll, pitch, yaw)| {
                let rotation = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
                let translation = pivot.coords - rotation * tip;
                Isometry3::from_parts(Translation3::from(translation), rotation)
            })
            .collect()
    }

    #[test]
    fn test_recovers_exact_pivot() {
        let tip = Vector3::new(0.0, 0.0, -150.0);
        let pivot = Point3::new(12.0, -40.0, 300.0);
        let result = compute_pivot_calibration(&pivot_poses(tip, pivot)).unwrap();

        assert_relative_eq!(result.tip_offset, tip, epsilon = 1e-6);
        assert_relative_eq!(result.pivot_point, pivot, epsilon = 1e-6);
        assert!(result.rms_error < 1e-6);
    }

    #[test]
    fn test_noise_shows_in_rms() {
        let tip = Vector3::new(5.0, 2.0, -120.0);
        let pivot = Point3::new(0.0, 0.0, 0.0);
        let mut poses = pivot_poses(tip, pivot);
        for (i, pose) in poses.iter_mut().enumerate() {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            pose.translation.vector += Vector3::new(0.5 * sign, -0.25 * sign, 0.1);
        }

        let result = compute_pivot_calibration(&poses).unwrap();
        assert!(result.rms_error > 1e-3);
        assert!(result.rms_error < 1.0);
        assert!((result.tip_offset - tip).norm() < 20.0);
    }

    #[test]
    fn test_too_few_poses() {
        let poses = pivot_poses(Vector3::z(), Point3::origin());
        assert!(matches!(
            compute_pivot_calibration(&poses[..2]),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_pure_translation_is_degenerate() {
        let poses: Vec<_> = (0..5)
            .map(|i| Isometry3::translation(i as f64, 0.0, 0.0))
            .collect();
        assert!(matches!(compute_pivot_calibration(&poses), Err(Error::Degenerate(_))));
    }
}
