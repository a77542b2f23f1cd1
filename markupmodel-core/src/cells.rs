//! Poly-line cells and the lined point set fed to volumetric filters

use crate::point::*;
use crate::point_cloud::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single poly-line cell referencing points by index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolyLine {
    pub point_ids: Vec<usize>,
}

impl PolyLine {
    /// Poly-line visiting points `0..count` in order
    pub fn through(count: usize) -> Self {
        Self {
            point_ids: (0..count).collect(),
        }
    }

    /// Number of point references in the cell
    pub fn len(&self) -> usize {
        self.point_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point_ids.is_empty()
    }
}

/// Points plus line topology
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinedPointSet {
    pub points: PointCloud<Point3f>,
    pub lines: Vec<PolyLine>,
}

impl LinedPointSet {
    pub fn new(points: PointCloud<Point3f>, lines: Vec<PolyLine>) -> Self {
        Self { points, lines }
    }

    /// Check that every line references an existing point
    pub fn validate(&self) -> Result<()> {
        let count = self.points.len();
        for (cell, line) in self.lines.iter().enumerate() {
            if let Some(&id) = line.point_ids.iter().find(|&&id| id >= count) {
                return Err(Error::InvalidData(format!(
                    "Line {} references point {} but only {} points exist",
                    cell, id, count
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_through() {
        let line = PolyLine::through(5);
        assert_eq!(line.point_ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(line.len(), 5);
        assert!(PolyLine::through(0).is_empty());
    }

    #[test]
    fn test_validate_rejects_out_of_range_ids() {
        let points = PointCloud::from_points(vec![Point3f::origin(), Point3f::new(1.0, 0.0, 0.0)]);
        let ok = LinedPointSet::new(points.clone(), vec![PolyLine::through(2)]);
        assert!(ok.validate().is_ok());

        let bad = LinedPointSet::new(points, vec![PolyLine { point_ids: vec![0, 2] }]);
        assert!(matches!(bad.validate(), Err(Error::InvalidData(_))));
    }
}
