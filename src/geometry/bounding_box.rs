use serde::{Deserialize, Serialize};

use super::predicates::Point3;

///
/// Axis-aligned box enclosing a point set. Used to reject queries cheaply and to
/// quantize the Z-order insertion sequence.
///
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox
{
    pub lower: Point3,
    pub upper: Point3,
}

impl BoundingBox
{
    pub fn new(lower: Point3, upper: Point3) -> Self
    {
        Self { lower, upper }
    }

    ///
    /// Smallest box containing `points`. Returns `None` for an empty slice.
    ///
    pub fn from_points(points: &[Point3]) -> Option<Self>
    {
        let first = points.first()?;
        let mut bbox = Self::new(*first, *first);
        for p in &points[1..]
        {
            for d in 0..3
            {
                bbox.lower[d] = bbox.lower[d].min(p[d]);
                bbox.upper[d] = bbox.upper[d].max(p[d]);
            }
        }
        Some(bbox)
    }

    ///
    /// Closed containment test. Non-finite coordinates are never contained.
    ///
    #[inline]
    pub fn contains(&self, point: &Point3) -> bool
    {
        (0..3).all(|d| self.lower[d] <= point[d] && point[d] <= self.upper[d])
    }
}

#[test]
fn test_bounding_box()
{
    let bbox = BoundingBox::from_points(&[[0.0, 5.0, -1.0], [2.0, 1.0, 3.0], [1.0, 2.0, 0.0]]).unwrap();
    assert_eq!(bbox.lower, [0.0, 1.0, -1.0]);
    assert_eq!(bbox.upper, [2.0, 5.0, 3.0]);
    assert!(bbox.contains(&[2.0, 1.0, 3.0]));
    assert!(!bbox.contains(&[2.0, 1.0, 3.5]));
    assert!(!bbox.contains(&[f64::NAN, 2.0, 0.0]));
    assert!(BoundingBox::from_points(&[]).is_none());
}
