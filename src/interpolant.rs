use std::sync::Arc;

use ndarray::{Array2, Array3, Axis};
use rayon::prelude::*;
use tracing::debug;

use crate::algorithms::interpolation::InterpolationOperation;
use crate::algorithms::locate::{Location, Locator};
use crate::errors::LirError;
use crate::geometry::predicates::Point3;
use crate::storage::query::QuerySet;
use crate::storage::training_grid::{CoefficientTensor, NUM_COEFFICIENTS};
use crate::triangulation::Triangulation;

///
/// Piecewise-linear interpolant of every coefficient channel over a shared triangulation.
/// Values outside the convex hull are NaN.
///
pub struct Interpolant
{
    triangulation: Arc<Triangulation>,
    tensor: CoefficientTensor,
    locator: Locator,
}

impl Interpolant
{
    pub fn new(triangulation: Arc<Triangulation>, tensor: CoefficientTensor) -> Result<Self, LirError>
    {
        let shape = tensor.values.shape();
        if shape[0] != triangulation.num_vertices() || shape[2] != NUM_COEFFICIENTS || shape[1] != tensor.variables.len()
        {
            return Err(LirError::TensorShapeMismatch { vertices: triangulation.num_vertices(), rows: shape[0], channels: shape[2] });
        }
        let locator = Locator::new(&triangulation)?;
        Ok(Self { triangulation, tensor, locator })
    }

    pub fn triangulation(&self) -> &Arc<Triangulation>
    {
        &self.triangulation
    }

    pub fn variables(&self) -> &[String]
    {
        &self.tensor.variables
    }

    pub fn num_channels(&self) -> usize
    {
        NUM_COEFFICIENTS
    }

    #[inline]
    pub fn locate(&self, p: &Point3) -> Location
    {
        self.locator.locate(&self.triangulation, p)
    }

    ///
    /// Interpolate every variable at every query point. Returns one `(points, 6)` array per
    /// variable, in variable order.
    ///
    pub fn evaluate(&self, queries: &QuerySet) -> Vec<Array2<f64>>
    {
        let locations: Vec<Location> = queries.points().iter().map(|p| self.locate(p)).collect();
        self.gather(&locations)
    }

    ///
    /// Same as [`Interpolant::evaluate`], locating points on the rayon pool.
    ///
    pub fn evaluate_parallel(&self, queries: &QuerySet) -> Vec<Array2<f64>>
    {
        let locations: Vec<Location> = queries.points().par_iter().map(|p| self.locate(p)).collect();
        self.gather(&locations)
    }

    ///
    /// Interpolate a single point, shape `(variables, 6)`.
    ///
    pub fn evaluate_point(&self, p: Point3) -> Array2<f64>
    {
        let mut out = Array2::zeros((self.tensor.num_variables(), NUM_COEFFICIENTS));
        self.operation().apply(&self.locate(&p), out.view_mut());
        out
    }

    fn operation(&self) -> InterpolationOperation<'_>
    {
        InterpolationOperation(&self.triangulation, self.tensor.values.view())
    }

    fn gather(&self, locations: &[Location]) -> Vec<Array2<f64>>
    {
        let operation = self.operation();
        let mut results = Array3::zeros((locations.len(), self.tensor.num_variables(), NUM_COEFFICIENTS));
        for (location, out) in locations.iter().zip(results.outer_iter_mut())
        {
            operation.apply(location, out);
        }
        let outside = locations.iter().filter(|l| l.is_outside()).count();
        debug!(points = locations.len(), outside, "evaluated interpolant");
        results.axis_iter(Axis(1)).map(|per_variable| per_variable.to_owned()).collect()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const TETRAHEDRON: [Point3; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    fn tensor_from(points: &[Point3], fields: &[fn(&Point3) -> f64]) -> CoefficientTensor
    {
        let values = Array3::from_shape_fn((points.len(), fields.len(), NUM_COEFFICIENTS), |(v, d, k)|
        {
            fields[d](&points[v]) * (k + 1) as f64
        });
        CoefficientTensor { variables: (0..fields.len()).map(|d| format!("var{d}")).collect(), values }
    }

    fn interpolant(points: &[Point3], fields: &[fn(&Point3) -> f64]) -> Interpolant
    {
        let triangulation = Arc::new(Triangulation::new(points).unwrap());
        Interpolant::new(triangulation, tensor_from(points, fields)).unwrap()
    }

    #[test]
    fn centroid_is_vertex_average()
    {
        let values = [[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [10.0, 20.0, 30.0, 40.0, 50.0, 60.0], [100.0; 6], [0.0; 6]];
        let tensor = CoefficientTensor
        {
            variables: vec!["TA".to_owned()],
            values: Array3::from_shape_fn((4, 1, 6), |(v, _, k)| values[v][k]),
        };
        let interp = Interpolant::new(Arc::new(Triangulation::new(&TETRAHEDRON).unwrap()), tensor).unwrap();
        let result = interp.evaluate(&QuerySet::new(vec![[0.25, 0.25, 0.25]]));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].shape(), [1, 6]);
        for k in 0..6
        {
            let expected = (values[0][k] + values[1][k] + values[2][k] + values[3][k]) / 4.0;
            assert_relative_eq!(result[0][[0, k]], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn far_points_are_nan()
    {
        let interp = interpolant(&TETRAHEDRON, &[|p| p[0] + p[1]]);
        let result = interp.evaluate(&QuerySet::new(vec![[1000.0, 1000.0, 1000.0], [0.1, 0.1, 0.1], [f64::INFINITY, 0.1, 0.1]]));
        assert!(result[0].row(0).iter().all(|x| x.is_nan()));
        assert!(result[0].row(1).iter().all(|x| x.is_finite()));
        assert!(result[0].row(2).iter().all(|x| x.is_nan()));
    }

    #[test]
    fn vertices_are_reproduced_exactly()
    {
        let points = [[0.0, 0.0, 0.0], [2.0, 0.1, 0.0], [0.3, 1.7, 0.2], [0.1, 0.2, 1.9], [1.1, 1.3, 1.2], [0.7, 0.5, 0.4]];
        let interp = interpolant(&points, &[|p| (p[0] * 3.1).sin() + p[2].exp(), |p| p[1] * p[1]]);
        let result = interp.evaluate(&QuerySet::new(points.to_vec()));
        for (v, p) in points.iter().enumerate()
        {
            for d in 0..2
            {
                for k in 0..6
                {
                    assert_eq!(result[d][[v, k]], interp.tensor.values[[v, d, k]], "vertex {p:?}");
                }
            }
        }
    }

    #[test]
    fn empty_query_yields_empty_arrays()
    {
        let interp = interpolant(&TETRAHEDRON, &[|p| p[0], |p| p[1], |p| p[2]]);
        let result = interp.evaluate(&QuerySet::default());
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|r| r.shape() == [0, 6]));
    }

    #[test]
    fn point_evaluation_matches_batch()
    {
        let interp = interpolant(&TETRAHEDRON, &[|p| p[0] - 2.0 * p[2], |p| p[1]]);
        let p = [0.2, 0.3, 0.1];
        let single = interp.evaluate_point(p);
        let batch = interp.evaluate(&QuerySet::new(vec![p]));
        assert_eq!(single.shape(), [2, 6]);
        for d in 0..2
        {
            assert_eq!(single.row(d), batch[d].row(0));
        }
    }

    #[test]
    fn rejects_mismatched_tensor()
    {
        let triangulation = Arc::new(Triangulation::new(&TETRAHEDRON).unwrap());
        let tensor = tensor_from(&TETRAHEDRON[..3], &[|p| p[0]]);
        assert!(matches!(Interpolant::new(triangulation.clone(), tensor), Err(LirError::TensorShapeMismatch { vertices: 4, rows: 3, .. })));
        let tensor = CoefficientTensor { variables: vec!["TA".to_owned()], values: Array3::zeros((4, 1, 5)) };
        assert!(matches!(Interpolant::new(triangulation, tensor), Err(LirError::TensorShapeMismatch { channels: 5, .. })));
    }

    #[test]
    fn serial_and_parallel_agree()
    {
        let mut points = Vec::new();
        for i in 0..5
        {
            for j in 0..5
            {
                for k in 0..5
                {
                    let jitter = ((i * 31 + j * 17 + k * 7) % 11) as f64 * 0.01;
                    points.push([i as f64 + jitter, j as f64 - jitter, k as f64 + 0.5 * jitter]);
                }
            }
        }
        let interp = interpolant(&points, &[|p| p[0] * p[1] - p[2], |p| (p[0] + p[2]).cos()]);
        let queries = QuerySet::new((0..400).map(|n| { let t = n as f64; [(t * 0.37) % 5.0 - 0.2, (t * 0.53) % 5.0, (t * 0.71) % 4.5] }).collect());
        let serial = interp.evaluate(&queries);
        let parallel = interp.evaluate_parallel(&queries);
        for (s, p) in serial.iter().zip(&parallel)
        {
            assert!(s.iter().zip(p).all(|(a, b)| a.to_bits() == b.to_bits()));
        }
    }

    #[test]
    fn reloaded_triangulation_interpolates_identically()
    {
        let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0, 1.2], [0.4, 0.3, 0.9]];
        let fields: [fn(&Point3) -> f64; 1] = [|p| p[0] * p[0] + p[1] - p[2]];
        let original = interpolant(&points, &fields);
        let bytes = original.triangulation().to_bytes(crate::serialization::SerializationFormat::BincodeLz4).unwrap();
        let reloaded = Interpolant::new(Arc::new(Triangulation::read_buffer(&bytes).unwrap()), tensor_from(&points, &fields)).unwrap();
        let queries = QuerySet::new(vec![[0.2, 0.2, 0.2], [0.5, 0.5, 0.6], [0.9, 0.9, 0.0], [0.4, 0.3, 0.9]]);
        let a = original.evaluate(&queries);
        let b = reloaded.evaluate(&queries);
        assert!(a[0].iter().zip(b[0].iter()).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    proptest!
    {
        #![proptest_config(ProptestConfig::with_cases(32))]
        #[test]
        fn linear_fields_are_reproduced(
            cloud in prop::collection::vec(prop::array::uniform3(-10.0f64..10.0), 12..60),
            weights in prop::array::uniform4(0.05f64..1.0),
            gradient in prop::array::uniform3(-5.0f64..5.0),
        )
        {
            let Ok(triangulation) = Triangulation::new(&cloud) else { return Ok(()) };
            prop_assume!(!triangulation.is_empty());
            let field = |p: &Point3| 1.5 + gradient[0] * p[0] + gradient[1] * p[1] + gradient[2] * p[2];
            let values = Array3::from_shape_fn((cloud.len(), 1, NUM_COEFFICIENTS), |(v, _, k)| field(&cloud[v]) * (k + 1) as f64);
            let interp = Interpolant::new(Arc::new(triangulation), CoefficientTensor { variables: vec!["f".to_owned()], values }).unwrap();

            // a convex combination of one cell's corners is inside the hull
            let corners = interp.triangulation().cell_points(0);
            let total: f64 = weights.iter().sum();
            let mut q = [0.0; 3];
            for (corner, w) in corners.iter().zip(weights)
            {
                for axis in 0..3
                {
                    q[axis] += corner[axis] * w / total;
                }
            }

            let result = interp.evaluate_point(q);
            for k in 0..NUM_COEFFICIENTS
            {
                let expected = field(&q) * (k + 1) as f64;
                prop_assert!((result[[0, k]] - expected).abs() <= 1e-7 * (1.0 + expected.abs()), "{} vs {}", result[[0, k]], expected);
            }
        }
    }
}
