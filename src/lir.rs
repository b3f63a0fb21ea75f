use std::sync::Arc;

use indexmap::IndexMap;
use ndarray::Array2;
use tracing::info;

use crate::cache::TriangulationCache;
use crate::errors::LirError;
use crate::interpolant::Interpolant;
use crate::options::InterpolationOptions;
use crate::storage::query::{QueryRecord, QuerySet};
use crate::storage::training_grid::{GridRecord, TrainingGrid};

///
/// Interpolated coefficients for both query regions. Result vectors hold one `(points, 6)`
/// array per requested variable; both interpolant handles share the same instance.
///
pub struct LirOutput
{
    pub special_results: Vec<Array2<f64>>,
    pub special_interpolant: Arc<Interpolant>,
    pub other_results: Vec<Array2<f64>>,
    pub other_interpolant: Arc<Interpolant>,
}

///
/// Interpolate the coefficients of every variable in `training_grids` at the special-region
/// and other-region query points. The triangulation comes from the cache at
/// `options.cache_path`, which is built and written on first use.
///
pub fn interpolate(training_grids: &IndexMap<String, GridRecord>, special_region: &IndexMap<String, QueryRecord>,
    other_region: &IndexMap<String, QueryRecord>, options: &InterpolationOptions) -> Result<LirOutput, LirError>
{
    let grid = TrainingGrid::from_records(training_grids)?;
    let special_queries = QuerySet::from_records(special_region)?;
    let other_queries = QuerySet::from_records(other_region)?;

    let cache = TriangulationCache::from_options(options);
    let triangulation = Arc::new(cache.get_or_build(grid.points())?);
    let interpolant = Arc::new(Interpolant::new(triangulation, grid.into_tensor())?);

    let evaluate = |queries: &QuerySet| if options.parallel { interpolant.evaluate_parallel(queries) } else { interpolant.evaluate(queries) };
    let special_results = evaluate(&special_queries);
    let other_results = evaluate(&other_queries);
    info!(variables = interpolant.variables().len(), special = special_queries.len(), other = other_queries.len(), "interpolated LIR coefficients");

    Ok(LirOutput { special_results, special_interpolant: interpolant.clone(), other_results, other_interpolant: interpolant })
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::algorithms::delaunay::tests::{grid, steps};
    use crate::cache::CacheLookup;
    use crate::geometry::predicates::Point3;
    use crate::storage::training_grid::tests::record_from;
    use approx::assert_relative_eq;

    const TETRAHEDRON: [Point3; 4] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    fn queries(points: &[Point3]) -> IndexMap<String, QueryRecord>
    {
        let mut records = IndexMap::new();
        records.insert("TA".to_owned(), QueryRecord
        {
            longitude: points.iter().map(|p| p[0]).collect(),
            latitude: points.iter().map(|p| p[1]).collect(),
            d2d: points.iter().map(|p| p[2]).collect(),
        });
        records
    }

    fn grids() -> IndexMap<String, GridRecord>
    {
        let mut grids = IndexMap::new();
        grids.insert("TA".to_owned(), record_from(&TETRAHEDRON, |p| 4.0 * p[0]));
        grids.insert("DIC".to_owned(), record_from(&TETRAHEDRON, |p| p[1] - p[2]));
        grids
    }

    #[test]
    fn interpolates_both_regions()
    {
        let dir = tempfile::tempdir().unwrap();
        let options = InterpolationOptions::from_data_root(dir.path());
        let output = interpolate(&grids(), &queries(&[[0.25, 0.25, 0.25], [5.0, 5.0, 5.0]]), &queries(&[]), &options).unwrap();

        assert!(Arc::ptr_eq(&output.special_interpolant, &output.other_interpolant));
        assert_eq!(output.special_interpolant.variables(), ["TA", "DIC"]);
        assert_eq!(output.special_results.len(), 2);
        assert_eq!(output.special_results[0].shape(), [2, 6]);
        for k in 0..6
        {
            assert_relative_eq!(output.special_results[0][[0, k]], 1.0 + k as f64, epsilon = 1e-12);
            assert_relative_eq!(output.special_results[1][[0, k]], k as f64, epsilon = 1e-12);
        }
        assert!(output.special_results[0].row(1).iter().all(|x| x.is_nan()));
        assert!(output.other_results.iter().all(|r| r.shape() == [0, 6]));
        assert!(matches!(TriangulationCache::from_options(&options).lookup(), CacheLookup::Present(_)));
    }

    #[test]
    fn parallel_option_gives_same_results()
    {
        let dir = tempfile::tempdir().unwrap();
        let mut options = InterpolationOptions::from_data_root(dir.path());
        let points = [[0.1, 0.2, 0.3], [0.3, 0.3, 0.3], [1.0, 0.0, 0.0], [-0.1, 0.0, 0.0]];
        let serial = interpolate(&grids(), &queries(&points), &queries(&points), &options).unwrap();
        options.parallel = true;
        let parallel = interpolate(&grids(), &queries(&points), &queries(&points), &options).unwrap();
        for (a, b) in serial.other_results.iter().zip(&parallel.other_results)
        {
            assert!(a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits()));
        }
    }

    #[test]
    fn malformed_query_fails_before_building()
    {
        let dir = tempfile::tempdir().unwrap();
        let options = InterpolationOptions::from_data_root(dir.path());
        let mut bad = queries(&[[0.1, 0.1, 0.1]]);
        bad["TA"].d2d.clear();
        assert!(matches!(interpolate(&grids(), &queries(&[]), &bad, &options), Err(LirError::MalformedQuery { .. })));
        assert!(matches!(interpolate(&grids(), &IndexMap::new(), &queries(&[]), &options), Err(LirError::MalformedQuery { .. })));
        assert!(!options.cache_path.exists());
    }

    #[test]
    fn empty_training_grid_is_insufficient()
    {
        let dir = tempfile::tempdir().unwrap();
        let options = InterpolationOptions::from_data_root(dir.path());
        let result = interpolate(&IndexMap::new(), &queries(&[]), &queries(&[]), &options);
        assert!(matches!(result, Err(LirError::InsufficientTrainingData { .. })));
    }

    #[test]
    fn stale_cache_with_other_vertex_count_is_rejected()
    {
        let dir = tempfile::tempdir().unwrap();
        let options = InterpolationOptions::from_data_root(dir.path());
        let mut larger = TETRAHEDRON.to_vec();
        larger.push([1.0, 1.0, 1.0]);
        TriangulationCache::from_options(&options).get_or_build(&larger).unwrap();
        let result = interpolate(&grids(), &queries(&[]), &queries(&[]), &options);
        assert!(matches!(result, Err(LirError::TensorShapeMismatch { vertices: 5, rows: 4, .. })));
    }

    #[test]
    fn ocean_grid_reproduces_vertices_and_linear_fields()
    {
        let dir = tempfile::tempdir().unwrap();
        let options = InterpolationOptions::from_data_root(dir.path());
        let points = grid(&steps(-180.0, 180.0, 30.0), &steps(-90.0, 90.0, 30.0), &[0.0, 0.5, 1.0]);
        let field = |p: &Point3| 2.0 * p[0] - p[1] + 100.0 * p[2];
        let mut training = IndexMap::new();
        training.insert("TA".to_owned(), record_from(&points, field));

        // Every vertex, then interior blends of two vertices and the grid centre.
        let mut interior = Vec::new();
        for (i, a) in points.iter().enumerate()
        {
            let b = points[(i * 37 + 11) % points.len()];
            interior.push([0, 1, 2].map(|d| 0.6 * a[d] + 0.3 * b[d] + 0.1 * [0.0, 0.0, 0.5][d]));
        }
        interior.extend([[179.9, 89.9, 0.99], [-179.9, -89.9, 0.01], [0.0, 0.0, 0.5], [-165.0, 75.0, 0.25]]);
        let output = interpolate(&training, &queries(&points), &queries(&interior), &options).unwrap();

        let at_vertices = &output.special_results[0];
        for (v, p) in points.iter().enumerate()
        {
            for k in 0..6
            {
                assert_eq!(at_vertices[[v, k]].to_bits(), (field(p) + k as f64).to_bits(), "vertex {v} channel {k}");
            }
        }
        let inside = &output.other_results[0];
        for (q, p) in interior.iter().enumerate()
        {
            for k in 0..6
            {
                assert_relative_eq!(inside[[q, k]], field(p) + k as f64, epsilon = 1e-9);
            }
        }
    }
}
