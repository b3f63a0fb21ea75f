use ndarray::{ArrayView3, ArrayViewMut2};

use crate::triangulation::Triangulation;
use super::locate::Location;

///
/// Applies located query points to a `(vertices, variables, channels)` value tensor.
/// One location serves every variable and channel.
///
pub(crate) struct InterpolationOperation<'a>(pub &'a Triangulation, pub ArrayView3<'a, f64>);

impl InterpolationOperation<'_>
{
    ///
    /// Write the interpolated `(variables, channels)` block for `location` into `out`.
    /// Outside locations fill `out` with NaN.
    ///
    #[inline]
    pub(crate) fn apply(&self, location: &Location, mut out: ArrayViewMut2<f64>)
    {
        match *location
        {
            Location::Vertex(v) => out.assign(&self.1.index_axis(ndarray::Axis(0), v as usize)),
            Location::Cell { cell, weights } =>
            {
                out.fill(0.0);
                for (&v, &w) in self.0.cells()[cell as usize].iter().zip(&weights)
                {
                    out.scaled_add(w, &self.1.index_axis(ndarray::Axis(0), v as usize));
                }
            },
            Location::Outside => out.fill(f64::NAN),
        }
    }
}

#[test]
fn test_apply_weights_vertices()
{
    use ndarray::{Array2, Array3};
    let tri = Triangulation::new(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]).unwrap();
    let values = Array3::from_shape_fn((4, 2, 3), |(v, d, k)| (v * 100 + d * 10 + k) as f64);
    let op = InterpolationOperation(&tri, values.view());
    let mut out = Array2::zeros((2, 3));

    op.apply(&Location::Vertex(2), out.view_mut());
    assert_eq!(out, values.index_axis(ndarray::Axis(0), 2));

    op.apply(&Location::Cell { cell: 0, weights: [0.25; 4] }, out.view_mut());
    let cell = tri.cells()[0];
    for d in 0..2
    {
        for k in 0..3
        {
            let expected: f64 = cell.iter().map(|&v| values[[v as usize, d, k]]).sum::<f64>() / 4.0;
            assert!((out[[d, k]] - expected).abs() < 1e-12);
        }
    }

    op.apply(&Location::Outside, out.view_mut());
    assert!(out.iter().all(|x| x.is_nan()));
}
