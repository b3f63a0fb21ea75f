//! Fixed-dimension (3-D) geometric predicates used by construction and point location.
//!
//! Signs follow one convention throughout: a tetrahedron `(a, b, c, d)` is positively
//! oriented when `(b - a) · ((c - a) × (d - a)) > 0`, and every cell stored in a
//! [`Triangulation`](crate::triangulation::Triangulation) is positively oriented.
//!
//! [`orientation`] and [`insphere`] are exact: a floating-point evaluation is accepted when
//! its magnitude clears a forward error bound, otherwise the determinant is recomputed with
//! [`expansion`](super::expansion) arithmetic.

use super::expansion::{self, Expansion};

pub type Point3 = [f64; 3];

/// Unit roundoff, `2^-53`.
const ROUNDOFF: f64 = f64::EPSILON / 2.0;
const ORIENT_ERROR_BOUND: f64 = 16.0 * ROUNDOFF;
const INSPHERE_ERROR_BOUND: f64 = 48.0 * ROUNDOFF;

/// Orientation of four points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation
{
    NEGATIVE,
    DEGENERATE,
    POSITIVE,
}

/// Position of a point relative to a circumsphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InSphere
{
    OUTSIDE,
    BOUNDARY,
    INSIDE,
}

impl Orientation
{
    fn from_sign(sign: i32) -> Self
    {
        match sign
        {
            s if s > 0 => Orientation::POSITIVE,
            s if s < 0 => Orientation::NEGATIVE,
            _ => Orientation::DEGENERATE,
        }
    }
}

#[inline]
pub(crate) fn sub(a: &Point3, b: &Point3) -> Point3
{
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn det3(u: &Point3, v: &Point3, w: &Point3) -> f64
{
    u[0] * (v[1] * w[2] - v[2] * w[1]) - u[1] * (v[0] * w[2] - v[2] * w[0]) + u[2] * (v[0] * w[1] - v[1] * w[0])
}

/// Permanent of the absolute values, bounding the rounding error of [`det3`].
#[inline]
fn permanent3(u: &Point3, v: &Point3, w: &Point3) -> f64
{
    u[0].abs() * ((v[1] * w[2]).abs() + (v[2] * w[1]).abs())
        + u[1].abs() * ((v[0] * w[2]).abs() + (v[2] * w[0]).abs())
        + u[2].abs() * ((v[0] * w[1]).abs() + (v[1] * w[0]).abs())
}

fn exact_difference(a: &Point3, b: &Point3) -> [Expansion; 3]
{
    [0, 1, 2].map(|i| expansion::difference(a[i], b[i]))
}

///
/// Signed volume determinant `(b - a) · ((c - a) × (d - a))` (six times the signed volume).
/// Plain floating point; use [`orientation`] when the sign matters.
///
#[inline]
pub fn orient3d(a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> f64
{
    det3(&sub(b, a), &sub(c, a), &sub(d, a))
}

///
/// Exact orientation of `d` relative to the plane through `a`, `b`, `c`.
///
pub fn orientation(a: &Point3, b: &Point3, c: &Point3, d: &Point3) -> Orientation
{
    let (u, v, w) = (sub(b, a), sub(c, a), sub(d, a));
    let det = det3(&u, &v, &w);
    let bound = ORIENT_ERROR_BOUND * permanent3(&u, &v, &w);
    if det > bound
    {
        return Orientation::POSITIVE;
    }
    if det < -bound
    {
        return Orientation::NEGATIVE;
    }
    let exact = expansion::det3(&exact_difference(b, a), &exact_difference(c, a), &exact_difference(d, a));
    Orientation::from_sign(expansion::sign(&exact))
}

///
/// Exact in-sphere test of `e` against the circumsphere of the positively oriented
/// tetrahedron `(a, b, c, d)`. For a negatively oriented tetrahedron `INSIDE` and
/// `OUTSIDE` swap.
///
pub fn insphere(a: &Point3, b: &Point3, c: &Point3, d: &Point3, e: &Point3) -> InSphere
{
    let rows = [sub(a, e), sub(b, e), sub(c, e), sub(d, e)];
    let lift = rows.map(|r| r[0] * r[0] + r[1] * r[1] + r[2] * r[2]);
    let others = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];

    // Cofactor expansion along the lifted column.
    let mut det = 0.0;
    let mut magnitude = 0.0;
    for (i, [j, k, l]) in others.into_iter().enumerate()
    {
        let minor = det3(&rows[j], &rows[k], &rows[l]);
        let term = lift[i] * minor;
        det += if i % 2 == 0 { -term } else { term };
        magnitude += lift[i] * permanent3(&rows[j], &rows[k], &rows[l]);
    }

    let bound = INSPHERE_ERROR_BOUND * magnitude;
    let sign = if det > bound
    {
        1
    }
    else if det < -bound
    {
        -1
    }
    else
    {
        insphere_exact(&[*a, *b, *c, *d], e)
    };

    // The lifted determinant is negative for interior points of a positive cell.
    match sign
    {
        s if s < 0 => InSphere::INSIDE,
        s if s > 0 => InSphere::OUTSIDE,
        _ => InSphere::BOUNDARY,
    }
}

fn insphere_exact(vertices: &[Point3; 4], e: &Point3) -> i32
{
    let rows = vertices.map(|v| exact_difference(&v, e));
    let lift = rows.each_ref().map(|r|
    {
        let squares = r.each_ref().map(|x| expansion::product(x, x));
        expansion::sum(&expansion::sum(&squares[0], &squares[1]), &squares[2])
    });
    let others = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];
    let mut det = Expansion::new();
    for (i, [j, k, l]) in others.into_iter().enumerate()
    {
        let term = expansion::product(&lift[i], &expansion::det3(&rows[j], &rows[k], &rows[l]));
        det = if i % 2 == 0 { expansion::sum(&det, &expansion::negate(&term)) } else { expansion::sum(&det, &term) };
    }
    expansion::sign(&det)
}

///
/// Exact test for three points lying on one line (coincident points included).
///
pub fn collinear(a: &Point3, b: &Point3, c: &Point3) -> bool
{
    let (u, v) = (exact_difference(b, a), exact_difference(c, a));
    [(1, 2), (2, 0), (0, 1)].into_iter().all(|(i, j)|
    {
        let cross = expansion::sum(&expansion::product(&u[i], &v[j]), &expansion::negate(&expansion::product(&u[j], &v[i])));
        expansion::sign(&cross) == 0
    })
}

///
/// Barycentric coordinates of `p` in the tetrahedron `vertices`. Returns `None` for a
/// flat tetrahedron.
///
pub fn barycentric(vertices: &[Point3; 4], p: &Point3) -> Option<[f64; 4]>
{
    let volume = orient3d(&vertices[0], &vertices[1], &vertices[2], &vertices[3]);
    if volume == 0.0 || !volume.is_finite()
    {
        return None;
    }
    let mut weights = [0.0; 4];
    for (i, weight) in weights.iter_mut().enumerate()
    {
        let mut replaced = *vertices;
        replaced[i] = *p;
        *weight = orient3d(&replaced[0], &replaced[1], &replaced[2], &replaced[3]) / volume;
    }
    Some(weights)
}
