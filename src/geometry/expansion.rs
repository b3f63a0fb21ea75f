//! Exact arithmetic on floating-point expansions.
//!
//! An expansion is a sum of non-overlapping `f64` components stored in order of increasing
//! magnitude with zeros removed; the empty expansion is zero. Its sign is the sign of the
//! last component. Only sums, differences and products are needed, which is enough to
//! evaluate the orientation and in-sphere determinants exactly.

pub type Expansion = Vec<f64>;

///
/// `a + b` as `(rounded sum, rounding error)`.
///
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64)
{
    let s = a + b;
    let b_virtual = s - a;
    let a_virtual = s - b_virtual;
    (s, (a - a_virtual) + (b - b_virtual))
}

///
/// `a * b` as `(rounded product, rounding error)`.
///
#[inline]
fn two_product(a: f64, b: f64) -> (f64, f64)
{
    let p = a * b;
    (p, a.mul_add(b, -p))
}

///
/// Add a single component to an expansion.
///
fn grow(e: &[f64], b: f64) -> Expansion
{
    let mut out = Vec::with_capacity(e.len() + 1);
    let mut q = b;
    for &x in e
    {
        let (s, h) = two_sum(q, x);
        if h != 0.0
        {
            out.push(h);
        }
        q = s;
    }
    if q != 0.0
    {
        out.push(q);
    }
    out
}

/// Exact difference `a - b` of two doubles.
pub fn difference(a: f64, b: f64) -> Expansion
{
    let (s, err) = two_sum(a, -b);
    [err, s].into_iter().filter(|&x| x != 0.0).collect()
}

pub fn sum(e: &[f64], f: &[f64]) -> Expansion
{
    f.iter().fold(e.to_vec(), |acc, &x| grow(&acc, x))
}

pub fn negate(e: &[f64]) -> Expansion
{
    e.iter().map(|x| -x).collect()
}

fn scale(e: &[f64], b: f64) -> Expansion
{
    e.iter().fold(Vec::new(), |acc, &x|
    {
        let (p, err) = two_product(x, b);
        grow(&grow(&acc, err), p)
    })
}

pub fn product(e: &[f64], f: &[f64]) -> Expansion
{
    f.iter().fold(Vec::new(), |acc, &x| sum(&acc, &scale(e, x)))
}

/// `-1`, `0` or `1`.
pub fn sign(e: &[f64]) -> i32
{
    match e.last()
    {
        Some(&x) if x > 0.0 => 1,
        Some(_) => -1,
        None => 0,
    }
}

///
/// Exact 3x3 determinant with rows `u`, `v`, `w`.
///
pub fn det3(u: &[Expansion; 3], v: &[Expansion; 3], w: &[Expansion; 3]) -> Expansion
{
    let minor = |i: usize, j: usize| sum(&product(&v[i], &w[j]), &negate(&product(&v[j], &w[i])));
    let first = product(&u[0], &minor(1, 2));
    let second = negate(&product(&u[1], &minor(0, 2)));
    let third = product(&u[2], &minor(0, 1));
    sum(&sum(&first, &second), &third)
}
