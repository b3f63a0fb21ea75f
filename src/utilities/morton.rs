use crate::geometry::predicates::Point3;

/// Bits per axis used when quantizing coordinates.
const BITS: u32 = 10;

///
/// Spread the lower 10 bits of `v` so that two zero bits follow each bit.
///
#[inline]
fn spread_bits(v: u32) -> u64
{
    let mut x = (v & 0x3ff) as u64;
    x = (x | (x << 16)) & 0x0300_00ff;
    x = (x | (x << 8)) & 0x0300_f00f;
    x = (x | (x << 4)) & 0x030c_30c3;
    x = (x | (x << 2)) & 0x0924_9249;
    x
}

///
/// Quantize `p` inside `[lower, upper]` to a grid of `2^BITS` cells per axis and
/// interleave the axes into a Z-order key. Degenerate axes quantize to zero.
///
pub fn morton_key(p: &Point3, lower: &Point3, upper: &Point3) -> u64
{
    let max = ((1u32 << BITS) - 1) as f64;
    let mut key = 0;
    for d in 0..3
    {
        let width = upper[d] - lower[d];
        let t = if width > 0.0 { ((p[d] - lower[d]) / width).clamp(0.0, 1.0) } else { 0.0 };
        key |= spread_bits((t * max) as u32) << d;
    }
    key
}

///
/// Indices of `points` sorted along the Z-order curve of their bounding box.
///
pub fn morton_order(points: &[Point3], lower: &Point3, upper: &Point3) -> Vec<usize>
{
    let mut indices: Vec<usize> = (0..points.len()).collect();
    indices.sort_by_key(|&i| (morton_key(&points[i], lower, upper), i));
    indices
}

#[test]
fn test_spread_bits()
{
    assert_eq!(spread_bits(0b1), 0b1);
    assert_eq!(spread_bits(0b11), 0b1001);
    assert_eq!(spread_bits(0b101), 0b100_0001);
    assert_eq!(spread_bits(0x3ff).count_ones(), 10);
}

#[test]
fn test_morton_order_keeps_octants_together()
{
    let points = [[0.9, 0.9, 0.9], [0.1, 0.1, 0.1], [0.8, 0.9, 0.95], [0.15, 0.05, 0.1]];
    let order = morton_order(&points, &[0.0; 3], &[1.0; 3]);
    assert_eq!(order, vec![1, 3, 2, 0]);
}
