//! Point location for query evaluation.
//!
//! A k-d tree over the training vertices gives a starting cell close to the query (and
//! detects exact vertex hits). From there a visibility walk steps across the face with the
//! most negative barycentric coordinate until the enclosing cell is found or the walk
//! reaches a hull face. The cells of a [`Triangulation`] tile the convex hull, so a query
//! strictly beyond a hull face's plane (decided exactly) is outside; any other stop falls
//! back to an exhaustive scan.

use kdtree::distance::squared_euclidean;
use kdtree::KdTree;

use crate::errors::LirError;
use crate::geometry::bounding_box::BoundingBox;
use crate::geometry::predicates::{barycentric, orientation, Orientation, Point3};
use crate::triangulation::{Triangulation, NO_NEIGHBOR};

/// Barycentric coordinates down to `-BARYCENTRIC_TOLERANCE` still count as inside.
pub const BARYCENTRIC_TOLERANCE: f64 = 100.0 * f64::EPSILON;

/// Where a query point falls in the triangulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location
{
    /// Query coincides with a training vertex.
    Vertex(u32),
    /// Query lies in `cell` with the given barycentric weights.
    Cell
    {
        cell: u32,
        weights: [f64; 4],
    },
    /// Query lies outside the convex hull (or has a non-finite coordinate).
    Outside,
}

impl Location
{
    pub fn is_outside(&self) -> bool
    {
        matches!(self, Location::Outside)
    }
}

///
/// Search structures derived from a [`Triangulation`]. Rebuilt whenever a triangulation is
/// loaded, so they never need to be persisted.
///
pub struct Locator
{
    tree: KdTree<f64, u32, Point3>,
    vertex_cells: Vec<u32>,
    bounding_box: Option<BoundingBox>,
}

impl Locator
{
    pub fn new(triangulation: &Triangulation) -> Result<Self, LirError>
    {
        let mut vertex_cells = vec![NO_NEIGHBOR; triangulation.num_vertices()];
        for (c, cell) in triangulation.cells().iter().enumerate()
        {
            for &v in cell
            {
                vertex_cells[v as usize] = c as u32;
            }
        }
        let mut tree = KdTree::with_capacity(3, triangulation.num_vertices().max(1));
        for (v, p) in triangulation.points().iter().enumerate()
        {
            if vertex_cells[v] != NO_NEIGHBOR
            {
                tree.add(*p, v as u32).map_err(|_| LirError::KdTreeError)?;
            }
        }
        Ok(Self { tree, vertex_cells, bounding_box: triangulation.bounding_box() })
    }

    ///
    /// Locate `p`. Every failure mode (empty triangulation, non-finite input, outside the hull)
    /// resolves to [`Location::Outside`].
    ///
    pub fn locate(&self, triangulation: &Triangulation, p: &Point3) -> Location
    {
        match &self.bounding_box
        {
            Some(bbox) if bbox.contains(p) && !triangulation.is_empty() => {},
            _ => return Location::Outside,
        }
        let start = match self.tree.nearest(p, 1, &squared_euclidean)
        {
            Ok(nearest) => match nearest.first()
            {
                Some(&(distance, &v)) if distance == 0.0 => return Location::Vertex(v),
                Some(&(_, &v)) => self.vertex_cells[v as usize],
                None => 0,
            },
            Err(_) => 0,
        };
        self.walk(triangulation, p, start)
    }

    fn walk(&self, triangulation: &Triangulation, p: &Point3, start: u32) -> Location
    {
        let mut cell = start;
        for _ in 0..triangulation.num_cells()
        {
            let Some(weights) = barycentric(&triangulation.cell_points(cell as usize), p) else { break };
            let (exit, lowest) = weights.iter().enumerate().fold((0, f64::INFINITY), |best, (i, &w)| if w < best.1 { (i, w) } else { best });
            if lowest >= -BARYCENTRIC_TOLERANCE
            {
                return Location::Cell { cell, weights };
            }
            let next = triangulation.neighbors()[cell as usize][exit];
            if next == NO_NEIGHBOR
            {
                let mut q = triangulation.cell_points(cell as usize);
                q[exit] = *p;
                if orientation(&q[0], &q[1], &q[2], &q[3]) == Orientation::NEGATIVE
                {
                    return Location::Outside;
                }
                break;
            }
            cell = next;
        }
        Self::scan(triangulation, p)
    }

    ///
    /// Exhaustive search, used when the walk does not settle.
    ///
    fn scan(triangulation: &Triangulation, p: &Point3) -> Location
    {
        for cell in 0..triangulation.num_cells()
        {
            if let Some(weights) = barycentric(&triangulation.cell_points(cell), p)
            {
                if weights.iter().all(|&w| w >= -BARYCENTRIC_TOLERANCE)
                {
                    return Location::Cell { cell: cell as u32, weights };
                }
            }
        }
        Location::Outside
    }
}
