use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::algorithms::delaunay;
use crate::errors::LirError;
use crate::geometry::bounding_box::BoundingBox;
use crate::geometry::predicates::{orient3d, Point3};
use crate::serialization::{self, SerializationFormat};

/// Marks a hull face (no cell on the other side).
pub const NO_NEIGHBOR: u32 = u32::MAX;

///
/// Delaunay tetrahedralization of a training grid.
///
/// `cells[c]` holds four vertex indices into `points`, positively oriented.
/// `neighbors[c][i]` is the cell sharing the face opposite `cells[c][i]`, or
/// [`NO_NEIGHBOR`] on the convex hull. Points that were skipped during
/// construction (duplicates) stay in `points` but belong to no cell.
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Triangulation
{
    pub(crate) points: Vec<Point3>,
    pub(crate) cells: Vec<[u32; 4]>,
    pub(crate) neighbors: Vec<[u32; 4]>,
}

impl Triangulation
{
    ///
    /// Build the Delaunay tetrahedralization of `points`.
    ///
    pub fn new(points: &[Point3]) -> Result<Self, LirError>
    {
        let cells = delaunay::tetrahedralize(points)?;
        let neighbors = connect(&cells);
        Ok(Self { points: points.to_vec(), cells, neighbors })
    }

    pub fn points(&self) -> &[Point3]
    {
        &self.points
    }

    pub fn cells(&self) -> &[[u32; 4]]
    {
        &self.cells
    }

    pub fn neighbors(&self) -> &[[u32; 4]]
    {
        &self.neighbors
    }

    pub fn num_vertices(&self) -> usize
    {
        self.points.len()
    }

    pub fn num_cells(&self) -> usize
    {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.cells.is_empty()
    }

    #[inline]
    pub fn cell_points(&self, cell: usize) -> [Point3; 4]
    {
        self.cells[cell].map(|v| self.points[v as usize])
    }

    pub fn bounding_box(&self) -> Option<BoundingBox>
    {
        BoundingBox::from_points(&self.points)
    }

    ///
    /// Total volume covered by the cells (the convex hull volume for a complete triangulation).
    ///
    pub fn volume(&self) -> f64
    {
        (0..self.cells.len()).map(|cell|
        {
            let [a, b, c, d] = self.cell_points(cell);
            orient3d(&a, &b, &c, &d) / 6.0
        }).sum()
    }

    ///
    /// Number of faces on the convex hull.
    ///
    pub fn num_hull_faces(&self) -> usize
    {
        self.neighbors.iter().flatten().filter(|&&n| n == NO_NEIGHBOR).count()
    }

    ///
    /// Structural checks for data read from untrusted bytes: index ranges and mutual adjacency.
    /// Geometry is not re-examined.
    ///
    pub(crate) fn check_structure(&self) -> Result<(), String>
    {
        if self.cells.len() != self.neighbors.len()
        {
            return Err(format!("{} cells but {} adjacency entries", self.cells.len(), self.neighbors.len()));
        }
        let num_points = self.points.len();
        for (c, (cell, adjacent)) in self.cells.iter().zip(&self.neighbors).enumerate()
        {
            if let Some(&v) = cell.iter().find(|&&v| v as usize >= num_points)
            {
                return Err(format!("cell {c} references vertex {v} of {num_points}"));
            }
            for &n in adjacent.iter().filter(|&&n| n != NO_NEIGHBOR)
            {
                let back = self.neighbors.get(n as usize).ok_or_else(|| format!("cell {c} references missing neighbor {n}"))?;
                if !back.contains(&(c as u32))
                {
                    return Err(format!("adjacency between cells {c} and {n} is not mutual"));
                }
            }
        }
        Ok(())
    }

    ///
    /// Encode the triangulation (header + bincode payload, optionally LZ4-compressed).
    ///
    pub fn to_bytes(&self, format: SerializationFormat) -> Result<Vec<u8>, LirError>
    {
        serialization::serialize(self, format)
    }

    ///
    /// Decode a triangulation from a buffer produced by [`Triangulation::to_bytes`].
    ///
    pub fn read_buffer(buffer: &[u8]) -> Result<Self, LirError>
    {
        let triangulation: Self = serialization::deserialize(buffer)?;
        triangulation.check_structure().map_err(LirError::DeserializationFailed)?;
        Ok(triangulation)
    }
}

///
/// Face adjacency for a set of cells. Faces are keyed by their sorted vertex triple.
///
pub(crate) fn connect(cells: &[[u32; 4]]) -> Vec<[u32; 4]>
{
    let mut neighbors = vec![[NO_NEIGHBOR; 4]; cells.len()];
    let mut open_faces: FxHashMap<[u32; 3], (u32, usize)> = FxHashMap::default();
    open_faces.reserve(cells.len() * 2);
    for (c, cell) in cells.iter().enumerate()
    {
        for i in 0..4
        {
            let mut face = [cell[(i + 1) % 4], cell[(i + 2) % 4], cell[(i + 3) % 4]];
            face.sort_unstable();
            if let Some((other, j)) = open_faces.remove(&face)
            {
                neighbors[c][i] = other;
                neighbors[other as usize][j] = c as u32;
            }
            else
            {
                open_faces.insert(face, (c as u32, i));
            }
        }
    }
    neighbors
}
