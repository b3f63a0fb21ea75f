//! Incremental Bowyer-Watson tetrahedralization.
//!
//! Points are inserted in their own coordinates along a Z-order curve. The triangulation
//! is closed with a single vertex at infinity: every hull face carries a ghost cell joining
//! it to [`INFINITE`], so a point outside the current hull lands in a ghost cell and no
//! bounding simplex is needed. Each insertion:
//!
//! 1. walks from the last created cell to the cell containing the point (a ghost cell when
//!    the point lies outside the hull),
//! 2. grows the conflict region: real cells whose circumsphere strictly contains the point
//!    and ghost cells whose hull face the point sees,
//! 3. re-triangulates the region as a fan around the point.
//!
//! Predicates are exact, so the region is always star-shaped from the point and every
//! distinct input point becomes a vertex. Dropping the ghost cells at the end leaves a
//! tetrahedralization of the convex hull.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::errors::LirError;
use crate::geometry::bounding_box::BoundingBox;
use crate::geometry::predicates::{collinear, insphere, orientation, InSphere, Orientation, Point3};
use crate::triangulation::connect;
use crate::utilities::morton::morton_order;

/// Vertex id of the point at infinity.
const INFINITE: u32 = u32::MAX - 1;

enum Insertion
{
    Inserted,
    Duplicate,
}

struct Builder<'a>
{
    points: &'a [Point3],
    cells: Vec<[u32; 4]>,
    neighbors: Vec<[u32; 4]>,
    alive: Vec<bool>,
    free: Vec<u32>,
    cavity_mark: Vec<u32>,
    rejected_mark: Vec<u32>,
    generation: u32,
    hint: u32,
}

impl<'a> Builder<'a>
{
    ///
    /// Start from the tetrahedron `simplex` and one ghost cell on each of its faces.
    ///
    fn new(points: &'a [Point3], mut simplex: [u32; 4]) -> Self
    {
        let [a, b, c, d] = simplex.map(|v| points[v as usize]);
        if orientation(&a, &b, &c, &d) == Orientation::NEGATIVE
        {
            simplex.swap(0, 1);
        }
        let mut cells = vec![simplex];
        for k in 0..4
        {
            // Swapping two finite vertices makes the ghost positive for points beyond its face.
            let mut ghost = simplex;
            ghost[k] = INFINITE;
            ghost.swap((k + 1) % 4, (k + 2) % 4);
            cells.push(ghost);
        }
        let neighbors = connect(&cells);
        let num_cells = cells.len();
        Self
        {
            points,
            cells,
            neighbors,
            alive: vec![true; num_cells],
            free: Vec::new(),
            cavity_mark: vec![0; num_cells],
            rejected_mark: vec![0; num_cells],
            generation: 0,
            hint: 0,
        }
    }

    #[inline]
    fn infinite_index(&self, cell: u32) -> Option<usize>
    {
        self.cells[cell as usize].iter().position(|&v| v == INFINITE)
    }

    ///
    /// Orientation of `cell` with its vertex `i` replaced by `p`. On a ghost cell `i` must be
    /// the infinite vertex.
    ///
    #[inline]
    fn facing(&self, cell: u32, i: usize, p: &Point3) -> Orientation
    {
        let vertices = self.cells[cell as usize];
        let q: [Point3; 4] = std::array::from_fn(|m| if m == i { *p } else { self.points[vertices[m] as usize] });
        orientation(&q[0], &q[1], &q[2], &q[3])
    }

    fn in_circumsphere(&self, cell: u32, p: &Point3) -> bool
    {
        let [a, b, c, d] = self.cells[cell as usize].map(|v| self.points[v as usize]);
        insphere(&a, &b, &c, &d, p) == InSphere::INSIDE
    }

    ///
    /// A ghost cell conflicts with `p` when `p` lies strictly beyond its hull face, or on the
    /// face's plane strictly inside the face's circumcircle.
    ///
    fn conflicts(&self, cell: u32, p: &Point3) -> bool
    {
        match self.infinite_index(cell)
        {
            None => self.in_circumsphere(cell, p),
            Some(k) => match self.facing(cell, k, p)
            {
                Orientation::POSITIVE => true,
                Orientation::NEGATIVE => false,
                Orientation::DEGENERATE => self.in_circumsphere(self.neighbors[cell as usize][k], p),
            },
        }
    }

    fn contains(&self, cell: u32, p: &Point3) -> bool
    {
        (0..4).all(|i| self.facing(cell, i, p) != Orientation::NEGATIVE)
    }

    ///
    /// Visibility walk toward `p` over real cells. Leaving the hull returns the ghost cell on
    /// the far side of the crossed face. The starting face rotates with the step count.
    ///
    fn locate(&self, p: &Point3) -> Option<u32>
    {
        let hint_is_real = self.alive[self.hint as usize] && self.infinite_index(self.hint).is_none();
        let mut cell = if hint_is_real { self.hint } else { self.any_real()? };
        for step in 0..self.cells.len() + 16
        {
            let exit = (0..4).map(|k| (k + step) % 4).find(|&i| self.facing(cell, i, p) == Orientation::NEGATIVE);
            let Some(i) = exit else { return Some(cell) };
            let next = self.neighbors[cell as usize][i];
            if self.infinite_index(next).is_some()
            {
                return Some(next);
            }
            cell = next;
        }
        self.scan(p)
    }

    fn scan(&self, p: &Point3) -> Option<u32>
    {
        let mut ghost = None;
        for cell in (0..self.cells.len() as u32).filter(|&c| self.alive[c as usize])
        {
            match self.infinite_index(cell)
            {
                None if self.contains(cell, p) => return Some(cell),
                Some(_) if ghost.is_none() && self.conflicts(cell, p) => ghost = Some(cell),
                _ => {},
            }
        }
        ghost
    }

    fn any_real(&self) -> Option<u32>
    {
        (0..self.cells.len() as u32).find(|&c| self.alive[c as usize] && self.infinite_index(c).is_none())
    }

    fn allocate(&mut self, cell: [u32; 4]) -> u32
    {
        if let Some(c) = self.free.pop()
        {
            self.cells[c as usize] = cell;
            self.alive[c as usize] = true;
            c
        }
        else
        {
            self.cells.push(cell);
            self.neighbors.push([0; 4]);
            self.alive.push(true);
            self.cavity_mark.push(0);
            self.rejected_mark.push(0);
            (self.cells.len() - 1) as u32
        }
    }

    ///
    /// Insert point `index`; `None` when no cell could be found for it.
    ///
    fn insert(&mut self, index: u32) -> Option<Insertion>
    {
        let p = self.points[index as usize];
        let start = self.locate(&p)?;
        if self.infinite_index(start).is_none() && self.cells[start as usize].iter().any(|&v| self.points[v as usize] == p)
        {
            return Some(Insertion::Duplicate);
        }

        self.generation += 1;
        let generation = self.generation;

        // Conflict region, connected through shared faces.
        let mut cavity = vec![start];
        self.cavity_mark[start as usize] = generation;
        let mut stack = vec![start];
        while let Some(cell) = stack.pop()
        {
            for n in self.neighbors[cell as usize]
            {
                if self.cavity_mark[n as usize] == generation || self.rejected_mark[n as usize] == generation
                {
                    continue;
                }
                if self.conflicts(n, &p)
                {
                    self.cavity_mark[n as usize] = generation;
                    cavity.push(n);
                    stack.push(n);
                }
                else
                {
                    self.rejected_mark[n as usize] = generation;
                }
            }
        }

        // Fan around p over the region's boundary faces.
        let mut fan = Vec::new();
        for &cell in &cavity
        {
            for (i, &outer) in self.neighbors[cell as usize].iter().enumerate()
            {
                if self.cavity_mark[outer as usize] != generation
                {
                    let mut vertices = self.cells[cell as usize];
                    vertices[i] = index;
                    fan.push((vertices, i, outer, cell));
                }
            }
        }
        for &cell in &cavity
        {
            self.alive[cell as usize] = false;
        }
        let mut open_edges: FxHashMap<(u32, u32), (u32, usize)> = FxHashMap::default();
        for (vertices, i, outer, old) in fan
        {
            let created = self.allocate(vertices);
            self.neighbors[created as usize][i] = outer;
            if let Some(slot) = self.neighbors[outer as usize].iter_mut().find(|s| **s == old)
            {
                *slot = created;
            }
            for j in (0..4).filter(|&j| j != i)
            {
                let mut edge = (0..4).filter(|&m| m != i && m != j).map(|m| vertices[m]);
                let (e0, e1) = match (edge.next(), edge.next())
                {
                    (Some(e0), Some(e1)) => (e0.min(e1), e0.max(e1)),
                    _ => continue,
                };
                if let Some((other, k)) = open_edges.remove(&(e0, e1))
                {
                    self.neighbors[created as usize][j] = other;
                    self.neighbors[other as usize][k] = created;
                }
                else
                {
                    open_edges.insert((e0, e1), (created, j));
                }
            }
            self.hint = created;
        }
        // Released only now so no new cell reuses an id the outer cells still point at.
        self.free.extend(cavity);
        Some(Insertion::Inserted)
    }

    ///
    /// Live cells without the infinite vertex.
    ///
    fn finish(self) -> Vec<[u32; 4]>
    {
        self.cells.iter().zip(&self.alive)
            .filter(|(cell, &alive)| alive && !cell.contains(&INFINITE))
            .map(|(cell, _)| *cell)
            .collect()
    }
}

///
/// First four points along `order` spanning a non-degenerate tetrahedron.
///
fn initial_simplex(points: &[Point3], order: &[usize]) -> Result<[u32; 4], LirError>
{
    let insufficient = |reason: &'static str| LirError::InsufficientTrainingData { points: points.len(), reason };
    let first = order[0];
    let a = points[first];
    let second = order.iter().copied().find(|&i| points[i] != a).ok_or_else(|| insufficient("all points coincide"))?;
    let b = points[second];
    let third = order.iter().copied().find(|&i| !collinear(&a, &b, &points[i])).ok_or_else(|| insufficient("points span no volume"))?;
    let c = points[third];
    let fourth = order.iter().copied()
        .find(|&i| orientation(&a, &b, &c, &points[i]) != Orientation::DEGENERATE)
        .ok_or_else(|| insufficient("points span no volume"))?;
    Ok([first, second, third, fourth].map(|i| i as u32))
}

///
/// Delaunay tetrahedralization of `points`; returns positively oriented cells indexing into `points`.
///
/// The cells tile the convex hull of `points` and every distinct point is a vertex of at
/// least one cell. Exact duplicates are skipped and belong to no cell.
///
/// Fails with [`LirError::InsufficientTrainingData`] when fewer than four points are given or
/// the points span no volume, and with [`LirError::NonFiniteCoordinate`] on NaN or infinite input.
///
pub fn tetrahedralize(points: &[Point3]) -> Result<Vec<[u32; 4]>, LirError>
{
    let num_points = points.len();
    if num_points < 4
    {
        return Err(LirError::InsufficientTrainingData { points: num_points, reason: "at least four points are needed to triangulate" });
    }
    if let Some(index) = points.iter().position(|p| p.iter().any(|x| !x.is_finite()))
    {
        return Err(LirError::NonFiniteCoordinate { index });
    }
    let bbox = BoundingBox::from_points(points).ok_or(LirError::InsufficientTrainingData { points: 0, reason: "no points" })?;
    let order = morton_order(points, &bbox.lower, &bbox.upper);
    let simplex = initial_simplex(points, &order)?;

    let mut builder = Builder::new(points, simplex);
    let mut duplicates = 0;
    for index in order.into_iter().filter(|&i| !simplex.contains(&(i as u32)))
    {
        match builder.insert(index as u32)
        {
            Some(Insertion::Inserted) => {},
            Some(Insertion::Duplicate) => duplicates += 1,
            None => return Err(LirError::PointLocationFailed { index }),
        }
    }

    let cells = builder.finish();
    debug!(points = num_points, cells = cells.len(), duplicates, "tetrahedralization complete");
    Ok(cells)
}
