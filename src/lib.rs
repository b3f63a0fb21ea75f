//! Interpolation of pre-trained LIR regression coefficients over an irregular
//! `(lon, lat, d2d)` training grid.
//!
//! The training grid is tetrahedralized once (Delaunay) and the result cached on disk.
//! Every coefficient channel of every requested variable is then interpolated piecewise
//! linearly at the query points of two regions, sharing one point location per query.

pub mod algorithms;
pub mod cache;
pub mod errors;
pub mod geometry;
pub mod interpolant;
pub mod lir;
pub mod options;
pub mod serialization;
pub mod storage;
pub mod triangulation;
pub mod utilities;

pub use cache::{CacheLookup, TriangulationCache};
pub use errors::LirError;
pub use interpolant::Interpolant;
pub use lir::{interpolate, LirOutput};
pub use options::InterpolationOptions;
pub use storage::query::{QueryRecord, QuerySet};
pub use storage::training_grid::{CoefficientTensor, GridRecord, TrainingGrid};
pub use triangulation::Triangulation;
