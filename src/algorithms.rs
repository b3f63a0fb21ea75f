pub mod delaunay;
pub mod interpolation;
pub mod locate;
