pub mod query;
pub mod training_grid;
