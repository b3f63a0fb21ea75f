pub mod bounding_box;
pub(crate) mod expansion;
pub mod predicates;
