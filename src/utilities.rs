pub mod morton;
