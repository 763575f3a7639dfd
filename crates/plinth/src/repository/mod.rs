//! # Repository Model
//!
//! The repository and unit-of-work contracts backends implement.

pub mod traits;

pub use traits::{Repository, UnitOfWork};
