//! Entity-specific entry points to the generic repository.
//!
//! Each alias is the shared [`Repository`] instantiated for one entity, with
//! a few lookups that every caller of that entity needs.

pub mod villa_number_repo;
pub mod villa_repo;

pub use crate::repository::Repository;
pub use villa_number_repo::VillaNumberRepo;
pub use villa_repo::VillaRepo;
