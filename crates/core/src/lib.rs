//! Domain primitives shared by the persistence and HTTP layers.
//!
//! Nothing in this crate touches the database: predicates are declarative
//! values that `villa-db` renders into SQL, and patch merging works on the
//! serialized transport view of an entity.

pub mod error;
pub mod patch;
pub mod predicate;
pub mod types;
