//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row,
//!   with navigation fields that are filled only when included
//! - The entity's field and relation enums for typed queries
//! - `Deserialize` + `Validate` create and full-update DTOs

pub mod villa;
pub mod villa_number;
