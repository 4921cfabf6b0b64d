//! The contract an entity type fulfils to be served by [`Repository`].
//!
//! [`Repository`]: crate::repository::Repository

use std::fmt;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgPool, Postgres};
use villa_core::predicate::Field;
use villa_core::types::DbId;

use crate::error::RepoResult;

/// Bind target for the column values of one row.
pub type Binds<'qb, 'args> = Separated<'qb, 'args, Postgres, &'static str>;

/// A table-backed record with a stable integer identifier.
///
/// Implementors describe their table layout with the associated constants
/// and push their own column values into INSERT/UPDATE statements; the
/// repository adds the `created_at` / `updated_at` stamps itself.
#[async_trait]
pub trait Entity:
    for<'r> FromRow<'r, PgRow> + Clone + PartialEq + fmt::Debug + Send + Sync + Unpin + 'static
{
    /// Human-readable name used in errors and logs.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Select list, in `FromRow` order.
    const COLUMNS: &'static str;
    /// Primary key column.
    const KEY: &'static str;
    /// Columns written on insert, in the order `bind_insert` pushes them.
    /// Excludes a generated key and the timestamp columns.
    const INSERT_COLUMNS: &'static [&'static str];
    /// Columns written on update, in the order `bind_update` pushes them.
    /// Never includes the key or `created_at`.
    const UPDATE_COLUMNS: &'static [&'static str];

    type Field: Field;
    /// Navigation paths that can be eagerly loaded.
    type Relation: Copy + fmt::Debug + Send + Sync + 'static;

    fn key(&self) -> DbId;

    fn bind_insert(&self, binds: &mut Binds<'_, '_>);

    fn bind_update(&self, binds: &mut Binds<'_, '_>);

    /// Populate `relation` on every row in `rows` with one batched query.
    async fn load_relation(
        pool: &PgPool,
        rows: &mut [Self],
        relation: Self::Relation,
    ) -> RepoResult<()>;
}
