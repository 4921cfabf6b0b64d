//! Repository for the `villas` table.

use sqlx::PgPool;
use villa_core::types::DbId;

use crate::error::RepoResult;
use crate::models::villa::{Villa, VillaRelation};
use crate::query::Query;
use crate::repository::Repository;

pub type VillaRepo = Repository<Villa>;

impl Repository<Villa> {
    /// Find a villa by id, optionally loading its villa numbers.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
        includes: &[VillaRelation],
    ) -> RepoResult<Option<Villa>> {
        let query =
            Query::<Villa>::filter(Villa::by_id(id)).include_all(includes.iter().copied());
        Self::get(pool, &query).await
    }

    /// Find a villa whose name matches `name` ignoring letter case.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> RepoResult<Option<Villa>> {
        Self::get(pool, &Query::<Villa>::filter(Villa::by_name(name))).await
    }

    /// Whether a villa with the given id exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> RepoResult<bool> {
        Ok(Self::find_by_id(pool, id, &[]).await?.is_some())
    }
}
