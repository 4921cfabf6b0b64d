//! Repository for the `villa_numbers` table.

use sqlx::PgPool;
use villa_core::predicate::Direction;
use villa_core::types::DbId;

use crate::error::RepoResult;
use crate::models::villa_number::{VillaNumber, VillaNumberField, VillaNumberRelation};
use crate::query::Query;
use crate::repository::Repository;

pub type VillaNumberRepo = Repository<VillaNumber>;

impl Repository<VillaNumber> {
    /// Find a villa number by its key, optionally loading its villa.
    pub async fn find_by_villa_no(
        pool: &PgPool,
        villa_no: DbId,
        includes: &[VillaNumberRelation],
    ) -> RepoResult<Option<VillaNumber>> {
        let query = Query::<VillaNumber>::filter(VillaNumber::by_villa_no(villa_no))
            .include_all(includes.iter().copied());
        Self::get(pool, &query).await
    }

    /// List the villa numbers of one villa ordered by number.
    pub async fn list_by_villa(pool: &PgPool, villa_id: DbId) -> RepoResult<Vec<VillaNumber>> {
        let query = Query::<VillaNumber>::filter(VillaNumber::by_villa(villa_id))
            .order_by(VillaNumberField::VillaNo, Direction::Asc);
        Self::get_all(pool, &query).await
    }
}
