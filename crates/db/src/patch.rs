//! Partial-update pipeline.
//!
//! ```text
//! load(id) ──> Loaded ──merge(doc)──> Merged ──persist()──> entity
//!    │            │                      │
//!    └────────────┴──── Rejected ────────┘ (persist errors pass through)
//! ```
//!
//! The entity is loaded untracked, so the only write is the explicit
//! `update` in [`PatchPipeline::persist`]. Between `merge` and `persist` the
//! caller may run its own checks against the merged entity (for example a
//! parent reference lookup). A failed persist leaves nothing to roll back:
//! the merged state lived only in memory.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;
use villa_core::error::{CoreError, FieldViolation};
use villa_core::patch::{self, PatchDocument};
use villa_core::predicate::Predicate;
use villa_core::types::{is_sentinel, DbId};

use crate::entity::Entity;
use crate::error::RepoResult;
use crate::query::Query;
use crate::repository::Repository;

/// An entity that can be edited through its transport-shaped view.
pub trait Patchable: Entity {
    /// Full-state view that patch operations address by field name.
    type View: Serialize + DeserializeOwned + Validate + Send + Sync;

    fn key_predicate(id: DbId) -> Predicate<Self::Field>;

    /// The view's fields are named after the entity's columns, so
    /// [`Entity::KEY`] also names the identifier inside the view.
    fn to_view(&self) -> Self::View;

    /// Build the post-patch entity from `view`, keeping server-owned state
    /// (timestamps) from `self`.
    fn apply_view(&self, view: Self::View) -> Self;
}

/// Entity fetched untracked and ready to be patched.
#[derive(Debug)]
pub struct Loaded<E>(E);

/// Entity with all patch operations applied and validated.
#[derive(Debug)]
pub struct Merged<E>(E);

#[derive(Debug)]
pub struct PatchPipeline<S> {
    state: S,
}

impl<E: Patchable> PatchPipeline<Loaded<E>> {
    /// Fetch the entity keyed by `id`.
    ///
    /// Rejects the sentinel id `0` without touching the store, and rejects
    /// an id with no matching row.
    pub async fn load(pool: &PgPool, id: DbId) -> RepoResult<Self> {
        if is_sentinel(id) {
            return Err(CoreError::Rejected(vec![FieldViolation::new(
                E::KEY,
                "identifier 0 is reserved",
            )]));
        }
        let entity = Repository::<E>::get(pool, &Query::filter(E::key_predicate(id)))
            .await?
            .ok_or_else(|| {
                CoreError::Rejected(vec![FieldViolation::new(
                    E::KEY,
                    format!("{} with id {id} does not exist", E::NAME),
                )])
            })?;
        Ok(Self {
            state: Loaded(entity),
        })
    }

    pub fn entity(&self) -> &E {
        &self.state.0
    }

    /// Apply `doc` to the entity's view and validate the result.
    ///
    /// Every violation is reported, including an attempt to change the
    /// entity's identifier.
    pub fn merge(self, doc: &PatchDocument) -> RepoResult<PatchPipeline<Merged<E>>> {
        let loaded = self.state.0;
        let view = patch::merge_with_fixed(&loaded.to_view(), doc.operations(), &[E::KEY])
            .map_err(|violations| {
                tracing::warn!(
                    entity = E::NAME,
                    key = loaded.key(),
                    count = violations.len(),
                    "Patch rejected"
                );
                CoreError::Rejected(violations)
            })?;

        Ok(PatchPipeline {
            state: Merged(loaded.apply_view(view)),
        })
    }
}

impl<E: Patchable> PatchPipeline<Merged<E>> {
    pub fn entity(&self) -> &E {
        &self.state.0
    }

    /// Hand the merged entity to [`Repository::update`].
    pub async fn persist(self, pool: &PgPool) -> RepoResult<E> {
        let entity = self.state.0;
        Repository::<E>::update(pool, &entity).await?;
        tracing::debug!(entity = E::NAME, key = entity.key(), "Patch persisted");
        Ok(entity)
    }
}

/// Load, merge and persist in one go, for entities with no cross-entity
/// checks between merge and persist.
pub async fn apply<E: Patchable>(pool: &PgPool, id: DbId, doc: &PatchDocument) -> RepoResult<E> {
    PatchPipeline::<Loaded<E>>::load(pool, id)
        .await?
        .merge(doc)?
        .persist(pool)
        .await
}
