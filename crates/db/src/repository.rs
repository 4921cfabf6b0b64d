//! Generic repository shared by every entity type.
//!
//! A zero-sized type whose async methods take `&PgPool` first. Each call
//! borrows one pooled connection for its own duration and commits
//! immediately; there is no unit of work spanning two calls.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use villa_core::error::CoreError;

use crate::entity::Entity;
use crate::error::{store_error, RepoResult};
use crate::query::{self, Query};

/// Create/read/update/delete for any [`Entity`].
pub struct Repository<E>(PhantomData<E>);

impl<E: Entity> Repository<E> {
    /// All rows matching `query`, with its includes loaded.
    pub async fn get_all(pool: &PgPool, query: &Query<E>) -> RepoResult<Vec<E>> {
        let mut qb = query::select(query, None);
        let mut rows = qb
            .build_query_as::<E>()
            .fetch_all(pool)
            .await
            .map_err(store_error)?;
        Self::load_includes(pool, &mut rows, query).await?;
        tracing::debug!(entity = E::NAME, count = rows.len(), "Fetched rows");
        Ok(rows)
    }

    /// The single row matching `query`, as a detached copy.
    ///
    /// Fails with `AmbiguousResult` if the predicate matches more than one
    /// row; callers must make single-result predicates selective.
    pub async fn get(pool: &PgPool, query: &Query<E>) -> RepoResult<Option<E>> {
        let mut qb = query::select(query, Some(2));
        let mut rows = qb
            .build_query_as::<E>()
            .fetch_all(pool)
            .await
            .map_err(store_error)?;
        if rows.len() > 1 {
            tracing::warn!(entity = E::NAME, "Single-result query matched several rows");
            return Err(CoreError::AmbiguousResult { entity: E::NAME });
        }
        Self::load_includes(pool, &mut rows, query).await?;
        Ok(rows.pop())
    }

    /// Like [`get`](Self::get), but returns a live handle whose in-place
    /// mutations are written back by [`Tracked::save`].
    pub async fn get_tracked(pool: &PgPool, query: &Query<E>) -> RepoResult<Option<Tracked<E>>> {
        Ok(Self::get(pool, query).await?.map(Tracked::new))
    }

    /// Insert `entity`, stamping both timestamps, and return the stored row.
    ///
    /// A generated key is assigned by the store; caller-supplied keys are
    /// written as given.
    pub async fn create(pool: &PgPool, entity: &E) -> RepoResult<E> {
        let now = Utc::now();
        let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {} ({}, created_at, updated_at) VALUES (",
            E::TABLE,
            E::INSERT_COLUMNS.join(", ")
        ));
        {
            let mut binds = qb.separated(", ");
            entity.bind_insert(&mut binds);
            binds.push_bind(now).push_bind(now);
        }
        qb.push(") RETURNING ");
        qb.push(E::COLUMNS);

        let created = qb
            .build_query_as::<E>()
            .fetch_one(pool)
            .await
            .map_err(store_error)?;
        tracing::debug!(entity = E::NAME, key = created.key(), "Created row");
        Ok(created)
    }

    /// Overwrite the stored state of `entity` in one statement keyed by its
    /// identifier, stamping a fresh `updated_at`. `created_at` is never written.
    pub async fn update(pool: &PgPool, entity: &E) -> RepoResult<()> {
        let mut qb: QueryBuilder<'static, Postgres> = QueryBuilder::new(format!(
            "UPDATE {} SET ({}, updated_at) = ROW(",
            E::TABLE,
            E::UPDATE_COLUMNS.join(", ")
        ));
        {
            let mut binds = qb.separated(", ");
            entity.bind_update(&mut binds);
            binds.push_bind(Utc::now());
        }
        qb.push(") WHERE ");
        qb.push(E::KEY);
        qb.push(" = ");
        qb.push_bind(entity.key());

        let result = qb.build().execute(pool).await.map_err(store_error)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound {
                entity: E::NAME,
                id: entity.key(),
            });
        }
        tracing::debug!(entity = E::NAME, key = entity.key(), "Updated row");
        Ok(())
    }

    /// Delete the row keyed by `entity`'s identifier. Dependent rows go with
    /// it where the schema cascades. Removing an absent row is `NotFound`.
    pub async fn remove(pool: &PgPool, entity: &E) -> RepoResult<()> {
        let sql = format!("DELETE FROM {} WHERE {} = $1", E::TABLE, E::KEY);
        let result = sqlx::query(&sql)
            .bind(entity.key())
            .execute(pool)
            .await
            .map_err(store_error)?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound {
                entity: E::NAME,
                id: entity.key(),
            });
        }
        tracing::debug!(entity = E::NAME, key = entity.key(), "Removed row");
        Ok(())
    }

    async fn load_includes(pool: &PgPool, rows: &mut [E], query: &Query<E>) -> RepoResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        for relation in &query.includes {
            E::load_relation(pool, rows, *relation).await?;
        }
        Ok(())
    }
}

/// A live handle to a loaded entity.
///
/// Derefs to the entity so it can be mutated in place; [`save`](Self::save)
/// writes the changes back only if the entity differs from what was loaded
/// or last saved, so saving twice never writes twice.
#[derive(Debug)]
pub struct Tracked<E: Entity> {
    snapshot: E,
    current: E,
}

impl<E: Entity> Tracked<E> {
    fn new(entity: E) -> Self {
        Self {
            snapshot: entity.clone(),
            current: entity,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.snapshot != self.current
    }

    /// Persist pending changes. Returns `true` if a write happened.
    pub async fn save(&mut self, pool: &PgPool) -> RepoResult<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        if self.current.key() != self.snapshot.key() {
            return Err(CoreError::Validation(format!(
                "{} identifier cannot be changed",
                E::NAME
            )));
        }
        Repository::<E>::update(pool, &self.current).await?;
        self.snapshot = self.current.clone();
        Ok(true)
    }

    /// Give up tracking and return the entity as a detached copy.
    pub fn detach(self) -> E {
        self.current
    }
}

impl<E: Entity> Deref for Tracked<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.current
    }
}

impl<E: Entity> DerefMut for Tracked<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.current
    }
}
