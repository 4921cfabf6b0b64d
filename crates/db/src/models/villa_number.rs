//! Villa number entity model and DTOs.
//!
//! Villa numbers use caller-supplied keys: `villa_no` is never generated and
//! never changes after creation.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;
use villa_core::predicate::{Field, Predicate};
use villa_core::types::{DbId, Timestamp};

use crate::entity::{Binds, Entity};
use crate::error::{store_error, RepoResult};
use crate::models::villa::Villa;
use crate::patch::Patchable;

/// A row from the `villa_numbers` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct VillaNumber {
    pub villa_no: DbId,
    pub villa_id: DbId,
    pub special_details: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Loaded only when [`VillaNumberRelation::Villa`] is included.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub villa: Option<Box<Villa>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VillaNumberField {
    VillaNo,
    VillaId,
    SpecialDetails,
    CreatedAt,
    UpdatedAt,
}

impl Field for VillaNumberField {
    fn column(self) -> &'static str {
        match self {
            VillaNumberField::VillaNo => "villa_no",
            VillaNumberField::VillaId => "villa_id",
            VillaNumberField::SpecialDetails => "special_details",
            VillaNumberField::CreatedAt => "created_at",
            VillaNumberField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VillaNumberRelation {
    Villa,
}

impl FromStr for VillaNumberRelation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "villa" => Ok(VillaNumberRelation::Villa),
            other => Err(format!("unknown villa number relation '{other}'")),
        }
    }
}

#[async_trait]
impl Entity for VillaNumber {
    const NAME: &'static str = "VillaNumber";
    const TABLE: &'static str = "villa_numbers";
    const COLUMNS: &'static str = "villa_no, villa_id, special_details, created_at, updated_at";
    const KEY: &'static str = "villa_no";
    const INSERT_COLUMNS: &'static [&'static str] = &["villa_no", "villa_id", "special_details"];
    const UPDATE_COLUMNS: &'static [&'static str] = &["villa_id", "special_details"];

    type Field = VillaNumberField;
    type Relation = VillaNumberRelation;

    fn key(&self) -> DbId {
        self.villa_no
    }

    fn bind_insert(&self, binds: &mut Binds<'_, '_>) {
        binds
            .push_bind(self.villa_no)
            .push_bind(self.villa_id)
            .push_bind(self.special_details.clone());
    }

    fn bind_update(&self, binds: &mut Binds<'_, '_>) {
        binds
            .push_bind(self.villa_id)
            .push_bind(self.special_details.clone());
    }

    async fn load_relation(
        pool: &PgPool,
        rows: &mut [Self],
        relation: VillaNumberRelation,
    ) -> RepoResult<()> {
        match relation {
            VillaNumberRelation::Villa => {
                let mut ids: Vec<DbId> = rows.iter().map(|n| n.villa_id).collect();
                ids.sort_unstable();
                ids.dedup();
                let query = format!(
                    "SELECT {} FROM villas WHERE id = ANY($1)",
                    <Villa as Entity>::COLUMNS
                );
                let parents: HashMap<DbId, Villa> = sqlx::query_as::<_, Villa>(&query)
                    .bind(&ids)
                    .fetch_all(pool)
                    .await
                    .map_err(store_error)?
                    .into_iter()
                    .map(|v| (v.id, v))
                    .collect();

                for number in rows.iter_mut() {
                    number.villa = parents.get(&number.villa_id).cloned().map(Box::new);
                }
                Ok(())
            }
        }
    }
}

impl VillaNumber {
    /// Predicate selecting the villa number with the given key.
    pub fn by_villa_no(villa_no: DbId) -> Predicate<VillaNumberField> {
        Predicate::eq(VillaNumberField::VillaNo, villa_no)
    }

    /// Predicate selecting every villa number belonging to `villa_id`.
    pub fn by_villa(villa_id: DbId) -> Predicate<VillaNumberField> {
        Predicate::eq(VillaNumberField::VillaId, villa_id)
    }
}

/// DTO for creating a villa number. The key is supplied by the caller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVillaNumber {
    #[validate(range(min = 1, message = "villa_no must be positive"))]
    pub villa_no: DbId,
    #[validate(range(min = 1, message = "villa_id must be positive"))]
    pub villa_id: DbId,
    pub special_details: Option<String>,
}

impl From<CreateVillaNumber> for VillaNumber {
    fn from(input: CreateVillaNumber) -> Self {
        VillaNumber {
            villa_no: input.villa_no,
            villa_id: input.villa_id,
            special_details: input.special_details,
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
            villa: None,
        }
    }
}

/// Full-state DTO for updating a villa number. Also the patch view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateVillaNumber {
    #[validate(range(min = 1, message = "villa_no must be positive"))]
    pub villa_no: DbId,
    #[validate(range(min = 1, message = "villa_id must be positive"))]
    pub villa_id: DbId,
    pub special_details: Option<String>,
}

impl From<UpdateVillaNumber> for VillaNumber {
    fn from(input: UpdateVillaNumber) -> Self {
        VillaNumber {
            villa_no: input.villa_no,
            villa_id: input.villa_id,
            special_details: input.special_details,
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
            villa: None,
        }
    }
}

impl Patchable for VillaNumber {
    type View = UpdateVillaNumber;

    fn key_predicate(id: DbId) -> Predicate<VillaNumberField> {
        VillaNumber::by_villa_no(id)
    }

    fn to_view(&self) -> UpdateVillaNumber {
        UpdateVillaNumber {
            villa_no: self.villa_no,
            villa_id: self.villa_id,
            special_details: self.special_details.clone(),
        }
    }

    fn apply_view(&self, view: UpdateVillaNumber) -> Self {
        VillaNumber {
            created_at: self.created_at,
            updated_at: self.updated_at,
            ..VillaNumber::from(view)
        }
    }
}
