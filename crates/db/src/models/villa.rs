//! Villa entity model and DTOs.

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
use crate::models::villa_number::VillaNumber;
use crate::patch::Patchable;

/// A villa row from the `villas` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Villa {
    pub id: DbId,
    pub name: String,
    pub details: Option<String>,
    pub rate: f64,
    pub sqft: i32,
    pub occupancy: i32,
    pub image_url: Option<String>,
    pub amenity: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Loaded only when [`VillaRelation::VillaNumbers`] is included.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub villa_numbers: Option<Vec<VillaNumber>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VillaField {
    Id,
    Name,
    Details,
    Rate,
    Sqft,
    Occupancy,
    ImageUrl,
    Amenity,
    CreatedAt,
    UpdatedAt,
}

impl Field for VillaField {
    fn column(self) -> &'static str {
        match self {
            VillaField::Id => "id",
            VillaField::Name => "name",
            VillaField::Details => "details",
            VillaField::Rate => "rate",
            VillaField::Sqft => "sqft",
            VillaField::Occupancy => "occupancy",
            VillaField::ImageUrl => "image_url",
            VillaField::Amenity => "amenity",
            VillaField::CreatedAt => "created_at",
            VillaField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VillaRelation {
    VillaNumbers,
}

impl FromStr for VillaRelation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "villa_numbers" => Ok(VillaRelation::VillaNumbers),
            other => Err(format!("unknown villa relation '{other}'")),
        }
    }
}

#[async_trait]
impl Entity for Villa {
    const NAME: &'static str = "Villa";
    const TABLE: &'static str = "villas";
    const COLUMNS: &'static str =
        "id, name, details, rate, sqft, occupancy, image_url, amenity, created_at, updated_at";
    const KEY: &'static str = "id";
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "name",
        "details",
        "rate",
        "sqft",
        "occupancy",
        "image_url",
        "amenity",
    ];
    const UPDATE_COLUMNS: &'static [&'static str] = Self::INSERT_COLUMNS;

    type Field = VillaField;
    type Relation = VillaRelation;

    fn key(&self) -> DbId {
        self.id
    }

    fn bind_insert(&self, binds: &mut Binds<'_, '_>) {
        binds
            .push_bind(self.name.clone())
            .push_bind(self.details.clone())
            .push_bind(self.rate)
            .push_bind(self.sqft)
            .push_bind(self.occupancy)
            .push_bind(self.image_url.clone())
            .push_bind(self.amenity.clone());
    }

    fn bind_update(&self, binds: &mut Binds<'_, '_>) {
        self.bind_insert(binds);
    }

    async fn load_relation(
        pool: &PgPool,
        rows: &mut [Self],
        relation: VillaRelation,
    ) -> RepoResult<()> {
        match relation {
            VillaRelation::VillaNumbers => {
                let ids: Vec<DbId> = rows.iter().map(|v| v.id).collect();
                let query = format!(
                    "SELECT {} FROM villa_numbers WHERE villa_id = ANY($1) ORDER BY villa_no",
                    <VillaNumber as Entity>::COLUMNS
                );
                let children = sqlx::query_as::<_, VillaNumber>(&query)
                    .bind(&ids)
                    .fetch_all(pool)
                    .await
                    .map_err(store_error)?;

                let mut by_parent: HashMap<DbId, Vec<VillaNumber>> = HashMap::new();
                for child in children {
                    by_parent.entry(child.villa_id).or_default().push(child);
                }
                for villa in rows.iter_mut() {
                    villa.villa_numbers = Some(by_parent.remove(&villa.id).unwrap_or_default());
                }
                Ok(())
            }
        }
    }
}

impl Villa {
    /// Predicate selecting the villa with the given id.
    pub fn by_id(id: DbId) -> Predicate<VillaField> {
        Predicate::eq(VillaField::Id, id)
    }

    /// Predicate selecting villas whose name matches ignoring case.
    pub fn by_name(name: &str) -> Predicate<VillaField> {
        Predicate::eq_ignore_case(VillaField::Name, name)
    }
}

/// DTO for creating a new villa.
///
/// `id` is accepted only so that a client-supplied identifier can be
/// rejected explicitly; villa ids are always generated by the store.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVilla {
    #[serde(default)]
    pub id: Option<DbId>,
    #[validate(length(min = 1, max = 30, message = "name must be 1-30 characters"))]
    pub name: String,
    pub details: Option<String>,
    #[validate(range(min = 0.0, message = "rate must not be negative"))]
    pub rate: f64,
    #[validate(range(min = 0, message = "sqft must not be negative"))]
    pub sqft: i32,
    #[validate(range(min = 0, message = "occupancy must not be negative"))]
    pub occupancy: i32,
    pub image_url: Option<String>,
    pub amenity: Option<String>,
}

impl From<CreateVilla> for Villa {
    /// Timestamps are placeholders; `create` stamps the real values.
    fn from(input: CreateVilla) -> Self {
        Villa {
            id: 0,
            name: input.name,
            details: input.details,
            rate: input.rate,
            sqft: input.sqft,
            occupancy: input.occupancy,
            image_url: input.image_url,
            amenity: input.amenity,
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
            villa_numbers: None,
        }
    }
}

/// Full-state DTO for updating a villa. Also the view a villa patch is
/// merged into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateVilla {
    #[validate(range(min = 1, message = "id must be positive"))]
    pub id: DbId,
    #[validate(length(min = 1, max = 30, message = "name must be 1-30 characters"))]
    pub name: String,
    pub details: Option<String>,
    #[validate(range(min = 0.0, message = "rate must not be negative"))]
    pub rate: f64,
    #[validate(range(min = 0, message = "sqft must not be negative"))]
    pub sqft: i32,
    #[validate(range(min = 0, message = "occupancy must not be negative"))]
    pub occupancy: i32,
    pub image_url: Option<String>,
    pub amenity: Option<String>,
}

impl From<UpdateVilla> for Villa {
    /// `update` never writes `created_at`, so the placeholder is harmless.
    fn from(input: UpdateVilla) -> Self {
        Villa {
            id: input.id,
            name: input.name,
            details: input.details,
            rate: input.rate,
            sqft: input.sqft,
            occupancy: input.occupancy,
            image_url: input.image_url,
            amenity: input.amenity,
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
            villa_numbers: None,
        }
    }
}

impl Patchable for Villa {
    type View = UpdateVilla;

    fn key_predicate(id: DbId) -> Predicate<VillaField> {
        Villa::by_id(id)
    }

    fn to_view(&self) -> UpdateVilla {
        UpdateVilla {
            id: self.id,
            name: self.name.clone(),
            details: self.details.clone(),
            rate: self.rate,
            sqft: self.sqft,
            occupancy: self.occupancy,
            image_url: self.image_url.clone(),
            amenity: self.amenity.clone(),
        }
    }

    fn apply_view(&self, view: UpdateVilla) -> Self {
        Villa {
            created_at: self.created_at,
            updated_at: self.updated_at,
            ..Villa::from(view)
        }
    }
}
