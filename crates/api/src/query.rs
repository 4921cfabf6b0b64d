//! Shared query parameter types for API handlers.

use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Related-entity expansion (`?include=villa_numbers`).
///
/// The value is a comma-separated list of relation names; each handler
/// parses it into its entity's relation enum.
#[derive(Debug, Default, Deserialize)]
pub struct IncludeParams {
    pub include: Option<String>,
}

impl IncludeParams {
    /// Parse the requested relations, rejecting unknown names with 400.
    pub fn relations<R>(&self) -> AppResult<Vec<R>>
    where
        R: FromStr<Err = String>,
    {
        let Some(raw) = self.include.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<R>().map_err(AppError::BadRequest))
            .collect()
    }
}
