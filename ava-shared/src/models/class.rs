/// Class model
///
/// # Schema
///
/// ```sql
/// CREATE TABLE classes (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL UNIQUE,
///     start_date DATE NOT NULL,
///     final_date DATE NOT NULL,
///     img_class VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A class (group of students over a date range)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub final_date: NaiveDate,
    pub img_class: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or fully replacing a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub final_date: NaiveDate,
    pub img_class: Option<String>,
}

impl ClassInput {
    /// Checks the name is present and the date range is ordered
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("class name is required".to_string());
        }

        if self.final_date < self.start_date {
            return Err("final_date must not be before start_date".to_string());
        }

        Ok(())
    }
}
