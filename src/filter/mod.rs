use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

use crate::database::models::NurseryRecord;

/// Optional equality filters over `trees_nursery` (aliased `tn` in queries).
/// Column names are fixed here; only values are bound.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NurseryFilter {
    #[serde(skip)]
    pub id: Option<i32>,
    #[serde(alias = "description_id")]
    pub tree_desc_id: Option<i32>,
    #[serde(alias = "location_id")]
    pub village_id: Option<String>,
    pub registration_date: Option<NaiveDate>,
}

impl NurseryFilter {
    pub fn by_id(id: i32) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_description(tree_desc_id: i32) -> Self {
        Self {
            tree_desc_id: Some(tree_desc_id),
            ..Default::default()
        }
    }

    /// Append `AND tn.<column> = $n` for each present field. The builder must
    /// already contain a `WHERE` clause.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(id) = self.id {
            qb.push(" AND tn.id = ").push_bind(id);
        }
        if let Some(tree_desc_id) = self.tree_desc_id {
            qb.push(" AND tn.tree_desc_id = ").push_bind(tree_desc_id);
        }
        if let Some(village_id) = &self.village_id {
            qb.push(" AND tn.village_id = ").push_bind(village_id.clone());
        }
        if let Some(date) = self.registration_date {
            qb.push(" AND tn.registration_date = ").push_bind(date);
        }
    }

    pub fn matches(&self, record: &NurseryRecord) -> bool {
        self.id.map_or(true, |id| record.id == id)
            && self.tree_desc_id.map_or(true, |t| record.tree_desc_id == t)
            && self.village_id.as_ref().map_or(true, |v| &record.village_id == v)
            && self.registration_date.map_or(true, |d| record.registration_date == d)
    }
}
