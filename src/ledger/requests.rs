use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use super::LedgerError;
use crate::database::models::{max_quantity, NewNurseryRecord, NurseryChanges, QUANTITY_SCALE};

/// Body of `POST /api/tree-nursery/register`. Every field is optional at the
/// wire level so that missing fields surface as a validation error naming
/// them, rather than as a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(alias = "description_id")]
    pub tree_desc_id: Option<i32>,
    pub quantity_added: Option<Decimal>,
    pub registration_date: Option<NaiveDate>,
    #[serde(alias = "location_id", default, deserialize_with = "string_or_number")]
    pub village_id: Option<String>,
    #[serde(alias = "registering_principal")]
    pub registered_by: Option<i32>,
    pub notes: Option<String>,
    pub growing_method_id: Option<i32>,
    pub stage_id_nursery: Option<i32>,
    pub date_planted: Option<NaiveDate>,
    pub propagation_method: Option<String>,
}

impl RegisterRequest {
    /// Check required fields. `principal` is the authenticated caller and
    /// stands in for `registered_by` when the body omits it.
    pub fn validate(self, principal: Option<i32>) -> Result<NewNurseryRecord, LedgerError> {
        let mut missing = BTreeMap::new();
        let mut invalid = BTreeMap::new();

        let registered_by = self.registered_by.or(principal);
        let village_id = self.village_id.filter(|v| !v.trim().is_empty());

        if self.tree_desc_id.is_none() {
            missing.insert("tree_desc_id".to_string(), "This field is required".to_string());
        }
        match self.quantity_added {
            None => {
                missing.insert("quantity_added".to_string(), "This field is required".to_string());
            }
            Some(q) => {
                if let Some(problem) = quantity_problem(q) {
                    invalid.insert("quantity_added".to_string(), problem);
                }
            }
        }
        if self.registration_date.is_none() {
            missing.insert("registration_date".to_string(), "This field is required".to_string());
        }
        if village_id.is_none() {
            missing.insert("village_id".to_string(), "This field is required".to_string());
        }
        if registered_by.is_none() {
            missing.insert("registered_by".to_string(), "This field is required".to_string());
        }

        if !missing.is_empty() {
            missing.extend(invalid);
            return Err(LedgerError::validation("Missing required fields", missing));
        }
        if !invalid.is_empty() {
            return Err(LedgerError::validation("Invalid field values", invalid));
        }

        match (
            self.tree_desc_id,
            self.quantity_added,
            self.registration_date,
            village_id,
            registered_by,
        ) {
            (
                Some(tree_desc_id),
                Some(quantity_added),
                Some(registration_date),
                Some(village_id),
                Some(registered_by),
            ) => Ok(NewNurseryRecord {
                tree_desc_id,
                quantity_added,
                registration_date,
                village_id,
                registered_by,
                notes: self.notes,
                growing_method_id: self.growing_method_id,
                stage_id_nursery: self.stage_id_nursery,
                date_planted: self.date_planted,
                propagation_method: self.propagation_method,
            }),
            _ => Err(LedgerError::validation("Missing required fields", BTreeMap::new())),
        }
    }
}

/// Body of `PUT /api/tree-nursery/:id`; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(alias = "description_id")]
    pub tree_desc_id: Option<i32>,
    #[serde(alias = "quantity")]
    pub quantity_added: Option<Decimal>,
    pub registration_date: Option<NaiveDate>,
    #[serde(alias = "location_id", default, deserialize_with = "string_or_number")]
    pub village_id: Option<String>,
    pub notes: Option<String>,
    pub growing_method_id: Option<i32>,
    pub stage_id_nursery: Option<i32>,
    pub date_planted: Option<NaiveDate>,
    pub propagation_method: Option<String>,
}

impl UpdateRequest {
    pub fn validate(self) -> Result<NurseryChanges, LedgerError> {
        if let Some(problem) = self.quantity_added.and_then(quantity_problem) {
            return Err(LedgerError::invalid_field("quantity_added", problem));
        }
        if matches!(&self.village_id, Some(v) if v.trim().is_empty()) {
            return Err(LedgerError::invalid_field("village_id", "Must not be empty"));
        }

        let changes = NurseryChanges {
            tree_desc_id: self.tree_desc_id,
            quantity_added: self.quantity_added,
            registration_date: self.registration_date,
            village_id: self.village_id,
            notes: self.notes,
            growing_method_id: self.growing_method_id,
            stage_id_nursery: self.stage_id_nursery,
            date_planted: self.date_planted,
            propagation_method: self.propagation_method,
        };

        if changes.assignments().is_empty() {
            let mut field_errors = BTreeMap::new();
            field_errors.insert("body".to_string(), "No fields provided to update".to_string());
            return Err(LedgerError::validation("No fields provided to update", field_errors));
        }
        Ok(changes)
    }
}

/// Quantities land in `NUMERIC(12, 2)` columns; anything the column would
/// round or overflow is rejected here instead.
fn quantity_problem(q: Decimal) -> Option<String> {
    if q <= Decimal::ZERO {
        Some("Must be a positive number".to_string())
    } else if q.normalize().scale() > QUANTITY_SCALE {
        Some(format!("Must have at most {} decimal places", QUANTITY_SCALE))
    } else if q > max_quantity() {
        Some(format!("Must not exceed {}", max_quantity()))
    } else {
        None
    }
}

/// Location ids arrive both as `"1"` and as `1`
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}
