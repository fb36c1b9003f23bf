use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of `trees_nursery`: a single stock change for a species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NurseryRecord {
    pub id: i32,
    pub tree_desc_id: i32,
    pub quantity_added: Decimal,
    pub registration_date: NaiveDate,
    pub village_id: String,
    pub registered_by: i32,
    pub notes: Option<String>,
    pub growing_method_id: Option<i32>,
    pub stage_id_nursery: Option<i32>,
    pub date_planted: Option<NaiveDate>,
    pub propagation_method: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validated input for inserting a nursery row
#[derive(Debug, Clone, PartialEq)]
pub struct NewNurseryRecord {
    pub tree_desc_id: i32,
    pub quantity_added: Decimal,
    pub registration_date: NaiveDate,
    pub village_id: String,
    pub registered_by: i32,
    pub notes: Option<String>,
    pub growing_method_id: Option<i32>,
    pub stage_id_nursery: Option<i32>,
    pub date_planted: Option<NaiveDate>,
    pub propagation_method: Option<String>,
}

/// Columns of `trees_nursery` that an update may touch. Anything outside
/// this set can never reach a `SET` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NurseryColumn {
    QuantityAdded,
    RegistrationDate,
    VillageId,
    Notes,
    GrowingMethodId,
    StageIdNursery,
    DatePlanted,
    PropagationMethod,
}

impl NurseryColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            NurseryColumn::QuantityAdded => "quantity_added",
            NurseryColumn::RegistrationDate => "registration_date",
            NurseryColumn::VillageId => "village_id",
            NurseryColumn::Notes => "notes",
            NurseryColumn::GrowingMethodId => "growing_method_id",
            NurseryColumn::StageIdNursery => "stage_id_nursery",
            NurseryColumn::DatePlanted => "date_planted",
            NurseryColumn::PropagationMethod => "propagation_method",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Decimal(Decimal),
    Date(NaiveDate),
    Text(String),
    Int(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: NurseryColumn,
    pub value: FieldValue,
}

/// Validated partial update of a nursery row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NurseryChanges {
    /// When set, must equal the stored `tree_desc_id`
    pub tree_desc_id: Option<i32>,
    pub quantity_added: Option<Decimal>,
    pub registration_date: Option<NaiveDate>,
    pub village_id: Option<String>,
    pub notes: Option<String>,
    pub growing_method_id: Option<i32>,
    pub stage_id_nursery: Option<i32>,
    pub date_planted: Option<NaiveDate>,
    pub propagation_method: Option<String>,
}

impl NurseryChanges {
    pub fn assignments(&self) -> Vec<Assignment> {
        let mut out = Vec::new();
        let mut push = |column, value| out.push(Assignment { column, value });

        if let Some(q) = self.quantity_added {
            push(NurseryColumn::QuantityAdded, FieldValue::Decimal(q));
        }
        if let Some(d) = self.registration_date {
            push(NurseryColumn::RegistrationDate, FieldValue::Date(d));
        }
        if let Some(v) = &self.village_id {
            push(NurseryColumn::VillageId, FieldValue::Text(v.clone()));
        }
        if let Some(n) = &self.notes {
            push(NurseryColumn::Notes, FieldValue::Text(n.clone()));
        }
        if let Some(g) = self.growing_method_id {
            push(NurseryColumn::GrowingMethodId, FieldValue::Int(g));
        }
        if let Some(s) = self.stage_id_nursery {
            push(NurseryColumn::StageIdNursery, FieldValue::Int(s));
        }
        if let Some(d) = self.date_planted {
            push(NurseryColumn::DatePlanted, FieldValue::Date(d));
        }
        if let Some(p) = &self.propagation_method {
            push(NurseryColumn::PropagationMethod, FieldValue::Text(p.clone()));
        }
        out
    }
}

impl NurseryRecord {
    /// Apply assignments in memory, mirroring what the `UPDATE` statement does
    pub fn apply(&mut self, assignments: &[Assignment], now: DateTime<Utc>) {
        for a in assignments {
            match (a.column, &a.value) {
                (NurseryColumn::QuantityAdded, FieldValue::Decimal(q)) => self.quantity_added = *q,
                (NurseryColumn::RegistrationDate, FieldValue::Date(d)) => {
                    self.registration_date = *d
                }
                (NurseryColumn::VillageId, FieldValue::Text(v)) => self.village_id = v.clone(),
                (NurseryColumn::Notes, FieldValue::Text(n)) => self.notes = Some(n.clone()),
                (NurseryColumn::GrowingMethodId, FieldValue::Int(g)) => {
                    self.growing_method_id = Some(*g)
                }
                (NurseryColumn::StageIdNursery, FieldValue::Int(s)) => {
                    self.stage_id_nursery = Some(*s)
                }
                (NurseryColumn::DatePlanted, FieldValue::Date(d)) => self.date_planted = Some(*d),
                (NurseryColumn::PropagationMethod, FieldValue::Text(p)) => {
                    self.propagation_method = Some(p.clone())
                }
                (column, value) => {
                    tracing::warn!("Ignoring mismatched assignment {:?} = {:?}", column, value);
                }
            }
        }
        self.updated_at = Some(now);
    }
}

/// Nursery row joined with its species description, as returned by the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NurseryDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: NurseryRecord,
    pub scientific_name: String,
    pub kinyarwanda: Option<String>,
    pub family: Option<String>,
    pub total_nursery_quantity: Decimal,
}
