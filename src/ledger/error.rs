use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{message}: {}", summarize(.field_errors))]
    Validation {
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error(
        "quantity_nursery of tree description {tree_desc_id} would become negative \
         (current {current}, change {delta})"
    )]
    NegativeAggregate {
        tree_desc_id: i32,
        current: Decimal,
        delta: Decimal,
    },

    #[error(
        "quantity_nursery of tree description {tree_desc_id} would exceed its column range \
         (current {current}, change {delta})"
    )]
    AggregateOverflow {
        tree_desc_id: i32,
        current: Decimal,
        delta: Decimal,
    },

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>, field_errors: BTreeMap<String, String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_field(field: &str, problem: impl Into<String>) -> Self {
        let mut field_errors = BTreeMap::new();
        field_errors.insert(field.to_string(), problem.into());
        Self::validation("Invalid field values", field_errors)
    }

    pub fn nursery_not_found(id: i32) -> Self {
        LedgerError::NotFound {
            entity: "Tree nursery record",
            id,
        }
    }

    pub fn description_not_found(id: i32) -> Self {
        LedgerError::NotFound {
            entity: "Tree description",
            id,
        }
    }

    /// SQLSTATE of the underlying store error, when the store reported one
    pub fn store_code(&self) -> Option<String> {
        match self {
            LedgerError::Store(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
            _ => None,
        }
    }
}

/// Render field errors as `field: problem; field: problem`
pub fn summarize(field_errors: &BTreeMap<String, String>) -> String {
    field_errors
        .iter()
        .map(|(field, problem)| format!("{}: {}", field, problem))
        .collect::<Vec<_>>()
        .join("; ")
}
