use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Botanical identity of a species plus its live nursery stock total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TreeDescription {
    pub tree_desc_id: i32,
    pub scientific_name: String,
    pub kinyarwanda: Option<String>,
    pub family: Option<String>,
    pub products: Option<String>,
    pub quantity_nursery: Decimal,
}

/// Digits after the point in every `NUMERIC(12, 2)` quantity column
pub const QUANTITY_SCALE: u32 = 2;

/// Largest value a `NUMERIC(12, 2)` quantity column can hold
pub fn max_quantity() -> Decimal {
    Decimal::new(999_999_999_999, QUANTITY_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_quantity_matches_column_precision() {
        assert_eq!(max_quantity().to_string(), "9999999999.99");
        assert_eq!(max_quantity().scale(), QUANTITY_SCALE);
    }
}
