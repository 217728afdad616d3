use serde::{Deserialize, Serialize};

use crate::entity::columns::{OPEN_ENDED_VALID_UNTIL, source};
use crate::entity::fields::{self, key_from_number_or_string, null_to_default};
use crate::entity::{Entity, EntityKind};
use crate::error::SyncResult;
use crate::source::RawRow;

/// A customer contract, keyed by its contract number.
///
/// Dates are kept in the export's textual format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    #[serde(rename = "id_contrato", deserialize_with = "key_from_number_or_string")]
    pub natural_key: i64,
    #[serde(
        rename = "id_siger_cliente",
        deserialize_with = "key_from_number_or_string"
    )]
    pub customer_key: i64,
    #[serde(rename = "dt_inic_cont", default, deserialize_with = "null_to_default")]
    pub start_date: String,
    #[serde(rename = "dt_vig_inic", default, deserialize_with = "null_to_default")]
    pub valid_from: String,
    /// Never empty; [`OPEN_ENDED_VALID_UNTIL`] when the export has no end date.
    #[serde(rename = "dt_vig_final", default, deserialize_with = "null_to_default")]
    pub valid_until: String,
    #[serde(rename = "deletado", default, deserialize_with = "null_to_default")]
    pub deleted: bool,
}

impl Entity for Contract {
    const KIND: EntityKind = EntityKind::Contract;

    fn natural_key(&self) -> i64 {
        self.natural_key
    }

    fn from_row(row: &RawRow) -> SyncResult<Self> {
        Ok(Self {
            natural_key: fields::key(row, source::CONTRACT_NUMBER)?,
            customer_key: fields::key(row, source::CUSTOMER_CODE)?,
            start_date: fields::text(row, source::CONTRACT_START_DATE),
            valid_from: fields::text(row, source::CONTRACT_VALID_FROM),
            valid_until: fields::text_or(
                row,
                source::CONTRACT_VALID_UNTIL,
                OPEN_ENDED_VALID_UNTIL,
            ),
            deleted: fields::is_deleted(row),
        })
    }

    fn parent_key(&self) -> Option<i64> {
        Some(self.customer_key)
    }
}
