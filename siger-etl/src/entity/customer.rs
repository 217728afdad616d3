use serde::{Deserialize, Serialize};

use crate::entity::columns::source;
use crate::entity::fields::{self, key_from_number_or_string, null_to_default};
use crate::entity::{Entity, EntityKind};
use crate::error::SyncResult;
use crate::source::RawRow;

/// A customer of the ERP, keyed by its customer code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(
        rename = "id_siger_cliente",
        deserialize_with = "key_from_number_or_string"
    )]
    pub natural_key: i64,
    #[serde(rename = "nome_cliente", default, deserialize_with = "null_to_default")]
    pub name: String,
    #[serde(rename = "cnpj", default, deserialize_with = "null_to_default")]
    pub tax_id: String,
    #[serde(rename = "deletado", default, deserialize_with = "null_to_default")]
    pub deleted: bool,
}

impl Entity for Customer {
    const KIND: EntityKind = EntityKind::Customer;

    fn natural_key(&self) -> i64 {
        self.natural_key
    }

    fn from_row(row: &RawRow) -> SyncResult<Self> {
        Ok(Self {
            natural_key: fields::key(row, source::CUSTOMER_CODE)?,
            name: fields::text(row, source::CUSTOMER_NAME),
            tax_id: fields::text(row, source::CUSTOMER_TAX_ID),
            deleted: fields::is_deleted(row),
        })
    }
}
