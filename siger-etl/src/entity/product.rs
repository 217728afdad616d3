use serde::{Deserialize, Serialize};

use crate::entity::columns::source;
use crate::entity::fields::{self, key_from_number_or_string, null_to_default};
use crate::entity::{Entity, EntityKind};
use crate::error::SyncResult;
use crate::source::RawRow;

/// A contracted product, keyed by its product code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(
        rename = "id_produto_siger",
        deserialize_with = "key_from_number_or_string"
    )]
    pub natural_key: i64,
    #[serde(rename = "nome_produto", default, deserialize_with = "null_to_default")]
    pub name: String,
    #[serde(rename = "tipo_produto", default, deserialize_with = "null_to_default")]
    pub product_type: String,
    #[serde(rename = "num_serie", default, deserialize_with = "null_to_default")]
    pub serial_number: String,
    #[serde(rename = "num_lote", default, deserialize_with = "null_to_default")]
    pub lot_number: String,
    #[serde(rename = "ativo", default, deserialize_with = "null_to_default")]
    pub active: bool,
}

impl Entity for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn natural_key(&self) -> i64 {
        self.natural_key
    }

    fn from_row(row: &RawRow) -> SyncResult<Self> {
        Ok(Self {
            natural_key: fields::key(row, source::PRODUCT_CODE)?,
            name: fields::required(row, source::PRODUCT_NAME)?.to_string(),
            product_type: fields::required(row, source::PRODUCT_TYPE)?.to_string(),
            serial_number: fields::text(row, source::PRODUCT_SERIAL_NUMBER),
            lot_number: fields::text(row, source::PRODUCT_LOT_NUMBER),
            active: fields::is_active(row),
        })
    }
}
