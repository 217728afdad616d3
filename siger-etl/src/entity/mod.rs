//! The three entities derived from the export and their shared contract.
//!
//! Each entity is a plain record with an explicit integer natural key. Records are
//! built from [`RawRow`]s by [`Entity::from_row`] and exchanged with the remote store
//! through serde, using the store's column names. Store-assigned columns such as
//! internal row ids are ignored when decoding, which keeps them out of comparisons.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use siger_config::shared::{SourceConfig, TablesConfig};

use crate::error::SyncResult;
use crate::source::RawRow;

pub mod columns;
mod contract;
mod customer;
pub mod fields;
mod product;

pub use contract::Contract;
pub use customer::Customer;
pub use product::Product;

/// Entity types, in the order their pipelines run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Customer,
    Contract,
    Product,
}

impl EntityKind {
    /// Pipelines run in this order so that contracts only reference synced customers.
    pub const SYNC_ORDER: [EntityKind; 3] = [
        EntityKind::Customer,
        EntityKind::Contract,
        EntityKind::Product,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customer",
            EntityKind::Contract => "contract",
            EntityKind::Product => "product",
        }
    }

    /// Store column holding the natural key.
    pub fn key_column(&self) -> &'static str {
        match self {
            EntityKind::Customer => columns::store::CUSTOMER_KEY,
            EntityKind::Contract => columns::store::CONTRACT_KEY,
            EntityKind::Product => columns::store::PRODUCT_KEY,
        }
    }

    /// Export column holding the natural key.
    pub fn source_key_column(&self) -> &'static str {
        match self {
            EntityKind::Customer => columns::source::CUSTOMER_CODE,
            EntityKind::Contract => columns::source::CONTRACT_NUMBER,
            EntityKind::Product => columns::source::PRODUCT_CODE,
        }
    }

    /// Columns the export header must contain for this entity's pipeline to run.
    pub fn required_columns(&self) -> &'static [&'static str] {
        use columns::source::*;

        match self {
            EntityKind::Customer => &[CUSTOMER_CODE, CUSTOMER_NAME, CUSTOMER_TAX_ID],
            EntityKind::Contract => &[
                CONTRACT_NUMBER,
                CUSTOMER_CODE,
                CONTRACT_START_DATE,
                CONTRACT_VALID_FROM,
            ],
            EntityKind::Product => &[PRODUCT_CODE, PRODUCT_NAME, PRODUCT_TYPE],
        }
    }

    /// Store table this entity is written to.
    pub fn table<'a>(&self, tables: &'a TablesConfig) -> &'a str {
        match self {
            EntityKind::Customer => &tables.customer,
            EntityKind::Contract => &tables.contract,
            EntityKind::Product => &tables.product,
        }
    }

    /// Export file this entity is read from.
    pub fn source_path<'a>(&self, source: &'a SourceConfig) -> &'a Path {
        let file = match self {
            EntityKind::Customer => source.files.customer.as_deref(),
            EntityKind::Contract => source.files.contract.as_deref(),
            EntityKind::Product => source.files.product.as_deref(),
        };

        file.unwrap_or(&source.path)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record reconciled against the remote store.
///
/// Equality must cover every field the store persists and nothing the store assigns.
pub trait Entity:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    const KIND: EntityKind;

    /// The immutable business identifier used to match records against the store.
    fn natural_key(&self) -> i64;

    /// Builds the record from one export row.
    ///
    /// Fails with a row-level error when a required field is absent or malformed.
    fn from_row(row: &RawRow) -> SyncResult<Self>;

    /// Natural key of the customer this record depends on, if any.
    fn parent_key(&self) -> Option<i64> {
        None
    }
}
