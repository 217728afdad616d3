//! Column labels of the ERP export and column names of the remote store.

/// Status text shared by every entity, compared case-insensitively to [`ACTIVE_STATUS`].
pub const STATUS: &str = "Descr.Sit.item cont.(enumerado)";

/// Normalized status value of an active record.
pub const ACTIVE_STATUS: &str = "ativo";

/// Stored in place of an absent contract end date, meaning "never expires".
pub const OPEN_ENDED_VALID_UNTIL: &str = "2099-01-01";

pub mod source {
    pub const CUSTOMER_CODE: &str = "Cód";
    pub const CUSTOMER_NAME: &str = "Razão social";
    pub const CUSTOMER_TAX_ID: &str = "CNPJ/CPF";

    pub const CONTRACT_NUMBER: &str = "Núm.contrato";
    pub const CONTRACT_START_DATE: &str = "Dt.inc.cont";
    pub const CONTRACT_VALID_FROM: &str = "Dt.vig.inic";
    pub const CONTRACT_VALID_UNTIL: &str = "Dt.vig.final";

    pub const PRODUCT_CODE: &str = "Código";
    pub const PRODUCT_NAME: &str = "Desc.item";
    pub const PRODUCT_TYPE: &str = "Descrição";
    pub const PRODUCT_SERIAL_NUMBER: &str = "Núm.lote forn";
    pub const PRODUCT_LOT_NUMBER: &str = "Núm.lote";
}

/// Natural key columns of the remote store. The remaining store columns are the
/// serde names of the entity records.
pub mod store {
    pub const CUSTOMER_KEY: &str = "id_siger_cliente";
    pub const CONTRACT_KEY: &str = "id_contrato";
    pub const PRODUCT_KEY: &str = "id_produto_siger";
}
