#![allow(dead_code)]

use std::path::{Path, PathBuf};

use siger_config::shared::{BatchConfig, SyncServiceConfig};
use siger_etl::pipeline::SyncPipeline;
use siger_etl::store::memory::MemoryStore;
use tempfile::TempDir;

pub const CUSTOMER_HEADER: &str = "Cód;Razão social;CNPJ/CPF;Descr.Sit.item cont.(enumerado)";
pub const CONTRACT_HEADER: &str =
    "Núm.contrato;Cód;Dt.inc.cont;Dt.vig.inic;Dt.vig.final;Descr.Sit.item cont.(enumerado)";
pub const PRODUCT_HEADER: &str =
    "Código;Desc.item;Descrição;Núm.lote forn;Núm.lote;Descr.Sit.item cont.(enumerado)";

pub const CUSTOMER_TABLE: &str = "cliente";
pub const CONTRACT_TABLE: &str = "contrato";
pub const PRODUCT_TABLE: &str = "produto";

/// Export files of one test, each entity read from its own file.
pub struct ExportFixture {
    dir: TempDir,
    pub customers: PathBuf,
    pub contracts: PathBuf,
    pub products: PathBuf,
}

impl ExportFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let customers = dir.path().join("clientes.csv");
        let contracts = dir.path().join("contratos.csv");
        let products = dir.path().join("produtos.csv");

        Self {
            dir,
            customers,
            contracts,
            products,
        }
    }

    /// The single customer, contract and product every scenario starts from.
    pub fn single_records() -> Self {
        let fixture = Self::new();
        fixture.write_customers(&["10;ACME Ltda;12.345.678/0001-90;Ativo"]);
        fixture.write_contracts(&["500;10;01/02/2024;01/03/2024;;Ativo"]);
        fixture.write_products(&["900;Balança;Equipamento;SN-1;L-1;Inativo"]);
        fixture
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_customers(&self, rows: &[&str]) {
        write_export(&self.customers, CUSTOMER_HEADER, rows);
    }

    pub fn write_contracts(&self, rows: &[&str]) {
        write_export(&self.contracts, CONTRACT_HEADER, rows);
    }

    pub fn write_products(&self, rows: &[&str]) {
        write_export(&self.products, PRODUCT_HEADER, rows);
    }

    pub fn config(&self) -> SyncServiceConfig {
        let mut config = SyncServiceConfig::default();
        config.source.path = self.dir.path().join("export.csv");
        config.source.files.customer = Some(self.customers.clone());
        config.source.files.contract = Some(self.contracts.clone());
        config.source.files.product = Some(self.products.clone());
        config.batch = BatchConfig::default();
        config
    }

    pub fn pipeline(&self, store: &MemoryStore) -> SyncPipeline<MemoryStore> {
        SyncPipeline::new(self.config(), store.clone())
    }
}

pub fn write_export(path: &Path, header: &str, rows: &[&str]) {
    let mut contents = String::from(header);
    contents.push('\n');
    for row in rows {
        contents.push_str(row);
        contents.push('\n');
    }

    std::fs::write(path, contents).unwrap();
}
