mod common;

use std::io;
use std::sync::{Arc, Mutex};

use encoding_rs::WINDOWS_1252;
use serde_json::json;
use siger_etl::entity::{Contract, Customer, EntityKind, Product};
use siger_etl::error::ErrorKind;
use siger_etl::store::memory::{MemoryStore, ROW_ID_COLUMN};
use siger_etl::store::to_store_row;
use siger_telemetry::tracing::init_test_tracing;

use crate::common::{
    CONTRACT_TABLE, CUSTOMER_TABLE, ExportFixture, PRODUCT_TABLE, write_export,
};

fn acme() -> Customer {
    Customer {
        natural_key: 10,
        name: "ACME Ltda".to_string(),
        tax_id: "12.345.678/0001-90".to_string(),
        deleted: false,
    }
}

fn contract_500() -> Contract {
    Contract {
        natural_key: 500,
        customer_key: 10,
        start_date: "01/02/2024".to_string(),
        valid_from: "01/03/2024".to_string(),
        valid_until: "2099-01-01".to_string(),
        deleted: false,
    }
}

fn scale() -> Product {
    Product {
        natural_key: 900,
        name: "Balança".to_string(),
        product_type: "Equipamento".to_string(),
        serial_number: "SN-1".to_string(),
        lot_number: "L-1".to_string(),
        active: false,
    }
}

#[tokio::test]
async fn empty_store_receives_every_record() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    let store = MemoryStore::new();

    let report = fixture.pipeline(&store).run().await;

    assert!(report.is_success());
    for kind in EntityKind::SYNC_ORDER {
        assert_eq!(report.inserted(kind), 1);
        assert_eq!(report.updated(kind), 0);
        assert_eq!(report.skipped(kind), 0);
    }
    assert_eq!(report.errors().count(), 0);

    assert_eq!(
        store.records::<Customer>(CUSTOMER_TABLE).await.unwrap(),
        vec![acme()]
    );
    assert_eq!(
        store.records::<Contract>(CONTRACT_TABLE).await.unwrap(),
        vec![contract_500()]
    );
    assert_eq!(
        store.records::<Product>(PRODUCT_TABLE).await.unwrap(),
        vec![scale()]
    );
}

#[tokio::test]
async fn rerun_against_synced_store_skips_everything() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    let store = MemoryStore::new();
    let pipeline = fixture.pipeline(&store);

    pipeline.run().await;
    let report = pipeline.run().await;

    assert!(report.is_success());
    for kind in EntityKind::SYNC_ORDER {
        assert_eq!(report.inserted(kind), 0);
        assert_eq!(report.updated(kind), 0);
        assert_eq!(report.skipped(kind), 1);
    }
    assert_eq!(store.insert_batches(CUSTOMER_TABLE).await, vec![1]);
    assert_eq!(store.update_count(CUSTOMER_TABLE).await, 0);
}

#[tokio::test]
async fn changed_rows_update_the_stored_record() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    let store = MemoryStore::new();
    let pipeline = fixture.pipeline(&store);
    pipeline.run().await;

    fixture.write_customers(&["10;ACME Comércio Ltda;12.345.678/0001-90;Inativo"]);
    let report = pipeline.run().await;

    assert_eq!(report.updated(EntityKind::Customer), 1);
    assert_eq!(report.skipped(EntityKind::Contract), 1);
    assert_eq!(report.skipped(EntityKind::Product), 1);

    let rows = store.rows(CUSTOMER_TABLE).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("nome_cliente"), Some(&json!("ACME Comércio Ltda")));
    assert_eq!(rows[0].get("deletado"), Some(&json!(true)));
    assert_eq!(rows[0].get(ROW_ID_COLUMN), Some(&json!(1)));
}

#[tokio::test]
async fn product_schema_error_leaves_other_entities_intact() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    write_export(
        &fixture.products,
        "Código;Desc.item;Núm.lote forn;Núm.lote;Descr.Sit.item cont.(enumerado)",
        &["900;Balança;SN-1;L-1;Inativo"],
    );
    let store = MemoryStore::new();

    let report = fixture.pipeline(&store).run().await;

    assert!(!report.is_success());
    let products = report.entity(EntityKind::Product).unwrap();
    let failure = products.failure.as_ref().unwrap();
    assert_eq!(failure.kind(), ErrorKind::SchemaError);
    assert_eq!(failure.detail(), Some("Descrição"));

    assert_eq!(report.inserted(EntityKind::Customer), 1);
    assert_eq!(report.inserted(EntityKind::Contract), 1);
    assert!(store.rows(PRODUCT_TABLE).await.is_empty());
}

#[tokio::test]
async fn bad_rows_are_rejected_without_stopping_the_pipeline() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    fixture.write_customers(&[
        "10;ACME Ltda;12.345.678/0001-90;Ativo",
        "1O;Typo Ltda;1;Ativo",
        "11",
        ";Sem código;2;Ativo",
        "12;Beta SA;3;Ativo",
    ]);
    let store = MemoryStore::new();

    let report = fixture.pipeline(&store).run().await;

    assert!(report.is_success());
    assert_eq!(report.inserted(EntityKind::Customer), 3);

    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].entity, EntityKind::Customer);
    assert_eq!(errors[0].row_index, 2);
    assert_eq!(errors[0].error.kind(), ErrorKind::FormatError);
    assert_eq!(errors[1].row_index, 4);
    assert_eq!(errors[1].error.kind(), ErrorKind::MissingField);
    assert_eq!(errors[1].error.detail(), Some("Cód"));

    let keys: Vec<i64> = store
        .records::<Customer>(CUSTOMER_TABLE)
        .await
        .unwrap()
        .iter()
        .map(|customer| customer.natural_key)
        .collect();
    assert_eq!(keys, vec![10, 11, 12]);
}

#[tokio::test]
async fn short_row_without_status_is_deleted() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    fixture.write_customers(&["11;Sem status"]);
    let store = MemoryStore::new();

    fixture.pipeline(&store).run().await;

    let customers = store.records::<Customer>(CUSTOMER_TABLE).await.unwrap();
    assert_eq!(customers.len(), 1);
    assert!(customers[0].deleted);
    assert_eq!(customers[0].tax_id, "");
}

#[tokio::test]
async fn contracts_for_unknown_customers_are_rejected() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    fixture.write_contracts(&[
        "500;10;01/02/2024;01/03/2024;;Ativo",
        "501;99;01/02/2024;01/03/2024;;Ativo",
    ]);
    let store = MemoryStore::new();

    let report = fixture.pipeline(&store).run().await;

    assert!(report.is_success());
    assert_eq!(report.inserted(EntityKind::Contract), 1);

    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].entity, EntityKind::Contract);
    assert_eq!(errors[0].row_index, 2);
    assert_eq!(errors[0].natural_key, Some(501));
    assert_eq!(errors[0].error.kind(), ErrorKind::ForeignKeyViolation);

    assert_eq!(
        store.records::<Contract>(CONTRACT_TABLE).await.unwrap(),
        vec![contract_500()]
    );
}

#[tokio::test]
async fn contracts_may_reference_customers_already_stored() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    fixture.write_customers(&["11;Beta SA;3;Ativo"]);
    let store = MemoryStore::new();
    store
        .seed(CUSTOMER_TABLE, vec![to_store_row(&acme()).unwrap()])
        .await;

    let report = fixture.pipeline(&store).run().await;

    assert_eq!(report.inserted(EntityKind::Customer), 1);
    assert_eq!(report.inserted(EntityKind::Contract), 1);
    assert_eq!(report.errors().count(), 0);
}

#[tokio::test]
async fn failed_customer_pipeline_falls_back_to_store_lookups() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    std::fs::remove_file(&fixture.customers).unwrap();
    fixture.write_contracts(&[
        "500;10;01/02/2024;01/03/2024;;Ativo",
        "501;99;01/02/2024;01/03/2024;;Ativo",
    ]);
    let store = MemoryStore::new();
    store
        .seed(CUSTOMER_TABLE, vec![to_store_row(&acme()).unwrap()])
        .await;

    let report = fixture.pipeline(&store).run().await;

    let customers = report.entity(EntityKind::Customer).unwrap();
    assert_eq!(
        customers.failure.as_ref().map(|err| err.kind()),
        Some(ErrorKind::IoError)
    );
    assert_eq!(report.inserted(EntityKind::Contract), 1);
    assert_eq!(report.errors().count(), 1);
    assert_eq!(report.inserted(EntityKind::Product), 1);
}

#[tokio::test]
async fn read_failure_aborts_only_its_entity() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    let store = MemoryStore::new();
    store.fail_reads(CONTRACT_TABLE).await;

    let report = fixture.pipeline(&store).run().await;

    let contracts = report.entity(EntityKind::Contract).unwrap();
    assert_eq!(
        contracts.failure.as_ref().map(|err| err.kind()),
        Some(ErrorKind::RemoteUnavailable)
    );
    assert_eq!(report.inserted(EntityKind::Customer), 1);
    assert_eq!(report.inserted(EntityKind::Product), 1);
    assert!(store.insert_batches(CONTRACT_TABLE).await.is_empty());

    let err = report.into_result().unwrap_err();
    assert_eq!(err.kinds(), vec![ErrorKind::RemoteUnavailable]);
}

#[tokio::test]
async fn write_failure_aborts_only_its_entity() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    let store = MemoryStore::new();
    store.fail_writes(CUSTOMER_TABLE).await;

    let report = fixture.pipeline(&store).run().await;

    let customers = report.entity(EntityKind::Customer).unwrap();
    assert_eq!(
        customers.failure.as_ref().map(|err| err.kind()),
        Some(ErrorKind::RemoteUnavailable)
    );
    // The customer was never written, so its contract must not be either.
    assert_eq!(report.inserted(EntityKind::Contract), 0);
    assert_eq!(
        report.errors().next().map(|err| err.error.kind()),
        Some(ErrorKind::ForeignKeyViolation)
    );
    assert_eq!(report.inserted(EntityKind::Product), 1);
}

#[tokio::test]
async fn duplicate_keys_keep_the_last_row() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    fixture.write_products(&[
        "900;Balança antiga;Equipamento;;;Ativo",
        "901;Sensor;Equipamento;;;Ativo",
        "900;Balança;Equipamento;SN-1;L-1;Inativo",
    ]);
    let store = MemoryStore::new();

    let report = fixture.pipeline(&store).run().await;

    let products = report.entity(EntityKind::Product).unwrap();
    assert_eq!(products.inserted, 2);
    assert_eq!(products.duplicates, 1);

    let stored = store.records::<Product>(PRODUCT_TABLE).await.unwrap();
    assert_eq!(stored[0], scale());
    assert_eq!(stored[1].natural_key, 901);
}

#[tokio::test]
async fn inserts_are_sent_in_batches() {
    init_test_tracing();

    let fixture = ExportFixture::single_records();
    fixture.write_products(&[
        "901;A;Tipo;;;Ativo",
        "902;B;Tipo;;;Ativo",
        "903;C;Tipo;;;Ativo",
        "904;D;Tipo;;;Ativo",
        "905;E;Tipo;;;Ativo",
    ]);
    let store = MemoryStore::new();
    let mut config = fixture.config();
    config.batch.max_size = 2;

    let report = siger_etl::pipeline::SyncPipeline::new(config, store.clone())
        .run()
        .await;

    assert_eq!(report.inserted(EntityKind::Product), 5);
    assert_eq!(store.insert_batches(PRODUCT_TABLE).await, vec![2, 2, 1]);
}

#[tokio::test]
async fn shared_export_feeds_every_entity() {
    init_test_tracing();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.csv");
    let export = "Cód;Razão social;CNPJ/CPF;Núm.contrato;Dt.inc.cont;Dt.vig.inic;Dt.vig.final;\
                  Código;Desc.item;Descrição;Núm.lote forn;Núm.lote;Descr.Sit.item cont.(enumerado)\n\
                  10;Associação São João;1;500;01/02/2024;01/03/2024;;900;Balança;Equipamento;SN-1;L-1;Ativo\n\
                  10;Associação São João;1;501;01/02/2024;01/03/2024;31/12/2030;901;Sensor;Equipamento;;;Ativo\n";
    let (bytes, _, _) = WINDOWS_1252.encode(export);
    std::fs::write(&path, &bytes).unwrap();

    let mut config = siger_config::shared::SyncServiceConfig::default();
    config.source.path = path;
    config.source.encoding = Some("windows-1252".to_string());
    let store = MemoryStore::new();

    let report = siger_etl::pipeline::SyncPipeline::new(config, store.clone())
        .run()
        .await;

    assert!(report.is_success());
    assert_eq!(report.inserted(EntityKind::Customer), 1);
    assert_eq!(report.entity(EntityKind::Customer).unwrap().duplicates, 1);
    assert_eq!(report.inserted(EntityKind::Contract), 2);
    assert_eq!(report.inserted(EntityKind::Product), 2);

    let customers = store.records::<Customer>(CUSTOMER_TABLE).await.unwrap();
    assert_eq!(customers[0].name, "Associação São João");

    let contracts = store.records::<Contract>(CONTRACT_TABLE).await.unwrap();
    assert_eq!(contracts[0].valid_until, "2099-01-01");
    assert_eq!(contracts[1].valid_until, "31/12/2030");
}

/// Collects formatted log lines in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn count(&self, message: &str) -> usize {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.contains(message))
            .count()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn every_run_logs_exactly_one_summary_line() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let fixture = ExportFixture::single_records();
    let store = MemoryStore::new();

    let report = fixture.pipeline(&store).run().await;
    assert!(report.is_success());
    assert_eq!(logs.count("sync run completed"), 1);

    store.fail_reads(CONTRACT_TABLE).await;
    let report = fixture.pipeline(&store).run().await;
    assert!(!report.is_success());
    assert_eq!(logs.count("sync run completed"), 2);
    assert_eq!(logs.count("sync run completed with failed entities"), 1);
}
