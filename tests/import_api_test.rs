// ==========================================
// 导入 API 测试
// ==========================================
// 模拟调用方经 ImportApi 完成导入/配置读写

mod test_helpers;

use invoice_import::api::{ApiError, ImportApi};
use invoice_import::config::{CommitPolicy, ImportConfig, MalformedRowPolicy, SheetScope};
use invoice_import::logging;
use test_helpers::*;

#[tokio::test]
async fn test_import_api_full_flow() {
    logging::init_test();
    let (_db, db_path) = create_test_db().unwrap();
    let file = write_xlsx(&[three_row_scenario()]).unwrap();

    let api = ImportApi::new(db_path.clone());
    let response = api.import_file(&path_str(file.path())).await.unwrap();

    assert_eq!(response.summary.customers, 2);
    assert_eq!(response.summary.products, 1);
    assert_eq!(response.summary.invoices, 3);
    assert_eq!(response.summary.invoice_items, 3);
    assert_eq!(response.config, ImportConfig::default());
    assert!(response.elapsed_ms >= 0);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["summary"]["invoice_items"], 3);
    assert_eq!(json["config"]["commit_policy"], "ALL_OR_NOTHING");
}

#[tokio::test]
async fn test_import_api_works_on_fresh_database_file() {
    logging::init_test();
    let dir = tempfile::tempdir().unwrap();
    let db_path = path_str(&dir.path().join("fresh.sqlite"));
    let file = write_csv(&three_row_scenario()).unwrap();

    let response = ImportApi::new(db_path.clone())
        .import_file(&path_str(file.path()))
        .await
        .unwrap();

    assert_eq!(response.summary.invoice_items, 3);
    assert_eq!(count_rows(&db_path, "invoices").unwrap(), 3);
}

#[tokio::test]
async fn test_import_api_reports_open_error_kind() {
    logging::init_test();
    let (_db, db_path) = create_test_db().unwrap();

    let err = ImportApi::new(db_path)
        .import_file("/nonexistent/invoices.xlsx")
        .await
        .unwrap_err();

    assert_eq!(err.import_kind(), Some("ROW_SOURCE_OPEN"));
}

#[tokio::test]
async fn test_import_api_reports_malformed_row_kind() {
    logging::init_test();
    let (_db, db_path) = create_test_db().unwrap();
    let file = write_raw_csv("h\n1,44197,Acme").unwrap();

    let err = ImportApi::new(db_path.clone())
        .import_file(&path_str(file.path()))
        .await
        .unwrap_err();

    assert_eq!(err.import_kind(), Some("MALFORMED_ROW"));
    assert_eq!(count_rows(&db_path, "customers").unwrap(), 0);
}

#[tokio::test]
async fn test_import_api_rejects_empty_path() {
    let (_db, db_path) = create_test_db().unwrap();
    let err = ImportApi::new(db_path).import_file("  ").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_stored_config_drives_next_import() {
    logging::init_test();
    let (_db, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path.clone());

    let config = ImportConfig {
        commit_policy: CommitPolicy::BestEffort,
        malformed_row_policy: MalformedRowPolicy::Skip,
        sheet_scope: SheetScope::First,
    };
    api.set_import_config(&config).unwrap();
    assert_eq!(api.get_import_config().unwrap(), config);

    let file = write_raw_csv(
        "h0,h1,h2,h3,h4,h5,h6,h7,h8\n\
         1,44197,Acme,Addr,Widget,1,10,10,10\n\
         2,44197,Acme,Addr,Widget,lots,10,10,10",
    )
    .unwrap();

    let response = api.import_file(&path_str(file.path())).await.unwrap();

    assert_eq!(response.config, config);
    assert_eq!(response.summary.skipped_rows, 1);
    assert_eq!(response.summary.invoice_items, 1);
}
