// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证配置持久化及其对导入行为的影响
// ==========================================


use pac_ingest::api::ImportApi;
use pac_ingest::config::{config_keys, ConfigManager, ImportConfigReader};
use pac_ingest::domain::types::DatasetKind;
use pac_ingest::logging;
use test_helpers::{create_test_db, path_str, programmed_sheet, shared_connection, write_csv_workbook};

#[tokio::test]
async fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[tokio::test]
async fn test_config_values_persist_across_instances() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    // 第一个实例写入
    let writer = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    writer
        .set_config_value(config_keys::DEFAULT_FISCAL_YEAR, "2027")
        .expect("Failed to write config");
    writer
        .set_config_value(&config_keys::sheet_hint(DatasetKind::Committed), "COMPROMISOS 2027")
        .expect("Failed to write config");
    drop(writer);

    // 第二个实例读取
    let reader = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");
    assert_eq!(reader.get_default_fiscal_year().await.unwrap(), 2027);
    assert_eq!(
        reader.get_sheet_hint(DatasetKind::Committed).await.unwrap(),
        Some("COMPROMISOS 2027".to_string())
    );
    // 未覆盖的数据集仍使用内置提示
    assert_eq!(
        reader.get_sheet_hint(DatasetKind::Paid).await.unwrap(),
        Some("EJECUTADO PAGO".to_string())
    );
}

#[tokio::test]
async fn test_footer_keywords_drive_row_skipping() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = shared_connection(&db_path).expect("Failed to open db");

    // 自定义关键字替换默认列表
    let config = ConfigManager::from_connection(conn.clone()).expect("Failed to create ConfigManager");
    config
        .set_config_value(config_keys::FOOTER_KEYWORDS, r#"["contrato"]"#)
        .expect("Failed to write config");

    let workbook = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let api = ImportApi::new(conn);
    let response = api
        .import_file(&path_str(&workbook), DatasetKind::Programmed, 2026, "tesoreria", None)
        .await
        .expect("Import should succeed");

    // "Contrato 12-2025" 被视为页脚; 签名行不再是页脚,因无编码无金额被跳过
    assert_eq!(response.imported, 16);
    assert_eq!(response.stats.skipped_footer, 1);
    assert_eq!(response.stats.skipped_no_content, 4);
    assert_eq!(response.stats.skipped_blank, 2);
}
