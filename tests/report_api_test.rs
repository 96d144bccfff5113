// ==========================================
// ReportApi 资金来源与执行总览测试
// ==========================================
// 测试目标: 导入 → 资金来源登记 → 来源执行报表 / 跨数据集总览
// 夹具: 计划表同时作为承诺表导入; 支付表
// ==========================================


use pac_ingest::api::{ApiError, ImportApi, ReportApi};
use pac_ingest::domain::types::{Category, DatasetKind};
use pac_ingest::domain::FundingSource;
use pac_ingest::logging;
use rust_decimal::Decimal;
use std::str::FromStr;
use test_helpers::{
    create_test_db, paid_sheet, path_str, programmed_sheet, shared_connection, write_csv_workbook,
};

const YEAR: i32 = 2026;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// 导入计划/承诺/支付三个数据集,返回 ReportApi
async fn seeded_report_api(db_path: &str) -> ReportApi {
    let programmed = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let paid = write_csv_workbook(&paid_sheet()).expect("Failed to write csv");
    let api = ImportApi::open(db_path).expect("Failed to open ImportApi");

    for dataset in [DatasetKind::Programmed, DatasetKind::Committed] {
        api.import_file(&path_str(&programmed), dataset, YEAR, "tesoreria", None)
            .await
            .expect("Import should succeed");
    }
    api.import_file(&path_str(&paid), DatasetKind::Paid, YEAR, "tesoreria", None)
        .await
        .expect("Import should succeed");

    ReportApi::new(shared_connection(db_path).expect("Failed to open db"))
}

#[tokio::test]
async fn test_funding_source_report_against_assigned_budget() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let report_api = seeded_report_api(&db_path).await;

    let mut propios = FundingSource::new(YEAR, " 20 ", dec("1000"));
    propios.description = "Recursos propios".to_string();
    let stored = report_api
        .register_funding_source(propios)
        .await
        .expect("Register should succeed");
    assert_eq!(stored.name, "20");
    report_api
        .register_funding_source(FundingSource::new(YEAR, "SGR", dec("500")))
        .await
        .expect("Register should succeed");

    let reports = report_api
        .funding_sources(YEAR)
        .await
        .expect("Report should succeed");
    let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["20", "SGR", "10", "25"]);

    // 来源 20: 运营 300 + 偿债 50 + 保留 80 + 应付 20
    let propios = &reports[0];
    assert!(propios.registered);
    assert_eq!(propios.description, "Recursos propios");
    assert_eq!(propios.programmed_expense, dec("450"));
    assert_eq!(propios.committed, dec("450"));
    assert_eq!(propios.paid_expense, dec("100"));
    assert_eq!(propios.collected, Decimal::ZERO);
    assert_eq!(propios.available_balance, dec("550"));
    assert_eq!(propios.execution_pct, dec("45.0"));
    assert_eq!(propios.payment_pct, dec("22.2"));
    assert_eq!(propios.months[0].programmed_expense, dec("250"));
    assert_eq!(propios.months[0].pct_paid, dec("40.0"));

    // 已登记但无数据
    let sgr = &reports[1];
    assert_eq!(sgr.committed, Decimal::ZERO);
    assert_eq!(sgr.available_balance, dec("500"));

    // 未登记来源: 收入来源 10
    let ingresos = &reports[2];
    assert!(!ingresos.registered);
    assert_eq!(ingresos.programmed_income, dec("1200"));
    assert_eq!(ingresos.collected, dec("400"));
    assert_eq!(ingresos.assigned_budget, Decimal::ZERO);

    let sgp = &reports[3];
    assert_eq!(sgp.programmed_expense, dec("150"));
    assert_eq!(sgp.committed, dec("150"));
    assert_eq!(sgp.paid_expense, dec("75"));
    assert_eq!(sgp.payment_pct, dec("50.0"));
}

#[tokio::test]
async fn test_funding_source_registration_rules() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let report_api = ReportApi::new(shared_connection(&db_path).unwrap());

    let result = report_api
        .register_funding_source(FundingSource::new(YEAR, "  ", dec("1")))
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    let result = report_api
        .register_funding_source(FundingSource::new(YEAR, "20", dec("-1")))
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    let result = report_api
        .register_funding_source(FundingSource::new(1999, "20", dec("1")))
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    // 重复登记 → 更新预算
    report_api
        .register_funding_source(FundingSource::new(YEAR, "20", dec("10")))
        .await
        .unwrap();
    let updated = report_api
        .register_funding_source(FundingSource::new(YEAR, "20", dec("20")))
        .await
        .unwrap();
    assert_eq!(updated.assigned_budget, dec("20"));
    assert_eq!(report_api.funding_sources(YEAR).await.unwrap().len(), 1);

    // 删除
    report_api.remove_funding_source(YEAR, "20").await.unwrap();
    assert!(report_api.funding_sources(YEAR).await.unwrap().is_empty());
    let result = report_api.remove_funding_source(YEAR, "20").await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_execution_overview_across_datasets() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let report_api = seeded_report_api(&db_path).await;

    let overview = report_api
        .overview(YEAR)
        .await
        .expect("Overview should succeed");
    assert_eq!(overview.fiscal_year, YEAR);

    // 1. 类别: 只来自明细行,按枚举顺序
    let categories: Vec<Category> = overview.categories.iter().map(|c| c.category).collect();
    assert_eq!(
        categories,
        vec![
            Category::CurrentIncome,
            Category::CapitalIncome,
            Category::Operating,
            Category::Investment,
            Category::DebtService,
            Category::Reserves,
            Category::Payables,
        ]
    );

    let current = &overview.categories[0];
    assert_eq!(current.initial_income, Decimal::ZERO);
    assert_eq!(current.programmed_income, dec("1000"));
    assert_eq!(current.paid_income, dec("400"));
    assert_eq!(current.pct_income_paid, dec("40.0"));

    let operating = &overview.categories[2];
    assert_eq!(operating.programmed_expense, dec("300"));
    assert_eq!(operating.committed_expense, dec("300"));
    assert_eq!(operating.paid_expense, dec("100"));
    assert_eq!(operating.pct_expense_committed, dec("100.0"));
    assert_eq!(operating.pct_expense_paid, dec("33.3"));

    // 2. 月度: 支出不含保留/应付,累计逐月递增
    let enero = &overview.months[0];
    assert_eq!(enero.programmed_income, dec("500"));
    assert_eq!(enero.collected_income, dec("400"));
    assert_eq!(enero.pct_income, dec("80.0"));
    assert_eq!(enero.programmed_expense, dec("300"));
    assert_eq!(enero.committed_expense, dec("300"));
    assert_eq!(enero.paid_expense, dec("100"));
    assert_eq!(enero.pct_paid, dec("33.3"));

    let febrero = &overview.months[1];
    assert_eq!(febrero.paid_expense, dec("75"));
    assert_eq!(febrero.cumulative_paid_expense, dec("175"));
    assert_eq!(febrero.cumulative_programmed_expense, dec("400"));

    let diciembre = &overview.months[11];
    assert_eq!(diciembre.cumulative_programmed_income, dec("1200"));
    assert_eq!(diciembre.cumulative_collected_income, dec("400"));
    assert_eq!(diciembre.cumulative_programmed_expense, dec("500"));

    // 3. 无数据的财年
    let empty = report_api.overview(YEAR + 1).await.unwrap();
    assert!(empty.categories.is_empty());
    assert_eq!(empty.months.len(), 12);
}
