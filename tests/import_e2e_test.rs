// ==========================================
// 导入流程端到端测试
// ==========================================
// 测试目标: 工作簿 → 分类 → 落库 → 汇总/跟踪 全链路
// 夹具: CSV 工作簿（与 Excel 同一行列布局）
// ==========================================


use chrono::{DateTime, Utc};
use pac_ingest::api::{ApiError, ImportApi, ReportApi};
use pac_ingest::domain::types::{Category, DatasetKind, FlowType};
use pac_ingest::logging;
use pac_ingest::repository::{BudgetLineRepository, BudgetLineRepositoryImpl};
use rust_decimal::Decimal;
use std::str::FromStr;
use test_helpers::{
    create_test_db, paid_sheet, path_str, programmed_sheet, shared_connection,
    write_corrupt_xlsx, write_csv_workbook,
};

const YEAR: i32 = 2026;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn test_import_programmed_sheet_end_to_end() {
    logging::init_test();

    // 1. 准备数据库与工作簿
    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let workbook = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let api = ImportApi::open(&db_path).expect("Failed to open ImportApi");

    // 2. 导入
    let response = api
        .import_file(&path_str(&workbook), DatasetKind::Programmed, YEAR, "tesoreria", None)
        .await
        .expect("Import should succeed");

    // 3. 统计
    assert_eq!(response.imported, 17);
    assert_eq!(response.stats.rows_scanned, 23);
    assert_eq!(response.stats.skipped_blank, 2);
    assert_eq!(response.stats.skipped_footer, 2);
    assert_eq!(response.stats.skipped_no_content, 2);
    assert_eq!(response.stats.skipped_section_title, 0);
    assert_eq!(response.skipped, 6);
    assert_eq!(response.dataset, DatasetKind::Programmed);

    // 4. 落库内容
    let conn = shared_connection(&db_path).expect("Failed to open db");
    let repo = BudgetLineRepositoryImpl::new(conn);
    let lines = repo
        .list_lines(DatasetKind::Programmed, YEAR)
        .await
        .expect("Failed to list lines");
    assert_eq!(lines.len(), 17);

    let by_row = |row: u32| {
        lines
            .iter()
            .find(|l| l.source_row == row)
            .unwrap_or_else(|| panic!("row {} missing", row))
    };

    // 无 "GASTOS" 标题记录
    assert!(lines.iter().all(|l| l.label.to_uppercase() != "GASTOS"));

    // 第 6 行: 非叶子编码 → 小计
    let caja = by_row(6);
    assert_eq!(caja.category, Some(Category::InitialBalance));
    assert!(caja.is_subtotal);

    // 第 10 行: 资本性收入明细
    let rendimientos = by_row(10);
    assert_eq!(rendimientos.flow_type, FlowType::Income);
    assert_eq!(rendimientos.category, Some(Category::CapitalIncome));
    assert!(!rendimientos.is_subtotal);

    // 第 15 行: 运营明细, 合计 = 月度之和, 最终拨款由调整项推算
    let sueldo = by_row(15);
    assert_eq!(sueldo.flow_type, FlowType::Expense);
    assert_eq!(sueldo.category, Some(Category::Operating));
    assert!(!sueldo.is_subtotal);
    assert_eq!(sueldo.total, dec("300"));
    assert_eq!(sueldo.appropriation.initial, dec("1200"));
    assert_eq!(sueldo.appropriation.definitive, dec("1200"));
    assert_eq!(sueldo.funding_source, "20");
    assert_eq!(sueldo.imported_by.as_deref(), Some("tesoreria"));

    // 第 17 行: 投资明细, 资金来源取末段第一个词
    let vias = by_row(17);
    assert_eq!(vias.category, Some(Category::Investment));
    assert_eq!(vias.funding_source, "25");

    // 第 18 行: 无编码的偿债标题保留分类器判定
    let deuda = by_row(18);
    assert_eq!(deuda.category, Some(Category::DebtService));
    assert!(deuda.is_subtotal);

    // 第 19 行: 偿债明细
    assert_eq!(by_row(19).category, Some(Category::DebtService));

    // 第 22 行: 预算保留, RP 折叠进编码
    let reserva = by_row(22);
    assert_eq!(reserva.category, Some(Category::Reserves));
    assert_eq!(reserva.code, "1003 - 2.1.2.02 - 20 (RP:45)");
    assert_eq!(reserva.funding_source, "20");

    // 第 23/24 行: 应付账款
    assert_eq!(by_row(23).category, Some(Category::Payables));
    assert!(by_row(23).is_subtotal);
    assert_eq!(by_row(24).category, Some(Category::Payables));
    assert!(!by_row(24).is_subtotal);

    // 总计行无类别
    let total_ingresos = by_row(11);
    assert_eq!(total_ingresos.category, None);
    assert_eq!(total_ingresos.flow_type, FlowType::Income);
    assert_eq!(total_ingresos.total, dec("2200"));

    // 5. 批次日志
    let batches = api.list_batches(10).await.expect("Failed to list batches");
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].batch_id, response.batch_id);
    assert_eq!(batches[0].record_count, 17);
    assert_eq!(batches[0].imported_by.as_deref(), Some("tesoreria"));
}

#[tokio::test]
async fn test_total_equals_monthly_sum_when_column_v_empty() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let workbook = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let api = ImportApi::open(&db_path).expect("Failed to open ImportApi");
    api.import_file(&path_str(&workbook), DatasetKind::Programmed, YEAR, "tesoreria", None)
        .await
        .expect("Import should succeed");

    let repo = BudgetLineRepositoryImpl::new(shared_connection(&db_path).unwrap());
    let lines = repo.list_lines(DatasetKind::Programmed, YEAR).await.unwrap();

    // 第 11/20 行有显式合计,其余行合计 = 月度之和
    for line in lines.iter().filter(|l| l.source_row != 11 && l.source_row != 20) {
        assert_eq!(Some(line.total), line.monthly_sum(), "row {}", line.source_row);
    }
}

#[tokio::test]
async fn test_reimport_replaces_instead_of_appending() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let programmed = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let smaller = write_csv_workbook(&paid_sheet()).expect("Failed to write csv");
    let api = ImportApi::open(&db_path).expect("Failed to open ImportApi");
    let repo = BudgetLineRepositoryImpl::new(shared_connection(&db_path).unwrap());

    // 同一文件导入两次 → 记录集相同（导入时间除外）
    let mut snapshots = Vec::new();
    for _ in 0..2 {
        api.import_file(&path_str(&programmed), DatasetKind::Programmed, YEAR, "tesoreria", None)
            .await
            .expect("Import should succeed");
        let mut lines = repo.list_lines(DatasetKind::Programmed, YEAR).await.unwrap();
        for line in lines.iter_mut() {
            line.imported_at = DateTime::<Utc>::UNIX_EPOCH;
        }
        snapshots.push(lines);
    }
    assert_eq!(snapshots[0].len(), 17);
    assert_eq!(snapshots[0], snapshots[1]);

    // 换成较小的工作表 → 旧记录全部被替换
    let response = api
        .import_file(&path_str(&smaller), DatasetKind::Programmed, YEAR, "tesoreria", None)
        .await
        .expect("Import should succeed");
    assert_eq!(response.imported, 4);
    assert_eq!(repo.count_lines(DatasetKind::Programmed, YEAR).await.unwrap(), 4);

    // 其他键不受影响
    assert_eq!(repo.count_lines(DatasetKind::Programmed, YEAR + 1).await.unwrap(), 0);
    assert_eq!(repo.count_lines(DatasetKind::Paid, YEAR).await.unwrap(), 0);

    // 三次导入 → 三条批次日志
    assert_eq!(api.list_batches(100).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_unreadable_workbook_keeps_existing_data() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let workbook = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let corrupt = write_corrupt_xlsx().expect("Failed to write corrupt file");
    let api = ImportApi::open(&db_path).expect("Failed to open ImportApi");

    api.import_file(&path_str(&workbook), DatasetKind::Programmed, YEAR, "tesoreria", None)
        .await
        .expect("Import should succeed");

    // 损坏工作簿 → 可读错误, 已存数据不变
    let result = api
        .import_file(&path_str(&corrupt), DatasetKind::Programmed, YEAR, "tesoreria", None)
        .await;
    assert!(matches!(result, Err(ApiError::WorkbookUnreadable(_))));

    // 不存在的文件
    let result = api
        .import_file("/nonexistent/pac.xlsx", DatasetKind::Programmed, YEAR, "tesoreria", None)
        .await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));

    let repo = BudgetLineRepositoryImpl::new(shared_connection(&db_path).unwrap());
    assert_eq!(repo.count_lines(DatasetKind::Programmed, YEAR).await.unwrap(), 17);
    assert_eq!(api.list_batches(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_import_rejects_invalid_arguments() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let workbook = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let api = ImportApi::open(&db_path).expect("Failed to open ImportApi");
    let path = path_str(&workbook);

    let result = api
        .import_file(&path, DatasetKind::Programmed, 1999, "tesoreria", None)
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    let result = api
        .import_file(&path, DatasetKind::Programmed, YEAR, "  ", None)
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    let result = api
        .import_file("", DatasetKind::Programmed, YEAR, "tesoreria", None)
        .await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));

    let result = api.import_all(&path, 2101, "tesoreria").await;
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn test_import_all_reports_each_dataset() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let workbook = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let api = ImportApi::open(&db_path).expect("Failed to open ImportApi");

    // CSV 只有一个工作表: 三个数据集都读取同一张表
    let results = api
        .import_all(&path_str(&workbook), YEAR, "tesoreria")
        .await
        .expect("import_all should return per-dataset results");
    assert_eq!(results.len(), 3);
    let datasets: Vec<DatasetKind> = results.iter().map(|r| r.dataset).collect();
    assert_eq!(
        datasets,
        vec![DatasetKind::Programmed, DatasetKind::Committed, DatasetKind::Paid]
    );
    for result in &results {
        assert!(result.error.is_none(), "{:?}", result.error);
        assert_eq!(result.result.as_ref().map(|r| r.imported), Some(17));
    }

    // 文件不存在 → 每个数据集各自报错
    let results = api
        .import_all("/nonexistent/pac.xlsx", YEAR, "tesoreria")
        .await
        .expect("import_all should return per-dataset results");
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.result.is_none() && r.error.is_some()));

    // 先前导入的数据保持不变
    let repo = BudgetLineRepositoryImpl::new(shared_connection(&db_path).unwrap());
    for dataset in [DatasetKind::Programmed, DatasetKind::Committed, DatasetKind::Paid] {
        assert_eq!(repo.count_lines(dataset, YEAR).await.unwrap(), 17);
    }
}

#[tokio::test]
async fn test_concurrent_imports_of_same_key_do_not_interleave() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let programmed = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let smaller = write_csv_workbook(&paid_sheet()).expect("Failed to write csv");
    let api = ImportApi::open(&db_path).expect("Failed to open ImportApi");
    let (path_a, path_b) = (path_str(&programmed), path_str(&smaller));

    let (a, b) = tokio::join!(
        api.import_file(&path_a, DatasetKind::Paid, YEAR, "usuario-a", None),
        api.import_file(&path_b, DatasetKind::Paid, YEAR, "usuario-b", None),
    );
    a.expect("Import A should succeed");
    b.expect("Import B should succeed");

    // 最终状态必须完整等于其中一次导入
    let repo = BudgetLineRepositoryImpl::new(shared_connection(&db_path).unwrap());
    let lines = repo.list_lines(DatasetKind::Paid, YEAR).await.unwrap();
    assert!(lines.len() == 17 || lines.len() == 4, "got {}", lines.len());
    let actor = lines[0].imported_by.clone();
    assert!(lines.iter().all(|l| l.imported_by == actor));
    let expected = if actor.as_deref() == Some("usuario-a") { 17 } else { 4 };
    assert_eq!(lines.len(), expected);
}

#[tokio::test]
async fn test_clear_dataset_removes_only_that_key() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let workbook = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let api = ImportApi::open(&db_path).expect("Failed to open ImportApi");
    let path = path_str(&workbook);

    api.import_file(&path, DatasetKind::Programmed, YEAR, "tesoreria", None)
        .await
        .unwrap();
    api.import_file(&path, DatasetKind::Committed, YEAR, "tesoreria", None)
        .await
        .unwrap();

    let deleted = api
        .clear_dataset(DatasetKind::Programmed, YEAR, "tesoreria")
        .await
        .expect("Clear should succeed");
    assert_eq!(deleted, 17);

    let repo = BudgetLineRepositoryImpl::new(shared_connection(&db_path).unwrap());
    assert_eq!(repo.count_lines(DatasetKind::Programmed, YEAR).await.unwrap(), 0);
    assert_eq!(repo.count_lines(DatasetKind::Committed, YEAR).await.unwrap(), 17);

    // 再次清除 → 0 条
    let deleted = api
        .clear_dataset(DatasetKind::Programmed, YEAR, "tesoreria")
        .await
        .unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn test_summary_and_tracking_reports() {
    logging::init_test();

    let (_db_file, db_path) = create_test_db().expect("Failed to create test db");
    let programmed = write_csv_workbook(&programmed_sheet()).expect("Failed to write csv");
    let paid = write_csv_workbook(&paid_sheet()).expect("Failed to write csv");
    let api = ImportApi::open(&db_path).expect("Failed to open ImportApi");

    api.import_file(&path_str(&programmed), DatasetKind::Programmed, YEAR, "tesoreria", None)
        .await
        .unwrap();
    api.import_file(&path_str(&paid), DatasetKind::Paid, YEAR, "tesoreria", None)
        .await
        .unwrap();

    let report_api = ReportApi::new(shared_connection(&db_path).unwrap());

    // 1. 计划汇总: 收入剔除期初余额, 支出剔除保留/应付
    let summary = report_api
        .dataset_summary(DatasetKind::Programmed, YEAR)
        .await
        .expect("Summary should succeed");
    assert_eq!(summary.detail_rows, 7);
    assert_eq!(summary.income_total, dec("1200"));
    assert_eq!(summary.expense_total, dec("500"));
    assert_eq!(summary.balance(), dec("700"));
    assert_eq!(summary.monthly_income[0], dec("500"));
    assert_eq!(summary.monthly_expense[0], dec("300"));
    let reserves = summary
        .by_category
        .iter()
        .find(|c| c.category == Category::Reserves)
        .expect("Reserves listed for reconciliation");
    assert_eq!(reserves.total, dec("80"));

    // 2. 支出跟踪: 计划 vs 支付
    let report = report_api
        .tracking(DatasetKind::Programmed, DatasetKind::Paid, FlowType::Expense, YEAR)
        .await
        .expect("Tracking should succeed");
    let categories: Vec<Category> = report.categories.iter().map(|c| c.category).collect();
    assert_eq!(
        categories,
        vec![
            Category::Operating,
            Category::Investment,
            Category::DebtService,
            Category::Reserves,
            Category::Payables,
        ]
    );
    assert_eq!(report.planned_total, dec("600"));
    assert_eq!(report.executed_total, dec("175"));
    assert_eq!(report.pct_total, dec("29.2"));

    let operating = &report.categories[0];
    assert_eq!(operating.pct_total, dec("33.3"));
    assert_eq!(operating.months[0].planned, dec("100"));
    assert_eq!(operating.months[0].executed, dec("100"));
    assert_eq!(operating.months[0].pct, dec("100.0"));

    let investment = &report.categories[1];
    assert_eq!(investment.pct_total, dec("50.0"));
    assert_eq!(investment.items.len(), 1);
    // 计划为零的月份执行率记 0
    assert_eq!(investment.items[0].months[1].executed, dec("75"));
    assert_eq!(investment.items[0].months[1].pct, Decimal::ZERO);

    // 3. 收入跟踪
    let report = report_api
        .tracking(DatasetKind::Programmed, DatasetKind::Paid, FlowType::Income, YEAR)
        .await
        .expect("Tracking should succeed");
    let current = report
        .categories
        .iter()
        .find(|c| c.category == Category::CurrentIncome)
        .expect("CurrentIncome tracked");
    assert_eq!(current.planned_total, dec("1000"));
    assert_eq!(current.executed_total, dec("400"));
    assert_eq!(current.pct_total, dec("40.0"));

    // 4. 无数据的财年
    let empty = report_api
        .dataset_summary(DatasetKind::Programmed, YEAR + 1)
        .await
        .unwrap();
    assert_eq!(empty.detail_rows, 0);
    assert_eq!(empty.income_total, Decimal::ZERO);
}
