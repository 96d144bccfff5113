// ==========================================
// PAC 现金流计划导入系统 - 导入层
// ==========================================
// 职责: 读取 PAC 工作簿,逐行分类,生成预算行
// 支持: Excel (.xlsx/.xlsm/.xls/.ods), CSV
// ==========================================

// 模块声明
pub mod budget_importer_impl;
pub mod budget_importer_trait;
pub mod error;
pub mod file_parser;
pub mod leaf_classifier;
pub mod numeric_normalizer;
pub mod row_scanner;
pub mod section_classifier;
pub mod sheet;

// 重导出核心类型
pub use budget_importer_impl::{BudgetImporterImpl, WORKBOOK_DATASETS};
pub use error::{ImportError, ImportResult};
pub use file_parser::{
    select_sheet_name, CsvWorkbookReader, ExcelWorkbookReader, UniversalWorkbookReader,
};
pub use leaf_classifier::{is_leaf_code, refine_subtotal};
pub use numeric_normalizer::normalize_amount;
pub use row_scanner::{scan_sheet, ScanContext, DEFAULT_FOOTER_KEYWORDS};
pub use section_classifier::{RowVerdict, SectionStateMachine};
pub use sheet::{CellValue, SheetGrid};

// 重导出 Trait 接口
pub use budget_importer_trait::{BudgetImporter, RowClassifier, WorkbookReader};
