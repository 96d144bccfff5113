// ==========================================
// PAC 现金流计划导入系统 - 导入 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// ==========================================

use crate::domain::import_batch::ImportOutcome;
use crate::domain::types::{DatasetKind, SectionState};
use crate::importer::error::ImportResult;
use crate::importer::section_classifier::RowVerdict;
use crate::importer::sheet::SheetGrid;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// BudgetImporter Trait
// ==========================================
// 用途: PAC 导入主接口
// 实现者: BudgetImporterImpl
#[async_trait]
pub trait BudgetImporter: Send + Sync {
    /// 从工作簿文件导入一个数据集
    ///
    /// # 参数
    /// - file_path: 工作簿路径（.xlsx/.xls/.ods/.csv）
    /// - fiscal_year: 财年
    /// - dataset: 目标数据集
    /// - actor: 操作人
    /// - sheet_hint: 工作表名称提示（None → 使用数据集的配置值）
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 批次信息 + 扫描统计
    /// - Err: 工作簿不可读（此时未修改任何已存数据）或落库失败（事务回滚）
    ///
    /// # 导入流程
    /// 1. 读取工作表（失败即返回,不触碰数据）
    /// 2. 逐行扫描分类（纯计算）
    /// 3. 整体替换 (dataset, fiscal_year) 的记录（单事务）
    /// 4. 写入导入批次日志
    async fn import_file(
        &self,
        file_path: &Path,
        fiscal_year: i32,
        dataset: DatasetKind,
        actor: &str,
        sheet_hint: Option<&str>,
    ) -> ImportResult<ImportOutcome>;

    /// 从内存工作表导入
    async fn import_grid(
        &self,
        grid: &SheetGrid,
        fiscal_year: i32,
        dataset: DatasetKind,
        actor: &str,
    ) -> ImportResult<ImportOutcome>;

    /// 从同一工作簿导入 计划 / 承诺 / 支付 三个数据集（并发执行）
    ///
    /// # 说明
    /// - 每个数据集按配置的工作表提示选表
    /// - 单个数据集失败不影响其他数据集
    async fn import_workbook_all(
        &self,
        file_path: &Path,
        fiscal_year: i32,
        actor: &str,
    ) -> Vec<(DatasetKind, Result<ImportOutcome, String>)>;
}

// ==========================================
// WorkbookReader Trait
// ==========================================
// 用途: 工作簿读取接口
// 实现者: ExcelWorkbookReader, CsvWorkbookReader, UniversalWorkbookReader
pub trait WorkbookReader: Send + Sync {
    /// 读取目标工作表
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - sheet_hint: 工作表名称片段（大小写不敏感）; 未命中时回退到第一个工作表
    ///
    /// # 返回
    /// - Ok(SheetGrid): 工作表网格
    /// - Err: 文件不存在、格式不支持、无法解析
    fn read_sheet(&self, file_path: &Path, sheet_hint: Option<&str>) -> ImportResult<SheetGrid>;
}

// ==========================================
// RowClassifier Trait
// ==========================================
// 用途: 单行分类接口（状态显式传入、显式返回）
// 实现者: SectionStateMachine
pub trait RowClassifier: Send + Sync {
    fn classify_row(&self, code: &str, label: &str, state: SectionState) -> RowVerdict;
}
