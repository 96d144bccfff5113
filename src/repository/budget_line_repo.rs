// ==========================================
// PAC 现金流计划导入系统 - 预算行 Repository Trait
// ==========================================
// 职责: 定义预算行数据访问接口（不包含业务逻辑）
// 红线: 同一 (数据集, 财年) 的记录只能整体替换
// ==========================================

use crate::domain::budget_line::BudgetLine;
use crate::domain::types::DatasetKind;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// BudgetLineRepository Trait
// ==========================================
// 实现者: BudgetLineRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait BudgetLineRepository: Send + Sync {
    /// 整体替换 (dataset, fiscal_year) 的全部记录
    ///
    /// # 返回
    /// - Ok(usize): 写入记录数
    /// - Err: 数据库错误（整个事务回滚,原有记录保持不变）
    async fn replace_dataset(
        &self,
        dataset: DatasetKind,
        fiscal_year: i32,
        lines: Vec<BudgetLine>,
    ) -> RepositoryResult<usize>;

    /// 按源行号顺序列出记录
    async fn list_lines(
        &self,
        dataset: DatasetKind,
        fiscal_year: i32,
    ) -> RepositoryResult<Vec<BudgetLine>>;

    /// 统计记录数
    async fn count_lines(&self, dataset: DatasetKind, fiscal_year: i32) -> RepositoryResult<usize>;

    /// 删除 (dataset, fiscal_year) 的全部记录
    async fn delete_dataset(
        &self,
        dataset: DatasetKind,
        fiscal_year: i32,
    ) -> RepositoryResult<usize>;
}
