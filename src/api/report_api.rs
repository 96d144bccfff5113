// ==========================================
// PAC 现金流计划导入系统 - 报表API
// ==========================================
// 职责: 读取已存预算行,调用汇总/跟踪/资金来源/总览引擎;
//       维护资金来源登记
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{validate_fiscal_year, validate_source_name};
use crate::domain::funding_source::FundingSource;
use crate::domain::types::{DatasetKind, FlowType};
use crate::engine::{
    CategoryTracking, DatasetSummary, ExecutionOverview, FundingInputs, FundingSourceEngine,
    FundingSourceReport, OverviewEngine, OverviewInputs, SummaryEngine, TrackingEngine,
};
use crate::repository::{
    BudgetLineRepository, BudgetLineRepositoryImpl, FundingSourceRepository,
    FundingSourceRepositoryImpl,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;

/// 执行跟踪报表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingReport {
    pub fiscal_year: i32,
    pub planned_dataset: DatasetKind,
    pub executed_dataset: DatasetKind,
    pub flow_type: FlowType,
    pub planned_total: Decimal,
    pub executed_total: Decimal,
    pub pct_total: Decimal,
    pub categories: Vec<CategoryTracking>,
}

/// 报表API
pub struct ReportApi {
    line_repo: BudgetLineRepositoryImpl,
    source_repo: FundingSourceRepositoryImpl,
    summary_engine: SummaryEngine,
    tracking_engine: TrackingEngine,
    funding_engine: FundingSourceEngine,
    overview_engine: OverviewEngine,
}

impl ReportApi {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            line_repo: BudgetLineRepositoryImpl::new(conn.clone()),
            source_repo: FundingSourceRepositoryImpl::new(conn),
            summary_engine: SummaryEngine::new(),
            tracking_engine: TrackingEngine::new(),
            funding_engine: FundingSourceEngine::new(),
            overview_engine: OverviewEngine::new(),
        }
    }

    /// 数据集收支汇总
    pub async fn dataset_summary(
        &self,
        dataset: DatasetKind,
        fiscal_year: i32,
    ) -> ApiResult<DatasetSummary> {
        validate_fiscal_year(fiscal_year)?;
        let lines = self.line_repo.list_lines(dataset, fiscal_year).await?;
        Ok(self.summary_engine.summarize(dataset, fiscal_year, &lines))
    }

    /// 计划 vs 执行 跟踪
    ///
    /// # 示例组合
    /// - 收入: PROGRAMADO vs EJECUTADO_PAGO
    /// - 支出: PROGRAMADO vs EJECUTADO_PAGO, EJECUTADO_COMPROMISO vs EJECUTADO_PAGO
    pub async fn tracking(
        &self,
        planned_dataset: DatasetKind,
        executed_dataset: DatasetKind,
        flow_type: FlowType,
        fiscal_year: i32,
    ) -> ApiResult<TrackingReport> {
        validate_fiscal_year(fiscal_year)?;
        let planned = self.line_repo.list_lines(planned_dataset, fiscal_year).await?;
        let executed = self.line_repo.list_lines(executed_dataset, fiscal_year).await?;

        let categories = self.tracking_engine.compare(&planned, &executed, flow_type);
        let (planned_total, executed_total, pct_total) = self.tracking_engine.overall(&categories);

        Ok(TrackingReport {
            fiscal_year,
            planned_dataset,
            executed_dataset,
            flow_type,
            planned_total,
            executed_total,
            pct_total,
            categories,
        })
    }

    // ==========================================
    // 资金来源
    // ==========================================

    /// 登记或更新资金来源
    ///
    /// # 参数
    /// - source: 名称去空白后非空,已分配预算不得为负
    ///
    /// # 返回
    /// 落库后的资金来源（更新时保留首次登记时间）
    pub async fn register_funding_source(
        &self,
        mut source: FundingSource,
    ) -> ApiResult<FundingSource> {
        validate_fiscal_year(source.fiscal_year)?;
        source.name = validate_source_name(&source.name)?;
        if source.assigned_budget.is_sign_negative() && !source.assigned_budget.is_zero() {
            return Err(ApiError::InvalidInput(format!(
                "已分配预算不能为负: {}",
                source.assigned_budget
            )));
        }

        self.source_repo.upsert_source(&source).await?;
        info!(
            fiscal_year = source.fiscal_year,
            name = %source.name,
            assigned_budget = %source.assigned_budget,
            "资金来源已登记"
        );

        self.source_repo
            .find_source(source.fiscal_year, &source.name)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("资金来源 {}", source.name)))
    }

    /// 删除资金来源登记（不影响预算行）
    pub async fn remove_funding_source(&self, fiscal_year: i32, name: &str) -> ApiResult<()> {
        validate_fiscal_year(fiscal_year)?;
        let name = validate_source_name(name)?;
        if !self.source_repo.delete_source(fiscal_year, &name).await? {
            return Err(ApiError::NotFound(format!(
                "资金来源 {}（财年 {}）",
                name, fiscal_year
            )));
        }
        info!(fiscal_year, name = %name, "资金来源已删除");
        Ok(())
    }

    /// 资金来源执行报表: 计划收支、承诺、支付、收款对比已分配预算
    pub async fn funding_sources(&self, fiscal_year: i32) -> ApiResult<Vec<FundingSourceReport>> {
        validate_fiscal_year(fiscal_year)?;
        let sources = self.source_repo.list_sources(fiscal_year).await?;
        let programmed = self.line_repo.list_lines(DatasetKind::Programmed, fiscal_year).await?;
        let committed = self.line_repo.list_lines(DatasetKind::Committed, fiscal_year).await?;
        let paid = self.line_repo.list_lines(DatasetKind::Paid, fiscal_year).await?;

        Ok(self.funding_engine.report(
            &sources,
            &FundingInputs {
                programmed: &programmed,
                committed: &committed,
                paid: &paid,
            },
        ))
    }

    /// 跨数据集执行总览: 类别对比 + 逐月累计
    pub async fn overview(&self, fiscal_year: i32) -> ApiResult<ExecutionOverview> {
        validate_fiscal_year(fiscal_year)?;
        let initial = self
            .line_repo
            .list_lines(DatasetKind::InitialAppropriation, fiscal_year)
            .await?;
        let programmed = self.line_repo.list_lines(DatasetKind::Programmed, fiscal_year).await?;
        let committed = self.line_repo.list_lines(DatasetKind::Committed, fiscal_year).await?;
        let paid = self.line_repo.list_lines(DatasetKind::Paid, fiscal_year).await?;

        Ok(self.overview_engine.build(
            fiscal_year,
            &OverviewInputs {
                initial: &initial,
                programmed: &programmed,
                committed: &committed,
                paid: &paid,
            },
        ))
    }
}
