// ==========================================
// PAC 现金流计划导入系统 - 导入批次
// ==========================================
// 用途: 记录每次导入的元信息（数据集/时间/操作人/记录数）
// 对齐: import_batch 表
// ==========================================

use crate::domain::budget_line::BudgetLine;
use crate::domain::types::DatasetKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ImportBatch - 导入批次日志
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,             // 批次 ID（UUID）
    pub dataset: DatasetKind,         // 数据集类型
    pub fiscal_year: i32,             // 财年
    pub file_name: Option<String>,    // 源文件名
    pub sheet_name: Option<String>,   // 实际读取的工作表
    pub record_count: i32,            // 写入记录数
    pub imported_at: DateTime<Utc>,   // 导入时间
    pub imported_by: Option<String>,  // 导入人
    pub elapsed_ms: Option<i64>,      // 导入耗时（毫秒）
    pub note: Option<String>,         // 备注
}

// ==========================================
// ScanStats - 扫描统计
// ==========================================
// 行级异常不上报,只体现在计数中
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub rows_scanned: usize,          // 从数据起始行开始扫描的行数
    pub emitted: usize,               // 生成记录数
    pub skipped_blank: usize,         // 编码与名称均为空
    pub skipped_footer: usize,        // 签名/页脚行
    pub skipped_no_content: usize,    // 无编码且无金额
    pub skipped_section_title: usize, // 裸 "GASTOS" 分节标题
}

impl ScanStats {
    pub fn skipped_total(&self) -> usize {
        self.skipped_blank
            + self.skipped_footer
            + self.skipped_no_content
            + self.skipped_section_title
    }
}

// ==========================================
// ScanOutcome - 纯扫描结果（未落库）
// ==========================================
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub lines: Vec<BudgetLine>,
    pub stats: ScanStats,
}

// ==========================================
// ImportOutcome - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub batch: ImportBatch,
    pub stats: ScanStats,
    pub elapsed_time: std::time::Duration,
}

impl ImportOutcome {
    /// 写入记录数
    pub fn record_count(&self) -> usize {
        self.stats.emitted
    }
}
