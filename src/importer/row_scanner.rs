// ==========================================
// PAC 现金流计划导入系统 - 逐行扫描
// ==========================================
// 布局: A 列 RP/CxP 编号（可选）/ B 编码 / C 名称
//       D-I 拨款调整 / J-U 一至十二月 / V 合计
// 数据从第 5 行开始,第 1-4 行为标题区
// ==========================================
// 职责: 纯计算,不落库; 分节状态逐行显式传递
// ==========================================

use crate::domain::budget_line::{AppropriationAmounts, BudgetLine};
use crate::domain::import_batch::{ScanOutcome, ScanStats};
use crate::domain::types::{DatasetKind, SectionState};
use crate::importer::budget_importer_trait::RowClassifier;
use crate::importer::leaf_classifier::{code_segments, refine_subtotal};
use crate::importer::numeric_normalizer::normalize_amount;
use crate::importer::sheet::SheetGrid;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::trace;

/// 数据起始行（1 起始）
pub const DATA_START_ROW: u32 = 5;

/// 列位置（1 起始）
pub mod columns {
    pub const REFERENCE: u32 = 1; // A
    pub const CODE: u32 = 2; // B
    pub const LABEL: u32 = 3; // C
    pub const APPROPRIATION_START: u32 = 4; // D-I
    pub const MONTH_START: u32 = 10; // J-U
    pub const TOTAL: u32 = 22; // V
}

/// 默认页脚/签名关键字
pub const DEFAULT_FOOTER_KEYWORDS: [&str; 4] = ["SUBGERENTE", "GERENTE", "FIRMA", "ELABOR"];

/// 扫描参数
#[derive(Debug, Clone)]
pub struct ScanContext<'a> {
    pub fiscal_year: i32,
    pub dataset: DatasetKind,
    pub actor: Option<&'a str>,
    pub footer_keywords: &'a [String],
}

/// 资金来源: 编码至少 3 段时取末段的第一个空白分隔词
pub fn extract_funding_source(code: &str) -> String {
    let segments = code_segments(code);
    if segments.len() < 3 {
        return String::new();
    }
    segments
        .last()
        .and_then(|last| last.split_whitespace().next())
        .unwrap_or("")
        .to_string()
}

/// 把 A 列 RP/CxP 编号并入编码（不参与分类）
pub fn fold_reference(code: &str, reference: &str) -> String {
    let reference = reference.trim();
    if reference.is_empty() {
        return code.to_string();
    }
    if code.is_empty() {
        format!("RP:{}", reference)
    } else {
        format!("{} (RP:{})", code, reference)
    }
}

fn is_footer(label_upper: &str, footer_keywords: &[String]) -> bool {
    footer_keywords
        .iter()
        .any(|k| !k.is_empty() && label_upper.contains(&k.to_uppercase()))
}

/// 读取单行金额: (拨款调整 6 项, 月度 12 项, 显式合计)
fn read_amounts(grid: &SheetGrid, row: u32) -> (AppropriationAmounts, [Decimal; 12], Decimal) {
    let amount = |col: u32| normalize_amount(grid.cell(row, col));

    let start = columns::APPROPRIATION_START;
    let appropriation = AppropriationAmounts {
        initial: amount(start),
        additions: amount(start + 1),
        reductions: amount(start + 2),
        credits: amount(start + 3),
        counter_credits: amount(start + 4),
        definitive: amount(start + 5),
    };

    let mut monthly = [Decimal::ZERO; 12];
    for (i, slot) in monthly.iter_mut().enumerate() {
        *slot = amount(columns::MONTH_START + i as u32);
    }

    (appropriation, monthly, amount(columns::TOTAL))
}

/// 扫描整张工作表
///
/// 每次调用都从 INCOME 分节重新开始
pub fn scan_sheet(
    grid: &SheetGrid,
    classifier: &dyn RowClassifier,
    ctx: &ScanContext<'_>,
) -> ScanOutcome {
    let mut stats = ScanStats::default();
    let mut lines = Vec::new();
    let mut state = SectionState::Income;
    let imported_at = Utc::now();

    for row in DATA_START_ROW..=grid.max_row() {
        stats.rows_scanned += 1;

        let code = grid.cell(row, columns::CODE).as_text();
        let label = grid.cell(row, columns::LABEL).as_text();

        if code.is_empty() && label.is_empty() {
            stats.skipped_blank += 1;
            continue;
        }

        let label_upper = label.to_uppercase();
        if is_footer(&label_upper, ctx.footer_keywords) {
            trace!(row, label = %label, "跳过页脚/签名行");
            stats.skipped_footer += 1;
            continue;
        }

        let verdict = classifier.classify_row(&code, &label, state);
        state = verdict.next_state;
        let is_subtotal = refine_subtotal(&code, verdict.is_subtotal);

        let (appropriation, monthly, explicit_total) = read_amounts(grid, row);
        let has_amounts = !explicit_total.is_zero()
            || monthly.iter().any(|m| !m.is_zero())
            || appropriation.as_array().iter().any(|a| !a.is_zero());

        if !has_amounts && code.is_empty() {
            trace!(row, label = %label, "跳过无编码无金额行");
            stats.skipped_no_content += 1;
            continue;
        }

        // 分节标题只驱动状态切换,不生成记录
        if label_upper == "GASTOS" && code.is_empty() {
            stats.skipped_section_title += 1;
            continue;
        }

        let reference = grid.cell(row, columns::REFERENCE).as_text();
        let full_code = fold_reference(&code, &reference);
        let funding_source = extract_funding_source(&full_code);

        let line = BudgetLine {
            dataset: ctx.dataset,
            fiscal_year: ctx.fiscal_year,
            flow_type: verdict.flow_type,
            category: verdict.category,
            code: full_code,
            label,
            funding_source,
            appropriation,
            monthly,
            total: explicit_total,
            is_subtotal,
            source_row: row,
            imported_by: ctx.actor.map(str::to_string),
            imported_at,
        }
        .finalize();

        lines.push(line);
        stats.emitted += 1;
    }

    ScanOutcome { lines, stats }
}
