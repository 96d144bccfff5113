// ==========================================
// PAC 现金流计划导入系统 - 分节状态机
// ==========================================
// 职责: (编码, 名称, 当前分节) → (流向, 类别, 是否汇总, 下一分节)
// 红线: 规则按固定优先级逐层匹配,首个命中即返回
//   1. 分节切换（只前进）
//   2. 总计/余额行（与分节无关）
//   3. RESERVAS / CUENTAS POR PAGAR 分节
//   4. INGRESOS 分节
//   5. GASTOS 分节（兜底）: 先判 2.3 投资再判 2.1 运营
// 注意: 汇总判定随后还要经过 leaf_classifier::refine_subtotal 修正
// ==========================================

use crate::domain::types::{Category, FlowType, SectionState};
use crate::importer::budget_importer_trait::RowClassifier;
use crate::importer::leaf_classifier::code_segments;
use serde::{Deserialize, Serialize};

// ==========================================
// RowVerdict - 单行分类结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowVerdict {
    pub flow_type: FlowType,
    pub category: Option<Category>,
    pub is_subtotal: bool,
    pub next_state: SectionState,
}

impl RowVerdict {
    fn new(
        flow_type: FlowType,
        category: Option<Category>,
        is_subtotal: bool,
        next_state: SectionState,
    ) -> Self {
        Self {
            flow_type,
            category,
            is_subtotal,
            next_state,
        }
    }
}

/// 分类输入（已 trim 的编码 + 大写名称）
struct RowKey<'a> {
    code: &'a str,
    label: String,
}

impl<'a> RowKey<'a> {
    fn new(code: &'a str, label: &str) -> Self {
        Self {
            code: code.trim(),
            label: label.trim().to_uppercase(),
        }
    }

    fn label_has(&self, needle: &str) -> bool {
        self.label.contains(needle)
    }

    fn label_has_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.label.contains(n))
    }

    fn code_is_empty(&self) -> bool {
        self.code.is_empty()
    }

    fn last_segment(&self) -> &str {
        code_segments(self.code)
            .last()
            .map(|s| s.trim())
            .unwrap_or("")
    }

    /// 编码中出现层级标记段（"- 2.3" 形式或末段恰为标记）
    fn has_marker_segment(&self, marker: &str) -> bool {
        self.code.contains(&format!("- {}", marker))
            || self.code.ends_with(marker)
            || self.last_segment() == marker
    }
}

// ==========================================
// SectionStateMachine
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionStateMachine;

impl SectionStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// 对单行执行分类级联
    pub fn classify(&self, code: &str, label: &str, state: SectionState) -> RowVerdict {
        let key = RowKey::new(code, label);

        if let Some(verdict) = Self::section_transition(&key, state) {
            return verdict;
        }
        if let Some(verdict) = Self::grand_total(&key, state) {
            return verdict;
        }
        match state {
            SectionState::Reserves => Self::carry_over_row(&key, Category::Reserves, state),
            SectionState::Payables => Self::carry_over_row(&key, Category::Payables, state),
            SectionState::Income => Self::income_row(&key, state),
            SectionState::Expense => Self::expense_row(&key),
        }
    }

    // ===== 1. 分节切换 =====
    fn section_transition(key: &RowKey, state: SectionState) -> Option<RowVerdict> {
        if key.label == "GASTOS" || key.label == "GASTO" {
            return Some(RowVerdict::new(
                FlowType::Expense,
                None,
                true,
                state.advance_to(SectionState::Expense),
            ));
        }

        if key.label_has_any(&["RESERVAS PRESUPUESTAL", "RESERVA PRESUPUESTAL"]) {
            return Some(RowVerdict::new(
                FlowType::Expense,
                Some(Category::Reserves),
                true,
                state.advance_to(SectionState::Reserves),
            ));
        }

        // 标题可能写在 C 列 "CUENTAS POR PAGAR",也可能是 B 列编码 "5"
        if key.label_has("CUENTAS POR PAGAR") || (key.code == "5" && key.label_has("CUENTAS")) {
            return Some(RowVerdict::new(
                FlowType::Expense,
                Some(Category::Payables),
                true,
                state.advance_to(SectionState::Payables),
            ));
        }

        None
    }

    // ===== 2. 总计与余额 =====
    fn grand_total(key: &RowKey, state: SectionState) -> Option<RowVerdict> {
        let is_total = key.code == "A"
            || key.code == "B"
            || key.label_has_any(&["TOTAL INGRESOS", "TOTAL GASTOS", "SALDO DISPONIBLE"]);
        if !is_total {
            return None;
        }

        let flow = if key.code == "A" || key.label_has("INGRESO") {
            FlowType::Income
        } else {
            FlowType::Expense
        };
        Some(RowVerdict::new(flow, None, true, state))
    }

    // ===== 3. 预算保留 / 应付账款 =====
    fn carry_over_row(key: &RowKey, category: Category, state: SectionState) -> RowVerdict {
        let is_header = key.code_is_empty() && key.label_has_any(&["FUNCIONAMIENTO", "INVERSION"]);
        RowVerdict::new(FlowType::Expense, Some(category), is_header, state)
    }

    // ===== 4. 收入分节 =====
    fn income_row(key: &RowKey, state: SectionState) -> RowVerdict {
        let verdict = |category, is_subtotal| {
            RowVerdict::new(FlowType::Income, Some(category), is_subtotal, state)
        };

        if key.code == "1" || key.label_has("SALDO INICIAL") {
            return verdict(Category::InitialBalance, true);
        }
        if key.label_has_any(&["CAJA", "BANCOS"])
            && (key.code_is_empty() || matches!(key.code, "1.1" | "1.2" | "1.3"))
        {
            return verdict(Category::InitialBalance, false);
        }

        if key.code == "2" || key.label_has_any(&["INGRESOS CORRIENTES", "TRIBUTARIO"]) {
            return verdict(Category::CurrentIncome, true);
        }

        if key.code == "3" || key.label_has_any(&["INGRESOS DE CAPITAL", "INGRESOS CAPITAL"]) {
            return verdict(Category::CapitalIncome, true);
        }

        // TODO: "1003" 是样本实体的编码前缀,其他实体的编码体系需单独验证
        let has_budget_code = !key.code_is_empty() && !key.code.chars().all(char::is_alphabetic);
        if key.code.contains("1003") || has_budget_code {
            let category = if key.label_has_any(&["CAPITAL", "SUPERAVIT", "RENDIMIENTO"]) {
                Category::CapitalIncome
            } else {
                Category::CurrentIncome
            };
            return verdict(category, false);
        }

        verdict(Category::CurrentIncome, false)
    }

    // ===== 5. 支出分节 =====
    fn expense_row(key: &RowKey) -> RowVerdict {
        let state = SectionState::Expense;
        let verdict = |category, is_subtotal| {
            RowVerdict::new(FlowType::Expense, Some(category), is_subtotal, state)
        };

        // 投资 2.3 必须先于运营 2.1: 投资层级编码常含 "2.1" 形子串
        if key.has_marker_segment("2.3") {
            let is_subtotal = key.last_segment() == "2.3" || key.label_has("INVERSION");
            return verdict(Category::Investment, is_subtotal);
        }
        if key.code.contains("2.3") {
            return verdict(Category::Investment, false);
        }

        if key.has_marker_segment("2.1") {
            let is_subtotal = key.last_segment() == "2.1" || key.label_has("FUNCIONAMIENTO");
            return verdict(Category::Operating, is_subtotal);
        }
        if key.code.contains("2.1") {
            return verdict(Category::Operating, false);
        }

        if key.code.contains("- 2.2") || key.last_segment() == "2.2" {
            return verdict(Category::DebtService, false);
        }
        if key.label_has("DEUDA") {
            return verdict(Category::DebtService, true);
        }
        if key.label_has_any(&["AMORTIZACION", "INTERESES Y OTROS"]) {
            return verdict(Category::DebtService, false);
        }

        // 投资部门标题（SECTOR MINAS / SECTOR EDUCACION ...）
        if key.label_has("SECTOR") {
            return verdict(Category::Investment, true);
        }

        if key.label_has("BPIN") || key.code.contains("BPIN") {
            return verdict(Category::Investment, false);
        }

        if key.code_is_empty() && key.label_has("FUNCIONAMIENTO") {
            return verdict(Category::Operating, true);
        }
        if key.code_is_empty() && key.label_has("INVERSION") {
            return verdict(Category::Investment, true);
        }

        verdict(Category::Operating, false)
    }
}

impl RowClassifier for SectionStateMachine {
    fn classify_row(&self, code: &str, label: &str, state: SectionState) -> RowVerdict {
        self.classify(code, label, state)
    }
}
