// ==========================================
// PAC 现金流计划导入系统 - 领域类型定义
// ==========================================
// 依据: PAC Excel 格式 - 收入/支出分节结构
// 红线: 流向与类别为闭合枚举,不接受自由字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 资金流向 (Flow Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowType {
    Income,  // 收入 (INGRESO)
    Expense, // 支出 (GASTO)
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl FlowType {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INGRESO" | "INCOME" => Some(FlowType::Income),
            "GASTO" | "EXPENSE" => Some(FlowType::Expense),
            _ => None,
        }
    }

    /// 转换为数据库字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            FlowType::Income => "INGRESO",
            FlowType::Expense => "GASTO",
        }
    }
}

// ==========================================
// 财务类别 (Category)
// ==========================================
// 8 个闭合类别; 总计/余额行无类别 (Option::None)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    InitialBalance,  // 期初余额 (SALDO_INICIAL)
    CurrentIncome,   // 经常性收入 (INGRESO_CORRIENTE)
    CapitalIncome,   // 资本性收入 (INGRESO_CAPITAL)
    Operating,       // 运营支出 (FUNCIONAMIENTO)
    Investment,      // 投资支出 (INVERSION)
    DebtService,     // 偿债 (DEUDA)
    Reserves,        // 预算保留 (RESERVAS)
    Payables,        // 应付账款 (CUENTAS_POR_PAGAR)
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::InitialBalance,
        Category::CurrentIncome,
        Category::CapitalIncome,
        Category::Operating,
        Category::Investment,
        Category::DebtService,
        Category::Reserves,
        Category::Payables,
    ];

    /// 从数据库字符串解析（空字符串 → None）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SALDO_INICIAL" => Some(Category::InitialBalance),
            "INGRESO_CORRIENTE" => Some(Category::CurrentIncome),
            "INGRESO_CAPITAL" => Some(Category::CapitalIncome),
            "FUNCIONAMIENTO" => Some(Category::Operating),
            "INVERSION" => Some(Category::Investment),
            "DEUDA" => Some(Category::DebtService),
            "RESERVAS" => Some(Category::Reserves),
            "CUENTAS_POR_PAGAR" => Some(Category::Payables),
            _ => None,
        }
    }

    /// 转换为数据库字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Category::InitialBalance => "SALDO_INICIAL",
            Category::CurrentIncome => "INGRESO_CORRIENTE",
            Category::CapitalIncome => "INGRESO_CAPITAL",
            Category::Operating => "FUNCIONAMIENTO",
            Category::Investment => "INVERSION",
            Category::DebtService => "DEUDA",
            Category::Reserves => "RESERVAS",
            Category::Payables => "CUENTAS_POR_PAGAR",
        }
    }

    /// 报表显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::InitialBalance => "Saldo Inicial",
            Category::CurrentIncome => "Ingresos Corrientes",
            Category::CapitalIncome => "Ingresos de Capital",
            Category::Operating => "Funcionamiento",
            Category::Investment => "Inversion",
            Category::DebtService => "Servicio a la Deuda",
            Category::Reserves => "Reservas Presupuestales",
            Category::Payables => "Cuentas por Pagar",
        }
    }
}

// ==========================================
// 扫描分节状态 (Section State)
// ==========================================
// 顺序: Income < Expense < Reserves < Payables
// 单次扫描内只前进不后退
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionState {
    #[default]
    Income,
    Expense,
    Reserves,
    Payables,
}

impl fmt::Display for SectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionState::Income => write!(f, "INCOME"),
            SectionState::Expense => write!(f, "EXPENSE"),
            SectionState::Reserves => write!(f, "RESERVES"),
            SectionState::Payables => write!(f, "PAYABLES"),
        }
    }
}

impl SectionState {
    /// 前进到目标分节; 目标在当前分节之前时保持不变
    pub fn advance_to(self, target: SectionState) -> SectionState {
        self.max(target)
    }
}

// ==========================================
// 数据集类型 (Dataset Kind)
// ==========================================
// 四类 PAC 数据集共享 BudgetLine 结构
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetKind {
    InitialAppropriation, // AIM 初始拨款
    Programmed,           // PAC 计划
    Committed,            // PAC 执行 - 承诺
    Paid,                 // PAC 执行 - 支付
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::InitialAppropriation,
        DatasetKind::Programmed,
        DatasetKind::Committed,
        DatasetKind::Paid,
    ];

    /// 从数据库字符串解析（同时接受 CLI 简写）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "AIM_INICIAL" | "AIM" => Some(DatasetKind::InitialAppropriation),
            "PROGRAMADO" => Some(DatasetKind::Programmed),
            "EJECUTADO_COMPROMISO" | "COMPROMISOS" => Some(DatasetKind::Committed),
            "EJECUTADO_PAGO" | "PAGOS" => Some(DatasetKind::Paid),
            _ => None,
        }
    }

    /// 转换为数据库字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DatasetKind::InitialAppropriation => "AIM_INICIAL",
            DatasetKind::Programmed => "PROGRAMADO",
            DatasetKind::Committed => "EJECUTADO_COMPROMISO",
            DatasetKind::Paid => "EJECUTADO_PAGO",
        }
    }

    /// 默认工作表名称提示（None = 使用第一个工作表）
    pub fn default_sheet_hint(&self) -> Option<&'static str> {
        match self {
            DatasetKind::InitialAppropriation => None,
            DatasetKind::Programmed => Some("PROG PAC"),
            DatasetKind::Committed => Some("EJECUTADO COMPROMISO"),
            DatasetKind::Paid => Some("EJECUTADO PAGO"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_state_never_regresses() {
        assert_eq!(
            SectionState::Reserves.advance_to(SectionState::Expense),
            SectionState::Reserves
        );
        assert_eq!(
            SectionState::Income.advance_to(SectionState::Payables),
            SectionState::Payables
        );
    }

    #[test]
    fn test_category_db_round_trip() {
        for cat in Category::ALL {
            assert_eq!(Category::from_db_str(cat.to_db_str()), Some(cat));
        }
        assert_eq!(Category::from_db_str(""), None);
    }

    #[test]
    fn test_dataset_kind_aliases() {
        assert_eq!(DatasetKind::from_db_str("pagos"), Some(DatasetKind::Paid));
        assert_eq!(
            DatasetKind::from_db_str("ejecutado-compromiso"),
            Some(DatasetKind::Committed)
        );
        assert_eq!(DatasetKind::from_db_str("unknown"), None);
    }
}
