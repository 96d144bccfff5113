// ==========================================
// PAC 现金流计划导入系统 - 金额规整器
// ==========================================
// 职责: 单元格 → 精确 Decimal 金额
// 规则: 空 / 空白 / "-" → 0; 去掉 ',' '$' ' ' 后解析; 解析失败 → 0
// 红线: 永不报错,永不使用二进制浮点累加
// ==========================================

use crate::importer::sheet::CellValue;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 文本金额 → Decimal（失败返回 None）
fn parse_text_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// 浮点单元格按最短十进制表示转换,避免引入二进制误差
fn float_to_decimal(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    Decimal::from_str(&f.to_string()).ok()
}

/// 规整单元格金额
///
/// # 示例
/// - "$ 1,234.50" → 1234.50
/// - "-" → 0
/// - 空单元格 → 0
pub fn normalize_amount(value: &CellValue) -> Decimal {
    let parsed = match value {
        CellValue::Empty => Some(Decimal::ZERO),
        CellValue::Int(i) => Some(Decimal::from(*i)),
        CellValue::Float(f) => float_to_decimal(*f),
        CellValue::Text(s) => parse_text_amount(s),
        CellValue::Bool(_) => None,
    };
    parsed.unwrap_or(Decimal::ZERO)
}

/// 可选单元格（缺失列）规整
pub fn normalize_optional(value: Option<&CellValue>) -> Decimal {
    value.map(normalize_amount).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_currency_string_with_separators() {
        assert_eq!(
            normalize_amount(&text("$ 1,234.50")),
            Decimal::from_str("1234.50").unwrap()
        );
    }

    #[test]
    fn test_dash_blank_and_absent_are_zero() {
        assert_eq!(normalize_amount(&text("-")), Decimal::ZERO);
        assert_eq!(normalize_amount(&text("   ")), Decimal::ZERO);
        assert_eq!(normalize_amount(&CellValue::Empty), Decimal::ZERO);
        assert_eq!(normalize_optional(None), Decimal::ZERO);
    }

    #[test]
    fn test_garbage_degrades_to_zero() {
        assert_eq!(normalize_amount(&text("N/A")), Decimal::ZERO);
        assert_eq!(normalize_amount(&text("12abc")), Decimal::ZERO);
        assert_eq!(normalize_amount(&CellValue::Bool(true)), Decimal::ZERO);
        assert_eq!(normalize_amount(&CellValue::Float(f64::NAN)), Decimal::ZERO);
    }

    #[test]
    fn test_float_cells_are_exact() {
        let sum: Decimal = (0..12)
            .map(|_| normalize_amount(&CellValue::Float(0.1)))
            .sum();
        assert_eq!(sum, Decimal::from_str("1.2").unwrap());
        assert_eq!(normalize_amount(&CellValue::Int(-250)), Decimal::from(-250));
    }

    #[test]
    fn test_negative_text_amount() {
        assert_eq!(
            normalize_amount(&text("-1,000")),
            Decimal::from_str("-1000").unwrap()
        );
    }
}
