// ==========================================
// PAC 现金流计划导入系统 - API 入参校验
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::{DatasetKind, FlowType};
use rust_decimal::Decimal;
use std::str::FromStr;

/// 允许的财年范围
pub const MIN_FISCAL_YEAR: i32 = 2000;
pub const MAX_FISCAL_YEAR: i32 = 2100;

pub fn validate_fiscal_year(fiscal_year: i32) -> ApiResult<()> {
    if !(MIN_FISCAL_YEAR..=MAX_FISCAL_YEAR).contains(&fiscal_year) {
        return Err(ApiError::InvalidInput(format!(
            "财年 {} 超出范围 {}..={}",
            fiscal_year, MIN_FISCAL_YEAR, MAX_FISCAL_YEAR
        )));
    }
    Ok(())
}

pub fn validate_actor(actor: &str) -> ApiResult<()> {
    if actor.trim().is_empty() {
        return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
    }
    Ok(())
}

/// 解析数据集代码（接受别名,大小写不敏感）
pub fn parse_dataset(raw: &str) -> ApiResult<DatasetKind> {
    DatasetKind::from_db_str(raw).ok_or_else(|| {
        ApiError::InvalidInput(format!(
            "未知数据集: {}（可选: AIM_INICIAL / PROGRAMADO / EJECUTADO_COMPROMISO / EJECUTADO_PAGO）",
            raw
        ))
    })
}

/// 解析资金流向（INGRESO / GASTO）
pub fn parse_flow(raw: &str) -> ApiResult<FlowType> {
    FlowType::from_db_str(raw)
        .ok_or_else(|| ApiError::InvalidInput(format!("未知流向: {}（可选: INGRESO / GASTO）", raw)))
}

/// 资金来源名称（去空白后非空）
pub fn validate_source_name(name: &str) -> ApiResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("资金来源名称不能为空".to_string()));
    }
    Ok(name.to_string())
}

/// 解析已分配预算（非负金额,允许 '$' ',' 分隔）
pub fn parse_budget(raw: &str) -> ApiResult<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    let amount = Decimal::from_str(&cleaned)
        .map_err(|_| ApiError::InvalidInput(format!("无效金额: {}", raw)))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ApiError::InvalidInput(format!("已分配预算不能为负: {}", raw)));
    }
    Ok(amount)
}
