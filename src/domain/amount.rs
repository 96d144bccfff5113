// ==========================================
// PAC 现金流计划导入系统 - 金额运算
// ==========================================
// 红线: 单元格金额不设上限,任何加减乘除都不得 panic
// - 派生字段: 溢出 → None,由调用方降级
// - 汇总累加: 溢出 → 饱和到 Decimal::MAX / MIN 并告警
// ==========================================

use rust_decimal::Decimal;
use tracing::warn;

/// 逐项求和,溢出返回 None
pub fn checked_sum<I>(amounts: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}

/// 累加到汇总值（溢出时饱和）
pub fn accumulate(acc: &mut Decimal, amount: Decimal) {
    *acc = match acc.checked_add(amount) {
        Some(sum) => sum,
        None => {
            warn!(current = %acc, amount = %amount, "汇总金额溢出,按上限饱和");
            if amount.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        }
    };
}

/// 逐月累加
pub fn accumulate_months(acc: &mut [Decimal; 12], monthly: &[Decimal; 12]) {
    for (slot, amount) in acc.iter_mut().zip(monthly.iter()) {
        accumulate(slot, *amount);
    }
}

/// 百分比（一位小数）; 分母为零或运算溢出时记 0
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(1))
        .unwrap_or_else(|| {
            warn!(part = %part, whole = %whole, "百分比计算溢出,记为 0");
            Decimal::ZERO
        })
}
