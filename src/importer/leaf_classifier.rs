// ==========================================
// PAC 现金流计划导入系统 - 叶子/汇总判定
// ==========================================
// 规则: 按 " - " 切分编码,段数 >= 3 为明细叶子行
//   "1003 - 2.1.1.01.01.001.01 - 20" → 3 段 → 叶子
//   "1003 - 2.3.21"                  → 2 段 → 汇总
//   "1"                              → 1 段 → 汇总
// ==========================================

/// 编码段分隔符
pub const SEGMENT_DELIMITER: &str = " - ";

/// 保留的总计编码（不按段数强制为汇总行）
pub const TOTALIZER_CODES: [&str; 7] = ["A", "B", "1", "2", "3", "4", "5"];

/// 切分编码段
pub fn code_segments(code: &str) -> Vec<&str> {
    code.trim().split(SEGMENT_DELIMITER).collect()
}

/// 是否为明细叶子行编码（实体编码 - 层级编码 - 资金来源编码）
pub fn is_leaf_code(code: &str) -> bool {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return false;
    }
    code_segments(trimmed).len() >= 3
}

/// 编码形态对汇总判定的修正
///
/// - 空编码: 保持分类结果
/// - 叶子编码: 强制为明细
/// - 非保留总计编码: 强制为汇总
pub fn refine_subtotal(code: &str, classified_subtotal: bool) -> bool {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return classified_subtotal;
    }
    if is_leaf_code(trimmed) {
        false
    } else if !TOTALIZER_CODES.contains(&trimmed) {
        true
    } else {
        classified_subtotal
    }
}
