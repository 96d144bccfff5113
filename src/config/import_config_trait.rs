// ==========================================
// PAC 现金流计划导入系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::DatasetKind;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取数据集的工作表名称提示
    ///
    /// # 返回
    /// - Some(hint): 名称片段（大小写不敏感包含匹配）
    /// - None: 直接使用第一个工作表
    ///
    /// # 默认值
    /// - AIM_INICIAL: None
    /// - PROGRAMADO: "PROG PAC"
    /// - EJECUTADO_COMPROMISO: "EJECUTADO COMPROMISO"
    /// - EJECUTADO_PAGO: "EJECUTADO PAGO"
    async fn get_sheet_hint(&self, dataset: DatasetKind) -> ConfigResult<Option<String>>;

    /// 获取页脚/签名行关键字
    ///
    /// # 默认值
    /// - ["SUBGERENTE", "GERENTE", "FIRMA", "ELABOR"]
    async fn get_footer_keywords(&self) -> ConfigResult<Vec<String>>;

    /// 获取默认财年
    ///
    /// # 默认值
    /// - 2026
    async fn get_default_fiscal_year(&self) -> ConfigResult<i32>;
}
