// ==========================================
// PAC 现金流计划导入系统 - 工作簿读取器实现
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls/.ods) / CSV (.csv)
// 选表: 名称提示大小写不敏感的包含匹配; 未命中回退第一个工作表
// ==========================================

use crate::importer::budget_importer_trait::WorkbookReader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sheet::{CellValue, SheetGrid};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// 检查文件存在
fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// 小写扩展名
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 按提示选择工作表名称
///
/// - 有提示: 第一个名称包含提示（大小写不敏感）的工作表
/// - 无提示或未命中: 第一个工作表
pub fn select_sheet_name(sheet_names: &[String], sheet_hint: Option<&str>) -> Option<String> {
    if let Some(hint) = sheet_hint.map(str::trim).filter(|h| !h.is_empty()) {
        let hint_upper = hint.to_uppercase();
        if let Some(found) = sheet_names
            .iter()
            .find(|name| name.to_uppercase().contains(&hint_upper))
        {
            return Some(found.clone());
        }
        warn!(hint = %hint, sheets = ?sheet_names, "未找到匹配的工作表,回退到第一个工作表");
    }
    sheet_names.first().cloned()
}

fn cell_from_calamine(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelWorkbookReader;

impl WorkbookReader for ExcelWorkbookReader {
    fn read_sheet(&self, file_path: &Path, sheet_hint: Option<&str>) -> ImportResult<SheetGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !matches!(ext.as_str(), "xlsx" | "xlsm" | "xls" | "xlsb" | "ods") {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_names = workbook.sheet_names();
        let sheet_name = select_sheet_name(&sheet_names, sheet_hint)
            .ok_or_else(|| ImportError::WorkbookUnreadable("工作簿中没有工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // calamine 的 Range 从首个非空单元格开始,这里还原为绝对坐标
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
        for data_row in range.rows() {
            let mut cells = vec![CellValue::Empty; start_col as usize];
            cells.extend(data_row.iter().map(cell_from_calamine));
            rows.push(cells);
        }

        debug!(sheet = %sheet_name, rows = rows.len(), "Excel 工作表读取完成");
        Ok(SheetGrid::new(sheet_name, rows))
    }
}

// ==========================================
// CSV Reader 实现
// ==========================================
// CSV 第 N 行即工作表第 N 行,不处理表头
pub struct CsvWorkbookReader;

impl WorkbookReader for CsvWorkbookReader {
    fn read_sheet(&self, file_path: &Path, sheet_hint: Option<&str>) -> ImportResult<SheetGrid> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }
        if let Some(hint) = sheet_hint {
            debug!(hint = %hint, "CSV 只有一个工作表,忽略工作表提示");
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows: Vec<Vec<CellValue>> = Vec::new();
        for result in reader.records() {
            let record = result?;
            // csv 会跳过空行,按记录起始行号定位以保持行号一致
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(rows.len() + 1);
            if rows.len() < line - 1 {
                rows.resize(line - 1, Vec::new());
            }
            rows.push(record.iter().map(|v| CellValue::from(v.trim())).collect());
        }

        let name = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("csv")
            .to_string();
        debug!(sheet = %name, rows = rows.len(), "CSV 读取完成");
        Ok(SheetGrid::new(name, rows))
    }
}

// ==========================================
// 通用读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalWorkbookReader;

impl WorkbookReader for UniversalWorkbookReader {
    fn read_sheet(&self, file_path: &Path, sheet_hint: Option<&str>) -> ImportResult<SheetGrid> {
        ensure_exists(file_path)?;

        match extension_of(file_path).as_str() {
            "csv" => CsvWorkbookReader.read_sheet(file_path, sheet_hint),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => {
                ExcelWorkbookReader.read_sheet(file_path, sheet_hint)
            }
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
