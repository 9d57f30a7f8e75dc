// ==========================================
// 员工假期追踪系统 - 假期数据导入器
// ==========================================
// 流程: Parse → Normalize → Resolve → Upsert（逐行隔离故障）
// 红线: 导入值以表格为准, 不经汇总引擎重算
//       逐行提交, 不整体回滚; 计数须与实际处理行一致
// ==========================================

use crate::config::TrackerConfigReader;
use crate::domain::{
    Employee, ImportBatchResult, ImportOptions, ImportRow, ImportedTrackerValues, LeaveType,
    NormalizedImportRow, RowError, RowErrorKind, Tracker, TrackerKey,
};
use crate::i18n::{t, t_with_args};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{FileKind, ParsedRows, UniversalFileParser};
use crate::repository::{EmployeeDirectory, LeaveTypeCatalog, RepositoryError, TrackerRepository};
use async_trait::async_trait;
use chrono::{Datelike, Local};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// TrackerImporter Trait
// ==========================================
// 实现者: LeaveImporterImpl
#[async_trait]
pub trait TrackerImporter: Send + Sync {
    /// 按配置生成默认批次参数（年份取当前年）
    async fn default_options(&self) -> ImportResult<ImportOptions>;

    /// 从文件路径导入
    async fn import_file(&self, path: &Path, options: ImportOptions) -> ImportResult<ImportBatchResult>;

    /// 从内存内容导入（file_name 仅用于判定文件类型和记录）
    async fn import_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
        options: ImportOptions,
    ) -> ImportResult<ImportBatchResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Created,
    Updated,
}

fn store_error(row: usize, err: RepositoryError) -> RowError {
    RowError::new(row, RowErrorKind::Store(err.to_string()))
}

// ==========================================
// LeaveImporterImpl
// ==========================================
pub struct LeaveImporterImpl<C>
where
    C: TrackerConfigReader,
{
    // 协作方与仓储
    directory: Arc<dyn EmployeeDirectory>,
    catalog: Arc<dyn LeaveTypeCatalog>,
    trackers: Arc<TrackerRepository>,

    // 配置读取器
    config: Arc<C>,

    // 导入组件
    parser: UniversalFileParser,
    mapper: FieldMapper,
}

impl<C> LeaveImporterImpl<C>
where
    C: TrackerConfigReader,
{
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        catalog: Arc<dyn LeaveTypeCatalog>,
        trackers: Arc<TrackerRepository>,
        config: Arc<C>,
    ) -> Self {
        Self {
            directory,
            catalog,
            trackers,
            config,
            parser: UniversalFileParser,
            mapper: FieldMapper,
        }
    }

    /// 渲染面向用户的批次汇总（错误最多展示配置的条数）
    pub async fn summary(&self, result: &ImportBatchResult) -> ImportResult<String> {
        let limit = self.config.get_error_summary_limit().await?;
        Ok(render_summary(result, limit))
    }

    /// 员工解析: 先按工号, 工号未命中且有姓名时按姓名
    fn resolve_employee(&self, row: &NormalizedImportRow) -> Result<Employee, RowError> {
        let by_number = self
            .directory
            .find_employee_by_number(&row.employee_code)
            .map_err(|e| store_error(row.row_number, e))?;

        let found = match by_number {
            Some(employee) => Some(employee),
            None if !row.employee_name.is_empty() => self
                .directory
                .find_employee_by_name(&row.employee_name)
                .map_err(|e| store_error(row.row_number, e))?,
            None => None,
        };

        found.ok_or_else(|| {
            RowError::new(
                row.row_number,
                RowErrorKind::EmployeeNotFound {
                    code: row.employee_code.clone(),
                    name: row.employee_name.clone(),
                },
            )
        })
    }

    fn resolve_leave_type(&self, row: &NormalizedImportRow) -> Result<LeaveType, RowError> {
        self.catalog
            .find_leave_type_by_name(&row.leave_type_name)
            .map_err(|e| store_error(row.row_number, e))?
            .ok_or_else(|| {
                RowError::new(
                    row.row_number,
                    RowErrorKind::LeaveTypeNotFound(row.leave_type_name.clone()),
                )
            })
    }

    /// 部门: 未填写时沿用员工所属部门; 填写但查无此部门时置空
    fn resolve_department(&self, row: &NormalizedImportRow, employee: &Employee) -> Result<Option<i64>, RowError> {
        if row.department_name.is_empty() {
            return Ok(employee.department_id);
        }
        let department = self
            .directory
            .find_department_by_name(&row.department_name)
            .map_err(|e| store_error(row.row_number, e))?;
        Ok(department.map(|d| d.id))
    }

    /// 单行处理: Normalize → Resolve → Upsert
    fn process_row(&self, row: &ImportRow, options: &ImportOptions) -> Result<RowOutcome, RowError> {
        if row.employee_code().is_empty() || row.leave_type_name().is_empty() {
            return Err(RowError::new(row.row_number, RowErrorKind::MissingIdentity));
        }

        let normalized = self.mapper.normalize(row, options.default_year)?;
        let employee = self.resolve_employee(&normalized)?;
        let leave_type = self.resolve_leave_type(&normalized)?;
        let department_id = self.resolve_department(&normalized, &employee)?;

        let values = ImportedTrackerValues {
            total_allocation: normalized.total_allocation,
            taken_leaves: normalized.taken_leaves,
            pending_requests: normalized.pending_requests,
            current_balance: normalized.current_balance,
            annual_carry: normalized.carry_forwarded,
            expired_carry: normalized.expired_carry,
            department_id,
        };

        let key = TrackerKey::new(employee.id, leave_type.id, normalized.year.clone());
        let existing = self
            .trackers
            .find_by_key(&key)
            .map_err(|e| store_error(row.row_number, e))?;

        match existing {
            Some(mut tracker) => {
                if !options.update_existing {
                    return Err(RowError::new(
                        row.row_number,
                        RowErrorKind::AlreadyExists {
                            employee: employee.name.clone(),
                            leave_type: leave_type.name.clone(),
                            year: normalized.year.clone(),
                        },
                    ));
                }
                tracker.refresh_display_fields(Some(&employee), Some(&leave_type));
                tracker.apply_imported(&values);
                self.trackers
                    .update(&tracker)
                    .map_err(|e| store_error(row.row_number, e))?;
                debug!(row = row.row_number, tracker_id = tracker.id, "导入行更新已有记录");
                Ok(RowOutcome::Updated)
            }
            None => {
                let mut tracker = Tracker::new(&employee, &leave_type, &normalized.year);
                tracker.apply_imported(&values);
                let id = self
                    .trackers
                    .insert(&tracker)
                    .map_err(|e| store_error(row.row_number, e))?;
                debug!(row = row.row_number, tracker_id = id, "导入行新建记录");
                Ok(RowOutcome::Created)
            }
        }
    }
}

#[async_trait]
impl<C> TrackerImporter for LeaveImporterImpl<C>
where
    C: TrackerConfigReader,
{
    async fn default_options(&self) -> ImportResult<ImportOptions> {
        Ok(ImportOptions {
            update_existing: self.config.get_update_existing().await?,
            default_year: Local::now().year(),
        })
    }

    #[instrument(skip(self, path, options), fields(path = %path.display()))]
    async fn import_file(&self, path: &Path, options: ImportOptions) -> ImportResult<ImportBatchResult> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.import_bytes(&file_name, &bytes, options).await
    }

    #[instrument(skip(self, file_name, bytes, options), fields(batch_id, file_name = %file_name))]
    async fn import_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
        options: ImportOptions,
    ) -> ImportResult<ImportBatchResult> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        if bytes.is_empty() {
            return Err(ImportError::NoFileSelected);
        }

        // === 阶段 1: 解析 ===
        let kind = FileKind::from_file_name(file_name);
        info!(
            batch_id = %batch_id,
            kind = kind.label(),
            update_existing = options.update_existing,
            year = options.default_year,
            "开始导入假期数据"
        );
        let parsed = self.parser.parse_bytes(kind, bytes)?;
        if parsed.is_empty() {
            return Err(ImportError::NoData);
        }
        info!(rows = parsed.rows.len(), skipped_blank = parsed.skipped_blank, "文件解析完成");

        // === 阶段 2-4: 逐行处理 ===
        let mut result = self.import_rows(&batch_id, Some(file_name), parsed, &options);
        result.elapsed = start_time.elapsed();
        info!(
            batch_id = %batch_id,
            created = result.created,
            updated = result.updated,
            errors = result.error_count(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "导入完成"
        );
        Ok(result)
    }
}

impl<C> LeaveImporterImpl<C>
where
    C: TrackerConfigReader,
{
    /// 对已解析的行执行 Normalize → Resolve → Upsert
    ///
    /// 逐行提交; 已处理的行不因后续行失败而回滚
    pub fn import_rows(
        &self,
        batch_id: &str,
        file_name: Option<&str>,
        parsed: ParsedRows,
        options: &ImportOptions,
    ) -> ImportBatchResult {
        let mut result = ImportBatchResult::new(
            batch_id.to_string(),
            file_name.map(str::to_string),
            options.default_year,
        );
        result.skipped_blank = parsed.skipped_blank;

        for parsed_row in parsed.rows {
            let outcome = parsed_row.and_then(|row| self.process_row(&row, options));
            match outcome {
                Ok(RowOutcome::Created) => result.created += 1,
                Ok(RowOutcome::Updated) => result.updated += 1,
                Err(e) => {
                    warn!(batch_id = %batch_id, row = e.row, error = %e.kind, "导入行失败, 已跳过");
                    result.errors.push(e);
                }
            }
        }
        result
    }
}

/// 渲染批次汇总文本
pub fn render_summary(result: &ImportBatchResult, error_limit: usize) -> String {
    let year = result.year.to_string();
    let created = result.created.to_string();
    let updated = result.updated.to_string();
    let mut lines = vec![
        t_with_args("import.summary_header", &[("year", year.as_str())]),
        String::new(),
        t_with_args("import.summary_created", &[("count", created.as_str())]),
        t_with_args("import.summary_updated", &[("count", updated.as_str())]),
        String::new(),
    ];

    if result.is_clean() {
        lines.push(t("import.summary_clean"));
    } else {
        let total = result.error_count().to_string();
        lines.push(t_with_args("import.summary_errors", &[("count", total.as_str())]));
        for message in result.error_messages().into_iter().take(error_limit) {
            lines.push(format!("• {}", message));
        }
        if result.error_count() > error_limit {
            let more = (result.error_count() - error_limit).to_string();
            lines.push(t_with_args("import.summary_more_errors", &[("count", more.as_str())]));
        }
    }

    lines.join("\n")
}
