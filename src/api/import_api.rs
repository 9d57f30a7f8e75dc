// ==========================================
// 员工假期追踪系统 - 假期数据导入 API
// ==========================================
// 职责: 封装批量导入与模板下载
// ==========================================

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::config::ConfigManager;
use crate::domain::ImportBatchResult;
use crate::importer::{
    template_csv, LeaveImporterImpl, TrackerImporter, TEMPLATE_FILE_NAME, TEMPLATE_MIME_TYPE,
};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 批次结果（完整错误列表）
    pub result: ImportBatchResult,
    /// 面向用户的汇总文本（错误条数已截断）
    pub summary: String,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 导入模板
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFile {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// 导入请求参数（未填写的项取配置默认值）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRequest {
    pub update_existing: Option<bool>,
    pub year: Option<i32>,
}

/// 导入API
pub struct ImportApi {
    importer: Arc<LeaveImporterImpl<ConfigManager>>,
}

impl ImportApi {
    pub fn new(importer: Arc<LeaveImporterImpl<ConfigManager>>) -> Self {
        Self { importer }
    }

    /// 从文件路径导入
    pub async fn import_file(&self, file_path: &str, request: ImportRequest) -> ApiResult<ImportApiResponse> {
        let options = self.resolve_options(&request).await?;
        let result = self.importer.import_file(Path::new(file_path), options).await?;
        self.respond(result).await
    }

    /// 从上传内容导入
    pub async fn import_upload(
        &self,
        file_name: &str,
        content: &[u8],
        request: ImportRequest,
    ) -> ApiResult<ImportApiResponse> {
        let options = self.resolve_options(&request).await?;
        let result = self.importer.import_bytes(file_name, content, options).await?;
        self.respond(result).await
    }

    /// 下载导入模板
    pub fn download_template(&self) -> ApiResult<TemplateFile> {
        Ok(TemplateFile {
            file_name: TEMPLATE_FILE_NAME.to_string(),
            mime_type: TEMPLATE_MIME_TYPE.to_string(),
            content: template_csv()?,
        })
    }

    async fn resolve_options(&self, request: &ImportRequest) -> ApiResult<crate::domain::ImportOptions> {
        let mut options = self.importer.default_options().await?;
        if let Some(update_existing) = request.update_existing {
            options.update_existing = update_existing;
        }
        if let Some(year) = request.year {
            options.default_year = year;
        }
        Ok(options)
    }

    async fn respond(&self, result: ImportBatchResult) -> ApiResult<ImportApiResponse> {
        let summary = self.importer.summary(&result).await?;
        Ok(ImportApiResponse {
            elapsed_ms: result.elapsed.as_millis() as i64,
            summary,
            result,
        })
    }
}
