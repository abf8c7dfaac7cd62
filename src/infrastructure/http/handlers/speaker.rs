//! Speaker HTTP Handlers

use axum::{
    body::Body,
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::{
    DeleteSpeaker, GetSpeaker, ListSpeakers, Operation, RegisterSpeaker, RegistryError,
    UpdateSpeaker,
};
use crate::domain::speaker::{AudioFormat, AudioSample, PropertyValue};
use crate::infrastructure::http::dto::{
    ApiResponse, Empty, SpeakerListResponse, SpeakerNameRequest, SpeakerResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 上传的文件字段
struct UploadedFile {
    file_name: Option<String>,
    data: Vec<u8>,
}

/// register / update 共用的 multipart 表单
///
/// 字段: name, file, language, description, properties (JSON 对象)；
/// 其余文本字段作为额外属性
#[derive(Default)]
struct SpeakerForm {
    name: Option<String>,
    file: Option<UploadedFile>,
    language: Option<String>,
    description: Option<String>,
    extra_properties: BTreeMap<String, PropertyValue>,
}

impl SpeakerForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
        })? {
            let field_name = field.name().unwrap_or_default().to_string();

            match field_name.as_str() {
                "name" => form.name = Some(read_text(field, "name").await?),
                "language" => form.language = Some(read_text(field, "language").await?),
                "description" => {
                    form.description = Some(read_text(field, "description").await?)
                }
                "file" => {
                    let file_name = field.file_name().map(|s| s.to_string());
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                        .to_vec();
                    // 浏览器未选择文件时会提交一个空文件字段
                    let nothing_chosen =
                        data.is_empty() && file_name.as_deref().unwrap_or_default().is_empty();
                    if !nothing_chosen {
                        form.file = Some(UploadedFile { file_name, data });
                    }
                }
                "properties" => {
                    let text = read_text(field, "properties").await?;
                    form.merge_properties(&text)?;
                }
                "" => {}
                _ if field.file_name().is_some() => {
                    tracing::debug!(field = %field_name, "Ignoring unexpected file field");
                }
                _ => {
                    let value = read_text(field, &field_name).await?;
                    form.extra_properties
                        .insert(field_name, PropertyValue::Text(value));
                }
            }
        }

        Ok(form)
    }

    fn merge_properties(&mut self, text: &str) -> Result<(), ApiError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ApiError::BadRequest(format!("Invalid properties JSON: {}", e)))?;
        let serde_json::Value::Object(map) = value else {
            return Err(ApiError::BadRequest(
                "properties must be a JSON object".to_string(),
            ));
        };
        for (key, value) in map {
            let property = PropertyValue::from_json(&key, value)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            self.extra_properties.insert(key, property);
        }
        Ok(())
    }

    fn name(&self) -> Result<String, ApiError> {
        self.name
            .clone()
            .ok_or_else(|| ApiError::BadRequest("Name is required".to_string()))
    }

    fn audio(&mut self, operation: Operation, name: &str) -> Result<Option<AudioSample>, ApiError> {
        self.file
            .take()
            .map(|file| {
                AudioSample::from_upload(file.data, file.file_name.as_deref())
                    .map_err(|e| ApiError::from(RegistryError::invalid(operation, name, e)))
            })
            .transpose()
    }
}

async fn read_text(field: Field<'_>, what: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", what, e)))
}

/// 注册说话人
pub async fn register_speaker(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<SpeakerResponse>>, ApiError> {
    let mut form = SpeakerForm::read(multipart).await?;
    let name = form.name()?;
    let audio = form.audio(Operation::Register, &name)?;

    let record = state
        .registry
        .register(RegisterSpeaker {
            name,
            audio,
            language: form.language,
            description: form.description,
            extra_properties: form.extra_properties,
        })
        .await?;

    Ok(Json(ApiResponse::success(record.into())))
}

/// 部分更新说话人
pub async fn update_speaker(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<SpeakerResponse>>, ApiError> {
    let mut form = SpeakerForm::read(multipart).await?;
    let name = form.name()?;
    let audio = form.audio(Operation::Update, &name)?;

    let record = state
        .registry
        .update(UpdateSpeaker {
            name,
            audio,
            language: form.language,
            description: form.description,
            extra_properties: form.extra_properties,
        })
        .await?;

    Ok(Json(ApiResponse::success(record.into())))
}

/// 删除说话人
pub async fn delete_speaker(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeakerNameRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .registry
        .delete(DeleteSpeaker { name: req.name })
        .await?;

    Ok(Json(ApiResponse::ok()))
}

/// 获取说话人详情
pub async fn get_speaker(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeakerNameRequest>,
) -> Result<Json<ApiResponse<SpeakerResponse>>, ApiError> {
    let record = state.registry.get(GetSpeaker { name: req.name }).await?;

    Ok(Json(ApiResponse::success(record.into())))
}

/// 获取说话人列表
pub async fn list_speakers(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<SpeakerListResponse>> {
    let speakers: Vec<SpeakerResponse> = state
        .registry
        .list_all(ListSpeakers)
        .await
        .into_iter()
        .map(SpeakerResponse::from)
        .collect();
    let total = speakers.len();

    Json(ApiResponse::success(SpeakerListResponse { speakers, total }))
}

/// 下载说话人参考音频
pub async fn download_speaker_audio(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let record = state.registry.get(GetSpeaker { name }).await?;
    let audio_path = record.audio_path();

    let file = tokio::fs::File::open(audio_path).await.map_err(|e| {
        ApiError::Internal(format!(
            "Failed to open audio for speaker '{}': {}",
            record.name(),
            e
        ))
    })?;
    let file_size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get file metadata: {}", e)))?
        .len();

    let format = AudioFormat::from_path(audio_path).unwrap_or_default();
    let file_name = audio_path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("sample.wav");

    // 流式返回文件内容
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.mime_type())
        .header(header::CONTENT_LENGTH, file_size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
