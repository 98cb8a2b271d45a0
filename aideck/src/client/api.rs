use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::Session;
use crate::api::v1::dto::{
    AddAssetRequest, AppendMessageRequest, ConversationResponse, ConversationStatsResponse,
    ConversationSummaryResponse, CreateConversationRequest, CreateDesignProjectRequest,
    CreateFileRequest, CreateMemoryEntryRequest, CreateTaskRequest, DeletedResponse,
    DesignProjectResponse, DesignProjectStatsResponse, FileResponse, FileStatsResponse,
    ListConversationsQuery, ListDesignProjectsQuery, ListFilesQuery, ListMemoryEntriesQuery,
    ListTasksQuery, MaintenanceRunResponse, MemoryEntryByKeyQuery, MemoryEntryResponse,
    MemoryEntryStatsResponse, SetVisibilityRequest, TaskResponse, TaskStatsResponse,
    TransitionStatusRequest, UpdateConversationRequest, UpdateDesignProjectRequest,
    UpdateFileRequest, UpdateMemoryEntryRequest, UpdateTaskRequest, UsageResponse,
};
use crate::api::v1::response::{ApiResponse, ErrorCode};
use crate::error::FieldError;
use crate::models::{MemoryType, Page};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Not signed in")]
    NotSignedIn,

    /// The server rejected the token. The session has been cleared and the
    /// user has to sign in again.
    #[error("Session expired, sign in again")]
    SessionExpired,

    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api { code, .. } => *code,
            Self::SessionExpired => Some(ErrorCode::Unauthorized),
            _ => None,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Typed client for the v1 REST API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    session: Session,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: &str, session: Session) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(&format!("api/v1/{path}"))?)
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.session.token().ok_or(ClientError::NotSignedIn)?;
        Ok(self
            .http
            .request(method, self.endpoint(path)?)
            .bearer_auth(token))
    }

    async fn send<T>(&self, request: RequestBuilder) -> ClientResult<ApiResponse<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.session.clear();
            tracing::info!("Server rejected the session token, signing out");
            return Err(ClientError::SessionExpired);
        }

        let body = response.bytes().await?;
        let envelope: ApiResponse<T> = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(ClientError::Decode(format!("Invalid response envelope: {e}")));
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&body).trim().to_string();
                return Err(ClientError::Api {
                    status: status.as_u16(),
                    code: None,
                    message: if text.is_empty() { status.to_string() } else { text },
                    errors: Vec::new(),
                });
            }
        };

        if !status.is_success() || !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                code: envelope.code,
                message: envelope
                    .message
                    .unwrap_or_else(|| status.to_string()),
                errors: envelope.errors,
            });
        }

        Ok(envelope)
    }

    async fn data<T>(&self, request: RequestBuilder) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        self.send(request)
            .await?
            .data
            .ok_or_else(|| ClientError::Decode("Response carried no data".to_string()))
    }

    async fn get<T>(&self, path: &str) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        self.data(self.request(Method::GET, path)?).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize,
        T: Serialize + DeserializeOwned,
    {
        self.data(self.request(method, path)?.json(body)).await
    }

    async fn delete(&self, path: &str) -> ClientResult<DeletedResponse> {
        self.data(self.request(Method::DELETE, path)?).await
    }

    async fn list<Q, T>(&self, path: &str, query: &Q) -> ClientResult<Page<T>>
    where
        Q: Serialize,
        T: Serialize + DeserializeOwned,
    {
        let envelope = self
            .send::<Vec<T>>(self.request(Method::GET, path)?.query(query))
            .await?;
        match (envelope.data, envelope.pagination) {
            (Some(items), Some(pagination)) => Ok(Page { items, pagination }),
            _ => Err(ClientError::Decode(
                "Listing carried no items or pagination".to_string(),
            )),
        }
    }

    // -- Conversations ------------------------------------------------------

    pub async fn create_conversation(
        &self,
        req: &CreateConversationRequest,
    ) -> ClientResult<ConversationResponse> {
        self.send_json(Method::POST, "conversations", req).await
    }

    pub async fn get_conversation(&self, id: &str) -> ClientResult<ConversationResponse> {
        self.get(&format!("conversations/{id}")).await
    }

    pub async fn update_conversation(
        &self,
        id: &str,
        req: &UpdateConversationRequest,
    ) -> ClientResult<ConversationResponse> {
        self.send_json(Method::PATCH, &format!("conversations/{id}"), req)
            .await
    }

    pub async fn deactivate_conversation(&self, id: &str) -> ClientResult<DeletedResponse> {
        self.delete(&format!("conversations/{id}")).await
    }

    pub async fn append_message(
        &self,
        id: &str,
        req: &AppendMessageRequest,
    ) -> ClientResult<ConversationResponse> {
        self.send_json(Method::POST, &format!("conversations/{id}/messages"), req)
            .await
    }

    pub async fn list_conversations(
        &self,
        query: &ListConversationsQuery,
    ) -> ClientResult<Page<ConversationSummaryResponse>> {
        self.list("conversations", query).await
    }

    pub async fn conversation_stats(&self) -> ClientResult<ConversationStatsResponse> {
        self.get("conversations:stats").await
    }

    // -- Memory entries -----------------------------------------------------

    pub async fn create_memory_entry(
        &self,
        req: &CreateMemoryEntryRequest,
    ) -> ClientResult<MemoryEntryResponse> {
        self.send_json(Method::POST, "memory-entries", req).await
    }

    pub async fn upsert_memory_entry(
        &self,
        req: &CreateMemoryEntryRequest,
    ) -> ClientResult<MemoryEntryResponse> {
        self.send_json(Method::PUT, "memory-entries:upsert", req)
            .await
    }

    pub async fn get_memory_entry(&self, id: &str) -> ClientResult<MemoryEntryResponse> {
        self.get(&format!("memory-entries/{id}")).await
    }

    pub async fn get_memory_entry_by_key(
        &self,
        key: &str,
        memory_type: MemoryType,
    ) -> ClientResult<MemoryEntryResponse> {
        let query = MemoryEntryByKeyQuery {
            key: key.to_string(),
            memory_type,
        };
        self.data(
            self.request(Method::GET, "memory-entries:by-key")?
                .query(&query),
        )
        .await
    }

    pub async fn update_memory_entry(
        &self,
        id: &str,
        req: &UpdateMemoryEntryRequest,
    ) -> ClientResult<MemoryEntryResponse> {
        self.send_json(Method::PATCH, &format!("memory-entries/{id}"), req)
            .await
    }

    pub async fn delete_memory_entry(&self, id: &str) -> ClientResult<DeletedResponse> {
        self.delete(&format!("memory-entries/{id}")).await
    }

    pub async fn list_memory_entries(
        &self,
        query: &ListMemoryEntriesQuery,
    ) -> ClientResult<Page<MemoryEntryResponse>> {
        self.list("memory-entries", query).await
    }

    pub async fn memory_entry_stats(&self) -> ClientResult<MemoryEntryStatsResponse> {
        self.get("memory-entries:stats").await
    }

    // -- Design projects ----------------------------------------------------

    pub async fn create_design_project(
        &self,
        req: &CreateDesignProjectRequest,
    ) -> ClientResult<DesignProjectResponse> {
        self.send_json(Method::POST, "design-projects", req).await
    }

    pub async fn get_design_project(&self, id: &str) -> ClientResult<DesignProjectResponse> {
        self.get(&format!("design-projects/{id}")).await
    }

    pub async fn update_design_project(
        &self,
        id: &str,
        req: &UpdateDesignProjectRequest,
    ) -> ClientResult<DesignProjectResponse> {
        self.send_json(Method::PATCH, &format!("design-projects/{id}"), req)
            .await
    }

    pub async fn transition_design_status(
        &self,
        id: &str,
        req: &TransitionStatusRequest,
    ) -> ClientResult<DesignProjectResponse> {
        self.send_json(Method::POST, &format!("design-projects/{id}/status"), req)
            .await
    }

    pub async fn add_design_asset(
        &self,
        id: &str,
        req: &AddAssetRequest,
    ) -> ClientResult<DesignProjectResponse> {
        self.send_json(Method::POST, &format!("design-projects/{id}/assets"), req)
            .await
    }

    pub async fn delete_design_project(&self, id: &str) -> ClientResult<DeletedResponse> {
        self.delete(&format!("design-projects/{id}")).await
    }

    pub async fn list_design_projects(
        &self,
        query: &ListDesignProjectsQuery,
    ) -> ClientResult<Page<DesignProjectResponse>> {
        self.list("design-projects", query).await
    }

    pub async fn design_project_stats(&self) -> ClientResult<DesignProjectStatsResponse> {
        self.get("design-projects:stats").await
    }

    // -- Files --------------------------------------------------------------

    pub async fn register_file(&self, req: &CreateFileRequest) -> ClientResult<FileResponse> {
        self.send_json(Method::POST, "files", req).await
    }

    pub async fn get_file(&self, id: &str) -> ClientResult<FileResponse> {
        self.get(&format!("files/{id}")).await
    }

    pub async fn update_file(
        &self,
        id: &str,
        req: &UpdateFileRequest,
    ) -> ClientResult<FileResponse> {
        self.send_json(Method::PATCH, &format!("files/{id}"), req)
            .await
    }

    pub async fn set_file_visibility(
        &self,
        id: &str,
        is_public: bool,
    ) -> ClientResult<FileResponse> {
        let req = SetVisibilityRequest { is_public };
        self.send_json(Method::POST, &format!("files/{id}/visibility"), &req)
            .await
    }

    pub async fn delete_file(&self, id: &str) -> ClientResult<DeletedResponse> {
        self.delete(&format!("files/{id}")).await
    }

    pub async fn list_files(&self, query: &ListFilesQuery) -> ClientResult<Page<FileResponse>> {
        self.list("files", query).await
    }

    pub async fn file_stats(&self) -> ClientResult<FileStatsResponse> {
        self.get("files:stats").await
    }

    // -- Tasks --------------------------------------------------------------

    pub async fn create_task(&self, req: &CreateTaskRequest) -> ClientResult<TaskResponse> {
        self.send_json(Method::POST, "tasks", req).await
    }

    pub async fn get_task(&self, id: &str) -> ClientResult<TaskResponse> {
        self.get(&format!("tasks/{id}")).await
    }

    pub async fn update_task(
        &self,
        id: &str,
        req: &UpdateTaskRequest,
    ) -> ClientResult<TaskResponse> {
        self.send_json(Method::PATCH, &format!("tasks/{id}"), req)
            .await
    }

    pub async fn delete_task(&self, id: &str) -> ClientResult<DeletedResponse> {
        self.delete(&format!("tasks/{id}")).await
    }

    pub async fn list_tasks(&self, query: &ListTasksQuery) -> ClientResult<Page<TaskResponse>> {
        self.list("tasks", query).await
    }

    pub async fn task_stats(&self) -> ClientResult<TaskStatsResponse> {
        self.get("tasks:stats").await
    }

    // -- Usage and admin ----------------------------------------------------

    pub async fn usage(&self) -> ClientResult<UsageResponse> {
        self.get("usage").await
    }

    pub async fn run_maintenance(&self) -> ClientResult<MaintenanceRunResponse> {
        self.data(self.request(Method::POST, "admin/maintenance:run")?)
            .await
    }
}
