pub mod dto;

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::config::Config;
use crate::error::AppError;
use crate::models::ClassEntry;

/// Remote store of class entries.
#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<ClassEntry>, AppError>;
    /// Replaces the stored entry with `entry`. Submitting the same state twice is harmless.
    async fn update(&self, entry: &ClassEntry) -> Result<(), AppError>;
}

/// Client for the class REST API (`/api/classes`).
pub struct HttpClassRepository {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClassRepository {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Self::with_base_url(config.api_url.clone(), config.api_token.clone())
    }

    pub fn with_base_url(base_url: String, token: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ClassRepository for HttpClassRepository {
    async fn list_all(&self) -> Result<Vec<ClassEntry>, AppError> {
        let url = format!("{}/api/classes", self.base_url);

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Fetch(describe_failure(response).await));
        }

        let body = response
            .json::<dto::ClassListResponse>()
            .await
            .map_err(|e| AppError::Fetch(format!("Failed to parse class list: {}", e)))?;

        let entries: Vec<ClassEntry> = body.classes.into_iter().map(ClassEntry::from).collect();
        tracing::debug!("Fetched {} classes", entries.len());
        Ok(entries)
    }

    async fn update(&self, entry: &ClassEntry) -> Result<(), AppError> {
        let url = format!("{}/api/classes/{}", self.base_url, entry.id);

        let response = self
            .authorized(self.client.put(&url))
            .json(entry)
            .send()
            .await
            .map_err(|e| AppError::Update(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Update(describe_failure(response).await));
        }

        Ok(())
    }
}

async fn describe_failure(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<dto::ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| "Something went wrong".to_string());

    if status == StatusCode::UNAUTHORIZED {
        format!("not authenticated ({}): {}", status, message)
    } else {
        format!("class API error {}: {}", status, message)
    }
}

/// Repository held in memory, with switches to make calls fail.
#[derive(Default)]
pub struct InMemoryClassRepository {
    entries: Mutex<Vec<ClassEntry>>,
    fail_list: AtomicBool,
    fail_updates: AtomicBool,
    list_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl InMemoryClassRepository {
    pub fn new(entries: Vec<ClassEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: &str) -> Option<ClassEntry> {
        self.lock().iter().find(|e| e.id == id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ClassEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ClassRepository for InMemoryClassRepository {
    async fn list_all(&self) -> Result<Vec<ClassEntry>, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(AppError::Fetch("class list unavailable".to_string()));
        }
        Ok(self.lock().clone())
    }

    async fn update(&self, entry: &ClassEntry) -> Result<(), AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::Update(format!("cannot update {}", entry.id)));
        }
        let mut entries = self.lock();
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(stored) => {
                *stored = entry.clone();
                Ok(())
            }
            None => Err(AppError::Update(format!("no class with id {}", entry.id))),
        }
    }
}
