//! MindsDB client over the HTTP SQL API

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::sql;
use crate::domain::{
    Callback, DomainError, FinetunePayload, ModelStatus, ModelTrainingService, PredictPayload,
    PredictionRow, RemoteModel, RemoteView, TrainingPayload,
};

/// Connection details for a MindsDB instance
#[derive(Debug, Clone)]
pub struct MindsDbConnection {
    pub host: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Managed (cloud) instances authenticate through the cloud login endpoint
    pub managed: bool,
    pub timeout: Duration,
}

impl Default for MindsDbConnection {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1:47334".to_string(),
            user: None,
            password: None,
            managed: false,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Response envelope of `/api/sql/query`
#[derive(Debug, Deserialize)]
struct SqlResponse {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    column_names: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
    #[serde(default)]
    error_message: Option<String>,
}

impl SqlResponse {
    fn rows(self) -> Vec<PredictionRow> {
        let columns = self.column_names;
        self.data
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect()
    }
}

/// MindsDB client implementing [`ModelTrainingService`]
#[derive(Debug, Clone)]
pub struct MindsDbClient {
    client: reqwest::Client,
    connection: MindsDbConnection,
}

impl MindsDbClient {
    pub fn new(connection: MindsDbConnection) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(connection.timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| DomainError::remote(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, connection })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.connection.host.trim_end_matches('/'), path)
    }

    fn has_credentials(&self) -> bool {
        self.connection.managed
            || self
                .connection
                .password
                .as_deref()
                .is_some_and(|password| !password.is_empty())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, DomainError> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|e| DomainError::remote(format!("Request failed: {}", e)))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DomainError> {
        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(DomainError::remote(format!("HTTP {}: {}", status, error_body)));
        }

        Ok(response)
    }

    /// Send a request, logging in again once if the session was rejected
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, DomainError> {
        let response = self.send(method.clone(), path, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.has_credentials() {
            warn!(path = %path, "MindsDB session rejected, logging in again");
            self.login().await?;
            let retried = self.send(method, path, body).await?;
            return Self::check_status(retried).await;
        }

        Self::check_status(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, DomainError> {
        response
            .json()
            .await
            .map_err(|e| DomainError::remote(format!("Failed to parse response: {}", e)))
    }

    /// Run one SQL statement
    async fn execute(&self, statement: &str) -> Result<SqlResponse, DomainError> {
        debug!(statement = %statement, "Executing MindsDB statement");

        let response = self
            .request(
                Method::POST,
                "/api/sql/query",
                Some(&json!({ "query": statement })),
            )
            .await?;
        let body: SqlResponse = Self::parse(response).await?;

        if body.kind == "error" {
            return Err(DomainError::remote(
                body.error_message
                    .unwrap_or_else(|| "Unknown MindsDB error".to_string()),
            ));
        }

        Ok(body)
    }

    async fn login(&self) -> Result<(), DomainError> {
        let user = self.connection.user.clone().unwrap_or_default();
        let password = self.connection.password.clone().unwrap_or_default();

        let (path, body) = if self.connection.managed {
            ("/cloud/login", json!({ "email": user, "password": password }))
        } else if !password.is_empty() {
            ("/api/login", json!({ "username": user, "password": password }))
        } else {
            return Ok(());
        };

        let response = self.send(Method::POST, path, Some(&body)).await?;
        Self::check_status(response).await?;
        Ok(())
    }
}

fn column<'a>(row: &'a PredictionRow, name: &str) -> Option<&'a Value> {
    row.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
        .filter(|value| !value.is_null())
}

fn text_column(row: &PredictionRow, name: &str) -> Option<String> {
    column(row, name).map(|value| match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Map a row of the `models` table to a [`RemoteModel`]
fn model_from_row(row: &PredictionRow, project: &str) -> Option<RemoteModel> {
    let name = text_column(row, "name")?;
    let status = text_column(row, "status")
        .map(ModelStatus::from)
        .unwrap_or_else(|| ModelStatus::Other("unknown".to_string()));

    let mut model = RemoteModel::new(
        name,
        text_column(row, "project").unwrap_or_else(|| project.to_string()),
        status,
    );

    model.version = column(row, "version").and_then(|value| match value {
        Value::Number(number) => number.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(text) => text.parse().ok(),
        _ => None,
    });
    model.tag = text_column(row, "tag").filter(|tag| !tag.is_empty());
    model.error = text_column(row, "error").filter(|error| !error.is_empty());
    model.trained_at = ["training_stop_at", "training_time", "created_at"]
        .iter()
        .find_map(|key| text_column(row, key).and_then(|raw| parse_timestamp(&raw)));

    Some(model)
}

#[async_trait]
impl ModelTrainingService for MindsDbClient {
    async fn connect(&self) -> Result<(), DomainError> {
        self.login().await?;
        self.execute("SELECT 1").await?;

        info!(host = %self.connection.host, managed = self.connection.managed, "Connected to MindsDB");
        Ok(())
    }

    async fn get_model(
        &self,
        name: &str,
        project: &str,
        version: Option<u32>,
    ) -> Result<Option<RemoteModel>, DomainError> {
        let rows = self
            .execute(&sql::describe_model(name, project, version))
            .await?
            .rows();

        Ok(rows.iter().find_map(|row| model_from_row(row, project)))
    }

    async fn list_models(&self, project: &str) -> Result<Vec<RemoteModel>, DomainError> {
        let rows = self.execute(&sql::list_models(project)).await?.rows();
        Ok(rows
            .iter()
            .filter_map(|row| model_from_row(row, project))
            .collect())
    }

    async fn train_model(
        &self,
        name: &str,
        target_column: &str,
        project: &str,
        payload: &TrainingPayload,
    ) -> Result<(), DomainError> {
        self.execute(&sql::create_model(name, target_column, project, payload))
            .await?;
        Ok(())
    }

    async fn retrain_model(
        &self,
        name: &str,
        target_column: &str,
        project: &str,
        payload: &TrainingPayload,
    ) -> Result<(), DomainError> {
        self.execute(&sql::retrain_model(name, target_column, project, payload))
            .await?;
        Ok(())
    }

    async fn finetune_model(
        &self,
        name: &str,
        project: &str,
        payload: &FinetunePayload,
    ) -> Result<(), DomainError> {
        self.execute(&sql::finetune_model(name, project, payload))
            .await?;
        Ok(())
    }

    async fn query(
        &self,
        name: &str,
        project: &str,
        version: Option<u32>,
        payload: &PredictPayload,
    ) -> Result<Vec<PredictionRow>, DomainError> {
        Ok(self
            .execute(&sql::query(name, project, version, payload))
            .await?
            .rows())
    }

    async fn batch_query(
        &self,
        name: &str,
        project: &str,
        version: Option<u32>,
        payload: &PredictPayload,
    ) -> Result<Vec<PredictionRow>, DomainError> {
        let join = payload
            .join
            .as_deref()
            .ok_or_else(|| DomainError::validation("Batch query requires a join clause"))?;

        Ok(self
            .execute(&sql::batch_query(name, project, version, join, payload))
            .await?
            .rows())
    }

    async fn delete_model(&self, name: &str, project: &str) -> Result<(), DomainError> {
        self.execute(&sql::drop_model(name, project)).await?;
        Ok(())
    }

    async fn list_views(&self, project: &str) -> Result<Vec<RemoteView>, DomainError> {
        let rows = self.execute(&sql::list_views(project)).await?.rows();
        Ok(rows
            .iter()
            .filter_map(|row| text_column(row, "table_name"))
            .map(RemoteView::new)
            .collect())
    }

    async fn create_view(
        &self,
        name: &str,
        project: &str,
        select: &str,
    ) -> Result<(), DomainError> {
        self.execute(&sql::create_view(name, project, select))
            .await?;
        Ok(())
    }

    async fn list_callbacks(&self) -> Result<Vec<Callback>, DomainError> {
        let response = self.request(Method::GET, "/cloud/callbacks", None).await?;
        Self::parse(response).await
    }

    async fn create_callback(&self, url: &str) -> Result<Callback, DomainError> {
        let response = self
            .request(Method::POST, "/cloud/callbacks", Some(&json!({ "url": url })))
            .await?;
        Self::parse(response).await
    }

    async fn delete_callback(&self, id: u64) -> Result<(), DomainError> {
        self.request(Method::DELETE, &format!("/cloud/callbacks/{}", id), None)
            .await?;
        Ok(())
    }
}
