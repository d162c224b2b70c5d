use std::env;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::{Assignment, AssignmentUpdate, Course, CourseFields, NewAssignment};
use crate::store::RecordStore;
use crate::store::dto::{
    ASSIGNMENT_FIELDS, ASSIGNMENT_TABLE, AssignmentRecord, AssignmentWrite, COURSE_FIELDS,
    COURSE_TABLE, CourseRecord, CourseWrite, DeleteRequest, Envelope, FetchRequest, RecordsRequest,
};

#[derive(Clone, Debug)]
pub struct HostedConfig {
    pub base_url: String,
    pub project_id: String,
    pub public_key: String,
}

impl HostedConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("APPER_BASE_URL")
            .map_err(|_| AppError::Config("APPER_BASE_URL is not set".to_string()))?;
        let project_id = env::var("APPER_PROJECT_ID")
            .map_err(|_| AppError::Config("APPER_PROJECT_ID is not set".to_string()))?;
        let public_key = env::var("APPER_PUBLIC_KEY")
            .map_err(|_| AppError::Config("APPER_PUBLIC_KEY is not set".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id,
            public_key,
        })
    }
}

/// Record store backed by the hosted record service.
pub struct HostedStore {
    client: Client,
    config: HostedConfig,
}

impl HostedStore {
    pub fn new(config: HostedConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn records_url(&self, table: &str) -> String {
        format!("{}/tables/{}/records", self.config.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.config.public_key))
            .header("X-Apper-Project-Id", &self.config.project_id)
    }

    /// Sends the request and unwraps the service envelope. A 404 maps to
    /// `not_found` when given; every other failure is an error, never an
    /// empty result.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        not_found: Option<AppError>,
    ) -> Result<Envelope<T>, AppError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            if let Some(err) = not_found {
                return Err(err);
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(format!(
                "Record service error {}: {}",
                status, body
            )));
        }

        let envelope: Envelope<T> = response.json().await?;
        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "request was not successful".to_string());
            return Err(AppError::Backend(message));
        }
        Ok(envelope)
    }

    async fn fetch_all<T: DeserializeOwned>(
        &self,
        table: &str,
        request: FetchRequest,
    ) -> Result<Vec<T>, AppError> {
        let url = format!("{}/fetch", self.records_url(table));
        let envelope: Envelope<Vec<T>> = self
            .execute(self.client.post(&url).json(&request), None)
            .await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        table: &str,
        id: i64,
        not_found: fn(i64) -> AppError,
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.records_url(table), id);
        let envelope: Envelope<T> = self
            .execute(self.client.get(&url), Some(not_found(id)))
            .await?;
        envelope.data.ok_or_else(|| not_found(id))
    }

    async fn write_one<W: serde::Serialize, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        record: W,
        action: &str,
        not_found: Option<AppError>,
    ) -> Result<T, AppError> {
        let body = RecordsRequest {
            records: vec![record],
        };
        let envelope: Envelope<T> = self.execute(request.json(&body), not_found).await?;
        single_result(envelope, action)
    }

    async fn delete_one(
        &self,
        table: &str,
        id: i64,
        not_found: fn(i64) -> AppError,
    ) -> Result<(), AppError> {
        let body = DeleteRequest {
            record_ids: vec![id],
        };
        let envelope: Envelope<serde_json::Value> = self
            .execute(
                self.client.delete(self.records_url(table)).json(&body),
                Some(not_found(id)),
            )
            .await?;

        let results = envelope.results.unwrap_or_default();
        if results.iter().any(|r| r.success) {
            return Ok(());
        }
        match results.into_iter().find_map(|r| r.message) {
            Some(message) => Err(AppError::Backend(format!(
                "Failed to delete record {}: {}",
                id, message
            ))),
            None => Err(not_found(id)),
        }
    }
}

/// First successful record of a bulk response. Any failed entry is an error.
fn single_result<T>(envelope: Envelope<T>, action: &str) -> Result<T, AppError> {
    let results = envelope.results.unwrap_or_default();
    if let Some(failed) = results.iter().find(|r| !r.success) {
        let message = failed.message.as_deref().unwrap_or("no message");
        warn!("record service rejected {}: {}", action, message);
        return Err(AppError::Backend(format!("Failed to {}: {}", action, message)));
    }
    results
        .into_iter()
        .find_map(|r| r.data)
        .ok_or_else(|| AppError::Backend(format!("Failed to {}: no record returned", action)))
}

#[async_trait]
impl RecordStore for HostedStore {
    async fn ping(&self) -> Result<(), AppError> {
        let request = FetchRequest::new(&["Id"]).limit(1);
        self.fetch_all::<serde_json::Value>(COURSE_TABLE, request)
            .await
            .map(|_| ())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let request = FetchRequest::new(COURSE_FIELDS).order_by("Id", "DESC");
        let records: Vec<CourseRecord> = self.fetch_all(COURSE_TABLE, request).await?;
        debug!("fetched {} course records", records.len());
        records.into_iter().map(Course::try_from).collect()
    }

    async fn get_course(&self, id: i64) -> Result<Course, AppError> {
        let record: CourseRecord = self
            .fetch_one(COURSE_TABLE, id, AppError::course_not_found)
            .await?;
        Course::try_from(record)
    }

    async fn create_course(&self, fields: CourseFields) -> Result<Course, AppError> {
        let record: CourseRecord = self
            .write_one(
                self.client.post(self.records_url(COURSE_TABLE)),
                CourseWrite::from_fields(None, fields),
                "create course",
                None,
            )
            .await?;
        Course::try_from(record)
    }

    async fn update_course(&self, id: i64, fields: CourseFields) -> Result<Course, AppError> {
        let record: CourseRecord = self
            .write_one(
                self.client.patch(self.records_url(COURSE_TABLE)),
                CourseWrite::from_fields(Some(id), fields),
                "update course",
                Some(AppError::course_not_found(id)),
            )
            .await?;
        Course::try_from(record)
    }

    async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        self.delete_one(COURSE_TABLE, id, AppError::course_not_found)
            .await
    }

    async fn list_assignments(&self) -> Result<Vec<Assignment>, AppError> {
        let request = FetchRequest::new(ASSIGNMENT_FIELDS).order_by("due_date_c", "ASC");
        let records: Vec<AssignmentRecord> = self.fetch_all(ASSIGNMENT_TABLE, request).await?;
        debug!("fetched {} assignment records", records.len());
        records.into_iter().map(Assignment::try_from).collect()
    }

    async fn get_assignment(&self, id: i64) -> Result<Assignment, AppError> {
        let record: AssignmentRecord = self
            .fetch_one(ASSIGNMENT_TABLE, id, AppError::assignment_not_found)
            .await?;
        Assignment::try_from(record)
    }

    async fn create_assignment(&self, req: NewAssignment) -> Result<Assignment, AppError> {
        let created_at = Utc::now();
        let draft = Assignment {
            id: 0,
            title: req.title,
            course_id: req.course_id,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            completed: req.completed,
            grade: req.grade,
            max_points: req.max_points,
            created_at,
        };
        let record: AssignmentRecord = self
            .write_one(
                self.client.post(self.records_url(ASSIGNMENT_TABLE)),
                AssignmentWrite::from_assignment(None, &draft, Some(created_at)),
                "create assignment",
                None,
            )
            .await?;
        Assignment::try_from(record)
    }

    async fn update_assignment(
        &self,
        id: i64,
        update: AssignmentUpdate,
    ) -> Result<Assignment, AppError> {
        let mut current = self.get_assignment(id).await?;
        update.apply(&mut current);

        let record: AssignmentRecord = self
            .write_one(
                self.client.patch(self.records_url(ASSIGNMENT_TABLE)),
                AssignmentWrite::from_assignment(Some(id), &current, None),
                "update assignment",
                Some(AppError::assignment_not_found(id)),
            )
            .await?;
        Assignment::try_from(record)
    }

    async fn delete_assignment(&self, id: i64) -> Result<(), AppError> {
        self.delete_one(ASSIGNMENT_TABLE, id, AppError::assignment_not_found)
            .await
    }
}
