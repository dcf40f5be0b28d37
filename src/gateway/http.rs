//! reqwest implementation of the data gateway

use super::{
    ActorId, BlockStatusUpdate, BroadcastReceipt, DataGateway, FeedbackReceipt,
    FeedbackSubmission, GatewayError, GradeDistribution, OfferingDetails, OfferingScope,
    OfferingSummary, ProfessorDossier, SearchHits, SearchKind, Term, UserProfile, UserStatus,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::{Duration, Instant};

const USER_HEADER: &str = "X-Telegram-User-ID";

/// Data gateway speaking JSON over HTTP
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::request(format!("Invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::request(format!(
                "Base URL cannot carry paths: {base_url}"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Append percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::request("Base URL cannot carry paths"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
        actor: ActorId,
    ) -> Result<Option<T>, GatewayError> {
        let start = Instant::now();
        let response = request
            .header(USER_HEADER, actor.to_string())
            .send()
            .await
            .map_err(|e| {
                let err = if e.is_timeout() {
                    GatewayError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    GatewayError::network(format!("Connection failed: {e}"))
                } else {
                    GatewayError::network(format!("Request failed: {e}"))
                };
                tracing::warn!(
                    endpoint,
                    duration_ms = %start.elapsed().as_millis(),
                    error = %err,
                    "Gateway request failed"
                );
                err
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::network(format!("Failed to read response: {e}")))?;
        let duration_ms = start.elapsed().as_millis();

        if !status.is_success() {
            tracing::warn!(
                endpoint,
                status = status.as_u16(),
                duration_ms = %duration_ms,
                "Gateway returned error status"
            );
            return Err(classify_status(status, &body));
        }

        tracing::debug!(
            endpoint,
            status = status.as_u16(),
            duration_ms = %duration_ms,
            "Gateway request completed"
        );

        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| GatewayError::decode(format!("Invalid response from {endpoint}: {e}")))
    }

    async fn send_required<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
        actor: ActorId,
    ) -> Result<T, GatewayError> {
        self.send(request, endpoint, actor)
            .await?
            .ok_or_else(|| GatewayError::decode(format!("Empty response from {endpoint}")))
    }
}

/// Map a non-success status to a gateway error, keeping the service's `detail` if present.
fn classify_status(status: StatusCode, body: &str) -> GatewayError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(150).collect());
    GatewayError::http(status.as_u16(), format!("HTTP {}: {detail}", status.as_u16()))
}

#[async_trait]
impl DataGateway for HttpGateway {
    async fn search(
        &self,
        query: &str,
        kind: SearchKind,
        actor: ActorId,
    ) -> Result<SearchHits, GatewayError> {
        let segment = kind.path().trim_start_matches('/');
        let segments: Vec<&str> = segment.split('/').collect();
        let request = self.client.get(self.url(&segments)?).query(&[("q", query)]);
        Ok(match kind {
            SearchKind::Course => SearchHits::Courses(
                self.send(request, "search_course", actor)
                    .await?
                    .unwrap_or_default(),
            ),
            SearchKind::Professor => SearchHits::Professors(
                self.send(request, "search_prof", actor)
                    .await?
                    .unwrap_or_default(),
            ),
        })
    }

    async fn list_offerings(
        &self,
        scope: &OfferingScope,
        actor: ActorId,
    ) -> Result<Vec<OfferingSummary>, GatewayError> {
        let (url, endpoint) = match scope {
            OfferingScope::Course(code) => (
                self.url(&["grades", "offering", "by_course", code])?,
                "offerings_by_course",
            ),
            OfferingScope::Professor(id) => (
                self.url(&["grades", "offering", "by_prof", &id.to_string()])?,
                "offerings_by_prof",
            ),
        };
        Ok(self
            .send(self.client.get(url), endpoint, actor)
            .await?
            .unwrap_or_default())
    }

    async fn offering_details(
        &self,
        course_code: &str,
        term: &Term,
        actor: ActorId,
    ) -> Result<OfferingDetails, GatewayError> {
        let request = self
            .client
            .get(self.url(&["grades", "offering", "details"])?)
            .query(&[
                ("course_code", course_code),
                ("academic_year", term.academic_year.as_str()),
                ("semester", term.semester.as_str()),
            ]);
        self.send_required(request, "offering_details", actor).await
    }

    async fn grade_distribution(
        &self,
        offering_id: i64,
        actor: ActorId,
    ) -> Result<GradeDistribution, GatewayError> {
        let url = self.url(&["grades", "offering", &offering_id.to_string()])?;
        self.send_required(self.client.get(url), "grade_distribution", actor)
            .await
    }

    async fn professor_dossier(
        &self,
        prof_id: i64,
        actor: ActorId,
    ) -> Result<ProfessorDossier, GatewayError> {
        let url = self.url(&["professors", &prof_id.to_string(), "dossier"])?;
        self.send_required(self.client.get(url), "professor_dossier", actor)
            .await
    }

    async fn user_status(&self, user: &str, actor: ActorId) -> Result<UserStatus, GatewayError> {
        let url = self.url(&["admin", "users", user])?;
        self.send_required(self.client.get(url), "user_status", actor)
            .await
    }

    async fn set_block_status(
        &self,
        user: &str,
        update: &BlockStatusUpdate,
        actor: ActorId,
    ) -> Result<UserStatus, GatewayError> {
        let url = self.url(&["admin", "users", user, "block_status"])?;
        self.send_required(self.client.put(url).json(update), "set_block_status", actor)
            .await
    }

    async fn subscribe(&self, profile: &UserProfile) -> Result<UserStatus, GatewayError> {
        let url = self.url(&["users", "subscribe"])?;
        self.send_required(
            self.client.post(url).json(profile),
            "subscribe",
            profile.telegram_user_id,
        )
        .await
    }

    async fn unsubscribe(&self, user_id: i64) -> Result<UserStatus, GatewayError> {
        let url = self.url(&["users", &user_id.to_string(), "unsubscribe"])?;
        self.send_required(self.client.post(url), "unsubscribe", user_id)
            .await
    }

    async fn submit_feedback(
        &self,
        submission: &FeedbackSubmission,
    ) -> Result<FeedbackReceipt, GatewayError> {
        let url = self.url(&["feedback", ""])?;
        self.send_required(
            self.client.post(url).json(submission),
            "submit_feedback",
            submission.telegram_user_id,
        )
        .await
    }

    async fn enqueue_broadcast(
        &self,
        text: &str,
        actor: ActorId,
    ) -> Result<BroadcastReceipt, GatewayError> {
        let url = self.url(&["admin", "broadcast", ""])?;
        let body = json!({ "message_text": text });
        self.send_required(self.client.post(url).json(&body), "enqueue_broadcast", actor)
            .await
    }
}
