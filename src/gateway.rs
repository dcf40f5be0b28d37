//! Remote data gateway
//!
//! Typed access to the grade data service. Every call names the acting user,
//! which the HTTP implementation forwards as the `X-Telegram-User-ID` header.

mod error;
mod http;
mod types;

pub use error::{GatewayError, GatewayErrorKind};
pub use http::HttpGateway;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Identifier of the user on whose behalf a request is made
pub type ActorId = i64;

#[async_trait]
pub trait DataGateway: Send + Sync {
    async fn search(
        &self,
        query: &str,
        kind: SearchKind,
        actor: ActorId,
    ) -> Result<SearchHits, GatewayError>;

    async fn list_offerings(
        &self,
        scope: &OfferingScope,
        actor: ActorId,
    ) -> Result<Vec<OfferingSummary>, GatewayError>;

    async fn offering_details(
        &self,
        course_code: &str,
        term: &Term,
        actor: ActorId,
    ) -> Result<OfferingDetails, GatewayError>;

    async fn grade_distribution(
        &self,
        offering_id: i64,
        actor: ActorId,
    ) -> Result<GradeDistribution, GatewayError>;

    async fn professor_dossier(
        &self,
        prof_id: i64,
        actor: ActorId,
    ) -> Result<ProfessorDossier, GatewayError>;

    async fn user_status(&self, user: &str, actor: ActorId) -> Result<UserStatus, GatewayError>;

    async fn set_block_status(
        &self,
        user: &str,
        update: &BlockStatusUpdate,
        actor: ActorId,
    ) -> Result<UserStatus, GatewayError>;

    async fn subscribe(&self, profile: &UserProfile) -> Result<UserStatus, GatewayError>;

    async fn unsubscribe(&self, user_id: i64) -> Result<UserStatus, GatewayError>;

    async fn submit_feedback(
        &self,
        submission: &FeedbackSubmission,
    ) -> Result<FeedbackReceipt, GatewayError>;

    async fn enqueue_broadcast(
        &self,
        text: &str,
        actor: ActorId,
    ) -> Result<BroadcastReceipt, GatewayError>;
}

#[async_trait]
impl<T: DataGateway + ?Sized> DataGateway for Arc<T> {
    async fn search(
        &self,
        query: &str,
        kind: SearchKind,
        actor: ActorId,
    ) -> Result<SearchHits, GatewayError> {
        (**self).search(query, kind, actor).await
    }

    async fn list_offerings(
        &self,
        scope: &OfferingScope,
        actor: ActorId,
    ) -> Result<Vec<OfferingSummary>, GatewayError> {
        (**self).list_offerings(scope, actor).await
    }

    async fn offering_details(
        &self,
        course_code: &str,
        term: &Term,
        actor: ActorId,
    ) -> Result<OfferingDetails, GatewayError> {
        (**self).offering_details(course_code, term, actor).await
    }

    async fn grade_distribution(
        &self,
        offering_id: i64,
        actor: ActorId,
    ) -> Result<GradeDistribution, GatewayError> {
        (**self).grade_distribution(offering_id, actor).await
    }

    async fn professor_dossier(
        &self,
        prof_id: i64,
        actor: ActorId,
    ) -> Result<ProfessorDossier, GatewayError> {
        (**self).professor_dossier(prof_id, actor).await
    }

    async fn user_status(&self, user: &str, actor: ActorId) -> Result<UserStatus, GatewayError> {
        (**self).user_status(user, actor).await
    }

    async fn set_block_status(
        &self,
        user: &str,
        update: &BlockStatusUpdate,
        actor: ActorId,
    ) -> Result<UserStatus, GatewayError> {
        (**self).set_block_status(user, update, actor).await
    }

    async fn subscribe(&self, profile: &UserProfile) -> Result<UserStatus, GatewayError> {
        (**self).subscribe(profile).await
    }

    async fn unsubscribe(&self, user_id: i64) -> Result<UserStatus, GatewayError> {
        (**self).unsubscribe(user_id).await
    }

    async fn submit_feedback(
        &self,
        submission: &FeedbackSubmission,
    ) -> Result<FeedbackReceipt, GatewayError> {
        (**self).submit_feedback(submission).await
    }

    async fn enqueue_broadcast(
        &self,
        text: &str,
        actor: ActorId,
    ) -> Result<BroadcastReceipt, GatewayError> {
        (**self).enqueue_broadcast(text, actor).await
    }
}
