//! Per-message feedback.

use chat_core::{AuthenticatedUser, FeedbackRating, FeedbackRequest, MessageId, Result};
use serde::Serialize;
use telemetry::metrics;
use tracing::{debug, warn};

use crate::controller::ChatController;

/// What the caller is told about a feedback submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedbackOutcome {
    /// The gateway accepted it
    pub delivered: bool,
    /// A failure was reported as success
    pub masked: bool,
}

impl ChatController {
    /// Rate one agent message. Fire and forget from the user's point of view:
    /// with `mask_feedback_errors` set, a gateway failure still reads as done.
    pub async fn send_feedback(
        &self,
        user: &AuthenticatedUser,
        message_id: MessageId,
        rating: FeedbackRating,
    ) -> Result<FeedbackOutcome> {
        let request = FeedbackRequest { message_id, rating };
        match self.inner.gateway.send_feedback(user, &request).await {
            Ok(()) => {
                metrics().feedback_sent.inc();
                debug!(message_id = %request.message_id, "Feedback sent");
                Ok(FeedbackOutcome {
                    delivered: true,
                    masked: false,
                })
            }
            Err(e) if self.inner.settings.mask_feedback_errors => {
                metrics().feedback_masked.inc();
                warn!(message_id = %request.message_id, error = %e, "Feedback failed, reporting success");
                Ok(FeedbackOutcome {
                    delivered: false,
                    masked: true,
                })
            }
            Err(e) => Err(e),
        }
    }
}
