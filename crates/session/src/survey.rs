//! Post-chat survey.

use chat_core::error::SessionErrorCode;
use chat_core::{AuthenticatedUser, Error, Result, SurveyForm, SurveyRequest};
use telemetry::metrics;
use tracing::{info, warn};

use crate::controller::ChatController;
use crate::state::{ChatPhase, Transcript};

impl ChatController {
    /// Submit the survey for the locked session, then reset to `NoSession`.
    ///
    /// A failed submission changes nothing so the user can try again.
    pub async fn submit_survey(&self, user: &AuthenticatedUser, rating: u8, notes: &str) -> Result<()> {
        let form = SurveyForm::new(rating, notes)?;
        let ticket_id = {
            let st = self.inner.state.lock();
            if !st.phase.is_closed() {
                return Err(Error::session(
                    SessionErrorCode::NoActiveSession,
                    "no closed session to review",
                ));
            }
            st.ticket_id.clone().or_else(|| self.inner.local.ticket_id())
        };

        let request = SurveyRequest::new(&form, ticket_id);
        if let Err(e) = self.inner.gateway.submit_survey(user, &request).await {
            warn!(error = %e, "Survey submission failed");
            return Err(e);
        }

        self.finish_survey();
        metrics().surveys_submitted.inc();
        info!(rating, "Survey submitted");
        Ok(())
    }

    /// Close the survey without submitting. Returns whether one was open.
    pub fn skip_survey(&self) -> bool {
        if !self.phase().is_closed() {
            return false;
        }
        self.finish_survey();
        metrics().surveys_skipped.inc();
        info!("Survey skipped");
        true
    }

    fn finish_survey(&self) {
        {
            let mut st = self.inner.state.lock();
            st.begin(ChatPhase::NoSession { expired: false }, None, Transcript::default());
            st.ticket_id = None;
        }
        self.persist(|local| local.clear_session_keys());
    }
}
