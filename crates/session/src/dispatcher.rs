//! Turn dispatcher: one user utterance, one agent reply.

use chat_core::error::SessionErrorCode;
use chat_core::limits::{
    CREATE_TICKET_UTTERANCE, MAX_UTTERANCE_LEN, NOT_SATISFIED_UTTERANCE, SATISFIED_UTTERANCE,
};
use chat_core::{AuthenticatedUser, Error, Message, Result, SessionId, TicketId, TurnRequest};
use serde::Serialize;
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::controller::ChatController;
use crate::state::{ChatEvent, ChatPhase};

/// Result of a send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The agent answered.
    Replied {
        message: Message,
        ticket_id: Option<TicketId>,
        /// The session will lock shortly
        closing: bool,
        escalation: bool,
    },
    /// A turn is already in flight; nothing was sent.
    Busy,
    /// The session changed or the controller was disposed while waiting.
    Discarded,
}

impl ChatController {
    /// Send a user utterance and apply the reply.
    ///
    /// Single-flight: while a turn is pending, further sends return
    /// [`TurnOutcome::Busy`] without a request. On failure the user message
    /// stays in the transcript and the error is returned; there is no retry.
    pub async fn send(&self, user: &AuthenticatedUser, utterance: &str) -> Result<TurnOutcome> {
        let text = utterance.trim();
        if text.is_empty() {
            return Err(Error::validation("message must not be empty"));
        }
        if text.chars().count() > MAX_UTTERANCE_LEN {
            return Err(Error::validation(format!(
                "message exceeds {} characters",
                MAX_UTTERANCE_LEN
            )));
        }

        let (session_id, user_message, generation) = {
            let mut st = self.inner.state.lock();
            if st.disposed {
                return Err(Error::internal("chat controller disposed"));
            }
            match st.phase {
                ChatPhase::Active => {}
                ChatPhase::Locked | ChatPhase::SurveyPending => {
                    return Err(Error::session(SessionErrorCode::Locked, "session is locked"));
                }
                ChatPhase::NoSession { .. } | ChatPhase::SessionRequested => {
                    return Err(Error::session(
                        SessionErrorCode::NoActiveSession,
                        "start a new chat before sending a message",
                    ));
                }
            }
            if st.awaiting_reply {
                metrics().turns_rejected_in_flight.inc();
                debug!("Turn already in flight");
                return Ok(TurnOutcome::Busy);
            }
            let Some(session_id) = st.session_id.clone() else {
                return Err(Error::session(SessionErrorCode::NoActiveSession, "no active session"));
            };

            let message = Message::user(session_id.clone(), text);
            st.transcript.push_local(message.clone());
            st.awaiting_reply = true;
            (session_id, message, st.generation)
        };

        let request = TurnRequest::new(
            user,
            text,
            Some(session_id.clone()),
            user_message.id.clone(),
        );
        metrics().turns_sent.inc();
        let result = self.inner.gateway.send_turn(user, &request).await;

        let (reply, agent_message, adopted) = {
            let mut st = self.inner.state.lock();
            if st.disposed || st.generation != generation {
                debug!(session_id = %session_id, "Discarding reply for stale session");
                return Ok(TurnOutcome::Discarded);
            }
            st.awaiting_reply = false;

            let reply = match result {
                Ok(reply) => reply,
                Err(e) => {
                    metrics().turn_failures.inc();
                    warn!(session_id = %session_id, error = %e, "Turn failed");
                    return Err(e);
                }
            };

            let current = st.session_id.clone().unwrap_or_else(|| session_id.clone());
            let agent_message = Message::agent(current.clone(), reply.response.clone());
            if !st.transcript.has_agent_reply_after(&user_message.id, &reply.response) {
                st.transcript.push_local(agent_message.clone());
            }

            let adopted = reply
                .session_id
                .clone()
                .filter(|id| id != &current);
            if let Some(ref id) = adopted {
                st.session_id = Some(id.clone());
            }
            if let Some(ref ticket_id) = reply.ticket_id {
                st.ticket_id = Some(ticket_id.clone());
            }

            if !reply.is_terminal() {
                st.agent_turns += 1;
                if st.agent_turns >= self.inner.settings.escalation_threshold {
                    st.ticket_prompt = true;
                }
                if reply.escalation {
                    st.escalation_prompt = true;
                }
            }
            (reply, agent_message, adopted)
        };

        self.persist(|local| {
            if let Some(ref id) = adopted {
                local.set_session_id(id)?;
            }
            if let Some(ref ticket_id) = reply.ticket_id {
                local.set_ticket_id(ticket_id)?;
            }
            Ok(())
        });

        if let Some(id) = adopted {
            info!(from = %session_id, to = %id, "Adopting session id from reply");
            self.attach_listener(id).await;
        }

        let closing = reply.is_terminal();
        if closing {
            info!("Reply closes the session");
            self.schedule(
                ChatEvent::TicketClosedByReply,
                self.inner.settings.reply_close_delay(),
            );
        }

        Ok(TurnOutcome::Replied {
            message: agent_message,
            ticket_id: reply.ticket_id,
            closing,
            escalation: reply.escalation,
        })
    }

    /// Answer the "are you satisfied?" question.
    pub async fn satisfaction(&self, user: &AuthenticatedUser, satisfied: bool) -> Result<TurnOutcome> {
        let utterance = if satisfied {
            SATISFIED_UTTERANCE
        } else {
            NOT_SATISFIED_UTTERANCE
        };
        self.send(user, utterance).await
    }

    /// Ask the agent to file a ticket. Clears both ticket prompts.
    pub async fn request_ticket(&self, user: &AuthenticatedUser) -> Result<TurnOutcome> {
        self.dismiss_ticket_prompt();
        self.send(user, CREATE_TICKET_UTTERANCE).await
    }

    /// Hide both ticket prompts without sending anything.
    pub fn dismiss_ticket_prompt(&self) {
        self.inner.state.lock().clear_prompts();
    }

    /// Session the next turn would be sent into.
    pub fn turn_target(&self) -> Option<SessionId> {
        let st = self.inner.state.lock();
        st.session_id.clone().filter(|_| st.phase.is_active())
    }
}
