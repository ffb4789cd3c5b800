//! Gateway interface to the remote agent.

use async_trait::async_trait;
use chat_core::{
    AgentReply, AuthenticatedUser, FeedbackRequest, LoginRequest, LoginResponse, Result,
    SurveyRequest, TurnRequest,
};

/// The agent's webhook endpoints. Every call is one request and one reply.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Exchange a login form for a credential. Rejections are AUTH_003.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    /// Send one user turn and await the normalized reply.
    ///
    /// Transport failures are TURN_001, unusable payloads TURN_002.
    async fn send_turn(&self, user: &AuthenticatedUser, request: &TurnRequest) -> Result<AgentReply>;

    async fn send_feedback(&self, user: &AuthenticatedUser, request: &FeedbackRequest) -> Result<()>;

    async fn submit_survey(&self, user: &AuthenticatedUser, request: &SurveyRequest) -> Result<()>;

    /// Whether the gateway host answers at all.
    async fn is_healthy(&self) -> bool;
}
