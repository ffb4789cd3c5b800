//! reqwest-backed webhook gateway.

use async_trait::async_trait;
use chat_core::{
    error::{AuthErrorCode, TurnErrorCode},
    AgentReply, AuthenticatedUser, Error, FeedbackRequest, LoginRequest, LoginResponse, Result,
    SurveyRequest, TurnRequest,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{debug, warn};
use url::Url;

use crate::config::WebhookConfig;
use crate::gateway::AgentGateway;

/// Resolved webhook endpoints.
#[derive(Debug, Clone)]
struct Endpoints {
    login: Url,
    chat: Url,
    feedback: Url,
    survey: Url,
}

/// Webhook gateway over HTTP.
#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
    endpoints: Endpoints,
    base_url: String,
}

impl HttpGateway {
    /// Creates a new gateway client.
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let endpoints = Endpoints {
            login: config.endpoint(&config.login_path)?,
            chat: config.endpoint(&config.chat_path)?,
            feedback: config.endpoint(&config.feedback_path)?,
            survey: config.endpoint(&config.survey_path)?,
        };

        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| Error::gateway(format!("failed to build HTTP client: {}", e)))?;

        debug!(chat = %endpoints.chat, "Created webhook gateway");

        Ok(Self {
            http,
            endpoints,
            base_url: config.base_url.clone(),
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        url: &Url,
        user: Option<&AuthenticatedUser>,
        body: &T,
    ) -> std::result::Result<Response, PostError> {
        let mut request = self.http.post(url.clone()).json(body);
        if let Some(user) = user {
            request = request.header(AUTHORIZATION, user.bearer());
        }

        let response = request.send().await.map_err(PostError::Transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostError::Status(status, body));
        }
        Ok(response)
    }
}

/// Failure of a single webhook post, before it is mapped to a coded error.
#[derive(Debug)]
enum PostError {
    Transport(reqwest::Error),
    Status(StatusCode, String),
}

impl std::fmt::Display for PostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "request failed: {}", e),
            Self::Status(status, body) if body.is_empty() => write!(f, "returned {}", status),
            Self::Status(status, body) => write!(f, "returned {}: {}", status, body),
        }
    }
}

#[async_trait]
impl AgentGateway for HttpGateway {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let response = self
            .post(&self.endpoints.login, None, request)
            .await
            .map_err(|e| match e {
                PostError::Status(status, _) if status.is_client_error() => {
                    Error::auth(AuthErrorCode::LoginRejected, "login was rejected")
                }
                other => {
                    warn!(error = %other, "Login webhook failed");
                    Error::gateway(format!("login {}", other))
                }
            })?;

        response
            .json::<LoginResponse>()
            .await
            .map_err(|e| Error::auth(AuthErrorCode::LoginRejected, format!("invalid login response: {}", e)))
    }

    async fn send_turn(&self, user: &AuthenticatedUser, request: &TurnRequest) -> Result<AgentReply> {
        let start = Instant::now();
        let response = self
            .post(&self.endpoints.chat, Some(user), request)
            .await
            .map_err(|e| Error::turn(TurnErrorCode::DispatchFailed, format!("chat turn {}", e)))?;

        let bytes = response.bytes().await.map_err(|e| {
            Error::turn(
                TurnErrorCode::DispatchFailed,
                format!("failed to read chat reply: {}", e),
            )
        })?;
        metrics()
            .turn_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        AgentReply::parse(&bytes)
    }

    async fn send_feedback(&self, user: &AuthenticatedUser, request: &FeedbackRequest) -> Result<()> {
        self.post(&self.endpoints.feedback, Some(user), request)
            .await
            .map_err(|e| Error::gateway(format!("feedback {}", e)))?;
        Ok(())
    }

    async fn submit_survey(&self, user: &AuthenticatedUser, request: &SurveyRequest) -> Result<()> {
        self.post(&self.endpoints.survey, Some(user), request)
            .await
            .map_err(|e| Error::gateway(format!("survey {}", e)))?;
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        // Any HTTP answer means the host is up; webhooks reject bare GETs.
        match self.http.get(&self.base_url).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Gateway unreachable");
                false
            }
        }
    }
}
