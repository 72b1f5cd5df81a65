//! Submission controller: validates a subject, sends exactly one analysis
//! request and folds the outcome into a `ViewState`.
//!
//! State changes are published through a `tokio::sync::watch` channel in a
//! fixed order: reset, loading, outcome (result or error), loading cleared.

use crate::session::AuthGate;
use crate::transport::{Transport, TransportError};
use crate::wire::{
    decode_response, DomainCheckRequest, DomainCheckResult, EmailAnalysis, EmailAnalyzeRequest,
    ResponseError, DOMAIN_CHECK_PATH, EMAIL_ANALYZE_PATH,
};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tokio::sync::watch;

pub const CONNECTIVITY_MESSAGE: &str =
    "unable to reach the analysis server; check your network connection or the backend service";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("empty input: please enter a domain, URL or email text")]
    EmptyInput,
    #[error("authentication required: please log in to use this feature")]
    AuthenticationRequired,
    /// Connection failure or an unreadable response. `detail` is for logs only.
    #[error("{}", CONNECTIVITY_MESSAGE)]
    Transport { detail: String },
    #[error("{message}")]
    Server { status: u16, message: String },
}

impl From<TransportError> for AnalysisError {
    fn from(err: TransportError) -> Self {
        AnalysisError::Transport {
            detail: err.to_string(),
        }
    }
}

impl From<ResponseError> for AnalysisError {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::Server { status, message } => AnalysisError::Server { status, message },
            ResponseError::Malformed(detail) => AnalysisError::Transport { detail },
        }
    }
}

/// Which of the mutually exclusive panels the view should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Idle,
    Loading,
    Result,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<R> {
    pub result: Option<R>,
    pub error: Option<AnalysisError>,
    pub is_loading: bool,
}

impl<R> Default for ViewState<R> {
    fn default() -> Self {
        Self {
            result: None,
            error: None,
            is_loading: false,
        }
    }
}

impl<R> ViewState<R> {
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    pub fn panel(&self) -> Panel {
        if self.is_loading {
            Panel::Loading
        } else if self.error.is_some() {
            Panel::Error
        } else if self.result.is_some() {
            Panel::Result
        } else {
            Panel::Idle
        }
    }
}

/// One kind of analysis: where it is sent and how its request is shaped.
pub trait AnalysisFlow {
    type Output: DeserializeOwned + Clone + Debug + PartialEq + Send + Sync;

    /// Short human name, e.g. "domain".
    fn name(&self) -> &'static str;

    fn endpoint(&self) -> &'static str;

    fn request_body(
        &self,
        subject: &str,
        user_id: i64,
    ) -> Result<serde_json::Value, serde_json::Error>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DomainFlow;

impl AnalysisFlow for DomainFlow {
    type Output = DomainCheckResult;

    fn name(&self) -> &'static str {
        "domain"
    }

    fn endpoint(&self) -> &'static str {
        DOMAIN_CHECK_PATH
    }

    fn request_body(
        &self,
        subject: &str,
        user_id: i64,
    ) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(DomainCheckRequest {
            domain: subject.trim().to_string(),
            user_id,
        })
    }
}

/// Email analysis. Optional sender and subject headers travel with the body.
#[derive(Debug, Clone, Default)]
pub struct EmailFlow {
    pub sender: Option<String>,
    pub subject: Option<String>,
}

impl AnalysisFlow for EmailFlow {
    type Output = EmailAnalysis;

    fn name(&self) -> &'static str {
        "email"
    }

    fn endpoint(&self) -> &'static str {
        EMAIL_ANALYZE_PATH
    }

    fn request_body(
        &self,
        subject: &str,
        user_id: i64,
    ) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(EmailAnalyzeRequest {
            sender: self.sender.clone(),
            subject: self.subject.clone(),
            body: subject.to_string(),
            user_id,
        })
    }
}

pub struct SubmissionController<F: AnalysisFlow, T, G> {
    flow: F,
    transport: T,
    gate: G,
    state: watch::Sender<ViewState<F::Output>>,
}

impl<F, T, G> SubmissionController<F, T, G>
where
    F: AnalysisFlow,
    T: Transport,
    G: AuthGate,
{
    pub fn new(flow: F, transport: T, gate: G) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            flow,
            transport,
            gate,
            state,
        }
    }

    pub fn flow(&self) -> &F {
        &self.flow
    }

    pub fn snapshot(&self) -> ViewState<F::Output> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<F::Output>> {
        self.state.subscribe()
    }

    /// Submit `subject` for analysis.
    ///
    /// Never fails: every outcome lands in the view state. Taking `&mut self`
    /// keeps a single request in flight per controller.
    pub async fn submit(&mut self, subject: &str) {
        let user_id = match self.check_preconditions(subject) {
            Ok(user_id) => user_id,
            Err(err) => {
                warn!("Rejected {} submission: {err}", self.flow.name());
                self.state.send_modify(|s| {
                    s.result = None;
                    s.error = Some(err);
                    s.is_loading = false;
                });
                return;
            }
        };

        self.state.send_modify(|s| {
            s.result = None;
            s.error = None;
        });
        self.state.send_modify(|s| s.is_loading = true);
        let _loading = LoadingGuard(&self.state);

        let outcome = self.execute(subject, user_id).await;
        self.state.send_modify(|s| match outcome {
            Ok(result) => s.result = Some(result),
            Err(err) => s.error = Some(err),
        });
    }

    fn check_preconditions(&self, subject: &str) -> Result<i64, AnalysisError> {
        if subject.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        self.gate
            .current_user()
            .user_id()
            .ok_or(AnalysisError::AuthenticationRequired)
    }

    async fn execute(&self, subject: &str, user_id: i64) -> Result<F::Output, AnalysisError> {
        let body = self
            .flow
            .request_body(subject, user_id)
            .map_err(|e| AnalysisError::Transport {
                detail: format!("failed to encode request: {e}"),
            })?;
        debug!(
            "Submitting {} analysis for user {user_id} ({} chars)",
            self.flow.name(),
            subject.len()
        );

        let response = self
            .transport
            .post_json(self.flow.endpoint(), &body)
            .await
            .inspect_err(|e| error!("{} analysis request failed: {e}", self.flow.name()))?;

        decode_response(&response)
            .map_err(AnalysisError::from)
            .inspect_err(|e| match e {
                AnalysisError::Server { status, message } => {
                    warn!("{} analysis rejected ({status}): {message}", self.flow.name())
                }
                AnalysisError::Transport { detail } => {
                    error!("{} analysis response unreadable: {detail}", self.flow.name())
                }
                _ => {}
            })
    }
}

/// Clears the loading flag when dropped, whatever path the submission took.
struct LoadingGuard<'a, R>(&'a watch::Sender<ViewState<R>>);

impl<R> Drop for LoadingGuard<'_, R> {
    fn drop(&mut self) {
        self.0.send_modify(|s| s.is_loading = false);
    }
}

pub type DomainController<T, G> = SubmissionController<DomainFlow, T, G>;
pub type EmailController<T, G> = SubmissionController<EmailFlow, T, G>;
