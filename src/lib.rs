pub mod auth;
pub mod config;
pub mod controller;
pub mod render;
pub mod session;
pub mod transport;
pub mod verdict;
pub mod wire;

pub use auth::{AuthClient, AuthError, LoginOutcome};
pub use config::Config;
pub use controller::{
    AnalysisError, AnalysisFlow, DomainController, DomainFlow, EmailController, EmailFlow, Panel,
    SubmissionController, ViewState,
};
pub use render::render_view;
pub use session::{AuthGate, Session, SessionStore};
pub use transport::{HttpTransport, Transport, TransportError, WireResponse};
pub use verdict::{classify, Classification, Verdict};
pub use wire::{DomainCheckResult, EmailAnalysis};
