use crate::session::Session;
use crate::transport::{Transport, TransportError};
use crate::wire::{
    decode_response, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    ResponseError, LOGIN_PATH, REGISTER_PATH,
};
use log::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    #[error("{0}")]
    Rejected(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("unable to reach the authentication server: {0}")]
    Transport(String),
}

impl From<ResponseError> for AuthError {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::Server { status, message } => AuthError::Server { status, message },
            ResponseError::Malformed(detail) => AuthError::Transport(detail),
        }
    }
}

impl From<TransportError> for AuthError {
    fn from(err: TransportError) -> Self {
        AuthError::Transport(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub session: Session,
    pub message: String,
}

/// Client for the login and registration endpoints.
///
/// It only talks to the backend; storing the resulting session is up to the caller.
pub struct AuthClient<T> {
    transport: T,
}

impl<T: Transport> AuthClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let username = username.trim();
        require("username", username)?;
        require("password", password)?;

        let body = serde_json::to_value(LoginRequest { username, password })
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        debug!("Logging in as {username}");
        let response = self
            .transport
            .post_json(LOGIN_PATH, &body)
            .await
            .inspect_err(|e| error!("Login request failed: {e}"))?;

        let data: LoginResponse = decode_response(&response).inspect_err(|e| {
            warn!("Login rejected with status {}: {e}", response.status);
        })?;

        match (data.success, data.user_id) {
            (true, Some(user_id)) => {
                let username = data.username.unwrap_or_else(|| username.to_string());
                info!("Login succeeded for {username}");
                Ok(LoginOutcome {
                    session: Session::LoggedIn { user_id, username },
                    message: data.message,
                })
            }
            (true, None) => Err(AuthError::Rejected(
                "login response did not include a user id".to_string(),
            )),
            (false, _) => Err(AuthError::Rejected(non_empty_or(
                data.message,
                "login failed",
            ))),
        }
    }

    /// Register a new account. Returns the server's confirmation message.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<String, AuthError> {
        let username = username.trim();
        let email = email.trim();
        require("username", username)?;
        require("password", password)?;
        require("email", email)?;

        let body = serde_json::to_value(RegisterRequest {
            username,
            password,
            email,
        })
        .map_err(|e| AuthError::Transport(e.to_string()))?;

        debug!("Registering {username}");
        let response = self
            .transport
            .post_json(REGISTER_PATH, &body)
            .await
            .inspect_err(|e| error!("Registration request failed: {e}"))?;

        let data: RegisterResponse = decode_response(&response).inspect_err(|e| {
            warn!("Registration rejected with status {}: {e}", response.status);
        })?;

        if data.success == Some(false) {
            return Err(AuthError::Rejected(non_empty_or(
                data.message,
                "registration failed",
            )));
        }

        let message = non_empty_or(data.message, "Registration successful");
        Ok(format!("{message}. Please log in."))
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(())
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[tokio::test]
    async fn test_login_success() {
        let transport = MockTransport::replying(
            200,
            r#"{"userId":7,"username":"alice","message":"Login successful","success":true}"#,
        );
        let client = AuthClient::new(&transport);

        let outcome = client.login(" alice ", "secret").await.unwrap();
        assert_eq!(outcome.session.user_id(), Some(7));
        assert_eq!(outcome.message, "Login successful");

        let (path, body) = transport.last_call().unwrap();
        assert_eq!(path, LOGIN_PATH);
        assert_eq!(
            body,
            serde_json::json!({ "username": "alice", "password": "secret" })
        );
    }

    #[tokio::test]
    async fn test_login_unsuccessful_flag() {
        let transport = MockTransport::replying(
            200,
            r#"{"userId":null,"username":null,"message":"Wrong password","success":false}"#,
        );
        let client = AuthClient::new(&transport);

        let err = client.login("alice", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Wrong password");
    }

    #[tokio::test]
    async fn test_login_server_error_falls_back_to_status() {
        let transport = MockTransport::replying(500, r#"{"success":false}"#);
        let client = AuthClient::new(&transport);

        let err = client.login("alice", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Server { status: 500, .. }));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_login_non_json_error_is_transport() {
        let transport = MockTransport::replying(500, "");
        let client = AuthClient::new(&transport);

        let err = client.login("alice", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Transport(_)));
    }

    #[tokio::test]
    async fn test_login_requires_credentials() {
        let transport = MockTransport::replying(200, "{}");
        let client = AuthClient::new(&transport);

        let err = client.login("   ", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingField("username")));
        let err = client.login("alice", "").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingField("password")));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_login_network_failure() {
        let transport = MockTransport::failing();
        let client = AuthClient::new(&transport);

        let err = client.login("alice", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::Transport(_)));
    }

    #[tokio::test]
    async fn test_register_appends_login_hint() {
        let transport = MockTransport::replying(200, r#"{"message":"Registration successful"}"#);
        let client = AuthClient::new(&transport);

        let message = client
            .register("alice", "secret", "alice@example.com")
            .await
            .unwrap();
        assert_eq!(message, "Registration successful. Please log in.");

        let (path, body) = transport.last_call().unwrap();
        assert_eq!(path, REGISTER_PATH);
        assert_eq!(body["email"], "alice@example.com");
    }

    #[tokio::test]
    async fn test_register_conflict() {
        let transport = MockTransport::replying(409, r#"{"message":"Username already exists"}"#);
        let client = AuthClient::new(&transport);

        let err = client
            .register("alice", "secret", "alice@example.com")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Username already exists");
    }
}
