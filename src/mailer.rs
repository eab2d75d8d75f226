use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::ApiError;

// 1. MailService Contract
/// MailService
///
/// Abstract contract for delivering confirmation codes out-of-band. Actual
/// mail transport is an external collaborator; this trait is the seam that
/// lets the signup handler stay transport-agnostic and lets tests capture
/// the plaintext code instead of sending anything.
#[async_trait]
pub trait MailService: Send + Sync {
    /// Sends the one-time confirmation code to the given address.
    async fn send_confirmation_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), ApiError>;
}

// 2. The Log-Backed Implementation
/// LogMailer
///
/// Writes the outgoing message to the structured log instead of a wire.
/// Suitable for local development and for deployments where an external
/// relay tails the log stream; swapping in a real SMTP client only requires
/// another MailService implementation.
#[derive(Clone)]
pub struct LogMailer {
    from_email: String,
}

impl LogMailer {
    pub fn new(from_email: &str) -> Self {
        Self {
            from_email: from_email.to_string(),
        }
    }
}

#[async_trait]
impl MailService for LogMailer {
    async fn send_confirmation_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), ApiError> {
        tracing::info!(
            from = %self.from_email,
            to = %email,
            username = %username,
            "confirmation code issued: use this code to get an access token: {code}"
        );
        Ok(())
    }
}

// 3. The Mock Implementation (For Tests)
/// MockMailer
///
/// Records the last code handed to it so tests can drive the full
/// signup → token exchange loop without any delivery machinery.
#[derive(Clone, Default)]
pub struct MockMailer {
    /// When true, all sends return a simulated failure.
    pub should_fail: bool,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// The (email, code) pair of the most recent send, if any.
    pub fn last_sent(&self) -> Option<(String, String)> {
        self.sent.lock().expect("mailer mutex poisoned").last().cloned()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("mailer mutex poisoned").len()
    }
}

#[async_trait]
impl MailService for MockMailer {
    async fn send_confirmation_code(
        &self,
        email: &str,
        _username: &str,
        code: &str,
    ) -> Result<(), ApiError> {
        if self.should_fail {
            return Err(ApiError::internal("Mock mailer: simulated failure"));
        }
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}

/// MailerState
///
/// The concrete type used to share mail delivery across the application state.
pub type MailerState = Arc<dyn MailService>;
