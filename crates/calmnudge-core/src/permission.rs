//! Notification permission gate.
//!
//! The engine only ever asks two things: what the current status is, and
//! (on explicit user action) to request authorization. Platform prompts are
//! usually callback based; [`CallbackPermissionGate`] adapts them.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::{PermissionRequestError, ValidationError};

/// Notification authorization state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    #[default]
    Undetermined,
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionStatus::Undetermined => "undetermined",
            PermissionStatus::Granted => "granted",
            PermissionStatus::Denied => "denied",
        }
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "undetermined" => Ok(PermissionStatus::Undetermined),
            "granted" => Ok(PermissionStatus::Granted),
            "denied" => Ok(PermissionStatus::Denied),
            other => Err(ValidationError::InvalidValue {
                field: "permission_status".to_string(),
                message: format!("unknown status '{other}'"),
            }),
        }
    }
}

/// Authorization collaborator.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Current status. Must be quick.
    async fn current_status(&self) -> PermissionStatus;

    /// Present the authorization prompt and wait for the answer.
    ///
    /// `Ok(false)` is a user denial; `Err` is a failure of the request
    /// itself. Callers bound this with a timeout.
    async fn request_authorization(&self) -> Result<bool, PermissionRequestError>;
}

/// Answer sink handed to a platform prompt.
pub type PermissionCallback = Box<dyn FnOnce(bool) + Send>;

/// Adapts a callback-style prompt to [`PermissionGate`].
///
/// The prompt closure receives a [`PermissionCallback`] it must invoke
/// exactly once. If the callback is dropped unanswered the request fails
/// with [`PermissionRequestError::CallbackDropped`].
pub struct CallbackPermissionGate<P> {
    status: Arc<Mutex<PermissionStatus>>,
    prompt: P,
}

impl<P> CallbackPermissionGate<P>
where
    P: Fn(PermissionCallback) + Send + Sync,
{
    pub fn new(initial: PermissionStatus, prompt: P) -> Self {
        Self {
            status: Arc::new(Mutex::new(initial)),
            prompt,
        }
    }

    /// Reflect a status change observed outside the prompt (e.g. the user
    /// revoked notifications in system settings).
    pub fn set_status(&self, status: PermissionStatus) {
        *self.status.lock().unwrap_or_else(|e| e.into_inner()) = status;
    }

    fn status(&self) -> PermissionStatus {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl<P> PermissionGate for CallbackPermissionGate<P>
where
    P: Fn(PermissionCallback) + Send + Sync,
{
    async fn current_status(&self) -> PermissionStatus {
        self.status()
    }

    async fn request_authorization(&self) -> Result<bool, PermissionRequestError> {
        let (tx, rx) = oneshot::channel();
        let status = Arc::clone(&self.status);
        (self.prompt)(Box::new(move |granted| {
            *status.lock().unwrap_or_else(|e| e.into_inner()) = if granted {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            };
            let _ = tx.send(granted);
        }));
        rx.await.map_err(|_| PermissionRequestError::CallbackDropped)
    }
}
