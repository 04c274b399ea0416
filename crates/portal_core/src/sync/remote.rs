//! Boundary contracts for the remote layout endpoint.
//!
//! # Responsibility
//! - Define the transport-agnostic client trait and the wire envelope.
//! - Carry transport failures as a structured, loggable error.
//!
//! # Invariants
//! - Remote failures never escape the sync layer as hard errors; they are
//!   logged and folded into `ServerFetch::Unreachable` or a failed push.

use crate::model::layout::Layout;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Remote call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStage {
    FetchLayout,
    PushLayout,
    FetchBlueprint,
}

impl RemoteStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchLayout => "fetch_layout",
            Self::PushLayout => "push_layout",
            Self::FetchBlueprint => "fetch_blueprint",
        }
    }
}

/// Structured transport error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    pub stage: RemoteStage,
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl RemoteError {
    pub fn new(
        stage: RemoteStage,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            stage,
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }

    pub fn network(stage: RemoteStage, message: impl Into<String>) -> Self {
        Self::new(stage, "network_unreachable", message, true)
    }

    pub fn unauthorized(stage: RemoteStage) -> Self {
        Self::new(stage, "unauthorized", "Session is not authenticated.", false)
    }

    /// Non-2xx response; 5xx responses are retryable.
    pub fn http_status(stage: RemoteStage, status: u16) -> Self {
        Self::new(
            stage,
            format!("http_{status}"),
            format!("Server responded with status {status}."),
            status >= 500,
        )
    }

    pub fn decode(stage: RemoteStage, message: impl Into<String>) -> Self {
        Self::new(stage, "decode_failed", message, false)
    }
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:{}] {}",
            self.stage.as_str(),
            self.code,
            self.message
        )
    }
}

impl Error for RemoteError {}

/// Body of `GET`/`PUT /user/portal-layout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEnvelope {
    #[serde(default)]
    pub layout: Option<Layout>,
}

impl RemoteEnvelope {
    /// Decodes a `GET` response body. An empty body or `null` layout means
    /// the server has no copy.
    pub fn decode(body: &str) -> Result<Option<Layout>, RemoteError> {
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str::<RemoteEnvelope>(body)
            .map(|envelope| envelope.layout)
            .map_err(|err| RemoteError::decode(RemoteStage::FetchLayout, err.to_string()))
    }

    /// Encodes a `PUT` request body.
    pub fn encode(layout: &Layout) -> Result<String, RemoteError> {
        #[derive(Serialize)]
        struct Body<'a> {
            layout: &'a Layout,
        }
        serde_json::to_string(&Body { layout })
            .map_err(|err| RemoteError::decode(RemoteStage::PushLayout, err.to_string()))
    }
}

/// Server copy as observed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFetch {
    Unreachable,
    Absent,
    Present(Layout),
}

impl ServerFetch {
    /// Folds a fetch result, logging failures.
    pub fn from_result(result: Result<Option<Layout>, RemoteError>) -> Self {
        match result {
            Ok(Some(layout)) => Self::Present(layout),
            Ok(None) => Self::Absent,
            Err(err) => {
                warn!(
                    "event=layout_fetch module=sync status=error error_code={} retryable={} error={}",
                    err.code, err.retryable, err
                );
                Self::Unreachable
            }
        }
    }
}

/// Transport for the remote layout endpoint.
pub trait RemoteLayoutClient {
    fn fetch_layout(&self) -> Result<Option<Layout>, RemoteError>;
    fn push_layout(&self, layout: &Layout) -> Result<(), RemoteError>;
}
