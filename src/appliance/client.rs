//! FreeNAS Appliance Client
//!
//! Builds authenticated requests against the appliance API root, sends
//! them through a [`Transport`] and classifies what comes back into a
//! [`CommandOutcome`].
//!
//! Failures reach the caller on two paths: a returned outcome with status
//! `error` (HTTP error status, connection failure) or an `Err` for anything
//! the transport could not classify. Callers handle both.

use crate::appliance::metrics::ApplianceMetrics;
use crate::config::{AuthStyle, DriverConfig, TransportScheme};
use crate::domain::ports::{
    ApplianceRequest, ApplianceResponse, HttpMethod, TransportError, TransportRef,
};
use crate::error::{Error, Result};
use base64::{engine::general_purpose, Engine};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

// =============================================================================
// API Resources
// =============================================================================

pub const REST_API_VOLUME: &str = "/storage/volume";
pub const DATASETS: &str = "datasets";
pub const REST_API_SHARE: &str = "/sharing/nfs";
pub const REST_API_SNAPSHOT: &str = "/storage/snapshot";
pub const CLONE: &str = "clone";

// =============================================================================
// Connection Descriptor
// =============================================================================

/// Where the appliance lives and how to authenticate against it
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_version: String,
    pub scheme: TransportScheme,
    pub auth_style: AuthStyle,
}

impl ConnectionDescriptor {
    pub fn from_config(config: &DriverConfig) -> Self {
        Self {
            host: config.hostname.clone(),
            port: config.port,
            username: config.login.clone(),
            password: config.password.clone(),
            api_version: config.api_version.clone(),
            scheme: config.transport_type,
            auth_style: config.auth_style,
        }
    }

    /// API root, e.g. `http://nas:3000/api/v1.0`
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}/api/{}",
            self.scheme, self.host, self.port, self.api_version
        )
    }

    /// `Authorization` header value
    fn authorization(&self) -> Result<String> {
        let (username, password) = match (&self.username, &self.password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
            _ => return Err(Error::MissingCredentials),
        };

        match self.auth_style {
            AuthStyle::BasicAuth => {
                let token = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
                Ok(format!("Basic {}", token))
            }
        }
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("scheme", &self.scheme)
            .field("auth_style", &self.auth_style)
            .finish()
    }
}

// =============================================================================
// Commands and Outcomes
// =============================================================================

/// Appliance command verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Select,
    Create,
    Update,
    Delete,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Select => "select",
            Command::Create => "create",
            Command::Update => "update",
            Command::Delete => "delete",
        }
    }

    pub fn method(&self) -> HttpMethod {
        match self {
            Command::Select => HttpMethod::Get,
            Command::Create => HttpMethod::Post,
            Command::Update => HttpMethod::Put,
            Command::Delete => HttpMethod::Delete,
        }
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "select" => Ok(Command::Select),
            "create" => Ok(Command::Create),
            "update" => Ok(Command::Update),
            "delete" => Ok(Command::Delete),
            other => Err(Error::UnsupportedCommand(other.to_string())),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    Error,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Ok => "ok",
            CommandStatus::Error => "error",
        }
    }
}

/// Result of one appliance invocation
///
/// The payload is only reachable through [`CommandOutcome::into_result`],
/// which turns an `error` status into [`Error::Appliance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    status: CommandStatus,
    response: String,
}

impl CommandOutcome {
    pub fn ok(response: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Ok,
            response: response.into(),
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Error,
            response: reason.into(),
        }
    }

    pub fn status(&self) -> CommandStatus {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == CommandStatus::Ok
    }

    /// Raw body on `ok`; on `error` an appliance error whose message is
    /// `<context>: <code>:<reason>`
    pub fn into_result(self, context: &str) -> Result<String> {
        match self.status {
            CommandStatus::Ok => Ok(self.response),
            CommandStatus::Error => Err(Error::appliance(format!("{}: {}", context, self.response))),
        }
    }
}

impl std::fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.status.as_str(), self.response)
    }
}

// =============================================================================
// Appliance Client
// =============================================================================

/// One authenticated round trip per call against the appliance API
pub struct ApplianceClient {
    connection: ConnectionDescriptor,
    transport: TransportRef,
    metrics: Option<Arc<ApplianceMetrics>>,
}

impl std::fmt::Debug for ApplianceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplianceClient")
            .field("connection", &self.connection)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl ApplianceClient {
    pub fn new(connection: ConnectionDescriptor, transport: TransportRef) -> Self {
        Self {
            connection,
            transport,
            metrics: None,
        }
    }

    /// Record every invocation into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<ApplianceMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn connection(&self) -> &ConnectionDescriptor {
        &self.connection
    }

    /// Invoke a command given by its textual verb
    ///
    /// Credentials are checked before the verb, so a client without
    /// credentials reports [`Error::MissingCredentials`] either way.
    pub async fn invoke_raw(
        &self,
        command: &str,
        path: &str,
        body: Option<String>,
    ) -> Result<CommandOutcome> {
        self.connection.authorization()?;
        let command = command.parse::<Command>()?;
        self.invoke(command, path, body).await
    }

    /// Send `command` against `path` (relative to the API root)
    pub async fn invoke(
        &self,
        command: Command,
        path: &str,
        body: Option<String>,
    ) -> Result<CommandOutcome> {
        let request = self.build_request(command, path, body)?;
        debug!("url : {}", request.url);
        debug!("param list : {:?}", request.body);

        let started = Instant::now();
        let result = self.transport.send(request).await;
        let outcome = classify(result);

        if let Some(metrics) = &self.metrics {
            let status = match &outcome {
                Ok(o) => o.status().as_str(),
                Err(_) => "failed",
            };
            metrics.observe(command, status, started.elapsed());
        }

        match &outcome {
            Ok(o) if o.is_ok() => debug!("invoke_command : response for request {} : {}", path, o),
            Ok(o) => warn!("{} {} returned {}", command, path, o),
            Err(e) => warn!("{} {} failed: {}", command, path, e),
        }

        outcome
    }

    fn build_request(
        &self,
        command: Command,
        path: &str,
        body: Option<String>,
    ) -> Result<ApplianceRequest> {
        let authorization = self.connection.authorization()?;

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Authorization".to_string(), authorization);

        Ok(ApplianceRequest {
            method: command.method(),
            url: format!("{}{}", self.connection.base_url(), path),
            headers,
            body,
        })
    }
}

/// Map a transport result onto an outcome; only unclassified failures
/// escape as errors
fn classify(
    result: std::result::Result<ApplianceResponse, TransportError>,
) -> Result<CommandOutcome> {
    match result {
        Ok(response) if response.is_success() => Ok(CommandOutcome::ok(response.body)),
        Ok(response) => Ok(CommandOutcome::error(format!(
            "{}:{}",
            response.status,
            response.reason.unwrap_or_default()
        ))),
        Err(TransportError::Connection { errno, reason }) => {
            let code = errno
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Ok(CommandOutcome::error(format!("{}:{}", code, reason)))
        }
        Err(TransportError::Unclassified(cause)) => Err(Error::Appliance {
            code: "Unexpected error".to_string(),
            message: cause,
        }),
    }
}
