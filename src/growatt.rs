//! Growatt server client: login and AC-charge timetable updates

use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::DeviceError;
use crate::redact;
use crate::schedule::Schedule;

/// Growatt cloud endpoint
pub const DEFAULT_GROWATT_URL: &str = "https://server.growatt.com";

const LOGIN_PATH: &str = "/login";
const SET_PATH: &str = "/tcpSet.do";
const MIX_SET_ACTION: &str = "mixSet";

/// Authenticated session: the `Cookie` header value returned by login
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    cookie: String,
}

impl Session {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into(),
        }
    }

    pub fn cookie_header(&self) -> &str {
        &self.cookie
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cookie", &redact::cookie_header(&self.cookie))
            .finish()
    }
}

/// Inverter control surface used by the orchestrator
#[async_trait]
pub trait DeviceControl {
    /// Log in once; the session is reused for every submission in the run
    async fn login(&self) -> Result<Session, DeviceError>;

    /// Write one timetable slot
    async fn submit(&self, session: &Session, schedule: &Schedule) -> Result<(), DeviceError>;
}

/// Join the name=value part of each `Set-Cookie` header into one `Cookie` header value.
/// Returns `None` when there are no cookies.
pub fn cookie_header_from_set_cookies<'a, I>(set_cookies: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let pairs: Vec<&str> = set_cookies
        .into_iter()
        .map(|c| c.split("; ").next().unwrap_or(c))
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(format!("{};", pairs.join("; ")))
    }
}

/// Form fields for the login request
pub fn login_params(username: &str, password: &str) -> [(&'static str, String); 4] {
    [
        ("userName", username.to_string()),
        ("password", password.to_string()),
        ("validateCode", String::new()),
        ("isReadPact", "0".to_string()),
    ]
}

/// Form fields for a timetable update: action, serial, slot type, then positional params
pub fn submit_params(serial_number: &str, schedule: &Schedule) -> Vec<(String, String)> {
    let mut params = vec![
        ("action".to_string(), MIX_SET_ACTION.to_string()),
        ("serialNum".to_string(), serial_number.to_string()),
        ("type".to_string(), schedule.slot.command_type().to_string()),
    ];
    params.extend(schedule.form_params());
    params
}

/// Reply body of `tcpSet.do`
#[derive(Debug, Deserialize, PartialEq)]
pub struct SetResponse {
    pub success: bool,
    #[serde(default)]
    pub msg: Option<String>,
}

pub struct GrowattClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    serial_number: String,
}

impl GrowattClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            serial_number: serial_number.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl DeviceControl for GrowattClient {
    async fn login(&self) -> Result<Session, DeviceError> {
        info!("Logging in to Growatt as {}", redact::username(&self.username));

        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .form(&login_params(&self.username, &self.password))
            .send()
            .await?;

        let status = response.status();
        info!("POST {} {}", LOGIN_PATH, status);
        if !status.is_success() {
            return Err(DeviceError::Status {
                path: LOGIN_PATH,
                status,
            });
        }

        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok());
        let cookie = cookie_header_from_set_cookies(set_cookies).ok_or(DeviceError::NoSessionCookie)?;

        let session = Session::new(cookie);
        debug!("Session established: {:?}", session);
        Ok(session)
    }

    async fn submit(&self, session: &Session, schedule: &Schedule) -> Result<(), DeviceError> {
        info!(
            "Writing {} charge slot to inverter {}",
            schedule.slot,
            redact::serial_number(&self.serial_number)
        );

        let response = self
            .client
            .post(self.url(SET_PATH))
            .header(COOKIE, session.cookie_header())
            .form(&submit_params(&self.serial_number, schedule))
            .send()
            .await?;

        let status = response.status();
        info!("POST {} {}", SET_PATH, status);
        if !status.is_success() {
            return Err(DeviceError::Status {
                path: SET_PATH,
                status,
            });
        }

        // Empty and HTML bodies count as success; only a JSON `success: false` is a rejection
        let body = response.text().await?;
        if let Ok(reply) = serde_json::from_str::<SetResponse>(&body) {
            if !reply.success {
                return Err(DeviceError::Rejected {
                    command: schedule.slot.command_type(),
                    message: reply.msg.unwrap_or_else(|| "Unknown error".to_string()),
                });
            }
        }
        Ok(())
    }
}
