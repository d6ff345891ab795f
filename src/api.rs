// API client module: a small blocking HTTP client that talks to the Orshot
// API. It owns header construction, error classification and the light
// normalization of the few responses whose shape varies upstream.
// Credentials are handed in by the caller; the client never reads the
// credential file itself.

use crate::config::{Credentials, UserProfile};
use crate::error::{ApiError, ApiResult};
use crate::request::{
    LibraryRenderRequest, Modifications, RenderOptions, StudioOptions, StudioRenderRequest,
};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

pub const USER_ENDPOINT: &str = "/v1/me/user_id";
pub const LIBRARY_TEMPLATES_ENDPOINT: &str = "/v1/templates";
pub const STUDIO_TEMPLATES_ENDPOINT: &str = "/v1/studio/templates";
pub const LIBRARY_RENDER_ENDPOINT: &str = "/v1/generate/images";
pub const STUDIO_RENDER_ENDPOINT: &str = "/v1/studio/render";

/// Sent as `User-Agent` on every request.
pub const CLIENT_ID: &str = concat!("orshot-cli/", env!("CARGO_PKG_VERSION"));

/// Studio renders may include video encoding, so the default is generous.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const TIMEOUT_ENV: &str = "ORSHOT_TIMEOUT_SECS";

/// Library modification lookup. The library endpoint names its parameter
/// `template_id`.
pub fn library_modifications_path(template_id: &str) -> String {
    format!("/v1/templates/modifications?template_id={}", template_id)
}

/// Studio modification lookup. The studio endpoint names its parameter
/// `templateId`.
pub fn studio_modifications_path(template_id: &str) -> String {
    format!("/v1/studio/template/modifications?templateId={}", template_id)
}

/// A remote template, library or studio. Unknown fields are kept so that
/// `--json` output passes them through.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Template {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifications: Option<Vec<ModificationSpec>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Template {
    /// Library templates carry a `title`, studio templates a `name`.
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("Untitled")
    }

    pub fn modification_count(&self) -> usize {
        self.modifications.as_ref().map_or(0, Vec::len)
    }
}

/// One customizable field on a template. Library specs are keyed by `key`,
/// studio specs by `id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ModificationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string_or_number")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModificationSpec {
    pub fn name(&self) -> &str {
        self.key.as_deref().or(self.id.as_deref()).unwrap_or("")
    }

    /// Prompt label: the description when there is one, the name otherwise.
    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.name())
    }
}

/// What a render call returned: a JSON payload (inline content or URLs)
/// or the raw bytes of the asset.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderResult {
    Json(Value),
    Binary(Vec<u8>),
}

impl RenderResult {
    /// JSON when the body parses as JSON and the server did not label it
    /// as something else; raw bytes otherwise.
    pub fn decode(content_type: Option<&str>, body: Vec<u8>) -> Self {
        let maybe_json = content_type.map_or(true, |ct| ct.contains("json"));
        if maybe_json {
            if let Ok(value) = serde_json::from_slice(&body) {
                return RenderResult::Json(value);
            }
        }
        RenderResult::Binary(body)
    }
}

struct RawResponse {
    content_type: Option<String>,
    body: Vec<u8>,
}

/// Blocking client for the Orshot API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    /// Build a client for the given credentials. The timeout comes from
    /// `ORSHOT_TIMEOUT_SECS` when set, `DEFAULT_TIMEOUT` otherwise.
    pub fn new(credentials: &Credentials) -> ApiResult<Self> {
        let timeout = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        Self::with_timeout(credentials, timeout)
    }

    pub fn with_timeout(credentials: &Credentials, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Unknown(format!("Failed to build HTTP client: {}", e)))?;
        Ok(ApiClient {
            client,
            base_url: credentials.domain.trim_end_matches('/').to_string(),
            api_key: credentials.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bearer authorization, JSON content type and the client identifier.
    pub fn headers(&self) -> ApiResult<HeaderMap> {
        let key = self.api_key.as_deref().ok_or(ApiError::Authentication)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|_| ApiError::Unknown("API key contains invalid header characters".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_ID));
        Ok(headers)
    }

    /// Issue one request and return the parsed JSON body. Empty bodies
    /// come back as `Value::Null`, non-JSON bodies as a string.
    pub fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        show_spinner: bool,
    ) -> ApiResult<Value> {
        let raw = self.send(method, endpoint, body, show_spinner)?;
        if raw.body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&raw.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&raw.body).into_owned())))
    }

    pub fn get_current_user(&self) -> ApiResult<UserProfile> {
        let payload = self.request(Method::GET, USER_ENDPOINT, None, true)?;
        Ok(normalize_user(&payload))
    }

    pub fn get_library_templates(&self) -> ApiResult<Vec<Template>> {
        self.get_list(LIBRARY_TEMPLATES_ENDPOINT)
    }

    pub fn get_studio_templates(&self) -> ApiResult<Vec<Template>> {
        self.get_list(STUDIO_TEMPLATES_ENDPOINT)
    }

    pub fn get_library_template_modifications(
        &self,
        template_id: &str,
    ) -> ApiResult<Vec<ModificationSpec>> {
        self.get_list(&library_modifications_path(template_id))
    }

    pub fn get_studio_template_modifications(
        &self,
        template_id: &str,
    ) -> ApiResult<Vec<ModificationSpec>> {
        self.get_list(&studio_modifications_path(template_id))
    }

    pub fn generate_from_library(
        &self,
        template_id: &str,
        modifications: Modifications,
        options: &RenderOptions,
    ) -> ApiResult<RenderResult> {
        let body = LibraryRenderRequest::new(template_id, modifications, options);
        self.render(LIBRARY_RENDER_ENDPOINT, &body)
    }

    pub fn generate_from_studio(
        &self,
        template_id: &str,
        modifications: Modifications,
        options: &StudioOptions,
    ) -> ApiResult<RenderResult> {
        let body = StudioRenderRequest::new(template_id, modifications, options);
        self.render(STUDIO_RENDER_ENDPOINT, &body)
    }

    fn render<B: Serialize>(&self, endpoint: &str, body: &B) -> ApiResult<RenderResult> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Unknown(format!("Failed to encode request body: {}", e)))?;
        let raw = self.send(Method::POST, endpoint, Some(&body), true)?;
        Ok(RenderResult::decode(raw.content_type.as_deref(), raw.body))
    }

    fn get_list<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> ApiResult<Vec<T>> {
        match self.request(Method::GET, endpoint, None, true)? {
            Value::Null => Ok(Vec::new()),
            value => serde_json::from_value(value).map_err(|e| {
                ApiError::Unknown(format!("Unexpected response from {}: {}", endpoint, e))
            }),
        }
    }

    fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        show_spinner: bool,
    ) -> ApiResult<RawResponse> {
        let spinner = if show_spinner { Some(start_spinner("Making request...")) } else { None };
        let result = self.dispatch(method, endpoint, body);
        if let Some(spinner) = spinner {
            match &result {
                Ok(_) => spinner.finish_with_message("Request completed"),
                Err(_) => spinner.abandon_with_message("Request failed"),
            }
        }
        if let Err(e) = &result {
            log::debug!("{} failed ({})", endpoint, e.category());
        }
        result
    }

    fn dispatch(&self, method: Method, endpoint: &str, body: Option<&Value>) -> ApiResult<RawResponse> {
        let headers = self.headers()?;
        let url = format!("{}{}", self.base_url, endpoint);
        log::debug!("{} {}", method, url);

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().map_err(classify_transport)?;
        let status = res.status();
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = res.bytes().map_err(classify_transport)?;
        log::debug!("<- {} ({} bytes)", status, bytes.len());

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &bytes));
        }
        Ok(RawResponse {
            content_type,
            body: bytes.to_vec(),
        })
    }
}

fn start_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Map a non-2xx status to its error category. The body only matters for
/// statuses without a category of their own.
pub fn classify_status(status: u16, body: &[u8]) -> ApiError {
    match status {
        401 => ApiError::Unauthorized,
        403 => ApiError::Forbidden,
        404 => ApiError::NotFound,
        429 => ApiError::RateLimited,
        _ => ApiError::Upstream {
            status,
            message: upstream_message(body).unwrap_or_else(|| format!("HTTP {} error", status)),
        },
    }
}

/// The `error` field of a JSON error body, else its `message` field.
pub fn upstream_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["error", "message"].iter().find_map(|field| {
        value
            .get(*field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn classify_transport(err: reqwest::Error) -> ApiError {
    if err.is_builder() {
        ApiError::Unknown(err.to_string())
    } else if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
        ApiError::Network(err)
    } else {
        ApiError::Unknown(err.to_string())
    }
}

/// Normalize the identity response. The profile may sit under `data` or at
/// the top level, with `user_id`/`id` and `name`/`full_name` as aliases.
/// Anything unrecognizable yields the default profile.
pub fn normalize_user(payload: &Value) -> UserProfile {
    let source = match payload.get("data") {
        Some(data) if data.is_object() => data,
        _ => payload,
    };
    let Some(fields) = source.as_object() else {
        return UserProfile::default();
    };
    let first = |names: &[&str]| names.iter().find_map(|n| fields.get(*n).and_then(scalar_string));

    UserProfile {
        user_id: first(&["user_id", "id"]).unwrap_or_else(|| "Unknown".into()),
        email: first(&["email"]).unwrap_or_default(),
        name: first(&["name", "full_name"]).unwrap_or_default(),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(opt_string_or_number(deserializer)?.unwrap_or_default())
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
