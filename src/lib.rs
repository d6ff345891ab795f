// Library root
// -----------
// The `orshot` binary is a thin wrapper around these modules, which keeps
// the request building and response handling testable without a terminal.
//
// Module responsibilities:
// - `api`: blocking HTTP client for the Orshot API, error classification
//   and response normalization.
// - `request`: render request bodies and `key=value` parsing.
// - `output`: unwrapping render results and saving assets.
// - `config`: the credential file.
// - `error`: the API error taxonomy.
// - `cli`, `commands`, `ui`: argument parsing, command handlers and the
//   terminal-facing pieces they use.
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod request;
pub mod ui;

pub use api::{ApiClient, RenderResult};
pub use config::{CredentialStore, Credentials, UserProfile};
pub use error::{ApiError, ApiResult};
