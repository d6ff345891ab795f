// Turning a render result into something on disk or on screen. The
// service's payload shape is loose, so the lookup here is limited to the
// handful of places the asset is known to live: `data.content` first, then
// `url` and `data` for hosted links.

use crate::api::RenderResult;
use crate::request::{OutputFormat, ResponseType};
use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// What to do with a render result.
#[derive(Debug, PartialEq)]
pub enum OutputPlan<'a> {
    /// `--json`: print the payload as-is.
    PrintJson(&'a Value),
    /// The service will call the webhook; nothing to save.
    Webhook(&'a str),
    /// Hosted asset(s), one URL per page.
    Urls(Vec<String>),
    /// Base64 content, one string per page.
    Decode(Vec<&'a str>),
    /// Raw asset bytes.
    Write(&'a [u8]),
}

/// Decide how to handle `result`. A webhook always wins over saving, since
/// the synchronous payload carries no asset in that case.
pub fn plan_output<'a>(
    result: &'a RenderResult,
    response_type: ResponseType,
    webhook: Option<&'a str>,
    json: bool,
) -> Result<OutputPlan<'a>> {
    if let (true, RenderResult::Json(value)) = (json, result) {
        return Ok(OutputPlan::PrintJson(value));
    }
    if let Some(url) = webhook {
        return Ok(OutputPlan::Webhook(url));
    }

    match (response_type, result) {
        (ResponseType::Url, RenderResult::Json(value)) => {
            let urls = result_urls(value);
            if urls.is_empty() {
                bail!("Response did not contain a URL");
            }
            Ok(OutputPlan::Urls(urls))
        }
        (ResponseType::Url, RenderResult::Binary(bytes)) => {
            bail!("Expected a URL but received {} bytes of binary data", bytes.len())
        }
        (_, RenderResult::Binary(bytes)) => Ok(OutputPlan::Write(bytes)),
        (_, RenderResult::Json(value)) => {
            let pieces = inline_content(value);
            if pieces.is_empty() {
                bail!("Response did not contain any image data");
            }
            Ok(OutputPlan::Decode(pieces))
        }
    }
}

/// Inline content at `data.content`, else the payload itself when it is a
/// string. Multi-page output comes as a sequence.
pub fn inline_content(value: &Value) -> Vec<&str> {
    let content = value.get("data").and_then(|d| d.get("content")).unwrap_or(value);
    strings_in(content)
}

/// URLs at `data.content`, else `url`, else `data`, else the payload
/// itself.
pub fn result_urls(value: &Value) -> Vec<String> {
    let content = value.get("data").and_then(|d| d.get("content"));
    [content, value.get("url"), value.get("data"), Some(value)]
        .into_iter()
        .flatten()
        .map(strings_in)
        .find(|urls| !urls.is_empty())
        .unwrap_or_default()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn strings_in(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) if !s.is_empty() => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Decode base64 content, tolerating a `data:<mime>;base64,` prefix.
pub fn decode_base64(content: &str) -> Result<Vec<u8>> {
    let content = content.trim();
    let encoded = match content.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,").map_or(content, |(_, data)| data),
        None => content,
    };
    STANDARD
        .decode(encoded)
        .context("Response content is not valid base64")
}

/// Write decoded pages to `path`. A single page goes to `path` itself;
/// several pages go to `<stem>-<n>.<ext>`, numbered from 1.
pub fn save_pages(pages: &[Vec<u8>], path: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(pages.len());
    for (index, bytes) in pages.iter().enumerate() {
        let target = if pages.len() == 1 {
            path.to_path_buf()
        } else {
            numbered_path(path, index + 1)
        };
        fs::write(&target, bytes).with_context(|| format!("Failed to save {}", target.display()))?;
        written.push(target);
    }
    Ok(written)
}

fn numbered_path(path: &Path, n: usize) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("orshot");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}-{}.{}", stem, n, ext),
        None => format!("{}-{}", stem, n),
    };
    path.with_file_name(name)
}

/// `<prefix>-<template id>-<unix millis>.<format>`.
pub fn default_filename(prefix: &str, template_id: &str, format: OutputFormat) -> PathBuf {
    let millis = chrono::Utc::now().timestamp_millis();
    PathBuf::from(format!("{}-{}-{}.{}", prefix, template_id, millis, format))
}
