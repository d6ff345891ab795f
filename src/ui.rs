// UI layer: console styling, interactive prompts (dialoguer) and the
// listings printed by the template commands. Nothing in here talks to the
// network; the handlers in `commands` pass data in.

use crate::api::{ModificationSpec, Template};
use crate::config::{Credentials, UserProfile};
use crate::request::Modifications;
use anyhow::{bail, Result};
use crossterm::style::Stylize;
use dialoguer::{Input, Password};

pub fn info(message: &str) {
    println!("{}", message.blue());
}

pub fn success(message: &str) {
    println!("{}", message.green());
}

pub fn warn(message: &str) {
    println!("{}", message.yellow());
}

/// Indented grey line, used for secondary details.
pub fn detail(message: &str) {
    println!("{}", format!("   {}", message).dark_grey());
}

/// Prompt for an API key with masked input. Empty input is rejected.
pub fn prompt_api_key() -> Result<String> {
    let key: String = Password::new()
        .with_prompt("Enter your Orshot API key")
        .interact()?;
    let key = key.trim().to_string();
    if key.is_empty() {
        bail!("API key is required");
    }
    Ok(key)
}

/// Ask for a value for each modification, offering the value already given
/// on the command line as the default. Returns `(name, answer)` pairs in
/// spec order; blank answers are returned as-is for the caller to skip.
pub fn prompt_modifications(
    specs: &[ModificationSpec],
    current: &Modifications,
) -> Result<Vec<(String, String)>> {
    let mut answers = Vec::with_capacity(specs.len());
    for spec in specs.iter().filter(|s| !s.name().is_empty()) {
        let name = spec.name().to_string();
        let mut input = Input::<String>::new();
        input.with_prompt(format!("{}:", spec.label())).allow_empty(true);
        if let Some(existing) = current.get(&name) {
            input.default(existing.clone());
        }
        let answer = input.interact_text()?;
        answers.push((name, answer));
    }
    Ok(answers)
}

pub fn print_user(user: &UserProfile, creds: &Credentials, show_key: bool) {
    let or = |value: &str, fallback: &'static str| -> String {
        if value.is_empty() {
            fallback.to_string()
        } else {
            value.to_string()
        }
    };
    detail(&format!("User ID: {}", or(user.user_id.as_str(), "Unknown")));
    detail(&format!("Name: {}", or(user.name.as_str(), "Not available")));
    detail(&format!("Email: {}", or(user.email.as_str(), "Not available")));
    detail(&format!("Domain: {}", creds.domain));
    if show_key {
        detail(&format!("API Key: {}", creds.masked_api_key()));
    }
}

/// Numbered template listing, truncated to `limit` entries.
pub fn print_templates(heading: &str, templates: &[Template], limit: usize) {
    println!("{}", format!("{} ({}):", heading, templates.len()).green());
    println!();

    for (index, template) in templates.iter().take(limit).enumerate() {
        println!("{} {}", format!("{}.", index + 1).blue(), template.display_name().bold());
        println!("   {} {}", "ID:".dark_grey(), template.id);
        if let Some(description) = template.description.as_deref().filter(|d| !d.is_empty()) {
            println!("   {} {}", "Description:".dark_grey(), description);
        }
        let count = template.modification_count();
        if count > 0 {
            println!("   {} {} available", "Modifications:".dark_grey(), count);
        }
        println!();
    }

    if templates.len() > limit {
        warn(&format!("... and {} more templates", templates.len() - limit));
        println!("{}", format!("Use --limit {} to see all templates", templates.len()).dark_grey());
    }
}

pub fn print_modification_specs(specs: &[ModificationSpec]) {
    for (index, spec) in specs.iter().enumerate() {
        println!("{} {}", format!("{}.", index + 1).blue(), spec.name().bold());
        if let Some(description) = spec.description.as_deref().filter(|d| !d.is_empty()) {
            println!("   {} {}", "Description:".dark_grey(), description);
        }
        if let Some(kind) = spec.kind.as_deref() {
            println!("   {} {}", "Type:".dark_grey(), kind);
        }
        println!();
    }
}

pub fn print_used_modifications(heading: &str, mods: &Modifications) {
    if mods.is_empty() {
        return;
    }
    println!("{}", heading.dark_grey());
    for (key, value) in mods {
        detail(&format!("{}: {}", key, value));
    }
}
