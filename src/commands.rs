// Command handlers. Each one loads credentials, builds an `ApiClient`
// from them and wires API results to the UI. Errors are returned with
// context; `main` prints them and picks the exit code.

use crate::api::{ApiClient, ModificationSpec};
use crate::cli::{
    AuthCommand, Cli, Commands, CommonRenderArgs, GenerateCommand, LibraryArgs, ListArgs,
    StudioArgs, TemplateKind, TemplatesCommand,
};
use crate::config::{CredentialStore, Credentials};
use crate::error::{ApiError, ApiResult};
use crate::output::{self, OutputPlan};
use crate::request::{
    merge_answers, parse_modifications, Modifications, RenderOptions, StudioOptions,
};
use crate::ui;
use anyhow::{bail, Context, Result};
use crossterm::style::Stylize;
use reqwest::Method;
use std::path::Path;

const PREVIEW_CHARS: usize = 500;

/// Error context that carries a follow-up hint for `report_error`.
#[derive(Debug)]
struct Hinted {
    message: &'static str,
    hint: &'static str,
}

impl std::fmt::Display for Hinted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message)
    }
}

pub fn run(cli: Cli, store: &CredentialStore) -> Result<()> {
    match cli.command {
        Commands::Auth(AuthCommand::Login { api_key, domain }) => login(store, api_key, domain),
        Commands::Auth(AuthCommand::Logout) => logout(store),
        Commands::Auth(AuthCommand::Whoami) => whoami(store),
        Commands::Templates(TemplatesCommand::Library(args)) => {
            list_templates(store, TemplateKind::Library, &args)
        }
        Commands::Templates(TemplatesCommand::Studio(args)) => {
            list_templates(store, TemplateKind::Studio, &args)
        }
        Commands::Templates(TemplatesCommand::Modifications {
            template_id,
            kind,
            json,
        }) => show_modifications(store, &template_id, kind, json),
        Commands::Generate(GenerateCommand::Library(args)) => generate_library(store, &args),
        Commands::Generate(GenerateCommand::Studio(args)) => generate_studio(store, &args),
        Commands::Test { endpoint } => test_endpoint(store, &endpoint),
    }
}

/// Load credentials and fail with `ApiError::Authentication` when no key
/// is stored.
fn authenticated(store: &CredentialStore) -> Result<Credentials> {
    let creds = store.load()?;
    creds.require_auth()?;
    Ok(creds)
}

fn login(store: &CredentialStore, api_key: Option<String>, domain: String) -> Result<()> {
    let api_key = match api_key {
        Some(key) if !key.trim().is_empty() => key.trim().to_string(),
        Some(_) => bail!("API key is required"),
        None => ui::prompt_api_key()?,
    };

    // A corrupt file is about to be overwritten anyway.
    let mut creds = store.load().unwrap_or_default();
    creds.domain = domain;
    creds.api_key = Some(api_key);
    store.save(&creds)?;
    log::debug!("domain: {}, api key: {}", creds.domain, creds.masked_api_key());

    ui::info("🔄 Verifying API key...");
    let verified = ApiClient::new(&creds).and_then(|api| api.get_current_user());
    let user = match verified {
        Ok(user) => user,
        Err(err) => {
            if let Err(clear_err) = store.clear() {
                log::warn!("could not clear credentials: {:#}", clear_err);
            }
            return Err(anyhow::Error::new(err).context("Login failed"));
        }
    };

    creds.user = Some(user.clone());
    store.save(&creds)?;

    ui::success("✅ Successfully logged in!");
    ui::print_user(&user, &creds, false);
    Ok(())
}

fn logout(store: &CredentialStore) -> Result<()> {
    store.clear()?;
    ui::success("✅ Successfully logged out");
    Ok(())
}

fn whoami(store: &CredentialStore) -> Result<()> {
    let creds = authenticated(store)?;
    ui::info("🔄 Fetching user information...");
    let user = ApiClient::new(&creds)
        .and_then(|api| api.get_current_user())
        .context(Hinted {
            message: "Failed to get user info",
            hint: "Try logging in again: orshot auth login <your-api-key>",
        })?;

    ui::success("✅ Current user:");
    ui::print_user(&user, &creds, true);
    Ok(())
}

fn list_templates(store: &CredentialStore, kind: TemplateKind, args: &ListArgs) -> Result<()> {
    let creds = authenticated(store)?;
    let api = ApiClient::new(&creds)?;
    let templates = match kind {
        TemplateKind::Library => api.get_library_templates(),
        TemplateKind::Studio => api.get_studio_templates(),
    }
    .with_context(|| format!("Failed to fetch {} templates", kind))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    let heading = match kind {
        TemplateKind::Library => "📚 Library Templates",
        TemplateKind::Studio => "🎨 Studio Templates",
    };
    if templates.is_empty() {
        ui::warn(&format!("No {} templates found", kind));
        return Ok(());
    }
    ui::print_templates(heading, &templates, args.limit);
    Ok(())
}

fn show_modifications(
    store: &CredentialStore,
    template_id: &str,
    kind: TemplateKind,
    json: bool,
) -> Result<()> {
    let creds = authenticated(store)?;
    let api = ApiClient::new(&creds)?;
    let specs = fetch_modifications(&api, kind, template_id)
        .context("Failed to fetch template modifications")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }
    if specs.is_empty() {
        ui::warn(&format!("🔧 No modifications found for {} template: {}", kind, template_id));
        return Ok(());
    }

    println!("{}", format!("🔧 Modifications for {} template: {}", kind, template_id).green());
    println!();
    ui::print_modification_specs(&specs);
    Ok(())
}

fn fetch_modifications(
    api: &ApiClient,
    kind: TemplateKind,
    template_id: &str,
) -> ApiResult<Vec<ModificationSpec>> {
    match kind {
        TemplateKind::Library => api.get_library_template_modifications(template_id),
        TemplateKind::Studio => api.get_studio_template_modifications(template_id),
    }
}

/// Prompt for every modification the template declares. A failed lookup
/// is not fatal: the render goes ahead with what the command line gave.
fn fill_interactively(
    api: &ApiClient,
    kind: TemplateKind,
    template_id: &str,
    mods: &mut Modifications,
) -> Result<()> {
    ui::info("🔄 Fetching available modifications...");
    match fetch_modifications(api, kind, template_id) {
        Ok(specs) if specs.is_empty() => {
            ui::warn("⚠️  No modifications available for this template");
        }
        Ok(specs) => {
            ui::success("📝 Available modifications:");
            let answers = ui::prompt_modifications(&specs, mods)?;
            merge_answers(mods, answers);
        }
        Err(err) => {
            log::warn!("modification lookup for {} failed: {}", template_id, err);
            ui::warn("⚠️  Could not fetch modifications, continuing with provided values");
        }
    }
    Ok(())
}

fn generate_library(store: &CredentialStore, args: &LibraryArgs) -> Result<()> {
    let common = &args.common;
    if !common.format.supported_by_library() {
        bail!(
            "Library templates cannot render {}; use png, jpg, jpeg, webp or pdf (or `generate studio` for video)",
            common.format
        );
    }
    let creds = authenticated(store)?;
    let api = ApiClient::new(&creds)?;

    let mut mods = parse_modifications(&common.modifications);
    if common.interactive {
        fill_interactively(&api, TemplateKind::Library, &args.template_id, &mut mods)?;
    }
    if common.quality.is_some() {
        log::debug!("--quality is not sent with library renders");
    }

    ui::info("🎨 Generating image...");
    let result = api
        .generate_from_library(&args.template_id, mods.clone(), &render_options(common))
        .context("Failed to generate image")?;

    let path = common
        .output
        .clone()
        .unwrap_or_else(|| output::default_filename("orshot", &args.template_id, common.format));
    deliver(&result, common, None, &path)?;
    if !common.json {
        ui::print_used_modifications("📝 Used modifications:", &mods);
    }
    Ok(())
}

fn generate_studio(store: &CredentialStore, args: &StudioArgs) -> Result<()> {
    let creds = authenticated(store)?;
    let api = ApiClient::new(&creds)?;
    let common = &args.common;

    let mut mods = parse_modifications(&common.modifications);
    if common.interactive {
        fill_interactively(&api, TemplateKind::Studio, &args.template_id, &mut mods)?;
    }

    ui::info("🎨 Rendering studio template...");
    let options = studio_options(args);
    let result = api
        .generate_from_studio(&args.template_id, mods.clone(), &options)
        .context("Failed to render studio template")?;

    let path = common.output.clone().unwrap_or_else(|| {
        output::default_filename("orshot-studio", &args.template_id, common.format)
    });
    deliver(&result, common, options.webhook.as_deref(), &path)?;
    if !common.json {
        ui::print_used_modifications("📝 Used modifications:", &mods);
    }
    Ok(())
}

fn render_options(common: &CommonRenderArgs) -> RenderOptions {
    RenderOptions {
        format: common.format,
        response_type: common.response_type,
    }
}

pub fn studio_options(args: &StudioArgs) -> StudioOptions {
    StudioOptions {
        render: render_options(&args.common),
        scale: args.scale,
        pages: args.pages.clone(),
        dpi: args.dpi,
        quality: args.common.quality,
        looped: args.looped,
        muted: args.muted,
        trim_start: args.trim_start,
        trim_end: args.trim_end,
        webhook: args.webhook.clone(),
    }
}

fn deliver(
    result: &crate::api::RenderResult,
    common: &CommonRenderArgs,
    webhook: Option<&str>,
    path: &Path,
) -> Result<()> {
    log::debug!("response type {}, webhook {:?}", common.response_type, webhook);
    match output::plan_output(result, common.response_type, webhook, common.json)? {
        OutputPlan::PrintJson(value) => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputPlan::Webhook(url) => {
            ui::success("✅ Render request accepted");
            ui::info(&format!("🔔 Result will be delivered to webhook: {}", url));
        }
        OutputPlan::Urls(urls) => {
            ui::success("✅ Generated successfully!");
            for url in urls {
                println!("{} {}", "🔗 URL:".blue(), url);
            }
        }
        OutputPlan::Decode(pieces) => {
            let pages = pieces
                .into_iter()
                .map(output::decode_base64)
                .collect::<Result<Vec<_>>>()?;
            save(&pages, path)?;
        }
        OutputPlan::Write(bytes) => {
            save(&[bytes.to_vec()], path)?;
        }
    }
    Ok(())
}

fn save(pages: &[Vec<u8>], path: &Path) -> Result<()> {
    let written = output::save_pages(pages, path)?;
    ui::success("✅ Generated successfully!");
    for file in written {
        ui::success(&format!("💾 Saved as: {}", file.display()));
    }
    Ok(())
}

fn test_endpoint(store: &CredentialStore, endpoint: &str) -> Result<()> {
    let creds = authenticated(store)?;
    ui::info("🔍 Testing API connectivity...");
    ui::detail(&format!("Domain: {}", creds.domain));
    ui::detail(&format!("Endpoint: {}", endpoint));
    ui::detail(&format!("API Key: {}", creds.masked_api_key()));
    println!();

    let response = ApiClient::new(&creds)
        .and_then(|api| api.request(Method::GET, endpoint, None, true))
        .context("API test failed")?;

    let pretty = serde_json::to_string_pretty(&response)?;
    let preview: String = pretty.chars().take(PREVIEW_CHARS).collect();
    ui::success("✅ API test successful!");
    println!("Response preview: {}{}", preview, if pretty.len() > preview.len() { "..." } else { "" });
    Ok(())
}

/// Print `err` to stderr, with troubleshooting tips for the categories
/// that have them.
pub fn report_error(err: &anyhow::Error, store: &CredentialStore) {
    eprintln!("{} {:#}", "❌".red(), err);
    if let Some(hinted) = err.downcast_ref::<Hinted>() {
        eprintln!("{}", format!("💡 {}", hinted.hint).yellow());
    }

    let Some(api_err) = err.chain().find_map(|e| e.downcast_ref::<ApiError>()) else {
        return;
    };
    let tips: Vec<String> = match api_err {
        ApiError::Authentication => {
            eprintln!("{}", "   orshot auth login <your-api-key>".yellow());
            return;
        }
        ApiError::Unauthorized => vec![
            "Double-check your API key from https://orshot.com/dashboard/developers".into(),
            "Make sure there are no extra spaces or characters".into(),
            "Verify your account has API access".into(),
        ],
        ApiError::Network(_) => {
            let domain = store.load().map(|c| c.domain).unwrap_or_default();
            vec![
                "Check your internet connection".into(),
                format!("Verify the domain is correct: {}", domain),
                "Try again in a few moments".into(),
            ]
        }
        _ => return,
    };

    eprintln!("{}", "💡 Troubleshooting tips:".yellow());
    for tip in tips {
        eprintln!("{}", format!("   - {}", tip).dark_grey());
    }
    eprintln!("{}", "🐛 For debugging, run with: orshot --verbose ...".dark_grey());
}
