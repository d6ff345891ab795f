// Command-line definitions. Parsing only; the handlers live in `commands`.

use crate::request::{OutputFormat, ResponseType};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "orshot", version)]
#[command(about = "CLI for Orshot - Automated Image Generation", long_about = None)]
#[command(after_help = "Examples:
  orshot auth login <api-key>        Log in with your API key
  orshot auth whoami                 Show current user info
  orshot templates library           List library templates
  orshot templates studio            List studio templates
  orshot generate library <id>       Generate from library template
  orshot generate studio <id>        Generate from studio template

Documentation:
  Visit https://orshot.com/docs for more information")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage authentication
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Browse templates
    #[command(subcommand)]
    Templates(TemplatesCommand),

    /// Generate images, documents and videos
    #[command(subcommand)]
    Generate(GenerateCommand),

    /// Test API connectivity (debug command)
    Test {
        /// API endpoint to call
        #[arg(short, long, default_value = "/v1/templates")]
        endpoint: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Log in with your Orshot API key
    Login {
        /// Your Orshot API key (prompted for when omitted)
        api_key: Option<String>,

        /// API domain
        #[arg(short, long, default_value = crate::config::DEFAULT_DOMAIN)]
        domain: String,
    },

    /// Log out and clear stored credentials
    Logout,

    /// Show current user information
    Whoami,
}

#[derive(Subcommand, Debug)]
pub enum TemplatesCommand {
    /// List library templates
    Library(ListArgs),

    /// List studio templates
    Studio(ListArgs),

    /// Show available modifications for a template
    Modifications {
        /// Template ID
        template_id: String,

        /// Template type
        #[arg(short = 't', long = "type", value_enum, default_value_t = TemplateKind::Library)]
        kind: TemplateKind,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Limit number of results
    #[arg(
        short,
        long,
        default_value_t = 20,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub limit: usize,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TemplateKind {
    Library,
    Studio,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TemplateKind::Library => "library",
            TemplateKind::Studio => "studio",
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum GenerateCommand {
    /// Generate from a library template
    Library(LibraryArgs),

    /// Generate from a studio template
    Studio(StudioArgs),
}

/// Flags shared by both render commands.
#[derive(Args, Debug)]
pub struct CommonRenderArgs {
    /// Template modifications as key=value (repeatable)
    #[arg(
        short,
        long = "modification",
        visible_alias = "data",
        visible_short_alias = 'd',
        value_name = "KEY=VALUE"
    )]
    pub modifications: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png)]
    pub format: OutputFormat,

    /// Response type
    #[arg(short = 't', long = "type", value_enum, default_value_t = ResponseType::Base64)]
    pub response_type: ResponseType,

    /// Output filename
    #[arg(short, long)]
    pub output: Option<std::path::PathBuf>,

    /// Image quality for jpg/webp, 1-100
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Prompt for the template's modifications
    #[arg(short, long)]
    pub interactive: bool,

    /// Output the response as JSON
    #[arg(short, long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LibraryArgs {
    /// Library template ID
    pub template_id: String,

    #[command(flatten)]
    pub common: CommonRenderArgs,
}

#[derive(Args, Debug)]
pub struct StudioArgs {
    /// Studio template ID
    pub template_id: String,

    #[command(flatten)]
    pub common: CommonRenderArgs,

    /// Scale factor
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub scale: Option<u32>,

    /// Pages to include, comma separated (e.g. 1,2,5)
    #[arg(long, value_delimiter = ',', value_name = "PAGES")]
    pub pages: Option<Vec<u32>>,

    /// PDF resolution
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Loop the video
    #[arg(long = "loop")]
    pub looped: bool,

    /// Mute the video
    #[arg(long)]
    pub muted: bool,

    /// Trim start, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub trim_start: Option<f64>,

    /// Trim end, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub trim_end: Option<f64>,

    /// Webhook URL to deliver the result to
    #[arg(short, long)]
    pub webhook: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("orshot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn studio_flags_parse() {
        let cli = parse(&[
            "generate", "studio", "42", "-d", "title=Hi", "-f", "mp4", "--loop", "--trim-end", "4.5",
            "--pages", "1,3", "-w", "https://hook",
        ]);
        let Commands::Generate(GenerateCommand::Studio(args)) = cli.command else {
            panic!("expected generate studio");
        };
        assert_eq!(args.template_id, "42");
        assert_eq!(args.common.modifications, ["title=Hi"]);
        assert_eq!(args.common.format, OutputFormat::Mp4);
        assert!(args.looped);
        assert!(!args.muted);
        assert_eq!(args.trim_end, Some(4.5));
        assert_eq!(args.pages, Some(vec![1, 3]));
        assert_eq!(args.webhook.as_deref(), Some("https://hook"));
    }

    #[test]
    fn library_defaults() {
        let cli = parse(&["generate", "library", "og", "-m", "a=1", "-m", "b=2"]);
        let Commands::Generate(GenerateCommand::Library(args)) = cli.command else {
            panic!("expected generate library");
        };
        assert_eq!(args.common.modifications, ["a=1", "b=2"]);
        assert_eq!(args.common.format, OutputFormat::Png);
        assert_eq!(args.common.response_type, ResponseType::Base64);
        assert!(!args.common.interactive);
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        let err = Cli::try_parse_from(["orshot", "generate", "library", "og", "-q", "0"]);
        assert!(err.is_err());
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(Cli::try_parse_from(["orshot", "templates", "studio", "--limit", "0"]).is_err());
        let cli = parse(&["templates", "library", "-l", "5"]);
        let Commands::Templates(TemplatesCommand::Library(args)) = cli.command else {
            panic!("expected templates library");
        };
        assert_eq!(args.limit, 5);
    }

    #[test]
    fn default_limit_is_twenty() {
        let cli = parse(&["templates", "studio"]);
        let Commands::Templates(TemplatesCommand::Studio(args)) = cli.command else {
            panic!("expected templates studio");
        };
        assert_eq!(args.limit, 20);
    }

    #[test]
    fn modifications_type_flag() {
        let cli = parse(&["templates", "modifications", "7", "--type", "studio"]);
        assert!(matches!(
            cli.command,
            Commands::Templates(TemplatesCommand::Modifications { kind: TemplateKind::Studio, .. })
        ));
    }
}
