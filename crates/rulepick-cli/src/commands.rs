//! CLI command definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rulepick::{CssSelectorType, RuleType};

/// Rulepick: build content-blocking rules from page snapshots
#[derive(Parser, Debug)]
#[command(name = "rulepick")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Picker configuration file (YAML, or JSON by extension)
    #[arg(long, global = true, env = "RULEPICK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a rule for an element
    Rule(RuleArgs),

    /// Extract the selector from rule text
    Selector(SelectorArgs),

    /// Walk the ancestor/descendant ladder around an element
    Scope(ScopeArgs),

    /// Describe an element's rule-relevant attributes
    Describe(DescribeArgs),
}

/// Page snapshot and the element within it
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Page snapshot JSON (`{"url": ..., "body": {...}}`)
    pub document: PathBuf,

    /// Element: `#id` or child index path below body, e.g. `0/2/1`
    #[arg(short, long)]
    pub node: String,
}

/// Arguments for the rule command
#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RuleArgs {
    /// Target element
    #[command(flatten)]
    pub target: TargetArgs,

    /// Rule type
    #[arg(short = 't', long, default_value = "css")]
    pub rule_type: RuleTypeArg,

    /// CSS selector strategy
    #[arg(short, long, default_value = "strict-full")]
    pub selector: SelectorTypeArg,

    /// Build a rule for every site instead of just this one
    #[arg(long)]
    pub one_domain: bool,

    /// Leave the tag name out of the target's selector
    #[arg(long)]
    pub exclude_tag: bool,

    /// Leave the id out of the target's selector
    #[arg(long)]
    pub exclude_id: bool,

    /// Use these classes instead of the element's own
    #[arg(long, value_delimiter = ',')]
    pub classes: Option<Vec<String>>,

    /// Raw attribute selector appended to the CSS selector
    #[arg(long)]
    pub attributes: Option<String>,

    /// Resource URL to block instead of the element's own
    #[arg(long)]
    pub url_mask: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the selector command
#[derive(Args, Debug)]
pub struct SelectorArgs {
    /// Rule text, e.g. `example.com##.banner`
    pub rule: String,

    /// Page snapshot to list matching elements from
    #[arg(short, long)]
    pub document: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the scope command
#[derive(Args, Debug)]
pub struct ScopeArgs {
    /// Target element
    #[command(flatten)]
    pub target: TargetArgs,

    /// Build a rule for every site instead of just this one
    #[arg(long)]
    pub one_domain: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the describe command
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Target element
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Rule type argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RuleTypeArg {
    /// Element-hiding rule
    #[default]
    Css,
    /// Network blocking rule
    Url,
}

impl From<RuleTypeArg> for RuleType {
    fn from(arg: RuleTypeArg) -> Self {
        match arg {
            RuleTypeArg::Css => Self::Css,
            RuleTypeArg::Url => Self::Url,
        }
    }
}

/// Selector strategy argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectorTypeArg {
    /// Full path from the nearest id-bearing ancestor
    #[default]
    StrictFull,
    /// The element alone
    Strict,
    /// Any element sharing a class
    Similar,
}

impl From<SelectorTypeArg> for CssSelectorType {
    fn from(arg: SelectorTypeArg) -> Self {
        match arg {
            SelectorTypeArg::StrictFull => Self::StrictFull,
            SelectorTypeArg::Strict => Self::Strict,
            SelectorTypeArg::Similar => Self::Similar,
        }
    }
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text
    #[default]
    Text,
    /// JSON
    Json,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rule() {
        let cli = Cli::try_parse_from([
            "rulepick",
            "-vv",
            "rule",
            "page.json",
            "--node",
            "0/0",
            "--rule-type",
            "url",
            "--classes",
            "a,b",
            "--one-domain",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Rule(args) = cli.command else {
            panic!("expected rule command");
        };
        assert_eq!(args.target.node, "0/0");
        assert_eq!(args.rule_type, RuleTypeArg::Url);
        assert_eq!(args.selector, SelectorTypeArg::StrictFull);
        assert_eq!(args.classes, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(args.one_domain);
    }

    #[test]
    fn test_parse_selector() {
        let cli = Cli::try_parse_from(["rulepick", "selector", "##.ad", "--format", "json"]).unwrap();
        let Commands::Selector(args) = cli.command else {
            panic!("expected selector command");
        };
        assert_eq!(args.rule, "##.ad");
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.document.is_none());
    }

    #[test]
    fn test_node_required() {
        assert!(Cli::try_parse_from(["rulepick", "describe", "page.json"]).is_err());
    }

    #[test]
    fn test_arg_conversions() {
        assert_eq!(RuleType::from(RuleTypeArg::Url), RuleType::Url);
        assert_eq!(
            CssSelectorType::from(SelectorTypeArg::Similar),
            CssSelectorType::Similar
        );
    }
}
