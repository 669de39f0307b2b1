use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::analysis::session::AnalysisOptions;
use crate::browser::session::SessionConfig;
use crate::extract::extractor::ExtractorConfig;
use crate::flow::live::LiveDetectionConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "page-insight",
    version,
    about = "Analyze a rendered web page into elements, sections, API calls and user flows"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: page-insight.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract a full page analysis as JSON
    Analyze {
        /// URL to analyze
        #[arg(long)]
        url: String,

        /// Analyze a local HTML file instead of launching a browser
        #[arg(long)]
        html: Option<String>,

        /// Also run live flow detection
        #[arg(long)]
        live: bool,

        /// Skip pattern-based flow inference
        #[arg(long)]
        no_patterns: bool,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run live flow detection only and print the flows as JSON
    Detect {
        /// URL to probe
        #[arg(long)]
        url: String,

        /// Probe a local HTML file instead of launching a browser
        #[arg(long)]
        html: Option<String>,
    },

    /// Render a Markdown interaction report from a saved analysis
    Report {
        /// Path to a JSON file produced by `analyze`
        #[arg(long)]
        analysis: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `page-insight.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_node")]
    pub node: String,

    #[serde(default = "default_server_script")]
    pub server_script: String,

    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            node: default_node(),
            server_script: default_server_script(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    #[serde(default = "default_overall_timeout_ms")]
    pub overall_timeout_ms: u64,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    #[serde(default = "default_true")]
    pub pattern_flows: bool,

    #[serde(default)]
    pub live_detection: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout_ms(),
            overall_timeout_ms: default_overall_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            pattern_flows: true,
            live_detection: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `page_insight=debug`.
    pub filter: Option<String>,

    #[serde(default)]
    pub json: bool,
}

// Serde default helpers
fn default_node() -> String { "node".to_string() }
fn default_server_script() -> String { "node/page_server.js".to_string() }
fn default_command_timeout_ms() -> u64 { 45_000 }
fn default_navigation_timeout_ms() -> u64 { 30_000 }
fn default_overall_timeout_ms() -> u64 { 60_000 }
fn default_settle_delay_ms() -> u64 { 2_000 }
fn default_scroll_settle_ms() -> u64 { 1_000 }
fn default_true() -> bool { true }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("page-insight.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

impl BrowserConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            node: self.node.clone(),
            server_script: self.server_script.clone(),
            command_timeout: Duration::from_millis(self.command_timeout_ms),
        }
    }
}

/// Analysis options from the config file, with `--live` / `--no-patterns`
/// taking precedence when given.
pub fn build_analysis_options(config: &AnalysisConfig, live: bool, no_patterns: bool) -> AnalysisOptions {
    AnalysisOptions {
        extractor: ExtractorConfig {
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        },
        overall_timeout: Duration::from_millis(config.overall_timeout_ms),
        pattern_flows: config.pattern_flows && !no_patterns,
        live_detection: config.live_detection || live,
        live: LiveDetectionConfig {
            scroll_settle: Duration::from_millis(config.scroll_settle_ms),
        },
    }
}
