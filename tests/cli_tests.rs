mod common;

use std::time::Duration;

use clap::Parser;
use common::fixtures::LOGIN_PAGE;
use page_insight::analysis::analysis_model::PageAnalysis;
use page_insight::cli::commands::{cmd_analyze, cmd_detect, cmd_report};
use page_insight::cli::config::{
    AnalysisConfig, AppConfig, BrowserConfig, Cli, Commands, build_analysis_options, load_config,
};

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_analyze_minimal() {
    let cli = Cli::parse_from(["page-insight", "analyze", "--url", "https://example.com"]);
    match cli.command {
        Commands::Analyze {
            url,
            html,
            live,
            no_patterns,
            output,
        } => {
            assert_eq!(url, "https://example.com");
            assert!(html.is_none());
            assert!(!live);
            assert!(!no_patterns);
            assert!(output.is_none());
        }
        _ => panic!("Expected Analyze command"),
    }
}

#[test]
fn cli_parse_analyze_all_args() {
    let cli = Cli::parse_from([
        "page-insight",
        "analyze",
        "--url",
        "https://shop.test",
        "--html",
        "saved.html",
        "--live",
        "--no-patterns",
        "-o",
        "out.json",
    ]);
    match cli.command {
        Commands::Analyze {
            url,
            html,
            live,
            no_patterns,
            output,
        } => {
            assert_eq!(url, "https://shop.test");
            assert_eq!(html.as_deref(), Some("saved.html"));
            assert!(live);
            assert!(no_patterns);
            assert_eq!(output.as_deref(), Some("out.json"));
        }
        _ => panic!("Expected Analyze command"),
    }
}

#[test]
fn cli_parse_detect_and_report() {
    let cli = Cli::parse_from(["page-insight", "detect", "--url", "https://x.test"]);
    match cli.command {
        Commands::Detect { url, html } => {
            assert_eq!(url, "https://x.test");
            assert!(html.is_none());
        }
        _ => panic!("Expected Detect command"),
    }

    let cli = Cli::parse_from(["page-insight", "report", "--analysis", "a.json"]);
    match cli.command {
        Commands::Report { analysis } => assert_eq!(analysis, "a.json"),
        _ => panic!("Expected Report command"),
    }
}

#[test]
fn cli_parse_global_flags() {
    let cli = Cli::parse_from(["page-insight", "-vv", "report", "--analysis", "a.json"]);
    assert_eq!(cli.verbose, 2);
    assert!(cli.config.is_none());

    let cli = Cli::parse_from([
        "page-insight",
        "report",
        "--analysis",
        "a.json",
        "--config",
        "custom.yaml",
    ]);
    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
}

#[test]
fn cli_requires_url() {
    assert!(Cli::try_parse_from(["page-insight", "analyze"]).is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_load_missing_file() {
    let config = load_config(Some("nonexistent_file_that_does_not_exist.yaml"));
    assert_eq!(config.analysis.navigation_timeout_ms, 30_000);
    assert_eq!(config.browser.node, "node");
}

#[test]
fn config_default_values() {
    let config = AppConfig::default();
    assert_eq!(config.browser.server_script, "node/page_server.js");
    assert_eq!(config.browser.command_timeout_ms, 45_000);
    assert_eq!(config.analysis.overall_timeout_ms, 60_000);
    assert_eq!(config.analysis.settle_delay_ms, 2_000);
    assert_eq!(config.analysis.scroll_settle_ms, 1_000);
    assert!(config.analysis.pattern_flows);
    assert!(!config.analysis.live_detection);
    assert!(config.logging.filter.is_none());
    assert!(!config.logging.json);
}

#[test]
fn config_partial_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page-insight.yaml");
    std::fs::write(
        &path,
        r#"
analysis:
  live_detection: true
  settle_delay_ms: 250
logging:
  filter: "page_insight=debug"
"#,
    )
    .unwrap();

    let config = load_config(path.to_str());
    assert!(config.analysis.live_detection);
    assert_eq!(config.analysis.settle_delay_ms, 250);
    // Other fields get defaults
    assert_eq!(config.analysis.navigation_timeout_ms, 30_000);
    assert!(config.analysis.pattern_flows);
    assert_eq!(config.browser.node, "node");
    assert_eq!(config.logging.filter.as_deref(), Some("page_insight=debug"));
}

#[test]
fn config_malformed_yaml_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "analysis: [unclosed").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.analysis.overall_timeout_ms, 60_000);
}

#[test]
fn config_yaml_roundtrip() {
    let config = AppConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed.analysis.overall_timeout_ms, config.analysis.overall_timeout_ms);
    assert_eq!(parsed.browser.server_script, config.browser.server_script);
}

// ============================================================================
// Builder Tests
// ============================================================================

#[test]
fn build_analysis_options_wiring() {
    let config = AnalysisConfig {
        navigation_timeout_ms: 5_000,
        overall_timeout_ms: 20_000,
        settle_delay_ms: 100,
        scroll_settle_ms: 50,
        pattern_flows: true,
        live_detection: false,
    };

    let options = build_analysis_options(&config, false, false);
    assert_eq!(options.extractor.navigation_timeout, Duration::from_secs(5));
    assert_eq!(options.extractor.settle_delay, Duration::from_millis(100));
    assert_eq!(options.overall_timeout, Duration::from_secs(20));
    assert_eq!(options.live.scroll_settle, Duration::from_millis(50));
    assert!(options.pattern_flows);
    assert!(!options.live_detection);

    let options = build_analysis_options(&config, true, true);
    assert!(!options.pattern_flows);
    assert!(options.live_detection);
}

#[test]
fn session_config_wiring() {
    let browser = BrowserConfig {
        node: "/usr/bin/node".into(),
        server_script: "server.js".into(),
        command_timeout_ms: 1_500,
    };
    let session = browser.session_config();
    assert_eq!(session.node, "/usr/bin/node");
    assert_eq!(session.server_script, "server.js");
    assert_eq!(session.command_timeout, Duration::from_millis(1_500));
}

// ============================================================================
// Commands over local HTML
// ============================================================================

#[test]
fn analyze_html_file_then_report() {
    let dir = tempfile::tempdir().unwrap();
    let html = dir.path().join("login.html");
    let out = dir.path().join("analysis.json");
    std::fs::write(&html, LOGIN_PAGE).unwrap();

    let options = build_analysis_options(&AnalysisConfig::default(), true, false);
    cmd_analyze(
        "https://app.test/login",
        html.to_str(),
        out.to_str(),
        &options,
        &BrowserConfig::default(),
    )
    .unwrap();

    let saved: PageAnalysis = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(saved.url, "https://app.test/login");
    assert_eq!(saved.title, "Sign in");
    assert!(saved.user_flows.iter().any(|f| f.name == "Login Flow"));

    cmd_report(out.to_str().unwrap()).unwrap();
}

#[test]
fn detect_html_file() {
    let dir = tempfile::tempdir().unwrap();
    let html = dir.path().join("login.html");
    std::fs::write(&html, LOGIN_PAGE).unwrap();

    let options = build_analysis_options(&AnalysisConfig::default(), true, true);
    cmd_detect("https://app.test/login", html.to_str(), &options, &BrowserConfig::default()).unwrap();
}

#[test]
fn commands_report_missing_inputs() {
    let options = build_analysis_options(&AnalysisConfig::default(), false, false);
    let result = cmd_analyze(
        "https://app.test/",
        Some("no_such_page.html"),
        None,
        &options,
        &BrowserConfig::default(),
    );
    assert!(result.is_err());
    assert!(cmd_report("no_such_analysis.json").is_err());
}
