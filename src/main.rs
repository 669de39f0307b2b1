use clap::Parser;
use page_insight::cli::commands::{cmd_analyze, cmd_detect, cmd_report};
use page_insight::cli::config::{Cli, Commands, build_analysis_options, load_config};
use page_insight::logging::init_logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    init_logging(cli.verbose, config.logging.filter.as_deref(), config.logging.json);

    match cli.command {
        Commands::Analyze {
            url,
            html,
            live,
            no_patterns,
            output,
        } => {
            let options = build_analysis_options(&config.analysis, live, no_patterns);
            cmd_analyze(
                &url,
                html.as_deref(),
                output.as_deref(),
                &options,
                &config.browser,
            )?;
        }
        Commands::Detect { url, html } => {
            let options = build_analysis_options(&config.analysis, true, true);
            cmd_detect(&url, html.as_deref(), &options, &config.browser)?;
        }
        Commands::Report { analysis } => {
            cmd_report(&analysis)?;
        }
    }

    Ok(())
}
