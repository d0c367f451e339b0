use crate::model::PipelineRun;
use crate::store::DataSource;
use anyhow::Result;
use clap::Parser;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "funnel-ops",
    version,
    about = "Terminal operations portal for the outreach pipeline"
)]
pub struct Cli {
    /// Print the run store as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a funnel summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Load runs from a JSONL file instead of the default data file
    #[arg(long)]
    pub data: Option<std::path::PathBuf>,

    /// Use --auto-save true or --auto-save false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_save: bool,
}

pub fn run(args: Cli) -> Result<()> {
    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args);
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(&args);
        }
    }

    if args.json {
        return run_json(&args);
    }

    run_text(&args)
}

fn load(args: &Cli) -> Result<Vec<PipelineRun>> {
    DataSource::resolve(args.data.clone()).load()
}

fn run_json(args: &Cli) -> Result<()> {
    let runs = load(args)?;
    let out = serde_json::to_string_pretty(&runs)?;
    println!("{out}");
    Ok(())
}

fn run_text(args: &Cli) -> Result<()> {
    let runs = load(args)?;
    let summary = crate::text_summary::build_text_summary(&runs);
    for line in summary.lines {
        println!("{line}");
    }
    Ok(())
}
