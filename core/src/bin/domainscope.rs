//! Domainscope command line front end.
//!
//! `record` drives a browser through the JSON-lines bridge on stdin/stdout:
//! it asks for a new context, collects the hosts that context contacts and
//! emits the rendered rule list as a final `result` message. `render` prints
//! the last stored result again with different output options.
//!
//! Usage:
//! ```text
//! bridge-process | domainscope record https://example.com -x ads -x analytics | bridge-process
//! domainscope render --proxy-rule --policy DIRECT
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use domainscope_core::api::analysis_api::{self, AnalysisInput};
use domainscope_core::bridge::{self, BridgeHost};
use domainscope_core::models::{BridgeCommand, OutputMode, RenderOptions, SessionResult};
use domainscope_core::session::{SessionTracker, TrackerConfig, DEFAULT_GRACE_PERIOD};
use domainscope_core::storage;
use tokio::io::{stdin, stdout, BufReader};
use tokio::sync::mpsc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

const EMPTY_NOTICE: &str = "No domains were captured, or an error occurred.";

#[derive(Parser, Debug)]
#[command(name = "domainscope", version, about = "Collect the domains a page contacts")]
struct Cli {
    /// Directory for preferences and results
    #[arg(long, global = true, env = "DOMAINSCOPE_STORAGE")]
    storage_path: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record one session through the stdio bridge
    Record(RecordArgs),
    /// Render the last stored result
    Render(OutputArgs),
    /// Print saved preferences as JSON
    Prefs,
    /// Delete stored results (preferences are kept)
    Clear,
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// Address to open; defaults to the last one used
    url: Option<String>,

    /// Exclusion rule (substring of host or protocol); repeatable
    #[arg(short = 'x', long = "exclude")]
    exclude: Vec<String>,

    /// File with one exclusion rule per line
    #[arg(long)]
    exclusions_file: Option<PathBuf>,

    /// Close the page once it finished loading (default: saved preference)
    #[arg(long)]
    auto_close: Option<bool>,

    /// Milliseconds to keep recording after the page finished loading
    #[arg(long, default_value_t = DEFAULT_GRACE_PERIOD.as_millis() as u64)]
    grace_ms: u64,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug, Default)]
struct OutputArgs {
    /// Merge sibling subdomains into *.parent entries
    #[arg(long, overrides_with = "no_wildcard")]
    wildcard: bool,
    /// Keep every host verbatim
    #[arg(long)]
    no_wildcard: bool,
    /// Emit DOMAIN / DOMAIN-SUFFIX rules
    #[arg(long, overrides_with = "plain")]
    proxy_rule: bool,
    /// Emit one domain per line
    #[arg(long)]
    plain: bool,
    /// Policy appended to proxy rules (e.g. DIRECT)
    #[arg(long)]
    policy: Option<String>,
}

impl OutputArgs {
    fn is_empty(&self) -> bool {
        !self.wildcard && !self.no_wildcard && !self.proxy_rule && !self.plain && self.policy.is_none()
    }

    /// Saved options with any flags given on the command line applied on top
    fn apply(&self, mut options: RenderOptions) -> RenderOptions {
        if self.wildcard {
            options.wildcard = true;
        }
        if self.no_wildcard {
            options.wildcard = false;
        }
        if self.proxy_rule {
            options.mode = OutputMode::ProxyRule;
        }
        if self.plain {
            options.mode = OutputMode::Plain;
        }
        if let Some(policy) = &self.policy {
            options.policy = Some(policy.clone()).filter(|p| !p.trim().is_empty());
        }
        options
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let storage_path = cli
        .storage_path
        .clone()
        .unwrap_or_else(analysis_api::default_storage_path);
    storage::init_store(&storage_path)
        .with_context(|| format!("opening store at {}", storage_path.display()))?;

    match cli.command {
        Command::Record(args) => record(args).await,
        Command::Render(args) => render(args).await,
        Command::Prefs => {
            let prefs = analysis_api::load_preferences()
                .await
                .map_err(anyhow::Error::msg)?;
            println!("{}", serde_json::to_string_pretty(&prefs)?);
            Ok(())
        }
        Command::Clear => {
            let removed = storage::clear_results().await?;
            eprintln!("Removed {removed} stored results");
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        analysis_api::resolve_log_level()
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr) // stdout carries the bridge protocol
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

async fn record(args: RecordArgs) -> anyhow::Result<()> {
    let prefs = analysis_api::load_preferences()
        .await
        .map_err(anyhow::Error::msg)?;
    let mut input = AnalysisInput::from_preferences(&prefs);
    if let Some(url) = args.url {
        input.url = url;
    }
    if !args.exclude.is_empty() || args.exclusions_file.is_some() {
        let mut lines = args.exclude.clone();
        if let Some(path) = &args.exclusions_file {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading exclusions from {}", path.display()))?;
            lines.push(text);
        }
        input.exclusion_text = lines.join("\n");
    }
    if let Some(auto_close) = args.auto_close {
        input.auto_close = auto_close;
    }

    let (host, commands) = BridgeHost::new();
    let host = Arc::new(host);
    let (result_tx, mut results) = mpsc::unbounded_channel::<SessionResult>();
    let tracker = SessionTracker::with_config(
        host.clone(),
        Arc::new(result_tx),
        TrackerConfig {
            grace_period: Duration::from_millis(args.grace_ms),
        },
    );

    let writer = tokio::spawn(bridge::run_writer(commands, stdout()));
    let mut events = tokio::spawn(bridge::run_event_loop(
        BufReader::new(stdin()),
        host.clone(),
        tracker.clone(),
    ));

    analysis_api::start_analysis(&tracker, input)
        .await
        .map_err(anyhow::Error::msg)?;

    let Some(result) = bridge::await_session_result(&mut results, &mut events, &tracker).await?
    else {
        bail!("browser bridge closed before the session produced a result");
    };

    analysis_api::record_result(&result)
        .await
        .map_err(anyhow::Error::msg)?;

    let saved = analysis_api::load_render_options()
        .await
        .map_err(anyhow::Error::msg)?;
    let options = args.output.apply(saved);
    let rendered = analysis_api::render_hosts(&result.hosts, result.context_id.clone(), &options);
    if rendered.is_empty() {
        tracing::warn!("{}", EMPTY_NOTICE);
    } else {
        tracing::info!(
            "Captured {} hosts, {} rules",
            rendered.host_count,
            rendered.rule_count
        );
    }

    host.send(BridgeCommand::Result {
        context_id: result.context_id,
        hosts: result.hosts,
        text: rendered.text,
    })?;
    host.close();
    events.abort();
    writer.await??;
    Ok(())
}

async fn render(args: OutputArgs) -> anyhow::Result<()> {
    let saved = analysis_api::load_render_options()
        .await
        .map_err(anyhow::Error::msg)?;
    let options = args.apply(saved);
    if !args.is_empty() {
        analysis_api::save_render_options(&options)
            .await
            .map_err(anyhow::Error::msg)?;
    }

    let rendered = analysis_api::render_last_result(Some(options))
        .await
        .map_err(anyhow::Error::msg)?;
    if rendered.is_empty() {
        eprintln!("{EMPTY_NOTICE}");
        return Ok(());
    }
    println!("{}", rendered.text);
    eprintln!("{} rules from {} hosts", rendered.rule_count, rendered.host_count);
    Ok(())
}
