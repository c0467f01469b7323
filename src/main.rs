use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cyclops_shell::config::Config;
use cyclops_shell::event_loop::{run_session, SessionExit};
use cyclops_shell::exec::{websocket_base, ExecTarget};
use cyclops_shell::logging;
use cyclops_shell::recent::RecentTargets;

/// Open an interactive shell in a pod container through the Cyclops backend.
#[derive(Debug, Parser)]
#[command(name = "cyclops-shell", version, about)]
struct Cli {
    /// Namespace of the pod
    #[arg(required_unless_present_any = ["recent", "last"])]
    namespace: Option<String>,

    /// Pod name
    #[arg(required_unless_present_any = ["recent", "last"])]
    pod: Option<String>,

    /// Container name
    #[arg(required_unless_present_any = ["recent", "last"])]
    container: Option<String>,

    /// Backend URL (overrides `backend_url` from the config file)
    #[arg(long)]
    url: Option<String>,

    /// Path to an alternative config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// List recently attached targets and exit
    #[arg(long, conflicts_with = "last")]
    recent: bool,

    /// Reattach to the most recent target
    #[arg(long)]
    last: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let log_path = config.log_path()?;
    logging::init(&log_path)?;

    let mut recent = RecentTargets::load().context("Failed to load recent targets")?;

    if cli.recent {
        if recent.count() == 0 {
            println!("No recent targets");
        }
        for entry in recent.entries() {
            println!("{}", entry.describe());
        }
        return Ok(());
    }

    let (target, url_override) = resolve_target(&cli, &recent)?;

    // Check if we're in a proper terminal
    if !std::io::stdin().is_terminal() {
        anyhow::bail!("cyclops-shell must be run in an interactive terminal");
    }

    // wss:// endpoints need a process-wide rustls provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let raw_base = url_override.as_deref().unwrap_or(&config.backend_url);
    let base = websocket_base(raw_base)?;
    let endpoint = target.endpoint(&base)?;

    if let Err(e) = recent.record(target.clone(), url_override) {
        tracing::warn!("Failed to save recent targets: {:#}", e);
    }

    println!(
        "Attaching to {} (press Ctrl+{} to detach)",
        target, config.detach_key
    );

    match run_session(&config, target, endpoint)? {
        SessionExit::Detached => println!("Detached"),
        SessionExit::RemoteClosed | SessionExit::ChannelClosed => println!("Session ended"),
    }

    Ok(())
}

/// Pick the target from the command line, or from recent history for `--last`.
///
/// Returns the target and the backend URL override to use with it, if any.
fn resolve_target(cli: &Cli, recent: &RecentTargets) -> Result<(ExecTarget, Option<String>)> {
    if cli.last {
        let latest = recent
            .latest()
            .context("No recent target to reattach to")?;
        latest.target.validate()?;
        let url = cli.url.clone().or_else(|| latest.backend_url.clone());
        return Ok((latest.target.clone(), url));
    }

    let (Some(namespace), Some(pod), Some(container)) =
        (cli.namespace.as_deref(), cli.pod.as_deref(), cli.container.as_deref())
    else {
        anyhow::bail!("namespace, pod and container are required");
    };

    let target = ExecTarget::new(namespace, pod, container)?;
    Ok((target, cli.url.clone()))
}
