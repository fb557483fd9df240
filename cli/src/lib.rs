mod cli;

use std::process::ExitCode;
use std::sync::Arc;

pub use cli::Cli;
pub use cli::Command;
pub use cli::DiscoverArgs;
use tagport_core::CandidateEndpoint;
use tagport_core::ControlId;
use tagport_core::DiscoveryConfig;
use tagport_core::Eligibility;
use tagport_core::HostCapabilities;
use tagport_core::MemoryPage;
use tagport_core::Outcome;
use tagport_core::Page;
use tagport_core::PageRules;
use tagport_core::Reconciler;
use tagport_core::Transport;
use tagport_core::config::find_tagport_home;
use tagport_core::select_transport;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

pub async fn run_main(cli: Cli) -> anyhow::Result<ExitCode> {
    let Cli {
        overrides,
        verbose,
        command,
    } = cli;

    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        // Fallback to the `default_level` log filter if the environment
        // variable is not set _or_ contains an invalid value
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let home = find_tagport_home()?;
    let config = Arc::new(DiscoveryConfig::load_with_overrides(
        &home,
        overrides.into_overrides(),
    )?);
    debug!(?config, "loaded configuration from {}", home.display());

    match command {
        Command::Discover(args) => discover(config, args).await,
        Command::Scan => scan(config).await,
        Command::Probe { port } => probe(config, port).await,
        Command::Click { href } => click(config, href).await,
    }
}

/// A native process always has the cross-origin capable client available;
/// the configured preference may still opt out of it.
fn transport_for(config: &DiscoveryConfig, page_origin: Option<Url>) -> Arc<dyn Transport> {
    let capabilities = HostCapabilities {
        privileged_requests: true,
        page_origin,
    };
    select_transport(&capabilities, config.transport)
}

async fn discover(config: Arc<DiscoveryConfig>, args: DiscoverArgs) -> anyhow::Result<ExitCode> {
    let transport = transport_for(&config, Some(args.page_url.clone()));
    let excluded = PageRules::default().is_excluded(&args.page_url);
    let page = MemoryPage::new(args.page_url, args.links);

    let outcome = Reconciler::new(config, transport)
        .reconcile(&page, excluded)
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", describe(&outcome));
    }
    Ok(ExitCode::SUCCESS)
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Excluded => "page has no action links to manage".to_string(),
        Outcome::Synchronized {
            endpoint,
            intercepted,
        } => format!(
            "action links already point at {}:{}; {intercepted} intercepted",
            endpoint.host,
            endpoint.port.unwrap_or_default()
        ),
        Outcome::Corrected { endpoint, location } => format!(
            "companion service found on port {}; reload {location}",
            endpoint.port.unwrap_or_default()
        ),
        Outcome::Disabled { stale_port, hidden } => format!(
            "companion service no longer on port {stale_port}; hid {hidden} action link(s)"
        ),
        Outcome::NotFound => "companion service not found".to_string(),
    }
}

async fn scan(config: Arc<DiscoveryConfig>) -> anyhow::Result<ExitCode> {
    let reconciler = Reconciler::new(Arc::clone(&config), transport_for(&config, None));
    match reconciler
        .scanner()
        .scan(&config.host, config.default_port, config.max_port)
        .await
    {
        Some(port) => {
            println!("{port}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!(
                "no companion service on {} in {}..={}",
                config.host, config.default_port, config.max_port
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn probe(config: Arc<DiscoveryConfig>, port: u16) -> anyhow::Result<ExitCode> {
    let reconciler = Reconciler::new(Arc::clone(&config), transport_for(&config, None));
    let candidate = CandidateEndpoint::new(config.host.as_str(), port);
    if reconciler.prober().probe(&candidate).await {
        println!("{candidate} is live");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{candidate} is not live");
        Ok(ExitCode::FAILURE)
    }
}

async fn click(config: Arc<DiscoveryConfig>, href: Url) -> anyhow::Result<ExitCode> {
    let transport = transport_for(&config, Some(href.clone()));
    let reconciler = Reconciler::new(config, transport);
    let page = MemoryPage::new(href.clone(), vec![href]);
    reconciler
        .interceptor()
        .activate(&page, page.action_controls());

    match page.click(ControlId(0)).await {
        Some(status) if status.is_success() => {
            println!("{}", status.title);
            Ok(ExitCode::SUCCESS)
        }
        Some(status) => {
            eprintln!("{}", status.title);
            Ok(ExitCode::FAILURE)
        }
        None => anyhow::bail!("action link was not intercepted"),
    }
}
