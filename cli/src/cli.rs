use clap::Args;
use clap::Parser;
use clap::Subcommand;
use tagport_core::ConfigOverrides;
use tagport_core::TransportPreference;
use url::Url;

/// Locate the companion service on its loopback port window and keep a
/// page's action links pointed at it.
#[derive(Parser, Debug, Clone)]
#[command(name = "tagport", version)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Reconcile a page's action links against the live service.
    Discover(DiscoverArgs),

    /// Scan the configured port window and print the first live port.
    Scan,

    /// Probe a single port. Exits with 1 when it is not live.
    Probe {
        port: u16,
    },

    /// Issue an action link's request in-page and print the resulting status.
    Click {
        href: Url,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DiscoverArgs {
    /// URL of the page being reconciled.
    #[arg(long = "page-url", value_name = "URL")]
    pub page_url: Url,

    /// Action link hrefs present on the page, in document order.
    #[arg(long = "link", value_name = "HREF")]
    pub links: Vec<Url>,

    /// Print the outcome as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// Probe target address.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// First port of the scan window.
    #[arg(long = "default-port", global = true)]
    pub default_port: Option<u16>,

    /// Last port of the scan window, inclusive.
    #[arg(long = "max-port", global = true)]
    pub max_port: Option<u16>,

    #[arg(long = "probe-timeout-ms", global = true)]
    pub probe_timeout_ms: Option<u64>,

    #[arg(long = "action-timeout-ms", global = true)]
    pub action_timeout_ms: Option<u64>,

    /// Request facility: auto, privileged or same-origin.
    #[arg(long, global = true)]
    pub transport: Option<TransportPreference>,

    /// Liveness signature; repeat to accept several.
    #[arg(long = "signature", global = true)]
    pub signatures: Vec<String>,
}

impl OverrideArgs {
    pub fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host,
            default_port: self.default_port,
            max_port: self.max_port,
            probe_timeout_ms: self.probe_timeout_ms,
            action_timeout_ms: self.action_timeout_ms,
            liveness_signatures: (!self.signatures.is_empty()).then_some(self.signatures),
            transport: self.transport,
        }
    }
}
