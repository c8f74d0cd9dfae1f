use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use wemo_setup::{
    WemoClient, Workflow,
    config::{self, Config, NetworkConfig},
    connection::Nmcli,
    diagnostics::DetailLevel,
    names::NameMapping,
    prompt::Terminal,
    report,
    workflow::{ResetOptions, SetupOptions},
};

#[derive(Parser)]
#[command(name = "wemo-setup")]
#[command(about = "Discover, rename, reset and set up Wemo devices without the vendor app")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Verbosity {
    /// More output: -v debug, -vv debug for every library, -vvv also log to wemo_setup.log
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover devices and print their details
    #[command(visible_alias = "discover")]
    List {
        /// Call more device getters; repeat for the slow network scans too
        #[arg(short, long, action = clap::ArgAction::Count)]
        info: u8,

        #[command(flatten)]
        verbosity: Verbosity,
    },

    /// Rename discovered devices from a UDN,IP,Friendly Name CSV file
    Rename {
        /// Path to the name mapping file
        #[arg(short, long, default_value = "wemo_names.csv")]
        path: PathBuf,

        #[command(flatten)]
        verbosity: Verbosity,
    },

    /// Factory reset one device or every discovered device
    ///
    /// Run this from the network the device is on. With --reset-all every
    /// network the host is connected to is searched (ethernet and WiFi alike),
    /// so be careful on multi-homed hosts.
    Reset {
        /// Clear device data (name, rules, icon)
        #[arg(long)]
        data: bool,

        /// Clear the saved WiFi network
        #[arg(long)]
        wifi: bool,

        /// Clear both data and WiFi
        #[arg(long)]
        full: bool,

        /// Reset every discovered device (asks for confirmation after discovery)
        #[arg(long)]
        reset_all: bool,

        /// Friendly name of the device to reset (required unless --reset-all)
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        verbosity: Verbosity,
    },

    /// Connect devices in setup mode to a home network
    ///
    /// A device in setup mode broadcasts its own network, named like
    /// Wemo.Mini.XXX (XXX being the end of its serial number). With --name the
    /// host must already be joined to that network. With --setup-all nmcli
    /// joins every Wemo.* network in range and sets up each device that is not
    /// set up yet.
    ///
    /// The password is prompted for when neither given nor saved. For an open
    /// network it is ignored.
    ///
    /// Devices often fail to join an access point that uses one SSID for its
    /// 2.4GHz and 5GHz bands. Disable the 5GHz band during setup and turn it
    /// back on afterwards.
    Setup {
        /// Network the devices should join
        #[arg(long)]
        ssid: String,

        /// Network password (uses saved password or prompts if not provided)
        #[arg(short, long)]
        password: Option<String>,

        /// Set up every device access point in range (requires nmcli)
        #[arg(long)]
        setup_all: bool,

        /// Friendly name of a device whose network this host is on (required unless --setup-all)
        #[arg(short, long)]
        name: Option<String>,

        /// WiFi interface to use for joining device access points
        #[arg(long)]
        interface: Option<String>,

        /// Save the network credentials to the config file
        #[arg(short, long)]
        save: bool,

        #[command(flatten)]
        verbosity: Verbosity,
    },

    /// Show saved configuration
    ShowConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List { info, verbosity } => {
            report::init_logger(verbosity.verbose)?;
            cmd_list(info)
        }
        Commands::Rename { path, verbosity } => {
            report::init_logger(verbosity.verbose)?;
            cmd_rename(&path)
        }
        Commands::Reset {
            data,
            wifi,
            full,
            reset_all,
            name,
            verbosity,
        } => {
            report::init_logger(verbosity.verbose)?;
            cmd_reset(ResetOptions {
                all: reset_all,
                name,
                clear_data: data || full,
                clear_wifi: wifi || full,
            })
        }
        Commands::Setup {
            ssid,
            password,
            setup_all,
            name,
            interface,
            save,
            verbosity,
        } => {
            report::init_logger(verbosity.verbose)?;
            cmd_setup(ssid, password, setup_all, name, interface, save)
        }
        Commands::ShowConfig => cmd_show_config(),
    }
}

fn workflow(cfg: Config, interface: Option<String>) -> Workflow<WemoClient, Nmcli, Terminal> {
    let client = WemoClient::new(&cfg.settings);
    let nmcli = Nmcli::new(interface.or_else(|| cfg.settings.interface.clone()));
    Workflow::new(client, nmcli, Terminal, cfg.settings)
}

fn cmd_list(info: u8) -> Result<()> {
    let cfg = Config::load()?;
    workflow(cfg, None).list(DetailLevel::from_info_count(info))?;
    Ok(())
}

fn cmd_rename(path: &Path) -> Result<()> {
    let names = NameMapping::load(path)?;
    info!("loaded {} names from {}", names.len(), path.display());
    if names.is_empty() {
        warn!("no usable rows in {}", path.display());
    }

    let cfg = Config::load()?;
    let summary = workflow(cfg, None).rename(&names)?;
    info!(
        "renamed {} devices ({} without a name, {} failed)",
        summary.renamed, summary.unmatched, summary.failed
    );
    Ok(())
}

fn cmd_reset(options: ResetOptions) -> Result<()> {
    let cfg = Config::load()?;
    match workflow(cfg, None).reset(&options) {
        Ok(summary) if summary.attempted > 1 => info!(
            "reset {} of {} devices",
            summary.succeeded, summary.attempted
        ),
        Ok(_) => {}
        Err(e) => report::critical(&e),
    }
    Ok(())
}

fn cmd_setup(
    ssid: String,
    password: Option<String>,
    all: bool,
    name: Option<String>,
    interface: Option<String>,
    save: bool,
) -> Result<()> {
    let mut cfg = Config::load()?;

    // Argument first, then saved credentials; the workflow prompts otherwise.
    let password = match password.filter(|p| !p.is_empty()) {
        Some(p) => Some(p),
        None => cfg.find_network(&ssid).map(|network| {
            info!("using saved password for '{}'", ssid);
            network.password.clone()
        }),
    };

    if save {
        match password {
            Some(ref p) => {
                cfg.add_network(NetworkConfig {
                    ssid: ssid.clone(),
                    password: p.clone(),
                });
                cfg.save()?;
                info!("credentials for '{}' saved to config", ssid);
            }
            None => warn!("no password given, credentials for '{}' not saved", ssid),
        }
    }

    let options = SetupOptions {
        ssid,
        password,
        all,
        name,
    };
    match workflow(cfg, interface).setup(&options) {
        Ok(summary) if options.all => info!(
            "set up {} devices from {} access points ({} access points failed)",
            summary.configured,
            summary.access_points,
            summary.failed.len()
        ),
        Ok(_) => {}
        Err(e) => report::critical(&e),
    }
    Ok(())
}

fn cmd_show_config() -> Result<()> {
    let path = config::config_path()?;
    println!("Config file: {}", path.display());
    println!();

    let cfg = Config::load()?;
    let settings = &cfg.settings;
    println!("{:<24} {}", "discovery_timeout_secs", settings.discovery_timeout_secs);
    println!("{:<24} {}", "http_timeout_secs", settings.http_timeout_secs);
    println!("{:<24} {}", "setup_timeout_secs", settings.setup_timeout_secs);
    println!("{:<24} {}", "settle_delay_ms", settings.settle_delay_ms);
    println!("{:<24} {}", "ap_prefix", settings.ap_prefix);
    println!("{:<24} {}", "interface", settings.interface.as_deref().unwrap_or("-"));
    println!();

    if cfg.networks.is_empty() {
        println!("No saved networks.");
    } else {
        println!("{:<32} {}", "SSID", "PASSWORD");
        println!("{}", "-".repeat(48));
        for network in &cfg.networks {
            let masked_pw = "*".repeat(network.password.len().min(12));
            println!("{:<32} {}", network.ssid, masked_pw);
        }
    }

    Ok(())
}
