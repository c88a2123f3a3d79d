//! wallet-link command line front end.
//!
//! Drives the connection state machine from a terminal: the session lives in
//! the configured storage directory, the XUMM flow prints a deep link to
//! open on the phone, and `submit` signs through the active wallet before
//! handing the envelope to Horizon.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use wallet_link::bridge::XummBridgeFactory;
use wallet_link::config::{load_or_default, WalletConfig};
use wallet_link::observability::logging::init_logging;
use wallet_link::wallet::adapters::DetachedExtension;
use wallet_link::wallet::{
    AdapterRegistry, ConnectOutcome, FileStorage, NetworkTable, SessionStore, StellarNetwork,
    TransactionRequest, TransactionSubmitter, TransactionTracker, WalletProvider, WalletStore,
};

#[derive(Parser)]
#[command(name = "wallet-link")]
#[command(about = "Connect Stellar wallets and submit signed transactions", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show passphrases and endpoints per network
    Networks,
    /// List supported wallets and whether they are available here
    Wallets,
    /// Show the persisted session
    Status,
    /// Connect a wallet (freighter, xumm)
    Connect { provider: WalletProvider },
    /// Forget the persisted session
    Disconnect,
    /// Move the persisted session to another network (testnet, mainnet, futurenet)
    SwitchNetwork { network: StellarNetwork },
    /// Sign an XDR envelope with the connected wallet and submit it
    Submit {
        #[arg(long)]
        xdr: String,
        #[arg(long, default_value = "wallet-link transaction")]
        description: String,
        /// Network to submit to; defaults to the session's network
        #[arg(long)]
        network: Option<StellarNetwork>,
    },
}

struct App {
    config: WalletConfig,
    networks: NetworkTable,
    store: WalletStore,
}

impl App {
    fn new(config: WalletConfig) -> Self {
        let networks = NetworkTable::new(config.network.clone());
        let registry = AdapterRegistry::new()
            .with_extension(Arc::new(DetachedExtension))
            .with_bridge(Arc::new(XummBridgeFactory::new(config.xumm.clone())));
        let storage = Arc::new(FileStorage::new(&config.session.storage_dir));
        let sessions = SessionStore::with_key(storage, config.session.key.clone());
        let store = WalletStore::new(Arc::new(registry), sessions, networks.default_network());

        Self {
            config,
            networks,
            store,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    init_logging(&config.observability);

    tracing::debug!(
        storage_dir = %config.session.storage_dir,
        default_network = %config.network.default,
        "Configuration loaded"
    );

    let app = App::new(config);

    match cli.command {
        Commands::Networks => {
            let table: Vec<_> = StellarNetwork::ALL
                .into_iter()
                .map(|n| app.networks.resolve(n))
                .collect();
            print_json(&table)?;
        }
        Commands::Wallets => {
            let installed: Vec<_> = app
                .store
                .registry()
                .list_installed()
                .await
                .iter()
                .map(|a| a.provider())
                .collect();
            let wallets: Vec<_> = app
                .store
                .registry()
                .list_supported()
                .iter()
                .map(|a| {
                    json!({
                        "provider": a.provider(),
                        "name": a.name(),
                        "installUrl": a.install_url(),
                        "installed": installed.contains(&a.provider()),
                    })
                })
                .collect();
            print_json(&wallets)?;
        }
        Commands::Status => {
            print_json(&app.store.sessions().load())?;
        }
        Commands::Connect { provider } => {
            let outcome = app.store.connect(provider).await;
            if let ConnectOutcome::Failed(reason) = &outcome {
                eprintln!("Error: {}", reason);
            }
            print_json(&*app.store.snapshot())?;
        }
        Commands::Disconnect => {
            app.store.sessions().clear();
            tracing::info!("Wallet session forgotten");
            print_json(&*app.store.snapshot())?;
        }
        Commands::SwitchNetwork { network } => match app.store.sessions().set_network(network) {
            Some(session) => print_json(&session)?,
            None => {
                eprintln!(
                    "No persisted session; {} stays the default network (set network.default to change it)",
                    app.config.network.default
                );
                std::process::exit(1);
            }
        },
        Commands::Submit {
            xdr,
            description,
            network,
        } => {
            app.store.restore_session().await;
            let state = app.store.snapshot();
            let Some(provider) = state.provider.filter(|_| state.is_connected()) else {
                eprintln!("Error: no wallet connected. Run `wallet-link connect <provider>` first.");
                std::process::exit(1);
            };

            let adapter = app.store.registry().resolve(provider)?;
            let submitter = TransactionSubmitter::new(app.networks.clone(), &app.config.submission);
            let request = TransactionRequest {
                description,
                xdr,
                network: network.unwrap_or(state.network),
            };

            let tracker = TransactionTracker::new();
            let mut progress = tracker.subscribe();
            let watcher = tokio::spawn(async move {
                while progress.changed().await.is_ok() {
                    let status = *progress.borrow_and_update();
                    eprintln!("... {:?}", status);
                    if status.is_terminal() {
                        break;
                    }
                }
            });

            let result = submitter
                .sign_and_submit_tracked(&adapter, &request, &tracker)
                .await;
            drop(tracker);
            let _ = watcher.await;

            print_json(&result)?;
            if !result.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
