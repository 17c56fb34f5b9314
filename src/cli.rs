//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::info;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::argon2_credentials::Argon2Credentials;
use crate::adapters::csv_adapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::jwt_tokens::JwtTokens;
use crate::adapters::notifier::{LogNotifier, WebhookNotifier};
use crate::adapters::push_hub::PushHub;
use crate::adapters::quote::{AlphaVantageSource, YahooSource, http_client};
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::access::AccessGateway;
use crate::domain::error::StockfolioError;
use crate::domain::instrument_cache::InstrumentCache;
use crate::domain::price_refresh::PriceRefresher;
use crate::domain::quotes::QuoteRouter;
use crate::domain::settings::{DatabaseSettings, QuoteSettings, Settings};
use crate::ports::notify_port::NotifyPort;
use crate::ports::store_port::StorePort;

/// Symbols fetched by `seed` when none are given.
pub const SEED_SYMBOLS: [&str; 8] = [
    "RELIANCE",
    "TCS",
    "INFY",
    "HDFCBANK",
    "ICICIBANK",
    "HINDUNILVR",
    "BHARTIARTL",
    "SBIN",
];

#[derive(Parser, Debug)]
#[command(name = "stockfolio", about = "Personal investment portfolio tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the API server and the price refresh loop
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create an administrator; the password is read from stdin
    CreateAdmin {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "Admin User")]
        name: String,
    },
    /// Fetch live data for a set of symbols into the instrument cache
    Seed {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols
        #[arg(long, value_delimiter = ',')]
        symbols: Option<Vec<String>>,
    },
    /// Bulk upsert instruments from a CSV file
    ImportInstruments {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Run one price refresh cycle without batch delays
    RefreshOnce {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::CreateAdmin {
            config,
            email,
            name,
        } => run_create_admin(&config, &email, &name),
        Command::Seed { config, symbols } => run_seed(&config, symbols),
        Command::ImportInstruments { config, file } => run_import(&config, &file),
        Command::RefreshOnce { config } => run_refresh_once(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, StockfolioError> {
    eprintln!("Loading config from {}", path.display());
    let config = FileConfigAdapter::from_file(path)?;
    Settings::from_config(&config)
}

fn open_store(settings: &DatabaseSettings) -> Result<Arc<SqliteAdapter>, StockfolioError> {
    let store = SqliteAdapter::from_settings(settings)?;
    store.initialize_schema()?;
    Ok(Arc::new(store))
}

fn quote_router(settings: &QuoteSettings) -> Result<QuoteRouter, StockfolioError> {
    let client = http_client(settings.timeout)?;
    let primary = YahooSource::new(client.clone(), &settings.yahoo_url);
    let secondary = AlphaVantageSource::new(
        client,
        &settings.alpha_vantage_url,
        settings.alpha_vantage_api_key.clone(),
    );
    Ok(QuoteRouter::new(Arc::new(primary), Arc::new(secondary)))
}

fn notifier(settings: &Settings) -> Result<Arc<dyn NotifyPort>, StockfolioError> {
    match settings.webhook_url.as_deref() {
        Some(url) => Ok(Arc::new(WebhookNotifier::new(
            http_client(settings.quotes.timeout)?,
            url,
        ))),
        None => Ok(Arc::new(LogNotifier)),
    }
}

fn instrument_cache(settings: &Settings) -> Result<Arc<InstrumentCache>, StockfolioError> {
    let store: Arc<dyn StorePort> = open_store(&settings.database)?;
    Ok(Arc::new(InstrumentCache::new(
        store,
        quote_router(&settings.quotes)?,
    )))
}

fn runtime() -> Result<tokio::runtime::Runtime, StockfolioError> {
    Ok(tokio::runtime::Runtime::new()?)
}

fn run_serve(config_path: &Path) -> Result<(), StockfolioError> {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};

        let settings = load_settings(config_path)?;
        let store: Arc<dyn StorePort> = open_store(&settings.database)?;
        let router = quote_router(&settings.quotes)?;
        let notifier = notifier(&settings)?;

        runtime()?.block_on(async move {
            let hub = Arc::new(PushHub::default());
            hub.start();
            let state = Arc::new(AppState::new(
                store,
                Arc::new(Argon2Credentials::new()),
                Arc::new(JwtTokens::from_settings(&settings.auth)),
                notifier,
                router,
                hub.clone(),
            ));

            let refresher = if settings.refresh.enabled {
                info!("price refresh enabled: {}", settings.refresh);
                let refresher = Arc::new(PriceRefresher::new(
                    state.instruments.clone(),
                    hub.clone(),
                    settings.refresh,
                ));
                Some(refresher.spawn())
            } else {
                info!("price refresh disabled");
                None
            };

            let listener = tokio::net::TcpListener::bind(settings.listen.as_str()).await?;
            eprintln!("Listening on {}", settings.listen);

            let shutdown_hub = hub.clone();
            axum::serve(listener, build_router(state))
                .with_graceful_shutdown(async move {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        log::error!("failed to listen for shutdown signal: {}", e);
                    }
                    eprintln!("Shutting down");
                    // Closing the hub ends every open push connection.
                    shutdown_hub.stop();
                })
                .await?;

            if let Some(handle) = refresher {
                handle.stop();
            }
            hub.stop();
            Ok::<(), StockfolioError>(())
        })
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        Err(StockfolioError::Internal {
            reason: "web feature is required for serve".into(),
        })
    }
}

fn read_password(input: impl BufRead) -> Result<String, StockfolioError> {
    let password = input
        .lines()
        .next()
        .transpose()?
        .map(|line| line.trim_end_matches(['\r', '\n']).to_string())
        .unwrap_or_default();
    if password.is_empty() {
        return Err(StockfolioError::missing("password"));
    }
    Ok(password)
}

fn run_create_admin(config_path: &Path, email: &str, name: &str) -> Result<(), StockfolioError> {
    let settings = load_settings(config_path)?;
    let store: Arc<dyn StorePort> = open_store(&settings.database)?;
    let gateway = AccessGateway::new(
        store,
        Arc::new(Argon2Credentials::new()),
        Arc::new(JwtTokens::from_settings(&settings.auth)),
        Arc::new(LogNotifier),
    );

    eprintln!("Enter password for {}:", email);
    let password = read_password(io::stdin().lock())?;
    let user = gateway.create_user(email, &password, name, true)?;
    eprintln!("Admin {} created", user.email);
    println!("{}", user.id);
    Ok(())
}

fn run_seed(config_path: &Path, symbols: Option<Vec<String>>) -> Result<(), StockfolioError> {
    let settings = load_settings(config_path)?;
    let cache = instrument_cache(&settings)?;
    let symbols = symbols
        .unwrap_or_else(|| SEED_SYMBOLS.iter().map(|s| s.to_string()).collect());

    let mut seeded = 0;
    runtime()?.block_on(async {
        for symbol in &symbols {
            match cache.lookup(symbol).await {
                Ok(instrument) if instrument.cached => {
                    eprintln!("  {}: provider failed, kept stored record", instrument.symbol)
                }
                Ok(instrument) => {
                    eprintln!("  {}: {}", instrument.symbol, instrument.current_price);
                    seeded += 1;
                }
                Err(e) => eprintln!("  {}: {}", symbol, e),
            }
        }
    });
    eprintln!("Seeded {} of {} symbols", seeded, symbols.len());
    Ok(())
}

fn run_import(config_path: &Path, file: &Path) -> Result<(), StockfolioError> {
    let settings = load_settings(config_path)?;
    let store: Arc<dyn StorePort> = open_store(&settings.database)?;
    // Imports never touch the providers.
    let cache = InstrumentCache::new(store, quote_router(&settings.quotes)?);

    eprintln!("Reading instruments from {}", file.display());
    let inputs = csv_adapter::read_instruments_file(file)?;
    let (mut created, mut updated) = (0, 0);
    for input in inputs {
        let (_, was_created) = cache.upsert(input)?;
        if was_created {
            created += 1;
        } else {
            updated += 1;
        }
    }
    eprintln!("Imported instruments: {} created, {} updated", created, updated);
    Ok(())
}

fn run_refresh_once(config_path: &Path) -> Result<(), StockfolioError> {
    let settings = load_settings(config_path)?;
    let cache = instrument_cache(&settings)?;
    let hub = Arc::new(PushHub::default());
    let refresher = PriceRefresher::new(cache, hub, settings.refresh.without_batch_delay());

    let report = runtime()?.block_on(refresher.run_cycle())?;
    eprintln!(
        "Refreshed {} instruments in {} batches ({} failed)",
        report.refreshed, report.batches, report.failed
    );
    Ok(())
}
