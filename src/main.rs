use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

mod actions;
mod api;
mod cart;
mod classifier;
mod config;
mod domain;
mod download;
mod error;
mod models;
mod payload;
mod processor;
mod session;

use actions::ScanAction;
use cart::{Cart, ProductCatalog};
use classifier::Classifier;
use config::{Config, ConfigArgs};
use session::{Rejection, ScanSession};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one or more scanned payloads and print the results as JSON
    Classify {
        /// Decoded payload text
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Read payloads line by line from stdin, as a capture loop would deliver them
    Scan,
    /// Process a JSON file containing an array of scanned payloads
    Batch {
        /// Path to the input JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Add scanned product serial numbers to a cart and print the total
    Cart {
        /// Scanned serial numbers
        #[arg(required = true)]
        serials: Vec<String>,
    },
    /// Download the package behind an APK link
    Download {
        /// The scanned APK link
        text: String,
    },
    /// Start the API server
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("scanlens=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::build_config(&cli.config)?;
    let classifier = Classifier::from_config(&config);
    let catalog = load_catalog(&config)?;

    match cli.command {
        Commands::Classify { texts } => {
            let records: Vec<_> = texts
                .iter()
                .map(|text| processor::process_scan(text, &classifier, catalog.as_ref()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Scan => {
            run_scan_loop(&config, &classifier, catalog.as_ref())?;
        }
        Commands::Batch { input, output } => {
            info!("Processing scans from {} to {}", input.display(), output.display());
            process_file(input, output, &classifier, catalog.as_ref())?;
        }
        Commands::Cart { serials } => {
            let catalog = catalog.context("The cart needs a product catalog (--catalog)")?;
            let mut cart = Cart::new();
            for serial in &serials {
                if let Err(e) = cart.add_scanned(&catalog, serial) {
                    tracing::warn!("{}", e);
                }
            }
            print_cart(&cart);
        }
        Commands::Download { text } => {
            let result = classifier.classify(&text)?;
            let downloader = download::ApkDownloader::new(&config)?;
            let path = downloader.download(&result).await?;
            println!("{}", path.display());
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server_port);
            let state = api::ApiState {
                classifier,
                catalog,
                semaphore: tokio::sync::Semaphore::new(config.max_concurrency),
            };
            api::start_api_server(state, port).await;
        }
    }

    Ok(())
}

fn load_catalog(config: &Config) -> Result<Option<ProductCatalog>> {
    match &config.catalog_file {
        Some(path) => {
            let catalog = ProductCatalog::load(path)
                .with_context(|| format!("Failed to load product catalog {}", path.display()))?;
            Ok(Some(catalog))
        }
        None => Ok(None),
    }
}

fn process_file(
    input: PathBuf,
    output: PathBuf,
    classifier: &Classifier,
    catalog: Option<&ProductCatalog>,
) -> Result<()> {
    let input_data = std::fs::read_to_string(&input)?;
    let scans: Vec<String> = serde_json::from_str(&input_data)?;

    info!("Loaded {} scans from {}", scans.len(), input.display());

    let progress_bar = indicatif::ProgressBar::new(scans.len() as u64);
    progress_bar.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let mut results = Vec::with_capacity(scans.len());
    for raw in &scans {
        results.push(processor::process_scan(raw, classifier, catalog));
        progress_bar.inc(1);
    }

    progress_bar.finish_with_message("Processing complete");

    let output_data = serde_json::to_string_pretty(&results)?;
    std::fs::write(&output, output_data)?;

    info!("Wrote {} results to {}", results.len(), output.display());

    Ok(())
}

fn print_cart(cart: &Cart) {
    for item in cart.items() {
        println!(
            "{:>3} x {:<30} {:>10.2}",
            item.quantity,
            item.name,
            item.line_total()
        );
    }
    println!("{} items, total {:.2}", cart.item_count(), cart.total());
}

/// A control line typed into the scan loop.
#[derive(Debug, PartialEq, Eq)]
enum ScanCommand<'a> {
    Quit,
    Flash,
    Dismiss,
    ShowCart,
    ClearCart,
    Remove(Option<&'a str>),
    Quantity(Option<&'a str>, Option<u32>),
}

/// Recognizes the known `:` commands. Any other line, including unknown
/// `:`-prefixed text, is a payload.
fn parse_command(line: &str) -> Option<ScanCommand<'_>> {
    if !line.starts_with(':') {
        return None;
    }
    let mut words = line.split_whitespace();
    let command = match words.next()? {
        ":quit" => ScanCommand::Quit,
        ":flash" => ScanCommand::Flash,
        ":dismiss" => ScanCommand::Dismiss,
        ":cart" => ScanCommand::ShowCart,
        ":clear" => ScanCommand::ClearCart,
        ":remove" => ScanCommand::Remove(words.next()),
        ":qty" => ScanCommand::Quantity(
            words.next(),
            words.next().and_then(|q| q.parse::<u32>().ok()),
        ),
        _ => return None,
    };
    Some(command)
}

/// Drives a [`ScanSession`] from stdin. Known `:` commands control the
/// session and cart; everything else is treated as a decoded payload.
fn run_scan_loop(
    config: &Config,
    classifier: &Classifier,
    catalog: Option<&ProductCatalog>,
) -> Result<()> {
    let mut session = ScanSession::new(config.scan_cooldown);
    let mut cart = Cart::new();

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        match parse_command(&line) {
            Some(ScanCommand::Quit) => break,
            Some(ScanCommand::Flash) => println!("flash: {:?}", session.toggle_flash()),
            Some(ScanCommand::Dismiss) => {
                if let Some(result) = session.dismiss() {
                    println!("dismissed {}", result.tag());
                }
            }
            Some(ScanCommand::ShowCart) => print_cart(&cart),
            Some(ScanCommand::ClearCart) => cart.clear(),
            Some(ScanCommand::Remove(id)) => match id.map(|id| cart.remove(id)) {
                Some(Ok(item)) => println!("removed {}", item.name),
                Some(Err(e)) => println!("{}", e),
                None => println!("usage: :remove <product id>"),
            },
            Some(ScanCommand::Quantity(id, quantity)) => match (id, quantity) {
                (Some(id), Some(quantity)) => {
                    if let Err(e) = cart.set_quantity(id, quantity) {
                        println!("{}", e);
                    }
                }
                _ => println!("usage: :qty <product id> <quantity>"),
            },
            None => handle_payload(&line, &mut session, &mut cart, classifier, catalog),
        }
    }

    let (accepted, rejected) = session.counts();
    info!(
        "Scan loop finished: {} accepted, {} ignored, flash {:?}",
        accepted,
        rejected,
        session.flash()
    );
    Ok(())
}

fn handle_payload(
    raw: &str,
    session: &mut ScanSession,
    cart: &mut Cart,
    classifier: &Classifier,
    catalog: Option<&ProductCatalog>,
) {
    match session.admit(raw, Instant::now()) {
        Err(Rejection::Blank) => return,
        Err(Rejection::Cooldown) => {
            tracing::debug!("Repeated scan ignored");
            return;
        }
        Ok(()) => {}
    }

    let record = processor::process_scan(raw, classifier, catalog);
    let Some(result) = record.result else {
        return;
    };

    println!("[{}] {}", result.title(), result.content());
    match record.action {
        Some(ScanAction::AddToCart { product }) => {
            let item = cart.add(&product);
            println!("added {} (x{})", item.name, item.quantity);
        }
        Some(action) => match serde_json::to_string(&action) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to serialize action: {}", e),
        },
        None => {}
    }
    session.show(result);
    if let Some(current) = session.current() {
        tracing::debug!("Showing {} result", current.tag());
    }
}
