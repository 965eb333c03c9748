//! Event Heatmap CLI
//!
//! Calendar heatmap of synthetic events, rendered in the terminal.

use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use event_heatmap::{
    config::Config,
    core::legend,
    render::render,
    source::{EventSource, SyntheticSource},
    FilterController, IntensityBand, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "event-heatmap")]
#[command(version = VERSION)]
#[command(about = "Calendar heatmap of event counts per day", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Filters shared by the rendering commands.
#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
    /// Show a single calendar year instead of the trailing year
    #[arg(long)]
    year: Option<i32>,

    /// Date range start (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Date range end (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// Only show days in this intensity band (0-4)
    #[arg(long)]
    band: Option<u8>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the heatmap fill up live until Ctrl+C
    Watch {
        #[command(flatten)]
        filters: FilterArgs,

        /// Batch emission interval in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Redraw interval in milliseconds
        #[arg(long, default_value = "1000")]
        refresh_ms: u64,
    },

    /// Render the heatmap once after the first batch arrives
    Render {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print the view model as JSON instead of the grid
        #[arg(long)]
        json: bool,
    },

    /// List the year filter options
    Years,

    /// Show the intensity legend
    Legend,

    /// Show configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },

    /// Serve the heatmap over HTTP (requires server feature)
    Serve {
        /// Port to listen on (0 picks a free port)
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            filters,
            interval_ms,
            refresh_ms,
        } => {
            cmd_watch(&filters, interval_ms, refresh_ms);
        }
        Commands::Render { filters, json } => {
            cmd_render(&filters, json);
        }
        Commands::Years => {
            cmd_years();
        }
        Commands::Legend => {
            cmd_legend();
        }
        Commands::Config { init } => {
            cmd_config(init);
        }
        Commands::Serve { port } => {
            cmd_serve(port);
        }
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {e}; using defaults");
            Config::default()
        }
    }
}

/// Build a controller over the synthetic source and apply CLI filters.
fn start_controller(config: &Config, args: &FilterArgs) -> FilterController<SyntheticSource> {
    let zone = config.zone().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let source = SyntheticSource::new(config.synthetic(), zone);

    let mut controller =
        FilterController::new(source, zone, config.year_options).unwrap_or_else(|e| {
            eprintln!("Error starting event source: {e}");
            std::process::exit(1);
        });

    if let Some(year) = args.year {
        if let Err(e) = controller.select_year(year) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    if args.from.is_some() || args.to.is_some() {
        if let Err(e) = controller.apply_date_range_str(args.from.as_deref(), args.to.as_deref())
        {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    if let Some(ordinal) = args.band {
        match IntensityBand::from_ordinal(ordinal) {
            Some(band) => {
                controller.apply_intensity_filter(band);
            }
            None => {
                eprintln!("Error: intensity band must be between 0 and 4, got {ordinal}");
                std::process::exit(1);
            }
        }
    }

    controller
}

fn cmd_watch(args: &FilterArgs, interval_ms: Option<u64>, refresh_ms: u64) {
    let mut config = load_config();
    if let Some(ms) = interval_ms {
        config.batch_interval = Duration::from_millis(ms.max(1));
    }
    let mut controller = start_controller(&config, args);

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let receiver = controller.source().receiver().clone();
    let refresh = Duration::from_millis(refresh_ms.max(50));
    let mut last_draw = Instant::now().checked_sub(refresh).unwrap_or_else(Instant::now);

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(batch) => {
                controller.deliver(batch);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                eprintln!("Event source disconnected unexpectedly");
                break;
            }
        }

        if last_draw.elapsed() >= refresh {
            // Clear screen and move the cursor home before redrawing
            print!("\x1b[2J\x1b[H");
            println!("Event Heatmap v{VERSION}  (Ctrl+C to stop)");
            println!();
            println!("{}", render(&controller.view()));
            last_draw = Instant::now();
        }
    }

    println!();
    println!("Stopping ingestion...");
    controller.stop_ingestion();
    println!("{}", controller.stats().summary());
}

fn cmd_render(args: &FilterArgs, json: bool) {
    let config = load_config();
    let mut controller = start_controller(&config, args);

    // Wait for the first batch of the current generation
    let deadline = Instant::now() + config.batch_interval + Duration::from_secs(1);
    while controller.pump() == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    controller.stop_ingestion();

    if json {
        match serde_json::to_string_pretty(&controller.view()) {
            Ok(output) => println!("{output}"),
            Err(e) => {
                eprintln!("Error serializing view: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("{}", render(&controller.view()));
    }
}

fn cmd_years() {
    let config = load_config();
    let zone = config.zone().unwrap_or_default();
    let today = zone.today();

    println!("Year filter options");
    println!("===================");
    for option in event_heatmap::core::year_options(today, config.year_options) {
        println!(
            "  {}  {} .. {}  ({} days)",
            option.year,
            option.window_start,
            option.window_end,
            event_heatmap::core::days_in_year(option.year)
        );
    }
}

fn cmd_legend() {
    println!("Intensity bands (share of the busiest day)");
    println!("==========================================");
    let ranges = ["0%", "1-25%", "26-50%", "51-75%", "76-100%"];
    for (entry, range) in legend().iter().zip(ranges.iter()) {
        println!("  band {}  {:>8}  {}", entry.band, range, entry.color);
    }
    println!();
    println!(
        "Selected band highlight: {}",
        event_heatmap::core::ColorToken::Highlight
    );
}

fn cmd_config(init: bool) {
    if init {
        if let Err(e) = Config::default().save() {
            eprintln!("Error saving config: {e}");
            std::process::exit(1);
        }
        println!("Wrote default configuration to {:?}", Config::config_path());
        return;
    }

    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

#[cfg(feature = "server")]
fn cmd_serve(port: u16) {
    use event_heatmap::server::{run, ServerConfig};

    let config = load_config();
    let controller = start_controller(&config, &FilterArgs::default());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error creating runtime: {e}");
            std::process::exit(1);
        }
    };

    runtime.block_on(async move {
        let (addr, shutdown_tx) = match run(ServerConfig::new(port), controller).await {
            Ok(started) => started,
            Err(e) => {
                eprintln!("Error starting server: {e}");
                std::process::exit(1);
            }
        };
        println!("Serving heatmap on http://{addr} (Ctrl+C to stop)");

        let _ = tokio::signal::ctrl_c().await;
        println!();
        println!("Shutting down...");
        let _ = shutdown_tx.send(());
        tokio::time::sleep(Duration::from_millis(200)).await;
    });
}

#[cfg(not(feature = "server"))]
fn cmd_serve(_port: u16) {
    eprintln!("Error: serve requires the `server` feature (cargo build --features server)");
    std::process::exit(1);
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: could not install Ctrl+C handler: {e}");
    }
}
