mod modules;
mod session;

use clap::{Parser, Subcommand};
use handspace_dispatch::{DispatcherConfig, run_fixed_interval};
use handspace_tools::DispatchInspector;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use session::Session;

#[derive(Parser)]
#[command(name = "handspace-cli", about = "CLI tool for the handspace interaction dispatcher")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run the scripted demo session
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "120")]
        ticks: u64,
        /// YAML dispatcher config
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Sleep between ticks at the configured rate instead of using a synthetic clock
        #[arg(long)]
        realtime: bool,
    },
    /// Print the effective dispatcher config as YAML
    Config {
        /// Config file to validate and print; defaults are used when omitted
        path: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<DispatcherConfig> {
    Ok(match path {
        Some(path) => DispatcherConfig::load(path)?,
        None => DispatcherConfig::default(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("handspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("dispatch: {}", handspace_dispatch::crate_info());
            println!("input: {}", handspace_input::crate_info());
            println!("ports: {}", handspace_ports::crate_info());
            println!("scene: {}", handspace_scene::crate_info());
            println!("tools: {}", handspace_tools::crate_info());
        }
        Commands::Simulate {
            ticks,
            config,
            realtime,
        } => {
            let config = load_config(config.as_ref())?;
            let interval = config.interval();
            println!(
                "Simulating {ticks} ticks at {} Hz ({})",
                config.target_hz,
                if realtime { "realtime" } else { "synthetic clock" }
            );

            let start = Instant::now();
            let mut session = Session::new(config, start)?;
            if realtime {
                let mut remaining = ticks;
                run_fixed_interval(interval, |now| {
                    if remaining == 0 {
                        return ControlFlow::Break(());
                    }
                    remaining -= 1;
                    session.step(now);
                    ControlFlow::Continue(())
                });
            } else {
                let mut now = start;
                for _ in 0..ticks {
                    now += interval;
                    session.step(now);
                }
            }

            println!("{}", DispatchInspector::summary(session.dispatcher()));
            for slot in DispatchInspector::slots(session.dispatcher()) {
                println!("  {slot}");
            }
            for running in DispatchInspector::running(session.dispatcher()) {
                println!("  running: {running}");
            }
            let totals = session.totals();
            println!(
                "Totals: started={} stopped={} evicted={} faults={} messages applied={} dropped={} ignored={}",
                totals.started,
                totals.stopped,
                totals.evicted,
                totals.faults,
                totals.messages_applied,
                totals.messages_dropped,
                totals.messages_ignored,
            );
            println!("Debug panel:");
            print!("{}", session.panel());

            session.finish()?;
            println!("Torn down: pointers removed={}", session.pointers_removed());
        }
        Commands::Config { path } => {
            let config = load_config(path.as_ref())?;
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
