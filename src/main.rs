#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::doc_markdown)]

use std::path::PathBuf;

use clap::Parser;
use skills_organizer::{
    host::tree::WidgetTree, OrganizerConfig, SharedConfig, SkillsOrganizer, Trigger,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Preview how the configured layout rearranges the stats tab
#[derive(Default, Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Extra YAML file layered over the user configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to write logs to
    #[arg(short, long, value_name = "FILE_PATH")]
    log_to: Option<String>,

    /// Stop after reconciling instead of restoring the default tab
    #[arg(long)]
    no_teardown: bool,
}

fn main() -> anyhow::Result<()> {
    let mut args = Args::parse();
    logging_init(&mut args);

    log::info!(
        "Welcome to {} version {}!",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    );

    let config = OrganizerConfig::load_from_disk(args.config.as_deref());

    let mut tree = WidgetTree::with_stats_tab()?;
    let mut organizer = SkillsOrganizer::new(SharedConfig::new(config));
    let sender = organizer.sender();

    sender.post(Trigger::Activate);
    organizer.pump(&mut tree);
    println!("{}", tree.debug_print());

    if !args.no_teardown {
        sender.post(Trigger::Deactivate);
        organizer.pump(&mut tree);
        println!("After teardown:\n{}", tree.debug_print());
    }

    Ok(())
}

fn logging_init(args: &mut Args) {
    let file_writer = args.log_to.take().and_then(|log_file_path| {
        match std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&log_file_path)
        {
            Ok(file) => {
                println!("Logging to {}", &log_file_path);
                Some(file)
            }
            Err(e) => {
                println!("Failed to open log file (path: {e:?}): {log_file_path}");
                None
            }
        }
    });

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr),
        )
        .with(
            /* read RUST_LOG env var */
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    if let Some(writer) = file_writer {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry.init();
    }

    log_panics::init();
}
