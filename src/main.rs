use anyhow::Result;
use chrono::Utc;
use log::{error, info};
use std::env;

use listing_export::config::{ExtractConfig, SinkKind};
use listing_export::csv_writer::RenderContext;
use listing_export::env_loader;
use listing_export::extract::ExtractOptions;
use listing_export::pipeline::{self, RunOptions, RunOutcome};
use listing_export::storage::JsonFileStore;

#[tokio::main]
async fn main() -> Result<()> {
    env_loader::load_env();
    env_logger::init();

    info!("Starting listing extraction.");

    // Positional args override the environment: [storage dump] [format]
    let args: Vec<String> = env::args().skip(1).collect();
    let mut config = ExtractConfig::from_env()?;
    config.apply_args(&args)?;

    let store = JsonFileStore::open(&config.storage_file)?;
    let sink = config.sink.build();

    // "Today" is fixed once for the whole run.
    let today = Utc::now().date_naive();
    let mut extract_options = ExtractOptions::new(
        config.format,
        RenderContext::new(today).with_label(config.label.clone()),
    );
    extract_options.storage_key = config.storage_key.clone();

    let run_options = RunOptions {
        extract: extract_options,
        sample_size: config.sample_size,
        top_areas: config.top_areas,
    };

    println!("{}", "=".repeat(60));
    println!("Extracting listings from {:?}", config.storage_file);
    println!("{}", "=".repeat(60));

    let mut stdout = std::io::stdout();
    match pipeline::run(&store, sink.as_ref(), &run_options, &mut stdout).await {
        Ok(RunOutcome::Delivered(summary)) => {
            info!("Delivered {} listings to {}", summary.unique_records, sink.describe());
            if config.sink == SinkKind::Clipboard {
                println!("\n📋 Next steps:");
                println!("1. Open a text editor");
                println!("2. Paste the copied data");
                println!("3. Save it as a .csv file");
            }
            Ok(())
        }
        Ok(RunOutcome::Fallback { error, .. }) => {
            info!("Delivery failed ({}); text was printed for manual copy.", error);
            Ok(())
        }
        Err(e) => {
            error!("Extraction failed: {}", e);
            eprintln!("❌ {}", e);
            Err(e.into())
        }
    }
}
