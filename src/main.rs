use clap::{Parser, Subcommand};
use tracing::info;

use ownership_panel::config::Config;
use ownership_panel::llm::OpenAiClient;
use ownership_panel::logging;
use ownership_panel::master;
use ownership_panel::merge;
use ownership_panel::tasks;

#[derive(Parser)]
#[command(name = "ownership_panel")]
#[command(about = "Corporate-ownership history panel builder (Orbis + LLM research)")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the master company file from the raw firms and Orbis extracts
    MergeRaw {
        /// Firms panel CSV inside RAW_DATA_PATH
        #[arg(long, default_value = "ALL_BvDID_all_firms_update.csv")]
        firms_file: String,
        /// Orbis controlling-firms CSV inside RAW_DATA_PATH
        #[arg(long, default_value = "PANEL_controlling_firms_orbis.csv")]
        orbis_file: String,
    },
    /// Run the LLM web-search research call for one company
    WebSearch {
        /// Bureau van Dijk company ID
        #[arg(long)]
        bvd_id: String,
        /// LLM model to use
        #[arg(long, default_value = "gpt-5")]
        model: String,
    },
    /// Run the LLM structuring call for one company
    Structure {
        /// Bureau van Dijk company ID
        #[arg(long)]
        bvd_id: String,
        /// LLM model to use
        #[arg(long, default_value = "gpt-5")]
        model: String,
    },
    /// Format one company's structured LLM response into its panel CSV
    Format {
        /// Bureau van Dijk company ID
        #[arg(long)]
        bvd_id: String,
        /// LLM model to use
        #[arg(long, default_value = "gpt-5")]
        model: String,
    },
    /// Process every company in the master file, resuming from artifacts
    Run {
        /// Number of new companies to process (excluding already processed ones)
        #[arg(long)]
        limit: Option<usize>,
        /// LLM model to use
        #[arg(long, default_value = "gpt-5")]
        model: String,
    },
    /// Concatenate all per-company panel CSVs into the processed master file
    MergeProcessed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::MergeRaw {
            firms_file,
            orbis_file,
        } => {
            let rows = master::merge_raw(&config, &firms_file, &orbis_file)?;
            println!(
                "Raw master file created successfully ({rows} rows) at {}",
                config.master_data_path.display()
            );
        }
        Commands::WebSearch { bvd_id, model } => {
            let client = OpenAiClient::from_config(&config)?;
            tasks::run_web_search(&config, &client, &bvd_id, &model).await?;
        }
        Commands::Structure { bvd_id, model } => {
            let client = OpenAiClient::from_config(&config)?;
            tasks::run_structuring(&config, &client, &bvd_id, &model).await?;
        }
        Commands::Format { bvd_id, model } => {
            let name = master::company_orbis_name(&config.master_data_path, &bvd_id)?;
            println!("Cleaning panel data of {name} ({bvd_id})...");
            tasks::run_format(&config, &bvd_id, &model)?;
        }
        Commands::Run { limit, model } => {
            let client = OpenAiClient::from_config(&config)?;
            let summary = tasks::run_all(&config, &client, &model, limit).await?;
            info!(
                total = summary.total,
                processed = summary.processed,
                failed = summary.failed,
                "driver run finished"
            );
            println!("\n📊 Run summary:");
            println!("   Companies:        {}", summary.total);
            println!("   Already complete: {}", summary.already_complete);
            println!("   Processed:        {}", summary.processed);
            println!("   Failed:           {}", summary.failed);
        }
        Commands::MergeProcessed => {
            let (files, rows) = merge::merge_processed(&config)?;
            println!(
                "Merged {files} CSV files ({rows} rows) into {}/{}.csv",
                config.processed_data_path.display(),
                merge::PROCESSED_MASTER_NAME
            );
        }
    }
    Ok(())
}
