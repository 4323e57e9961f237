use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::json;
use std::error::Error;

#[derive(Parser)]
#[command(name = "ticket-categorizer-cli")]
#[command(about = "Ticket Categorizer CLI", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single ticket
    Analyze {
        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Train both classifiers from a CSV dataset on the server
    Train {
        #[arg(value_name = "DATASET_PATH")]
        dataset: String,
    },

    /// Hot-swap one classifier from a persisted artifact
    Update {
        #[arg(value_name = "ARTIFACT_PATH")]
        artifact: String,
    },

    /// Evaluate the category classifier against a labeled dataset
    Evaluate {
        #[arg(value_name = "DATASET_PATH")]
        dataset: String,
    },

    /// Show metadata for the currently bound models
    Info,

    /// List the category taxonomy
    Categories {
        /// Show sub-categories for this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Check model readiness
    Ready,

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Analyze { title, description } => {
            let response = client
                .post(format!("{}/v1/analyze", cli.endpoint))
                .json(&json!({
                    "ticket_id": uuid::Uuid::new_v4(),
                    "title": title,
                    "description": description,
                }))
                .send()
                .await?;
            print_json(response).await?;
        }

        Commands::Train { dataset } => {
            let response = client
                .post(format!("{}/v1/model/train", cli.endpoint))
                .json(&json!({ "training_data_path": dataset }))
                .send()
                .await?;
            print_json(response).await?;
        }

        Commands::Update { artifact } => {
            let response = client
                .post(format!("{}/v1/model/update", cli.endpoint))
                .json(&json!({ "artifact_path": artifact }))
                .send()
                .await?;
            print_json(response).await?;
        }

        Commands::Evaluate { dataset } => {
            let response = client
                .post(format!("{}/v1/model/evaluate", cli.endpoint))
                .json(&json!({ "test_data_path": dataset }))
                .send()
                .await?;
            print_json(response).await?;
        }

        Commands::Info => {
            let response = client
                .get(format!("{}/v1/model/info", cli.endpoint))
                .send()
                .await?;
            print_json(response).await?;
        }

        Commands::Categories { category } => {
            let url = match category {
                Some(c) => format!("{}/v1/categories/{}/subcategories", cli.endpoint, c),
                None => format!("{}/v1/categories", cli.endpoint),
            };
            let response = client.get(url).send().await?;
            print_json(response).await?;
        }

        Commands::Ready => {
            let response = client
                .get(format!("{}/v1/model/ready", cli.endpoint))
                .send()
                .await?;
            print_json(response).await?;
        }

        Commands::Health => {
            let response = client.get(format!("{}/health", cli.endpoint)).send().await?;
            print_json(response).await?;
        }
    }

    Ok(())
}

async fn print_json(response: reqwest::Response) -> Result<(), Box<dyn Error>> {
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    if !status.is_success() {
        eprintln!("Request failed with status {}", status);
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
