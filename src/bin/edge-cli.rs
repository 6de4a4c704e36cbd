use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

use edge_migrator::compiler::{compile, CompileOptions};
use edge_migrator::deploy::{ApiKey, Deployer, FastlyApi, API_KEY_HEADER};
use edge_migrator::export::{export_distribution, render_summary, CloudFrontSource};
use edge_migrator::observability::init_logging;
use edge_migrator::source::DistributionConfig;

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Compile CloudFront distributions to VCL snippets and deploy them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a distribution document and print the snippets
    Compile {
        /// Distribution document (JSON)
        file: PathBuf,

        #[arg(short, long)]
        service_id: String,

        /// Reject unsupported cache policy values
        #[arg(long)]
        strict: bool,

        /// Print the snippets as JSON instead of VCL
        #[arg(long)]
        json: bool,
    },
    /// Compile locally and deploy straight to the platform API
    Deploy {
        file: PathBuf,

        #[arg(short, long)]
        service_id: String,

        #[arg(short, long, env = "FASTLY_API_KEY", hide_env_values = true)]
        key: String,

        #[arg(long, default_value = "https://api.fastly.com")]
        api_url: Url,

        #[arg(long)]
        strict: bool,
    },
    /// Export a live CloudFront distribution as a distribution document
    Export {
        /// CloudFront distribution id
        #[arg(long)]
        dist_id: String,

        /// Where to write the JSON document
        #[arg(short, long, default_value = "distribution-dump.json")]
        output: PathBuf,

        /// Print a behavior summary table
        #[arg(long)]
        table: bool,
    },
    /// Send a distribution document to a running edge-migrator service
    Submit {
        file: PathBuf,

        #[arg(short, long)]
        service_id: String,

        #[arg(short, long, env = "FASTLY_API_KEY", hide_env_values = true)]
        key: String,

        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

fn options(strict: bool) -> CompileOptions {
    if strict {
        CompileOptions::strict()
    } else {
        CompileOptions::default()
    }
}

fn read_document(path: &Path) -> Result<DistributionConfig, Box<dyn std::error::Error>> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(Some("warn"));

    match cli.command {
        Commands::Compile {
            file,
            service_id,
            strict,
            json,
        } => {
            let compiled = compile(&read_document(&file)?, &service_id, &options(strict))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&compiled.snippets.rendered())?);
            } else {
                for snippet in compiled.snippets.iter() {
                    println!("# --- {} ({}) ---", snippet.name, snippet.snippet_type().as_str());
                    println!("{}", snippet.content());
                }
            }
        }
        Commands::Deploy {
            file,
            service_id,
            key,
            api_url,
            strict,
        } => {
            let compiled = compile(&read_document(&file)?, &service_id, &options(strict))?;
            let api = FastlyApi::new(reqwest::Client::new(), api_url, ApiKey::new(key));
            let report = Deployer::new(api).deploy(&service_id, &compiled.snippets).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Export {
            dist_id,
            output,
            table,
        } => {
            let source = CloudFrontSource::from_env().await;
            let export = export_distribution(&source, &dist_id, table).await?;
            std::fs::write(&output, serde_json::to_string_pretty(&export.document)?)?;
            println!("JSON written to {}", output.display());
            if table {
                println!();
                print!("{}", render_summary(&export.summary));
            }
        }
        Commands::Submit {
            file,
            service_id,
            key,
            url,
        } => {
            let body = std::fs::read(&file)?;
            let res = reqwest::Client::new()
                .post(format!("{}/cloudfront/service/{}", url.trim_end_matches('/'), service_id))
                .header(API_KEY_HEADER, HeaderValue::from_str(&key)?)
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
