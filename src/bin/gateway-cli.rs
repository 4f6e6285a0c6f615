use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Inspect circuit breakers of a running gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3001", env = "GATEWAY_URL")]
    url: String,

    /// Shared internal key (required when the gateway runs in production)
    #[arg(short, long, env = "INTERNAL_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show breaker state and rolling statistics
    Breakers {
        /// Only show this service
        #[arg(short, long)]
        service: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert("x-internal-key", HeaderValue::from_str(key)?);
    }

    match cli.command {
        Commands::Breakers { service } => {
            let mut request = client
                .get(format!(
                    "{}/internal/circuit-breakers",
                    cli.url.trim_end_matches('/')
                ))
                .headers(headers);
            if let Some(service) = &service {
                request = request.query(&[("service", service)]);
            }
            let res = request.send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
