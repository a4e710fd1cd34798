use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "ipconf-cli")]
#[command(about = "Command-line client for the ipconf service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the IP address the service sees for this client
    Ip,
    /// Print the current configuration document
    Get,
    /// Replace the address list
    Set {
        /// Addresses, in order
        #[arg(required = true)]
        addresses: Vec<String>,
    },
    /// Save an empty address list
    Clear,
    /// Check service health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Ip => client.get(format!("{}/api/ip", base)).send().await?,
        Commands::Get => client.get(format!("{}/api/config", base)).send().await?,
        Commands::Set { addresses } => {
            client
                .post(format!("{}/api/config", base))
                .json(&json!({ "ipAddresses": addresses }))
                .send()
                .await?
        }
        Commands::Clear => {
            client
                .post(format!("{}/api/config", base))
                .json(&json!({ "ipAddresses": [] }))
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        eprintln!("Response: {}", text);
        std::process::exit(1);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
