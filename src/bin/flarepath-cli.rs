use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "flarepath-cli")]
#[command(about = "Inspect a running flarepath server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server status and uptime
    Status,
    /// Show request, byte and connection counters
    Stats,
    /// List registered routes
    Routes,
    /// Create a session, optionally bound to a user
    Session {
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{base}/api/status")).send().await?,
        Commands::Stats => client.get(format!("{base}/api/stats")).send().await?,
        Commands::Routes => client.get(format!("{base}/api/routes")).send().await?,
        Commands::Session { user } => {
            let mut request = client.post(format!("{base}/api/session"));
            if let Some(user) = user {
                request = request.query(&[("user", user)]);
            }
            request.send().await?
        }
    };
    print_response(res).await?;

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
