use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use repofetch_core::{sign_payload, RepoQueryParams};
use serde_json::{json, Value};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

/// repofetch: operate and exercise a repofetch server
#[derive(Parser, Debug)]
#[command(name = "repofetch")]
#[command(about = "Operator tool for the repofetch GitHub App server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the X-Hub-Signature-256 value for a payload
    Sign(SignArgs),
    /// Send a signed installation_repositories webhook to a server
    SendWebhook(SendWebhookArgs),
    /// Query a server's repository listing
    Repos(ReposArgs),
}

#[derive(Parser, Debug)]
struct SignArgs {
    /// Webhook secret
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    secret: String,

    /// File containing the payload (reads stdin if omitted)
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SendWebhookArgs {
    /// Webhook endpoint
    #[arg(long, default_value = "http://localhost:3000/webhook")]
    url: String,

    /// Webhook secret
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    secret: String,

    /// Repositories to report as added (owner/name), repeatable
    #[arg(long = "full-name", required = true, num_args = 1..)]
    full_names: Vec<String>,

    /// Installation id placed in the payload
    #[arg(long, default_value_t = 1)]
    installation_id: u64,

    /// X-GitHub-Event header value
    #[arg(long, default_value = "installation_repositories")]
    event: String,

    /// Sign with the wrong key; the server is expected to answer 401
    #[arg(long)]
    bad_signature: bool,
}

#[derive(Parser, Debug)]
struct ReposArgs {
    /// Listing endpoint
    #[arg(long, default_value = "http://localhost:3000/api/repos")]
    url: String,

    /// Substring of name or description
    #[arg(long)]
    q: Option<String>,

    /// Exact metadata tag
    #[arg(long)]
    tag: Option<String>,

    #[arg(long)]
    language: Option<String>,

    /// Field to sort by
    #[arg(long)]
    sort: Option<String>,

    #[arg(long, value_parser = ["asc", "desc"])]
    order: Option<String>,

    #[arg(long)]
    page: Option<u64>,

    #[arg(long)]
    per_page: Option<u64>,

    /// Print the raw JSON response
    #[arg(long)]
    json: bool,
}

fn read_payload(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read payload file {}", path.display()))
        }
        None => {
            let mut buffer = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read payload from stdin")?;
            Ok(buffer)
        }
    }
}

fn repositories_added_payload(installation_id: u64, full_names: &[String]) -> Value {
    let repositories: Vec<Value> = full_names
        .iter()
        .map(|full_name| {
            let name = full_name.rsplit('/').next().unwrap_or(full_name);
            json!({
                "full_name": full_name,
                "name": name,
                "private": false,
            })
        })
        .collect();

    json!({
        "action": "added",
        "installation": { "id": installation_id },
        "repository_selection": "selected",
        "repositories_added": repositories,
        "repositories_removed": [],
    })
}

fn run_sign(args: SignArgs) -> Result<()> {
    let payload = read_payload(args.file.as_ref())?;
    println!("{}", sign_payload(&args.secret, &payload));
    Ok(())
}

async fn run_send_webhook(client: &reqwest::Client, args: SendWebhookArgs) -> Result<()> {
    let payload = repositories_added_payload(args.installation_id, &args.full_names);
    let body = serde_json::to_vec(&payload).context("Failed to encode payload")?;

    let signing_key = if args.bad_signature {
        format!("{}-wrong", args.secret)
    } else {
        args.secret.clone()
    };
    let signature = sign_payload(&signing_key, &body);

    let response = client
        .post(&args.url)
        .header("Content-Type", "application/json")
        .header("X-GitHub-Event", &args.event)
        .header("X-GitHub-Delivery", uuid::Uuid::new_v4().to_string())
        .header("X-Hub-Signature-256", signature)
        .body(body)
        .send()
        .await
        .with_context(|| format!("Failed to send webhook to {}", args.url))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .context("Failed to read webhook response body")?;
    println!("{} {}", status.as_u16(), text);

    let expected = if args.bad_signature {
        reqwest::StatusCode::UNAUTHORIZED
    } else {
        reqwest::StatusCode::OK
    };
    if status != expected {
        bail!("Expected status {}, got {}", expected.as_u16(), status.as_u16());
    }
    Ok(())
}

fn query_params(args: &ReposArgs) -> RepoQueryParams {
    RepoQueryParams {
        q: args.q.clone(),
        tag: args.tag.clone(),
        language: args.language.clone(),
        sort: args.sort.clone(),
        order: args.order.clone(),
        page: args.page.map(|p| p.to_string()),
        per_page: args.per_page.map(|p| p.to_string()),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut shortened: String = text.chars().take(width.saturating_sub(1)).collect();
        shortened.push('…');
        shortened
    }
}

fn render_table(page: &Value) -> String {
    let mut out = format!(
        "{:<40} {:>7} {:<12} {:>8} {:<20}\n",
        "REPOSITORY", "STARS", "LANGUAGE", "PRIORITY", "TAGS"
    );

    for repo in page["repos"].as_array().map(Vec::as_slice).unwrap_or_default() {
        let tags = repo["metadata"]["tags"]
            .as_array()
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();
        let marker = if repo["metadata"]["highlighted"].as_bool().unwrap_or(false) {
            "*"
        } else {
            " "
        };
        out.push_str(&format!(
            "{}{:<39} {:>7} {:<12} {:>8} {:<20}\n",
            marker,
            truncate(repo["full_name"].as_str().unwrap_or("?"), 39),
            repo["stargazers_count"].as_u64().unwrap_or(0),
            truncate(repo["language"].as_str().unwrap_or("-"), 12),
            repo["metadata"]["priority"].as_i64().unwrap_or(0),
            truncate(&tags, 20),
        ));
    }

    out.push_str(&format!(
        "page {} ({} per page): {} of {} repositories matched\n",
        page["page"], page["per_page"], page["filtered"], page["total"]
    ));
    out
}

async fn run_repos(client: &reqwest::Client, args: ReposArgs) -> Result<()> {
    let response = client
        .get(&args.url)
        .query(&query_params(&args))
        .send()
        .await
        .with_context(|| format!("Failed to query {}", args.url))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .context("Failed to parse repository listing response")?;

    if !status.is_success() {
        bail!(
            "Server answered {}: {}",
            status.as_u16(),
            body["error"].as_str().unwrap_or("unknown error")
        );
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&body).context("Failed to format response")?
        );
    } else {
        print!("{}", render_table(&body));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = reqwest::Client::builder()
        .user_agent(concat!("repofetch-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .context("Failed to create HTTP client")?;

    match cli.command {
        Commands::Sign(args) => run_sign(args),
        Commands::SendWebhook(args) => run_send_webhook(&client, args).await,
        Commands::Repos(args) => run_repos(&client, args).await,
    }
}
