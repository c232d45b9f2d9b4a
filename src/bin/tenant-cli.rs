use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use tenant_content::config::load_config_or_default;
use tenant_content::content::validator::safe_validate;
use tenant_content::tenant::{RequestContext, ResolutionStrategy, TenantResolver};

#[derive(Parser)]
#[command(name = "tenant-cli")]
#[command(about = "Management CLI for the tenant content service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "TENANT_CONTENT_ADMIN_KEY", default_value = "")]
    key: String,

    /// Settings file used by local commands.
    #[arg(short, long, env = "TENANT_CONTENT_CONFIG", default_value = "tenant-content.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a tenant config.json locally
    Validate { file: PathBuf },
    /// Show which tenant a request would resolve to
    Resolve {
        /// Strategies to try in order; defaults to the settings file
        #[arg(short, long, value_delimiter = ',')]
        strategy: Vec<String>,
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        path: Option<String>,
    },
    /// Check service status
    Status,
    /// List cached tenants
    Cache,
    /// Evict one tenant, or all tenants when no slug is given
    Clear { slug: Option<String> },
    /// Load tenants into the cache
    Preload {
        #[arg(required = true)]
        slugs: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Validate { file } => return validate(&file),
        Commands::Resolve {
            strategy,
            host,
            path,
        } => return resolve(&cli.config, &strategy, host.as_deref(), path.as_deref()),
        Commands::Status => client.get(format!("{}/admin/status", url)),
        Commands::Cache => client.get(format!("{}/admin/cache", url)),
        Commands::Clear { slug: None } => client.delete(format!("{}/admin/cache", url)),
        Commands::Clear { slug: Some(slug) } => {
            client.delete(format!("{}/admin/cache/{}", url, slug))
        }
        Commands::Preload { slugs } => client
            .post(format!("{}/admin/preload", url))
            .json(&json!({ "slugs": slugs })),
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

fn validate(file: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)?;
    let document: Value = match serde_json::from_str(&text) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("Error: {} is not valid JSON: {}", file.display(), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let report = safe_validate(&document);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn resolve(
    settings: &Path,
    strategy: &[String],
    host: Option<&str>,
    path: Option<&str>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config_or_default(settings)?;
    let resolver = TenantResolver::from_config(&config.resolver);
    let strategies: Vec<ResolutionStrategy> = if strategy.is_empty() {
        config.resolver.strategy_chain()
    } else {
        strategy.iter().map(|s| ResolutionStrategy::from(s.as_str())).collect()
    };

    let mut ctx = RequestContext::new();
    if let Some(host) = host {
        ctx = ctx.with_host(host);
    }
    if let Some(path) = path {
        ctx = ctx.with_path(path);
    }

    let slug = resolver.resolve_with_fallbacks(&ctx, &strategies);
    let output = json!({
        "strategies": strategies,
        "hostname": ctx.hostname,
        "pathname": ctx.pathname,
        "slug": slug,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(if slug.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(ExitCode::FAILURE);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(ExitCode::SUCCESS)
}
