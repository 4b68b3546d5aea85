use anyhow::{Context as AnyhowContext, Result};
use axum::{
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Response,
    Router,
};
use clap::{Args, Parser, Subcommand};
use probe_core::{assemble, snapshot_process_env, ProbeInput, Settings};
use probe_protocol::ProbeResponse;
use std::io;
use std::sync::Arc;

mod http_api;
mod lambda;
mod local;
mod server_security;

use local::LocalRequest;
use server_security::ServeGuard;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "lambda-probe")]
#[command(about = "Echo a sanitized view of the function's execution environment", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Module search path to scan instead of NODE_PATH
    #[arg(long, global = true, value_name = "PATHS")]
    search_path: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve invocations from the Lambda runtime API (default inside a function host)
    Lambda,

    /// Serve the probe over local HTTP on every method and path
    ServeHttp(ServeArgs),

    /// Assemble one report for a synthetic request and print the response body
    Report(ReportArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Address to bind (loopback unless --public)
    #[arg(long, env = "PROBE_BIND", default_value = "127.0.0.1:3000")]
    bind: String,

    /// Allow binding to non-loopback addresses (requires an auth token)
    #[arg(long)]
    public: bool,

    /// Bearer token required on every request (falls back to PROBE_AUTH_TOKEN)
    #[arg(long)]
    auth_token: Option<String>,
}

#[derive(Args)]
struct ReportArgs {
    /// Request path of the synthetic event
    #[arg(long, default_value = "/")]
    path: String,

    /// Request method of the synthetic event
    #[arg(long, default_value = "GET")]
    method: String,
}

fn local_input(request: &LocalRequest<'_>, search_path_override: Option<&str>) -> ProbeInput {
    let env = snapshot_process_env();
    let settings = Settings::from_env(&env);
    let region = local::region(&settings).to_string();
    let request_id = local::next_request_id();
    ProbeInput {
        event: local::local_event(request, &region, &request_id),
        context: local::local_context(&region, &request_id),
        env,
        settings,
        search_path: search_path_override.map(str::to_string),
    }
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // The runtime client is chatty at debug level
    if !cli.verbose {
        builder.filter_module("hyper", log::LevelFilter::Warn);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Some(Commands::Lambda) => lambda::run(cli.search_path).await?,
        Some(Commands::ServeHttp(args)) => serve_http(args, cli.search_path).await?,
        Some(Commands::Report(args)) => run_report(args, cli.search_path).await?,
        None if lambda::runtime_api_available() => lambda::run(cli.search_path).await?,
        None => anyhow::bail!(
            "No command given and {} is not set; run `lambda-probe --help`",
            lambda::RUNTIME_API_VAR
        ),
    }

    Ok(())
}

async fn run_report(args: ReportArgs, search_path: Option<String>) -> Result<()> {
    let headers = HeaderMap::new();
    let (path, query) = match args.path.split_once('?') {
        Some((path, query)) => (path, query),
        None => (args.path.as_str(), ""),
    };
    let request = LocalRequest {
        method: &args.method,
        path,
        query,
        headers: &headers,
    };

    let response = assemble(local_input(&request, search_path.as_deref())).await;
    print_stdout(&response.body)?;
    if !response.is_success() {
        anyhow::bail!("Probe failed with status {}", response.status_code);
    }
    Ok(())
}

struct HttpState {
    guard: ServeGuard,
    search_path: Option<String>,
}

async fn serve_http(args: ServeArgs, search_path: Option<String>) -> Result<()> {
    let auth_token_raw = args
        .auth_token
        .clone()
        .or_else(|| std::env::var(server_security::AUTH_TOKEN_ENV).ok());
    let guard = ServeGuard::new(auth_token_raw.as_deref(), args.public)?;
    let addrs = guard.resolve(&args.bind).await?;

    let state = Arc::new(HttpState { guard, search_path });
    let app = Router::new().fallback({
        let state = state.clone();
        move |method: Method, uri: Uri, headers: HeaderMap| {
            http_probe(method, uri, headers, state.clone())
        }
    });

    let listener = tokio::net::TcpListener::bind(addrs.as_slice())
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Serving probe on {base_url} (any method, any path)"))?;
    if state.guard.auth_enabled() {
        print_stdout("Auth enabled: add header 'Authorization: Bearer $PROBE_AUTH_TOKEN'")?;
    }
    if args.public {
        let addrs = addrs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        print_stdout(&format!(
            "Public bind enabled (--public). Resolved addresses: {addrs}"
        ))?;
    }
    print_stdout(&format!("Try: curl {base_url}/hello"))?;

    axum::serve(listener, app).await?;
    Ok(())
}

async fn http_probe(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    state: Arc<HttpState>,
) -> Result<Response, StatusCode> {
    if !state.guard.authorize(&headers) {
        log::warn!("Rejected unauthorized {method} {}", uri.path());
        return http_api::unauthorized_response();
    }

    let request = LocalRequest {
        method: method.as_str(),
        path: uri.path(),
        query: uri.query().unwrap_or_default(),
        headers: &headers,
    };
    let response: ProbeResponse =
        assemble(local_input(&request, state.search_path.as_deref())).await;
    log::info!("{method} {} -> {}", uri.path(), response.status_code);
    http_api::build_response(response)
}
