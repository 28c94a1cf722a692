//! moviemgr - TMDB movie search, watchlist, and favorites CLI.

/// Application configuration (TOML).
mod config;

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{AppConfig, TmdbConfig, resolve_config_path};
use moviemgr_api::tmdb::{Movie, TmdbApi, TmdbClient, TmdbError, auth};

/// User-Agent sent when the config does not override it.
const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Search movies by title.
    Search(SearchArgs),
    /// List the account watchlist.
    Watchlist(CredentialArgs),
    /// List the account favorites.
    Favorites(CredentialArgs),
    /// Add a movie to (or remove it from) the watchlist.
    MarkWatchlist(MarkArgs),
    /// Add a movie to (or remove it from) the favorites.
    MarkFavorite(MarkArgs),
    /// Download a poster image.
    Poster(PosterArgs),
    /// Request a token and print the website authorization URL.
    WebAuth(WebAuthArgs),
    /// Inspect or edit the config file.
    Config(ConfigCommand),
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "The Matrix").
    #[arg(long, required = true)]
    query: String,
}

/// Account credentials for commands that sign in.
#[derive(clap::Args)]
struct CredentialArgs {
    /// TMDB username.
    #[arg(long, env = "TMDB_USERNAME")]
    username: String,
    /// TMDB password.
    #[arg(long, env = "TMDB_PASSWORD", hide_env_values = true)]
    password: String,
}

/// Arguments for the `mark-watchlist` and `mark-favorite` subcommands.
#[derive(clap::Args)]
struct MarkArgs {
    /// TMDB movie ID.
    #[arg(long, required = true)]
    id: u64,
    /// Remove the movie instead of adding it.
    #[arg(long)]
    remove: bool,
    /// Account credentials.
    #[command(flatten)]
    credentials: CredentialArgs,
}

/// Arguments for the `poster` subcommand.
#[derive(clap::Args)]
struct PosterArgs {
    /// Poster path as returned by search (e.g. "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg").
    #[arg(long, required = true)]
    path: String,
    /// Output file.
    #[arg(long, required = true)]
    output: PathBuf,
}

/// Arguments for the `web-auth` subcommand.
#[derive(clap::Args)]
struct WebAuthArgs {
    /// Open the authorization URL in the system browser.
    #[arg(long)]
    open: bool,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show the resolved configuration (the API key is never printed).
    Show,
    /// Set one `[tmdb]` value.
    Set(ConfigSetArgs),
}

/// Arguments for the `config set` subcommand.
#[derive(clap::Args)]
struct ConfigSetArgs {
    /// Key under `[tmdb]` (e.g. "`api_key`", "`poster_width`").
    #[arg(long, required = true)]
    key: String,
    /// New value.
    #[arg(long, required = true)]
    value: String,
}

/// Loads the config file for `dir`.
///
/// # Errors
///
/// Returns an error if the path cannot be resolved or the file cannot be parsed.
fn load_config(dir: Option<&PathBuf>) -> Result<AppConfig> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    AppConfig::load(&config_path).context("failed to load config")
}

/// Parses an optional URL override from the config.
///
/// # Errors
///
/// Returns an error if the value is not a valid URL.
fn parse_url(key: &str, value: Option<&str>) -> Result<Option<Url>> {
    value
        .map(|v| Url::parse(v).with_context(|| format!("invalid tmdb.{key}: {v}")))
        .transpose()
}

/// Builds a `TmdbClient` from `TMDB_API_KEY` and the `[tmdb]` config table.
///
/// # Errors
///
/// Returns an error if no API key is available, a URL override is invalid,
/// or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(config: &TmdbConfig) -> Result<TmdbClient> {
    let api_key = std::env::var("TMDB_API_KEY")
        .ok()
        .or_else(|| config.api_key.clone())
        .context("TMDB_API_KEY environment variable or tmdb.api_key in config.toml is required")?;

    let mut builder = TmdbClient::builder()
        .api_key(api_key)
        .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));
    if let Some(url) = parse_url("base_url", config.base_url.as_deref())? {
        builder = builder.base_url(url);
    }
    if let Some(url) = parse_url("web_base_url", config.web_base_url.as_deref())? {
        builder = builder.web_base_url(url);
    }
    if let Some(url) = parse_url("image_base_url", config.image_base_url.as_deref())? {
        builder = builder.image_base_url(url);
    }
    if let Some(width) = &config.poster_width {
        builder = builder.poster_width(width);
    }
    if let Some(redirect) = &config.redirect_to {
        builder = builder.redirect_to(redirect);
    }

    builder.build().context("failed to build TMDB client")
}

/// Signs in, runs `operation`, then signs out.
///
/// Sign-out runs whether or not `operation` succeeded.
///
/// # Errors
///
/// Returns an error if sign-in, the account lookup, or `operation` fails.
async fn with_session<T, F, Fut>(
    client: &TmdbClient,
    credentials: &CredentialArgs,
    operation: F,
) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, TmdbError>>,
{
    auth::login(client, &credentials.username, &credentials.password)
        .await
        .context("TMDB login failed")?;

    let result = match client.account().await {
        Ok(account) => {
            tracing::debug!(username = %account.username, "Signed in as account {}", account.id);
            operation().await.map_err(anyhow::Error::from)
        }
        Err(e) => Err(anyhow::Error::from(e).context("failed to resolve TMDB account")),
    };

    client.log_out().await;
    result
}

/// Prints movies as a table.
fn print_movies(movies: &[Movie]) {
    tracing::info!("Results: {}", movies.len());
    tracing::info!("ID\tReleaseDate\tTitle");
    for movie in movies {
        tracing::info!(
            "{}\t{}\t{}",
            movie.id,
            movie
                .release_date
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or("-"),
            movie.title,
        );
    }
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_tmdb_client(&config.tmdb)?;

    let movies = client
        .search(&args.query)
        .await
        .context("TMDB search/movie request failed")?;

    print_movies(&movies);
    Ok(())
}

/// Runs the `watchlist` subcommand.
///
/// # Errors
///
/// Returns an error if sign-in or the API request fails.
#[instrument(skip_all)]
async fn run_watchlist(credentials: &CredentialArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_tmdb_client(&config.tmdb)?;

    let movies = with_session(&client, credentials, || client.watchlist())
        .await
        .context("TMDB watchlist request failed")?;

    print_movies(&movies);
    Ok(())
}

/// Runs the `favorites` subcommand.
///
/// # Errors
///
/// Returns an error if sign-in or the API request fails.
#[instrument(skip_all)]
async fn run_favorites(credentials: &CredentialArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_tmdb_client(&config.tmdb)?;

    let movies = with_session(&client, credentials, || client.favorites())
        .await
        .context("TMDB favorites request failed")?;

    print_movies(&movies);
    Ok(())
}

/// Runs the `mark-watchlist` subcommand.
///
/// # Errors
///
/// Returns an error if sign-in or the API request fails, or TMDB does not
/// acknowledge the change.
#[instrument(skip_all)]
async fn run_mark_watchlist(args: &MarkArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_tmdb_client(&config.tmdb)?;

    let accepted = with_session(&client, &args.credentials, || {
        client.mark_watchlist(args.id, !args.remove)
    })
    .await
    .context("TMDB watchlist update failed")?;

    if !accepted {
        bail!("TMDB did not acknowledge the watchlist update for movie {}", args.id);
    }
    if args.remove {
        tracing::info!("Removed movie {} from the watchlist", args.id);
    } else {
        tracing::info!("Added movie {} to the watchlist", args.id);
    }
    Ok(())
}

/// Runs the `mark-favorite` subcommand.
///
/// # Errors
///
/// Returns an error if sign-in or the API request fails, or TMDB does not
/// acknowledge the change.
#[instrument(skip_all)]
async fn run_mark_favorite(args: &MarkArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_tmdb_client(&config.tmdb)?;

    let accepted = with_session(&client, &args.credentials, || {
        client.mark_favorite(args.id, !args.remove)
    })
    .await
    .context("TMDB favorite update failed")?;

    if !accepted {
        bail!("TMDB did not acknowledge the favorite update for movie {}", args.id);
    }
    if args.remove {
        tracing::info!("Removed movie {} from the favorites", args.id);
    } else {
        tracing::info!("Added movie {} to the favorites", args.id);
    }
    Ok(())
}

/// Runs the `poster` subcommand.
///
/// # Errors
///
/// Returns an error if the download fails or the file cannot be written.
#[instrument(skip_all)]
async fn run_poster(args: &PosterArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_tmdb_client(&config.tmdb)?;

    let bytes = client
        .poster_image(&args.path)
        .await
        .context("poster download failed")?;
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::info!("Saved {} bytes to {}", bytes.len(), args.output.display());
    Ok(())
}

/// Runs the `web-auth` subcommand.
///
/// # Errors
///
/// Returns an error if the token request fails or the browser cannot be opened.
#[instrument(skip_all)]
async fn run_web_auth(args: &WebAuthArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config = load_config(dir)?;
    let client = build_tmdb_client(&config.tmdb)?;

    let url = auth::begin_web_authorization(&client)
        .await
        .context("TMDB request token failed")?;

    tracing::info!("Approve the request token at: {url}");
    if args.open {
        open::that(url.as_str()).context("failed to open browser")?;
    }
    Ok(())
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded.
fn run_config_show(dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;
    let tmdb = &config.tmdb;

    let api_key_source = if std::env::var_os("TMDB_API_KEY").is_some() {
        "environment"
    } else if tmdb.api_key.is_some() {
        "config"
    } else {
        "not set"
    };

    tracing::info!("Config file: {}", config_path.display());
    tracing::info!("api_key: ({api_key_source})");
    tracing::info!(
        "user_agent: {}",
        tmdb.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    );
    for (key, value) in [
        ("base_url", &tmdb.base_url),
        ("web_base_url", &tmdb.web_base_url),
        ("image_base_url", &tmdb.image_base_url),
        ("poster_width", &tmdb.poster_width),
        ("redirect_to", &tmdb.redirect_to),
    ] {
        tracing::info!("{key}: {}", value.as_deref().unwrap_or("(default)"));
    }
    Ok(())
}

/// Runs the `config set` subcommand.
///
/// # Errors
///
/// Returns an error if the key is unknown, a URL value is invalid, or the
/// config file cannot be read or written.
fn run_config_set(args: &ConfigSetArgs, dir: Option<&PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let mut config = AppConfig::load(&config_path).context("failed to load config")?;

    if args.key.ends_with("_url") {
        parse_url(&args.key, Some(&args.value))?;
    }
    config.tmdb.set(&args.key, &args.value)?;
    config.save(&config_path).context("failed to save config")?;

    tracing::info!("Updated tmdb.{} in {}", args.key, config_path.display());
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_ref();
    match cli.command {
        Commands::Search(args) => run_search(&args, dir).await,
        Commands::Watchlist(credentials) => run_watchlist(&credentials, dir).await,
        Commands::Favorites(credentials) => run_favorites(&credentials, dir).await,
        Commands::MarkWatchlist(args) => run_mark_watchlist(&args, dir).await,
        Commands::MarkFavorite(args) => run_mark_favorite(&args, dir).await,
        Commands::Poster(args) => run_poster(&args, dir).await,
        Commands::WebAuth(args) => run_web_auth(&args, dir).await,
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Show => run_config_show(dir),
            ConfigSubcommands::Set(args) => run_config_set(&args, dir),
        },
    }
}
