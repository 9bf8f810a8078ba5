//! Process entry point.
//!
//! Wires together the five pieces spec'd as independent components: load a
//! [`Config`], tokenize its log format, run the parser/aggregator loop
//! against the configured log source, and drive the WebSocket broadcast
//! server ([`vantage_ws`]) off the same [`Store`] on a fixed tick. There is
//! no flag parsing here (out of scope): the process reads `~/.vantage/
//! config.toml` if present and falls back to [`Config::default`] otherwise.

mod crash_hardening;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use vantage_classify::{ClassifierTables, GeoLookup, LegacyGeoIp, Mmdb};
use vantage_config::Config;
use vantage_parser::{IgnoreRules, ParseOptions, PredefinedFormat, Token, predefined_format, tokenize};
use vantage_resolver::Resolver;
use vantage_store::Store;
use vantage_types::GeoRecord;
use vantage_ws::{DynReader, DynWriter, Opcode, Packet};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    if let Err(err) = crash_hardening::apply() {
        tracing::warn!(%err, "continuing without crash dump hardening");
    }

    let config = load_config();
    run(config).await
}

async fn run(config: Config) -> Result<()> {
    let format_spec = resolve_format_spec(&config.log_format);
    let tokens = tokenize(&format_spec)
        .with_context(|| format!("parsing log format `{}`", config.log_format))?;

    let parse_opts = ParseOptions {
        date_format: config.date_format.clone(),
        time_format: config.time_format.clone(),
        ignore_qstr: config.no_query_string,
        double_decode: config.double_decode,
        code444_as_404: config.code444_as_404,
        static_extensions: config.static_extensions.clone(),
        ignore_crawlers: config.ignore_crawlers,
    };

    let ignore_rules = IgnoreRules::new(&config.exclude_ip, &config.ignore_referer, config.ignore_crawlers)
        .context("invalid --exclude-ip or --ignore-referer pattern")?;

    let classifiers = ClassifierTables { user_browsers: Vec::new(), real_os: config.real_os };
    let geo = open_geo_lookup(&config)?;

    let store = Arc::new(Mutex::new(Store::new()));
    let cache = open_cache(&config, &store)?;

    let (resolver, resolver_handle) = vantage_resolver::spawn(config.resolver_queue_capacity, config.no_term_resolver);

    let ws_config = vantage_ws::server_config(&config, hostname()).context("building websocket server config")?;
    let bound = vantage_ws::bind(&config).await.context("binding websocket listener")?;
    let (server_join, shutdown_tx, outbound_peer, inbound_peer) = vantage_ws::spawn(bound, ws_config);

    let outbound_writer: DynWriter = match &config.fifo_out {
        Some(path) => vantage_ws::fifo::open_fifo_writer(path)
            .await
            .context("opening outbound fifo for writing")?,
        None => Box::pin(outbound_peer.expect("in-memory outbound pipe present when fifo_out is unset")),
    };
    let inbound_reader: DynReader = match &config.fifo_in {
        Some(path) => vantage_ws::fifo::open_fifo_reader(path)
            .await
            .context("opening inbound fifo for reading")?,
        None => Box::pin(inbound_peer.expect("in-memory inbound pipe present when fifo_in is unset")),
    };

    let tick = Duration::from_secs(config.tick_interval_secs.max(1));
    let broadcast_task = tokio::spawn(broadcast_loop(Arc::clone(&store), config.clone(), outbound_writer, tick));
    let inbound_task = tokio::spawn(inbound_drain_loop(inbound_reader));
    let resolver_drain_task = tokio::spawn(resolver_drain_loop(Arc::clone(&store), resolver.clone(), Duration::from_millis(250)));
    let mut ingest_task = tokio::spawn(ingest_loop(
        config.clone(),
        tokens,
        parse_opts,
        ignore_rules,
        classifiers,
        geo,
        Arc::clone(&store),
        resolver.clone(),
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received interrupt, shutting down");
        }
        res = &mut ingest_task => {
            match res {
                Ok(Ok(())) => tracing::info!("log source reached end of input"),
                Ok(Err(err)) => tracing::error!(%err, "ingest loop failed"),
                Err(err) => tracing::error!(%err, "ingest task panicked"),
            }
        }
    }

    let _ = shutdown_tx.send(true);
    ingest_task.abort();
    broadcast_task.abort();
    inbound_task.abort();
    resolver_drain_task.abort();
    drop(resolver);
    let _ = resolver_handle.join().await;
    let _ = server_join.await;

    if let Some(cache) = &cache {
        if let Err(err) = cache.flush(&lock_store(&store)) {
            tracing::warn!(%err, "failed to flush cache on shutdown");
        }
    }

    Ok(())
}

fn lock_store(store: &Mutex<Store>) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolve a configured format name (`COMBINED`, `W3C`, ...) to its template
/// string, or treat the value as a literal template if it names no
/// predefined format (spec §6: `--log-format` accepts either).
fn resolve_format_spec(name: &str) -> String {
    match name.parse::<PredefinedFormat>() {
        Ok(fmt) => predefined_format(fmt).to_string(),
        Err(()) => name.to_string(),
    }
}

fn load_config() -> Config {
    let Some(path) = vantage_config::config_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match vantage_config::load_from_file(&path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to load config file, using defaults");
            Config::default()
        }
    }
}

fn open_geo_lookup(config: &Config) -> Result<Arc<dyn GeoLookup>> {
    let Some(path) = &config.geoip_database else {
        return Ok(Arc::new(NullGeo));
    };

    let is_mmdb = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("mmdb"));
    if is_mmdb {
        let mmdb = Mmdb::open(path).with_context(|| format!("opening geoip database {}", path.display()))?;
        Ok(Arc::new(mmdb))
    } else {
        Ok(Arc::new(LegacyGeoIp::open(path)))
    }
}

struct NullGeo;

impl GeoLookup for NullGeo {
    fn lookup(&self, _host: &str) -> GeoRecord {
        GeoRecord::unknown()
    }
}

fn open_cache(config: &Config, store: &Arc<Mutex<Store>>) -> Result<Option<vantage_store::persistence::Cache>> {
    let Some(dir) = &config.cache_dir else {
        return Ok(None);
    };
    let cache =
        vantage_store::persistence::Cache::open(dir).with_context(|| format!("opening counter cache at {}", dir.display()))?;
    if let Err(err) = cache.load_into(&mut lock_store(store)) {
        tracing::warn!(%err, "failed to replay cached counters, starting from zero");
    }
    Ok(Some(cache))
}

/// The `COMBINED`-format-style invalid/ignored-line accounting loop (spec
/// §7): a parse failure counts as `InvalidLine` and bumps `store.invalid`;
/// an ignore-rule match is `IgnoredLine` and is dropped silently.
async fn ingest_loop(
    config: Config,
    tokens: Vec<Token>,
    parse_opts: ParseOptions,
    ignore_rules: IgnoreRules,
    classifiers: ClassifierTables,
    geo: Arc<dyn GeoLookup>,
    store: Arc<Mutex<Store>>,
    resolver: Resolver,
) -> Result<()> {
    let source: std::pin::Pin<Box<dyn AsyncRead + Send>> = match &config.log_file {
        Some(path) => Box::pin(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening log file {}", path.display()))?,
        ),
        None => Box::pin(tokio::io::stdin()),
    };
    let mut lines = BufReader::new(source).lines();

    while let Some(line) = lines.next_line().await.context("reading log source")? {
        match vantage_parser::parse_line(&tokens, line.as_bytes(), &parse_opts) {
            Ok(item) => {
                let is_crawler = item.user_agent.as_deref().is_some_and(|ua| classifiers.is_crawler(ua));
                if ignore_rules.should_ignore(&item, is_crawler) {
                    continue;
                }
                let outcome = lock_store(&store).ingest(&item, &classifiers, geo.as_ref());
                for host in outcome.new_hosts {
                    resolver.enqueue(&host);
                }
            }
            Err(err) => {
                tracing::debug!(%err, line = %line, "invalid log line");
                lock_store(&store).invalid += 1;
            }
        }
    }

    Ok(())
}

/// Applies completed reverse-DNS lookups back onto the `HOSTS` module as
/// they arrive (spec §4.6), independent of the ingest loop's own pace.
async fn resolver_drain_loop(store: Arc<Mutex<Store>>, resolver: Resolver, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        for (ip, hostname) in resolver.drain_completions() {
            lock_store(&store).apply_resolved_host(&ip, hostname);
        }
    }
}

/// Serializes the current snapshot bundle and pushes it out as a
/// broadcast (`listener = 0`) text packet on every tick (spec §4.5
/// "Outbound path").
async fn broadcast_loop(store: Arc<Mutex<Store>>, config: Config, mut outbound: DynWriter, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let bundle = vantage_ws::build_bundle(&lock_store(&store), &config);
        let payload = match vantage_ws::serialize_bundle(&bundle) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(%err, "failed to serialize snapshot bundle");
                continue;
            }
        };
        let packet = Packet { listener: 0, opcode: u32::from(Opcode::Text.to_byte()), payload };
        if let Err(err) = vantage_ws::packet::write_packet(&mut outbound, &packet).await {
            tracing::warn!(%err, "failed writing snapshot bundle to outbound fifo, retrying next tick");
        }
    }
}

/// Drains client messages the server already authenticated/relayed.
/// Nothing in the current surface acts on them beyond observability; this
/// keeps the inbound fifo from filling up and reports transport failures.
async fn inbound_drain_loop(mut inbound: DynReader) {
    loop {
        match vantage_ws::packet::read_packet(&mut inbound).await {
            Ok(packet) => {
                tracing::debug!(
                    listener = packet.listener,
                    opcode = packet.opcode,
                    bytes = packet.payload.len(),
                    "received client message"
                );
            }
            Err(err) => {
                tracing::warn!(%err, "inbound fifo read failed, will retry");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

#[cfg(unix)]
fn hostname() -> String {
    let mut buf = vec![0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc == 0 {
        let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        if let Ok(name) = String::from_utf8(buf[..len].to_vec()) {
            return name;
        }
    }
    "vantage".to_string()
}

#[cfg(not(unix))]
fn hostname() -> String {
    "vantage".to_string()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_vantage_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    tracing_subscriber::registry().with(env_filter).init();
}

fn open_vantage_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let candidates = vantage_log_file_candidates();
    let mut warnings = Vec::new();

    for candidate in candidates {
        if let Some(parent) = candidate.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warnings.push(format!("failed to create log dir {}: {err}", parent.display()));
                continue;
            }
        }

        match std::fs::OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(err) => warnings.push(format!("failed to open log file {}: {err}", candidate.display())),
        }
    }

    (None, warnings)
}

fn vantage_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(config_path) = vantage_config::config_path() {
        if let Some(config_dir) = config_path.parent() {
            candidates.push(config_dir.join("logs").join("vantage.log"));
        }
    }

    candidates.push(PathBuf::from(".vantage").join("logs").join("vantage.log"));
    candidates
}
