use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "BURROW_LISTEN_ADDR";
pub const PUBLIC_DOMAIN_ENV: &str = "BURROW_PUBLIC_DOMAIN";
pub const PUBLIC_PORT_ENV: &str = "BURROW_PUBLIC_PORT";
pub const LIMIT_RATE_ENV: &str = "BURROW_LIMIT_RATE";
pub const BURST_SIZE_ENV: &str = "BURROW_BURST_SIZE";
pub const ADMISSION_TIMEOUT_MS_ENV: &str = "BURROW_ADMISSION_TIMEOUT_MS";
pub const STORAGE_BACKEND_ENV: &str = "BURROW_STORAGE";
pub const MYSQL_DSN_ENV: &str = "BURROW_MYSQL_DSN";
pub const CACHE_BACKEND_ENV: &str = "BURROW_CACHE";
pub const REDIS_URL_ENV: &str = "BURROW_REDIS_URL";
pub const CACHE_CAPACITY_ENV: &str = "BURROW_CACHE_CAPACITY";
pub const CACHE_TTL_CEILING_SECS_ENV: &str = "BURROW_CACHE_TTL_CEILING_SECS";
pub const CACHE_TIMEOUT_MS_ENV: &str = "BURROW_CACHE_TIMEOUT_MS";
pub const GENERATOR_ENV: &str = "BURROW_GENERATOR";
pub const ID_LENGTH_ENV: &str = "BURROW_ID_LENGTH";
pub const SEQ_OFFSET_ENV: &str = "BURROW_SEQ_OFFSET";
pub const MAX_ATTEMPTS_ENV: &str = "BURROW_MAX_ATTEMPTS";
pub const SWEEP_INTERVAL_SECS_ENV: &str = "BURROW_SWEEP_INTERVAL_SECS";
pub const LOG_FORMAT_ENV: &str = "BURROW_LOG_FORMAT";
pub const OTLP_ENDPOINT_ENV: &str = "BURROW_OTLP_ENDPOINT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_DOMAIN: &str = "http://localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "none")]
    None,
    #[value(name = "moka")]
    Moka,
    #[value(name = "redis")]
    Redis,
    /// Moka in front of Redis.
    #[value(name = "layered")]
    Layered,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::None => write!(f, "none"),
            CacheBackendArg::Moka => write!(f, "moka"),
            CacheBackendArg::Redis => write!(f, "redis"),
            CacheBackendArg::Layered => write!(f, "layered"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    #[value(name = "random")]
    Random,
    #[value(name = "seq")]
    Seq,
}

impl Display for GeneratorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorArg::Random => write!(f, "random"),
            GeneratorArg::Seq => write!(f, "seq"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Text => write!(f, "text"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

impl From<LogFormatArg> for burrow_telemetry::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => burrow_telemetry::LogFormat::Text,
            LogFormatArg::Json => burrow_telemetry::LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "burrow", about = "URL shortener HTTP gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Scheme and host used to build `shortUrl` in responses.
    #[arg(long, env = PUBLIC_DOMAIN_ENV, default_value = DEFAULT_PUBLIC_DOMAIN)]
    pub public_domain: String,

    #[arg(long, env = PUBLIC_PORT_ENV, default_value_t = 8080)]
    pub public_port: u16,

    /// Admitted operations per second.
    #[arg(long, env = LIMIT_RATE_ENV, default_value_t = 100.0)]
    pub limit_rate: f64,

    #[arg(long, env = BURST_SIZE_ENV, default_value_t = 50)]
    pub burst_size: u32,

    /// Give up on admission after this long. Waits indefinitely when unset.
    #[arg(long, env = ADMISSION_TIMEOUT_MS_ENV)]
    pub admission_timeout_ms: Option<u64>,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Moka
    )]
    pub cache: CacheBackendArg,

    #[arg(
        long,
        env = REDIS_URL_ENV,
        required_if_eq_any([("cache", "redis"), ("cache", "layered")])
    )]
    pub redis_url: Option<String>,

    #[arg(long, env = CACHE_CAPACITY_ENV, default_value_t = 10_000)]
    pub cache_capacity: u64,

    #[arg(long, env = CACHE_TTL_CEILING_SECS_ENV, default_value_t = 600)]
    pub cache_ttl_ceiling_secs: u64,

    #[arg(long, env = CACHE_TIMEOUT_MS_ENV, default_value_t = 50)]
    pub cache_timeout_ms: u64,

    #[arg(
        long,
        env = GENERATOR_ENV,
        value_enum,
        default_value_t = GeneratorArg::Random
    )]
    pub generator: GeneratorArg,

    /// Length of random short codes.
    #[arg(long, env = ID_LENGTH_ENV, default_value_t = 7)]
    pub id_length: usize,

    /// First sequence number for the `seq` generator. A restarted node must
    /// resume past every number it already issued, so this is required with
    /// durable storage. The gateway logs the value to resume from on shutdown.
    #[arg(
        long,
        env = SEQ_OFFSET_ENV,
        required_if_eq_all([("generator", "seq"), ("storage", "mysql")])
    )]
    pub seq_offset: Option<u64>,

    /// Short code collisions tolerated per shorten call.
    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = 5)]
    pub max_attempts: u32,

    /// Purge expired records this often. `0` turns the sweeper off.
    #[arg(long, env = SWEEP_INTERVAL_SECS_ENV, default_value_t = 0)]
    pub sweep_interval_secs: u64,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Text
    )]
    pub log_format: LogFormatArg,

    /// OTLP/gRPC collector for span export, e.g. `http://localhost:4317`.
    #[arg(long, env = OTLP_ENDPOINT_ENV)]
    pub otlp_endpoint: Option<String>,
}

impl CLI {
    /// `{public_domain}:{public_port}`, the prefix of every `shortUrl`.
    pub fn public_base_url(&self) -> String {
        format!(
            "{}:{}",
            self.public_domain.trim_end_matches('/'),
            self.public_port
        )
    }

    pub fn admission_timeout(&self) -> Option<Duration> {
        self.admission_timeout_ms.map(Duration::from_millis)
    }

    pub fn cache_ttl_ceiling(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_ceiling_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}
