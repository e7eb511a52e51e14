//! Builds the storage, cache and generator selected on the command line.

use crate::cli::{CacheBackendArg, GeneratorArg, StorageBackendArg, CLI};
use anyhow::Context;
use burrow_cache::{LayeredCache, MokaSettings, MokaUrlCache, NoopCache, RedisUrlCache};
use burrow_core::{Repository, UrlCache};
use burrow_generator::{CodeGenerator, Obfuscator, RandomGenerator, SeqGenerator};
use burrow_storage::{InMemoryRepository, MySqlRepository};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const MYSQL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn repository(cli: &CLI) -> anyhow::Result<Arc<dyn Repository>> {
    match cli.storage {
        StorageBackendArg::InMemory => Ok(Arc::new(InMemoryRepository::new())),
        StorageBackendArg::Mysql => {
            let dsn = cli
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(dsn, MYSQL_ACQUIRE_TIMEOUT)
                .await
                .context("failed to connect to mysql")?;
            repository
                .ensure_schema()
                .await
                .context("failed to create mysql schema")?;
            info!("Connected to mysql");
            Ok(Arc::new(repository))
        }
    }
}

pub async fn cache(cli: &CLI) -> anyhow::Result<Arc<dyn UrlCache>> {
    let moka = || {
        MokaUrlCache::new(
            MokaSettings::builder()
                .capacity(cli.cache_capacity)
                .max_ttl(cli.cache_ttl_ceiling())
                .build(),
        )
    };

    match cli.cache {
        CacheBackendArg::None => Ok(Arc::new(NoopCache)),
        CacheBackendArg::Moka => Ok(Arc::new(moka())),
        CacheBackendArg::Redis => Ok(Arc::new(redis(cli).await?)),
        CacheBackendArg::Layered => Ok(Arc::new(LayeredCache::new(
            moka(),
            redis(cli).await?,
            cli.cache_ttl_ceiling(),
        ))),
    }
}

async fn redis(cli: &CLI) -> anyhow::Result<RedisUrlCache> {
    let url = cli
        .redis_url
        .as_deref()
        .context("redis url is required for the redis and layered caches")?;
    let cache = RedisUrlCache::connect(url)
        .await
        .context("failed to connect to redis")?;
    info!("Connected to redis");
    Ok(cache)
}

pub fn generator(cli: &CLI) -> anyhow::Result<CodeGenerator> {
    let generator: CodeGenerator = match cli.generator {
        GeneratorArg::Random => RandomGenerator::new(cli.id_length)
            .context("invalid --id-length")?
            .into(),
        GeneratorArg::Seq => {
            let offset = cli.seq_offset.unwrap_or_default();
            info!(seq_offset = offset, "sequential generator starting");
            SeqGenerator::with_offset(Obfuscator::default(), offset)
                .context("invalid obfuscator")?
                .into()
        }
    };
    Ok(generator)
}
