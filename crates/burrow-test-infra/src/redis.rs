use crate::{Result, TestInfraError, POLL_INTERVAL, READY_TIMEOUT};
use redis::aio::MultiplexedConnection;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};
use tokio::sync::OnceCell;

const REDIS_PORT: u16 = 6379;
const REDIS_TAG: &str = "8.6.0";

/// A throwaway Redis server, removed when dropped.
pub struct RedisServer {
    container: ContainerAsync<GenericImage>,
}

impl RedisServer {
    pub async fn start() -> Result<Self> {
        let container = GenericImage::new("redis", REDIS_TAG)
            .with_exposed_port(REDIS_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
            .start()
            .await?;
        Ok(Self { container })
    }

    /// `redis://host:port`. `localhost` is pinned to IPv4 since the port is
    /// only mapped there.
    pub async fn url(&self) -> Result<String> {
        let host = match self.container.get_host().await?.to_string().as_str() {
            "localhost" => "127.0.0.1".to_string(),
            other => other.to_string(),
        };
        let port = self.container.get_host_port_ipv4(REDIS_PORT).await?;
        Ok(format!("redis://{host}:{port}"))
    }

    /// A multiplexed connection that has answered a `PING`.
    pub async fn connection(&self) -> Result<MultiplexedConnection> {
        let url = self.url().await?;
        let url = url.as_str();
        let ready = OnceCell::new();

        awaitility::at_most(READY_TIMEOUT)
            .poll_interval(POLL_INTERVAL)
            .until_async(|| async {
                match ping(url).await {
                    Ok(conn) => ready.set(conn).is_ok(),
                    Err(_) => false,
                }
            })
            .await;

        ready
            .into_inner()
            .ok_or(TestInfraError::NotReady { service: "redis" })
    }
}

async fn ping(url: &str) -> redis::RedisResult<MultiplexedConnection> {
    let client = redis::Client::open(url)?;
    let mut conn = client.get_multiplexed_async_connection().await?;
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(conn)
}
