use crate::{Result, TestInfraError, POLL_INTERVAL, READY_TIMEOUT};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tokio::sync::OnceCell;
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;

#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "8.4".to_string(), setter(into))]
    image_tag: String,
    #[builder(default = "burrow".to_string(), setter(into))]
    database: String,
    #[builder(default = "burrow".to_string(), setter(into))]
    username: String,
    #[builder(default = "burrow".to_string(), setter(into))]
    password: String,
    #[builder(default = 5)]
    max_connections: u32,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A throwaway MySQL server, removed when dropped.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    pub async fn start(config: MysqlConfig) -> Result<Self> {
        let env = [
            ("MYSQL_DATABASE", config.database.as_str()),
            ("MYSQL_USER", config.username.as_str()),
            ("MYSQL_PASSWORD", config.password.as_str()),
            ("MYSQL_ROOT_PASSWORD", config.password.as_str()),
        ];
        let image = env.into_iter().fold(
            GenericImage::new("mysql", config.image_tag.as_str())
                .with_exposed_port(MYSQL_PORT.tcp())
                .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
                .with_env_var("MYSQL_ROOT_HOST", "%"),
            |image, (key, value)| image.with_env_var(key, value),
        );
        let container = image.start().await?;

        Ok(Self { container, config })
    }

    pub async fn database_url(&self) -> Result<String> {
        let MysqlConfig {
            username,
            password,
            database,
            ..
        } = &self.config;
        let host = self.container.get_host().await?;
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;
        Ok(format!("mysql://{username}:{password}@{host}:{port}/{database}"))
    }

    /// Connection pool to the test database. MySQL logs "ready" before it
    /// accepts remote clients, so connecting is polled until it succeeds.
    pub async fn pool(&self) -> Result<MySqlPool> {
        let url = self.database_url().await?;
        let url = url.as_str();
        let options = MySqlPoolOptions::new().max_connections(self.config.max_connections);
        let pool = OnceCell::new();

        awaitility::at_most(READY_TIMEOUT)
            .poll_interval(POLL_INTERVAL)
            .until_async(|| async {
                match options.clone().connect(url).await {
                    Ok(connected) => pool.set(connected).is_ok(),
                    Err(_) => false,
                }
            })
            .await;

        pool.into_inner()
            .ok_or(TestInfraError::NotReady { service: "mysql" })
    }
}
