use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("failed to run container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("{service} never accepted a client")]
    NotReady { service: &'static str },
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
