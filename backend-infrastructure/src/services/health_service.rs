use std::sync::Arc;

use async_trait::async_trait;
use backend_domain::ports::{DirectoryRepository, HealthCheckService};

pub struct DefaultHealthService {
    directory: Arc<dyn DirectoryRepository>,
}

impl DefaultHealthService {
    pub fn new(directory: Arc<dyn DirectoryRepository>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl HealthCheckService for DefaultHealthService {
    async fn check_database(&self) -> anyhow::Result<bool> {
        self.directory.ping().await.map(|_| true)
    }
}
