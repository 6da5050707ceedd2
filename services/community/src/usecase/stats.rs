use crate::domain::repository::DirectoryRepository;
use crate::domain::types::DirectoryStats;
use crate::error::CommunityError;

pub struct GetStatsUseCase<D: DirectoryRepository> {
    pub directory: D,
}

impl<D: DirectoryRepository> GetStatsUseCase<D> {
    pub async fn execute(&self) -> Result<DirectoryStats, CommunityError> {
        self.directory.stats().await
    }
}
