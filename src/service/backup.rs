use tracing::instrument;

use super::DeployService;
use crate::api::Transport;
use crate::error::{DeployError, Result};
use crate::models::Backup;

impl<T: Transport + ?Sized> DeployService<T> {
    /// List the backups of a database.
    #[instrument(skip(self))]
    pub async fn get_backups(&self, database_id: i64) -> Result<Vec<Backup>> {
        let payloads = self.transport.list_backups(database_id).await?;

        payloads
            .into_iter()
            .map(|backup| {
                let id = backup.id.ok_or(DeployError::IncompleteResource {
                    resource: "backup",
                    field: "id",
                })?;
                Ok(Backup {
                    id,
                    created_at: backup.created_at,
                    region: backup.aws_region,
                    manual: backup.manual.unwrap_or(false),
                    copied_from_id: backup.embedded.copied_from.and_then(|source| source.id),
                })
            })
            .collect()
    }
}
