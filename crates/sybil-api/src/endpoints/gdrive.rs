// Google Drive ingestion monitor

use crate::client::SybilClient;
use crate::error::Error;
use crate::types::{ActionResponse, GDriveFileStats, GDriveFileStatus, GDriveStatus};

impl SybilClient {
    /// Tracked files, newest first, optionally filtered by status.
    ///
    /// `GET /admin/gdrive/files?status=<status>&limit=<n>`
    pub async fn list_gdrive_files(
        &self,
        status: Option<GDriveStatus>,
        limit: u32,
    ) -> Result<Vec<GDriveFileStatus>, Error> {
        let mut query = Vec::with_capacity(2);
        if let Some(status) = status {
            query.push(("status", status.as_str().to_owned()));
        }
        query.push(("limit", limit.to_string()));
        let url = self.url_with_query("/admin/gdrive/files", &query)?;
        self.get(url).await
    }

    /// `GET /admin/gdrive/files/stats`
    pub async fn gdrive_file_stats(&self) -> Result<GDriveFileStats, Error> {
        let url = self.url("/admin/gdrive/files/stats")?;
        self.get(url).await
    }

    /// Queue a failed file for another ingestion attempt.
    ///
    /// `POST /admin/gdrive/files/{file_id}/retry`
    pub async fn retry_gdrive_file(&self, file_id: &str) -> Result<ActionResponse, Error> {
        let url = self.url(&format!("/admin/gdrive/files/{file_id}/retry"))?;
        self.post(url, None::<&()>).await
    }
}
