// Otter transcript endpoints: processed transcripts and call classification

use serde::Deserialize;

use crate::client::SybilClient;
use crate::error::Error;
use crate::types::{
    ActionResponse, OtterConfig, OtterConfigUpdate, OtterTranscript, OtterTranscriptStats,
    TranscriptQuery,
};

#[derive(Deserialize)]
struct TranscriptList {
    #[serde(default)]
    transcripts: Vec<OtterTranscript>,
}

impl SybilClient {
    /// `GET /admin/otter/transcripts?sort_by=&order=&call_type_filter=&include_failed=`
    pub async fn list_otter_transcripts(
        &self,
        query: &TranscriptQuery,
    ) -> Result<Vec<OtterTranscript>, Error> {
        let mut params = vec![
            ("sort_by", query.sort_by.as_str().to_owned()),
            ("order", query.order.as_str().to_owned()),
        ];
        if let Some(call_type) = query.call_type {
            params.push(("call_type_filter", call_type.as_str().to_owned()));
        }
        params.push(("include_failed", query.include_failed.to_string()));

        let url = self.url_with_query("/admin/otter/transcripts", &params)?;
        let list: TranscriptList = self.get(url).await?;
        Ok(list.transcripts)
    }

    /// `GET /admin/otter/transcripts/stats`
    pub async fn otter_transcript_stats(&self) -> Result<OtterTranscriptStats, Error> {
        let url = self.url("/admin/otter/transcripts/stats")?;
        self.get(url).await
    }

    /// `POST /admin/otter/transcripts/{conversation_id}/retry`
    pub async fn retry_otter_transcript(
        &self,
        conversation_id: &str,
    ) -> Result<ActionResponse, Error> {
        let url = self.url(&format!("/admin/otter/transcripts/{conversation_id}/retry"))?;
        self.post(url, None::<&()>).await
    }

    /// `GET /admin/otter/transcripts/config`
    pub async fn get_otter_config(&self) -> Result<OtterConfig, Error> {
        let url = self.url("/admin/otter/transcripts/config")?;
        self.get(url).await
    }

    /// `PUT /admin/otter/transcripts/config`
    pub async fn update_otter_config(
        &self,
        update: &OtterConfigUpdate,
    ) -> Result<OtterConfig, Error> {
        let url = self.url("/admin/otter/transcripts/config")?;
        self.put(url, update).await
    }
}
