// Agent prompt configuration

use crate::client::SybilClient;
use crate::error::Error;
use crate::types::PromptConfig;

impl SybilClient {
    /// `GET /admin/sybil/prompt-config`
    pub async fn get_prompt_config(&self) -> Result<PromptConfig, Error> {
        let url = self.url("/admin/sybil/prompt-config")?;
        self.get(url).await
    }

    /// Replace the whole prompt configuration; returns what was stored.
    ///
    /// `PUT /admin/sybil/prompt-config`
    pub async fn update_prompt_config(&self, config: &PromptConfig) -> Result<PromptConfig, Error> {
        let url = self.url("/admin/sybil/prompt-config")?;
        self.put(url, config).await
    }
}
