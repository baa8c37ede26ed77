// Phone number whitelist endpoints

use serde::Deserialize;
use serde::de::IgnoredAny;
use url::form_urlencoded::byte_serialize;

use crate::client::SybilClient;
use crate::error::Error;
use crate::types::{
    WhitelistCreateRequest, WhitelistEntry, WhitelistStats, WhitelistUpdateRequest,
};

#[derive(Deserialize)]
struct WhitelistList {
    #[serde(default)]
    entries: Vec<WhitelistEntry>,
}

#[derive(Deserialize)]
struct PhoneCheck {
    is_whitelisted: bool,
}

impl SybilClient {
    /// List whitelist entries, optionally including deactivated ones.
    ///
    /// `GET /admin/whitelist?include_inactive=<bool>`
    pub async fn list_whitelist(&self, include_inactive: bool) -> Result<Vec<WhitelistEntry>, Error> {
        let url = self.url_with_query(
            "/admin/whitelist",
            &[("include_inactive", include_inactive.to_string())],
        )?;
        let list: WhitelistList = self.get(url).await?;
        Ok(list.entries)
    }

    /// `POST /admin/whitelist`
    pub async fn add_to_whitelist(
        &self,
        entry: &WhitelistCreateRequest,
    ) -> Result<WhitelistEntry, Error> {
        let url = self.url("/admin/whitelist")?;
        self.post(url, Some(entry)).await
    }

    /// `PUT /admin/whitelist/{id}`
    pub async fn update_whitelist(
        &self,
        id: i64,
        update: &WhitelistUpdateRequest,
    ) -> Result<WhitelistEntry, Error> {
        let url = self.url(&format!("/admin/whitelist/{id}"))?;
        self.put(url, update).await
    }

    /// Flip an entry between active and inactive.
    ///
    /// `PATCH /admin/whitelist/{id}/toggle`
    pub async fn toggle_whitelist_status(&self, id: i64) -> Result<WhitelistEntry, Error> {
        let url = self.url(&format!("/admin/whitelist/{id}/toggle"))?;
        self.patch(url).await
    }

    /// Soft-delete (deactivate) by default; `hard_delete` removes the row.
    ///
    /// `DELETE /admin/whitelist/{id}?hard_delete=<bool>`
    pub async fn delete_from_whitelist(&self, id: i64, hard_delete: bool) -> Result<(), Error> {
        let url = self.url_with_query(
            &format!("/admin/whitelist/{id}"),
            &[("hard_delete", hard_delete.to_string())],
        )?;
        let _: IgnoredAny = self.delete(url).await?;
        Ok(())
    }

    /// `GET /admin/whitelist/check/{phone}` (phone is percent-encoded)
    pub async fn check_phone_number(&self, phone_number: &str) -> Result<bool, Error> {
        let encoded: String = byte_serialize(phone_number.as_bytes())
            .collect::<String>()
            .replace('+', "%20");
        let url = self.url(&format!("/admin/whitelist/check/{encoded}"))?;
        let check: PhoneCheck = self.get(url).await?;
        Ok(check.is_whitelisted)
    }

    /// `GET /admin/whitelist/stats`
    pub async fn whitelist_stats(&self) -> Result<WhitelistStats, Error> {
        let url = self.url("/admin/whitelist/stats")?;
        self.get(url).await
    }
}
