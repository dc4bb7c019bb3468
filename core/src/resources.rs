//! Per-endpoint methods on `MapiClient`.
//!
//! Each method maps its arguments to a verb, a path and a query or JSON
//! body, sends it through the pipeline, and decodes the answer. Ids are
//! accepted as anything `Display` so both numbers and strings work.

use std::fmt::Display;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::client::MapiClient;
use crate::error::MapiError;
use crate::http::{HttpResponse, Params, Payload};
use crate::stats::{decode_stats, StatsOutput};
use crate::transport::Transport;
use crate::types::{
    AudienceDetails, AudienceOperation, AudienceUpdate, AudienceUsers, BidQuery, BudgetQuery,
    CampaignBids, CampaignQuery, CatalogCategories, CategoryQuery, NewAudience,
    PublisherStatsQuery, SellerBids, SellerBudgets, SellerCampaignQuery, SellerQuery, StatsQuery,
};

fn json_body<B: Serialize + ?Sized>(body: &B) -> Result<Payload, MapiError> {
    Payload::json(body).map_err(MapiError::Serialization)
}

fn decode(response: HttpResponse) -> Result<Value, MapiError> {
    if response.body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body).map_err(MapiError::Deserialization)
}

fn enabled_only(enabled: bool) -> Params {
    let mut params = Params::new();
    params.push("enabledOnly", enabled);
    params
}

impl<T: Transport> MapiClient<T> {
    // --- advertisers ---

    pub fn get_campaigns_by_advertiser(&self, advertiser: impl Display) -> Result<Value, MapiError> {
        decode(self.get(&format!("/v1/advertisers/{advertiser}/campaigns"), Payload::Empty)?)
    }

    pub fn get_categories_by_advertiser(
        &self,
        advertiser: impl Display,
        enabled: bool,
    ) -> Result<Value, MapiError> {
        decode(self.get(
            &format!("/v1/advertisers/{advertiser}/categories"),
            enabled_only(enabled),
        )?)
    }

    pub fn get_category_by_advertiser(
        &self,
        advertiser: impl Display,
        category: impl Display,
    ) -> Result<Value, MapiError> {
        decode(self.get(
            &format!("/v1/advertisers/{advertiser}/categories/{category}"),
            Payload::Empty,
        )?)
    }

    // --- audiences ---

    pub fn get_audiences(&self, advertiser: impl Display) -> Result<Value, MapiError> {
        let mut params = Params::new();
        params.push("advertiserId", advertiser);
        decode(self.get("/v1/audiences", params)?)
    }

    pub fn create_audience(
        &self,
        advertiser: impl Display,
        details: &AudienceDetails,
    ) -> Result<Value, MapiError> {
        let body = json_body(&NewAudience {
            advertiser_id: advertiser.to_string(),
            details,
        })?;
        decode(self.post("/v1/audiences/userlist", body)?)
    }

    /// Returns the raw response body.
    pub fn delete_audience(&self, audience: impl Display) -> Result<String, MapiError> {
        Ok(self.delete(&format!("/v1/audiences/{audience}"), Payload::Empty)?.text())
    }

    /// Returns the raw response body.
    pub fn update_audience(
        &self,
        audience: impl Display,
        details: &AudienceDetails,
    ) -> Result<String, MapiError> {
        let body = json_body(details)?;
        Ok(self.put(&format!("/v1/audiences/{audience}"), body)?.text())
    }

    /// Remove every user from an audience.
    pub fn wipe_audience(&self, audience: impl Display) -> Result<Value, MapiError> {
        decode(self.delete(&format!("/v1/audiences/userlist/{audience}/users"), Payload::Empty)?)
    }

    pub fn add_to_audience(
        &self,
        audience: impl Display,
        users: &AudienceUsers,
    ) -> Result<Value, MapiError> {
        self.update_audience_users(audience, AudienceOperation::Add, users)
    }

    pub fn remove_from_audience(
        &self,
        audience: impl Display,
        users: &AudienceUsers,
    ) -> Result<Value, MapiError> {
        self.update_audience_users(audience, AudienceOperation::Remove, users)
    }

    fn update_audience_users(
        &self,
        audience: impl Display,
        operation: AudienceOperation,
        users: &AudienceUsers,
    ) -> Result<Value, MapiError> {
        let body = json_body(&AudienceUpdate { operation, users })?;
        decode(self.patch(&format!("/v1/audiences/userlist/{audience}"), body)?)
    }

    // --- budgets ---

    pub fn get_budgets(&self, query: &BudgetQuery) -> Result<Value, MapiError> {
        decode(self.get("/v1/budgets", query.to_params())?)
    }

    // --- campaigns ---

    pub fn get_campaigns(&self, query: &CampaignQuery) -> Result<Value, MapiError> {
        decode(self.get("/v1/campaigns", query.to_params())?)
    }

    pub fn get_campaign(&self, id: impl Display) -> Result<Value, MapiError> {
        decode(self.get(&format!("/v1/campaigns/{id}"), Payload::Empty)?)
    }

    pub fn get_categories_by_campaign(
        &self,
        id: impl Display,
        enabled: bool,
    ) -> Result<Value, MapiError> {
        decode(self.get(&format!("/v1/campaigns/{id}/categories"), enabled_only(enabled))?)
    }

    pub fn get_category_by_campaign(
        &self,
        campaign: impl Display,
        category: impl Display,
    ) -> Result<Value, MapiError> {
        decode(self.get(
            &format!("/v1/campaigns/{campaign}/categories/{category}"),
            Payload::Empty,
        )?)
    }

    pub fn get_bids(&self, query: &BidQuery) -> Result<Value, MapiError> {
        decode(self.get("/v1/campaigns/bids", query.to_params())?)
    }

    pub fn update_bids(&self, campaigns: &[CampaignBids]) -> Result<Value, MapiError> {
        decode(self.put("/v1/campaigns/bids", json_body(campaigns)?)?)
    }

    // --- categories ---

    pub fn get_categories(&self, query: &CategoryQuery) -> Result<Value, MapiError> {
        decode(self.get("/v1/categories", query.to_params())?)
    }

    pub fn update_categories(&self, catalogs: &[CatalogCategories]) -> Result<Value, MapiError> {
        decode(self.put("/v1/categories", json_body(catalogs)?)?)
    }

    // --- portfolio ---

    /// Advertiser accounts the credentials have access to.
    pub fn get_portfolio(&self) -> Result<Value, MapiError> {
        decode(self.get("/v1/portfolio", Payload::Empty)?)
    }

    // --- publishers ---

    pub fn get_publisher_stats(&self, query: &PublisherStatsQuery) -> Result<Value, MapiError> {
        let body = json_body(&query.with_iso_dates()?)?;
        decode(self.post("/v1/publishers/stats", body)?)
    }

    // --- sellers ---

    pub fn get_sellers(&self, query: &SellerQuery) -> Result<Value, MapiError> {
        decode(self.get("/v1/sellers", query.to_params())?)
    }

    pub fn update_seller_bids(&self, campaigns: &[SellerBids]) -> Result<Value, MapiError> {
        decode(self.put("/v1/sellers/bids", json_body(campaigns)?)?)
    }

    pub fn create_seller_budgets(&self, campaigns: &[SellerBudgets]) -> Result<Value, MapiError> {
        decode(self.post("/v1/sellers/budgets", json_body(campaigns)?)?)
    }

    pub fn update_seller_budgets(&self, campaigns: &[SellerBudgets]) -> Result<Value, MapiError> {
        decode(self.put("/v1/sellers/budgets", json_body(campaigns)?)?)
    }

    pub fn get_seller_campaigns(&self, query: &SellerCampaignQuery) -> Result<Value, MapiError> {
        decode(self.get("/v1/sellers/campaigns", query.to_params())?)
    }

    /// Seller report. Saved to `filepath` when given, otherwise decoded per
    /// `query.format`.
    pub fn get_seller_stats(
        &self,
        query: &StatsQuery,
        filepath: Option<&Path>,
    ) -> Result<StatsOutput, MapiError> {
        self.report("/v1/sellers/stats", query, filepath)
    }

    // --- statistics ---

    /// Campaign performance report. Saved to `filepath` when given, otherwise
    /// decoded per `query.format`.
    pub fn get_stats(
        &self,
        query: &StatsQuery,
        filepath: Option<&Path>,
    ) -> Result<StatsOutput, MapiError> {
        self.report("/v1/statistics", query, filepath)
    }

    fn report(
        &self,
        path: &str,
        query: &StatsQuery,
        filepath: Option<&Path>,
    ) -> Result<StatsOutput, MapiError> {
        let query = query.with_iso_dates()?;
        let response = self.post(path, json_body(&query)?)?;
        decode_stats(&response, &query, filepath)
    }
}
