//! Query and payload shapes for the resource endpoints.
//!
//! # Design
//! Query filters are plain structs whose `Option` fields are left out of the
//! query string when `None`. JSON payloads derive `Serialize` with the API's
//! camelCase field names. Responses are not modelled; resource methods hand
//! back `serde_json::Value`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dates::to_iso8601;
use crate::error::MapiError;
use crate::http::Params;

/// Campaign lifecycle filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
    Running,
    Archived,
    NotRunning,
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CampaignStatus::Running => "Running",
            CampaignStatus::Archived => "Archived",
            CampaignStatus::NotRunning => "NotRunning",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidType {
    Unknown,
    #[serde(rename = "CPC")]
    Cpc,
    #[serde(rename = "COS")]
    Cos,
    #[serde(rename = "CPO")]
    Cpo,
}

impl fmt::Display for BidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BidType::Unknown => "Unknown",
            BidType::Cpc => "CPC",
            BidType::Cos => "COS",
            BidType::Cpo => "CPO",
        })
    }
}

/// Filters for `GET /v1/campaigns`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignQuery {
    /// Comma-separated advertiser ids.
    pub advertiser_ids: Option<String>,
    /// Comma-separated campaign ids.
    pub campaign_ids: Option<String>,
    /// Only campaigns in this status.
    pub campaign_status: Option<CampaignStatus>,
    /// Only campaigns using this bid type.
    pub bid_type: Option<BidType>,
}

impl CampaignQuery {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push_opt("advertiserIds", self.advertiser_ids.as_deref())
            .push_opt("campaignIds", self.campaign_ids.as_deref())
            .push_opt("campaignStatus", self.campaign_status)
            .push_opt("bidType", self.bid_type);
        params
    }
}

/// Filters for `GET /v1/budgets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetQuery {
    /// Comma-separated advertiser ids.
    pub advertiser_ids: Option<String>,
    /// Comma-separated budget ids.
    pub budget_ids: Option<String>,
    /// Only budgets attached to active campaigns. Defaults to `true`.
    pub only_active_campaigns: bool,
}

impl Default for BudgetQuery {
    fn default() -> Self {
        Self {
            advertiser_ids: None,
            budget_ids: None,
            only_active_campaigns: true,
        }
    }
}

impl BudgetQuery {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push_opt("advertiserIds", self.advertiser_ids.as_deref())
            .push_opt("budgetIds", self.budget_ids.as_deref())
            .push("onlyActiveCampaigns", self.only_active_campaigns);
        params
    }
}

/// Filters for `GET /v1/campaigns/bids`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BidQuery {
    /// Comma-separated advertiser ids.
    pub advertiser_ids: Option<String>,
    /// Comma-separated campaign ids.
    pub campaign_ids: Option<String>,
    /// Comma-separated category hash codes.
    pub category_hash_codes: Option<String>,
    /// Only bids of campaigns using this bid type.
    pub bid_type: Option<BidType>,
    /// Only bids of campaigns in this status.
    pub campaign_status: Option<CampaignStatus>,
    /// Only bids with changes not yet applied.
    pub pending_changes: Option<bool>,
}

impl BidQuery {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push_opt("advertiserIds", self.advertiser_ids.as_deref())
            .push_opt("campaignIds", self.campaign_ids.as_deref())
            .push_opt("categoryHashCodes", self.category_hash_codes.as_deref())
            .push_opt("bidType", self.bid_type)
            .push_opt("campaignStatus", self.campaign_status)
            .push_opt("pendingChanges", self.pending_changes);
        params
    }
}

/// Filters for `GET /v1/categories`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryQuery {
    /// Comma-separated campaign ids.
    pub campaign_ids: Option<String>,
    /// Comma-separated advertiser ids.
    pub advertiser_ids: Option<String>,
    /// Comma-separated category hash codes.
    pub category_hash_codes: Option<String>,
    /// Only enabled categories. Always sent.
    pub enabled_only: bool,
}

impl CategoryQuery {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push_opt("campaignIds", self.campaign_ids.as_deref())
            .push_opt("advertiserIds", self.advertiser_ids.as_deref())
            .push_opt("categoryHashCodes", self.category_hash_codes.as_deref())
            .push("enabledOnly", self.enabled_only);
        params
    }
}

/// Filters for `GET /v1/sellers`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SellerQuery {
    /// Comma-separated campaign ids.
    pub campaign_ids: Option<String>,
    /// Only sellers that are currently active. Always sent.
    pub only_active_sellers: bool,
    /// Only sellers with at least one product in the catalog. Always sent.
    pub only_sellers_with_products_in_catalog: bool,
    /// Only sellers with an active budget. Always sent.
    pub only_active_budgets: bool,
}

impl SellerQuery {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push_opt("campaignIds", self.campaign_ids.as_deref())
            .push("onlyActiveSellers", self.only_active_sellers)
            .push(
                "onlySellersWithProductsInCatalog",
                self.only_sellers_with_products_in_catalog,
            )
            .push("onlyActiveBudgets", self.only_active_budgets);
        params
    }
}

/// Filters for `GET /v1/sellers/campaigns`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SellerCampaignQuery {
    /// Comma-separated campaign ids.
    pub campaign_ids: Option<String>,
    /// Comma-separated advertiser ids.
    pub advertiser_ids: Option<String>,
    /// Only seller campaigns in this status. Omitted when `None`, so the
    /// server applies its own default.
    pub status: Option<CampaignStatus>,
}

impl SellerCampaignQuery {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push_opt("campaignIds", self.campaign_ids.as_deref())
            .push_opt("advertiserIds", self.advertiser_ids.as_deref())
            .push_opt("status", self.status);
        params
    }
}

/// Name and description of an audience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceDetails {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewAudience<'a> {
    pub advertiser_id: String,
    #[serde(flatten)]
    pub details: &'a AudienceDetails,
}

/// Kind of user identifier in an audience update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierSchema {
    Email,
    Madid,
}

/// Users to add to or remove from an audience. At most 50 000 per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceUsers {
    pub schema: IdentifierSchema,
    pub identifiers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AudienceOperation {
    Add,
    Remove,
}

#[derive(Debug, Serialize)]
pub(crate) struct AudienceUpdate<'a> {
    pub operation: AudienceOperation,
    #[serde(flatten)]
    pub users: &'a AudienceUsers,
}

/// Campaign-level bid with optional per-category overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignBids {
    pub campaign_id: u64,
    pub bid_value: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryBid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBid {
    pub category_hash_code: u64,
    pub bid_value: f64,
}

/// Category switches for one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCategories {
    pub catalog_id: u64,
    pub categories: Vec<CategoryState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryState {
    pub category_hash_code: u64,
    pub enabled: bool,
}

/// Seller bids for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerBids {
    pub campaign_id: u64,
    pub seller_bids: Vec<SellerBid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerBid {
    pub seller_name: String,
    pub bid: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetStatus {
    Active,
    Inactive,
}

/// Seller budgets for one campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerBudgets {
    pub campaign_id: u64,
    pub seller_budgets: Vec<SellerBudget>,
}

/// A seller budget. New budgets are keyed by `seller_name`, existing ones by
/// `budget_id`. Dates must already be ISO-8601.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerBudget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<u64>,
    /// `None` is sent as `null`, meaning an uncapped budget.
    pub amount: Option<f64>,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BudgetStatus>,
}

/// Body of `POST /v1/publishers/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublisherStatsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advertiser_ids: Option<String>,
    /// Free-form; converted to ISO-8601 before sending.
    pub start_date: String,
    /// Free-form; converted to ISO-8601 before sending.
    pub end_date: String,
}

impl PublisherStatsQuery {
    pub fn with_iso_dates(&self) -> Result<Self, MapiError> {
        Ok(Self {
            start_date: to_iso8601(&self.start_date)?,
            end_date: to_iso8601(&self.end_date)?,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportType {
    CampaignPerformance,
    #[serde(rename = "FacebookDPA")]
    FacebookDpa,
    #[serde(rename = "TransactionID")]
    TransactionId,
}

/// Body of the statistics report endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    /// Only used by `/v1/statistics`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<ReportType>,
    /// Leave out cross-device data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_x_device: Option<bool>,
    /// Comma-separated advertiser ids.
    pub advertiser_ids: String,
    /// Free-form; converted to ISO-8601 before sending.
    pub start_date: String,
    /// Free-form; converted to ISO-8601 before sending.
    pub end_date: String,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    /// `CSV`, `Excel`, `XML` or `JSON`, any case.
    pub format: String,
    /// Three-letter ISO currency code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// `GMT`, `PST` or `JST`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl StatsQuery {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    pub fn with_iso_dates(&self) -> Result<Self, MapiError> {
        Ok(Self {
            start_date: to_iso8601(&self.start_date)?,
            end_date: to_iso8601(&self.end_date)?,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_query_skips_unset_filters() {
        let query = CampaignQuery {
            advertiser_ids: Some("1,2".to_string()),
            campaign_status: Some(CampaignStatus::NotRunning),
            ..CampaignQuery::default()
        };
        assert_eq!(
            query.to_params().encode(),
            "advertiserIds=1%2C2&campaignStatus=NotRunning"
        );
    }

    #[test]
    fn budget_query_defaults_to_active_campaigns() {
        assert_eq!(
            BudgetQuery::default().to_params().encode(),
            "onlyActiveCampaigns=true"
        );
    }

    #[test]
    fn seller_query_always_sends_flags() {
        let query = SellerQuery {
            only_active_budgets: true,
            ..SellerQuery::default()
        };
        assert_eq!(
            query.to_params().encode(),
            "onlyActiveSellers=false&onlySellersWithProductsInCatalog=false&onlyActiveBudgets=true"
        );
    }

    #[test]
    fn category_query_always_sends_enabled_only() {
        let query = CategoryQuery {
            category_hash_codes: Some("77".to_string()),
            ..CategoryQuery::default()
        };
        assert_eq!(
            query.to_params().encode(),
            "categoryHashCodes=77&enabledOnly=false"
        );
    }

    #[test]
    fn seller_campaign_query_omits_unset_status() {
        assert!(SellerCampaignQuery::default().to_params().is_empty());
        let query = SellerCampaignQuery {
            status: Some(CampaignStatus::Running),
            ..SellerCampaignQuery::default()
        };
        assert_eq!(query.to_params().encode(), "status=Running");
    }

    #[test]
    fn bid_type_uses_wire_names() {
        let query = BidQuery {
            bid_type: Some(BidType::Cpo),
            pending_changes: Some(false),
            ..BidQuery::default()
        };
        assert_eq!(query.to_params().encode(), "bidType=CPO&pendingChanges=false");
    }

    #[test]
    fn new_audience_flattens_details() {
        let details = AudienceDetails {
            name: "Buyers".to_string(),
            description: None,
        };
        let body = serde_json::to_value(NewAudience {
            advertiser_id: "42".to_string(),
            details: &details,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"advertiserId": "42", "name": "Buyers"}));
    }

    #[test]
    fn audience_update_carries_operation() {
        let users = AudienceUsers {
            schema: IdentifierSchema::Madid,
            identifiers: vec!["x".to_string()],
        };
        let body = serde_json::to_value(AudienceUpdate {
            operation: AudienceOperation::Remove,
            users: &users,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"operation": "remove", "schema": "madid", "identifiers": ["x"]})
        );
    }

    #[test]
    fn seller_budget_sends_null_amount_for_uncapped() {
        let budget = SellerBudget {
            seller_name: None,
            budget_id: Some(7),
            amount: None,
            start_date: "2024-01-01T00:00:00+00:00".to_string(),
            end_date: "2024-02-01T00:00:00+00:00".to_string(),
            status: Some(BudgetStatus::Inactive),
        };
        let body = serde_json::to_value(&budget).unwrap();
        assert!(body["amount"].is_null());
        assert_eq!(body["budgetId"], 7);
        assert_eq!(body["status"], "Inactive");
        assert!(body.get("sellerName").is_none());
    }

    #[test]
    fn stats_query_wire_names() {
        let query = StatsQuery {
            report_type: Some(ReportType::FacebookDpa),
            ignore_x_device: Some(true),
            advertiser_ids: "1".to_string(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
            dimensions: vec!["Day".to_string()],
            metrics: vec!["Clicks".to_string()],
            format: "Csv".to_string(),
            currency: None,
            timezone: Some("GMT".to_string()),
        };
        let body = serde_json::to_value(&query).unwrap();
        assert_eq!(body["reportType"], "FacebookDPA");
        assert_eq!(body["ignoreXDevice"], true);
        assert_eq!(body["advertiserIds"], "1");
        assert!(body.get("currency").is_none());
        assert!(!query.is_json());
    }

    #[test]
    fn stats_dates_are_normalized() {
        let query = StatsQuery {
            report_type: None,
            ignore_x_device: None,
            advertiser_ids: "1".to_string(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024/01/31".to_string(),
            dimensions: Vec::new(),
            metrics: Vec::new(),
            format: "JSON".to_string(),
            currency: None,
            timezone: None,
        };
        let normalized = query.with_iso_dates().unwrap();
        assert_eq!(normalized.start_date, "2024-01-01T00:00:00+00:00");
        assert_eq!(normalized.end_date, "2024-01-31T00:00:00+00:00");
        assert!(normalized.is_json());
    }
}
