//! Blocking client for the marketing REST API (MAPI).
//!
//! # Overview
//! Authenticates with the OAuth2 client-credentials grant, builds requests
//! for the campaign, audience, budget, category, seller and statistics
//! endpoints, and decodes JSON or report responses.
//!
//! # Design
//! - `builder` turns a path + payload into an `HttpRequest` without I/O.
//! - `transport` performs one round-trip; `UreqTransport` is the default,
//!   tests plug in their own `Transport`.
//! - `client` is the single chokepoint every call goes through: lazy token
//!   fetch, bearer header, one refresh-and-retry on 401.
//! - `resources` holds the thin per-endpoint methods.
//!
//! ```no_run
//! use mapi_core::MapiClient;
//!
//! let client = MapiClient::new("client-id", "client-secret");
//! let campaign = client.get_campaign(123)?;
//! println!("{campaign}");
//! # Ok::<(), mapi_core::MapiError>(())
//! ```

pub mod auth;
pub mod builder;
pub mod client;
pub mod config;
pub mod dates;
pub mod error;
pub mod http;
mod resources;
pub mod stats;
pub mod transport;
pub mod types;

pub use auth::{Token, TOKEN_PATH};
pub use builder::{ApiRequest, RequestBuilder};
pub use client::MapiClient;
pub use config::{ClientConfig, Credentials};
pub use error::{AuthError, MapiError, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Params, Payload};
pub use stats::{decode_stats, StatsOutput};
pub use transport::{Transport, UreqTransport};
pub use types::{
    AudienceDetails, AudienceUsers, BidQuery, BidType, BudgetQuery, BudgetStatus, CampaignBids,
    CampaignQuery, CampaignStatus, CatalogCategories, CategoryBid, CategoryQuery, CategoryState,
    IdentifierSchema, PublisherStatsQuery, ReportType, SellerBid, SellerBids, SellerBudget,
    SellerBudgets, SellerCampaignQuery, SellerQuery, StatsQuery,
};
