//! Valuation API: property search, Zestimates and comparable sales.
//!
//! ```rust,no_run
//! use zillow_client::ValuationApi;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = ValuationApi::new()?;
//!     let place = api
//!         .get_search_results("<your key>", "2114 Bigelow Ave", "Seattle, WA", false)
//!         .await?;
//!     println!("{:?}", place.zestimate);
//!     Ok(())
//! }
//! ```

use crate::config::ClientConfig;
use crate::endpoint::{fetch, ingest_item, require, Document, Endpoint, Params};
use crate::error::{Result, ZillowError};
use crate::place::Place;
use crate::transport::{ReqwestTransport, Transport};
use serde::Serialize;
use tracing::debug;

pub const MIN_COMPS_COUNT: u8 = 1;
pub const MAX_COMPS_COUNT: u8 = 25;
pub const DEFAULT_DEEP_COMPS_COUNT: u8 = 10;
pub const DEFAULT_COMPS_COUNT: u8 = 25;

/// A principal property and its comparable recent sales, in provider order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comps {
    pub principal: Place,
    pub comparables: Vec<Place>,
}

pub struct ValuationApi<T: Transport = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
}

impl ValuationApi<ReqwestTransport> {
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: Transport> ValuationApi<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Find the property at `address` in `citystatezip` with its current Zestimate.
    pub async fn get_search_results(
        &self,
        zws_id: &str,
        address: &str,
        citystatezip: &str,
        rentzestimate: bool,
    ) -> Result<Place> {
        let params = address_params(zws_id, address, citystatezip, rentzestimate)?;
        let document = fetch(&self.transport, &self.config, Endpoint::SearchResults, &params).await?;
        Self::parse_search_results(&document, false)
    }

    /// Zestimate for a property id. The provider only answers for properties
    /// that have one.
    pub async fn get_zestimate(&self, zws_id: &str, zpid: &str, rentzestimate: bool) -> Result<Place> {
        require(zws_id, "zws-id")?;
        require(zpid, "zpid")?;

        let params: Params = vec![
            ("zws-id", Some(zws_id.to_string())),
            ("zpid", Some(zpid.to_string())),
            ("rentzestimate", rentzestimate_flag(rentzestimate)),
        ];
        let document = fetch(&self.transport, &self.config, Endpoint::Zestimate, &params).await?;
        Self::parse_zestimate(&document)
    }

    /// Like [`ValuationApi::get_search_results`], plus lot size, year built,
    /// beds/baths, last sale and tax assessment details.
    pub async fn get_deep_search_results(
        &self,
        zws_id: &str,
        address: &str,
        citystatezip: &str,
        rentzestimate: bool,
    ) -> Result<Place> {
        let params = address_params(zws_id, address, citystatezip, rentzestimate)?;
        let document = fetch(&self.transport, &self.config, Endpoint::DeepSearchResults, &params).await?;
        Self::parse_search_results(&document, true)
    }

    /// Up to `count` (1 to 25, default 10) comparable recent sales, with
    /// extended property data.
    pub async fn get_deep_comps(
        &self,
        zws_id: &str,
        zpid: &str,
        count: Option<u8>,
        rentzestimate: bool,
    ) -> Result<Comps> {
        let count = count.unwrap_or(DEFAULT_DEEP_COMPS_COUNT);
        self.comps(Endpoint::DeepComps, zws_id, zpid, count, rentzestimate)
            .await
    }

    /// Up to `count` (1 to 25, default 25) comparable recent sales.
    pub async fn get_comps(&self, zws_id: &str, zpid: &str, count: Option<u8>, rentzestimate: bool) -> Result<Comps> {
        let count = count.unwrap_or(DEFAULT_COMPS_COUNT);
        self.comps(Endpoint::Comps, zws_id, zpid, count, rentzestimate)
            .await
    }

    async fn comps(
        &self,
        endpoint: Endpoint,
        zws_id: &str,
        zpid: &str,
        count: u8,
        rentzestimate: bool,
    ) -> Result<Comps> {
        require(zws_id, "zws-id")?;
        require(zpid, "zpid")?;
        if !(MIN_COMPS_COUNT..=MAX_COMPS_COUNT).contains(&count) {
            return Err(ZillowError::Validation(format!(
                "count must be between {} and {}, got {}",
                MIN_COMPS_COUNT, MAX_COMPS_COUNT, count
            )));
        }

        let params: Params = vec![
            ("zws-id", Some(zws_id.to_string())),
            ("zpid", Some(zpid.to_string())),
            ("count", Some(count.to_string())),
            ("rentzestimate", rentzestimate_flag(rentzestimate)),
        ];
        let document = fetch(&self.transport, &self.config, endpoint, &params).await?;
        Self::parse_comps(&document, endpoint == Endpoint::DeepComps)
    }

    // response > results > result
    pub fn parse_search_results(document: &Document, extended: bool) -> Result<Place> {
        let result = document.subtree(&["response", "results", "result"])?;
        document.ingest("invalid search result", Place::from_node(result, extended))
    }

    // The Zestimate response element is itself the property record
    pub fn parse_zestimate(document: &Document) -> Result<Place> {
        let response = document.subtree(&["response"])?;
        document.ingest("invalid zestimate response", Place::from_node(response, false))
    }

    // response > properties > principal, and response > properties > comparables > comp
    pub fn parse_comps(document: &Document, extended: bool) -> Result<Comps> {
        let principal = document.subtree(&["response", "properties", "principal"])?;
        let principal = document.ingest("No principal data found", Place::from_node(principal, extended))?;

        // an empty <comp/> is still a comparable
        let comps = document
            .optional_subtree(&["response", "properties", "comparables"])
            .and_then(|comparables| comparables.get("comp"))
            .map(|comp| comp.items())
            .unwrap_or_default();

        let comparables = comps
            .into_iter()
            .map(|item| ingest_item("No valid comp data found", item, Place::from_node(item, extended)))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            zpid = principal.zpid.as_deref().unwrap_or_default(),
            comparables = comparables.len(),
            "comparables parsed"
        );
        Ok(Comps {
            principal,
            comparables,
        })
    }
}

// Absence of the parameter, not "false", is the provider's "off"
fn rentzestimate_flag(rentzestimate: bool) -> Option<String> {
    rentzestimate.then(|| "true".to_string())
}

fn address_params(zws_id: &str, address: &str, citystatezip: &str, rentzestimate: bool) -> Result<Params> {
    require(zws_id, "zws-id")?;
    if address.trim().is_empty() || citystatezip.trim().is_empty() {
        return Err(ZillowError::Validation(
            "Specify address and citystatezip.".to_string(),
        ));
    }

    Ok(vec![
        ("zws-id", Some(zws_id.to_string())),
        ("address", Some(address.to_string())),
        ("citystatezip", Some(citystatezip.to_string())),
        ("rentzestimate", rentzestimate_flag(rentzestimate)),
    ])
}
