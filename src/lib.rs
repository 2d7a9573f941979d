// Client library for the Zillow valuation and neighborhood XML web services

pub mod config;
pub mod endpoint;
pub mod error;
pub mod neighborhood;
pub mod place;
pub mod region;
pub mod transport;
pub mod url_builder;
pub mod valuation;
pub mod xml_tree;

// Re-export key types for convenience
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use endpoint::{Document, Endpoint};
pub use error::{ParseError, Result, ZillowError};
pub use neighborhood::{ChildType, NeighborhoodApi, RegionChildrenQuery};
pub use place::{ExtendedData, FullAddress, Links, LocalRealEstate, Place, Valuation};
pub use region::{Region, RegionChildren, ZIndex};
pub use transport::{HttpMethod, RawResponse, ReqwestTransport, Transport};
pub use valuation::{Comps, ValuationApi};

/// Crate version, fixed at build time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
