// Property records built from the valuation endpoints' result subtrees
use crate::error::ParseError;
use crate::xml_tree::{parse_number, Node};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

// Dates in the valuation responses look like 11/03/2009
const DATE_FORMAT: &str = "%m/%d/%Y";

fn parse_date(node: &Node, key: &str) -> Option<NaiveDate> {
    let text = node.child_text(key)?;
    match NaiveDate::parse_from_str(text.trim(), DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(key, value = text, "unreadable date, leaving it unset");
            None
        }
    }
}

fn owned_text(node: &Node, key: &str) -> Option<String> {
    node.child_text(key).map(str::to_string)
}

fn expect_map<'a>(node: &'a Node, what: &str) -> Result<&'a Node, ParseError> {
    if node.is_map() {
        Ok(node)
    } else {
        Err(ParseError::InvalidFormat(format!(
            "expected {} to be a mapping, got {}",
            what, node
        )))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Links {
    pub home_details: Option<String>,
    pub graphs_and_data: Option<String>,
    pub map_this_home: Option<String>,
    pub comparables: Option<String>,
}

impl Links {
    pub fn from_node(node: &Node) -> Result<Self, ParseError> {
        let node = expect_map(node, "links")?;
        Ok(Self {
            home_details: owned_text(node, "homedetails"),
            graphs_and_data: owned_text(node, "graphsanddata"),
            map_this_home: owned_text(node, "mapthishome"),
            comparables: owned_text(node, "comparables"),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FullAddress {
    pub street: Option<String>,
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl FullAddress {
    pub fn from_node(node: &Node) -> Result<Self, ParseError> {
        let node = expect_map(node, "address")?;
        Ok(Self {
            street: owned_text(node, "street"),
            zipcode: owned_text(node, "zipcode"),
            city: owned_text(node, "city"),
            state: owned_text(node, "state"),
            latitude: node.number_child("latitude"),
            longitude: node.number_child("longitude"),
        })
    }
}

/// A Zestimate or Rent Zestimate block.
///
/// The provider sends the block with empty elements when it has no estimate,
/// so every field may be `None` even when the block itself is present.
/// Amounts are in `currency` and may carry cents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Valuation {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub last_updated: Option<NaiveDate>,
    pub value_change: Option<f64>,
    /// Days covered by `value_change`.
    pub value_change_duration: Option<u32>,
    pub valuation_range_low: Option<f64>,
    pub valuation_range_high: Option<f64>,
    pub percentile: Option<u8>,
}

impl Valuation {
    pub fn from_node(node: &Node) -> Result<Self, ParseError> {
        let node = expect_map(node, "zestimate")?;

        let amount = node.child("amount");
        let value_change = node.child("valueChange");
        let range = node.child("valuationRange");

        Ok(Self {
            amount: node.number_child("amount"),
            currency: amount.and_then(|a| a.attr("currency")).map(str::to_string),
            last_updated: parse_date(node, "last-updated"),
            value_change: node.number_child("valueChange"),
            value_change_duration: value_change
                .and_then(|v| v.attr("duration"))
                .and_then(|d| parse_number("valueChange@duration", d)),
            valuation_range_low: range.and_then(|r| r.number_child("low")),
            valuation_range_high: range.and_then(|r| r.number_child("high")),
            percentile: node.number_child("percentile"),
        })
    }

    pub fn has_amount(&self) -> bool {
        self.amount.is_some()
    }
}

// The neighborhood a property sits in, with links to its listings pages
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocalRealEstate {
    pub region_name: Option<String>,
    pub region_id: Option<String>,
    pub region_type: Option<String>,
    pub zindex_value: Option<String>,
    pub overview_link: Option<String>,
    pub fsbo_link: Option<String>,
    pub sale_link: Option<String>,
}

impl LocalRealEstate {
    pub fn from_node(node: &Node) -> Result<Self, ParseError> {
        let node = expect_map(node, "localRealEstate")?;
        let region = match node.child("region").and_then(Node::first) {
            Some(region) => region,
            None => return Ok(Self::default()),
        };
        let links = region.child("links");
        let link = |key: &str| links.and_then(|l| owned_text(l, key));

        Ok(Self {
            region_name: region.attr("name").map(str::to_string),
            region_id: region.attr("id").map(str::to_string),
            region_type: region.attr("type").map(str::to_string),
            zindex_value: owned_text(region, "zindexValue"),
            overview_link: link("overview"),
            fsbo_link: link("forSaleByOwner"),
            sale_link: link("forSale"),
        })
    }
}

// Property facts only returned by the deep search and deep comps endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtendedData {
    pub fips_county: Option<String>,
    pub use_code: Option<String>,
    pub tax_assessment_year: Option<u16>,
    pub tax_assessment: Option<f64>,
    pub year_built: Option<u16>,
    pub lot_size_sqft: Option<u64>,
    pub finished_sqft: Option<u64>,
    pub bathrooms: Option<f32>,
    pub bedrooms: Option<u32>,
    pub total_rooms: Option<u32>,
    pub last_sold_date: Option<NaiveDate>,
    pub last_sold_price: Option<f64>,
    pub last_sold_currency: Option<String>,
}

impl ExtendedData {
    // Extended fields sit directly on the record, next to zpid
    pub fn from_node(record: &Node) -> Result<Self, ParseError> {
        let record = expect_map(record, "property record")?;
        Ok(Self {
            fips_county: owned_text(record, "FIPScounty"),
            use_code: owned_text(record, "useCode"),
            tax_assessment_year: record.number_child("taxAssessmentYear"),
            tax_assessment: record.number_child("taxAssessment"),
            year_built: record.number_child("yearBuilt"),
            lot_size_sqft: record.number_child("lotSizeSqFt"),
            finished_sqft: record.number_child("finishedSqFt"),
            bathrooms: record.number_child("bathrooms"),
            bedrooms: record.number_child("bedrooms"),
            total_rooms: record.number_child("totalRooms"),
            last_sold_date: parse_date(record, "lastSoldDate"),
            last_sold_price: record.number_child("lastSoldPrice"),
            last_sold_currency: record
                .child("lastSoldPrice")
                .and_then(|p| p.attr("currency"))
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Place {
    pub zpid: Option<String>,
    /// Comparable records carry a `score` attribute.
    pub similarity_score: Option<f64>,
    pub links: Option<Links>,
    pub address: Option<FullAddress>,
    pub zestimate: Option<Valuation>,
    pub rentzestimate: Option<Valuation>,
    pub local_real_estate: Option<LocalRealEstate>,
    pub extended_data: Option<ExtendedData>,
    pub has_extended_data: bool,
}

impl Place {
    /// Build a place from one `result`, `principal`, `comp` or Zestimate
    /// `response` subtree.
    ///
    /// When the provider returns several results the first one is used.
    /// Missing sub-blocks stay `None` and an empty record gives a place with
    /// nothing set. Unreadable numbers and dates are logged and left `None`;
    /// only a record or block that is not a mapping is an error.
    pub fn from_node(node: &Node, has_extended_data: bool) -> Result<Self, ParseError> {
        if let Node::List(items) = node {
            debug!(count = items.len(), "multiple property records, using the first");
        }
        let record = node.first().unwrap_or(node);
        if record.is_null() {
            debug!("empty property record");
            return Ok(Self {
                extended_data: has_extended_data.then(ExtendedData::default),
                has_extended_data,
                ..Self::default()
            });
        }
        let record = expect_map(record, "property record")?;

        let place = Self {
            zpid: owned_text(record, "zpid"),
            similarity_score: record.attr("score").and_then(|s| parse_number("score", s)),
            links: record.child("links").map(Links::from_node).transpose()?,
            address: record.child("address").map(FullAddress::from_node).transpose()?,
            zestimate: record.child("zestimate").map(Valuation::from_node).transpose()?,
            rentzestimate: record
                .child("rentzestimate")
                .map(Valuation::from_node)
                .transpose()?,
            local_real_estate: record
                .child("localRealEstate")
                .map(LocalRealEstate::from_node)
                .transpose()?,
            extended_data: if has_extended_data {
                Some(ExtendedData::from_node(record)?)
            } else {
                None
            },
            has_extended_data,
        };

        if place.zpid.is_none() {
            debug!("property record without zpid");
        }
        Ok(place)
    }
}
