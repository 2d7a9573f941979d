// Neighborhood API: subregions of a state, county, city or region id
use crate::config::ClientConfig;
use crate::endpoint::{fetch, ingest_item, require, Document, Endpoint, Params};
use crate::error::{Result, ZillowError};
use crate::region::{Region, RegionChildren};
use crate::transport::{ReqwestTransport, Transport};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildType {
    State,
    County,
    City,
    Zipcode,
    Neighborhood,
}

impl ChildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildType::State => "state",
            ChildType::County => "county",
            ChildType::City => "city",
            ChildType::Zipcode => "zipcode",
            ChildType::Neighborhood => "neighborhood",
        }
    }
}

impl fmt::Display for ChildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChildType {
    type Err = ZillowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "state" => Ok(ChildType::State),
            "county" => Ok(ChildType::County),
            "city" => Ok(ChildType::City),
            "zipcode" => Ok(ChildType::Zipcode),
            "neighborhood" => Ok(ChildType::Neighborhood),
            other => Err(ZillowError::Validation(format!(
                "unknown child type {:?} (expected state, county, city, zipcode or neighborhood)",
                other
            ))),
        }
    }
}

// Exactly one of region_id / state must be set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionChildrenQuery {
    pub region_id: Option<String>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
    pub childtype: Option<ChildType>,
}

impl RegionChildrenQuery {
    pub fn for_region(region_id: impl Into<String>) -> Self {
        Self {
            region_id: Some(region_id.into()),
            ..Self::default()
        }
    }

    pub fn for_state(state: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            ..Self::default()
        }
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_childtype(mut self, childtype: ChildType) -> Self {
        self.childtype = Some(childtype);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let given = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        if given(&self.region_id) == given(&self.state) {
            return Err(ZillowError::Validation(
                "One of 'region_id' or 'state' is required".to_string(),
            ));
        }
        Ok(())
    }

    fn to_params(&self, zws_id: &str) -> Params {
        vec![
            ("regionId", self.region_id.clone()),
            ("state", self.state.clone()),
            ("county", self.county.clone()),
            ("city", self.city.clone()),
            ("childtype", self.childtype.map(|c| c.as_str().to_string())),
            ("zws-id", Some(zws_id.to_string())),
        ]
    }
}

pub struct NeighborhoodApi<T: Transport = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
}

impl NeighborhoodApi<ReqwestTransport> {
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: Transport> NeighborhoodApi<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Subregions (ids, names, zindex, coordinates and page links) of the
    /// region described by `query`.
    pub async fn get_region_children(&self, zws_id: &str, query: &RegionChildrenQuery) -> Result<RegionChildren> {
        require(zws_id, "zws-id")?;
        query.validate()?;

        let params = query.to_params(zws_id);
        let document = fetch(&self.transport, &self.config, Endpoint::RegionChildren, &params).await?;
        Self::parse_region_children(&document)
    }

    // response > list > region; a list without regions is an empty result
    pub fn parse_region_children(document: &Document) -> Result<RegionChildren> {
        let response = document.subtree(&["response"])?;
        let list = response.get("list").ok_or_else(|| {
            ZillowError::invalid_response(
                format!("missing {} > response > list", document.endpoint().root_key()),
                document.raw(),
            )
        })?;

        let regions = list
            .get("region")
            .map(|region| region.items())
            .unwrap_or_default()
            .into_iter()
            .map(|item| ingest_item("No valid region data found", item, Region::from_node(item)))
            .collect::<Result<Vec<_>>>()?;

        let subregion_type = response.child_text("subregiontype").map(str::to_string);
        debug!(
            regions = regions.len(),
            subregion_type = subregion_type.as_deref().unwrap_or_default(),
            "region children parsed"
        );

        Ok(RegionChildren {
            subregion_type,
            regions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock_transport::MockTransport;
    use test_case::test_case;

    const REGION_CHILDREN: &str = include_str!("../samples/get_region_children.xml");

    fn api(body: &str) -> NeighborhoodApi<MockTransport> {
        NeighborhoodApi::with_transport(ClientConfig::default(), MockTransport::new(body))
    }

    #[test]
    fn test_parse_region_children() {
        let document = Document::parse(Endpoint::RegionChildren, REGION_CHILDREN).unwrap();
        let children = NeighborhoodApi::<MockTransport>::parse_region_children(&document).unwrap();

        assert_eq!(children.subregion_type.as_deref(), Some("neighborhood"));
        assert_eq!(children.regions.len(), 3);

        let alki = &children.regions[0];
        assert_eq!(alki.region_name.as_deref(), Some("Alki"));
        assert_eq!(alki.zindex.as_ref().unwrap().text.as_deref(), Some("537360"));

        let names: Vec<&str> = children
            .regions
            .iter()
            .filter_map(|r| r.region_name.as_deref())
            .collect();
        assert_eq!(names, vec!["Alki", "Ballard", "Georgetown"]);
        assert!(children.regions[2].zindex.is_none());
        assert!(children.regions[2].url.is_none());
    }

    #[tokio::test]
    async fn test_get_region_children_request() {
        let api = api(REGION_CHILDREN);
        let query = RegionChildrenQuery::for_state("wa")
            .with_city("seattle")
            .with_childtype(ChildType::Neighborhood);

        let children = api.get_region_children("X1", &query).await.unwrap();

        assert_eq!(children.regions.len(), 3);
        assert_eq!(
            api.transport.last_url().unwrap(),
            "https://www.zillow.com/webservice/GetRegionChildren.htm?state=wa&city=seattle&childtype=neighborhood&zws-id=X1"
        );
    }

    #[tokio::test]
    async fn test_get_region_children_by_region_id() {
        let api = api(REGION_CHILDREN);
        let query = RegionChildrenQuery::for_region("16037").with_county("King");

        api.get_region_children("X1", &query).await.unwrap();

        assert!(api
            .transport
            .last_url()
            .unwrap()
            .ends_with("?regionId=16037&county=King&zws-id=X1"));
    }

    #[test_case(RegionChildrenQuery::default(); "#1 neither region id nor state")]
    #[test_case(RegionChildrenQuery { region_id: Some("16037".to_string()), state: Some("wa".to_string()), ..Default::default() }; "#2 both region id and state")]
    #[test_case(RegionChildrenQuery { state: Some("  ".to_string()), ..Default::default() }; "#3 blank state")]
    fn test_region_children_validation(query: RegionChildrenQuery) {
        let api = api(REGION_CHILDREN);
        let result = tokio_test::block_on(api.get_region_children("X1", &query));

        assert!(result.unwrap_err().is_validation());
        assert_eq!(api.transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_single_region_normalized_to_sequence() {
        let body = r#"<RegionChildren:regionchildren><message><code>0</code></message><response><list>
            <count>1</count>
            <region><id>1</id><name>Only</name><zindex currency="USD">100</zindex></region>
            </list></response></RegionChildren:regionchildren>"#;
        let children = api(body)
            .get_region_children("X1", &RegionChildrenQuery::for_state("wa"))
            .await
            .unwrap();

        assert_eq!(children.regions.len(), 1);
        assert_eq!(children.regions[0].region_name.as_deref(), Some("Only"));
    }

    #[tokio::test]
    async fn test_empty_list() {
        let body = "<RegionChildren:regionchildren><response><list><count>0</count></list></response></RegionChildren:regionchildren>";
        let children = api(body)
            .get_region_children("X1", &RegionChildrenQuery::for_state("wa"))
            .await
            .unwrap();
        assert!(children.regions.is_empty());
    }

    #[test_case("<region/>", 1; "#1 empty region alone")]
    #[test_case("<region/><region><name>A</name></region>", 2; "#2 empty region with a sibling")]
    #[test_case("<region><name>A</name></region><region/>", 2; "#3 empty region last")]
    fn test_empty_region_counts_as_a_region(regions: &str, expected: usize) {
        let body = format!(
            "<RegionChildren:regionchildren><response><list>{}</list></response></RegionChildren:regionchildren>",
            regions
        );
        let api = api(&body);
        let children =
            tokio_test::block_on(api.get_region_children("X1", &RegionChildrenQuery::for_state("wa"))).unwrap();

        assert_eq!(children.regions.len(), expected);
        assert!(children.regions.contains(&Region::default()));
    }

    #[test]
    fn test_unreadable_coordinates_do_not_fail_the_call() {
        let body = "<RegionChildren:regionchildren><response><list>
            <region><name>Alki</name><latitude>north</latitude></region>
            </list></response></RegionChildren:regionchildren>";
        let document = Document::parse(Endpoint::RegionChildren, body).unwrap();
        let children = NeighborhoodApi::<MockTransport>::parse_region_children(&document).unwrap();

        assert_eq!(children.regions[0].region_name.as_deref(), Some("Alki"));
        assert!(children.regions[0].latitude.is_none());
    }

    #[tokio::test]
    async fn test_missing_list_is_response_error() {
        let body = "<RegionChildren:regionchildren><response><subregiontype>city</subregiontype></response></RegionChildren:regionchildren>";
        let err = api(body)
            .get_region_children("X1", &RegionChildrenQuery::for_state("wa"))
            .await
            .unwrap_err();

        match err {
            ZillowError::InvalidResponse { message, raw } => {
                assert_eq!(message, "missing RegionChildren:regionchildren > response > list");
                assert_eq!(raw, body);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_region_aborts_whole_call() {
        let body = "<RegionChildren:regionchildren><response><list>
            <region><name>Good</name></region>
            <region>Bad</region>
            </list></response></RegionChildren:regionchildren>";
        let err = api(body)
            .get_region_children("X1", &RegionChildrenQuery::for_state("wa"))
            .await
            .unwrap_err();

        assert!(err.raw_response().unwrap().contains("Bad"));
    }

    #[test_case("neighborhood", ChildType::Neighborhood; "#1 lowercase")]
    #[test_case("ZipCode", ChildType::Zipcode; "#2 mixed case")]
    #[test_case(" county ", ChildType::County; "#3 padded")]
    fn test_child_type_from_str(input: &str, expected: ChildType) {
        assert_eq!(input.parse::<ChildType>().unwrap(), expected);
        assert_eq!(expected.to_string(), expected.as_str());
    }

    #[test]
    fn test_unknown_child_type() {
        assert!("borough".parse::<ChildType>().unwrap_err().is_validation());
    }
}
