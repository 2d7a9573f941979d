// Sub-regions returned by the region children endpoint
use crate::error::ParseError;
use crate::xml_tree::Node;
use serde::Serialize;

// The zindex element carries the value as text and its unit as an attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZIndex {
    pub text: Option<String>,
    pub currency: Option<String>,
}

impl ZIndex {
    pub fn from_node(node: &Node) -> Self {
        Self {
            text: node.text().map(str::to_string),
            currency: node.attr("currency").map(str::to_string),
        }
    }

    pub fn value(&self) -> Option<u64> {
        self.text.as_deref().and_then(|t| t.replace(',', "").parse().ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Region {
    pub id: Option<String>,
    pub region_name: Option<String>,
    pub zindex: Option<ZIndex>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Only present for city and neighborhood subregions.
    pub url: Option<String>,
}

impl Region {
    // An empty region element gives a region with nothing set
    pub fn from_node(node: &Node) -> Result<Self, ParseError> {
        if node.is_null() {
            return Ok(Self::default());
        }
        if !node.is_map() {
            return Err(ParseError::InvalidFormat(format!(
                "expected region to be a mapping, got {}",
                node
            )));
        }

        Ok(Self {
            id: node.child_text("id").map(str::to_string),
            region_name: node.child_text("name").map(str::to_string),
            zindex: node.child("zindex").map(ZIndex::from_node),
            latitude: node.number_child("latitude"),
            longitude: node.number_child("longitude"),
            url: node.child_text("url").map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionChildren {
    pub subregion_type: Option<String>,
    pub regions: Vec<Region>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_tree::parse;

    #[test]
    fn test_region_from_node() {
        let xml = r#"<region>
            <id>271856</id>
            <name>Alki</name>
            <zindex currency="USD">537360</zindex>
            <url>http://www.zillow.com/local-info/WA-Seattle/Alki/r_271856/</url>
            <latitude>47.575041</latitude>
            <longitude>-122.408751</longitude>
        </region>"#;
        let doc = parse(xml).unwrap();
        let region = Region::from_node(doc.child("region").unwrap()).unwrap();

        assert_eq!(region.id.as_deref(), Some("271856"));
        assert_eq!(region.region_name.as_deref(), Some("Alki"));
        let zindex = region.zindex.unwrap();
        assert_eq!(zindex.text.as_deref(), Some("537360"));
        assert_eq!(zindex.currency.as_deref(), Some("USD"));
        assert_eq!(zindex.value(), Some(537360));
        assert_eq!(region.latitude, Some(47.575041));
        assert_eq!(region.longitude, Some(-122.408751));
        assert!(region.url.unwrap().ends_with("/Alki/r_271856/"));
    }

    #[test]
    fn test_region_without_optional_fields() {
        let doc = parse("<region><id>403152</id><name>Georgetown</name></region>").unwrap();
        let region = Region::from_node(doc.child("region").unwrap()).unwrap();

        assert_eq!(region.region_name.as_deref(), Some("Georgetown"));
        assert!(region.zindex.is_none());
        assert!(region.url.is_none());
        assert!(region.latitude.is_none());
    }

    #[test]
    fn test_zindex_without_unit() {
        let doc = parse("<region><zindex>1,250,000</zindex></region>").unwrap();
        let region = Region::from_node(doc.child("region").unwrap()).unwrap();
        let zindex = region.zindex.unwrap();

        assert_eq!(zindex.currency, None);
        assert_eq!(zindex.value(), Some(1_250_000));
    }

    #[test]
    fn test_region_must_be_mapping() {
        let result = Region::from_node(&Node::Text("Alki".to_string()));
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
        assert_eq!(Region::from_node(&Node::Null), Ok(Region::default()));
    }

    #[test]
    fn test_unreadable_coordinates_left_unset() {
        let doc = parse("<region><name>Alki</name><latitude>north</latitude><longitude>-122.4</longitude></region>").unwrap();
        let region = Region::from_node(doc.child("region").unwrap()).unwrap();

        assert_eq!(region.region_name.as_deref(), Some("Alki"));
        assert!(region.latitude.is_none());
        assert_eq!(region.longitude, Some(-122.4));
    }
}
