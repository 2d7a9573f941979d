// Endpoint catalogue and the response envelope shared by every endpoint
use crate::config::ClientConfig;
use crate::error::{ParseError, Result, ZillowError};
use crate::transport::{request_url, HttpMethod, Transport};
use crate::xml_tree::{self, Node};
use tracing::{debug, warn};

pub type Params = Vec<(&'static str, Option<String>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    SearchResults,
    Zestimate,
    DeepSearchResults,
    DeepComps,
    Comps,
    RegionChildren,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::SearchResults => "GetSearchResults",
            Endpoint::Zestimate => "GetZestimate",
            Endpoint::DeepSearchResults => "GetDeepSearchResults",
            Endpoint::DeepComps => "GetDeepComps",
            Endpoint::Comps => "GetComps",
            Endpoint::RegionChildren => "GetRegionChildren",
        }
    }

    // Root element of the XML document each endpoint answers with
    pub fn root_key(&self) -> &'static str {
        match self {
            Endpoint::SearchResults | Endpoint::DeepSearchResults => "SearchResults:searchresults",
            Endpoint::Zestimate => "Zestimate:zestimate",
            Endpoint::DeepComps | Endpoint::Comps => "Comps:comps",
            Endpoint::RegionChildren => "RegionChildren:regionchildren",
        }
    }
}

/// A parsed response body, kept together with its raw text so every
/// response-shape error can show what the provider actually sent.
#[derive(Debug, Clone)]
pub struct Document {
    endpoint: Endpoint,
    raw: String,
    tree: Node,
}

impl Document {
    /// Parse `raw` and check the provider's `message/code` status.
    pub fn parse(endpoint: Endpoint, raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let tree = match xml_tree::parse(&raw) {
            Ok(tree) => tree,
            Err(err) => return Err(ZillowError::invalid_response(err.to_string(), raw)),
        };

        let document = Self { endpoint, raw, tree };
        document.check_status()?;
        Ok(document)
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tree(&self) -> &Node {
        &self.tree
    }

    // A non-zero code means the provider refused the request; the text explains why
    fn check_status(&self) -> Result<()> {
        let message = match self.tree.path(&[self.endpoint.root_key(), "message"]) {
            Some(message) => message,
            None => return Ok(()),
        };

        match message.child_text("code").map(str::trim) {
            Some("0") | None => Ok(()),
            Some(code) => {
                let text = message.child_text("text").unwrap_or("no message");
                warn!(endpoint = self.endpoint.name(), code, text, "provider returned an error code");
                Err(ZillowError::invalid_response(
                    format!("provider returned code {}: {}", code, text),
                    self.raw.clone(),
                ))
            }
        }
    }

    /// Subtree at `keys`, below the endpoint's root element.
    pub fn subtree(&self, keys: &[&str]) -> Result<&Node> {
        let mut path = vec![self.endpoint.root_key()];
        path.extend_from_slice(keys);

        self.tree.path(&path).ok_or_else(|| {
            ZillowError::invalid_response(format!("missing {}", path.join(" > ")), self.raw.clone())
        })
    }

    /// Same as [`Document::subtree`] but an absent path is `None`.
    pub fn optional_subtree(&self, keys: &[&str]) -> Option<&Node> {
        let mut path = vec![self.endpoint.root_key()];
        path.extend_from_slice(keys);
        self.tree.path(&path)
    }

    // Attach the whole response to an ingestion failure
    pub(crate) fn ingest<T>(&self, context: &str, result: std::result::Result<T, ParseError>) -> Result<T> {
        result.map_err(|e| ZillowError::invalid_response(format!("{}: {}", context, e), self.raw.clone()))
    }
}

// Attach only the offending element to an item-level ingestion failure
pub(crate) fn ingest_item<T>(
    context: &str,
    item: &Node,
    result: std::result::Result<T, ParseError>,
) -> Result<T> {
    result.map_err(|e| ZillowError::invalid_response(format!("{}: {}", context, e), item.to_string()))
}

pub(crate) fn require(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(ZillowError::Validation(format!("{} is required", name)))
    } else {
        Ok(())
    }
}

/// Issue the request for `endpoint` and parse the response body.
pub(crate) async fn fetch<T>(
    transport: &T,
    config: &ClientConfig,
    endpoint: Endpoint,
    params: &Params,
) -> Result<Document>
where
    T: Transport + ?Sized,
{
    let url = config.endpoint_url(endpoint.name());
    let response = request_url(transport, &url, HttpMethod::Get, params.as_slice()).await?;

    if !response.is_success() {
        // The provider reports most failures in the body, so keep going
        warn!(endpoint = endpoint.name(), status = response.status, "non-success HTTP status");
    }

    let document = Document::parse(endpoint, response.text())?;
    debug!(endpoint = endpoint.name(), bytes = document.raw().len(), "response parsed");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const ERROR_NO_MATCH: &str = include_str!("../samples/error_no_match.xml");

    #[test_case(Endpoint::SearchResults, "GetSearchResults", "SearchResults:searchresults"; "#1 search")]
    #[test_case(Endpoint::DeepSearchResults, "GetDeepSearchResults", "SearchResults:searchresults"; "#2 deep search")]
    #[test_case(Endpoint::Zestimate, "GetZestimate", "Zestimate:zestimate"; "#3 zestimate")]
    #[test_case(Endpoint::Comps, "GetComps", "Comps:comps"; "#4 comps")]
    #[test_case(Endpoint::DeepComps, "GetDeepComps", "Comps:comps"; "#5 deep comps")]
    #[test_case(Endpoint::RegionChildren, "GetRegionChildren", "RegionChildren:regionchildren"; "#6 region children")]
    fn test_endpoint_names(endpoint: Endpoint, name: &str, root: &str) {
        assert_eq!(endpoint.name(), name);
        assert_eq!(endpoint.root_key(), root);
    }

    #[test]
    fn test_provider_error_code() {
        let err = Document::parse(Endpoint::SearchResults, ERROR_NO_MATCH).unwrap_err();
        match &err {
            ZillowError::InvalidResponse { message, raw } => {
                assert_eq!(
                    message,
                    "provider returned code 508: Error: no exact match found for input address"
                );
                assert_eq!(raw, ERROR_NO_MATCH);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_malformed_xml_keeps_raw_body() {
        let err = Document::parse(Endpoint::Comps, "<html><body>Bad gateway").unwrap_err();
        assert_eq!(err.raw_response(), Some("<html><body>Bad gateway"));
        match err {
            ZillowError::InvalidResponse { message, .. } => assert!(message.starts_with("XML parse error:")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_subtree() {
        let raw = "<Comps:comps><message><code>0</code></message><response/></Comps:comps>";
        let doc = Document::parse(Endpoint::Comps, raw).unwrap();

        let err = doc.subtree(&["response", "properties", "principal"]).unwrap_err();
        match err {
            ZillowError::InvalidResponse { message, raw: body } => {
                assert_eq!(message, "missing Comps:comps > response > properties > principal");
                assert_eq!(body, raw);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(doc.optional_subtree(&["response"]).is_none());
    }

    #[test]
    fn test_document_without_message_is_accepted() {
        let doc = Document::parse(Endpoint::Zestimate, "<Zestimate:zestimate><response><zpid>1</zpid></response></Zestimate:zestimate>")
            .unwrap();
        assert_eq!(doc.subtree(&["response", "zpid"]).unwrap().text(), Some("1"));
        assert_eq!(doc.endpoint(), Endpoint::Zestimate);
    }

    #[test]
    fn test_require() {
        assert!(require("X1", "zws-id").is_ok());
        assert!(require("  ", "zws-id").unwrap_err().is_validation());
    }
}
