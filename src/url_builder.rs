// Request URL assembly: base endpoint + optional path segments + query parameters
use url::form_urlencoded;
use url::Url;

/// Encode `params` as `key=value&key=value`, dropping pairs whose value is `None`.
///
/// Returns `None` when nothing is left to encode.
pub fn encode_parameters<K, V>(params: &[(K, Option<V>)]) -> Option<String>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut appended = false;
    for (key, value) in params {
        if let Some(value) = value {
            serializer.append_pair(key.as_ref(), value.as_ref());
            appended = true;
        }
    }

    appended.then(|| serializer.finish())
}

/// Build a request URL from `base`, extra path segments and query parameters.
///
/// Empty or `None` path segments are skipped, the remaining ones are joined
/// with `/` onto the base path. Query parameters are appended after any query
/// already present on `base`, in the order given. A base that does not parse
/// as a URL is used verbatim.
pub fn build_url<K, V>(base: &str, path_elements: &[Option<&str>], params: &[(K, Option<V>)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let segments: Vec<&str> = path_elements
        .iter()
        .flatten()
        .copied()
        .filter(|segment| !segment.is_empty())
        .collect();

    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(_) => return build_unparsed(base, &segments, params),
    };

    if !segments.is_empty() {
        let mut path = url.path().to_string();
        if !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(&segments.join("/"));
        url.set_path(&path);
    }

    if params.iter().any(|(_, value)| value.is_some()) {
        let mut query = url.query_pairs_mut();
        for (key, value) in params {
            if let Some(value) = value {
                query.append_pair(key.as_ref(), value.as_ref());
            }
        }
    }

    url.into()
}

fn build_unparsed<K, V>(base: &str, segments: &[&str], params: &[(K, Option<V>)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = base.to_string();
    if !segments.is_empty() {
        if !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(&segments.join("/"));
    }
    if let Some(query) = encode_parameters(params) {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query);
    }
    url
}
