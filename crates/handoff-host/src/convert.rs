//! Conversions between `http` crate types and handoff contract types.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri};

use handoff_core::{CompletedResponse, Fields, IncomingRequest, Scheme};

use crate::error::{InvokeError, InvokeResult};

/// Trailers of a completed response, carried in `http::Response` extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailers(pub HeaderMap);

/// Convert an `http::Request` into the request handed to a handler.
pub fn request_from_http(request: http::Request<Bytes>) -> InvokeResult<IncomingRequest> {
    let (parts, body) = request.into_parts();
    let headers = Fields::from_host_list(
        parts
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), Bytes::copy_from_slice(value.as_bytes()))),
    )
    .map_err(|e| InvokeError::InvalidRequest(e.to_string()))?;

    let mut incoming = IncomingRequest::new(parts.method, uri_path_and_query(&parts.uri))
        .with_headers(headers)
        .with_body(body);
    if let Some(scheme) = parts.uri.scheme_str() {
        incoming = incoming.with_scheme(scheme_from_str(scheme));
    }
    if let Some(authority) = parts.uri.authority() {
        incoming = incoming.with_authority(authority.as_str());
    }
    Ok(incoming)
}

/// Convert a completed response into an `http::Response`.
///
/// Trailers, if any, are attached as a [`Trailers`] extension.
pub fn response_to_http(response: CompletedResponse) -> InvokeResult<http::Response<Bytes>> {
    let (status, headers, body, trailers) = response.into_parts();
    let status = StatusCode::from_u16(status)
        .map_err(|_| InvokeError::InvalidResponse(format!("status code {status}")))?;

    let mut http_response = http::Response::new(body);
    *http_response.status_mut() = status;
    *http_response.headers_mut() = fields_to_header_map(&headers)?;
    if let Some(trailers) = trailers {
        let trailers = fields_to_header_map(&trailers)?;
        http_response.extensions_mut().insert(Trailers(trailers));
    }
    Ok(http_response)
}

/// Convert fields to a `HeaderMap`, keeping repeated names.
///
/// [`Fields`] applies the same name and value rules as `http`, so this
/// only fails if those rules ever diverge.
pub fn fields_to_header_map(fields: &Fields) -> InvokeResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(fields.len());
    for field in fields.iter() {
        let name = HeaderName::from_bytes(field.name.as_bytes())
            .map_err(|e| InvokeError::InvalidResponse(format!("header {:?}: {e}", field.name)))?;
        let value = HeaderValue::from_bytes(&field.value)
            .map_err(|e| InvokeError::InvalidResponse(format!("header {:?}: {e}", field.name)))?;
        map.append(name, value);
    }
    Ok(map)
}

/// Extract the path and query from a URI.
pub fn uri_path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

fn scheme_from_str(scheme: &str) -> Scheme {
    match scheme {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        other => Scheme::Other(other.to_string()),
    }
}
