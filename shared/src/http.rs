//! HTTP helpers for the Lambda handler.

use lambda_http::http::response::Builder;
use lambda_http::{Body, Response};
use serde::Serialize;

use crate::cors::CorsHeaders;
use crate::models::ErrorBody;
use crate::Error;

fn with_cors(cors: &CorsHeaders) -> Builder {
    cors.pairs()
        .into_iter()
        .fold(Response::builder(), |builder, (name, value)| {
            builder.header(name, value)
        })
}

/// Empty response carrying only the CORS headers, for preflight requests.
pub fn preflight_response(cors: &CorsHeaders) -> Result<Response<Body>, lambda_http::Error> {
    Ok(with_cors(cors).status(200).body(Body::Empty)?)
}

/// Create a JSON response with the given status code, data and extra headers.
pub fn json_response_with_headers<T: Serialize>(
    status: u16,
    cors: &CorsHeaders,
    headers: &[(&str, &str)],
    data: &T,
) -> Result<Response<Body>, lambda_http::Error> {
    let builder = headers.iter().fold(
        with_cors(cors)
            .status(status)
            .header("Content-Type", "application/json"),
        |builder, (name, value)| builder.header(*name, *value),
    );

    Ok(builder.body(Body::from(serde_json::to_string(data)?))?)
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(
    status: u16,
    cors: &CorsHeaders,
    data: &T,
) -> Result<Response<Body>, lambda_http::Error> {
    json_response_with_headers(status, cors, &[], data)
}

/// Create the client-facing response for `error`.
///
/// Only the error's public message is sent; the detail stays in the logs.
pub fn error_response(
    error: &Error,
    cors: &CorsHeaders,
) -> Result<Response<Body>, lambda_http::Error> {
    let body = ErrorBody::new(error.public_message());
    match error {
        Error::RateLimited { retry_after_secs } => {
            let retry_after = retry_after_secs.to_string();
            json_response_with_headers(
                error.status_code(),
                cors,
                &[("Retry-After", retry_after.as_str())],
                &body,
            )
        }
        _ => json_response(error.status_code(), cors, &body),
    }
}
