use std::time::Duration;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::ports::FeedError;

/// HTTP client with an explicit per-request timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client, FeedError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("momentum-radar/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FeedError::Transport(format!("failed to build HTTP client: {}", e)))
}

/// GET `url` with query params and decode the JSON body.
///
/// Non-2xx responses become `FeedError::Status`, undecodable bodies
/// `FeedError::Parse`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, FeedError> {
    let response = http.get(url).query(query).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| FeedError::Parse(format!("{}: {}", url, e)))
}

/// Join a base URL and a path without doubling slashes
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
