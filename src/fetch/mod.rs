mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, anyhow};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

/// Issues a GET for `url` through the given client, asking for JSON.
pub async fn get<C: HttpClient>(client: &C, url: &str) -> Result<reqwest::Response> {
    let mut req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
    req.headers_mut()
        .insert(ACCEPT, "application/json".parse().unwrap());

    Ok(client.execute(req).await?)
}

/// GETs `url` and deserializes the JSON body, failing on non-2xx statuses.
pub async fn get_json<C: HttpClient, T: DeserializeOwned>(client: &C, url: &str) -> Result<T> {
    let resp = get(client, url).await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("request to {url} failed with status {status}"));
    }

    Ok(resp.json().await?)
}
