//! Clients for the upstream services
//!
//! Both clients map the service JSON into the typed records of
//! [`crate::models`] before anything reaches the UI.

pub mod deezer;
pub mod tmdb;

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::Result;

pub use deezer::DeezerClient;
pub use tmdb::TmdbClient;

/// Blocking HTTP GET with a shared agent; clones are cheap
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .timeout_connect(Some(Duration::from_secs(10)))
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: user_agent.to_string(),
        }
    }

    pub fn get_text(&self, url: &str) -> Result<String> {
        tracing::debug!("GET {}", redact(url));
        let mut response = self
            .agent
            .get(url)
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", "application/json")
            .call()?;
        let body = response.body_mut().read_to_string()?;
        Ok(body)
    }
}

/// `base + path + ?k=v&...` with percent-encoded values
pub fn build_url(base: &str, path: &str, params: &[(&str, &str)]) -> String {
    let mut url = format!("{}{}", base.trim_end_matches('/'), path);
    for (i, (key, value)) in params.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(key);
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}

/// Hide the api key in log lines
fn redact(url: &str) -> String {
    match url.find("api_key=") {
        Some(start) => {
            let value_start = start + "api_key=".len();
            let end = url[value_start..].find('&').map(|i| value_start + i).unwrap_or(url.len());
            format!("{}***{}", &url[..value_start], &url[end..])
        }
        None => url.to_string(),
    }
}

/// Treat an explicit `null` like a missing field
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
