use reqwest::Url;

use super::TransportError;
use crate::config::CoreConfig;

/// URL layout of the item backend and the data services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    backend_base_url: String,
    data_base_url: String,
    api_key: String,
    client_id: String,
}

impl Endpoints {
    pub fn new(
        backend_base_url: impl Into<String>,
        data_base_url: impl Into<String>,
        api_key: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            backend_base_url: backend_base_url.into().trim_end_matches('/').to_string(),
            data_base_url: data_base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client_id: client_id.into(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            config.backend_base_url.clone(),
            config.data_base_url.clone(),
            config.api_key.clone(),
            config.client_id.clone(),
        )
    }

    pub fn items_sync(&self) -> Result<String, TransportError> {
        self.backend_url(&["items", "sync"], true)
    }

    pub fn items(&self) -> Result<String, TransportError> {
        self.backend_url(&["items"], true)
    }

    pub fn item(&self, item_id: &str) -> Result<String, TransportError> {
        self.backend_url(&["items", item_id], false)
    }

    pub fn item_done(&self, item_id: &str) -> Result<String, TransportError> {
        self.backend_url(&["items", item_id, "done"], false)
    }

    pub fn sort(&self) -> Result<String, TransportError> {
        Ok(join(&self.data_base_url, &["sort", ""])?.into())
    }

    pub fn collect(&self) -> Result<String, TransportError> {
        Ok(join(&self.data_base_url, &["collect", ""])?.into())
    }

    /// Backend URL authenticated by api key, optionally tagged with the client id.
    fn backend_url(&self, segments: &[&str], with_client: bool) -> Result<String, TransportError> {
        let mut url = join(&self.backend_base_url, segments)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("k", &self.api_key);
            if with_client {
                query.append_pair("c", &self.client_id);
            }
        }
        Ok(url.into())
    }
}

/// Append escaped path segments to `base`.
fn join(base: &str, segments: &[&str]) -> Result<Url, TransportError> {
    let mut url = Url::parse(base).map_err(|e| TransportError::BadUrl(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| TransportError::BadUrl(format!("{}: not a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
