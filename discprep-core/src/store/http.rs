//! Blocking HTTP implementation of [`MetadataStore`].

use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::{
    DiscRecord, LayoutItem, LayoutRequest, LayoutStatus, MetadataStore, NewDisc, PublishOutcome,
    UserSettings,
};
use crate::config::RipConfig;
use crate::error::{CoreError, CoreResult};
use crate::model::{AudioTrack, Title};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Metadata store reached over HTTP with JSON bodies.
pub struct HttpMetadataStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpMetadataStore {
    /// Creates a client for `base_url` with an optional bearer token.
    pub fn new(base_url: &str, token: Option<String>) -> CoreResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("discprep/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &RipConfig) -> CoreResult<Self> {
        Self::new(&config.store_url, config.user_token.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn json<T: DeserializeOwned>(response: Response) -> CoreResult<T> {
        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn create_outcome(response: Response) -> CoreResult<PublishOutcome> {
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(PublishOutcome::Created),
            StatusCode::CONFLICT => Ok(PublishOutcome::AlreadyExists),
            _ => Err(unexpected(response)),
        }
    }
}

fn unexpected(response: Response) -> CoreError {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    CoreError::StoreResponse { status, body }
}

fn expect_success(response: Response) -> CoreResult<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(unexpected(response))
    }
}

impl MetadataStore for HttpMetadataStore {
    fn lookup_disc(&self, checksum: &str) -> CoreResult<Option<DiscRecord>> {
        let response = self
            .request(Method::GET, "lookup")
            .query(&[("checksum", checksum)])
            .send()?;
        match response.status() {
            StatusCode::OK => Ok(Some(Self::json(response)?)),
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(unexpected(response)),
        }
    }

    fn create_disc(&self, disc: &NewDisc) -> CoreResult<PublishOutcome> {
        let response = self.request(Method::POST, "discs").json(disc).send()?;
        log::debug!("POST /discs -> HTTP {}", response.status());
        Self::create_outcome(response)
    }

    fn rekey_disc(&self, old_checksum: &str, new_checksum: &str) -> CoreResult<()> {
        let response = self
            .request(Method::PUT, &format!("discs/{old_checksum}/checksum"))
            .json(&serde_json::json!({ "new_checksum": new_checksum }))
            .send()?;
        expect_success(response)
    }

    fn link_disc(&self, checksum: &str) -> CoreResult<()> {
        if self.token.is_none() {
            return Ok(());
        }
        let response = self
            .request(Method::POST, &format!("users/me/discs/{checksum}"))
            .send()?;
        match response.status() {
            // Unknown discs are linked when they are created.
            StatusCode::NOT_FOUND => Ok(()),
            _ => expect_success(response),
        }
    }

    fn create_layout(&self, checksum: &str, layout: &LayoutRequest) -> CoreResult<PublishOutcome> {
        let response = self
            .request(Method::POST, &format!("metadata-layout/{checksum}"))
            .json(layout)
            .send()?;
        Self::create_outcome(response)
    }

    fn layout_status(&self, checksum: &str) -> CoreResult<LayoutStatus> {
        let response = self
            .request(Method::GET, &format!("metadata-layout/{checksum}"))
            .send()?;
        if response.status() != StatusCode::OK {
            return Err(unexpected(response));
        }
        Self::json(response)
    }

    fn list_items(&self, checksum: &str) -> CoreResult<Vec<LayoutItem>> {
        let response = self
            .request(Method::GET, &format!("metadata-layout/{checksum}/items"))
            .send()?;
        match response.status() {
            StatusCode::OK => Self::json(response),
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            _ => Err(unexpected(response)),
        }
    }

    fn create_item(&self, checksum: &str, title: &Title) -> CoreResult<PublishOutcome> {
        let response = self
            .request(Method::POST, &format!("metadata-layout/{checksum}/items"))
            .json(title)
            .send()?;
        Self::create_outcome(response)
    }

    fn update_item_audio(&self, item_id: i64, audio_tracks: &[AudioTrack]) -> CoreResult<()> {
        let response = self
            .request(Method::PATCH, &format!("metadata-layout/items/{item_id}"))
            .json(&serde_json::json!({ "audio_tracks": audio_tracks }))
            .send()?;
        expect_success(response)
    }

    fn delete_item(&self, item_id: i64) -> CoreResult<()> {
        let response = self
            .request(Method::DELETE, &format!("metadata-layout/items/{item_id}"))
            .send()?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            _ => expect_success(response),
        }
    }

    fn user_settings(&self) -> CoreResult<Option<UserSettings>> {
        if self.token.is_none() {
            return Ok(None);
        }
        let response = self.request(Method::GET, "users/me/settings").send()?;
        if response.status() == StatusCode::OK {
            Ok(Some(Self::json(response)?))
        } else {
            log::debug!("User settings unavailable: HTTP {}", response.status());
            Ok(None)
        }
    }

    fn health(&self) -> CoreResult<()> {
        let response = self.request(Method::GET, "health").send()?;
        expect_success(response)
    }
}
