//! `reqwest` implementation of [`ChecklistApi`].

use crate::config::ClientConfig;
use crate::wire::{Ack, CreateListBody, ItemBody, ListReply, ListsReply, RenameListBody, accept};
use checklist_core::api::ChecklistApi;
use checklist_core::error::{ChecklistError, Result};
use checklist_core::model::{Checklist, Item, ItemId, ItemUpdate, ListId, NewItem, UserId};
use checklist_core::session::SessionToken;
use checklist_runtime::retry::{RetryPolicy, retry_if};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::future::Future;

/// Builds a reqwest client with the configured timeout
pub(crate) fn build_client(config: &ClientConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| ChecklistError::Transport(e.to_string()))
}

/// Parses the configured service URL
pub(crate) fn parse_base(api_url: &str) -> Result<Url> {
    let base = Url::parse(api_url).map_err(|e| ChecklistError::Transport(format!("invalid service URL: {e}")))?;
    if base.cannot_be_a_base() {
        return Err(ChecklistError::Transport(format!("invalid service URL: {api_url}")));
    }
    Ok(base)
}

/// `base` with `segments` appended, each percent-encoded
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Sends a request and decodes the JSON reply.
///
/// Non-success statuses become [`ChecklistError::Http`]; an empty body
/// decodes as `{}`.
pub(crate) async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| ChecklistError::Transport(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ChecklistError::Transport(e.to_string()))?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "Service returned an error status");
        return Err(ChecklistError::Http {
            status: status.as_u16(),
            message: body,
        });
    }

    let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
    serde_json::from_str(body).map_err(|e| ChecklistError::Decode(e.to_string()))
}

/// HTTP client for the checklist service
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpChecklistApi {
    client: Client,
    base: Url,
    retry: RetryPolicy,
}

impl HttpChecklistApi {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ChecklistError::Transport`] if the service URL is invalid or
    /// the TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base: parse_base(&config.api_url)?,
            retry: config.retry_policy(),
        })
    }

    /// Replace the fetch retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, method: Method, segments: &[&str], token: &SessionToken) -> RequestBuilder {
        let url = endpoint(&self.base, segments);
        tracing::debug!(%method, path = url.path(), "Sending request");
        self.client.request(method, url).bearer_auth(token.expose())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        segments: &[&str],
        token: &SessionToken,
    ) -> Result<T> {
        retry_if(
            &self.retry,
            operation,
            || execute(self.request(Method::GET, segments, token)),
            ChecklistError::is_transient,
        )
        .await
    }
}

impl ChecklistApi for HttpChecklistApi {
    fn fetch_lists(
        &self,
        token: &SessionToken,
        user: &UserId,
    ) -> impl Future<Output = Result<Vec<Checklist>>> + Send {
        async move {
            let reply: ListsReply = self
                .fetch("fetch_lists", &["list", "all", user.as_str()], token)
                .await?;
            reply.into_lists()
        }
    }

    fn create_list(
        &self,
        token: &SessionToken,
        user: &UserId,
        name: &str,
    ) -> impl Future<Output = Result<Checklist>> + Send {
        async move {
            let request = self
                .request(Method::POST, &["list", "add", user.as_str()], token)
                .json(&CreateListBody { user_id: user, name });
            let reply: ListReply = execute(request).await?;
            reply.into_list()
        }
    }

    fn rename_list(
        &self,
        token: &SessionToken,
        list: &ListId,
        old_name: &str,
        new_name: &str,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            let request = self
                .request(Method::PUT, &["list", "name", list.as_str()], token)
                .json(&RenameListBody {
                    name: old_name,
                    new_name,
                });
            let reply: Ack = execute(request).await?;
            accept(reply.result)
        }
    }

    fn delete_list(
        &self,
        token: &SessionToken,
        list: &ListId,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            let request = self.request(Method::DELETE, &["list", list.as_str()], token);
            let reply: Ack = execute(request).await?;
            accept(reply.result)
        }
    }

    fn fetch_list(
        &self,
        token: &SessionToken,
        list: &ListId,
        user: &UserId,
    ) -> impl Future<Output = Result<Checklist>> + Send {
        async move {
            let reply: ListReply = self
                .fetch("fetch_list", &["list", list.as_str(), user.as_str()], token)
                .await?;
            reply.into_list()
        }
    }

    fn add_item(
        &self,
        token: &SessionToken,
        list: &ListId,
        item: &NewItem,
    ) -> impl Future<Output = Result<Item>> + Send {
        async move {
            let request = self
                .request(Method::POST, &["list", "add", "item", list.as_str()], token)
                .json(&ItemBody {
                    item: &item.name,
                    value: &item.value,
                    kind: item.kind,
                });
            let reply: ListReply = execute(request).await?;
            reply.into_item(&item.name)
        }
    }

    fn update_item(
        &self,
        token: &SessionToken,
        item: &ItemId,
        update: &ItemUpdate,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            let request = self
                .request(Method::PUT, &["list", "item", "update", item.as_str()], token)
                .json(&ItemBody {
                    item: &update.name,
                    value: &update.value,
                    kind: update.kind,
                });
            let reply: Ack = execute(request).await?;
            accept(reply.result)
        }
    }

    fn delete_item(
        &self,
        token: &SessionToken,
        item: &ItemId,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            let request = self.request(Method::DELETE, &["list", "item", "delete", item.as_str()], token);
            let reply: Ack = execute(request).await?;
            accept(reply.result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_and_encodes_segments() {
        let base = parse_base("http://localhost:3000/api/").unwrap();
        let url = endpoint(&base, &["list", "all", "user 1"]);
        assert_eq!(url.as_str(), "http://localhost:3000/api/list/all/user%201");

        let bare = parse_base("http://localhost:3000").unwrap();
        assert_eq!(endpoint(&bare, &["signin"]).path(), "/signin");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(parse_base("not a url"), Err(ChecklistError::Transport(_))));
        assert!(matches!(parse_base("mailto:someone"), Err(ChecklistError::Transport(_))));
    }
}
