//! Typed wrapper over a generic REST resource store.
//!
//! The store exposes named collections under `/api/{collection}`: equality
//! filtering and single-field sorting on list GETs, shallow-merge PATCH on
//! documents, and server-assigned string ids on POST. Responses are shaped
//! into typed structs at this boundary; nothing downstream handles raw
//! JSON.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::StoreConfig;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Builder for collection queries: equality filters on top-level fields
/// plus an optional single-field sort.
#[derive(Debug, Clone, Default)]
pub struct Query {
    filters: Vec<(String, String)>,
    sort: Option<(String, SortOrder)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((field.into(), value.to_string()));
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filters.clone();
        if let Some((field, order)) = &self.sort {
            pairs.push(("sortBy".to_string(), field.clone()));
            pairs.push(("order".to_string(), order.as_str().to_string()));
        }
        pairs
    }
}

/// Thin typed client for the resource store. One shared HTTP client with the
/// configured request timeout; no retries here — retry is a policy decision
/// left to callers.
pub struct ResourceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ResourceClient {
    pub fn new(config: &StoreConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Unknown(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/api/{collection}", self.base_url)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/api/{collection}/{id}", self.base_url)
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<T>, Error> {
        let response = self
            .http
            .get(self.collection_url(collection))
            .query(&query.pairs())
            .send()
            .await?;
        Self::shape(response, collection).await
    }

    pub async fn get_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<T, Error> {
        let response = self
            .http
            .get(self.document_url(collection, id))
            .send()
            .await?;
        Self::shape(response, &format!("{collection}/{id}")).await
    }

    /// POST a new document; the store assigns the id. Callers must not
    /// assume anything about the id beyond it being a string.
    pub async fn create<T: DeserializeOwned>(
        &self,
        collection: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let response = self
            .http
            .post(self.collection_url(collection))
            .json(body)
            .send()
            .await?;
        Self::shape(response, collection).await
    }

    /// PATCH a document. The store merges shallowly: list fields must be
    /// sent as full replacement arrays, never as deltas.
    pub async fn update<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        patch: &impl Serialize,
    ) -> Result<T, Error> {
        let response = self
            .http
            .patch(self.document_url(collection, id))
            .json(patch)
            .send()
            .await?;
        Self::shape(response, &format!("{collection}/{id}")).await
    }

    pub async fn remove(&self, collection: &str, id: &str) -> Result<(), Error> {
        let response = self
            .http
            .delete(self.document_url(collection, id))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::from_status(status, &format!("{collection}/{id}")))
        }
    }

    /// Send file bytes to the store's upload endpoint; returns the stored
    /// relative path. The endpoint replies with a bare path, optionally
    /// JSON-quoted.
    pub async fn upload(
        &self,
        field_name: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, Error> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part(field_name.to_string(), part);

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::from_status(status, "upload"));
        }

        let body = response.text().await?;
        Ok(body.trim().trim_matches('"').to_string())
    }

    async fn shape<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, Error> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::from_status(status, context));
        }
        Ok(response.json::<T>().await?)
    }
}
