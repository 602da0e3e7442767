//! Typed access to the transactions REST backend.

use std::future::Future;

use api_types::{
    ApiResponse,
    page::{PageRequest, PageResponse},
    transaction::{DeleteOutcome, Transaction, TransactionDeleteRequest, TransactionRequest},
};
use reqwest::Url;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{ClientError, Result};

/// The five backend operations.
///
/// Every call issues one request and unwraps the response envelope. Nothing
/// here retries: `create` in particular may duplicate a record if replayed.
pub trait TransactionApi: Send + Sync {
    fn list(
        &self,
        page: &PageRequest,
    ) -> impl Future<Output = Result<PageResponse<Transaction>>> + Send;

    fn get(&self, transaction_id: &str) -> impl Future<Output = Result<Transaction>> + Send;

    fn create(
        &self,
        request: &TransactionRequest,
    ) -> impl Future<Output = Result<Transaction>> + Send;

    /// Full-payload replace; `request.transaction_id` must be set.
    fn update(
        &self,
        request: &TransactionRequest,
    ) -> impl Future<Output = Result<Transaction>> + Send;

    fn delete(
        &self,
        request: &TransactionDeleteRequest,
    ) -> impl Future<Output = Result<DeleteOutcome>> + Send;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// `base_url` includes the API base path, e.g. `http://127.0.0.1:8080/api`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    fn with_http(http: reqwest::Client, base_url: &str) -> Result<Self> {
        let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
        let parsed = Url::parse(&normalized)
            .map_err(|err| ClientError::InvalidUrl(format!("{base_url}: {err}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url: parsed,
            http,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<TQuery, TResp>(
        &self,
        url: Url,
        query: Option<&TQuery>,
    ) -> Result<ApiResponse<TResp>>
    where
        TQuery: Serialize + ?Sized,
        TResp: DeserializeOwned,
    {
        tracing::debug!(%url, "GET");
        let mut req = self.http.get(url);
        if let Some(query) = query {
            req = req.query(query);
        }
        read_envelope(req.send().await?).await
    }

    async fn post_json<TReq, TResp>(&self, url: Url, body: &TReq) -> Result<ApiResponse<TResp>>
    where
        TReq: Serialize + ?Sized,
        TResp: DeserializeOwned,
    {
        tracing::debug!(%url, "POST");
        let res = self.http.post(url).json(body).send().await?;
        read_envelope(res).await
    }
}

/// Decodes the envelope whatever the status line says; the status only
/// matters when the body is not an envelope at all.
async fn read_envelope<T: DeserializeOwned>(res: reqwest::Response) -> Result<ApiResponse<T>> {
    let status = res.status();
    let body = res.bytes().await?;
    match serde_json::from_slice::<ApiResponse<T>>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(ClientError::Status(status)),
        Err(err) => Err(err.into()),
    }
}

fn unwrap_data<T>(envelope: ApiResponse<T>) -> Result<T> {
    envelope.into_result()?.ok_or(ClientError::MissingData)
}

fn log_failure<T>(operation: &str, result: &Result<T>) {
    if let Err(err) = result {
        let code = err.error_code().map(|code| code.as_str()).unwrap_or("-");
        tracing::warn!(operation, code, "request failed: {err}");
    }
}

impl TransactionApi for ApiClient {
    async fn list(&self, page: &PageRequest) -> Result<PageResponse<Transaction>> {
        let result: Result<PageResponse<Transaction>> = async {
            let url = self.endpoint(&["transactions"])?;
            unwrap_data(self.get_json(url, Some(page)).await?)
        }
        .await;
        log_failure("list", &result);
        result
    }

    async fn get(&self, transaction_id: &str) -> Result<Transaction> {
        let result: Result<Transaction> = async {
            let url = self.endpoint(&["transactions", transaction_id])?;
            unwrap_data(self.get_json::<(), _>(url, None).await?)
        }
        .await;
        log_failure("get", &result);
        result
    }

    async fn create(&self, request: &TransactionRequest) -> Result<Transaction> {
        let result: Result<Transaction> = async {
            let url = self.endpoint(&["transactions", "create"])?;
            unwrap_data(self.post_json(url, request).await?)
        }
        .await;
        log_failure("create", &result);
        result
    }

    async fn update(&self, request: &TransactionRequest) -> Result<Transaction> {
        let result: Result<Transaction> = async {
            if request
                .transaction_id
                .as_deref()
                .is_none_or(|id| id.trim().is_empty())
            {
                return Err(ClientError::MissingTransactionId);
            }
            let url = self.endpoint(&["transactions", "update"])?;
            unwrap_data(self.post_json(url, request).await?)
        }
        .await;
        log_failure("update", &result);
        result
    }

    async fn delete(&self, request: &TransactionDeleteRequest) -> Result<DeleteOutcome> {
        let result: Result<DeleteOutcome> = async {
            let url = self.endpoint(&["transactions", "delete"])?;
            let envelope: ApiResponse<bool> = self.post_json(url, request).await?;
            let message = envelope.message.clone();
            let data = envelope.into_result()?;
            Ok(DeleteOutcome::from_envelope(true, data, message))
        }
        .await;
        log_failure("delete", &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_the_base_path() {
        let client = ApiClient::new("http://127.0.0.1:8080/api").unwrap();
        assert_eq!(
            client.endpoint(&["transactions", "create"]).unwrap().as_str(),
            "http://127.0.0.1:8080/api/transactions/create"
        );

        let client = ApiClient::new("http://127.0.0.1:8080/api/").unwrap();
        assert_eq!(
            client.endpoint(&["transactions"]).unwrap().as_str(),
            "http://127.0.0.1:8080/api/transactions"
        );
    }

    #[test]
    fn transaction_ids_are_path_encoded() {
        let client = ApiClient::new("http://localhost/api").unwrap();
        assert_eq!(
            client.endpoint(&["transactions", "a/b c"]).unwrap().as_str(),
            "http://localhost/api/transactions/a%2Fb%20c"
        );
    }

    #[test]
    fn rejects_relative_base_url() {
        assert!(matches!(
            ApiClient::new("/api"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn update_without_id_never_hits_the_network() {
        // Nothing listens on port 9; a network attempt would be a transport error.
        let client = ApiClient::new("http://127.0.0.1:9/api").unwrap();
        let request = TransactionRequest {
            transaction_id: None,
            amount: 100,
            transaction_type: api_types::transaction::TransactionType::Income,
            account_number: "1234567890".to_string(),
            counterparty_account: None,
            description: None,
        };
        let err = client.update(&request).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingTransactionId));
    }
}
