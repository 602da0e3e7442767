//! Reads and writes coordinated with the query cache.
//!
//! Reads go through [`QueryCache::fetch`]. Writes call the backend first and
//! invalidate only after it acknowledged the change:
//!
//! | write  | invalidated keys |
//! |--------|------------------|
//! | create | `transactions-list(*)`, `dashboard-statistics` |
//! | update | `transactions-list(*)`, `transaction-detail(id)`, `dashboard-statistics` |
//! | delete | `transactions-list(*)`, `transaction-detail(id)`, `dashboard-statistics` |
//!
//! A failed write invalidates nothing. A delete the backend acknowledged
//! invalidates even when its verdict is negative, since the row may be gone.

use std::sync::Arc;

use api_types::{
    page::{PageRequest, PageResponse},
    transaction::{DeleteOutcome, Transaction, TransactionDeleteRequest, TransactionRequest},
};

use crate::{
    api::TransactionApi,
    cache::{FetchMode, KeyPattern, QueryCache, QueryKey},
    error::{ClientError, Result},
};

/// Values held by the shared cache.
#[derive(Clone, Debug)]
pub enum QueryData {
    Page(Arc<PageResponse<Transaction>>),
    Transaction(Arc<Transaction>),
}

pub type TransactionCache = QueryCache<QueryData>;

pub struct TransactionQueries<A> {
    api: Arc<A>,
    cache: Arc<TransactionCache>,
}

impl<A> Clone for TransactionQueries<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<A: TransactionApi> TransactionQueries<A> {
    pub fn new(api: A, cache: Arc<TransactionCache>) -> Self {
        Self {
            api: Arc::new(api),
            cache,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &Arc<TransactionCache> {
        &self.cache
    }

    pub async fn list(
        &self,
        query: &PageRequest,
        mode: FetchMode,
    ) -> Result<Arc<PageResponse<Transaction>>> {
        let key = QueryKey::TransactionsList(query.clone());
        let data = self
            .cache
            .fetch(key, mode, move || async move {
                let page = self.api.list(query).await?;
                Ok(QueryData::Page(Arc::new(page)))
            })
            .await?;
        match data {
            QueryData::Page(page) => Ok(page),
            QueryData::Transaction(_) => Err(ClientError::MissingData),
        }
    }

    pub async fn detail(&self, transaction_id: &str, mode: FetchMode) -> Result<Arc<Transaction>> {
        let key = QueryKey::TransactionDetail(transaction_id.to_string());
        let data = self
            .cache
            .fetch(key, mode, move || async move {
                let transaction = self.api.get(transaction_id).await?;
                Ok(QueryData::Transaction(Arc::new(transaction)))
            })
            .await?;
        match data {
            QueryData::Transaction(transaction) => Ok(transaction),
            QueryData::Page(_) => Err(ClientError::MissingData),
        }
    }

    /// Creates a record. Never retried: a blind replay may duplicate it.
    pub async fn create(&self, request: &TransactionRequest) -> Result<Transaction> {
        let created = self.api.create(request).await?;
        tracing::info!(transaction_id = %created.transaction_id, "transaction created");
        self.cache.invalidate(&KeyPattern::AllTransactionLists);
        self.cache
            .invalidate(&KeyPattern::Exact(QueryKey::DashboardStatistics));
        Ok(created)
    }

    pub async fn update(&self, request: &TransactionRequest) -> Result<Transaction> {
        let transaction_id = request
            .transaction_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or(ClientError::MissingTransactionId)?;

        let updated = self.api.update(request).await?;
        tracing::info!(%transaction_id, "transaction updated");
        self.cache.invalidate(&KeyPattern::AllTransactionLists);
        self.cache
            .invalidate(&KeyPattern::Exact(QueryKey::TransactionDetail(transaction_id)));
        self.cache
            .invalidate(&KeyPattern::Exact(QueryKey::DashboardStatistics));
        Ok(updated)
    }

    /// Deletes a record. Cached rows stay until the server acknowledged.
    pub async fn delete(&self, transaction_id: &str) -> Result<DeleteOutcome> {
        let request = TransactionDeleteRequest {
            transaction_id: transaction_id.to_string(),
        };
        let outcome = self.api.delete(&request).await?;
        if outcome.success {
            tracing::info!(%transaction_id, "transaction deleted");
        } else {
            tracing::warn!(%transaction_id, message = %outcome.message, "delete not confirmed");
        }
        if !outcome.acknowledged {
            return Ok(outcome);
        }

        self.cache.invalidate(&KeyPattern::AllTransactionLists);
        self.cache.invalidate(&KeyPattern::Exact(QueryKey::TransactionDetail(
            transaction_id.to_string(),
        )));
        self.cache
            .invalidate(&KeyPattern::Exact(QueryKey::DashboardStatistics));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use api_types::{
        parse_stored,
        transaction::{TransactionType, is_account_number},
    };
    use tokio::time::Instant;

    use super::*;

    #[derive(Default)]
    struct FakeState {
        records: Vec<Transaction>,
        calls: Vec<String>,
        sent: Vec<TransactionRequest>,
        reject_writes: Option<String>,
        refuse_deletes: bool,
        next_id: i64,
    }

    #[derive(Default)]
    struct FakeApi {
        state: Mutex<FakeState>,
    }

    impl FakeApi {
        fn with_records(ids: &[&str]) -> Self {
            let api = Self::default();
            {
                let mut state = api.state.lock().unwrap();
                for id in ids {
                    state.next_id += 1;
                    let row = record(state.next_id, id);
                    state.records.push(row);
                }
            }
            api
        }

        fn calls(&self, prefix: &str) -> usize {
            let state = self.state.lock().unwrap();
            state.calls.iter().filter(|c| c.starts_with(prefix)).count()
        }

        fn rejection(&self, op: &str) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(op.to_string());
            match &state.reject_writes {
                Some(message) if op != "list" && !op.starts_with("get") => {
                    Err(ClientError::Api {
                        code: Some(-1),
                        message: message.clone(),
                    })
                }
                _ => Ok(()),
            }
        }
    }

    fn record(id: i64, transaction_id: &str) -> Transaction {
        Transaction {
            id,
            transaction_id: transaction_id.to_string(),
            amount: 1000,
            transaction_type: TransactionType::Expense,
            account_number: "1234567890".to_string(),
            counterparty_account: Some("0987654321".to_string()),
            description: None,
            created_at: None,
            updated_at: None,
        }
    }

    impl TransactionApi for FakeApi {
        async fn list(&self, page: &PageRequest) -> Result<PageResponse<Transaction>> {
            self.rejection("list")?;
            tokio::time::sleep(Duration::from_millis(10)).await;
            let state = self.state.lock().unwrap();
            let start = (page.page * page.size) as usize;
            let content = state
                .records
                .iter()
                .skip(start)
                .take(page.size as usize)
                .cloned()
                .collect();
            Ok(PageResponse::of(
                content,
                state.records.len() as u64,
                page.page,
                page.size,
            ))
        }

        async fn get(&self, transaction_id: &str) -> Result<Transaction> {
            self.rejection(&format!("get:{transaction_id}"))?;
            let state = self.state.lock().unwrap();
            state
                .records
                .iter()
                .find(|r| r.transaction_id == transaction_id)
                .cloned()
                .ok_or(ClientError::Api {
                    code: Some(-101),
                    message: "not found".to_string(),
                })
        }

        async fn create(&self, request: &TransactionRequest) -> Result<Transaction> {
            self.rejection("create")?;
            let mut state = self.state.lock().unwrap();
            state.sent.push(request.clone());
            state.next_id += 1;
            let mut created = record(state.next_id, &format!("TX{}", state.next_id));
            created.amount = request.amount;
            created.transaction_type = request.transaction_type;
            state.records.push(created.clone());
            Ok(created)
        }

        async fn update(&self, request: &TransactionRequest) -> Result<Transaction> {
            self.rejection("update")?;
            let mut state = self.state.lock().unwrap();
            state.sent.push(request.clone());
            let id = request.transaction_id.clone().unwrap_or_default();
            let record = state
                .records
                .iter_mut()
                .find(|r| r.transaction_id == id)
                .ok_or(ClientError::Api {
                    code: Some(-101),
                    message: "not found".to_string(),
                })?;
            record.description = request.description.clone();
            Ok(record.clone())
        }

        async fn delete(&self, request: &TransactionDeleteRequest) -> Result<DeleteOutcome> {
            self.rejection("delete")?;
            let mut state = self.state.lock().unwrap();
            let message = "Transaction deleted successfully".to_string();
            if state.refuse_deletes {
                return Ok(DeleteOutcome::from_envelope(true, Some(false), message));
            }
            state
                .records
                .retain(|r| r.transaction_id != request.transaction_id);
            Ok(DeleteOutcome::from_envelope(true, None, message))
        }
    }

    fn queries(api: FakeApi) -> TransactionQueries<FakeApi> {
        TransactionQueries::new(api, Arc::new(TransactionCache::default()))
    }

    fn first_page() -> PageRequest {
        PageRequest::new(0, 10)
    }

    fn create_request(amount: &str) -> TransactionRequest {
        TransactionRequest {
            transaction_id: None,
            amount: parse_stored(amount).unwrap(),
            transaction_type: TransactionType::Expense,
            account_number: "1234567890".to_string(),
            counterparty_account: Some("0987654321".to_string()),
            description: None,
        }
    }

    fn update_request(transaction_id: &str, description: &str) -> TransactionRequest {
        TransactionRequest {
            transaction_id: Some(transaction_id.to_string()),
            description: Some(description.to_string()),
            ..create_request("10.00")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn list_returns_the_requested_page() {
        let q = queries(FakeApi::with_records(&["T1", "T2"]));

        let page = q.list(&first_page(), FetchMode::Cached).await.unwrap();

        assert_eq!(page.content.len(), 2);
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.number, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn identical_concurrent_list_reads_make_one_call() {
        let q = queries(FakeApi::with_records(&["T1"]));

        let (page_a, page_b) = (first_page(), first_page());
        let (a, b) = tokio::join!(
            q.list(&page_a, FetchMode::Cached),
            q.list(&page_b, FetchMode::Cached),
        );

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(q.api().calls("list"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn create_invalidates_lists_and_statistics() {
        let q = queries(FakeApi::with_records(&["T1"]));
        q.list(&first_page(), FetchMode::Cached).await.unwrap();
        q.list(&first_page(), FetchMode::Cached).await.unwrap();
        assert_eq!(q.api().calls("list"), 1);
        q.cache().set(
            QueryKey::DashboardStatistics,
            QueryData::Page(Arc::new(PageResponse::of(Vec::new(), 0, 0, 10))),
            Instant::now(),
        );

        let request = create_request("10.00");
        assert!(is_account_number(&request.account_number));
        let created = q.create(&request).await.unwrap();

        assert_eq!(created.amount, 1000);
        assert_eq!(q.api().state.lock().unwrap().sent[0].amount, 1000);
        assert!(q.cache().get(&QueryKey::DashboardStatistics).is_none());

        let page = q.list(&first_page(), FetchMode::Cached).await.unwrap();
        assert_eq!(q.api().calls("list"), 2);
        assert_eq!(page.total_elements, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn update_invalidates_lists_and_the_edited_detail() {
        let q = queries(FakeApi::with_records(&["T1", "T2"]));
        q.list(&first_page(), FetchMode::Cached).await.unwrap();
        q.list(&PageRequest::new(1, 1), FetchMode::Cached).await.unwrap();
        q.detail("T1", FetchMode::Cached).await.unwrap();
        q.detail("T2", FetchMode::Cached).await.unwrap();

        let updated = q.update(&update_request("T1", "rent")).await.unwrap();
        assert_eq!(updated.description.as_deref(), Some("rent"));

        let cache = q.cache();
        assert!(
            cache
                .get(&QueryKey::TransactionsList(first_page()))
                .is_none()
        );
        assert!(
            cache
                .get(&QueryKey::TransactionsList(PageRequest::new(1, 1)))
                .is_none()
        );
        assert!(
            cache
                .get(&QueryKey::TransactionDetail("T1".to_string()))
                .is_none()
        );
        assert!(
            cache
                .get(&QueryKey::TransactionDetail("T2".to_string()))
                .is_some()
        );

        let detail = q.detail("T1", FetchMode::Cached).await.unwrap();
        assert_eq!(detail.description.as_deref(), Some("rent"));
        assert_eq!(q.api().calls("get:T1"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn update_without_id_is_rejected_locally() {
        let q = queries(FakeApi::with_records(&["T1"]));
        let err = q.update(&create_request("1.00")).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingTransactionId));
        assert_eq!(q.api().calls("update"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_delete_invalidates_lists_and_detail() {
        let q = queries(FakeApi::with_records(&["T1", "T2"]));
        q.list(&first_page(), FetchMode::Cached).await.unwrap();
        q.detail("T1", FetchMode::Cached).await.unwrap();

        let outcome = q.delete("T1").await.unwrap();

        assert!(outcome.success);
        assert!(
            q.cache()
                .get(&QueryKey::TransactionsList(first_page()))
                .is_none()
        );
        assert!(
            q.cache()
                .get(&QueryKey::TransactionDetail("T1".to_string()))
                .is_none()
        );
        let page = q.list(&first_page(), FetchMode::Cached).await.unwrap();
        assert_eq!(page.content.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn acknowledged_delete_with_false_data_fails_but_invalidates() {
        let api = FakeApi::with_records(&["T1"]);
        api.state.lock().unwrap().refuse_deletes = true;
        let q = queries(api);
        q.list(&first_page(), FetchMode::Cached).await.unwrap();

        let outcome = q.delete("T1").await.unwrap();

        assert!(!outcome.success);
        assert!(
            q.cache()
                .get(&QueryKey::TransactionsList(first_page()))
                .is_none()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn create_reloads_the_mounted_list_once() {
        let q = queries(FakeApi::with_records(&["T1"]));
        let mut lists = q
            .cache()
            .subscribe_matching(KeyPattern::AllTransactionLists);
        for page in 0..4 {
            q.list(&PageRequest::new(page, 10), FetchMode::Cached)
                .await
                .unwrap();
        }

        q.create(&create_request("1.00")).await.unwrap();

        assert!(lists.next().await.is_some());
        let again = tokio::time::timeout(Duration::from_secs(1), lists.next()).await;
        assert!(again.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_writes_invalidate_nothing() {
        let api = FakeApi::with_records(&["T1"]);
        api.state.lock().unwrap().reject_writes = Some("rejected".to_string());
        let q = queries(api);
        q.list(&first_page(), FetchMode::Cached).await.unwrap();
        q.detail("T1", FetchMode::Cached).await.unwrap();

        let err = q.create(&create_request("5.00")).await.unwrap_err();
        assert_eq!(err.to_string(), "rejected");
        q.update(&update_request("T1", "x")).await.unwrap_err();
        q.delete("T1").await.unwrap_err();

        assert!(
            q.cache()
                .get(&QueryKey::TransactionsList(first_page()))
                .is_some()
        );
        assert!(
            q.cache()
                .get(&QueryKey::TransactionDetail("T1".to_string()))
                .is_some()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_detail_surfaces_the_server_message() {
        let q = queries(FakeApi::default());

        let err = q.detail("nope", FetchMode::Cached).await.unwrap_err();

        assert_eq!(err.to_string(), "not found");
        assert!(
            q.cache()
                .peek(&QueryKey::TransactionDetail("nope".to_string()))
                .is_none()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn forced_list_reads_bypass_fresh_entries() {
        let q = queries(FakeApi::with_records(&["T1"]));
        q.list(&first_page(), FetchMode::Cached).await.unwrap();
        q.list(&first_page(), FetchMode::Force).await.unwrap();
        assert_eq!(q.api().calls("list"), 2);
    }
}
