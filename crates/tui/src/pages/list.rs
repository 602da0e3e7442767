use std::sync::Arc;

use api_types::{
    page::{PageRequest, PageResponse},
    to_display,
    transaction::{DeleteOutcome, Transaction, TransactionType},
};
use txdesk_client::{ClientError, FetchMode};

use super::{Notice, Ticket};

/// Page sizes offered by the size toggle.
pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    Load {
        ticket: Ticket,
        query: PageRequest,
        mode: FetchMode,
    },
    Delete {
        transaction_id: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
    Failed(String),
}

/// One table row, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub id: String,
    pub transaction_id: String,
    pub account: String,
    pub amount: String,
    pub transaction_type: TransactionType,
    pub description: String,
    pub created_at: String,
}

impl ListRow {
    fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id.to_string(),
            transaction_id: transaction.transaction_id.clone(),
            account: transaction.account_number.clone(),
            amount: to_display(transaction.amount),
            transaction_type: transaction.transaction_type,
            description: transaction.description.clone().unwrap_or_default(),
            created_at: transaction
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug)]
pub struct ListPage {
    query: PageRequest,
    ticket: Ticket,
    load: LoadState,
    page: Option<Arc<PageResponse<Transaction>>>,
    selected: usize,
    confirming: Option<String>,
    deleting: Option<String>,
}

impl ListPage {
    pub fn new(page_size: u32) -> Self {
        Self {
            query: PageRequest::new(0, page_size),
            ticket: 0,
            load: LoadState::Loading,
            page: None,
            selected: 0,
            confirming: None,
            deleting: None,
        }
    }

    pub fn query(&self) -> &PageRequest {
        &self.query
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn page(&self) -> Option<&PageResponse<Transaction>> {
        self.page.as_deref()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Transaction id awaiting delete confirmation.
    pub fn confirming(&self) -> Option<&str> {
        self.confirming.as_deref()
    }

    /// Transaction id whose delete is in flight.
    pub fn deleting(&self) -> Option<&str> {
        self.deleting.as_deref()
    }

    fn reload(&mut self, mode: FetchMode) -> ListCommand {
        self.ticket += 1;
        self.load = LoadState::Loading;
        ListCommand::Load {
            ticket: self.ticket,
            query: self.query.clone(),
            mode,
        }
    }

    pub fn mount(&mut self) -> ListCommand {
        self.reload(FetchMode::Cached)
    }

    /// Manual refresh, bypassing the freshness window.
    pub fn refresh(&mut self) -> ListCommand {
        self.reload(FetchMode::Force)
    }

    /// Re-issues the failed read. Does nothing unless the last read failed.
    pub fn retry(&mut self) -> Option<ListCommand> {
        matches!(self.load, LoadState::Failed(_)).then(|| self.reload(FetchMode::Cached))
    }

    /// Reload after the list keys were invalidated.
    pub fn on_invalidated(&mut self) -> ListCommand {
        self.reload(FetchMode::Cached)
    }

    pub fn next_page(&mut self) -> Option<ListCommand> {
        let total_pages = self.page.as_ref()?.total_pages;
        if self.query.page + 1 >= total_pages {
            return None;
        }
        self.query.page += 1;
        self.selected = 0;
        Some(self.reload(FetchMode::Cached))
    }

    pub fn prev_page(&mut self) -> Option<ListCommand> {
        if self.query.page == 0 {
            return None;
        }
        self.query.page -= 1;
        self.selected = 0;
        Some(self.reload(FetchMode::Cached))
    }

    /// Switches to the next page size and back to the first page.
    pub fn cycle_page_size(&mut self) -> ListCommand {
        let next = PAGE_SIZES
            .iter()
            .position(|size| *size == self.query.size)
            .map(|idx| PAGE_SIZES[(idx + 1) % PAGE_SIZES.len()])
            .unwrap_or(PAGE_SIZES[0]);
        self.query.size = next;
        self.query.page = 0;
        self.selected = 0;
        self.reload(FetchMode::Cached)
    }

    /// Applies a list read. Returns `false` when the result was dropped.
    pub fn on_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Arc<PageResponse<Transaction>>, ClientError>,
    ) -> bool {
        if ticket != self.ticket {
            tracing::debug!(ticket, current = self.ticket, "dropping superseded list result");
            return false;
        }
        match result {
            Ok(page) => {
                self.selected = self.selected.min(page.content.len().saturating_sub(1));
                self.page = Some(page);
                self.load = LoadState::Ready;
            }
            Err(err) => {
                self.load = LoadState::Failed(err.to_string());
            }
        }
        true
    }

    pub fn rows(&self) -> Vec<ListRow> {
        self.page
            .as_ref()
            .map(|page| page.content.iter().map(ListRow::from_transaction).collect())
            .unwrap_or_default()
    }

    /// Range summary, e.g. `11-20 of 23 items`.
    pub fn summary(&self) -> String {
        let Some(page) = &self.page else {
            return "0 items".to_string();
        };
        if page.content.is_empty() {
            return format!("0 of {} items", page.total_elements);
        }
        let first = u64::from(page.number) * u64::from(page.size) + 1;
        let last = first + page.content.len() as u64 - 1;
        format!("{first}-{last} of {} items", page.total_elements)
    }

    pub fn select_next(&mut self) {
        let len = self.page.as_ref().map_or(0, |page| page.content.len());
        if len == 0 {
            return;
        }
        self.selected = (self.selected + 1).min(len - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_transaction(&self) -> Option<&Transaction> {
        self.page.as_ref()?.content.get(self.selected)
    }

    /// Transaction id to open in the form.
    pub fn edit_selected(&self) -> Option<String> {
        self.selected_transaction()
            .map(|transaction| transaction.transaction_id.clone())
    }

    /// Asks for confirmation before deleting the selected row.
    pub fn request_delete(&mut self) {
        if self.deleting.is_some() {
            return;
        }
        self.confirming = self.edit_selected();
    }

    pub fn cancel_delete(&mut self) {
        self.confirming = None;
    }

    pub fn confirm_delete(&mut self) -> Option<ListCommand> {
        let transaction_id = self.confirming.take()?;
        if self.deleting.is_some() {
            return None;
        }
        self.deleting = Some(transaction_id.clone());
        Some(ListCommand::Delete { transaction_id })
    }

    /// Applies a delete result. Rows are only refreshed by the invalidation
    /// that follows a confirmed delete.
    pub fn on_deleted(
        &mut self,
        transaction_id: &str,
        result: Result<DeleteOutcome, ClientError>,
    ) -> Notice {
        if self.deleting.as_deref() == Some(transaction_id) {
            self.deleting = None;
        }
        match result {
            Ok(outcome) if outcome.success => Notice::success("Transaction deleted successfully"),
            Ok(outcome) if outcome.message.is_empty() => {
                Notice::error("Failed to delete transaction")
            }
            Ok(outcome) => Notice::error(format!(
                "Failed to delete transaction: {}",
                outcome.message
            )),
            Err(err) => Notice::error(format!("Failed to delete transaction: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use api_types::transaction::TransactionType;
    use chrono::NaiveDate;

    use super::*;
    use crate::pages::NoticeLevel;

    fn transaction(id: i64, transaction_id: &str, amount: i64) -> Transaction {
        Transaction {
            id,
            transaction_id: transaction_id.to_string(),
            amount,
            transaction_type: TransactionType::Income,
            account_number: "1234567890".to_string(),
            counterparty_account: None,
            description: Some("salary".to_string()),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(9, 30, 0)),
            updated_at: None,
        }
    }

    fn loaded(page: &mut ListPage, content: Vec<Transaction>, total: u64) {
        let cmd = page.mount();
        let ListCommand::Load { ticket, query, .. } = cmd else {
            panic!("expected a load");
        };
        let response = PageResponse::of(content, total, query.page, query.size);
        assert!(page.on_loaded(ticket, Ok(Arc::new(response))));
    }

    fn ticket_of(cmd: ListCommand) -> Ticket {
        match cmd {
            ListCommand::Load { ticket, .. } => ticket,
            ListCommand::Delete { .. } => panic!("expected a load"),
        }
    }

    #[test]
    fn first_page_renders_every_row() {
        let mut page = ListPage::new(10);
        assert_eq!(
            page.mount(),
            ListCommand::Load {
                ticket: 1,
                query: PageRequest::new(0, 10),
                mode: FetchMode::Cached,
            }
        );

        let response = PageResponse::of(
            vec![transaction(1, "T1", 1050), transaction(2, "T2", 29)],
            2,
            0,
            10,
        );
        assert!(page.on_loaded(1, Ok(Arc::new(response))));

        let rows = page.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, "10.50");
        assert_eq!(rows[1].amount, "0.29");
        assert_eq!(rows[0].created_at, "2024-03-01 09:30:00");
        assert_eq!(page.page().unwrap().total_elements, 2);
        assert_eq!(page.summary(), "1-2 of 2 items");
    }

    #[test]
    fn superseded_results_are_dropped() {
        let mut page = ListPage::new(10);
        let first = ticket_of(page.mount());
        let second = ticket_of(page.refresh());

        let late = PageResponse::of(vec![transaction(1, "OLD", 1)], 1, 0, 10);
        assert!(!page.on_loaded(first, Ok(Arc::new(late))));
        assert_eq!(page.load_state(), &LoadState::Loading);

        let fresh = PageResponse::of(vec![transaction(2, "NEW", 1)], 1, 0, 10);
        assert!(page.on_loaded(second, Ok(Arc::new(fresh))));
        assert_eq!(page.rows()[0].transaction_id, "NEW");
    }

    #[test]
    fn failed_read_offers_retry_of_the_same_query() {
        let mut page = ListPage::new(20);
        assert!(page.retry().is_none());

        let ticket = ticket_of(page.mount());
        page.on_loaded(
            ticket,
            Err(ClientError::Api {
                code: Some(-1),
                message: "System error".to_string(),
            }),
        );
        assert_eq!(page.load_state(), &LoadState::Failed("System error".to_string()));

        match page.retry() {
            Some(ListCommand::Load { query, .. }) => assert_eq!(query, PageRequest::new(0, 20)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn paging_is_bounded_by_total_pages() {
        let mut page = ListPage::new(10);
        assert!(page.next_page().is_none());
        loaded(&mut page, (1..=10).map(|i| transaction(i, "T", 1)).collect(), 23);
        assert!(page.prev_page().is_none());

        let ListCommand::Load { query, ticket, .. } = page.next_page().unwrap() else {
            panic!("expected a load");
        };
        assert_eq!(query.page, 1);
        page.on_loaded(
            ticket,
            Ok(Arc::new(PageResponse::of(vec![transaction(11, "T", 1)], 23, 1, 10))),
        );
        assert_eq!(page.summary(), "11-11 of 23 items");

        assert!(page.next_page().is_some());
        assert_eq!(page.query().page, 2);
    }

    #[test]
    fn page_size_cycles_and_resets_the_page() {
        let mut page = ListPage::new(10);
        loaded(&mut page, vec![transaction(1, "T1", 1)], 30);
        page.next_page();

        let sizes = (0..4)
            .map(|_| match page.cycle_page_size() {
                ListCommand::Load { query, .. } => {
                    assert_eq!(query.page, 0);
                    query.size
                }
                ListCommand::Delete { .. } => unreachable!(),
            })
            .collect::<Vec<_>>();
        assert_eq!(sizes, [20, 50, 100, 10]);
    }

    #[test]
    fn delete_needs_confirmation_and_blocks_while_pending() {
        let mut page = ListPage::new(10);
        loaded(&mut page, vec![transaction(1, "T1", 1), transaction(2, "T2", 1)], 2);

        assert!(page.confirm_delete().is_none());
        page.request_delete();
        assert_eq!(page.confirming(), Some("T1"));
        page.cancel_delete();
        assert!(page.confirm_delete().is_none());

        page.request_delete();
        assert_eq!(
            page.confirm_delete(),
            Some(ListCommand::Delete {
                transaction_id: "T1".to_string()
            })
        );
        assert_eq!(page.deleting(), Some("T1"));

        page.select_next();
        page.request_delete();
        assert!(page.confirming().is_none());

        let notice = page.on_deleted(
            "T1",
            Ok(DeleteOutcome::from_envelope(
                true,
                None,
                "Transaction deleted successfully".to_string(),
            )),
        );
        assert_eq!(notice.level, NoticeLevel::Success);
        assert!(page.deleting().is_none());
        // Still listed until the invalidation reload lands.
        assert_eq!(page.rows().len(), 2);
    }

    #[test]
    fn unconfirmed_delete_is_reported_as_failure() {
        let mut page = ListPage::new(10);
        loaded(&mut page, vec![transaction(1, "T1", 1)], 1);
        page.request_delete();
        page.confirm_delete();

        let notice = page.on_deleted(
            "T1",
            Ok(DeleteOutcome::from_envelope(
                true,
                Some(false),
                "Transaction deleted successfully".to_string(),
            )),
        );
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.starts_with("Failed to delete transaction"));
    }

    #[test]
    fn selection_stays_within_the_page() {
        let mut page = ListPage::new(10);
        page.select_next();
        assert_eq!(page.selected(), 0);

        loaded(&mut page, vec![transaction(1, "T1", 1), transaction(2, "T2", 1)], 2);
        page.select_next();
        page.select_next();
        assert_eq!(page.edit_selected().as_deref(), Some("T2"));

        let ticket = ticket_of(page.on_invalidated());
        page.on_loaded(
            ticket,
            Ok(Arc::new(PageResponse::of(vec![transaction(1, "T1", 1)], 1, 0, 10))),
        );
        assert_eq!(page.selected(), 0);
    }
}
