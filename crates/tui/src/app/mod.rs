use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use api_types::{
    page::PageResponse,
    transaction::{DeleteOutcome, Transaction},
};
use crossterm::event::{self, Event, KeyEvent};
use tokio::sync::mpsc;
use txdesk_client::{FetchMode, KeyPattern, TransactionApi, TransactionQueries};

use crate::{
    config::AppConfig,
    error::{AppError, Result},
    pages::{
        Notice, Ticket,
        form::{Field, FormCommand, FormMode, FormPage, SubmitOutcome},
        list::{ListCommand, ListPage, LoadState},
    },
    ui::{self, keymap::AppAction},
};

const TICK_RATE: Duration = Duration::from_millis(100);
const TOAST_TTL: Duration = Duration::from_secs(3);

/// Entries of the navigation sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavItem {
    Transactions,
    NewTransaction,
}

impl NavItem {
    pub const ALL: [NavItem; 2] = [Self::Transactions, Self::NewTransaction];

    pub fn label(self) -> &'static str {
        match self {
            Self::Transactions => "Transactions",
            Self::NewTransaction => "New Transaction",
        }
    }

    pub fn shortcut(self) -> &'static str {
        match self {
            Self::Transactions => "F1",
            Self::NewTransaction => "F2",
        }
    }
}

/// Results reported back to the UI loop by spawned requests.
#[derive(Debug)]
pub enum Message {
    ListLoaded {
        ticket: Ticket,
        result: txdesk_client::Result<Arc<PageResponse<Transaction>>>,
    },
    Deleted {
        transaction_id: String,
        result: txdesk_client::Result<DeleteOutcome>,
    },
    DetailLoaded {
        ticket: Ticket,
        result: txdesk_client::Result<Arc<Transaction>>,
    },
    Submitted {
        ticket: Ticket,
        result: txdesk_client::Result<Transaction>,
    },
    ListsInvalidated,
}

#[derive(Debug)]
pub struct ToastState {
    pub notice: Notice,
    shown_at: Instant,
}

#[derive(Debug)]
pub struct AppState {
    pub list: ListPage,
    /// Mounted form; the list is shown when `None`.
    pub form: Option<FormPage>,
    pub toast: Option<ToastState>,
    pub base_url: String,
}

impl AppState {
    pub fn active_nav(&self) -> NavItem {
        match self.form {
            Some(_) => NavItem::NewTransaction,
            None => NavItem::Transactions,
        }
    }
}

pub struct App<A> {
    queries: TransactionQueries<A>,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    pub state: AppState,
    should_quit: bool,
}

impl<A> App<A>
where
    A: TransactionApi + 'static,
{
    pub fn new(queries: TransactionQueries<A>, config: &AppConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            queries,
            tx,
            rx,
            state: AppState {
                list: ListPage::new(config.page_size),
                form: None,
                toast: None,
                base_url: config.base_url.clone(),
            },
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.forward_invalidations();
        let mount = self.state.list.mount();
        self.run_list(mount);

        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        while !self.should_quit {
            while let Ok(message) = self.rx.try_recv() {
                self.handle_message(message);
            }
            self.expire_toast();

            terminal
                .draw(|frame| ui::render(frame, &self.state))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(TICK_RATE)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }

        tracing::info!("quitting");
        Ok(())
    }

    /// Turns list invalidations into messages for the loop.
    fn forward_invalidations(&self) {
        let mut subscription = self
            .queries
            .cache()
            .subscribe_matching(KeyPattern::AllTransactionLists);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(key) = subscription.next().await {
                tracing::debug!(%key, "list invalidated");
                if tx.send(Message::ListsInvalidated).is_err() {
                    break;
                }
            }
        });
    }

    fn notify(&mut self, notice: Notice) {
        self.state.toast = Some(ToastState {
            notice,
            shown_at: Instant::now(),
        });
    }

    fn expire_toast(&mut self) {
        if self
            .state
            .toast
            .as_ref()
            .is_some_and(|toast| toast.shown_at.elapsed() >= TOAST_TTL)
        {
            self.state.toast = None;
        }
    }

    fn navigate(&mut self, target: NavItem) {
        match target {
            NavItem::Transactions => self.show_list(),
            NavItem::NewTransaction => self.show_form(FormMode::Create),
        }
    }

    fn show_list(&mut self) {
        self.state.form = None;
        let cmd = self.state.list.mount();
        self.run_list(cmd);
    }

    fn show_form(&mut self, mode: FormMode) {
        let mut form = FormPage::new(mode);
        let cmd = form.mount();
        self.state.form = Some(form);
        if let Some(cmd) = cmd {
            self.run_form(cmd);
        }
    }

    fn run_list(&self, cmd: ListCommand) {
        let queries = self.queries.clone();
        let tx = self.tx.clone();
        match cmd {
            ListCommand::Load {
                ticket,
                query,
                mode,
            } => {
                tokio::spawn(async move {
                    let result = queries.list(&query, mode).await;
                    let _ = tx.send(Message::ListLoaded { ticket, result });
                });
            }
            ListCommand::Delete { transaction_id } => {
                tokio::spawn(async move {
                    let result = queries.delete(&transaction_id).await;
                    let _ = tx.send(Message::Deleted {
                        transaction_id,
                        result,
                    });
                });
            }
        }
    }

    fn run_form(&self, cmd: FormCommand) {
        let queries = self.queries.clone();
        let tx = self.tx.clone();
        match cmd {
            FormCommand::LoadDetail {
                ticket,
                transaction_id,
            } => {
                tokio::spawn(async move {
                    let result = queries.detail(&transaction_id, FetchMode::Cached).await;
                    let _ = tx.send(Message::DetailLoaded { ticket, result });
                });
            }
            FormCommand::Create { ticket, request } => {
                tokio::spawn(async move {
                    let result = queries.create(&request).await;
                    let _ = tx.send(Message::Submitted { ticket, result });
                });
            }
            FormCommand::Update { ticket, request } => {
                tokio::spawn(async move {
                    let result = queries.update(&request).await;
                    let _ = tx.send(Message::Submitted { ticket, result });
                });
            }
        }
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::ListLoaded { ticket, result } => {
                self.state.list.on_loaded(ticket, result);
            }
            Message::Deleted {
                transaction_id,
                result,
            } => {
                let notice = self.state.list.on_deleted(&transaction_id, result);
                self.notify(notice);
            }
            Message::DetailLoaded { ticket, result } => {
                if let Some(form) = self.state.form.as_mut() {
                    form.on_detail_loaded(ticket, result);
                }
            }
            Message::Submitted { ticket, result } => {
                let outcome = self
                    .state
                    .form
                    .as_mut()
                    .and_then(|form| form.on_submitted(ticket, result));
                match outcome {
                    Some(SubmitOutcome::Saved(notice)) => {
                        self.notify(notice);
                        self.show_list();
                    }
                    Some(SubmitOutcome::Failed(notice)) => self.notify(notice),
                    None => {}
                }
            }
            Message::ListsInvalidated => {
                if self.state.form.is_none() {
                    let cmd = self.state.list.on_invalidated();
                    self.run_list(cmd);
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match ui::keymap::map_key(key) {
            AppAction::Quit => self.should_quit = true,
            AppAction::Navigate(target) => self.navigate(target),
            action if self.state.form.is_some() => self.handle_form_key(action),
            action => self.handle_list_key(action),
        }
    }

    fn handle_list_key(&mut self, action: AppAction) {
        let list = &mut self.state.list;
        if list.confirming().is_some() {
            match action {
                AppAction::Submit | AppAction::Input('y') => {
                    if let Some(cmd) = list.confirm_delete() {
                        self.run_list(cmd);
                    }
                }
                AppAction::Cancel | AppAction::Input('n') => list.cancel_delete(),
                _ => {}
            }
            return;
        }

        let cmd = match action {
            AppAction::Input('q') => {
                self.should_quit = true;
                None
            }
            AppAction::Up | AppAction::Input('k') => {
                list.select_prev();
                None
            }
            AppAction::Down | AppAction::Input('j') => {
                list.select_next();
                None
            }
            AppAction::Right | AppAction::Input('n') => list.next_page(),
            AppAction::Left | AppAction::Input('p') => list.prev_page(),
            AppAction::Input('s') => Some(list.cycle_page_size()),
            AppAction::Input('r') => match list.load_state() {
                LoadState::Failed(_) => list.retry(),
                _ => Some(list.refresh()),
            },
            AppAction::Input('d') => {
                list.request_delete();
                None
            }
            AppAction::Submit | AppAction::Input('e') => {
                if let Some(transaction_id) = list.edit_selected() {
                    self.show_form(FormMode::Edit { transaction_id });
                }
                None
            }
            AppAction::Input('a') => {
                self.show_form(FormMode::Create);
                None
            }
            _ => None,
        };
        if let Some(cmd) = cmd {
            self.run_list(cmd);
        }
    }

    fn handle_form_key(&mut self, action: AppAction) {
        let Some(form) = self.state.form.as_mut() else {
            return;
        };
        match action {
            AppAction::Cancel => {
                if !form.is_submitting() {
                    self.show_list();
                }
            }
            AppAction::NextField | AppAction::Down => form.focus_next(),
            AppAction::PrevField | AppAction::Up => form.focus_prev(),
            AppAction::Left | AppAction::Right if form.focus() == Field::TransactionType => {
                form.toggle_type();
            }
            AppAction::Backspace => form.backspace(),
            AppAction::Input(ch) => form.input(ch),
            AppAction::Submit => {
                if let Some(cmd) = form.submit() {
                    self.run_form(cmd);
                }
            }
            _ => {}
        }
    }
}
