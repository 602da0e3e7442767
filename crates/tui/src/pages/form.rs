use std::{collections::BTreeMap, sync::Arc};

use api_types::{
    amount::{STORED_MAX, STORED_MIN, fraction_digits},
    parse_stored, to_display,
    transaction::{
        DESCRIPTION_MAX_CHARS, Transaction, TransactionRequest, TransactionType,
        is_account_number,
    },
};
use txdesk_client::ClientError;

use super::{Notice, Ticket};

const ACCOUNT_MAX_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    AccountNumber,
    CounterpartyAccount,
    Amount,
    TransactionType,
    Description,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Self::AccountNumber,
        Self::CounterpartyAccount,
        Self::Amount,
        Self::TransactionType,
        Self::Description,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::AccountNumber => "Account Number",
            Self::CounterpartyAccount => "Counterparty Account",
            Self::Amount => "Amount",
            Self::TransactionType => "Transaction Type",
            Self::Description => "Description",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { transaction_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Ready,
    Loading,
    Failed(String),
}

/// Raw field values as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub account_number: String,
    pub counterparty_account: String,
    pub amount: String,
    pub transaction_type: TransactionType,
    pub description: String,
}

impl Default for FormFields {
    fn default() -> Self {
        Self {
            account_number: String::new(),
            counterparty_account: String::new(),
            amount: String::new(),
            transaction_type: TransactionType::Expense,
            description: String::new(),
        }
    }
}

impl FormFields {
    fn from_transaction(transaction: &Transaction) -> Self {
        Self {
            account_number: transaction.account_number.clone(),
            counterparty_account: transaction.counterparty_account.clone().unwrap_or_default(),
            amount: to_display(transaction.amount),
            transaction_type: transaction.transaction_type,
            description: transaction.description.clone().unwrap_or_default(),
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::AccountNumber => Some(&mut self.account_number),
            Field::CounterpartyAccount => Some(&mut self.counterparty_account),
            Field::Amount => Some(&mut self.amount),
            Field::Description => Some(&mut self.description),
            Field::TransactionType => None,
        }
    }
}

pub type FieldErrors = BTreeMap<Field, String>;

/// Checks every field and builds the request payload.
///
/// All problems are reported at once so the user sees each offending field.
pub fn validate(
    fields: &FormFields,
    transaction_id: Option<&str>,
) -> Result<TransactionRequest, FieldErrors> {
    let mut errors = FieldErrors::new();

    let account = fields.account_number.trim();
    if account.is_empty() {
        errors.insert(Field::AccountNumber, "Please enter account number".to_string());
    } else if !is_account_number(account) {
        errors.insert(Field::AccountNumber, "Must be 10-20 digits".to_string());
    }

    let counterparty = fields.counterparty_account.trim();
    if counterparty.is_empty() {
        errors.insert(
            Field::CounterpartyAccount,
            "Please enter counterparty account".to_string(),
        );
    } else if !is_account_number(counterparty) {
        errors.insert(Field::CounterpartyAccount, "Must be 10-20 digits".to_string());
    }

    let amount = match parse_stored(&fields.amount) {
        Ok(_) if fraction_digits(&fields.amount) > 2 => {
            errors.insert(Field::Amount, "At most 2 decimals".to_string());
            None
        }
        Ok(stored) if stored < STORED_MIN => {
            errors.insert(Field::Amount, "Amount must be greater than 0".to_string());
            None
        }
        Ok(stored) if stored > STORED_MAX => {
            errors.insert(Field::Amount, "Amount cannot exceed 999,999.99".to_string());
            None
        }
        Ok(stored) => Some(stored),
        Err(api_types::AmountError::Empty) => {
            errors.insert(Field::Amount, "Please enter amount".to_string());
            None
        }
        Err(api_types::AmountError::Invalid(_)) => {
            errors.insert(Field::Amount, "Amount must be a number".to_string());
            None
        }
    };

    if !TransactionType::selectable().contains(&fields.transaction_type) {
        errors.insert(
            Field::TransactionType,
            "Please select transaction type".to_string(),
        );
    }

    let description = fields.description.trim();
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.insert(
            Field::Description,
            format!("Description cannot exceed {DESCRIPTION_MAX_CHARS} characters"),
        );
    }

    match amount {
        Some(amount) if errors.is_empty() => Ok(TransactionRequest {
            transaction_id: transaction_id.map(str::to_string),
            amount,
            transaction_type: fields.transaction_type,
            account_number: account.to_string(),
            counterparty_account: Some(counterparty.to_string()),
            description: (!description.is_empty()).then(|| description.to_string()),
        }),
        _ => Err(errors),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormCommand {
    LoadDetail {
        ticket: Ticket,
        transaction_id: String,
    },
    Create {
        ticket: Ticket,
        request: TransactionRequest,
    },
    Update {
        ticket: Ticket,
        request: TransactionRequest,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved; the app navigates back to the list.
    Saved(Notice),
    /// Rejected; fields stay as typed.
    Failed(Notice),
}

#[derive(Debug)]
pub struct FormPage {
    mode: FormMode,
    ticket: Ticket,
    detail: DetailState,
    fields: FormFields,
    focus: Field,
    errors: FieldErrors,
    submitting: bool,
}

impl FormPage {
    pub fn new(mode: FormMode) -> Self {
        let detail = match mode {
            FormMode::Create => DetailState::Ready,
            FormMode::Edit { .. } => DetailState::Loading,
        };
        Self {
            mode,
            ticket: 0,
            detail,
            fields: FormFields::default(),
            focus: Field::AccountNumber,
            errors: FieldErrors::new(),
            submitting: false,
        }
    }

    /// Starts the detail read in edit mode.
    pub fn mount(&mut self) -> Option<FormCommand> {
        let FormMode::Edit { transaction_id } = &self.mode else {
            return None;
        };
        self.ticket += 1;
        self.detail = DetailState::Loading;
        Some(FormCommand::LoadDetail {
            ticket: self.ticket,
            transaction_id: transaction_id.clone(),
        })
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "New Transaction",
            FormMode::Edit { .. } => "Edit Transaction",
        }
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn editable(&self) -> bool {
        self.detail == DetailState::Ready && !self.submitting
    }

    pub fn on_detail_loaded(
        &mut self,
        ticket: Ticket,
        result: Result<Arc<Transaction>, ClientError>,
    ) -> bool {
        if ticket != self.ticket || self.detail != DetailState::Loading {
            tracing::debug!(ticket, current = self.ticket, "dropping superseded detail result");
            return false;
        }
        match result {
            Ok(transaction) => {
                self.fields = FormFields::from_transaction(&transaction);
                self.detail = DetailState::Ready;
            }
            Err(err) => self.detail = DetailState::Failed(err.to_string()),
        }
        true
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn input(&mut self, ch: char) {
        if !self.editable() {
            return;
        }
        if self.focus == Field::TransactionType {
            if ch == ' ' {
                self.toggle_type();
            }
            return;
        }
        let focus = self.focus;
        let Some(value) = self.fields.text_mut(focus) else {
            return;
        };
        let limit = match focus {
            Field::AccountNumber | Field::CounterpartyAccount => ACCOUNT_MAX_LEN,
            _ => DESCRIPTION_MAX_CHARS,
        };
        if value.chars().count() < limit {
            value.push(ch);
            self.errors.remove(&focus);
        }
    }

    pub fn backspace(&mut self) {
        if !self.editable() {
            return;
        }
        let focus = self.focus;
        if let Some(value) = self.fields.text_mut(focus) {
            value.pop();
            self.errors.remove(&focus);
        }
    }

    pub fn toggle_type(&mut self) {
        if !self.editable() {
            return;
        }
        self.fields.transaction_type = match self.fields.transaction_type {
            TransactionType::Expense => TransactionType::Income,
            TransactionType::Income | TransactionType::Unknown => TransactionType::Expense,
        };
        self.errors.remove(&Field::TransactionType);
    }

    /// Validates and dispatches. Invalid input never leaves the page.
    pub fn submit(&mut self) -> Option<FormCommand> {
        if !self.editable() {
            return None;
        }
        let transaction_id = match &self.mode {
            FormMode::Create => None,
            FormMode::Edit { transaction_id } => Some(transaction_id.as_str()),
        };
        let request = match validate(&self.fields, transaction_id) {
            Ok(request) => request,
            Err(errors) => {
                tracing::debug!(fields = errors.len(), "form rejected by validation");
                if let Some(first) = errors.keys().next() {
                    self.focus = *first;
                }
                self.errors = errors;
                return None;
            }
        };

        self.errors.clear();
        self.submitting = true;
        self.ticket += 1;
        let ticket = self.ticket;
        Some(match self.mode {
            FormMode::Create => FormCommand::Create { ticket, request },
            FormMode::Edit { .. } => FormCommand::Update { ticket, request },
        })
    }

    pub fn on_submitted(
        &mut self,
        ticket: Ticket,
        result: Result<Transaction, ClientError>,
    ) -> Option<SubmitOutcome> {
        if ticket != self.ticket || !self.submitting {
            return None;
        }
        self.submitting = false;
        let verb = match self.mode {
            FormMode::Create => "create",
            FormMode::Edit { .. } => "update",
        };
        Some(match result {
            Ok(_) => SubmitOutcome::Saved(Notice::success(format!(
                "Transaction {verb}d successfully"
            ))),
            Err(err) => SubmitOutcome::Failed(Notice::error(format!(
                "Failed to {verb} transaction: {err}"
            ))),
        })
    }
}
