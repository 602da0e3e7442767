use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub mod amount;

pub use amount::{AmountError, parse_stored, to_display, to_stored};

/// Uniform envelope wrapping every backend response.
///
/// `success` is authoritative: a `false` value is a failure whatever the HTTP
/// status line said. `data` is `null` on failures and on some successful
/// writes (e.g. delete).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: Option<i32>,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    pub timestamp: Option<NaiveDateTime>,
}

/// Business failure extracted from an envelope with `success=false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub code: Option<i32>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(200),
            message: message.into(),
            data: Some(data),
            timestamp: Some(chrono::Local::now().naive_local()),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            message: message.into(),
            data: None,
            timestamp: Some(chrono::Local::now().naive_local()),
        }
    }

    /// Splits the envelope into its payload or the failure it carries.
    pub fn into_result(self) -> Result<Option<T>, ApiFailure> {
        if self.success {
            return Ok(self.data);
        }
        let message = if self.message.trim().is_empty() {
            "API request failed".to_string()
        } else {
            self.message
        };
        Err(ApiFailure {
            code: self.code,
            message,
        })
    }
}

/// Business error codes the backend is known to emit.
///
/// Only used to label log lines, the UI shows the server message as is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    SystemError,
    InvalidParameter,
    TransactionNotFound,
    TransactionAlreadyExists,
    TransactionCreateFailed,
    TransactionUpdateFailed,
    TransactionDeleteFailed,
}

impl ErrorCode {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::SystemError),
            -2 => Some(Self::InvalidParameter),
            -101 => Some(Self::TransactionNotFound),
            -102 => Some(Self::TransactionAlreadyExists),
            -103 => Some(Self::TransactionCreateFailed),
            -104 => Some(Self::TransactionUpdateFailed),
            -105 => Some(Self::TransactionDeleteFailed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SystemError => "system_error",
            Self::InvalidParameter => "invalid_parameter",
            Self::TransactionNotFound => "transaction_not_found",
            Self::TransactionAlreadyExists => "transaction_already_exists",
            Self::TransactionCreateFailed => "transaction_create_failed",
            Self::TransactionUpdateFailed => "transaction_update_failed",
            Self::TransactionDeleteFailed => "transaction_delete_failed",
        }
    }
}

pub mod page {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum SortDirection {
        Asc,
        Desc,
    }

    /// Offset pagination cursor. `page` is zero-based.
    ///
    /// Serialized as query-string parameters for the list endpoint.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageRequest {
        pub page: u32,
        pub size: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sort_by: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sort_direction: Option<SortDirection>,
    }

    impl PageRequest {
        pub fn new(page: u32, size: u32) -> Self {
            Self {
                page,
                size,
                sort_by: None,
                sort_direction: None,
            }
        }
    }

    impl Default for PageRequest {
        fn default() -> Self {
            Self::new(0, 10)
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PageResponse<T> {
        pub content: Vec<T>,
        pub total_elements: u64,
        pub total_pages: u32,
        pub size: u32,
        pub number: u32,
        pub first: bool,
        pub last: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub number_of_elements: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub has_next: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub has_previous: Option<bool>,
    }

    impl<T> PageResponse<T> {
        /// Builds a page the way the backend does from a slice of results.
        pub fn of(content: Vec<T>, total_elements: u64, page: u32, size: u32) -> Self {
            let total_pages = if size == 0 {
                0
            } else {
                total_elements.div_ceil(u64::from(size)) as u32
            };
            let number_of_elements = content.len() as u32;
            Self {
                content,
                total_elements,
                total_pages,
                size,
                number: page,
                first: page == 0,
                last: page + 1 >= total_pages,
                number_of_elements: Some(number_of_elements),
                has_next: Some(page + 1 < total_pages),
                has_previous: Some(page > 0),
            }
        }
    }
}

pub mod transaction {
    use super::*;

    /// Longest description the backend accepts, in characters.
    pub const DESCRIPTION_MAX_CHARS: usize = 500;

    /// Transaction direction, encoded as an integer on the wire.
    ///
    /// Integers outside the known set decode as [`TransactionType::Unknown`];
    /// that variant is never offered to the user.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(from = "i32", into = "i32")]
    pub enum TransactionType {
        #[default]
        Unknown,
        Expense,
        Income,
    }

    impl TransactionType {
        pub fn selectable() -> [TransactionType; 2] {
            [Self::Expense, Self::Income]
        }

        pub fn name(self) -> &'static str {
            match self {
                Self::Expense => "Expense",
                Self::Income => "Income",
                Self::Unknown => "Unknown",
            }
        }

        pub fn color(self) -> &'static str {
            match self {
                Self::Expense => "red",
                Self::Income => "green",
                Self::Unknown => "default",
            }
        }
    }

    impl From<i32> for TransactionType {
        fn from(value: i32) -> Self {
            match value {
                1 => Self::Expense,
                2 => Self::Income,
                _ => Self::Unknown,
            }
        }
    }

    impl From<TransactionType> for i32 {
        fn from(value: TransactionType) -> Self {
            match value {
                TransactionType::Unknown => 0,
                TransactionType::Expense => 1,
                TransactionType::Income => 2,
            }
        }
    }

    /// Display name for a raw type code. Defined for every integer.
    pub fn type_name(raw: i32) -> &'static str {
        TransactionType::from(raw).name()
    }

    /// Display tag colour for a raw type code. Defined for every integer.
    pub fn type_color(raw: i32) -> &'static str {
        TransactionType::from(raw).color()
    }

    /// Returns `true` for 10 to 20 ASCII digits.
    pub fn is_account_number(value: &str) -> bool {
        (10..=20).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Transaction {
        pub id: i64,
        pub transaction_id: String,
        /// Minor currency units (cents).
        pub amount: i64,
        pub transaction_type: TransactionType,
        pub account_number: String,
        pub counterparty_account: Option<String>,
        pub description: Option<String>,
        pub created_at: Option<NaiveDateTime>,
        pub updated_at: Option<NaiveDateTime>,
    }

    /// Create/update payload. `transaction_id` is required for update and
    /// left out for create.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionRequest {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub transaction_id: Option<String>,
        pub amount: i64,
        pub transaction_type: TransactionType,
        pub account_number: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub counterparty_account: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionDeleteRequest {
        pub transaction_id: String,
    }

    /// Final verdict of a delete.
    ///
    /// `acknowledged` is the envelope's `success`. `success` additionally
    /// requires `data` not to be `false`; the backend answers a completed
    /// delete with `data: null`.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct DeleteOutcome {
        pub success: bool,
        pub acknowledged: bool,
        pub message: String,
    }

    impl DeleteOutcome {
        pub fn from_envelope(acknowledged: bool, data: Option<bool>, message: String) -> Self {
            Self {
                success: acknowledged && data != Some(false),
                acknowledged,
                message,
            }
        }
    }
}
