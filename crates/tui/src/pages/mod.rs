//! Page state machines.
//!
//! Pages never talk to the network. Key handlers return commands that the app
//! runs on spawned tasks, and results come back through `on_*` methods tagged
//! with the ticket of the request that produced them. A result whose ticket is
//! not the page's current one belongs to a superseded request and is dropped.

pub mod form;
pub mod list;

pub type Ticket = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message shown as a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
