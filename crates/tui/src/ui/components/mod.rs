pub mod hints;
pub mod sidebar;
pub mod toast;
