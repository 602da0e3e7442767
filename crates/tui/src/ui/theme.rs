use ratatui::style::Color;

use api_types::transaction::TransactionType;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub text: Color,
    pub text_muted: Color,
    pub border: Color,
    pub accent: Color,
    pub positive: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Color::Rgb(220, 220, 220),
            text_muted: Color::Rgb(140, 140, 140),
            border: Color::Rgb(70, 80, 90),
            accent: Color::Rgb(80, 160, 160),
            positive: Color::Rgb(90, 180, 110),
            error: Color::Rgb(200, 80, 80),
        }
    }
}

impl Theme {
    /// Tag colour for a transaction type.
    pub fn type_tag(&self, transaction_type: TransactionType) -> Color {
        match transaction_type.color() {
            "red" => self.error,
            "green" => self.positive,
            _ => self.text_muted,
        }
    }
}
