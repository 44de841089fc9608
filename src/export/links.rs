use url::Url;

use duebook_core::StatementService;

use crate::errors::{AppError, AppResult};

const MESSAGING_BASE: &str = "https://wa.me/";

/// Messaging link that opens a chat with `phone` prefilled with `message`.
pub fn reminder_link(phone: &str, message: &str) -> AppResult<Url> {
    let number = StatementService::messaging_number(phone);
    if number.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "phone `{phone}` has no digits to message"
        )));
    }
    let mut link = Url::parse(MESSAGING_BASE)?.join(&number)?;
    link.query_pairs_mut().append_pair("text", message);
    Ok(link)
}
