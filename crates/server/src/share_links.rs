use reqwest::Url;

use showroom_core::errors::ApplicationError;

const WHATSAPP_BASE: &str = "https://wa.me/";
const GMAIL_COMPOSE: &str = "https://mail.google.com/mail/";

fn link_error(error: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Configuration(format!("could not build share link: {error}"))
}

/// `wa.me` deep link carrying `text`. Without a resolved number the link opens
/// WhatsApp's contact picker instead of a chat.
pub fn whatsapp_link(number: Option<&str>, text: &str) -> Result<String, ApplicationError> {
    let base = match number {
        Some(number) => format!("{WHATSAPP_BASE}{number}"),
        None => WHATSAPP_BASE.to_string(),
    };
    Url::parse_with_params(&base, &[("text", text)]).map(String::from).map_err(link_error)
}

/// Gmail compose window pre-filled with recipient, subject and body.
pub fn gmail_compose_link(to: &str, subject: &str, body: &str) -> Result<String, ApplicationError> {
    Url::parse_with_params(
        GMAIL_COMPOSE,
        &[("view", "cm"), ("fs", "1"), ("to", to), ("su", subject), ("body", body)],
    )
    .map(String::from)
    .map_err(link_error)
}

#[cfg(test)]
mod tests {
    use super::{gmail_compose_link, whatsapp_link};

    #[test]
    fn whatsapp_link_targets_resolved_number() {
        let link = whatsapp_link(Some("919825012345"), "Quotation SC-000001 & more").expect("link");
        assert_eq!(link, "https://wa.me/919825012345?text=Quotation+SC-000001+%26+more");
    }

    #[test]
    fn whatsapp_link_without_number_is_numberless() {
        let link = whatsapp_link(None, "hi").expect("link");
        assert_eq!(link, "https://wa.me/?text=hi");
    }

    #[test]
    fn gmail_link_encodes_every_field() {
        let link = gmail_compose_link("mehta@example.com", "Quotation 1", "Line one\nLine two")
            .expect("link");
        assert_eq!(
            link,
            "https://mail.google.com/mail/?view=cm&fs=1&to=mehta%40example.com&su=Quotation+1&body=Line+one%0ALine+two"
        );
    }
}
