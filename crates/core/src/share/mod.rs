//! Channel payloads for a generated quotation: WhatsApp text, a link-only
//! note and an email body, plus recipient number resolution.

pub mod compose;
pub mod money;
pub mod phone;

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

pub use compose::{email_body, email_subject, full_detail_message, link_only_message};
pub use money::{fixed2, format_inr};
pub use phone::resolve_whatsapp_number;

/// Seller details printed in headers, footers and signatures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub tagline: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub country_code: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: "Showroom Ceramica".to_string(),
            tagline: "Redefining Luxury".to_string(),
            phone: String::new(),
            email: String::new(),
            website: String::new(),
            country_code: "91".to_string(),
        }
    }
}

/// Server-assigned facts about a generated quotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareContext<'a> {
    pub quote_number: &'a str,
    pub date: &'a str,
    pub document_link: &'a str,
    pub company: &'a CompanyProfile,
}

/// `19/10/2026`, the day-first form used on Indian documents.
pub fn format_quote_date<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    date.format("%d/%m/%Y").to_string()
}

/// Local calendar date of an epoch-seconds timestamp.
pub fn local_quote_date(epoch_seconds: i64) -> Option<String> {
    let utc = DateTime::from_timestamp(epoch_seconds, 0)?;
    Some(format_quote_date(&utc.with_timezone(&Local)))
}
