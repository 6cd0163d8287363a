pub mod catalog;
pub mod quotation;
pub mod record;

mod form_number;

pub use form_number::FormNumber;
