pub mod attribution;
pub mod submit;

pub use attribution::{Attribution, AttributionStore, STORE_KEY};
pub use submit::{normalize_phone, Lead, LeadSubmitter};
