//! Data plumbing for the masterclass landing page: the published-sheet
//! schedule feed, the thank-you page group link, lead capture, pixel
//! tracking and the enrol-bar countdown.

pub mod config;
pub mod fetch;
pub mod lead;
pub mod schedule;
pub mod sheet;
pub mod tracking;
pub mod urgency;
