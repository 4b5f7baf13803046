//! Dining sessions
//!
//! A session groups every order placed at one table during one sitting. It
//! is opened implicitly by the first order and closed by staff, which
//! triggers bill generation.

mod aggregator;

pub use aggregator::SessionAggregator;
