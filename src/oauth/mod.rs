//! HubSpot OAuth2 authorization-code flow
//!
//! Bridges the browser redirect round-trip with the backend request cycle:
//! a cached anti-forgery state correlates the callback with the
//! `(user_id, org_id)` pair that initiated it, and the exchanged credentials
//! are parked in the cache for a single pickup.

pub mod flows;
pub mod state;

pub use flows::{CallbackQuery, OAuthFlows, CLOSE_WINDOW_HTML};
pub use state::{PendingAuthState, CREDENTIALS_TTL, STATE_TTL};
