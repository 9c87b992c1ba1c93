//! Broker integrations.
//!
//! Currently Angel One SmartAPI: session handling with TOTP login,
//! instrument token lookup, historical candles and live prices.

mod angel;
mod scrip_master;
mod session;
mod totp;
mod unavailable;

pub use angel::{classify, AngelAuthenticator, AngelConfig, AngelCredentials, AngelOneClient, CredentialVars, THROTTLE_CODE};
pub use scrip_master::{index_rows, ScripMaster, ScripRow, DEFAULT_SCRIP_MASTER_URL};
pub use session::{Authenticator, Session, SessionManager, DEFAULT_SESSION_TTL_SECS};
pub use totp::{base32_decode, Totp};
pub use unavailable::UnavailableBroker;
