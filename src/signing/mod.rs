//! Signing
//!
//! OAuth 1.0a request signatures and OAuth2 bearer attachment.
//!
//! Everything here is a pure function of the request, the credential and
//! (for OAuth1) an injected nonce and clock.

pub mod encoding;
pub mod nonce;
pub mod oauth1;
pub mod oauth2;

pub use encoding::{canonicalize, escape};
pub use nonce::{Clock, FixedClock, FixedNonceGenerator, NonceGenerator, SystemClock, UuidNonceGenerator};
pub use oauth1::{OAuth1Authorization, OAuth1Signer, OAUTH_VERSION, SIGNATURE_METHOD};
pub use oauth2::OAuth2Attacher;
