//! Site-owner bearer tokens.
//!
//! Admin endpoints (notification feed, relay settings, comment moderation)
//! are gated by a token the control plane derives from the server secret.
//! Verification recomputes and compares in constant time; no token table is
//! involved.

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub fn site_owner_token(secret: &str, site_id: i64) -> String {
    // HMAC-SHA256 accepts any key length, so this cannot fail
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts any key length");
    mac.update(format!("site:{site_id}").as_bytes());
    format!("{:x}", mac.finalize().into_bytes())
}

pub fn verify_site_owner_token(secret: &str, site_id: i64, token: &str) -> bool {
    let expected = site_owner_token(secret, site_id);
    subtle::ConstantTimeEq::ct_eq(expected.as_bytes(), token.as_bytes()).into()
}
