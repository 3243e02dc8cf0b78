//! Pseudonymous reactor identity.
//!
//! A reactor token deduplicates reactions per visitor. It is derived from the
//! client IP and user agent under the server secret, optionally mixed with a
//! long-lived cookie token so identity survives IP changes. Tokens are never
//! treated as authentication.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

const IP_CONTEXT: &str = "reactor-ip-v1";
const MIX_CONTEXT: &str = "reactor-mix-v1";

/// Generated tokens are 40 lowercase hex chars (HMAC-SHA256, truncated).
const TOKEN_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedActor {
    pub token: String,
    pub should_set_cookie: bool,
}

/// Accepts 20-64 lowercase hex chars. Anything else is ignored as if no
/// cookie was present.
pub fn is_valid_token(token: &str) -> bool {
    (20..=64).contains(&token.len())
        && token
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn keyed_digest(secret: &str, message: &str) -> String {
    // HMAC-SHA256 accepts any key length, so this cannot fail
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts any key length");
    mac.update(message.as_bytes());
    let digest = format!("{:x}", mac.finalize().into_bytes());
    digest[..TOKEN_LEN].to_string()
}

/// Fresh random token for clients with no usable IP. Never stable across
/// calls, so anonymous clients are not aggregated together.
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Resolve the reactor token for a request.
///
/// A valid existing cookie always wins: it is returned as-is when it matches
/// the IP-derived token (or no IP is available), and mixed with the IP token
/// otherwise so a client-supplied value is never trusted verbatim for writes.
/// `should_set_cookie` is true only on first touch, so an established cookie
/// is never overwritten.
pub fn resolve(
    ip: Option<&str>,
    user_agent: &str,
    cookie_token: Option<&str>,
    secret: &str,
) -> ResolvedActor {
    let ip = ip.map(str::trim).filter(|ip| !ip.is_empty());
    let ip_token = ip.map(|ip| keyed_digest(secret, &format!("{ip}|{user_agent}|{IP_CONTEXT}")));
    let cookie = cookie_token.map(str::trim).filter(|t| is_valid_token(t));

    match (cookie, ip_token) {
        (Some(cookie), Some(ip_token)) if cookie != ip_token => ResolvedActor {
            token: keyed_digest(secret, &format!("{cookie}:{ip_token}:{MIX_CONTEXT}")),
            should_set_cookie: false,
        },
        (Some(cookie), _) => ResolvedActor {
            token: cookie.to_string(),
            should_set_cookie: false,
        },
        (None, Some(ip_token)) => ResolvedActor {
            token: ip_token,
            should_set_cookie: true,
        },
        (None, None) => ResolvedActor {
            token: random_token(),
            should_set_cookie: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_ip_token_stable_without_cookie() {
        let a = resolve(Some("203.0.113.7"), "Mozilla/5.0", None, SECRET);
        let b = resolve(Some("203.0.113.7"), "Mozilla/5.0", None, SECRET);

        assert_eq!(a.token, b.token, "same ip+ua should derive the same token");
        assert!(a.should_set_cookie);
        assert!(b.should_set_cookie);
        assert!(is_valid_token(&a.token));
        assert_eq!(a.token.len(), 40);
    }

    #[test]
    fn test_ip_token_varies_by_user_agent() {
        let a = resolve(Some("203.0.113.7"), "Mozilla/5.0", None, SECRET);
        let b = resolve(Some("203.0.113.7"), "curl/8.0", None, SECRET);

        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_cookie_keeps_identity_across_ips() {
        let first = resolve(Some("203.0.113.7"), "Mozilla/5.0", None, SECRET);

        let from_home = resolve(
            Some("203.0.113.7"),
            "Mozilla/5.0",
            Some(&first.token),
            SECRET,
        );
        let from_cafe = resolve(
            Some("198.51.100.42"),
            "Mozilla/5.0",
            Some(&first.token),
            SECRET,
        );

        // Cookie equals the IP token at home, so it is returned verbatim.
        assert_eq!(from_home.token, first.token);
        assert!(!from_home.should_set_cookie);

        // Elsewhere the cookie is mixed, but deterministically so.
        let from_cafe_again = resolve(
            Some("198.51.100.42"),
            "Mozilla/5.0",
            Some(&first.token),
            SECRET,
        );
        assert_eq!(from_cafe.token, from_cafe_again.token);
        assert!(!from_cafe.should_set_cookie);
        assert!(is_valid_token(&from_cafe.token));
    }

    #[test]
    fn test_mixed_token_differs_from_both_inputs() {
        let cookie = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let resolved = resolve(Some("203.0.113.7"), "Mozilla/5.0", Some(cookie), SECRET);

        assert_ne!(resolved.token, cookie);
        let ip_only = resolve(Some("203.0.113.7"), "Mozilla/5.0", None, SECRET);
        assert_ne!(resolved.token, ip_only.token);
    }

    #[test]
    fn test_invalid_cookie_ignored() {
        let upper = resolve(Some("203.0.113.7"), "ua", Some("NOT-HEX-AT-ALL!!"), SECRET);
        let short = resolve(Some("203.0.113.7"), "ua", Some("abc123"), SECRET);
        let none = resolve(Some("203.0.113.7"), "ua", None, SECRET);

        assert_eq!(upper.token, none.token);
        assert_eq!(short.token, none.token);
        assert!(upper.should_set_cookie, "invalid cookie counts as first touch");
    }

    #[test]
    fn test_missing_ip_yields_fresh_random_tokens() {
        let a = resolve(None, "Mozilla/5.0", None, SECRET);
        let b = resolve(Some("   "), "Mozilla/5.0", None, SECRET);

        assert_ne!(a.token, b.token, "anonymous clients must not aggregate");
        assert!(is_valid_token(&a.token));
        assert!(a.should_set_cookie);
    }

    #[test]
    fn test_missing_ip_with_cookie_keeps_cookie() {
        let cookie = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef";
        let resolved = resolve(None, "Mozilla/5.0", Some(cookie), SECRET);

        assert_eq!(resolved.token, cookie);
        assert!(!resolved.should_set_cookie);
    }

    #[test]
    fn test_token_validation_bounds() {
        assert!(is_valid_token(&"a".repeat(20)));
        assert!(is_valid_token(&"0".repeat(64)));
        assert!(!is_valid_token(&"a".repeat(19)));
        assert!(!is_valid_token(&"a".repeat(65)));
        assert!(!is_valid_token("ABCDEF0123456789ABCDEF"));
        assert!(!is_valid_token(""));
    }
}
