//! Percent-encoding and parameter canonicalization for OAuth signatures.
//!
//! OAuth 1.0a (RFC 5849 section 3.6) leaves only the RFC 3986 unreserved set
//! unescaped. This is stricter than form or query encoding: `/`, `=`, `&`,
//! `+` and space are always escaped, and space becomes `%20`, never `+`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters that are NOT percent-encoded: `A-Z a-z 0-9 - . _ ~`.
const UNRESERVED_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode every byte outside the RFC 3986 unreserved set.
///
/// # Examples
///
/// ```
/// use social_auth_integration::signing::escape;
///
/// assert_eq!(escape("a b/c=d&e~f"), "a%20b%2Fc%3Dd%26e~f");
/// assert_eq!(escape("é"), "%C3%A9");
/// ```
pub fn escape(input: &str) -> String {
    utf8_percent_encode(input, UNRESERVED_SET).to_string()
}

/// Build the normalized parameter string.
///
/// Every key and value is escaped, entries are sorted by escaped key then
/// escaped value, and joined as `k=v` pairs with `&`. The result does not
/// depend on iteration order of the input.
///
/// # Examples
///
/// ```
/// use social_auth_integration::signing::canonicalize;
///
/// let params = [("b", "2"), ("a", "x y"), ("a", "1")];
/// assert_eq!(canonicalize(params), "a=1&a=x%20y&b=2");
/// ```
pub fn canonicalize<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (escape(k.as_ref()), escape(v.as_ref())))
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}
