//! Cookie mirror for auth state.
//!
//! [`CookieJar`] behaves like a document cookie string: writes take a
//! `name=value;path=/;expires=...;` assignment, reads see the
//! `name=value; name=value` list of live cookies.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

const COOKIE_LIFE_MULTIPLIER_MS: i64 = 24 * 60 * 60 * 1000;
const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
/// 9999-12-31T23:59:59Z, the last instant a four-digit HTTP-date can carry.
const LATEST_COOKIE_EXPIRY_SECS: i64 = 253_402_300_799;

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires: Option<DateTime<Utc>>,
}

/// Shared cookie jar. Clones see the same cookies.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Arc<RwLock<BTreeMap<String, StoredCookie>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a cookie, expiring `expires_days` from now when given and
    /// non-zero. Negative values expire the cookie immediately.
    ///
    /// The value is kept whole, including any `;` it contains.
    pub fn set_cookie(&self, name: &str, value: &str, expires_days: Option<i64>) {
        let now = Utc::now();
        let expires = expires_days
            .filter(|days| *days != 0)
            .map(|days| cookie_expiry(days, now));
        self.store(name, value, expires, now);
    }

    /// Read a cookie value.
    ///
    /// Returns an empty string when the cookie is missing; callers treat
    /// empty as "not found".
    pub fn get_cookie(&self, name: &str) -> String {
        let now = Utc::now();
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .filter(|cookie| cookie.expires.map_or(true, |at| at > now))
            .map(|cookie| cookie.value.clone())
            .unwrap_or_default()
    }

    pub fn clear_cookie(&self, name: &str) {
        self.set_cookie(name, "", Some(-1));
    }

    /// Apply a raw `name=value;attr=...` assignment.
    pub fn assign(&self, assignment: &str) {
        let mut parts = assignment.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let mut expires = None;
        for attribute in parts {
            if let Some((key, raw)) = attribute.trim().split_once('=') {
                if key.trim().eq_ignore_ascii_case("expires") {
                    expires = parse_cookie_date(raw.trim());
                }
            }
        }
        self.store(name, value, expires, Utc::now());
    }

    fn store(&self, name: &str, value: &str, expires: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
        if expires.is_some_and(|at| at <= now) {
            cookies.remove(name);
            return;
        }
        cookies.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                expires,
            },
        );
    }

    /// Live cookies as `name=value` pairs joined by `"; "`.
    pub fn cookie_string(&self) -> String {
        let now = Utc::now();
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, cookie)| cookie.expires.map_or(true, |at| at > now))
            .map(|(name, cookie)| format!("{name}={}", cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Build the cookie assignment string for a write.
pub fn cookie_assignment(
    name: &str,
    value: &str,
    expires_days: Option<i64>,
    now: DateTime<Utc>,
) -> String {
    let mut cookie = format!("{name}={value};path=/;");
    if let Some(days) = expires_days.filter(|days| *days != 0) {
        cookie.push_str(&format!("expires={};", cookie_expiration_time(days, now)));
    }
    cookie
}

/// Absolute expiry `days` after `now`, in HTTP-date form.
pub fn cookie_expiration_time(days: i64, now: DateTime<Utc>) -> String {
    cookie_expiry(days, now)
        .format(COOKIE_DATE_FORMAT)
        .to_string()
}

/// `now` plus `days`, clamped to the range an HTTP-date can express.
fn cookie_expiry(days: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    let earliest = DateTime::from_timestamp(0, 0).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let latest =
        DateTime::from_timestamp(LATEST_COOKIE_EXPIRY_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC);
    let bound = if days < 0 { earliest } else { latest };
    Duration::try_milliseconds(days.saturating_mul(COOKIE_LIFE_MULTIPLIER_MS))
        .and_then(|offset| now.checked_add_signed(offset))
        .map_or(bound, |at| at.clamp(earliest, latest))
}

/// Find `name` in a `;`-separated cookie list, tolerating leading spaces.
pub fn find_cookie(cookie_string: &str, name: &str) -> String {
    let prefix = format!("{name}=");
    for cookie in cookie_string.split(';') {
        let cookie = cookie.trim_start_matches(' ');
        if let Some(value) = cookie.strip_prefix(&prefix) {
            return value.to_string();
        }
    }
    String::new()
}

fn parse_cookie_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, COOKIE_DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn assignment_without_expiry() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
        assert_eq!(cookie_assignment("a", "1", None, now), "a=1;path=/;");
        assert_eq!(cookie_assignment("a", "1", Some(0), now), "a=1;path=/;");
    }

    #[test]
    fn assignment_with_expiry_in_days() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
        assert_eq!(
            cookie_assignment("a", "1", Some(1), now),
            "a=1;path=/;expires=Tue, 20 Oct 2026 10:00:00 GMT;"
        );
    }

    #[test]
    fn huge_lifetimes_clamp_instead_of_overflowing() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
        let far = cookie_expiration_time(i64::from(u32::MAX), now);
        assert!(far.ends_with("31 Dec 9999 23:59:59 GMT"), "{far}");
        assert!(cookie_expiration_time(i64::MAX, now).ends_with("31 Dec 9999 23:59:59 GMT"));
        assert!(cookie_expiration_time(i64::MIN, now).ends_with("01 Jan 1970 00:00:00 GMT"));
    }

    #[test]
    fn jar_accepts_extreme_lifetimes() {
        let jar = CookieJar::new();
        jar.set_cookie("kept", "1", Some(i64::MAX));
        jar.set_cookie("gone", "1", Some(i64::MIN));
        assert_eq!(jar.get_cookie("kept"), "1");
        assert_eq!(jar.get_cookie("gone"), "");
    }

    #[test]
    fn set_cookie_keeps_semicolons_in_value() {
        let jar = CookieJar::new();
        let value = r#"{"name":"Li; Abe"}"#;
        jar.set_cookie("msal.client.account", value, Some(1));
        assert_eq!(jar.get_cookie("msal.client.account"), value);
    }

    #[test]
    fn find_cookie_tolerates_leading_spaces() {
        let cookies = "first=1;  second=2; third=";
        assert_eq!(find_cookie(cookies, "second"), "2");
        assert_eq!(find_cookie(cookies, "first"), "1");
        assert_eq!(find_cookie(cookies, "third"), "");
        assert_eq!(find_cookie(cookies, "missing"), "");
    }

    #[test]
    fn find_cookie_requires_exact_name() {
        assert_eq!(find_cookie("msal.a.state=x", "a.state"), "");
    }

    #[test]
    fn jar_round_trip_and_clear() {
        let jar = CookieJar::new();
        jar.set_cookie("msal.client.request.state", "abc", Some(1));
        assert_eq!(jar.get_cookie("msal.client.request.state"), "abc");

        jar.clear_cookie("msal.client.request.state");
        assert_eq!(jar.get_cookie("msal.client.request.state"), "");
        assert!(jar.cookie_string().is_empty());
    }

    #[test]
    fn jar_ignores_malformed_assignment() {
        let jar = CookieJar::new();
        jar.assign("no-equals-sign;path=/;");
        jar.assign("=value;path=/;");
        assert!(jar.cookie_string().is_empty());
    }
}
