//! `Set-Cookie` header parsing.
//!
//! Servers and HTTP stacks sometimes fold several `Set-Cookie` headers into a
//! single comma separated value. Commas are also legal inside the `Expires`
//! attribute (`Expires=Wed, 09 Jun 2025 10:18:14 GMT`), so the value cannot be
//! split on every comma. [`split_set_cookie`] only splits on a comma that is
//! followed by a `name=` token.
//!
//! Each piece is then handed to the `cookie` crate and copied into a
//! [`SetCookie`]: the percent-decoded `name=value` pair, `Expires`, `Max-Age`,
//! `Path`, `Domain`, `Secure`, `HttpOnly` and `SameSite`. Unparseable
//! attribute values are dropped, so a bad `Expires` leaves a session cookie.
//! `HttpOnly` and `SameSite` are reported but the jar does not enforce them.
use cookie::Cookie as RawCookie;
use time::OffsetDateTime;

/// One cookie as announced by a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    /// Percent-decoded value.
    pub value: String,
    pub expires: Option<OffsetDateTime>,
    /// Lifetime in seconds.
    pub max_age: Option<i64>,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<String>,
}

/// Splits a combined `Set-Cookie` value into the individual cookie strings.
pub fn split_set_cookie(combined: &str) -> Vec<&str> {
    let bytes = combined.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b',' {
            pos += 1;
            continue;
        }

        let comma = pos;
        let mut next = comma + 1;
        while next < bytes.len() && bytes[next].is_ascii_whitespace() {
            next += 1;
        }
        let token_start = next;
        while next < bytes.len() && !matches!(bytes[next], b'=' | b';' | b',') {
            next += 1;
        }

        if next < bytes.len() && bytes[next] == b'=' {
            // `, name=` starts a new cookie
            parts.push(&combined[start..comma]);
            start = token_start;
            pos = token_start;
        } else {
            pos = comma + 1;
        }
    }
    parts.push(&combined[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Splits and parses a (possibly combined) `Set-Cookie` value.
pub fn parse_set_cookies(combined: &str) -> Vec<SetCookie> {
    split_set_cookie(combined)
        .into_iter()
        .filter_map(parse_set_cookie)
        .collect()
}

/// Parses a single cookie string. Returns `None` when the leading pair has
/// no `=` or an empty name.
pub fn parse_set_cookie(raw: &str) -> Option<SetCookie> {
    let parsed = match RawCookie::parse_encoded(raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::debug!("skipping set-cookie {:?}: {}", raw, e);
            return None;
        }
    };

    let (name, value) = parsed.name_value();
    Some(SetCookie {
        name: name.to_string(),
        value: value.to_string(),
        expires: parsed.expires_datetime(),
        max_age: parsed.max_age().map(|d| d.whole_seconds()),
        path: parsed.path().map(str::to_string),
        domain: parsed.domain().map(str::to_string),
        secure: parsed.secure().unwrap_or(false),
        http_only: parsed.http_only().unwrap_or(false),
        same_site: parsed.same_site().map(|s| s.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn single_cookie_with_all_attributes() {
        let c = parse_set_cookie(
            "token=xyz; Path=/; Domain=example.com; Expires=Wed, 09 Jun 2025 10:18:14 GMT; Secure; HttpOnly; SameSite=lax",
        )
        .unwrap();

        assert_eq!(c.name, "token");
        assert_eq!(c.value, "xyz");
        assert_eq!(c.path.as_deref(), Some("/"));
        assert_eq!(c.domain.as_deref(), Some("example.com"));
        assert_eq!(c.expires, Some(datetime!(2025-06-09 10:18:14 UTC)));
        assert!(c.secure);
        assert!(c.http_only);
        assert_eq!(c.same_site.as_deref(), Some("Lax"));
        assert_eq!(c.max_age, None);
    }

    #[test]
    fn value_is_percent_decoded_and_may_contain_equals() {
        let c = parse_set_cookie("data=a%20b=c; path=/x").unwrap();
        assert_eq!(c.value, "a b=c");
        assert_eq!(c.path.as_deref(), Some("/x"));
    }

    #[test]
    fn attribute_names_are_case_insensitive() {
        let c = parse_set_cookie("a=1; PATH=/p; dOmAiN=x.org; max-AGE=60; SECURE").unwrap();
        assert_eq!(c.path.as_deref(), Some("/p"));
        assert_eq!(c.domain.as_deref(), Some("x.org"));
        assert_eq!(c.max_age, Some(60));
        assert!(c.secure);
    }

    #[test]
    fn pairs_without_name_are_skipped() {
        assert!(parse_set_cookie("novalue").is_none());
        assert!(parse_set_cookie("=abc; Path=/").is_none());
        assert!(parse_set_cookie("").is_none());
    }

    #[test]
    fn bad_attributes_are_ignored() {
        let c = parse_set_cookie("a=1; Expires=someday; Max-Age=soon; Unknown=1").unwrap();
        assert_eq!(c.expires, None);
        assert_eq!(c.max_age, None);
    }

    #[test]
    fn split_keeps_commas_inside_expires() {
        let parts = split_set_cookie(
            "a=1; Expires=Wed, 09 Jun 2025 10:18:14 GMT; Path=/, b=2; Path=/x,c=3",
        );
        assert_eq!(
            parts,
            vec!["a=1; Expires=Wed, 09 Jun 2025 10:18:14 GMT; Path=/", "b=2; Path=/x", "c=3"]
        );
    }

    #[test]
    fn split_single_cookie_is_untouched() {
        assert_eq!(split_set_cookie(" sid=abc "), vec!["sid=abc"]);
        assert!(split_set_cookie("").is_empty());
    }

    #[test]
    fn split_keeps_comma_in_plain_value() {
        assert_eq!(split_set_cookie("list=a,b,c; Path=/"), vec!["list=a,b,c; Path=/"]);
    }

    #[test]
    fn parse_combined_header() {
        let cookies = parse_set_cookies("a=1; Expires=Thu, 01 Jan 2099 00:00:00 GMT, b=2");
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "a");
        assert_eq!(cookies[0].expires, Some(datetime!(2099-01-01 00:00:00 UTC)));
        assert_eq!(cookies[1].name, "b");
        assert_eq!(cookies[1].expires, None);
    }

    #[test]
    fn expires_ignores_a_wrong_weekday() {
        // 9 June 2025 was a Monday
        let c = parse_set_cookie("t=1; Expires=Wed, 09 Jun 2025 10:18:14 GMT").unwrap();
        assert_eq!(c.expires, Some(datetime!(2025-06-09 10:18:14 UTC)));
    }

    #[test]
    fn negative_max_age_is_zero() {
        let c = parse_set_cookie("t=1; Max-Age=-5").unwrap();
        assert_eq!(c.max_age, Some(0));
    }
}
