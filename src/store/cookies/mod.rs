use cookie::Cookie;
use http::HeaderMap;
use http::header::{COOKIE, HeaderValue, SET_COOKIE};
use time::{Duration, OffsetDateTime};

use crate::errors::{Result, SessionError};
use crate::session::{Options, SameSite};


/// Value of the first request cookie called `name`, if any.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(std::result::Result::ok)
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

/// Build a `Set-Cookie` cookie carrying `value` with the attributes in `options`.
///
/// A negative max-age yields `Max-Age=0` plus an expiry in 1970 so browsers
/// drop the cookie; zero yields a browser-session cookie.
pub fn build_cookie(name: &str, value: &str, options: &Options) -> Cookie<'static> {
    let mut builder = Cookie::build((name.to_string(), value.to_string()))
        .path(options.path.clone())
        .secure(options.secure)
        .http_only(options.http_only);

    if let Some(domain) = &options.domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(same_site) = options.same_site {
        builder = builder.same_site(match same_site {
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::None => cookie::SameSite::None,
        });
    }

    match options.max_age {
        age if age < 0 => {
            builder = builder
                .max_age(Duration::ZERO)
                .expires(OffsetDateTime::UNIX_EPOCH);
        }
        0 => {}
        age => {
            let max_age = Duration::seconds(age);
            builder = builder.max_age(max_age);
            if let Some(expires) = OffsetDateTime::now_utc().checked_add(max_age) {
                builder = builder.expires(expires);
            }
        }
    }

    builder.build()
}

pub fn append_set_cookie(response: &mut HeaderMap, cookie: &Cookie<'_>) -> Result<()> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| SessionError::Cookie(format!("invalid Set-Cookie header: {}", e)))?;
    response.append(SET_COOKIE, value);
    Ok(())
}
