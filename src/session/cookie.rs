use tower_cookies::{
    Cookie, Cookies,
    cookie::{SameSite, time::Duration as CookieDuration},
};

use super::SessionId;
use crate::config::SessionConfig;

/// Set the session cookie for a freshly established session.
pub fn issue_cookie(cookies: &Cookies, config: &SessionConfig, id: SessionId) {
    let cookie: Cookie<'static> = Cookie::build((config.cookie_name.clone(), id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(
            i64::try_from(config.ttl_secs).unwrap_or(i64::MAX),
        ))
        .build();

    cookies.add(cookie);
}

/// Expire the session cookie on the client.
pub fn remove_cookie(cookies: &Cookies, config: &SessionConfig) {
    let cookie: Cookie<'static> = Cookie::build(config.cookie_name.clone())
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::ZERO)
        .build();

    cookies.remove(cookie);
}
