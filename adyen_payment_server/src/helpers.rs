use std::{
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use actix_web::{http::header::HeaderMap, HttpRequest};
use adyen_payment_engine::adyen_api::payment_objects::BasicAuthCredentials;
use log::{debug, trace, warn};
use regex::Regex;

/// The header the storefront uses to tell us which sales channel a request belongs to.
pub const SALES_CHANNEL_HEADER: &str = "sw-sales-channel-id";

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
    remote_ip_from_headers(req.headers(), use_x_forwarded_for, use_forwarded).or_else(|| {
        trace!("Using Peer address for remote address: {peer_addr:?}");
        peer_addr.and_then(|s| IpAddr::from_str(&s).or_else(|_| SocketAddr::from_str(&s).map(|a| a.ip())).ok())
    })
}

/// The client address claimed by the proxy headers that are trusted in the configuration, if any.
pub fn remote_ip_from_headers(headers: &HeaderMap, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        // The first entry is the original client. Proxies append theirs.
        result = headers
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = headers.get("Forwarded").and_then(|v| v.to_str().ok()).and_then(parse_forwarded_for);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result
}

fn parse_forwarded_for(value: &str) -> Option<IpAddr> {
    let re = Regex::new(r#"(?i)for="?\[?(?P<ip>[0-9a-f.:]+)"#).ok()?;
    re.captures(value).and_then(|caps| caps.name("ip")).and_then(|m| IpAddr::from_str(m.as_str()).ok())
}

/// Extracts the credentials from an `Authorization: Basic ...` header.
pub fn basic_auth_credentials(req: &HttpRequest) -> Option<BasicAuthCredentials> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ").or_else(|| header.strip_prefix("basic "))?;
    let decoded = base64::decode(encoded.trim()).map_err(|e| debug!("💻️ Invalid basic auth header. {e}")).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(BasicAuthCredentials::new(username, password))
}

/// Extracts the token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get("Authorization")?.to_str().ok()?;
    header.strip_prefix("Bearer ").or_else(|| header.strip_prefix("bearer ")).map(str::trim)
}

/// Without a whitelist, everyone is allowed. With one, the peer address must be known and on the list.
pub fn is_whitelisted(peer_ip: Option<IpAddr>, whitelist: Option<&[IpAddr]>) -> bool {
    match (peer_ip, whitelist) {
        (_, None) => true,
        (Some(ip), Some(whitelist)) => {
            let allowed = whitelist.contains(&ip);
            if allowed {
                debug!("🔔️ Adyen webhook request from {ip}");
            } else {
                warn!("🔔️ Webhook request from {ip}, which is not on the Adyen whitelist. Denying access.");
            }
            allowed
        },
        (None, Some(_)) => {
            warn!("🔔️ No IP address found in webhook request, denying access.");
            false
        },
    }
}

pub fn sales_channel_id(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(SALES_CHANNEL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn forwarded_headers() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .insert_header(("Forwarded", "for=\"[2001:db8::17]\";proto=https"))
            .to_http_request();
        assert_eq!(remote_ip_from_headers(req.headers(), true, true), Some("203.0.113.7".parse().unwrap()));
        assert_eq!(remote_ip_from_headers(req.headers(), false, true), Some("2001:db8::17".parse().unwrap()));
        assert_eq!(remote_ip_from_headers(req.headers(), false, false), None);
        assert_eq!(parse_forwarded_for("proto=http;for=192.0.2.60;by=203.0.113.43"), Some("192.0.2.60".parse().unwrap()));
    }

    #[test]
    fn basic_auth() {
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Basic {}", base64::encode("adyen:s3cr:et"))))
            .to_http_request();
        let creds = basic_auth_credentials(&req).unwrap();
        assert_eq!(creds.username, "adyen");
        assert_eq!(creds.password.reveal(), "s3cr:et");
        let req = TestRequest::default().insert_header(("Authorization", "Basic !!!")).to_http_request();
        assert!(basic_auth_credentials(&req).is_none());
        let req = TestRequest::default().to_http_request();
        assert!(basic_auth_credentials(&req).is_none());
    }

    #[test]
    fn whitelist() {
        let adyen: IpAddr = "82.199.87.129".parse().unwrap();
        let other: IpAddr = "10.0.0.1".parse().unwrap();
        let list = [adyen];
        assert!(is_whitelisted(Some(adyen), Some(&list)));
        assert!(!is_whitelisted(Some(other), Some(&list)));
        assert!(!is_whitelisted(None, Some(&list)));
        assert!(is_whitelisted(None, None));
        assert!(!is_whitelisted(Some(adyen), Some(&[])));
    }

    #[test]
    fn bearer_tokens_and_sales_channels() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc123"))
            .insert_header((SALES_CHANNEL_HEADER, "eu_store"))
            .to_http_request();
        assert_eq!(bearer_token(req.headers()), Some("abc123"));
        assert_eq!(sales_channel_id(&req).as_deref(), Some("eu_store"));
        let req = TestRequest::default().insert_header(("Authorization", "Basic abc123")).to_http_request();
        assert_eq!(bearer_token(req.headers()), None);
        assert_eq!(sales_channel_id(&req), None);
    }
}
