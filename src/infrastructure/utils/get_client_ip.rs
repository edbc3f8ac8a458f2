use actix_web::HttpRequest;

const REAL_IP_HEADER: &str = "x-real-ip";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Extract the client's IP address from the request.
///
/// With `trust_proxy_headers`, the first non-empty value among `X-Real-IP` and the
/// first `X-Forwarded-For` entry wins; otherwise (or when both are empty) the peer
/// address is used.
pub fn get_client_ip(req: &HttpRequest, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let real_ip = header_value(req, REAL_IP_HEADER);
        let forwarded = header_value(req, FORWARDED_FOR_HEADER)
            .and_then(|s| s.split(',').next().map(str::trim))
            .filter(|s| !s.is_empty());

        if let Some(ip) = real_ip.or(forwarded) {
            return ip.to_string();
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate-limit key: client identity plus path, so each endpoint has its own budget.
pub fn rate_limit_key(client_ip: &str, path: &str) -> String {
    format!("{client_ip}:{path}")
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn real_ip_takes_precedence_over_forwarded_for() {
        let req = TestRequest::default()
            .insert_header((REAL_IP_HEADER, "203.0.113.7"))
            .insert_header((FORWARDED_FOR_HEADER, "198.51.100.1, 10.0.0.1"))
            .peer_addr("127.0.0.1:4000".parse().unwrap())
            .to_http_request();

        assert_eq!(get_client_ip(&req, true), "203.0.113.7");
    }

    #[test]
    fn first_forwarded_for_entry_is_used() {
        let req = TestRequest::default()
            .insert_header((FORWARDED_FOR_HEADER, " 198.51.100.1 , 10.0.0.1"))
            .peer_addr("127.0.0.1:4000".parse().unwrap())
            .to_http_request();

        assert_eq!(get_client_ip(&req, true), "198.51.100.1");
    }

    #[test]
    fn empty_proxy_headers_fall_back_to_peer() {
        let req = TestRequest::default()
            .insert_header((REAL_IP_HEADER, "  "))
            .insert_header((FORWARDED_FOR_HEADER, ""))
            .peer_addr("192.0.2.10:4000".parse().unwrap())
            .to_http_request();

        assert_eq!(get_client_ip(&req, true), "192.0.2.10");
    }

    #[test]
    fn untrusted_proxy_headers_are_ignored() {
        let req = TestRequest::default()
            .insert_header((FORWARDED_FOR_HEADER, "198.51.100.1"))
            .peer_addr("192.0.2.10:4000".parse().unwrap())
            .to_http_request();

        assert_eq!(get_client_ip(&req, false), "192.0.2.10");
    }

    #[test]
    fn missing_peer_is_unknown() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(get_client_ip(&req, false), "unknown");
    }

    #[test]
    fn key_combines_ip_and_path() {
        assert_eq!(rate_limit_key("192.0.2.10", "/api/contact"), "192.0.2.10:/api/contact");
    }
}
