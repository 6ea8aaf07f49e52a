//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Start locked down and loosen only when specific functionality requires it.
//! The storefront loosens three things: product and CMS images come from
//! external CDNs, HTMX loads from unpkg, and the Razorpay widget needs its
//! script, frame and API origins.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Origins allowed to serve scripts besides `'self'`.
const SCRIPT_ORIGINS: &str = "https://unpkg.com https://checkout.razorpay.com";

/// Origins the Razorpay widget frames and calls.
const RAZORPAY_ORIGINS: &str = "https://api.razorpay.com https://checkout.razorpay.com";

/// Build the CSP header for a request's nonce.
///
/// ```text
/// default-src 'none';
/// script-src 'self' 'nonce-...' https://unpkg.com https://checkout.razorpay.com;
/// style-src 'self';
/// font-src 'self';
/// img-src 'self' https: data:;
/// connect-src 'self' https://api.razorpay.com https://checkout.razorpay.com;
/// frame-src https://api.razorpay.com https://checkout.razorpay.com;
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self';
/// frame-ancestors 'none';
/// upgrade-insecure-requests
/// ```
#[must_use]
pub fn content_security_policy(nonce: Option<&CspNonce>) -> String {
    let nonce_source = nonce
        .filter(|n| !n.value().is_empty())
        .map(|n| format!(" {}", n.source()))
        .unwrap_or_default();

    format!(
        "default-src 'none'; \
         script-src 'self'{nonce_source} {SCRIPT_ORIGINS}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' https: data:; \
         connect-src 'self' {RAZORPAY_ORIGINS}; \
         frame-src {RAZORPAY_ORIGINS}; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'; \
         upgrade-insecure-requests"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin` - The payment widget needs the origin
/// - `Content-Security-Policy` - See [`content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features except the Payment Request API
/// - `Cache-Control: no-store` - Unless the handler set its own policy
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` - UPI and netbanking open popups
/// - `X-DNS-Prefetch-Control: off`
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let csp = content_security_policy(request.extensions().get::<CspNonce>());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             payment=(self \"https://api.razorpay.com\"), \
             usb=()",
        ),
    );

    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_includes_nonce() {
        let nonce = CspNonce("n0nce".to_string());
        let csp = content_security_policy(Some(&nonce));
        assert!(csp.contains("script-src 'self' 'nonce-n0nce' https://unpkg.com"));
        assert!(csp.contains("frame-src https://api.razorpay.com"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_csp_without_nonce() {
        let csp = content_security_policy(None);
        assert!(csp.contains("script-src 'self' https://unpkg.com"));
        assert!(!csp.contains("nonce-"));

        let empty = CspNonce(String::new());
        assert!(!content_security_policy(Some(&empty)).contains("nonce-"));
    }
}
