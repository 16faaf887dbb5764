use tracing_subscriber::{fmt, EnvFilter};

use crate::config::is_truthy;

/// Load dotenv and initialize structured tracing based on RUST_LOG.
///
/// - Supports an explicit env file path via ENV_FILE or DOTENV_PATH
/// - Falls back to standard `.env` discovery from the working directory
/// - Logs the source used
pub fn init_tracing() {
    let mut env_source: String = "none".into();
    for key in ["ENV_FILE", "DOTENV_PATH"] {
        if let Ok(p) = std::env::var(key) {
            let p = p.trim();
            if !p.is_empty()
                && std::path::Path::new(p).is_file()
                && dotenvy::from_filename(p).is_ok()
            {
                env_source = format!("{p} ({key})");
                break;
            }
        }
    }

    if env_source == "none" {
        if let Ok(path) = dotenvy::dotenv() {
            env_source = path.display().to_string();
        }
    }

    // RUST_LOG may come from the env file loaded above
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}

/// Value of a `--name=value` command line flag, if given.
pub fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("--{name}=");
    args.iter()
        .find_map(|a| a.strip_prefix(prefix.as_str()))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Build a CORS layer from environment variables.
///
/// Environment variables:
/// - CORS_ALLOWED_ORIGINS: "*" or comma-separated origins (e.g., "https://a.com, https://b.com")
/// - CORS_ALLOWED_METHODS: "*" or comma-separated methods (e.g., "GET,POST,OPTIONS")
/// - CORS_ALLOWED_HEADERS: "*" or comma-separated request header names
/// - CORS_ALLOW_CREDENTIALS: enable with 1,true,yes,on
/// - CORS_MAX_AGE: max age in seconds (u64)
///
/// Defaults are permissive (Any), matching an open CORS policy for the mobile client.
pub fn cors_layer_from_env() -> tower_http::cors::CorsLayer {
    cors_layer_from_lookup(|k| std::env::var(k).ok())
}

pub fn cors_layer_from_lookup<F>(lookup: F) -> tower_http::cors::CorsLayer
where
    F: Fn(&str) -> Option<String>,
{
    use std::time::Duration;
    use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

    let mut layer = CorsLayer::new();

    // tower-http rejects credentials combined with `*`; wildcards mirror the request instead
    let credentials = lookup("CORS_ALLOW_CREDENTIALS").is_some_and(|v| is_truthy(&v));
    if credentials {
        layer = layer.allow_credentials(true);
    }

    // Allowed origins
    let origins = lookup("CORS_ALLOWED_ORIGINS")
        .map(|s| parse_list(&s, |p| http::HeaderValue::from_str(p).ok()))
        .unwrap_or_default();
    layer = match origins {
        Some(vals) => layer.allow_origin(AllowOrigin::list(vals)),
        None if credentials => layer.allow_origin(AllowOrigin::mirror_request()),
        None => layer.allow_origin(Any),
    };

    // Allowed methods
    let methods = lookup("CORS_ALLOWED_METHODS")
        .map(|s| {
            parse_list(&s, |p| {
                http::Method::from_bytes(p.to_ascii_uppercase().as_bytes()).ok()
            })
        })
        .unwrap_or_default();
    layer = match methods {
        Some(vals) => layer.allow_methods(AllowMethods::list(vals)),
        None if credentials => layer.allow_methods(AllowMethods::mirror_request()),
        None => layer.allow_methods(Any),
    };

    // Allowed headers
    let headers = lookup("CORS_ALLOWED_HEADERS")
        .map(|s| parse_list(&s, |p| http::header::HeaderName::try_from(p).ok()))
        .unwrap_or_default();
    layer = match headers {
        Some(vals) => layer.allow_headers(AllowHeaders::list(vals)),
        None if credentials => layer.allow_headers(AllowHeaders::mirror_request()),
        None => layer.allow_headers(Any),
    };

    if let Some(secs) = lookup("CORS_MAX_AGE") {
        if let Ok(n) = secs.trim().parse::<u64>() {
            layer = layer.max_age(Duration::from_secs(n));
        }
    }

    layer
}

/// Parse a comma-separated list. `None` means "any" (either "*" or nothing valid).
fn parse_list<T, F>(raw: &str, parse: F) -> Option<Vec<T>>
where
    F: Fn(&str) -> Option<T>,
{
    let s = raw.trim();
    if s == "*" {
        return None;
    }
    let vals: Vec<T> = s
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter_map(&parse)
        .collect();
    if vals.is_empty() {
        None
    } else {
        Some(vals)
    }
}
