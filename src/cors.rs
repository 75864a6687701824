use axum::http::{HeaderName, HeaderValue, Method};
use std::str::FromStr;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsConfig;

/// 一组配置项的解析结果：是否出现通配符 `*`，以及其余合法取值。
struct Parsed<T> {
    any: bool,
    values: Vec<T>,
}

impl<T> Parsed<T> {
    fn is_set(&self) -> bool {
        self.any || !self.values.is_empty()
    }
}

/// 解析配置列表：忽略空白项，`*` 记为通配，非法值告警后丢弃。
fn parse_list<T, F>(label: &str, raw: &[String], parse: F) -> Parsed<T>
where
    F: Fn(&str) -> Option<T>,
{
    let mut parsed = Parsed {
        any: false,
        values: Vec::new(),
    };
    for item in raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if item == "*" {
            parsed.any = true;
            continue;
        }
        match parse(item) {
            Some(v) => parsed.values.push(v),
            None => tracing::warn!("CORS {} 含无效值: {}", label, item),
        }
    }
    parsed
}

/// 根据配置构建 CORS 中间件；未启用或配置无效时返回 None。
pub fn build_cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if !cors.enabled {
        return None;
    }

    let origins = parse_list("allowed_origins", &cors.allowed_origins, |v| {
        HeaderValue::from_str(v).ok()
    });
    if !origins.is_set() {
        tracing::warn!("CORS 已启用但 allowed_origins 为空，已跳过启用");
        return None;
    }
    let methods = parse_list("allowed_methods", &cors.allowed_methods, |v| {
        Method::from_str(&v.to_ascii_uppercase()).ok()
    });
    let headers = parse_list("allowed_headers", &cors.allowed_headers, |v| {
        HeaderName::from_str(&v.to_ascii_lowercase()).ok()
    });
    let expose = parse_list("expose_headers", &cors.expose_headers, |v| {
        HeaderName::from_str(&v.to_ascii_lowercase()).ok()
    });

    if cors.allow_credentials && (origins.any || methods.any || headers.any || expose.any) {
        tracing::error!("CORS 配置无效：allow_credentials=true 不能与 \"*\" 同时使用，已跳过启用");
        return None;
    }

    let mut layer = if origins.any {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins.values)
    };

    if methods.any {
        layer = layer.allow_methods(Any);
    } else if !methods.values.is_empty() {
        layer = layer.allow_methods(methods.values);
    }
    if headers.any {
        layer = layer.allow_headers(Any);
    } else if !headers.values.is_empty() {
        layer = layer.allow_headers(headers.values);
    }
    if expose.any {
        layer = layer.expose_headers(Any);
    } else if !expose.values.is_empty() {
        layer = layer.expose_headers(expose.values);
    }
    if cors.allow_credentials {
        layer = layer.allow_credentials(true);
    }
    if let Some(secs) = cors.max_age_secs
        && secs > 0
    {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Some(layer)
}

#[cfg(test)]
mod tests {
    use super::{build_cors_layer, parse_list};
    use crate::config::CorsConfig;
    use axum::http::Method;
    use std::str::FromStr;

    #[test]
    fn disabled_or_originless_config_builds_nothing() {
        assert!(build_cors_layer(&CorsConfig::default()).is_none());
        let cors = CorsConfig {
            enabled: true,
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn credentials_with_wildcard_is_rejected() {
        let cors = CorsConfig {
            enabled: true,
            allow_credentials: true,
            allowed_origins: vec!["*".to_string()],
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn method_list_is_trimmed_and_uppercased() {
        let input = vec!["get".to_string(), " POST ".to_string(), "".to_string()];
        let parsed = parse_list("allowed_methods", &input, |v| {
            Method::from_str(&v.to_ascii_uppercase()).ok()
        });
        assert!(!parsed.any);
        assert_eq!(parsed.values, vec![Method::GET, Method::POST]);
    }
}
