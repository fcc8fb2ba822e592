use reqwest::Url;
use reqwest::header::HeaderValue;
use serde_json::Value;

const MASK: &str = "***REDACTED***";
const SECRET_NAMES: [&str; 8] = [
    "key",
    "api_key",
    "apikey",
    "token",
    "authorization",
    "password",
    "x-api-key",
    "x-goog-api-key",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpDebugConfig {
    pub enabled: bool,
    pub redact_secrets: bool,
    pub max_body_chars: usize,
}

impl HttpDebugConfig {
    pub fn from_verbose(verbose: bool) -> Self {
        Self {
            enabled: verbose,
            redact_secrets: true,
            max_body_chars: 2_000,
        }
    }

    pub fn disabled() -> Self {
        Self::from_verbose(false)
    }

    pub(crate) fn filter(&self) -> SecretFilter {
        SecretFilter {
            active: self.redact_secrets,
        }
    }
}

/// Masks credentials before anything reaches a debug log line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SecretFilter {
    active: bool,
}

impl SecretFilter {
    pub(crate) fn url(&self, url: &Url) -> String {
        if !self.active || url.query().is_none() {
            return url.to_string();
        }

        let masked = url
            .query_pairs()
            .map(|(name, value)| {
                let value = if is_secret_name(&name) {
                    MASK.into()
                } else {
                    value
                };
                (name.into_owned(), value.into_owned())
            })
            .collect::<Vec<_>>();

        let mut out = url.clone();
        out.query_pairs_mut().clear().extend_pairs(masked);
        out.to_string()
    }

    pub(crate) fn header(&self, name: &str, value: &HeaderValue) -> String {
        if self.active && is_secret_name(name) {
            return MASK.to_string();
        }

        value.to_str().unwrap_or("<non-utf8>").to_string()
    }

    pub(crate) fn body(&self, raw: &str) -> String {
        if !self.active {
            return raw.to_string();
        }

        let Ok(mut json) = serde_json::from_str::<Value>(raw) else {
            return raw.to_string();
        };
        mask_json(&mut json);
        serde_json::to_string(&json).unwrap_or_else(|_| raw.to_string())
    }
}

pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        None => input.to_string(),
        Some((cut, _)) => {
            let dropped = input[cut..].chars().count();
            format!("{}... <truncated {dropped} chars>", &input[..cut])
        }
    }
}

fn mask_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (name, item) in map.iter_mut() {
                if is_secret_name(name) {
                    *item = Value::String(MASK.to_string());
                } else {
                    mask_json(item);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_json),
        _ => {}
    }
}

fn is_secret_name(name: &str) -> bool {
    SECRET_NAMES
        .iter()
        .any(|secret| secret.eq_ignore_ascii_case(name))
}
