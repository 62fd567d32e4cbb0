use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub(crate) const DEFAULT_RECENT_NOTES_LIMIT: usize = 10;
pub(crate) const SHOPPING_LIST_LIMIT: usize = 5;

/// Runtime configuration injected by the hosting page as `window.ENV`.
///
/// ```html
/// <script>window.ENV = { API_URL: "https://sigil.example/api", LOG_LEVEL: "debug" }</script>
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct EnvConfig {
    pub api_url: String,
    pub log_level: String,
    pub recent_notes_limit: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            log_level: "info".to_string(),
            recent_notes_limit: DEFAULT_RECENT_NOTES_LIMIT,
        }
    }
}

impl EnvConfig {
    pub fn from_window() -> Self {
        let mut cfg = Self::default();

        let Some(env) = web_sys::window().and_then(|w| w.get("ENV")) else {
            return cfg;
        };
        if env.is_undefined() || !env.is_object() {
            return cfg;
        }

        let get_s = |key: &str| {
            js_sys::Reflect::get(&env, &key.into())
                .ok()
                .and_then(|v| v.as_string())
        };

        // Both `API_URL` and the lowercase spelling are accepted.
        if let Some(url) = get_s("API_URL").or_else(|| get_s("api_url")) {
            cfg.api_url = url;
        }
        if let Some(level) = get_s("LOG_LEVEL") {
            cfg.log_level = level;
        }
        if let Some(limit) = js_sys::Reflect::get(&env, &"RECENT_NOTES_LIMIT".into())
            .ok()
            .and_then(|v| v.as_f64())
        {
            cfg.recent_notes_limit = parse_limit(limit);
        }

        cfg
    }

    /// Level filter for the log subscriber. Unknown names fall back to `info`.
    pub fn level_filter(&self) -> tracing::level_filters::LevelFilter {
        self.log_level
            .trim()
            .parse()
            .unwrap_or(tracing::level_filters::LevelFilter::INFO)
    }
}

fn parse_limit(raw: f64) -> usize {
    if raw.is_finite() && raw >= 1.0 {
        raw as usize
    } else {
        DEFAULT_RECENT_NOTES_LIMIT
    }
}
