//! Playground configuration.

use std::borrow::Cow;

/// Example program shown before the user has typed anything.
pub const DEFAULT_CODE: &str = r#"
let test_variable = "hello";

print(test_variable + " world");

print(5 + 3 * 2);
"#;

/// Cross-session key holding the editor text.
pub const CODE_STORAGE_KEY: &str = "code";

/// Session key holding the output log.
pub const LOG_STORAGE_KEY: &str = "log";

/// The interpreter's wasm-bindgen JS glue, served from the backend's public folder.
pub const DEFAULT_MODULE_URL: &str = "/_api/public/pkg/rust_lox.js";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaygroundConfig {
    pub module_url: Cow<'static, str>,
    pub code_key: Cow<'static, str>,
    pub log_key: Cow<'static, str>,
    pub default_code: Cow<'static, str>,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            module_url: Cow::Borrowed(DEFAULT_MODULE_URL),
            code_key: Cow::Borrowed(CODE_STORAGE_KEY),
            log_key: Cow::Borrowed(LOG_STORAGE_KEY),
            default_code: Cow::Borrowed(DEFAULT_CODE),
        }
    }
}

impl PlaygroundConfig {
    pub fn with_module_url(mut self, module_url: impl Into<Cow<'static, str>>) -> Self {
        self.module_url = module_url.into();
        self
    }

    pub fn with_code_key(mut self, code_key: impl Into<Cow<'static, str>>) -> Self {
        self.code_key = code_key.into();
        self
    }

    pub fn with_log_key(mut self, log_key: impl Into<Cow<'static, str>>) -> Self {
        self.log_key = log_key.into();
        self
    }

    pub fn with_default_code(mut self, default_code: impl Into<Cow<'static, str>>) -> Self {
        self.default_code = default_code.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_code_is_the_example_program() {
        let config = PlaygroundConfig::default();
        assert!(config.default_code.contains("test_variable"));
        assert_eq!(config.code_key, "code");
        assert_eq!(config.log_key, "log");
    }

    #[test]
    fn builder_overrides_single_fields() {
        let config = PlaygroundConfig::default()
            .with_log_key("tab-log")
            .with_module_url("/pkg/lox.js");
        assert_eq!(config.log_key, "tab-log");
        assert_eq!(config.module_url, "/pkg/lox.js");
        assert_eq!(config.code_key, CODE_STORAGE_KEY);
    }
}
