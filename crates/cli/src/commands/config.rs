use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use showroom_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key: &'static str,
    env_key: &'static str,
    value: String,
}

impl Field {
    fn new(key: &'static str, env_key: &'static str, value: impl Into<String>) -> Self {
        Self { key, env_key, value: value.into() }
    }
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_key,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    let path = |path: &Path| path.display().to_string();

    vec![
        Field::new("database.url", "SHOWROOM_DATABASE_URL", &config.database.url),
        Field::new(
            "database.max_connections",
            "SHOWROOM_DATABASE_MAX_CONNECTIONS",
            config.database.max_connections.to_string(),
        ),
        Field::new(
            "database.timeout_secs",
            "SHOWROOM_DATABASE_TIMEOUT_SECS",
            config.database.timeout_secs.to_string(),
        ),
        Field::new("server.bind_address", "SHOWROOM_SERVER_BIND_ADDRESS", &config.server.bind_address),
        Field::new("server.port", "SHOWROOM_SERVER_PORT", config.server.port.to_string()),
        Field::new(
            "server.public_base_url",
            "SHOWROOM_SERVER_PUBLIC_BASE_URL",
            config.server.public_base_url(),
        ),
        Field::new("catalog.index_path", "SHOWROOM_CATALOG_INDEX_PATH", path(&config.catalog.index_path)),
        Field::new("catalog.upload_dir", "SHOWROOM_CATALOG_UPLOAD_DIR", path(&config.catalog.upload_dir)),
        Field::new(
            "catalog.known_brands",
            "SHOWROOM_CATALOG_KNOWN_BRANDS",
            config.catalog.known_brands.join(","),
        ),
        Field::new(
            "catalog.browse_limit",
            "SHOWROOM_CATALOG_BROWSE_LIMIT",
            config.catalog.browse_limit.to_string(),
        ),
        Field::new(
            "documents.output_dir",
            "SHOWROOM_DOCUMENTS_OUTPUT_DIR",
            path(&config.documents.output_dir),
        ),
        Field::new(
            "documents.template_dir",
            "SHOWROOM_DOCUMENTS_TEMPLATE_DIR",
            path(&config.documents.template_dir),
        ),
        Field::new(
            "documents.quote_prefix",
            "SHOWROOM_DOCUMENTS_QUOTE_PREFIX",
            &config.documents.quote_prefix,
        ),
        Field::new("company.name", "SHOWROOM_COMPANY_NAME", &config.company.name),
        Field::new(
            "company.country_code",
            "SHOWROOM_COMPANY_COUNTRY_CODE",
            &config.company.country_code,
        ),
        Field::new("whatsapp.token", "SHOWROOM_WHATSAPP_TOKEN", redact_secret(config.whatsapp.token.as_ref())),
        Field::new(
            "whatsapp.phone_number_id",
            "SHOWROOM_WHATSAPP_PHONE_NUMBER_ID",
            config.whatsapp.phone_number_id.as_deref().unwrap_or("<unset>"),
        ),
        Field::new(
            "whatsapp.api_base_url",
            "SHOWROOM_WHATSAPP_API_BASE_URL",
            &config.whatsapp.api_base_url,
        ),
        Field::new("smtp.host", "SHOWROOM_SMTP_HOST", config.smtp.host.as_deref().unwrap_or("<unset>")),
        Field::new("smtp.port", "SHOWROOM_SMTP_PORT", config.smtp.port.to_string()),
        Field::new(
            "smtp.username",
            "SHOWROOM_SMTP_USERNAME",
            config.smtp.username.as_deref().unwrap_or("<unset>"),
        ),
        Field::new("smtp.password", "SHOWROOM_SMTP_PASSWORD", redact_secret(config.smtp.password.as_ref())),
        Field::new("smtp.from", "SHOWROOM_SMTP_FROM", config.smtp.from.as_deref().unwrap_or("<unset>")),
        Field::new("smtp.security", "SHOWROOM_SMTP_SECURITY", format!("{:?}", config.smtp.security)),
        Field::new("logging.level", "SHOWROOM_LOGGING_LEVEL", &config.logging.level),
        Field::new(
            "logging.format",
            "SHOWROOM_LOGGING_FORMAT",
            format!("{:?}", config.logging.format),
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("showroom.toml"), PathBuf::from("config/showroom.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> &'static str {
    match secret {
        None => "<unset>",
        Some(secret) if secret.expose_secret().trim().is_empty() => "<empty>",
        Some(_) => "<redacted>",
    }
}
