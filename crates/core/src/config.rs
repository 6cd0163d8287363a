use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::share::CompanyProfile;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub documents: DocumentsConfig,
    pub company: CompanyProfile,
    pub whatsapp: WhatsAppConfig,
    pub smtp: SmtpConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    /// Prefix for document links handed to customers. Defaults to the bind
    /// address when unset.
    pub public_base_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub index_path: PathBuf,
    pub upload_dir: PathBuf,
    pub known_brands: Vec<String>,
    pub browse_limit: usize,
}

#[derive(Clone, Debug)]
pub struct DocumentsConfig {
    pub output_dir: PathBuf,
    pub template_dir: PathBuf,
    pub quote_prefix: String,
}

#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub token: Option<SecretString>,
    pub phone_number_id: Option<String>,
    pub api_base_url: String,
    pub timeout_secs: u64,
}

/// Outgoing mail for quotation emails. Unset `host` disables sending.
#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Sender mailbox; falls back to `username`.
    pub from: Option<String>,
    pub security: SmtpSecurity,
    pub timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS.
    Starttls,
    /// Implicit TLS from the first byte.
    Tls,
    /// No encryption; local relays only.
    Plain,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub public_base_url: Option<String>,
    pub catalog_index_path: Option<PathBuf>,
    pub documents_output_dir: Option<PathBuf>,
    pub whatsapp_token: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://showroom.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
                public_base_url: None,
            },
            catalog: CatalogConfig {
                index_path: PathBuf::from("data/catalog.json"),
                upload_dir: PathBuf::from("data/uploads"),
                known_brands: vec!["Kohler".to_string(), "Aquant".to_string()],
                browse_limit: 500,
            },
            documents: DocumentsConfig {
                output_dir: PathBuf::from("static"),
                template_dir: PathBuf::from("templates"),
                quote_prefix: "SC".to_string(),
            },
            company: CompanyProfile::default(),
            whatsapp: WhatsAppConfig {
                token: None,
                phone_number_id: None,
                api_base_url: "https://graph.facebook.com/v20.0".to_string(),
                timeout_secs: 30,
            },
            smtp: SmtpConfig {
                host: None,
                port: 587,
                username: None,
                password: None,
                from: None,
                security: SmtpSecurity::Starttls,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl std::str::FromStr for SmtpSecurity {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "starttls" => Ok(Self::Starttls),
            "tls" | "ssl" => Ok(Self::Tls),
            "plain" | "none" => Ok(Self::Plain),
            other => Err(ConfigError::Validation(format!(
                "unsupported smtp security `{other}` (expected starttls|tls|plain)"
            ))),
        }
    }
}

impl ServerConfig {
    pub fn public_base_url(&self) -> String {
        match &self.public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.bind_address, self.port),
        }
    }
}

impl WhatsAppConfig {
    /// Cloud API credentials, when both halves are present.
    pub fn credentials(&self) -> Option<(&SecretString, &str)> {
        let token = self.token.as_ref().filter(|token| !token.expose_secret().trim().is_empty())?;
        let phone_number_id =
            self.phone_number_id.as_deref().map(str::trim).filter(|id| !id.is_empty())?;
        Some((token, phone_number_id))
    }
}

impl SmtpConfig {
    /// Relay host and sender mailbox, when mail can be sent at all.
    pub fn relay(&self) -> Option<(&str, &str)> {
        let host = self.host.as_deref().map(str::trim).filter(|host| !host.is_empty())?;
        let from = self
            .from
            .as_deref()
            .or(self.username.as_deref())
            .map(str::trim)
            .filter(|from| !from.is_empty())?;
        Some((host, from))
    }

    /// Login pair, used only when both halves are present.
    pub fn login(&self) -> Option<(&str, &SecretString)> {
        let username = self.username.as_deref().map(str::trim).filter(|name| !name.is_empty())?;
        let password =
            self.password.as_ref().filter(|password| !password.expose_secret().is_empty())?;
        Some((username, password))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("showroom.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(public_base_url) = server.public_base_url {
                self.server.public_base_url = Some(public_base_url);
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(index_path) = catalog.index_path {
                self.catalog.index_path = index_path;
            }
            if let Some(upload_dir) = catalog.upload_dir {
                self.catalog.upload_dir = upload_dir;
            }
            if let Some(known_brands) = catalog.known_brands {
                self.catalog.known_brands = known_brands;
            }
            if let Some(browse_limit) = catalog.browse_limit {
                self.catalog.browse_limit = browse_limit;
            }
        }

        if let Some(documents) = patch.documents {
            if let Some(output_dir) = documents.output_dir {
                self.documents.output_dir = output_dir;
            }
            if let Some(template_dir) = documents.template_dir {
                self.documents.template_dir = template_dir;
            }
            if let Some(quote_prefix) = documents.quote_prefix {
                self.documents.quote_prefix = quote_prefix;
            }
        }

        if let Some(company) = patch.company {
            if let Some(name) = company.name {
                self.company.name = name;
            }
            if let Some(tagline) = company.tagline {
                self.company.tagline = tagline;
            }
            if let Some(phone) = company.phone {
                self.company.phone = phone;
            }
            if let Some(email) = company.email {
                self.company.email = email;
            }
            if let Some(website) = company.website {
                self.company.website = website;
            }
            if let Some(country_code) = company.country_code {
                self.company.country_code = country_code;
            }
        }

        if let Some(whatsapp) = patch.whatsapp {
            if let Some(whatsapp_token_value) = whatsapp.token {
                self.whatsapp.token = Some(secret_value(whatsapp_token_value));
            }
            if let Some(phone_number_id) = whatsapp.phone_number_id {
                self.whatsapp.phone_number_id = Some(phone_number_id);
            }
            if let Some(api_base_url) = whatsapp.api_base_url {
                self.whatsapp.api_base_url = api_base_url;
            }
            if let Some(timeout_secs) = whatsapp.timeout_secs {
                self.whatsapp.timeout_secs = timeout_secs;
            }
        }

        if let Some(smtp) = patch.smtp {
            if let Some(host) = smtp.host {
                self.smtp.host = Some(host);
            }
            if let Some(port) = smtp.port {
                self.smtp.port = port;
            }
            if let Some(username) = smtp.username {
                self.smtp.username = Some(username);
            }
            if let Some(smtp_password_value) = smtp.password {
                self.smtp.password = Some(secret_value(smtp_password_value));
            }
            if let Some(from) = smtp.from {
                self.smtp.from = Some(from);
            }
            if let Some(security) = smtp.security {
                self.smtp.security = security;
            }
            if let Some(timeout_secs) = smtp.timeout_secs {
                self.smtp.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SHOWROOM_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("SHOWROOM_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_number("SHOWROOM_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("SHOWROOM_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_number("SHOWROOM_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SHOWROOM_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SHOWROOM_SERVER_PORT") {
            self.server.port = parse_number("SHOWROOM_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SHOWROOM_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_number("SHOWROOM_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("SHOWROOM_SERVER_PUBLIC_BASE_URL") {
            self.server.public_base_url = Some(value);
        }

        if let Some(value) = read_env("SHOWROOM_CATALOG_INDEX_PATH") {
            self.catalog.index_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("SHOWROOM_CATALOG_UPLOAD_DIR") {
            self.catalog.upload_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SHOWROOM_CATALOG_KNOWN_BRANDS") {
            self.catalog.known_brands = value
                .split(',')
                .map(str::trim)
                .filter(|brand| !brand.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = read_env("SHOWROOM_CATALOG_BROWSE_LIMIT") {
            self.catalog.browse_limit = parse_number("SHOWROOM_CATALOG_BROWSE_LIMIT", &value)?;
        }

        if let Some(value) = read_env("SHOWROOM_DOCUMENTS_OUTPUT_DIR") {
            self.documents.output_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SHOWROOM_DOCUMENTS_TEMPLATE_DIR") {
            self.documents.template_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SHOWROOM_DOCUMENTS_QUOTE_PREFIX") {
            self.documents.quote_prefix = value;
        }

        if let Some(value) = read_env("SHOWROOM_COMPANY_NAME") {
            self.company.name = value;
        }
        if let Some(value) = read_env("SHOWROOM_COMPANY_TAGLINE") {
            self.company.tagline = value;
        }
        if let Some(value) = read_env("SHOWROOM_COMPANY_PHONE") {
            self.company.phone = value;
        }
        if let Some(value) = read_env("SHOWROOM_COMPANY_EMAIL") {
            self.company.email = value;
        }
        if let Some(value) = read_env("SHOWROOM_COMPANY_WEBSITE") {
            self.company.website = value;
        }
        if let Some(value) = read_env("SHOWROOM_COMPANY_COUNTRY_CODE") {
            self.company.country_code = value;
        }

        if let Some(value) = read_env("SHOWROOM_WHATSAPP_TOKEN") {
            self.whatsapp.token = Some(secret_value(value));
        }
        if let Some(value) = read_env("SHOWROOM_WHATSAPP_PHONE_NUMBER_ID") {
            self.whatsapp.phone_number_id = Some(value);
        }
        if let Some(value) = read_env("SHOWROOM_WHATSAPP_API_BASE_URL") {
            self.whatsapp.api_base_url = value;
        }
        if let Some(value) = read_env("SHOWROOM_WHATSAPP_TIMEOUT_SECS") {
            self.whatsapp.timeout_secs = parse_number("SHOWROOM_WHATSAPP_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SHOWROOM_SMTP_HOST") {
            self.smtp.host = Some(value);
        }
        if let Some(value) = read_env("SHOWROOM_SMTP_PORT") {
            self.smtp.port = parse_number("SHOWROOM_SMTP_PORT", &value)?;
        }
        if let Some(value) = read_env("SHOWROOM_SMTP_USERNAME") {
            self.smtp.username = Some(value);
        }
        if let Some(value) = read_env("SHOWROOM_SMTP_PASSWORD") {
            self.smtp.password = Some(secret_value(value));
        }
        if let Some(value) = read_env("SHOWROOM_SMTP_FROM") {
            self.smtp.from = Some(value);
        }
        if let Some(value) = read_env("SHOWROOM_SMTP_SECURITY") {
            self.smtp.security = value.parse()?;
        }
        if let Some(value) = read_env("SHOWROOM_SMTP_TIMEOUT_SECS") {
            self.smtp.timeout_secs = parse_number("SHOWROOM_SMTP_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("SHOWROOM_LOGGING_LEVEL").or_else(|| read_env("SHOWROOM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SHOWROOM_LOGGING_FORMAT").or_else(|| read_env("SHOWROOM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(public_base_url) = overrides.public_base_url {
            self.server.public_base_url = Some(public_base_url);
        }
        if let Some(index_path) = overrides.catalog_index_path {
            self.catalog.index_path = index_path;
        }
        if let Some(output_dir) = overrides.documents_output_dir {
            self.documents.output_dir = output_dir;
        }
        if let Some(whatsapp_token) = overrides.whatsapp_token {
            self.whatsapp.token = Some(secret_value(whatsapp_token));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_catalog(&self.catalog)?;
        validate_documents(&self.documents)?;
        validate_company(&self.company)?;
        validate_whatsapp(&self.whatsapp)?;
        validate_smtp(&self.smtp)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("showroom.toml"), PathBuf::from("config/showroom.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    if let Some(base_url) = &server.public_base_url {
        if !is_http_url(base_url) {
            return Err(ConfigError::Validation(
                "server.public_base_url must start with http:// or https://".to_string(),
            ));
        }
        // Document links are returned in response headers.
        if !base_url.chars().all(|ch| ch.is_ascii_graphic()) {
            return Err(ConfigError::Validation(
                "server.public_base_url must be plain ASCII without spaces; percent-encode anything else"
                    .to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.browse_limit == 0 {
        return Err(ConfigError::Validation(
            "catalog.browse_limit must be greater than zero".to_string(),
        ));
    }

    if catalog.known_brands.iter().any(|brand| brand.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "catalog.known_brands must not contain blank entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_documents(documents: &DocumentsConfig) -> Result<(), ConfigError> {
    let prefix = documents.quote_prefix.trim();
    if prefix.is_empty() || !prefix.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(
            "documents.quote_prefix must be a non-empty alphanumeric label such as `SC`"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_company(company: &CompanyProfile) -> Result<(), ConfigError> {
    if company.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "company.name is required; it heads every quotation and share message".to_string(),
        ));
    }

    let code = company.country_code.trim();
    if code.is_empty() || code.len() > 3 || !code.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ConfigError::Validation(
            "company.country_code must be 1-3 digits without `+` (e.g. `91`)".to_string(),
        ));
    }

    Ok(())
}

fn validate_whatsapp(whatsapp: &WhatsAppConfig) -> Result<(), ConfigError> {
    if !is_http_url(&whatsapp.api_base_url) {
        return Err(ConfigError::Validation(
            "whatsapp.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    if whatsapp.timeout_secs == 0 || whatsapp.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "whatsapp.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    let has_token =
        whatsapp.token.as_ref().map(|token| !token.expose_secret().trim().is_empty()).unwrap_or(false);
    let has_phone_id =
        whatsapp.phone_number_id.as_ref().map(|id| !id.trim().is_empty()).unwrap_or(false);
    if has_token && !has_phone_id {
        return Err(ConfigError::Validation(
            "whatsapp.phone_number_id is required when whatsapp.token is set. Find it in Meta for Developers > WhatsApp > API Setup".to_string(),
        ));
    }

    Ok(())
}

fn validate_smtp(smtp: &SmtpConfig) -> Result<(), ConfigError> {
    let has_host = smtp.host.as_deref().is_some_and(|host| !host.trim().is_empty());
    if !has_host {
        return Ok(());
    }

    if smtp.port == 0 {
        return Err(ConfigError::Validation("smtp.port must be greater than zero".to_string()));
    }

    if smtp.timeout_secs == 0 || smtp.timeout_secs > 120 {
        return Err(ConfigError::Validation("smtp.timeout_secs must be in range 1..=120".to_string()));
    }

    if smtp.relay().is_none() {
        return Err(ConfigError::Validation(
            "smtp.from (or smtp.username) is required when smtp.host is set".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    catalog: Option<CatalogPatch>,
    documents: Option<DocumentsPatch>,
    company: Option<CompanyPatch>,
    whatsapp: Option<WhatsAppPatch>,
    smtp: Option<SmtpPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    public_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    index_path: Option<PathBuf>,
    upload_dir: Option<PathBuf>,
    known_brands: Option<Vec<String>>,
    browse_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentsPatch {
    output_dir: Option<PathBuf>,
    template_dir: Option<PathBuf>,
    quote_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CompanyPatch {
    name: Option<String>,
    tagline: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    website: Option<String>,
    country_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WhatsAppPatch {
    token: Option<String>,
    phone_number_id: Option<String>,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SmtpPatch {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    from: Option<String>,
    security: Option<SmtpSecurity>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
