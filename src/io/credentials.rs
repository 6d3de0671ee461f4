//! WSDB connection credentials.
//!
//! `wsdb.yaml` is a flat mapping of connection parameters, e.g.
//!
//! ```yaml
//! host: wsdb.example.org
//! db: wsdb
//! user: astro
//! password: hunter2
//! ```
//!
//! Every key is passed on as a libpq-style connection parameter; the
//! `postgres` crate decides which ones it understands. `db`, `database`,
//! `username` and `passwd` are accepted as aliases.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::Value;

use crate::error::AppError;

/// Connection parameters as read from the credentials file, values as text.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    params: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key names only; values may be secrets.
        f.debug_struct("Credentials")
            .field("keys", &self.params.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Credentials {
    pub fn from_yaml(text: &str) -> Result<Self, AppError> {
        let raw: BTreeMap<String, Value> = serde_yaml::from_str(text)
            .map_err(|e| AppError::input(format!("Invalid credentials YAML: {e}")))?;

        let mut params = BTreeMap::new();
        for (key, value) in raw {
            let text = scalar_text(&value)
                .ok_or_else(|| AppError::input(format!("Credential '{key}' must be a plain scalar value.")))?;
            params.insert(key, text);
        }
        Ok(Self { params })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Render the parameters as a `key='value' ...` connection string.
    fn conninfo(&self) -> Result<String, AppError> {
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        let mut parts = Vec::with_capacity(self.params.len());

        for (key, value) in &self.params {
            if !is_keyword(key) {
                return Err(AppError::input(format!("Invalid connection parameter name '{key}' in credentials.")));
            }
            let canonical = canonical_key(key);
            if let Some(previous) = seen.insert(canonical, key) {
                return Err(AppError::input(format!(
                    "Credentials give `{canonical}` twice (as '{previous}' and '{key}')."
                )));
            }
            parts.push(format!("{canonical}='{}'", escape_value(value)));
        }
        Ok(parts.join(" "))
    }

    /// Resolve the parameters into a connection configuration.
    pub fn to_pg_config(&self) -> Result<postgres::Config, AppError> {
        if !self.params.contains_key("host") && !self.params.contains_key("hostaddr") {
            return Err(AppError::input("Credentials must specify `host` or `hostaddr`."));
        }
        self.conninfo()?
            .parse::<postgres::Config>()
            .map_err(|e| AppError::input(format!("Invalid connection parameters in credentials: {e}")))
    }
}

/// Read and parse the credentials file.
pub fn load_credentials(path: &Path) -> Result<Credentials, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::input(format!("Failed to read credentials '{}': {e}", path.display()))
    })?;
    Credentials::from_yaml(&text)
        .map_err(|e| AppError::input(format!("{}: {}", path.display(), e.message())))
}

/// Scalars keep the text YAML gave them, so `1.0` stays `1.0`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

fn canonical_key(key: &str) -> &str {
    match key {
        "db" | "database" => "dbname",
        "username" => "user",
        "passwd" => "password",
        other => other,
    }
}

fn is_keyword(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use postgres::config::SslMode;

    use super::*;

    const SAMPLE: &str = "\
host: wsdb.example.org
port: 5432
db: wsdb
user: astro
password: hunter2
";

    #[test]
    fn resolves_known_keys_and_aliases() {
        let creds = Credentials::from_yaml(SAMPLE).unwrap();
        let config = creds.to_pg_config().unwrap();

        assert_eq!(config.get_ports(), &[5432]);
        assert_eq!(config.get_dbname(), Some("wsdb"));
        assert_eq!(config.get_user(), Some("astro"));
        assert_eq!(config.get_password(), Some(&b"hunter2"[..]));
        assert_eq!(config.get_hosts().len(), 1);

        let creds = Credentials::from_yaml("host: db\nusername: astro\npasswd: pw\ndatabase: wsdb\n").unwrap();
        let config = creds.to_pg_config().unwrap();
        assert_eq!(config.get_user(), Some("astro"));
        assert_eq!(config.get_password(), Some(&b"pw"[..]));
        assert_eq!(config.get_dbname(), Some("wsdb"));
    }

    #[test]
    fn numeric_looking_values_are_passed_as_text() {
        let creds = Credentials::from_yaml("host: db\npassword: 12345\nport: \"6543\"\n").unwrap();
        let config = creds.to_pg_config().unwrap();
        assert_eq!(config.get_password(), Some(&b"12345"[..]));
        assert_eq!(config.get_ports(), &[6543]);
    }

    #[test]
    fn float_values_keep_their_decimal_point() {
        let creds = Credentials::from_yaml("host: db\npassword: 1.0\n").unwrap();
        assert_eq!(creds.get("password"), Some("1.0"));
        let config = creds.to_pg_config().unwrap();
        assert_eq!(config.get_password(), Some(&b"1.0"[..]));
    }

    #[test]
    fn quotes_and_backslashes_survive_the_connection_string() {
        let creds = Credentials::from_yaml("host: db\npassword: \"it's a \\\\ pw\"\n").unwrap();
        assert_eq!(creds.get("password"), Some("it's a \\ pw"));
        let config = creds.to_pg_config().unwrap();
        assert_eq!(config.get_password(), Some(&b"it's a \\ pw"[..]));
    }

    #[test]
    fn connect_timeout_in_seconds() {
        let creds = Credentials::from_yaml("host: db\nconnect_timeout: 10\n").unwrap();
        let config = creds.to_pg_config().unwrap();
        assert_eq!(config.get_connect_timeout(), Some(&Duration::from_secs(10)));
    }

    #[test]
    fn other_libpq_parameters_pass_through() {
        let text = "host: db\nsslmode: disable\nkeepalives: 1\ntarget_session_attrs: any\n";
        let config = Credentials::from_yaml(text).unwrap().to_pg_config().unwrap();
        assert_eq!(config.get_ssl_mode(), SslMode::Disable);
        assert!(config.get_keepalives());
    }

    #[test]
    fn rejects_unknown_keys_bad_ports_and_missing_host() {
        let unknown = Credentials::from_yaml("host: db\nfoo: x\n").unwrap();
        assert!(unknown.to_pg_config().unwrap_err().message().contains("foo"));

        let port = Credentials::from_yaml("host: db\nport: 70000\n").unwrap();
        assert!(port.to_pg_config().is_err());

        let no_host = Credentials::from_yaml("db: wsdb\n").unwrap();
        assert!(no_host.to_pg_config().is_err());

        let twice = Credentials::from_yaml("host: db\ndb: a\ndbname: b\n").unwrap();
        assert!(twice.to_pg_config().unwrap_err().message().contains("dbname"));

        let bad_name = Credentials::from_yaml("host: db\n\"user name\": x\n").unwrap();
        assert!(bad_name.to_pg_config().is_err());
    }

    #[test]
    fn non_scalar_values_are_input_errors() {
        let err = Credentials::from_yaml("- host\n- db\n").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);

        let err = Credentials::from_yaml("host: db\npassword:\n").unwrap_err();
        assert!(err.message().contains("password"), "{err}");

        assert!(Credentials::from_yaml("host: [a, b]\n").is_err());
    }

    #[test]
    fn debug_output_hides_values() {
        let creds = Credentials::from_yaml(SAMPLE).unwrap();
        let shown = format!("{creds:?}");
        assert!(shown.contains("password"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wsdb.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        let creds = load_credentials(&path).unwrap();
        assert_eq!(creds.get("db"), Some("wsdb"));
        assert_eq!(creds.keys().count(), 5);
    }
}
