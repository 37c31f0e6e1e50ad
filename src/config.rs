//! Cloud Provider Configuration
//!
//! Parses the cloud-config file handed to the provider by the orchestrator.
//! The file uses a git-config style layout with a single `[global]` section:
//!
//! ```text
//! [global]
//! api-url = https://cloud.example.com/client/api
//! api-key = "..."
//! secret-key = "..."
//! ssl-no-verify = false
//! project-id = 1c6b0ba4-...
//! zone = zone-1
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// The only section the provider understands
const GLOBAL_SECTION: &str = "global";

/// Errors raised while reading the cloud-config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read config: {0}")]
    Read(#[source] io::Error),

    #[error("line {line}: {kind}")]
    Syntax { line: usize, kind: SyntaxError },
}

/// What was wrong with a particular line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("invalid section header")]
    InvalidHeader,

    #[error("invalid section: {0}")]
    UnknownSection(String),

    #[error("invalid variable: {0}")]
    UnknownKey(String),

    #[error("variable {0} is not inside a section")]
    OutsideSection(String),

    #[error("missing variable name")]
    MissingKey,

    #[error("variable {0} requires a value")]
    MissingValue(String),

    #[error("invalid boolean value: {0}")]
    InvalidBool(String),

    #[error("invalid escape sequence: \\{0}")]
    InvalidEscape(char),

    #[error("unterminated quoted value")]
    UnterminatedQuote,
}

/// Provider settings loaded from the `[global]` section
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// CloudStack API endpoint, e.g. `https://cloud.example.com/client/api`
    pub api_url: String,
    pub api_key: String,
    pub secret_key: String,
    /// Disable TLS certificate verification for the API endpoint
    pub ssl_no_verify: bool,
    /// Scope all lookups to this project
    pub project_id: Option<String>,
    /// Zone to report instead of resolving it from the local host
    pub zone: Option<String>,
}

// Credentials stay out of logs and error reports.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("ssl_no_verify", &self.ssl_no_verify)
            .field("project_id", &self.project_id)
            .field("zone", &self.zone)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

impl Settings {
    /// Load settings from an optional config file path.
    ///
    /// No path yields empty settings, which leaves the provider without a client.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let file = File::open(path).map_err(|source| ConfigError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("Reading cloud config from {:?}", path);
        Self::from_reader(Some(file))
    }

    /// Parse settings from an optional stream
    pub fn from_reader<R: Read>(config: Option<R>) -> Result<Self, ConfigError> {
        let Some(mut reader) = config else {
            return Ok(Self::default());
        };

        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(ConfigError::Read)?;

        content.parse()
    }

    /// True when endpoint, key and secret are all present
    pub fn has_credentials(&self) -> bool {
        !self.api_url.is_empty() && !self.api_key.is_empty() && !self.secret_key.is_empty()
    }

    fn assign(&mut self, key: &str, value: Option<String>) -> Result<(), SyntaxError> {
        match key {
            "api-url" => self.api_url = require(key, value)?,
            "api-key" => self.api_key = require(key, value)?,
            "secret-key" => self.secret_key = require(key, value)?,
            "ssl-no-verify" => self.ssl_no_verify = parse_bool(value.as_deref())?,
            "project-id" => self.project_id = non_empty(require(key, value)?),
            "zone" => self.zone = non_empty(require(key, value)?),
            other => return Err(SyntaxError::UnknownKey(other.to_string())),
        }
        Ok(())
    }
}

impl std::str::FromStr for Settings {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let mut settings = Settings::default();
        let mut section: Option<String> = None;

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            let syntax = |kind| ConfigError::Syntax {
                line: index + 1,
                kind,
            };

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                section = Some(parse_header(header).map_err(syntax)?);
                continue;
            }

            let (key, value) = match line.split_once('=') {
                Some((key, value)) => (key.trim(), Some(parse_value(value).map_err(syntax)?)),
                None => (strip_comment(line).trim(), None),
            };

            if key.is_empty() {
                return Err(syntax(SyntaxError::MissingKey));
            }
            let key = key.to_ascii_lowercase();

            if section.is_none() {
                return Err(syntax(SyntaxError::OutsideSection(key)));
            }

            settings.assign(&key, value).map_err(syntax)?;
        }

        Ok(settings)
    }
}

/// Parse what follows the opening `[` of a section header
fn parse_header(header: &str) -> Result<String, SyntaxError> {
    let (name, rest) = header.split_once(']').ok_or(SyntaxError::InvalidHeader)?;
    let rest = rest.trim();
    if !rest.is_empty() && !rest.starts_with(';') && !rest.starts_with('#') {
        return Err(SyntaxError::InvalidHeader);
    }

    let name = name.trim().to_ascii_lowercase();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(SyntaxError::InvalidHeader);
    }

    if name != GLOBAL_SECTION {
        return Err(SyntaxError::UnknownSection(name));
    }

    Ok(name)
}

/// Parse the right-hand side of `key = value`.
///
/// Double quotes group text (and protect comment characters), backslash
/// escapes are honoured anywhere, unquoted surrounding whitespace is dropped.
fn parse_value(raw: &str) -> Result<String, SyntaxError> {
    let mut value = String::new();
    // Length of `value` that survives trailing-whitespace trimming
    let mut keep = 0;
    let mut quoted = false;
    let mut chars = raw.trim_start().chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                keep = value.len();
            }
            '\\' => {
                let escaped = match chars.next() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('b') => '\u{8}',
                    Some('"') => '"',
                    Some('\\') => '\\',
                    Some(other) => return Err(SyntaxError::InvalidEscape(other)),
                    None => return Err(SyntaxError::InvalidEscape(' ')),
                };
                value.push(escaped);
                keep = value.len();
            }
            ';' | '#' if !quoted => break,
            c => {
                value.push(c);
                if quoted || !c.is_whitespace() {
                    keep = value.len();
                }
            }
        }
    }

    if quoted {
        return Err(SyntaxError::UnterminatedQuote);
    }

    value.truncate(keep);
    Ok(value)
}

fn strip_comment(line: &str) -> &str {
    line.split(|c: char| c == ';' || c == '#').next().unwrap_or(line)
}

fn require(key: &str, value: Option<String>) -> Result<String, SyntaxError> {
    value.ok_or_else(|| SyntaxError::MissingValue(key.to_string()))
}

/// git-config booleans; a bare variable means true, an empty value false
fn parse_bool(value: Option<&str>) -> Result<bool, SyntaxError> {
    let Some(value) = value else {
        return Ok(true);
    };

    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        _ => Err(SyntaxError::InvalidBool(value.to_string())),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
