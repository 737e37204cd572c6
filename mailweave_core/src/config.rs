use std::path::Path;
use std::path::PathBuf;

use lettre::Address;
use lettre::message::Mailbox;

use crate::MailweaveResult;
use crate::literal;
use crate::literal::Literal;

/// Default config file location.
pub const CONFIG_FILE: &str = "./mailweave.cfg";

/// Runtime configuration.
///
/// Constructed once at program start from the defaults and an optional
/// config file, read-only afterwards. Components receive it (or values
/// derived from it) explicitly; there is no ambient configuration state.
///
/// The config file is `key=value` lines. `#`-prefixed comment lines and
/// blank lines are skipped; values use the restricted literal syntax:
///
/// ```text
/// # mailweave configuration
/// host = "smtp.example.com"
/// port = 465
/// username = "jane"
/// domain = "example.com"
/// display_name = "Jane Doe"
/// log_level = "debug"
/// dry_run = true
/// ```
#[derive(Debug, Clone)]
pub struct Config {
	/// SMTP server host name.
	pub host: String,
	/// SMTP server port.
	pub port: u16,
	/// Local part of the sender address.
	pub username: String,
	/// Domain part of the sender address; also scopes generated content
	/// ids.
	pub domain: String,
	/// SMTP password. `None` disables the login step.
	pub password: Option<String>,
	/// Sender display name. Empty means the bare address is used.
	pub display_name: String,
	/// Severity threshold for the diagnostic log sink.
	pub log_level: tracing::Level,
	/// Directory for per-recipient debug dumps; `None` disables them.
	pub debug_dir: Option<PathBuf>,
	/// Simulate sending without talking to the SMTP server.
	pub dry_run: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			host: "smtp.example.com".into(),
			port: 25,
			username: "username".into(),
			domain: "example.com".into(),
			password: None,
			display_name: "Test User".into(),
			log_level: tracing::Level::ERROR,
			debug_dir: Some(PathBuf::from("./output")),
			dry_run: false,
		}
	}
}

/// A loaded config together with the diagnostics produced while loading
/// it. Warnings are returned rather than logged because the log
/// subscriber can only be installed once the configured level is known.
#[derive(Debug)]
pub struct ConfigLoad {
	pub config: Config,
	pub warnings: Vec<String>,
	/// The file the values came from; `None` when it could not be read and
	/// the defaults are in effect.
	pub path: Option<PathBuf>,
}

impl Config {
	/// The sender address, `username@domain`.
	pub fn email(&self) -> String {
		format!("{}@{}", self.username, self.domain)
	}

	/// The sender mailbox: `display_name <username@domain>`, or the bare
	/// address when the display name is empty.
	pub fn from_mailbox(&self) -> MailweaveResult<Mailbox> {
		let address: Address = self.email().parse()?;
		let name = (!self.display_name.is_empty()).then(|| self.display_name.clone());
		Ok(Mailbox::new(name, address))
	}

	/// Load configuration from a `key=value` file.
	///
	/// A missing or unreadable file is not an error: the defaults stay in
	/// effect and a warning is recorded. Unknown keys, invalid literal
	/// values, and type mismatches are warned about and ignored, never
	/// fatal.
	pub fn load(path: &Path) -> ConfigLoad {
		let mut config = Self::default();
		let mut warnings = Vec::new();

		let content = match std::fs::read_to_string(path) {
			Ok(content) => content,
			Err(_) => {
				warnings.push(format!("could not open config file `{}`", path.display()));
				return ConfigLoad {
					config,
					warnings,
					path: None,
				};
			}
		};

		for line in content.lines() {
			let trimmed = line.trim();
			if trimmed.is_empty() || trimmed.starts_with('#') {
				continue;
			}

			let Some((key, raw_value)) = trimmed.split_once('=') else {
				warnings.push(format!("ignoring malformed config line `{trimmed}`"));
				continue;
			};
			let key = key.trim();
			let raw_value = raw_value.trim();

			let value = match literal::parse_literal(raw_value) {
				Ok(value) => value,
				Err(_) => {
					warnings.push(format!("invalid value `{raw_value}` for {key}"));
					continue;
				}
			};

			if let Err(warning) = config.apply(key, value) {
				warnings.push(warning);
			}
		}

		ConfigLoad {
			config,
			warnings,
			path: Some(path.to_path_buf()),
		}
	}

	fn apply(&mut self, key: &str, value: Literal) -> Result<(), String> {
		match key {
			"host" => self.host = expect_str(key, value)?,
			"port" => self.port = expect_port(key, value)?,
			"username" => self.username = expect_str(key, value)?,
			"domain" => self.domain = expect_str(key, value)?,
			"password" => self.password = Some(expect_str(key, value)?),
			"display_name" => self.display_name = expect_str(key, value)?,
			"log_level" => self.log_level = expect_level(key, value)?,
			"debug_dir" => self.debug_dir = Some(PathBuf::from(expect_str(key, value)?)),
			"dry_run" => self.dry_run = expect_bool(key, value)?,
			_ => return Err(format!("unknown config parameter `{key}`")),
		}
		Ok(())
	}
}

fn expect_str(key: &str, value: Literal) -> Result<String, String> {
	match value {
		Literal::Str(value) => Ok(value),
		other => Err(type_mismatch(key, "a string", &other)),
	}
}

fn expect_bool(key: &str, value: Literal) -> Result<bool, String> {
	match value {
		Literal::Bool(value) => Ok(value),
		other => Err(type_mismatch(key, "a boolean", &other)),
	}
}

fn expect_port(key: &str, value: Literal) -> Result<u16, String> {
	match value {
		Literal::Int(value) => {
			u16::try_from(value).map_err(|_| format!("port `{value}` is out of range for {key}"))
		}
		other => Err(type_mismatch(key, "a port number", &other)),
	}
}

fn expect_level(key: &str, value: Literal) -> Result<tracing::Level, String> {
	match value {
		Literal::Str(value) => {
			value.parse().map_err(|_| {
				format!("`{value}` is not a log level (error, warn, info, debug, trace)")
			})
		}
		other => Err(type_mismatch(key, "a log level string", &other)),
	}
}

fn type_mismatch(key: &str, expected: &str, value: &Literal) -> String {
	format!("expected {expected} for `{key}`, got `{value}`")
}
