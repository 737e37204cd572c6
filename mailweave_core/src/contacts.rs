use std::collections::HashMap;
use std::path::Path;

use lettre::Address;
use lettre::message::Mailbox;

use crate::MailweaveResult;

/// One validated contact row.
///
/// Field names come from the CSV header; values are stored trimmed. The
/// `EMAIL` field is parsed eagerly, so every loaded contact carries a
/// valid address. Missing-field handling is explicit: the typed accessors
/// return `None` for absent or empty fields instead of relying on bare
/// map lookups.
#[derive(Debug, Clone)]
pub struct Contact {
	address: Address,
	fields: HashMap<String, String>,
}

impl Contact {
	/// Validate one raw row. Returns `None` (with a warning) when the
	/// `EMAIL` field is missing, empty, or not a valid address.
	pub fn parse(row: HashMap<String, String>) -> Option<Self> {
		let fields: HashMap<String, String> = row
			.into_iter()
			.map(|(key, value)| (key, value.trim().to_string()))
			.collect();

		let Some(email) = fields.get("EMAIL").filter(|value| !value.is_empty()) else {
			tracing::warn!("no e-mail found in contact data");
			return None;
		};

		match email.parse::<Address>() {
			Ok(address) => Some(Self { address, fields }),
			Err(error) => {
				tracing::warn!("the e-mail address `{email}` is not valid: {error}");
				None
			}
		}
	}

	fn field(&self, key: &str) -> Option<&str> {
		self.fields
			.get(key)
			.map(String::as_str)
			.filter(|value| !value.is_empty())
	}

	pub fn email(&self) -> &str {
		self.field("EMAIL").unwrap_or_default()
	}

	pub fn name(&self) -> Option<&str> {
		self.field("NAME")
	}

	pub fn firstname(&self) -> Option<&str> {
		self.field("FIRSTNAME")
	}

	/// All raw fields, for layering into the per-recipient variable
	/// mapping.
	pub fn fields(&self) -> &HashMap<String, String> {
		&self.fields
	}

	/// `"FIRSTNAME NAME"`, trimmed down to whichever parts are present.
	pub fn display_name(&self) -> String {
		let mut display = String::new();

		if let Some(firstname) = self.firstname() {
			display.push_str(firstname);
		}
		if let Some(name) = self.name() {
			if !display.is_empty() {
				display.push(' ');
			}
			display.push_str(name);
		}

		display
	}

	/// The recipient mailbox: `FIRSTNAME NAME <email>`, or the bare
	/// address when no name fields are set.
	pub fn mailbox(&self) -> Mailbox {
		let display = self.display_name();
		let name = (!display.is_empty()).then_some(display);
		Mailbox::new(name, self.address.clone())
	}
}

impl std::fmt::Display for Contact {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.mailbox())
	}
}

/// Load and validate contacts from a CSV file with a header row. Rows that
/// fail validation are warned about and excluded. The order of the
/// remaining rows is preserved; messages are later dispatched in exactly
/// this order.
pub fn load_contacts(path: &Path) -> MailweaveResult<Vec<Contact>> {
	let mut reader = csv::Reader::from_path(path)?;
	let mut contacts = Vec::new();

	for row in reader.deserialize::<HashMap<String, String>>() {
		let Some(contact) = Contact::parse(row?) else {
			continue;
		};
		tracing::debug!("found contact: {contact}");
		contacts.push(contact);
	}

	Ok(contacts)
}
