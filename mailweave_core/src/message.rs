use lettre::Message;
use lettre::message::Attachment;
use lettre::message::Mailbox;
use lettre::message::MultiPart;
use lettre::message::SinglePart;
use lettre::message::header::ContentType;

use crate::MailweaveError;
use crate::MailweaveResult;
use crate::inline::CidResource;

/// One recipient's outgoing message: sender, recipient, subject, the
/// plain-text body, and optionally an HTML alternative with its inline
/// resources.
///
/// The MIME structure is assembled lazily by [`OutgoingEmail::build`]:
/// `multipart/alternative` holding the plain part and a
/// `multipart/related` that carries the HTML together with one inline
/// attachment per resource.
#[derive(Debug)]
pub struct OutgoingEmail {
	from: Mailbox,
	to: Mailbox,
	subject: String,
	text: String,
	html: Option<HtmlContent>,
}

#[derive(Debug)]
struct HtmlContent {
	body: String,
	resources: Vec<CidResource>,
}

impl OutgoingEmail {
	pub fn new(from: Mailbox, to: Mailbox, subject: impl Into<String>, text: impl Into<String>) -> Self {
		Self {
			from,
			to,
			subject: subject.into(),
			text: text.into(),
			html: None,
		}
	}

	/// Attach the HTML alternative together with the inline resources its
	/// `cid:` references point at.
	pub fn set_html_content(&mut self, body: impl Into<String>, resources: Vec<CidResource>) {
		self.html = Some(HtmlContent {
			body: body.into(),
			resources,
		});
	}

	pub fn from_mailbox(&self) -> &Mailbox {
		&self.from
	}

	pub fn to_mailbox(&self) -> &Mailbox {
		&self.to
	}

	/// Domain of the sender address. Content ids minted for this message
	/// are scoped to it.
	pub fn domain(&self) -> &str {
		self.from.email.domain()
	}

	/// Assemble the MIME message.
	///
	/// Resource payloads are read here. A resource file that has become
	/// unreadable since the inlining step is a hard error for this
	/// message: its existence was already checked, so a failure now is a
	/// race worth surfacing, not a broken link to skip.
	pub fn build(&self) -> MailweaveResult<Message> {
		let builder = Message::builder()
			.from(self.from.clone())
			.to(self.to.clone())
			.subject(self.subject.clone());

		let Some(html) = &self.html else {
			let message = builder
				.header(ContentType::TEXT_PLAIN)
				.body(self.text.clone())?;
			return Ok(message);
		};

		let mut related = MultiPart::related().singlepart(
			SinglePart::builder()
				.header(ContentType::TEXT_HTML)
				.body(html.body.clone()),
		);

		for resource in &html.resources {
			let payload = std::fs::read(&resource.path).map_err(|error| {
				MailweaveError::InlineImage {
					path: resource.path.display().to_string(),
					reason: error.to_string(),
				}
			})?;

			let mime = mime_guess::from_path(&resource.path).first_or_octet_stream();
			let content_type = ContentType::parse(mime.as_ref()).map_err(|error| {
				MailweaveError::InlineImage {
					path: resource.path.display().to_string(),
					reason: format!("unusable content type: {error}"),
				}
			})?;

			related = related
				.singlepart(Attachment::new_inline(resource.cid.clone()).body(payload, content_type));
		}

		let alternative = MultiPart::alternative()
			.singlepart(
				SinglePart::builder()
					.header(ContentType::TEXT_PLAIN)
					.body(self.text.clone()),
			)
			.multipart(related);

		Ok(builder.multipart(alternative)?)
	}

	/// The RFC 5322 bytes of the assembled message, for debug dumps.
	pub fn formatted(&self) -> MailweaveResult<Vec<u8>> {
		Ok(self.build()?.formatted())
	}
}
