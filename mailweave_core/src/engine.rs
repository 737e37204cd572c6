use std::collections::HashMap;
use std::path::Path;

use lettre::message::Mailbox;

use crate::MailweaveError;
use crate::MailweaveResult;
use crate::contacts::Contact;
use crate::convert::Format;
use crate::stitcher::Stitcher;
use crate::substitute::safe_substitute;

/// The canonical per-format documents produced by one stitching pass.
/// Rendered once per run and shared read-only across recipients; every
/// recipient later gets its own personalized copies.
#[derive(Debug, Clone)]
pub struct RenderedMail {
	pub subject: String,
	pub plain: String,
	pub html: String,
}

/// One recipient's personalized copies of the canonical documents.
#[derive(Debug)]
pub struct PersonalizedMail {
	pub plain: String,
	pub html: String,
}

/// Render the composite body once: apply the global template pass, then
/// stitch the plain and HTML documents and capture the subject.
///
/// The subject line is suppressed from the plain rendering and kept in
/// the HTML one, where it becomes the top-level heading.
pub fn render_body(
	body: &str,
	template_root: &Path,
	globals: &HashMap<String, serde_json::Value>,
) -> MailweaveResult<RenderedMail> {
	let body = render_globals(body, globals)?;
	let mut stitcher = Stitcher::new(body, template_root);

	let plain = stitcher.stitch(Format::Plain, true)?;
	let html = stitcher.stitch(Format::Html, false)?;
	let subject = match stitcher.subject() {
		Some(subject) => subject.to_string(),
		None => {
			tracing::warn!("no subject line found in the mail body");
			String::new()
		}
	};

	Ok(RenderedMail {
		subject,
		plain,
		html,
	})
}

/// The global variables interpolated into the composite body before
/// stitching. Per-recipient values are deliberately absent: they flow
/// through the `$KEY` substitution so the canonical documents stay
/// shared.
pub fn global_context(
	from_mailbox: &Mailbox,
	sender: &str,
) -> HashMap<String, serde_json::Value> {
	HashMap::from([
		(
			"FROM".to_string(),
			serde_json::Value::String(from_mailbox.to_string()),
		),
		(
			"SENDER".to_string(),
			serde_json::Value::String(sender.to_string()),
		),
	])
}

/// Render the composite body through minijinja using the global variable
/// context. If the context is empty or the body has no template syntax,
/// returns the body unchanged.
pub fn render_globals(
	body: &str,
	globals: &HashMap<String, serde_json::Value>,
) -> MailweaveResult<String> {
	if globals.is_empty() || !has_template_syntax(body) {
		return Ok(body.to_string());
	}

	let mut env = minijinja::Environment::new();
	env.set_keep_trailing_newline(true);
	env.set_undefined_behavior(minijinja::UndefinedBehavior::Chainable);
	env.add_template("__body__", body)
		.map_err(|e| MailweaveError::TemplateRender(e.to_string()))?;

	let template = env
		.get_template("__body__")
		.map_err(|e| MailweaveError::TemplateRender(e.to_string()))?;

	let ctx = minijinja::Value::from_serialize(globals);
	template
		.render(ctx)
		.map_err(|e| MailweaveError::TemplateRender(e.to_string()))
}

/// Check whether content contains minijinja template syntax.
fn has_template_syntax(content: &str) -> bool {
	content.contains("{{") || content.contains("{%") || content.contains("{#")
}

/// Build one recipient's substitution mapping: the global variables
/// first, then the contact's own fields layered last so they win on key
/// collision.
pub fn merge_vars(
	from_mailbox: &Mailbox,
	sender: &str,
	subject: &str,
	contact: &Contact,
) -> HashMap<String, String> {
	let mut vars = HashMap::new();
	vars.insert("FROM".to_string(), from_mailbox.to_string());
	vars.insert("TO".to_string(), contact.mailbox().to_string());
	vars.insert("SENDER".to_string(), sender.to_string());
	vars.insert("SUBJECT".to_string(), subject.to_string());

	for (key, value) in contact.fields() {
		vars.insert(key.clone(), value.clone());
	}

	vars
}

/// Substitute one recipient's variables into the canonical documents.
/// Substitution is total: placeholders missing from the mapping stay
/// literal in the output.
pub fn personalize(mail: &RenderedMail, vars: &HashMap<String, String>) -> PersonalizedMail {
	PersonalizedMail {
		plain: safe_substitute(&mail.plain, vars),
		html: safe_substitute(&mail.html, vars),
	}
}
