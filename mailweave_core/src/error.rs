use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MailweaveError {
	#[error(transparent)]
	#[diagnostic(code(mailweave::io_error))]
	Io(#[from] std::io::Error),

	#[error("failure to convert markdown: {0}")]
	#[diagnostic(code(mailweave::markdown))]
	Markdown(String),

	#[error("invalid literal syntax: {0}")]
	#[diagnostic(
		code(mailweave::literal_syntax),
		help("values are restricted to numbers, strings, booleans, and lists of those")
	)]
	LiteralSyntax(String),

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(mailweave::template_render))]
	TemplateRender(String),

	#[error("invalid mail address: {0}")]
	#[diagnostic(code(mailweave::address))]
	Address(#[from] lettre::address::AddressError),

	#[error("failed to assemble message: {0}")]
	#[diagnostic(code(mailweave::message))]
	Message(#[from] lettre::error::Error),

	#[error("failed to read contacts: {0}")]
	#[diagnostic(
		code(mailweave::contacts),
		help("the contacts file must be CSV with a header row naming the fields")
	)]
	Contacts(#[from] csv::Error),

	#[error("failed to read inline image `{path}`: {reason}")]
	#[diagnostic(
		code(mailweave::inline_image),
		help(
			"the image existed when the document was stitched; it must stay readable until the \
			 message is assembled"
		)
	)]
	InlineImage { path: String, reason: String },

	#[error("smtp transport error: {0}")]
	#[diagnostic(code(mailweave::smtp))]
	Smtp(#[from] lettre::transport::smtp::Error),
}

pub type MailweaveResult<T> = Result<T, MailweaveError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
