use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Generate and send personalized e-mails from a markdown body and a CSV contact list.",
	long_about = "mailweave performs mail-merge: one markdown body with embedded named \
	              sub-templates is stitched into plain-text and HTML documents, personalized per \
	              CSV contact, local images are embedded as cid: resources, and the resulting \
	              multipart messages are sent over SMTP.\n\nThe body's directory doubles as the \
	              template root: sub-templates referenced as `[name]: <key: value>` are resolved \
	              from `plain/<name>.txt` and `html/<name>.html` below it.\n\nQuick start:\n  \
	              mailweave body.md contacts.csv\n  mailweave --dry-run body.md contacts.csv"
)]
pub struct MailweaveCli {
	/// Path to the mail body file. Its directory is the template root.
	pub body: PathBuf,

	/// Path to the CSV contacts file. The header row names the fields; a
	/// valid EMAIL column is required per row.
	pub contacts: PathBuf,

	/// Path to the configuration file. A missing file is not an error; the
	/// built-in defaults apply.
	#[arg(long, short, default_value = mailweave_core::CONFIG_FILE)]
	pub config: PathBuf,

	/// Simulate the send loop without contacting the SMTP server. Status
	/// lines are printed parenthesized, e.g. `(OK)`.
	#[arg(long, default_value_t = false)]
	pub dry_run: bool,

	/// Enable verbose output (overrides the configured log level).
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}
