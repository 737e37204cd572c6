use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use lettre::SmtpTransport;
use lettre::Transport;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use mailweave_cli::MailweaveCli;
use mailweave_core::AnyEmptyResult;
use mailweave_core::AnyResult;
use mailweave_core::Config;
use mailweave_core::Contact;
use mailweave_core::Format;
use mailweave_core::MailweaveError;
use mailweave_core::OutgoingEmail;
use mailweave_core::PersonalizedMail;
use mailweave_core::RenderedMail;
use mailweave_core::global_context;
use mailweave_core::inline_images;
use mailweave_core::load_contacts;
use mailweave_core::merge_vars;
use mailweave_core::personalize;
use mailweave_core::render_body;
use owo_colors::OwoColorize;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = MailweaveCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	// Load the config before installing the subscriber: the config decides
	// the log level. Warnings collected during the load are emitted right
	// after.
	let load = Config::load(&args.config);
	let mut config = load.config;
	if args.dry_run {
		config.dry_run = true;
	}

	init_logging(&args, &config);

	if let Some(path) = &load.path {
		tracing::debug!("loaded config from `{}`", path.display());
	}
	for warning in &load.warnings {
		tracing::warn!("{warning}");
	}

	if let Err(e) = run(&args, &config) {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<MailweaveError>() {
			Ok(err) => {
				let report: miette::Report = (*err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(-1);
	}
}

fn init_logging(args: &MailweaveCli, config: &Config) {
	let level = if args.verbose {
		tracing::Level::DEBUG
	} else {
		config.log_level
	};

	let filter = tracing_subscriber::EnvFilter::builder()
		.with_default_directive(tracing_subscriber::filter::LevelFilter::from_level(level).into())
		.from_env_lossy();

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(color_enabled())
		.init();
}

fn run(args: &MailweaveCli, config: &Config) -> AnyEmptyResult {
	let body = std::fs::read_to_string(&args.body)?;
	let template_root = args
		.body
		.parent()
		.filter(|parent| !parent.as_os_str().is_empty())
		.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
	tracing::debug!(
		"mail: {}, templates: {}",
		args.body.display(),
		template_root.display()
	);

	let contacts = load_contacts(&args.contacts)?;
	if contacts.is_empty() {
		tracing::warn!(
			"no valid contacts loaded from `{}`",
			args.contacts.display()
		);
	}

	// Canonical documents: rendered once, shared read-only by every
	// recipient.
	let from_mailbox = config.from_mailbox()?;
	let globals = global_context(&from_mailbox, &config.display_name);
	let rendered = render_body(&body, &template_root, &globals)?;
	let html_root = template_root.join(Format::Html.dir_name());

	// Generate every message up front, in contact-list order. A failure
	// here (e.g. an image that vanished between stitching and assembly)
	// drops only that recipient.
	let mut outgoing = Vec::new();
	for contact in &contacts {
		match generate_email(config, &from_mailbox, &rendered, &html_root, contact) {
			Ok(prepared) => outgoing.push(prepared),
			Err(error) => {
				tracing::error!("unable to generate e-mail for `{contact}`: {error}");
			}
		}
	}

	let transport = if config.dry_run {
		None
	} else {
		Some(connect(config)?)
	};

	send_all(config, &outgoing, transport.as_ref());
	Ok(())
}

/// One recipient's assembled message, paired with the mailbox for status
/// output.
struct PreparedEmail {
	to: Mailbox,
	message: lettre::Message,
}

fn generate_email(
	config: &Config,
	from_mailbox: &Mailbox,
	rendered: &RenderedMail,
	html_root: &Path,
	contact: &Contact,
) -> AnyResult<PreparedEmail> {
	let vars = merge_vars(from_mailbox, &config.display_name, &rendered.subject, contact);
	let personalized = personalize(rendered, &vars);

	let domain = from_mailbox.email.domain();
	let (html, resources) = inline_images(&personalized.html, html_root, domain);

	let mut email = OutgoingEmail::new(
		from_mailbox.clone(),
		contact.mailbox(),
		&rendered.subject,
		&personalized.plain,
	);
	email.set_html_content(html, resources);

	if let Some(debug_dir) = &config.debug_dir {
		if let Err(error) = write_debug_copies(debug_dir, contact, &personalized, &email) {
			tracing::warn!("unable to write debug copies for `{contact}`: {error}");
		}
	}

	let message = email.build()?;
	Ok(PreparedEmail {
		to: contact.mailbox(),
		message,
	})
}

/// Dump the personalized documents and the raw message next to each other,
/// named after the recipient address.
fn write_debug_copies(
	debug_dir: &Path,
	contact: &Contact,
	personalized: &PersonalizedMail,
	email: &OutgoingEmail,
) -> AnyEmptyResult {
	std::fs::create_dir_all(debug_dir)?;
	// `Path::with_extension` would eat the address's TLD, so build the
	// file names by hand.
	let file = |suffix: &str| debug_dir.join(format!("{}.{suffix}", contact.email()));

	std::fs::write(file("txt"), &personalized.plain)?;
	std::fs::write(file("html"), &personalized.html)?;
	std::fs::write(file("eml"), email.formatted()?)?;
	Ok(())
}

/// Connect and optionally authenticate against the configured SMTP
/// server. Failure here is fatal: it aborts before any message is sent.
fn connect(config: &Config) -> AnyResult<SmtpTransport> {
	let mut builder = SmtpTransport::relay(&config.host)?.port(config.port);
	if let Some(password) = &config.password {
		builder = builder.credentials(Credentials::new(config.email(), password.clone()));
	}

	let transport = builder.build();
	match transport.test_connection() {
		Ok(true) => Ok(transport),
		Ok(false) => Err(format!("unable to connect to `{}`", config.host).into()),
		Err(error) => {
			tracing::debug!("{error}");
			Err(format!("unable to connect or login at `{}`: {error}", config.host).into())
		}
	}
}

/// Dispatch the prepared messages in order, printing one status line per
/// recipient. A permanent rejection is sender-level: it aborts the rest
/// of the batch, since it is assumed to affect every following send.
fn send_all(config: &Config, outgoing: &[PreparedEmail], transport: Option<&SmtpTransport>) {
	for prepared in outgoing {
		print!("{} -> ", prepared.to);
		std::io::stdout().flush().ok();

		let mut sender_refused = None;
		let ok = match transport {
			None => true,
			Some(transport) => {
				match transport.send(&prepared.message) {
					Ok(_) => true,
					Err(error) => {
						if error.is_permanent() {
							sender_refused = Some(error);
						} else {
							tracing::debug!("{error}");
						}
						false
					}
				}
			}
		};

		let status = if ok {
			colored!("OK", green)
		} else {
			colored!("ERR", red)
		};
		if config.dry_run {
			println!("({status})");
		} else {
			println!("{status}");
		}

		if let Some(error) = sender_refused {
			tracing::error!("send permanently refused, aborting the batch: {error}");
			break;
		}
	}
}
