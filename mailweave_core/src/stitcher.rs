use std::path::PathBuf;

use crate::MailweaveResult;
use crate::convert::Format;
use crate::convert::convert;
use crate::literal;
use crate::templates::TemplateStore;

/// Classification of a single body line.
#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
	/// `[name]: <key: value, ...>`: a named sub-template reference with an
	/// inline variable mapping.
	TemplateRef { name: &'a str, mapping: &'a str },
	/// `# text`: a subject-line candidate.
	Subject(&'a str),
	/// Ordinary prose.
	Prose,
}

fn classify(line: &str) -> LineKind<'_> {
	if let Some((name, mapping)) = match_template_ref(line) {
		return LineKind::TemplateRef { name, mapping };
	}
	if let Some(text) = match_subject(line) {
		return LineKind::Subject(text);
	}
	LineKind::Prose
}

/// Match `^\s*\[(name)\]:\s*<mapping>\s*$` where `name` is
/// `[A-Za-z0-9_-]+`. The mapping body is returned unparsed.
fn match_template_ref(line: &str) -> Option<(&str, &str)> {
	let trimmed = line.trim();
	let rest = trimmed.strip_prefix('[')?;
	let close = rest.find(']')?;
	let name = &rest[..close];

	if name.is_empty() || !name.bytes().all(is_name_byte) {
		return None;
	}

	let rest = rest[close + 1..].strip_prefix(':')?;
	let body = rest.trim_start().strip_prefix('<')?.strip_suffix('>')?;
	Some((name, body))
}

fn is_name_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

/// Match `^#\s+(text)\s*$`. A second `#` (a sub-heading) does not match.
fn match_subject(line: &str) -> Option<&str> {
	let rest = line.strip_prefix('#')?;
	if !rest.starts_with([' ', '\t']) {
		return None;
	}

	let text = rest.trim();
	(!text.is_empty()).then_some(text)
}

/// Machine states. `FlushingProse` is entered whenever a directive forces
/// the buffered prose through the converter and left as soon as the
/// converted text has been appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	Scanning,
	FlushingProse,
}

/// The stitching state machine for one `(body, format)` pass.
///
/// Lines are fed in document order. Prose accumulates in a buffer; a
/// template reference flushes the buffer through the converter before its
/// own output is appended, so the rendered document preserves document
/// order. Directive lines themselves never enter the prose buffer.
struct StitchMachine<'a> {
	store: &'a TemplateStore,
	format: Format,
	suppress_subject: bool,
	state: State,
	prose: String,
	output: String,
	subject: Option<String>,
	subject_consumed: bool,
}

impl<'a> StitchMachine<'a> {
	fn new(store: &'a TemplateStore, format: Format, suppress_subject: bool) -> Self {
		Self {
			store,
			format,
			suppress_subject,
			state: State::Scanning,
			prose: String::new(),
			output: String::new(),
			subject: None,
			subject_consumed: false,
		}
	}

	fn step(&mut self, line: &str) -> MailweaveResult<()> {
		debug_assert_eq!(self.state, State::Scanning);

		match classify(line) {
			LineKind::TemplateRef { name, mapping } => {
				self.flush_prose()?;
				self.append_template(name, mapping);
			}
			LineKind::Subject(text) if !self.subject_consumed => {
				self.subject = Some(text.to_string());
				self.subject_consumed = true;
				if !self.suppress_subject {
					self.push_prose(line);
				}
			}
			LineKind::Subject(_) | LineKind::Prose => self.push_prose(line),
		}

		Ok(())
	}

	fn push_prose(&mut self, line: &str) {
		self.prose.push_str(line);
		self.prose.push('\n');
	}

	/// Convert the buffered prose and append it to the output. An empty
	/// buffer converts to an empty string, so flushing is always safe.
	fn flush_prose(&mut self) -> MailweaveResult<()> {
		self.state = State::FlushingProse;
		let buffer = std::mem::take(&mut self.prose);
		let converted = convert(self.format, &buffer)?;
		self.output.push_str(&converted);
		self.state = State::Scanning;
		Ok(())
	}

	/// Resolve a template reference and append its rendered text. Both a
	/// malformed inline mapping and a missing sub-template are recoverable:
	/// the directive is skipped with a warning and stitching continues.
	fn append_template(&mut self, name: &str, mapping_src: &str) {
		let mapping = match literal::parse_mapping(mapping_src) {
			Ok(mapping) => mapping,
			Err(error) => {
				tracing::warn!("skipping directive `[{name}]`: {error}");
				return;
			}
		};

		match self.store.resolve(self.format, name, &mapping) {
			Some(text) => self.output.push_str(&text),
			None => tracing::warn!("Template '{name}' ({}) not found!", self.format),
		}
	}

	fn finish(mut self) -> MailweaveResult<(String, Option<String>)> {
		self.flush_prose()?;
		Ok((self.output, self.subject))
	}
}

/// Stitches a composite body into per-format documents.
///
/// The body is an ordered sequence of lines mixing ordinary markdown
/// prose with directives: a subject line (`# Subject`, first match wins)
/// and template references (`[name]: <key: value>`). `stitch` produces
/// the rendered document for one format; the captured subject is exposed
/// through [`Stitcher::subject`] as a side query.
#[derive(Debug)]
pub struct Stitcher {
	body: String,
	store: TemplateStore,
	subject: Option<String>,
}

impl Stitcher {
	pub fn new(body: impl Into<String>, template_root: impl Into<PathBuf>) -> Self {
		Self {
			body: body.into(),
			store: TemplateStore::new(template_root),
			subject: None,
		}
	}

	/// Stitch the body into one `format` document. When `suppress_subject`
	/// is set, the subject line is captured but left out of the rendered
	/// body; otherwise it flows into the prose as a heading.
	pub fn stitch(&mut self, format: Format, suppress_subject: bool) -> MailweaveResult<String> {
		let mut machine = StitchMachine::new(&self.store, format, suppress_subject);

		for line in self.body.lines() {
			machine.step(line)?;
		}

		let (output, subject) = machine.finish()?;
		// The subject is monotonic: the first capture wins, whether it came
		// from a stitch pass or a standalone scan.
		if self.subject.is_none() {
			self.subject = subject;
		}

		Ok(output)
	}

	/// The document subject: the text of the first subject line. Cached by
	/// the first `stitch` call or computed here by a standalone scan;
	/// idempotent either way.
	pub fn subject(&mut self) -> Option<&str> {
		if self.subject.is_none() {
			self.subject = self.body.lines().find_map(|line| {
				match_subject(line).map(str::to_string)
			});
		}
		self.subject.as_deref()
	}
}
