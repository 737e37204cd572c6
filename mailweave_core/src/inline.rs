use std::path::Path;
use std::path::PathBuf;

use logos::Logos;
use uuid::Uuid;

/// Alt text used when an `<img>` element carries none.
pub const DEFAULT_ALT: &str = "Image";

/// Raw tokens for scanning rendered HTML for `<img>` start tags. Anything
/// the lexer does not recognize is skipped while the position tracker
/// still advances through it.
#[derive(Logos, Debug, PartialEq)]
enum RawToken {
	#[regex(r"<[iI][mM][gG]")]
	ImgOpen,
	#[token("/>")]
	TagSelfClose,
	#[token(">")]
	TagClose,
	#[token("=")]
	Equals,
	#[regex(r"[A-Za-z][A-Za-z0-9-]*")]
	Ident,
	#[regex(r#""[^"]*""#)]
	DoubleQuoted,
	#[regex(r"'[^']*'")]
	SingleQuoted,
	#[regex(r"[ \t\r\n]+")]
	Whitespace,
}

/// A reference to an image found in rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
	/// The raw `src` attribute value.
	pub src: String,
	/// The `alt` attribute value, or [`DEFAULT_ALT`] when absent.
	pub alt: String,
	/// 1-indexed source line of the `<img` tag.
	pub line: usize,
	/// 1-indexed column of the `<img` tag.
	pub column: usize,
}

/// Context states for the image scanner.
enum ScanContext {
	/// Outside any `<img>` tag.
	Outside,
	/// Between `<img` and the closing `>`.
	Tag,
}

/// An `<img>` tag currently being collected.
struct PendingImage {
	line: usize,
	column: usize,
	src: Option<String>,
	alt: Option<String>,
}

/// Walks the token stream with context-dependent rules, collecting one
/// `ImageRef` per `<img>` tag that carries a `src` attribute.
struct ImageWalker<'a> {
	source: &'a str,
	tokens: Vec<(Result<RawToken, ()>, std::ops::Range<usize>)>,
	cursor: usize,
	line: usize,
	column: usize,
	context: ScanContext,
	pending: Option<PendingImage>,
	attr: Option<String>,
	attr_has_value: bool,
	images: Vec<ImageRef>,
}

impl<'a> ImageWalker<'a> {
	fn new(source: &'a str) -> Self {
		let tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			source,
			tokens,
			cursor: 0,
			line: 1,
			column: 1,
			context: ScanContext::Outside,
			pending: None,
			attr: None,
			attr_has_value: false,
			images: Vec::new(),
		}
	}

	fn current_slice(&self) -> &'a str {
		let (_, span) = &self.tokens[self.cursor];
		&self.source[span.clone()]
	}

	/// Advance the position tracker through the current slice and move the
	/// cursor forward. Newlines may appear inside any slice.
	fn advance_cursor(&mut self) {
		let slice = self.current_slice();

		if let Some(last_newline) = slice.rfind('\n') {
			self.line += slice.matches('\n').count();
			self.column = slice[last_newline + 1..].chars().count() + 1;
		} else {
			self.column += slice.chars().count();
		}

		self.cursor += 1;
	}

	fn process(&mut self) {
		while self.cursor < self.tokens.len() {
			let (result, _) = &self.tokens[self.cursor];

			match self.context {
				ScanContext::Outside => {
					if matches!(result, Ok(RawToken::ImgOpen)) {
						self.pending = Some(PendingImage {
							line: self.line,
							column: self.column,
							src: None,
							alt: None,
						});
						self.attr = None;
						self.attr_has_value = false;
						self.context = ScanContext::Tag;
					}
				}
				ScanContext::Tag => {
					match result {
						Ok(RawToken::TagClose | RawToken::TagSelfClose) => {
							self.finish_tag();
						}
						Ok(RawToken::Ident) => {
							self.attr = Some(self.current_slice().to_ascii_lowercase());
							self.attr_has_value = false;
						}
						Ok(RawToken::Equals) => {
							self.attr_has_value = self.attr.is_some();
						}
						Ok(RawToken::DoubleQuoted | RawToken::SingleQuoted) => {
							self.assign_attr_value();
						}
						_ => {}
					}
				}
			}

			self.advance_cursor();
		}
	}

	fn assign_attr_value(&mut self) {
		let slice = self.current_slice();
		let value = &slice[1..slice.len() - 1];

		if self.attr_has_value {
			if let (Some(attr), Some(pending)) = (self.attr.as_deref(), self.pending.as_mut()) {
				match attr {
					"src" => pending.src = Some(value.to_string()),
					"alt" => pending.alt = Some(value.to_string()),
					_ => {}
				}
			}
		}

		self.attr = None;
		self.attr_has_value = false;
	}

	fn finish_tag(&mut self) {
		if let Some(pending) = self.pending.take() {
			if let Some(src) = pending.src {
				self.images.push(ImageRef {
					src,
					alt: pending.alt.unwrap_or_else(|| DEFAULT_ALT.to_string()),
					line: pending.line,
					column: pending.column,
				});
			}
		}

		self.context = ScanContext::Outside;
	}
}

/// Collect every `<img>` element with a `src` attribute from `html`,
/// together with its source position. Elements without `src` are ignored;
/// a missing `alt` defaults to [`DEFAULT_ALT`].
pub fn find_images(html: &str) -> Vec<ImageRef> {
	let mut walker = ImageWalker::new(html);
	walker.process();
	walker.images
}

/// An embedded resource referenced from HTML through a `cid:` URL.
///
/// A resource belongs exclusively to the message it was minted for: the
/// content id is generated fresh per call and never shared across
/// messages, even when the same image file recurs.
#[derive(Debug, Clone)]
pub struct CidResource {
	/// Display name, taken from the image's alt text.
	pub name: String,
	/// Content id, without the surrounding angle brackets.
	pub cid: String,
	/// Resolved local path of the binary payload.
	pub path: PathBuf,
}

impl CidResource {
	pub fn new(name: impl Into<String>, domain: &str, path: impl Into<PathBuf>) -> Self {
		Self {
			name: name.into(),
			cid: format!("{}@{domain}", Uuid::new_v4().simple()),
			path: path.into(),
		}
	}

	/// The `src` attribute value that refers to this resource.
	pub fn cid_src(&self) -> String {
		format!("cid:{}", self.cid)
	}
}

/// Rewrite local image references in `html` into embedded `cid:` resources.
///
/// Images with a `data:` source are already inline and skipped. Other
/// sources are resolved against `base_dir`; references whose file does not
/// exist pass through untouched (a broken link is not an error here). Each
/// remaining image gets a fresh [`CidResource`] scoped to `domain`, and the
/// recorded source line is rewritten by replacing that one `src` occurrence
/// with `cid:<id>`. When nothing is rewritten the HTML is returned
/// byte-identical.
pub fn inline_images(html: &str, base_dir: &Path, domain: &str) -> (String, Vec<CidResource>) {
	let images = find_images(html);
	let mut lines: Vec<String> = html.split('\n').map(str::to_string).collect();
	let mut resources = Vec::new();
	let mut rewritten = false;

	for image in images {
		if image.src.starts_with("data:") {
			continue;
		}

		let path = base_dir.join(&image.src);
		if !path.exists() {
			tracing::debug!(
				"image `{}` not found under `{}`, leaving the reference untouched",
				image.src,
				base_dir.display()
			);
			continue;
		}

		let resource = CidResource::new(image.alt, domain, path);
		let Some(line) = lines.get_mut(image.line - 1) else {
			continue;
		};

		*line = line.replacen(&image.src, &resource.cid_src(), 1);
		resources.push(resource);
		rewritten = true;
	}

	if !rewritten {
		return (html.to_string(), resources);
	}

	(lines.join("\n"), resources)
}
