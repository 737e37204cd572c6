use markdown::Options;
use markdown::ParseOptions;
use markdown::mdast::List;
use markdown::mdast::Node;
use markdown::to_html_with_options;
use markdown::to_mdast;

use crate::MailweaveError;
use crate::MailweaveResult;

/// Output formats a composite body can be stitched into.
///
/// Each format carries the fixed metadata the rest of the pipeline needs:
/// the directory name sub-templates live under and the file suffix they
/// use (`plain/greeting.txt`, `html/greeting.html`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
	Plain,
	Html,
}

impl Format {
	/// Directory name for this format under the template root.
	pub fn dir_name(self) -> &'static str {
		match self {
			Self::Plain => "plain",
			Self::Html => "html",
		}
	}

	/// File suffix for sub-templates of this format.
	pub fn suffix(self) -> &'static str {
		match self {
			Self::Plain => ".txt",
			Self::Html => ".html",
		}
	}
}

impl std::fmt::Display for Format {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.dir_name())
	}
}

/// Convert a block of markdown into the target format.
///
/// Empty or whitespace-only input returns an empty string without invoking
/// the converter, so flushing an empty prose buffer never errors. Converter
/// failures surface as [`MailweaveError::Markdown`]; conversion is pure and
/// never retried.
pub fn convert(format: Format, source: &str) -> MailweaveResult<String> {
	if source.trim().is_empty() {
		return Ok(String::new());
	}

	match format {
		Format::Html => to_html_with_options(source, &Options::gfm())
			.map_err(|e| MailweaveError::Markdown(e.to_string())),
		Format::Plain => {
			let tree = to_mdast(source, &ParseOptions::gfm())
				.map_err(|e| MailweaveError::Markdown(e.to_string()))?;
			Ok(render_plain(&tree))
		}
	}
}

/// Render an mdast tree as plain text: block nodes separated by blank
/// lines, list items bulleted, inline markup flattened to its text.
fn render_plain(tree: &Node) -> String {
	let Some(children) = tree.children() else {
		return String::new();
	};

	let blocks: Vec<String> = children
		.iter()
		.map(render_block)
		.filter(|block| !block.is_empty())
		.collect();

	let mut output = blocks.join("\n\n");
	if !output.is_empty() {
		output.push('\n');
	}
	output
}

fn render_block(node: &Node) -> String {
	match node {
		Node::Heading(heading) => inline_text(&heading.children),
		Node::Paragraph(paragraph) => inline_text(&paragraph.children),
		Node::List(list) => render_list(list, 0),
		Node::Code(code) => code.value.clone(),
		Node::Blockquote(quote) => {
			let inner: Vec<String> = quote.children.iter().map(render_block).collect();
			inner
				.join("\n\n")
				.lines()
				.map(|line| {
					if line.is_empty() {
						">".to_string()
					} else {
						format!("> {line}")
					}
				})
				.collect::<Vec<_>>()
				.join("\n")
		}
		Node::ThematicBreak(_) => "-----".to_string(),
		Node::Html(html) => html.value.clone(),
		other => {
			other
				.children()
				.map(|children| inline_text(children))
				.unwrap_or_default()
		}
	}
}

fn render_list(list: &List, depth: usize) -> String {
	let indent = "  ".repeat(depth);
	let start = list.start.unwrap_or(1);
	let mut lines: Vec<String> = Vec::new();

	for (index, item) in list.children.iter().enumerate() {
		let Node::ListItem(item) = item else {
			continue;
		};

		let bullet = if list.ordered {
			format!("{}. ", start as usize + index)
		} else {
			"- ".to_string()
		};
		let continuation = " ".repeat(bullet.len());

		let mut parts: Vec<String> = Vec::new();
		for child in &item.children {
			match child {
				Node::List(nested) => parts.push(render_list(nested, depth + 1)),
				other => {
					let block = render_block(other);
					if !block.is_empty() {
						parts.push(block);
					}
				}
			}
		}

		for (line_index, line) in parts.join("\n").lines().enumerate() {
			if line_index == 0 {
				lines.push(format!("{indent}{bullet}{line}"));
			} else {
				lines.push(format!("{indent}{continuation}{line}"));
			}
		}
	}

	lines.join("\n")
}

fn inline_text(children: &[Node]) -> String {
	let mut output = String::new();

	for node in children {
		match node {
			Node::Text(text) => output.push_str(&text.value),
			Node::InlineCode(code) => output.push_str(&code.value),
			Node::Link(link) => {
				let text = inline_text(&link.children);
				if text == link.url {
					output.push_str(&link.url);
				} else {
					output.push_str(&text);
					output.push_str(" <");
					output.push_str(&link.url);
					output.push('>');
				}
			}
			Node::Image(image) => output.push_str(&image.alt),
			Node::Break(_) => output.push('\n'),
			Node::Html(html) => output.push_str(&html.value),
			other => {
				if let Some(children) = other.children() {
					output.push_str(&inline_text(children));
				}
			}
		}
	}

	output
}
