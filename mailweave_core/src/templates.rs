use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use crate::convert::Format;
use crate::literal::Literal;
use crate::substitute::safe_substitute;

/// Resolves named sub-templates from the hierarchical template namespace.
///
/// A sub-template is identified by `(format, name)` and lives at
/// `<root>/<format>/<name><suffix>`, e.g. `templates/html/footer.html`.
/// Templates are small and read once per document render; there is no
/// caching across calls.
#[derive(Debug, Clone)]
pub struct TemplateStore {
	root: PathBuf,
}

impl TemplateStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Resolve the sub-template `name` for `format` and substitute the
	/// directive mapping into it.
	///
	/// Never raises to the caller: an absent or unreadable template file is
	/// logged and reported as `None`, and the substitution is best-effort
	/// (placeholders missing from the mapping stay literal).
	pub fn resolve(
		&self,
		format: Format,
		name: &str,
		mapping: &[(String, Literal)],
	) -> Option<String> {
		let file_name = format!("{name}{}", format.suffix());
		let path = self.root.join(format.dir_name()).join(file_name);
		tracing::debug!("format: {format}, name: {name}, mapping: {mapping:?}");

		let content = match std::fs::read_to_string(&path) {
			Ok(content) => content,
			Err(error) => {
				tracing::error!("unable to read template `{}`: {error}", path.display());
				return None;
			}
		};

		let vars: HashMap<String, String> = mapping
			.iter()
			.map(|(key, value)| (key.clone(), value.to_string()))
			.collect();

		Some(safe_substitute(&content, &vars))
	}
}
