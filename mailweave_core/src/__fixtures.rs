use std::collections::HashMap;
use std::path::Path;

use tempfile::TempDir;

/// Bytes written into image fixtures. Nothing in the pipeline decodes
/// image content; only the path and extension matter.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfixture";

/// Create a template root with empty `plain/` and `html/` namespaces.
pub fn template_root() -> TempDir {
	let dir = tempfile::tempdir().expect("create temp template root");
	std::fs::create_dir_all(dir.path().join("plain")).expect("create plain namespace");
	std::fs::create_dir_all(dir.path().join("html")).expect("create html namespace");
	dir
}

/// Write one sub-template file under the given format directory.
pub fn write_template(root: &Path, format_dir: &str, file_name: &str, content: &str) {
	std::fs::write(root.join(format_dir).join(file_name), content).expect("write template file");
}

/// Build a raw contact row from key/value pairs.
pub fn contact_row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
	pairs
		.iter()
		.map(|(key, value)| ((*key).to_string(), (*value).to_string()))
		.collect()
}

/// Build a substitution mapping from key/value pairs.
pub fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
	pairs
		.iter()
		.map(|(key, value)| ((*key).to_string(), (*value).to_string()))
		.collect()
}
