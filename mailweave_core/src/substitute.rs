use std::collections::HashMap;

/// Apply a variable mapping to a rendered template using best-effort
/// substitution.
///
/// Placeholders are `$KEY` or `${KEY}` where `KEY` is
/// `[A-Za-z_][A-Za-z0-9_]*`. Known placeholders are replaced with the
/// mapped value (inserted verbatim, no escaping); unknown placeholders are
/// left literally in the output. `$$` produces a literal `$`. Malformed
/// placeholders pass through unchanged. This function is total: it never
/// fails, for any template and any mapping.
pub fn safe_substitute(template: &str, vars: &HashMap<String, String>) -> String {
	let bytes = template.as_bytes();
	let mut output = String::with_capacity(template.len());
	let mut cursor = 0;

	while let Some(offset) = template[cursor..].find('$') {
		let dollar = cursor + offset;
		output.push_str(&template[cursor..dollar]);

		match bytes.get(dollar + 1) {
			Some(b'$') => {
				output.push('$');
				cursor = dollar + 2;
			}
			Some(b'{') => {
				let key_start = dollar + 2;
				let key_end = scan_key(bytes, key_start);

				if key_end > key_start && bytes.get(key_end) == Some(&b'}') {
					let key = &template[key_start..key_end];
					match vars.get(key) {
						Some(value) => output.push_str(value),
						None => output.push_str(&template[dollar..=key_end]),
					}
					cursor = key_end + 1;
				} else {
					output.push('$');
					cursor = dollar + 1;
				}
			}
			Some(&byte) if is_key_start(byte) => {
				let key_start = dollar + 1;
				let key_end = scan_key(bytes, key_start);
				let key = &template[key_start..key_end];

				match vars.get(key) {
					Some(value) => output.push_str(value),
					None => output.push_str(&template[dollar..key_end]),
				}
				cursor = key_end;
			}
			_ => {
				output.push('$');
				cursor = dollar + 1;
			}
		}
	}

	output.push_str(&template[cursor..]);
	output
}

/// Scan forward from `start` over key characters. Returns the end index.
/// When the byte at `start` cannot begin a key, returns `start`.
fn scan_key(bytes: &[u8], start: usize) -> usize {
	if bytes.get(start).is_none_or(|&byte| !is_key_start(byte)) {
		return start;
	}

	let mut end = start + 1;
	while bytes.get(end).is_some_and(|&byte| is_key_continue(byte)) {
		end += 1;
	}
	end
}

fn is_key_start(byte: u8) -> bool {
	byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_key_continue(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_'
}
