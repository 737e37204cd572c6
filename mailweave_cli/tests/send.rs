mod common;

use mailweave_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

#[test]
fn usage_error_without_arguments() {
	let mut cmd = common::mailweave_cmd();

	cmd.assert()
		.failure()
		.stderr(predicates::str::contains("Usage"));
}

#[test]
fn dry_run_prints_parenthesized_status() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("body.md"), "# Hello\nBody text.\n")?;
	std::fs::write(
		tmp.path().join("contacts.csv"),
		"EMAIL,NAME,FIRSTNAME\na@b.com,Doe,Jane\n",
	)?;
	std::fs::write(tmp.path().join("mailweave.cfg"), "dry_run = true\n")?;

	let mut cmd = common::mailweave_cmd();
	cmd.current_dir(tmp.path())
		.arg("--config")
		.arg("mailweave.cfg")
		.arg("body.md")
		.arg("contacts.csv")
		.assert()
		.success()
		.stdout(predicates::str::contains("Jane Doe <a@b.com> -> (OK)"));

	// Debug copies land under the configured debug directory, named after
	// the recipient address.
	let output = tmp.path().join("output");
	assert!(output.join("a@b.com.txt").exists());
	assert!(output.join("a@b.com.html").exists());
	assert!(output.join("a@b.com.eml").exists());

	let plain = std::fs::read_to_string(output.join("a@b.com.txt"))?;
	assert!(plain.contains("Body text."));

	Ok(())
}

#[test]
fn invalid_contact_rows_are_skipped() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("body.md"), "# Hello\nBody text.\n")?;
	std::fs::write(
		tmp.path().join("contacts.csv"),
		"EMAIL,NAME,FIRSTNAME\nnot-an-address,Broken,\nz@y.org,,\n",
	)?;

	let mut cmd = common::mailweave_cmd();
	cmd.current_dir(tmp.path())
		.arg("--dry-run")
		.arg("body.md")
		.arg("contacts.csv")
		.assert()
		.success()
		.stdout(
			predicates::str::contains("z@y.org -> (OK)")
				.and(predicates::str::contains("not-an-address").not()),
		);

	Ok(())
}

#[test]
fn missing_body_file_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("contacts.csv"), "EMAIL\na@b.com\n")?;

	let mut cmd = common::mailweave_cmd();
	cmd.current_dir(tmp.path())
		.arg("--dry-run")
		.arg("absent.md")
		.arg("contacts.csv")
		.assert()
		.failure();

	Ok(())
}
