use assert_cmd::Command;

pub fn mailweave_cmd() -> Command {
	let mut cmd = Command::cargo_bin("mailweave").expect("mailweave binary builds");
	cmd.env("NO_COLOR", "1");
	cmd
}
