//! External-tool report section.
//!
//! Best-effort shell-out to `exiftool` for a second opinion on anything
//! the built-in extractors miss. The tool's output encoding is not
//! guaranteed, so both streams go through the permissive single-byte
//! decoder. A missing binary is not an error.

use std::path::Path;
use std::process::Command;

use log::debug;

use crate::report::text::decode_ansi;

pub(crate) fn extract(path: &Path) -> String {
    run_tool("exiftool", path)
}

fn run_tool(program: &str, path: &Path) -> String {
    let output = match Command::new(program)
        .args(["-duplicates", "-groupHeadings", "-unknown2"])
        .arg(path)
        .output()
    {
        Ok(output) => output,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("{program} not on PATH");
            return String::new();
        }
        Err(err) => {
            debug!("{program} failed to run: {err}");
            return String::new();
        }
    };
    let mut s = decode_ansi(&output.stdout);
    s.push_str(&decode_ansi(&output.stderr));
    s.replace('\r', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_tool_is_silent() {
        let s = run_tool("definitely-not-a-real-tool-name", Path::new("x.png"));
        assert_eq!(s, "");
    }

    #[cfg(unix)]
    #[test]
    fn output_is_captured_and_trimmed() {
        // echo stands in for the real tool; it prints the arguments.
        let s = run_tool("echo", Path::new("some-image.jpg"));
        assert!(s.contains("some-image.jpg"));
        assert!(!s.ends_with('\n'));
    }
}
