//! Argument vectors for external processes.
//!
//! A `CommandSpec` is the intent "run this program with these arguments".
//! The runtime turns it into a real child process; the relay config renderer
//! turns it into a single command line. Both views come from the same
//! argument vector so quoting stays consistent.

use std::fmt;
use std::path::{Path, PathBuf};

/// Program plus argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a flag followed by its value.
    #[must_use]
    pub fn arg_with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arg(key).arg(value)
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Render as one shell-style command line, quoting where needed.
    pub fn to_command_line(&self) -> String {
        let program = self.program.to_string_lossy();
        std::iter::once(quote_arg(&program))
            .chain(self.args.iter().map(|a| quote_arg(a)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_command_line())
    }
}

/// Quote one argument for a shell-style command line.
///
/// Arguments without whitespace or shell metacharacters are returned as-is.
/// Anything else is wrapped in double quotes with `\`, `"`, `$` and `` ` ``
/// backslash-escaped. Windows path separators survive as `\\`.
pub fn quote_arg(arg: &str) -> String {
    const SPECIAL: &[char] = &[
        ' ', '\t', '\n', '"', '\'', '\\', '$', '`', '&', '|', ';', '<', '>', '(', ')', '*', '?',
        '[', ']', '{', '}', '#', '~', '!',
    ];

    if !arg.is_empty() && !arg.contains(SPECIAL) {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_args_untouched() {
        assert_eq!(quote_arg("-re"), "-re");
        assert_eq!(quote_arg("rtsp://localhost:8554/stream1"), "rtsp://localhost:8554/stream1");
    }

    #[test]
    fn test_spaces_are_quoted() {
        assert_eq!(quote_arg("/media/my clip.mp4"), "\"/media/my clip.mp4\"");
    }

    #[test]
    fn test_backslashes_and_quotes_escaped() {
        assert_eq!(
            quote_arg(r"C:\Videos\a.mp4"),
            r#""C:\\Videos\\a.mp4""#
        );
        assert_eq!(quote_arg(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote_arg("$HOME"), r#""\$HOME""#);
    }

    #[test]
    fn test_empty_arg_quoted() {
        assert_eq!(quote_arg(""), "\"\"");
    }

    #[test]
    fn test_command_line_rendering() {
        let spec = CommandSpec::new("ffmpeg")
            .arg("-re")
            .arg_with_value("-i", "/tmp/a b.mp4");
        assert_eq!(spec.to_command_line(), "ffmpeg -re -i \"/tmp/a b.mp4\"");
        assert_eq!(spec.get_args().len(), 3);
    }
}
