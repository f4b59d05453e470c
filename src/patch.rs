//! Remote patch generator — insert a line after the first pattern match.
//!
//! Builds a shell command that runs a single awk pass on the remote host:
//! every line is echoed unchanged, and immediately after the first line
//! matching the pattern the new line is emitted once with the matched
//! line's leading whitespace copied. The output replaces the original file
//! only after the full pass completes (write-to-temp-then-rename), so a
//! failure mid-pass never corrupts the file.

use serde::Serialize;

/// Remote temp file for the rewrite pass; `$$` is the remote shell's pid.
const TMP_PATH: &str = "/tmp/machina_patch.$$";

/// A single insert-after-match edit. Pure value, consumed once by
/// [`PatchSpec::render`].
#[derive(Debug, Clone, Serialize)]
pub struct PatchSpec {
    /// Absolute path of the file to patch on the remote host.
    pub file: String,
    /// awk extended-regex pattern selecting the anchor line.
    pub pattern: String,
    /// Literal text of the line to insert after the first match.
    pub line: String,
}

impl PatchSpec {
    #[must_use]
    pub fn new(file: &str, pattern: &str, line: &str) -> Self {
        Self {
            file: file.to_string(),
            pattern: pattern.to_string(),
            line: line.to_string(),
        }
    }

    /// Render the remote shell command implementing this patch.
    ///
    /// The pattern, the inserted line, and the file path all pass through
    /// [`shell_quote`], so none of them can escape its literal context.
    /// With zero matching lines the file is rewritten byte-identical and
    /// still goes through the temp-then-rename step.
    #[must_use]
    pub fn render(&self) -> String {
        let file = shell_quote(&self.file);
        format!(
            concat!(
                "awk -v pattern={pattern} -v new_line={line} ",
                "'BEGIN{{found=0}} {{print}} !found && $0 ~ pattern {{ ",
                "match($0, /[^[:space:]]/); ",
                "lead = (RSTART>1?substr($0,1,RSTART-1):\"\"); ",
                "print lead new_line; found=1 }}' ",
                "{file} > {tmp} && mv {tmp} {file}"
            ),
            pattern = shell_quote(&self.pattern),
            line = shell_quote(&self.line),
            file = file,
            tmp = TMP_PATH,
        )
    }
}

/// Quote `s` as a single shell word.
///
/// Contract: wraps the input in single quotes and rewrites each embedded
/// `'` as `'\''`, so the result is always one literal word under POSIX sh —
/// no character in `s` can terminate the quoting or introduce new command
/// structure. awk's own backslash handling of `-v` values is left to awk,
/// matching how the patch has always behaved.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
