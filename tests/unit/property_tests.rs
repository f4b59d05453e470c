//! Property tests for quoting and token handling.

use machina_cli::patch::shell_quote;
use machina_cli::resolver::{is_instance_id, split_tokens};
use proptest::prelude::*;

/// Minimal POSIX-sh word tokenizer for a single word: alternating
/// single-quoted runs and backslash escapes. Returns `None` if the word has
/// unquoted metacharacters or unbalanced quoting — i.e. if the quoting
/// contract was broken.
fn sh_unquote_word(word: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = word.chars();
    loop {
        match chars.next() {
            None => return Some(out),
            Some('\'') => {
                // Quoted run: everything literal until the closing quote.
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => out.push(c),
                        None => return None, // unbalanced
                    }
                }
            }
            Some('\\') => out.push(chars.next()?),
            // Anything else would be unquoted and shell-interpretable.
            Some(_) => return None,
        }
    }
}

proptest! {
    /// Quoting then sh-tokenizing recovers the input exactly, for any input —
    /// quotes, backslashes and dollars included.
    #[test]
    fn prop_shell_quote_round_trips(s in "\\PC{0,64}") {
        let unquoted = sh_unquote_word(&shell_quote(&s));
        prop_assert_eq!(unquoted, Some(s));
    }

    /// The quoted form is always a single well-formed word — no character
    /// of the input ever appears outside quoting.
    #[test]
    fn prop_shell_quote_never_leaks_structure(s in "\\PC{0,64}") {
        prop_assert!(sh_unquote_word(&shell_quote(&s)).is_some());
    }

    /// Every hex-suffixed id is accepted.
    #[test]
    fn prop_instance_id_accepts_hex(suffix in "[0-9a-fA-F]{1,17}") {
        let id = format!("i-{suffix}");
        prop_assert!(is_instance_id(&id));
    }

    /// Ids with any non-hex character in the suffix are rejected.
    #[test]
    fn prop_instance_id_rejects_non_hex(
        prefix in "[0-9a-f]{0,4}",
        bad in "[g-z]",
        rest in "[0-9a-f]{0,4}",
    ) {
        let id = format!("i-{prefix}{bad}{rest}");
        prop_assert!(!is_instance_id(&id));
    }

    /// Split tokens never produce empty or padded entries.
    #[test]
    fn prop_split_tokens_are_trimmed_and_nonempty(raw in "[a-z0-9, ]{0,64}") {
        for token in split_tokens(&raw) {
            prop_assert!(!token.is_empty());
            prop_assert_eq!(token.trim(), token.as_str());
        }
    }
}
