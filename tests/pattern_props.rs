//! Property tests for the flexible pattern compiler.
//!
//! Pins the two load-bearing guarantees: inter-token whitespace drift never
//! breaks a match, and indentation drift always does.

use flexpatch::pattern;
use proptest::prelude::*;

fn token() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,7}"
}

fn ws_run() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just(' '), Just('\t')], 1..4)
        .prop_map(|chars| chars.into_iter().collect())
}

fn indent() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("  ".to_string()),
        Just("    ".to_string()),
        Just("\t".to_string()),
    ]
}

/// A line as (indent, tokens, drifted whitespace run before each token
/// after the first).
type Line = (String, Vec<String>, Vec<String>);

fn line() -> impl Strategy<Value = Line> {
    (indent(), proptest::collection::vec(token(), 1..4)).prop_flat_map(|(ind, toks)| {
        let gaps = proptest::collection::vec(ws_run(), toks.len().saturating_sub(1));
        (Just(ind), Just(toks), gaps)
    })
}

/// Snippet as the generator would capture it: single spaces, LF endings.
fn snippet_of(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|(ind, toks, _)| format!("{ind}{}", toks.join(" ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Source as it drifted on disk: arbitrary whitespace runs between tokens.
fn drifted_of(lines: &[Line], crlf: bool) -> String {
    let sep = if crlf { "\r\n" } else { "\n" };
    lines
        .iter()
        .map(|(ind, toks, gaps)| {
            let mut line = format!("{ind}{}", toks[0]);
            for (tok, gap) in toks[1..].iter().zip(gaps) {
                line.push_str(gap);
                line.push_str(tok);
            }
            line
        })
        .collect::<Vec<_>>()
        .join(sep)
}

proptest! {
    /// Replacing any inter-token whitespace with a different non-empty run,
    /// and switching newline style, must still match.
    #[test]
    fn drifted_whitespace_always_matches(
        lines in proptest::collection::vec(line(), 1..4),
        crlf in any::<bool>(),
    ) {
        let snippet = snippet_of(&lines);
        let source = drifted_of(&lines, crlf);

        let compiled = pattern::compile(&snippet).unwrap();
        prop_assert!(
            compiled.count_matches(&source) >= 1,
            "snippet {snippet:?} failed to match drifted source {source:?}"
        );
    }

    /// Adding a single space to the indentation of any non-first line must
    /// break the match. One token per line keeps every newline in the
    /// candidate aligned with the pattern's own line boundaries, so the
    /// check isolates indentation alone.
    #[test]
    fn indentation_drift_never_matches(
        indents in proptest::collection::vec(indent(), 2..5),
        toks in proptest::collection::vec(token(), 4),
        victim in 1usize..4,
    ) {
        let lines: Vec<String> = indents
            .iter()
            .zip(&toks)
            .map(|(ind, tok)| format!("{ind}{tok}"))
            .collect();
        let victim = victim % lines.len();
        prop_assume!(victim > 0);

        let snippet = lines.join("\n");
        let mut perturbed = lines.clone();
        perturbed[victim] = format!(" {}", perturbed[victim]);
        let source = perturbed.join("\n");

        let compiled = pattern::compile(&snippet).unwrap();
        prop_assert_eq!(compiled.count_matches(&snippet), 1);
        prop_assert_eq!(
            compiled.count_matches(&source),
            0,
            "indentation drift on line {} still matched: snippet {:?} vs {:?}",
            victim,
            &snippet,
            &source
        );
    }

    /// The pattern treats every snippet character literally: a snippet made
    /// of regex metacharacters compiles and matches itself.
    #[test]
    fn metacharacters_compile_and_self_match(
        raw in r#"[a-z(){}\[\]$^.*+?|\\]{1,20}"#,
    ) {
        prop_assume!(!raw.trim().is_empty());
        let compiled = pattern::compile(&raw).unwrap();
        prop_assert!(compiled.count_matches(&raw) >= 1);
    }
}
