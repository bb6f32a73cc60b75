//! Property-based tests for the lexical scanner
//!
//! Uses proptest to verify properties that should hold for all inputs.

use qualities::core::services::{Check, PatternRule, Region, SourceFile, SourceSet, code_only, mask};
use proptest::prelude::*;

fn banned_rule() -> PatternRule {
    PatternRule::literals("anti_mvp", &["MVP"], true, "placeholder scope marker").unwrap()
}

fn scan(content: &str) -> Vec<usize> {
    let sources = SourceSet::new(vec![SourceFile::new("src/a.ts", content.to_string())]);
    banned_rule().run(&sources).iter().map(|v| v.line).collect()
}

proptest! {
    /// A banned term only inside strings and comments is never reported
    #[test]
    fn term_in_literals_or_comments_is_ignored(
        prefix in "[a-z ]{0,12}",
        suffix in "[a-z ]{0,12}",
        wrapper in 0usize..5,
    ) {
        let hidden = match wrapper {
            0 => format!("const s = \"{prefix} MVP {suffix}\";"),
            1 => format!("const s = '{prefix} MVP {suffix}';"),
            2 => format!("const s = `{prefix} MVP {suffix}`;"),
            3 => format!("x(); // {prefix} MVP {suffix}"),
            _ => format!("/* {prefix}\n MVP {suffix} */ x();"),
        };
        prop_assert!(scan(&hidden).is_empty());
    }

    /// The same text with the term also in code reports exactly that line
    #[test]
    fn term_in_code_reported_once_at_its_line(
        filler in prop::collection::vec("[a-z]{1,8}", 0..6),
    ) {
        let mut lines: Vec<String> = filler.iter().map(|w| format!("const {w}_x = \"MVP\"; // MVP")).collect();
        let target = lines.len() + 1;
        lines.push("const MVP = 1;".to_string());
        let content = lines.join("\n") + "\n";
        prop_assert_eq!(scan(&content), vec![target]);
    }

    /// Masking never panics and keeps the text's layout
    #[test]
    fn masking_preserves_length_and_newlines(source in any::<String>()) {
        let masked = mask(&source);
        for region in [Region::Code, Region::Comments] {
            let view = masked.region(region);
            prop_assert_eq!(view.len(), source.len());
            prop_assert_eq!(view.matches('\n').count(), source.matches('\n').count());
        }
        prop_assert_eq!(code_only(&source).len(), source.len());
    }

    /// Runs are newline-free slices of the source at their offsets
    #[test]
    fn runs_are_source_slices(source in any::<String>()) {
        let masked = mask(&source);
        for region in [Region::Code, Region::Comments] {
            for (offset, run) in masked.runs(region, 0..source.len()) {
                prop_assert!(!run.is_empty());
                prop_assert!(!run.contains('\n'));
                prop_assert_eq!(source.get(offset..offset + run.len()), Some(run));
            }
        }
    }

    /// Unterminated comments and strings swallow the rest without failing
    #[test]
    fn unterminated_constructs_complete(opener in prop::sample::select(vec!["/*", "\"", "'", "`"]), tail in "[a-zA-Z \n]{0,40}") {
        let source = format!("ok();\n{opener}{tail} MVP");
        prop_assert!(scan(&source).is_empty());
    }
}
