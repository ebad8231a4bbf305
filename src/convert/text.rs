//! Pure helpers for the instruction-stream renderer.  All of them operate on
//! borrowed slices and never allocate except for the final reassembly.

/// Trims horizontal whitespace (spaces and tabs) from both ends.  Vertical
/// whitespace is left alone so CR-terminated lines keep their terminator.
pub(crate) fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c == ' ' || c == '\t')
}

/// Strips a single leading comment marker and the whitespace around what
/// remains.  Lines not starting with `;` come back untouched.
pub(crate) fn uncomment(s: &str) -> &str {
    match s.strip_prefix(';') {
        Some(rest) => trim(rest),
        None => s,
    }
}

/// A line is noise when, after trimming and removing one comment marker,
/// nothing remains: blank lines and bare `;` comment markers.
pub(crate) fn is_noise(line: &str) -> bool {
    uncomment(trim(line)).is_empty()
}

/// Drops noise lines from a newline-delimited blob.  Surviving lines are
/// kept verbatim, each terminated by `\n`.
pub(crate) fn strip_noise(blob: &str) -> String {
    let mut out = String::with_capacity(blob.len());
    for line in blob.split('\n') {
        if !is_noise(line) {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn trim_handles_short_lines() {
        assert_eq!(trim(""), "");
        assert_eq!(trim(" "), "");
        assert_eq!(trim("\t"), "");
        assert_eq!(trim("x"), "x");
        assert_eq!(trim(" x\t"), "x");
        assert_eq!(trim("  \t  "), "");
    }

    #[test]
    fn uncomment_strips_one_marker() {
        assert_eq!(uncomment("; lift nozzle"), "lift nozzle");
        assert_eq!(uncomment(";; doubled"), "; doubled");
        assert_eq!(uncomment(";"), "");
        assert_eq!(uncomment("G1 X0"), "G1 X0");
    }

    #[test]
    fn noise_lines() {
        assert!(is_noise(""));
        assert!(is_noise("   "));
        assert!(is_noise(";"));
        assert!(is_noise("  ;  \t"));
        assert!(!is_noise("G28"));
        assert!(!is_noise("; retract"));
        assert!(!is_noise("G1 X2 ; trailing"));
    }

    #[test]
    fn strip_noise_keeps_lines_verbatim() {
        let blob = "G1 X1\n;\n   \n;\t\nG1 X2 ; trailing\n; retract\n";
        assert_eq!(strip_noise(blob), "G1 X1\nG1 X2 ; trailing\n; retract\n");
    }

    #[test]
    fn strip_noise_handles_missing_final_newline() {
        assert_eq!(strip_noise("G28"), "G28\n");
        assert_eq!(strip_noise("G28\n;"), "G28\n");
    }

    proptest! {
        #[test]
        fn trim_is_a_subslice(s in "\\PC*") {
            let t = trim(&s);
            prop_assert!(t.len() <= s.len());
            prop_assert!(s.contains(t));
        }

        #[test]
        fn strip_noise_is_idempotent(s in "[A-Za-z0-9 ;\t\n]{0,64}") {
            let once = strip_noise(&s);
            prop_assert_eq!(strip_noise(&once), once.clone());
        }

        #[test]
        fn stripped_output_has_no_noise_lines(s in "[A-Za-z0-9 ;\t\n]{0,64}") {
            for line in strip_noise(&s).split('\n').filter(|l| !l.is_empty()) {
                prop_assert!(!is_noise(line));
            }
        }
    }
}
