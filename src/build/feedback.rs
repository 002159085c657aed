use colored::*;

/// Turns a failed tool's output into a short pointer at the likely fix.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        // 1. Project library has no entry point
        if output.contains("undefined reference to `main'")
            || output.contains("undefined symbol: main")
            || output.contains("entry point must be defined")
        {
            return Some(format!(
                "The project library has no {} function.\nCheck that {} names the library containing it.",
                "main()".bold().yellow(),
                "[project] name".bold().green()
            ));
        }

        // 2. Unresolved symbols at link time
        if output.contains("LNK2019")
            || output.contains("undefined reference to")
            || output.contains("undefined symbol:")
        {
            return Some(format!(
                "It looks like a {} error.\nA library may be missing from {} or from {}.",
                "Linker".bold().red(),
                "[[library]]".bold().yellow(),
                "native_libs".bold().yellow()
            ));
        }

        // 3. Header not found while compiling
        if output.contains("fatal error: ")
            && (output.contains("No such file or directory") || output.contains("file not found"))
            || output.contains("cannot open include file")
        {
            return Some(format!(
                "It looks like a {} error.\nAdd the header's directory to {} of the library being built.",
                "Missing Header".bold().red(),
                "includes".bold().yellow()
            ));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linker_error() {
        let err = "lld-link: error: undefined symbol: foo\nerror LNK2019: unresolved external symbol foo";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("Linker"));
        assert!(msg.contains("native_libs"));
    }

    #[test]
    fn test_include_error() {
        let err = "a1.cpp:1:10: fatal error: 'foo.h' file not found";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("Missing Header"));
    }

    #[test]
    fn test_main_error() {
        let err = "ld: error: undefined symbol: main";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("main()"));
    }

    #[test]
    fn test_unrelated_output() {
        assert!(FeedbackAnalyzer::analyze("a1.cpp:3:5: error: expected ';'").is_none());
    }
}
