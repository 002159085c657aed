use crate::config::BuildFile;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Default build file name, looked up in the current directory
pub const BUILD_FILE: &str = "bitweave.toml";

// --- Helper: Load Build File ---
pub fn load_config(path: &Path) -> Result<BuildFile> {
    if !path.exists() {
        return Err(anyhow::anyhow!(
            "{} not found.\n\n\
            💡 Tip: create one with a [project] table and at least one [[library]] entry.",
            path.display()
        ));
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} - check file permissions", path.display()))?;
    toml::from_str(&text).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors and unknown keys",
            path.display()
        )
    })
}

/// Splits a language standard into family (`c`, `c++`, `gnu`, `gnu++`) and year,
/// resolving the pre-release year aliases (`c++1z` is `c++17`).
fn split_standard(version: &str) -> (&str, String) {
    let family = ["gnu++", "c++", "gnu", "c"]
        .into_iter()
        .find(|f| version.starts_with(f))
        .unwrap_or("");
    let year = &version[family.len()..];
    let is_cpp = family.ends_with("++");
    let year = match year {
        "0x" => "11",
        "1y" => "14",
        "1z" => "17",
        "2a" => "20",
        "2b" => "23",
        "2c" => "26",
        "98" if is_cpp => "03",
        "90" if !is_cpp => "89",
        "18" if !is_cpp => "17",
        "2x" if !is_cpp => "23",
        other => other,
    };
    (family, year.to_string())
}

/// Clang language-standard flag for a library version string.
///
/// Accepts `c++17`, `-std=c++17`, aliases like `c++1z`; `None` for an empty version.
pub fn std_flag_clang(version: &str) -> Option<String> {
    let normalized = version.trim().to_lowercase();
    let bare = normalized.strip_prefix("-std=").unwrap_or(&normalized);
    if bare.is_empty() {
        return None;
    }
    let (family, year) = split_standard(bare);
    Some(format!("-std={}{}", family, year))
}

/// MSVC `/std:` flag for a library version string.
///
/// MSVC knows fewer standards: C++ below 14 becomes `c++14`, C below 11
/// becomes `c11`, anything newer than it names becomes `latest`.
pub fn std_flag_msvc(version: &str) -> Option<String> {
    let normalized = version.trim().to_lowercase();
    if normalized.starts_with("/std:") {
        return Some(normalized);
    }
    let bare = normalized.strip_prefix("-std=").unwrap_or(&normalized);
    if bare.is_empty() {
        return None;
    }
    let (family, year) = split_standard(bare);
    let flag = if family.ends_with("++") {
        match year.as_str() {
            "03" | "11" | "14" => "c++14",
            "17" => "c++17",
            "20" => "c++20",
            _ => "c++latest",
        }
    } else {
        match year.as_str() {
            "89" | "99" | "11" => "c11",
            "17" => "c17",
            _ => "clatest",
        }
    };
    Some(format!("/std:{}", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_flag_clang_cpp_standards() {
        assert_eq!(std_flag_clang("c++11").as_deref(), Some("-std=c++11"));
        assert_eq!(std_flag_clang("c++17").as_deref(), Some("-std=c++17"));
        assert_eq!(std_flag_clang("C++20").as_deref(), Some("-std=c++20"));
        assert_eq!(std_flag_clang("c++98").as_deref(), Some("-std=c++03"));
    }

    #[test]
    fn test_std_flag_clang_aliases() {
        assert_eq!(std_flag_clang("c++0x").as_deref(), Some("-std=c++11"));
        assert_eq!(std_flag_clang("c++1z").as_deref(), Some("-std=c++17"));
        assert_eq!(std_flag_clang("gnu++2a").as_deref(), Some("-std=gnu++20"));
        assert_eq!(std_flag_clang("c2x").as_deref(), Some("-std=c23"));
        assert_eq!(std_flag_clang("gnu18").as_deref(), Some("-std=gnu17"));
    }

    #[test]
    fn test_std_flag_clang_strip_prefix_and_empty() {
        assert_eq!(std_flag_clang("-std=c++17").as_deref(), Some("-std=c++17"));
        assert_eq!(std_flag_clang("  "), None);
    }

    #[test]
    fn test_std_flag_msvc() {
        assert_eq!(std_flag_msvc("c++11").as_deref(), Some("/std:c++14"));
        assert_eq!(std_flag_msvc("c++17").as_deref(), Some("/std:c++17"));
        assert_eq!(std_flag_msvc("-std=c++20").as_deref(), Some("/std:c++20"));
        assert_eq!(std_flag_msvc("c++23").as_deref(), Some("/std:c++latest"));
        assert_eq!(std_flag_msvc("c99").as_deref(), Some("/std:c11"));
        assert_eq!(std_flag_msvc("c17").as_deref(), Some("/std:c17"));
        assert_eq!(std_flag_msvc("/std:c++20").as_deref(), Some("/std:c++20"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("definitely/missing/bitweave.toml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
