use std::path::Path;

/// Category tag, language and test flag derived from a repository-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileKind {
    pub kind: &'static str,
    pub language: Option<&'static str>,
    pub is_test: bool,
}

impl FileKind {
    fn new(kind: &'static str, language: Option<&'static str>) -> Self {
        Self {
            kind,
            language,
            is_test: kind == "test",
        }
    }
}

pub fn classify_kind(rel_path: &str) -> FileKind {
    let extension = Path::new(rel_path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "py" => {
            let is_test = rel_path.starts_with("tests/")
                || rel_path.starts_with("test_")
                || rel_path.contains("/test_")
                || rel_path.ends_with("_test.py");
            if is_test {
                FileKind::new("test", Some("python"))
            } else if rel_path.starts_with("scripts/") {
                FileKind::new("script", Some("python"))
            } else {
                FileKind::new("python", Some("python"))
            }
        }
        "rs" => {
            if rel_path.starts_with("tests/")
                || rel_path.contains("/tests/")
                || rel_path.ends_with("_test.rs")
            {
                FileKind::new("test", Some("rust"))
            } else {
                FileKind::new("rust", Some("rust"))
            }
        }
        "yml" | "yaml" => FileKind::new("config", Some("yaml")),
        "json" => FileKind::new("config", Some("json")),
        "toml" => FileKind::new("config", Some("toml")),
        "md" => FileKind::new("doc", Some("markdown")),
        "sh" | "bash" => FileKind::new("script", Some("bash")),
        "ts" | "tsx" => FileKind::new("typescript", Some("typescript")),
        "js" | "jsx" => FileKind::new("javascript", Some("javascript")),
        "txt" | "log" => FileKind::new("doc", None),
        _ => FileKind::new("other", None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_variants() {
        assert_eq!(classify_kind("tests/test_engine.py").kind, "test");
        assert!(classify_kind("pkg/test_utils.py").is_test);
        assert_eq!(classify_kind("pkg/engine_test.py").kind, "test");
        assert_eq!(classify_kind("scripts/release.py").kind, "script");
        assert_eq!(classify_kind("pkg/engine.py").kind, "python");
    }

    #[test]
    fn rust_tests_are_detected() {
        assert_eq!(classify_kind("crates/core/tests/e2e.rs").kind, "test");
        assert_eq!(classify_kind("src/lib.rs").kind, "rust");
    }

    #[test]
    fn config_and_docs() {
        assert_eq!(classify_kind("config/app.YAML").kind, "config");
        assert_eq!(classify_kind("Cargo.toml").language, Some("toml"));
        assert_eq!(classify_kind("README.md").kind, "doc");
        assert_eq!(classify_kind("notes.txt").kind, "doc");
        assert_eq!(classify_kind("Makefile").kind, "other");
        assert!(!classify_kind("Makefile").is_test);
    }
}
