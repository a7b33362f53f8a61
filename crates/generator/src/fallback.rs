use taskpub_core::GeneratedFile;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const README_MD: &str = include_str!("../assets/README.md");
const SCRIPT_JS: &str = include_str!("../assets/script.js");
const STYLE_CSS: &str = include_str!("../assets/style.css");

/// Fixed site published when the model's output cannot be used.
pub fn fallback_files() -> Vec<GeneratedFile> {
    vec![
        GeneratedFile::new("index.html", INDEX_HTML),
        GeneratedFile::new("README.md", README_MD),
        GeneratedFile::new("script.js", SCRIPT_JS),
        GeneratedFile::new("style.css", STYLE_CSS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_set() {
        let files = fallback_files();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["index.html", "README.md", "script.js", "style.css"]);
        assert!(files.iter().all(GeneratedFile::is_publishable));
    }

    #[test]
    fn test_index_links_assets() {
        assert!(INDEX_HTML.contains("style.css"));
        assert!(INDEX_HTML.contains("script.js"));
    }
}
