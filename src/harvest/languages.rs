//! Language to source-file-extension registry

/// File extensions scanned for the given language, or `None` when the
/// language is not registered. Lookup is case-insensitive.
pub fn extensions_for(language: &str) -> Option<&'static [&'static str]> {
    match language.to_lowercase().as_str() {
        "c" => Some(&[".c"]),
        "c++" => Some(&[".cpp", ".cxx", ".c"]),
        "java" => Some(&[".java"]),
        "c#" => Some(&[".cs"]),
        "javascript" | "js" => Some(&[".js", ".jsx"]),
        "python" => Some(&[".py"]),
        "php" => Some(&[".php"]),
        _ => None,
    }
}
