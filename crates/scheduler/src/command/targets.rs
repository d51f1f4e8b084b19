use std::collections::HashSet;
use std::path::Path;

/// Read a target list: one target per line, blank lines and `#` comments
/// skipped, duplicates dropped keeping the first occurrence.
pub async fn read_targets(path: &Path) -> std::io::Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_targets(&content))
}

pub fn parse_targets(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| seen.insert(*line))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blanks_and_comments() {
        let content = "# scope\nexample.com\n\n  api.example.com  \n# end\n";
        assert_eq!(parse_targets(content), vec!["example.com", "api.example.com"]);
    }

    #[test]
    fn drops_duplicates_in_order() {
        let content = "b.example\na.example\nb.example\n";
        assert_eq!(parse_targets(content), vec!["b.example", "a.example"]);
    }

    #[test]
    fn empty_file_has_no_targets() {
        assert!(parse_targets("").is_empty());
        assert!(parse_targets("\n# nothing\n").is_empty());
    }
}
