use anyhow::{bail, Context, Result};
use log::info;
use std::path::Path;

/// Reads a label vocabulary, one label per line, in model output order.
pub fn load_vocabulary(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read label vocabulary {}", path.display()))?;

    let vocabulary = parse_vocabulary(&contents);
    if vocabulary.is_empty() {
        bail!("Label vocabulary {} is empty", path.display());
    }

    info!("Loaded {} labels from {}", vocabulary.len(), path.display());
    Ok(vocabulary)
}

/// Blank lines and `#` comments are skipped. A leading WordNet id
/// (`n04467665 trailer_truck`) is stripped.
pub fn parse_vocabulary(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once(char::is_whitespace) {
            Some((head, rest)) if is_wordnet_id(head) => rest.trim().to_string(),
            _ => line.to_string(),
        })
        .collect()
}

fn is_wordnet_id(token: &str) -> bool {
    token.len() == 9
        && token.starts_with('n')
        && token[1..].chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_labels() {
        let vocabulary = parse_vocabulary("tench\ngoldfish\n\n  street_sign  \n");
        assert_eq!(vocabulary, vec!["tench", "goldfish", "street_sign"]);
    }

    #[test]
    fn strip_wordnet_ids() {
        let vocabulary = parse_vocabulary("# synsets\nn04467665 trailer_truck\nn09193705 alp\nnot_an_id label\n");
        assert_eq!(vocabulary, vec!["trailer_truck", "alp", "not_an_id label"]);
    }

    #[test]
    fn missing_file() {
        assert!(load_vocabulary("/nonexistent/labels.txt").is_err());
    }
}
