//! Directory listing parsing
//!
//! The publisher serves a plain web-server index. Rather than depend on its
//! markup, every token that looks like a path ending in `.zip` is collected
//! from the page body.

use crate::error::Result;
use regex::RegexBuilder;
use std::collections::BTreeSet;
use tracing::debug;

const ARCHIVE_PATTERN: &str = r"([A-Za-z0-9_\-./\\]+\.zip)";

/// Extract archive base names from a listing page, deduplicated and sorted
pub fn parse_listing(body: &str) -> Result<Vec<String>> {
    let pattern = RegexBuilder::new(ARCHIVE_PATTERN)
        .case_insensitive(true)
        .build()?;

    let names: BTreeSet<String> = pattern
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| base_name(m.as_str()).to_string())
        .filter(|name| !name.is_empty())
        .collect();

    debug!(count = names.len(), "Parsed archive names from listing");

    Ok(names.into_iter().collect())
}

fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const APACHE_INDEX: &str = r#"
<html><head><title>Index of /dados/cnpj/dados_abertos_cnpj/2025-11</title></head>
<body>
<table>
<tr><td><a href="Empresas1.zip">Empresas1.zip</a></td><td>2025-11-10 09:12</td><td>67M</td></tr>
<tr><td><a href="Empresas0.zip">Empresas0.zip</a></td><td>2025-11-10 09:12</td><td>412M</td></tr>
<tr><td><a href="/dados/cnpj/dados_abertos_cnpj/2025-11/Cnaes.zip">Cnaes.zip</a></td></tr>
<tr><td><a href="Simples.ZIP">Simples.ZIP</a></td></tr>
<tr><td><a href="LEIAME.pdf">LEIAME.pdf</a></td></tr>
</table>
</body></html>
"#;

    #[test]
    fn test_parse_listing_dedups_and_sorts() {
        let names = parse_listing(APACHE_INDEX).unwrap();
        assert_eq!(names, vec!["Cnaes.zip", "Empresas0.zip", "Empresas1.zip", "Simples.ZIP"]);
    }

    #[test]
    fn test_parse_listing_windows_separators() {
        let names = parse_listing(r"see dados\2025-11\Paises.zip and Paises.zip").unwrap();
        assert_eq!(names, vec!["Paises.zip"]);
    }

    #[test]
    fn test_parse_listing_without_archives() {
        assert!(parse_listing("<html>nothing to see</html>").unwrap().is_empty());
    }
}
