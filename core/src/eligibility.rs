use url::Url;

/// Source of the "this page is excluded" signal.
pub trait Eligibility: Send + Sync {
    fn is_excluded(&self, location: &Url) -> bool;
}

/// Default exclusion rules for the music database pages that carry action
/// links.
#[derive(Debug, Clone)]
pub struct PageRules {
    /// Search result types that render action links.
    pub searchable_types: Vec<String>,
}

impl Default for PageRules {
    fn default() -> Self {
        Self {
            searchable_types: vec!["release".to_string(), "recording".to_string()],
        }
    }
}

impl Eligibility for PageRules {
    fn is_excluded(&self, location: &Url) -> bool {
        let segments: Vec<&str> = location
            .path_segments()
            .map(|s| s.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            ["search"] => {
                let search_type = location
                    .query_pairs()
                    .find(|(key, _)| key == "type")
                    .map(|(_, value)| value.into_owned());
                let excluded = !search_type
                    .as_deref()
                    .is_some_and(|t| self.searchable_types.iter().any(|s| s == t));
                if excluded {
                    tracing::debug!(
                        "no action links on {} search page",
                        search_type.as_deref().unwrap_or("untyped")
                    );
                }
                excluded
            }
            ["release", "add", ..] => true,
            ["release-group" | "cdtoc", _, _, ..] => true,
            _ => false,
        }
    }
}
