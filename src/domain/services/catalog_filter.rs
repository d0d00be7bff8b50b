use crate::domain::entities::Package;

/// Narrows a catalog by a search query and a category. Empty fields match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    search_query: String,
    category: String,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Case-insensitive substring match on name or id; exact category match.
    pub fn matches(&self, package: &Package) -> bool {
        let query = self.search_query.trim().to_lowercase();
        if !query.is_empty()
            && !package.name.to_lowercase().contains(&query)
            && !package.id.to_lowercase().contains(&query)
        {
            return false;
        }

        self.category.is_empty() || package.category == self.category
    }

    pub fn apply(&self, packages: &[Package]) -> Vec<Package> {
        packages.iter().filter(|p| self.matches(p)).cloned().collect()
    }
}

/// Distinct non-empty categories, sorted.
pub fn categories(packages: &[Package]) -> Vec<String> {
    let mut categories: Vec<String> = packages
        .iter()
        .filter(|p| !p.category.is_empty())
        .map(|p| p.category.clone())
        .collect();
    categories.sort();
    categories.dedup();
    categories
}
