//! Grouping of the inventory by content category.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sweepfile_core::{Category, FileRecord};

/// Inventory subsets keyed by category. Empty categories are absent.
pub type CategoryMap = BTreeMap<Category, Vec<FileRecord>>;

/// Per-category totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    pub file_count: u64,
    pub total_size: u64,
}

/// Split `inventory` by category, preserving inventory order within each.
pub fn group_by_category(inventory: &[FileRecord]) -> CategoryMap {
    let mut groups = CategoryMap::new();
    for record in inventory {
        groups
            .entry(record.category)
            .or_default()
            .push(record.clone());
    }
    groups
}

/// Totals for each non-empty category, largest first.
pub fn summarize(groups: &CategoryMap) -> Vec<CategorySummary> {
    let mut summaries: Vec<CategorySummary> = groups
        .iter()
        .map(|(category, files)| CategorySummary {
            category: *category,
            file_count: files.len() as u64,
            total_size: files.iter().map(|f| f.size).sum(),
        })
        .collect();
    summaries.sort_by(|a, b| b.total_size.cmp(&a.total_size).then(a.category.cmp(&b.category)));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_and_summarize() {
        let inventory = vec![
            FileRecord::new("/s/a.jpg", 10, 0),
            FileRecord::new("/s/b.mp4", 500, 0),
            FileRecord::new("/s/c.png", 30, 0),
        ];
        let groups = group_by_category(&inventory);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&Category::Image].len(), 2);
        assert!(!groups.contains_key(&Category::Audio));

        let summary = summarize(&groups);
        assert_eq!(summary[0].category, Category::Video);
        assert_eq!(summary[1].total_size, 40);
    }
}
