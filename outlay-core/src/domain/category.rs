//! Advisory category list offered to expense producers

/// Categories suggested to producers; the store never validates against these
pub const DEFAULT_CATEGORIES: [&str; 12] = [
    "Food & Dining",
    "Shopping",
    "Housing",
    "Transportation",
    "Entertainment",
    "Healthcare",
    "Education",
    "Utilities",
    "Travel",
    "Personal Care",
    "Investments",
    "Other",
];

/// Merge the suggested categories with the ones already in use, sorted alphabetically
pub fn all_categories<S: AsRef<str>>(in_use: &[String], defaults: &[S]) -> Vec<String> {
    let mut all: Vec<String> = defaults.iter().map(|c| c.as_ref().to_string()).collect();
    for category in in_use {
        if !all.contains(category) {
            all.push(category.clone());
        }
    }
    all.sort();
    all.dedup();
    all
}
