use std::collections::HashSet;

use super::parser::ChunkCandidates;
use crate::episode::{Book, Product};

/// Case-insensitive identity of a candidate record
pub trait DedupKey {
    fn dedup_key(&self) -> (String, String);
}

impl DedupKey for Book {
    fn dedup_key(&self) -> (String, String) {
        (self.title.to_lowercase(), self.author.to_lowercase())
    }
}

impl DedupKey for Product {
    fn dedup_key(&self) -> (String, String) {
        (self.name.to_lowercase(), self.description.to_lowercase())
    }
}

/// Drop later duplicates (case-insensitive on the full pair), keeping the
/// first-seen spelling and first-occurrence order
pub fn dedup_case_insensitive<T: DedupKey>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.dedup_key()))
        .collect()
}

/// Merged candidates of every chunk of one episode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedCandidates {
    pub books: Vec<Book>,
    pub products: Vec<Product>,
    /// Summary fragments in chunk order
    pub summary_fragments: Vec<String>,
}

impl MergedCandidates {
    /// Fragments concatenated without a separator, as sent to the summary call
    pub fn summary_input(&self) -> String {
        self.summary_fragments.concat()
    }
}

/// Combine per-chunk candidates in chunk order
pub fn merge_candidates(chunks: impl IntoIterator<Item = ChunkCandidates>) -> MergedCandidates {
    let mut books = Vec::new();
    let mut products = Vec::new();
    let mut summary_fragments = Vec::new();

    for chunk in chunks {
        books.extend(chunk.books);
        products.extend(chunk.products);
        summary_fragments.extend(chunk.summary_fragment);
    }

    MergedCandidates {
        books: dedup_case_insensitive(books),
        products: dedup_case_insensitive(products),
        summary_fragments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books(pairs: &[(&str, &str)]) -> Vec<Book> {
        pairs.iter().map(|(t, a)| Book::new(*t, *a)).collect()
    }

    #[test]
    fn test_first_seen_casing_wins() {
        let merged = dedup_case_insensitive(books(&[
            ("Atomic Habits", "James Clear"),
            ("ATOMIC HABITS", "james clear"),
            ("Deep Work", "Cal Newport"),
        ]));
        assert_eq!(
            merged,
            books(&[("Atomic Habits", "James Clear"), ("Deep Work", "Cal Newport")])
        );
    }

    #[test]
    fn test_same_title_different_author_kept() {
        let merged = dedup_case_insensitive(books(&[("Dune", "Frank Herbert"), ("Dune", "Brian Herbert")]));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_dedup_is_idempotent_on_self_concatenation() {
        let list = books(&[
            ("B", "2"),
            ("a", "1"),
            ("b", "2"),
            ("C", "3"),
            ("A", "1"),
        ]);

        let once = dedup_case_insensitive(list.clone());
        let doubled: Vec<Book> = list.iter().chain(list.iter()).cloned().collect();
        assert_eq!(dedup_case_insensitive(doubled), once);
        assert_eq!(dedup_case_insensitive(once.clone()), once);
    }

    #[test]
    fn test_order_of_first_occurrence() {
        let merged = dedup_case_insensitive(vec![
            Product::new("z", "last letter"),
            Product::new("a", "first letter"),
            Product::new("Z", "LAST LETTER"),
            Product::new("m", "middle"),
        ]);
        let names: Vec<_> = merged.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_merge_across_chunks() {
        let chunk = |fragment: Option<&str>| ChunkCandidates {
            books: books(&[("Atomic Habits", "James Clear")]),
            products: vec![],
            summary_fragment: fragment.map(str::to_string),
        };

        let merged = merge_candidates(vec![chunk(Some("first. ")), chunk(None), chunk(Some("second."))]);
        assert_eq!(merged.books, books(&[("Atomic Habits", "James Clear")]));
        assert_eq!(merged.summary_fragments.len(), 2);
        assert_eq!(merged.summary_input(), "first. second.");
    }
}
