use crate::episode::{Book, Product};
use crate::error::{PodwiseError, Result};

/// Candidates extracted from one chunk's response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkCandidates {
    pub books: Vec<Book>,
    pub products: Vec<Product>,
    pub summary_fragment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Books,
    Products,
    Summary,
}

const LABELS: [(&str, Section); 3] = [
    ("BOOKS:", Section::Books),
    ("PRODUCTS:", Section::Products),
    ("SUMMARY:", Section::Summary),
];

/// Parse a labeled `BOOKS:` / `PRODUCTS:` / `SUMMARY:` response.
///
/// List lines are split on the first `" by "` (books) or `" - "` (products);
/// lines without the separator are ignored. A section whose whole content is
/// `none` contributes nothing. A response with no labels at all is an error.
pub fn parse_chunk_response(response: &str) -> Result<ChunkCandidates> {
    let mut books = Vec::new();
    let mut products = Vec::new();
    let mut summary = Vec::new();
    let mut current: Option<Section> = None;

    for line in response.lines() {
        let line = line.trim();

        if let Some((section, rest)) = match_label(line) {
            current = Some(section);
            if !rest.is_empty() {
                push_line(section, rest, &mut books, &mut products, &mut summary);
            }
            continue;
        }

        if let Some(section) = current {
            push_line(section, line, &mut books, &mut products, &mut summary);
        }
    }

    if current.is_none() {
        return Err(PodwiseError::Extraction(
            "response has no BOOKS/PRODUCTS/SUMMARY sections".to_string(),
        ));
    }

    let mut candidates = ChunkCandidates::default();

    if !is_none_marker(&books) {
        candidates.books = books
            .iter()
            .filter_map(|line| strip_list_marker(line).split_once(" by "))
            .map(|(title, author)| Book::new(title.trim(), author.trim()))
            .filter(|b| !b.title.is_empty())
            .collect();
    }

    if !is_none_marker(&products) {
        candidates.products = products
            .iter()
            .filter_map(|line| strip_list_marker(line).split_once(" - "))
            .map(|(name, description)| Product::new(name.trim(), description.trim()))
            .filter(|p| !p.name.is_empty())
            .collect();
    }

    let fragment = summary.join("\n").trim().to_string();
    if !fragment.is_empty() {
        candidates.summary_fragment = Some(fragment);
    }

    Ok(candidates)
}

fn push_line<'a>(
    section: Section,
    line: &'a str,
    books: &mut Vec<&'a str>,
    products: &mut Vec<&'a str>,
    summary: &mut Vec<&'a str>,
) {
    match section {
        Section::Books => books.push(line),
        Section::Products => products.push(line),
        Section::Summary => summary.push(line),
    }
}

/// Match a section label at the start of a line (case-insensitive, markdown
/// emphasis and heading marks ignored). Returns the text after the label.
fn match_label(line: &str) -> Option<(Section, &str)> {
    let bare = line.trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());

    LABELS.iter().find_map(|(label, section)| {
        let head = bare.get(..label.len())?;
        if head.eq_ignore_ascii_case(label) {
            let rest = bare[label.len()..].trim_matches(|c: char| c == '*' || c.is_whitespace());
            Some((*section, rest))
        } else {
            None
        }
    })
}

fn is_none_marker(lines: &[&str]) -> bool {
    let content = lines.join("\n");
    let content = content.trim().trim_end_matches('.');
    content.eq_ignore_ascii_case("none")
}

/// Strip a leading bullet (`-`, `*`, `•`) or number (`1.`, `1)`)
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();

    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return rest.trim_start();
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }

    line
}
