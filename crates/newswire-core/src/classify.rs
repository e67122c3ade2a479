//! Keyword topic classifier for articles whose source supplies no category.
//!
//! Rules are an ordered table checked against the lowercased title +
//! description; the first category with a matching keyword wins and
//! unmatched text falls back to "general".

/// Category slug returned when no rule matches
pub const DEFAULT_CATEGORY: &str = "general";

/// One classification rule: a target category and the keywords that select it
struct Rule {
    category: &'static str,
    keywords: &'static [&'static str],
}

const RULES: &[Rule] = &[
    Rule {
        category: "business",
        keywords: &[
            "stock", "market", "econom", "finance", "financial", "invest", "trade",
            "bank", "inflation", "earnings", "startup", "ipo", "merger", "revenue",
        ],
    },
    Rule {
        category: "sports",
        keywords: &[
            "match", "league", "tournament", "championship", "football", "soccer",
            "basketball", "tennis", "cricket", "olympic", "goal", "coach", "playoff",
        ],
    },
    Rule {
        category: "technology",
        keywords: &[
            "ai", "artificial intelligence", "software", "app", "device", "smartphone",
            "chip", "robot", "cyber", "internet", "gadget", "silicon", "computing",
        ],
    },
    Rule {
        category: "health",
        keywords: &[
            "health", "clinical", "hospital", "vaccine", "disease", "doctor",
            "patient", "drug", "medical", "virus", "therapy", "mental health",
        ],
    },
    Rule {
        category: "science",
        keywords: &[
            "research", "study", "scientist", "space", "nasa", "climate",
            "physics", "biology", "discovery", "telescope", "experiment",
        ],
    },
    Rule {
        category: "entertainment",
        keywords: &[
            "film", "movie", "music", "celebrity", "actor", "actress", "album",
            "concert", "festival", "tv series", "box office", "hollywood",
        ],
    },
];

/// Keyword-based topic classifier.
///
/// Pure and deterministic: identical input always yields the same slug.
pub struct Classifier {
    rules: &'static [Rule],
}

impl Classifier {
    pub fn new() -> Self {
        Self { rules: RULES }
    }

    /// Infer a category slug from an article's title and description.
    pub fn classify(&self, title: &str, description: &str) -> &'static str {
        let haystack = format!("{} {}", title, description).to_lowercase();

        for rule in self.rules {
            if rule
                .keywords
                .iter()
                .any(|keyword| contains_keyword(&haystack, keyword))
            {
                return rule.category;
            }
        }

        DEFAULT_CATEGORY
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Match a keyword at word start, so "ai" does not fire inside "said".
/// Keywords ending in a letter may still extend to the right ("econom"
/// matches "economy" and "economic").
fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    let mut search_from = 0;
    while let Some(pos) = haystack[search_from..].find(keyword) {
        let start = search_from + pos;
        let at_word_start = start == 0
            || !haystack[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());

        // Short keywords must also end at a word boundary
        let end = start + keyword.len();
        let needs_right_boundary = keyword.len() <= 3;
        let at_word_end = end >= haystack.len()
            || !haystack[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric());

        if at_word_start && (!needs_right_boundary || at_word_end) {
            return true;
        }
        search_from = start + 1;
    }
    false
}
