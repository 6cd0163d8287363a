use serde::{Deserialize, Serialize};

use crate::domain::catalog::CatalogQuery;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// A model or SKU lookup; at most one result is wanted.
    Exact,
    /// Free text; a ranked list is wanted.
    Fuzzy,
}

/// One row of the classification table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryRule {
    /// Any token shaped like `K-28362IN` or `9272A`.
    ModelCodeToken,
    /// A single all-digit token of three or more digits.
    LoneNumber,
    /// A single token of four or more characters mixing letters and digits.
    LoneAlphanumeric,
    /// Up to three tokens naming a known brand next to a number.
    BrandWithNumber,
}

impl QueryRule {
    pub const ORDER: [QueryRule; 4] = [
        QueryRule::ModelCodeToken,
        QueryRule::LoneNumber,
        QueryRule::LoneAlphanumeric,
        QueryRule::BrandWithNumber,
    ];

    fn matches(self, tokens: &[String], known_brands: &[String]) -> bool {
        match self {
            Self::ModelCodeToken => tokens.iter().any(|token| is_model_code(token)),
            Self::LoneNumber => tokens.len() == 1 && is_long_number(&tokens[0]),
            Self::LoneAlphanumeric => {
                let [token] = tokens else {
                    return false;
                };
                token.len() >= 4
                    && token.chars().any(|ch| ch.is_ascii_lowercase())
                    && token.chars().any(|ch| ch.is_ascii_digit())
            }
            Self::BrandWithNumber => {
                tokens.len() <= 3
                    && tokens.iter().any(|token| is_long_number(token))
                    && tokens.iter().any(|token| known_brands.iter().any(|brand| brand == token))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryClassifier {
    known_brands: Vec<String>,
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(["kohler", "aquant"])
    }
}

impl QueryClassifier {
    pub fn new<I, S>(known_brands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            known_brands: known_brands
                .into_iter()
                .map(|brand| brand.as_ref().trim().to_lowercase())
                .filter(|brand| !brand.is_empty())
                .collect(),
        }
    }

    /// `None` for a blank query: nothing should be looked up.
    pub fn classify(&self, query: &str) -> Option<QueryKind> {
        self.explain(query).map(|(kind, _)| kind)
    }

    /// Classification together with the rule that decided it. Fuzzy queries
    /// carry no rule.
    pub fn explain(&self, query: &str) -> Option<(QueryKind, Option<QueryRule>)> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let tokens = tokenize(query);
        let rule = QueryRule::ORDER
            .into_iter()
            .find(|rule| !tokens.is_empty() && rule.matches(&tokens, &self.known_brands));

        Some(match rule {
            Some(rule) => (QueryKind::Exact, Some(rule)),
            None => (QueryKind::Fuzzy, None),
        })
    }

    /// Turns raw search input into the catalog request to send, or `None`
    /// when the query is blank. A brand of `all` means no brand filter; an
    /// explicit `exact` request is honoured even for fuzzy-looking text.
    pub fn plan(&self, q: &str, brand: Option<&str>, force_exact: bool) -> Option<SearchPlan> {
        let kind = self.classify(q)?;
        let exact = force_exact || kind == QueryKind::Exact;
        let brand = brand
            .map(str::trim)
            .filter(|brand| !brand.is_empty() && !brand.eq_ignore_ascii_case("all"))
            .map(str::to_string);

        Some(SearchPlan {
            query: CatalogQuery { q: q.trim().to_string(), brand, exact },
            kind,
            limit: exact.then_some(1),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchPlan {
    pub query: CatalogQuery,
    pub kind: QueryKind,
    /// Maximum number of results to keep.
    pub limit: Option<usize>,
}

impl SearchPlan {
    pub fn restrict<T>(&self, mut results: Vec<T>) -> Vec<T> {
        if let Some(limit) = self.limit {
            results.truncate(limit);
        }
        results
    }
}

/// Lowercase runs of letters, digits, `/` and `-`. Everything else separates
/// tokens, so model codes such as `k-28362in` stay whole.
fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|ch: char| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '/' || ch == '-'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_long_number(token: &str) -> bool {
    token.len() >= 3 && token.bytes().all(|byte| byte.is_ascii_digit())
}

/// `[a-z]{1,5}[-/]?[0-9]{2,}[a-z0-9/-]*` over the whole token.
fn is_model_code(token: &str) -> bool {
    let bytes = token.as_bytes();
    let letters = bytes.iter().take_while(|byte| byte.is_ascii_lowercase()).count();
    if !(1..=5).contains(&letters) {
        return false;
    }

    let mut rest = &bytes[letters..];
    if let Some(b'-' | b'/') = rest.first() {
        rest = &rest[1..];
    }

    let digits = rest.iter().take_while(|byte| byte.is_ascii_digit()).count();
    digits >= 2
        && rest[digits..]
            .iter()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || matches!(byte, b'-' | b'/'))
}

#[cfg(test)]
mod tests {
    use super::{QueryClassifier, QueryKind, QueryRule};

    fn classify(query: &str) -> Option<QueryKind> {
        QueryClassifier::default().classify(query)
    }

    #[test]
    fn reference_queries_classify_as_documented() {
        assert_eq!(classify("9272"), Some(QueryKind::Exact));
        assert_eq!(classify("K-28362IN"), Some(QueryKind::Exact));
        assert_eq!(classify("shower mixer"), Some(QueryKind::Fuzzy));
        assert_eq!(classify("kohler 1234"), Some(QueryKind::Exact));
        assert_eq!(classify(""), None);
        assert_eq!(classify("   "), None);
    }

    #[test]
    fn each_rule_is_reachable_in_order() {
        let classifier = QueryClassifier::default();
        let rule = |query: &str| classifier.explain(query).and_then(|(_, rule)| rule);

        assert_eq!(rule("wall mixer K-28362IN"), Some(QueryRule::ModelCodeToken));
        assert_eq!(rule("9272"), Some(QueryRule::LoneNumber));
        assert_eq!(rule("2592brg"), Some(QueryRule::LoneAlphanumeric));
        assert_eq!(rule("aquant 2592"), Some(QueryRule::BrandWithNumber));
        assert_eq!(rule("shower mixer"), None);
    }

    #[test]
    fn model_code_shape_boundaries() {
        assert_eq!(classify("abcdef12"), Some(QueryKind::Exact)); // six letters, but lone alphanumeric
        assert_eq!(classify("basin abcdef12"), Some(QueryKind::Fuzzy));
        assert_eq!(classify("basin k1"), Some(QueryKind::Fuzzy));
        assert_eq!(classify("basin 9272a"), Some(QueryKind::Fuzzy));
        assert_eq!(classify("basin k/2592-cp"), Some(QueryKind::Exact));
    }

    #[test]
    fn brand_rule_needs_a_known_brand_and_a_short_query() {
        assert_eq!(classify("jaquar 1234"), Some(QueryKind::Fuzzy));
        assert_eq!(classify("kohler wall 1234"), Some(QueryKind::Exact));
        assert_eq!(classify("kohler wall hung 1234"), Some(QueryKind::Fuzzy));
        assert_eq!(classify("kohler 12"), Some(QueryKind::Fuzzy));

        let classifier = QueryClassifier::new(["Jaquar"]);
        assert_eq!(classifier.classify("jaquar 1234"), Some(QueryKind::Exact));
    }

    #[test]
    fn punctuation_only_queries_are_fuzzy_not_blank() {
        assert_eq!(classify("???"), Some(QueryKind::Fuzzy));
    }

    #[test]
    fn plan_restricts_exact_queries_to_one_result() {
        let classifier = QueryClassifier::default();

        let plan = classifier.plan(" 9272 ", Some("all"), false).expect("plan");
        assert_eq!(plan.query.q, "9272");
        assert_eq!(plan.query.brand, None);
        assert!(plan.query.exact);
        assert_eq!(plan.restrict(vec![1, 2, 3]), vec![1]);

        let plan = classifier.plan("shower mixer", Some("Kohler"), false).expect("plan");
        assert_eq!(plan.query.brand.as_deref(), Some("Kohler"));
        assert_eq!(plan.limit, None);
        assert_eq!(plan.restrict(vec![1, 2, 3]), vec![1, 2, 3]);

        let plan = classifier.plan("shower mixer", None, true).expect("plan");
        assert_eq!(plan.kind, QueryKind::Fuzzy);
        assert_eq!(plan.limit, Some(1));

        assert!(classifier.plan("", None, true).is_none());
    }
}
