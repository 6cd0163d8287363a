use serde::Serialize;
use showroom_core::catalog::{QueryClassifier, QueryKind, QueryRule};

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct Classification {
    query: String,
    kind: QueryKind,
    rule: Option<QueryRule>,
    limit: Option<usize>,
}

/// Shows how a search box entry would be routed, using the configured brands.
pub fn run(query: &str) -> CommandResult {
    let config = match load_config("classify") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let classifier = QueryClassifier::new(&config.catalog.known_brands);

    let Some((kind, rule)) = classifier.explain(query) else {
        return CommandResult::failure("classify", "invalid_input", "query is blank", 8);
    };

    let classification = Classification {
        query: query.trim().to_string(),
        kind,
        rule,
        limit: (kind == QueryKind::Exact).then_some(1),
    };
    let message = match rule {
        Some(rule) => format!("exact lookup ({rule:?})"),
        None => "fuzzy search".to_string(),
    };
    CommandResult::success_with_data("classify", message, &classification)
}
