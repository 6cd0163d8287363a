use serde::Serialize;

/// Ordered price extraction rules over OCR text. The first rule that yields a
/// number wins.
///
/// This is best-effort: catalog layouts vary and [`PriceRule::LastLongNumber`]
/// in particular will happily pick up a long model code when the text carries
/// no MRP label at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceRule {
    /// First digit run on the first line mentioning `MRP`.
    MrpLine,
    /// `MRP` anywhere, followed by filler and then a digit run.
    MrpAnywhere,
    /// Last digit run with at least four digits.
    LastLongNumber,
}

impl PriceRule {
    pub const ORDER: [PriceRule; 3] =
        [PriceRule::MrpLine, PriceRule::MrpAnywhere, PriceRule::LastLongNumber];

    pub fn apply(self, text: &str) -> Option<String> {
        match self {
            Self::MrpLine => {
                let line = text.lines().find(|line| contains_mrp(line))?;
                numeric_runs(line).into_iter().next()
            }
            Self::MrpAnywhere => {
                let start = text.to_ascii_lowercase().find("mrp")?;
                let rest = &text[start + 3..];
                let digit = rest.find(|ch: char| ch.is_ascii_digit())?;
                numeric_runs(&rest[digit..]).into_iter().next()
            }
            Self::LastLongNumber => {
                numeric_runs(text).into_iter().filter(|digits| digits.len() >= 4).last()
            }
        }
    }
}

/// Digits-only price found in `text`, or `None` when no rule matches.
pub fn extract_price(text: &str) -> Option<String> {
    extract_price_with_rule(text).map(|(price, _)| price)
}

pub fn extract_price_with_rule(text: &str) -> Option<(String, PriceRule)> {
    PriceRule::ORDER.into_iter().find_map(|rule| rule.apply(text).map(|price| (price, rule)))
}

fn contains_mrp(line: &str) -> bool {
    line.to_ascii_lowercase().contains("mrp")
}

/// Maximal runs of digits and thousands separators, separators removed.
/// Runs made only of separators are skipped.
fn numeric_runs(text: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        match ch {
            '0'..='9' => current.push(ch),
            ',' => {}
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}
