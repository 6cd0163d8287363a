//! The cart of catalog picks awaiting a quotation.
//!
//! A line's id is derived from `(brand, name, page, price)` so the same pick
//! can only be held once.

use serde::{Deserialize, Serialize};

use crate::catalog::{extract_price, product_name};
use crate::domain::catalog::CatalogProduct;
use crate::domain::quotation::LineItem;
use crate::domain::FormNumber;

const KEY_SEPARATOR: char = '|';

/// Stable identity of a pick. Components are taken as given and escaped, so
/// no two distinct inputs share a key.
pub fn cart_key(brand: &str, name: &str, page: u32, price: &str) -> String {
    let mut key = String::with_capacity(brand.len() + name.len() + price.len() + 8);
    push_escaped(&mut key, brand);
    key.push(KEY_SEPARATOR);
    push_escaped(&mut key, name);
    key.push(KEY_SEPARATOR);
    key.push_str(&page.to_string());
    key.push(KEY_SEPARATOR);
    push_escaped(&mut key, price);
    key
}

fn push_escaped(out: &mut String, component: &str) {
    for ch in component.chars() {
        if ch == '\\' || ch == KEY_SEPARATOR {
            out.push('\\');
        }
        out.push(ch);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub name: String,
    pub price: String,
    #[serde(rename = "rawText")]
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLine {
    /// Builds the line for a catalog product picked under `brand`. A missing
    /// or zero listed price is recovered from the text when possible.
    pub fn from_product(brand: &str, product: &CatalogProduct) -> Self {
        let name = product
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| product_name(&product.text));
        let price = product
            .listed_price()
            .map(str::to_string)
            .or_else(|| extract_price(&product.text))
            .unwrap_or_default();

        Self {
            id: cart_key(brand, &name, product.page, &price),
            name,
            price,
            raw_text: product.text.clone(),
            image: product.primary_image().map(str::to_string),
        }
    }

    pub fn to_line_item(&self) -> LineItem {
        LineItem {
            name: self.name.clone(),
            price: FormNumber::new(self.price.clone()),
            quantity: FormNumber::from(1),
            discount_percent: FormNumber::from(0),
            image: self.image.clone(),
            raw_text: self.raw_text.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the line unless one with the same id is already held. Returns
    /// whether the cart changed.
    pub fn add(&mut self, line: CartLine) -> bool {
        if self.contains(&line.id) {
            return false;
        }
        self.lines.push(line);
        true
    }

    pub fn add_pick(&mut self, brand: &str, product: &CatalogProduct) -> bool {
        self.add(CartLine::from_product(brand, product))
    }

    /// Removes the line at `index`, if there is one.
    pub fn remove(&mut self, index: usize) -> Option<CartLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lines.iter().any(|line| line.id == id)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn to_line_items(&self) -> Vec<LineItem> {
        self.lines.iter().map(CartLine::to_line_item).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{cart_key, Cart, CartLine};
    use crate::domain::catalog::CatalogProduct;

    fn product(text: &str, price: &str, page: u32) -> CatalogProduct {
        CatalogProduct {
            text: text.to_string(),
            price: price.into(),
            images: vec![String::new(), "/static/images/p12_2.png".to_string()],
            page,
            ..CatalogProduct::default()
        }
    }

    #[test]
    fn key_is_deterministic() {
        assert_eq!(cart_key("Aquant", "9272", 4, "35000"), "Aquant|9272|4|35000");
        assert_eq!(cart_key("Aquant", "9272", 4, "35000"), cart_key("Aquant", "9272", 4, "35000"));
    }

    #[test]
    fn blank_parts_do_not_collide_with_placeholder_values() {
        assert_eq!(cart_key("Aquant", "", 4, ""), "Aquant||4|");
        assert_ne!(cart_key("Aquant", "", 4, ""), cart_key("Aquant", "item", 4, "0"));
        assert_ne!(cart_key("Aquant", "", 4, "0"), cart_key("Aquant", "", 4, ""));
    }

    #[test]
    fn key_escaping_keeps_delimiter_bearing_inputs_apart() {
        let left = cart_key("a|b", "c", 1, "2");
        let right = cart_key("a", "b|c", 1, "2");
        assert_ne!(left, right);
        assert_eq!(left, r"a\|b|c|1|2");
        assert_ne!(cart_key(r"a\", "b", 1, "2"), cart_key("a", r"\b", 1, "2"));
    }

    #[test]
    fn adding_the_same_pick_twice_keeps_one_line() {
        let mut cart = Cart::new();
        let pick = product("AQUANT 9272\nMRP : ` 35,000/-", "35000", 4);

        assert!(cart.add_pick("Aquant", &pick));
        assert!(!cart.add_pick("Aquant", &pick));
        assert_eq!(cart.len(), 1);

        assert!(cart.add_pick("Kohler", &pick));
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn pick_without_listed_price_recovers_it_from_text() {
        let line = CartLine::from_product("Kohler", &product("Veil toilet\nMRP : Rs. 51,000", "0", 9));

        assert_eq!(line.name, "Veil toilet");
        assert_eq!(line.price, "51000");
        assert_eq!(line.image.as_deref(), Some("/static/images/p12_2.png"));
        assert_eq!(line.id, "Kohler|Veil toilet|9|51000");
    }

    #[test]
    fn remove_by_index_drops_only_that_line() {
        let mut cart = Cart::new();
        cart.add_pick("Aquant", &product("A 1001", "1001", 1));
        cart.add_pick("Aquant", &product("B 1002", "1002", 1));
        cart.add_pick("Aquant", &product("C 1003", "1003", 1));

        let removed = cart.remove(1).expect("line at index 1");
        assert_eq!(removed.name, "B 1002");
        assert!(!cart.contains(&removed.id));
        assert_eq!(cart.len(), 2);
        assert!(cart.remove(7).is_none());

        assert!(cart.add(removed));
        assert_eq!(cart.len(), 3);
    }

    #[test]
    fn cart_lines_become_default_line_items() {
        let mut cart = Cart::new();
        cart.add_pick("Aquant", &product("AQUANT 9272", "35000", 4));

        let items = cart.to_line_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity.as_str(), "1");
        assert_eq!(items[0].discount_percent.as_str(), "0");
        assert_eq!(items[0].price.as_str(), "35000");

        cart.clear();
        assert!(cart.is_empty());
    }
}
