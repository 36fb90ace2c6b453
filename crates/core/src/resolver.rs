//! Order Resolver: turns the structured parse produced by the language
//! understanding service into priced budget lines against a catalog snapshot.
//!
//! Per-item resolution runs in strict priority order:
//! 1. exact catalog-id match, when the parser supplied one
//! 2. exact, then bidirectional-substring, case-insensitive name match
//! 3. off-catalog line, when the item carries a custom price
//! 4. unmatched: excluded from the budget and reported back

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogSnapshot;
use crate::domain::budget::{BudgetLine, PricingMode};
use crate::domain::product::{Product, ProductId};
use crate::errors::OrderResolutionError;

/// One interpreted order line, before catalog resolution. This is the wire
/// shape the language understanding service emits (camelCase JSON).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedOrderItem {
    pub requested_name: String,
    #[serde(default)]
    pub matched_product_id: Option<ProductId>,
    #[serde(default)]
    pub suggested_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub custom_price_local: Option<Decimal>,
    #[serde(default)]
    pub custom_price_foreign: Option<Decimal>,
    #[serde(default)]
    pub dollar_amount: Option<Decimal>,
    #[serde(default)]
    pub confidence: f64,
}

/// The full structured parse for one free-text message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedOrder {
    #[serde(default)]
    pub items: Vec<ParsedOrderItem>,
    #[serde(default)]
    pub unmatched_texts: Vec<String>,
    #[serde(default)]
    pub delivery_fee: Option<Decimal>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub settle_in_foreign_currency: Option<bool>,
    #[serde(default)]
    pub mark_paid: Option<bool>,
    #[serde(default)]
    pub pricing_mode: Option<PricingMode>,
    #[serde(default)]
    pub explicit_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub lines: Vec<BudgetLine>,
    pub unmatched: Vec<String>,
}

pub fn resolve_order(
    items: &[ParsedOrderItem],
    catalog: &CatalogSnapshot,
    mode: PricingMode,
) -> Result<Resolution, OrderResolutionError> {
    let mut lines = Vec::new();
    let mut unmatched = Vec::new();

    for item in items {
        match resolve_item(item, catalog, mode) {
            Some(line) => lines.push(line),
            None => unmatched.push(item.requested_name.clone()),
        }
    }

    if lines.is_empty() {
        return Err(OrderResolutionError { unmatched });
    }

    Ok(Resolution { lines, unmatched })
}

/// Price a resolved catalog product into a budget line. Both bases are always
/// stored; the foreign base falls back to the local one when the catalog
/// carries no foreign price.
pub fn line_for_product(product: &Product, quantity: Decimal) -> BudgetLine {
    let mut line = BudgetLine {
        product_name: product.name.clone(),
        quantity,
        unit: product.unit.clone(),
        unit_price_local: product.price_local,
        unit_price_foreign: product.price_foreign_or_local(),
        subtotal_local: Decimal::ZERO,
        subtotal_foreign: Decimal::ZERO,
    };
    line.rescale();
    line
}

fn resolve_item(
    item: &ParsedOrderItem,
    catalog: &CatalogSnapshot,
    mode: PricingMode,
) -> Option<BudgetLine> {
    let product = item
        .matched_product_id
        .as_ref()
        .and_then(|product_id| catalog.find_by_id(product_id))
        .or_else(|| catalog.find_by_name(&item.requested_name))
        .or_else(|| {
            item.suggested_name.as_deref().and_then(|suggested| catalog.find_by_name(suggested))
        });

    let (product_name, unit, catalog_local, catalog_foreign) = match product {
        Some(product) => (
            product.name.clone(),
            product.unit.clone(),
            Some(product.price_local),
            product.price_foreign,
        ),
        None => {
            // Off-catalog lines are only admitted when the buyer already
            // negotiated a price; otherwise the item stays unmatched.
            if item.custom_price_local.is_none() && item.custom_price_foreign.is_none() {
                return None;
            }
            let name = sanitize_product_name(&item.requested_name);
            if name.is_empty() {
                return None;
            }
            let unit = item.unit.clone().unwrap_or_else(|| "kg".to_string());
            (name, unit, None, None)
        }
    };

    let effective_local = item
        .custom_price_local
        .or(catalog_local)
        .or(item.custom_price_foreign)
        .unwrap_or(Decimal::ZERO);
    let effective_foreign =
        item.custom_price_foreign.or(catalog_foreign).unwrap_or(effective_local);

    let quantity = match item.dollar_amount {
        Some(amount) => {
            let divisor = match mode {
                PricingMode::Foreign => effective_foreign,
                PricingMode::Local | PricingMode::Dual => effective_local,
            };
            if divisor.is_zero() {
                return None;
            }
            (amount / divisor).round_dp(3)
        }
        None => item.quantity.unwrap_or(Decimal::ONE),
    };

    let mut line = BudgetLine {
        product_name,
        quantity,
        unit: item.unit.clone().unwrap_or(unit),
        unit_price_local: effective_local,
        unit_price_foreign: effective_foreign,
        subtotal_local: Decimal::ZERO,
        subtotal_foreign: Decimal::ZERO,
    };
    line.rescale();
    Some(line)
}

/// Clean a raw off-catalog mention into a presentable product name: drop
/// leading quantity/unit tokens, cut a trailing "a $N" price clause, then
/// title-case what remains.
pub fn sanitize_product_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let without_price = strip_trailing_price_clause(&lowered);

    let mut words: Vec<&str> = without_price.split_whitespace().collect();
    while let Some(first) = words.first() {
        if is_quantity_token(first) || is_unit_token(first) {
            words.remove(0);
            // "2kg de camaron" — the connector goes with the quantity.
            if matches!(words.first(), Some(&"de")) {
                words.remove(0);
            }
        } else {
            break;
        }
    }

    words.iter().map(|word| title_case(word)).collect::<Vec<_>>().join(" ")
}

fn strip_trailing_price_clause(text: &str) -> &str {
    if let Some(position) = text.rfind(" a ") {
        let tail = text[position + 3..].trim_start();
        let looks_like_price = tail
            .strip_prefix('$')
            .map(|rest| rest.chars().next().is_some_and(|c| c.is_ascii_digit()))
            .unwrap_or_else(|| tail.chars().next().is_some_and(|c| c.is_ascii_digit()));
        if looks_like_price {
            return text[..position].trim_end();
        }
    }
    text
}

fn is_quantity_token(token: &str) -> bool {
    let stripped = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
}

fn is_unit_token(token: &str) -> bool {
    matches!(
        token,
        "kg" | "kilo"
            | "kilos"
            | "g"
            | "gr"
            | "gramos"
            | "unidad"
            | "unidades"
            | "docena"
            | "docenas"
            | "caja"
            | "cajas"
            | "paquete"
            | "paquetes"
    )
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::catalog::CatalogSnapshot;
    use crate::domain::budget::PricingMode;
    use crate::domain::product::{Product, ProductId};

    use super::{resolve_order, sanitize_product_name, ParsedOrderItem};

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![
                Product {
                    id: ProductId("camaron".to_string()),
                    name: "Camarón".to_string(),
                    unit: "kg".to_string(),
                    price_local: Decimal::from(10),
                    price_foreign: Some(Decimal::from(9)),
                },
                Product {
                    id: ProductId("calamar".to_string()),
                    name: "Calamar".to_string(),
                    unit: "kg".to_string(),
                    price_local: Decimal::from(18),
                    price_foreign: None,
                },
            ],
            Decimal::from(36),
        )
    }

    fn item(name: &str) -> ParsedOrderItem {
        ParsedOrderItem {
            requested_name: name.to_string(),
            matched_product_id: None,
            suggested_name: None,
            quantity: None,
            unit: None,
            custom_price_local: None,
            custom_price_foreign: None,
            dollar_amount: None,
            confidence: 0.9,
        }
    }

    #[test]
    fn custom_price_overrides_catalog_price() {
        // "2kg shrimp a $8" in local mode.
        let mut shrimp = item("camaron");
        shrimp.quantity = Some(Decimal::from(2));
        shrimp.custom_price_local = Some(Decimal::from(8));

        let resolution =
            resolve_order(&[shrimp], &catalog(), PricingMode::Local).expect("resolved");
        assert_eq!(resolution.lines.len(), 1);
        let line = &resolution.lines[0];
        assert_eq!(line.quantity, Decimal::from(2));
        assert_eq!(line.unit_price_local, Decimal::from(8));
        assert_eq!(line.subtotal_local, Decimal::from(16));
    }

    #[test]
    fn dollar_amount_derives_quantity_at_three_decimals() {
        // "$20 de calamari": 20 / 18 = 1.111.
        let mut squid = item("calamar");
        squid.dollar_amount = Some(Decimal::from(20));

        let resolution = resolve_order(&[squid], &catalog(), PricingMode::Local).expect("resolved");
        let line = &resolution.lines[0];
        assert_eq!(line.quantity, Decimal::new(1111, 3));
        assert_eq!(line.subtotal_local, Decimal::new(2000, 2));
    }

    #[test]
    fn dollar_amount_uses_foreign_price_in_foreign_mode() {
        let mut shrimp = item("camaron");
        shrimp.dollar_amount = Some(Decimal::from(18));

        let resolution =
            resolve_order(&[shrimp], &catalog(), PricingMode::Foreign).expect("resolved");
        assert_eq!(resolution.lines[0].quantity, Decimal::from(2));
    }

    #[test]
    fn catalog_id_match_takes_priority_over_name() {
        let mut mislabeled = item("pulpo fresco");
        mislabeled.matched_product_id = Some(ProductId("calamar".to_string()));
        mislabeled.quantity = Some(Decimal::ONE);

        let resolution =
            resolve_order(&[mislabeled], &catalog(), PricingMode::Local).expect("resolved");
        assert_eq!(resolution.lines[0].product_name, "Calamar");
    }

    #[test]
    fn off_catalog_item_with_custom_price_gets_sanitized_name() {
        let mut crab = item("2kg de jaiba a $12");
        crab.quantity = Some(Decimal::from(2));
        crab.custom_price_local = Some(Decimal::from(12));

        let resolution = resolve_order(&[crab], &catalog(), PricingMode::Local).expect("resolved");
        let line = &resolution.lines[0];
        assert_eq!(line.product_name, "Jaiba");
        assert_eq!(line.unit_price_local, Decimal::from(12));
        assert_eq!(line.unit_price_foreign, Decimal::from(12));
    }

    #[test]
    fn unmatched_item_without_price_is_reported_not_priced() {
        let mut shrimp = item("camaron");
        shrimp.quantity = Some(Decimal::ONE);
        let mystery = item("cosa rara");

        let resolution =
            resolve_order(&[shrimp, mystery], &catalog(), PricingMode::Local).expect("resolved");
        assert_eq!(resolution.lines.len(), 1);
        assert_eq!(resolution.unmatched, vec!["cosa rara".to_string()]);
    }

    #[test]
    fn zero_resolved_lines_is_a_resolution_error() {
        let error = resolve_order(&[item("cosa rara")], &catalog(), PricingMode::Local)
            .expect_err("nothing resolvable");
        assert_eq!(error.unmatched, vec!["cosa rara".to_string()]);
    }

    #[test]
    fn foreign_price_defaults_to_local_when_catalog_has_none() {
        let mut squid = item("calamar");
        squid.quantity = Some(Decimal::ONE);

        let resolution = resolve_order(&[squid], &catalog(), PricingMode::Dual).expect("resolved");
        assert_eq!(resolution.lines[0].unit_price_foreign, Decimal::from(18));
    }

    #[test]
    fn sanitizes_leading_quantities_and_trailing_price_clauses() {
        assert_eq!(sanitize_product_name("2kg de camaron titi a $10"), "Camaron Titi");
        assert_eq!(sanitize_product_name("3 kilos pescado blanco"), "Pescado Blanco");
        assert_eq!(sanitize_product_name("jaiba a 12"), "Jaiba");
        assert_eq!(sanitize_product_name("pulpo a la gallega"), "Pulpo A La Gallega");
    }
}
