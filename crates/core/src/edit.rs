//! Edit Command Processor: applies one named edit operation to an existing
//! budget and recomputes totals.
//!
//! The operation set is a closed tagged union — one handler per variant, so
//! the dispatch is checked for exhaustiveness at compile time. Recoverable
//! failures (`EditTargetNotFound`, `EditAmbiguous`) leave the budget
//! untouched; every successful edit returns a human-readable before/after
//! delta, which doubles as the audit trail.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogSnapshot;
use crate::domain::budget::{Budget, BudgetLine};
use crate::errors::EditError;
use crate::resolver::{line_for_product, sanitize_product_name};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    SetPrice {
        product: Option<String>,
        price_local: Decimal,
        #[serde(default)]
        price_foreign: Option<Decimal>,
    },
    SetForeignPrice {
        price: Decimal,
    },
    SetDate {
        date: NaiveDate,
    },
    SetAddress {
        address: Option<String>,
    },
    RemoveLine {
        product: Option<String>,
    },
    AddLine {
        product: String,
        quantity: Decimal,
        #[serde(default)]
        unit: Option<String>,
        #[serde(default)]
        price_local: Option<Decimal>,
        #[serde(default)]
        price_foreign: Option<Decimal>,
    },
    SetQuantity {
        product: Option<String>,
        quantity: Decimal,
    },
    SubtractQuantity {
        product: Option<String>,
        amount: Decimal,
    },
    SetCustomer {
        name: String,
    },
    SetDelivery {
        fee: Decimal,
    },
    SubstituteProduct {
        product: Option<String>,
        replacement: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditOutcome {
    pub budget: Budget,
    pub summary: String,
}

pub fn apply_edit(
    budget: &Budget,
    command: EditCommand,
    catalog: &CatalogSnapshot,
) -> Result<EditOutcome, EditError> {
    let mut updated = budget.clone();
    let mut recompute = true;

    let summary = match command {
        EditCommand::SetPrice { product, price_local, price_foreign } => {
            let index = find_target(&updated.lines, product.as_deref())?;
            let line = &mut updated.lines[index];
            let old_local = line.unit_price_local;
            line.unit_price_local = price_local;
            let mut summary = format!(
                "{} price: {} -> {} (local)",
                line.product_name,
                fmt_money(old_local),
                fmt_money(price_local)
            );
            if let Some(foreign) = price_foreign {
                let old_foreign = line.unit_price_foreign;
                line.unit_price_foreign = foreign;
                summary.push_str(&format!(
                    ", {} -> {} (foreign)",
                    fmt_money(old_foreign),
                    fmt_money(foreign)
                ));
            }
            line.rescale();
            summary
        }
        EditCommand::SetForeignPrice { price } => {
            if updated.lines.is_empty() {
                return Err(EditError::TargetNotFound { product: String::new() });
            }
            if updated.lines.len() > 1 {
                return Err(EditError::Ambiguous {
                    product: String::new(),
                    candidates: line_names(&updated.lines),
                });
            }
            let line = &mut updated.lines[0];
            let old = line.unit_price_foreign;
            line.unit_price_foreign = price;
            line.rescale();
            format!(
                "{} foreign price: {} -> {}",
                line.product_name,
                fmt_money(old),
                fmt_money(price)
            )
        }
        EditCommand::SetDate { date } => {
            recompute = false;
            let old = updated.date;
            updated.date = date;
            format!("date: {old} -> {date}")
        }
        EditCommand::SetAddress { address } => {
            recompute = false;
            let old = updated.customer_address.take().unwrap_or_else(|| "-".to_string());
            let new = address.clone().unwrap_or_else(|| "-".to_string());
            updated.customer_address = address;
            format!("address: {old} -> {new}")
        }
        EditCommand::RemoveLine { product } => {
            let index = find_target(&updated.lines, product.as_deref())?;
            let removed = updated.lines.remove(index);
            format!("removed {} ({} {})", removed.product_name, removed.quantity, removed.unit)
        }
        EditCommand::AddLine { product, quantity, unit, price_local, price_foreign } => {
            add_line(&mut updated, catalog, &product, quantity, unit, price_local, price_foreign)?
        }
        EditCommand::SetQuantity { product, quantity } => {
            let index = find_target(&updated.lines, product.as_deref())?;
            let line = &mut updated.lines[index];
            let old = line.quantity;
            line.quantity = quantity;
            line.rescale();
            format!("{} quantity: {} -> {}", line.product_name, old, quantity)
        }
        EditCommand::SubtractQuantity { product, amount } => {
            let index = find_target(&updated.lines, product.as_deref())?;
            let remaining = updated.lines[index].quantity - amount;
            if remaining <= Decimal::ZERO {
                let removed = updated.lines.remove(index);
                format!(
                    "removed {} (subtracted {} from {})",
                    removed.product_name, amount, removed.quantity
                )
            } else {
                let line = &mut updated.lines[index];
                let old = line.quantity;
                line.quantity = remaining;
                line.rescale();
                format!("{} quantity: {} -> {}", line.product_name, old, remaining)
            }
        }
        EditCommand::SetCustomer { name } => {
            let old = updated.customer_name.take().unwrap_or_else(|| "-".to_string());
            updated.customer_name = Some(name.clone());
            format!("customer: {old} -> {name}")
        }
        EditCommand::SetDelivery { fee } => {
            let old = updated.delivery_fee;
            updated.delivery_fee = fee;
            format!("delivery fee: {} -> {}", fmt_money(old), fmt_money(fee))
        }
        EditCommand::SubstituteProduct { product, replacement } => {
            let index = find_target(&updated.lines, product.as_deref())?;
            substitute_product(&mut updated.lines[index], catalog, &replacement)
        }
    };

    if recompute {
        updated.recompute_totals();
    }

    Ok(EditOutcome { budget: updated, summary })
}

/// Target-line lookup. With no product given, a single-line budget supplies
/// the implicit target. An explicit product string is matched case-insensitive
/// and bidirectional-substring against line names; zero matches is
/// `TargetNotFound`, several is `Ambiguous`.
fn find_target(lines: &[BudgetLine], product: Option<&str>) -> Result<usize, EditError> {
    let Some(product) = product.map(str::trim).filter(|p| !p.is_empty()) else {
        return match lines.len() {
            0 => Err(EditError::TargetNotFound { product: String::new() }),
            1 => Ok(0),
            _ => Err(EditError::Ambiguous {
                product: String::new(),
                candidates: line_names(lines),
            }),
        };
    };

    let matches = matching_indexes(lines, product);
    match matches.as_slice() {
        [] => Err(EditError::TargetNotFound { product: product.to_string() }),
        [index] => Ok(*index),
        _ => Err(EditError::Ambiguous {
            product: product.to_string(),
            candidates: matches.iter().map(|&i| lines[i].product_name.clone()).collect(),
        }),
    }
}

fn matching_indexes(lines: &[BudgetLine], product: &str) -> Vec<usize> {
    let needle = crate::matching::normalize(product);
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| {
            let name = crate::matching::normalize(&line.product_name);
            name.contains(&needle) || needle.contains(&name)
        })
        .map(|(index, _)| index)
        .collect()
}

fn line_names(lines: &[BudgetLine]) -> Vec<String> {
    lines.iter().map(|line| line.product_name.clone()).collect()
}

fn add_line(
    budget: &mut Budget,
    catalog: &CatalogSnapshot,
    product: &str,
    quantity: Decimal,
    unit: Option<String>,
    price_local: Option<Decimal>,
    price_foreign: Option<Decimal>,
) -> Result<String, EditError> {
    let resolved = catalog.find_by_name(product);

    // Same product already on the budget and no explicit price: grow the
    // existing line instead of duplicating it. The name is resolved against
    // the catalog first, so "camaron titi" never grows a "Camarón" line just
    // because the names overlap.
    if price_local.is_none() && price_foreign.is_none() {
        let merge_index = match resolved {
            Some(found) => {
                let target = crate::matching::normalize(&found.name);
                budget
                    .lines
                    .iter()
                    .position(|line| crate::matching::normalize(&line.product_name) == target)
            }
            None => {
                let matches = matching_indexes(&budget.lines, product);
                match matches.as_slice() {
                    [index] => Some(*index),
                    [] => None,
                    _ => {
                        return Err(EditError::Ambiguous {
                            product: product.to_string(),
                            candidates: matches
                                .iter()
                                .map(|&i| budget.lines[i].product_name.clone())
                                .collect(),
                        })
                    }
                }
            }
        };
        if let Some(index) = merge_index {
            let line = &mut budget.lines[index];
            let old = line.quantity;
            line.quantity += quantity;
            line.rescale();
            return Ok(format!("{} quantity: {} -> {}", line.product_name, old, line.quantity));
        }
    }

    let mut line = match resolved {
        Some(found) => line_for_product(found, quantity),
        None => {
            // Off-catalog additions need an explicit price, mirroring the
            // resolver's rule for unmatched order items.
            let Some(local) = price_local.or(price_foreign) else {
                return Err(EditError::TargetNotFound { product: product.to_string() });
            };
            let mut line = BudgetLine {
                product_name: sanitize_product_name(product),
                quantity,
                unit: unit.clone().unwrap_or_else(|| "kg".to_string()),
                unit_price_local: local,
                unit_price_foreign: price_foreign.unwrap_or(local),
                subtotal_local: Decimal::ZERO,
                subtotal_foreign: Decimal::ZERO,
            };
            line.rescale();
            line
        }
    };

    if let Some(local) = price_local {
        line.unit_price_local = local;
    }
    if let Some(foreign) = price_foreign {
        line.unit_price_foreign = foreign;
    }
    if let Some(unit) = unit {
        line.unit = unit;
    }
    line.rescale();

    let summary = format!(
        "added {}: {} {} @ {}",
        line.product_name,
        line.quantity,
        line.unit,
        fmt_money(line.unit_price_local)
    );
    budget.lines.push(line);
    Ok(summary)
}

fn substitute_product(
    line: &mut BudgetLine,
    catalog: &CatalogSnapshot,
    replacement: &str,
) -> String {
    let old_name = line.product_name.clone();
    match catalog.find_by_name(replacement) {
        Some(found) => {
            line.product_name = found.name.clone();
            line.unit = found.unit.clone();
            line.unit_price_local = found.price_local;
            line.unit_price_foreign = found.price_foreign_or_local();
            line.rescale();
            format!("substituted {} -> {}", old_name, found.name)
        }
        None => {
            let new_name = sanitize_product_name(replacement);
            line.product_name = new_name.clone();
            format!(
                "substituted {old_name} -> {new_name} (warning: not in catalog, price kept)"
            )
        }
    }
}

fn fmt_money(amount: Decimal) -> String {
    amount.round_dp(2).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::catalog::CatalogSnapshot;
    use crate::domain::budget::{Budget, BudgetId, PricingMode};
    use crate::domain::product::{Product, ProductId};
    use crate::errors::EditError;
    use crate::resolver::line_for_product;

    use super::{apply_edit, EditCommand};

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![
                Product {
                    id: ProductId("camaron".to_string()),
                    name: "Camarón".to_string(),
                    unit: "kg".to_string(),
                    price_local: Decimal::from(5),
                    price_foreign: Some(Decimal::from(4)),
                },
                Product {
                    id: ProductId("camaron-titi".to_string()),
                    name: "Camarón Titi".to_string(),
                    unit: "kg".to_string(),
                    price_local: Decimal::from(7),
                    price_foreign: Some(Decimal::from(6)),
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

    fn budget_with_lines(products: &[(&str, i64)]) -> Budget {
        let catalog = catalog();
        let mut budget = Budget::new(
            BudgetId("B-1".to_string()),
            NaiveDate::from_ymd_opt(2025, 5, 2).expect("valid date"),
            PricingMode::Local,
        );
        for (name, quantity) in products {
            let product = catalog.find_by_name(name).expect("fixture product");
            budget.lines.push(line_for_product(product, Decimal::from(*quantity)));
        }
        budget.recompute_totals();
        budget
    }

    #[test]
    fn set_price_rescales_subtotal_and_totals() {
        let budget = budget_with_lines(&[("camaron", 2)]);
        let outcome = apply_edit(
            &budget,
            EditCommand::SetPrice {
                product: Some("camaron".to_string()),
                price_local: Decimal::from(8),
                price_foreign: None,
            },
            &catalog(),
        )
        .expect("edit applies");

        assert_eq!(outcome.budget.lines[0].subtotal_local, Decimal::from(16));
        assert_eq!(outcome.budget.total_local, Decimal::from(16));
        assert!(outcome.summary.contains("5 -> 8"));
    }

    #[test]
    fn subtract_quantity_to_zero_removes_the_line() {
        let budget = budget_with_lines(&[("camaron", 2)]);
        let outcome = apply_edit(
            &budget,
            EditCommand::SubtractQuantity {
                product: Some("camaron".to_string()),
                amount: Decimal::from(2),
            },
            &catalog(),
        )
        .expect("edit applies");

        assert!(outcome.budget.lines.is_empty());
        assert_eq!(outcome.budget.total_local, Decimal::ZERO);
    }

    #[test]
    fn subtract_quantity_partially_rescales() {
        let budget = budget_with_lines(&[("camaron", 5)]);
        let outcome = apply_edit(
            &budget,
            EditCommand::SubtractQuantity { product: None, amount: Decimal::from(2) },
            &catalog(),
        )
        .expect("edit applies");

        assert_eq!(outcome.budget.lines[0].quantity, Decimal::from(3));
        assert_eq!(outcome.budget.total_local, Decimal::from(15));
    }

    #[test]
    fn add_line_on_existing_product_grows_quantity() {
        let budget = budget_with_lines(&[("camaron", 2)]);
        let outcome = apply_edit(
            &budget,
            EditCommand::AddLine {
                product: "camaron".to_string(),
                quantity: Decimal::from(3),
                unit: None,
                price_local: None,
                price_foreign: None,
            },
            &catalog(),
        )
        .expect("edit applies");

        assert_eq!(outcome.budget.lines.len(), 1);
        assert_eq!(outcome.budget.lines[0].quantity, Decimal::from(5));
    }

    #[test]
    fn add_line_with_explicit_price_appends_a_new_line() {
        let budget = budget_with_lines(&[("camaron", 2)]);
        let outcome = apply_edit(
            &budget,
            EditCommand::AddLine {
                product: "camaron".to_string(),
                quantity: Decimal::from(1),
                unit: None,
                price_local: Some(Decimal::from(7)),
                price_foreign: None,
            },
            &catalog(),
        )
        .expect("edit applies");

        assert_eq!(outcome.budget.lines.len(), 2);
        assert_eq!(outcome.budget.lines[1].unit_price_local, Decimal::from(7));
    }

    #[test]
    fn add_line_with_overlapping_name_appends_the_catalog_product() {
        let budget = budget_with_lines(&[("camaron", 2)]);
        let outcome = apply_edit(
            &budget,
            EditCommand::AddLine {
                product: "camaron titi".to_string(),
                quantity: Decimal::from(1),
                unit: None,
                price_local: None,
                price_foreign: None,
            },
            &catalog(),
        )
        .expect("edit applies");

        assert_eq!(outcome.budget.lines.len(), 2);
        assert_eq!(outcome.budget.lines[0].quantity, Decimal::from(2));
        assert_eq!(outcome.budget.lines[1].product_name, "Camarón Titi");
        assert_eq!(outcome.budget.lines[1].unit_price_local, Decimal::from(7));
    }

    #[test]
    fn add_line_resolves_catalog_price_for_new_product() {
        let budget = budget_with_lines(&[("camaron", 2)]);
        let outcome = apply_edit(
            &budget,
            EditCommand::AddLine {
                product: "calamar".to_string(),
                quantity: Decimal::from(2),
                unit: None,
                price_local: None,
                price_foreign: None,
            },
            &catalog(),
        )
        .expect("edit applies");

        assert_eq!(outcome.budget.lines[1].unit_price_local, Decimal::from(18));
        assert_eq!(outcome.budget.total_local, Decimal::from(46));
    }

    #[test]
    fn set_quantity_without_product_is_ambiguous_on_multi_line_budgets() {
        let budget = budget_with_lines(&[("camaron", 2), ("calamar", 1)]);
        let error = apply_edit(
            &budget,
            EditCommand::SetQuantity { product: None, quantity: Decimal::from(4) },
            &catalog(),
        )
        .expect_err("ambiguous");

        assert!(matches!(error, EditError::Ambiguous { .. }));
    }

    #[test]
    fn unknown_target_leaves_budget_unchanged() {
        let budget = budget_with_lines(&[("camaron", 2)]);
        let error = apply_edit(
            &budget,
            EditCommand::RemoveLine { product: Some("pulpo".to_string()) },
            &catalog(),
        )
        .expect_err("no match");

        assert!(matches!(error, EditError::TargetNotFound { ref product } if product == "pulpo"));
    }

    #[test]
    fn set_foreign_price_requires_a_single_line() {
        let budget = budget_with_lines(&[("camaron", 2), ("calamar", 1)]);
        let error =
            apply_edit(&budget, EditCommand::SetForeignPrice { price: Decimal::from(4) }, &catalog())
                .expect_err("two lines");
        assert!(matches!(error, EditError::Ambiguous { .. }));

        let single = budget_with_lines(&[("camaron", 2)]);
        let outcome =
            apply_edit(&single, EditCommand::SetForeignPrice { price: Decimal::from(6) }, &catalog())
                .expect("edit applies");
        assert_eq!(outcome.budget.lines[0].unit_price_foreign, Decimal::from(6));
    }

    #[test]
    fn set_delivery_recomputes_totals() {
        let budget = budget_with_lines(&[("camaron", 2)]);
        let outcome =
            apply_edit(&budget, EditCommand::SetDelivery { fee: Decimal::from(3) }, &catalog())
                .expect("edit applies");

        assert_eq!(outcome.budget.total_local, Decimal::from(13));
    }

    #[test]
    fn set_date_does_not_touch_totals() {
        let mut budget = budget_with_lines(&[("camaron", 2)]);
        budget.total_local = Decimal::from(99); // stale on purpose
        let outcome = apply_edit(
            &budget,
            EditCommand::SetDate { date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("date") },
            &catalog(),
        )
        .expect("edit applies");

        assert_eq!(outcome.budget.total_local, Decimal::from(99));
        assert_eq!(outcome.budget.date, NaiveDate::from_ymd_opt(2025, 6, 1).expect("date"));
    }

    #[test]
    fn substitute_product_adopts_catalog_price() {
        let budget = budget_with_lines(&[("camaron", 2)]);
        let outcome = apply_edit(
            &budget,
            EditCommand::SubstituteProduct { product: None, replacement: "calamar".to_string() },
            &catalog(),
        )
        .expect("edit applies");

        assert_eq!(outcome.budget.lines[0].product_name, "Calamar");
        assert_eq!(outcome.budget.lines[0].unit_price_local, Decimal::from(18));
        assert_eq!(outcome.budget.total_local, Decimal::from(36));
    }

    #[test]
    fn substitute_to_off_catalog_keeps_price_and_warns() {
        let budget = budget_with_lines(&[("camaron", 2)]);
        let outcome = apply_edit(
            &budget,
            EditCommand::SubstituteProduct { product: None, replacement: "langostino".to_string() },
            &catalog(),
        )
        .expect("edit applies");

        assert_eq!(outcome.budget.lines[0].product_name, "Langostino");
        assert_eq!(outcome.budget.lines[0].unit_price_local, Decimal::from(5));
        assert!(outcome.summary.contains("warning"));
    }

    #[test]
    fn edit_command_round_trips_through_json() {
        let command = EditCommand::SetQuantity {
            product: Some("camaron".to_string()),
            quantity: Decimal::from(4),
        };
        let encoded = serde_json::to_string(&command).expect("encode");
        assert!(encoded.contains("\"op\":\"set_quantity\""));
        let decoded: EditCommand = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, command);
    }
}
