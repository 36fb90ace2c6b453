//! Prompt construction and tolerant decoding for the language understanding
//! step. The model sees the catalog and the known customer roster so it can
//! anchor its guesses, but its output is only a proposal: everything it emits
//! is re-resolved deterministically against the catalog afterwards.

use marea_core::catalog::CatalogSnapshot;
use marea_core::resolver::ParsedOrder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("model returned malformed order JSON: {detail}")]
    Malformed { detail: String },
}

/// Build the extraction prompt for one free-text order message.
pub fn order_prompt(text: &str, catalog: &CatalogSnapshot, customer_names: &[String]) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You convert colloquial seafood orders (usually Spanish) into JSON.\n\
         Respond with a single JSON object and nothing else, using this shape:\n\
         {\"items\": [{\"requestedName\": str, \"matchedProductId\": str?, \"suggestedName\": str?, \
         \"quantity\": number?, \"unit\": str?, \"customPriceLocal\": number?, \
         \"customPriceForeign\": number?, \"dollarAmount\": number?, \"confidence\": number}], \
         \"unmatchedTexts\": [str], \"deliveryFee\": number?, \"customerName\": str?, \
         \"customerAddress\": str?, \"settleInForeignCurrency\": bool?, \"markPaid\": bool?, \
         \"pricingMode\": (\"local\"|\"foreign\"|\"dual\")?, \"explicitDate\": \"YYYY-MM-DD\"?}\n\
         Never invent prices. Only set matchedProductId when you are sure.\n\n",
    );

    prompt.push_str("Catalog:\n");
    for product in &catalog.products {
        prompt.push_str(&format!(
            "  - id={} name={} unit={} price_local={}",
            product.id.0, product.name, product.unit, product.price_local
        ));
        if let Some(foreign) = product.price_foreign {
            prompt.push_str(&format!(" price_foreign={foreign}"));
        }
        prompt.push('\n');
    }

    if !customer_names.is_empty() {
        prompt.push_str("\nKnown customers:\n");
        for name in customer_names {
            prompt.push_str(&format!("  - {name}\n"));
        }
    }

    prompt.push_str("\nOrder message:\n");
    prompt.push_str(text);
    prompt
}

/// Decode the model's reply into a [`ParsedOrder`]. Models wrap JSON in code
/// fences or chatter around it often enough that we cut out the outermost
/// object before deserializing.
pub fn decode_order(reply: &str) -> Result<ParsedOrder, ParseError> {
    let json = extract_json_object(reply)
        .ok_or_else(|| ParseError::Malformed { detail: "no JSON object in reply".to_string() })?;
    serde_json::from_str(json).map_err(|error| ParseError::Malformed { detail: error.to_string() })
}

fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}
