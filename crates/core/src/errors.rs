use thiserror::Error;

/// Free-text resolution produced no usable line at all. The caller re-prompts
/// the operator; no partial budget is ever created from this state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("no order line could be resolved; unmatched: {}", unmatched.join(", "))]
pub struct OrderResolutionError {
    pub unmatched: Vec<String>,
}

/// Recoverable edit failures. Both variants leave the budget untouched and
/// are reported back as explanatory text, never surfaced as crashes.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no budget line matches `{product}`")]
    TargetNotFound { product: String },
    #[error("`{product}` matches several lines: {}", candidates.join(", "))]
    Ambiguous { product: String, candidates: Vec<String> },
}
