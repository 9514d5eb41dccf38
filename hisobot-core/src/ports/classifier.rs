//! Remote classification port

use crate::domain::result::Result;

/// Maps free text onto one of the supplied category labels.
///
/// Implementations return the label string verbatim; the caller
/// validates it against the dictionary (exact match only). Any error
/// from this port is recovered by the local fallback rules.
pub trait LabelClassifier: Send + Sync {
    fn classify(
        &self,
        text: &str,
        income_labels: &[String],
        expense_labels: &[String],
    ) -> Result<String>;
}

/// Free-form financial Q&A over a prepared context summary.
/// Narrative generation itself is out of core scope.
pub trait Analyst: Send + Sync {
    fn answer(&self, question: &str, context: &str) -> Result<String>;
}
