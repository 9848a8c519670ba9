//! Functions for processing individual scanned payloads.

use crate::actions::action_for;
use crate::cart::ProductCatalog;
use crate::classifier::Classifier;
use crate::models::{ScanRecord, ScanResult};

/// Classifies one raw payload and attaches the follow-up action.
///
/// Blank input is skipped rather than classified. A payload that looked like
/// a link but could not be parsed is shown as plain text, with the error kept
/// in `classification_error`.
///
/// # Arguments
/// * `raw` - The decoded text as received from the capture device.
/// * `classifier` - The classifier to apply.
/// * `catalog` - Optional product catalog for serial-number matches.
pub(crate) fn process_scan(
    raw: &str,
    classifier: &Classifier,
    catalog: Option<&ProductCatalog>,
) -> ScanRecord {
    if raw.trim().is_empty() {
        tracing::debug!(target: "process_scan", "Skipping blank payload.");
        return ScanRecord {
            raw: raw.to_string(),
            result: None,
            action: None,
            product: None,
            skipped: true,
            skip_reason: Some("Blank payload".to_string()),
            classification_error: None,
        };
    }

    let (result, classification_error) = match classifier.classify(raw) {
        Ok(result) => (result, None),
        Err(e) => {
            tracing::warn!(target: "process_scan", "Showing payload as text: {}", e);
            (ScanResult::text(raw), Some(e.to_string()))
        }
    };

    let product = catalog.and_then(|c| c.lookup(raw)).cloned();
    let action = action_for(&result, product.as_ref());

    tracing::info!(target: "process_scan", "Classified payload as '{}'", result.tag());

    ScanRecord {
        raw: raw.to_string(),
        result: Some(result),
        action: Some(action),
        product,
        skipped: false,
        skip_reason: None,
        classification_error,
    }
}
