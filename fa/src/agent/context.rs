//! Grounding context formatting and the context-lock gate

use crate::domain::EvidenceDocument;

/// Render evidence as `- Source: <source>\n  Fact: <text>\n\n`, in order
///
/// Documents with blank text carry no evidence and are skipped.
pub fn format_context(documents: &[EvidenceDocument]) -> String {
    let mut context = String::new();
    for doc in documents.iter().filter(|d| !d.text.trim().is_empty()) {
        context.push_str("- Source: ");
        context.push_str(doc.source());
        context.push_str("\n  Fact: ");
        context.push_str(&doc.text);
        context.push_str("\n\n");
    }
    context
}

/// The context-lock gate: inference may only run on non-blank context
pub fn is_grounded(context: &str) -> bool {
    !context.trim().is_empty()
}
