//! Command fragment extraction

use super::classifier::CommandKind;
use super::scanner::find_element;

/// Smallest `<tag>...</tag>` block for the given kind
///
/// `None` when the start tag is absent or never closed; the dispatcher
/// treats that as an unrecognized message.
pub fn extract(kind: CommandKind, document: &str) -> Option<&str> {
    find_element(document, kind.tag()).map(|element| element.outer)
}
