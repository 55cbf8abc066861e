//! Message classification
//!
//! A document is classified by the first balanced command fragment found,
//! checking kinds in a fixed priority order. A kind whose start tag is never
//! closed falls through to the next one.

use super::scanner::{find_element, Scanner};

/// Envelope element wrapping every MOS document
pub const ENVELOPE_TAG: &str = "mos";

/// MOS command kinds, in classification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    RoCreate,
    RoUpdate,
    RoDelete,
    RoReplace,
    StoryInsert,
    StoryReplace,
    StoryDelete,
    StoryMove,
    StorySwap,
    StoryStatus,
}

impl CommandKind {
    /// Every kind, in priority order
    pub const ALL: [CommandKind; 10] = [
        CommandKind::RoCreate,
        CommandKind::RoUpdate,
        CommandKind::RoDelete,
        CommandKind::RoReplace,
        CommandKind::StoryInsert,
        CommandKind::StoryReplace,
        CommandKind::StoryDelete,
        CommandKind::StoryMove,
        CommandKind::StorySwap,
        CommandKind::StoryStatus,
    ];

    /// Element name of the command fragment
    pub fn tag(&self) -> &'static str {
        match self {
            CommandKind::RoCreate => "roCreate",
            CommandKind::RoUpdate => "roUpdate",
            CommandKind::RoDelete => "roDelete",
            CommandKind::RoReplace => "roReplace",
            CommandKind::StoryInsert => "roStoryInsert",
            CommandKind::StoryReplace => "roStoryReplace",
            CommandKind::StoryDelete => "roStoryDelete",
            CommandKind::StoryMove => "roStoryMove",
            CommandKind::StorySwap => "roStorySwap",
            CommandKind::StoryStatus => "roStoryStatus",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// True when the document carries a `<mos>` start tag
pub fn has_envelope(document: &str) -> bool {
    Scanner::new(document).has_start_tag(ENVELOPE_TAG)
}

/// First command kind with a balanced fragment, or `None` (unrecognized)
pub fn classify(document: &str) -> Option<CommandKind> {
    if !has_envelope(document) {
        return None;
    }
    CommandKind::ALL
        .into_iter()
        .find(|kind| find_element(document, kind.tag()).is_some())
}

/// First command kind whose start tag appears, balanced or not
///
/// Used to report why an enveloped document was not classified.
pub fn first_start_tag(document: &str) -> Option<CommandKind> {
    let scanner = Scanner::new(document);
    CommandKind::ALL
        .into_iter()
        .find(|kind| scanner.has_start_tag(kind.tag()))
}
