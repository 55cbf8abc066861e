//! Typed command records
//!
//! Parsing never fails: a missing element yields an empty string (required
//! identifiers) or `None` (optional values). Handlers decide what is
//! semantically required.

use super::classifier::CommandKind;
use super::scanner::{element_text, find_element};

/// Running order create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoCreate {
    pub ro_id: String,
    pub slug: String,
    /// Raw `mosExternalMetadata` contents
    pub meta: Option<String>,
}

/// Running order metadata update (only present fields are applied)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoUpdate {
    pub ro_id: String,
    pub slug: Option<String>,
    pub meta: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoDelete {
    pub ro_id: String,
}

/// Running order replace (unconditional overwrite)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoReplace {
    pub ro_id: String,
    pub slug: String,
    pub meta: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryInsert {
    pub ro_id: String,
    pub story_id: String,
    pub story_slug: String,
    /// Place the new story right after this one
    pub story_id_before: Option<String>,
    /// Place the new story right before this one
    pub story_id_after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryReplace {
    pub ro_id: String,
    pub story_id: String,
    pub story_slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDelete {
    pub ro_id: String,
    pub story_id: String,
}

/// Story reorder between two anchors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryMove {
    pub ro_id: String,
    pub story_id: String,
    /// Story that should precede the moved one
    pub story_id_before: Option<String>,
    /// Story that should follow the moved one
    pub story_id_after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySwap {
    pub ro_id: String,
    pub story_id1: String,
    pub story_id2: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryStatus {
    pub ro_id: String,
    pub story_id: String,
    /// Status string as received
    pub status: Option<String>,
}

/// One parsed MOS command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MosCommand {
    RoCreate(RoCreate),
    RoUpdate(RoUpdate),
    RoDelete(RoDelete),
    RoReplace(RoReplace),
    StoryInsert(StoryInsert),
    StoryReplace(StoryReplace),
    StoryDelete(StoryDelete),
    StoryMove(StoryMove),
    StorySwap(StorySwap),
    StoryStatus(StoryStatus),
}

impl MosCommand {
    /// Parse an extracted fragment into the record for `kind`
    pub fn parse(kind: CommandKind, fragment: &str) -> Self {
        let ro_id = required(fragment, "roID");
        match kind {
            CommandKind::RoCreate => MosCommand::RoCreate(RoCreate {
                ro_id,
                slug: rundown_slug(fragment).unwrap_or_default(),
                meta: meta(fragment),
            }),
            CommandKind::RoUpdate => MosCommand::RoUpdate(RoUpdate {
                ro_id,
                slug: rundown_slug(fragment),
                meta: meta(fragment),
            }),
            CommandKind::RoDelete => MosCommand::RoDelete(RoDelete { ro_id }),
            CommandKind::RoReplace => MosCommand::RoReplace(RoReplace {
                ro_id,
                slug: rundown_slug(fragment).unwrap_or_default(),
                meta: meta(fragment),
            }),
            CommandKind::StoryInsert => MosCommand::StoryInsert(StoryInsert {
                ro_id,
                story_id: required(fragment, "storyID"),
                story_slug: required(fragment, "storySlug"),
                story_id_before: optional(fragment, "storyIDBefore"),
                story_id_after: optional(fragment, "storyIDAfter"),
            }),
            CommandKind::StoryReplace => MosCommand::StoryReplace(StoryReplace {
                ro_id,
                story_id: required(fragment, "storyID"),
                story_slug: required(fragment, "storySlug"),
            }),
            CommandKind::StoryDelete => MosCommand::StoryDelete(StoryDelete {
                ro_id,
                story_id: required(fragment, "storyID"),
            }),
            CommandKind::StoryMove => MosCommand::StoryMove(StoryMove {
                ro_id,
                story_id: required(fragment, "storyID"),
                story_id_before: optional(fragment, "storyIDBefore"),
                story_id_after: optional(fragment, "storyIDAfter"),
            }),
            CommandKind::StorySwap => MosCommand::StorySwap(StorySwap {
                ro_id,
                story_id1: required(fragment, "storyID1"),
                story_id2: required(fragment, "storyID2"),
            }),
            CommandKind::StoryStatus => MosCommand::StoryStatus(StoryStatus {
                ro_id,
                story_id: required(fragment, "storyID"),
                status: optional(fragment, "status"),
            }),
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            MosCommand::RoCreate(_) => CommandKind::RoCreate,
            MosCommand::RoUpdate(_) => CommandKind::RoUpdate,
            MosCommand::RoDelete(_) => CommandKind::RoDelete,
            MosCommand::RoReplace(_) => CommandKind::RoReplace,
            MosCommand::StoryInsert(_) => CommandKind::StoryInsert,
            MosCommand::StoryReplace(_) => CommandKind::StoryReplace,
            MosCommand::StoryDelete(_) => CommandKind::StoryDelete,
            MosCommand::StoryMove(_) => CommandKind::StoryMove,
            MosCommand::StorySwap(_) => CommandKind::StorySwap,
            MosCommand::StoryStatus(_) => CommandKind::StoryStatus,
        }
    }

    /// Correlation id echoed in the acknowledgment
    pub fn ro_id(&self) -> &str {
        match self {
            MosCommand::RoCreate(c) => &c.ro_id,
            MosCommand::RoUpdate(c) => &c.ro_id,
            MosCommand::RoDelete(c) => &c.ro_id,
            MosCommand::RoReplace(c) => &c.ro_id,
            MosCommand::StoryInsert(c) => &c.ro_id,
            MosCommand::StoryReplace(c) => &c.ro_id,
            MosCommand::StoryDelete(c) => &c.ro_id,
            MosCommand::StoryMove(c) => &c.ro_id,
            MosCommand::StorySwap(c) => &c.ro_id,
            MosCommand::StoryStatus(c) => &c.ro_id,
        }
    }
}

fn required(fragment: &str, name: &str) -> String {
    element_text(fragment, name).unwrap_or_default()
}

fn optional(fragment: &str, name: &str) -> Option<String> {
    element_text(fragment, name).filter(|value| !value.is_empty())
}

/// `roSlug`, falling back to `storySlug` (some vendors label rundowns that way)
fn rundown_slug(fragment: &str) -> Option<String> {
    optional(fragment, "roSlug").or_else(|| optional(fragment, "storySlug"))
}

fn meta(fragment: &str) -> Option<String> {
    find_element(fragment, "mosExternalMetadata")
        .map(|element| element.inner.trim().to_string())
        .filter(|inner| !inner.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ro_create_with_meta() {
        let fragment = "<roCreate>\n  <roID> RO-1 </roID>\n  <roSlug>6PM News</roSlug>\n  <mosExternalMetadata><mosScope>PLAYLIST</mosScope></mosExternalMetadata>\n</roCreate>";
        let MosCommand::RoCreate(create) = MosCommand::parse(CommandKind::RoCreate, fragment)
        else {
            panic!("expected RoCreate");
        };
        assert_eq!(create.ro_id, "RO-1");
        assert_eq!(create.slug, "6PM News");
        assert_eq!(
            create.meta.as_deref(),
            Some("<mosScope>PLAYLIST</mosScope>")
        );
    }

    #[test]
    fn test_ro_create_slug_falls_back_to_story_slug() {
        let fragment = "<roCreate><roID>RO-1</roID><storySlug>x</storySlug></roCreate>";
        let command = MosCommand::parse(CommandKind::RoCreate, fragment);
        assert_eq!(
            command,
            MosCommand::RoCreate(RoCreate {
                ro_id: "RO-1".to_string(),
                slug: "x".to_string(),
                meta: None,
            })
        );
    }

    #[test]
    fn test_missing_fields_are_empty_not_errors() {
        let command = MosCommand::parse(CommandKind::StoryInsert, "<roStoryInsert/>");
        assert_eq!(
            command,
            MosCommand::StoryInsert(StoryInsert {
                ro_id: String::new(),
                story_id: String::new(),
                story_slug: String::new(),
                story_id_before: None,
                story_id_after: None,
            })
        );
        assert_eq!(command.ro_id(), "");
        assert_eq!(command.kind(), CommandKind::StoryInsert);
    }

    #[test]
    fn test_ro_update_only_reports_present_fields() {
        let fragment = "<roUpdate><roID>RO-1</roID><roSlug>Late</roSlug></roUpdate>";
        let MosCommand::RoUpdate(update) = MosCommand::parse(CommandKind::RoUpdate, fragment)
        else {
            panic!("expected RoUpdate");
        };
        assert_eq!(update.slug.as_deref(), Some("Late"));
        assert_eq!(update.meta, None);
    }

    #[test]
    fn test_parse_move_anchors() {
        let fragment = "<roStoryMove><roID>RO</roID><storyID>C</storyID><storyIDBefore>A</storyIDBefore><storyIDAfter></storyIDAfter></roStoryMove>";
        let MosCommand::StoryMove(story_move) = MosCommand::parse(CommandKind::StoryMove, fragment)
        else {
            panic!("expected StoryMove");
        };
        assert_eq!(story_move.story_id, "C");
        assert_eq!(story_move.story_id_before.as_deref(), Some("A"));
        assert_eq!(story_move.story_id_after, None);
    }

    #[test]
    fn test_parse_swap_ids() {
        let fragment = "<roStorySwap><roID>RO</roID><storyID1>A</storyID1><storyID2>B</storyID2></roStorySwap>";
        let MosCommand::StorySwap(swap) = MosCommand::parse(CommandKind::StorySwap, fragment)
        else {
            panic!("expected StorySwap");
        };
        assert_eq!((swap.story_id1.as_str(), swap.story_id2.as_str()), ("A", "B"));
    }

    #[test]
    fn test_parse_status_decodes_entities() {
        let fragment = "<roStoryStatus><roID>R&amp;D</roID><storyID>S</storyID><status>in review</status></roStoryStatus>";
        let MosCommand::StoryStatus(status) = MosCommand::parse(CommandKind::StoryStatus, fragment)
        else {
            panic!("expected StoryStatus");
        };
        assert_eq!(status.ro_id, "R&D");
        assert_eq!(status.status.as_deref(), Some("in review"));
    }
}
