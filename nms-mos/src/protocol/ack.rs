//! `roAck` acknowledgment documents

use super::scanner::{element_text, escape_text, find_element};

/// Line terminator written after every acknowledgment
pub const ACK_TERMINATOR: &str = "\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Ok,
    Error,
}

impl AckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AckStatus::Ok => "OK",
            AckStatus::Error => "ERROR",
        }
    }
}

/// Acknowledgment correlated to a request by its `roID`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoAck {
    pub ro_id: String,
    pub status: AckStatus,
    pub message: String,
}

impl RoAck {
    pub fn ok(ro_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ro_id: ro_id.into(),
            status: AckStatus::Ok,
            message: message.into(),
        }
    }

    pub fn error(ro_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ro_id: ro_id.into(),
            status: AckStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == AckStatus::Ok
    }

    /// Render the document (without the line terminator)
    pub fn render(&self) -> String {
        build_ack(&self.ro_id, self.is_ok(), &self.message)
    }

    /// Read an acknowledgment back from a document
    pub fn parse(document: &str) -> Option<Self> {
        let ack = find_element(document, "roAck")?;
        let status = match element_text(ack.inner, "status")?.as_str() {
            "OK" => AckStatus::Ok,
            "ERROR" => AckStatus::Error,
            _ => return None,
        };
        Some(Self {
            ro_id: element_text(ack.inner, "roID").unwrap_or_default(),
            status,
            message: element_text(ack.inner, "message").unwrap_or_default(),
        })
    }
}

/// Render an acknowledgment document
pub fn build_ack(ro_id: &str, success: bool, message: &str) -> String {
    let status = if success { AckStatus::Ok } else { AckStatus::Error };
    format!(
        "<mos>\n  <roAck>\n    <roID>{}</roID>\n    <status>{}</status>\n    <message>{}</message>\n  </roAck>\n</mos>",
        escape_text(ro_id),
        status.as_str(),
        escape_text(message)
    )
}
