//! Participant name resolution.
//!
//! Maps a sender identity to the display name used in transcripts and
//! assembled context. Total: always returns a non-empty string, even
//! for senders missing from the snapshot. Side-effect-free.

use murmur_core::message::SenderKind;
use murmur_core::session::SessionSnapshot;

/// Generic label for a sender kind when no snapshot entry matches.
fn generic_label(kind: SenderKind) -> &'static str {
    match kind {
        SenderKind::HumanUser => "User",
        SenderKind::ActingCharacter => "Character",
        SenderKind::ActingAssistant => "Assistant",
        SenderKind::System => "System",
    }
}

/// Resolve a sender to a display name.
///
/// System messages always label as "System"; everyone else resolves
/// through the snapshot, falling back to a generic label for their
/// kind when unmatched or unnamed.
pub fn resolve(sender_id: &str, kind: SenderKind, snapshot: &SessionSnapshot) -> String {
    if kind == SenderKind::System {
        return generic_label(kind).to_string();
    }

    match snapshot.find(sender_id, kind) {
        Some(participant) => participant
            .display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(generic_label(kind))
            .to_string(),
        None => generic_label(kind).to_string(),
    }
}
