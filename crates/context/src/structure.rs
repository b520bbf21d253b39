//! Lays selected packets out as a sectioned prompt.
//!
//! ```text
//! [Role & Policies]   pinned instructions (omitted if none)
//! [Task]              the query
//! [Evidence]          knowledge results, `---` separated (omitted if none)
//! [Context]           memory, history and custom packets (omitted if none)
//! [Output]            fixed answer instruction
//! ```
//!
//! Sections are separated by a blank line, which is also the boundary the
//! compressor splits on.

use crate::packet::{ContextPacket, PacketRole};

/// Separator between sections.
pub const SECTION_SEPARATOR: &str = "\n\n";

const EVIDENCE_SEPARATOR: &str = "\n---\n";

const OUTPUT_INSTRUCTION: &str =
    "Answer using the information above. Be accurate and ground claims in the evidence.";

/// Render `selected` into the fixed section template. Packet order within a
/// section follows selection order.
pub fn structure(selected: &[ContextPacket], query: &str) -> String {
    let mut policies = Vec::new();
    let mut evidence = Vec::new();
    let mut context = Vec::new();

    for packet in selected {
        match packet.role() {
            PacketRole::SystemInstruction => policies.push(packet.content()),
            PacketRole::KnowledgeResult => evidence.push(packet.content()),
            PacketRole::MemoryResult | PacketRole::HistoryTurn | PacketRole::Custom => {
                context.push(packet.content())
            }
        }
    }

    let mut sections = Vec::with_capacity(5);
    if !policies.is_empty() {
        sections.push(format!("[Role & Policies]\n{}", policies.join("\n")));
    }
    sections.push(format!("[Task]\n{query}"));
    if !evidence.is_empty() {
        sections.push(format!("[Evidence]\n{}", evidence.join(EVIDENCE_SEPARATOR)));
    }
    if !context.is_empty() {
        sections.push(format!("[Context]\n{}", context.join("\n")));
    }
    sections.push(format!("[Output]\n{OUTPUT_INSTRUCTION}"));

    sections.join(SECTION_SEPARATOR)
}
