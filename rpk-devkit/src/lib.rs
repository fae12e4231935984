/*!
# rpk DevKit - HTTP stubs for rpk-agent development

Small in-process servers standing in for the remote side of rpk-agent:
- a collector stub recording every reporting POST byte-for-byte
- an admin API stub serving license info and per-node maintenance toggles
- helpers to bind them on an ephemeral local port
*/

pub mod admin_stub;
pub mod collector_stub;
pub mod state;
pub mod test_utils;

pub use admin_stub::{license_json, AdminStub};
pub use collector_stub::{CollectorStub, RecordedRequest};
pub use test_utils::StubServer;
