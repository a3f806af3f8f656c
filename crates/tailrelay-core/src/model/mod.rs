// ── Domain model ──
//
// Canonical types the store, dispatcher and presenters share. Wire
// shapes from `tailrelay-api` are converted into these in `convert`.

pub mod identity;
pub mod notification;
pub mod record;
pub mod view;

pub use identity::TailnetIdentity;
pub use notification::{Notification, Severity};
pub use record::{ProxyRecord, RecordId, RelayRecord, ResourceKind};
pub use view::{ViewItem, ViewModel, Visibility};
