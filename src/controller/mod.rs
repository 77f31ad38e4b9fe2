pub mod list;
pub mod notice;

pub use list::{Editor, ListController, ReorderOutcome};
pub use notice::{Notice, NoticeLevel, NoticeLog, Notifier, TracingNotifier};
