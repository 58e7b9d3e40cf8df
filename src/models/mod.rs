mod notification;
mod violation;

pub use notification::{Notification, ProctorNotice, Severity};
pub use violation::{Violation, ViolationKind, ViolationRecord};
