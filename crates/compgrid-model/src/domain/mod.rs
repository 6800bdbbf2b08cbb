mod symbol;
pub use symbol::Symbol;

mod component_status;
pub use component_status::ComponentStatus;

mod component_info;
pub use component_info::{ComponentInfo, NOT_AVAILABLE, format_result};

mod notification;
pub use notification::{Notification, NotificationKind};

/// Operator-assigned group identifier.
///
/// Always positive; `0` is rejected when a group is created.
pub type GroupId = u32;

/// Index of a component inside its group.
///
/// The slot also selects the service endpoint the component talks to: slot `i` maps to endpoint `base + i`.
pub type Slot = usize;

/// Argument passed to every component of a group when it is run.
pub type Argument = i32;

/// Argument used by `run` when the operator gives none.
pub const DEFAULT_ARGUMENT: Argument = 5;
