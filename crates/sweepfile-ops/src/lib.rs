//! File operations for sweepfile.
//!
//! Deletion, rename and move run as background tasks and report through a
//! channel: zero or more progress updates followed by exactly one
//! completion listing the paths that were actually changed.

mod delete;
mod move_op;
mod operation;
mod progress;
mod rename;

pub use delete::{DeleteOptions, DeleteResult, start_deletion};
pub use move_op::{MoveResult, move_blocking, start_move};
pub use operation::OperationError;
pub use progress::{OperationComplete, OperationProgress, OperationType};
pub use rename::{RenameResult, rename_blocking, start_rename, validate_filename};

/// Default channel buffer size for operation progress updates.
pub const OPERATION_CHANNEL_SIZE: usize = 100;
