use chrono::{DateTime, Utc};

use crate::task::task_models::Task;

/// The parts of a saved task the reminder rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderState {
    pub completed: bool,
    pub overdue: bool,
    pub due_soon: bool,
    pub has_active_reminder: bool,
}

impl ReminderState {
    pub fn of(task: &Task, now: DateTime<Utc>) -> Self {
        Self {
            completed: task.completed,
            overdue: task.is_overdue(now),
            due_soon: task.is_due_soon(now),
            has_active_reminder: task.has_active_reminder_notification,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    Overdue,
    DueSoon,
}

/// What to do after a task write. Exactly one action per evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderAction {
    /// Create a notification of this kind and raise the flag.
    Emit(ReminderKind),
    /// Mark the task's unread notifications read and drop the flag.
    Clear,
    Nothing,
}

/// Decides the reminder transition for a task that was just written.
///
/// An active reminder suppresses any new notification. It is cleared once the
/// task is completed, or once it is neither overdue nor due soon. A task moving
/// from due-soon to overdue while flagged keeps its existing reminder.
pub fn evaluate(state: ReminderState) -> ReminderAction {
    if !state.completed && !state.has_active_reminder {
        if state.overdue {
            return ReminderAction::Emit(ReminderKind::Overdue);
        }
        if state.due_soon {
            return ReminderAction::Emit(ReminderKind::DueSoon);
        }
    }

    let resolved = state.completed || (!state.overdue && !state.due_soon);
    if resolved && state.has_active_reminder {
        return ReminderAction::Clear;
    }

    ReminderAction::Nothing
}
