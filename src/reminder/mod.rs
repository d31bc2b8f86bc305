//! Reminder state machine run after every task write.
//!
//! [`evaluator`] holds the pure transition rules. [`ReminderDispatcher`] records
//! the chosen transition inside the transaction that wrote the task, then
//! broadcasts and emails once that transaction has committed.

pub mod dispatcher;
pub mod email;
pub mod evaluator;
pub mod store;

pub use dispatcher::{ReminderDispatcher, ReminderOutcome, ReminderSettings};
pub use store::ReminderRepositories;
