use chrono::FixedOffset;

use super::evaluator::ReminderKind;
use crate::mail::OutboundEmail;
use crate::task::task_models::Task;

/// In-app notification text for a reminder.
pub fn notification_message(kind: ReminderKind, title: &str) -> String {
    match kind {
        ReminderKind::Overdue => format!("Task '{}' is overdue!", title),
        ReminderKind::DueSoon => format!("Task '{}' is due soon!", title),
    }
}

pub struct ReminderEmail<'a> {
    pub kind: ReminderKind,
    pub task: &'a Task,
    pub username: &'a str,
    pub recipient: &'a str,
    pub category_name: Option<&'a str>,
    pub from: &'a str,
    pub base_url: &'a str,
    pub utc_offset: FixedOffset,
}

impl ReminderEmail<'_> {
    pub fn compose(&self) -> OutboundEmail {
        let title = &self.task.title;
        let due = self
            .task
            .due_date
            .map(|due| due.with_timezone(&self.utc_offset).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "N/A".to_string());

        let (subject, opening, call_to_action) = match self.kind {
            ReminderKind::Overdue => (
                format!("OVERDUE: Your Task '{}'", title),
                format!("Your task '{}' was due on {}, but it is still pending.", title, due),
                "update its status",
            ),
            ReminderKind::DueSoon => (
                format!("REMINDER: Your Task '{}' is due soon!", title),
                format!("Just a friendly reminder that your task '{}' is due on {}.", title, due),
                "review or complete it",
            ),
        };

        let body = format!(
            "Hello {username},\n\n\
             {opening}\n\n\
             Description: {description}\n\
             Category: {category}\n\n\
             Please log in to your Task Manager to {call_to_action}: {base_url}\n\n\
             Thank you,\nYour Task Manager",
            username = self.username,
            opening = opening,
            description = self.task.description.as_deref().filter(|d| !d.is_empty()).unwrap_or("N/A"),
            category = self.category_name.unwrap_or("N/A"),
            call_to_action = call_to_action,
            base_url = self.base_url,
        );

        OutboundEmail {
            subject,
            body,
            from: self.from.to_string(),
            recipients: vec![self.recipient.to_string()],
        }
    }
}
