use chrono::NaiveDate;
use serde::Serialize;

/// One upcoming new employee, as read from the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HireRecord {
    pub name: String,
    /// Mail recipient and calendar invitee.
    pub email: String,
    pub department: String,
    pub start_date: NaiveDate,
    pub manager: String,
}
