//! The closed set of logical table names the proxy recognizes, and their
//! mapping onto backing record types.

use strum_macros::{Display, EnumString};

use crate::models::user::UserRole;

/// Client-facing resource names, as they appear in `/api/db/{table}`.
/// Several logical tables share a backing type: `admins` and `employees`
/// are both views over `User`, disambiguated by the stored `role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LogicalTable {
    CalendarEvents,
    EventReminders,
    Gyms,
    Tasks,
    WorkSchedules,
    AllowedNetworks,
    Admins,
    Employees,
    NewMemberInstructionItems,
    AppConfig,
}

/// Backing record types. The variant name doubles as the physical table
/// name in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RecordType {
    User,
    Gym,
    Task,
    WorkSchedule,
    CalendarEvent,
    EventReminder,
    AllowedNetwork,
    NewMemberInstructionItem,
    AppConfig,
}

impl RecordType {
    pub fn table_name(self) -> &'static str {
        match self {
            RecordType::User => "User",
            RecordType::Gym => "Gym",
            RecordType::Task => "Task",
            RecordType::WorkSchedule => "WorkSchedule",
            RecordType::CalendarEvent => "CalendarEvent",
            RecordType::EventReminder => "EventReminder",
            RecordType::AllowedNetwork => "AllowedNetwork",
            RecordType::NewMemberInstructionItem => "NewMemberInstructionItem",
            RecordType::AppConfig => "AppConfig",
        }
    }
}

impl LogicalTable {
    pub fn record_type(self) -> RecordType {
        match self {
            LogicalTable::CalendarEvents => RecordType::CalendarEvent,
            LogicalTable::EventReminders => RecordType::EventReminder,
            LogicalTable::Gyms => RecordType::Gym,
            LogicalTable::Tasks => RecordType::Task,
            LogicalTable::WorkSchedules => RecordType::WorkSchedule,
            LogicalTable::AllowedNetworks => RecordType::AllowedNetwork,
            LogicalTable::Admins | LogicalTable::Employees => RecordType::User,
            LogicalTable::NewMemberInstructionItems => RecordType::NewMemberInstructionItem,
            LogicalTable::AppConfig => RecordType::AppConfig,
        }
    }

    /// The role a user-backed logical table implicitly constrains reads to,
    /// and force-sets on create. `admins` deliberately maps to the plain
    /// `admin` role so superadmin rows stay out of the admins view.
    pub fn implied_role(self) -> Option<UserRole> {
        match self {
            LogicalTable::Admins => Some(UserRole::Admin),
            LogicalTable::Employees => Some(UserRole::Employee),
            _ => None,
        }
    }
}

/// A resolved table reference: either a known logical table or a raw name
/// passed through to the store unchanged.
#[derive(Debug, Clone)]
pub struct TableRef {
    pub logical: Option<LogicalTable>,
    raw: String,
}

impl TableRef {
    /// Resolve a path segment. Unknown names are not an error: they are
    /// forwarded as-is and the store decides whether such a table exists.
    pub fn resolve(name: &str) -> Self {
        match name.parse::<LogicalTable>() {
            Ok(logical) => Self {
                logical: Some(logical),
                raw: name.to_string(),
            },
            Err(_) => {
                tracing::debug!(table = %name, "unknown logical table, passing name through to the store");
                Self {
                    logical: None,
                    raw: name.to_string(),
                }
            }
        }
    }

    /// Physical table name to query.
    pub fn physical(&self) -> &str {
        match self.logical {
            Some(logical) => logical.record_type().table_name(),
            None => &self.raw,
        }
    }

    /// The raw path segment the client used.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is(&self, table: LogicalTable) -> bool {
        self.logical == Some(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logical_names_parse() {
        assert_eq!(
            "calendar_events".parse::<LogicalTable>().unwrap(),
            LogicalTable::CalendarEvents
        );
        assert_eq!(
            "app_config".parse::<LogicalTable>().unwrap(),
            LogicalTable::AppConfig
        );
        assert_eq!(LogicalTable::WorkSchedules.to_string(), "work_schedules");
    }

    #[test]
    fn test_admins_and_employees_share_backing_type() {
        let admins = TableRef::resolve("admins");
        let employees = TableRef::resolve("employees");
        assert_eq!(admins.physical(), "User");
        assert_eq!(employees.physical(), "User");
        assert_eq!(
            LogicalTable::Admins.implied_role(),
            Some(UserRole::Admin)
        );
        assert_eq!(
            LogicalTable::Employees.implied_role(),
            Some(UserRole::Employee)
        );
    }

    #[test]
    fn test_unknown_table_passes_through() {
        let t = TableRef::resolve("mystery_table");
        assert!(t.logical.is_none());
        assert_eq!(t.physical(), "mystery_table");
    }
}
