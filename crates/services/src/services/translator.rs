//! Field-name translation between the external snake_case contract and the
//! internal camelCase storage shape.
//!
//! The per-table rename rules are data, not branching: each entry names the
//! key on one side, the key on the other side, and the logical tables it
//! applies to. Both the write path and the filter path share the inbound
//! table, so an alias cannot drift between the two.

use db::{
    store::JsonRow,
    tables::{
        LogicalTable::{self, *},
        TableRef,
    },
};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
enum Applies {
    All,
    Only(&'static [LogicalTable]),
    Except(&'static [LogicalTable]),
}

impl Applies {
    fn matches(self, logical: Option<LogicalTable>) -> bool {
        match self {
            Applies::All => true,
            Applies::Only(tables) => logical.is_some_and(|t| tables.contains(&t)),
            Applies::Except(tables) => !logical.is_some_and(|t| tables.contains(&t)),
        }
    }
}

struct Rename {
    from: &'static str,
    to: &'static str,
    applies: Applies,
}

const fn rename(from: &'static str, to: &'static str, applies: Applies) -> Rename {
    Rename { from, to, applies }
}

/// Stored key -> client key, applied in order to every outgoing record.
const OUTBOUND: &[Rename] = &[
    rename("address", "location", Applies::Only(&[Gyms])),
    rename("wifiRestricted", "wifi_restricted", Applies::Only(&[Gyms])),
    rename("wifiSsid", "wifi_ssid", Applies::Only(&[Gyms])),
    rename("ipAddress", "ip_address", Applies::Only(&[Gyms])),
    rename("active", "is_active", Applies::All),
    rename("date", "work_date", Applies::Only(&[WorkSchedules])),
    rename("eventDate", "event_date", Applies::Only(&[CalendarEvents])),
    rename("createdAt", "created_at", Applies::All),
    rename("updatedAt", "updated_at", Applies::All),
];

/// Camelized client key -> stored key. Applied after snake->camel
/// conversion, so `is_active` and `isActive` land on the same rule.
const INBOUND_ALIASES: &[Rename] = &[
    rename("location", "address", Applies::Only(&[Gyms])),
    rename(
        "isActive",
        "active",
        Applies::Except(&[NewMemberInstructionItems, AppConfig]),
    ),
    rename("workDate", "date", Applies::Only(&[WorkSchedules])),
];

/// Keys removed from write bodies entirely: `description` has no column on
/// gyms, and `isSuperAdmin` is derived from `role`, never stored.
const INBOUND_DROPS: &[(&str, Applies)] = &[
    ("description", Applies::Only(&[Gyms])),
    ("isSuperAdmin", Applies::All),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

pub struct FieldTranslator;

impl FieldTranslator {
    /// Translate a stored record into the client shape.
    pub fn to_external(table: &TableRef, row: JsonRow) -> JsonRow {
        let mut out = JsonRow::new();
        let is_user_view = matches!(table.logical, Some(Admins | Employees));
        let is_superadmin = is_user_view
            && row.get("role").and_then(Value::as_str) == Some("superadmin");
        for (key, value) in row {
            let external = OUTBOUND
                .iter()
                .find(|r| r.from == key && r.applies.matches(table.logical))
                .map(|r| r.to.to_string())
                .unwrap_or(key);
            out.insert(external, value);
        }
        if is_user_view {
            out.insert("is_super_admin".to_string(), Value::Bool(is_superadmin));
        }
        out
    }

    /// Translate a client-submitted write body into the stored shape.
    pub fn to_internal(
        table: &TableRef,
        item: &Map<String, Value>,
        mode: WriteMode,
    ) -> JsonRow {
        let mut row = JsonRow::new();
        for (key, value) in item {
            let camel = snake_to_camel(key);
            if INBOUND_DROPS
                .iter()
                .any(|(k, applies)| *k == camel && applies.matches(table.logical))
            {
                continue;
            }
            row.insert(alias_inbound(table, &camel), value.clone());
        }

        // `role` is never client-writable on the user views: forced on
        // create, stripped on update.
        match (table.logical, mode) {
            (Some(Employees), WriteMode::Create) => {
                row.insert("role".to_string(), Value::from("employee"));
            }
            (Some(Admins), WriteMode::Create) => {
                let superadmin = item.get("is_super_admin").is_some_and(truthy);
                row.insert(
                    "role".to_string(),
                    Value::from(if superadmin { "superadmin" } else { "admin" }),
                );
            }
            (Some(Employees) | Some(Admins), WriteMode::Update) => {
                row.remove("role");
            }
            _ => {}
        }
        row
    }

    /// Translate the keys of a bulk-update `where` object. Same aliasing as
    /// write bodies, but nothing is dropped: silently widening a predicate
    /// would update rows the caller never named.
    pub fn where_to_internal(table: &TableRef, item: &Map<String, Value>) -> JsonRow {
        item.iter()
            .map(|(key, value)| {
                let camel = snake_to_camel(key);
                (alias_inbound(table, &camel), value.clone())
            })
            .collect()
    }
}

/// Apply the inbound alias table to an already-camelized key.
pub fn alias_inbound(table: &TableRef, camel: &str) -> String {
    INBOUND_ALIASES
        .iter()
        .find(|r| r.from == camel && r.applies.matches(table.logical))
        .map(|r| r.to.to_string())
        .unwrap_or_else(|| camel.to_string())
}

pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn truthy(value: &Value) -> bool {
    value.as_bool() == Some(true) || value.as_str() == Some("true")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("wifi_ssid"), "wifiSsid");
        assert_eq!(snake_to_camel("created_by_email"), "createdByEmail");
        assert_eq!(snake_to_camel("name"), "name");
    }

    #[test]
    fn test_gym_inbound_renames_and_drops() {
        let gyms = TableRef::resolve("gyms");
        let row = FieldTranslator::to_internal(
            &gyms,
            &obj(json!({
                "name": "Main",
                "location": "12 Rue X",
                "wifi_restricted": true,
                "wifi_ssid": "NET1",
                "ip_address": "1.2.3.4",
                "description": "dropped",
                "is_active": true,
            })),
            WriteMode::Create,
        );
        assert_eq!(row["address"], json!("12 Rue X"));
        assert_eq!(row["wifiRestricted"], json!(true));
        assert_eq!(row["wifiSsid"], json!("NET1"));
        assert_eq!(row["ipAddress"], json!("1.2.3.4"));
        assert_eq!(row["active"], json!(true));
        assert!(!row.contains_key("description"));
        assert!(!row.contains_key("location"));
    }

    #[test]
    fn test_gym_outbound_renames() {
        let gyms = TableRef::resolve("gyms");
        let external = FieldTranslator::to_external(
            &gyms,
            obj(json!({
                "address": "12 Rue X",
                "wifiSsid": "NET1",
                "active": true,
                "createdAt": "2024-01-15T00:00:00.000Z",
            })),
        );
        assert_eq!(external["location"], json!("12 Rue X"));
        assert_eq!(external["wifi_ssid"], json!("NET1"));
        assert_eq!(external["is_active"], json!(true));
        assert_eq!(external["created_at"], json!("2024-01-15T00:00:00.000Z"));
    }

    #[test]
    fn test_round_trip_stability() {
        // External -> internal -> external must reproduce the keys a client
        // can legally resubmit.
        let gyms = TableRef::resolve("gyms");
        let submitted = obj(json!({
            "name": "Main",
            "location": "12 Rue X",
            "wifi_ssid": "NET1",
            "is_active": false,
        }));
        let stored = FieldTranslator::to_internal(&gyms, &submitted, WriteMode::Create);
        let returned = FieldTranslator::to_external(&gyms, stored);
        let again = FieldTranslator::to_internal(&gyms, &returned, WriteMode::Update);
        assert_eq!(again["address"], json!("12 Rue X"));
        assert_eq!(again["wifiSsid"], json!("NET1"));
        assert_eq!(again["active"], json!(false));
    }

    #[test]
    fn test_is_active_exemptions() {
        let items = TableRef::resolve("new_member_instruction_items");
        let row = FieldTranslator::to_internal(
            &items,
            &obj(json!({"label": "Tour", "is_active": true})),
            WriteMode::Create,
        );
        assert_eq!(row["isActive"], json!(true));
        assert!(!row.contains_key("active"));

        let config = TableRef::resolve("app_config");
        let row = FieldTranslator::to_internal(
            &config,
            &obj(json!({"key": "theme", "is_active": false})),
            WriteMode::Update,
        );
        assert_eq!(row["isActive"], json!(false));
    }

    #[test]
    fn test_work_schedule_date_aliases() {
        let schedules = TableRef::resolve("work_schedules");
        let row = FieldTranslator::to_internal(
            &schedules,
            &obj(json!({"work_date": "2024-01-15T00:00:00.000Z"})),
            WriteMode::Create,
        );
        assert_eq!(row["date"], json!("2024-01-15T00:00:00.000Z"));

        let external = FieldTranslator::to_external(
            &schedules,
            obj(json!({"date": "2024-01-15T00:00:00.000Z"})),
        );
        assert_eq!(external["work_date"], json!("2024-01-15T00:00:00.000Z"));
    }

    #[test]
    fn test_employee_role_forced_on_create() {
        let employees = TableRef::resolve("employees");
        let row = FieldTranslator::to_internal(
            &employees,
            &obj(json!({"name": "Ana", "role": "superadmin"})),
            WriteMode::Create,
        );
        assert_eq!(row["role"], json!("employee"));
    }

    #[test]
    fn test_admin_role_derived_from_is_super_admin() {
        let admins = TableRef::resolve("admins");
        let plain = FieldTranslator::to_internal(
            &admins,
            &obj(json!({"name": "Bob"})),
            WriteMode::Create,
        );
        assert_eq!(plain["role"], json!("admin"));

        let elevated = FieldTranslator::to_internal(
            &admins,
            &obj(json!({"name": "Root", "is_super_admin": true})),
            WriteMode::Create,
        );
        assert_eq!(elevated["role"], json!("superadmin"));
        assert!(!elevated.contains_key("isSuperAdmin"));
    }

    #[test]
    fn test_role_stripped_on_update() {
        for table in ["employees", "admins"] {
            let table = TableRef::resolve(table);
            let row = FieldTranslator::to_internal(
                &table,
                &obj(json!({"name": "Ana", "role": "superadmin"})),
                WriteMode::Update,
            );
            assert!(!row.contains_key("role"));
        }
    }

    #[test]
    fn test_superadmin_derivation_outbound() {
        let admins = TableRef::resolve("admins");
        let external = FieldTranslator::to_external(
            &admins,
            obj(json!({"name": "Root", "role": "superadmin"})),
        );
        assert_eq!(external["is_super_admin"], json!(true));

        let employees = TableRef::resolve("employees");
        let external = FieldTranslator::to_external(
            &employees,
            obj(json!({"name": "Ana", "role": "employee"})),
        );
        assert_eq!(external["is_super_admin"], json!(false));
    }

    #[test]
    fn test_passthrough_table_gets_generic_rules_only() {
        let unknown = TableRef::resolve("mystery_table");
        let row = FieldTranslator::to_internal(
            &unknown,
            &obj(json!({"is_active": true, "some_field": 1})),
            WriteMode::Create,
        );
        assert_eq!(row["active"], json!(true));
        assert_eq!(row["someField"], json!(1));

        let external =
            FieldTranslator::to_external(&unknown, obj(json!({"active": false, "address": "x"})));
        assert_eq!(external["is_active"], json!(false));
        // Gym-only rename must not fire for other tables.
        assert_eq!(external["address"], json!("x"));
    }
}
