//! Builds store filters and sort clauses from the query string of a GET
//! request: suffixed range operators, boolean coercion, bare-date
//! normalization, and the role filter implied by the user-backed views.

use db::{
    store::{Filter, FilterOp, Sort},
    tables::{LogicalTable::*, TableRef},
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::translator::{alias_inbound, snake_to_camel};

pub const START_OF_DAY: &str = "T00:00:00.000Z";
pub const END_OF_DAY: &str = "T23:59:59.999Z";

static BARE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

#[derive(Debug)]
pub struct ParsedQuery {
    pub filters: Vec<Filter>,
    pub sort: Option<Sort>,
    pub single: bool,
}

pub struct QueryTranslator;

impl QueryTranslator {
    pub fn parse(table: &TableRef, params: &[(String, String)]) -> ParsedQuery {
        let mut filters = Vec::new();
        let mut single = false;
        let mut order_by = None;
        let mut order_dir = None;

        // `single`, `orderBy` and `orderDir` are reserved; everything else
        // in the query string becomes a filter.
        for (key, value) in params {
            match key.as_str() {
                "single" => single = value == "true",
                "orderBy" => order_by = Some(value.clone()),
                "orderDir" => order_dir = Some(value.clone()),
                _ => filters.push(parse_filter(table, key, value)),
            }
        }

        // The logical table itself constrains `role` on the user views;
        // a client-supplied role filter never overrides it.
        if let Some(role) = table.logical.and_then(|t| t.implied_role()) {
            filters.retain(|f| f.column != "role");
            filters.push(Filter::eq("role", Value::from(role.to_string())));
        }

        let sort = order_by.map(|field| Sort {
            column: alias_inbound(table, &snake_to_camel(&field)),
            descending: order_dir.as_deref() == Some("desc"),
        });

        ParsedQuery {
            filters,
            sort,
            single,
        }
    }
}

fn parse_filter(table: &TableRef, key: &str, value: &str) -> Filter {
    for (suffix, op) in [
        ("_gte", FilterOp::Gte),
        ("_lte", FilterOp::Lte),
        ("_neq", FilterOp::Neq),
    ] {
        if let Some(base) = key.strip_suffix(suffix) {
            let column = alias_inbound(table, &snake_to_camel(base));
            return Filter::new(column, op, range_value(op, value));
        }
    }
    equality_filter(table, key, value)
}

/// Bare dates widen to the inclusive edge of the day for range operators.
fn range_value(op: FilterOp, value: &str) -> Value {
    if BARE_DATE.is_match(value) {
        match op {
            FilterOp::Gte => return Value::from(format!("{value}{START_OF_DAY}")),
            FilterOp::Lte => return Value::from(format!("{value}{END_OF_DAY}")),
            _ => {}
        }
    }
    Value::from(value)
}

fn equality_filter(table: &TableRef, key: &str, value: &str) -> Filter {
    let camel = snake_to_camel(key);
    let column = alias_equality_key(table, &camel);
    let coerced = match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        v if BARE_DATE.is_match(v) && (column == "date" || column == "eventDate") => {
            Value::from(format!("{v}{START_OF_DAY}"))
        }
        v => Value::from(v),
    };
    Filter::eq(column, coerced)
}

/// Equality filters alias a narrower key set than write bodies do:
/// `isActive` maps to `active` only on the user views (legacy `users`
/// callers included), and `workDate` on work schedules.
fn alias_equality_key(table: &TableRef, camel: &str) -> String {
    match camel {
        "isActive"
            if matches!(table.logical, Some(Admins) | Some(Employees))
                || table.raw() == "users" =>
        {
            "active".to_string()
        }
        "workDate" if table.is(WorkSchedules) => "date".to_string(),
        _ => camel.to_string(),
    }
}
