use super::normalizer::normalize_header;
use std::collections::HashMap;
use std::sync::OnceLock;

static EMPLOYEE_ALIASES: OnceLock<HashMap<String, &'static str>> = OnceLock::new();

/// Resolve a normalized employee header to its canonical column name. Unknown headers are
/// returned unchanged so the parser can ignore them.
pub(crate) fn canonical_employee_column(normalized: &str) -> String {
    employee_aliases()
        .get(normalized)
        .map(|canonical| (*canonical).to_string())
        .unwrap_or_else(|| normalized.to_string())
}

fn employee_aliases() -> &'static HashMap<String, &'static str> {
    EMPLOYEE_ALIASES.get_or_init(|| {
        const ALIAS_TO_COLUMN: &[(&str, &str)] = &[
            ("id", "employee_id"),
            ("employeeid", "employee_id"),
            ("provider_id", "employee_id"),
            ("name", "full_name"),
            ("fullname", "full_name"),
            ("provider_name", "full_name"),
            ("speciality", "specialty"),
            ("base", "base_pay"),
            ("base_salary", "base_pay"),
            ("incentive", "wrvu_incentive"),
            ("productivity_pay", "wrvu_incentive"),
            ("productivity_incentive", "wrvu_incentive"),
            ("quality", "quality_payments"),
            ("quality_pay", "quality_payments"),
            ("quality_incentive", "quality_payments"),
            ("admin", "admin_payments"),
            ("admin_pay", "admin_payments"),
            ("administrative_payments", "admin_payments"),
            ("wrvus", "annual_wrvus"),
            ("wrvu", "annual_wrvus"),
            ("total_wrvus", "annual_wrvus"),
            ("cf", "conversion_factor"),
            ("call", "call_pay"),
            ("call_payments", "call_pay"),
        ];

        let mut map = HashMap::with_capacity(ALIAS_TO_COLUMN.len());
        for (alias, column) in ALIAS_TO_COLUMN {
            map.insert(normalize_header(alias), *column);
        }
        map
    })
}
