//! Server records as delivered by the directory API
//!
//! A record is kept as the raw JSON object so every field the API sends
//! reaches the render boundary untouched. Only the date fields are
//! rewritten (day ordinals to `YYYY-MM-DD`, unix seconds to UTC strings)
//! and `server_id` is filled in when the API leaves it out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::calendar::date_to_string;
use crate::clock::format_utc;
use crate::version::{rank_with, RankingMode, VersionSortKey};

/// `gamescript_version` of a server running no game script (`u32::MAX`).
pub const GAMESCRIPT_VERSION_NONE: u64 = 4_294_967_295;

/// Climate names indexed by the `landscape` field.
pub const MAPSETS: [&str; 4] = ["Temperate", "Arctic", "Tropical", "Toyland"];

const INFO: &str = "info";
const SERVER_ID: &str = "server_id";
const MAPSET: &str = "mapset";
const HAS_GAMESCRIPT: &str = "has_gamescript";
const DAY_ORDINAL_FIELDS: [&str; 2] = ["start_date", "game_date"];
const SEEN_TIME_FIELDS: [&str; 2] = ["time_first_seen", "time_last_seen"];

/// Sort key for a listing: version first, then busier servers first.
pub type ListingSortKey = (VersionSortKey, u64, u64);

/// One game server entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerRecord {
    fields: Map<String, Value>,
}

impl ServerRecord {
    /// Build a record from an arbitrary JSON value; non-objects become empty records
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    fn info(&self) -> Option<&Map<String, Value>> {
        self.fields.get(INFO).and_then(Value::as_object)
    }

    fn info_field(&self, field: &str) -> Option<&Value> {
        self.info().and_then(|info| info.get(field))
    }

    fn info_u64(&self, field: &str) -> u64 {
        self.info_field(field).and_then(Value::as_u64).unwrap_or(0)
    }

    /// `info.openttd_version`, empty when absent
    pub fn openttd_version(&self) -> &str {
        self.info_field("openttd_version")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// `info.openttd_revision` when the API provides a separate build revision
    pub fn openttd_revision(&self) -> Option<&str> {
        self.info_field("openttd_revision").and_then(Value::as_str)
    }

    pub fn clients_on(&self) -> u64 {
        self.info_u64("clients_on")
    }

    pub fn companies_on(&self) -> u64 {
        self.info_u64("companies_on")
    }

    pub fn has_ipv4(&self) -> bool {
        self.fields.contains_key("ipv4")
    }

    pub fn has_ipv6(&self) -> bool {
        self.fields.contains_key("ipv6")
    }

    pub fn server_id(&self) -> Option<&str> {
        self.fields.get(SERVER_ID).and_then(Value::as_str)
    }

    /// Climate name for `info.landscape`
    pub fn mapset_name(&self) -> Option<&'static str> {
        let landscape = self.info_field("landscape")?.as_u64()?;
        MAPSETS.get(usize::try_from(landscape).ok()?).copied()
    }

    /// False when `info.gamescript_version` is missing or the "none" sentinel
    pub fn has_gamescript(&self) -> bool {
        matches!(
            self.info_field("gamescript_version").and_then(Value::as_u64),
            Some(version) if version != GAMESCRIPT_VERSION_NONE
        )
    }

    /// True when the version or the build revision starts with `prefix`
    pub fn matches_version_prefix(&self, prefix: &str) -> bool {
        self.openttd_version().starts_with(prefix)
            || self
                .openttd_revision()
                .is_some_and(|revision| revision.starts_with(prefix))
    }

    pub fn sort_key(&self, mode: RankingMode) -> ListingSortKey {
        (
            rank_with(self.openttd_version(), mode),
            self.clients_on(),
            self.companies_on(),
        )
    }

    /// Rewrite date fields into display strings
    ///
    /// Day ordinals in `info.start_date` / `info.game_date` are always
    /// decoded. With `include_seen_times`, unix timestamps in
    /// `time_first_seen` / `time_last_seen` (top level or under `info`)
    /// become UTC strings. Fields that are missing or not unsigned
    /// integers are left as they are.
    pub fn normalize_dates(&mut self, include_seen_times: bool) {
        if let Some(Value::Object(info)) = self.fields.get_mut(INFO) {
            for field in DAY_ORDINAL_FIELDS {
                rewrite_field(info, field, date_to_string);
            }
            if include_seen_times {
                for field in SEEN_TIME_FIELDS {
                    rewrite_seen_time(info, field);
                }
            }
        }

        if include_seen_times {
            for field in SEEN_TIME_FIELDS {
                rewrite_seen_time(&mut self.fields, field);
            }
        }
    }

    /// Add the display fields derived from `info`
    ///
    /// `mapset` holds the climate name (left out for unknown landscapes),
    /// `has_gamescript` is false for the "no game script" sentinel.
    pub fn annotate(&mut self) {
        if let Some(name) = self.mapset_name() {
            self.fields
                .insert(MAPSET.to_string(), Value::String(name.to_string()));
        }
        let has_gamescript = self.has_gamescript();
        self.fields
            .insert(HAS_GAMESCRIPT.to_string(), Value::Bool(has_gamescript));
    }

    /// Fill in `server_id` when the API did not send one
    ///
    /// Uses `fallback` when given, otherwise the first advertised address
    /// (`ip:port` for IPv4, `[ip]:port` for IPv6).
    pub fn ensure_server_id(&mut self, fallback: Option<&str>) {
        if self.fields.get(SERVER_ID).is_some_and(|v| !v.is_null()) {
            return;
        }

        let derived = fallback
            .map(str::to_string)
            .or_else(|| address_of(self.fields.get("ipv4"), false))
            .or_else(|| address_of(self.fields.get("ipv6"), true));

        if let Some(id) = derived {
            self.fields.insert(SERVER_ID.to_string(), Value::String(id));
        }
    }
}

fn rewrite_field(map: &mut Map<String, Value>, field: &str, render: impl Fn(u64) -> String) {
    if let Some(value) = map.get_mut(field) {
        if let Some(raw) = value.as_u64() {
            *value = Value::String(render(raw));
        }
    }
}

fn rewrite_seen_time(map: &mut Map<String, Value>, field: &str) {
    if let Some(value) = map.get_mut(field) {
        if let Some(raw) = value.as_i64() {
            *value = Value::String(format_utc(raw));
        }
    }
}

fn address_of(endpoint: Option<&Value>, bracketed: bool) -> Option<String> {
    let endpoint = endpoint?.as_object()?;
    let ip = endpoint.get("ip")?.as_str()?;
    let port = endpoint.get("port")?.as_u64()?;
    Some(if bracketed {
        format!("[{}]:{}", ip, port)
    } else {
        format!("{}:{}", ip, port)
    })
}
