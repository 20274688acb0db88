pub mod lead;
pub mod prospect;
pub mod role;
pub mod sale;
pub mod user;
pub mod visit;

pub use lead::{Lead, LeadStatus};
pub use prospect::{Prospect, ProspectStatus};
pub use role::{Action, Role, Screen};
pub use sale::{Sale, SaleStatus};
pub use user::User;
pub use visit::{Visit, VisitKind, VisitStatus};

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use crate::validation::Validate;

/// Which screen/collection a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Lead,
    Prospect,
    Visit,
    Sale,
    User,
}

impl RecordKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Prospect => "prospect",
            Self::Visit => "visit",
            Self::Sale => "sale",
            Self::User => "user",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Field accessors the generic list machinery is parameterized by.
///
/// A record exposes its identifier, the fields free-text search looks at,
/// named category fields for exact-match filters, and the timestamp the
/// date-range filter compares against.
pub trait Record: Clone + fmt::Debug + Validate {
    const KIND: RecordKind;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    /// Fields matched by the free-text predicate (name, phone, ...)
    fn search_fields(&self) -> Vec<&str>;

    /// Value of a named category field ("status", "source", ...).
    /// Unknown keys return `None`.
    fn category(&self, key: &str) -> Option<&str>;

    /// Raw timestamp used by date-range filtering
    fn timestamp(&self) -> Option<&str>;

    fn phone(&self) -> Option<&str> {
        None
    }

    /// User id this record is assigned to, if the record kind has one
    fn assignee(&self) -> Option<&str> {
        None
    }
}

/// Records that can be handed to an agent in bulk.
pub trait Assignable: Record {
    fn assign_to(&mut self, agent_id: &str);
}

/// Records with a lifecycle status.
pub trait HasStatus: Record {
    type Status: Copy + PartialEq + fmt::Debug + fmt::Display;

    fn status(&self) -> Self::Status;
    fn set_status(&mut self, status: Self::Status);
}

/// Declares a snake_case string enum with `as_str`, `Display` and `FromStr`.
macro_rules! category_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| format!("unknown {}: {:?}", stringify!($name), s))
            }
        }
    };
}

pub(crate) use category_enum;

/// Accept ids as JSON strings or integers; the static payload uses both.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

/// Same as [`deserialize_id`] for optional references (`agent_id`, `supervisor_id`)
pub fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) if s.trim().is_empty() => None,
        Some(RawId::Text(s)) => Some(s),
        Some(RawId::Int(n)) => Some(n.to_string()),
        None => None,
    })
}

/// Parse the timestamp formats found in the payload.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and a bare
/// `YYYY-MM-DD` (midnight). Anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
