//! Wire types exchanged with the bridge.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One table row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A device attached to the bridge host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Serial reported by the device listing
    pub id: String,
    /// Connection state (`device`, `offline`, `unauthorized`, ...)
    pub status: String,
    /// Whether root access was detected
    #[serde(rename = "root", default)]
    pub rooted: bool,
}

impl Device {
    /// True when the device is connected and authorized.
    pub fn is_online(&self) -> bool {
        self.status == "device"
    }
}

/// Whether a package can be inspected without root.
///
/// Encoded on the wire as `true`, `false` or `null` (not yet resolved).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum Debuggable {
    #[default]
    Unknown,
    Yes,
    No,
}

impl From<Option<bool>> for Debuggable {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Debuggable::Yes,
            Some(false) => Debuggable::No,
            None => Debuggable::Unknown,
        }
    }
}

impl From<Debuggable> for Option<bool> {
    fn from(value: Debuggable) -> Self {
        match value {
            Debuggable::Yes => Some(true),
            Debuggable::No => Some(false),
            Debuggable::Unknown => None,
        }
    }
}

impl From<bool> for Debuggable {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

/// An installed application package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PackageWire")]
pub struct PackageEntry {
    pub name: String,
    pub debuggable: Debuggable,
}

impl PackageEntry {
    pub fn new(name: impl Into<String>, debuggable: Debuggable) -> Self {
        Self {
            name: name.into(),
            debuggable,
        }
    }
}

/// Older bridges list packages as bare names.
#[derive(Deserialize)]
#[serde(untagged)]
enum PackageWire {
    Name(String),
    Entry {
        name: String,
        #[serde(default)]
        debuggable: Debuggable,
    },
}

impl From<PackageWire> for PackageEntry {
    fn from(wire: PackageWire) -> Self {
        match wire {
            PackageWire::Name(name) => PackageEntry::new(name, Debuggable::Unknown),
            PackageWire::Entry { name, debuggable } => PackageEntry::new(name, debuggable),
        }
    }
}

/// Server-side package filter derived from the device's root flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFilter {
    All,
    Debuggable,
}

impl PackageFilter {
    /// Rooted devices can read every package; others only debuggable ones.
    pub fn for_device(rooted: bool) -> Self {
        if rooted {
            PackageFilter::All
        } else {
            PackageFilter::Debuggable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageFilter::All => "all",
            PackageFilter::Debuggable => "debuggable",
        }
    }
}

/// Opaque handle to one pulled database snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseSnapshotToken(String);

impl DatabaseSnapshotToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseSnapshotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The (device, package, database) triple a pull addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullTarget {
    pub device_id: String,
    pub package_name: String,
    pub db_name: String,
}

impl PullTarget {
    pub fn new(
        device_id: impl Into<String>,
        package_name: impl Into<String>,
        db_name: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            package_name: package_name.into(),
            db_name: db_name.into(),
        }
    }
}

impl fmt::Display for PullTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.device_id, self.package_name, self.db_name)
    }
}

/// Answer to a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<DatabaseSnapshotToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PullResponse {
    pub fn succeeded(token: impl Into<String>) -> Self {
        Self {
            success: true,
            token: Some(DatabaseSnapshotToken::new(token)),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            token: None,
            error: Some(error.into()),
        }
    }

    /// The acquired token, or the bridge's error text.
    pub fn into_token(self) -> Result<DatabaseSnapshotToken, String> {
        match (self.success, self.token) {
            (true, Some(token)) => Ok(token),
            (true, None) => Err("Pull succeeded without a snapshot token".to_string()),
            (false, _) => Err(self
                .error
                .unwrap_or_else(|| "Failed to pull database".to_string())),
        }
    }
}

/// One page of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablePage {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    /// Row count of the whole table, not of this page
    #[serde(default)]
    pub total: u64,
}

/// Result of an ad hoc query, in the three shapes the bridge produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Error { error: String },
    Message { message: String },
    Rows { columns: Vec<String>, rows: Vec<Row> },
}
