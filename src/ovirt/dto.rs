//! Engine API data-transfer objects (API v4)
//!
//! Mirrors only the parts of the engine's JSON schema the collector reads.
//! The engine encodes most numbers and booleans as strings and timestamps as
//! epoch milliseconds; the `lenient` helpers accept either encoding.

use crate::domain::ports::{Disk, DiskAttachment, VirtualMachine, VmStatus};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::Deserialize;

// =============================================================================
// Collections
// =============================================================================

/// Decode a collection response.
///
/// Accepts a bare JSON array or the engine's envelope object keyed by the
/// element name (`{"vm": [...]}`). An envelope without the key, such as
/// `{}`, is an empty collection.
pub fn decode_collection<T: DeserializeOwned>(body: &[u8], key: &str, what: &str) -> Result<Vec<T>> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| Error::decode(what, e))?;

    let items = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut envelope) => match envelope.remove(key) {
            Some(items) => items,
            None => return Ok(Vec::new()),
        },
        other => {
            let e = serde_json::Error::custom(format!(
                "expected array or object, found {}",
                json_type(&other)
            ));
            return Err(Error::decode(what, e));
        }
    };

    serde_json::from_value(items).map_err(|e| Error::decode(what, e))
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// =============================================================================
// Virtual Machine
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct VmDto {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fqdn: Option<String>,
    /// Memory in bytes
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub memory: Option<u64>,
    #[serde(default)]
    pub cpu: Option<CpuDto>,
    #[serde(default)]
    pub status: Option<VmStatus>,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_epoch_millis")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_epoch_millis")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::opt_epoch_millis")]
    pub stop_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub os: Option<OperatingSystemDto>,
    #[serde(default)]
    pub serial_number: Option<SerialNumberDto>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub run_once: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuDto {
    #[serde(default)]
    pub topology: Option<CpuTopologyDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuTopologyDto {
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub cores: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub sockets: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub threads: Option<u32>,
}

impl CpuTopologyDto {
    /// cores x sockets x threads; threads default to one
    pub fn vcpus(&self) -> Option<u32> {
        let cores = self.cores?;
        let sockets = self.sockets?;
        cores
            .checked_mul(sockets)?
            .checked_mul(self.threads.unwrap_or(1))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperatingSystemDto {
    #[serde(default, rename = "type")]
    pub os_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SerialNumberDto {
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl From<VmDto> for VirtualMachine {
    fn from(dto: VmDto) -> Self {
        VirtualMachine {
            id: dto.id,
            name: dto.name,
            memory: dto.memory,
            cpu_count: dto
                .cpu
                .and_then(|cpu| cpu.topology)
                .and_then(|topology| topology.vcpus()),
            status: dto.status,
            status_detail: dto.status_detail,
            stop_reason: dto.stop_reason,
            creation_time: dto.creation_time,
            start_time: dto.start_time,
            stop_time: dto.stop_time,
            comment: dto.comment,
            description: dto.description,
            fqdn: dto.fqdn,
            os_type: dto.os.and_then(|os| os.os_type),
            serial_number: dto.serial_number.and_then(|serial| serial.value),
            run_once: dto.run_once,
        }
    }
}

// =============================================================================
// Disk
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct DiskDto {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    /// Initial size of a sparse image on block storage, in bytes
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub initial_size: Option<u64>,
    /// Virtual size, in bytes
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub provisioned_size: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub actual_size: Option<u64>,
    #[serde(default)]
    pub storage_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub lun_storage: Option<HostStorageDto>,
}

/// Storage backing a disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostStorageDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub storage_type: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl From<DiskDto> for Disk {
    fn from(dto: DiskDto) -> Self {
        Disk {
            id: dto.id,
            initial_size: dto.initial_size,
            storage_description: dto.lun_storage.and_then(|storage| storage.description),
        }
    }
}

// =============================================================================
// Disk Attachment
// =============================================================================

/// Link to another engine object
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiskAttachmentDto {
    #[serde(default)]
    pub id: Option<String>,
    /// The attached disk
    #[serde(default)]
    pub disk: Option<ObjectRef>,
    #[serde(default)]
    pub vm: Option<ObjectRef>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub bootable: Option<bool>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub read_only: Option<bool>,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub logical_name: Option<String>,
}

impl From<DiskAttachmentDto> for DiskAttachment {
    fn from(dto: DiskAttachmentDto) -> Self {
        DiskAttachment {
            id: dto.id,
            disk_id: dto.disk.and_then(|disk| disk.id),
            bootable: dto.bootable,
            read_only: dto.read_only,
            active: dto.active,
        }
    }
}

// =============================================================================
// Lenient scalar decoding
// =============================================================================

pub(crate) mod lenient {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Int(i64),
        Uint(u64),
        Str(String),
    }

    fn scalar<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Scalar>, D::Error> {
        Ok(match Option::<Scalar>::deserialize(d)? {
            Some(Scalar::Str(s)) if s.trim().is_empty() => None,
            other => other,
        })
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        match scalar(d)? {
            None => Ok(None),
            Some(Scalar::Uint(n)) => Ok(Some(n)),
            Some(Scalar::Int(n)) => u64::try_from(n).map(Some).map_err(D::Error::custom),
            Some(Scalar::Str(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
            Some(Scalar::Bool(b)) => Err(D::Error::custom(format!("expected integer, found {b}"))),
        }
    }

    pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        opt_u64(d)?
            .map(|n| u32::try_from(n).map_err(D::Error::custom))
            .transpose()
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        match scalar(d)? {
            None => Ok(None),
            Some(Scalar::Bool(b)) => Ok(Some(b)),
            Some(Scalar::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                other => Err(D::Error::custom(format!("expected boolean, found {other:?}"))),
            },
            Some(_) => Err(D::Error::custom("expected boolean")),
        }
    }

    pub fn opt_epoch_millis<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let millis = match scalar(d)? {
            None => return Ok(None),
            Some(Scalar::Int(n)) => n,
            Some(Scalar::Uint(n)) => i64::try_from(n).map_err(D::Error::custom)?,
            Some(Scalar::Str(s)) => s.trim().parse::<i64>().map_err(D::Error::custom)?,
            Some(Scalar::Bool(_)) => return Err(D::Error::custom("expected timestamp")),
        };
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}")))
    }
}
