use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use tracing::warn;

use super::error::{GridError, Result};

/// A `<resource name=".." type="..">value</resource>` entry reported for a queue instance
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename(deserialize = "@name", serialize = "name"))]
    pub name: String,
    #[serde(rename(deserialize = "@type", serialize = "type"), default)]
    pub kind: String,
    #[serde(rename(deserialize = "$text", serialize = "value"), default)]
    pub value: String,
}

impl Resource {
    pub fn new(name: &str, kind: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            value: value.to_string(),
        }
    }
}

/// Unit suffixes Grid Engine uses for memory values (decimal multiples)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageUnit {
    Kilo,
    Mega,
    Giga,
    Tera,
}

impl StorageUnit {
    pub fn from_suffix(suffix: char) -> Option<Self> {
        match suffix {
            'K' => Some(StorageUnit::Kilo),
            'M' => Some(StorageUnit::Mega),
            'G' => Some(StorageUnit::Giga),
            'T' => Some(StorageUnit::Tera),
            _ => None,
        }
    }

    pub fn multiplier(&self) -> i64 {
        match self {
            StorageUnit::Kilo => 1_000,
            StorageUnit::Mega => 1_000_000,
            StorageUnit::Giga => 1_000_000_000,
            StorageUnit::Tera => 1_000_000_000_000,
        }
    }
}

/// A scaled memory figure such as `10.2G`, with its absolute byte count
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageValue {
    pub size: f64,
    pub scale: String,
    pub bytes: i64,
}

impl StorageValue {
    /// Parse `<float><unit>`.
    ///
    /// An unrecognised unit, letter or not, leaves `bytes` at zero instead of failing.
    /// A value ending in a digit (`0.000`) is taken as a byte count.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let Some(last) = input.chars().last() else {
            return Err(GridError::InvalidStorageValue {
                value: input.to_string(),
            });
        };

        if last.is_ascii_digit() {
            let size = input
                .parse::<f64>()
                .map_err(|e| GridError::invalid_float(input, e))?;
            return Ok(Self {
                size,
                scale: String::new(),
                bytes: size as i64,
            });
        }

        let remainder = &input[..input.len() - last.len_utf8()];
        let size = remainder
            .parse::<f64>()
            .map_err(|e| GridError::invalid_float(remainder, e))?;

        let bytes = match StorageUnit::from_suffix(last) {
            Some(unit) => (size * unit.multiplier() as f64) as i64,
            None => {
                warn!("Unsupported storage unit {:?} in {:?}, leaving bytes at 0", last, input);
                0
            }
        };

        Ok(Self {
            size,
            scale: last.to_string(),
            bytes,
        })
    }

    /// The unit, if the scale is one Grid Engine uses
    pub fn unit(&self) -> Option<StorageUnit> {
        self.scale.chars().next().and_then(StorageUnit::from_suffix)
    }
}

impl FromStr for StorageValue {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        StorageValue::parse(s)
    }
}

impl fmt::Display for StorageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.size, self.scale)
    }
}

/// Load average window reported as `load_short`, `load_medium` and `load_long`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadWindow {
    Short,
    Medium,
    Long,
}

impl LoadWindow {
    pub fn key(&self) -> &'static str {
        match self {
            LoadWindow::Short => "load_short",
            LoadWindow::Medium => "load_medium",
            LoadWindow::Long => "load_long",
        }
    }
}

/// Unordered resource metrics of one queue instance. Names are not unique;
/// lookups return the first match.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceList(Vec<Resource>);

impl ResourceList {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self(resources)
    }

    /// First resource named `key`
    pub fn locate(&self, key: &str) -> Result<&Resource> {
        self.0
            .iter()
            .find(|r| r.name == key)
            .ok_or_else(|| GridError::ResourceNotFound {
                key: key.to_string(),
            })
    }

    pub fn float_value(&self, key: &str) -> Result<f64> {
        let resource = self.locate(key)?;
        let value = resource.value.trim();
        value
            .parse::<f64>()
            .map_err(|e| GridError::invalid_float(value, e))
    }

    pub fn integer_value(&self, key: &str) -> Result<i64> {
        let resource = self.locate(key)?;
        let value = resource.value.trim();
        value
            .parse::<i64>()
            .map_err(|e| GridError::invalid_integer(value, e))
    }

    pub fn storage_value(&self, key: &str) -> Result<StorageValue> {
        StorageValue::parse(&self.locate(key)?.value)
    }

    pub fn load(&self, window: LoadWindow) -> Result<f64> {
        self.float_value(window.key())
    }

    pub fn load_short(&self) -> Result<f64> {
        self.load(LoadWindow::Short)
    }

    pub fn load_medium(&self) -> Result<f64> {
        self.load(LoadWindow::Medium)
    }

    pub fn load_long(&self) -> Result<f64> {
        self.load(LoadWindow::Long)
    }

    /// `load_avg`, the figure qstat also shows in its queue summary
    pub fn load_average(&self) -> Result<f64> {
        self.float_value("load_avg")
    }

    pub fn num_processors(&self) -> Result<i32> {
        let resource = self.locate("num_proc")?;
        let value = resource.value.trim();
        value
            .parse::<i32>()
            .map_err(|e| GridError::invalid_integer(value, e))
    }

    pub fn free_memory(&self) -> Result<StorageValue> {
        self.storage_value("mem_free")
    }

    pub fn free_swap(&self) -> Result<StorageValue> {
        self.storage_value("swap_free")
    }

    pub fn free_virtual_memory(&self) -> Result<StorageValue> {
        self.storage_value("virtual_free")
    }

    pub fn total_memory(&self) -> Result<StorageValue> {
        self.storage_value("mem_total")
    }

    pub fn total_swap(&self) -> Result<StorageValue> {
        self.storage_value("swap_total")
    }

    pub fn total_virtual(&self) -> Result<StorageValue> {
        self.storage_value("virtual_total")
    }

    pub fn memory_used(&self) -> Result<StorageValue> {
        self.storage_value("mem_used")
    }

    pub fn swap_used(&self) -> Result<StorageValue> {
        self.storage_value("swap_used")
    }

    pub fn into_inner(self) -> Vec<Resource> {
        self.0
    }
}

impl Deref for ResourceList {
    type Target = [Resource];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Resource>> for ResourceList {
    fn from(resources: Vec<Resource>) -> Self {
        Self(resources)
    }
}

impl FromIterator<Resource> for ResourceList {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gridengine::error::ErrorKind;

    fn host_resources() -> ResourceList {
        ResourceList::new(vec![
            Resource::new("load_avg", "hl", "0.430000"),
            Resource::new("load_short", "hl", "0.510000"),
            Resource::new("load_medium", "hl", "0.430000"),
            Resource::new("load_long", "hl", "0.390000"),
            Resource::new("num_proc", "hl", "8"),
            Resource::new("mem_free", "hl", "10.2G"),
            Resource::new("mem_total", "hl", "15.519G"),
            Resource::new("mem_used", "hl", "512M"),
            Resource::new("swap_total", "hl", "2T"),
            Resource::new("swap_free", "hl", "abcG"),
            Resource::new("virtual_free", "hl", "3.5X"),
            Resource::new("num_proc", "hl", "16"),
        ])
    }

    #[test]
    fn test_storage_value_gigabytes() {
        let value = StorageValue::parse("10.2G").unwrap();
        assert_eq!(value.size, 10.2);
        assert_eq!(value.scale, "G");
        assert_eq!(value.bytes, 10_200_000_000);
        assert_eq!(value.unit(), Some(StorageUnit::Giga));
    }

    #[test]
    fn test_storage_value_megabytes_and_terabytes() {
        assert_eq!(StorageValue::parse("512M").unwrap().bytes, 512_000_000);
        assert_eq!(StorageValue::parse("2T").unwrap().bytes, 2_000_000_000_000);
        assert_eq!(StorageValue::parse("4K").unwrap().bytes, 4_000);
    }

    #[test]
    fn test_storage_value_unknown_unit_is_soft() {
        let value = StorageValue::parse("3.5X").unwrap();
        assert_eq!(value.size, 3.5);
        assert_eq!(value.scale, "X");
        assert_eq!(value.bytes, 0);
        assert_eq!(value.unit(), None);
    }

    #[test]
    fn test_storage_value_unknown_symbol_is_soft() {
        let value = StorageValue::parse("3.5%").unwrap();
        assert_eq!(value.size, 3.5);
        assert_eq!(value.scale, "%");
        assert_eq!(value.bytes, 0);
        assert_eq!(value.unit(), None);
    }

    #[test]
    fn test_storage_value_without_unit() {
        let value = StorageValue::parse("0.000").unwrap();
        assert_eq!(value.scale, "");
        assert_eq!(value.bytes, 0);
    }

    #[test]
    fn test_storage_value_errors() {
        assert_eq!(StorageValue::parse("abcG").unwrap_err().kind(), ErrorKind::Parse);
        assert!(matches!(
            StorageValue::parse("").unwrap_err(),
            GridError::InvalidStorageValue { .. }
        ));
    }

    #[test]
    fn test_num_processors_uses_first_match() {
        assert_eq!(host_resources().num_processors().unwrap(), 8);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let err = ResourceList::default().num_processors().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = host_resources().total_virtual().unwrap_err();
        assert!(matches!(err, GridError::ResourceNotFound { ref key } if key == "virtual_total"));
    }

    #[test]
    fn test_bad_value_is_parse_error() {
        let err = host_resources().free_swap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_load_windows() {
        let resources = host_resources();
        assert_eq!(resources.load_short().unwrap(), 0.51);
        assert_eq!(resources.load_medium().unwrap(), 0.43);
        assert_eq!(resources.load(LoadWindow::Long).unwrap(), 0.39);
        assert_eq!(resources.load_average().unwrap(), 0.43);
    }

    #[test]
    fn test_memory_accessors() {
        let resources = host_resources();
        assert_eq!(resources.free_memory().unwrap().bytes, 10_200_000_000);
        assert_eq!(resources.memory_used().unwrap().bytes, 512_000_000);
        assert_eq!(resources.total_swap().unwrap().scale, "T");
        assert_eq!(resources.total_memory().unwrap().size, 15.519);
    }
}
