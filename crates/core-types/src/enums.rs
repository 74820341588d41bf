use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Where the records of a benchmark come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BenchmarkType {
    Rowiverse,
    External,
    Internal,
}

/// The population a benchmark is meant to represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BenchmarkScope {
    Global,
    Region,
    Country,
    Sector,
    Tenant,
    Hub,
    Community,
}

/// Import lifecycle of a benchmark. Only `Ready` benchmarks can be analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BenchmarkStatus {
    Pending,
    Processing,
    Ready,
    Failed,
}

impl BenchmarkStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, BenchmarkStatus::Ready)
    }
}
