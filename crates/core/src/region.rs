//! Platform regions and their routing clusters.
//!
//! The upstream API routes per-platform endpoints (summoner, league) to a
//! platform host such as `euw1`, and cross-platform endpoints (account, match)
//! to a regional cluster such as `europe`.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A game platform (server) a player account lives on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Na1,
    Br1,
    La1,
    La2,
    Euw1,
    Eun1,
    Tr1,
    Ru,
    Kr,
    Jp1,
    Oc1,
    Ph2,
    Sg2,
    Th2,
    Tw2,
    Vn2,
}

impl Region {
    pub const ALL: [Region; 16] = [
        Region::Na1,
        Region::Br1,
        Region::La1,
        Region::La2,
        Region::Euw1,
        Region::Eun1,
        Region::Tr1,
        Region::Ru,
        Region::Kr,
        Region::Jp1,
        Region::Oc1,
        Region::Ph2,
        Region::Sg2,
        Region::Th2,
        Region::Tw2,
        Region::Vn2,
    ];

    /// Platform host prefix, e.g. `euw1`.
    pub fn platform(&self) -> &'static str {
        match self {
            Region::Na1 => "na1",
            Region::Br1 => "br1",
            Region::La1 => "la1",
            Region::La2 => "la2",
            Region::Euw1 => "euw1",
            Region::Eun1 => "eun1",
            Region::Tr1 => "tr1",
            Region::Ru => "ru",
            Region::Kr => "kr",
            Region::Jp1 => "jp1",
            Region::Oc1 => "oc1",
            Region::Ph2 => "ph2",
            Region::Sg2 => "sg2",
            Region::Th2 => "th2",
            Region::Tw2 => "tw2",
            Region::Vn2 => "vn2",
        }
    }

    /// Cluster serving match history for this platform.
    pub fn match_cluster(&self) -> &'static str {
        match self {
            Region::Na1 | Region::Br1 | Region::La1 | Region::La2 => "americas",
            Region::Euw1 | Region::Eun1 | Region::Tr1 | Region::Ru => "europe",
            Region::Kr | Region::Jp1 => "asia",
            Region::Oc1 | Region::Ph2 | Region::Sg2 | Region::Th2 | Region::Tw2 | Region::Vn2 => {
                "sea"
            }
        }
    }

    /// Cluster serving account lookups. Account data has no `sea` cluster.
    pub fn account_cluster(&self) -> &'static str {
        match self.match_cluster() {
            "sea" => "asia",
            other => other,
        }
    }
}

impl core::fmt::Display for Region {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.platform())
    }
}

impl FromStr for Region {
    type Err = DomainError;

    /// Accepts platform ids (`euw1`) and the common short names (`euw`, `na`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let region = match normalized.as_str() {
            "na" | "na1" => Region::Na1,
            "br" | "br1" => Region::Br1,
            "lan" | "la1" => Region::La1,
            "las" | "la2" => Region::La2,
            "euw" | "euw1" => Region::Euw1,
            "eune" | "eun1" => Region::Eun1,
            "tr" | "tr1" => Region::Tr1,
            "ru" | "ru1" => Region::Ru,
            "kr" => Region::Kr,
            "jp" | "jp1" => Region::Jp1,
            "oce" | "oc1" => Region::Oc1,
            "ph" | "ph2" => Region::Ph2,
            "sg" | "sg2" => Region::Sg2,
            "th" | "th2" => Region::Th2,
            "tw" | "tw2" => Region::Tw2,
            "vn" | "vn2" => Region::Vn2,
            _ => return Err(DomainError::UnknownRegion(s.to_string())),
        };
        Ok(region)
    }
}
