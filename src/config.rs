// OSHI Deployer: Provisioning plans for hybrid IP/SDN testbeds
// Copyright (C) 2023 The OSHI Deployer Authors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Configuration of a deployment run.

use std::{
    fmt,
    fs::read_to_string,
    net::{Ipv4Addr, SocketAddrV4},
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::ValueEnum;
use oshinet::{access::Classification, address::AddressPlanBuilder, types::VlanTag};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DeployError;

/// Error thrown while parsing configuration arguments.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The topology argument cannot be parsed.
    #[error("Invalid topology {0:?}, expected `mesh:N`, `e_r:N,P`, `tree:DEPTH,FANOUT` or `file:PATH`")]
    InvalidTopology(String),
    /// The virtual leased line cannot be parsed.
    #[error("Invalid virtual leased line {0:?}, expected `LEFT:RIGHT`")]
    InvalidVll(String),
}

/// How the core forwards plain IP traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
pub enum CoreApproach {
    /// IP traffic in the core is tagged with VLAN 1.
    #[default]
    A,
    /// IP traffic in the core is untagged.
    B,
}

impl CoreApproach {
    /// VLAN of plain IP traffic in the core.
    pub fn ip_vlan(&self) -> VlanTag {
        match self {
            Self::A => VlanTag::CORE,
            Self::B => VlanTag::UNTAGGED,
        }
    }
}

/// The topology to deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TopologySpec {
    /// Full mesh of `n` core nodes.
    Mesh(usize),
    /// Random core of `n` nodes, each pair connected with probability `p`.
    ErdosRenyi {
        /// Number of core nodes
        n: usize,
        /// Link probability
        p: f64,
    },
    /// Balanced tree core.
    Tree {
        /// Depth of the tree
        depth: usize,
        /// Number of children of inner nodes
        fanout: usize,
    },
    /// Topology description file.
    File(PathBuf),
}

impl Default for TopologySpec {
    fn default() -> Self {
        Self::Mesh(3)
    }
}

impl fmt::Display for TopologySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologySpec::Mesh(n) => write!(f, "mesh:{n}"),
            TopologySpec::ErdosRenyi { n, p } => write!(f, "e_r:{n},{p}"),
            TopologySpec::Tree { depth, fanout } => write!(f, "tree:{depth},{fanout}"),
            TopologySpec::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

impl FromStr for TopologySpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConfigError::InvalidTopology(s.to_string());
        let (kind, args) = s.trim().split_once(':').ok_or_else(err)?;
        let pair = || -> Result<(&str, &str), ConfigError> {
            args.split_once(',')
                .map(|(a, b)| (a.trim(), b.trim()))
                .ok_or_else(err)
        };
        match kind {
            "mesh" => Ok(Self::Mesh(args.trim().parse().map_err(|_| err())?)),
            "e_r" => {
                let (n, p) = pair()?;
                Ok(Self::ErdosRenyi {
                    n: n.parse().map_err(|_| err())?,
                    p: p.parse().map_err(|_| err())?,
                })
            }
            "tree" => {
                let (depth, fanout) = pair()?;
                Ok(Self::Tree {
                    depth: depth.parse().map_err(|_| err())?,
                    fanout: fanout.parse().map_err(|_| err())?,
                })
            }
            "file" if !args.trim().is_empty() => Ok(Self::File(PathBuf::from(args.trim()))),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for TopologySpec {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TopologySpec> for String {
    fn from(value: TopologySpec) -> Self {
        value.to_string()
    }
}

/// A virtual leased line between two end hosts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VllPair {
    /// Name of the left end host
    pub left: String,
    /// Name of the right end host
    pub right: String,
}

impl VllPair {
    /// Create a new pair.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

impl fmt::Display for VllPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.left, self.right)
    }
}

impl FromStr for VllPair {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((l, r)) if !l.trim().is_empty() && !r.trim().is_empty() => {
                Ok(Self::new(l.trim(), r.trim()))
            }
            _ => Err(ConfigError::InvalidVll(s.to_string())),
        }
    }
}

impl TryFrom<String> for VllPair {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VllPair> for String {
    fn from(value: VllPair) -> Self {
        value.to_string()
    }
}

/// Configuration of a deployment run. All fields are optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployerConfig {
    /// The topology to deploy.
    pub topology: TopologySpec,
    /// Virtual leased lines to set up.
    pub vlls: Vec<VllPair>,
    /// How the core forwards plain IP traffic.
    pub core_approach: CoreApproach,
    /// Classification of generated access networks, and of access networks in description files.
    pub access_classification: Classification,
    /// SDN controllers, assigned round-robin to the OSHI nodes.
    pub controllers: Vec<SocketAddrV4>,
    /// Address ranges of the testbed.
    pub address_plan: AddressPlanBuilder,
    /// Number of end hosts in each generated access network.
    pub hosts_per_access_network: usize,
    /// Seed for random cores. If not set, the core is chosen from entropy.
    pub seed: Option<u64>,
    /// Write the deployment plan as JSON to this file.
    pub output: Option<PathBuf>,
    /// Write the cross connections, one line per tunnel, to this file.
    pub vll_config: Option<PathBuf>,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            topology: TopologySpec::default(),
            vlls: vec![VllPair::new("euh1", "euh3"), VllPair::new("euh2", "euh1")],
            core_approach: CoreApproach::A,
            access_classification: Classification::B,
            controllers: vec![SocketAddrV4::new(Ipv4Addr::new(192, 168, 0, 1), 6633)],
            address_plan: AddressPlanBuilder::default(),
            hosts_per_access_network: 1,
            seed: None,
            output: None,
            vll_config: None,
        }
    }
}

impl DeployerConfig {
    /// Read the configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        Self::from_json(&read_to_string(path)?)
    }

    /// Parse the configuration from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, DeployError> {
        Ok(serde_json::from_str(s)?)
    }
}
