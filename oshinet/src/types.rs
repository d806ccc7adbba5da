// OshiNet: Topology, addressing and VLAN provisioning for hybrid IP/SDN testbeds
// Copyright (C) 2023 The OshiNet Authors
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

//! Module containing all type definitions

use std::fmt;

use ipnet::Ipv4Net;
use petgraph::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) type IndexType = u32;
/// Node Identification (and index into the graph)
pub type NodeId = NodeIndex<IndexType>;
/// Physical network graph. Parallel edges are allowed, because every virtual leased line adds a
/// second link between an end host and its access switch.
pub type PhysicalNetwork = StableGraph<(), Link, Undirected, IndexType>;

/// The role of a node in the testbed. The role is fixed when the node is added to the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// End user host, attached to exactly one access switch.
    EndHost,
    /// Layer 2 access switch.
    AccessSwitch,
    /// Aggregation node (access OSHI), bridging an access network to the core.
    Aggregation,
    /// Core node (OSHI).
    Core,
    /// SDN controller.
    Controller,
}

impl Role {
    /// Classify a node by the legacy naming convention of hand-written topology files (`euh*`,
    /// `sw*`, `aos*`, `osh*`, and `c<number>` or `ctrl*`). Returns `None` if the name matches none
    /// of them.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.starts_with("euh") {
            Some(Self::EndHost)
        } else if name.starts_with("sw") {
            Some(Self::AccessSwitch)
        } else if name.starts_with("aos") {
            Some(Self::Aggregation)
        } else if name.starts_with("osh") {
            Some(Self::Core)
        } else if name.starts_with("ctrl")
            || (name.len() > 1
                && name.starts_with('c')
                && name[1..].chars().all(|c| c.is_ascii_digit()))
        {
            Some(Self::Controller)
        } else {
            None
        }
    }

    /// Index of the first interface of a node with that role. Switches count their ports from 1,
    /// every other node from 0.
    pub fn first_iface_index(&self) -> u32 {
        match self {
            Self::AccessSwitch => 1,
            _ => 0,
        }
    }

    /// Returns `true` for nodes that run the routing daemon and own a loopback address.
    pub fn is_router(&self) -> bool {
        matches!(self, Self::Core | Self::Aggregation)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::EndHost => "end host",
            Role::AccessSwitch => "access switch",
            Role::Aggregation => "aggregation node",
            Role::Core => "core node",
            Role::Controller => "controller",
        })
    }
}

/// Interface of a node, identified by the node and the interface number on that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IfaceId {
    /// Node that owns the interface.
    pub node: NodeId,
    /// Interface number (`eth<index>`).
    pub index: u32,
}

impl IfaceId {
    /// Create a new interface id.
    pub fn new(node: NodeId, index: u32) -> Self {
        Self { node, index }
    }
}

/// A physical link, connecting two interfaces of two different nodes. Links are immutable once
/// created. The order of the endpoints is the order in which the link was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    a: IfaceId,
    b: IfaceId,
}

impl Link {
    pub(crate) fn new(a: IfaceId, b: IfaceId) -> Self {
        Self { a, b }
    }

    /// The first endpoint (of the node passed first when creating the link).
    pub fn a(&self) -> IfaceId {
        self.a
    }

    /// The second endpoint.
    pub fn b(&self) -> IfaceId {
        self.b
    }

    /// Both endpoints.
    pub fn endpoints(&self) -> (IfaceId, IfaceId) {
        (self.a, self.b)
    }

    /// Returns `true` if one of the endpoints belongs to `node`.
    pub fn connects(&self, node: NodeId) -> bool {
        self.a.node == node || self.b.node == node
    }

    /// Get the interface of `node` on this link.
    pub fn iface_of(&self, node: NodeId) -> Option<IfaceId> {
        if self.a.node == node {
            Some(self.a)
        } else if self.b.node == node {
            Some(self.b)
        } else {
            None
        }
    }

    /// Get the interface on the opposite side of `node`.
    pub fn peer_of(&self, node: NodeId) -> Option<IfaceId> {
        if self.a.node == node {
            Some(self.b)
        } else if self.b.node == node {
            Some(self.a)
        } else {
            None
        }
    }

    /// Get the interface on the other side of `iface`.
    pub fn other(&self, iface: IfaceId) -> Option<IfaceId> {
        if self.a == iface {
            Some(self.b)
        } else if self.b == iface {
            Some(self.a)
        } else {
            None
        }
    }
}

/// 802.1Q VLAN identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VlanTag(pub u16);

impl VlanTag {
    /// Untagged traffic.
    pub const UNTAGGED: VlanTag = VlanTag(0);
    /// VLAN used for IP traffic in the core.
    pub const CORE: VlanTag = VlanTag(1);
    /// The first tag that may be handed out to a virtual leased line.
    pub const FIRST_FREE: VlanTag = VlanTag(2);
    /// The largest valid VLAN identifier.
    pub const MAX: VlanTag = VlanTag(4094);

    /// Returns `true` for the tags used by native and core traffic.
    pub fn is_reserved(&self) -> bool {
        *self < Self::FIRST_FREE
    }
}

impl fmt::Display for VlanTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for VlanTag {
    fn from(x: u16) -> Self {
        Self(x)
    }
}

/// Errors raised while building and provisioning a testbed. All of them are fatal to the
/// provisioning run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TestbedError {
    /// An address pool has no addresses left.
    #[error("Address space exhausted: {0} sold out!")]
    AddressSpaceExhausted(String),
    /// A segment subnet has no host addresses left.
    #[error("Subnet {0} has no host addresses left!")]
    SubnetExhausted(Ipv4Net),
    /// Loopback addresses were requested before the tunnels were added.
    #[error("Loopback pool is not ready, first add all tunnels!")]
    LoopbackNotReady,
    /// A tunnel endpoint is not an end host of any access network.
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),
    /// A node is not part of any IP segment.
    #[error("Cannot find {0} in the OSPF networks!")]
    SegmentNotFound(String),
    /// The topology violates the tree shape of access networks.
    #[error("Malformed topology: {0}")]
    TopologyMalformed(String),
    /// A port handed out all VLAN tags.
    #[error("VLAN tags of port {0} are exhausted!")]
    VlanSpaceExhausted(String),
    /// The number of tunnels differs from the number of reserved tunnel segments.
    #[error("Tunnel segments reserved for {reserved} tunnels, but {requested} were requested")]
    TunnelCountMismatch {
        /// Number of reserved tunnel segments
        reserved: usize,
        /// Number of requested tunnels
        requested: usize,
    },
    /// Device is not present in the topology
    #[error("Network device was not found in topology: {0:?}")]
    DeviceNotFound(NodeId),
    /// Device name is not present in the topology
    #[error("Network device name was not found in topology: {0}")]
    DeviceNameNotFound(String),
    /// Device name is already used
    #[error("Network device name is already used: {0}")]
    DuplicateName(String),
    /// The address plan is inconsistent.
    #[error("Invalid address plan: {0}")]
    InvalidAddressPlan(String),
    /// Invalid prefix length in the address plan.
    #[error("Invalid prefix length: {0}")]
    InvalidPrefixLen(#[from] ipnet::PrefixLenError),
}
