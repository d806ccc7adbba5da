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

//! # IP segments
//!
//! A [`BroadcastNetwork`] is an OSPF network: a subnet shared by a set of interfaces, either a
//! point-to-point link or a switched LAN. A [`TunnelSegment`] is the overlay subnet of a single
//! virtual leased line. Both hand out host addresses from their own [`HostCounter`].

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    address::HostCounter,
    types::{IfaceId, NodeId, TestbedError},
};

/// OSPF area of a network, printed in dotted notation. All networks of a testbed default to
/// area `0.0.0.0`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OspfArea(u32);

impl OspfArea {
    /// Area `0.0.0.0`
    pub const BACKBONE: OspfArea = OspfArea(0);
}

impl std::fmt::Display for OspfArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Ipv4Addr::from(self.0))
    }
}

impl From<u32> for OspfArea {
    fn from(x: u32) -> Self {
        OspfArea(x)
    }
}

/// Default OSPF cost of a network.
pub const DEFAULT_COST: u32 = 1;
/// Default OSPF hello interval, in seconds.
pub const DEFAULT_HELLO_INTERVAL: u32 = 2;

/// An OSPF network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastNetwork {
    ifaces: Vec<IfaceId>,
    hosts: HostCounter,
    cost: u32,
    hello_interval: u32,
    area: OspfArea,
}

impl BroadcastNetwork {
    /// Create a new network with the default OSPF parameters. Duplicate interfaces are dropped.
    pub fn new(subnet: Ipv4Net, ifaces: impl IntoIterator<Item = IfaceId>) -> Self {
        let mut net = Self {
            ifaces: Vec::new(),
            hosts: HostCounter::new(subnet),
            cost: DEFAULT_COST,
            hello_interval: DEFAULT_HELLO_INTERVAL,
            area: OspfArea::BACKBONE,
        };
        ifaces.into_iter().for_each(|i| {
            net.register_interface(i);
        });
        net
    }

    /// Set the OSPF cost.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Set the OSPF hello interval.
    pub fn with_hello_interval(mut self, hello_interval: u32) -> Self {
        self.hello_interval = hello_interval;
        self
    }

    /// Set the OSPF area.
    pub fn with_area(mut self, area: impl Into<OspfArea>) -> Self {
        self.area = area.into();
        self
    }

    /// The subnet of this network.
    pub fn subnet(&self) -> Ipv4Net {
        self.hosts.subnet()
    }

    /// OSPF cost
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// OSPF hello interval
    pub fn hello_interval(&self) -> u32 {
        self.hello_interval
    }

    /// OSPF area
    pub fn area(&self) -> OspfArea {
        self.area
    }

    /// All member interfaces, in registration order
    pub fn interfaces(&self) -> &[IfaceId] {
        &self.ifaces
    }

    /// The default gateway of hosts in this network, which is the first host address.
    pub fn gateway(&self) -> Option<Ipv4Addr> {
        self.subnet().hosts().next()
    }

    /// Allocate the next host address of the subnet.
    pub fn allocate_host_address(&mut self) -> Result<Ipv4Addr, TestbedError> {
        self.hosts.allocate()
    }

    /// Add an interface to the network. Returns `false` (and changes nothing) if the interface
    /// is already a member.
    pub fn register_interface(&mut self, iface: IfaceId) -> bool {
        if self.ifaces.contains(&iface) {
            debug!(
                "discarding append of {:?} to network {}: already added",
                iface,
                self.subnet()
            );
            false
        } else {
            self.ifaces.push(iface);
            true
        }
    }

    /// Returns `true` if `iface` is a member.
    pub fn contains(&self, iface: IfaceId) -> bool {
        self.ifaces.contains(&iface)
    }

    /// Returns `true` if any interface of `node` is a member.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.ifaces.iter().any(|i| i.node == node)
    }

    /// All member interfaces of `node`, in registration order.
    pub fn interfaces_of(&self, node: NodeId) -> Vec<IfaceId> {
        self.ifaces
            .iter()
            .filter(|i| i.node == node)
            .copied()
            .collect()
    }
}

/// Overlay subnet of a single virtual leased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelSegment {
    ifaces: Vec<IfaceId>,
    hosts: HostCounter,
}

impl TunnelSegment {
    /// Create an empty tunnel segment.
    pub fn new(subnet: Ipv4Net) -> Self {
        Self {
            ifaces: Vec::new(),
            hosts: HostCounter::new(subnet),
        }
    }

    /// The subnet of this segment.
    pub fn subnet(&self) -> Ipv4Net {
        self.hosts.subnet()
    }

    /// All member interfaces, in registration order
    pub fn interfaces(&self) -> &[IfaceId] {
        &self.ifaces
    }

    /// Allocate the next host address of the subnet.
    pub fn allocate_host_address(&mut self) -> Result<Ipv4Addr, TestbedError> {
        self.hosts.allocate()
    }

    /// Add an interface to the segment. Returns `false` if it is already a member.
    pub fn register_interface(&mut self, iface: IfaceId) -> bool {
        if self.ifaces.contains(&iface) {
            debug!(
                "discarding append of {:?} to tunnel {}: already added",
                iface,
                self.subnet()
            );
            false
        } else {
            self.ifaces.push(iface);
            true
        }
    }

    /// Returns `true` if `iface` is a member.
    pub fn contains(&self, iface: IfaceId) -> bool {
        self.ifaces.contains(&iface)
    }

    /// All member interfaces of `node`.
    pub fn interfaces_of(&self, node: NodeId) -> Vec<IfaceId> {
        self.ifaces
            .iter()
            .filter(|i| i.node == node)
            .copied()
            .collect()
    }
}
