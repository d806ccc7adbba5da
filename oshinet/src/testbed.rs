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

//! # Testbed
//!
//! The [`Testbed`] owns everything of a single provisioning run: the [`Topology`], the
//! [`AddressPlan`], all IP segments, access networks, the [`VlanTable`], and the loopback
//! addresses. A run proceeds strictly in this order:
//!
//! 1. [`Testbed::reserve_tunnels`] sizes the loopback pool.
//! 2. Nodes, links and networks are added (manually, or with a
//!    [`TestbedBuilder`](crate::builder::TestbedBuilder)).
//! 3. [`Testbed::add_tunnels`] declares the virtual leased lines.
//! 4. [`Testbed::provision`] configures the access networks.
//! 5. [`Testbed::assign_addresses`] configures all interfaces.

use std::{collections::BTreeMap, net::Ipv4Addr};

use ipnet::Ipv4Net;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    access::{AccessTopology, Classification},
    address::AddressPlan,
    provision::{provision_ip, provision_tunnels, CrossConnect},
    segment::{BroadcastNetwork, TunnelSegment},
    topology::Topology,
    types::{IfaceId, Link, NodeId, Role, TestbedError},
    vlan::VlanTable,
};

/// Hello interval of the controller network.
pub const CONTROLLER_HELLO_INTERVAL: u32 = 5;

/// IP configuration of a single interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IfaceAddress {
    /// Address and prefix length
    pub address: Ipv4Net,
    /// Default gateway (only set on end host interfaces of broadcast networks)
    pub gateway: Option<Ipv4Addr>,
}

/// The testbed of a single provisioning run.
#[derive(Debug, Clone)]
pub struct Testbed {
    topo: Topology,
    plan: AddressPlan,
    networks: Vec<BroadcastNetwork>,
    access: Vec<AccessTopology>,
    tunnels: Vec<TunnelSegment>,
    reserved_tunnels: Option<usize>,
    pairs: Vec<(NodeId, NodeId)>,
    vlans: VlanTable,
    loopbacks: BTreeMap<NodeId, Ipv4Addr>,
    cross_connects: Option<Vec<CrossConnect>>,
    addresses: Option<BTreeMap<IfaceId, IfaceAddress>>,
}

impl Testbed {
    /// Create an empty testbed.
    pub fn new(plan: AddressPlan) -> Self {
        let vlans = VlanTable::new(plan.vlan_floor);
        Self {
            topo: Topology::new(),
            plan,
            networks: Vec::new(),
            access: Vec::new(),
            tunnels: Vec::new(),
            reserved_tunnels: None,
            pairs: Vec::new(),
            vlans,
            loopbacks: BTreeMap::new(),
            cross_connects: None,
            addresses: None,
        }
    }

    /// Declare the number of tunnels. This must happen before the first router is added, because
    /// the loopback addresses depend on the number of tunnel segments.
    pub fn reserve_tunnels(&mut self, n: usize) -> Result<(), TestbedError> {
        self.plan.loopbacks.prepare(n)?;
        self.reserved_tunnels = Some(n);
        Ok(())
    }

    /// Add a node without a loopback address (end hosts and access switches).
    pub fn add_node(&mut self, name: impl Into<String>, role: Role) -> Result<NodeId, TestbedError> {
        let name = name.into();
        if role.is_router() {
            // draw the loopback first, such that a failure leaves the topology untouched.
            let lo = self.plan.loopbacks.next_address()?;
            let id = self.topo.add_node(name, role)?;
            debug!("loopback of {}: {}", self.topo.get_node_name(id)?, lo);
            self.loopbacks.insert(id, lo);
            Ok(id)
        } else {
            self.topo.add_node(name, role)
        }
    }

    /// Add a core node with a loopback address.
    pub fn add_router(&mut self, name: impl Into<String>) -> Result<NodeId, TestbedError> {
        self.add_node(name, Role::Core)
    }

    /// Add an aggregation node with a loopback address.
    pub fn add_aggregation(&mut self, name: impl Into<String>) -> Result<NodeId, TestbedError> {
        self.add_node(name, Role::Aggregation)
    }

    /// Add a controller. Its loopback address is drawn when addresses are assigned.
    pub fn add_controller(&mut self, name: impl Into<String>) -> Result<NodeId, TestbedError> {
        self.add_node(name, Role::Controller)
    }

    /// Add a physical link between two nodes.
    pub fn add_link(&mut self, a: NodeId, b: NodeId) -> Result<Link, TestbedError> {
        self.topo.add_link(a, b)
    }

    /// Add a broadcast network. Returns its index.
    pub fn add_network(&mut self, network: BroadcastNetwork) -> usize {
        info!(
            "*** OSPF network {} with {} interfaces",
            network.subnet(),
            network.interfaces().len()
        );
        self.networks.push(network);
        self.networks.len() - 1
    }

    /// Connect `a` and `b` with a new point-to-point network.
    pub fn add_p2p_network(&mut self, a: NodeId, b: NodeId) -> Result<usize, TestbedError> {
        let subnet = self.plan.core.next_subnet()?;
        let link = self.topo.add_link(a, b)?;
        Ok(self.add_network(BroadcastNetwork::new(subnet, [link.a(), link.b()])))
    }

    /// Connect `node` to the controller `ctrl` using the reserved controller subnet.
    pub fn add_controller_network(
        &mut self,
        node: NodeId,
        ctrl: NodeId,
        hello_interval: u32,
    ) -> Result<usize, TestbedError> {
        let subnet = self.plan.controller_subnet()?;
        if self.networks.iter().any(|n| n.subnet() == subnet) {
            return Err(TestbedError::AddressSpaceExhausted(format!(
                "controller subnet {subnet} is already used"
            )));
        }
        let link = self.topo.add_link(node, ctrl)?;
        Ok(self.add_network(
            BroadcastNetwork::new(subnet, [link.a(), link.b()]).with_hello_interval(hello_interval),
        ))
    }

    /// Add a broadcast network with the given interfaces and the next free subnet.
    pub fn add_switched_network(
        &mut self,
        ifaces: impl IntoIterator<Item = IfaceId>,
    ) -> Result<usize, TestbedError> {
        let subnet = self.plan.core.next_subnet()?;
        Ok(self.add_network(BroadcastNetwork::new(subnet, ifaces)))
    }

    /// Add an empty access network. Returns its index.
    pub fn add_access_topology(
        &mut self,
        name: impl Into<String>,
        classification: Classification,
    ) -> usize {
        self.access.push(AccessTopology::new(name, classification));
        self.access.len() - 1
    }

    /// Create a new link and add it to the access network `idx`.
    pub fn add_access_link(
        &mut self,
        idx: usize,
        a: NodeId,
        b: NodeId,
    ) -> Result<Link, TestbedError> {
        let link = self.topo.add_link(a, b)?;
        self.access
            .get_mut(idx)
            .ok_or_else(|| {
                TestbedError::TopologyMalformed(format!("access network {idx} does not exist"))
            })?
            .add_link(&self.topo, link)?;
        Ok(link)
    }

    /// Declare the virtual leased lines as end host pairs, and allocate one tunnel segment for
    /// each of them.
    pub fn add_tunnels<S: AsRef<str>>(
        &mut self,
        pairs: impl IntoIterator<Item = (S, S)>,
    ) -> Result<(), TestbedError> {
        let mut resolved = Vec::new();
        for (a, b) in pairs {
            let (a, b) = (a.as_ref(), b.as_ref());
            let lookup = |name: &str| {
                self.topo
                    .get_node_id(name)
                    .ok()
                    .filter(|id| self.topo.get_role(*id).ok() == Some(Role::EndHost))
                    .ok_or_else(|| {
                        error!("misconfigured virtual leased line {} <-> {}", a, b);
                        TestbedError::UnknownEndpoint(name.to_string())
                    })
            };
            resolved.push((lookup(a)?, lookup(b)?));
        }

        let reserved = self.reserved_tunnels.unwrap_or(0);
        if resolved.len() + self.pairs.len() != reserved {
            return Err(TestbedError::TunnelCountMismatch {
                reserved,
                requested: resolved.len() + self.pairs.len(),
            });
        }

        for pair in resolved {
            let subnet = self.plan.tunnels.next_subnet()?;
            debug!(
                "tunnel {} <-> {} uses {}",
                self.topo.get_node_name(pair.0)?,
                self.topo.get_node_name(pair.1)?,
                subnet
            );
            self.tunnels.push(TunnelSegment::new(subnet));
            self.pairs.push(pair);
        }
        Ok(())
    }

    /// Configure the access networks: first plain IP, then the virtual leased lines. Calling this
    /// function again returns the same cross connections and leaves the testbed unchanged.
    pub fn provision(&mut self) -> Result<&[CrossConnect], TestbedError> {
        let cross_connects = match self.cross_connects.take() {
            Some(cross_connects) => cross_connects,
            None => self.compute_cross_connects()?,
        };
        Ok(self.cross_connects.insert(cross_connects).as_slice())
    }

    fn compute_cross_connects(&mut self) -> Result<Vec<CrossConnect>, TestbedError> {
        for net in self.access.iter() {
            net.validate()?;
        }
        provision_ip(&self.topo, &self.access, &mut self.vlans)?;
        provision_tunnels(
            &mut self.topo,
            &self.access,
            &mut self.networks,
            &mut self.tunnels,
            &self.pairs,
            &mut self.vlans,
        )
    }

    /// Assign an address to every interface of every IP segment, visiting controllers, core nodes,
    /// aggregation nodes, and end hosts in that order. Interfaces that are part of a tunnel get an
    /// address of the tunnel segment. Calling this function again returns the same assignment.
    pub fn assign_addresses(&mut self) -> Result<&BTreeMap<IfaceId, IfaceAddress>, TestbedError> {
        let addresses = match self.addresses.take() {
            Some(addresses) => addresses,
            None => self.compute_addresses()?,
        };
        Ok(&*self.addresses.insert(addresses))
    }

    fn compute_addresses(&mut self) -> Result<BTreeMap<IfaceId, IfaceAddress>, TestbedError> {
        info!("Configure the nodes");
        let mut addresses = BTreeMap::new();

        for ctrl in self.topo.nodes_with_role(Role::Controller) {
            if !self.loopbacks.contains_key(&ctrl) {
                let lo = self.plan.loopbacks.next_address()?;
                debug!("loopback of {}: {}", self.topo.get_node_name(ctrl)?, lo);
                self.loopbacks.insert(ctrl, lo);
            }
        }

        let order = [
            Role::Controller,
            Role::Core,
            Role::Aggregation,
            Role::EndHost,
        ];
        for role in order {
            for node in self.topo.nodes_with_role(role) {
                let mut found = false;
                for net in self.networks.iter_mut() {
                    for iface in net.interfaces_of(node) {
                        found = true;
                        let addr = match self.tunnels.iter_mut().find(|t| t.contains(iface)) {
                            Some(tunnel) => IfaceAddress {
                                address: Ipv4Net::new(
                                    tunnel.allocate_host_address()?,
                                    tunnel.subnet().prefix_len(),
                                )?,
                                gateway: None,
                            },
                            None => IfaceAddress {
                                address: Ipv4Net::new(
                                    net.allocate_host_address()?,
                                    net.subnet().prefix_len(),
                                )?,
                                gateway: (role == Role::EndHost)
                                    .then(|| net.gateway())
                                    .flatten(),
                            },
                        };
                        trace!(
                            "{}: {}",
                            self.topo.iface_name(iface)?,
                            addr.address
                        );
                        addresses.insert(iface, addr);
                    }
                }
                if !found {
                    return Err(TestbedError::SegmentNotFound(
                        self.topo.get_node_name(node)?.to_string(),
                    ));
                }
            }
        }

        Ok(addresses)
    }

    /// Get a reference to the topology.
    pub fn topology(&self) -> &Topology {
        &self.topo
    }

    /// Get a reference to the address plan.
    pub fn address_plan(&self) -> &AddressPlan {
        &self.plan
    }

    /// All broadcast networks.
    pub fn networks(&self) -> &[BroadcastNetwork] {
        &self.networks
    }

    /// All access networks.
    pub fn access_topologies(&self) -> &[AccessTopology] {
        &self.access
    }

    /// All tunnel segments, one for each pair.
    pub fn tunnels(&self) -> &[TunnelSegment] {
        &self.tunnels
    }

    /// All tunnel pairs.
    pub fn pairs(&self) -> &[(NodeId, NodeId)] {
        &self.pairs
    }

    /// The VLAN tables.
    pub fn vlans(&self) -> &VlanTable {
        &self.vlans
    }

    /// All cross connections, available after [`Testbed::provision`].
    pub fn cross_connects(&self) -> &[CrossConnect] {
        self.cross_connects.as_deref().unwrap_or_default()
    }

    /// Loopback of a node.
    pub fn loopback(&self, node: NodeId) -> Option<Ipv4Addr> {
        self.loopbacks.get(&node).copied()
    }

    /// All loopback addresses.
    pub fn loopbacks(&self) -> &BTreeMap<NodeId, Ipv4Addr> {
        &self.loopbacks
    }

    /// All interface addresses, available after [`Testbed::assign_addresses`].
    pub fn addresses(&self) -> Option<&BTreeMap<IfaceId, IfaceAddress>> {
        self.addresses.as_ref()
    }
}
