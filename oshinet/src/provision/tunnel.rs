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

//! SDN setup of the virtual leased lines.

use std::fmt;

use log::*;
use serde::{Deserialize, Serialize};

use super::find_access;
use crate::{
    access::AccessTopology,
    segment::{BroadcastNetwork, TunnelSegment},
    topology::Topology,
    types::{IfaceId, NodeId, Role, TestbedError, VlanTag},
    vlan::VlanTable,
};

/// Endpoint of a tunnel at an aggregation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    /// Aggregation node
    pub aggregation: NodeId,
    /// Port of the aggregation node facing the access network
    pub port: IfaceId,
    /// VLAN tag of the tunnel on that port
    pub vlan: VlanTag,
}

/// The cross connection that the controller must install for a single tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrossConnect {
    /// Anchor of the left endpoint
    pub left: Anchor,
    /// Anchor of the right endpoint
    pub right: Anchor,
}

/// Side of a tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Left-hand side
    Left,
    /// Right-hand side
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("LHS"),
            Side::Right => f.write_str("RHS"),
        }
    }
}

struct Provisioner<'a> {
    topo: &'a mut Topology,
    access: &'a [AccessTopology],
    networks: &'a mut [BroadcastNetwork],
    vlans: &'a mut VlanTable,
}

impl<'a> Provisioner<'a> {
    fn setup_side(
        &mut self,
        side: Side,
        host: NodeId,
        tunnel: &mut TunnelSegment,
        left: Option<&Anchor>,
    ) -> Result<Anchor, TestbedError> {
        let access = self.access;
        let name = self.topo.get_node_name(host)?.to_string();
        info!("SDN setup for {} ({})", name, side);
        let net = find_access(access, self.topo, host)?;
        debug!("{} is in {}", name, net.name());

        let anchor = net.nearest_aggregation(host)?;
        let tag = match left {
            Some(l) if l.aggregation == anchor.peer && l.port == anchor.remote => {
                info!("Internal tunnel, reusing VLAN tag {}", l.vlan);
                l.vlan
            }
            _ => self.vlans.next_tag(anchor.remote)?,
        };
        info!("Tunnel of {} uses VLAN tag {}", name, tag);

        for hop in net.path_to_aggregation(host)? {
            let current = hop.local.node;
            match (net.role(current)?, net.role(hop.peer)?) {
                (Role::EndHost, Role::AccessSwitch) => {
                    let link = self.topo.add_link(current, hop.peer)?;
                    let (host_iface, switch_iface) = link.endpoints();
                    tunnel.register_interface(host_iface);
                    self.vlans.set_access(switch_iface, tag);
                    self.networks
                        .iter_mut()
                        .find(|n| n.contains_node(current))
                        .ok_or_else(|| TestbedError::SegmentNotFound(name.clone()))?
                        .register_interface(host_iface);
                }
                (Role::AccessSwitch, Role::Aggregation) => {
                    self.vlans.add_trunk(hop.local, tag);
                    return Ok(Anchor {
                        aggregation: hop.peer,
                        port: hop.remote,
                        vlan: tag,
                    });
                }
                (Role::AccessSwitch, Role::AccessSwitch) => {
                    self.vlans.add_trunk(hop.local, tag);
                    self.vlans.add_trunk(hop.remote, tag);
                }
                (a, b) => {
                    return Err(TestbedError::TopologyMalformed(format!(
                        "unexpected hop from {} {} to {} {} in {}",
                        a,
                        net.node_name(current)?,
                        b,
                        net.node_name(hop.peer)?,
                        net.name()
                    )))
                }
            }
        }

        Err(TestbedError::TopologyMalformed(format!(
            "{} does not reach an aggregation node through an access switch",
            name
        )))
    }
}

/// Set up one tunnel for every pair of end hosts. The `k`th pair uses the `k`th tunnel segment.
///
/// All left sides are processed first, then all right sides. A right side anchored at the same
/// aggregation node and port as its left side reuses the VLAN tag of the left side. Every other
/// side draws a fresh tag from the counter of its aggregation port.
pub fn provision_tunnels(
    topo: &mut Topology,
    access: &[AccessTopology],
    networks: &mut [BroadcastNetwork],
    tunnels: &mut [TunnelSegment],
    pairs: &[(NodeId, NodeId)],
    vlans: &mut VlanTable,
) -> Result<Vec<CrossConnect>, TestbedError> {
    if tunnels.len() != pairs.len() {
        return Err(TestbedError::TunnelCountMismatch {
            reserved: tunnels.len(),
            requested: pairs.len(),
        });
    }
    info!("L2 access networks SDN setup");

    let mut p = Provisioner {
        topo,
        access,
        networks,
        vlans,
    };

    let mut left = Vec::with_capacity(pairs.len());
    for ((host, _), tunnel) in pairs.iter().zip(tunnels.iter_mut()) {
        left.push(p.setup_side(Side::Left, *host, tunnel, None)?);
    }

    let mut cross_connects = Vec::with_capacity(pairs.len());
    for (((_, host), tunnel), l) in pairs.iter().zip(tunnels.iter_mut()).zip(left) {
        let r = p.setup_side(Side::Right, *host, tunnel, Some(&l))?;
        cross_connects.push(CrossConnect { left: l, right: r });
    }

    Ok(cross_connects)
}
