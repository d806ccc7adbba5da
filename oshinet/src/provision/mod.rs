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

//! # Provisioning of access networks
//!
//! Both provisioners walk from an end host to the aggregation node of its access network and
//! label the ports they pass:
//!
//! - [`provision_ip`] configures plain IP connectivity of every end host.
//! - [`provision_tunnels`] sets up the virtual leased lines, adding a new link for every tunnel
//!   endpoint.

mod ip;
mod tunnel;

pub use ip::provision_ip;
pub use tunnel::{provision_tunnels, Anchor, CrossConnect, Side};

use crate::{
    access::AccessTopology,
    topology::Topology,
    types::{NodeId, TestbedError},
};

/// Find the access network that contains `node`.
pub(crate) fn find_access<'a>(
    access: &'a [AccessTopology],
    topo: &Topology,
    node: NodeId,
) -> Result<&'a AccessTopology, TestbedError> {
    access.iter().find(|a| a.contains(node)).ok_or_else(|| {
        TestbedError::UnknownEndpoint(
            topo.get_node_name(node)
                .map(|n| n.to_string())
                .unwrap_or_else(|_| format!("{node:?}")),
        )
    })
}
