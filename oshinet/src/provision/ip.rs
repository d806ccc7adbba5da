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

//! IP setup of the access networks.

use log::*;

use super::find_access;
use crate::{
    access::AccessTopology,
    topology::Topology,
    types::{Role, TestbedError},
    vlan::VlanTable,
};

/// Configure the switch ports on the path of every end host to its aggregation node. The port
/// facing the end host becomes an access port with the IP VLAN of the access network, and all
/// uplinks between switches carry the IP VLAN as trunk.
pub fn provision_ip(
    topo: &Topology,
    access: &[AccessTopology],
    vlans: &mut VlanTable,
) -> Result<(), TestbedError> {
    info!("L2 access networks IP setup");
    for host in topo.nodes_with_role(Role::EndHost) {
        let name = topo.get_node_name(host)?;
        let net = find_access(access, topo, host)?;
        let tag = net.classification().ip_vlan();
        info!("IP setup for {} in {} (vlan {})", name, net.name(), tag);

        for hop in net.path_to_aggregation(host)? {
            let current = hop.local.node;
            match (net.role(current)?, net.role(hop.peer)?) {
                (Role::EndHost, Role::AccessSwitch) => {
                    vlans.set_access(hop.remote, tag);
                }
                (Role::AccessSwitch, Role::Aggregation) => {
                    vlans.add_trunk(hop.local, tag);
                }
                (Role::AccessSwitch, Role::AccessSwitch) => {
                    vlans.add_trunk(hop.local, tag);
                    vlans.add_trunk(hop.remote, tag);
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
    }
    Ok(())
}
