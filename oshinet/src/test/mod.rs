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

//! Test module

mod test_access;
mod test_tunnel;

use crate::prelude::*;

/// Testbed with a single access network: aggregation node `aos1`, access switch `sw1`, and the end
/// hosts `euh1` to `euh<n_hosts>`, all in one broadcast network.
pub(crate) fn single_access(
    n_hosts: usize,
    n_tunnels: usize,
    classification: Classification,
) -> Result<Testbed, TestbedError> {
    let mut testbed = Testbed::new(AddressPlanBuilder::new().build()?);
    testbed.reserve_tunnels(n_tunnels)?;
    let aos = testbed.add_aggregation("aos1")?;
    let sw = testbed.add_node("sw1", Role::AccessSwitch)?;
    let idx = testbed.add_access_topology("L2AccessNetwork1", classification);
    let mut ifaces = vec![testbed.add_access_link(idx, sw, aos)?.b()];
    for i in 1..=n_hosts {
        let h = testbed.add_node(format!("euh{i}"), Role::EndHost)?;
        ifaces.push(testbed.add_access_link(idx, h, sw)?.a());
    }
    testbed.add_switched_network(ifaces)?;
    Ok(testbed)
}

/// Testbed with one access network per name in `hosts`, each with its own aggregation node
/// `aos<i>`, access switch `sw<i>` and a single end host.
pub(crate) fn separate_access(hosts: &[&str], n_tunnels: usize) -> Result<Testbed, TestbedError> {
    let mut testbed = Testbed::new(AddressPlanBuilder::new().build()?);
    testbed.reserve_tunnels(n_tunnels)?;
    for (i, host) in hosts.iter().enumerate() {
        let aos = testbed.add_aggregation(format!("aos{}", i + 1))?;
        let sw = testbed.add_node(format!("sw{}", i + 1), Role::AccessSwitch)?;
        let h = testbed.add_node(*host, Role::EndHost)?;
        let idx = testbed.add_access_topology(format!("L2AccessNetwork{}", i + 1), Classification::B);
        let uplink = testbed.add_access_link(idx, sw, aos)?;
        let link = testbed.add_access_link(idx, h, sw)?;
        testbed.add_switched_network([uplink.b(), link.a()])?;
    }
    Ok(testbed)
}

/// Lookup an interface by its name, `<node>-eth<index>`.
pub(crate) fn iface(testbed: &Testbed, node: &str, index: u32) -> IfaceId {
    IfaceId::new(testbed.topology().get_node_id(node).unwrap(), index)
}
