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

//! Test the provisioning of virtual leased lines.

use maplit::btreeset;
use pretty_assertions::assert_eq;
use test_log::test;

use super::{iface, separate_access, single_access};
use crate::{
    access::Classification,
    address::AddressPlanBuilder,
    formatter::NetworkFormatter,
    provision::{Anchor, CrossConnect},
    testbed::Testbed,
    types::{IfaceId, NodeId, Role, TestbedError, VlanTag},
    vlan::VlanTable,
};

#[test]
fn local_tunnel_reuses_tag() {
    let mut testbed = single_access(2, 1, Classification::B).unwrap();
    testbed.add_tunnels([("euh1", "euh2")]).unwrap();
    let num_links = testbed.topology().links().len();
    let cross_connects = testbed.provision().unwrap().to_vec();

    let aos = testbed.topology().get_node_id("aos1").unwrap();
    let anchor = Anchor {
        aggregation: aos,
        port: iface(&testbed, "aos1", 0),
        vlan: VlanTag(2),
    };
    assert_eq!(
        cross_connects,
        vec![CrossConnect {
            left: anchor,
            right: anchor
        }]
    );

    // one new link per tunnel endpoint
    assert_eq!(testbed.topology().links().len(), num_links + 2);
    let vlans = testbed.vlans();
    assert_eq!(vlans.access_tag(iface(&testbed, "sw1", 4)), Some(VlanTag(2)));
    assert_eq!(vlans.access_tag(iface(&testbed, "sw1", 5)), Some(VlanTag(2)));
    assert_eq!(vlans.access_tag(iface(&testbed, "sw1", 2)), Some(VlanTag(0)));
    assert_eq!(
        vlans.trunk_tags(iface(&testbed, "sw1", 1)),
        Some(&btreeset! {VlanTag(0), VlanTag(2)})
    );
    // the tag was drawn only once
    assert_eq!(vlans.counter(iface(&testbed, "aos1", 0)), VlanTag(3));

    let tunnel = &testbed.tunnels()[0];
    assert_eq!(
        tunnel.interfaces(),
        &[iface(&testbed, "euh1", 1), iface(&testbed, "euh2", 1)]
    );
    let net = &testbed.networks()[0];
    assert!(net.contains(iface(&testbed, "euh1", 1)));
    assert!(net.contains(iface(&testbed, "euh2", 1)));
}

#[test]
fn provision_twice() {
    let mut testbed = single_access(2, 1, Classification::B).unwrap();
    testbed.add_tunnels([("euh1", "euh2")]).unwrap();
    let first = testbed.provision().unwrap().to_vec();
    let num_links = testbed.topology().links().len();
    let vlans = testbed.vlans().clone();

    let second = testbed.provision().unwrap().to_vec();
    assert_eq!(first, second);
    assert_eq!(second[0].left.vlan, VlanTag(2));
    assert_eq!(testbed.cross_connects(), first.as_slice());
    assert_eq!(testbed.topology().links().len(), num_links);
    assert_eq!(testbed.tunnels()[0].interfaces().len(), 2);
    assert_eq!(testbed.vlans(), &vlans);
    assert_eq!(testbed.vlans().counter(iface(&testbed, "aos1", 0)), VlanTag(3));
}

/// `euh1` and `euh2` hang off `sw2`, which reaches `aos1` only through `sw1`.
fn switch_chain(n_tunnels: usize) -> Testbed {
    let mut testbed = Testbed::new(AddressPlanBuilder::new().build().unwrap());
    testbed.reserve_tunnels(n_tunnels).unwrap();
    let aos = testbed.add_aggregation("aos1").unwrap();
    let sw1 = testbed.add_node("sw1", Role::AccessSwitch).unwrap();
    let sw2 = testbed.add_node("sw2", Role::AccessSwitch).unwrap();
    let idx = testbed.add_access_topology("L2AccessNetwork1", Classification::B);
    let mut ifaces = vec![testbed.add_access_link(idx, sw1, aos).unwrap().b()];
    testbed.add_access_link(idx, sw2, sw1).unwrap();
    for host in ["euh1", "euh2"] {
        let h = testbed.add_node(host, Role::EndHost).unwrap();
        ifaces.push(testbed.add_access_link(idx, h, sw2).unwrap().a());
    }
    testbed.add_switched_network(ifaces).unwrap();
    testbed
}

#[test]
fn tunnel_through_switch_chain() {
    let mut testbed = switch_chain(1);
    testbed.add_tunnels([("euh1", "euh2")]).unwrap();
    let cross_connect = testbed.provision().unwrap()[0];
    assert_eq!(cross_connect.left, cross_connect.right);
    assert_eq!(cross_connect.left.port, iface(&testbed, "aos1", 0));
    assert_eq!(cross_connect.left.vlan, VlanTag(2));

    let vlans = testbed.vlans();
    // sw2-eth1 <-> sw1-eth2 connects the two switches, sw1-eth1 is the uplink of sw1
    for (sw, port) in [("sw2", 1), ("sw1", 2), ("sw1", 1)] {
        assert_eq!(
            vlans.trunk_tags(iface(&testbed, sw, port)),
            Some(&btreeset! {VlanTag(0), VlanTag(2)}),
            "{sw}-eth{port}"
        );
    }
    assert_eq!(vlans.access_tag(iface(&testbed, "sw2", 4)), Some(VlanTag(2)));
    assert_eq!(vlans.access_tag(iface(&testbed, "sw2", 5)), Some(VlanTag(2)));
    assert_eq!(vlans.access_tag(iface(&testbed, "sw1", 3)), None);
}

#[test]
fn vlan_tags_exhausted() {
    let port = IfaceId::new(NodeId::new(0), 0);
    let other = IfaceId::new(NodeId::new(0), 1);
    let mut vlans = VlanTable::new(VlanTag(4093));
    assert_eq!(vlans.next_tag(port), Ok(VlanTag(4093)));
    assert_eq!(vlans.next_tag(port), Ok(VlanTag::MAX));
    assert!(matches!(
        vlans.next_tag(port),
        Err(TestbedError::VlanSpaceExhausted(_))
    ));
    assert!(matches!(
        vlans.next_tag(port),
        Err(TestbedError::VlanSpaceExhausted(_))
    ));
    assert_eq!(vlans.counter(port), VlanTag(4095));
    assert_eq!(vlans.next_tag(other), Ok(VlanTag(4093)));
}

#[test]
fn remote_tunnel_uses_independent_counters() {
    let mut testbed = separate_access(&["euh1", "euh2"], 1).unwrap();
    testbed.add_tunnels([("euh1", "euh2")]).unwrap();
    let cross_connect = testbed.provision().unwrap()[0];

    let topo = testbed.topology();
    assert_eq!(
        cross_connect,
        CrossConnect {
            left: Anchor {
                aggregation: topo.get_node_id("aos1").unwrap(),
                port: iface(&testbed, "aos1", 0),
                vlan: VlanTag(2),
            },
            right: Anchor {
                aggregation: topo.get_node_id("aos2").unwrap(),
                port: iface(&testbed, "aos2", 0),
                vlan: VlanTag(2),
            },
        }
    );
    assert_eq!(
        cross_connect.fmt(topo),
        "aos1-eth0 (vlan 2) <=> aos2-eth0 (vlan 2)"
    );

    let vlans = testbed.vlans();
    for sw in ["sw1", "sw2"] {
        assert_eq!(
            vlans.trunk_tags(iface(&testbed, sw, 1)),
            Some(&btreeset! {VlanTag(0), VlanTag(2)})
        );
        assert_eq!(vlans.access_tag(iface(&testbed, sw, 3)), Some(VlanTag(2)));
    }
    assert_eq!(vlans.counter(iface(&testbed, "aos1", 0)), VlanTag(3));
    assert_eq!(vlans.counter(iface(&testbed, "aos2", 0)), VlanTag(3));
}

/// Aggregation node `aos1` with two switches: `sw1` with `euh1` and `euh3`, and `sw2` with `euh2`.
fn two_branches(n_tunnels: usize) -> Testbed {
    let mut testbed = Testbed::new(AddressPlanBuilder::new().build().unwrap());
    testbed.reserve_tunnels(n_tunnels).unwrap();
    let aos = testbed.add_aggregation("aos1").unwrap();
    let sw1 = testbed.add_node("sw1", Role::AccessSwitch).unwrap();
    let sw2 = testbed.add_node("sw2", Role::AccessSwitch).unwrap();
    let idx = testbed.add_access_topology("L2AccessNetwork1", Classification::B);
    let mut ifaces = vec![
        testbed.add_access_link(idx, sw1, aos).unwrap().b(),
        testbed.add_access_link(idx, sw2, aos).unwrap().b(),
    ];
    for (host, sw) in [("euh1", sw1), ("euh2", sw2), ("euh3", sw1)] {
        let h = testbed.add_node(host, Role::EndHost).unwrap();
        ifaces.push(testbed.add_access_link(idx, h, sw).unwrap().a());
    }
    testbed.add_switched_network(ifaces).unwrap();
    testbed
}

#[test]
fn same_node_different_port() {
    let mut testbed = two_branches(2);
    testbed
        .add_tunnels([("euh1", "euh2"), ("euh1", "euh3")])
        .unwrap();
    let cross_connects = testbed.provision().unwrap().to_vec();

    let tags = cross_connects
        .iter()
        .map(|c| (c.left.vlan, c.right.vlan))
        .collect::<Vec<_>>();
    // the first tunnel ends on two different ports of the same node, the second stays on one port.
    assert_eq!(
        tags,
        vec![(VlanTag(2), VlanTag(2)), (VlanTag(3), VlanTag(3))]
    );
    assert_eq!(cross_connects[0].left.port, iface(&testbed, "aos1", 0));
    assert_eq!(cross_connects[0].right.port, iface(&testbed, "aos1", 1));
    assert_eq!(cross_connects[1].right.port, iface(&testbed, "aos1", 0));

    let vlans = testbed.vlans();
    assert_eq!(vlans.counter(iface(&testbed, "aos1", 0)), VlanTag(4));
    assert_eq!(vlans.counter(iface(&testbed, "aos1", 1)), VlanTag(3));

    // the uplink of sw1 carries both tunnels
    assert_eq!(
        vlans.trunk_tags(iface(&testbed, "sw1", 1)),
        Some(&btreeset! {VlanTag(0), VlanTag(2), VlanTag(3)})
    );
    assert_eq!(
        vlans.trunk_tags(iface(&testbed, "sw2", 1)),
        Some(&btreeset! {VlanTag(0), VlanTag(2)})
    );
    // euh1 has one new interface per tunnel
    assert_eq!(vlans.access_tag(iface(&testbed, "sw1", 4)), Some(VlanTag(2)));
    assert_eq!(vlans.access_tag(iface(&testbed, "sw1", 5)), Some(VlanTag(3)));
    assert_eq!(vlans.access_tag(iface(&testbed, "sw1", 6)), Some(VlanTag(3)));
    assert_eq!(vlans.access_tag(iface(&testbed, "sw2", 3)), Some(VlanTag(2)));
}

#[test]
fn misconfigured_tunnels() {
    let mut testbed = single_access(2, 1, Classification::B).unwrap();
    assert_eq!(
        testbed.add_tunnels([("euh1", "euh7")]),
        Err(TestbedError::UnknownEndpoint("euh7".to_string()))
    );
    assert_eq!(
        testbed.add_tunnels([("sw1", "euh2")]),
        Err(TestbedError::UnknownEndpoint("sw1".to_string()))
    );
    assert_eq!(
        testbed.add_tunnels([("euh1", "euh2"), ("euh2", "euh1")]),
        Err(TestbedError::TunnelCountMismatch {
            reserved: 1,
            requested: 2
        })
    );
    assert!(testbed.tunnels().is_empty());
}

#[test]
fn endpoint_outside_of_access_networks() {
    let mut testbed = single_access(1, 1, Classification::B).unwrap();
    testbed.add_node("euh9", Role::EndHost).unwrap();
    testbed.add_tunnels([("euh1", "euh9")]).unwrap();
    assert_eq!(
        testbed.provision(),
        Err(TestbedError::UnknownEndpoint("euh9".to_string()))
    );
}

#[test]
fn endpoint_without_network() {
    let mut testbed = Testbed::new(AddressPlanBuilder::new().build().unwrap());
    testbed.reserve_tunnels(1).unwrap();
    let aos = testbed.add_aggregation("aos1").unwrap();
    let sw = testbed.add_node("sw1", Role::AccessSwitch).unwrap();
    let idx = testbed.add_access_topology("L2AccessNetwork1", Classification::B);
    testbed.add_access_link(idx, sw, aos).unwrap();
    for host in ["euh1", "euh2"] {
        let h = testbed.add_node(host, Role::EndHost).unwrap();
        testbed.add_access_link(idx, h, sw).unwrap();
    }
    testbed.add_tunnels([("euh1", "euh2")]).unwrap();
    assert_eq!(
        testbed.provision(),
        Err(TestbedError::SegmentNotFound("euh1".to_string()))
    );
}
