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

//! Test the traversal of access networks.

use pretty_assertions::assert_eq;
use test_log::test;

use super::{iface, single_access};
use crate::{
    access::{uplinks_first, AccessTopology, Classification, Hop},
    topology::Topology,
    types::{IfaceId, Role, TestbedError, VlanTag},
};

#[test]
fn classification_vlan() {
    assert_eq!(Classification::A.ip_vlan(), VlanTag(1));
    assert_eq!(Classification::B.ip_vlan(), VlanTag(0));
    assert_eq!("A".parse::<Classification>(), Ok(Classification::A));
    assert!("C".parse::<Classification>().is_err());
}

#[test]
fn next_hop_follows_uplinks() {
    let testbed = single_access(2, 0, Classification::B).unwrap();
    let net = &testbed.access_topologies()[0];
    let topo = testbed.topology();
    let aos = topo.get_node_id("aos1").unwrap();
    let sw = topo.get_node_id("sw1").unwrap();
    let h1 = topo.get_node_id("euh1").unwrap();

    assert_eq!(
        net.next_hop(h1),
        Ok(Some(Hop {
            peer: sw,
            local: iface(&testbed, "euh1", 0),
            remote: iface(&testbed, "sw1", 2),
        }))
    );
    assert_eq!(
        net.next_hop(sw),
        Ok(Some(Hop {
            peer: aos,
            local: iface(&testbed, "sw1", 1),
            remote: iface(&testbed, "aos1", 0),
        }))
    );
    assert_eq!(net.next_hop(aos), Ok(None));
    assert_eq!(net.nearest_aggregation(h1).unwrap().peer, aos);
    assert_eq!(
        net.nearest_aggregation(h1).unwrap().remote,
        iface(&testbed, "aos1", 0)
    );
}

#[test]
fn uplinks_are_ordered_first() {
    let mut topo = Topology::new();
    let aos = topo.add_node("aos1", Role::Aggregation).unwrap();
    let sw1 = topo.add_node("sw1", Role::AccessSwitch).unwrap();
    let sw2 = topo.add_node("sw2", Role::AccessSwitch).unwrap();
    let h1 = topo.add_node("euh1", Role::EndHost).unwrap();
    let h2 = topo.add_node("euh2", Role::EndHost).unwrap();
    let sw9 = topo.add_node("sw9", Role::AccessSwitch).unwrap();
    let h9 = topo.add_node("euh9", Role::EndHost).unwrap();

    let links = [(h9, sw9), (h1, sw2), (sw2, sw1), (h2, sw1), (aos, sw1)];
    assert_eq!(
        uplinks_first(&topo, &links),
        vec![(aos, sw1), (sw2, sw1), (h2, sw1), (h1, sw2), (h9, sw9)]
    );
    // without an aggregation node, nothing is reordered
    assert_eq!(uplinks_first(&topo, &links[..2]), links[..2].to_vec());
}

#[test]
fn membership() {
    let testbed = single_access(2, 0, Classification::B).unwrap();
    let net = &testbed.access_topologies()[0];
    let topo = testbed.topology();
    let aos = topo.get_node_id("aos1").unwrap();
    let sw = topo.get_node_id("sw1").unwrap();
    let h1 = topo.get_node_id("euh1").unwrap();
    let h2 = topo.get_node_id("euh2").unwrap();

    assert_eq!(net.nodes(), &[sw, aos, h1, h2]);
    assert_eq!(net.aggregation_nodes(), vec![aos]);
    assert_eq!(net.end_hosts(), vec![h1, h2]);
    assert_eq!(net.links().len(), 3);
    assert_eq!(net.interfaces().len(), 6);
    assert_eq!(
        net.interfaces_of(sw),
        vec![
            iface(&testbed, "sw1", 1),
            iface(&testbed, "sw1", 2),
            iface(&testbed, "sw1", 3)
        ]
    );
    assert!(net.contains(h2));
    assert_eq!(net.validate(), Ok(()));
}

#[test]
fn next_hop_unknown_node() {
    let mut topo = Topology::new();
    let aos = topo.add_node("aos1", Role::Aggregation).unwrap();
    let sw = topo.add_node("sw1", Role::AccessSwitch).unwrap();
    let other = topo.add_node("euh9", Role::EndHost).unwrap();
    let mut net = AccessTopology::new("L2AccessNetwork1", Classification::B);
    let link = topo.add_link(sw, aos).unwrap();
    net.add_link(&topo, link).unwrap();
    assert!(!net.contains(other));
    assert!(matches!(
        net.next_hop(other),
        Err(TestbedError::UnknownEndpoint(_))
    ));
}

#[test]
fn nearest_aggregation_on_a_chain() {
    let mut topo = Topology::new();
    let aos = topo.add_node("aos1", Role::Aggregation).unwrap();
    let sws = (1..=3)
        .map(|i| topo.add_node(format!("sw{i}"), Role::AccessSwitch).unwrap())
        .collect::<Vec<_>>();
    let h = topo.add_node("euh1", Role::EndHost).unwrap();
    let mut net = AccessTopology::new("L2AccessNetwork1", Classification::B);
    for link in [
        topo.add_link(sws[0], aos).unwrap(),
        topo.add_link(sws[1], sws[0]).unwrap(),
        topo.add_link(sws[2], sws[1]).unwrap(),
        topo.add_link(h, sws[2]).unwrap(),
    ] {
        net.add_link(&topo, link).unwrap();
    }

    let path = net.path_to_aggregation(h).unwrap();
    assert_eq!(
        path.iter().map(|hop| hop.peer).collect::<Vec<_>>(),
        vec![sws[2], sws[1], sws[0], aos]
    );
    assert_eq!(
        net.nearest_aggregation(h).unwrap(),
        Hop {
            peer: aos,
            local: IfaceId::new(sws[0], 1),
            remote: IfaceId::new(aos, 0),
        }
    );
    assert_eq!(net.validate(), Ok(()));
}

#[test]
fn nearest_aggregation_detects_loops() {
    let mut topo = Topology::new();
    let aos = topo.add_node("aos1", Role::Aggregation).unwrap();
    let sw1 = topo.add_node("sw1", Role::AccessSwitch).unwrap();
    let sw2 = topo.add_node("sw2", Role::AccessSwitch).unwrap();
    let h = topo.add_node("euh1", Role::EndHost).unwrap();
    let mut net = AccessTopology::new("L2AccessNetwork1", Classification::B);
    // the first link becomes the uplink of both switches
    for link in [
        topo.add_link(sw1, sw2).unwrap(),
        topo.add_link(sw1, aos).unwrap(),
        topo.add_link(h, sw1).unwrap(),
    ] {
        net.add_link(&topo, link).unwrap();
    }

    assert!(matches!(
        net.nearest_aggregation(h),
        Err(TestbedError::TopologyMalformed(_))
    ));
    assert!(matches!(
        net.validate(),
        Err(TestbedError::TopologyMalformed(_))
    ));
}

#[test]
fn validate_rejects_malformed_networks() {
    // end host with two links
    let mut topo = Topology::new();
    let aos = topo.add_node("aos1", Role::Aggregation).unwrap();
    let sw1 = topo.add_node("sw1", Role::AccessSwitch).unwrap();
    let sw2 = topo.add_node("sw2", Role::AccessSwitch).unwrap();
    let h = topo.add_node("euh1", Role::EndHost).unwrap();
    let mut net = AccessTopology::new("L2AccessNetwork1", Classification::B);
    for link in [
        topo.add_link(sw1, aos).unwrap(),
        topo.add_link(sw2, aos).unwrap(),
        topo.add_link(h, sw1).unwrap(),
        topo.add_link(h, sw2).unwrap(),
    ] {
        net.add_link(&topo, link).unwrap();
    }
    assert!(matches!(
        net.validate(),
        Err(TestbedError::TopologyMalformed(_))
    ));

    // two aggregation nodes
    let mut topo = Topology::new();
    let aos1 = topo.add_node("aos1", Role::Aggregation).unwrap();
    let aos2 = topo.add_node("aos2", Role::Aggregation).unwrap();
    let sw = topo.add_node("sw1", Role::AccessSwitch).unwrap();
    let mut net = AccessTopology::new("L2AccessNetwork1", Classification::B);
    for link in [
        topo.add_link(sw, aos1).unwrap(),
        topo.add_link(aos2, sw).unwrap(),
    ] {
        net.add_link(&topo, link).unwrap();
    }
    assert!(matches!(
        net.validate(),
        Err(TestbedError::TopologyMalformed(_))
    ));

    // end host directly on the aggregation node
    let mut topo = Topology::new();
    let aos = topo.add_node("aos1", Role::Aggregation).unwrap();
    let h = topo.add_node("euh1", Role::EndHost).unwrap();
    let mut net = AccessTopology::new("L2AccessNetwork1", Classification::B);
    let link = topo.add_link(h, aos).unwrap();
    net.add_link(&topo, link).unwrap();
    assert!(matches!(
        net.validate(),
        Err(TestbedError::TopologyMalformed(_))
    ));
}
