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

use std::{
    fs::{read_to_string, remove_file, write},
    net::{Ipv4Addr, SocketAddrV4},
};

use maplit::btreeset;
use oshinet::types::{Role, VlanTag};
use pretty_assertions::assert_eq;
use test_log::test;

use super::{tmp_file, SMALL_TOPOLOGY};
use crate::{
    config::{CoreApproach, DeployerConfig, TopologySpec, VllPair},
    deploy::{build_testbed, deploy},
    plan::DeploymentPlan,
    DeployError,
};

fn ctrl(last: u8) -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::new(192, 168, 0, last), 6633)
}

#[test]
fn default_deployment() {
    let deployment = deploy(&DeployerConfig::default()).unwrap();
    let plan = &deployment.plan;

    assert_eq!(
        plan.cross_connects
            .iter()
            .map(|c| c.vll_line())
            .collect::<Vec<_>>(),
        vec![
            "aos4|aos6|aos4-eth1|aos6-eth1|2|2|",
            "aos5|aos4|aos5-eth1|aos4-eth1|2|3|",
        ]
    );
    assert_eq!(
        plan.vll_config(),
        "aos4|aos6|aos4-eth1|aos6-eth1|2|2|\naos5|aos4|aos5-eth1|aos4-eth1|2|3|\n"
    );
    assert_eq!(plan.core_approach, CoreApproach::A);
    assert_eq!(plan.core_vlan, VlanTag(1));
}

#[test]
fn ports_and_tags() {
    let plan = deploy(&DeployerConfig::default()).unwrap().plan;

    assert_eq!(plan.access_ports["sw1-eth2"], VlanTag(0));
    assert_eq!(plan.access_ports["sw1-eth3"], VlanTag(2));
    assert_eq!(plan.access_ports["sw1-eth4"], VlanTag(3));
    assert_eq!(plan.access_ports["sw3-eth3"], VlanTag(2));
    assert_eq!(
        plan.trunk_ports["sw1-eth1"],
        btreeset! {VlanTag(0), VlanTag(2), VlanTag(3)}
    );
    assert_eq!(
        plan.trunk_ports["sw2-eth1"],
        btreeset! {VlanTag(0), VlanTag(2)}
    );
}

#[test]
fn tunnels_and_networks() {
    let plan = deploy(&DeployerConfig::default()).unwrap().plan;

    assert_eq!(plan.tunnels.len(), 2);
    let tunnel = &plan.tunnels[0];
    assert_eq!((tunnel.left.as_str(), tunnel.right.as_str()), ("euh1", "euh3"));
    assert_eq!(tunnel.subnet, "10.0.0.0/24".parse().unwrap());
    assert_eq!(
        tunnel
            .interfaces
            .iter()
            .map(|i| (i.name.as_str(), i.address.map(|a| a.to_string())))
            .collect::<Vec<_>>(),
        vec![
            ("euh1-eth1", Some("10.0.0.1/24".to_string())),
            ("euh3-eth1", Some("10.0.0.2/24".to_string())),
        ]
    );

    let ctrl_net = plan
        .ospf_networks
        .iter()
        .find(|n| n.subnet == "192.168.0.0/24".parse().unwrap())
        .unwrap();
    assert_eq!(ctrl_net.hello_interval, 2);
    assert_eq!(ctrl_net.cost, 1);
    assert_eq!(ctrl_net.area, "0.0.0.0");
    assert_eq!(
        ctrl_net
            .interfaces
            .iter()
            .map(|i| (i.name.as_str(), i.address.map(|a| a.to_string())))
            .collect::<Vec<_>>(),
        vec![
            ("osh3-eth2", Some("192.168.0.2/24".to_string())),
            ("c1-eth0", Some("192.168.0.1/24".to_string())),
        ]
    );

    assert_eq!(plan.access_networks.len(), 3);
    assert_eq!(plan.access_networks[0].name, "L2AccessNetwork1");
    assert_eq!(plan.access_networks[0].ip_vlan, VlanTag(0));
}

#[test]
fn controllers_round_robin() {
    let mut config = DeployerConfig::default();
    config.controllers = vec![ctrl(1), ctrl(2)];
    let plan = deploy(&config).unwrap().plan;

    let controller_of = |name: &str| {
        plan.nodes
            .iter()
            .find(|n| n.name == name)
            .and_then(|n| n.controller)
    };
    assert_eq!(controller_of("osh1"), Some(ctrl(1)));
    assert_eq!(controller_of("osh2"), Some(ctrl(2)));
    assert_eq!(controller_of("osh3"), Some(ctrl(1)));
    assert_eq!(controller_of("aos4"), Some(ctrl(2)));
    assert_eq!(controller_of("aos5"), Some(ctrl(1)));
    assert_eq!(controller_of("aos6"), Some(ctrl(2)));
    assert_eq!(controller_of("euh1"), None);
    assert_eq!(controller_of("c1"), None);

    let c1 = plan.nodes.iter().find(|n| n.name == "c1").unwrap();
    assert_eq!(c1.role, Role::Controller);
    assert_eq!(c1.loopback, Some(Ipv4Addr::new(10, 0, 2, 7)));
}

#[test]
fn tree_and_random_cores() {
    let mut config = DeployerConfig::default();
    config.topology = TopologySpec::Tree {
        depth: 1,
        fanout: 2,
    };
    let plan = deploy(&config).unwrap().plan;
    assert_eq!(plan.access_networks.len(), 3);
    assert_eq!(plan.cross_connects.len(), 2);

    config.topology = TopologySpec::ErdosRenyi { n: 4, p: 0.5 };
    config.seed = Some(42);
    let a = deploy(&config).unwrap().plan;
    let b = deploy(&config).unwrap().plan;
    assert_eq!(a, b);
    assert_eq!(a.access_networks.len(), 4);
}

#[test]
fn unknown_vll_endpoint() {
    let mut config = DeployerConfig::default();
    config.vlls = vec![VllPair::new("euh1", "euh9")];
    let err = build_testbed(&config).unwrap_err();
    assert!(matches!(err, DeployError::Testbed(_)), "{err}");
}

#[test]
fn plan_before_addresses() {
    let mut testbed = build_testbed(&DeployerConfig::default()).unwrap();
    testbed.provision().unwrap();
    let plan = DeploymentPlan::new(&testbed, CoreApproach::B, &[]).unwrap();
    assert_eq!(plan.core_vlan, VlanTag(0));
    assert!(plan.nodes.iter().all(|n| n.controller.is_none()));
    assert!(plan
        .ospf_networks
        .iter()
        .flat_map(|n| n.interfaces.iter())
        .all(|i| i.address.is_none()));
}

#[test]
fn deploy_from_file() {
    let topo_file = tmp_file("small-topology.json");
    let output = tmp_file("small-plan.json");
    let vll_config = tmp_file("small-vll.cfg");
    write(&topo_file, SMALL_TOPOLOGY).unwrap();

    let mut config = DeployerConfig::default();
    config.topology = TopologySpec::File(topo_file.clone());
    config.vlls = vec![VllPair::new("euh1", "euh2")];
    config.output = Some(output.clone());
    config.vll_config = Some(vll_config.clone());
    let deployment = deploy(&config).unwrap();

    assert_eq!(
        read_to_string(&vll_config).unwrap(),
        "aos1|aos1|aos1-eth1|aos1-eth1|2|2|\n"
    );
    let written: DeploymentPlan = serde_json::from_str(&read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written, deployment.plan);

    for file in [topo_file, output, vll_config] {
        remove_file(file).unwrap();
    }
}
