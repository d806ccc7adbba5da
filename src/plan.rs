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

//! The deployment plan: everything the emulator and the SDN controller need to know about a
//! provisioned testbed, with all nodes and interfaces referred to by name.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{remove_file, OpenOptions},
    io::Write,
    net::{Ipv4Addr, SocketAddrV4},
    path::Path,
};

use ipnet::Ipv4Net;
use itertools::Itertools;
use oshinet::{
    access::Classification,
    formatter::NetworkFormatter,
    provision::{Anchor, CrossConnect},
    testbed::Testbed,
    types::{IfaceId, Role, VlanTag},
};
use serde::{Deserialize, Serialize};

use crate::{config::CoreApproach, DeployError};

/// A node with its loopback and controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePlan {
    /// Name of the node
    pub name: String,
    /// Role of the node
    pub role: Role,
    /// Loopback address (routers and controllers only)
    pub loopback: Option<Ipv4Addr>,
    /// The SDN controller of an OSHI node
    pub controller: Option<SocketAddrV4>,
}

/// An interface with its address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IfacePlan {
    /// Name of the interface
    pub name: String,
    /// Address with prefix length, missing if addresses were never assigned
    pub address: Option<Ipv4Net>,
    /// Default gateway
    pub gateway: Option<Ipv4Addr>,
}

/// An OSPF network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OspfNetworkPlan {
    /// Subnet of the network
    pub subnet: Ipv4Net,
    /// OSPF cost
    pub cost: u32,
    /// OSPF hello interval
    pub hello_interval: u32,
    /// OSPF area in dotted notation
    pub area: String,
    /// Interfaces of the network
    pub interfaces: Vec<IfacePlan>,
}

/// A virtual leased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelPlan {
    /// Left end host
    pub left: String,
    /// Right end host
    pub right: String,
    /// Subnet of the tunnel
    pub subnet: Ipv4Net,
    /// Interfaces of the end hosts in the tunnel
    pub interfaces: Vec<IfacePlan>,
}

/// An access network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessNetworkPlan {
    /// Name of the access network
    pub name: String,
    /// Classification of plain IP traffic
    pub classification: Classification,
    /// VLAN of plain IP traffic
    pub ip_vlan: VlanTag,
    /// All nodes of the access network
    pub nodes: Vec<String>,
}

/// The cross connection that must be installed for a single virtual leased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossConnectPlan {
    /// Left aggregation node
    pub left: String,
    /// Right aggregation node
    pub right: String,
    /// Port of the left aggregation node
    pub left_port: String,
    /// Port of the right aggregation node
    pub right_port: String,
    /// Tag on the left port
    pub left_vlan: VlanTag,
    /// Tag on the right port
    pub right_vlan: VlanTag,
}

impl CrossConnectPlan {
    /// Refer to both anchors by name.
    fn new(testbed: &Testbed, cross_connect: &CrossConnect) -> Result<Self, DeployError> {
        let topo = testbed.topology();
        let name = |a: &Anchor| -> Result<String, DeployError> {
            Ok(topo.get_node_name(a.aggregation)?.to_string())
        };
        Ok(Self {
            left: name(&cross_connect.left)?,
            right: name(&cross_connect.right)?,
            left_port: topo.iface_name(cross_connect.left.port)?,
            right_port: topo.iface_name(cross_connect.right.port)?,
            left_vlan: cross_connect.left.vlan,
            right_vlan: cross_connect.right.vlan,
        })
    }

    /// Render the cross connection as a single line of the form
    /// `left|right|left_port|right_port|left_vlan|right_vlan|`.
    pub fn vll_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|",
            self.left, self.right, self.left_port, self.right_port, self.left_vlan, self.right_vlan
        )
    }
}

/// The complete deployment plan of a testbed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    /// How the core forwards plain IP traffic
    pub core_approach: CoreApproach,
    /// VLAN of plain IP traffic in the core
    pub core_vlan: VlanTag,
    /// All nodes
    pub nodes: Vec<NodePlan>,
    /// All OSPF networks
    pub ospf_networks: Vec<OspfNetworkPlan>,
    /// All virtual leased lines
    pub tunnels: Vec<TunnelPlan>,
    /// All access networks
    pub access_networks: Vec<AccessNetworkPlan>,
    /// Access ports and their tag
    pub access_ports: BTreeMap<String, VlanTag>,
    /// Trunk ports and the tags they carry
    pub trunk_ports: BTreeMap<String, BTreeSet<VlanTag>>,
    /// Cross connections of the aggregation nodes
    pub cross_connects: Vec<CrossConnectPlan>,
}

impl DeploymentPlan {
    /// Export the testbed. The OSHI nodes (core nodes first, then aggregation nodes) are assigned
    /// to the `controllers` in round-robin order.
    pub fn new(
        testbed: &Testbed,
        core_approach: CoreApproach,
        controllers: &[SocketAddrV4],
    ) -> Result<Self, DeployError> {
        let topo = testbed.topology();

        let oshis = topo
            .nodes_with_role(Role::Core)
            .into_iter()
            .chain(topo.nodes_with_role(Role::Aggregation))
            .collect_vec();
        let nodes = topo
            .nodes()
            .map(|n| NodePlan {
                name: n.name().to_string(),
                role: n.role(),
                loopback: testbed.loopback(n.id()),
                controller: oshis
                    .iter()
                    .position(|x| *x == n.id())
                    .and_then(|i| controllers.get(i % controllers.len().max(1)))
                    .copied(),
            })
            .collect();

        let iface = |iface: IfaceId| -> Result<IfacePlan, DeployError> {
            let address = testbed.addresses().and_then(|a| a.get(&iface));
            Ok(IfacePlan {
                name: topo.iface_name(iface)?,
                address: address.map(|a| a.address),
                gateway: address.and_then(|a| a.gateway),
            })
        };

        let ospf_networks = testbed
            .networks()
            .iter()
            .map(|net| -> Result<OspfNetworkPlan, DeployError> {
                Ok(OspfNetworkPlan {
                    subnet: net.subnet(),
                    cost: net.cost(),
                    hello_interval: net.hello_interval(),
                    area: net.area().to_string(),
                    interfaces: net
                        .interfaces()
                        .iter()
                        .map(|i| iface(*i))
                        .collect::<Result<_, DeployError>>()?,
                })
            })
            .collect::<Result<_, DeployError>>()?;

        let tunnels = testbed
            .pairs()
            .iter()
            .zip(testbed.tunnels())
            .map(|((left, right), tunnel)| -> Result<TunnelPlan, DeployError> {
                Ok(TunnelPlan {
                    left: topo.get_node_name(*left)?.to_string(),
                    right: topo.get_node_name(*right)?.to_string(),
                    subnet: tunnel.subnet(),
                    interfaces: tunnel
                        .interfaces()
                        .iter()
                        .map(|i| iface(*i))
                        .collect::<Result<_, DeployError>>()?,
                })
            })
            .collect::<Result<_, DeployError>>()?;

        let access_networks = testbed
            .access_topologies()
            .iter()
            .map(|net| AccessNetworkPlan {
                name: net.name().to_string(),
                classification: net.classification(),
                ip_vlan: net.classification().ip_vlan(),
                nodes: net.nodes().iter().map(|n| n.fmt(topo).to_string()).collect(),
            })
            .collect();

        let vlans = testbed.vlans();
        let access_ports = vlans
            .access_ports()
            .iter()
            .map(|(port, tag)| -> Result<_, DeployError> {
                Ok((topo.iface_name(*port)?, *tag))
            })
            .collect::<Result<_, DeployError>>()?;
        let trunk_ports = vlans
            .trunk_ports()
            .iter()
            .map(|(port, tags)| -> Result<_, DeployError> {
                Ok((topo.iface_name(*port)?, tags.clone()))
            })
            .collect::<Result<_, DeployError>>()?;

        let cross_connects = testbed
            .cross_connects()
            .iter()
            .map(|c| CrossConnectPlan::new(testbed, c))
            .collect::<Result<_, DeployError>>()?;

        Ok(Self {
            core_approach,
            core_vlan: core_approach.ip_vlan(),
            nodes,
            ospf_networks,
            tunnels,
            access_networks,
            access_ports,
            trunk_ports,
            cross_connects,
        })
    }

    /// The cross connections, one line per virtual leased line.
    pub fn vll_config(&self) -> String {
        self.cross_connects
            .iter()
            .map(|c| format!("{}\n", c.vll_line()))
            .collect()
    }

    /// Serialize the plan as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, DeployError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the plan to a json file. This function will overwrite any existing file.
    pub fn write_json(&self, file: impl AsRef<Path>) -> Result<(), DeployError> {
        let content = self.to_json()?;
        write_file(file.as_ref(), &content)
    }

    /// Write the cross connections to a file. This function will overwrite any existing file.
    pub fn write_vll_config(&self, file: impl AsRef<Path>) -> Result<(), DeployError> {
        write_file(file.as_ref(), self.vll_config().trim_end())
    }
}

/// Write `content` to `file`, replacing it if it exists.
fn write_file(file: &Path, content: &str) -> Result<(), DeployError> {
    if file.exists() {
        remove_file(file)?;
    }
    let mut file = OpenOptions::new().create(true).write(true).open(file)?;
    writeln!(file, "{content}")?;
    Ok(())
}
