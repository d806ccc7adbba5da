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

//! Topology description files.
//!
//! A description lists the names of all core nodes, aggregation nodes, access switches and end
//! hosts, and a list of subnets. Each subnet is either part of the core or an access network:
//!
//! ```json
//! {
//!     "oshis": ["osh1", "osh2"],
//!     "aoshis": ["aos1"],
//!     "l2sws": ["sw1"],
//!     "euhs": ["euh1", "euh2"],
//!     "subnets": [
//!         { "type": "CORE", "links": [["osh1", "osh2"]] },
//!         { "type": "CORE", "links": [["aos1", "osh1"]] },
//!         { "type": "ACCESS", "links": [["aos1", "sw1"], ["euh1", "sw1"], ["euh2", "sw1"]] }
//!     ]
//! }
//! ```

use std::{fs::read_to_string, path::Path};

use log::*;
use oshinet::{
    access::{uplinks_first, Classification},
    segment::DEFAULT_HELLO_INTERVAL,
    testbed::Testbed,
    types::{IfaceId, NodeId, Role},
};
use serde::{Deserialize, Serialize};

use crate::DeployError;

/// Part of the network a subnet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubnetKind {
    /// Subnet of the core (between core and aggregation nodes)
    Core,
    /// Access network below an aggregation node
    Access,
}

/// A single subnet of a description file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetDescription {
    /// Part of the network
    #[serde(rename = "type")]
    pub kind: SubnetKind,
    /// Links of the subnet, as pairs of node names
    pub links: Vec<(String, String)>,
}

/// Contents of a topology description file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyDescription {
    /// Core nodes
    pub oshis: Vec<String>,
    /// Aggregation nodes
    pub aoshis: Vec<String>,
    /// Access switches
    pub l2sws: Vec<String>,
    /// End hosts
    pub euhs: Vec<String>,
    /// All subnets
    pub subnets: Vec<SubnetDescription>,
}

impl TopologyDescription {
    /// Read a description from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeployError> {
        Self::from_json(&read_to_string(path)?)
    }

    /// Parse a description from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, DeployError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Add all nodes, links and networks of the description to the testbed. The tunnels must
    /// already be reserved. Core subnets are created first (point-to-point, then switched), then
    /// the access networks, and finally the controller `c1`, attached to the last core node.
    pub fn build(
        &self,
        testbed: &mut Testbed,
        classification: Classification,
    ) -> Result<(), DeployError> {
        info!("Build the topology description");
        let groups = [
            (&self.oshis, Role::Core),
            (&self.aoshis, Role::Aggregation),
            (&self.l2sws, Role::AccessSwitch),
            (&self.euhs, Role::EndHost),
        ];
        for (names, role) in groups {
            for name in names {
                testbed.add_node(name.as_str(), role)?;
            }
        }

        let (p2p, switched): (Vec<_>, Vec<_>) = self
            .subnets
            .iter()
            .map(|s| Ok((s, is_point_to_point(testbed, s)?)))
            .collect::<Result<Vec<_>, DeployError>>()?
            .into_iter()
            .partition(|(_, p2p)| *p2p);

        debug!("Create core networks point to point");
        for (subnet, _) in p2p.iter().filter(|(s, _)| s.kind == SubnetKind::Core) {
            let (a, b) = &subnet.links[0];
            let a = resolve(testbed, a)?;
            let b = resolve(testbed, b)?;
            testbed.add_p2p_network(a, b)?;
        }

        debug!("Create core networks switched");
        for (subnet, _) in switched.iter().filter(|(s, _)| s.kind == SubnetKind::Core) {
            let mut ifaces = Vec::new();
            for (a, b) in subnet.links.iter() {
                let (a, b) = (resolve(testbed, a)?, resolve(testbed, b)?);
                let link = testbed.add_link(a, b)?;
                if let Some(iface) = routed_endpoint(testbed, link.a(), link.b())? {
                    ifaces.push(iface);
                }
            }
            testbed.add_switched_network(ifaces)?;
        }

        if p2p.iter().any(|(s, _)| s.kind == SubnetKind::Access) {
            return Err(DeployError::Description(
                "point-to-point access networks are not managed".to_string(),
            ));
        }

        debug!("Create access networks switched");
        for (subnet, _) in switched.iter().filter(|(s, _)| s.kind == SubnetKind::Access) {
            let name = format!("L2AccessNetwork{}", testbed.access_topologies().len() + 1);
            debug!("{} with classification {}", name, classification);
            let idx = testbed.add_access_topology(name, classification);
            let mut ifaces = Vec::new();
            for (a, b) in ordered_links(testbed, &subnet.links)? {
                let link = testbed.add_access_link(idx, a, b)?;
                if let Some(iface) = routed_endpoint(testbed, link.a(), link.b())? {
                    ifaces.push(iface);
                }
            }
            testbed.add_switched_network(ifaces)?;
        }

        info!("Create the controller");
        let attach = *testbed
            .topology()
            .nodes_with_role(Role::Core)
            .last()
            .ok_or_else(|| DeployError::Description("no core node to attach c1".to_string()))?;
        let ctrl = testbed.add_controller("c1")?;
        testbed.add_controller_network(attach, ctrl, DEFAULT_HELLO_INTERVAL)?;
        Ok(())
    }
}

/// Look up a node by name. Nodes that are not declared are added if their name reveals the role.
fn resolve(testbed: &mut Testbed, name: &str) -> Result<NodeId, DeployError> {
    if let Ok(id) = testbed.topology().get_node_id(name) {
        return Ok(id);
    }
    match Role::from_name(name) {
        Some(role) => {
            warn!("node {} is not declared, adding it as {}", name, role);
            Ok(testbed.add_node(name, role)?)
        }
        None => Err(DeployError::Description(format!("unknown node {name}"))),
    }
}

/// Role of a node, or the role its name reveals if it does not exist yet.
fn role_of(testbed: &Testbed, name: &str) -> Result<Role, DeployError> {
    match testbed.topology().get_node_id(name) {
        Ok(id) => Ok(testbed.topology().get_role(id)?),
        Err(_) => Role::from_name(name)
            .ok_or_else(|| DeployError::Description(format!("unknown node {name}"))),
    }
}

/// A subnet is point-to-point if it consists of a single link without any access switch.
fn is_point_to_point(testbed: &Testbed, subnet: &SubnetDescription) -> Result<bool, DeployError> {
    match subnet.links.as_slice() {
        [] => Err(DeployError::Description("subnet without links".to_string())),
        [(a, b)] => Ok(role_of(testbed, a)? != Role::AccessSwitch
            && role_of(testbed, b)? != Role::AccessSwitch),
        _ => Ok(false),
    }
}

/// The interface of a switched link that takes part in IP routing: the one that is not on an
/// access switch. Links between two switches carry none.
fn routed_endpoint(
    testbed: &Testbed,
    a: IfaceId,
    b: IfaceId,
) -> Result<Option<IfaceId>, DeployError> {
    let topo = testbed.topology();
    let sw_a = topo.get_role(a.node)? == Role::AccessSwitch;
    let sw_b = topo.get_role(b.node)? == Role::AccessSwitch;
    match (sw_a, sw_b) {
        (false, true) => Ok(Some(a)),
        (true, false) => Ok(Some(b)),
        (true, true) => Ok(None),
        (false, false) => Err(DeployError::Description(format!(
            "switched network with link {} <-> {} between two non-switch nodes",
            topo.iface_name(a)?,
            topo.iface_name(b)?
        ))),
    }
}

/// Resolve the links of an access network and order them breadth-first from its aggregation
/// node, so that the first link of every node is its uplink.
fn ordered_links(
    testbed: &mut Testbed,
    links: &[(String, String)],
) -> Result<Vec<(NodeId, NodeId)>, DeployError> {
    let mut resolved = Vec::with_capacity(links.len());
    for (a, b) in links {
        resolved.push((resolve(testbed, a)?, resolve(testbed, b)?));
    }
    Ok(uplinks_first(testbed.topology(), &resolved))
}
