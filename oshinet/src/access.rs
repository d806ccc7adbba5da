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

//! # Access networks
//!
//! An [`AccessTopology`] is a switched layer 2 tree rooted at a single aggregation node. End
//! hosts hang off access switches, which are connected (possibly through other switches) to the
//! aggregation node. Every non-aggregation member has exactly one uplink: the first registered
//! link incident to it. All traversals towards the aggregation node follow these uplinks.

use std::{collections::HashMap, fmt, str::FromStr};

use itertools::Itertools;
use log::*;
use petgraph::{
    algo::{connected_components, is_cyclic_undirected},
    graphmap::UnGraphMap,
    visit::Bfs,
};
use serde::{Deserialize, Serialize};

use crate::{
    topology::Topology,
    types::{IfaceId, Link, NodeId, Role, TestbedError, VlanTag},
};

/// Classification of an access network, selecting the VLAN of plain IP traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Classification {
    /// IP traffic is tagged with VLAN 1.
    A,
    /// IP traffic is untagged.
    #[default]
    B,
}

impl Classification {
    /// VLAN of plain IP traffic in an access network of this class.
    pub fn ip_vlan(&self) -> VlanTag {
        match self {
            Self::A => VlanTag::CORE,
            Self::B => VlanTag::UNTAGGED,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Self::A),
            "B" | "b" => Ok(Self::B),
            x => Err(format!("Invalid classification {x:?}, expected A or B")),
        }
    }
}

/// A single step towards the aggregation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hop {
    /// The node reached by this hop.
    pub peer: NodeId,
    /// Interface of the current node on the uplink.
    pub local: IfaceId,
    /// Interface of the peer on the uplink.
    pub remote: IfaceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Member {
    name: String,
    role: Role,
    uplink: Option<usize>,
}

/// A layer 2 access network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTopology {
    name: String,
    classification: Classification,
    nodes: Vec<NodeId>,
    members: HashMap<NodeId, Member>,
    links: Vec<Link>,
}

impl AccessTopology {
    /// Create an empty access network.
    pub fn new(name: impl Into<String>, classification: Classification) -> Self {
        Self {
            name: name.into(),
            classification,
            nodes: Vec::new(),
            members: HashMap::new(),
            links: Vec::new(),
        }
    }

    /// Name of the access network.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classification of the access network.
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Add a link (that already exists in `topo`). Unknown endpoints become members. The link
    /// becomes the uplink of every non-aggregation endpoint that has none yet.
    pub fn add_link(&mut self, topo: &Topology, link: Link) -> Result<(), TestbedError> {
        let idx = self.links.len();
        for iface in [link.a(), link.b()] {
            let node = topo.get_node(iface.node)?;
            if !self.members.contains_key(&node.id()) {
                self.nodes.push(node.id());
                self.members.insert(
                    node.id(),
                    Member {
                        name: node.name().to_string(),
                        role: node.role(),
                        uplink: None,
                    },
                );
            }
            let Some(member) = self.members.get_mut(&node.id()) else {
                continue;
            };
            if member.role != Role::Aggregation && member.uplink.is_none() {
                trace!("{}: uplink of {} is link {}", self.name, member.name, idx);
                member.uplink = Some(idx);
            }
        }
        self.links.push(link);
        Ok(())
    }

    /// Returns `true` if `node` is a member.
    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains_key(&node)
    }

    /// All members, in the order in which they were added.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// All links, in the order in which they were added.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// All interfaces used by the links of this network.
    pub fn interfaces(&self) -> Vec<IfaceId> {
        self.links
            .iter()
            .flat_map(|l| [l.a(), l.b()])
            .unique()
            .collect()
    }

    /// All interfaces of `node` used by the links of this network.
    pub fn interfaces_of(&self, node: NodeId) -> Vec<IfaceId> {
        self.links.iter().filter_map(|l| l.iface_of(node)).collect()
    }

    /// All aggregation nodes.
    pub fn aggregation_nodes(&self) -> Vec<NodeId> {
        self.with_role(Role::Aggregation)
    }

    /// All end hosts.
    pub fn end_hosts(&self) -> Vec<NodeId> {
        self.with_role(Role::EndHost)
    }

    fn with_role(&self, role: Role) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| self.members[n].role == role)
            .copied()
            .collect()
    }

    fn member(&self, node: NodeId) -> Result<&Member, TestbedError> {
        self.members
            .get(&node)
            .ok_or_else(|| TestbedError::UnknownEndpoint(format!("{:?} in {}", node, self.name)))
    }

    /// Role of a member.
    pub fn role(&self, node: NodeId) -> Result<Role, TestbedError> {
        Ok(self.member(node)?.role)
    }

    /// Name of a member.
    pub fn node_name(&self, node: NodeId) -> Result<&str, TestbedError> {
        Ok(&self.member(node)?.name)
    }

    /// Follow the uplink of `current`. Returns `None` if `current` is the aggregation node.
    pub fn next_hop(&self, current: NodeId) -> Result<Option<Hop>, TestbedError> {
        let member = self.member(current)?;
        if member.role == Role::Aggregation {
            return Ok(None);
        }
        let malformed = || {
            TestbedError::TopologyMalformed(format!(
                "{} has no uplink in {}",
                member.name, self.name
            ))
        };
        let link = member
            .uplink
            .and_then(|idx| self.links.get(idx))
            .ok_or_else(malformed)?;
        let local = link.iface_of(current).ok_or_else(malformed)?;
        let remote = link.other(local).ok_or_else(malformed)?;
        Ok(Some(Hop {
            peer: remote.node,
            local,
            remote,
        }))
    }

    /// All hops from `node` to the aggregation node. The walk is bounded by the number of members,
    /// so a loop in the uplinks is reported as [`TestbedError::TopologyMalformed`].
    pub fn path_to_aggregation(&self, node: NodeId) -> Result<Vec<Hop>, TestbedError> {
        let mut path = Vec::new();
        let mut current = node;
        for _ in 0..self.nodes.len() {
            let hop = self.next_hop(current)?.ok_or_else(|| {
                TestbedError::TopologyMalformed(format!(
                    "no path from {} to the aggregation node of {}",
                    self.member(node).map(|m| m.name.as_str()).unwrap_or("?"),
                    self.name
                ))
            })?;
            path.push(hop);
            if self.role(hop.peer)? == Role::Aggregation {
                return Ok(path);
            }
            current = hop.peer;
        }
        Err(TestbedError::TopologyMalformed(format!(
            "no aggregation node reachable from {} in {} within {} hops",
            self.member(node)?.name,
            self.name,
            self.nodes.len()
        )))
    }

    /// The last hop of the path from `node` to the aggregation node. The peer of the returned hop
    /// is the aggregation node, and its remote interface is the aggregation port.
    pub fn nearest_aggregation(&self, node: NodeId) -> Result<Hop, TestbedError> {
        let name = &self.member(node)?.name;
        self.path_to_aggregation(node)?.pop().ok_or_else(|| {
            TestbedError::TopologyMalformed(format!("{} has no uplink in {}", name, self.name))
        })
    }

    /// Check that the network is a tree rooted at exactly one aggregation node, that every end
    /// host has exactly one link (to a switch), and that every member reaches the aggregation node
    /// following its uplinks.
    pub fn validate(&self) -> Result<(), TestbedError> {
        let malformed = |msg: String| {
            Err(TestbedError::TopologyMalformed(format!(
                "{}: {}",
                self.name, msg
            )))
        };

        let aggregations = self.aggregation_nodes();
        if aggregations.len() != 1 {
            return malformed(format!(
                "expected exactly one aggregation node, found {}",
                aggregations.len()
            ));
        }

        for host in self.end_hosts() {
            let links = self
                .links
                .iter()
                .filter(|l| l.connects(host))
                .collect::<Vec<_>>();
            let name = &self.members[&host].name;
            if links.len() != 1 {
                return malformed(format!("{} has {} links instead of one", name, links.len()));
            }
            let peer = links[0].peer_of(host).map(|i| i.node);
            if peer.and_then(|p| self.members.get(&p)).map(|m| m.role)
                != Some(Role::AccessSwitch)
            {
                return malformed(format!("{} is not connected to an access switch", name));
            }
        }

        let mut graph: UnGraphMap<NodeId, ()> = UnGraphMap::new();
        for node in self.nodes.iter() {
            graph.add_node(*node);
        }
        for link in self.links.iter() {
            if graph.add_edge(link.a().node, link.b().node, ()).is_some() {
                return malformed("parallel links".to_string());
            }
        }
        if is_cyclic_undirected(&graph) {
            return malformed("the network contains a loop".to_string());
        }
        if connected_components(&graph) != 1 {
            return malformed("the network is not connected".to_string());
        }

        for node in self.nodes.iter() {
            if *node != aggregations[0] {
                self.nearest_aggregation(*node)?;
            }
        }
        Ok(())
    }
}

/// Order the links of an access network breadth-first from its aggregation node, such that every
/// node is reached over its uplink before any other of its links is registered. Each link keeps
/// its orientation. Links that are not reachable from an aggregation node keep their relative
/// order and are placed last.
pub fn uplinks_first(topo: &Topology, links: &[(NodeId, NodeId)]) -> Vec<(NodeId, NodeId)> {
    let mut graph: UnGraphMap<NodeId, ()> = UnGraphMap::new();
    for (a, b) in links {
        graph.add_edge(*a, *b, ());
    }
    let root = graph
        .nodes()
        .find(|n| topo.get_role(*n).ok() == Some(Role::Aggregation));

    let mut used = vec![false; links.len()];
    let mut ordered = Vec::with_capacity(links.len());
    if let Some(root) = root {
        let mut bfs = Bfs::new(&graph, root);
        while let Some(node) = bfs.next(&graph) {
            for (i, link) in links.iter().enumerate() {
                if !used[i] && (link.0 == node || link.1 == node) {
                    used[i] = true;
                    ordered.push(*link);
                }
            }
        }
    }
    ordered.extend(
        links
            .iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|(link, _)| *link),
    );
    ordered
}
