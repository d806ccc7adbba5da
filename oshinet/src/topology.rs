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

//! # Physical topology
//!
//! The [`Topology`] stores all nodes of the testbed together with their [`Role`], and all physical
//! links between them. Interfaces are allocated when a link is created, in creation order, starting
//! at [`Role::first_iface_index`].

use std::collections::BTreeMap;

use log::*;
use serde::{Deserialize, Serialize};

use crate::types::{IfaceId, Link, NodeId, PhysicalNetwork, Role, TestbedError};

/// A single node of the topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    name: String,
    role: Role,
    next_iface: u32,
}

impl Node {
    /// Identifier of the node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Name of the node.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role of the node.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Number of interfaces allocated so far.
    pub fn num_ifaces(&self) -> u32 {
        self.next_iface - self.role.first_iface_index()
    }

    fn alloc_iface(&mut self) -> IfaceId {
        let iface = IfaceId::new(self.id, self.next_iface);
        self.next_iface += 1;
        iface
    }
}

/// Node and link structure of the whole testbed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    graph: PhysicalNetwork,
    nodes: BTreeMap<NodeId, Node>,
    links: Vec<Link>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new node. The name must be unique.
    pub fn add_node(&mut self, name: impl Into<String>, role: Role) -> Result<NodeId, TestbedError> {
        let name = name.into();
        if self.nodes.values().any(|n| n.name == name) {
            return Err(TestbedError::DuplicateName(name));
        }
        let id = self.graph.add_node(());
        trace!("add {} {} as {:?}", role, name, id);
        self.nodes.insert(
            id,
            Node {
                id,
                name,
                role,
                next_iface: role.first_iface_index(),
            },
        );
        Ok(id)
    }

    /// Connect `a` and `b` with a new link. The next free interface of each node is used. The
    /// returned link has the interface of `a` as its first endpoint.
    pub fn add_link(&mut self, a: NodeId, b: NodeId) -> Result<Link, TestbedError> {
        if a == b {
            return Err(TestbedError::TopologyMalformed(format!(
                "cannot connect {} with itself",
                self.get_node_name(a)?
            )));
        }
        // make sure both exist before allocating anything
        self.get_node(b)?;
        let iface_a = self.get_node_mut(a)?.alloc_iface();
        let iface_b = self.get_node_mut(b)?.alloc_iface();
        let link = Link::new(iface_a, iface_b);
        self.graph.add_edge(a, b, link);
        self.links.push(link);
        debug!(
            "add link {} <-> {}",
            self.iface_name(iface_a)?,
            self.iface_name(iface_b)?
        );
        Ok(link)
    }

    /// Get a node by its id.
    pub fn get_node(&self, id: NodeId) -> Result<&Node, TestbedError> {
        self.nodes.get(&id).ok_or(TestbedError::DeviceNotFound(id))
    }

    fn get_node_mut(&mut self, id: NodeId) -> Result<&mut Node, TestbedError> {
        self.nodes
            .get_mut(&id)
            .ok_or(TestbedError::DeviceNotFound(id))
    }

    /// Get the name of a node.
    pub fn get_node_name(&self, id: NodeId) -> Result<&str, TestbedError> {
        Ok(self.get_node(id)?.name())
    }

    /// Get the role of a node.
    pub fn get_role(&self, id: NodeId) -> Result<Role, TestbedError> {
        Ok(self.get_node(id)?.role())
    }

    /// Lookup a node by its name.
    pub fn get_node_id(&self, name: impl AsRef<str>) -> Result<NodeId, TestbedError> {
        let name = name.as_ref();
        self.nodes
            .values()
            .find(|n| n.name == name)
            .map(|n| n.id)
            .ok_or_else(|| TestbedError::DeviceNameNotFound(name.to_string()))
    }

    /// Name of an interface, `<node>-eth<index>`.
    pub fn iface_name(&self, iface: IfaceId) -> Result<String, TestbedError> {
        Ok(format!("{}-eth{}", self.get_node_name(iface.node)?, iface.index))
    }

    /// Iterate over all nodes, in the order in which they were added.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All nodes of the given role, in the order in which they were added.
    pub fn nodes_with_role(&self, role: Role) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.role == role)
            .map(|n| n.id)
            .collect()
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// All links, in creation order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// All links connecting `node`, in creation order.
    pub fn links_of(&self, node: NodeId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.connects(node))
    }

    /// All distinct neighbors of `node`.
    pub fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        let mut neighbors: Vec<NodeId> = self.graph.neighbors(node).collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }

    /// Get a reference to the physical graph.
    pub fn get_graph(&self) -> &PhysicalNetwork {
        &self.graph
    }
}
