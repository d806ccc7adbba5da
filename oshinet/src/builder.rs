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

//! Module for generating testbed topologies, according to parameters.

use itertools::Itertools;
use log::*;
use petgraph::unionfind::UnionFind;
use rand::prelude::*;

use crate::{
    access::Classification,
    segment::DEFAULT_HELLO_INTERVAL,
    testbed::{Testbed, CONTROLLER_HELLO_INTERVAL},
    types::{NodeId, Role, TestbedError},
};

/// Number of core nodes of a random core if the requested parameters are out of range.
pub const DEFAULT_GNP_N: usize = 5;
/// Link probability of a random core if the requested parameters are out of range.
pub const DEFAULT_GNP_P: f64 = 0.8;
/// Largest random core.
pub const MAX_GNP_N: usize = 10;

/// Trait for generating testbed topologies quickly. All functions require that the tunnels were
/// already reserved with [`Testbed::reserve_tunnels`]. The following example builds a full mesh
/// of three core nodes, with one access network and one end host per core node:
///
/// ```
/// use oshinet::prelude::*;
/// use oshinet::builder::TestbedBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut testbed = Testbed::new(AddressPlanBuilder::new().build()?);
/// testbed.reserve_tunnels(1)?;
/// testbed.build_mesh(3)?;
/// testbed.build_access_networks(Classification::B, 1)?;
/// testbed.add_tunnels([("euh1", "euh3")])?;
/// testbed.provision()?;
///
/// assert_eq!(testbed.cross_connects().len(), 1);
/// # Ok(())
/// # }
/// ```
pub trait TestbedBuilder {
    /// Create a full mesh of `n` core nodes `osh1` to `oshN`, with one point-to-point network per
    /// link. The controller `c1` is attached to the last core node. Returns the core nodes.
    fn build_mesh(&mut self, n: usize) -> Result<Vec<NodeId>, TestbedError>;

    /// Create a random core of `n` nodes, where each pair of nodes is connected with probability
    /// `p`. If `n > 10` or `p` is not a probability, the defaults `(5, 0.8)` are used instead. The
    /// core is made connected afterwards, and the controller `c1` is attached to the last core
    /// node. Returns the core nodes.
    fn build_gnp<R: Rng>(
        &mut self,
        n: usize,
        p: f64,
        rng: &mut R,
    ) -> Result<Vec<NodeId>, TestbedError>;

    /// Create a balanced tree core with the given depth, where every inner node has `fanout`
    /// children. The controller `c1` is attached to the last core node. Returns the core nodes.
    fn build_tree(&mut self, depth: usize, fanout: usize) -> Result<Vec<NodeId>, TestbedError>;

    /// Attach one access network to each core node. Each access network has an aggregation node,
    /// connected to the core node by a point-to-point network, a single access switch and `hosts`
    /// end hosts. The aggregation node and the end hosts share one broadcast network. Returns the
    /// aggregation nodes.
    fn build_access_networks(
        &mut self,
        classification: Classification,
        hosts: usize,
    ) -> Result<Vec<NodeId>, TestbedError>;
}

impl Testbed {
    fn next_name(&self, prefix: &str, role: Role) -> String {
        format!(
            "{}{}",
            prefix,
            self.topology().nodes_with_role(role).len() + 1
        )
    }

    fn build_core_nodes(&mut self, n: usize) -> Result<Vec<NodeId>, TestbedError> {
        info!("Create core networks");
        (0..n)
            .map(|_| {
                let name = self.next_name("osh", Role::Core);
                self.add_router(name)
            })
            .collect()
    }

    fn build_controller(
        &mut self,
        core: &[NodeId],
        hello_interval: u32,
    ) -> Result<NodeId, TestbedError> {
        let attach = *core.last().ok_or_else(|| {
            TestbedError::TopologyMalformed("cannot attach a controller without core".to_string())
        })?;
        let name = self.next_name("c", Role::Controller);
        let ctrl = self.add_controller(name)?;
        self.add_controller_network(attach, ctrl, hello_interval)?;
        Ok(ctrl)
    }
}

impl TestbedBuilder for Testbed {
    fn build_mesh(&mut self, n: usize) -> Result<Vec<NodeId>, TestbedError> {
        let core = self.build_core_nodes(n)?;
        for (j, b) in core.iter().enumerate() {
            for a in core.iter().take(j) {
                self.add_p2p_network(*b, *a)?;
            }
        }
        self.build_controller(&core, DEFAULT_HELLO_INTERVAL)?;
        Ok(core)
    }

    fn build_gnp<R: Rng>(
        &mut self,
        n: usize,
        p: f64,
        rng: &mut R,
    ) -> Result<Vec<NodeId>, TestbedError> {
        let (n, p) = if n > MAX_GNP_N || !(0.0..=1.0).contains(&p) {
            warn!(
                "random core with n={} and p={} is out of range, using n={} and p={}",
                n, p, DEFAULT_GNP_N, DEFAULT_GNP_P
            );
            (DEFAULT_GNP_N, DEFAULT_GNP_P)
        } else {
            (n, p)
        };
        let core = self.build_core_nodes(n)?;
        let mut components = UnionFind::<usize>::new(n);
        for (i, j) in (0..n).tuple_combinations() {
            if rng.gen_bool(p) {
                self.add_p2p_network(core[i], core[j])?;
                components.union(i, j);
            }
        }
        // connect every component to the component of the first node
        for j in 1..n {
            if !components.equiv(0, j) {
                debug!("connect isolated component of core node {}", j);
                self.add_p2p_network(core[0], core[j])?;
                components.union(0, j);
            }
        }
        self.build_controller(&core, CONTROLLER_HELLO_INTERVAL)?;
        Ok(core)
    }

    fn build_tree(&mut self, depth: usize, fanout: usize) -> Result<Vec<NodeId>, TestbedError> {
        let n = (0..=depth)
            .try_fold(0usize, |n, d| {
                u32::try_from(d)
                    .ok()
                    .and_then(|d| fanout.checked_pow(d))
                    .and_then(|level| n.checked_add(level))
            })
            .ok_or_else(|| {
                TestbedError::TopologyMalformed(format!(
                    "tree of depth {depth} with fanout {fanout} has too many nodes"
                ))
            })?;
        let core = self.build_core_nodes(n)?;
        // nodes are numbered in breadth-first order, the parent of node `i` is `(i - 1) / fanout`.
        for i in 1..n {
            self.add_p2p_network(core[(i - 1) / fanout], core[i])?;
        }
        self.build_controller(&core, DEFAULT_HELLO_INTERVAL)?;
        Ok(core)
    }

    fn build_access_networks(
        &mut self,
        classification: Classification,
        hosts: usize,
    ) -> Result<Vec<NodeId>, TestbedError> {
        info!("Create access networks");
        let core = self.topology().nodes_with_role(Role::Core);
        let n = core.len();
        let mut aggregations = Vec::with_capacity(n);
        for (i, osh) in core.into_iter().enumerate() {
            let aos = self.add_aggregation(format!("aos{}", n + i + 1))?;
            self.add_p2p_network(aos, osh)?;

            let idx = self.add_access_topology(format!("L2AccessNetwork{}", i + 1), classification);
            let sw_name = self.next_name("sw", Role::AccessSwitch);
            let sw = self.add_node(sw_name, Role::AccessSwitch)?;
            let uplink = self.add_access_link(idx, sw, aos)?;
            let mut ifaces = vec![uplink.b()];
            for _ in 0..hosts {
                let name = self.next_name("euh", Role::EndHost);
                let euh = self.add_node(name, Role::EndHost)?;
                ifaces.push(self.add_access_link(idx, euh, sw)?.a());
            }
            self.add_switched_network(ifaces)?;
            aggregations.push(aos);
        }
        Ok(aggregations)
    }
}
