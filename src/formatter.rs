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

//! Formatting things.

use itertools::Itertools;
use oshinet::{
    access::AccessTopology,
    formatter::NetworkFormatter,
    segment::{BroadcastNetwork, TunnelSegment},
    testbed::Testbed,
    topology::Topology,
};

/// Trait to format things using appropriate indentation.
pub trait IndentedNetworkFormatter<'a, 'n> {
    /// Format something using the topology and some specific indent.
    fn fmt(&'a self, topo: &'n Topology, indent: usize) -> String;
}

/// Format a list of items, one per line.
fn fmt_list(items: impl IntoIterator<Item = String>, indent: usize) -> String {
    let tab: String = " ".repeat(indent);
    format!(
        "{tab}[\n{}\n{tab}]",
        items
            .into_iter()
            .map(|x| format!("{tab}  {x}"))
            .join(",\n"),
        tab = tab,
    )
}

impl<'a, 'n> IndentedNetworkFormatter<'a, 'n> for [TunnelSegment] {
    fn fmt(&'a self, topo: &'n Topology, indent: usize) -> String {
        fmt_list(self.iter().map(|x| x.fmt(topo)), indent)
    }
}

impl<'a, 'n> IndentedNetworkFormatter<'a, 'n> for [AccessTopology] {
    fn fmt(&'a self, topo: &'n Topology, indent: usize) -> String {
        fmt_list(self.iter().map(|x| x.fmt(topo)), indent)
    }
}

impl<'a, 'n> IndentedNetworkFormatter<'a, 'n> for [BroadcastNetwork] {
    fn fmt(&'a self, topo: &'n Topology, indent: usize) -> String {
        fmt_list(self.iter().map(|x| x.fmt(topo)), indent)
    }
}

impl<'a, 'n> IndentedNetworkFormatter<'a, 'n> for Testbed {
    fn fmt(&'a self, topo: &'n Topology, indent: usize) -> String {
        let tab: String = " ".repeat(indent);
        let vlans = self
            .vlans()
            .fmt(topo)
            .lines()
            .map(|l| format!("{tab}  {l}"))
            .join("\n");
        format!(
            "{tab}Tunnels:\n{}\n{tab}Access networks:\n{}\n{tab}Cross connections:\n{}\n{tab}VLANs:\n{}\n{tab}OSPF networks:\n{}",
            self.tunnels().fmt(topo, indent + 2),
            self.access_topologies().fmt(topo, indent + 2),
            fmt_list(self.cross_connects().iter().map(|c| c.fmt(topo)), indent + 2),
            vlans,
            self.networks().fmt(topo, indent + 2),
            tab = tab,
        )
    }
}
