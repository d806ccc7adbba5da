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

//! The deployment pipeline: build the testbed, provision the access networks, assign all
//! addresses, and export the plan.

use log::*;
use oshinet::{builder::TestbedBuilder, testbed::Testbed};
use rand::prelude::*;

use crate::{
    config::{DeployerConfig, TopologySpec},
    description::TopologyDescription,
    formatter::IndentedNetworkFormatter,
    plan::DeploymentPlan,
    DeployError,
};

/// A provisioned testbed together with its exported plan.
#[derive(Debug)]
pub struct Deployment {
    /// The provisioned testbed
    pub testbed: Testbed,
    /// The exported plan
    pub plan: DeploymentPlan,
}

/// Build the topology of the configuration and declare all virtual leased lines. The returned
/// testbed is not provisioned yet.
pub fn build_testbed(config: &DeployerConfig) -> Result<Testbed, DeployError> {
    let mut testbed = Testbed::new(config.address_plan.build()?);
    testbed.reserve_tunnels(config.vlls.len())?;

    let classification = config.access_classification;
    let hosts = config.hosts_per_access_network;
    info!("Build topology {}", config.topology);
    match &config.topology {
        TopologySpec::Mesh(n) => {
            testbed.build_mesh(*n)?;
            testbed.build_access_networks(classification, hosts)?;
        }
        TopologySpec::ErdosRenyi { n, p } => {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            testbed.build_gnp(*n, *p, &mut rng)?;
            testbed.build_access_networks(classification, hosts)?;
        }
        TopologySpec::Tree { depth, fanout } => {
            testbed.build_tree(*depth, *fanout)?;
            testbed.build_access_networks(classification, hosts)?;
        }
        TopologySpec::File(path) => {
            TopologyDescription::from_file(path)?.build(&mut testbed, classification)?;
        }
    }

    testbed.add_tunnels(
        config
            .vlls
            .iter()
            .map(|vll| (vll.left.as_str(), vll.right.as_str())),
    )?;
    Ok(testbed)
}

/// Run the whole pipeline. If the configuration names output files, the plan and the cross
/// connections are written to them.
pub fn deploy(config: &DeployerConfig) -> Result<Deployment, DeployError> {
    let mut testbed = build_testbed(config)?;
    testbed.provision()?;
    testbed.assign_addresses()?;
    log_summary(&testbed);

    let plan = DeploymentPlan::new(&testbed, config.core_approach, &config.controllers)?;
    if let Some(path) = config.output.as_ref() {
        info!("Write the deployment plan to {}", path.display());
        plan.write_json(path)?;
    }
    if let Some(path) = config.vll_config.as_ref() {
        info!("Write the cross connections to {}", path.display());
        plan.write_vll_config(path)?;
    }
    Ok(Deployment { testbed, plan })
}

/// Log the tunnels, access networks, VLAN tables and OSPF networks.
pub fn log_summary(testbed: &Testbed) {
    let topo = testbed.topology();
    info!(
        "*** {} nodes, {} links",
        topo.num_nodes(),
        topo.links().len()
    );
    debug!("Testbed:\n{}", testbed.fmt(topo, 2));
}
