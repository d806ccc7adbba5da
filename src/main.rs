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

use std::path::PathBuf;

use clap::Parser;
use log::*;
use oshinet::access::Classification;

use oshi_deployer::{
    config::{CoreApproach, TopologySpec, VllPair},
    deploy, DeployerConfig,
};

/// Deploy an OSHI testbed: build the topology, provision all virtual leased lines, and export the
/// deployment plan.
#[derive(Debug, Parser)]
struct Cli {
    /// Json configuration file. Arguments on the command line overwrite its values.
    #[clap(long = "config", short = 'c')]
    config: Option<PathBuf>,
    /// Topology to deploy: `mesh:N`, `e_r:N,P`, `tree:DEPTH,FANOUT` or `file:PATH`.
    #[clap(long = "topology", short = 't')]
    topology: Option<TopologySpec>,
    /// Virtual leased line between two end hosts, as `LEFT:RIGHT`. Can be given multiple times.
    #[clap(long = "vll", short = 'v')]
    vlls: Vec<VllPair>,
    /// How the core forwards plain IP traffic.
    #[clap(long = "core-approach", ignore_case = true)]
    core_approach: Option<CoreApproach>,
    /// Classification of the generated access networks (`A` or `B`).
    #[clap(long = "classification")]
    classification: Option<Classification>,
    /// Number of end hosts in each generated access network.
    #[clap(long = "hosts")]
    hosts: Option<usize>,
    /// Seed for random cores.
    #[clap(long = "seed", short = 's')]
    seed: Option<u64>,
    /// Write the deployment plan to this file. If not given, the plan is printed.
    #[clap(long = "output", short = 'o')]
    output: Option<PathBuf>,
    /// Write the cross connections to this file.
    #[clap(long = "vll-config")]
    vll_config: Option<PathBuf>,
}

impl Cli {
    /// Overwrite the values of the configuration with all given arguments.
    fn apply(self, config: &mut DeployerConfig) {
        if let Some(topology) = self.topology {
            config.topology = topology;
        }
        if !self.vlls.is_empty() {
            config.vlls = self.vlls;
        }
        if let Some(core_approach) = self.core_approach {
            config.core_approach = core_approach;
        }
        if let Some(classification) = self.classification {
            config.access_classification = classification;
        }
        if let Some(hosts) = self.hosts {
            config.hosts_per_access_network = hosts;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.output.is_some() {
            config.output = self.output;
        }
        if self.vll_config.is_some() {
            config.vll_config = self.vll_config;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_timed();

    let args = Cli::parse();

    let mut config = match args.config.as_ref() {
        Some(path) => DeployerConfig::from_file(path)?,
        None => DeployerConfig::default(),
    };
    args.apply(&mut config);

    let deployment = deploy(&config)?;
    for cross_connect in deployment.plan.cross_connects.iter() {
        info!("*** VLL: {}", cross_connect.vll_line());
    }

    if config.output.is_none() {
        println!("{}", deployment.plan.to_json()?);
    }

    Ok(())
}
