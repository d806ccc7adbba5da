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

//! # OSHI Deployer
//!
//! This program deploys hybrid IP/SDN testbeds built from OSHI (Open Source Hybrid IP/SDN)
//! nodes. It generates (or reads) a topology, provisions the layer 2 access networks such that
//! every virtual leased line between two end hosts gets its own VLAN tag on every shared switch,
//! assigns all addresses, and exports the result as a [`plan::DeploymentPlan`].
//!
//! ## Structure
//! The source code of this program is structured as follows:
//! - The module [`config`] defines the [`config::DeployerConfig`], which can be read from a json
//!   file and overwritten on the command line.
//! - The module [`description`] reads topology description files.
//! - The module [`deploy`] contains the pipeline ([`deploy::deploy`]), which builds the
//!   [`oshinet::testbed::Testbed`], provisions it, and exports the plan.
//! - The module [`plan`] contains the exported [`plan::DeploymentPlan`], with all nodes and
//!   interfaces referred to by name.
//! - The network model itself is defined in a separate crate: [`oshinet`].

#![deny(
    missing_docs,
    clippy::missing_docs_in_private_items,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::result_large_err)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::io;

use oshinet::types::TestbedError;
use thiserror::Error;

pub mod config;
pub mod deploy;
pub mod description;
mod formatter;
pub mod plan;
#[cfg(test)]
mod test;

pub use config::{ConfigError, DeployerConfig};
pub use deploy::{deploy, Deployment};
pub use plan::DeploymentPlan;

/// Error thrown while running the deployer.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Error while building or provisioning the testbed.
    #[error("{0}")]
    Testbed(#[from] TestbedError),
    /// Invalid configuration.
    #[error("{0}")]
    Config(#[from] ConfigError),
    /// Cannot parse or serialize json.
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Cannot read or write a file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Invalid topology description.
    #[error("Invalid topology description: {0}")]
    Description(String),
}
