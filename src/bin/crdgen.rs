// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! CRD YAML Generator
//!
//! Writes the CustomResourceDefinitions netplane consumes, as modelled in
//! src/crd.rs, so test clusters can be seeded with matching schemas.
//!
//! Usage:
//!   cargo run --bin crdgen [output-dir]
//!
//! The output directory defaults to deploy/crds/.

use kube::CustomResourceExt;
use netplane::crd::{
    AdminNetworkPolicy, AdminPolicyBasedExternalRoute, EgressFirewall, EgressIP, EgressQoS,
    EgressService, MultiNetworkPolicy, NetworkAttachmentDefinition,
};
use std::fs;
use std::path::{Path, PathBuf};

const COPYRIGHT_HEADER: &str = "# Copyright (c) 2025 Erick Bourgeois, firestoned
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/crd.rs
# DO NOT EDIT MANUALLY - Run `cargo run --bin crdgen` to regenerate
#
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("deploy/crds"), PathBuf::from);
    fs::create_dir_all(&output_dir)?;

    println!("Generating CRD YAML files from src/crd.rs...");

    generate_crd::<NetworkAttachmentDefinition>(&output_dir)?;
    generate_crd::<EgressIP>(&output_dir)?;
    generate_crd::<EgressFirewall>(&output_dir)?;
    generate_crd::<EgressQoS>(&output_dir)?;
    generate_crd::<MultiNetworkPolicy>(&output_dir)?;
    generate_crd::<EgressService>(&output_dir)?;
    generate_crd::<AdminPolicyBasedExternalRoute>(&output_dir)?;
    generate_crd::<AdminNetworkPolicy>(&output_dir)?;

    println!("✓ Generated CRD YAML files in {}", output_dir.display());
    Ok(())
}

/// Write `<plural>.crd.yaml` for `T`.
fn generate_crd<T>(output_dir: &Path) -> Result<(), Box<dyn std::error::Error>>
where
    T: CustomResourceExt,
{
    let crd = T::crd();
    let filename = format!("{}.crd.yaml", T::api_resource().plural);
    let yaml = serde_yaml::to_string(&crd)?;
    fs::write(output_dir.join(&filename), format!("{COPYRIGHT_HEADER}{yaml}"))?;
    println!("  ✓ Generated {filename}");
    Ok(())
}
