//! guestprobe command-line interface
//!
//! Inspects a virtual disk image offline and prints one JSON record with
//! the guest OS identity and its installed-package inventory. Diagnostics
//! go to stderr so stdout stays machine-readable.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use guestprobe_backends::{
    LibVmdkBackend, LklFuseMounter, NbdFuseBackend, NtHiveReader, PartedSource, RpmExec,
    VslvmMounter,
};
use guestprobe_core::ImageBackend;
use guestprobe_inspect::{InspectContext, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Offline virtual-disk-image inspector
#[derive(Parser)]
#[command(name = "guestprobe", version, about)]
struct Cli {
    /// Path to the disk image to inspect
    image: PathBuf,

    /// Backend used to expose the image as a raw device
    #[arg(long, value_enum, default_value_t = Backend::Nbdfuse)]
    backend: Backend,

    /// Enable verbose diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    /// qemu-nbd via nbdfuse; understands every qemu image format
    Nbdfuse,

    /// vmdkmount from libvmdk; VMDK images only
    Libvmdk,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let backend: Box<dyn ImageBackend> = match cli.backend {
        Backend::Nbdfuse => Box::new(NbdFuseBackend::new()),
        Backend::Libvmdk => Box::new(LibVmdkBackend),
    };
    let pipeline = Pipeline {
        backend: backend.as_ref(),
        partitions: &PartedSource,
        filesystems: &LklFuseMounter::new(),
        volume_groups: &VslvmMounter,
    };
    let ctx = InspectContext {
        hives: &NtHiveReader,
        rpm: &RpmExec,
    };

    let report = pipeline
        .run(&cli.image, &ctx)
        .with_context(|| format!("failed to inspect {}", cli.image.display()))?;

    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
