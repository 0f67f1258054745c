// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Host-side tool for trusted-application packages.
//!
//! Builds packages from an executable and a manifest, runs the same decoder
//! the loader uses to inspect or unpack them, and resolves verification keys
//! against a key table given on the command line.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use apploader_keys::{
    InMemoryKeyService, KeyResolver, KeyResolverSettings, KeySlotId, DEFAULT_KEY_SLOT_PREFIX, MAX_KEY_SIZE,
};
use apploader_package::cbor::DEFAULT_MAX_DEPTH;
use apploader_package::{
    parse_package_metadata_with_options, HeaderValue, PackageBuilder, PackageMetadata, PackageParseOptions, Value,
};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "apploader-tool", version, about = "Trusted-application package tool")]
struct Cli {
    /// Log decoder and resolver diagnostics at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode an executable and manifest into a package.
    Build(BuildArgs),
    /// Validate a package and print its metadata.
    Inspect(InspectArgs),
    /// Validate a package and write its contents and manifest to files.
    Extract(ExtractArgs),
    /// Print the key slot name for an operation and key id.
    KeySlot(KeySlotArgs),
    /// Resolve a key from a key table given on the command line.
    ResolveKey(ResolveKeyArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[arg(long)]
    contents: PathBuf,
    #[arg(long)]
    manifest: PathBuf,
    /// Header entry as LABEL=VALUE; VALUE is an unsigned integer, `true`, `false` or text.
    /// Format version 1 defines no labels, so the loader rejects any package built with one.
    #[arg(long = "header", value_parser = parse_header)]
    headers: Vec<(u64, HeaderValue)>,
    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct InspectArgs {
    package: PathBuf,
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    package: PathBuf,
    #[arg(long)]
    contents_out: Option<PathBuf>,
    #[arg(long)]
    manifest_out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct KeySlotArgs {
    #[arg(long, default_value = "verify")]
    op: String,
    #[arg(long)]
    key_id: u8,
    #[arg(long, default_value = DEFAULT_KEY_SLOT_PREFIX)]
    prefix: String,
}

#[derive(Args, Debug)]
struct ResolveKeyArgs {
    #[arg(long, default_value = "verify")]
    op: String,
    #[arg(long)]
    key_id: u8,
    #[arg(long, default_value = DEFAULT_KEY_SLOT_PREFIX)]
    prefix: String,
    #[arg(long, default_value_t = MAX_KEY_SIZE)]
    max_key_size: usize,
    /// Key table entry as SLOT=PATH, PATH holding the raw key bytes.
    #[arg(long = "key", value_parser = parse_key_entry)]
    keys: Vec<(String, PathBuf)>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build(args) => build(&args),
        Command::Inspect(args) => inspect(&args),
        Command::Extract(args) => extract(&args),
        Command::KeySlot(args) => {
            println!("{}", KeySlotId::new(&args.prefix, &args.op, args.key_id));
            Ok(())
        }
        Command::ResolveKey(args) => resolve_key(&args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    tracing::debug!(path = %path.display(), size = bytes.len(), "read input file");
    Ok(bytes)
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

fn build(args: &BuildArgs) -> Result<()> {
    let contents = read(&args.contents)?;
    let manifest = read(&args.manifest)?;

    let mut builder = PackageBuilder::new(&contents, &manifest);
    for (label, value) in &args.headers {
        builder = builder.with_header(*label, value.clone());
    }
    let package = builder.encode()?;
    tracing::debug!(
        contents_size = contents.len(),
        manifest_size = manifest.len(),
        header_count = args.headers.len(),
        package_size = package.len(),
        "encoded package"
    );
    write(&args.out, &package)?;
    println!("wrote {} ({} bytes)", args.out.display(), package.len());
    Ok(())
}

fn parse_package<'a>(package: &'a [u8], options: &PackageParseOptions) -> Result<PackageMetadata<'a>> {
    parse_package_metadata_with_options(package, options).context("package rejected")
}

fn inspect(args: &InspectArgs) -> Result<()> {
    let package = read(&args.package)?;
    let options = PackageParseOptions::default().with_max_depth(args.max_depth);
    let md = parse_package(&package, &options)?;

    println!("package:  {} ({} bytes)", args.package.display(), package.len());
    println!("version:  {}", md.version);
    if md.headers.is_empty() {
        println!("headers:  none");
    } else {
        println!("headers:");
        for header in &md.headers {
            println!("  {}: {}", header.label, describe(header.value.value()));
        }
    }
    println!("contents: offset {}, {} bytes", md.contents.offset(), md.contents.len());
    println!("manifest: offset {}, {} bytes", md.manifest.offset(), md.manifest.len());
    Ok(())
}

fn describe(value: &Value<'_>) -> String {
    match value {
        Value::Uint(v) => v.to_string(),
        Value::NegInt(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Text(s) => format!("{s:?}"),
        Value::Bytes(b) => format!("h'{}'", hex::encode(b.as_bytes())),
        other => other.kind().to_string(),
    }
}

fn extract(args: &ExtractArgs) -> Result<()> {
    if args.contents_out.is_none() && args.manifest_out.is_none() {
        bail!("nothing to extract: pass --contents-out and/or --manifest-out");
    }

    let package = read(&args.package)?;
    let md = parse_package(&package, &PackageParseOptions::default())?;

    if let Some(path) = &args.contents_out {
        write(path, md.contents.as_bytes())?;
        tracing::debug!(path = %path.display(), size = md.contents.len(), "extracted contents");
    }
    if let Some(path) = &args.manifest_out {
        write(path, md.manifest.as_bytes())?;
        tracing::debug!(path = %path.display(), size = md.manifest.len(), "extracted manifest");
    }
    Ok(())
}

fn resolve_key(args: &ResolveKeyArgs) -> Result<()> {
    let mut service = InMemoryKeyService::new();
    for (slot, path) in &args.keys {
        service.insert_key(slot.clone(), read(path)?);
    }
    tracing::debug!(slots = args.keys.len(), "loaded key table");

    let settings = KeyResolverSettings::default()
        .with_slot_prefix(args.prefix.clone())
        .with_max_key_size(args.max_key_size);
    let resolver = KeyResolver::with_settings(service, settings);
    let slot = resolver.key_slot(&args.op, args.key_id);

    let Some(key) = resolver.resolve_key(&args.op, args.key_id) else {
        bail!("no key available for {slot}");
    };
    println!("slot: {slot}");
    println!("len:  {}", key.len());
    println!("key:  {}", hex::encode(key.as_bytes()));
    Ok(())
}

fn parse_header(s: &str) -> Result<(u64, HeaderValue), String> {
    let (label, value) = s.split_once('=').ok_or_else(|| format!("expected LABEL=VALUE, got '{s}'"))?;
    let label = label
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid header label '{label}': {e}"))?;
    let value = match value {
        "true" => HeaderValue::Bool(true),
        "false" => HeaderValue::Bool(false),
        v => v
            .parse::<u64>()
            .map(HeaderValue::Uint)
            .unwrap_or_else(|_| HeaderValue::Text(v.to_string())),
    };
    Ok((label, value))
}

fn parse_key_entry(s: &str) -> Result<(String, PathBuf), String> {
    let (slot, path) = s.split_once('=').ok_or_else(|| format!("expected SLOT=PATH, got '{s}'"))?;
    if slot.is_empty() {
        return Err("key slot name is empty".to_string());
    }
    Ok((slot.to_string(), PathBuf::from(path)))
}
