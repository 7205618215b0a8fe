use crate::document::EmptyGroupPolicy;
use crate::evaluator::ExcludePathPrefixes;
use crate::grouping::{FirstPathSegmentGrouping, TagGrouping};
use crate::manifest::ManifestRouteSource;
use crate::ordering::{LexicographicReferenceOrdering, PositionReferenceOrdering};
use crate::paths::RelativePathProvider;
use crate::readers::{DefaultMediaTypesReader, DeprecationReader, HiddenRouteReader};
use crate::resource_listing::{ResourceListingScanner, ScanConfig};
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;

/// API resource listing generator - Build grouped API documentation from a route manifest
#[derive(Parser, Debug)]
#[command(name = "apidoc-scanner")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Route manifest file, or a directory of manifests
    #[arg(value_name = "ROUTES_PATH")]
    pub routes_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Documentation group label
    #[arg(short = 'g', long = "group", default_value = "default")]
    pub group: String,

    /// API version; overrides the manifest's apiVersion
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// How routes are assigned to resource groups
    #[arg(long = "grouping", value_enum, default_value = "first-segment")]
    pub grouping: GroupingKind,

    /// Exclude routes under this path prefix (repeatable)
    #[arg(short = 'x', long = "exclude-prefix", value_name = "PREFIX")]
    pub exclude_prefixes: Vec<String>,

    /// Order of the resource listing's references
    #[arg(long = "order", value_enum, default_value = "lexicographic")]
    pub order: ReferenceOrder,

    /// Drop groups whose routes were all filtered out
    #[arg(long = "omit-empty-groups")]
    pub omit_empty_groups: bool,

    /// Documentation base path that listing locations are resolved against
    #[arg(long = "base-path", value_name = "PATH")]
    pub base_path: Option<String>,

    /// Expand groups in parallel
    #[arg(long = "parallel")]
    pub parallel: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Built-in grouping strategies
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum GroupingKind {
    /// First literal path segment
    FirstSegment,
    /// Route tag, falling back to the first path segment
    Tag,
}

/// Built-in reference orderings
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ReferenceOrder {
    /// By path, then name
    Lexicographic,
    /// By group position, then name
    Position,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.routes_path.exists() {
        anyhow::bail!("Routes path does not exist: {}", args.routes_path.display());
    }

    if args.group.trim().is_empty() {
        anyhow::bail!("Group name must not be empty");
    }

    if let Some(prefix) = args.exclude_prefixes.iter().find(|p| p.trim_matches('/').is_empty()) {
        anyhow::bail!("Invalid exclude prefix '{}': it would exclude every route", prefix);
    }

    info!("Routes path: {}", args.routes_path.display());
    info!("Group: {}", args.group);
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Build the scan configuration for the given arguments and loaded manifests.
pub fn build_config(args: &CliArgs, source: &ManifestRouteSource) -> Result<ScanConfig> {
    let manifest = source.manifest();

    let mut config = ScanConfig::new(args.group.clone())
        .model_resolver(manifest.model_registry())
        .authorization_types(manifest.authorizations.clone())
        .reader(HiddenRouteReader)
        .reader(DeprecationReader)
        .reader(DefaultMediaTypesReader::json())
        .parallel(args.parallel);

    config = match args.grouping {
        GroupingKind::FirstSegment => config.grouping(FirstPathSegmentGrouping::new()),
        GroupingKind::Tag => {
            config.grouping(TagGrouping::with_fallback(FirstPathSegmentGrouping::new()))
        }
    };
    config = match args.order {
        ReferenceOrder::Lexicographic => config.reference_ordering(LexicographicReferenceOrdering),
        ReferenceOrder::Position => config.reference_ordering(PositionReferenceOrdering),
    };

    if let Some(api_version) = args.api_version.clone().or_else(|| manifest.api_version.clone()) {
        config = config.api_version(api_version);
    }
    if let Some(info) = manifest.info.clone() {
        config = config.info(info);
    }
    if let Some(settings) = manifest.settings.clone() {
        config = config.settings(settings);
    }
    if !manifest.security.is_empty() {
        let context = manifest
            .authorization_context()
            .context("Invalid authorization rule in route manifest")?;
        config = config.authorization_context(context);
    }
    if !args.exclude_prefixes.is_empty() {
        config = config.evaluator(ExcludePathPrefixes::new(args.exclude_prefixes.iter().cloned()));
    }
    if let Some(base_path) = &args.base_path {
        config = config.path_provider(
            RelativePathProvider::new().with_documentation_base_path(base_path.clone()),
        );
    }
    if args.omit_empty_groups {
        config = config.empty_group_policy(EmptyGroupPolicy::Omit);
    }

    Ok(config)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting resource listing generation...");

    // Step 1: Load route manifests
    info!("Loading route manifests...");
    let source = ManifestRouteSource::open(&args.routes_path)
        .with_context(|| {
            format!(
                "Failed to load route manifests from {}",
                args.routes_path.display()
            )
        })?;
    info!(
        "Loaded {} routes from {} manifest files",
        source.manifest().routes.len(),
        source.files().len()
    );
    for warning in source.warnings() {
        warn!("{}", warning);
    }
    if source.manifest().routes.is_empty() {
        warn!("No routes found in the route manifests");
    }

    // Step 2: Scan
    let config = build_config(&args, &source)?;
    let scanner = ResourceListingScanner::new(config);
    let outcome = scanner.scan_source(&source)?;
    outcome.report.log();

    // Step 3: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&outcome.document)?,
        OutputFormat::Json => serialize_json(&outcome.document)?,
    };

    // Step 4: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Manifest files: {}", source.files().len());
    info!("  - Resource groups: {}", outcome.report.resource_count);
    info!(
        "  - Operations: {}",
        outcome.document.listings.values().map(|l| l.operations.len()).sum::<usize>()
    );
    if !outcome.report.is_complete() {
        warn!("  - Groups without listing: {}", outcome.report.failed_groups.len());
    }

    Ok(())
}
