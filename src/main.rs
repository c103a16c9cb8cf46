//! Deployer CLI entrypoint.
//!
//! This is the main entrypoint for the deployer command-line tool.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use appliance_deployer::bundle::{BundleCatalog, BundleResolver, ResolvedBundle};
use appliance_deployer::cli::{Cli, Commands, DomainCommands, OutputFormatter, StdioPrompt};
use appliance_deployer::config::{InputSpec, InputSpecParser, InstallContext};
use appliance_deployer::driver::{CommandRunner, LibvirtDriver, LocalRunner, SshRunner};
use appliance_deployer::error::{ConfigError, DeployerError, Result, ValidationRule};
use appliance_deployer::host::{HostInfo, LocalHostInfo};
use appliance_deployer::planner::DeploymentPlan;
use appliance_deployer::storage::StorageCatalog;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    // .env values feed the clap env fallbacks
    match dotenvy::dotenv() {
        Err(e) if !e.not_found() => {
            eprintln!("Failed to load .env: {e}");
            return ExitCode::FAILURE;
        }
        _ => {}
    }

    let cli = Cli::parse();

    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_cancelled() => {
            eprintln!("Cancelled.");
            ExitCode::FAILURE
        }
        Err(e) => {
            if e.is_authoring_defect() {
                eprintln!("Document error: {e}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Validate { input } => cmd_validate(&input, &formatter),
        Commands::Bundles {
            catalog,
            host_ram,
            host_cpus,
        } => cmd_bundles(&catalog, host_ram, host_cpus, &formatter),
        Commands::Plan {
            catalog,
            storage,
            input,
            export_dir,
            host_ram,
            host_cpus,
        } => {
            let ctx = InstallContext::discover(&cli.root)?;
            let ctx = match export_dir {
                Some(dir) => ctx.with_export_dir(dir),
                None => ctx,
            };
            let request = PlanRequest {
                catalog,
                storage,
                input,
                host_ram,
                host_cpus,
            };
            cmd_plan(&ctx, &request, &formatter)
        }
        Commands::Domain { ssh, action } => match ssh {
            Some(target) => cmd_domain(&cli.root, SshRunner::new(target), action).await,
            None => cmd_domain(&cli.root, LocalRunner::new(), action).await,
        },
    }
}

/// Document paths and host overrides for the plan command.
struct PlanRequest {
    catalog: PathBuf,
    storage: PathBuf,
    input: Option<PathBuf>,
    host_ram: Option<u64>,
    host_cpus: Option<u32>,
}

/// Validate an input specification.
fn cmd_validate(input: &Path, formatter: &OutputFormatter) -> Result<()> {
    info!("Validating input specification: {}", input.display());

    let spec = InputSpecParser::new().load_file(input)?;

    println!("{}", formatter.format_input(&spec));
    Ok(())
}

/// List bundles that fit into the host.
fn cmd_bundles(
    catalog_path: &Path,
    host_ram: Option<u64>,
    host_cpus: Option<u32>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let catalog = BundleCatalog::load_file(catalog_path)?;
    let (ram_mb, cpus) = host_facts(host_ram, host_cpus)?;

    let eligible = catalog.eligible(ram_mb);
    println!("{}", formatter.format_bundles(&eligible, ram_mb, cpus));
    Ok(())
}

/// Resolve a bundle interactively and print the deployment plan.
fn cmd_plan(
    ctx: &InstallContext,
    request: &PlanRequest,
    formatter: &OutputFormatter,
) -> Result<()> {
    let catalog = BundleCatalog::load_file(&request.catalog)?;
    let storage = StorageCatalog::load_file(&request.storage)?;
    let spec = request
        .input
        .as_ref()
        .map(|path| InputSpecParser::new().load_file(path))
        .transpose()?;

    let resolver = BundleResolver::new(&catalog);
    let mut chooser = StdioPrompt::new();
    let mut confirmer = StdioPrompt::new();

    let resolved = match (request.host_ram, request.host_cpus) {
        (None, None) => {
            resolver.resolve_with_host(&LocalHostInfo::new(), &mut chooser, &mut confirmer)?
        }
        (ram, cpus) => {
            let (ram_mb, cpus) = host_facts(ram, cpus)?;
            resolver.resolve(ram_mb, cpus, &mut chooser, &mut confirmer)?
        }
    };

    let hardware = match resolved {
        Some(bundle) => bundle,
        None => {
            let spec = spec.as_ref().ok_or_else(|| {
                DeployerError::internal("a custom configuration needs --input to bound CPU and RAM")
            })?;
            prompt_custom(spec, StdioPrompt::new())?
        }
    };

    let plan = DeploymentPlan::assemble(ctx, &hardware, &storage)?;
    println!("{}", formatter.format_plan(&plan));
    Ok(())
}

/// Asks for custom CPU, RAM and storage values within the input ranges.
fn prompt_custom(spec: &InputSpec, prompt: StdioPrompt) -> Result<ResolvedBundle> {
    let cpus = if spec.cpu.configure {
        prompt.number("Number of vCPUs", spec.cpu.default)?
    } else {
        spec.cpu.default
    };
    let ram = if spec.ram.configure {
        prompt.number("RAM size in MB", spec.ram.default)?
    } else {
        spec.ram.default
    };
    let storage_index = prompt.number("Storage configuration index", 0)?;

    let cpus = u32::try_from(cpus)
        .map_err(|_| ConfigError::validation("cpu", ValidationRule::ValueOutOfRange, cpus))?;
    let ram_mb = u64::try_from(ram)
        .map_err(|_| ConfigError::validation("ram", ValidationRule::ValueOutOfRange, ram))?;
    let storage_index = usize::try_from(storage_index).map_err(|_| {
        ConfigError::validation("storage_config", ValidationRule::ValueOutOfRange, storage_index)
    })?;

    ResolvedBundle::custom(spec, cpus, ram_mb, storage_index)
}

/// Run a libvirt domain command.
async fn cmd_domain<R: CommandRunner>(
    root: &Path,
    runner: R,
    action: DomainCommands,
) -> Result<()> {
    let driver = LibvirtDriver::new(runner);

    match action {
        DomainCommands::Define { config } => driver.define_domain(&config).await?,
        DomainCommands::Start { name } => driver.start_domain(&name).await?,
        DomainCommands::Destroy { name } => driver.destroy_domain(&name).await?,
        DomainCommands::Undefine { name } => driver.undefine_domain(&name).await?,
        DomainCommands::Autostart { name } => driver.set_autostart(&name).await?,
        DomainCommands::Exists { name } => {
            let exists = driver.domain_exists(&name).await?;
            println!("{exists}");
        }
        DomainCommands::Emulator { arch } => {
            let arch = match arch {
                Some(arch) => arch,
                None => InstallContext::discover(root)?.arch,
            };
            println!("{}", driver.emulator(&arch).await?);
        }
        DomainCommands::Version => println!("{}", driver.version().await?),
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Host RAM and CPU count, preferring explicit overrides.
fn host_facts(host_ram: Option<u64>, host_cpus: Option<u32>) -> Result<(u64, u32)> {
    let host = LocalHostInfo::new();
    let ram_mb = match host_ram {
        Some(ram) => ram,
        None => host.ram_size_mb()?,
    };
    let cpus = match host_cpus {
        Some(cpus) => cpus,
        None => host.cpu_count()?,
    };
    debug!("Host facts: {ram_mb}MB RAM, {cpus} CPUs");
    Ok((ram_mb, cpus))
}
