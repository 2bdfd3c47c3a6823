mod cli;
mod output;

use audiosqueeze::asset::format_mib;
use audiosqueeze::config::{self, Config};
use audiosqueeze::{BatchDriver, BatchOptions, BatchReport};
use audiosqueeze_av::{tools, FfmpegEncoder};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, TargetArgs};
use std::path::Path;

/// Which pass(es) a batch command runs.
#[derive(Debug, Clone, Copy)]
struct RunMode {
    options: BatchOptions,
    dry_run: bool,
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "audiosqueeze=debug,audiosqueeze_av=trace".to_string()
        } else {
            "audiosqueeze=warn,audiosqueeze_av=warn".to_string()
        }
    });

    // Progress lines own stdout; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            target,
            skip_convert,
            skip_compact,
            dry_run,
            json,
        } => run_batch(
            cli.config.as_deref(),
            &target,
            RunMode {
                options: BatchOptions {
                    convert: !skip_convert,
                    compact: !skip_compact,
                },
                dry_run,
                json,
            },
        ),
        Commands::Convert { target, json } => run_batch(
            cli.config.as_deref(),
            &target,
            RunMode {
                options: BatchOptions {
                    convert: true,
                    compact: false,
                },
                dry_run: false,
                json,
            },
        ),
        Commands::Compact { target, json } => run_batch(
            cli.config.as_deref(),
            &target,
            RunMode {
                options: BatchOptions {
                    convert: false,
                    compact: true,
                },
                dry_run: false,
                json,
            },
        ),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("audiosqueeze {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Err(ref e) = result {
        tracing::error!("Fatal error: {:#}", e);
    }
    result
}

/// Load config and apply command-line overrides.
fn resolve_config(config_path: Option<&Path>, target: &TargetArgs) -> Result<Config> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(ref dir) = target.dir {
        config.pipeline.directory = dir.clone();
    }
    if let Some(mib) = target.ceiling_mib {
        config.pipeline.ceiling_bytes = mib
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("Ceiling of {} MiB is too large", mib))?;
    }

    config::validate_config(&config)?;
    Ok(config)
}

fn run_batch(config_path: Option<&Path>, target: &TargetArgs, mode: RunMode) -> Result<()> {
    let config = resolve_config(config_path, target)?;
    let settings = config.encoder.settings();

    let encoder = if mode.dry_run {
        // Never invoked while planning
        FfmpegEncoder::new(
            config
                .encoder
                .ffmpeg_path
                .clone()
                .unwrap_or_else(|| "ffmpeg".into()),
            settings,
        )
    } else {
        FfmpegEncoder::locate(config.encoder.ffmpeg_path.as_deref(), settings)?
    };
    tracing::debug!("Using encoder {:?}", encoder.program());

    let pipeline = config.pipeline;
    if !mode.json {
        println!(
            "Checking for .{} files larger than {} MB in {}...\n",
            pipeline.target_extension,
            format_mib(pipeline.ceiling_bytes),
            pipeline.directory.display()
        );
    }

    let mut driver = BatchDriver::new(pipeline, encoder);

    if mode.dry_run {
        let plan = driver.plan();
        output::print_plan(&plan);
        return Ok(());
    }

    if !mode.json {
        driver = driver.with_event_callback(Box::new(output::print_event));
    }

    let report = driver.run(mode.options);
    print_report(&report, mode.json)
}

fn print_report(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        output::print_report(report);
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = tools::check_tools(config.encoder.ffmpeg_path.as_deref());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg with libopus support.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let pipeline = &config.pipeline;
    println!("  Directory: {}", pipeline.directory.display());
    println!(
        "  Ceiling: {} MB ({} bytes)",
        format_mib(pipeline.ceiling_bytes),
        pipeline.ceiling_bytes
    );
    println!(
        "  Conversion: .{} -> .{} at {}",
        pipeline.source_extension, pipeline.target_extension, pipeline.conversion_bitrate_kbps
    );
    let candidates: Vec<String> = pipeline
        .candidates_kbps
        .iter()
        .map(|b| b.to_string())
        .collect();
    println!("  Candidates: {}", candidates.join(", "));
    println!(
        "  Encoder: {} ({}, compression level {})",
        config.encoder.codec.ffmpeg_name(),
        config.encoder.container.ffmpeg_format(),
        config.encoder.compression_level
    );

    Ok(())
}
