//! Human-readable progress and summary lines.

use audiosqueeze::asset::format_mib;
use audiosqueeze::report::Event;
use audiosqueeze::{BatchPlan, BatchReport, BatchSummary};
use std::path::{Path, PathBuf};

pub fn print_event(event: &Event) {
    match event {
        Event::ScanComplete {
            extension,
            count: 0,
        } => println!("No .{} files found.", extension),
        Event::ScanComplete { extension, count } => {
            println!("Found {} .{} file(s)\n", count, extension)
        }

        Event::ConversionStarted { name } => println!("Converting {}...", name),
        Event::Converted {
            name,
            size,
            ceiling,
            ..
        } if size > ceiling => println!(
            "⚠ {} converted but is {} MB (above {} MB target)",
            name,
            format_mib(*size),
            format_mib(*ceiling)
        ),
        Event::Converted {
            name, output, size, ..
        } => println!(
            "✓ Successfully converted {} to {} ({} MB)",
            name,
            output,
            format_mib(*size)
        ),
        Event::ConversionSkipped { name, reason } => println!("- Skipping {}: {}", name, reason),
        Event::ConversionFailed { name, reason } => {
            println!("✗ Failed to convert {}: {}", name, reason)
        }

        Event::Classified {
            name,
            size,
            oversized: true,
        } => println!("⚠ {}: {} MB (needs compression)", name, format_mib(*size)),
        Event::Classified { name, size, .. } => {
            println!("✓ {}: {} MB (OK)", name, format_mib(*size))
        }
        Event::CompactionNeeded { count: 0 } => {
            println!("\nAll files are already under the size limit!")
        }
        Event::CompactionNeeded { count } => println!("\n{} file(s) need compression\n", count),
        Event::CompactionStarted { name } => println!("  Compressing {}...", name),
        Event::AttemptSized { bitrate, size, .. } => {
            println!("    Tried {}: {} MB", bitrate, format_mib(*size))
        }
        Event::AttemptFailed {
            bitrate, reason, ..
        } => println!("    Error at {}: {}", bitrate, reason),
        Event::Compacted {
            name,
            bitrate,
            size,
        } => println!(
            "  ✓ Compressed {} to {} MB (using {})",
            name,
            format_mib(*size),
            bitrate
        ),
        Event::CompactionFailed { name, reason } => println!("  ✗ {}: {}", name, reason),
    }
}

fn print_summary(title: &str, verb: &str, summary: &BatchSummary) {
    println!("\n--- {} complete ---", title);
    println!("Successfully {}: {}", verb, summary.succeeded);
    println!("Failed: {}", summary.failed);
}

pub fn print_report(report: &BatchReport) {
    if let Some(ref conversion) = report.conversion {
        print_summary("Conversion", "converted", conversion);
    }
    if let Some(ref compaction) = report.compaction {
        print_summary("Compression", "compressed", compaction);
    }
}

pub fn print_plan(plan: &BatchPlan) {
    print_paths("Would convert", &plan.to_convert);
    print_paths("Already converted", &plan.already_converted);
    print_paths("Would compress", &plan.to_compact);
    print_paths("Within size limit", &plan.within_ceiling);
    println!(
        "\n[DRY RUN] {} conversion(s), {} compression(s)",
        plan.to_convert.len(),
        plan.to_compact.len()
    );
}

fn print_paths(label: &str, paths: &[PathBuf]) {
    println!("{}: {}", label, paths.len());
    for path in paths {
        println!("  {}", file_name(path));
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
