use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::time::Instant;

mod cli;
mod config_file;
mod json_output;
mod pipeline;
mod report;
mod utils;

use cli::Args;
use json_output::JsonMessage;
use pipeline::{BatchEvent, ResizeConfig, ResizeEngine, TaskAction, TaskResult};
use utils::{create_progress_bar, format_duration, validate_inputs, verbose_println, warn_println};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let mut args = Args::parse();
    args.load_and_merge_config()?;
    validate_inputs(&args)?;

    let json_mode = args.json_progress;

    if !json_mode {
        println!(
            "{}",
            style("edgefit - Batch longest-edge image resizer")
                .bold()
                .blue()
        );
        println!();
    }

    let target_edge = args
        .size
        .context("No target size specified (use --size or a config file)")?;
    let output_root = args.resolved_output_dir();

    let config = ResizeConfig {
        target_edge,
        output_root: output_root.clone(),
        extensions: args.parse_extensions(),
        worker_count: args.jobs,
    };

    if args.verbose && !json_mode {
        println!("{}", style("Configuration:").bold());
        println!("  Target edge: {}px", config.target_edge);
        println!("  Output root: {}", config.output_root.display());
        println!("  Extensions: {:?}", config.extensions);
        println!(
            "  Parallel jobs: {}",
            if config.worker_count == 0 {
                format!("auto ({} cores)", num_cpus::get())
            } else {
                config.worker_count.to_string()
            }
        );
        println!();
    }

    let engine = ResizeEngine::new(config);

    // First Ctrl-C asks the coordinator to wind down; a second one exits hard
    let interrupt = engine.cancel_token();
    ctrlc::set_handler(move || {
        if interrupt.is_cancelled() {
            std::process::exit(130);
        }
        interrupt.cancel();
        eprintln!();
        eprintln!("Stopping... in-flight images will finish (Ctrl-C again to abort)");
    })
    .context("Failed to install interrupt handler")?;

    // Discover all images
    let scanned = engine.discover(&args.input_paths);
    for warning in &scanned.warnings {
        if json_mode {
            JsonMessage::FileSkipped {
                input_path: warning.path.display().to_string(),
                reason: warning.message.clone(),
            }
            .emit();
        } else {
            warn_println(&format!("{}: {}", warning.path.display(), warning.message));
        }
    }

    if scanned.files.is_empty() {
        if json_mode {
            JsonMessage::summary(0, 0, 0, 0, 0, start_time.elapsed().as_secs_f64(), false);
        } else {
            println!(
                "{}",
                style("No images found with specified extensions").red()
            );
        }
        return Ok(());
    }

    verbose_println(
        args.verbose && !json_mode,
        &format!("Found {} image files", scanned.files.len()),
    );

    let tasks = engine.plan_tasks(&scanned.files);
    let total = tasks.len();

    let progress = if json_mode {
        None
    } else {
        let pb = create_progress_bar(total as u64);
        pb.set_message("Resizing images");
        Some(pb)
    };

    let stream = engine.start(tasks)?;

    let mut results: Vec<TaskResult> = Vec::with_capacity(total);
    let mut terminal = None;

    for event in stream {
        match event {
            BatchEvent::Result { result, state } => {
                if let Some(pb) = &progress {
                    pb.println(outcome_line(&result));
                    pb.inc(1);
                } else {
                    JsonMessage::task_result(&result);
                    JsonMessage::progress(
                        state.completed,
                        state.total,
                        result.source_path.display().to_string(),
                    );
                }
                results.push(result);
            }
            BatchEvent::Completed(summary) => terminal = Some((summary, false)),
            BatchEvent::Cancelled(summary) => terminal = Some((summary, true)),
        }
    }

    let (summary, cancelled) = terminal.context("Batch ended without a terminal event")?;
    let total_time = start_time.elapsed();

    if let Some(pb) = progress {
        if cancelled {
            pb.abandon_with_message("Cancelled");
        } else {
            pb.finish_with_message("Done");
        }
        println!();

        let header = if cancelled {
            style("Cancelled - partial results:").bold().yellow()
        } else {
            style("Results Summary:").bold().green()
        };
        println!("{}", header);
        println!(
            "  Resized: {}",
            style(summary.resized).bold().green()
        );
        if summary.copied > 0 {
            println!("  Copied (already at size): {}", style(summary.copied).bold().cyan());
        }
        if summary.skipped > 0 {
            println!("  Skipped (not an image): {}", style(summary.skipped).bold().yellow());
        }
        if summary.errored > 0 {
            println!("  Failed: {}", style(summary.errored).bold().red());
        }
        if cancelled {
            println!(
                "  Not processed: {}",
                style(summary.total - summary.completed).bold().yellow()
            );
        }
        println!("  Total time: {}", format_duration(total_time));
    } else {
        JsonMessage::summary(
            summary.total,
            summary.resized,
            summary.copied,
            summary.skipped,
            summary.errored,
            total_time.as_secs_f64(),
            cancelled,
        );
    }

    if args.report && !json_mode {
        println!();
        report::print_report(&results);
    }

    Ok(())
}

fn outcome_line(result: &TaskResult) -> String {
    let name = result
        .source_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| result.source_path.display().to_string());

    match result.action {
        TaskAction::Upscaled | TaskAction::Downscaled => {
            let (ow, oh) = result.original_dims.unwrap_or((0, 0));
            let (fw, fh) = result.final_dims.unwrap_or((0, 0));
            format!(
                "{} {} {}x{} -> {}x{} ({})",
                style("✓").green(),
                name,
                ow,
                oh,
                fw,
                fh,
                result.action.label()
            )
        }
        TaskAction::Copied => format!("{} {} (already at size, copied)", style("✓").green(), name),
        TaskAction::Skipped => format!(
            "{} {} ({})",
            style("-").yellow(),
            name,
            result.error_detail.as_deref().unwrap_or("skipped")
        ),
        TaskAction::Errored => format!(
            "{} {}: {}",
            style("✗").red(),
            name,
            result.error_detail.as_deref().unwrap_or("unknown error")
        ),
    }
}
