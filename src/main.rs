//! repo-provision
//!
//! Main entry point for the `provision` CLI.

use clap::Parser;
use repo_provision::commands::Cli;
use repo_provision::config::{validate_config_result, ProvisionConfig};
use repo_provision::forge::{new_repository_page, GitHubClient};
use repo_provision::provision::{FallbackHints, ProgressEvent, ProvisionFailure};
use repo_provision::publish::{GitPublisher, PublishOptions};
use repo_provision::{style, ProvisionError, ProvisionReport, Provisioner, RepositoryDescriptor};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

/// Everything resolved before the first side effect
struct Setup {
    config: ProvisionConfig,
    working_directory: PathBuf,
    descriptor: RepositoryDescriptor,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbosity = if cli.quiet { 0 } else { cli.verbose };
    if let Err(e) = repo_provision::logging::init(verbosity) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    let setup = match prepare(&cli) {
        Ok(setup) => setup,
        Err(e) => {
            println!("{} {}", style::error("Error:"), e);
            return e.exit_code();
        }
    };

    let host = match GitHubClient::from_config(&setup.config) {
        Ok(host) => host,
        Err(e) => {
            println!("{} {}", style::error("Error:"), e);
            return e.exit_code();
        }
    };
    let publisher = GitPublisher::new(PublishOptions::from_config(&setup.config, cli.mode()));
    let hints = FallbackHints {
        new_repository_page: new_repository_page(&setup.config.api.base_url),
        remote: setup.config.git.remote.clone(),
        branch: setup.config.git.branch.clone(),
    };

    let mut provisioner = Provisioner::new(host, publisher).with_hints(hints);
    if !cli.quiet && !cli.json {
        provisioner = provisioner.with_progress(print_progress);
    }

    match provisioner
        .provision(&cli.token, &setup.descriptor, &setup.working_directory)
        .await
    {
        Ok(report) => {
            if cli.json {
                match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        println!("{} {}", style::error("Error:"), e);
                        return 1;
                    }
                }
            } else if !cli.quiet {
                print_report(&report);
            }
            0
        }
        Err(failure) => {
            if let Err(e) = write_failure(&mut io::stdout().lock(), &failure) {
                tracing::error!(error = %e, "Failed to print failure report");
            }
            failure.exit_code()
        }
    }
}

fn prepare(cli: &Cli) -> repo_provision::Result<Setup> {
    let mut config = ProvisionConfig::load_or_default(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    validate_config_result(&config)?;

    let working_directory = config.working_directory()?;
    if !working_directory.is_dir() {
        return Err(ProvisionError::Usage(format!(
            "working directory {} does not exist",
            working_directory.display()
        )));
    }
    let descriptor = config.descriptor(&working_directory)?;

    tracing::debug!(
        name = %descriptor.name,
        path = %working_directory.display(),
        mode = ?cli.mode(),
        "Resolved inputs"
    );

    Ok(Setup {
        config,
        working_directory,
        descriptor,
    })
}

fn print_progress(event: &ProgressEvent) {
    match event {
        ProgressEvent::CreatingRemote { name } => {
            println!("Creating repository {}...", style::highlight(name));
        }
        ProgressEvent::RemoteCreated { url } => {
            println!("{} Repository created: {}", style::success("✓"), style::highlight(url));
        }
        ProgressEvent::Publishing { path, url } => {
            println!(
                "Publishing {} to {}...",
                style::path(&path.display().to_string()),
                style::highlight(url)
            );
        }
        ProgressEvent::Published { branch } => {
            println!("{} Pushed {}", style::success("✓"), style::highlight(branch));
        }
    }
}

fn print_report(report: &ProvisionReport) {
    println!();
    for outcome in &report.publish.steps {
        println!("  {}", style::step_line(outcome));
    }
    if let Some(ref commit) = report.publish.commit {
        println!("  {}", style::dim(&format!("HEAD {}", commit)));
    }
    println!();
    println!("{}", style::success("Repository provisioned."));
    println!("Visit: {}", style::highlight(&report.remote.remote_url));
}

/// Failure report: the error, captured diagnostics, and how to finish by hand
fn write_failure(out: &mut impl Write, failure: &ProvisionFailure) -> io::Result<()> {
    writeln!(out, "{} {}", style::error("Error:"), failure)?;

    if let Some(diagnostics) = failure.error.diagnostics() {
        writeln!(out)?;
        for line in diagnostics.lines() {
            writeln!(out, "  {}", style::dim(line))?;
        }
    }

    if let Some(ref created) = failure.created {
        writeln!(out)?;
        writeln!(
            out,
            "{} The repository was created and left in place: {}",
            style::warning("Note:"),
            style::highlight(&created.remote_url)
        )?;
    }

    if !failure.manual_steps.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", style::header("To finish manually:"))?;
        for step in &failure.manual_steps {
            writeln!(out, "  {}", style::command(step))?;
        }
    }

    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_provision::provision::Stage;
    use repo_provision::ProvisioningResult;

    #[test]
    fn test_failure_report_lists_diagnostics_and_manual_steps() {
        let failure = ProvisionFailure {
            stage: Stage::Publish,
            error: ProvisionError::PushRejected {
                output: " ! [rejected] main -> main (fetch first)".to_string(),
            },
            created: Some(ProvisioningResult {
                remote_url: "https://github.com/user/demo".to_string(),
                created: true,
                clone_url: None,
                full_name: None,
            }),
            manual_steps: vec![
                "cd /work/demo".to_string(),
                "git push -u origin main".to_string(),
            ],
        };

        let mut out = Vec::new();
        write_failure(&mut out, &failure).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("local publish failed"));
        assert!(text.contains("[rejected] main -> main (fetch first)"));
        assert!(text.contains("https://github.com/user/demo"));
        assert!(text.contains("To finish manually:"));
        assert!(text.contains("git push -u origin main"));
    }
}
