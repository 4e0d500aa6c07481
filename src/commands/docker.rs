//! `opsrun docker` — image and container steps for build agents.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::output::{OutputContext, progress};
use crate::runner::CommandRunner;
use crate::tools::docker::{BuildParams, Docker, RunParams};

#[derive(Subcommand, Debug)]
pub enum DockerCommand {
    /// Verify the docker daemon is reachable
    Check,
    /// List local images
    Images,
    /// Pull an image
    Pull {
        /// Image reference, e.g. nginx:latest
        image: String,
    },
    /// Build an image from a context directory
    Build {
        /// Image tag, e.g. myapp:latest
        #[arg(short, long)]
        tag: String,
        /// Build context directory
        #[arg(default_value = ".")]
        context: PathBuf,
    },
    /// Start a detached container
    Run {
        /// Image to run
        image: String,
        /// Container name
        #[arg(long)]
        name: String,
        /// Port publication, repeatable (HOST:CONTAINER)
        #[arg(short, long, value_name = "HOST:CONTAINER")]
        publish: Vec<String>,
    },
    /// Stop and remove a container
    Rm {
        /// Container name
        name: String,
    },
    /// Show container logs
    Logs {
        /// Container name
        name: String,
        /// Only the last N lines
        #[arg(long, value_name = "N")]
        tail: Option<u32>,
    },
    /// Run a command inside a running container
    Exec {
        /// Container name
        name: String,
        /// The command and its arguments
        #[arg(
            required = true,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "COMMAND"
        )]
        command: Vec<String>,
    },
    /// Archive an image to a tar file
    Save {
        /// Image reference
        image: String,
        /// Archive path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Load an image from a tar archive
    Load {
        /// Archive path
        archive: PathBuf,
    },
    /// Tag and push an image to a registry
    Push {
        /// Local image reference
        image: String,
        /// Registry target (defaults to pushing the local reference)
        #[arg(long, value_name = "IMAGE")]
        target: Option<String>,
    },
    /// Remove unused images
    Prune,
}

/// First 12 bytes of a container id, or the whole id when it is shorter or
/// would split a character.
fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn parse_port(publish: &str) -> Result<(u16, u16)> {
    let (host, container) = publish
        .split_once(':')
        .with_context(|| format!("invalid --publish value '{publish}', expected HOST:CONTAINER"))?;
    Ok((
        host.parse()
            .with_context(|| format!("invalid host port '{host}'"))?,
        container
            .parse()
            .with_context(|| format!("invalid container port '{container}'"))?,
    ))
}

/// Run `opsrun docker <subcommand>`.
///
/// # Errors
///
/// Returns an error if the docker CLI is missing, the daemon is down, or
/// the requested operation fails.
pub async fn run(
    ctx: &OutputContext,
    runner: &impl CommandRunner,
    cmd: DockerCommand,
    json: bool,
) -> Result<()> {
    let docker = Docker::new(runner);

    match cmd {
        DockerCommand::Check => {
            docker.check_daemon().await?;
            ctx.success("Docker daemon reachable");
        }
        DockerCommand::Images => {
            let images = docker.images().await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&images).context("serializing images")?
                );
            } else if images.is_empty() {
                ctx.info("No local images.");
            } else {
                for image in &images {
                    ctx.kv("image", image);
                }
            }
        }
        DockerCommand::Pull { image } => {
            let spinner = ctx
                .show_progress()
                .then(|| progress::spinner(&format!("Pulling {image}...")));
            let result = docker.pull(&image).await;
            if let Some(pb) = &spinner {
                match &result {
                    Ok(_) => progress::finish_ok(pb, &format!("Pulled {image}")),
                    Err(_) => progress::finish_err(pb, &format!("Pull of {image} failed")),
                }
            }
            result?;
            if spinner.is_none() {
                ctx.success(&format!("Pulled {image}"));
            }
        }
        DockerCommand::Build { tag, context } => {
            docker.build(&BuildParams::new(&tag, context)).await?;
            ctx.success(&format!("Built {tag}"));
        }
        DockerCommand::Run {
            image,
            name,
            publish,
        } => {
            let mut params = RunParams::new(&image, &name);
            params.ports = publish
                .iter()
                .map(|p| parse_port(p))
                .collect::<Result<_>>()?;
            let id = docker.run_detached(&params).await?;
            ctx.success(&format!("Started {name} ({})", short_id(&id)));
            ctx.info(&format!("Tear down with: opsrun docker rm {name}"));
        }
        DockerCommand::Rm { name } => {
            docker.remove(&name).await?;
            ctx.success(&format!("Removed {name}"));
        }
        DockerCommand::Logs { name, tail } => {
            let outcome = docker.logs(&name, tail).await?;
            print!("{}", outcome.stdout_text());
            eprint!("{}", outcome.stderr_text());
        }
        DockerCommand::Exec { name, command } => {
            let argv: Vec<&str> = command.iter().map(String::as_str).collect();
            let outcome = docker.exec(&name, &argv).await?;
            print!("{}", outcome.stdout_text());
            eprint!("{}", outcome.stderr_text());
        }
        DockerCommand::Save { image, output } => {
            docker.save(&image, &output).await?;
            ctx.success(&format!("Saved {image} to {}", output.display()));
        }
        DockerCommand::Load { archive } => {
            let outcome = docker.load(&archive).await?;
            print!("{}", outcome.stdout_text());
            ctx.success(&format!("Loaded {}", archive.display()));
        }
        DockerCommand::Push { image, target } => {
            let destination = match target {
                Some(target) => {
                    docker.tag(&image, &target).await?;
                    target
                }
                None => image,
            };
            docker.push(&destination).await?;
            ctx.success(&format!("Pushed {destination}"));
        }
        DockerCommand::Prune => {
            let outcome = docker.prune_images().await?;
            print!("{}", outcome.stdout_text());
            ctx.success("Unused images removed");
        }
    }
    Ok(())
}
