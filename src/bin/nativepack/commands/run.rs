//! `nativepack run` command

use std::time::Duration;

use anyhow::Result;

use crate::cli::RunArgs;
use nativepack::graph::{ParameterValue, RunObserver, TargetOutcome, TargetStatus};
use nativepack::ops::params::{apply_config, PACKAGE_VERSION};
use nativepack::ops::{pipeline, pipeline_parameters, PipelineContext, PipelineOptions, Tools};
use nativepack::util::git_version::describe_version;
use nativepack::util::shell::{format_duration, Shell, Spinner, Status};
use nativepack::GlobalContext;

pub fn execute(args: RunArgs, ctx: &GlobalContext, shell: &Shell) -> Result<()> {
    let config = ctx.load_config()?;

    // Precedence: defaults < config files < NATIVEPACK_* env < flags.
    let mut params = pipeline_parameters();
    apply_config(&config, &mut params)?;
    args.params.apply(&mut params)?;

    if !params.is_set(PACKAGE_VERSION) {
        if let Some(version) = describe_version(ctx.project_root())? {
            tracing::debug!("package version {} from git describe", version);
            params.set(PACKAGE_VERSION, ParameterValue::String(version))?;
        }
    }

    let graph = pipeline()?;

    if args.plan {
        let plan = graph.plan(&args.targets)?;
        for (i, name) in plan.order.iter().enumerate() {
            shell.print(format!("{:>3}. {}", i + 1, name));
        }
        if ctx.is_verbose() {
            for def in params.defs() {
                if let Some(value) = params.display_value(&def.name) {
                    shell.note(format!("{} = {}", def.name, value));
                }
            }
        }
        return Ok(());
    }

    let tools = Tools::host(&params, ctx.project_root());
    let options = PipelineOptions {
        project_root: ctx.project_root().to_path_buf(),
        triplet_mappings: config.triplets.clone(),
    };
    let pipeline_ctx = PipelineContext::new(params, options, tools)?;

    let mut observer = ShellObserver::new(shell);
    let result = graph.run(&args.targets, &pipeline_ctx, &mut observer);
    observer.print_summary();
    let report = result?;

    for path in pipeline_ctx.produced() {
        shell.status(Status::Created, path.display());
    }
    let total: Duration = report.outcomes.iter().map(|o| o.duration).sum();
    shell.status(
        Status::Finished,
        format!(
            "{} target(s) in {}",
            report.executed().len(),
            format_duration(total)
        ),
    );

    Ok(())
}

/// Reports target progress through the shell.
struct ShellObserver<'a> {
    shell: &'a Shell,
    spinner: Option<Spinner>,
    outcomes: Vec<TargetOutcome>,
}

impl<'a> ShellObserver<'a> {
    fn new(shell: &'a Shell) -> Self {
        ShellObserver {
            shell,
            spinner: None,
            outcomes: Vec::new(),
        }
    }

    /// Per-target table of status and duration.
    fn print_summary(&self) {
        if self.shell.is_quiet() || self.outcomes.is_empty() {
            return;
        }

        let width = self
            .outcomes
            .iter()
            .map(|o| o.name.len())
            .max()
            .unwrap_or(0);

        eprintln!();
        for outcome in &self.outcomes {
            let (status, duration) = match outcome.status {
                TargetStatus::Succeeded => ("ok", format_duration(outcome.duration)),
                TargetStatus::Failed => ("FAILED", format_duration(outcome.duration)),
                TargetStatus::NotRun => ("not run", "-".to_string()),
            };
            eprintln!(
                "  {:<width$}  {:<7}  {:>8}",
                outcome.name,
                status,
                duration,
                width = width
            );
        }
        eprintln!();
    }
}

impl RunObserver for ShellObserver<'_> {
    fn target_started(&mut self, name: &str, position: usize, total: usize) {
        self.shell.status(
            Status::Running,
            format!("[{}/{}] {}", position + 1, total, name),
        );
        self.spinner = Some(self.shell.spinner(name));
    }

    fn target_finished(&mut self, outcome: &TargetOutcome) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish();
        }

        match outcome.status {
            TargetStatus::Succeeded => self.shell.status(
                Status::Finished,
                format!("{} in {}", outcome.name, format_duration(outcome.duration)),
            ),
            TargetStatus::Failed => self.shell.status(Status::Failed, &outcome.name),
            TargetStatus::NotRun => {}
        }
        self.outcomes.push(outcome.clone());
    }
}
