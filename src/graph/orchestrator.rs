//! The target graph and its runner.
//!
//! A run resolves the requested targets into a plan, checks every
//! requirement of every planned target, and only then executes the plan in
//! order. The first failing target stops the run; targets that already ran
//! keep their side effects.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::graph::errors::{GraphError, MissingParameter};
use crate::graph::parameter::Parameters;
use crate::graph::plan::{resolve, ExecutionPlan};
use crate::graph::target::Target;

/// Final state of a target in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Succeeded,
    Failed,
    NotRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    pub name: String,
    pub status: TargetStatus,
    pub duration: Duration,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub plan: ExecutionPlan,
    pub outcomes: Vec<TargetOutcome>,
}

impl ExecutionReport {
    pub fn executed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == TargetStatus::Succeeded)
            .map(|o| o.name.as_str())
            .collect()
    }
}

/// Receives progress while a plan executes.
pub trait RunObserver {
    fn target_started(&mut self, _name: &str, _position: usize, _total: usize) {}

    fn target_finished(&mut self, _outcome: &TargetOutcome) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// A declared set of targets.
pub struct TargetGraph<C> {
    targets: Vec<Target<C>>,
    index: HashMap<String, usize>,
    default: Option<String>,
}

impl<C> Default for TargetGraph<C> {
    fn default() -> Self {
        TargetGraph {
            targets: Vec::new(),
            index: HashMap::new(),
            default: None,
        }
    }
}

impl<C: AsRef<Parameters>> TargetGraph<C> {
    pub fn new() -> Self {
        TargetGraph::default()
    }

    /// Declare a target. Declaration order breaks ordering ties.
    pub fn add(&mut self, target: Target<C>) -> Result<&mut Self, GraphError> {
        if self.index.contains_key(target.name()) {
            return Err(GraphError::DuplicateTarget {
                name: target.name().to_string(),
            });
        }
        self.index.insert(target.name().to_string(), self.targets.len());
        self.targets.push(target);
        Ok(self)
    }

    /// Target run when none is requested.
    pub fn set_default(&mut self, name: &str) {
        self.default = Some(name.to_string());
    }

    pub fn default_target(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&Target<C>> {
        self.index.get(name).map(|&i| &self.targets[i])
    }

    /// Targets shown to users, in declaration order.
    pub fn listed(&self) -> impl Iterator<Item = &Target<C>> {
        self.targets.iter().filter(|t| !t.is_unlisted())
    }

    /// Resolve requested targets (or the default) into an execution plan.
    pub fn plan(&self, requested: &[String]) -> Result<ExecutionPlan, GraphError> {
        let requested: Vec<String> = if requested.is_empty() {
            vec![self.default.clone().ok_or(GraphError::NoTarget)?]
        } else {
            requested.to_vec()
        };
        resolve(&self.targets, &self.index, &requested)
    }

    /// Check global and per-target parameter requirements of a plan.
    ///
    /// Reports every unmet requirement at once.
    pub fn validate(&self, plan: &ExecutionPlan, params: &Parameters) -> Result<(), GraphError> {
        let mut missing: Vec<MissingParameter> = params
            .missing_required()
            .into_iter()
            .map(|name| MissingParameter {
                target: "*".to_string(),
                parameters: vec![name],
            })
            .collect();

        for name in &plan.order {
            let target = &self.targets[self.index[name]];
            for requirement in target.get_requires() {
                if !requirement.alternatives().iter().any(|p| params.is_set(p)) {
                    missing.push(MissingParameter {
                        target: name.clone(),
                        parameters: requirement.alternatives().to_vec(),
                    });
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(GraphError::MissingParameters { missing })
        }
    }

    /// Plan, validate, then execute.
    pub fn run(
        &self,
        requested: &[String],
        ctx: &C,
        observer: &mut dyn RunObserver,
    ) -> Result<ExecutionReport, GraphError> {
        let plan = self.plan(requested)?;
        self.validate(&plan, ctx.as_ref())?;
        tracing::debug!("execution plan: {}", plan.order.join(" -> "));

        let total = plan.len();
        let mut outcomes: Vec<TargetOutcome> = Vec::with_capacity(total);

        for (position, name) in plan.order.iter().enumerate() {
            let target = &self.targets[self.index[name]];
            observer.target_started(name, position, total);
            tracing::info!("target `{}` started", name);

            let start = Instant::now();
            let result = match target.action() {
                Some(action) => action(ctx),
                None => Ok(()),
            };
            let duration = start.elapsed();

            match result {
                Ok(()) => {
                    tracing::info!("target `{}` finished in {:.2?}", name, duration);
                    let outcome = TargetOutcome {
                        name: name.clone(),
                        status: TargetStatus::Succeeded,
                        duration,
                    };
                    observer.target_finished(&outcome);
                    outcomes.push(outcome);
                }
                Err(source) => {
                    tracing::error!("target `{}` failed: {:#}", name, source);
                    observer.target_finished(&TargetOutcome {
                        name: name.clone(),
                        status: TargetStatus::Failed,
                        duration,
                    });
                    for skipped in &plan.order[position + 1..] {
                        observer.target_finished(&TargetOutcome {
                            name: skipped.clone(),
                            status: TargetStatus::NotRun,
                            duration: Duration::ZERO,
                        });
                    }
                    return Err(GraphError::TargetFailed {
                        target: name.clone(),
                        completed: outcomes.into_iter().map(|o| o.name).collect(),
                        source,
                    });
                }
            }
        }

        Ok(ExecutionReport { plan, outcomes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::graph::parameter::{ParameterDef, ParameterValue};

    /// Run context recording which actions ran.
    struct Ctx {
        params: Parameters,
        log: RefCell<Vec<String>>,
    }

    impl AsRef<Parameters> for Ctx {
        fn as_ref(&self) -> &Parameters {
            &self.params
        }
    }

    fn ctx(triplets: &[&str]) -> Ctx {
        let mut params = Parameters::with_defs([
            ParameterDef::list("triplets"),
            ParameterDef::string("feature"),
            ParameterDef::string("package-version"),
        ]);
        if !triplets.is_empty() {
            params
                .set(
                    "triplets",
                    ParameterValue::List(triplets.iter().map(|s| s.to_string()).collect()),
                )
                .unwrap();
        }
        Ctx {
            params,
            log: RefCell::new(Vec::new()),
        }
    }

    fn recording(name: &str) -> Target<Ctx> {
        let owned = name.to_string();
        Target::new(name).executes(move |ctx: &Ctx| {
            ctx.log.borrow_mut().push(owned.clone());
            Ok(())
        })
    }

    fn graph() -> TargetGraph<Ctx> {
        let mut g = TargetGraph::new();
        g.add(recording("clean")).unwrap();
        g.add(recording("setup").unlisted()).unwrap();
        g.add(
            recording("build")
                .after("clean")
                .depends_on("setup")
                .requires("triplets")
                .requires_any(&["feature", "package-version"]),
        )
        .unwrap();
        g.add(recording("pack").after("clean").depends_on("build")).unwrap();
        g.set_default("pack");
        g
    }

    #[derive(Default)]
    struct Events(Vec<(String, TargetStatus)>);

    impl RunObserver for Events {
        fn target_finished(&mut self, outcome: &TargetOutcome) {
            self.0.push((outcome.name.clone(), outcome.status));
        }
    }

    #[test]
    fn test_default_target_runs_dependencies_once_in_order() {
        let g = graph();
        let mut c = ctx(&["x64-linux"]);
        c.params
            .set("feature", ParameterValue::String("full".into()))
            .unwrap();

        let report = g.run(&[], &c, &mut NoopObserver).unwrap();
        assert_eq!(*c.log.borrow(), vec!["setup", "build", "pack"]);
        assert_eq!(report.executed(), vec!["setup", "build", "pack"]);
        assert_eq!(report.plan.requested, vec!["pack"]);
    }

    #[test]
    fn test_missing_parameters_fail_before_any_action() {
        let g = graph();
        let c = ctx(&[]);

        let err = g
            .run(&["clean".to_string(), "pack".to_string()], &c, &mut NoopObserver)
            .unwrap_err();
        assert!(c.log.borrow().is_empty());
        match err {
            GraphError::MissingParameters { missing } => {
                assert_eq!(missing.len(), 2);
                assert_eq!(missing[0].target, "build");
                assert_eq!(missing[0].parameters, vec!["triplets"]);
                assert_eq!(missing[1].parameters, vec!["feature", "package-version"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_any_of_requirement() {
        let g = graph();
        let mut c = ctx(&["x64-linux"]);
        c.params
            .set("package-version", ParameterValue::String("1.0.0".into()))
            .unwrap();
        assert!(g.run(&["build".to_string()], &c, &mut NoopObserver).is_ok());
    }

    #[test]
    fn test_globally_required_parameter() {
        let mut g = graph();
        g.add(recording("noop")).unwrap();
        let mut c = ctx(&[]);
        c.params.define(ParameterDef::string("root").required());

        let err = g.run(&["noop".to_string()], &c, &mut NoopObserver).unwrap_err();
        assert!(matches!(err, GraphError::MissingParameters { .. }));
        assert!(c.log.borrow().is_empty());
    }

    #[test]
    fn test_failure_stops_run_and_keeps_completed_work() {
        let mut g: TargetGraph<Ctx> = TargetGraph::new();
        g.add(recording("first")).unwrap();
        g.add(
            Target::new("broken")
                .depends_on("first")
                .executes(|_: &Ctx| anyhow::bail!("tool exited with 1")),
        )
        .unwrap();
        g.add(recording("last").depends_on("broken")).unwrap();

        let c = ctx(&[]);
        let mut events = Events::default();
        let err = g.run(&["last".to_string()], &c, &mut events).unwrap_err();

        assert_eq!(*c.log.borrow(), vec!["first"]);
        match &err {
            GraphError::TargetFailed { target, completed, source } => {
                assert_eq!(target, "broken");
                assert_eq!(completed, &vec!["first".to_string()]);
                assert_eq!(source.to_string(), "tool exited with 1");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            events.0,
            vec![
                ("first".to_string(), TargetStatus::Succeeded),
                ("broken".to_string(), TargetStatus::Failed),
                ("last".to_string(), TargetStatus::NotRun),
            ]
        );
    }

    #[test]
    fn test_duplicate_and_listing() {
        let mut g = graph();
        assert!(matches!(
            g.add(recording("clean")),
            Err(GraphError::DuplicateTarget { .. })
        ));
        let listed: Vec<&str> = g.listed().map(|t| t.name()).collect();
        assert_eq!(listed, vec!["clean", "build", "pack"]);
        // Unlisted targets are still runnable directly.
        let c = ctx(&[]);
        g.run(&["setup".to_string()], &c, &mut NoopObserver).unwrap();
        assert_eq!(*c.log.borrow(), vec!["setup"]);
    }

    #[test]
    fn test_no_default_target() {
        let g: TargetGraph<Ctx> = TargetGraph::new();
        assert!(matches!(g.plan(&[]), Err(GraphError::NoTarget)));
    }
}
