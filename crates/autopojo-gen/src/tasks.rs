//! Generation rounds: dispatch, concurrent synthesis, collection.
//!
//! A round turns every dispatched interface into one [`GenerationTask`] and
//! runs all of them on a rayon pool. Failures never cancel siblings; every
//! task is awaited and every failure becomes an [`ErrorReport`] before the
//! round returns.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;

use autopojo_core::config::GeneratorConfig;
use autopojo_core::model::{Declaration, DeclarationKind};
use autopojo_core::repository::DeclarationRepository;
use rayon::prelude::*;
use serde::Serialize;

use crate::emit::Emitter;
use crate::error::GenError;
use crate::names::{NameResolver, ResolvedName};
use crate::render::{RenderOptions, render};
use crate::synth::{ClassSynthesizer, GeneratedClass};

/// Severity of a report. Every report this generator produces is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
        }
    }
}

/// A diagnostic bound to the declaration it originated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Qualified name of the originating declaration.
    pub declaration: String,
    pub severity: Severity,
    pub message: String,
}

impl ErrorReport {
    pub fn new(declaration: &Declaration, error: &GenError) -> Self {
        Self {
            declaration: declaration.qualified_name(),
            severity: Severity::Error,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.declaration, self.message)
    }
}

/// Result of a round, available only after every task has finished.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundReport {
    /// Top-level classes handed to the emitter.
    pub emitted: Vec<ResolvedName>,
    /// Successful results for nested declarations, embedded in a parent.
    pub filtered: Vec<ResolvedName>,
    pub errors: Vec<ErrorReport>,
}

impl RoundReport {
    /// A round succeeds iff it produced no error reports.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Declarations that reached a terminal state.
    pub fn attempted(&self) -> usize {
        self.emitted.len() + self.filtered.len() + self.errors.len()
    }
}

/// One unit of work: generate the class tree for a single interface.
#[derive(Debug, Clone, Copy)]
pub struct GenerationTask<'r> {
    pub declaration: &'r Declaration,
}

/// Terminal state of one task.
enum Outcome {
    Emitted(ResolvedName),
    Filtered(ResolvedName),
    Failed(ErrorReport),
}

/// Runs generation rounds against a read-only repository.
#[derive(Debug)]
pub struct TaskOrchestrator<'r> {
    repo: &'r DeclarationRepository,
    config: GeneratorConfig,
}

impl<'r> TaskOrchestrator<'r> {
    pub fn new(repo: &'r DeclarationRepository, config: GeneratorConfig) -> Self {
        Self { repo, config }
    }

    /// Run a round over every declaration that carries the marker directly.
    pub fn run(&self, emitter: &dyn Emitter) -> RoundReport {
        self.run_round(&self.repo.marked(), emitter)
    }

    /// Run a round over `inputs`, in discovery order.
    pub fn run_round(&self, inputs: &[&'r Declaration], emitter: &dyn Emitter) -> RoundReport {
        let mut report = RoundReport::default();
        let tasks = self.dispatch(inputs, &mut report.errors);
        tracing::info!(
            tasks = tasks.len(),
            rejected = report.errors.len(),
            "dispatched generation round"
        );

        let names = NameResolver::with_suffix(self.repo, self.config.naming.suffix.clone());
        let options = self.render_options();

        let outcomes = self.in_pool(|| {
            let generated: Vec<_> = tasks
                .par_iter()
                .map(|task| {
                    let result = ClassSynthesizer::new(&names).synthesize(task.declaration);
                    (task, result)
                })
                .collect();

            let (to_emit, mut outcomes) = claim_names(generated);

            let emitted: Vec<Outcome> = to_emit
                .into_par_iter()
                .map(|(task, class)| match emitter.emit(&render(&class, &options)) {
                    Ok(()) => Outcome::Emitted(class.name),
                    Err(err) => {
                        Outcome::Failed(ErrorReport::new(task.declaration, &GenError::from(err)))
                    }
                })
                .collect();
            outcomes.extend(emitted);
            outcomes
        });

        for outcome in outcomes {
            match outcome {
                Outcome::Emitted(name) => report.emitted.push(name),
                Outcome::Filtered(name) => report.filtered.push(name),
                Outcome::Failed(error) => report.errors.push(error),
            }
        }

        for error in &report.errors {
            tracing::warn!(declaration = %error.declaration, "{}", error.message);
        }
        tracing::info!(
            emitted = report.emitted.len(),
            filtered = report.filtered.len(),
            errors = report.errors.len(),
            "generation round complete"
        );
        report
    }

    /// Classify `inputs`: interfaces become tasks, marker groups expand to their
    /// members, anything else is reported. Each declaration is dispatched once.
    fn dispatch(
        &self,
        inputs: &[&'r Declaration],
        errors: &mut Vec<ErrorReport>,
    ) -> Vec<GenerationTask<'r>> {
        let mut tasks = Vec::new();
        let mut seen = HashSet::new();
        self.dispatch_into(inputs, &mut seen, &mut tasks, errors);
        tasks
    }

    fn dispatch_into(
        &self,
        inputs: &[&'r Declaration],
        seen: &mut HashSet<String>,
        tasks: &mut Vec<GenerationTask<'r>>,
        errors: &mut Vec<ErrorReport>,
    ) {
        for &decl in inputs {
            let qualified = decl.qualified_name();
            if !seen.insert(qualified.clone()) {
                continue;
            }
            match decl.kind {
                DeclarationKind::Interface => {
                    tracing::debug!(declaration = %qualified, "dispatched task");
                    tasks.push(GenerationTask { declaration: decl });
                }
                DeclarationKind::MarkerGroup => {
                    let members: Vec<&'r Declaration> =
                        self.repo.annotated_with(&qualified).collect();
                    self.dispatch_into(&members, seen, tasks, errors);
                }
                DeclarationKind::Other => {
                    errors.push(ErrorReport::new(decl, &GenError::NotAnInterface));
                }
            }
        }
    }

    fn render_options(&self) -> RenderOptions {
        let mut options = RenderOptions::new(self.config.output.generator_id.clone());
        if self.config.output.emit_date {
            options.date = Some(chrono::Utc::now().to_rfc3339());
        }
        options
    }

    /// Run `op` on a dedicated pool when a thread count is configured.
    fn in_pool<T: Send>(&self, op: impl FnOnce() -> T + Send) -> T {
        let threads = self.config.execution.threads;
        if threads == 0 {
            return op();
        }
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(op),
            Err(err) => {
                tracing::warn!("failed to build a {threads}-thread pool, using the global pool: {err}");
                op()
            }
        }
    }
}

/// Split synthesis results into top-level classes to emit and terminal
/// outcomes. Nested results are filtered; a top-level name already claimed by
/// an earlier task fails that task with [`GenError::NameCollision`].
fn claim_names<'t, 'r>(
    generated: Vec<(&'t GenerationTask<'r>, Result<GeneratedClass, GenError>)>,
) -> (Vec<(&'t GenerationTask<'r>, GeneratedClass)>, Vec<Outcome>) {
    let mut claimed: HashMap<String, String> = HashMap::new();
    let mut to_emit = Vec::new();
    let mut outcomes = Vec::new();

    for (task, result) in generated {
        match result {
            Err(err) => outcomes.push(Outcome::Failed(ErrorReport::new(task.declaration, &err))),
            Ok(class) if !class.is_top_level() => {
                tracing::debug!(generated = %class.name, "nested result embedded in parent");
                outcomes.push(Outcome::Filtered(class.name));
            }
            Ok(class) => match claimed.entry(class.name.qualified()) {
                Entry::Occupied(first) => {
                    let err = GenError::NameCollision {
                        name: first.key().clone(),
                        claimed_by: first.get().clone(),
                    };
                    outcomes.push(Outcome::Failed(ErrorReport::new(task.declaration, &err)));
                }
                Entry::Vacant(slot) => {
                    slot.insert(task.declaration.qualified_name());
                    to_emit.push((task, class));
                }
            },
        }
    }

    (to_emit, outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::MemoryEmitter;
    use autopojo_core::model::Marker;

    fn marked(name: &str) -> Declaration {
        Declaration::interface("pkg", name).with_marker(Marker::default())
    }

    #[test]
    fn test_not_an_interface_is_reported_without_a_task() {
        let class = Declaration::new("pkg", "Entity", DeclarationKind::Other)
            .with_marker(Marker::default());
        let repo = DeclarationRepository::new([class, marked("UserPOJO")]).unwrap();
        let orchestrator = TaskOrchestrator::new(&repo, GeneratorConfig::default());
        let emitter = MemoryEmitter::new();

        let report = orchestrator.run(&emitter);
        assert!(!report.is_success());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].declaration, "pkg.Entity");
        assert_eq!(report.errors[0].message, "not an interface");
        assert_eq!(report.errors[0].severity, Severity::Error);
        assert_eq!(report.emitted.len(), 1);
    }

    #[test]
    fn test_marker_group_expands_members() {
        let group = Declaration::new("pkg", "Model", DeclarationKind::MarkerGroup)
            .with_marker(Marker::default());
        let order = Declaration::interface("pkg", "OrderPOJO").with_annotation("pkg.Model");
        let invoice = Declaration::interface("pkg", "Invoice").with_annotation("pkg.Model");
        let repo = DeclarationRepository::new([group, order, invoice]).unwrap();
        let orchestrator = TaskOrchestrator::new(&repo, GeneratorConfig::default());
        let emitter = MemoryEmitter::new();

        let report = orchestrator.run(&emitter);
        assert!(report.is_success(), "{:?}", report.errors);
        let mut emitted: Vec<_> = report.emitted.iter().map(ResolvedName::qualified).collect();
        emitted.sort();
        assert_eq!(emitted, vec!["pkg.InvoicePOJO", "pkg.Order"]);
    }

    #[test]
    fn test_group_of_groups_carries_marker() {
        let outer = Declaration::new("pkg", "Outer", DeclarationKind::MarkerGroup)
            .with_marker(Marker::default());
        let inner =
            Declaration::new("pkg", "Inner", DeclarationKind::MarkerGroup).with_annotation("pkg.Outer");
        let item = Declaration::interface("pkg", "XPOJO").with_annotation("pkg.Inner");
        let repo = DeclarationRepository::new([outer, inner, item]).unwrap();
        let orchestrator = TaskOrchestrator::new(&repo, GeneratorConfig::default());
        let emitter = MemoryEmitter::new();

        let report = orchestrator.run(&emitter);
        assert!(report.is_success(), "{:?}", report.errors);
        assert_eq!(report.emitted.len(), 1);
        assert_eq!(report.emitted[0].qualified(), "pkg.X");
        assert!(emitter.get("pkg.X").is_some());
    }

    #[test]
    fn test_self_annotated_group_terminates() {
        let group = Declaration::new("pkg", "Model", DeclarationKind::MarkerGroup)
            .with_marker(Marker::default())
            .with_annotation("pkg.Model");
        let repo = DeclarationRepository::new([group]).unwrap();
        let orchestrator = TaskOrchestrator::new(&repo, GeneratorConfig::default());

        let report = orchestrator.run(&MemoryEmitter::new());
        assert!(report.is_success());
        assert_eq!(report.attempted(), 0);
    }

    #[test]
    fn test_declaration_dispatched_once() {
        let group = Declaration::new("pkg", "Model", DeclarationKind::MarkerGroup)
            .with_marker(Marker::default());
        let user = marked("UserPOJO").with_annotation("pkg.Model");
        let repo = DeclarationRepository::new([group, user]).unwrap();
        let orchestrator = TaskOrchestrator::new(&repo, GeneratorConfig::default());
        let emitter = MemoryEmitter::new();

        let report = orchestrator.run(&emitter);
        assert!(report.is_success());
        assert_eq!(report.emitted.len(), 1);
        assert_eq!(emitter.units().len(), 1);
    }

    #[test]
    fn test_name_collision_rejects_later_claimant() {
        let first = marked("UserPOJO");
        let second = Declaration::interface("pkg", "Person").with_marker(Marker::named("User"));
        let repo = DeclarationRepository::new([first, second]).unwrap();
        let orchestrator = TaskOrchestrator::new(&repo, GeneratorConfig::default());
        let emitter = MemoryEmitter::new();

        let report = orchestrator.run(&emitter);
        assert_eq!(report.emitted.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].declaration, "pkg.Person");
        assert!(report.errors[0].message.contains("pkg.UserPOJO"));
        assert_eq!(emitter.units()[0].name.qualified(), "pkg.User");
    }

    #[test]
    fn test_configured_pool_and_date() {
        let repo = DeclarationRepository::new([marked("UserPOJO"), marked("OrderPOJO")]).unwrap();
        let mut config = GeneratorConfig::default();
        config.execution.threads = 2;
        config.output.emit_date = true;
        config.output.generator_id = "test-gen".to_string();
        let orchestrator = TaskOrchestrator::new(&repo, config);
        let emitter = MemoryEmitter::new();

        let report = orchestrator.run(&emitter);
        assert!(report.is_success());
        let unit = emitter.get("pkg.User").unwrap();
        assert!(unit.source.contains("@javax.annotation.Generated(value = \"test-gen\", date = "));
    }

    #[test]
    fn test_error_report_display() {
        let decl = Declaration::interface("pkg", "Plain");
        let report = ErrorReport::new(&decl, &GenError::MissingMarker("pkg.Plain".into()));
        assert_eq!(report.to_string(), "error: pkg.Plain: missing marker on `pkg.Plain`");
    }
}
