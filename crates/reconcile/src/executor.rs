//! Apply executor - converges Homebrew to the declared collections
//!
//! A run is a fixed, linear sequence of stages:
//!
//! 1. init the state provider and disable transitive resolution
//! 2. uninstall obsolete formulae, then obsolete casks
//! 3. `brew update`, then `brew upgrade`
//! 4. install incoming formulae, then incoming casks
//!
//! Both obsolete sets are computed before anything changes. Incoming sets
//! are computed only after the update stages, so new packages land in an
//! up-to-date installation. Every invocation runs to completion before the
//! next one starts, and the first failure ends the run.

use crate::collection::DependencyCollection;
use crate::error::{Error, Result};
use crate::events::{Event, EventSink};
use crate::planner::{self, IncomingPlan, ObsoletePlan};
use crate::provider::StateProvider;
use crate::types::{ApplySummary, Change, Stage};
use brewkit::{Category, CommandBuilder, Operation, Runner};

/// Runs the apply sequence against one Homebrew installation
pub struct Executor<R, P, S> {
    builder: CommandBuilder,
    runner: R,
    provider: P,
    sink: S,
}

impl<R, P, S> Executor<R, P, S>
where
    R: Runner,
    P: StateProvider,
    S: EventSink,
{
    pub fn new(builder: CommandBuilder, runner: R, provider: P, sink: S) -> Self {
        Self {
            builder,
            runner,
            provider,
            sink,
        }
    }

    /// Converge installed packages to the declared collections
    ///
    /// Both collections have transitive resolution switched off. On error
    /// the work already done stays done and recorded; running again picks up
    /// from the current record.
    pub fn apply(
        &mut self,
        formulae: &mut DependencyCollection,
        casks: &mut DependencyCollection,
    ) -> Result<ApplySummary> {
        expect_category(formulae, Category::Formula)?;
        expect_category(casks, Category::Cask)?;

        let mut summary = ApplySummary::default();

        self.sink.emit(&Event::StageStarted(Stage::Init));
        self.provider
            .init()
            .map_err(|e| e.at(Stage::Init, None, None))?;
        formulae.set_transitive(false);
        casks.set_transitive(false);

        let collections = [&*formulae, &*casks];

        let mut obsolete = Vec::with_capacity(collections.len());
        for collection in collections {
            let category = collection.category();
            let plan = planner::obsolete(&self.provider, collection)
                .map_err(|e| e.at(Stage::uninstall(category), Some(category), None))?;
            obsolete.push(plan);
        }

        for (plan, collection) in obsolete.iter().zip(collections) {
            self.uninstall(plan, collection.label(), &mut summary)?;
        }

        self.shared(Stage::UpdateSelf, &Operation::UpdateSelf)?;
        summary.updated = true;
        self.shared(Stage::UpgradeAll, &Operation::UpgradeAll)?;
        summary.upgraded = true;

        for collection in collections {
            let category = collection.category();
            let plan = planner::incoming(&self.provider, collection)
                .map_err(|e| e.at(Stage::install(category), Some(category), None))?;
            self.install(&plan, collection.label(), &mut summary)?;
        }

        self.sink.emit(&Event::StageStarted(Stage::Done));
        self.sink.emit(&Event::Finished(&summary));
        Ok(summary)
    }

    fn uninstall(
        &mut self,
        plan: &ObsoletePlan,
        label: &str,
        summary: &mut ApplySummary,
    ) -> Result<()> {
        let category = plan.category;
        let stage = Stage::uninstall(category);
        if plan.is_empty() {
            self.sink.emit(&Event::StageSkipped(stage));
            return Ok(());
        }

        self.sink.emit(&Event::StageStarted(stage));
        for record in &plan.records {
            let operation = Operation::uninstall_record(record)
                .map_err(|e| Error::from(e).at(stage, Some(category), Some(record.as_str())))?;
            self.invoke(stage, Some(category), &operation)?;

            let name = operation.package().unwrap_or(record.as_str());
            self.persist(stage, category, name, |p| p.record_removed(label, record))?;
            summary.removed.push(Change::new(category, name));
        }
        Ok(())
    }

    fn install(
        &mut self,
        plan: &IncomingPlan,
        label: &str,
        summary: &mut ApplySummary,
    ) -> Result<()> {
        let category = plan.category;
        let stage = Stage::install(category);
        if plan.is_empty() {
            self.sink.emit(&Event::StageSkipped(stage));
            return Ok(());
        }

        self.sink.emit(&Event::StageStarted(stage));
        for dependency in &plan.dependencies {
            self.invoke(stage, Some(category), &Operation::install(dependency))?;
            self.persist(stage, category, &dependency.name, |p| {
                p.record_installed(label, dependency)
            })?;
            summary.installed.push(Change::new(category, &dependency.name));
        }
        Ok(())
    }

    /// Run a category-agnostic stage
    fn shared(&mut self, stage: Stage, operation: &Operation) -> Result<()> {
        self.sink.emit(&Event::StageStarted(stage));
        self.invoke(stage, None, operation)
    }

    fn invoke(
        &mut self,
        stage: Stage,
        category: Option<Category>,
        operation: &Operation,
    ) -> Result<()> {
        // Shared operations have the same shape in every category.
        let invocation = self
            .builder
            .build(operation, category.unwrap_or(Category::Formula));
        let package = operation.package();

        self.sink.emit(&Event::Invoking {
            stage,
            category,
            package,
            invocation: &invocation,
        });
        self.runner
            .run(&invocation)
            .map_err(|e| Error::from(e).at(stage, category, package))?;
        self.sink.emit(&Event::Completed {
            stage,
            category,
            package,
        });
        Ok(())
    }

    fn persist(
        &mut self,
        stage: Stage,
        category: Category,
        package: &str,
        update: impl FnOnce(&mut P) -> Result<()>,
    ) -> Result<()> {
        update(&mut self.provider)
            .and_then(|()| self.provider.flush())
            .map_err(|e| e.at(stage, Some(category), Some(package)))
    }
}

fn expect_category(collection: &DependencyCollection, expected: Category) -> Result<()> {
    if collection.category() != expected {
        return Err(Error::CategoryMismatch {
            label: collection.label().to_string(),
            expected,
            found: collection.category(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoEvents;
    use crate::provider::MemoryProvider;
    use brewkit::{Dependency, Invocation, RecordedId};
    use std::cell::RefCell;
    use std::collections::BTreeSet;

    /// Runner that records argument vectors and optionally fails one of them
    #[derive(Default)]
    struct RecordingRunner {
        calls: RefCell<Vec<String>>,
        fail_on: Option<String>,
    }

    impl RecordingRunner {
        fn failing_on(args: &str) -> Self {
            Self {
                calls: RefCell::default(),
                fail_on: Some(args.to_string()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn position(&self, args: &str) -> usize {
            self.calls()
                .iter()
                .position(|c| c == args)
                .unwrap_or_else(|| panic!("{args} was not invoked"))
        }
    }

    impl Runner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> brewkit::Result<()> {
            let args = invocation.args().join(" ");
            self.calls.borrow_mut().push(args.clone());
            if self.fail_on.as_deref() == Some(args.as_str()) {
                return Err(brewkit::Error::ExitStatus {
                    invocation: invocation.to_string(),
                    code: Some(1),
                });
            }
            Ok(())
        }
    }

    /// Sink that keeps stage transitions
    #[derive(Default)]
    struct StageLog(Vec<String>);

    impl EventSink for StageLog {
        fn emit(&mut self, event: &Event<'_>) {
            match event {
                Event::StageStarted(stage) => self.0.push(format!("start {stage}")),
                Event::StageSkipped(stage) => self.0.push(format!("skip {stage}")),
                _ => {}
            }
        }
    }

    /// Provider whose store cannot be opened
    struct Unreachable;

    impl StateProvider for Unreachable {
        fn init(&mut self) -> Result<()> {
            Err(Error::init("store unreachable"))
        }
        fn recorded(&self, _label: &str) -> Result<BTreeSet<String>> {
            unreachable!("recorded() called before init succeeded")
        }
        fn record_removed(&mut self, _label: &str, _record: &str) -> Result<()> {
            unreachable!()
        }
        fn record_installed(&mut self, _label: &str, _dependency: &Dependency) -> Result<()> {
            unreachable!()
        }
    }

    fn builder() -> CommandBuilder {
        CommandBuilder::new("/opt/homebrew")
    }

    fn formulae(names: &[&str]) -> DependencyCollection {
        DependencyCollection::from_names(Category::Formula, names)
    }

    fn casks(names: &[&str]) -> DependencyCollection {
        DependencyCollection::from_names(Category::Cask, names)
    }

    fn recorded_names(provider: &MemoryProvider, label: &str) -> Vec<String> {
        let mut names: Vec<String> = provider
            .recorded(label)
            .unwrap()
            .iter()
            .map(|r| RecordedId::parse(r).unwrap().name.to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_duplicate_record_versions_uninstall_once() {
        let runner = RecordingRunner::default();
        let mut provider = MemoryProvider::new().with_records("brew", ["brew:git:1", "brew:git:2"]);

        let mut executor = Executor::new(builder(), &runner, &mut provider, NoEvents);
        let summary = executor
            .apply(&mut formulae(&[]), &mut casks(&[]))
            .unwrap();

        assert_eq!(runner.calls(), ["uninstall git", "update", "upgrade"]);
        assert_eq!(summary.removed_in(Category::Formula), ["git"]);
        assert!(provider.recorded("brew").unwrap().is_empty());
    }

    #[test]
    fn test_formula_swap_scenario() {
        let runner = RecordingRunner::default();
        let mut provider =
            MemoryProvider::new().with_records("brew", ["group:git:2.40", "group:curl:8.0"]);

        let mut executor = Executor::new(builder(), &runner, &mut provider, NoEvents);
        let summary = executor
            .apply(&mut formulae(&["git", "wget"]), &mut casks(&[]))
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec!["uninstall curl", "update", "upgrade", "install wget"]
        );
        assert_eq!(summary.removed_in(Category::Formula), vec!["curl"]);
        assert_eq!(summary.installed_in(Category::Formula), vec!["wget"]);
        assert_eq!(recorded_names(&provider, "brew"), vec!["git", "wget"]);
    }

    #[test]
    fn test_cask_removed_when_no_longer_declared() {
        let runner = RecordingRunner::default();
        let mut provider = MemoryProvider::new().with_records("cask", ["group:firefox:128.0"]);

        let mut executor = Executor::new(builder(), &runner, &mut provider, NoEvents);
        executor
            .apply(&mut formulae(&[]), &mut casks(&[]))
            .unwrap();

        assert_eq!(
            runner.calls(),
            vec!["cask uninstall firefox", "update", "upgrade"]
        );
        assert!(provider.recorded("cask").unwrap().is_empty());
    }

    #[test]
    fn test_empty_run_still_updates() {
        let runner = RecordingRunner::default();
        let mut executor = Executor::new(builder(), &runner, MemoryProvider::new(), NoEvents);
        let summary = executor
            .apply(&mut formulae(&[]), &mut casks(&[]))
            .unwrap();

        assert_eq!(runner.calls(), vec!["update", "upgrade"]);
        assert!(summary.is_noop());
        assert!(summary.updated && summary.upgraded);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let runner = RecordingRunner::default();
        let mut provider = MemoryProvider::new().with_records("brew", ["brew:curl:8.0"]);

        for _ in 0..2 {
            let mut executor = Executor::new(builder(), &runner, &mut provider, NoEvents);
            executor
                .apply(&mut formulae(&["git"]), &mut casks(&["firefox"]))
                .unwrap();
        }

        let calls = runner.calls();
        let second = &calls[calls.len() - 2..];
        assert_eq!(second, ["update", "upgrade"]);
        assert_eq!(calls.len(), 5 + 2);
    }

    #[test]
    fn test_recorded_state_equals_declared_after_success() {
        let runner = RecordingRunner::default();
        let mut provider = MemoryProvider::new()
            .with_records("brew", ["brew:curl:8.0", "brew:git:2.40"])
            .with_records("cask", ["cask:slack:4.0"]);

        let mut executor = Executor::new(builder(), &runner, &mut provider, NoEvents);
        executor
            .apply(
                &mut formulae(&["git", "jq", "wget"]),
                &mut casks(&["firefox", "iterm2"]),
            )
            .unwrap();

        assert_eq!(recorded_names(&provider, "brew"), vec!["git", "jq", "wget"]);
        assert_eq!(recorded_names(&provider, "cask"), vec!["firefox", "iterm2"]);
    }

    #[test]
    fn test_stage_ordering() {
        let runner = RecordingRunner::default();
        let mut provider = MemoryProvider::new()
            .with_records("brew", ["brew:curl:8.0", "brew:htop:3.0"])
            .with_records("cask", ["cask:slack:4.0"]);

        let mut executor = Executor::new(builder(), &runner, &mut provider, NoEvents);
        executor
            .apply(&mut formulae(&["wget", "jq"]), &mut casks(&["firefox"]))
            .unwrap();

        let update = runner.position("update");
        let upgrade = runner.position("upgrade");
        for uninstall in ["uninstall curl", "uninstall htop", "cask uninstall slack"] {
            assert!(runner.position(uninstall) < update);
        }
        assert!(update < upgrade);
        for install in ["install wget", "install jq", "cask install firefox"] {
            assert!(runner.position(install) > upgrade);
        }
        // Formula before cask within a stage
        assert!(runner.position("uninstall htop") < runner.position("cask uninstall slack"));
        assert!(runner.position("install wget") < runner.position("cask install firefox"));
    }

    #[test]
    fn test_every_item_processed_once() {
        let runner = RecordingRunner::default();
        let names = ["a", "b", "c", "d", "e"];
        let mut executor = Executor::new(builder(), &runner, MemoryProvider::new(), NoEvents);
        executor
            .apply(&mut formulae(&names), &mut casks(&[]))
            .unwrap();

        for name in names {
            let install = format!("install {name}");
            assert_eq!(runner.calls().iter().filter(|c| **c == install).count(), 1);
        }
    }

    #[test]
    fn test_cask_failure_keeps_completed_formula_work() {
        let runner = RecordingRunner::failing_on("cask install firefox");
        let mut provider = MemoryProvider::new();

        let mut executor = Executor::new(builder(), &runner, &mut provider, NoEvents);
        let err = executor
            .apply(&mut formulae(&["wget"]), &mut casks(&["firefox", "zoom"]))
            .unwrap_err();

        match &err {
            Error::Stage {
                stage,
                category,
                package,
                ..
            } => {
                assert_eq!(*stage, Stage::InstallCask);
                assert_eq!(*category, Some(Category::Cask));
                assert_eq!(package.as_deref(), Some("firefox"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("firefox"));

        // zoom is never attempted
        assert!(!runner.calls().contains(&"cask install zoom".to_string()));
        assert_eq!(recorded_names(&provider, "brew"), vec!["wget"]);
        assert!(provider.recorded("cask").unwrap().is_empty());
    }

    #[test]
    fn test_update_failure_stops_before_install() {
        let runner = RecordingRunner::failing_on("update");
        let mut executor = Executor::new(builder(), &runner, MemoryProvider::new(), NoEvents);
        let err = executor
            .apply(&mut formulae(&["wget"]), &mut casks(&[]))
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::UpdateSelf));
        assert_eq!(runner.calls(), vec!["update"]);
    }

    #[test]
    fn test_malformed_record_fails_uninstall() {
        let runner = RecordingRunner::default();
        let provider = MemoryProvider::new().with_records("brew", ["curl"]);
        let mut executor = Executor::new(builder(), &runner, provider, NoEvents);

        let err = executor
            .apply(&mut formulae(&[]), &mut casks(&[]))
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::UninstallFormula));
        assert!(matches!(
            err.root(),
            Error::Brew(brewkit::Error::MalformedRecord { .. })
        ));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_init_failure_aborts_before_any_invocation() {
        let runner = RecordingRunner::default();
        let mut executor = Executor::new(builder(), &runner, Unreachable, NoEvents);

        let err = executor
            .apply(&mut formulae(&["git"]), &mut casks(&[]))
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Init));
        assert!(matches!(err.root(), Error::ProviderInit { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_transitive_resolution_is_disabled() {
        let runner = RecordingRunner::default();
        let mut declared = DependencyCollection::new(Category::Formula);
        declared.declare("node", None, vec!["icu4c".into()]);
        declared.set_transitive(true);

        let mut executor = Executor::new(builder(), &runner, MemoryProvider::new(), NoEvents);
        executor.apply(&mut declared, &mut casks(&[])).unwrap();

        assert!(!declared.is_transitive());
        assert_eq!(runner.calls(), vec!["update", "upgrade", "install node"]);
    }

    #[test]
    fn test_swapped_collections_are_rejected() {
        let runner = RecordingRunner::default();
        let mut executor = Executor::new(builder(), &runner, MemoryProvider::new(), NoEvents);
        let err = executor
            .apply(&mut casks(&[]), &mut formulae(&[]))
            .unwrap_err();
        assert!(matches!(err, Error::CategoryMismatch { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_stage_events() {
        let runner = RecordingRunner::default();
        let provider = MemoryProvider::new().with_records("brew", ["brew:curl:8.0"]);
        let mut log = StageLog::default();

        let mut executor = Executor::new(builder(), &runner, provider, &mut log);
        executor
            .apply(&mut formulae(&[]), &mut casks(&["firefox"]))
            .unwrap();

        assert_eq!(
            log.0,
            vec![
                "start init",
                "start uninstall-formula",
                "skip uninstall-cask",
                "start update-self",
                "start upgrade-all",
                "skip install-formula",
                "start install-cask",
                "start done",
            ]
        );
    }
}
