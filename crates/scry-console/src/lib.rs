// scry-console -- the embeddable driver.
//
// Owns the pipeline end to end: one registry snapshot, the background
// catalog build, per-submission execution, and the suggestion worker.
// The host calls `tick` from its update loop and `execute` when the user
// submits a line; everything interactive stays on the host's thread.

use std::sync::Arc;

use scry_catalog::{spawn_build, BuildPoll, Catalog, CatalogBuild};
use scry_common::error::{ConsoleError, ResolutionError};
use scry_common::settings::Settings;
use scry_common::value::{prim, TyRef, Value};
use scry_common::vars::VarTable;
use scry_eval::{Evaluator, ForbiddenFn};
use scry_parser::parse;
use scry_registry::{GlobalFn, Param, Registry};
use scry_resolve::{Binder, Scope};
use scry_suggest::{suggest, Delivered, SuggestContext, SuggestWorker, Suggestions};

/// Result of submitting one command line.
#[derive(Debug)]
pub enum ExecOutcome {
    /// The type catalog is still building; nothing was attempted.
    NotReady,
    /// Ran to completion. The value of the last statement; `Void` when
    /// the line ends in an assignment or a void call.
    Value(Value),
    /// Stopped on the first error. At most one is reported per line.
    Failed(ConsoleError),
}

enum CatalogState {
    Building(CatalogBuild),
    Ready(Arc<Catalog>),
}

pub struct Console {
    registry: Arc<Registry>,
    settings: Settings,
    globals: Arc<Vec<GlobalFn>>,
    forbidden: Option<Box<ForbiddenFn>>,
    continue_on_error: bool,
    catalog: CatalogState,
    vars: VarTable,
    suggest_worker: SuggestWorker,
}

impl Console {
    /// Start a console over a host registry. The catalog build begins
    /// immediately; `execute` reports [`ExecOutcome::NotReady`] until a
    /// `tick` observes it finishing.
    pub fn new(registry: Arc<Registry>, settings: Settings) -> Self {
        Self::with_globals(registry, settings, Vec::new())
    }

    /// Like [`Console::new`], with host-supplied global functions on top
    /// of the built-ins.
    pub fn with_globals(
        registry: Arc<Registry>,
        settings: Settings,
        extra: Vec<GlobalFn>,
    ) -> Self {
        let mut globals = builtin_globals(&registry);
        globals.extend(extra);
        let catalog =
            CatalogState::Building(spawn_build(registry.clone(), settings.clone()));
        Self {
            registry,
            settings,
            globals: Arc::new(globals),
            forbidden: None,
            continue_on_error: false,
            catalog,
            vars: VarTable::new(),
            suggest_worker: SuggestWorker::new(),
        }
    }

    /// Install a host predicate over produced values. Any non-void value
    /// it matches is replaced with null before the command sees it.
    pub fn forbid_values<F>(&mut self, predicate: F)
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.forbidden = Some(Box::new(predicate));
    }

    /// Keep running later statements after one fails. Off by default.
    pub fn continue_on_error(&mut self, yes: bool) {
        self.continue_on_error = yes;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render a value with the registry's display hooks.
    pub fn display(&self, value: &Value) -> String {
        self.registry.display(value)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.catalog, CatalogState::Ready(_))
    }

    /// Poll the background catalog build. Call once per host update.
    pub fn tick(&mut self) {
        if let CatalogState::Building(build) = &mut self.catalog {
            match build.poll() {
                BuildPoll::Pending => {}
                BuildPoll::Ready(catalog) => {
                    tracing::info!(types = catalog.type_count(), "type catalog ready");
                    self.catalog = CatalogState::Ready(catalog);
                }
                BuildPoll::Cancelled => {
                    tracing::warn!("catalog build went away, restarting");
                    self.catalog = CatalogState::Building(spawn_build(
                        self.registry.clone(),
                        self.settings.clone(),
                    ));
                }
            }
        }
    }

    /// Apply new settings. The current catalog (built or building) is
    /// discarded and a fresh build starts; the console reports not ready
    /// until it lands.
    pub fn reload(&mut self, settings: Settings) {
        if let CatalogState::Building(build) = &self.catalog {
            build.cancel();
        }
        tracing::info!(safe_mode = settings.safe_mode, "settings changed, rebuilding catalog");
        self.settings = settings;
        self.catalog = CatalogState::Building(spawn_build(
            self.registry.clone(),
            self.settings.clone(),
        ));
    }

    /// Run one submitted line: lex, build, bind, evaluate. Variable
    /// bindings never survive a submission.
    pub fn execute(&mut self, line: &str) -> ExecOutcome {
        let CatalogState::Ready(catalog) = &self.catalog else {
            return ExecOutcome::NotReady;
        };
        let catalog = catalog.clone();
        self.vars.clear();
        if line.trim().is_empty() {
            return ExecOutcome::Failed(ResolutionError::EmptyInput.into());
        }
        let parsed = parse(line);
        if let Some(error) = parsed.first_error() {
            tracing::debug!(%error, "rejecting line at parse");
            return ExecOutcome::Failed(error);
        }
        let binder = Binder::new(
            &self.registry,
            &catalog,
            &self.settings.using_namespaces,
            self.settings.safe_mode,
            &self.globals,
        );
        let mut scope = Scope::new();
        let bound = match binder.bind_command(&parsed.command, &mut scope) {
            Ok(bound) => bound,
            Err(error) => {
                tracing::debug!(%error, "rejecting line at binding");
                return ExecOutcome::Failed(error.into());
            }
        };
        let mut evaluator = Evaluator::new(
            &self.registry,
            &self.globals,
            &mut self.vars,
            self.forbidden.as_deref(),
        );
        let outcome = evaluator.eval_command(&bound, self.continue_on_error);
        match outcome.error {
            Some(error) => ExecOutcome::Failed(error.into()),
            None => ExecOutcome::Value(outcome.value.unwrap_or(Value::Void)),
        }
    }

    fn suggest_context(&self) -> Option<SuggestContext> {
        let CatalogState::Ready(catalog) = &self.catalog else {
            return None;
        };
        Some(SuggestContext {
            registry: self.registry.clone(),
            catalog: catalog.clone(),
            usings: self.settings.using_namespaces.clone(),
            safe_mode: self.settings.safe_mode,
            globals: self.globals.clone(),
            scope: Scope::from_table(&self.vars),
        })
    }

    /// Compute suggestions on the calling thread. `None` while the
    /// catalog is building.
    pub fn suggest_now(&self, input: &str, cursor: usize) -> Option<Suggestions> {
        Some(suggest(&self.suggest_context()?, input, cursor))
    }

    /// Hand a suggestion request to the background worker. Refused (and
    /// `false`) while the catalog is building or a request is in flight.
    pub fn request_suggestions(&mut self, input: &str, cursor: usize) -> bool {
        let Some(ctx) = self.suggest_context() else {
            return false;
        };
        self.suggest_worker.request(ctx, input, cursor)
    }

    /// Collect a finished background suggestion build, if one landed.
    /// The delivery echoes its request so stale results can be dropped.
    pub fn poll_suggestions(&mut self) -> Option<Delivered> {
        self.suggest_worker.poll()
    }
}

/// Globals every console carries: `typeof` and `display`, both closing
/// over the registry snapshot.
fn builtin_globals(registry: &Arc<Registry>) -> Vec<GlobalFn> {
    let object = TyRef::Named(prim::OBJECT);
    let string = TyRef::Named(prim::STRING);
    let for_typeof = registry.clone();
    let for_display = registry.clone();
    vec![
        GlobalFn {
            name: "typeof".to_string(),
            params: vec![Param::new("value", object)],
            ret: Some(string),
            invoke: Arc::new(move |_, args| {
                let name = match for_typeof.type_of(&args[0]) {
                    Some(ty) => for_typeof.ty_name(&ty),
                    None if args[0].is_null() => "null".to_string(),
                    None => "void".to_string(),
                };
                Ok(Value::Str(name))
            }),
        },
        GlobalFn {
            name: "display".to_string(),
            params: vec![Param::new("value", object)],
            ret: Some(string),
            invoke: Arc::new(move |_, args| Ok(Value::Str(for_display.display(&args[0])))),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    use scry_registry::demo::build_demo;

    fn settings(safe_mode: bool) -> Settings {
        Settings {
            safe_mode,
            using_namespaces: vec!["Demo".to_string(), "Game".to_string()],
            ..Settings::default()
        }
    }

    fn wait_ready(console: &mut Console) {
        for _ in 0..500 {
            console.tick();
            if console.is_ready() {
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("catalog build did not finish in time");
    }

    fn console() -> Console {
        let demo = build_demo();
        let mut console = Console::new(Arc::new(demo.registry), settings(true));
        wait_ready(&mut console);
        console
    }

    fn value(outcome: ExecOutcome) -> Value {
        match outcome {
            ExecOutcome::Value(v) => v,
            other => panic!("expected a value, got {other:?}"),
        }
    }

    #[test]
    fn not_ready_until_ticked() {
        let demo = build_demo();
        let mut console = Console::new(Arc::new(demo.registry), settings(true));
        assert!(matches!(console.execute("Math.Pi"), ExecOutcome::NotReady));
        assert!(console.suggest_now("Math.", 5).is_none());
        wait_ready(&mut console);
        assert!(matches!(console.execute("Math.Pi"), ExecOutcome::Value(_)));
    }

    #[test]
    fn executes_a_full_pipeline_line() {
        let mut console = console();
        assert_eq!(value(console.execute("Math.Clamp(15, 0, 10)")), Value::I64(10));
    }

    #[test]
    fn empty_lines_are_rejected() {
        let mut console = console();
        match console.execute("   ") {
            ExecOutcome::Failed(ConsoleError::Resolution(ResolutionError::EmptyInput)) => {}
            other => panic!("expected EmptyInput, got {other:?}"),
        }
    }

    #[test]
    fn variables_do_not_survive_submissions() {
        let mut console = console();
        assert_eq!(value(console.execute("$x = 5; $x")), Value::I32(5));
        match console.execute("$x") {
            ExecOutcome::Failed(ConsoleError::Resolution(
                ResolutionError::UnknownVariable(name),
            )) => assert_eq!(name, "x"),
            other => panic!("expected UnknownVariable, got {other:?}"),
        }
    }

    #[test]
    fn builtin_globals_answer() {
        let mut console = console();
        assert_eq!(value(console.execute("typeof(Math.Pi)")), Value::Str("double".to_string()));
        assert_eq!(value(console.execute("typeof(null)")), Value::Str("null".to_string()));
    }

    #[test]
    fn forbidden_values_read_as_null() {
        let mut console = console();
        console.forbid_values(|v| matches!(v, Value::Object(_, _)));
        assert_eq!(value(console.execute("Player(\"ada\")")), Value::Null);
    }

    #[test]
    fn reload_rebuilds_the_catalog_with_new_settings() {
        let mut console = console();
        assert!(matches!(console.execute("Secret.Token"), ExecOutcome::Failed(_)));
        console.reload(settings(false));
        assert!(matches!(console.execute("Secret.Token"), ExecOutcome::NotReady));
        wait_ready(&mut console);
        assert_eq!(
            value(console.execute("Secret.Token")),
            Value::Str("hunter2".to_string())
        );
    }

    #[test]
    fn synchronous_suggestions() {
        let console = console();
        let s = console.suggest_now("Game.Pl", 7).expect("catalog is ready");
        assert!(s.candidates.iter().any(|c| c.display == "Player"));
    }

    #[test]
    fn background_suggestions_round_trip() {
        let mut console = console();
        assert!(console.request_suggestions("Math.Cl", 7));
        for _ in 0..500 {
            if let Some(delivered) = console.poll_suggestions() {
                assert_eq!(delivered.input, "Math.Cl");
                assert!(delivered
                    .suggestions
                    .candidates
                    .iter()
                    .any(|c| c.display == "Clamp"));
                return;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("suggestion build did not land in time");
    }
}
