use std::{
    convert::Infallible,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, OnceLock,
    },
};

use rstest::rstest;
use wrapp_modules::{
    errors::UnreachedKind,
    graph::{
        edge::{DependencyKey, Edge, EdgeKind},
        node::{ModuleNode, Node, ProviderKind, ProviderNode},
    },
    Arguments, Class, ClassMetadata, DependencyGraph, DynamicModule, FactoryProvider, GraphError,
    GraphMutator, GraphPlugin, Module, ModuleDeclaration, ModuleMetadata, Provider, Resolver, Token,
};

struct ServiceA;
impl Class for ServiceA {
    async fn construct(_: Arguments) -> Result<Self, Infallible> {
        Ok(ServiceA)
    }
}

struct ServiceB;
impl Class for ServiceB {
    fn metadata() -> ClassMetadata {
        ClassMetadata::new().inject::<ServiceA>()
    }

    async fn construct(_: Arguments) -> Result<Self, Infallible> {
        Ok(ServiceB)
    }
}

/// Provides A without exporting it
struct Exporting;
impl Module for Exporting {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new().provider(Provider::class::<ServiceA>())
    }
}

struct Importing;
impl Module for Importing {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .import::<Exporting>()
            .provider(Provider::class::<ServiceB>())
    }
}

struct SameModule;
impl Module for SameModule {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .provider(Provider::class::<ServiceA>())
            .provider(Provider::class::<ServiceB>())
    }
}

struct ExportingA;
impl Module for ExportingA {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .provider(Provider::class::<ServiceA>())
            .export(Token::of::<ServiceA>())
    }
}

struct DirectImport;
impl Module for DirectImport {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .import::<ExportingA>()
            .provider(Provider::class::<ServiceB>())
    }
}

struct ReExporting;
impl Module for ReExporting {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .import::<ExportingA>()
            .export_module::<ExportingA>()
    }
}

struct ReExportRoot;
impl Module for ReExportRoot {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .import::<ReExporting>()
            .provider(Provider::class::<ServiceB>())
    }
}

struct GlobalA;
impl Module for GlobalA {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .provider(Provider::class::<ServiceA>())
            .export(Token::of::<ServiceA>())
            .global()
    }
}

/// Needs A but never imports the module providing it
struct FeatureB;
impl Module for FeatureB {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new().provider(Provider::class::<ServiceB>())
    }
}

struct GlobalRoot;
impl Module for GlobalRoot {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new().import::<FeatureB>().import::<GlobalA>()
    }
}

fn dependency_edge<'a>(graph: &'a DependencyGraph, from: &Token, to: &Token) -> &'a Edge {
    graph
        .get_edge(from)
        .into_iter()
        .find(|edge| edge.as_dependency().is_some() && &edge.target == to)
        .expect("dependency edge exists")
}

fn unreached_errors(graph: &DependencyGraph) -> Vec<&GraphError> {
    graph
        .errors()
        .iter()
        .filter(|error| matches!(error, GraphError::UnreachedDependency { .. }))
        .collect()
}

#[rstest]
#[case::same_module(ModuleDeclaration::of::<SameModule>(), false)]
#[case::imported_export(ModuleDeclaration::of::<DirectImport>(), false)]
#[case::re_export_chain(ModuleDeclaration::of::<ReExportRoot>(), false)]
#[case::global_module(ModuleDeclaration::of::<GlobalRoot>(), false)]
#[case::not_exported(ModuleDeclaration::of::<Importing>(), true)]
#[tokio::test]
async fn dependency_reachability(#[case] root: ModuleDeclaration, #[case] unreached: bool) {
    let graph = DependencyGraph::compile(root).await;

    let edge = dependency_edge(&graph, &Token::of::<ServiceB>(), &Token::of::<ServiceA>());
    assert_eq!(edge.unreached(), unreached);
    assert!(!edge.circular);
    assert_eq!(unreached_errors(&graph).len(), usize::from(unreached));
}

#[tokio::test]
async fn unexported_dependency_reports_one_constructor_error() {
    let graph = DependencyGraph::compile(ModuleDeclaration::of::<Importing>()).await;

    assert_eq!(graph.errors().len(), 1);
    let error = &graph.errors()[0];
    assert_eq!(error.code(), "UNREACHED_DEP_CONSTRUCTOR");
    let GraphError::UnreachedDependency {
        kind,
        provider,
        dependency,
        module,
        key,
    } = error
    else {
        panic!("expected an unreached dependency, got {error:?}");
    };
    assert_eq!(*kind, UnreachedKind::Constructor);
    assert_eq!(*provider, Token::of::<ServiceB>());
    assert_eq!(*dependency, Token::of::<ServiceA>());
    assert_eq!(*module, Token::of::<Importing>());
    assert_eq!(*key, DependencyKey::Index(0));

    assert!(graph.check().is_err());
}

struct OptionalB;
impl Class for OptionalB {
    fn metadata() -> ClassMetadata {
        ClassMetadata::new()
            .inject_optional(Token::of::<ServiceA>())
            .optional_property("fallback", Token::of::<ServiceA>())
    }

    async fn construct(_: Arguments) -> Result<Self, Infallible> {
        Ok(OptionalB)
    }
}

struct OptionalRoot;
impl Module for OptionalRoot {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .import::<Exporting>()
            .provider(Provider::class::<OptionalB>())
    }
}

#[tokio::test]
async fn optional_dependencies_stay_unreached_without_error() {
    let graph = DependencyGraph::compile(ModuleDeclaration::of::<OptionalRoot>()).await;

    assert!(graph.errors().is_empty());
    let edges = graph.get_edge(&Token::of::<OptionalB>());
    let dependencies = edges
        .iter()
        .filter(|edge| edge.as_dependency().is_some())
        .collect::<Vec<_>>();
    assert_eq!(dependencies.len(), 2);
    assert!(dependencies.iter().all(|edge| edge.unreached()));
}

struct PropertyB;
impl Class for PropertyB {
    fn metadata() -> ClassMetadata {
        ClassMetadata::new().property("a", Token::of::<ServiceA>())
    }

    async fn construct(_: Arguments) -> Result<Self, Infallible> {
        Ok(PropertyB)
    }
}

struct FactoryAndPropertyRoot;
impl Module for FactoryAndPropertyRoot {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .import::<Exporting>()
            .provider(Provider::class::<PropertyB>())
            .provider(Provider::use_factory(
                "built",
                FactoryProvider::new(|_| async { Ok::<_, Infallible>(1u8) })
                    .inject("config")
                    .inject(Token::of::<ServiceA>()),
            ))
    }
}

#[tokio::test]
async fn unreached_error_kind_follows_injection_site() {
    let graph = DependencyGraph::compile(ModuleDeclaration::of::<FactoryAndPropertyRoot>()).await;

    let mut codes = graph
        .errors()
        .iter()
        .map(|error| error.code())
        .collect::<Vec<_>>();
    codes.sort();
    assert_eq!(
        codes,
        vec![
            "UNREACHED_DEP_FACTORY",
            "UNREACHED_DEP_FACTORY",
            "UNREACHED_DEP_PROPERTY"
        ]
    );

    let edge = dependency_edge(&graph, &Token::named("built"), &Token::of::<ServiceA>());
    assert_eq!(edge.as_dependency().map(|d| d.key.clone()), Some(DependencyKey::Index(1)));
}

mod cycle {
    use super::*;

    pub struct A;
    impl Module for A {
        fn metadata() -> ModuleMetadata {
            ModuleMetadata::new().import::<B>()
        }
    }

    pub struct B;
    impl Module for B {
        fn metadata() -> ModuleMetadata {
            ModuleMetadata::new().import::<C>()
        }
    }

    pub struct C;
    impl Module for C {
        fn metadata() -> ModuleMetadata {
            ModuleMetadata::new().import::<A>()
        }
    }
}

#[tokio::test]
async fn circular_imports_are_reported_with_labels() {
    let graph = DependencyGraph::compile(ModuleDeclaration::of::<cycle::A>()).await;

    let paths = graph
        .errors()
        .iter()
        .filter_map(|error| match error {
            GraphError::CircularImports { path } => Some(path),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(paths.len(), 1);
    assert_eq!(*paths[0], vec!["A", "B", "C"]);

    // C imports A, the edge runs from the imported A to its importer C
    let closing = graph
        .get_edge(&Token::of::<cycle::A>())
        .into_iter()
        .find(|edge| edge.is_import())
        .expect("import edge of A");
    assert_eq!(closing.target, Token::of::<cycle::C>());
    assert!(closing.circular);
    assert_eq!(graph.modules().count(), 3);
}

struct Left {
    right: Option<Arc<Right>>,
}
impl Class for Left {
    fn metadata() -> ClassMetadata {
        ClassMetadata::new().inject::<Right>()
    }

    async fn construct(args: Arguments) -> Result<Self, wrapp_modules::errors::ArgumentError> {
        Ok(Left {
            right: args.optional(0)?,
        })
    }
}

struct Right;
impl Class for Right {
    fn metadata() -> ClassMetadata {
        ClassMetadata::new().inject::<Left>()
    }

    async fn construct(_: Arguments) -> Result<Self, Infallible> {
        Ok(Right)
    }
}

struct CircularProviders;
impl Module for CircularProviders {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
            .provider(Provider::class::<Left>())
            .provider(Provider::class::<Right>())
    }
}

#[tokio::test]
async fn circular_providers_are_marked_and_skipped() {
    let graph = DependencyGraph::compile(ModuleDeclaration::of::<CircularProviders>()).await;
    let left = Token::of::<Left>();
    let right = Token::of::<Right>();

    assert_eq!(graph.errors().len(), 1);
    let GraphError::CircularProviders { path } = &graph.errors()[0] else {
        panic!("expected a provider cycle");
    };
    assert_eq!(
        *path,
        vec![(left.clone(), right.clone()), (right.clone(), left.clone())]
    );
    assert!(dependency_edge(&graph, &left, &right).circular);
    assert!(dependency_edge(&graph, &right, &left).circular);
    assert!(graph
        .get_edge(&left)
        .into_iter()
        .filter(|edge| edge.kind == EdgeKind::Provider)
        .all(|edge| !edge.circular));

    // The circular edge is never followed, the slot stays empty
    let resolver = Resolver::new(graph);
    let instance = resolver.resolve::<Left>().await.unwrap();
    assert!(instance.right.is_none());
}

struct Feature;
impl Module for Feature {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new().provider(Provider::class::<ServiceB>())
    }
}

struct Shell;
impl Module for Shell {
    fn metadata() -> ModuleMetadata {
        ModuleMetadata::new()
    }
}

#[rstest]
#[case::for_root(DynamicModule::for_root::<Shell>(a_exported()), false)]
#[case::explicit_global(DynamicModule::new::<Shell>(a_exported().global()), false)]
#[case::plain(DynamicModule::new::<Shell>(a_exported()), true)]
#[tokio::test]
async fn dynamic_module_visibility(#[case] dynamic: DynamicModule, #[case] unreached: bool) {
    let root = DynamicModule::new::<Shell>(
        ModuleMetadata::new()
            .import::<Feature>()
            .import_module(dynamic),
    );
    let graph = DependencyGraph::compile(root).await;

    let edge = dependency_edge(&graph, &Token::of::<ServiceB>(), &Token::of::<ServiceA>());
    assert_eq!(edge.unreached(), unreached);
    assert_eq!(graph.modules().filter(|module| module.dynamic).count(), 2);
    assert!(graph.modules().all(|module| module.label == "Shell" || module.label == "Feature"));
}

fn a_exported() -> ModuleMetadata {
    ModuleMetadata::new()
        .provider(Provider::class::<ServiceA>())
        .export(Token::of::<ServiceA>())
}

#[tokio::test]
async fn deferred_module_is_loaded_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let deferred = ModuleDeclaration::deferred(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { ModuleDeclaration::of::<ExportingA>() }
    });

    let nested = DynamicModule::new::<Shell>(
        ModuleMetadata::new()
            .import_module(deferred.clone())
            .provider(Provider::class::<ServiceB>()),
    );
    let root = DynamicModule::new::<Shell>(
        ModuleMetadata::new()
            .import_module(deferred)
            .import_module(nested),
    );
    let graph = DependencyGraph::compile(root).await;

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert!(graph.errors().is_empty());
    assert!(graph.module(&Token::of::<ExportingA>()).is_some());
}

#[tokio::test]
async fn deferred_modules_loading_each_other_are_a_cycle() {
    let first_slot: Arc<OnceLock<ModuleDeclaration>> = Arc::new(OnceLock::new());
    let slot = first_slot.clone();
    let second = ModuleDeclaration::deferred(move || {
        let next = slot.get().cloned();
        async move { next.unwrap_or_else(ModuleDeclaration::of::<ExportingA>) }
    });
    let first = ModuleDeclaration::deferred(move || {
        let next = second.clone();
        async move { next }
    });
    let _ = first_slot.set(first.clone());

    let root = DynamicModule::new::<Shell>(ModuleMetadata::new().import_module(first));
    let graph = DependencyGraph::compile(root).await;

    assert_eq!(graph.errors().len(), 1);
    assert_eq!(graph.errors()[0].code(), "CD_IMPORTS");
    match &graph.errors()[0] {
        GraphError::CircularImports { path } => assert_eq!(path.len(), 2),
        other => panic!("unexpected error {other:?}"),
    }
}

/// Relabels modules, lets every dependency through and adds a value to `Importing`
#[derive(Default)]
struct TestPlugin {
    modules_seen: Arc<AtomicUsize>,
}
impl GraphPlugin for TestPlugin {
    fn on_module_node(&mut self, mut node: ModuleNode) -> ModuleNode {
        node.label = node.label.to_lowercase();
        node
    }

    fn on_dependency_edge(&mut self, mut edge: Edge) -> Edge {
        if let EdgeKind::Dependency(dependency) = &mut edge.kind {
            dependency.unreached = false;
        }
        edge
    }

    fn after_module(&mut self, module: &ModuleNode, graph: &mut GraphMutator<'_>) {
        self.modules_seen.fetch_add(1, Ordering::SeqCst);
        if module.id != Token::of::<Importing>() {
            return;
        }
        let provider = Provider::use_value("plugin", 5u8);
        let added = graph.add_node(Node::Provider(ProviderNode {
            id: provider.token(),
            label: "plugin".to_string(),
            kind: ProviderKind::UseValue,
            scope: provider.scope(),
            module: module.id.clone(),
            provider,
        }));
        assert!(added);
        graph.add_edge(Edge::provider(Token::named("plugin"), module.id.clone()));
    }
}

#[tokio::test]
async fn plugins_rewrite_the_graph() {
    let plugin = TestPlugin::default();
    let modules_seen = plugin.modules_seen.clone();
    let graph = DependencyGraph::builder(ModuleDeclaration::of::<Importing>())
        .plugin(plugin)
        .compile()
        .await;

    assert_eq!(modules_seen.load(Ordering::SeqCst), 2);
    assert!(graph.errors().is_empty());
    assert_eq!(
        graph.module(&Token::of::<Importing>()).map(|m| m.label.as_str()),
        Some("importing")
    );

    let resolver = Resolver::new(graph);
    assert_eq!(*resolver.resolve_provider::<u8>("plugin").await.unwrap(), 5);
    assert!(resolver.resolve::<ServiceB>().await.is_ok());
}

#[tokio::test]
async fn duplicate_provider_keeps_first_declaration() {
    struct First;
    impl Module for First {
        fn metadata() -> ModuleMetadata {
            ModuleMetadata::new()
                .import::<Second>()
                .provider(Provider::use_value("name", "first"))
        }
    }
    struct Second;
    impl Module for Second {
        fn metadata() -> ModuleMetadata {
            ModuleMetadata::new().provider(Provider::use_value("name", "second"))
        }
    }

    let graph = DependencyGraph::compile(ModuleDeclaration::of::<First>()).await;
    let node = graph.provider(&Token::named("name")).expect("provider node");
    assert_eq!(node.module, Token::of::<First>());
    assert_eq!(graph.providers().count(), 1);
}

#[tokio::test]
async fn root_and_lookup_accessors() {
    let graph = DependencyGraph::compile(ModuleDeclaration::of::<DirectImport>()).await;

    assert_eq!(graph.root(), Some(&Token::of::<DirectImport>()));
    assert!(graph.get_node(&Token::of::<ServiceA>()).is_some());
    assert!(graph.get_node(&Token::named("missing")).is_none());
    // 2 modules, 2 providers
    assert_eq!(graph.get_all_nodes().len(), 4);
    // 1 import, 2 ownership, 1 dependency
    assert_eq!(graph.get_all_edges().len(), 4);
    assert!(graph.check().is_ok());
}
