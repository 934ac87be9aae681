use std::collections::{HashMap, HashSet, VecDeque};

use pretty_assertions::assert_eq;
use wrapp_graph::{
    resolve_all, resolve_component, AggregateKind, Binding, CompilerOptions, ComponentDecl,
    Declaration, DeclarationStore, DeclarationsBuilder, DependencyRequest, DiagnosticKind,
    GraphResolution, Key, ModuleDecl, Node, RequestKind, Scope,
};

fn resolve(store: &DeclarationStore, component: &str) -> GraphResolution {
    resolve_component(store, component, &CompilerOptions::default()).unwrap()
}

/// Binding nodes per key, outside multibinding aggregates and their contributions
fn unique_nodes_per_key(resolution: &GraphResolution) -> HashMap<String, Vec<usize>> {
    let mut nodes: HashMap<String, Vec<usize>> = HashMap::new();
    for (_, node) in resolution.graph.binding_nodes() {
        if matches!(node.binding, Binding::Multibound { .. } | Binding::Contribution(_)) {
            continue;
        }
        nodes
            .entry(node.key.to_string())
            .or_default()
            .push(node.owner.depth());
    }
    nodes
}

fn cycle(a_to_b: RequestKind, b_to_a: RequestKind) -> DeclarationStore {
    DeclarationsBuilder::new()
        .add_component(ComponentDecl::new("App").entry_point(DependencyRequest::instance(Key::of("A"))))
        .add_declaration(
            Declaration::injection(Key::of("A"))
                .depends_on(DependencyRequest::new(Key::of("B"), a_to_b)),
        )
        .add_declaration(
            Declaration::injection(Key::of("B"))
                .depends_on(DependencyRequest::new(Key::of("A"), b_to_a)),
        )
        .build()
        .unwrap()
}

fn session_app() -> DeclarationStore {
    DeclarationsBuilder::new()
        .add_module(ModuleDecl::new("AppModule").subcomponent("Session"))
        .add_module(ModuleDecl::new("SessionModule"))
        .add_component(
            ComponentDecl::new("App")
                .install("AppModule")
                .entry_point(DependencyRequest::instance(Key::of("Session.Factory")))
                .entry_point(DependencyRequest::instance(Key::of("Set<Plugin>"))),
        )
        .add_component(
            ComponentDecl::new("Session")
                .child_of("App")
                .install("SessionModule")
                .created_by("Session.Factory")
                .entry_point(DependencyRequest::instance(Key::of("Set<Plugin>")))
                .entry_point(DependencyRequest::instance(Key::of("Missing"))),
        )
        .add_component(ComponentDecl::new("Screen").child_of("App"))
        .add_declaration(
            Declaration::provision("AppModule", "logging()", Key::of("Set<Plugin>")).into_set(),
        )
        .add_declaration(
            Declaration::provision("SessionModule", "audit()", Key::of("Set<Plugin>"))
                .into_set()
                .depends_on(DependencyRequest::instance(Key::of("Clock"))),
        )
        .add_declaration(Declaration::injection(Key::of("Clock")))
        .build()
        .unwrap()
}

#[test]
fn resolving_twice_gives_the_same_result() {
    let first = resolve(&session_app(), "App");
    let second = resolve(&session_app(), "App");

    assert_eq!(first.graph, second.graph);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn every_node_is_reachable_from_the_root() {
    let resolution = resolve(&session_app(), "App");
    let graph = &resolution.graph;

    let mut seen = HashSet::from([graph.root()]);
    let mut queue = VecDeque::from([graph.root()]);
    while let Some(node) = queue.pop_front() {
        for edge in graph.out_edges(node) {
            let target = graph.edge(*edge).target;
            if seen.insert(target) {
                queue.push_back(target);
            }
        }
    }

    assert_eq!(seen.len(), graph.node_count());
    assert_eq!(graph.component_nodes().count(), 3);
}

#[test]
fn each_component_sees_the_contributions_of_its_ancestors() {
    let store = session_app();
    let resolution = resolve(&store, "App");
    let graph = &resolution.graph;

    let elements = graph
        .bindings_for(&Key::of("Set<Plugin>"))
        .into_iter()
        .map(|node| match graph.node(node) {
            Node::Binding(binding) => match &binding.binding {
                Binding::Multibound { contributions, .. } => contributions
                    .iter()
                    .map(|id| store.declaration(*id).to_string())
                    .collect::<Vec<_>>(),
                other => panic!("unexpected binding {other:?}"),
            },
            Node::Component(_) => unreachable!(),
        })
        .collect::<Vec<_>>();

    assert_eq!(
        elements,
        vec![
            vec![
                "AppModule.logging()".to_string(),
                "SessionModule.audit()".to_string(),
            ],
            vec!["AppModule.logging()".to_string()],
        ]
    );

    // The root contribution is shared by both aggregates
    let contributions = graph
        .binding_nodes()
        .filter(|(_, node)| matches!(node.binding, Binding::Contribution(_)))
        .count();
    assert_eq!(contributions, 2);
}

#[test]
fn diagnostics_are_reported_once_per_binding() {
    let resolution = resolve(&session_app(), "App");
    let kinds = resolution
        .diagnostics
        .iter()
        .map(|item| item.kind)
        .collect::<Vec<_>>();
    assert_eq!(kinds, vec![DiagnosticKind::MissingBinding]);
    assert_eq!(
        resolution.diagnostics[0].trace,
        "Missing is requested at\n    [App → Session] Session"
    );
}

#[test]
fn cycles_through_deferred_requests_only_are_allowed() {
    let resolution = resolve(&cycle(RequestKind::Provider, RequestKind::Lazy), "App");
    assert_eq!(resolution.diagnostics, vec![]);

    let resolution = resolve(&cycle(RequestKind::Instance, RequestKind::Lazy), "App");
    let kinds = resolution
        .diagnostics
        .iter()
        .map(|item| item.kind)
        .collect::<Vec<_>>();
    assert_eq!(kinds, vec![DiagnosticKind::DependencyCycle]);
    assert_eq!(
        resolution.diagnostics[0].message,
        "Found a dependency cycle: A -> B -> A"
    );
}

#[test]
fn empty_aggregates_need_a_multibinds_declaration() {
    let store = DeclarationsBuilder::new()
        .add_module(ModuleDecl::new("PluginModule"))
        .add_component(
            ComponentDecl::new("App")
                .install("PluginModule")
                .entry_point(DependencyRequest::instance(Key::of("Map<String, Plugin>")))
                .entry_point(DependencyRequest::instance(Key::of("Set<Listener>"))),
        )
        .add_declaration(Declaration::multibinds(
            "PluginModule",
            "plugins()",
            Key::of("Map<String, Plugin>"),
            AggregateKind::Map,
        ))
        .build()
        .unwrap();

    let resolution = resolve(&store, "App");
    let graph = &resolution.graph;

    let plugins = graph.bindings_for(&Key::of("Map<String, Plugin>"))[0];
    assert!(matches!(
        graph.node(plugins),
        Node::Binding(node) if matches!(
            &node.binding,
            Binding::Multibound { aggregate: AggregateKind::Map, contributions, .. } if contributions.is_empty()
        )
    ));

    let kinds = resolution
        .diagnostics
        .iter()
        .map(|item| item.kind)
        .collect::<Vec<_>>();
    assert_eq!(kinds, vec![DiagnosticKind::MissingBinding]);
    assert!(resolution.diagnostics[0].message.starts_with("Set<Listener> cannot be provided"));
}

#[test]
fn optional_bindings_are_present_where_the_underlying_key_is_bound() {
    let store = DeclarationsBuilder::new()
        .add_module(ModuleDecl::new("OptionalModule"))
        .add_module(ModuleDecl::new("HeaterModule"))
        .add_component(
            ComponentDecl::new("App")
                .install("OptionalModule")
                .entry_point(DependencyRequest::instance(Key::of("Optional<Heater>"))),
        )
        .add_component(
            ComponentDecl::new("Child")
                .child_of("App")
                .install("HeaterModule")
                .entry_point(DependencyRequest::instance(Key::of("Optional<Heater>"))),
        )
        .add_declaration(Declaration::optional_of(
            "OptionalModule",
            "optionalHeater()",
            Key::of("Optional<Heater>"),
            Key::of("Heater"),
        ))
        .add_declaration(Declaration::provision(
            "HeaterModule",
            "provideHeater()",
            Key::of("Heater"),
        ))
        .build()
        .unwrap();

    let resolution = resolve(&store, "App");
    assert_eq!(resolution.diagnostics, vec![]);

    let graph = &resolution.graph;
    let presence = graph
        .bindings_for(&Key::of("Optional<Heater>"))
        .into_iter()
        .filter_map(|node| graph.node(node).as_binding())
        .map(|node| match node.binding {
            Binding::Optional { present, .. } => (node.owner.depth(), present),
            ref other => panic!("unexpected binding {other:?}"),
        })
        .collect::<Vec<_>>();
    assert_eq!(presence, vec![(0, false), (1, true)]);
}

#[test]
fn delegates_depend_on_their_target() {
    let store = DeclarationsBuilder::new()
        .add_module(ModuleDecl::new("PumpModule"))
        .add_component(
            ComponentDecl::new("App")
                .install("PumpModule")
                .entry_point(DependencyRequest::instance(Key::of("Pump"))),
        )
        .add_declaration(Declaration::delegate(
            "PumpModule",
            "bindPump(Thermosiphon)",
            Key::of("Pump"),
            DependencyRequest::instance(Key::of("Thermosiphon")),
        ))
        .add_declaration(Declaration::injection(Key::of("Thermosiphon")))
        .build()
        .unwrap();

    let resolution = resolve(&store, "App");
    assert_eq!(resolution.diagnostics, vec![]);

    let graph = &resolution.graph;
    let pump = graph.bindings_for(&Key::of("Pump"))[0];
    assert!(matches!(
        graph.node(pump),
        Node::Binding(node) if matches!(node.binding, Binding::Delegate { production: false, .. })
    ));
    let targets = graph
        .out_edges(pump)
        .iter()
        .filter_map(|edge| graph.node(graph.edge(*edge).target).as_binding())
        .map(|node| node.key.to_string())
        .collect::<Vec<_>>();
    assert_eq!(targets, vec!["Thermosiphon"]);
}

#[test]
fn graph_errors_list_every_error() {
    let store = DeclarationsBuilder::new()
        .add_component(ComponentDecl::new("App").entry_point(DependencyRequest::instance(Key::of("Heater"))))
        .build()
        .unwrap();

    let errors = resolve(&store, "App").into_result().unwrap_err();
    assert_eq!(
        errors.to_string(),
        [
            "The binding graph of 'App' had one or more errors:",
            "- [wrapp/MissingBinding] Heater cannot be provided without an injectable constructor or a provision method.",
            "Heater is requested at",
            "    App",
        ]
        .join("\n")
    );
}

#[test]
fn every_root_is_resolved_separately() {
    let store = DeclarationsBuilder::new()
        .add_component(ComponentDecl::new("Server").entry_point(DependencyRequest::instance(Key::of("Router"))))
        .add_component(ComponentDecl::new("Worker").entry_point(DependencyRequest::instance(Key::of("Queue"))))
        .add_component(ComponentDecl::new("Job").child_of("Worker"))
        .add_declaration(Declaration::injection(Key::of("Router")))
        .build()
        .unwrap();

    let resolutions = resolve_all(&store, &CompilerOptions::default());
    let summary = resolutions
        .iter()
        .map(|resolution| (resolution.component.to_string(), resolution.has_errors()))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![("Server".to_string(), false), ("Worker".to_string(), true)]
    );
}

fn deferred_cycle_in_child() -> DeclarationStore {
    DeclarationsBuilder::new()
        .add_module(ModuleDecl::new("ChildModule"))
        .add_component(ComponentDecl::new("App"))
        .add_component(
            ComponentDecl::new("Child")
                .child_of("App")
                .install("ChildModule")
                .entry_point(DependencyRequest::instance(Key::of("A")).at("Child.a()")),
        )
        .add_declaration(
            Declaration::injection(Key::of("A"))
                .depends_on(DependencyRequest::lazy(Key::of("B")))
                .depends_on(DependencyRequest::instance(Key::of("C"))),
        )
        .add_declaration(
            Declaration::injection(Key::of("B"))
                .depends_on(DependencyRequest::provider(Key::of("A"))),
        )
        .add_declaration(Declaration::provision("ChildModule", "provideC()", Key::of("C")))
        .build()
        .unwrap()
}

#[test]
fn deferred_cycles_are_owned_by_the_component_their_members_need() {
    let resolution = resolve(&deferred_cycle_in_child(), "App");
    assert_eq!(resolution.diagnostics, vec![]);

    let nodes = resolution
        .graph
        .binding_nodes()
        .map(|(_, node)| (node.key.to_string(), node.owner.depth()))
        .collect::<Vec<_>>();
    assert_eq!(
        nodes,
        vec![
            ("A".to_string(), 1),
            ("B".to_string(), 1),
            ("C".to_string(), 1),
        ]
    );
}

#[test]
fn each_key_has_one_node_per_owner() {
    let resolutions = [
        resolve(&session_app(), "App"),
        resolve(&deferred_cycle_in_child(), "App"),
        resolve(&cycle(RequestKind::Provider, RequestKind::Lazy), "App"),
    ];

    for resolution in &resolutions {
        for (key, mut owners) in unique_nodes_per_key(resolution) {
            let count = owners.len();
            owners.sort();
            owners.dedup();
            assert_eq!(owners.len(), count, "{key} has two nodes with the same owner");
        }
    }

    // Nothing in the cycle needs the root, so nothing is resolved twice
    let per_key = unique_nodes_per_key(&resolutions[1]);
    assert!(per_key.values().all(|owners| owners.len() == 1), "{per_key:?}");
}

#[test]
fn reusable_bindings_fit_any_component() {
    let store = DeclarationsBuilder::new()
        .add_module(ModuleDecl::new("AppModule"))
        .add_module(ModuleDecl::new("ChildModule"))
        .add_component(ComponentDecl::new("App").install("AppModule"))
        .add_component(
            ComponentDecl::new("Child")
                .child_of("App")
                .install("ChildModule")
                .entry_point(DependencyRequest::instance(Key::of("Cache")))
                .entry_point(DependencyRequest::instance(Key::of("Client"))),
        )
        .add_declaration(
            Declaration::provision("ChildModule", "provideCache()", Key::of("Cache"))
                .scoped(Scope::Reusable),
        )
        .add_declaration(
            Declaration::provision("AppModule", "provideClient()", Key::of("Client"))
                .scoped(Scope::Reusable)
                .depends_on(DependencyRequest::instance(Key::of("Token"))),
        )
        .add_declaration(Declaration::provision(
            "ChildModule",
            "provideToken()",
            Key::of("Token"),
        ))
        .build()
        .unwrap();

    let resolution = resolve(&store, "App");
    assert_eq!(resolution.diagnostics, vec![]);

    let graph = &resolution.graph;
    let owners = ["Cache", "Client", "Token"]
        .into_iter()
        .map(|key| {
            let node = graph.bindings_for(&Key::of(key))[0];
            graph.node(node).path().depth()
        })
        .collect::<Vec<_>>();
    assert_eq!(owners, vec![1, 1, 1]);
}
