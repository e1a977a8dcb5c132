//! End-to-end properties of complete layout runs.

use proptest::prelude::*;

use c4_layout::{
    LayoutOptions, LayoutResult,
    geometry::{Bounds, EPSILON, Point, Size},
    identifier::Id,
    layout,
    model::{Graph, Node, NodeKind, Relationship, RoutingHint, SizeHint},
    optimizer::remove_overlaps,
    routing::RoutingStyle,
    strategy::StrategyKind,
    view::ViewState,
};

fn id(s: &str) -> Id {
    Id::new(s).unwrap()
}

/// A small banking landscape: one person, one system with three containers,
/// and two external systems.
fn banking() -> Graph {
    let mut builder = Graph::builder();
    builder
        .add_node(Node::new(id("customer"), "Personal Banking Customer", NodeKind::Person))
        .add_node(
            Node::new(id("banking"), "Internet Banking System", NodeKind::System)
                .with_description("Allows customers to view their accounts and make payments."),
        )
        .add_node(
            Node::new(id("web"), "Web Application", NodeKind::Container)
                .with_parent(id("banking"))
                .with_technology("Java and Spring MVC"),
        )
        .add_node(
            Node::new(id("api"), "API Application", NodeKind::Container)
                .with_parent(id("banking"))
                .with_technology("Java and Spring MVC"),
        )
        .add_node(Node::new(id("db"), "Database", NodeKind::Database).with_parent(id("banking")))
        .add_node(Node::new(id("mainframe"), "Mainframe Banking System", NodeKind::ExternalSystem))
        .add_node(Node::new(id("email"), "E-mail System", NodeKind::ExternalSystem))
        .add_relationship(Relationship::new(id("visits"), id("customer"), id("web")).with_label("Visits"))
        .add_relationship(Relationship::new(id("calls"), id("web"), id("api")).with_label("Makes API calls"))
        .add_relationship(Relationship::new(id("reads"), id("api"), id("db")).with_label("Reads from and writes to"))
        .add_relationship(Relationship::new(id("gets"), id("api"), id("mainframe")).with_label("Gets account information"))
        .add_relationship(Relationship::new(id("sends"), id("api"), id("email")))
        .add_relationship(Relationship::new(id("mails"), id("email"), id("customer")).with_label("Sends e-mails to"));
    builder.build().unwrap()
}

fn assert_contained(result: &LayoutResult, options: &LayoutOptions) {
    for parent in result.visible_nodes() {
        if parent.collapsed || parent.children.is_empty() {
            continue;
        }
        let pad = options.padding_for(parent.kind);
        for child_id in &parent.children {
            let child = result.node(*child_id).unwrap();
            let (p, c) = (parent.bounds, child.bounds);
            assert!(c.min_x() >= p.min_x() + pad - EPSILON, "{child_id} leaves {} on the left", parent.id);
            assert!(c.max_x() <= p.max_x() - pad + EPSILON, "{child_id} leaves {} on the right", parent.id);
            assert!(c.min_y() >= p.min_y() + pad - EPSILON, "{child_id} leaves {} at the top", parent.id);
            assert!(c.max_y() <= p.max_y() - pad + EPSILON, "{child_id} leaves {} at the bottom", parent.id);
        }
    }
}

fn assert_siblings_apart(result: &LayoutResult) {
    let mut groups: Vec<Vec<Bounds>> = vec![
        result
            .visible_nodes()
            .filter(|n| n.parent.is_none())
            .map(|n| n.bounds)
            .collect(),
    ];
    for parent in result.visible_nodes().filter(|n| !n.collapsed) {
        groups.push(
            parent
                .children
                .iter()
                .filter_map(|c| result.node(*c))
                .filter(|c| c.visible)
                .map(|c| c.bounds)
                .collect(),
        );
    }
    for group in groups {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                let (ox, oy) = a.padded_overlap(b, 0.0);
                assert!(ox <= EPSILON || oy <= EPSILON, "{a:?} overlaps {b:?}");
            }
        }
    }
}

#[test]
fn test_layout_is_deterministic() {
    let graph = banking();
    let options = LayoutOptions::default();
    let first = layout(&graph, &ViewState::all(), &options);
    let second = layout(&graph, &ViewState::all(), &options);
    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.relationships, second.relationships);
    assert_eq!(first.bounds, second.bounds);
    assert_eq!(first.metrics, second.metrics);
}

#[test]
fn test_children_stay_inside_open_containers() {
    let options = LayoutOptions::default();
    let result = layout(&banking(), &ViewState::all(), &options);
    assert_contained(&result, &options);
    assert_siblings_apart(&result);
}

#[test]
fn test_every_preset_keeps_containment() {
    for preset in c4_layout::Preset::ALL {
        let options = preset.options();
        let result = layout(&banking(), &ViewState::all(), &options);
        assert_contained(&result, &options);
        assert_siblings_apart(&result);
    }
}

#[test]
fn test_collapsed_system_hides_its_children() {
    let mut builder = Graph::builder();
    builder
        .add_node(Node::new(id("user"), "User", NodeKind::Person))
        .add_node(Node::new(id("sys"), "System", NodeKind::System).with_collapse_children(true))
        .add_node(Node::new(id("a"), "A", NodeKind::Container).with_parent(id("sys")))
        .add_node(Node::new(id("b"), "B", NodeKind::Container).with_parent(id("sys")))
        .add_relationship(Relationship::new(id("uses"), id("user"), id("a")));
    let graph = builder.build().unwrap();
    let result = layout(&graph, &ViewState::all(), &LayoutOptions::default());

    let sys = result.node(id("sys")).unwrap();
    assert!(sys.visible);
    assert!(sys.collapsed);
    for child in ["a", "b"] {
        let node = result.node(id(child)).unwrap();
        assert!(!node.visible);
        assert_eq!(node.bounds, sys.bounds);
    }

    let uses = result.relationship(id("uses")).unwrap();
    assert_eq!(uses.source, id("user"));
    assert_eq!(uses.target, id("sys"));
    assert_eq!(result.visible_nodes().count(), 2);
}

#[test]
fn test_orthogonal_edges_avoid_other_nodes() {
    let mut builder = Graph::builder();
    builder
        .add_node(Node::new(id("a"), "A", NodeKind::System).with_pinned(Point::new(0.0, 0.0)))
        .add_node(
            Node::new(id("wall"), "Wall", NodeKind::System)
                .with_pinned(Point::new(-60.0, 150.0))
                .with_size_hint(SizeHint {
                    width: Some(240.0),
                    height: Some(60.0),
                    aspect: None,
                }),
        )
        .add_node(Node::new(id("b"), "B", NodeKind::System).with_pinned(Point::new(0.0, 300.0)))
        .add_relationship(
            Relationship::new(id("r"), id("a"), id("b")).with_routing(RoutingHint::Orthogonal),
        );
    let graph = builder.build().unwrap();
    let result = layout(&graph, &ViewState::all(), &LayoutOptions::default());

    let wall = result.node(id("wall")).unwrap().bounds;
    let edge = result.relationship(id("r")).unwrap();
    assert_eq!(edge.style, RoutingStyle::Orthogonal);
    assert!(!edge.fallback);
    assert!(edge.bends > 0);
    for seg in edge.points.windows(2) {
        assert!(!wall.intersects_segment(seg[0], seg[1]), "segment {seg:?} crosses the wall");
    }
}

#[test]
fn test_routed_paths_miss_unrelated_boxes() {
    let result = layout(&banking(), &ViewState::all(), &LayoutOptions::default());
    for edge in result.relationships.iter().filter(|e| !e.fallback) {
        for node in result.visible_nodes() {
            let related = [edge.source, edge.target].iter().any(|&end| {
                end == node.id || is_ancestor(&result, node.id, end) || is_ancestor(&result, end, node.id)
            });
            if related || edge.style != RoutingStyle::Orthogonal {
                continue;
            }
            for seg in edge.points.windows(2) {
                assert!(
                    !node.bounds.intersects_segment(seg[0], seg[1]),
                    "{} passes through {}",
                    edge.id,
                    node.id
                );
            }
        }
    }
}

fn is_ancestor(result: &LayoutResult, ancestor: Id, id: Id) -> bool {
    let mut current = result.node(id).and_then(|n| n.parent);
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        current = result.node(parent).and_then(|n| n.parent);
    }
    false
}

fn context_with_hub(hub_width: f32) -> Graph {
    let mut builder = Graph::builder();
    builder.add_node(Node::new(id("shop"), "Shop", NodeKind::System).with_size_hint(SizeHint {
        width: Some(hub_width),
        height: Some(hub_width * 0.6),
        aspect: None,
    }));
    for name in ["alice", "bob", "carol", "dave", "erin"] {
        builder
            .add_node(Node::new(id(name), name, NodeKind::Person))
            .add_relationship(Relationship::new(id(&format!("{name}-uses")), id(name), id("shop")));
    }
    builder.build().unwrap()
}

fn satellite_angles(result: &LayoutResult) -> Vec<f32> {
    let hub = result.node(id("shop")).unwrap().bounds.center();
    ["alice", "bob", "carol", "dave", "erin"]
        .iter()
        .map(|name| {
            let c = result.node(id(name)).unwrap().bounds.center();
            (c.y() - hub.y()).atan2(c.x() - hub.x())
        })
        .collect()
}

#[test]
fn test_context_angles_ignore_hub_size() {
    let view = ViewState::system_context(id("shop"));
    let options = LayoutOptions::default();
    let small = layout(&context_with_hub(160.0), &view, &options);
    let large = layout(&context_with_hub(640.0), &view, &options);
    assert_eq!(small.strategy, StrategyKind::Radial);

    let (a, b) = (satellite_angles(&small), satellite_angles(&large));
    for (x, y) in a.iter().zip(&b) {
        let diff = (x - y + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU) - std::f32::consts::PI;
        assert!(diff.abs() < 1e-3, "angle {x} became {y}");
    }

    let radius = |r: &LayoutResult| {
        let hub = r.node(id("shop")).unwrap().bounds.center();
        r.node(id("alice")).unwrap().bounds.center().distance(hub)
    };
    assert!(radius(&large) > radius(&small));
}

#[test]
fn test_context_satellites_clear_of_hub() {
    let view = ViewState::system_context(id("shop"));
    for hub_width in [160.0, 640.0] {
        let result = layout(&context_with_hub(hub_width), &view, &LayoutOptions::default());
        let hub = result.node(id("shop")).unwrap().bounds;
        for name in ["alice", "bob", "carol", "dave", "erin"] {
            let satellite = result.node(id(name)).unwrap().bounds;
            assert!(
                !satellite.intersects(&hub),
                "{name} {satellite:?} overlaps hub {hub:?} (width {hub_width})"
            );
        }
    }
}

fn system_with_neighbors() -> Graph {
    let mut builder = Graph::builder();
    builder
        .add_node(Node::new(id("user"), "User", NodeKind::Person))
        .add_node(Node::new(id("shop"), "Shop", NodeKind::System))
        .add_node(Node::new(id("web"), "Web", NodeKind::Container).with_parent(id("shop")))
        .add_node(Node::new(id("orders"), "Orders", NodeKind::Database).with_parent(id("shop")))
        .add_node(Node::new(id("events"), "Events", NodeKind::Queue).with_parent(id("shop")))
        .add_node(Node::new(id("payments"), "Payments", NodeKind::ExternalSystem))
        .add_node(Node::new(id("unrelated"), "Unrelated", NodeKind::ExternalSystem))
        .add_relationship(Relationship::new(id("browses"), id("user"), id("web")))
        .add_relationship(Relationship::new(id("stores"), id("web"), id("orders")))
        .add_relationship(Relationship::new(id("emits"), id("web"), id("events")))
        .add_relationship(Relationship::new(id("charges"), id("web"), id("payments")));
    builder.build().unwrap()
}

#[test]
fn test_context_view_hides_containers() {
    let result = layout(
        &system_with_neighbors(),
        &ViewState::system_context(id("shop")),
        &LayoutOptions::default(),
    );
    let visible: Vec<Id> = result.visible_nodes().map(|n| n.id).collect();
    for expected in ["shop", "user", "payments"] {
        assert!(visible.contains(&id(expected)), "{expected} missing");
    }
    for hidden in ["web", "orders", "events", "unrelated"] {
        assert!(!visible.contains(&id(hidden)), "{hidden} shown");
    }
}

#[test]
fn test_container_view_shows_containers() {
    let result = layout(
        &system_with_neighbors(),
        &ViewState::container(id("shop")),
        &LayoutOptions::default(),
    );
    let visible: Vec<Id> = result.visible_nodes().map(|n| n.id).collect();
    for expected in ["shop", "web", "orders", "events", "user", "payments"] {
        assert!(visible.contains(&id(expected)), "{expected} missing");
    }
    assert!(!visible.contains(&id("unrelated")));
}

#[test]
fn test_overlapping_squares_are_separated() {
    let mut rects = [
        Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 100.0)),
        Bounds::new_from_top_left(Point::new(50.0, 50.0), Size::new(100.0, 100.0)),
    ];
    remove_overlaps(&mut rects, 10.0, 50);
    let (ox, oy) = rects[0].padded_overlap(&rects[1], 10.0);
    assert!(ox <= EPSILON || oy <= EPSILON);
}

#[test]
fn test_person_uses_system() {
    let mut builder = Graph::builder();
    builder
        .add_node(Node::new(id("user"), "User", NodeKind::Person))
        .add_node(Node::new(id("shop"), "Shop", NodeKind::System))
        .add_relationship(Relationship::new(id("uses"), id("user"), id("shop")));
    let result = layout(&builder.build().unwrap(), &ViewState::all(), &LayoutOptions::default());
    assert_eq!(result.nodes.len(), 2);
    assert_eq!(result.relationships.len(), 1);
    assert!(result.relationships[0].points.len() > 1);
}

#[test]
fn test_five_containers_fit_their_system() {
    let mut builder = Graph::builder();
    builder.add_node(Node::new(id("sys"), "System", NodeKind::System));
    for i in 0..5 {
        builder.add_node(
            Node::new(id(&format!("c{i}")), format!("Container {i}"), NodeKind::Container)
                .with_parent(id("sys")),
        );
    }
    builder.add_node(Node::new(id("ext"), "External", NodeKind::ExternalSystem));
    let options = LayoutOptions::default();
    let result = layout(&builder.build().unwrap(), &ViewState::all(), &options);

    let sys = result.node(id("sys")).unwrap().bounds;
    for i in 0..5 {
        assert!(sys.contains_bounds(&result.node(id(&format!("c{i}"))).unwrap().bounds));
    }
    assert_contained(&result, &options);
    assert_siblings_apart(&result);
    let ext = result.node(id("ext")).unwrap().bounds;
    assert!(!sys.intersects(&ext));
}

#[test]
fn test_component_chain_flows_downward() {
    let mut builder = Graph::builder();
    builder.add_node(Node::new(id("api"), "API", NodeKind::Container));
    for name in ["controller", "service", "repository"] {
        builder.add_node(Node::new(id(name), name, NodeKind::Component).with_parent(id("api")));
    }
    builder
        .add_relationship(Relationship::new(id("r1"), id("controller"), id("service")))
        .add_relationship(Relationship::new(id("r2"), id("service"), id("repository")));
    let result = layout(&builder.build().unwrap(), &ViewState::all(), &LayoutOptions::default());

    let y = |name: &str| result.node(id(name)).unwrap().bounds.min_y();
    assert!(y("controller") < y("service"));
    assert!(y("service") < y("repository"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_flat_layouts_never_overlap(
        sizes in prop::collection::vec((60.0f32..400.0, 40.0f32..300.0), 1..12),
    ) {
        let mut builder = Graph::builder();
        for (i, (w, h)) in sizes.iter().enumerate() {
            builder.add_node(
                Node::new(id(&format!("n{i}")), format!("Node {i}"), NodeKind::Container)
                    .with_size_hint(SizeHint { width: Some(*w), height: Some(*h), aspect: None }),
            );
        }
        for i in 1..sizes.len() {
            builder.add_relationship(Relationship::new(
                id(&format!("r{i}")),
                id(&format!("n{}", i - 1)),
                id(&format!("n{i}")),
            ));
        }
        let graph = builder.build().unwrap();
        let options = LayoutOptions::default();
        let first = layout(&graph, &ViewState::all(), &options);
        assert_siblings_apart(&first);
        prop_assert_eq!(first.nodes.len(), sizes.len());
        prop_assert_eq!(first.relationships.len(), sizes.len() - 1);

        let second = layout(&graph, &ViewState::all(), &options);
        prop_assert_eq!(first.nodes, second.nodes);
    }
}
