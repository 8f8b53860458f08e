use middlebox_placement::domain::catalog::Catalog;
use middlebox_placement::domain::catalog::middlebox::Middlebox;
use middlebox_placement::domain::catalog::traffic_request::TrafficRequest;
use middlebox_placement::domain::cost::CostCoefficients;
use middlebox_placement::domain::engine::embedding::{Embedding, PathSource, Rejection};
use middlebox_placement::domain::engine::engine::{EmbeddingEngine, EngineConfig};
use middlebox_placement::domain::topology::graph::Topology;
use middlebox_placement::domain::topology::path_cache::PathCache;
use middlebox_placement::domain::utils::id::{MiddleboxId, NodeId};

fn node(i: usize) -> NodeId {
    NodeId::new(i)
}

/// Two disjoint routes 0 -> 1 -> 3 and 0 -> 2 -> 3 with per-edge (bandwidth, delay).
fn create_diamond(upper: (u64, u64), lower: (u64, u64)) -> Topology {
    let mut topology = Topology::new();
    for _ in 0..4 {
        topology.add_node(4);
    }
    topology.add_edge(node(0), node(1), upper.0, upper.1).unwrap();
    topology.add_edge(node(1), node(3), upper.0, upper.1).unwrap();
    topology.add_edge(node(0), node(2), lower.0, lower.1).unwrap();
    topology.add_edge(node(2), node(3), lower.0, lower.1).unwrap();
    topology
}

fn create_engine(topology: Topology, use_path_cache: bool) -> EmbeddingEngine {
    let catalog = Catalog::new(vec![Middlebox::new("firewall", 1, 1, 1000, 0.25)], Vec::new());
    EmbeddingEngine::new(topology, catalog, CostCoefficients::new(1.0, 0.001), EngineConfig { use_path_cache })
}

fn request(arrival_time: u64, min_bandwidth: u64, max_delay: u64) -> TrafficRequest {
    TrafficRequest::new(arrival_time, node(0), node(3), min_bandwidth, max_delay, 1.0, vec![MiddleboxId::new(0)])
}

fn accept(engine: &mut EmbeddingEngine, req: &TrafficRequest) -> Embedding {
    engine.embed(req).unwrap().embedding().cloned().unwrap_or_else(|| panic!("request at {} should be accepted", req.arrival_time))
}

#[test]
fn test_path_cache_store_lookup_invalidate() {
    let mut cache = PathCache::new();
    assert!(cache.is_empty());
    assert!(cache.lookup(node(0), node(3)).is_none());

    cache.store(node(0), node(3), vec![node(0), node(1), node(3)]);
    cache.store(node(0), node(3), vec![node(0), node(2), node(3)]);
    assert_eq!(cache.len(), 1, "storing the same pair twice should overwrite");
    assert_eq!(cache.lookup(node(0), node(3)), Some([node(0), node(2), node(3)].as_slice()));
    assert!(cache.lookup(node(3), node(0)).is_none(), "entries are directional");

    assert_eq!(cache.invalidate(node(0), node(3)), Some(vec![node(0), node(2), node(3)]));
    assert!(cache.lookup(node(0), node(3)).is_none());

    cache.store(node(1), node(2), vec![node(1), node(2)]);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_second_request_uses_cached_path() {
    let mut engine = create_engine(create_diamond((1000, 1), (1000, 1)), true);

    let first = accept(&mut engine, &request(0, 100, 10));
    assert_eq!(first.path_source, PathSource::CostTable);
    assert_eq!(engine.path_cache().lookup(node(0), node(3)), Some(first.path.as_slice()));

    let second = accept(&mut engine, &request(1, 100, 10));
    assert_eq!(second.path_source, PathSource::Cache);
    assert_eq!(second.path, first.path);
}

#[test]
fn test_cached_path_reproduces_fresh_search_cost() {
    let mut cached = create_engine(create_diamond((1000, 1), (1000, 1)), true);
    let mut fresh = create_engine(create_diamond((1000, 1), (1000, 1)), false);

    for engine in [&mut cached, &mut fresh] {
        accept(engine, &request(0, 300, 10));
    }

    let from_cache = accept(&mut cached, &request(1, 300, 10));
    let from_search = accept(&mut fresh, &request(1, 300, 10));

    assert_eq!(from_cache.path_source, PathSource::Cache);
    assert_ne!(from_search.path_source, PathSource::Cache);
    assert_eq!(from_cache.path, from_search.path);
    assert!((from_cache.cost.total() - from_search.cost.total()).abs() < 1e-9);
    assert!(fresh.path_cache().is_empty(), "disabled cache must stay empty");
}

#[test]
fn test_exhausted_cached_path_is_replaced() {
    let mut engine = create_engine(create_diamond((100, 1), (100, 1)), true);

    let first = accept(&mut engine, &request(0, 100, 10));
    assert_eq!(first.path, vec![node(0), node(1), node(3)], "equal cost routes resolve to the lowest predecessor");

    let second = accept(&mut engine, &request(1, 50, 10));
    assert_eq!(second.path, vec![node(0), node(2), node(3)]);
    assert_ne!(second.path_source, PathSource::Cache);
    assert_eq!(engine.path_cache().lookup(node(0), node(3)), Some(second.path.as_slice()));

    let third = engine.embed(&request(2, 60, 10)).unwrap();
    assert_eq!(third.rejection(), Some(&Rejection::InsufficientBandwidth { requested: 60 }));
    assert!(engine.path_cache().lookup(node(0), node(3)).is_none(), "no feasible path leaves the entry absent");
}

#[test]
fn test_cached_path_too_slow_for_new_sla_is_bypassed() {
    // The fast route is too thin for the first request, which ends up on the slow one.
    let mut engine = create_engine(create_diamond((100, 1), (1000, 5)), true);

    let first = accept(&mut engine, &request(0, 200, 20));
    assert_eq!(first.path, vec![node(0), node(2), node(3)]);
    assert_eq!(first.path_source, PathSource::ConstrainedSearch);

    let second = accept(&mut engine, &request(1, 10, 5));
    assert_eq!(second.path, vec![node(0), node(1), node(3)]);
    assert_eq!(second.path_source, PathSource::CostTable);
}

#[test]
fn test_detour_beyond_delay_budget_is_penalized() {
    // Pre-check passes on the fast route, capacity forces the slow one.
    let mut engine = create_engine(create_diamond((100, 1), (1000, 5)), true);

    let embedding = accept(&mut engine, &request(0, 200, 8));

    // 2 * 5 ms of edges plus 1 ms of firewall processing against an 8 ms budget.
    assert_eq!(embedding.path_source, PathSource::DelaySearch);
    assert_eq!(embedding.delay, 11);
    assert!((embedding.cost.penalty - 3.0).abs() < 1e-9, "penalty: {}", embedding.cost.penalty);
}

#[test]
fn test_cheap_but_slow_path_is_not_taken_when_a_fast_one_fits() {
    // The direct edge is cheapest but needs 20 ms; 0 -> 1 -> 3 needs 4 ms and is idle.
    let mut topology = Topology::new();
    for _ in 0..4 {
        topology.add_node(4);
    }
    topology.add_edge(node(0), node(3), 1000, 20).unwrap();
    topology.add_edge(node(0), node(1), 1000, 2).unwrap();
    topology.add_edge(node(1), node(3), 1000, 2).unwrap();
    let mut engine = create_engine(topology, true);

    let first = accept(&mut engine, &request(0, 10, 10));
    assert_eq!(first.path, vec![node(0), node(1), node(3)]);
    assert_eq!(first.path_source, PathSource::DelaySearch);
    assert_eq!(first.delay, 5);
    assert_eq!(first.cost.penalty, 0.0);

    let second = accept(&mut engine, &request(1, 10, 10));
    assert_eq!(second.path_source, PathSource::Cache);
    assert_eq!(second.path, first.path);

    // A looser SLA lets the cached path stand even though the direct edge is cheaper.
    let third = accept(&mut engine, &request(2, 10, 30));
    assert_eq!(third.path, first.path);
}

#[test]
fn test_slow_detour_is_taken_only_when_fast_route_is_full() {
    let mut engine = create_engine(create_diamond((1000, 1), (1000, 5)), true);

    // Fill the fast route, then cache the slow one.
    let fast = accept(&mut engine, &request(0, 1000, 10));
    assert_eq!(fast.path, vec![node(0), node(1), node(3)]);
    let slow = accept(&mut engine, &request(1, 500, 20));
    assert_eq!(slow.path, vec![node(0), node(2), node(3)]);

    // Too slow for the cached entry, and no other route has capacity left.
    let detour = accept(&mut engine, &request(2, 500, 5));
    assert_eq!(detour.path, vec![node(0), node(2), node(3)]);
    assert_eq!(detour.path_source, PathSource::DelaySearch);
    assert_eq!(detour.delay, 11);
    assert!((detour.cost.penalty - 6.0).abs() < 1e-9, "penalty: {}", detour.cost.penalty);
}
