//! Benchmark for node name/id resolution
//!
//! Mapping of 1000 nodes held in the in-memory KV store.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ha_config::{
    ConfigRegistry, FileConfStore, InitOptions, KvClientParams, KvConnector, KvStore,
    MemoryKvStore, NodeDirectory, RegistryConfig, Result,
};
use std::sync::Arc;

const NODE_COUNT: usize = 1000;

struct FixedConnector(Arc<MemoryKvStore>);

impl KvConnector for FixedConnector {
    fn connect(&self, _params: &KvClientParams) -> Result<Arc<dyn KvStore>> {
        Ok(self.0.clone())
    }
}

fn setup() -> (tempfile::TempDir, NodeDirectory) {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path().join("ha.conf");
    std::fs::write(&conf, "consul_config:\n  endpoint: tcp://consul:8500\n").unwrap();

    let kv = MemoryKvStore::new("ha/v1/");
    for i in 0..NODE_COUNT {
        kv.put(
            format!("pvtfqdn_to_nodeid/srvnode-{:04}.data.private", i),
            format!("node-id-{:04}", i),
        );
    }

    let config = RegistryConfig {
        global_config_url: format!("yaml://{}", conf.display()),
        ..Default::default()
    };
    let registry = ConfigRegistry::with_backends(
        config,
        Arc::new(FileConfStore::new()),
        Arc::new(FixedConnector(Arc::new(kv))),
    );
    registry.init(&InitOptions::default()).unwrap();

    (dir, NodeDirectory::new(registry))
}

fn bench_resolve_node_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_directory");
    group.throughput(Throughput::Elements(1));

    let (_dir, directory) = setup();
    let rt = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("resolve_node_name", |b| {
        let mut counter = 0usize;
        b.iter(|| {
            counter += 1;
            let node_id = format!("node-id-{:04}", counter % NODE_COUNT);
            let _ = rt.block_on(directory.resolve_node_name(black_box(&node_id)));
        });
    });

    group.finish();
}

fn bench_resolve_node_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_directory");
    group.throughput(Throughput::Elements(1));

    let (_dir, directory) = setup();
    let rt = tokio::runtime::Runtime::new().unwrap();

    group.bench_function("resolve_node_id", |b| {
        let mut counter = 0usize;
        b.iter(|| {
            counter += 1;
            let name = format!("srvnode-{:04}.data.private", counter % NODE_COUNT);
            let _ = rt.block_on(directory.resolve_node_id(black_box(&name)));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_resolve_node_name, bench_resolve_node_id);
criterion_main!(benches);
