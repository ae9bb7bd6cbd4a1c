//! Collector configuration, statistics, and reachability tests.

use rootstack_gc::{Configuration, Gc, GarbageCollector, Result, Trace};

#[derive(Debug)]
struct Node {
    id: usize,
    children: Vec<Gc<Node>>,
}

impl Trace for Node {
    fn trace(&self, collector: &GarbageCollector) {
        self.children.trace(collector);
    }
}

#[test_log::test]
fn custom_configuration_is_honored() -> Result<()> {
    let config = Configuration {
        allocation_threshold: 4,
        initial_capacity: 8,
    };
    let collector = GarbageCollector::with_config(config);
    let _gc = Gc::with_collector(&collector, "custom config")?;
    collector.collect(true);
    Ok(())
}

#[test_log::test]
fn statistics_report_allocation_and_sweep_activity() -> Result<()> {
    let collector = GarbageCollector::new();
    let initial = collector.statistics();
    assert_eq!(initial.collections_performed, 0);

    let objects: Vec<_> = (0..100)
        .map(|i| Gc::with_collector(&collector, format!("object-{i}")))
        .collect::<Result<Vec<_>>>()?;

    collector.collect(true);
    let after_rooted = collector.statistics();
    assert_eq!(after_rooted.collections_performed, 1);
    assert_eq!(after_rooted.objects_swept, 0);

    for obj in &objects {
        collector.unmark(obj);
    }
    drop(objects);
    collector.collect(true);
    let after_drop = collector.statistics();
    assert_eq!(after_drop.collections_performed, 2);
    assert_eq!(after_drop.objects_swept, 100);
    Ok(())
}

#[test_log::test]
fn allocation_threshold_triggers_automatic_collection() -> Result<()> {
    let config = Configuration {
        allocation_threshold: 8,
        ..Configuration::default()
    };
    let collector = GarbageCollector::with_config(config);

    for i in 0..8 {
        let gc = Gc::with_collector(&collector, i)?;
        collector.unmark(&gc);
    }
    // The eighth allocation crosses the threshold and triggers a collection
    // before its own root is removed, so it survives; the seven before it
    // do not. A ninth allocation then lands in the freshly-swept heap.
    let _gc = Gc::with_collector(&collector, 100)?;
    assert_eq!(collector.heap_len(), 2);
    Ok(())
}

#[test_log::test]
fn reachability_keeps_an_entire_tree_alive() -> Result<()> {
    let collector = GarbageCollector::new();
    let leaf1 = Gc::with_collector(&collector, Node { id: 1, children: vec![] })?;
    let leaf2 = Gc::with_collector(&collector, Node { id: 2, children: vec![] })?;
    let leaf3 = Gc::with_collector(&collector, Node { id: 3, children: vec![] })?;

    let branch1 = Gc::with_collector(
        &collector,
        Node { id: 10, children: vec![leaf1.clone(), leaf2.clone()] },
    )?;
    let branch2 = Gc::with_collector(&collector, Node { id: 20, children: vec![leaf3.clone()] })?;
    let root = Gc::with_collector(
        &collector,
        Node { id: 100, children: vec![branch1.clone(), branch2.clone()] },
    )?;

    collector.unmark(&leaf1);
    collector.unmark(&leaf2);
    collector.unmark(&leaf3);
    collector.unmark(&branch1);
    collector.unmark(&branch2);
    drop((leaf1, leaf2, leaf3, branch1, branch2));

    collector.collect(true);

    assert_eq!(root.id, 100);
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].id, 10);
    assert_eq!(root.children[0].children[0].id, 1);
    assert_eq!(root.children[1].children[0].id, 3);
    assert_eq!(collector.heap_len(), 6);
    Ok(())
}

#[test_log::test]
fn unreachable_branch_is_swept_while_reachable_branch_survives() -> Result<()> {
    let collector = GarbageCollector::new();
    let kept_leaf = Gc::with_collector(&collector, Node { id: 1, children: vec![] })?;
    let kept_root = Gc::with_collector(&collector, Node { id: 2, children: vec![kept_leaf.clone()] })?;
    collector.unmark(&kept_leaf);

    {
        let dropped_leaf = Gc::with_collector(&collector, Node { id: 3, children: vec![] })?;
        let dropped_root = Gc::with_collector(&collector, Node { id: 4, children: vec![dropped_leaf.clone()] })?;
        collector.unmark(&dropped_leaf);
        collector.unmark(&dropped_root);
    }

    collector.collect(true);
    assert_eq!(collector.heap_len(), 2);
    assert_eq!(kept_root.children.len(), 1);
    Ok(())
}

#[test_log::test]
fn repeated_collections_do_not_disturb_live_objects() -> Result<()> {
    let collector = GarbageCollector::new();
    let objects: Vec<_> = (0..50).map(|i| Gc::with_collector(&collector, i)).collect::<Result<_>>()?;

    for _ in 0..5 {
        collector.collect(true);
    }

    for (i, obj) in objects.iter().enumerate() {
        assert_eq!(**obj, i);
    }
    Ok(())
}

#[test_log::test]
fn large_objects_survive_while_rooted() -> Result<()> {
    let collector = GarbageCollector::new();
    let large_objects: Vec<_> = (0..10)
        .map(|i| Gc::with_collector(&collector, vec![i; 10_000]))
        .collect::<Result<Vec<_>>>()?;

    collector.collect(true);

    assert_eq!(large_objects[0][0], 0);
    assert_eq!(large_objects[0].len(), 10_000);
    assert_eq!(large_objects[5][0], 5);
    Ok(())
}
