mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assetflow::dag::{DynamicTask, InvocationState, ManifestContext, TaskGraph};
use assetflow::errors::{AssetflowError, Result};
use assetflow::manifest::Manifest;
use common::SourceTree;

/// Action that concatenates the task's static prerequisites into its output
/// and bumps `runs`.
fn concat_action(runs: &Arc<AtomicUsize>) -> assetflow::dag::TaskAction {
    let runs = Arc::clone(runs);
    Arc::new(move |task: &DynamicTask| -> Result<()> {
        runs.fetch_add(1, Ordering::SeqCst);
        let mut body = String::new();
        for prereq in task.prerequisites() {
            body.push_str(&fs::read_to_string(prereq)?);
        }
        if let Some(parent) = task.name().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(task.name(), body)?;
        Ok(())
    })
}

fn fixed_deps(deps: Vec<PathBuf>, calls: &Arc<AtomicUsize>) -> assetflow::dag::DiscoveryFn {
    let calls = Arc::clone(calls);
    Arc::new(move |_: &DynamicTask| -> Result<Vec<PathBuf>> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(deps.clone())
    })
}

fn invoke(graph: &mut TaskGraph, name: &Path, last: &Manifest) -> Manifest {
    let mut current = Manifest::new();
    {
        let mut ctx = ManifestContext::new(last, &mut current);
        graph.invoke(name, Some(&mut ctx)).unwrap();
    }
    current
}

#[test]
fn static_prerequisites_run_before_the_task() {
    let tree = SourceTree::new();
    let src = tree.write("src/a.txt", "a");
    let mid = tree.path("out/mid.txt");
    let top = tree.path("out/top.txt");

    let order = Arc::new(Mutex::new(Vec::new()));
    let mut graph = TaskGraph::new();
    for (name, prereq) in [(&mid, &src), (&top, &mid)] {
        let order = Arc::clone(&order);
        let task = graph.define_task(name.clone());
        task.enhance([prereq.clone()]);
        task.set_action(Arc::new(move |t: &DynamicTask| -> Result<()> {
            order.lock().unwrap().push(t.name().to_path_buf());
            fs::create_dir_all(t.name().parent().unwrap())?;
            fs::write(t.name(), "x")?;
            Ok(())
        }));
    }

    graph.invoke(&top, None).unwrap();

    assert_eq!(*order.lock().unwrap(), vec![mid.clone(), top.clone()]);
    assert_eq!(graph.get(&top).unwrap().state(), InvocationState::Invoked);
}

#[test]
fn up_to_date_task_is_skipped_until_a_prerequisite_changes() {
    let tree = SourceTree::new();
    let src = tree.write("src/a.txt", "one");
    let out = tree.path("out/a.txt");
    let runs = Arc::new(AtomicUsize::new(0));

    let mut graph = TaskGraph::new();
    graph.define_task(out.clone()).enhance([src.clone()]).set_action(concat_action(&runs));

    graph.invoke(&out, None).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!graph.needed(&out, None));

    graph.reenable_all();
    graph.invoke(&out, None).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1, "second invoke should skip");

    tree.modify("src/a.txt", "two");
    assert!(graph.needed(&out, None));

    graph.reenable_all();
    graph.invoke(&out, None).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(tree.read("out/a.txt"), "two");
}

#[test]
fn invoked_task_does_not_rerun_without_reenable() {
    let tree = SourceTree::new();
    let src = tree.write("src/a.txt", "a");
    let out = tree.path("out/a.txt");
    let runs = Arc::new(AtomicUsize::new(0));

    let mut graph = TaskGraph::new();
    graph.define_task(out.clone()).enhance([src]).set_action(concat_action(&runs));

    graph.invoke(&out, None).unwrap();
    fs::remove_file(&out).unwrap();
    graph.invoke(&out, None).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    graph.recursively_reenable(&out);
    assert_eq!(graph.get(&out).unwrap().state(), InvocationState::NotInvoked);
    graph.invoke(&out, None).unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn missing_static_prerequisite_without_task_fails() {
    let tree = SourceTree::new();
    let out = tree.path("out/a.txt");
    let runs = Arc::new(AtomicUsize::new(0));

    let mut graph = TaskGraph::new();
    graph
        .define_task(out.clone())
        .enhance([tree.path("src/missing.txt")])
        .set_action(concat_action(&runs));

    match graph.invoke(&out, None) {
        Err(AssetflowError::MissingPrerequisite { task, prerequisite }) => {
            assert_eq!(task, out.display().to_string());
            assert!(prerequisite.ends_with("missing.txt"));
        }
        other => panic!("expected missing prerequisite, got {other:?}"),
    }
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn cycles_are_reported_with_the_chain() {
    let mut graph = TaskGraph::new();
    graph.define_task("/virtual/a").enhance(["/virtual/b"]);
    graph.define_task("/virtual/b").enhance(["/virtual/c"]);
    graph.define_task("/virtual/c").enhance(["/virtual/a"]);

    match graph.invoke(Path::new("/virtual/a"), None) {
        Err(AssetflowError::Cycle(chain)) => {
            assert_eq!(chain, "/virtual/a => /virtual/b => /virtual/c => /virtual/a");
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn enhance_deduplicates_prerequisites() {
    let mut graph = TaskGraph::new();
    graph
        .define_task("/out/a")
        .enhance(["/src/x", "/src/y"])
        .enhance(["/src/x", "/src/z"]);

    let prereqs: Vec<&str> = graph
        .get(Path::new("/out/a"))
        .unwrap()
        .prerequisites()
        .iter()
        .map(|p| p.to_str().unwrap())
        .collect();
    assert_eq!(prereqs, vec!["/src/x", "/src/y", "/src/z"]);
}

#[test]
fn dynamic_task_requires_a_manifest() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut graph = TaskGraph::new();
    graph.define_task("/out/a").dynamic(fixed_deps(Vec::new(), &calls));

    match graph.invoke(Path::new("/out/a"), None) {
        Err(AssetflowError::ManifestRequired { task }) => assert_eq!(task, "/out/a"),
        other => panic!("expected manifest required, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn dynamic_prerequisites_exclude_self_and_duplicates() {
    let tree = SourceTree::new();
    let out = tree.path("out/a.txt");
    let dep = tree.write("src/dep.txt", "d");
    let calls = Arc::new(AtomicUsize::new(0));

    let mut graph = TaskGraph::new();
    graph
        .define_task(out.clone())
        .dynamic(fixed_deps(vec![dep.clone(), out.clone(), dep.clone()], &calls));

    let deps = graph.dynamic_prerequisites(&out, None).unwrap();
    assert_eq!(deps, vec![dep]);

    // memoized until re-enabled
    graph.dynamic_prerequisites(&out, None).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    graph.reenable_all();
    graph.dynamic_prerequisites(&out, None).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn manifest_entry_records_dynamic_dependencies() {
    let tree = SourceTree::new();
    let src = tree.write("src/a.txt", "a");
    let dep = tree.write("src/dep.txt", "d");
    let out = tree.path("out/a.txt");
    let runs = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut graph = TaskGraph::new();
    graph
        .define_task(out.clone())
        .enhance([src])
        .set_action(concat_action(&runs))
        .dynamic(fixed_deps(vec![dep.clone()], &calls));

    let current = invoke(&mut graph, &out, &Manifest::new());

    let entry = current.get(&out).expect("entry for dynamic task");
    assert_eq!(entry.dep_paths(), vec![dep.clone()]);
    assert_eq!(Some(entry.deps[&dep]), assetflow::file::mtime_millis(&dep));
    assert_eq!(Some(entry.mtime), assetflow::file::mtime_millis(&out));
}

#[test]
fn unchanged_output_reuses_manifest_dependencies_without_discovery() {
    let tree = SourceTree::new();
    let src = tree.write("src/a.txt", "a");
    let dep = tree.write("src/dep.txt", "d");
    let out = tree.path("out/a.txt");
    let runs = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut graph = TaskGraph::new();
    graph
        .define_task(out.clone())
        .enhance([src])
        .set_action(concat_action(&runs))
        .dynamic(fixed_deps(vec![dep.clone()], &calls));

    let first = invoke(&mut graph, &out, &Manifest::new());
    assert_eq!((runs.load(Ordering::SeqCst), calls.load(Ordering::SeqCst)), (1, 1));

    graph.reenable_all();
    let second = invoke(&mut graph, &out, &first);
    assert_eq!((runs.load(Ordering::SeqCst), calls.load(Ordering::SeqCst)), (1, 1));
    assert_eq!(second, first);
}

#[test]
fn changed_dynamic_dependency_rebuilds_and_rediscovers() {
    let tree = SourceTree::new();
    let src = tree.write("src/a.txt", "a");
    let dep = tree.write("src/dep.txt", "d");
    let out = tree.path("out/a.txt");
    let runs = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut graph = TaskGraph::new();
    graph
        .define_task(out.clone())
        .enhance([src])
        .set_action(concat_action(&runs))
        .dynamic(fixed_deps(vec![dep], &calls));

    let first = invoke(&mut graph, &out, &Manifest::new());

    tree.touch("src/dep.txt");
    assert!(graph.needed(&out, Some(&first)));

    graph.reenable_all();
    invoke(&mut graph, &out, &first);
    assert_eq!((runs.load(Ordering::SeqCst), calls.load(Ordering::SeqCst)), (2, 2));
}

#[test]
fn missing_manifest_entry_makes_dynamic_task_needed() {
    let tree = SourceTree::new();
    let src = tree.write("src/a.txt", "a");
    let out = tree.path("out/a.txt");
    let runs = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut graph = TaskGraph::new();
    graph
        .define_task(out.clone())
        .enhance([src])
        .set_action(concat_action(&runs))
        .dynamic(fixed_deps(Vec::new(), &calls));

    invoke(&mut graph, &out, &Manifest::new());
    assert!(graph.needed(&out, Some(&Manifest::new())));
}

#[test]
fn vanished_dynamic_dependency_warns_and_rebuilds() {
    common::init_tracing();
    let tree = SourceTree::new();
    let src = tree.write("src/a.txt", "a");
    let dep = tree.write("src/dep.txt", "d");
    let out = tree.path("out/a.txt");
    let runs = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut graph = TaskGraph::new();
    graph
        .define_task(out.clone())
        .enhance([src])
        .set_action(concat_action(&runs))
        .dynamic(fixed_deps(vec![dep], &calls));

    let first = invoke(&mut graph, &out, &Manifest::new());
    tree.remove("src/dep.txt");

    graph.reenable_all();
    invoke(&mut graph, &out, &first);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn needed_for_unknown_path_tracks_existence() {
    let tree = SourceTree::new();
    let present = tree.write("src/a.txt", "a");
    let graph = TaskGraph::new();

    assert!(!graph.needed(&present, None));
    assert!(graph.needed(&tree.path("src/nope.txt"), None));
}

#[test]
fn reused_dynamic_dependencies_keep_discovery_order() {
    let tree = SourceTree::new();
    let src = tree.write("src/a.txt", "a");
    let late = tree.write("src/z_late.txt", "z");
    let early = tree.write("src/a_early.txt", "a");
    let out = tree.path("out/a.txt");
    let runs = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut graph = TaskGraph::new();
    graph
        .define_task(out.clone())
        .enhance([src])
        .set_action(concat_action(&runs))
        .dynamic(fixed_deps(vec![late.clone(), early.clone()], &calls));

    let first = invoke(&mut graph, &out, &Manifest::new());
    let path = tree.path("tmp/manifest.json");
    first.save(&path).unwrap();
    let loaded = Manifest::load(&path).unwrap();
    assert_eq!(loaded.get(&out).unwrap().dep_paths(), vec![late.clone(), early.clone()]);

    graph.reenable_all();
    let reused = graph.dynamic_prerequisites(&out, Some(&loaded)).unwrap();
    assert_eq!(reused, vec![late, early]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
