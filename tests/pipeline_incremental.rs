mod common;

use assetflow::errors::AssetflowError;
use assetflow::filter::{ConcatFilter, fixed_namer};
use assetflow::manifest::{Manifest, MemoryManifestStore};
use assetflow::{FilterStage, Pipeline};
use common::{IncludeFilter, SourceTree, SwitchableFilter, UppercaseFilter};

fn include_pipeline(tree: &SourceTree, filter: IncludeFilter) -> Pipeline {
    include_pipeline_from(tree, "app", "public", filter)
}

fn include_pipeline_from(tree: &SourceTree, src: &str, out: &str, filter: IncludeFilter) -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline
        .add_input(tree.path(src), Some("*.js"))
        .set_output_root(tree.path(out))
        .set_tmp_root(tree.path("tmp"))
        .add_stage(FilterStage::new(filter));
    pipeline
}

fn write_include_sources(tree: &SourceTree) {
    tree.write("app/main.js", "#include \"partials/header.inc\"\nmain();\n");
    tree.write("app/partials/header.inc", "// header v1\n");
}

#[test]
fn second_invoke_rebuilds_nothing() {
    common::init_tracing();
    let tree = SourceTree::new();
    tree.write("app/a.js", "a();\n");
    tree.write("app/b.js", "b();\n");

    let mut pipeline = tree.pipeline("app", "public");
    pipeline.add_stage(FilterStage::new(ConcatFilter::new()).with_namer(fixed_namer("app.js")));

    pipeline.invoke().unwrap();
    assert_eq!(tree.read("public/app.js"), "a();\nb();\n");
    let built = tree.mtime("public/app.js");

    pipeline.invoke().unwrap();
    assert_eq!(tree.mtime("public/app.js"), built);
}

#[test]
fn changed_input_rebuilds_only_its_outputs() {
    let tree = SourceTree::new();
    tree.write("app/a.js", "a\n");
    tree.write("app/b.js", "b\n");

    let mut pipeline = tree.pipeline("app", "public");
    pipeline.add_stage(FilterStage::new(UppercaseFilter));
    pipeline.invoke().unwrap();
    let untouched = tree.mtime("public/b.js");

    tree.modify("app/a.js", "a2\n");
    pipeline.invoke().unwrap();

    assert_eq!(tree.read("public/a.js"), "A2\n");
    assert_eq!(tree.mtime("public/b.js"), untouched);
}

#[test]
fn stages_chain_through_temp_directories() {
    let tree = SourceTree::new();
    tree.write("app/a.js", "a\n");
    tree.write("app/b.js", "b\n");

    let mut pipeline = tree.pipeline("app", "public");
    pipeline
        .add_stage(FilterStage::new(UppercaseFilter))
        .add_stage(FilterStage::new(ConcatFilter::new()).with_namer(fixed_namer("all.js")));
    pipeline.invoke().unwrap();

    assert_eq!(tree.read("public/all.js"), "A\nB\n");
    let tmp = pipeline.stages()[0].output_root().unwrap().to_path_buf();
    assert!(tmp.starts_with(tree.path("tmp/assetflow")));
    assert!(tmp.join("a.js").is_file());
    assert!(!tree.exists("public/a.js"));
}

#[test]
fn invoke_clean_picks_up_added_and_removed_inputs() {
    let tree = SourceTree::new();
    tree.write("app/a.js", "a\n");
    tree.write("app/b.js", "b\n");

    let mut pipeline = tree.pipeline("app", "public");
    pipeline.add_stage(FilterStage::new(ConcatFilter::new()).with_namer(fixed_namer("app.js")));
    pipeline.invoke().unwrap();

    tree.modify("app/c.js", "c\n");
    pipeline.invoke().unwrap();
    assert_eq!(tree.read("public/app.js"), "a\nb\n", "plain invoke keeps the cached file list");

    pipeline.invoke_clean().unwrap();
    assert_eq!(tree.read("public/app.js"), "a\nb\nc\n");

    tree.remove("app/b.js");
    tree.touch("app/a.js");
    pipeline.invoke_clean().unwrap();
    assert_eq!(tree.read("public/app.js"), "a\nc\n");
}

#[test]
fn dynamic_dependencies_are_discovered_recorded_and_reused() {
    let tree = SourceTree::new();
    write_include_sources(&tree);

    let filter = IncludeFilter::new();
    let mut pipeline = include_pipeline(&tree, filter.clone());

    pipeline.invoke().unwrap();
    assert_eq!(tree.read("public/main.js"), "// header v1\nmain();\n");
    assert_eq!(filter.discovery_count(), 1);

    let manifest = Manifest::load(&pipeline.manifest_path()).unwrap();
    let entry = manifest.get(&tree.path("public/main.js")).expect("manifest entry");
    assert_eq!(entry.dep_paths(), vec![tree.path("app/partials/header.inc")]);

    let built = tree.mtime("public/main.js");
    pipeline.invoke().unwrap();
    assert_eq!(filter.discovery_count(), 1, "unchanged output reuses the manifest");
    assert_eq!(tree.mtime("public/main.js"), built);
}

#[test]
fn manifest_on_disk_survives_a_new_pipeline() {
    let tree = SourceTree::new();
    write_include_sources(&tree);

    include_pipeline(&tree, IncludeFilter::new()).invoke().unwrap();
    let built = tree.mtime("public/main.js");

    let fresh = IncludeFilter::new();
    include_pipeline(&tree, fresh.clone()).invoke().unwrap();

    assert_eq!(fresh.discovery_count(), 0);
    assert_eq!(tree.mtime("public/main.js"), built);
}

#[test]
fn changed_dynamic_dependency_rebuilds_the_includer() {
    let tree = SourceTree::new();
    write_include_sources(&tree);

    let filter = IncludeFilter::new();
    let mut pipeline = include_pipeline(&tree, filter.clone());
    pipeline.invoke().unwrap();

    tree.modify("app/partials/header.inc", "// header v2\n");
    pipeline.invoke().unwrap();

    assert_eq!(tree.read("public/main.js"), "// header v2\nmain();\n");
    assert_eq!(filter.discovery_count(), 2);
}

#[test]
fn new_include_is_tracked_after_rediscovery() {
    let tree = SourceTree::new();
    write_include_sources(&tree);
    tree.write("app/partials/footer.inc", "// footer v1\n");

    let mut pipeline = include_pipeline(&tree, IncludeFilter::new());
    pipeline.invoke().unwrap();

    tree.modify(
        "app/main.js",
        "#include \"partials/header.inc\"\nmain();\n#include \"partials/footer.inc\"\n",
    );
    pipeline.invoke().unwrap();
    assert_eq!(tree.read("public/main.js"), "// header v1\nmain();\n// footer v1\n");

    tree.modify("app/partials/footer.inc", "// footer v2\n");
    pipeline.invoke().unwrap();
    assert_eq!(tree.read("public/main.js"), "// header v1\nmain();\n// footer v2\n");
}

#[test]
fn static_only_build_writes_no_manifest() {
    let tree = SourceTree::new();
    tree.write("app/a.js", "a\n");

    let mut pipeline = tree.pipeline("app", "public");
    pipeline.add_stage(FilterStage::new(ConcatFilter::new()));
    pipeline.invoke().unwrap();

    assert!(tree.exists("public/a.js"));
    assert!(!pipeline.manifest_path().exists());
}

#[test]
fn memory_store_keeps_state_off_disk() {
    let tree = SourceTree::new();
    write_include_sources(&tree);

    let filter = IncludeFilter::new();
    let mut pipeline =
        include_pipeline(&tree, filter.clone()).with_manifest_store(Box::new(MemoryManifestStore::new()));
    pipeline.invoke().unwrap();
    pipeline.invoke().unwrap();

    assert!(!pipeline.manifest_path().exists());
    assert_eq!(filter.discovery_count(), 1);
}

#[test]
fn failed_build_surfaces_the_error_and_recovers() {
    let tree = SourceTree::new();
    tree.write("app/a.js", "a\n");

    let filter = SwitchableFilter::new();
    let mut pipeline = tree.pipeline("app", "public");
    pipeline.add_stage(FilterStage::new(filter.clone()));
    pipeline.invoke().unwrap();

    filter.set_failing(true);
    tree.modify("app/a.js", "a2\n");
    assert!(matches!(pipeline.invoke(), Err(AssetflowError::Other(_))));

    filter.set_failing(false);
    pipeline.invoke().unwrap();
    assert_eq!(tree.read("public/a.js"), "a2\n");
    assert_eq!(filter.run_count(), 3);
}

#[test]
fn pipeline_needs_inputs_and_an_output_root() {
    let tree = SourceTree::new();
    tree.write("app/a.js", "a\n");

    let mut no_inputs = Pipeline::new();
    no_inputs.set_output_root(tree.path("public"));
    assert!(matches!(no_inputs.invoke(), Err(AssetflowError::MissingInputConfiguration)));

    let mut no_output = Pipeline::new();
    no_output.add_input(tree.path("app"), None);
    assert!(matches!(no_output.invoke(), Err(AssetflowError::ConfigError(_))));
}

#[test]
fn pipelines_sharing_a_temp_dir_keep_each_others_manifest_entries() {
    let tree = SourceTree::new();
    tree.write("one/main.js", "#include \"head.inc\"\none();\n");
    tree.write("one/head.inc", "// one\n");
    tree.write("two/main.js", "#include \"head.inc\"\ntwo();\n");
    tree.write("two/head.inc", "// two\n");

    include_pipeline_from(&tree, "one", "public/one", IncludeFilter::new()).invoke().unwrap();
    include_pipeline_from(&tree, "two", "public/two", IncludeFilter::new()).invoke().unwrap();
    let built_one = tree.mtime("public/one/main.js");
    let built_two = tree.mtime("public/two/main.js");

    let manifest = Manifest::load(&tree.path("tmp/assetflow/manifest.json")).unwrap();
    assert!(manifest.get(&tree.path("public/one/main.js")).is_some());
    assert!(manifest.get(&tree.path("public/two/main.js")).is_some());

    let (one, two) = (IncludeFilter::new(), IncludeFilter::new());
    include_pipeline_from(&tree, "one", "public/one", one.clone()).invoke().unwrap();
    include_pipeline_from(&tree, "two", "public/two", two.clone()).invoke().unwrap();

    assert_eq!((one.discovery_count(), two.discovery_count()), (0, 0));
    assert_eq!(tree.mtime("public/one/main.js"), built_one);
    assert_eq!(tree.mtime("public/two/main.js"), built_two);
    assert_eq!(tree.read("public/two/main.js"), "// two\ntwo();\n");
}
