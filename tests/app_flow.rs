use tabgroups::commands::{self, GroupTarget};
use tabgroups::{AppContext, ImportSummary, Settings};
use tabgroups_model::{GroupingProposal, ProposedGroup, TabInput};
use tabgroups_store::{BranchSwitch, MemoryStorage, TabsStore};
use tempfile::TempDir;

fn memory_context() -> AppContext<MemoryStorage> {
    AppContext::with_store(Settings::default(), TabsStore::open(MemoryStorage::new(), 0))
}

fn save(ctx: &AppContext<MemoryStorage>, label: &str, paths: &[&str]) -> String {
    let inputs = paths.iter().map(|p| TabInput::text(*p)).collect();
    commands::save_tabs(ctx, inputs, GroupTarget::New { label: Some(label.into()) })
        .unwrap()
        .unwrap()
        .group_id
}

#[test]
fn deleted_file_is_swept_and_pinned_group_survives() {
    let ctx = memory_context();
    let only_b = save(&ctx, "Only b", &["/b.ts"]);
    let pinned = save(&ctx, "Pinned", &["/b.ts"]);
    let mixed = save(&ctx, "Mixed", &["/a.ts", "/b.ts"]);
    ctx.store().update(|s| s.set_pinned(&pinned, true)).unwrap();

    let touched = ctx.on_file_deleted("/b.ts").unwrap();
    assert_eq!(touched.len(), 3);

    ctx.store().read(|s| {
        assert!(s.group(&only_b).is_none());
        assert!(s.group(&pinned).is_some_and(|g| g.is_empty()));
        assert_eq!(s.group(&mixed).map(|g| g.paths()), Some(vec!["/a.ts".to_string()]));
        assert!(!s.contains_path("/b.ts"));
        assert!(s.verify_index());
    });
}

#[test]
fn branch_round_trip_restores_groups() {
    let ctx = memory_context();
    ctx.set_current_branch(Some("main".into()));
    save(&ctx, "Main work", &["/main.rs"]);

    assert_eq!(ctx.on_branch_changed("feature").unwrap(), BranchSwitch::Fresh);
    assert!(ctx.store().read(|s| s.is_empty()));
    save(&ctx, "Feature work", &["/feature.rs"]);

    assert_eq!(
        ctx.on_branch_changed("main").unwrap(),
        BranchSwitch::Restored { groups: 1 }
    );
    assert!(ctx.store().read(|s| s.contains_path("/main.rs")));
    assert!(!ctx.store().read(|s| s.contains_path("/feature.rs")));
    assert_eq!(ctx.current_branch().as_deref(), Some("main"));

    let mut branches = ctx.store().list_branches();
    branches.sort();
    assert_eq!(branches, vec!["feature", "main"]);
}

#[test]
fn proposal_groups_open_tabs() {
    let ctx = memory_context();
    let proposal = GroupingProposal {
        groups: vec![
            ProposedGroup {
                label: "Docs".into(),
                tags: vec!["docs".into()],
                paths: vec!["/README.md".into(), "/missing.md".into()],
            },
            ProposedGroup {
                label: "Empty".into(),
                tags: Vec::new(),
                paths: vec!["/nowhere.rs".into()],
            },
        ],
    };
    let open = vec![TabInput::text("/README.md"), TabInput::text("/src/lib.rs")];
    let created = commands::apply_grouping(&ctx, &proposal, open).unwrap();

    assert_eq!(created.len(), 1);
    let listing = commands::listing(&ctx);
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].label, "Docs");
    assert_eq!(listing[0].tags, vec!["docs"]);
}

#[test]
fn export_then_import_into_another_profile() {
    let temp = TempDir::new().unwrap();
    let export_path = temp.path().join("export.json");

    let source = memory_context();
    let id = save(&source, "Shared", &["/a.rs", "/b.rs"]);
    source.store().update(|s| s.add_to_blacklist("*.lock")).unwrap();
    commands::export_state(&source, &export_path).unwrap();

    let target = memory_context();
    let summary = commands::import_file(&target, &export_path).unwrap();
    assert_eq!(summary, ImportSummary::Groups(1));

    target.store().read(|s| {
        assert_eq!(s.len(), 1);
        assert!(s.group(&id).is_none(), "imported groups get fresh ids");
        assert!(s.contains_path("/b.rs"));
        assert!(s.is_blacklisted("Cargo.lock"));
        assert!(s.verify_index());
    });
}

#[test]
fn branch_export_imports_as_branches() {
    let temp = TempDir::new().unwrap();
    let export_path = temp.path().join("branches.json");

    let source = memory_context();
    source.set_current_branch(Some("main".into()));
    save(&source, "Main", &["/m.rs"]);
    source.on_branch_changed("dev").unwrap();
    commands::export_branches(&source, &export_path).unwrap();

    let target = memory_context();
    let summary = commands::import_file(&target, &export_path).unwrap();
    assert_eq!(summary, ImportSummary::Branches(1));
    assert!(
        target
            .store()
            .branch_snapshot("main")
            .is_some_and(|s| s.contains_path("/m.rs"))
    );
}

#[test]
fn unrecognized_import_file_is_reported() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bogus.json");
    std::fs::write(&path, r#"{"windows": [1, 2, 3]}"#).unwrap();

    let ctx = memory_context();
    let err = commands::import_file(&ctx, &path).unwrap_err();
    assert!(format!("{err:#}").contains("bogus.json"));
    assert!(ctx.store().read(|s| s.is_empty()));
}

#[test]
fn file_backed_context_persists_across_reopen() {
    let temp = TempDir::new().unwrap();
    let settings = Settings {
        storage_root: Some(temp.path().to_path_buf()),
        debounce_ms: 50,
        blacklist: vec!["*.tmp".into()],
        ..Settings::default()
    };

    {
        let ctx = AppContext::open(settings.clone());
        commands::save_tabs(
            &ctx,
            vec![TabInput::text("/keep.rs"), TabInput::text("/scratch.tmp")],
            GroupTarget::New { label: None },
        )
        .unwrap();
        ctx.flush().unwrap();
    }

    let ctx = AppContext::open(settings);
    let groups = commands::listing(&ctx);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].label, "Untitled tabs group 1");
    assert_eq!(groups[0].tabs.len(), 1);
    assert_eq!(groups[0].tabs[0].path, "/keep.rs");
}

#[test]
fn imported_group_keeps_one_tab_per_path() {
    let ctx = memory_context();
    let json = r#"{"groups": {"g": {"label": "Dupes", "tabs": [
        {"uri": "/x.rs"}, {"uri": "file:///x.rs"}, {"uri": "/y.rs"}
    ]}}}"#;
    assert_eq!(ctx.import_json(json).unwrap(), ImportSummary::Groups(1));

    let listing = commands::listing(&ctx);
    let paths: Vec<&str> = listing[0].tabs.iter().map(|t| t.path.as_str()).collect();
    assert_eq!(paths, vec!["/x.rs", "/y.rs"]);
    assert!(ctx.store().read(|s| s.verify_index()));
}
