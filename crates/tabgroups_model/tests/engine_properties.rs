//! End-to-end behavior of the tab group engine across groups, branches and
//! persisted forms.

use std::collections::BTreeSet;

use tabgroups_model::{
    BranchStore, DEFAULT_GROUP_LABEL, TabItem, TabsGroup, TabsState, detect_import,
    ImportedData,
};

fn tabs(paths: &[&str]) -> Vec<TabItem> {
    paths.iter().map(|p| TabItem::new(*p, None, None)).collect()
}

fn paths_of(state: &TabsState, id: &str) -> Vec<String> {
    state
        .group(id)
        .map(|g| g.tabs().iter().map(TabItem::path).collect())
        .unwrap_or_default()
}

fn ids_of(state: &TabsState, id: &str) -> Vec<String> {
    state
        .group(id)
        .map(|g| g.tabs().iter().map(|t| t.id().to_string()).collect())
        .unwrap_or_default()
}

#[test]
fn deleted_file_is_swept_from_every_group() {
    let mut state = TabsState::new();
    let g1 = TabsGroup::with_tabs(Some("G1".into()), tabs(&["/a.ts", "/b.ts"]));
    let g2 = TabsGroup::with_tabs(Some("G2".into()), tabs(&["/b.ts", "/c.ts"]));
    let (id1, id2) = (g1.id().to_string(), g2.id().to_string());
    state.add_tabs_group(g1);
    state.add_tabs_group(g2);

    state.remove_tab_from_all_groups("/b.ts");

    assert_eq!(paths_of(&state, &id1), vec!["/a.ts"]);
    assert_eq!(paths_of(&state, &id2), vec!["/c.ts"]);
    assert!(state.index().get("/b.ts").is_none());
    assert_eq!(
        state.index().get("/a.ts").cloned(),
        Some(BTreeSet::from([id1.clone()]))
    );
    assert_eq!(
        state.index().get("/c.ts").cloned(),
        Some(BTreeSet::from([id2.clone()]))
    );
}

#[test]
fn merging_unpinned_group_consumes_it() {
    let mut state = TabsState::new();
    let a = state.create_group(Some("groupA".into()), tabs(&["/1", "/2"]));
    let b = state.create_group(Some("groupB".into()), tabs(&["/3", "/4"]));

    state.merge_tabs_group(&a, &[b.clone()]);

    assert_eq!(paths_of(&state, &a).len(), 4);
    assert!(state.group(&b).is_none());
    assert!(state.group(&a).unwrap().label().ends_with("(merged with: groupB)"));
}

#[test]
fn merging_pinned_group_leaves_it_emptied() {
    let mut state = TabsState::new();
    let a = state.create_group(Some("groupA".into()), tabs(&["/1", "/2"]));
    let b = state.create_group(Some("groupB".into()), tabs(&["/3", "/4"]));
    state.set_pinned(&b, true);

    state.merge_tabs_group(&a, &[b.clone()]);

    assert_eq!(paths_of(&state, &a).len(), 4);
    assert!(state.group(&b).is_some_and(|g| g.is_empty() && g.is_pinned()));
    assert!(state.verify_index());
}

#[test]
fn pinned_group_survives_every_removal_path_but_explicit_delete() {
    let mut state = TabsState::new();
    let id = state.create_group(Some("Keep".into()), tabs(&["/a", "/b"]));
    state.set_pinned(&id, true);

    state.remove_tab_from_group(&id, "/a");
    state.remove_tab_from_all_groups("/b");
    assert!(state.group(&id).is_some_and(TabsGroup::is_empty));

    assert!(!state.try_remove_tabs_group(&id));
    state.add_tabs_to_group(&id, tabs(&["/c"]));
    assert!(!state.try_remove_tabs_group(&id));
    assert!(state.group(&id).is_some());

    assert!(state.remove_tabs_group(&id).is_some());
    assert!(state.is_empty());
}

#[test]
fn clone_is_independent_of_source() {
    let mut state = TabsState::new();
    let id = state.create_group(Some("Original".into()), tabs(&["/a", "/b"]));
    let original_ids = ids_of(&state, &id);

    let mut clone = state.deep_clone(false);
    let clone_id = clone.sorted_groups()[0].id().to_string();
    clone.set_group_label(&clone_id, "Changed");

    assert_eq!(state.group(&id).unwrap().label(), "Original");
    assert_eq!(ids_of(&state, &id), original_ids);
    let clone_ids = ids_of(&clone, &clone_id);
    assert!(clone_ids.iter().all(|t| !original_ids.contains(t)));
}

#[test]
fn sort_order_ignores_insertion_order_and_creation_skew() {
    let build = |label: &str, pinned: bool, tags: &[&str], created: i64| {
        let mut g = TabsGroup::with_tabs(Some(label.to_string()), tabs(&["/x"]));
        g.set_pin(pinned);
        g.set_tags(tags.iter().map(|t| t.to_string()).collect());
        g.set_create_time(created);
        g
    };

    let orders: [[usize; 4]; 3] = [[0, 1, 2, 3], [3, 2, 1, 0], [2, 0, 3, 1]];
    for order in orders {
        let groups = [
            build("pinned", true, &["t"], 1),
            build("tagged", false, &["t"], 2),
            build("named", false, &[], 3),
            build(DEFAULT_GROUP_LABEL, false, &[], 4),
        ];
        let mut state = TabsState::new();
        for i in order {
            state.add_tabs_group(groups[i].clone());
        }
        let labels: Vec<&str> = state.sorted_groups().iter().map(|g| g.label()).collect();
        assert_eq!(labels, vec!["pinned", "tagged", "named", DEFAULT_GROUP_LABEL]);
    }
}

#[test]
fn persisted_form_round_trips() {
    let mut state = TabsState::new();
    let a = state.create_group(Some("A".into()), tabs(&["/1", "/2", "/3"]));
    let b = state.create_group(None, tabs(&["/4"]));
    state.set_group_tags(&a, vec!["b".into(), "a".into(), "c".into()]);
    state.set_pinned(&b, true);
    state.add_to_blacklist("/node_modules/*");
    state.add_to_blacklist("/dist/*");

    let back = TabsState::from_json(&state.to_json().unwrap()).unwrap();

    for id in [&a, &b] {
        let (orig, copy) = (state.group(id).unwrap(), back.group(id).unwrap());
        assert_eq!(copy.label(), orig.label());
        assert_eq!(copy.is_pinned(), orig.is_pinned());
        assert_eq!(copy.tags(), orig.tags());
        assert_eq!(ids_of(&back, id), ids_of(&state, id));
        assert_eq!(paths_of(&back, id), paths_of(&state, id));
    }
    assert_eq!(back.blacklist(), state.blacklist());
    assert!(back.verify_index());
}

#[test]
fn branches_stay_isolated_from_active_state() {
    let mut active = TabsState::new();
    let id = active.create_group(Some("Work".into()), tabs(&["/a", "/b"]));
    let mut store = BranchStore::new();

    store.archive("x", active.deep_clone(true));
    active.remove_tab_from_group(&id, "/a");
    active.set_group_label(&id, "Edited");
    let archived = store.get("x").unwrap().group(&id).unwrap();
    assert_eq!(archived.label(), "Work");
    assert_eq!(archived.len(), 2);

    let mut restored = store.restore("x").unwrap();
    let restored_id = restored.sorted_groups()[0].id().to_string();
    restored.remove_tab_from_all_groups("/b");
    restored.set_group_label(&restored_id, "Also edited");
    let archived = store.get("x").unwrap().group(&id).unwrap();
    assert_eq!(archived.label(), "Work");
    assert_eq!(archived.len(), 2);
    assert!(store.get("x").unwrap().verify_index());
}

#[test]
fn exported_branches_import_back() {
    let mut store = BranchStore::new();
    let mut state = TabsState::new();
    state.create_group(Some("Feature".into()), tabs(&["/f.rs"]));
    store.archive("feature/x", state);

    match detect_import(&store.to_json().unwrap()).unwrap() {
        ImportedData::Branches(imported) => {
            let restored = imported.restore("feature/x").unwrap();
            assert!(restored.contains_path("/f.rs"));
        }
        ImportedData::State(_) => panic!("branch store detected as state"),
    }
}
