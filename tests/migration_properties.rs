use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use vault_to_ssm::migration::{
    classify_mount, classify_mounts, normalize, parameter_name, AggregateMap, MountEntries,
    TreeWalker,
};
use vault_to_ssm::source::{
    InMemorySource, KvVersion, Mount, MountInfo, SecretPath, SecretPayload,
};

fn payload_strategy() -> impl Strategy<Value = SecretPayload> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        ".{0,16}".prop_map(Value::String),
    ];
    let value = leaf.prop_recursive(2, 8, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    });
    prop::collection::btree_map("[a-z_]{1,8}", value, 1..6)
        .prop_map(|m| m.into_iter().collect::<SecretPayload>())
}

fn entries_strategy() -> impl Strategy<Value = MountEntries> {
    prop::collection::btree_map("[a-z]{1,4}/[a-z]{1,4}", ".{0,8}", 0..12)
}

proptest! {
    #[test]
    fn unrecognized_kinds_are_never_classified(kind in "[a-z]{1,10}", version in "[0-9]?") {
        prop_assume!(kind != "kv" && kind != "generic");
        let info = MountInfo::new(kind).with_option("version", version);
        prop_assert_eq!(classify_mount(&info), None);
    }

    #[test]
    fn legacy_kind_is_always_v1(version in proptest::option::of("[0-9a-z]{0,3}")) {
        let mut info = MountInfo::new("generic");
        if let Some(v) = version {
            info = info.with_option("version", v);
        }
        prop_assert_eq!(classify_mount(&info), Some(KvVersion::V1));
    }

    #[test]
    fn kv_kind_is_v1_only_for_version_one(version in proptest::option::of("[0-9a-z]{0,3}")) {
        let mut info = MountInfo::new("kv");
        if let Some(ref v) = version {
            info = info.with_option("version", v.clone());
        }
        let expected = if version.as_deref() == Some("1") { KvVersion::V1 } else { KvVersion::V2 };
        prop_assert_eq!(classify_mount(&info), Some(expected));
    }

    #[test]
    fn classified_set_is_subset_of_kv_mounts(
        kinds in prop::collection::hash_map(
            "[a-z]{1,6}/",
            prop::sample::select(vec!["kv", "generic", "pki", "transit", "aws"]),
            1..8,
        )
    ) {
        let mounts: HashMap<String, MountInfo> =
            kinds.iter().map(|(path, kind)| (path.clone(), MountInfo::new(*kind))).collect();
        let kv_count = kinds.values().filter(|k| matches!(**k, "kv" | "generic")).count();

        match classify_mounts(&mounts) {
            Ok(classified) => {
                prop_assert_eq!(classified.len(), kv_count);
                for mount in &classified {
                    let kind = kinds[&format!("{}/", mount.id)];
                    prop_assert!(kind == "kv" || kind == "generic");
                }
            }
            Err(_) => prop_assert_eq!(kv_count, 0),
        }
    }

    #[test]
    fn string_value_field_is_verbatim(value in ".{0,64}", extra in "[a-z]{1,6}") {
        let mut payload = SecretPayload::new();
        payload.insert("value".to_string(), Value::String(value.clone()));
        payload.insert(format!("x_{}", extra), json!(1));

        let flat = normalize(&SecretPath::new("secret", "k"), &payload).unwrap();
        prop_assert_eq!(flat, Some(value));
    }

    #[test]
    fn blob_round_trips(payload in payload_strategy()) {
        prop_assume!(!matches!(payload.get("value"), Some(Value::String(_))));

        let flat = normalize(&SecretPath::new("kv", "blob"), &payload).unwrap().unwrap();
        let decoded: SecretPayload = serde_json::from_str(&flat).unwrap();
        prop_assert_eq!(decoded, payload);
    }

    #[test]
    fn disjoint_merge_is_union(a in entries_strategy(), b in entries_strategy()) {
        let b: MountEntries = b.into_iter().filter(|(k, _)| !a.contains_key(k)).collect();

        let mut map = AggregateMap::new();
        map.merge(a.clone());
        map.merge(b.clone());

        prop_assert_eq!(map.len(), a.len() + b.len());
        let mut union: BTreeMap<String, String> = a;
        union.extend(b);
        prop_assert_eq!(map.into_inner(), union);
    }

    #[test]
    fn last_merge_wins(a in entries_strategy(), b in entries_strategy()) {
        let mut map = AggregateMap::new();
        map.merge(a.clone());
        map.merge(b.clone());

        for (key, value) in &b {
            prop_assert_eq!(map.get(key), Some(value.as_str()));
        }
        for (key, value) in a.iter().filter(|(k, _)| !b.contains_key(*k)) {
            prop_assert_eq!(map.get(key), Some(value.as_str()));
        }
    }

    #[test]
    fn parameter_names_have_one_leading_separator(key in "/{0,3}[a-z]{1,5}(/[a-z]{1,5}){0,3}") {
        let name = parameter_name(&key);
        prop_assert!(name.starts_with('/'));
        prop_assert!(!name.starts_with("//"));
        prop_assert_eq!(name.trim_start_matches('/'), key.trim_start_matches('/'));
    }

    #[test]
    fn walk_visits_every_leaf(
        leaves in prop::collection::btree_set("[a-c]{1,2}(/[a-c]{1,2}){0,3}", 1..10)
    ) {
        // A leaf name may not also be an interior prefix of another leaf.
        let leaves: Vec<String> = leaves
            .iter()
            .filter(|l| !leaves.iter().any(|o| o.starts_with(&format!("{}/", l))))
            .cloned()
            .collect();

        let mut source = InMemorySource::new().with_mount("kv/", MountInfo::new("kv"));
        for leaf in &leaves {
            let payload = json!({"value": leaf}).as_object().cloned().unwrap();
            source = source.with_secret(format!("kv/{}", leaf), payload);
        }
        let mount = Mount::new("kv", KvVersion::V2);

        let entries = tokio_test::block_on(TreeWalker::new(&source, &mount, 16).walk()).unwrap();

        prop_assert_eq!(entries.len(), leaves.len());
        for leaf in &leaves {
            prop_assert_eq!(entries.get(&format!("kv/{}", leaf)), Some(leaf));
        }
    }
}
