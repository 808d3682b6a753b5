use std::collections::HashSet;

use proptest::prelude::*;
use slurp::Build;
use slurp_test_utils::{Recorder, task};

// Task `i` may only depend on tasks `0..i`, so every generated graph is
// acyclic and registrable in index order.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = (Vec<Vec<usize>>, usize)> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, candidates)| {
                    if i == 0 {
                        return Vec::new();
                    }
                    let mut seen = HashSet::new();
                    candidates
                        .into_iter()
                        .map(|c| c % i)
                        .filter(|d| seen.insert(*d))
                        .collect()
                })
                .collect::<Vec<Vec<usize>>>()
        });
        (deps, 0..num_tasks)
    })
}

fn name(i: usize) -> String {
    format!("task_{i}")
}

/// Number of dependency paths from `target` to every task. Tasks are
/// re-run once per path, since nothing is memoised.
fn path_counts(deps: &[Vec<usize>], target: usize) -> Vec<usize> {
    let mut paths = vec![0; deps.len()];
    paths[target] = 1;
    for i in (0..=target).rev() {
        for &d in &deps[i] {
            paths[d] += paths[i];
        }
    }
    paths
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_reachable_task_runs_after_its_dependencies((deps, target) in dag_strategy(7)) {
        let rec = Recorder::new();
        let mut b = Build::new();
        for (i, task_deps) in deps.iter().enumerate() {
            let dep_names: Vec<String> = task_deps.iter().map(|&d| name(d)).collect();
            let dep_refs: Vec<&str> = dep_names.iter().map(String::as_str).collect();
            b.register([task(&name(i), &dep_refs, rec.action(&name(i)))]).unwrap();
        }
        let session = b.into_session();

        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(session.run(&session.context(), [name(target)])).unwrap();

        let events = rec.events();
        let paths = path_counts(&deps, target);
        for (i, expected) in paths.iter().enumerate() {
            prop_assert_eq!(rec.count(&name(i)), *expected, "run count of {}", name(i));
        }

        // The k-th run of a task is preceded by at least k runs of each of
        // its dependencies.
        for (i, task_deps) in deps.iter().enumerate() {
            let own = name(i);
            let mut seen_own = 0;
            for (pos, event) in events.iter().enumerate() {
                if *event != own {
                    continue;
                }
                seen_own += 1;
                for &d in task_deps {
                    let before = events[..pos].iter().filter(|e| **e == name(d)).count();
                    prop_assert!(before >= seen_own, "{} ran before {}", own, name(d));
                }
            }
        }
    }
}
