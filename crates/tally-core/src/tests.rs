#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::cell::*;
    use crate::composer::*;
    use crate::config::*;
    use crate::error::StateError;
    use crate::host::Host;
    use crate::runtime::*;
    use crate::scope::*;
    use crate::update::{Initial, Update};
    use crate::view::*;

    fn counter(cell: &StateCell<i32>) -> Rc<Cell<usize>> {
        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        cell.subscribe(move |_| hits_clone.set(hits_clone.get() + 1));
        hits
    }

    #[test]
    fn test_read_after_construction() {
        for v in [-7, 0, 1, i32::MAX] {
            assert_eq!(state_cell(v).read(), v);
        }
        assert_eq!(create_state_cell(Initial::Value(3u8)).read(), 3);
        assert_eq!(create_state_cell(Initial::producer(|| 9u8)).read(), 9);
    }

    #[test]
    fn test_functional_requests_fold_in_order() {
        let cell = state_cell(2);
        batch(|| {
            cell.update(|n| n + 1);
            cell.update(|n| n * 10);
            cell.update(|n| n - 3);
        });
        assert_eq!(cell.read(), 27);
    }

    #[test]
    fn test_stale_literals_collapse() {
        let cell = state_cell(5);
        batch(|| {
            let n = cell.read();
            cell.set(n + 1);
            cell.set(n + 1);
            cell.set(n + 1);
        });
        assert_eq!(cell.read(), 6);
    }

    #[test]
    fn test_functional_increments_accumulate() {
        let cell = state_cell(0);
        batch(|| {
            cell.update(|n| n + 1);
            cell.update(|n| n + 1);
            cell.update(|n| n + 1);
        });
        assert_eq!(cell.read(), 3);
    }

    #[test]
    fn test_literal_discards_earlier_requests_in_batch() {
        let cell = state_cell(1);
        batch(|| {
            cell.update(|n| n + 100);
            cell.set(10);
            cell.update(|n| n * 2);
        });
        assert_eq!(cell.read(), 20);
    }

    #[test]
    fn test_reads_inside_batch_see_committed_value() {
        let cell = state_cell(0);
        let seen = RefCell::new(Vec::new());
        batch(|| {
            cell.update(|n| n + 1);
            seen.borrow_mut().push(cell.read());
            cell.update(|n| n + 1);
            seen.borrow_mut().push(cell.read());
            assert_eq!(cell.pending_len(), 2);
        });
        assert_eq!(*seen.borrow(), vec![0, 0]);
        assert_eq!(cell.read(), 2);
        assert!(!cell.has_pending());
    }

    #[test]
    fn test_producer_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let cell = state_cell_with({
            let calls = calls.clone();
            move || {
                calls.set(calls.get() + 1);
                42
            }
        });
        for _ in 0..10 {
            assert_eq!(cell.read(), 42);
        }
        batch(|| cell.update(|n| n + 1));
        assert_eq!(cell.read(), 43);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_observer_fires_once_per_commit() {
        let cell = state_cell(0);
        let hits = counter(&cell);

        batch(|| {
            cell.update(|n| n + 1);
            cell.update(|n| n + 1);
            cell.update(|n| n + 1);
        });
        assert_eq!(hits.get(), 1);

        batch(|| cell.set(10));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_observer_skipped_when_value_unchanged() {
        let cell = state_cell(4);
        let hits = counter(&cell);

        batch(|| {
            cell.update(|n| n + 1);
            cell.update(|n| n - 1);
        });
        assert_eq!(hits.get(), 0);

        batch(|| cell.set(4));
        assert_eq!(hits.get(), 0);
        assert_eq!(cell.read(), 4);
    }

    #[test]
    fn test_observer_sees_committed_value() {
        let cell = state_cell(String::from("a"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            let reader = cell.clone();
            cell.subscribe(move |v| {
                seen.borrow_mut().push((v.clone(), reader.read()));
            });
        }
        batch(|| cell.update(|s| format!("{s}b")));
        assert_eq!(*seen.borrow(), vec![("ab".to_string(), "ab".to_string())]);
    }

    #[test]
    fn test_independent_cells() {
        let a = state_cell(0);
        let b = state_cell(0);
        let a_hits = counter(&a);
        let b_hits = counter(&b);

        batch(|| a.update(|n| n + 5));
        assert_eq!(a.read(), 5);
        assert_eq!(b.read(), 0);
        assert_eq!(a_hits.get(), 1);
        assert_eq!(b_hits.get(), 0);
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn test_explicit_commit_outside_batch() {
        let cell = state_cell(0);
        let hits = counter(&cell);

        cell.update(|n| n + 1);
        cell.set(7);
        assert_eq!(cell.read(), 0);
        assert!(cell.has_pending());

        assert!(cell.commit_batch());
        assert_eq!(cell.read(), 7);
        assert_eq!(hits.get(), 1);

        // the runtime still holds the stale schedule entry; it commits nothing
        let report = flush().unwrap();
        assert_eq!(report.commits, 0);
        assert_eq!(hits.get(), 1);

        assert!(!cell.commit_batch());
    }

    #[test]
    fn test_nested_batches_join_the_outer_turn() {
        let cell = state_cell(0);
        let hits = counter(&cell);
        batch(|| {
            cell.update(|n| n + 1);
            batch(|| cell.update(|n| n + 1));
            assert!(in_batch());
            assert_eq!(cell.read(), 0);
            cell.update(|n| n + 1);
        });
        assert!(!in_batch());
        assert_eq!(cell.read(), 3);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_turn_reports_commits() {
        let a = state_cell(0);
        let b = state_cell(0);
        let report = turn(|| {
            a.set(1);
            b.set(0);
        })
        .unwrap();
        assert_eq!(
            report,
            FlushReport {
                passes: 1,
                commits: 2,
                notified: 1,
            }
        );
    }

    #[test]
    fn test_observer_requests_run_in_follow_up_pass() {
        let source = state_cell(0);
        let doubled = state_cell(0);
        {
            let doubled = doubled.clone();
            source.subscribe(move |v| doubled.set(v * 2));
        }
        let report = turn(|| source.set(5)).unwrap();
        assert_eq!(report.passes, 2);
        assert_eq!(report.commits, 2);
        assert_eq!(doubled.read(), 10);
    }

    #[test]
    fn test_flush_limit() {
        let cell = state_cell(0);
        {
            let again = cell.clone();
            cell.subscribe(move |v| again.set(v + 1));
        }
        let strict = RuntimeConfig {
            max_flush_passes: 3,
            ..RuntimeConfig::default()
        };
        let result = with_runtime_config(strict, || turn(|| cell.set(1)));
        assert_eq!(result, Err(StateError::FlushLimit { passes: 3 }));
        assert_eq!(cell.read(), 3);
        assert!(cell.has_pending());
        assert_eq!(scheduled_len(), 1);
    }

    #[test]
    fn test_shallow_equality_uses_pointer_identity() {
        let list = state_cell(Rc::new(vec![1, 2]));
        let hits = Rc::new(Cell::new(0));
        {
            let hits = hits.clone();
            list.subscribe(move |_| hits.set(hits.get() + 1));
        }

        // same contents, new allocation: a change
        batch(|| list.set(Rc::new(vec![1, 2])));
        assert_eq!(hits.get(), 1);

        // same handle: not a change
        let same = list.read();
        batch(|| list.set(same));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_structural_equality_opt_in() {
        let list = state_cell(Rc::new(vec![1, 2])).structural();
        let hits = Rc::new(Cell::new(0));
        {
            let hits = hits.clone();
            list.subscribe(move |_| hits.set(hits.get() + 1));
        }
        batch(|| list.set(Rc::new(vec![1, 2])));
        assert_eq!(hits.get(), 0);
        batch(|| list.update(|v| Rc::new([v.as_slice(), &[3][..]].concat())));
        assert_eq!(hits.get(), 1);
        assert_eq!(*list.read(), vec![1, 2, 3]);
    }

    #[test]
    fn test_always_notify() {
        let cell = state_cell(1).always_notify();
        let hits = counter(&cell);
        batch(|| cell.set(1));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let cell = state_cell(0);
        let hits = Rc::new(Cell::new(0));
        let id = {
            let hits = hits.clone();
            cell.subscribe(move |_| hits.set(hits.get() + 1))
        };
        batch(|| cell.set(1));
        assert!(cell.unsubscribe(id));
        assert!(!cell.unsubscribe(id));
        batch(|| cell.set(2));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_commit_listener() {
        let infos = Rc::new(RefCell::new(Vec::new()));
        let id = {
            let infos = infos.clone();
            on_commit(move |info| infos.borrow_mut().push(*info))
        };
        let cell = state_cell(0).label("clicks");
        batch(|| {
            cell.update(|n| n + 1);
            cell.update(|n| n + 1);
        });
        batch(|| cell.set(2));
        assert!(remove_commit_listener(id));
        batch(|| cell.set(3));

        assert_eq!(
            *infos.borrow(),
            vec![
                CommitInfo {
                    label: "clicks",
                    requests: 2,
                    changed: true,
                },
                CommitInfo {
                    label: "clicks",
                    requests: 1,
                    changed: false,
                },
            ]
        );
    }

    #[test]
    fn test_dropped_cell_falls_out_of_queue() {
        {
            let cell = state_cell(0);
            cell.set(1);
        }
        let report = flush().unwrap();
        assert_eq!(report.commits, 0);
        assert_eq!(scheduled_len(), 0);
    }

    #[test]
    fn test_request_update_accepts_update_values() {
        let cell = state_cell(1);
        batch(|| {
            cell.request_update(Update::apply(|n: &i32| n + 1));
            cell.request_update(Update::replace(9));
            cell.request_update(4_i32);
        });
        assert_eq!(cell.read(), 4);
    }

    #[test]
    fn test_scope_explicit_dispose() {
        let cleaned_up = Rc::new(RefCell::new(false));

        let scope = Scope::new();
        let cleaned_up_clone = cleaned_up.clone();
        scope.add_disposer(move || {
            *cleaned_up_clone.borrow_mut() = true;
        });

        assert!(!*cleaned_up.borrow());
        scope.dispose();
        assert!(*cleaned_up.borrow());
    }

    #[test]
    fn test_scope_disposes_children_first() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let scope = Scope::new();
        let child = scope.child();
        {
            let order = order.clone();
            scope.add_disposer(move || order.borrow_mut().push("parent"));
        }
        {
            let order = order.clone();
            child.add_disposer(move || order.borrow_mut().push("child"));
        }
        scope.dispose();
        assert!(child.is_disposed());
        assert_eq!(*order.borrow(), vec!["child", "parent"]);
    }

    #[test]
    fn test_disposed_cell_rejects_requests() {
        let scope = Scope::new();
        let cell = scope.run(|| state_cell(0).label("owned"));
        let hits = counter(&cell);
        cell.set(1);
        scope.dispose();

        assert!(cell.is_disposed());
        assert!(!cell.has_pending());
        assert_eq!(
            cell.try_request_update(2_i32),
            Err(StateError::Disposed { label: "owned" })
        );
        flush().unwrap();
        assert_eq!(cell.read(), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_current_scope_restored_after_run() {
        assert!(current_scope().is_none());
        let scope = Scope::new();
        scope.run(|| {
            assert!(current_scope().is_some());
            Scope::new().run(|| assert!(current_scope().is_some()));
            assert!(current_scope().is_some());
        });
        assert!(current_scope().is_none());
    }

    #[test]
    fn test_key_based_remember() {
        reset_ambient_slots();

        let val1 = remember_with_key("test", || 42);
        let val2 = remember_with_key("test", || 100);

        assert_eq!(*val1, 42);
        assert_eq!(*val2, 42);
    }

    #[test]
    fn test_remember_is_order_based_per_pass() {
        let mut composer = Composer::new();
        let first = composer.compose(|| (remember(|| 1), remember(|| "x")));
        let second = composer.compose(|| (remember(|| 2), remember(|| "y")));
        assert_eq!((*second.0, *second.1), (1, "x"));
        assert!(Rc::ptr_eq(&first.0, &second.0));
        assert_eq!(composer.slot_count(), 2);
    }

    #[test]
    fn test_config_override_is_scoped() {
        let base = runtime_config();
        let custom = RuntimeConfig {
            max_flush_passes: 7,
            trace_commits: true,
        };
        with_runtime_config(custom, || {
            assert_eq!(runtime_config(), custom);
        });
        assert_eq!(runtime_config(), base);

        set_runtime_config(custom);
        assert_eq!(runtime_config(), custom);
    }

    fn counter_view() -> View {
        let count = remember_cell(|| 0i32).label("count");
        Column(vec![
            Text(format!("Count: {}", count.read())),
            Button("inc", {
                let count = count.clone();
                move || count.update(|n| n + 1)
            }),
            Button("dec", {
                let count = count.clone();
                move || count.update(|n| n - 1)
            }),
            Button("stale+3", {
                let count = count.clone();
                move || {
                    let n = count.read();
                    count.set(n + 1);
                    count.set(n + 1);
                    count.set(n + 1);
                }
            }),
            Button("fn+3", {
                let count = count.clone();
                move || {
                    for _ in 0..3 {
                        count.update(|n| n + 1);
                    }
                }
            }),
            Button("same", {
                let count = count.clone();
                move || count.set(count.read())
            }),
        ])
    }

    #[test]
    fn test_host_renders_once_per_click() {
        let mut host = Host::new(counter_view);
        assert_eq!(host.renders(), 1);
        assert_eq!(host.view().texts(), vec!["Count: 0"]);

        host.click("fn+3").unwrap();
        assert_eq!(host.renders(), 2);
        assert_eq!(host.view().texts(), vec!["Count: 3"]);

        host.click("stale+3").unwrap();
        assert_eq!(host.renders(), 3);
        assert_eq!(host.view().texts(), vec!["Count: 4"]);

        host.click("dec").unwrap();
        assert_eq!(host.view().texts(), vec!["Count: 3"]);

        host.click("same").unwrap();
        assert_eq!(host.renders(), 4);
        assert!(!host.settle());
    }

    #[test]
    fn test_host_unknown_button() {
        let mut host = Host::new(counter_view);
        assert_eq!(
            host.click("reset"),
            Err(StateError::NoSuchTarget("reset".to_string()))
        );
        assert_eq!(host.renders(), 1);
    }

    #[test]
    fn test_remembered_producer_runs_once_across_renders() {
        let calls = Rc::new(Cell::new(0));
        let mut host = Host::new({
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                let count = remember_cell(move || {
                    calls.set(calls.get() + 1);
                    0u32
                });
                Column(vec![
                    Text(count.read().to_string()),
                    Button("inc", move || count.update(|n| n + 1)),
                ])
            }
        });
        for _ in 0..5 {
            host.click("inc").unwrap();
        }
        assert_eq!(host.view().texts(), vec!["5"]);
        assert_eq!(host.renders(), 6);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_hosts_are_independent() {
        let mut left = Host::new(counter_view);
        let mut right = Host::new(counter_view);
        left.click("inc").unwrap();
        left.click("inc").unwrap();
        right.click("dec").unwrap();
        assert_eq!(left.view().texts(), vec!["Count: 2"]);
        assert_eq!(right.view().texts(), vec!["Count: -1"]);
    }

    #[test]
    fn test_host_dispose_runs_effect_cleanup() {
        let unmounted = Rc::new(Cell::new(false));
        let host = Host::new({
            let unmounted = unmounted.clone();
            move || {
                let mounted = remember(|| Cell::new(false));
                if !mounted.replace(true) {
                    let unmounted = unmounted.clone();
                    scoped_effect(move || on_dispose(move || unmounted.set(true)));
                }
                Text("mounted")
            }
        });
        assert!(!unmounted.get());
        host.dispose();
        assert!(unmounted.get());
    }

    #[test]
    fn test_explicit_commits_keep_one_schedule_entry() {
        let cell = state_cell(0).label("direct");
        for i in 1..=1000 {
            cell.set(i);
            cell.commit_batch();
        }
        assert_eq!(cell.read(), 1000);
        assert_eq!(cell.name(), "direct");
        assert_eq!(scheduled_len(), 1);

        let report = flush().unwrap();
        assert_eq!(report.commits, 0);
        assert_eq!(scheduled_len(), 0);

        // still schedulable after the runtime dropped its entry
        batch(|| cell.update(|n| n + 1));
        assert_eq!(cell.read(), 1001);
        assert_eq!(scheduled_len(), 0);
    }

    #[test]
    fn test_panicking_observer_leaves_rest_of_pass_queued() {
        let a = state_cell(0);
        let b = state_cell(0);
        a.subscribe(|_| panic!("observer failed"));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            batch(|| {
                a.set(1);
                b.set(1);
            })
        }));
        assert!(result.is_err());
        assert!(!in_batch());
        assert_eq!(a.read(), 1);
        assert_eq!(b.read(), 0);
        assert!(b.has_pending());

        batch(|| b.set(2));
        assert_eq!(b.read(), 2);
        assert!(!b.has_pending());
        assert_eq!(scheduled_len(), 0);
    }

    #[test]
    fn test_prelude_covers_the_counter_surface() {
        use crate::prelude::*;

        let count: StateCell<i32> = state_cell(0);
        let report: FlushReport = turn(|| count.update(|n| n + 1)).unwrap();
        assert_eq!(report.notified, 1);
        assert_eq!(count.read(), 1);
    }
}
