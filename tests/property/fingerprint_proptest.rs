//! Property-based tests for fingerprints and list state

use proptest::option;
use proptest::prelude::*;
use todosync::client::sync::{Filter, Fingerprint, ListState, PageWindow};
use todosync::shared::{Priority, SortBy, SortOrder};

fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

fn sort_by() -> impl Strategy<Value = SortBy> {
    prop_oneof![
        Just(SortBy::CreatedAt),
        Just(SortBy::DueDate),
        Just(SortBy::Priority),
        Just(SortBy::Title),
    ]
}

fn sort_order() -> impl Strategy<Value = SortOrder> {
    prop_oneof![Just(SortOrder::Asc), Just(SortOrder::Desc)]
}

prop_compose! {
    fn filter()(
        search in ".{0,12}",
        completed in option::of(any::<bool>()),
        priority in option::of(priority()),
        sort_by in sort_by(),
        sort_order in sort_order(),
    ) -> Filter {
        Filter { search, completed, priority, sort_by, sort_order }
    }
}

prop_compose! {
    fn window()(offset in 0u32..10_000, limit in 1u32..=1000) -> PageWindow {
        PageWindow::new(offset, limit).unwrap()
    }
}

proptest! {
    #[test]
    fn test_fingerprint_is_deterministic(filter in filter(), window in window()) {
        prop_assert_eq!(
            Fingerprint::for_todos(&filter, &window),
            Fingerprint::for_todos(&filter.clone(), &window)
        );
    }

    #[test]
    fn test_fingerprint_is_injective(
        a in filter(),
        wa in window(),
        b in filter(),
        wb in window(),
    ) {
        let same_params = a == b && wa == wb;
        prop_assert_eq!(
            Fingerprint::for_todos(&a, &wa) == Fingerprint::for_todos(&b, &wb),
            same_params
        );
    }

    #[test]
    fn test_filter_change_resets_offset(
        pages in 0u32..20,
        total in 0u64..2_000,
        next in filter(),
    ) {
        let mut state = ListState::default();
        for _ in 0..pages {
            state.next_page(total);
        }
        state.set_filter(next.clone());
        prop_assert_eq!(state.window().offset(), 0);
        prop_assert_eq!(state.filter(), &next);
    }

    #[test]
    fn test_paging_stays_in_bounds(moves in prop::collection::vec(any::<bool>(), 0..40), total in 0u64..500) {
        let mut state = ListState::new(25).unwrap();
        for forward in moves {
            if forward {
                state.next_page(total);
            } else {
                state.previous_page();
            }
            let offset = u64::from(state.window().offset());
            prop_assert!(offset == 0 || offset < total);
            prop_assert_eq!(offset % 25, 0);
        }
    }
}
