use log::LevelFilter;
use crate::tests::{init, lock_log_level};
use crate::verbosity::Verbosity;

#[test]
fn test_levels_map_to_log_filters() {
    init();

    assert_eq!(Verbosity::from_level(0), Some(Verbosity::Off));
    assert_eq!(Verbosity::from_level(1), Some(Verbosity::Info));
    assert_eq!(Verbosity::from_level(2), Some(Verbosity::Debug));
    assert_eq!(Verbosity::from_level(3), None);
    assert_eq!(Verbosity::Info.level(), 1);
    assert_eq!(Verbosity::Off.level_filter(), LevelFilter::Off);
    assert_eq!(Verbosity::Debug.level_filter(), LevelFilter::Debug);
    assert_eq!(Verbosity::default(), Verbosity::Off);
}

#[test]
fn test_apply_sets_the_global_ceiling() {
    init();
    let _level = lock_log_level();

    Verbosity::Info.apply();
    assert_eq!(log::max_level(), LevelFilter::Info);

    Verbosity::Off.apply();
    assert_eq!(log::max_level(), LevelFilter::Off);

    Verbosity::Debug.apply();
    assert_eq!(log::max_level(), LevelFilter::Debug);
}
