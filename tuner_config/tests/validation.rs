use rstest::rstest;
use tuner_config::{ShowItem, load_toml};

#[test]
fn empty_config_uses_defaults() {
    let cfg = load_toml("").expect("parse TOML");
    cfg.validate().expect("defaults are valid");
    assert!(cfg.dataset.parse_units);
    assert_eq!(cfg.lambda.min_dead_time_multiple, 3.0);
    assert_eq!(cfg.display.show, ShowItem::ALL.to_vec());
    assert_eq!(cfg.display.slope_decimals, 4);
}

#[test]
fn full_config_parses() {
    let toml = r#"
[dataset]
parse_units = false

[fit]
parallel_epsilon = 1e-9

[lambda]
min_dead_time_multiple = 2.5

[display]
slope_scale = 1000.0
slope_decimals = 3
show = ["slope1", "slope2", "dead_time", "proportional_gain", "integral_time"]

[logging]
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid");
    assert!(!cfg.dataset.parse_units);
    assert_eq!(cfg.fit.parallel_epsilon, 1e-9);
    assert_eq!(cfg.display.slope_scale, 1000.0);
    assert_eq!(cfg.display.show.len(), 5);
    // untouched fields keep their defaults
    assert_eq!(cfg.display.integral_gain_decimals, 6);
}

#[test]
fn show_accepts_single_name() {
    let cfg = load_toml("[display]\nshow = \"process_gain\"\n").expect("parse TOML");
    assert_eq!(cfg.display.show, vec![ShowItem::ProcessGain]);
}

#[test]
fn unknown_show_name_is_a_parse_error() {
    assert!(load_toml("[display]\nshow = [\"bogus\"]\n").is_err());
}

#[rstest]
#[case("[fit]\nparallel_epsilon = -1.0\n", "parallel_epsilon")]
#[case("[lambda]\nmin_dead_time_multiple = 0.0\n", "min_dead_time_multiple")]
#[case("[display]\nslope_scale = 0.0\n", "slope_scale")]
#[case("[display]\ndead_time_decimals = 16\n", "dead_time_decimals")]
#[case("[display]\nshow = []\n", "at least one")]
#[case("[display]\nshow = [\"lambda\", \"lambda\"]\n", "more than once")]
#[case("[logging]\nrotation = \"weekly\"\n", "rotation")]
fn invalid_values_are_rejected(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "error {err} should mention {needle}"
    );
}
