use structured_notes_core::errors::CoreError;
use structured_notes_core::models::market::MarketSnapshot;
use structured_notes_core::models::note::{Note, NoteInput, MAX_TICKER_LEN};
use structured_notes_core::models::settings::{Settings, DEFAULT_MAX_NOTES};
use structured_notes_core::models::tier::Tier;
use structured_notes_core::models::weights::{WeightComponent, Weights};
use structured_notes_core::models::working_set::WorkingSet;

fn input(ticker: &str) -> NoteInput {
    NoteInput::new(ticker, 5.0, 20.0, false)
}

fn full_snapshot() -> MarketSnapshot {
    MarketSnapshot {
        current_price: Some(100.0),
        price_one_year_ago: Some(90.0),
        low_52_week: Some(80.0),
        analyst_target_mean: Some(110.0),
        analyst_target_named: Some(120.0),
    }
}

// ═══════════════════════════════════════════════════════════════════
//  NoteInput validation
// ═══════════════════════════════════════════════════════════════════

mod note_input {
    use super::*;

    #[test]
    fn valid_input_passes() {
        assert!(input("AAPL").validate().is_ok());
    }

    #[test]
    fn empty_ticker_rejected() {
        let err = input("").validate().unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn whitespace_only_ticker_rejected() {
        assert!(input("   ").validate().is_err());
    }

    #[test]
    fn inner_whitespace_in_ticker_rejected() {
        let err = input("BRK B").validate().unwrap_err();
        assert!(err.to_string().contains("whitespace"));
        assert!(input(" BRK.B ").validate().is_ok());
    }

    #[test]
    fn ticker_at_max_length_accepted() {
        let ticker = "A".repeat(MAX_TICKER_LEN);
        assert!(input(&ticker).validate().is_ok());
    }

    #[test]
    fn ticker_over_max_length_rejected() {
        let ticker = "A".repeat(MAX_TICKER_LEN + 1);
        let err = input(&ticker).validate().unwrap_err();
        assert!(err.to_string().contains("max 8"));
    }

    #[test]
    fn rate_bounds() {
        assert!(NoteInput::new("X", 0.0, 10.0, false).validate().is_ok());
        assert!(NoteInput::new("X", 100.0, 10.0, false).validate().is_ok());
        assert!(NoteInput::new("X", -0.01, 10.0, false).validate().is_err());
        assert!(NoteInput::new("X", 100.01, 10.0, false).validate().is_err());
        assert!(NoteInput::new("X", f64::NAN, 10.0, false).validate().is_err());
    }

    #[test]
    fn buffer_bounds() {
        assert!(NoteInput::new("X", 5.0, 0.0, false).validate().is_ok());
        assert!(NoteInput::new("X", 5.0, 100.0, false).validate().is_ok());
        assert!(NoteInput::new("X", 5.0, 101.0, false).validate().is_err());
        assert!(NoteInput::new("X", 5.0, f64::INFINITY, false).validate().is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Note
// ═══════════════════════════════════════════════════════════════════

mod note {
    use super::*;

    #[test]
    fn new_uppercases_and_trims_ticker() {
        let note = Note::new(NoteInput::new("  brk.b ", 7.5, 25.0, true)).unwrap();
        assert_eq!(note.ticker, "BRK.B");
        assert_eq!(note.rate, 7.5);
        assert_eq!(note.buffer, 25.0);
        assert!(note.has_memory);
    }

    #[test]
    fn new_note_is_unenriched_and_unscored() {
        let note = Note::new(input("msft")).unwrap();
        assert!(!note.is_enriched());
        assert_eq!(note.market(), MarketSnapshot::unavailable());
        assert_eq!(note.score, None);
    }

    #[test]
    fn new_rejects_invalid_input() {
        assert!(Note::new(input("")).is_err());
    }

    #[test]
    fn apply_market_sets_fields_and_clears_score() {
        let mut note = Note::new(input("KO")).unwrap();
        note.score = Some(1.23);
        note.apply_market(full_snapshot());

        assert_eq!(note.current_price, Some(100.0));
        assert_eq!(note.analyst_target_named, Some(120.0));
        assert!(note.is_enriched());
        assert_eq!(note.score, None);
    }

    #[test]
    fn apply_market_overwrites_with_unavailable() {
        let mut note = Note::new(input("KO")).unwrap();
        note.apply_market(full_snapshot());
        note.apply_market(MarketSnapshot {
            current_price: Some(101.0),
            ..MarketSnapshot::default()
        });

        assert_eq!(note.current_price, Some(101.0));
        assert_eq!(note.price_one_year_ago, None);
        assert_eq!(note.analyst_target_mean, None);
    }

    #[test]
    fn input_roundtrip() {
        let note = Note::new(NoteInput::new("cop", 9.0, 30.0, true)).unwrap();
        assert_eq!(note.input(), NoteInput::new("COP", 9.0, 30.0, true));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  MarketSnapshot
// ═══════════════════════════════════════════════════════════════════

mod market_snapshot {
    use super::*;

    #[test]
    fn resolved_fields_counts_present_values() {
        assert_eq!(MarketSnapshot::unavailable().resolved_fields(), 0);
        assert_eq!(full_snapshot().resolved_fields(), 5);
        let partial = MarketSnapshot {
            current_price: Some(10.0),
            low_52_week: Some(0.0),
            ..MarketSnapshot::default()
        };
        assert_eq!(partial.resolved_fields(), 2);
    }

    #[test]
    fn normalized_rounds_to_cents() {
        let snap = MarketSnapshot {
            current_price: Some(12.3456),
            price_one_year_ago: Some(99.999),
            ..MarketSnapshot::default()
        }
        .normalized();
        assert_eq!(snap.current_price, Some(12.35));
        assert_eq!(snap.price_one_year_ago, Some(100.0));
    }

    #[test]
    fn normalized_drops_invalid_prices() {
        let snap = MarketSnapshot {
            current_price: Some(-1.0),
            price_one_year_ago: Some(f64::NAN),
            low_52_week: Some(f64::INFINITY),
            analyst_target_mean: Some(0.0),
            analyst_target_named: None,
        }
        .normalized();
        assert_eq!(snap.current_price, None);
        assert_eq!(snap.price_one_year_ago, None);
        assert_eq!(snap.low_52_week, None);
        // Zero is a price, not "unavailable"
        assert_eq!(snap.analyst_target_mean, Some(0.0));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Weights
// ═══════════════════════════════════════════════════════════════════

mod weights {
    use super::*;

    #[test]
    fn defaults_match_baseline() {
        let w = Weights::default();
        assert_eq!(w.rate, 0.15);
        assert_eq!(w.buffer, 0.34);
        assert_eq!(w.memory, 0.24);
        assert_eq!(w.target_mean_gap, 0.09);
        assert_eq!(w.target_named_gap, 0.09);
        assert_eq!(w.year_ago_ratio, 0.09);
        assert_eq!(w.low52_ratio, 0.09);
    }

    #[test]
    fn set_and_get_each_component() {
        let mut w = Weights::default();
        for (i, component) in WeightComponent::ALL.into_iter().enumerate() {
            let value = (i as f64 + 1.0) / 10.0;
            w.set(component, value).unwrap();
            assert_eq!(w.get(component), value);
        }
    }

    #[test]
    fn set_accepts_bounds() {
        let mut w = Weights::default();
        assert!(w.set(WeightComponent::Memory, 0.0).is_ok());
        assert!(w.set(WeightComponent::Memory, 1.0).is_ok());
    }

    #[test]
    fn set_rejects_out_of_range_and_keeps_value() {
        let mut w = Weights::default();
        assert!(w.set(WeightComponent::Rate, 1.01).is_err());
        assert!(w.set(WeightComponent::Rate, -0.01).is_err());
        assert!(w.set(WeightComponent::Rate, f64::NAN).is_err());
        assert_eq!(w.rate, 0.15);
    }

    #[test]
    fn set_keeps_hundredths_resolution() {
        let mut w = Weights::default();
        w.set(WeightComponent::Buffer, 0.456).unwrap();
        assert_eq!(w.buffer, 0.46);
    }

    #[test]
    fn no_normalization_required() {
        let mut w = Weights::default();
        for component in WeightComponent::ALL {
            w.set(component, 1.0).unwrap();
        }
        let sum: f64 = w.iter().map(|(_, v)| v).sum();
        assert_eq!(sum, 7.0);
    }

    #[test]
    fn component_parses_various_spellings() {
        assert_eq!("rate".parse::<WeightComponent>().unwrap(), WeightComponent::Rate);
        assert_eq!(
            "targetMeanGap".parse::<WeightComponent>().unwrap(),
            WeightComponent::TargetMeanGap
        );
        assert_eq!(
            "target_named_gap".parse::<WeightComponent>().unwrap(),
            WeightComponent::TargetNamedGap
        );
        assert_eq!(
            "LOW52-RATIO".parse::<WeightComponent>().unwrap(),
            WeightComponent::Low52Ratio
        );
        assert!("colchon".parse::<WeightComponent>().is_err());
    }

    #[test]
    fn component_display_is_key() {
        for component in WeightComponent::ALL {
            assert_eq!(component.to_string(), component.key());
            assert_eq!(component.key().parse::<WeightComponent>().unwrap(), component);
        }
    }

    #[test]
    fn serde_uses_camel_case_and_defaults_missing() {
        let w: Weights = serde_json::from_str(r#"{"yearAgoRatio": 0.5}"#).unwrap();
        assert_eq!(w.year_ago_ratio, 0.5);
        assert_eq!(w.rate, 0.15);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Tier
// ═══════════════════════════════════════════════════════════════════

mod tier {
    use super::*;

    #[test]
    fn display_and_parse() {
        for tier in [Tier::Low, Tier::Medium, Tier::High] {
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
        assert_eq!(Tier::High.to_string(), "high");
        assert!("top".parse::<Tier>().is_err());
    }

    #[test]
    fn ordering_low_to_high() {
        assert!(Tier::Low < Tier::Medium);
        assert!(Tier::Medium < Tier::High);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  WorkingSet
// ═══════════════════════════════════════════════════════════════════

mod working_set {
    use super::*;

    #[test]
    fn new_is_empty_with_default_capacity() {
        let set = WorkingSet::new();
        assert!(set.is_empty());
        assert_eq!(set.capacity(), DEFAULT_MAX_NOTES);
        assert_eq!(set.weights(), &Weights::default());
    }

    #[test]
    fn add_preserves_insertion_order() {
        let mut set = WorkingSet::new();
        for t in ["c", "a", "b"] {
            set.add_note(input(t)).unwrap();
        }
        let tickers: Vec<&str> = set.notes().iter().map(|n| n.ticker.as_str()).collect();
        assert_eq!(tickers, ["C", "A", "B"]);
    }

    #[test]
    fn twenty_first_note_is_rejected() {
        let mut set = WorkingSet::new();
        for i in 0..20 {
            set.add_note(input(&format!("T{i}"))).unwrap();
        }
        assert!(set.is_full());

        let err = set.add_note(input("ONEMORE")).unwrap_err();
        assert!(matches!(err, CoreError::CapacityExceeded { max: 20 }));
        assert_eq!(set.len(), 20);
    }

    #[test]
    fn invalid_note_leaves_set_untouched() {
        let mut set = WorkingSet::new();
        set.add_note(input("AAPL")).unwrap();
        let before = set.clone();

        assert!(set.add_note(NoteInput::new("TOOLONGTICKER", 5.0, 20.0, false)).is_err());
        assert!(set.add_note(NoteInput::new("OK", 150.0, 20.0, false)).is_err());
        assert_eq!(set, before);
    }

    #[test]
    fn clear_removes_everything() {
        let mut set = WorkingSet::new();
        set.add_note(input("A")).unwrap();
        set.add_note(input("B")).unwrap();
        assert_eq!(set.clear(), 2);
        assert!(set.is_empty());
        assert_eq!(set.clear(), 0);
    }

    #[test]
    fn remove_note_by_index() {
        let mut set = WorkingSet::new();
        set.add_note(input("A")).unwrap();
        set.add_note(input("B")).unwrap();

        let removed = set.remove_note(0).unwrap();
        assert_eq!(removed.ticker, "A");
        assert_eq!(set.notes()[0].ticker, "B");
        assert!(matches!(set.remove_note(5), Err(CoreError::NoteNotFound(5))));
    }

    #[test]
    fn set_weight_invalidates_scores() {
        let mut set = WorkingSet::new();
        set.add_note(input("A")).unwrap();
        set.notes_mut()[0].score = Some(0.5);

        set.set_weight(WeightComponent::Memory, 0.5).unwrap();
        assert_eq!(set.weights().memory, 0.5);
        assert!(!set.has_scores());
    }

    #[test]
    fn rejected_weight_keeps_scores() {
        let mut set = WorkingSet::new();
        set.add_note(input("A")).unwrap();
        set.notes_mut()[0].score = Some(0.5);

        assert!(set.set_weight(WeightComponent::Memory, 2.0).is_err());
        assert_eq!(set.scores(), vec![0.5]);
    }

    #[test]
    fn reset_weights_restores_baseline() {
        let mut set = WorkingSet::new();
        set.set_weight(WeightComponent::Rate, 1.0).unwrap();
        set.reset_weights();
        assert_eq!(set.weights(), &Weights::default());
    }

    #[test]
    fn push_note_revalidates_and_drops_score() {
        let mut set = WorkingSet::with_capacity(1);
        let mut note = Note::new(input("aapl")).unwrap();
        note.score = Some(9.0);
        set.push_note(note.clone()).unwrap();
        assert_eq!(set.notes()[0].score, None);

        let err = set.push_note(note).unwrap_err();
        assert!(matches!(err, CoreError::CapacityExceeded { max: 1 }));
    }

    #[test]
    fn push_note_rejects_tampered_terms() {
        let mut set = WorkingSet::new();
        let mut note = Note::new(input("AAPL")).unwrap();
        note.buffer = 250.0;
        assert!(set.push_note(note).is_err());
        assert!(set.is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.max_notes, 20);
        assert_eq!(s.request_delay_ms, 1_000);
        assert_eq!(s.request_timeout_secs, 10);
        assert_eq!(s.named_analyst, "Morgan Stanley");
        assert_eq!(s.export_prefix, "notes");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn json_missing_keys_take_defaults() {
        let s = Settings::from_json_str(r#"{"request_delay_ms": 250}"#).unwrap();
        assert_eq!(s.request_delay_ms, 250);
        assert_eq!(s.max_notes, 20);
        assert_eq!(s.request_delay(), std::time::Duration::from_millis(250));
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            Settings::from_json_str(r#"{"max_notes": 0}"#),
            Err(CoreError::Config(_))
        ));
        assert!(Settings::from_json_str(r#"{"request_timeout_secs": 0}"#).is_err());
        assert!(Settings::from_json_str(r#"{"named_analyst": "  "}"#).is_err());
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(
            Settings::from_json_str("{not json"),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"named_analyst": "Goldman Sachs", "max_notes": 5}}"#).unwrap();

        let s = Settings::from_json_file(file.path()).unwrap();
        assert_eq!(s.named_analyst, "Goldman Sachs");
        assert_eq!(s.max_notes, 5);
    }

    #[test]
    fn from_missing_file_is_io_error() {
        let err = Settings::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CoreError::FileIO(_)));
    }
}
