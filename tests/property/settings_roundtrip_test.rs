//! Property-based tests for HubConfig serialization round-trip.
//!
//! Any valid configuration must survive JSON serialization and
//! deserialization without loss.

use linkhub::types::settings::{
    DefaultSettings, FeatureFlags, HubConfig, InteractionSettings, LimitSettings, StorageKeys,
    ThemeMode,
};
use proptest::prelude::*;

fn arb_theme_mode() -> impl Strategy<Value = ThemeMode> {
    prop_oneof![Just(ThemeMode::Light), Just(ThemeMode::Dark)]
}

fn arb_storage_keys() -> impl Strategy<Value = StorageKeys> {
    ("[a-zA-Z]{1,20}", "[a-zA-Z]{1,20}", "[a-zA-Z]{1,20}").prop_map(|(theme, favorites, recent)| {
        StorageKeys {
            theme,
            favorites,
            recent,
        }
    })
}

fn arb_defaults() -> impl Strategy<Value = DefaultSettings> {
    (arb_theme_mode(), 0u64..5000, 0u64..10_000, 0u64..5000).prop_map(
        |(theme, search_debounce_ms, toast_duration_ms, loading_delay_ms)| DefaultSettings {
            theme,
            search_debounce_ms,
            toast_duration_ms,
            loading_delay_ms,
        },
    )
}

fn arb_limits() -> impl Strategy<Value = LimitSettings> {
    (1usize..100, 1usize..10_000_000).prop_map(|(recent_max, storage_quota_bytes)| LimitSettings {
        recent_max,
        storage_quota_bytes,
    })
}

fn arb_interaction() -> impl Strategy<Value = InteractionSettings> {
    (0u32..100, "https?://[a-z]{3,10}(:[0-9]{2,4})?").prop_map(|(px, page_origin)| {
        InteractionSettings {
            touch_drag_threshold_px: f64::from(px),
            page_origin,
        }
    })
}

fn arb_hub_config() -> impl Strategy<Value = HubConfig> {
    (
        arb_storage_keys(),
        arb_defaults(),
        arb_limits(),
        arb_interaction(),
        any::<bool>(),
    )
        .prop_map(|(storage, defaults, limits, interaction, multi_tab_sync)| HubConfig {
            storage,
            defaults,
            limits,
            interaction,
            features: FeatureFlags { multi_tab_sync },
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn prop_hub_config_json_roundtrip(config in arb_hub_config()) {
        let json = serde_json::to_string(&config).unwrap();
        let back: HubConfig = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, config);
    }

    #[test]
    fn prop_theme_mode_parses_its_own_name(mode in arb_theme_mode()) {
        let parsed: ThemeMode = mode.as_str().parse().unwrap();
        prop_assert_eq!(parsed, mode);
        prop_assert_eq!(mode.toggled().toggled(), mode);
    }
}
