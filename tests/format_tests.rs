//! Persisted format unit tests

mod common;

#[cfg(test)]
mod tests {
    use crate::common::approx;
    use pvp_knockback::format::{decode_profile, decode_vector, encode_profile, encode_vector};
    use pvp_knockback::{Area, DecodeError, KnockbackProfile, Vec3, WorldOverride};
    use serde_json::json;

    // -----------------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------------

    #[test]
    fn profile_survives_encode_decode() {
        for profile in [
            KnockbackProfile::default(),
            KnockbackProfile::new(0.385, 0.42, 8),
            KnockbackProfile::new(0.0, 1.25, 0),
        ] {
            let decoded = decode_profile(&encode_profile(&profile).unwrap()).unwrap();
            assert_eq!(decoded, profile);
        }
    }

    #[test]
    fn profile_uses_canonical_keys() {
        let encoded = encode_profile(&KnockbackProfile::new(0.5, 0.3, 12)).unwrap();
        assert_eq!(encoded, json!({ "xz-kb": 0.5, "y-kb": 0.3, "speed": 12 }));
    }

    #[test]
    fn profile_accepts_integer_multipliers() {
        let p = decode_profile(&json!({ "xz-kb": 1, "y-kb": 0, "speed": 5 })).unwrap();
        assert!(approx(p.horizontal(), 1.0));
        assert!(approx(p.vertical(), 0.0));
        assert_eq!(p.attack_cooldown(), 5);
    }

    #[test]
    fn profile_rejects_missing_and_non_numeric_fields() {
        assert!(decode_profile(&json!({ "xz-kb": 0.4, "y-kb": 0.4 })).is_err());
        assert!(decode_profile(&json!({ "xz-kb": "0.4", "y-kb": 0.4, "speed": 10 })).is_err());
        assert!(decode_profile(&json!({ "xz-kb": 0.4, "y-kb": 0.4, "speed": 10.5 })).is_err());
        assert!(decode_profile(&json!(null)).is_err());
    }

    #[test]
    fn profile_rejects_negative_multiplier() {
        let err = decode_profile(&json!({ "xz-kb": -0.4, "y-kb": 0.4, "speed": 10 })).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidNumber { field: "xz-kb", .. }
        ));
        assert!(decode_profile(&json!({ "xz-kb": 0.4, "y-kb": 0.4, "speed": -1 })).is_err());
    }

    #[test]
    fn constructor_clamps_invalid_multipliers() {
        let p = KnockbackProfile::new(-1.0, f64::NAN, 3);
        assert_eq!(p.horizontal(), 0.0);
        assert_eq!(p.vertical(), 0.0);
    }

    // -----------------------------------------------------------------------
    // Vectors
    // -----------------------------------------------------------------------

    #[test]
    fn vector_reads_map_and_array() {
        let expected = Vec3::new(1.5, -2.0, 3.0);
        assert_eq!(decode_vector(&json!({ "x": 1.5, "y": -2, "z": 3 }), "v").unwrap(), expected);
        assert_eq!(decode_vector(&json!([1.5, -2.0, 3.0]), "v").unwrap(), expected);
        assert_eq!(decode_vector(&encode_vector(&expected).unwrap(), "v").unwrap(), expected);
    }

    #[test]
    fn vector_rejects_partial_input() {
        assert!(decode_vector(&json!({ "x": 1.0, "y": 2.0 }), "v").is_err());
        assert!(decode_vector(&json!([1.0, 2.0]), "v").is_err());
        assert!(decode_vector(&json!([1.0, 2.0, "3"]), "v").is_err());
        assert!(decode_vector(&json!(null), "v").is_err());
    }

    // -----------------------------------------------------------------------
    // Worlds
    // -----------------------------------------------------------------------

    #[test]
    fn world_record_round_trips() {
        let wo = WorldOverride::new("arena", false, KnockbackProfile::new(0.3, 0.5, 7));
        let encoded = wo.encode().unwrap();
        assert_eq!(encoded["kbEnabled"], json!(false));
        let decoded =
            WorldOverride::decode("arena", &encoded, &KnockbackProfile::default()).unwrap();
        assert_eq!(decoded, wo);
    }

    #[test]
    fn world_record_requires_both_keys() {
        let fallback = KnockbackProfile::default();
        assert!(WorldOverride::decode("w", &json!({ "kbEnabled": true }), &fallback).is_err());
        assert!(WorldOverride::decode("w", &json!({ "kbInfo": {} }), &fallback).is_err());
    }

    #[test]
    fn world_record_with_bad_profile_uses_fallback() {
        let fallback = KnockbackProfile::new(0.2, 0.2, 4);
        let data = json!({ "kbEnabled": true, "kbInfo": { "xz-kb": "lots" } });
        let wo = WorldOverride::decode("w", &data, &fallback).unwrap();
        assert!(wo.is_enabled());
        assert_eq!(*wo.profile(), fallback);
    }

    #[test]
    fn legacy_world_record_uses_one_value_for_both_axes() {
        let data = json!({ "customKb": false, "attack-delay": 15, "knockback": 0.5 });
        let wo = WorldOverride::decode_legacy("lobby", &data).unwrap();
        assert!(!wo.is_enabled());
        assert!(approx(wo.profile().horizontal(), 0.5));
        assert!(approx(wo.profile().vertical(), 0.5));
        assert_eq!(wo.profile().attack_cooldown(), 15);
    }

    #[test]
    fn legacy_world_record_fills_defaults() {
        for data in [json!({}), json!(null)] {
            let wo = WorldOverride::decode_legacy("lobby", &data).unwrap();
            assert!(wo.is_enabled());
            assert!(approx(wo.profile().horizontal(), 0.4));
            assert!(approx(wo.profile().vertical(), 0.4));
            assert_eq!(wo.profile().attack_cooldown(), 10);
        }
    }

    // -----------------------------------------------------------------------
    // Areas
    // -----------------------------------------------------------------------

    fn sample_area() -> Area {
        Area::new(
            "pit",
            Some("arena".into()),
            Vec3::new(10.0, 60.0, -5.0),
            Vec3::new(-10.0, 80.0, 5.0),
            KnockbackProfile::new(0.45, 0.35, 9),
        )
    }

    #[test]
    fn area_record_round_trips() {
        let area = sample_area().with_enabled(false);
        let decoded = Area::decode("pit", &area.encode().unwrap()).unwrap();
        assert_eq!(decoded, area);
    }

    #[test]
    fn records_encode_with_persisted_key_names() {
        let area = sample_area().encode().unwrap();
        let keys: Vec<&str> = area.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["enabled", "first-pos", "second-pos", "knockback", "world"]);
        assert_eq!(area["first-pos"], json!({ "x": 10.0, "y": 60.0, "z": -5.0 }));
        assert_eq!(area["knockback"], json!({ "xz-kb": 0.45, "y-kb": 0.35, "speed": 9 }));

        let world = WorldOverride::new("arena", true, KnockbackProfile::new(0.3, 0.5, 7))
            .encode()
            .unwrap();
        assert_eq!(
            world,
            json!({ "kbEnabled": true, "kbInfo": { "xz-kb": 0.3, "y-kb": 0.5, "speed": 7 } })
        );
    }

    #[test]
    fn area_record_requires_world_key_but_allows_null() {
        let mut encoded = sample_area().encode().unwrap();
        encoded["world"] = json!(null);
        let decoded = Area::decode("pit", &encoded).unwrap();
        assert_eq!(decoded.world(), None);

        encoded.as_object_mut().unwrap().remove("world");
        assert!(Area::decode("pit", &encoded).is_err());
    }

    #[test]
    fn area_record_rejects_bad_corner() {
        let mut encoded = sample_area().encode().unwrap();
        encoded["second-pos"] = json!({ "x": 1.0, "z": 2.0 });
        let err = Area::decode("pit", &encoded).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidCorner("second-pos")));
    }

    #[test]
    fn legacy_area_record_decodes() {
        let data = json!({
            "world": "arena",
            "kb": 0.38,
            "attack-delay": 8,
            "enabled": true,
            "first-pos": [0, 0, 0],
            "second-pos": { "x": 4, "y": 4, "z": 4 },
        });
        let area = Area::decode_legacy("box", &data).unwrap();
        assert_eq!(area.world(), Some("arena"));
        assert!(approx(area.profile().horizontal(), 0.38));
        assert!(approx(area.profile().vertical(), 0.38));
        assert_eq!(area.profile().attack_cooldown(), 8);
        assert!(area.is_enabled());
    }

    #[test]
    fn legacy_area_record_requires_every_key() {
        let data = json!({
            "world": "arena",
            "kb": 0.38,
            "enabled": true,
            "first-pos": [0, 0, 0],
            "second-pos": [4, 4, 4],
        });
        assert!(Area::decode_legacy("box", &data).is_err());
    }

    #[test]
    fn name_and_state_comparison_ignores_geometry() {
        let a = sample_area();
        let mut b = sample_area();
        b.set_profile(KnockbackProfile::new(1.0, 1.0, 1));
        b.set_corner(pvp_knockback::Corner::First, Vec3::new(99.0, 99.0, 99.0));
        assert!(a.same_name_and_state(&b));
        assert_ne!(a, b);

        b.set_enabled(false);
        assert!(!a.same_name_and_state(&b));
    }
}
