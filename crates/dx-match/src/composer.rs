use super::*;
use dx_core::geo;
use dx_core::net;
use dx_database::Scene;

/// Greedily selects up to `seat_count` compatible players in queue order.
///
/// Per-candidate filters: balance snapshot covers the scene minimum; when
/// geo is enforced the candidate has a real GPS fix and sits at least the
/// scene threshold from every already-selected player; and no two selected
/// players share an IPv4 /24.
pub fn select_players(
    cfg: &MatchConfig,
    scene: &Scene,
    candidates: &[QueueMember],
) -> Vec<QueueMember> {
    let required = scene.seat_count as usize;
    let geo_enforced = scene.distance_threshold_m > 0 && !cfg.skip_location_validation;
    let mut selected: Vec<QueueMember> = Vec::with_capacity(required);

    for candidate in candidates {
        if selected.len() >= required {
            break;
        }
        if candidate.balance_snapshot < scene.min_in {
            continue;
        }
        if geo_enforced && !has_location(candidate) {
            continue;
        }
        if geo_enforced && !passes_distance(scene, &selected, candidate) {
            continue;
        }
        if !passes_network(&selected, candidate) {
            continue;
        }
        selected.push(candidate.clone());
    }
    selected
}

fn has_location(member: &QueueMember) -> bool {
    member.gps_lat != 0.0 && member.gps_lng != 0.0
}

fn passes_distance(scene: &Scene, selected: &[QueueMember], candidate: &QueueMember) -> bool {
    selected.iter().all(|existing| {
        has_location(existing)
            && geo::haversine_m(
                existing.gps_lat,
                existing.gps_lng,
                candidate.gps_lat,
                candidate.gps_lng,
            ) >= scene.distance_threshold_m as f64
    })
}

fn passes_network(selected: &[QueueMember], candidate: &QueueMember) -> bool {
    selected
        .iter()
        .all(|existing| !net::same_subnet24(&existing.ip, &candidate.ip))
}

/// Seat layout written into the new table row:
/// `{"1": {"userId", "alias", "chips", "status"}, ...}` in selection order.
pub fn players_json(selected: &[QueueMember]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (idx, player) in selected.iter().enumerate() {
        let seat = idx + 1;
        map.insert(
            seat.to_string(),
            serde_json::json!({
                "userId": player.user_id,
                "alias": format!("player{}", seat),
                "chips": player.buy_in,
                "status": "waiting",
            }),
        );
    }
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(seats: i32, threshold: i32) -> Scene {
        Scene {
            id: 10,
            name: "chexuan".into(),
            seat_count: seats,
            min_in: 100,
            max_in: 0,
            base_pi: 10,
            min_unit_pi: 2,
            mango_enabled: true,
            bobo_enabled: true,
            distance_threshold_m: threshold,
            status: "enabled".into(),
            rake_rule_id: 0,
        }
    }

    fn member(user: i64, ip: &str, lat: f64, lng: f64) -> QueueMember {
        QueueMember {
            user_id: user,
            scene_id: 10,
            buy_in: 500,
            gps_lat: lat,
            gps_lng: lng,
            ip: ip.into(),
            balance_snapshot: 1000,
            joined_at_ms: user,
        }
    }

    #[test]
    fn selects_in_queue_order() {
        let cfg = MatchConfig::default();
        let candidates = vec![
            member(1, "1.2.3.4", 0.0, 0.0),
            member(2, "5.6.7.8", 0.0, 0.0),
            member(3, "9.9.9.9", 0.0, 0.0),
        ];
        let selected = select_players(&cfg, &scene(2, 0), &candidates);
        assert_eq!(
            selected.iter().map(|m| m.user_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn rejects_same_subnet() {
        let cfg = MatchConfig::default();
        let candidates = vec![
            member(1, "1.2.3.4", 0.0, 0.0),
            member(2, "1.2.3.99", 0.0, 0.0),
        ];
        let selected = select_players(&cfg, &scene(2, 0), &candidates);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].user_id, 1);
    }

    #[test]
    fn skips_subnet_clash_but_seats_next_candidate() {
        let cfg = MatchConfig::default();
        let candidates = vec![
            member(1, "1.2.3.4", 0.0, 0.0),
            member(2, "1.2.3.99", 0.0, 0.0),
            member(3, "5.6.7.8", 0.0, 0.0),
        ];
        let selected = select_players(&cfg, &scene(2, 0), &candidates);
        assert_eq!(
            selected.iter().map(|m| m.user_id).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn rejects_low_balance() {
        let cfg = MatchConfig::default();
        let mut poor = member(1, "1.2.3.4", 0.0, 0.0);
        poor.balance_snapshot = 50;
        let selected = select_players(&cfg, &scene(2, 0), &[poor]);
        assert!(selected.is_empty());
    }

    #[test]
    fn geo_enforced_needs_fix_and_distance() {
        let cfg = MatchConfig::default();
        let s = scene(2, 1000);
        // no GPS fix at all
        let selected = select_players(&cfg, &s, &[member(1, "1.2.3.4", 0.0, 0.0)]);
        assert!(selected.is_empty());
        // two players ~110m apart: too close for a 1km threshold
        let near = vec![
            member(1, "1.2.3.4", 30.0, 120.0),
            member(2, "5.6.7.8", 30.001, 120.0),
        ];
        assert_eq!(select_players(&cfg, &s, &near).len(), 1);
        // far enough apart
        let far = vec![
            member(1, "1.2.3.4", 30.0, 120.0),
            member(2, "5.6.7.8", 31.0, 120.0),
        ];
        assert_eq!(select_players(&cfg, &s, &far).len(), 2);
    }

    #[test]
    fn skip_location_flag_disables_geo() {
        let cfg = MatchConfig {
            skip_location_validation: true,
            ..MatchConfig::default()
        };
        let selected = select_players(&cfg, &scene(2, 1000), &[member(1, "1.2.3.4", 0.0, 0.0)]);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn players_json_seeds_seats() {
        let selected = vec![
            member(9, "1.2.3.4", 0.0, 0.0),
            member(8, "5.6.7.8", 0.0, 0.0),
        ];
        let value = players_json(&selected);
        assert_eq!(value["1"]["userId"], 9);
        assert_eq!(value["2"]["userId"], 8);
        assert_eq!(value["1"]["chips"], 500);
        assert_eq!(value["1"]["status"], "waiting");
    }
}
