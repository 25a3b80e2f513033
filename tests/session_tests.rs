#[cfg(test)]
mod tests {
    use review_sync_lib::{
        init_logging, BoundaryDirection, ChunkOrder, CommandRecorder, PlaybackMode,
        PlayerCommand, PlayerEvent, ReviewConfig, ScrubOutcome, Session, SessionInit,
        TimeChunker, TimeRange, TimelineEvent,
    };

    // Three-minute chunks so the tolerance window matters.
    fn config() -> ReviewConfig {
        ReviewConfig {
            chunk_duration_secs: 180,
            scrub_tolerance_secs: 60.0,
            ..ReviewConfig::default()
        }
    }

    fn open(camera: &str, start_time: f64) -> Session {
        init_logging("debug");
        Session::new(
            config(),
            SessionInit {
                camera: camera.to_string(),
                start_time,
                cameras: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                now: None,
            },
        )
    }

    fn with_players(session: &mut Session) -> (CommandRecorder, CommandRecorder) {
        let primary = CommandRecorder::new();
        let preview = CommandRecorder::new();
        session.register_primary(Box::new(primary.clone()));
        session.register_secondary("b", Box::new(preview.clone()));
        primary.clear();
        preview.clear();
        (primary, preview)
    }

    #[test]
    fn test_containment_for_every_minute() {
        let chunker = TimeChunker::new(180, 0, ChunkOrder::NewestFirst);
        for minute in 0..(24 * 60) {
            let t = 1_700_000_000.0 + f64::from(minute) * 60.0 + 0.25;
            let set = chunker.chunk(t);
            let matches = set.ranges.iter().filter(|r| r.contains(t)).count();
            assert_eq!(matches, 1, "t={} matched {} chunks", t, matches);
            assert!(set.ranges[set.find_containing(t).unwrap()].contains(t));
        }
    }

    #[test]
    fn test_startup_anchoring() {
        let session = open("a", 1_050.0);
        assert_eq!(session.active_chunk(), TimeRange::new(900.0, 1_080.0));
        assert_eq!(session.current_time(), 1_050.0);
    }

    #[test]
    fn test_scrub_round_trip_seeks_once() {
        let mut session = open("a", 1_050.0);
        let (primary, preview) = with_players(&mut session);

        session.handle_timeline(TimelineEvent::DraggingChanged { dragging: true });
        assert!(primary.commands().is_empty());

        let outcome = session.handle_timeline(TimelineEvent::HandlebarMoved { timestamp: 1_100.0 });
        assert_eq!(outcome, Some(ScrubOutcome::Scrub(1_100.0)));
        assert_eq!(primary.scrubs(), vec![1_100.0]);
        assert_eq!(preview.scrubs(), vec![1_100.0]);
        primary.clear();

        session.handle_timeline(TimelineEvent::DraggingChanged { dragging: false });
        assert_eq!(
            primary.commands(),
            vec![PlayerCommand::Seek {
                timestamp: 1_100.0,
                autoplay: true
            }]
        );
        assert_eq!(session.mode(), PlaybackMode::Playing);

        // a second release is not another seek
        session.set_dragging(false);
        assert_eq!(primary.seeks().len(), 1);
    }

    #[test]
    fn test_reanchor_issues_no_scrub() {
        // shift the day so chunks start at 100, making [1000, 1180] a chunk
        let mut session = Session::new(
            ReviewConfig {
                utc_offset_secs: -100,
                ..config()
            },
            SessionInit {
                camera: "a".to_string(),
                start_time: 1_050.0,
                cameras: vec!["a".to_string(), "b".to_string()],
                now: None,
            },
        );
        let (primary, preview) = with_players(&mut session);
        assert_eq!(session.active_chunk(), TimeRange::new(1_000.0, 1_180.0));
        let before = session.active_chunk_index();

        session.set_dragging(true);
        let outcome = session.move_handlebar(1_250.0);

        let index = match outcome {
            ScrubOutcome::Reanchor(index) => index,
            other => panic!("expected re-anchor, got {:?}", other),
        };
        assert_ne!(index, before);
        assert_eq!(session.active_chunk_index(), index);
        assert!(session.active_chunk().contains(1_250.0));
        assert!(primary.scrubs().is_empty());
        assert!(preview.scrubs().is_empty());
        assert_eq!(primary.loads(), vec![(session.active_chunk(), 1_250.0)]);

        // handles are on the new chunk now, so the next update scrubs
        session.move_handlebar(1_255.0);
        assert_eq!(primary.scrubs(), vec![1_255.0]);
    }

    #[test]
    fn test_tolerance_window_scrubs_outside_chunk() {
        let mut session = open("a", 1_000.0);
        let (primary, _) = with_players(&mut session);
        let chunk = session.active_chunk();

        session.set_dragging(true);
        let inside_tolerance = chunk.end + 59.0;
        assert_eq!(
            session.move_handlebar(inside_tolerance),
            ScrubOutcome::Scrub(inside_tolerance)
        );
        assert_eq!(session.active_chunk(), chunk);
        assert_eq!(primary.scrubs(), vec![inside_tolerance]);
    }

    #[test]
    fn test_stale_time_update_during_scrub_is_ignored() {
        let mut session = open("a", 1_050.0);
        let (_, preview) = with_players(&mut session);

        session.set_dragging(true);
        session.move_handlebar(1_070.0);
        session.handle_player("a", PlayerEvent::TimeUpdate { timestamp: 1_051.0 });
        assert_eq!(session.current_time(), 1_070.0);

        session.set_dragging(false);
        preview.clear();
        session.handle_player("a", PlayerEvent::TimeUpdate { timestamp: 1_071.4 });
        assert_eq!(session.current_time(), 1_071.4);
        assert_eq!(preview.scrubs(), vec![1_071.0]);
    }

    #[test]
    fn test_forward_boundary_loads_next_chunk() {
        let mut session = open("a", 1_050.0);
        let (primary, preview) = with_players(&mut session);
        let index = session.active_chunk_index();

        session.handle_player(
            "a",
            PlayerEvent::BoundaryCrossed {
                direction: BoundaryDirection::Forward,
            },
        );

        assert_eq!(session.active_chunk_index(), index + 1);
        let next = session.active_chunk();
        assert_eq!(next, TimeRange::new(1_080.0, 1_260.0));
        assert_eq!(
            primary.commands(),
            vec![
                PlayerCommand::Load {
                    chunk: next,
                    start_at: 1_080.0
                },
                PlayerCommand::Seek {
                    timestamp: 1_080.0,
                    autoplay: true
                },
            ]
        );
        assert_eq!(preview.loads(), vec![(next, 1_080.0)]);
        assert!(preview.seeks().is_empty());
    }

    #[test]
    fn test_boundary_clamp_at_last_chunk() {
        let mut session = open("a", 86_399.0);
        let (primary, _) = with_players(&mut session);
        let last = session.chunks().len() - 1;
        assert_eq!(session.active_chunk_index(), last);

        assert_eq!(session.on_boundary_crossed(BoundaryDirection::Forward), None);
        assert_eq!(session.active_chunk_index(), last);
        assert!(primary.commands().is_empty());
    }

    #[test]
    fn test_boundary_clamp_at_first_chunk() {
        let mut session = open("a", 10.0);
        assert_eq!(session.active_chunk_index(), 0);
        assert_eq!(session.on_boundary_crossed(BoundaryDirection::Backward), None);
        assert_eq!(session.active_chunk_index(), 0);
    }

    #[test]
    fn test_boundary_from_preview_is_ignored() {
        let mut session = open("a", 1_050.0);
        let index = session.active_chunk_index();
        session.handle_player(
            "b",
            PlayerEvent::BoundaryCrossed {
                direction: BoundaryDirection::Forward,
            },
        );
        assert_eq!(session.active_chunk_index(), index);
    }

    #[test]
    fn test_camera_switch_continuity() {
        let mut session = open("a", 4_900.0);
        let (a, b) = with_players(&mut session);
        session.handle_player("a", PlayerEvent::TimeUpdate { timestamp: 5_000.0 });
        a.clear();
        b.clear();

        assert!(session.switch_camera("b"));
        assert_eq!(session.active_camera(), "b");
        assert_eq!(session.playback_start(), 5_000.0);

        let chunk = session.active_chunk();
        assert_eq!(
            b.commands(),
            vec![
                PlayerCommand::Load {
                    chunk,
                    start_at: 5_000.0
                },
                PlayerCommand::Seek {
                    timestamp: 5_000.0,
                    autoplay: true
                },
            ]
        );

        // the demoted player only ever scrubs from here on
        session.handle_player("b", PlayerEvent::TimeUpdate { timestamp: 5_001.5 });
        session.set_dragging(true);
        session.move_handlebar(5_010.0);
        session.set_dragging(false);
        session.handle_player("a", PlayerEvent::TimeUpdate { timestamp: 9_000.0 });

        assert!(a
            .commands()
            .iter()
            .all(|c| matches!(c, PlayerCommand::Scrub { .. })));
        assert_eq!(a.scrubs(), vec![5_000.0, 5_001.0, 5_010.0]);
        assert_eq!(session.current_time(), 5_010.0);
    }

    #[test]
    fn test_switch_before_new_primary_registers() {
        let mut session = open("a", 4_900.0);
        assert!(session.switch_camera("c"));

        let c = CommandRecorder::new();
        session.register_primary(Box::new(c.clone()));
        assert_eq!(c.seeks(), vec![(4_900.0, true)]);
        assert_eq!(c.loads()[0].1, 4_900.0);
    }

    #[test]
    fn test_switch_to_unknown_camera_is_refused() {
        let mut session = open("a", 4_900.0);
        assert!(!session.switch_camera("nope"));
        assert_eq!(session.active_camera(), "a");
    }

    #[test]
    fn test_idempotent_reregistration() {
        let mut session = open("a", 1_050.0);
        let first = CommandRecorder::new();
        let second = CommandRecorder::new();

        session.register_secondary("b", Box::new(first.clone()));
        let index = session.active_chunk_index();
        let time = session.current_time();
        session.register_secondary("b", Box::new(second.clone()));

        assert_eq!(session.active_chunk_index(), index);
        assert_eq!(session.current_time(), time);
        assert_eq!(session.registry().len(), 1);

        first.clear();
        session.handle_player("a", PlayerEvent::TimeUpdate { timestamp: 1_052.0 });
        assert!(first.commands().is_empty());
        assert_eq!(second.scrubs().last(), Some(&1_052.0));
    }

    #[test]
    fn test_commands_to_absent_players_are_noops() {
        let mut session = open("a", 1_050.0);
        session.set_dragging(true);
        assert_eq!(session.move_handlebar(1_060.0), ScrubOutcome::Scrub(1_060.0));
        session.set_dragging(false);
        session.on_boundary_crossed(BoundaryDirection::Forward);
        assert!(session.switch_camera("b"));
        assert!(!session.unregister("c"));
    }

    #[test]
    fn test_late_primary_opens_where_the_user_left_off() {
        let mut session = open("a", 1_050.0);
        assert!(session.switch_camera("c"));

        session.set_dragging(true);
        assert_eq!(session.move_handlebar(2_000.0), ScrubOutcome::Reanchor(11));
        session.move_handlebar(2_010.0);
        session.set_dragging(false);

        let c = CommandRecorder::new();
        session.register_primary(Box::new(c.clone()));
        assert_eq!(
            c.commands(),
            vec![
                PlayerCommand::Load {
                    chunk: TimeRange::new(1_980.0, 2_160.0),
                    start_at: 2_010.0
                },
                PlayerCommand::Seek {
                    timestamp: 2_010.0,
                    autoplay: true
                },
            ]
        );
    }

    #[test]
    fn test_reregistered_primary_opens_in_advanced_chunk() {
        let mut session = open("a", 1_050.0);
        session.register_primary(Box::new(CommandRecorder::new()));
        session.on_boundary_crossed(BoundaryDirection::Forward);
        assert_eq!(session.current_time(), 1_080.0);

        let again = CommandRecorder::new();
        session.register_primary(Box::new(again.clone()));
        assert_eq!(again.loads(), vec![(TimeRange::new(1_080.0, 1_260.0), 1_080.0)]);
        assert_eq!(again.seeks(), vec![(1_080.0, true)]);
    }

    #[test]
    fn test_primary_opening_mid_drag_after_reanchor() {
        let mut session = open("a", 1_050.0);
        session.set_dragging(true);
        session.move_handlebar(3_000.0);

        let a = CommandRecorder::new();
        session.register_primary(Box::new(a.clone()));
        assert_eq!(a.loads(), vec![(session.active_chunk(), 3_000.0)]);
        assert_eq!(a.seeks(), vec![(3_000.0, false)]);
    }

    #[test]
    fn test_boundary_during_drag_is_ignored() {
        let mut session = open("a", 1_050.0);
        let (primary, preview) = with_players(&mut session);
        let index = session.active_chunk_index();

        session.set_dragging(true);
        session.move_handlebar(1_070.0);
        session.handle_player(
            "a",
            PlayerEvent::BoundaryCrossed {
                direction: BoundaryDirection::Forward,
            },
        );
        assert_eq!(session.active_chunk_index(), index);
        assert!(primary.loads().is_empty());
        assert!(preview.loads().is_empty());

        session.set_dragging(false);
        assert_eq!(primary.seeks(), vec![(1_070.0, true)]);
    }

    #[test]
    fn test_newest_first_forward_moves_to_earlier_chunk() {
        let mut session = Session::new(
            ReviewConfig {
                chunk_order: ChunkOrder::NewestFirst,
                ..config()
            },
            SessionInit {
                camera: "a".to_string(),
                start_time: 1_050.0,
                cameras: vec!["a".to_string(), "b".to_string()],
                now: None,
            },
        );
        let (primary, preview) = with_players(&mut session);
        assert_eq!(session.active_chunk(), TimeRange::new(900.0, 1_080.0));
        let index = session.active_chunk_index();

        assert_eq!(
            session.on_boundary_crossed(BoundaryDirection::Forward),
            Some(index + 1)
        );
        let earlier = TimeRange::new(720.0, 900.0);
        assert_eq!(session.active_chunk(), earlier);
        assert_eq!(primary.loads(), vec![(earlier, 720.0)]);
        assert_eq!(primary.seeks(), vec![(720.0, true)]);
        assert_eq!(preview.loads(), vec![(earlier, 720.0)]);

        primary.clear();
        session.on_boundary_crossed(BoundaryDirection::Backward);
        assert_eq!(session.active_chunk(), TimeRange::new(900.0, 1_080.0));
        assert_eq!(primary.seeks(), vec![(1_080.0, true)]);
    }
}
