use rayos_chronicle::*;

/// `size` samples of `root.q`, recorded as 0, 1, 2, ... at indices 0, 1, 2, ...
fn recorded_ramp(size: usize) -> (SharedBuffer, Variable) {
    let mut shared = SharedBuffer::new(Registry::new("root").unwrap(), size).unwrap();
    let q = shared.add_variable("root", "q", ScalarKind::Double).unwrap();
    for i in 0..size {
        q.set_double(i as f64).unwrap();
        shared.write_buffer();
        shared.increment_buffer_index(true);
    }
    (shared, q)
}

#[test]
fn active_only_request_resolves_window() {
    let (mut shared, _) = recorded_ramp(10);
    shared.set_in_point(2);
    shared.set_out_point(6);
    shared.set_current_index(6);

    let linked = shared.linker().link_by_name("root.q").unwrap();
    linked.request_active_buffer_only();
    shared.prepare_linked_buffers_for_pull().unwrap();

    let sample = linked.poll_requested_buffer_sample().unwrap();
    assert_eq!(sample.from(), 2);
    assert_eq!(sample.to(), 6);
    assert_eq!(sample.sample_length(), 5);
    assert_eq!(sample.sample().to_doubles(), vec![2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn crop_keeps_circular_slice() {
    let (mut shared, q) = recorded_ramp(10);
    shared.crop_buffer(CropRequest::new(3, 7)).unwrap();

    let properties = shared.properties();
    assert_eq!(properties.size(), 5);
    assert_eq!(properties.in_point(), 0);
    assert_eq!(properties.out_point(), 4);
    assert_eq!(properties.current_index(), 0);

    let linked = shared.linker().link_by_name("root.q").unwrap();
    linked.request_entire_buffer();
    shared.prepare_linked_buffers_for_pull().unwrap();
    let sample = linked.poll_requested_buffer_sample().unwrap();
    assert_eq!(sample.sample().to_doubles(), vec![3.0, 4.0, 5.0, 6.0, 7.0]);

    assert!(shared.read_buffer());
    assert_eq!(q.get_double(), 3.0);
}

#[test]
fn empty_window_request_yields_nothing() {
    let (mut shared, _) = recorded_ramp(10);
    let linked = shared.linker().link_by_name("root.q").unwrap();

    linked.request_buffer_window(4, 0);
    shared.prepare_linked_buffers_for_pull().unwrap();
    assert!(!linked.is_requested_buffer_sample_available());
    assert!(linked.poll_requested_buffer_sample().is_none());
}

#[test]
fn out_of_range_requests_fail_at_resolution() {
    let (mut shared, _) = recorded_ramp(10);
    let linked = shared.linker().link_by_name("root.q").unwrap();

    linked.request_buffer_window(10, 3);
    assert!(linked.has_request_pending());
    assert!(matches!(
        shared.prepare_linked_buffers_for_pull(),
        Err(ChronicleError::InvalidSampleRequest { from: 10, length: 3, size: 10 })
    ));

    linked.request_buffer_window(2, -1);
    assert!(shared.prepare_linked_buffers_for_pull().is_err());
    assert!(!linked.has_request_pending());
}

#[test]
fn recording_past_capacity_overwrites_oldest() {
    let (mut shared, q) = recorded_ramp(4);
    // After 4 samples the index wrapped to 0 and the ring is full
    let properties = shared.properties();
    assert_eq!(
        (properties.in_point(), properties.out_point(), properties.current_index()),
        (1, 0, 0)
    );

    q.set_double(4.0).unwrap();
    shared.write_buffer();

    let linked = shared.linker().link_by_name("root.q").unwrap();
    linked.request_active_buffer_only();
    shared.prepare_linked_buffers_for_pull().unwrap();
    let sample = linked.poll_requested_buffer_sample().unwrap();
    assert_eq!(sample.sample().to_doubles(), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn resize_then_playback_loops_over_history() {
    let (mut shared, q) = recorded_ramp(6);
    shared.set_in_point(1);
    shared.set_out_point(3);
    shared.set_current_index(3);

    assert!(shared.resize_buffer(12));
    let properties = shared.properties();
    assert_eq!(properties.size(), 12);
    assert_eq!(
        (properties.in_point(), properties.out_point(), properties.current_index()),
        (0, 2, 2)
    );

    let mut seen = Vec::new();
    for _ in 0..5 {
        shared.read_buffer();
        seen.push(q.get_double());
        shared.increment_buffer_index(false);
    }
    assert_eq!(seen, vec![3.0, 1.0, 2.0, 3.0, 1.0]);
}

#[test]
fn multiple_kinds_share_one_index() {
    let mut shared = SharedBuffer::new(Registry::new("root").unwrap(), 8).unwrap();
    let flag = shared.add_variable("root.io", "flag", ScalarKind::Boolean).unwrap();
    let count = shared.add_variable("root.io", "count", ScalarKind::Integer).unwrap();
    let stamp = shared.add_variable("root", "stamp", ScalarKind::Long).unwrap();
    let mode = shared.add_enum_variable("root", "mode", &["OFF", "ON"]).unwrap();

    for i in 1..=3 {
        flag.set_boolean(i % 2 == 1).unwrap();
        count.set_integer(-i).unwrap();
        stamp.set_long(i as i64 * 1_000_000_000_000).unwrap();
        mode.set_ordinal(Some((i % 2) as u8)).unwrap();
        shared.tick().unwrap();
    }

    assert!(shared.set_current_index(2));
    assert!(!flag.get_boolean());
    assert_eq!(count.get_integer(), -2);
    assert_eq!(stamp.get_long(), 2_000_000_000_000);
    assert_eq!(mode.get_ordinal(), Some(0));
    assert_eq!(shared.frame_memory_size(), 1 + 4 + 8 + std::mem::size_of::<Option<u8>>());
}

#[test]
fn pending_request_resolves_against_resized_buffer() {
    let (mut shared, _) = recorded_ramp(10);
    let linked = shared.linker().link_by_name("root.q").unwrap();
    linked.request_entire_buffer();

    // The ring is full with the out-point at 0, shrinking keeps [7, 0]
    assert!(shared.resize_buffer(4));
    shared.prepare_linked_buffers_for_pull().unwrap();

    let sample = linked.poll_requested_buffer_sample().unwrap();
    assert_eq!(sample.sample_length(), 4);
    assert_eq!(sample.buffer_size(), 4);
    assert_eq!(sample.sample().to_doubles(), vec![7.0, 8.0, 9.0, 0.0]);
}

#[test]
fn pending_request_resolves_against_cropped_buffer() {
    let (mut shared, _) = recorded_ramp(10);
    let linked = shared.linker().link_by_name("root.q").unwrap();
    linked.request_active_buffer_only();

    shared.crop_buffer(CropRequest::new(3, 7)).unwrap();
    shared.prepare_linked_buffers_for_pull().unwrap();

    let sample = linked.poll_requested_buffer_sample().unwrap();
    assert_eq!((sample.from(), sample.to(), sample.sample_length()), (0, 4, 5));
    assert_eq!(sample.properties().size(), 5);
    assert_eq!(sample.sample().to_doubles(), vec![3.0, 4.0, 5.0, 6.0, 7.0]);

    // A window valid before the crop is now out of range
    linked.request_buffer_window(6, 2);
    assert!(matches!(
        shared.prepare_linked_buffers_for_pull(),
        Err(ChronicleError::InvalidSampleRequest { from: 6, length: 2, size: 5 })
    ));
}
