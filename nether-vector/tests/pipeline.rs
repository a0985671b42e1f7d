//! End-to-end tests: producer API through rasterizer and batcher to a sink.

use std::sync::Arc;
use std::time::Duration;

use nether_vector::sink::unpack_point;
use nether_vector::*;

const TIMEOUT: Duration = Duration::from_secs(5);

fn small_config() -> DisplayConfig {
    DisplayConfig {
        max_points: 256,
        batch_size: 8,
        ..Default::default()
    }
}

#[test]
fn test_wire_frame_renders_through_display() {
    let frame = [
        Vertex::move_to(10, 10),
        Vertex::new(14, 10, 24),
        Vertex::new(14, 12, 24),
    ];
    let bytes = WireEncoder::encode_frame(&frame);

    let mut display = VectorDisplay::new(small_config());
    let mut decoder = WireDecoder::new();
    for event in decoder.push(&bytes) {
        match event {
            WireEvent::Vertex(vertex) => display.add_vertex(vertex),
            WireEvent::EndFrame => display.display(),
        }
    }
    assert_eq!(display.pending(), 0);

    let sink = CaptureSink::new();
    let mut renderer = Renderer::new(Arc::clone(display.buffers()), sink.clone(), display.config());
    // 1 blanked + 5 along x + 3 along y
    assert_eq!(renderer.run_cycle().unwrap(), 9);

    let points = sink.points();
    assert_eq!(points.first(), Some(&Point::new(10, 10)));
    assert_eq!(points.last(), Some(&Point::new(14, 12)));
    // Batches of 8 plus the flushed remainder
    let sizes: Vec<usize> = sink.transfers().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![8, 1]);
}

#[test]
fn test_planned_square_closes_on_itself() {
    let corners = [(100, 100), (200, 100), (200, 200), (100, 200)];
    let segments: Vec<Segment> = (0..4)
        .map(|i| {
            let (x0, y0) = corners[i];
            let (x1, y1) = corners[(i + 1) % 4];
            Segment::clamped(x0, y0, x1, y1)
        })
        .collect();
    let vertices = plan_segments(&segments, &PlanOptions::default());
    assert_eq!(vertices.len(), 5);

    let (shared, mut back) = DoubleBuffer::new(16);
    back.extend(&vertices);
    back.publish();

    let sink = CaptureSink::new();
    let mut renderer = Renderer::new(shared, sink.clone(), &small_config());
    renderer.run_cycle().unwrap();

    let points = sink.points();
    // Blanked jump, then 4 sides of 101 points each
    assert_eq!(points.len(), 1 + 4 * 101);
    assert_eq!(renderer.beam(), Point::new(100, 100));
    for pair in points[1..].windows(2) {
        let dx = (pair[0].x as i32 - pair[1].x as i32).abs();
        let dy = (pair[0].y as i32 - pair[1].y as i32).abs();
        assert!(dx <= 1 && dy <= 1);
    }
}

#[test]
fn test_ring_sink_feeds_device_side() {
    let (sink, mut source) = ring_sink(64);

    let mut display = VectorDisplay::new(small_config());
    display.move_to(0, 0);
    display.line_to(20, 0);
    display.display();
    display.begin(sink).unwrap();

    // Device side: pull until a few cycles' worth has arrived
    let mut received = Vec::new();
    let mut chunk = [0u32; 16];
    let deadline = std::time::Instant::now() + TIMEOUT;
    while received.len() < 66 && std::time::Instant::now() < deadline {
        let n = source.pop_into(&mut chunk);
        received.extend_from_slice(&chunk[..n]);
        if n == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
    display.end();
    drop(source);

    assert!(received.len() >= 66);
    let points: Vec<Point> = received.iter().map(|&s| unpack_point(s)).collect();
    // Each cycle: (0,0) blanked, then (0,0)..(20,0)
    assert_eq!(points[0], Point::new(0, 0));
    assert_eq!(points[21], Point::new(20, 0));
    assert_eq!(points[22], Point::new(0, 0));
    assert_eq!(points[43], Point::new(20, 0));
}

#[test]
fn test_end_returns_while_device_stalls() {
    let (sink, source) = ring_sink(4);

    let mut display = VectorDisplay::new(small_config());
    display.move_to(0, 0);
    display.line_to(100, 0);
    display.display();
    display.begin(sink).unwrap();

    // Let the renderer fill the ring and block on it; the source is never drained
    std::thread::sleep(Duration::from_millis(50));
    assert!(display.is_running());

    let (done_tx, done_rx) = std::sync::mpsc::channel();
    let stopper = std::thread::spawn(move || {
        display.end();
        let _ = done_tx.send(display.is_running());
    });

    let still_running = done_rx
        .recv_timeout(TIMEOUT)
        .expect("end() blocked on a stalled device");
    assert!(!still_running);
    stopper.join().unwrap();
    assert_eq!(source.available(), 4);
}

#[test]
fn test_writer_sink_emits_little_endian_words() {
    let (shared, mut back) = DoubleBuffer::new(4);
    back.append(Vertex::move_to(1, 2));
    back.publish();

    let mut renderer = Renderer::new(shared, WriterSink::new(Vec::new()), &small_config());
    renderer.run_cycle().unwrap();
    let bytes = renderer.into_sink().into_inner();
    assert_eq!(bytes, pack_sample(scale_coord(1), scale_coord(2)).to_le_bytes());
}

#[test]
fn test_producer_keeps_building_while_renderer_runs() {
    let sink = CaptureSink::new();
    let mut display = VectorDisplay::new(small_config());
    display.begin(sink.clone()).unwrap();

    for frame in 0..50u16 {
        display.move_to(frame, 0);
        display.line_to(frame, 10);
        display.display();
    }
    let target = display.cycles() + 2;
    assert!(display.renderer().unwrap().wait_for_cycles(target, TIMEOUT));
    display.end();

    // The last frame published is the one still on screen
    let points = sink.points();
    assert!(
        points
            .windows(2)
            .any(|w| w == [Point::new(49, 9), Point::new(49, 10)])
    );
}
