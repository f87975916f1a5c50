//! End-to-end runs of the harness on the in-process engine.

mod common;

use std::net::{Ipv4Addr, SocketAddrV4};

use netlab::{Experiment, NetworkParameters, TrafficRequest, TransportKind};

#[test]
fn test_single_stream_flow() {
    let mut controller = common::controller(NetworkParameters::default());
    controller
        .place_traffic(common::bottleneck_flow())
        .expect("place flow");
    let entries = controller.run().expect("run");
    common::dump(&entries);

    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.label(), "TCP");
    assert_eq!(*entry.source.ip(), Ipv4Addr::new(10, 1, 5, 1));
    assert_eq!(
        entry.destination,
        SocketAddrV4::new(Ipv4Addr::new(10, 1, 2, 1), 8080)
    );
    assert!(entry.rx_bytes > 0);
    assert_eq!(entry.lost_packets, 0);
    assert!(entry.first_tx >= 1.0);
    assert!(entry.last_rx <= 60.0);
    assert!(entry.throughput_mbps > 0.0);
    common::assert_report_invariants(&entries);
}

#[test]
fn test_datagram_flow_is_echoed() {
    let mut controller = common::controller(NetworkParameters::default());
    controller
        .place_traffic(TrafficRequest::datagram(3, 2, "n2n6", (30.0, 60.0), 9))
        .expect("place flow");
    let entries = controller.run().expect("run");
    common::dump(&entries);

    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.kind == TransportKind::Datagram));

    let request = &entries[0];
    assert_eq!(*request.source.ip(), Ipv4Addr::new(10, 1, 4, 1));
    assert_eq!(
        request.destination,
        SocketAddrV4::new(Ipv4Addr::new(10, 1, 3, 1), 9)
    );
    // 1052-byte requests every 10 ms overrun the 500 kbps path
    let request_size = 1024 + 28;
    assert_eq!(request.tx_bytes, 1000 * request_size);
    assert!(request.lost_packets > 0);
    assert_eq!(
        request.tx_bytes,
        request.rx_bytes + request.lost_packets * request_size
    );

    // one reply per delivered request
    let reply = &entries[1];
    assert_eq!(reply.source, request.destination);
    assert_eq!(reply.destination, request.source);
    assert_eq!(reply.tx_bytes, request.rx_bytes);
    common::assert_report_invariants(&entries);
}

#[test]
fn test_datagram_port_is_ignored() {
    let run = |port| {
        let mut controller = common::controller(NetworkParameters::default());
        controller
            .place_traffic(TrafficRequest::datagram(4, 1, "n1n6", (1.0, 60.0), port))
            .expect("place flow");
        controller.run().expect("run")
    };
    assert_eq!(run(1), run(2));
}

#[test]
fn test_flow_stop_is_truncated_at_run_end() {
    let mut controller = common::controller(NetworkParameters::default());
    controller
        .place_traffic(TrafficRequest::stream(4, 1, "n1n6", (50.0, 500.0), 8080))
        .expect("place flow");
    let entries = controller.run().expect("run");

    assert_eq!(entries.len(), 1);
    assert!(entries[0].last_rx <= 60.0);
}

#[test]
fn test_runs_are_deterministic() {
    let run = || {
        let mut controller = common::controller(common::lossy(0.2));
        controller.attach_fault("n6n7").expect("attach fault");
        for request in Experiment::Retransmissions.flows() {
            controller.place_traffic(request).expect("place flow");
        }
        controller.run().expect("run")
    };
    assert_eq!(run(), run());
}

#[test]
fn test_experiments_satisfy_report_invariants() {
    for experiment in Experiment::ALL {
        let mut controller = common::controller(NetworkParameters::default());
        for request in experiment.flows() {
            controller.place_traffic(request).expect("place flow");
        }
        let entries = controller.run().expect("run");
        common::dump(&entries);

        let streams = entries
            .iter()
            .filter(|e| e.kind == TransportKind::ReliableStream)
            .count();
        let expected = experiment
            .flows()
            .iter()
            .filter(|f| f.kind == TransportKind::ReliableStream)
            .count();
        assert_eq!(streams, expected, "{experiment}");
        common::assert_report_invariants(&entries);
    }
}

#[test]
fn test_competing_streams_overflow_the_bottleneck() {
    let mut controller = common::controller(NetworkParameters::default());
    for request in Experiment::Exp3.flows() {
        controller.place_traffic(request).expect("place flow");
    }
    let entries = controller.run().expect("run");

    let lost: u64 = entries.iter().map(|e| e.lost_packets).sum();
    assert!(lost > 0, "four 300 kbps streams should overflow a 500 kbps link");
}
